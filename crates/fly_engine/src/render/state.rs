//! Fixed-function state as data
//!
//! Depth, stencil and blend toggles are described by [`StateChange`] values
//! and applied in order by [`apply_sequence`]. The planar reflection is three
//! such sequences; keeping them as data makes their order checkable against a
//! recorded command log.

use bitflags::bitflags;

use crate::render::api::GraphicsDevice;

bitflags! {
    /// Buffers affected by a clear
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ClearFlags: u32 {
        /// Color attachments
        const COLOR = 1;
        /// Depth buffer
        const DEPTH = 1 << 1;
        /// Stencil buffer
        const STENCIL = 1 << 2;
    }
}

/// Server-side capability toggled with enable/disable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Depth testing
    DepthTest,
    /// Stencil testing
    StencilTest,
    /// Color blending
    Blend,
    /// Back-face culling
    CullFace,
}

/// Comparison used by depth and stencil tests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareFunc {
    /// Never passes
    Never,
    /// Passes if incoming < stored
    Less,
    /// Passes if equal
    Equal,
    /// Passes if incoming <= stored
    LessEqual,
    /// Passes if incoming > stored
    Greater,
    /// Passes if not equal
    NotEqual,
    /// Passes if incoming >= stored
    GreaterEqual,
    /// Always passes
    Always,
}

/// What happens to a stencil value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StencilAction {
    /// Keep the stored value
    Keep,
    /// Write zero
    Zero,
    /// Write the reference value
    Replace,
    /// Increment, clamping
    Increment,
    /// Decrement, clamping
    Decrement,
    /// Bitwise invert
    Invert,
}

/// Blend factor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlendFactor {
    /// 0
    Zero,
    /// 1
    One,
    /// Source alpha
    SrcAlpha,
    /// 1 - source alpha
    OneMinusSrcAlpha,
}

/// A single fixed-function state transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateChange {
    /// Enable a capability
    Enable(Capability),
    /// Disable a capability
    Disable(Capability),
    /// Depth comparison
    DepthFunc(CompareFunc),
    /// Whether depth writes are enabled
    DepthMask(bool),
    /// Stencil test function, reference and read mask
    StencilFunc {
        /// Comparison
        func: CompareFunc,
        /// Reference value
        reference: i32,
        /// Mask applied to both sides before comparing
        mask: u32,
    },
    /// Stencil update actions
    StencilOp {
        /// Stencil test failed
        stencil_fail: StencilAction,
        /// Stencil passed, depth failed
        depth_fail: StencilAction,
        /// Both passed
        pass: StencilAction,
    },
    /// Stencil write mask
    StencilMask(u32),
    /// Blend equation factors
    BlendFunc {
        /// Source factor
        source: BlendFactor,
        /// Destination factor
        destination: BlendFactor,
    },
    /// Clear buffers of the bound framebuffer
    Clear(ClearFlags),
}

/// Global state established once when the scene view is created
pub const SCENE_DEFAULTS: &[StateChange] = &[
    StateChange::Enable(Capability::DepthTest),
    StateChange::Enable(Capability::CullFace),
    StateChange::DepthFunc(CompareFunc::Less),
];

/// Mark the reflective surface in the stencil buffer without writing depth
pub const REFLECTIVE_SURFACE: &[StateChange] = &[
    StateChange::Enable(Capability::StencilTest),
    StateChange::StencilFunc { func: CompareFunc::Always, reference: 1, mask: 0xFF },
    StateChange::StencilOp {
        stencil_fail: StencilAction::Keep,
        depth_fail: StencilAction::Keep,
        pass: StencilAction::Replace,
    },
    StateChange::StencilMask(0xFF),
    StateChange::DepthMask(false),
    StateChange::Clear(ClearFlags::STENCIL),
];

/// Restrict drawing to the marked pixels and blend the mirrored object in
pub const REFLECTED_OBJECT: &[StateChange] = &[
    StateChange::StencilFunc { func: CompareFunc::Equal, reference: 1, mask: 0xFF },
    StateChange::StencilMask(0x00),
    StateChange::DepthMask(true),
    StateChange::Enable(Capability::Blend),
    StateChange::BlendFunc {
        source: BlendFactor::SrcAlpha,
        destination: BlendFactor::OneMinusSrcAlpha,
    },
];

/// Leave the reflection pass
pub const END_REFLECTION: &[StateChange] = &[
    StateChange::Disable(Capability::Blend),
    StateChange::Disable(Capability::StencilTest),
];

/// Apply `changes` to the device in order
pub fn apply_sequence(device: &dyn GraphicsDevice, changes: &[StateChange]) {
    for change in changes {
        log::trace!("state change: {change:?}");
        device.apply_state(change);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::backends::recording::{DeviceCommand, RecordingDevice};

    #[test]
    fn test_sequence_is_applied_in_order() {
        let device = RecordingDevice::new();
        apply_sequence(&device, REFLECTIVE_SURFACE);

        let applied: Vec<StateChange> = device
            .commands()
            .into_iter()
            .filter_map(|c| match c {
                DeviceCommand::State(change) => Some(change),
                _ => None,
            })
            .collect();
        assert_eq!(applied, REFLECTIVE_SURFACE.to_vec());
    }

    #[test]
    fn test_reflection_masks() {
        // Surface pass writes the stencil but not depth.
        assert!(REFLECTIVE_SURFACE.contains(&StateChange::StencilMask(0xFF)));
        assert!(REFLECTIVE_SURFACE.contains(&StateChange::DepthMask(false)));
        // Object pass only reads the stencil and writes depth again.
        assert!(REFLECTED_OBJECT.contains(&StateChange::StencilMask(0x00)));
        assert!(REFLECTED_OBJECT.contains(&StateChange::DepthMask(true)));
    }

    #[test]
    fn test_end_reflection_restores_capabilities() {
        let device = RecordingDevice::new();
        apply_sequence(&device, REFLECTIVE_SURFACE);
        apply_sequence(&device, REFLECTED_OBJECT);
        assert!(device.is_enabled(Capability::StencilTest));
        assert!(device.is_enabled(Capability::Blend));

        apply_sequence(&device, END_REFLECTION);
        assert!(!device.is_enabled(Capability::StencilTest));
        assert!(!device.is_enabled(Capability::Blend));
        assert!(device.depth_writes_enabled());
    }
}

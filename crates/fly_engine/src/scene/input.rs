//! Per-frame user intent
//!
//! The window layer turns key state into a [`FrameInput`]; the scene only
//! sees axes and requests, never keys.

use crate::foundation::math::Vec3;
use crate::render::post::EffectMode;

/// What the user asked for during one frame
///
/// Axis components are -1, 0 or 1 and get scaled by the configured speeds and
/// the frame time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameInput {
    /// Camera pitch (x) and yaw (y)
    pub camera_rotation: Vec3,
    /// Camera translation along x, y and z
    pub camera_movement: Vec3,
    /// Yaw of the featured object
    pub object_rotation: f32,
    /// Change of the main light's intensity, applied as is
    pub light_intensity_delta: f32,
    /// Switch the main light on or off
    pub toggle_light: bool,
    /// Effect to activate
    pub effect: Option<EffectMode>,
}

impl FrameInput {
    /// No input at all
    pub fn idle() -> Self {
        Self::default()
    }

    /// Whether anything was requested
    pub fn is_idle(&self) -> bool {
        self == &Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idle_input() {
        assert!(FrameInput::idle().is_idle());
        let input = FrameInput { toggle_light: true, ..FrameInput::idle() };
        assert!(!input.is_idle());
    }
}

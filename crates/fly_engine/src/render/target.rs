//! Offscreen render target
//!
//! One framebuffer, one combined depth/stencil renderbuffer and a fixed,
//! ordered set of color textures. The attachment set is decided at
//! construction; [`RenderTarget::resize`] reallocates storage in place and
//! never changes slots or texture handles.

use crate::render::api::{
    AttachmentSlot, DeviceRef, FramebufferId, FramebufferStatus, RenderbufferId, TextureDesc, TextureFormat, TextureId,
};
use crate::render::{RenderError, RenderResult};

/// Requested color attachment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttachmentSpec {
    /// Color attachment slot
    pub slot: AttachmentSlot,
    /// Name of the sampler uniform that reads this texture in the composite shader
    pub sampler: &'static str,
    /// Storage format of the texture
    pub format: TextureFormat,
}

impl AttachmentSpec {
    /// 8-bit color attachment at `slot` sampled through `sampler`
    pub const fn new(slot: u32, sampler: &'static str) -> Self {
        Self { slot: AttachmentSlot(slot), sampler, format: TextureFormat::Rgb8 }
    }

    /// Same attachment stored as `format`
    pub const fn with_format(self, format: TextureFormat) -> Self {
        Self { format, ..self }
    }
}

/// Allocated color attachment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attachment {
    /// Color attachment slot
    pub slot: AttachmentSlot,
    /// Texture receiving this slot's output
    pub texture: TextureId,
    /// Sampler uniform name in the composite shader
    pub sampler: &'static str,
}

/// Framebuffer with color textures and a depth/stencil buffer
pub struct RenderTarget {
    device: DeviceRef,
    framebuffer: FramebufferId,
    depth_stencil: Option<RenderbufferId>,
    attachments: Vec<Attachment>,
    width: u32,
    height: u32,
}

impl RenderTarget {
    /// Allocate the framebuffer, one texture per spec and the depth/stencil buffer
    ///
    /// Returns [`RenderError::IncompleteFramebuffer`] when the device rejects
    /// the result; whatever was allocated is released before returning.
    pub fn initialize(device: &DeviceRef, width: u32, height: u32, specs: &[AttachmentSpec]) -> RenderResult<Self> {
        for (i, spec) in specs.iter().enumerate() {
            if specs[..i].iter().any(|other| other.slot == spec.slot) {
                return Err(RenderError::InitializationFailed(format!(
                    "color slot {} requested twice",
                    spec.slot.0
                )));
            }
        }

        let (width, height) = (width.max(1), height.max(1));
        let framebuffer = device.create_framebuffer()?;
        let mut target = Self {
            device: DeviceRef::clone(device),
            framebuffer,
            depth_stencil: None,
            attachments: Vec::with_capacity(specs.len()),
            width,
            height,
        };

        device.bind_framebuffer(Some(framebuffer));
        let status = target.allocate(specs);
        device.bind_framebuffer(None);

        match status? {
            FramebufferStatus::Complete => {
                log::debug!(
                    "Render target {framebuffer:?}: {width}x{height}, {} color attachment(s)",
                    target.attachments.len()
                );
                Ok(target)
            }
            FramebufferStatus::Incomplete(status) => {
                log::error!("Render target {framebuffer:?} is incomplete (status 0x{status:04X})");
                Err(RenderError::IncompleteFramebuffer { status })
            }
        }
    }

    fn allocate(&mut self, specs: &[AttachmentSpec]) -> RenderResult<FramebufferStatus> {
        for spec in specs {
            let desc = TextureDesc { format: spec.format, ..TextureDesc::render_target(self.width, self.height) };
            let texture = self.device.create_texture(&desc, None)?;
            self.device.attach_color_texture(spec.slot, texture);
            self.attachments.push(Attachment { slot: spec.slot, texture, sampler: spec.sampler });
        }
        self.depth_stencil = Some(self.device.create_depth_stencil_buffer(self.width, self.height)?);
        Ok(self.device.framebuffer_status())
    }

    /// Bind for scene drawing with every color attachment as a draw buffer
    pub fn bind_for_drawing(&self) {
        self.device.bind_framebuffer(Some(self.framebuffer));
        let slots: Vec<AttachmentSlot> = self.attachments.iter().map(|a| a.slot).collect();
        self.device.set_draw_buffers(&slots);
    }

    /// Reallocate every attachment at the new size
    pub fn resize(&mut self, width: u32, height: u32) {
        let (width, height) = (width.max(1), height.max(1));
        for attachment in &self.attachments {
            self.device.resize_texture(attachment.texture, width, height);
        }
        if let Some(depth_stencil) = self.depth_stencil {
            self.device.resize_depth_stencil_buffer(depth_stencil, width, height);
        }
        self.width = width;
        self.height = height;
        log::trace!("Render target {:?} resized to {width}x{height}", self.framebuffer);
    }

    /// Color attachments in declaration order
    pub fn attachments(&self) -> &[Attachment] {
        &self.attachments
    }

    /// Framebuffer handle
    pub const fn framebuffer(&self) -> FramebufferId {
        self.framebuffer
    }

    /// Current size in pixels
    pub const fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

impl Drop for RenderTarget {
    fn drop(&mut self) {
        for attachment in &self.attachments {
            self.device.delete_texture(attachment.texture);
        }
        if let Some(depth_stencil) = self.depth_stencil.take() {
            self.device.delete_renderbuffer(depth_stencil);
        }
        self.device.delete_framebuffer(self.framebuffer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::backends::RecordingDevice;
    use std::rc::Rc;

    const SPECS: [AttachmentSpec; 2] = [
        AttachmentSpec::new(0, "colorTexture"),
        AttachmentSpec::new(1, "speedTexture").with_format(TextureFormat::Rg16f),
    ];

    fn recorder() -> (Rc<RecordingDevice>, DeviceRef) {
        let recorder = Rc::new(RecordingDevice::new());
        let device: DeviceRef = recorder.clone();
        (recorder, device)
    }

    #[test]
    fn test_attachments_follow_declaration_order() {
        let (recorder, device) = recorder();
        let target = RenderTarget::initialize(&device, 640, 400, &SPECS).unwrap();

        let attached = recorder.attachments(target.framebuffer());
        assert_eq!(attached.len(), 2);
        assert_eq!(attached[0], (AttachmentSlot(0), target.attachments()[0].texture));
        assert_eq!(attached[1], (AttachmentSlot(1), target.attachments()[1].texture));
        assert_eq!(recorder.bound_framebuffer(), None);
    }

    #[test]
    fn test_each_attachment_gets_its_format() {
        let (recorder, device) = recorder();
        let mut target = RenderTarget::initialize(&device, 64, 64, &SPECS).unwrap();
        target.resize(128, 32);

        let attachments = target.attachments();
        assert_eq!(recorder.texture_format(attachments[0].texture), Some(TextureFormat::Rgb8));
        assert_eq!(recorder.texture_format(attachments[1].texture), Some(TextureFormat::Rg16f));
    }

    #[test]
    fn test_resize_keeps_handles_and_updates_sizes() {
        let (recorder, device) = recorder();
        let mut target = RenderTarget::initialize(&device, 640, 400, &SPECS).unwrap();
        let before: Vec<Attachment> = target.attachments().to_vec();

        target.resize(800, 600);
        target.resize(800, 600);

        assert_eq!(target.attachments(), before.as_slice());
        for attachment in target.attachments() {
            assert_eq!(recorder.texture_size(attachment.texture), Some((800, 600)));
        }
        assert_eq!(target.size(), (800, 600));
    }

    #[test]
    fn test_incomplete_framebuffer_is_fatal_and_leak_free() {
        let recorder = Rc::new(RecordingDevice::new().with_incomplete_framebuffers());
        let device: DeviceRef = recorder.clone();
        let result = RenderTarget::initialize(&device, 64, 64, &SPECS);
        assert!(matches!(result, Err(RenderError::IncompleteFramebuffer { .. })));
        assert_eq!(recorder.live_objects(), 0);
    }

    #[test]
    fn test_duplicate_slots_rejected() {
        let (_, device) = recorder();
        let specs = [AttachmentSpec::new(0, "a"), AttachmentSpec::new(0, "b")];
        assert!(RenderTarget::initialize(&device, 8, 8, &specs).is_err());
    }

    #[test]
    fn test_zero_size_is_clamped() {
        let (recorder, device) = recorder();
        let mut target = RenderTarget::initialize(&device, 0, 0, &SPECS[..1]).unwrap();
        target.resize(0, 300);
        assert_eq!(recorder.texture_size(target.attachments()[0].texture), Some((1, 300)));
    }

    #[test]
    fn test_drop_releases_everything() {
        let (recorder, device) = recorder();
        drop(RenderTarget::initialize(&device, 32, 32, &SPECS).unwrap());
        assert_eq!(recorder.live_objects(), 0);
    }
}

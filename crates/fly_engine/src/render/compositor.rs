//! Per-frame effect selection
//!
//! The [`Compositor`] owns one instance of every composite effect, built once
//! at start-up, and decides each frame where the scene goes:
//!
//! 1. the active effect's target (`pre_process`) or the screen
//! 2. clear colour and depth
//! 3. the scene, either plainly or through the stencil reflection path
//! 4. the active effect's composite pass
//! 5. `end_frame` on every drawable
//!
//! Switching [`EffectMode`] only changes which effect is invoked; nothing is
//! compiled, queried or allocated after [`Compositor::initialize`].

use crate::config::EffectsConfig;
use crate::foundation::math::{Mat4, Vec3};
use crate::render::api::DeviceRef;
use crate::render::lighting::LightingBuffer;
use crate::render::post::{CompositeEffect, EffectKind, EffectMode};
use crate::render::state::{
    apply_sequence, Capability, ClearFlags, StateChange, END_REFLECTION, REFLECTED_OBJECT, REFLECTIVE_SURFACE,
};
use crate::render::{RenderError, RenderResult};

/// Matrices and lights shared by every draw in a frame
#[derive(Debug, Clone, Copy)]
pub struct FrameContext<'a> {
    /// Camera projection
    pub projection: Mat4,
    /// Camera view
    pub view: Mat4,
    /// Lights collected for this frame
    pub lights: &'a LightingBuffer,
}

/// Why a drawable is being drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawPass {
    /// The frame's regular draw
    Primary,
    /// Extra draw of a mirrored copy; must leave per-frame state alone
    Mirrored,
}

/// Something the compositor can put on screen
pub trait Drawable {
    /// Issue this object's draw calls
    fn draw(&mut self, frame: &FrameContext<'_>, pass: DrawPass) -> RenderResult<()>;

    /// Current per-axis scale
    fn scale(&self) -> Vec3;

    /// Replace the scale and refresh the transform used by the next draw
    fn set_scale(&mut self, scale: Vec3);

    /// Called once after the frame's last draw
    fn end_frame(&mut self);
}

/// Which drawables take part in the planar reflection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReflectionSetup {
    /// Index of the reflective surface (the floor)
    pub surface: usize,
    /// Index of the object mirrored in it
    pub reflected: usize,
}

impl ReflectionSetup {
    fn validate(self, count: usize) -> RenderResult<()> {
        if self.surface >= count || self.reflected >= count || self.surface == self.reflected {
            return Err(RenderError::InvalidReflection(format!(
                "surface {} / reflected {} with {count} drawables",
                self.surface, self.reflected
            )));
        }
        Ok(())
    }
}

/// Mirrors a drawable vertically and puts the saved scale back on drop
struct MirroredScale<'a, D: Drawable + ?Sized> {
    drawable: &'a mut D,
    saved: Vec3,
}

impl<'a, D: Drawable + ?Sized> MirroredScale<'a, D> {
    fn new(drawable: &'a mut D) -> Self {
        let saved = drawable.scale();
        drawable.set_scale(Vec3::new(saved.x, -saved.y, saved.z));
        Self { drawable, saved }
    }
}

impl<D: Drawable + ?Sized> Drop for MirroredScale<'_, D> {
    fn drop(&mut self) {
        self.drawable.set_scale(self.saved);
    }
}

/// Draw `drawable` mirrored about the reflective plane
///
/// The original scale is restored whether the draw succeeds, fails or panics.
pub fn draw_mirrored<D: Drawable + ?Sized>(drawable: &mut D, frame: &FrameContext<'_>) -> RenderResult<()> {
    let mirrored = MirroredScale::new(drawable);
    mirrored.drawable.draw(frame, DrawPass::Mirrored)
}

/// Effect instances plus the active mode
pub struct Compositor {
    device: DeviceRef,
    motion_blur: CompositeEffect,
    blur: CompositeEffect,
    dizzy: CompositeEffect,
    mode: EffectMode,
}

impl Compositor {
    /// Build every effect at `width` x `height` from the configured shaders
    pub fn initialize(device: &DeviceRef, config: &EffectsConfig, width: u32, height: u32) -> RenderResult<Self> {
        let motion_blur = CompositeEffect::from_files(
            device,
            EffectKind::MotionBlur { samples: config.motion_blur_samples, intensity: config.motion_blur_intensity },
            &config.motion_blur_shaders.vertex,
            &config.motion_blur_shaders.fragment,
            width,
            height,
        )?;
        let blur = CompositeEffect::from_files(
            device,
            EffectKind::Blur,
            &config.blur_shaders.vertex,
            &config.blur_shaders.fragment,
            width,
            height,
        )?;
        let dizzy = CompositeEffect::from_files(
            device,
            EffectKind::Dizzy { radius: config.dizzy_radius },
            &config.dizzy_shaders.vertex,
            &config.dizzy_shaders.fragment,
            width,
            height,
        )?;
        Ok(Self::from_effects(device, motion_blur, blur, dizzy))
    }

    /// Assemble from effects that are already initialised
    pub fn from_effects(
        device: &DeviceRef,
        motion_blur: CompositeEffect,
        blur: CompositeEffect,
        dizzy: CompositeEffect,
    ) -> Self {
        Self { device: DeviceRef::clone(device), motion_blur, blur, dizzy, mode: EffectMode::None }
    }

    /// Select the effect for the following frames
    pub fn set_mode(&mut self, mode: EffectMode) {
        if mode != self.mode {
            log::info!("Effect mode: {} -> {mode}", self.mode);
            self.mode = mode;
        }
    }

    /// Active mode
    pub const fn mode(&self) -> EffectMode {
        self.mode
    }

    /// The composite effect behind `mode`, if it has one
    pub const fn effect(&self, mode: EffectMode) -> Option<&CompositeEffect> {
        match mode {
            EffectMode::MotionBlur => Some(&self.motion_blur),
            EffectMode::Blur => Some(&self.blur),
            EffectMode::Dizzy => Some(&self.dizzy),
            EffectMode::None | EffectMode::Reflection => None,
        }
    }

    /// Advance time-driven effects
    ///
    /// Dizzy only accumulates time while it is the active effect. Its clock is
    /// never reset, so switching away and back resumes where it stopped.
    pub fn update(&mut self, delta_time: f32) {
        if self.mode == EffectMode::Dizzy {
            self.dizzy.update(delta_time);
        }
    }

    /// Resize every effect's target, active or not
    pub fn resize(&mut self, width: u32, height: u32) {
        self.motion_blur.resize(width, height);
        self.blur.resize(width, height);
        self.dizzy.resize(width, height);
        log::debug!("Compositor resized to {width}x{height}");
    }

    /// Draw one frame through the active mode
    ///
    /// `reflection` names the surface and mirrored object; it is only used in
    /// [`EffectMode::Reflection`], and that mode degrades to a plain draw when
    /// it is `None`.
    pub fn render_frame<D: Drawable>(
        &self,
        frame: &FrameContext<'_>,
        drawables: &mut [D],
        reflection: Option<ReflectionSetup>,
    ) -> RenderResult<()> {
        let effect = self.effect(self.mode);
        match effect {
            Some(effect) => effect.pre_process(),
            None => {
                self.device.bind_framebuffer(None);
                self.device.apply_state(&StateChange::Enable(Capability::DepthTest));
            }
        }
        self.device.clear(ClearFlags::COLOR | ClearFlags::DEPTH);

        match (self.mode, reflection) {
            (EffectMode::Reflection, Some(setup)) => self.reflection_draw(frame, drawables, setup)?,
            _ => {
                for drawable in drawables.iter_mut() {
                    drawable.draw(frame, DrawPass::Primary)?;
                }
            }
        }

        if let Some(effect) = effect {
            effect.draw();
        }
        for drawable in drawables.iter_mut() {
            drawable.end_frame();
        }
        log::trace!("Frame rendered in {} mode", self.mode);
        Ok(())
    }

    fn reflection_draw<D: Drawable>(
        &self,
        frame: &FrameContext<'_>,
        drawables: &mut [D],
        setup: ReflectionSetup,
    ) -> RenderResult<()> {
        setup.validate(drawables.len())?;

        for (index, drawable) in drawables.iter_mut().enumerate() {
            if index != setup.surface {
                drawable.draw(frame, DrawPass::Primary)?;
            }
        }

        let device = self.device.as_ref();
        apply_sequence(device, REFLECTIVE_SURFACE);
        let surface = drawables[setup.surface].draw(frame, DrawPass::Primary);
        let mirrored = surface.and_then(|()| {
            apply_sequence(device, REFLECTED_OBJECT);
            draw_mirrored(&mut drawables[setup.reflected], frame)
        });
        apply_sequence(device, END_REFLECTION);
        mirrored
    }
}

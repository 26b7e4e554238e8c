//! Composite post-processing effect
//!
//! A [`CompositeEffect`] renders the scene into its own [`RenderTarget`] and
//! then draws a full-screen quad with a composite shader that samples the
//! target's textures. What differs between effects lives in
//! [`EffectVariant`]:
//!
//! - **texture section**: which color attachments the target gets
//! - **uniform upload**: per-frame values pushed to the composite shader
//! - **resize**: extra state derived from the screen size
//!
//! Every extension point runs the shared step first and the variant's step
//! second, so the base color attachment is always slot 0 / unit 0 and variant
//! attachments follow in declaration order.

use std::path::Path;

use crate::render::api::{DeviceRef, ProgramId, TextureFormat, TextureId, UniformLocation, UniformValue};
use crate::render::quad::FullScreenQuad;
use crate::render::shader::{ShaderProgram, ShaderSources};
use crate::render::target::{AttachmentSpec, RenderTarget};
use crate::render::state::{Capability, StateChange};
use crate::render::RenderResult;

/// Sampler uniform for the scene color texture
pub const COLOR_SAMPLER: &str = "colorTexture";
/// Sampler uniform for the motion blur speed texture
pub const SPEED_SAMPLER: &str = "speedTexture";

/// Default number of motion blur taps
pub const DEFAULT_BLUR_SAMPLES: i32 = 8;
/// Default motion blur displacement scale
pub const DEFAULT_BLUR_INTENSITY: f32 = 0.7;
/// Default dizzy swirl radius
pub const DEFAULT_DIZZY_RADIUS: f32 = 10.0;

const BASE_ATTACHMENT: AttachmentSpec = AttachmentSpec::new(0, COLOR_SAMPLER);
const SPEED_ATTACHMENT: AttachmentSpec = AttachmentSpec::new(1, SPEED_SAMPLER).with_format(TextureFormat::Rg16f);

/// Which effect to build, with its tunable parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EffectKind {
    /// Base composite; the blur kernel lives entirely in the shader
    Blur,
    /// Speed-buffer motion blur
    MotionBlur {
        /// Taps along the velocity vector
        samples: i32,
        /// Displacement scale
        intensity: f32,
    },
    /// Time-driven radial swirl
    Dizzy {
        /// Swirl radius
        radius: f32,
    },
}

impl EffectKind {
    /// Motion blur with default parameters
    pub const fn motion_blur() -> Self {
        Self::MotionBlur { samples: DEFAULT_BLUR_SAMPLES, intensity: DEFAULT_BLUR_INTENSITY }
    }

    /// Dizzy with the default radius
    pub const fn dizzy() -> Self {
        Self::Dizzy { radius: DEFAULT_DIZZY_RADIUS }
    }

    /// Short name for logs
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Blur => "blur",
            Self::MotionBlur { .. } => "motion blur",
            Self::Dizzy { .. } => "dizzy",
        }
    }

    /// Color attachments: the base color texture, then the variant's own
    pub fn texture_section(&self) -> Vec<AttachmentSpec> {
        let mut specs = vec![BASE_ATTACHMENT];
        if let Self::MotionBlur { .. } = self {
            specs.push(SPEED_ATTACHMENT);
        }
        specs
    }
}

/// Runtime state of an initialised effect
///
/// Uniform locations are captured once, right after the program links.
#[derive(Debug, Clone, PartialEq)]
pub enum EffectVariant {
    /// No extra state
    Blur,
    /// Motion blur parameters and the speed texture the scene writes to
    MotionBlur {
        /// Taps along the velocity vector
        samples: i32,
        /// Displacement scale
        intensity: f32,
        /// Attachment 1 of the target
        speed_texture: TextureId,
        /// `numberOfSamples`
        samples_uniform: UniformLocation,
        /// `intensity`
        intensity_uniform: UniformLocation,
    },
    /// Swirl parameters
    Dizzy {
        /// Accumulated seconds while the effect has been updated
        elapsed: f32,
        /// Swirl radius
        radius: f32,
        /// Screen height in pixels
        view_height: u32,
        /// `deltaTime`
        elapsed_uniform: UniformLocation,
        /// `radius`
        radius_uniform: UniformLocation,
        /// `viewHeight`
        view_height_uniform: UniformLocation,
    },
}

impl EffectVariant {
    fn bind(kind: EffectKind, shader: &ShaderProgram, target: &RenderTarget) -> Self {
        match kind {
            EffectKind::Blur => Self::Blur,
            EffectKind::MotionBlur { samples, intensity } => Self::MotionBlur {
                samples,
                intensity,
                speed_texture: target.attachments()[1].texture,
                samples_uniform: shader.uniform("numberOfSamples"),
                intensity_uniform: shader.uniform("intensity"),
            },
            EffectKind::Dizzy { radius } => Self::Dizzy {
                elapsed: 0.0,
                radius,
                view_height: target.size().1,
                elapsed_uniform: shader.uniform("deltaTime"),
                radius_uniform: shader.uniform("radius"),
                view_height_uniform: shader.uniform("viewHeight"),
            },
        }
    }

    fn upload_uniforms(&self, device: &DeviceRef) {
        match *self {
            Self::Blur => {}
            Self::MotionBlur { samples, intensity, samples_uniform, intensity_uniform, .. } => {
                device.set_uniform(samples_uniform, UniformValue::Int(samples));
                device.set_uniform(intensity_uniform, UniformValue::Float(intensity));
            }
            Self::Dizzy { elapsed, radius, view_height, elapsed_uniform, radius_uniform, view_height_uniform } => {
                device.set_uniform(elapsed_uniform, UniformValue::Float(elapsed));
                device.set_uniform(radius_uniform, UniformValue::Float(radius));
                device.set_uniform(view_height_uniform, UniformValue::Int(view_height as i32));
            }
        }
    }

    fn resize(&mut self, _width: u32, height: u32) {
        if let Self::Dizzy { view_height, .. } = self {
            *view_height = height;
        }
    }

    fn update(&mut self, delta_time: f32) {
        if let Self::Dizzy { elapsed, .. } = self {
            *elapsed += delta_time;
        }
    }
}

/// Offscreen target plus composite pass
pub struct CompositeEffect {
    device: DeviceRef,
    kind: EffectKind,
    shader: ShaderProgram,
    target: RenderTarget,
    quad: FullScreenQuad,
    samplers: Vec<UniformLocation>,
    variant: EffectVariant,
}

impl CompositeEffect {
    /// Compile the composite shader and allocate the target at `width` x `height`
    pub fn initialize(
        device: &DeviceRef,
        kind: EffectKind,
        sources: &ShaderSources,
        width: u32,
        height: u32,
    ) -> RenderResult<Self> {
        let shader = sources.compile_and_link(device)?;
        let target = RenderTarget::initialize(device, width, height, &kind.texture_section())?;
        let quad = FullScreenQuad::new(device, &shader)?;

        let samplers = target.attachments().iter().map(|a| shader.uniform(a.sampler)).collect();
        let variant = EffectVariant::bind(kind, &shader, &target);

        log::info!("Initialized {} effect ({width}x{height})", kind.name());
        Ok(Self { device: DeviceRef::clone(device), kind, shader, target, quad, samplers, variant })
    }

    /// Load the composite shader from disk and initialize
    pub fn from_files(
        device: &DeviceRef,
        kind: EffectKind,
        vertex_path: impl AsRef<Path>,
        fragment_path: impl AsRef<Path>,
        width: u32,
        height: u32,
    ) -> RenderResult<Self> {
        let mut sources = ShaderSources::new();
        sources.load_vertex_source(vertex_path)?.load_fragment_source(fragment_path)?;
        Self::initialize(device, kind, &sources, width, height)
    }

    /// Redirect scene drawing into this effect's target
    pub fn pre_process(&self) {
        self.target.bind_for_drawing();
        self.device.apply_state(&StateChange::Enable(Capability::DepthTest));
    }

    /// Composite the target's textures onto the screen
    pub fn draw(&self) {
        self.device.bind_framebuffer(None);
        self.shader.use_program();
        self.render_textures();
        self.variant.upload_uniforms(&self.device);
        self.quad.draw();
    }

    fn render_textures(&self) {
        for (unit, (attachment, sampler)) in self.target.attachments().iter().zip(&self.samplers).enumerate() {
            self.device.bind_texture(unit as u32, attachment.texture);
            self.device.set_uniform(*sampler, UniformValue::Int(unit as i32));
        }
    }

    /// Reallocate the target and refresh size-dependent state
    pub fn resize(&mut self, width: u32, height: u32) {
        self.target.resize(width, height);
        let (width, height) = self.target.size();
        self.variant.resize(width, height);
    }

    /// Advance time-driven state
    pub fn update(&mut self, delta_time: f32) {
        self.variant.update(delta_time);
    }

    /// The kind this effect was built from
    pub const fn kind(&self) -> EffectKind {
        self.kind
    }

    /// Runtime variant state
    pub const fn variant(&self) -> &EffectVariant {
        &self.variant
    }

    /// Offscreen target
    pub const fn target(&self) -> &RenderTarget {
        &self.target
    }

    /// Composite program handle
    pub const fn program(&self) -> ProgramId {
        self.shader.handle()
    }

    /// Sampler uniform handles, parallel to the target's attachments
    pub fn sampler_uniforms(&self) -> &[UniformLocation] {
        &self.samplers
    }

    /// Vertex attributes enabled around the composite draw
    pub fn attribute_count(&self) -> usize {
        self.quad.attribute_count()
    }
}

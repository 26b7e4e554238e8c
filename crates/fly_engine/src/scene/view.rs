//! The demo scene
//!
//! A [`View`] owns everything on screen: a camera, two point lights, four
//! meshes (the bat, the reflective floor, walls and columns) and the
//! [`Compositor`]. The window layer drives it with `update`, `draw` and
//! `resize`.

use crate::config::{CameraConfig, MeshConfig, ViewConfig};
use crate::foundation::math::Vec3;
use crate::render::api::DeviceRef;
use crate::render::compositor::{Compositor, FrameContext, ReflectionSetup};
use crate::render::lighting::{LightingBuffer, PointLight};
use crate::render::primitives::mesh::{DIFFUSE_SAMPLER, NORMAL_SAMPLER, SPECULAR_SAMPLER};
use crate::render::primitives::{Camera, Mesh};
use crate::render::state::{apply_sequence, SCENE_DEFAULTS};
use crate::render::RenderResult;
use crate::scene::FrameInput;

/// Index of the bat in [`View::meshes`]
pub const BAT: usize = 0;
/// Index of the floor
pub const FLOOR: usize = 1;
/// Index of the walls
pub const WALLS: usize = 2;
/// Index of the columns
pub const COLUMNS: usize = 3;

/// Index of the white light in [`View::lights`]
pub const WHITE_LIGHT: usize = 0;
/// Index of the red light
pub const RED_LIGHT: usize = 1;

/// The bat is mirrored in the floor
pub const REFLECTION: ReflectionSetup = ReflectionSetup { surface: FLOOR, reflected: BAT };

const RED_LIGHT_PEAK: f32 = 100_000.0;

/// Scene state and its per-frame driver
pub struct View {
    device: DeviceRef,
    camera: Camera,
    controls: CameraConfig,
    lights: Vec<PointLight>,
    meshes: Vec<Mesh>,
    lighting: LightingBuffer,
    compositor: Compositor,
    total_time: f32,
}

impl View {
    /// Load the scene described by `config` and build every effect
    pub fn new(device: &DeviceRef, config: &ViewConfig, width: u32, height: u32) -> RenderResult<Self> {
        apply_sequence(device.as_ref(), SCENE_DEFAULTS);
        device.set_clear_color([0.0, 0.0, 0.0, 1.0]);

        let scene = &config.scene;
        let meshes = [&scene.bat, &scene.floor, &scene.walls, &scene.columns]
            .into_iter()
            .map(|mesh| load_mesh(device, config, mesh))
            .collect::<RenderResult<Vec<Mesh>>>()?;

        let effects = config.effects.relative_to(&config.assets_dir);
        let compositor = Compositor::initialize(device, &effects, width, height)?;

        Ok(Self::from_parts(device, meshes, compositor, &config.camera, width, height))
    }

    /// Assemble a view from meshes and effects that are already built
    ///
    /// `meshes` are indexed by [`BAT`], [`FLOOR`], [`WALLS`] and [`COLUMNS`].
    pub fn from_parts(
        device: &DeviceRef,
        meshes: Vec<Mesh>,
        compositor: Compositor,
        camera: &CameraConfig,
        width: u32,
        height: u32,
    ) -> Self {
        let mut view = Self {
            device: DeviceRef::clone(device),
            camera: Camera::new(),
            controls: camera.clone(),
            lights: vec![
                PointLight::with(Vec3::new(300.0, 200.0, 50.0), Vec3::new(1.0, 1.0, 1.0), 10_000.0),
                PointLight::with(Vec3::new(-300.0, 200.0, 50.0), Vec3::new(1.0, 0.4, 0.4), RED_LIGHT_PEAK),
            ],
            meshes,
            lighting: LightingBuffer::new(),
            compositor,
            total_time: 0.0,
        };

        view.camera.set_position(camera.position);
        view.camera.set_rotation(camera.rotation);
        view.camera.set_fov(camera.fov);
        view.resize(width, height);
        view
    }

    /// Apply input and advance animation by `delta_time` seconds
    pub fn update(&mut self, delta_time: f32, input: &FrameInput) {
        self.total_time += delta_time;
        self.apply_input(delta_time, input);
        self.compositor.update(delta_time);

        let camera_position = self.camera.position();
        self.lights[WHITE_LIGHT].set_position(-camera_position);
        self.lights[RED_LIGHT].set_intensity((1.0 + self.total_time.sin()) * RED_LIGHT_PEAK);

        for mesh in &mut self.meshes {
            mesh.update();
        }
        self.camera.update();
        for light in &mut self.lights {
            light.update();
        }
    }

    fn apply_input(&mut self, delta_time: f32, input: &FrameInput) {
        let rotation_step = self.controls.rotation_speed * delta_time;
        let movement_step = self.controls.move_speed * delta_time;

        self.camera.rotate_by(input.camera_rotation * rotation_step);
        self.camera.move_by(input.camera_movement * movement_step);
        if let Some(bat) = self.meshes.get_mut(BAT) {
            bat.actor_mut().rotate_by(Vec3::new(0.0, input.object_rotation * rotation_step, 0.0));
        }

        let white = &mut self.lights[WHITE_LIGHT];
        if input.light_intensity_delta != 0.0 {
            white.adjust_intensity(input.light_intensity_delta);
        }
        if input.toggle_light {
            white.toggle();
        }
        if let Some(mode) = input.effect {
            self.compositor.set_mode(mode);
        }
    }

    /// Render the frame through the active effect
    pub fn draw(&mut self) -> RenderResult<()> {
        self.lighting.rebuild(&self.lights);
        let frame = FrameContext {
            projection: self.camera.projection_matrix(),
            view: *self.camera.view_matrix(),
            lights: &self.lighting,
        };
        let reflection = (self.meshes.len() > BAT.max(FLOOR)).then_some(REFLECTION);
        self.compositor.render_frame(&frame, &mut self.meshes, reflection)
    }

    /// React to a new framebuffer size
    pub fn resize(&mut self, width: u32, height: u32) {
        self.camera.set_screen_size(width, height);
        self.device.set_viewport(0, 0, width, height);
        self.compositor.resize(width, height);
    }

    /// Scene camera
    pub const fn camera(&self) -> &Camera {
        &self.camera
    }

    /// Lights, indexed by [`WHITE_LIGHT`] and [`RED_LIGHT`]
    pub fn lights(&self) -> &[PointLight] {
        &self.lights
    }

    /// Meshes, indexed by [`BAT`], [`FLOOR`], [`WALLS`] and [`COLUMNS`]
    pub fn meshes(&self) -> &[Mesh] {
        &self.meshes
    }

    /// Effect selection
    pub const fn compositor(&self) -> &Compositor {
        &self.compositor
    }

    /// Seconds accumulated by `update`
    pub const fn total_time(&self) -> f32 {
        self.total_time
    }
}

fn load_mesh(device: &DeviceRef, config: &ViewConfig, mesh: &MeshConfig) -> RenderResult<Mesh> {
    let shaders = config.scene.mesh_shaders.relative_to(&config.assets_dir);
    let mut loaded = Mesh::from_files(device, config.asset_path(&mesh.model), &shaders.vertex, &shaders.fragment)
        .map_err(|e| {
            log::error!("Failed to load mesh {}: {e}", mesh.model.display());
            e
        })?;
    loaded.load_texture(config.asset_path(&mesh.diffuse), DIFFUSE_SAMPLER)?;
    loaded.load_texture(config.asset_path(&mesh.specular), SPECULAR_SAMPLER)?;
    loaded.load_texture(config.asset_path(&mesh.normal), NORMAL_SAMPLER)?;
    Ok(loaded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{compute_tangents, index_triangles, ObjLoader};
    use crate::render::backends::{DeviceCommand, RecordingDevice};
    use crate::render::post::{CompositeEffect, EffectKind, EffectMode};
    use crate::render::shader::ShaderSources;
    use approx::assert_relative_eq;
    use std::rc::Rc;

    const TRIANGLE: &str = "v 0 0 0\nv 1 0 0\nv 0 1 0\nvt 0 0\nvt 1 0\nvt 0 1\nvn 0 0 1\nf 1/1/1 2/2/1 3/3/1\n";

    fn build_view() -> (Rc<RecordingDevice>, View) {
        let recorder = Rc::new(RecordingDevice::new());
        let device: DeviceRef = recorder.clone();
        let sources = ShaderSources::from_strings("v", "f");

        let soup = ObjLoader::parse(TRIANGLE.as_bytes()).unwrap();
        let data = index_triangles(&soup, &compute_tangents(&soup));
        let meshes = (0..4)
            .map(|_| Mesh::new(&device, &data, sources.compile_and_link(&device).unwrap()).unwrap())
            .collect();

        let effect = |kind| CompositeEffect::initialize(&device, kind, &sources, 640, 400).unwrap();
        let compositor =
            Compositor::from_effects(&device, effect(EffectKind::motion_blur()), effect(EffectKind::Blur), effect(EffectKind::dizzy()));

        let view = View::from_parts(&device, meshes, compositor, &CameraConfig::default(), 640, 400);
        (recorder, view)
    }

    #[test]
    fn test_construction_applies_camera_config() {
        let (recorder, view) = build_view();
        assert_eq!(view.camera().position(), Vec3::new(-60.0, -160.0, -230.0));
        assert_relative_eq!(view.camera().aspect(), 1.6);
        assert_eq!(view.compositor().mode(), EffectMode::None);
        assert!(recorder.commands().contains(&DeviceCommand::Viewport { x: 0, y: 0, width: 640, height: 400 }));
    }

    #[test]
    fn test_update_drives_lights() {
        let (_, mut view) = build_view();
        view.update(0.5, &FrameInput::idle());

        let white = &view.lights()[WHITE_LIGHT];
        assert_eq!(white.position(), -view.camera().position());
        let red = &view.lights()[RED_LIGHT];
        assert_relative_eq!(red.intensity(), (1.0 + 0.5_f32.sin()) * 100_000.0, max_relative = 1e-6);
    }

    #[test]
    fn test_input_scales_with_speed_and_time() {
        let (_, mut view) = build_view();
        let start = view.camera().position();
        let input = FrameInput { camera_movement: Vec3::new(0.0, 0.0, 1.0), object_rotation: -1.0, ..FrameInput::idle() };
        view.update(0.1, &input);

        assert_relative_eq!(view.camera().position().z - start.z, 10.0, epsilon = 1e-4);
        assert_relative_eq!(view.meshes()[BAT].actor().rotation().y, -20.0, epsilon = 1e-4);
    }

    #[test]
    fn test_light_toggle_and_intensity() {
        let (_, mut view) = build_view();
        view.update(0.0, &FrameInput { light_intensity_delta: 100.0, ..FrameInput::idle() });
        assert_eq!(view.lights()[WHITE_LIGHT].intensity(), 10_100.0);

        view.update(0.0, &FrameInput { toggle_light: true, ..FrameInput::idle() });
        assert_eq!(view.lights()[WHITE_LIGHT].intensity(), 0.0);
        view.update(0.0, &FrameInput { toggle_light: true, ..FrameInput::idle() });
        assert_eq!(view.lights()[WHITE_LIGHT].intensity(), 10_100.0);
    }

    #[test]
    fn test_reflection_mode_draws_bat_twice() {
        let (recorder, mut view) = build_view();
        view.update(0.016, &FrameInput { effect: Some(EffectMode::Reflection), ..FrameInput::idle() });
        recorder.clear_commands();
        view.draw().unwrap();

        assert_eq!(recorder.count(|c| matches!(c, DeviceCommand::DrawElements { .. })), 5);
        assert_eq!(view.meshes()[BAT].actor().scale(), Vec3::new(1.0, 1.0, 1.0));
    }

    #[test]
    fn test_draw_uploads_two_lights() {
        let (recorder, mut view) = build_view();
        view.update(0.016, &FrameInput::idle());
        view.draw().unwrap();

        let program = view.meshes()[WALLS].shader().handle();
        assert_eq!(
            recorder.uniform_by_name(program, "numberOfLights"),
            Some(crate::render::api::UniformValue::Int(2))
        );
    }

    #[test]
    fn test_resize_reaches_camera_and_effects() {
        let (recorder, mut view) = build_view();
        view.resize(1024, 768);
        assert_relative_eq!(view.camera().aspect(), 1024.0 / 768.0);
        let target = view.compositor().effect(EffectMode::Blur).unwrap().target();
        assert_eq!(recorder.texture_size(target.attachments()[0].texture), Some((1024, 768)));
    }

    #[test]
    fn test_minimised_window_still_draws() {
        let (recorder, mut view) = build_view();
        view.resize(0, 0);
        assert!(view.camera().projection_matrix().iter().all(|v| v.is_finite()));

        for mode in [EffectMode::None, EffectMode::Reflection, EffectMode::MotionBlur, EffectMode::Blur, EffectMode::Dizzy] {
            view.update(0.016, &FrameInput { effect: Some(mode), ..FrameInput::idle() });
            recorder.clear_commands();
            view.draw().unwrap();
            assert!(recorder.count(|c| matches!(c, DeviceCommand::DrawElements { .. })) >= 4, "{mode:?}");
        }
    }
}

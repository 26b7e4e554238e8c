//! Tests for the compositor frame sequence against the recording device

#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::foundation::math::{Mat4, Vec3};
    use crate::render::api::Primitive;
    use crate::render::backends::DeviceCommand;
    use crate::render::compositor::draw_mirrored;
    use crate::render::post::EffectVariant;
    use crate::render::shader::ShaderSources;
    use crate::render::state::{Capability, END_REFLECTION, REFLECTED_OBJECT, REFLECTIVE_SURFACE};
    use std::panic::{self, AssertUnwindSafe};
    use std::rc::Rc;

    /// Drawable that leaves a `draw_elements(Triangles, marker)` call in the log
    struct MarkerMesh {
        device: DeviceRef,
        marker: i32,
        scale: Vec3,
        fail_mirrored: bool,
        draws: Vec<(DrawPass, Vec3)>,
        frames_ended: usize,
    }

    impl MarkerMesh {
        fn new(device: &DeviceRef, marker: i32) -> Self {
            Self {
                device: DeviceRef::clone(device),
                marker,
                scale: Vec3::new(1.0, 1.0, 1.0),
                fail_mirrored: false,
                draws: Vec::new(),
                frames_ended: 0,
            }
        }
    }

    impl Drawable for MarkerMesh {
        fn draw(&mut self, _frame: &FrameContext<'_>, pass: DrawPass) -> RenderResult<()> {
            self.draws.push((pass, self.scale));
            self.device.draw_elements(Primitive::Triangles, self.marker);
            if self.fail_mirrored && pass == DrawPass::Mirrored {
                return Err(RenderError::BackendError("mirrored draw failed".to_string()));
            }
            Ok(())
        }

        fn scale(&self) -> Vec3 {
            self.scale
        }

        fn set_scale(&mut self, scale: Vec3) {
            self.scale = scale;
        }

        fn end_frame(&mut self) {
            self.frames_ended += 1;
        }
    }

    #[derive(Debug, PartialEq)]
    enum Event {
        Draw(i32),
        State(StateChange),
    }

    const BAT: i32 = 10;
    const FLOOR: i32 = 20;
    const WALLS: i32 = 30;
    const REFLECTION: ReflectionSetup = ReflectionSetup { surface: 1, reflected: 0 };

    fn setup() -> (Rc<RecordingDevice>, DeviceRef, Compositor) {
        let recorder = Rc::new(RecordingDevice::new());
        let device: DeviceRef = recorder.clone();
        let sources = ShaderSources::from_strings("void main() {}", "void main() {}");
        let effect = |kind| CompositeEffect::initialize(&device, kind, &sources, 320, 200).unwrap();
        let compositor = Compositor::from_effects(
            &device,
            effect(EffectKind::motion_blur()),
            effect(EffectKind::Blur),
            effect(EffectKind::dizzy()),
        );
        recorder.clear_commands();
        (recorder, device, compositor)
    }

    fn scene(device: &DeviceRef) -> Vec<MarkerMesh> {
        vec![MarkerMesh::new(device, BAT), MarkerMesh::new(device, FLOOR), MarkerMesh::new(device, WALLS)]
    }

    fn draw_markers(recorder: &RecordingDevice) -> Vec<i32> {
        recorder
            .commands()
            .into_iter()
            .filter_map(|c| match c {
                DeviceCommand::DrawElements { primitive: Primitive::Triangles, count } => Some(count),
                _ => None,
            })
            .collect()
    }

    fn timeline(recorder: &RecordingDevice) -> Vec<Event> {
        recorder
            .commands()
            .into_iter()
            .filter_map(|c| match c {
                DeviceCommand::DrawElements { count, .. } => Some(Event::Draw(count)),
                DeviceCommand::State(change) => Some(Event::State(change)),
                _ => None,
            })
            .collect()
    }

    fn states(changes: &[StateChange]) -> Vec<Event> {
        changes.iter().copied().map(Event::State).collect()
    }

    #[test]
    fn test_plain_frame_goes_to_screen() {
        let (recorder, device, compositor) = setup();
        let lights = LightingBuffer::new();
        let frame = FrameContext { projection: Mat4::identity(), view: Mat4::identity(), lights: &lights };
        let mut drawables = scene(&device);

        compositor.render_frame(&frame, &mut drawables, None).unwrap();

        let commands = recorder.commands();
        assert_eq!(commands[0], DeviceCommand::BindFramebuffer(None));
        assert_eq!(commands[1], DeviceCommand::State(StateChange::Enable(Capability::DepthTest)));
        assert_eq!(commands[2], DeviceCommand::State(StateChange::Clear(ClearFlags::COLOR | ClearFlags::DEPTH)));
        assert_eq!(draw_markers(&recorder), vec![BAT, FLOOR, WALLS]);
        assert_eq!(recorder.count(|c| matches!(c, DeviceCommand::DrawArrays { .. })), 0);
        assert!(drawables.iter().all(|d| d.frames_ended == 1 && d.draws == vec![(DrawPass::Primary, d.scale)]));
    }

    #[test]
    fn test_effect_wraps_scene_draw() {
        let (recorder, device, mut compositor) = setup();
        compositor.set_mode(EffectMode::Blur);
        let lights = LightingBuffer::new();
        let frame = FrameContext { projection: Mat4::identity(), view: Mat4::identity(), lights: &lights };
        let mut drawables = scene(&device);

        compositor.render_frame(&frame, &mut drawables, None).unwrap();

        let target = compositor.effect(EffectMode::Blur).unwrap().target().framebuffer();
        let commands = recorder.commands();
        let position = |wanted: &DeviceCommand| commands.iter().position(|c| c == wanted).unwrap();
        let last_draw = commands.iter().rposition(|c| matches!(c, DeviceCommand::DrawElements { .. })).unwrap();
        let composite = commands.iter().position(|c| matches!(c, DeviceCommand::DrawArrays { .. })).unwrap();

        assert_eq!(commands[0], DeviceCommand::BindFramebuffer(Some(target)));
        assert!(last_draw < position(&DeviceCommand::BindFramebuffer(None)));
        assert!(position(&DeviceCommand::BindFramebuffer(None)) < composite);
        assert_eq!(recorder.bound_framebuffer(), None);
        assert!(drawables.iter().all(|d| d.frames_ended == 1));
    }

    #[test]
    fn test_motion_blur_composite_uploads_parameters() {
        let (recorder, device, mut compositor) = setup();
        compositor.set_mode(EffectMode::MotionBlur);
        let lights = LightingBuffer::new();
        let frame = FrameContext { projection: Mat4::identity(), view: Mat4::identity(), lights: &lights };

        compositor.render_frame(&frame, &mut scene(&device), None).unwrap();

        let effect = compositor.effect(EffectMode::MotionBlur).unwrap();
        assert_eq!(recorder.uniform_by_name(effect.program(), "numberOfSamples"), Some(UniformValue::Int(8)));
        assert_eq!(recorder.uniform_by_name(effect.program(), "intensity"), Some(UniformValue::Float(0.7)));
        assert_eq!(recorder.texture_on_unit(1), Some(effect.target().attachments()[1].texture));
    }

    #[test]
    fn test_reflection_state_sequence() {
        let (recorder, device, mut compositor) = setup();
        compositor.set_mode(EffectMode::Reflection);
        let lights = LightingBuffer::new();
        let frame = FrameContext { projection: Mat4::identity(), view: Mat4::identity(), lights: &lights };
        let mut drawables = scene(&device);
        drawables[0].scale = Vec3::new(2.0, 0.5, 3.0);

        compositor.render_frame(&frame, &mut drawables, Some(REFLECTION)).unwrap();

        let mut expected = vec![
            Event::State(StateChange::Enable(Capability::DepthTest)),
            Event::State(StateChange::Clear(ClearFlags::COLOR | ClearFlags::DEPTH)),
            Event::Draw(BAT),
            Event::Draw(WALLS),
        ];
        expected.extend(states(REFLECTIVE_SURFACE));
        expected.push(Event::Draw(FLOOR));
        expected.extend(states(REFLECTED_OBJECT));
        expected.push(Event::Draw(BAT));
        expected.extend(states(END_REFLECTION));
        assert_eq!(timeline(&recorder), expected);

        let bat = &drawables[0];
        assert_eq!(bat.draws[1], (DrawPass::Mirrored, Vec3::new(2.0, -0.5, 3.0)));
        assert_eq!(bat.scale, Vec3::new(2.0, 0.5, 3.0));
        assert_eq!(bat.frames_ended, 1);
        assert!(!recorder.is_enabled(Capability::StencilTest));
        assert!(!recorder.is_enabled(Capability::Blend));
    }

    #[test]
    fn test_failed_mirrored_draw_still_restores() {
        let (recorder, device, mut compositor) = setup();
        compositor.set_mode(EffectMode::Reflection);
        let lights = LightingBuffer::new();
        let frame = FrameContext { projection: Mat4::identity(), view: Mat4::identity(), lights: &lights };
        let mut drawables = scene(&device);
        drawables[0].scale = Vec3::new(0.1, 0.3, 0.7);
        drawables[0].fail_mirrored = true;

        let result = compositor.render_frame(&frame, &mut drawables, Some(REFLECTION));

        assert!(matches!(result, Err(RenderError::BackendError(_))));
        assert_eq!(drawables[0].scale.y.to_bits(), 0.3_f32.to_bits());
        assert!(!recorder.is_enabled(Capability::StencilTest));
        assert!(!recorder.is_enabled(Capability::Blend));
        assert!(recorder.depth_writes_enabled());
    }

    #[test]
    fn test_mirrored_scale_survives_panic() {
        struct Exploding {
            scale: Vec3,
        }

        impl Drawable for Exploding {
            fn draw(&mut self, _frame: &FrameContext<'_>, _pass: DrawPass) -> RenderResult<()> {
                panic!("draw failed");
            }
            fn scale(&self) -> Vec3 {
                self.scale
            }
            fn set_scale(&mut self, scale: Vec3) {
                self.scale = scale;
            }
            fn end_frame(&mut self) {}
        }

        let lights = LightingBuffer::new();
        let frame = FrameContext { projection: Mat4::identity(), view: Mat4::identity(), lights: &lights };
        let mut exploding = Exploding { scale: Vec3::new(1.0, 4.0, 1.0) };

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| draw_mirrored(&mut exploding, &frame)));

        assert!(outcome.is_err());
        assert_eq!(exploding.scale, Vec3::new(1.0, 4.0, 1.0));
    }

    #[test]
    fn test_invalid_reflection_setup_is_rejected() {
        let (recorder, device, mut compositor) = setup();
        compositor.set_mode(EffectMode::Reflection);
        let lights = LightingBuffer::new();
        let frame = FrameContext { projection: Mat4::identity(), view: Mat4::identity(), lights: &lights };

        for setup in [
            ReflectionSetup { surface: 1, reflected: 1 },
            ReflectionSetup { surface: 3, reflected: 0 },
            ReflectionSetup { surface: 0, reflected: 7 },
        ] {
            let result = compositor.render_frame(&frame, &mut scene(&device), Some(setup));
            assert!(matches!(result, Err(RenderError::InvalidReflection(_))));
        }
        assert_eq!(
            recorder.count(|c| *c == DeviceCommand::State(StateChange::Enable(Capability::StencilTest))),
            0
        );
    }

    #[test]
    fn test_reflection_without_setup_draws_plainly() {
        let (recorder, device, mut compositor) = setup();
        compositor.set_mode(EffectMode::Reflection);
        let lights = LightingBuffer::new();
        let frame = FrameContext { projection: Mat4::identity(), view: Mat4::identity(), lights: &lights };

        compositor.render_frame(&frame, &mut scene(&device), None).unwrap();

        assert_eq!(draw_markers(&recorder), vec![BAT, FLOOR, WALLS]);
    }

    #[test]
    fn test_mode_switch_allocates_nothing() {
        let (recorder, device, mut compositor) = setup();
        let lights = LightingBuffer::new();
        let frame = FrameContext { projection: Mat4::identity(), view: Mat4::identity(), lights: &lights };
        let programs = recorder.programs_compiled();
        let live = recorder.live_objects();
        let mut drawables = scene(&device);

        for mode in [
            EffectMode::MotionBlur,
            EffectMode::Reflection,
            EffectMode::Blur,
            EffectMode::Dizzy,
            EffectMode::None,
            EffectMode::Dizzy,
        ] {
            compositor.set_mode(mode);
            compositor.update(0.016);
            compositor.render_frame(&frame, &mut drawables, Some(REFLECTION)).unwrap();
        }

        assert_eq!(recorder.programs_compiled(), programs);
        assert_eq!(recorder.live_objects(), live);
        assert_eq!(
            recorder.count(|c| matches!(
                c,
                DeviceCommand::QueryUniform { .. } | DeviceCommand::CreateTexture { .. } | DeviceCommand::CreateFramebuffer(_)
            )),
            0
        );
        assert!(drawables.iter().all(|d| d.frames_ended == 6));
    }

    #[test]
    fn test_dizzy_time_only_runs_while_active() {
        let (_, _, mut compositor) = setup();
        let elapsed = |compositor: &Compositor| match compositor.effect(EffectMode::Dizzy).unwrap().variant() {
            EffectVariant::Dizzy { elapsed, .. } => *elapsed,
            other => panic!("unexpected variant {other:?}"),
        };

        compositor.update(1.0);
        assert_eq!(elapsed(&compositor), 0.0);

        compositor.set_mode(EffectMode::Dizzy);
        compositor.update(0.5);
        compositor.set_mode(EffectMode::Blur);
        compositor.update(2.0);
        compositor.set_mode(EffectMode::Dizzy);
        compositor.update(0.25);

        assert_eq!(elapsed(&compositor), 0.75);
    }

    #[test]
    fn test_resize_reaches_inactive_effects() {
        let (recorder, _, mut compositor) = setup();
        compositor.set_mode(EffectMode::Blur);

        compositor.resize(800, 600);

        for mode in [EffectMode::MotionBlur, EffectMode::Blur, EffectMode::Dizzy] {
            let target = compositor.effect(mode).unwrap().target();
            assert_eq!(target.size(), (800, 600));
            for attachment in target.attachments() {
                assert_eq!(recorder.texture_size(attachment.texture), Some((800, 600)));
            }
        }
        assert!(matches!(
            compositor.effect(EffectMode::Dizzy).unwrap().variant(),
            EffectVariant::Dizzy { view_height: 600, .. }
        ));
    }
}

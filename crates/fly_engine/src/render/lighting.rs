//! Point lights and the per-frame lighting buffer
//!
//! Lights are plain actors with a colour and an intensity. Once per frame,
//! before any mesh draws, the scene flattens its live lights into a
//! [`LightingBuffer`]; meshes only ever read the buffer, and only its first
//! [`LightingBuffer::count`] entries.

use crate::foundation::math::Vec3;

use super::primitives::Actor;

/// Maximum number of lights uploaded to mesh shaders
pub const MAX_LIGHTS: usize = 8;

/// Intensity of a freshly created light
pub const DEFAULT_INTENSITY: f32 = 60.0;

/// Omnidirectional light with an on/off switch
///
/// The light remembers the last intensity it was asked for. While switched
/// off it emits nothing, and [`PointLight::turn_on`] brings back the
/// remembered value.
#[derive(Debug, Clone)]
pub struct PointLight {
    actor: Actor,
    color: Vec3,
    intensity: f32,
    requested_intensity: f32,
    enabled: bool,
}

impl Default for PointLight {
    fn default() -> Self {
        Self {
            actor: Actor::new(),
            color: Vec3::zeros(),
            intensity: DEFAULT_INTENSITY,
            requested_intensity: DEFAULT_INTENSITY,
            enabled: true,
        }
    }
}

impl PointLight {
    /// Black light at the origin with the default intensity
    pub fn new() -> Self {
        Self::default()
    }

    /// Light at `position` with `color` and `intensity`
    pub fn with(position: Vec3, color: Vec3, intensity: f32) -> Self {
        let mut light = Self::new();
        light.set_position(position);
        light.set_color(color);
        light.set_intensity(intensity);
        light
    }

    /// Change the emitted colour
    pub fn set_color(&mut self, color: Vec3) {
        self.color = color;
    }

    /// Emitted colour
    pub const fn color(&self) -> Vec3 {
        self.color
    }

    /// Request a new intensity
    ///
    /// Takes effect immediately when the light is on, otherwise on the next
    /// [`PointLight::turn_on`].
    pub fn set_intensity(&mut self, intensity: f32) {
        self.requested_intensity = intensity;
        if self.enabled {
            self.intensity = intensity;
        }
    }

    /// Change the requested intensity by `delta`
    pub fn adjust_intensity(&mut self, delta: f32) {
        self.set_intensity(self.requested_intensity + delta);
    }

    /// Intensity currently emitted (zero while off)
    pub const fn intensity(&self) -> f32 {
        self.intensity
    }

    /// Last intensity asked for, whether or not the light is on
    pub const fn requested_intensity(&self) -> f32 {
        self.requested_intensity
    }

    /// Switch on at the remembered intensity
    pub fn turn_on(&mut self) {
        self.enabled = true;
        self.intensity = self.requested_intensity;
    }

    /// Switch off
    pub fn turn_off(&mut self) {
        self.enabled = false;
        self.intensity = 0.0;
    }

    /// Flip between on and off
    pub fn toggle(&mut self) {
        if self.enabled {
            self.turn_off();
        } else {
            self.turn_on();
        }
        log::debug!("Light switched {}", if self.enabled { "on" } else { "off" });
    }

    /// Whether the light is on
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Light position
    pub const fn position(&self) -> Vec3 {
        self.actor.position()
    }

    /// Place the light
    pub fn set_position(&mut self, position: Vec3) {
        self.actor.set_position(position);
    }

    /// Refresh the cached transform
    pub fn update(&mut self) {
        self.actor.update();
    }
}

/// Flattened light data in the layout mesh shaders expect
///
/// Capacity is fixed at [`MAX_LIGHTS`]; the accessors return slices truncated
/// to the live count so stale slots are never uploaded.
#[derive(Debug, Clone, PartialEq)]
pub struct LightingBuffer {
    positions: [f32; MAX_LIGHTS * 3],
    colors: [f32; MAX_LIGHTS * 3],
    intensities: [f32; MAX_LIGHTS],
    count: usize,
}

impl Default for LightingBuffer {
    fn default() -> Self {
        Self {
            positions: [0.0; MAX_LIGHTS * 3],
            colors: [0.0; MAX_LIGHTS * 3],
            intensities: [0.0; MAX_LIGHTS],
            count: 0,
        }
    }
}

impl LightingBuffer {
    /// Empty buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the contents with `lights`, keeping at most [`MAX_LIGHTS`]
    pub fn rebuild(&mut self, lights: &[PointLight]) {
        if lights.len() > MAX_LIGHTS {
            log::warn!("{} lights in scene, only the first {MAX_LIGHTS} are used", lights.len());
        }

        self.count = lights.len().min(MAX_LIGHTS);
        for (i, light) in lights.iter().take(MAX_LIGHTS).enumerate() {
            self.positions[i * 3..i * 3 + 3].copy_from_slice(light.position().as_slice());
            self.colors[i * 3..i * 3 + 3].copy_from_slice(light.color().as_slice());
            self.intensities[i] = light.intensity();
        }
    }

    /// Number of live lights
    pub const fn count(&self) -> usize {
        self.count
    }

    /// `count` positions, three floats each
    pub fn positions(&self) -> &[f32] {
        &self.positions[..self.count * 3]
    }

    /// `count` colours, three floats each
    pub fn colors(&self) -> &[f32] {
        &self.colors[..self.count * 3]
    }

    /// `count` intensities
    pub fn intensities(&self) -> &[f32] {
        &self.intensities[..self.count]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_switch_remembers_requested_intensity() {
        let mut light = PointLight::new();
        light.set_intensity(500.0);
        light.turn_off();
        assert_eq!(light.intensity(), 0.0);

        light.set_intensity(800.0);
        assert_eq!(light.intensity(), 0.0);

        light.toggle();
        assert!(light.is_enabled());
        assert_eq!(light.intensity(), 800.0);
    }

    #[test]
    fn test_adjust_while_off_builds_on_requested_value() {
        let mut light = PointLight::new();
        light.set_intensity(10_000.0);
        light.turn_off();
        light.adjust_intensity(100.0);
        light.turn_on();
        assert_eq!(light.intensity(), 10_100.0);
    }

    #[test]
    fn test_rebuild_is_count_driven() {
        let mut buffer = LightingBuffer::new();
        let lights = vec![
            PointLight::with(Vec3::new(1.0, 2.0, 3.0), Vec3::new(1.0, 1.0, 1.0), 10.0),
            PointLight::with(Vec3::new(4.0, 5.0, 6.0), Vec3::new(1.0, 0.4, 0.4), 20.0),
        ];
        buffer.rebuild(&lights);

        assert_eq!(buffer.count(), 2);
        assert_eq!(buffer.positions(), &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!(buffer.colors(), &[1.0, 1.0, 1.0, 1.0, 0.4, 0.4]);
        assert_eq!(buffer.intensities(), &[10.0, 20.0]);

        buffer.rebuild(&lights[..1]);
        assert_eq!(buffer.count(), 1);
        assert_eq!(buffer.intensities(), &[10.0]);
    }

    #[test]
    fn test_rebuild_caps_at_max_lights() {
        let lights: Vec<PointLight> = (0..12)
            .map(|i| PointLight::with(Vec3::new(i as f32, 0.0, 0.0), Vec3::new(1.0, 1.0, 1.0), i as f32))
            .collect();
        let mut buffer = LightingBuffer::new();
        buffer.rebuild(&lights);

        assert_eq!(buffer.count(), MAX_LIGHTS);
        assert_eq!(buffer.positions().len(), MAX_LIGHTS * 3);
        assert_eq!(buffer.intensities().last(), Some(&7.0));
    }
}

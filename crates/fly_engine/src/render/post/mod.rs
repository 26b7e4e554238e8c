//! Post-processing
//!
//! [`CompositeEffect`] is the render-to-texture-then-composite protocol;
//! [`EffectMode`] is the per-frame selection between the effects, the
//! reflection path and plain rendering.

pub mod effect;
pub mod mode;

pub use effect::{CompositeEffect, EffectKind, EffectVariant, COLOR_SAMPLER, SPEED_SAMPLER};
pub use mode::EffectMode;

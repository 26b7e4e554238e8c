//! Active rendering mode

use std::fmt;

/// What the compositor does with the next frame
///
/// Exactly one mode is active at a time. Switching is a plain assignment:
/// every effect is initialised up front and simply not invoked while inactive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum EffectMode {
    /// Draw straight to the screen
    #[default]
    None = 0,
    /// Stencil-masked planar reflection, no post-processing
    Reflection = 1,
    /// Speed-buffer motion blur
    MotionBlur = 2,
    /// Full-screen blur
    Blur = 3,
    /// Radial swirl
    Dizzy = 4,
}

impl EffectMode {
    /// Every mode, in discriminant order
    pub const ALL: [Self; 5] = [Self::None, Self::Reflection, Self::MotionBlur, Self::Blur, Self::Dizzy];

    /// Mode bound to a number key (`0`-`4`)
    ///
    /// The key order differs from the discriminants: 1 is motion blur and 2 is
    /// reflection.
    pub const fn from_digit(digit: u8) -> Option<Self> {
        match digit {
            0 => Some(Self::None),
            1 => Some(Self::MotionBlur),
            2 => Some(Self::Reflection),
            3 => Some(Self::Blur),
            4 => Some(Self::Dizzy),
            _ => None,
        }
    }

    /// Whether this mode renders through a composite effect
    pub const fn uses_composite(self) -> bool {
        matches!(self, Self::MotionBlur | Self::Blur | Self::Dizzy)
    }
}

impl fmt::Display for EffectMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::None => "none",
            Self::Reflection => "reflection",
            Self::MotionBlur => "motion blur",
            Self::Blur => "blur",
            Self::Dizzy => "dizzy",
        };
        f.write_str(name)
    }
}

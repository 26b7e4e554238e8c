//! Configuration system
//!
//! Every section has serde defaults, so a config file only needs the keys it
//! changes and a missing file means "all defaults".

use std::path::{Path, PathBuf};

pub use serde::{Deserialize, Serialize};

use crate::foundation::math::Vec3;
use crate::render::post::effect::{DEFAULT_BLUR_INTENSITY, DEFAULT_BLUR_SAMPLES, DEFAULT_DIZZY_RADIUS};

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file, format chosen by extension
    fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;

        match extension(path) {
            Some("toml") => toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string())),
            Some("ron") => ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string())),
            _ => Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        }
    }

    /// Save configuration to file, format chosen by extension
    fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let contents = match extension(path) {
            Some("toml") => toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?,
            Some("ron") => ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?,
            _ => return Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        };

        std::fs::write(path, contents).map_err(ConfigError::Io)
    }

    /// Load `path`, or fall back to defaults when the file does not exist
    fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if path.exists() {
            Self::load_from_file(path)
        } else {
            log::info!("No config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }
}

fn extension(path: &Path) -> Option<&str> {
    path.extension().and_then(|ext| ext.to_str())
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// A value is outside its valid range
    #[error("Invalid value for {field}: {reason}")]
    Invalid {
        /// Dotted key of the offending value
        field: &'static str,
        /// What is wrong with it
        reason: String,
    },
}

/// Window creation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Title bar text
    pub title: String,
    /// Initial width in pixels
    pub width: u32,
    /// Initial height in pixels
    pub height: u32,
    /// Wait for vertical sync when presenting
    pub vsync: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self { title: "FlyEngine".to_string(), width: 640, height: 400, vsync: true }
    }
}

/// Initial camera placement and control speeds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Starting position
    pub position: Vec3,
    /// Starting Euler angles in degrees
    pub rotation: Vec3,
    /// Vertical field of view in degrees
    pub fov: f32,
    /// Units per second for W/S/A/D/F/R
    pub move_speed: f32,
    /// Degrees per second for I/K/J/L and object rotation
    pub rotation_speed: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: Vec3::new(-60.0, -160.0, -230.0),
            rotation: Vec3::new(20.0, -10.0, 0.0),
            fov: 45.0,
            move_speed: 100.0,
            rotation_speed: 200.0,
        }
    }
}

/// Vertex and fragment shader files
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShaderPaths {
    /// Vertex stage
    pub vertex: PathBuf,
    /// Fragment stage
    pub fragment: PathBuf,
}

impl ShaderPaths {
    /// Pair of paths
    pub fn new(vertex: impl Into<PathBuf>, fragment: impl Into<PathBuf>) -> Self {
        Self { vertex: vertex.into(), fragment: fragment.into() }
    }

    /// Both paths joined onto `root`
    pub fn relative_to(&self, root: &Path) -> Self {
        Self { vertex: root.join(&self.vertex), fragment: root.join(&self.fragment) }
    }
}

/// Post-processing parameters and composite shaders
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectsConfig {
    /// Motion blur taps
    pub motion_blur_samples: i32,
    /// Motion blur displacement scale
    pub motion_blur_intensity: f32,
    /// Dizzy swirl radius
    pub dizzy_radius: f32,
    /// Motion blur composite program
    pub motion_blur_shaders: ShaderPaths,
    /// Blur composite program
    pub blur_shaders: ShaderPaths,
    /// Dizzy composite program
    pub dizzy_shaders: ShaderPaths,
}

impl Default for EffectsConfig {
    fn default() -> Self {
        Self {
            motion_blur_samples: DEFAULT_BLUR_SAMPLES,
            motion_blur_intensity: DEFAULT_BLUR_INTENSITY,
            dizzy_radius: DEFAULT_DIZZY_RADIUS,
            motion_blur_shaders: ShaderPaths::new("shaders/motionBlurVertex.glsl", "shaders/motionBlurFragment.glsl"),
            blur_shaders: ShaderPaths::new("shaders/blurVertex.glsl", "shaders/blurFragment.glsl"),
            dizzy_shaders: ShaderPaths::new("shaders/dizzyVertex.glsl", "shaders/dizzyFragment.glsl"),
        }
    }
}

impl EffectsConfig {
    /// Copy with every shader path joined onto `root`
    pub fn relative_to(&self, root: &Path) -> Self {
        Self {
            motion_blur_shaders: self.motion_blur_shaders.relative_to(root),
            blur_shaders: self.blur_shaders.relative_to(root),
            dizzy_shaders: self.dizzy_shaders.relative_to(root),
            ..self.clone()
        }
    }
}

/// One mesh of the scene with its material maps
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeshConfig {
    /// OBJ file
    pub model: PathBuf,
    /// Diffuse map
    pub diffuse: PathBuf,
    /// Specular map
    pub specular: PathBuf,
    /// Normal map
    pub normal: PathBuf,
}

impl MeshConfig {
    fn new(model: &str, diffuse: &str, specular: &str, normal: &str) -> Self {
        Self {
            model: PathBuf::from(model),
            diffuse: PathBuf::from(diffuse),
            specular: PathBuf::from(specular),
            normal: PathBuf::from(normal),
        }
    }
}

/// Scene assets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Program shared by every mesh
    pub mesh_shaders: ShaderPaths,
    /// The object mirrored in the floor
    pub bat: MeshConfig,
    /// The reflective floor
    pub floor: MeshConfig,
    /// Surrounding walls
    pub walls: MeshConfig,
    /// Columns
    pub columns: MeshConfig,
    /// Program for the start-up splash
    pub loading_shaders: ShaderPaths,
    /// Start-up splash image
    pub loading_image: PathBuf,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            mesh_shaders: ShaderPaths::new("shaders/vertex.glsl", "shaders/fragment.glsl"),
            bat: MeshConfig::new(
                "models/troll.obj",
                "textures/colors.jpg",
                "textures/specular.jpg",
                "textures/normals.jpg",
            ),
            floor: MeshConfig::new(
                "models/suelo.obj",
                "textures/Suelo_D.tga",
                "textures/Suelo_S.tga",
                "textures/Suelo_NM.tga",
            ),
            walls: MeshConfig::new(
                "models/paredes.obj",
                "textures/Pared_D.tga",
                "textures/Pared_S.tga",
                "textures/Pared_NM.tga",
            ),
            columns: MeshConfig::new(
                "models/columnas.obj",
                "textures/Columna_D.tga",
                "textures/Columna_S.tga",
                "textures/Columna_NM.tga",
            ),
            loading_shaders: ShaderPaths::new("shaders/loadingVertex.glsl", "shaders/loadingFragment.glsl"),
            loading_image: PathBuf::from("textures/loading.png"),
        }
    }
}

/// Everything the viewer reads at start-up
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    /// Window settings
    pub window: WindowConfig,
    /// Root that every asset path is relative to
    pub assets_dir: PathBuf,
    /// Camera placement and speeds
    pub camera: CameraConfig,
    /// Post-processing
    pub effects: EffectsConfig,
    /// Meshes, textures and the splash
    pub scene: SceneConfig,
    /// Log filter used when `RUST_LOG` is not set
    pub log_level: String,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            assets_dir: PathBuf::from("assets"),
            camera: CameraConfig::default(),
            effects: EffectsConfig::default(),
            scene: SceneConfig::default(),
            log_level: "info".to_string(),
        }
    }
}

impl Config for ViewConfig {}

impl ViewConfig {
    /// Reject values the renderer cannot work with
    ///
    /// An out-of-range field of view is not an error; the camera ignores it.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window.width == 0 || self.window.height == 0 {
            return Err(ConfigError::Invalid {
                field: "window",
                reason: format!("size {}x{} has no pixels", self.window.width, self.window.height),
            });
        }
        if self.effects.motion_blur_samples < 1 {
            return Err(ConfigError::Invalid {
                field: "effects.motion_blur_samples",
                reason: format!("{} must be at least 1", self.effects.motion_blur_samples),
            });
        }
        if !self.effects.dizzy_radius.is_finite() || self.effects.dizzy_radius <= 0.0 {
            return Err(ConfigError::Invalid {
                field: "effects.dizzy_radius",
                reason: format!("{} must be positive", self.effects.dizzy_radius),
            });
        }
        Ok(())
    }

    /// `relative` resolved against the assets directory
    pub fn asset_path(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.assets_dir.join(relative)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_viewer() {
        let config = ViewConfig::default();
        assert_eq!(config.window.title, "FlyEngine");
        assert_eq!((config.window.width, config.window.height), (640, 400));
        assert_eq!(config.effects.motion_blur_samples, 8);
        assert_eq!(config.effects.motion_blur_intensity, 0.7);
        assert_eq!(config.effects.dizzy_radius, 10.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: ViewConfig = toml::from_str(
            r#"
            log_level = "debug"

            [window]
            width = 1280

            [effects]
            motion_blur_samples = 16
            "#,
        )
        .unwrap();
        assert_eq!(config.window.width, 1280);
        assert_eq!(config.window.height, 400);
        assert_eq!(config.effects.motion_blur_samples, 16);
        assert_eq!(config.effects.dizzy_radius, 10.0);
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn test_validate_rejects_zero_samples() {
        let mut config = ViewConfig::default();
        config.effects.motion_blur_samples = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { field: "effects.motion_blur_samples", .. })
        ));
    }

    #[test]
    fn test_shader_paths_resolve_against_assets() {
        let effects = EffectsConfig::default().relative_to(Path::new("assets"));
        assert_eq!(effects.blur_shaders.vertex, Path::new("assets/shaders/blurVertex.glsl"));
        assert_eq!(effects.motion_blur_samples, 8);
    }

    #[test]
    fn test_unknown_extension_is_rejected() {
        let result = ViewConfig::load_from_file("flyview.ini");
        // The read happens first, so a missing file reports IO instead.
        assert!(matches!(result, Err(ConfigError::Io(_) | ConfigError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = ViewConfig::load_or_default("definitely/not/here.toml").unwrap();
        assert_eq!(config, ViewConfig::default());
    }
}

//! Shader loading and program wrapper
//!
//! [`ShaderSources`] collects GLSL text from disk; `compile_and_link` turns it
//! into a [`ShaderProgram`], which owns the linked program until dropped.
//! Compile and link failures come back as errors carrying the driver log.

use std::path::Path;

use crate::render::api::{DeviceRef, ProgramId, UniformLocation};
use crate::render::{RenderError, RenderResult};

/// GLSL sources for a vertex/fragment pair
#[derive(Debug, Clone, Default)]
pub struct ShaderSources {
    vertex: Option<String>,
    fragment: Option<String>,
}

impl ShaderSources {
    /// Empty source set
    pub fn new() -> Self {
        Self::default()
    }

    /// Sources given directly as text
    pub fn from_strings(vertex: impl Into<String>, fragment: impl Into<String>) -> Self {
        Self { vertex: Some(vertex.into()), fragment: Some(fragment.into()) }
    }

    /// Read the vertex stage from `path`
    pub fn load_vertex_source(&mut self, path: impl AsRef<Path>) -> RenderResult<&mut Self> {
        self.vertex = Some(read_source(path.as_ref())?);
        Ok(self)
    }

    /// Read the fragment stage from `path`
    pub fn load_fragment_source(&mut self, path: impl AsRef<Path>) -> RenderResult<&mut Self> {
        self.fragment = Some(read_source(path.as_ref())?);
        Ok(self)
    }

    /// Compile both stages and link them into a program
    pub fn compile_and_link(&self, device: &DeviceRef) -> RenderResult<ShaderProgram> {
        let vertex = self
            .vertex
            .as_deref()
            .ok_or_else(|| RenderError::InitializationFailed("no vertex shader source loaded".into()))?;
        let fragment = self
            .fragment
            .as_deref()
            .ok_or_else(|| RenderError::InitializationFailed("no fragment shader source loaded".into()))?;

        let program = device.compile_program(vertex, fragment).map_err(|e| {
            log::error!("{e}");
            e
        })?;
        log::debug!("Linked shader program {program:?}");

        Ok(ShaderProgram { device: DeviceRef::clone(device), program })
    }
}

fn read_source(path: &Path) -> RenderResult<String> {
    log::debug!("Loading shader source {}", path.display());
    std::fs::read_to_string(path).map_err(|source| RenderError::ShaderSourceRead {
        path: path.display().to_string(),
        source,
    })
}

/// A linked shader program
pub struct ShaderProgram {
    device: DeviceRef,
    program: ProgramId,
}

impl ShaderProgram {
    /// Load, compile and link a vertex/fragment pair from disk
    pub fn from_files(
        device: &DeviceRef,
        vertex_path: impl AsRef<Path>,
        fragment_path: impl AsRef<Path>,
    ) -> RenderResult<Self> {
        let mut sources = ShaderSources::new();
        sources.load_vertex_source(vertex_path)?.load_fragment_source(fragment_path)?;
        sources.compile_and_link(device)
    }

    /// Make this the active program
    pub fn use_program(&self) {
        self.device.use_program(Some(self.program));
    }

    /// Query a uniform location
    ///
    /// Call this once after linking and keep the result.
    pub fn uniform(&self, name: &str) -> UniformLocation {
        let location = self.device.uniform_location(self.program, name);
        if !location.is_active() {
            log::debug!("Uniform '{name}' is not used by program {:?}", self.program);
        }
        location
    }

    /// Query a vertex attribute index
    pub fn attribute(&self, name: &str) -> Option<u32> {
        self.device.attribute_location(self.program, name)
    }

    /// Raw program handle
    pub const fn handle(&self) -> ProgramId {
        self.program
    }
}

impl Drop for ShaderProgram {
    fn drop(&mut self) {
        self.device.delete_program(self.program);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::api::ShaderStage;
    use crate::render::backends::RecordingDevice;
    use std::rc::Rc;

    #[test]
    fn test_missing_stage_is_rejected() {
        let device: DeviceRef = Rc::new(RecordingDevice::new());
        let result = ShaderSources::new().compile_and_link(&device);
        assert!(matches!(result, Err(RenderError::InitializationFailed(_))));
    }

    #[test]
    fn test_missing_file_reports_path() {
        let mut sources = ShaderSources::new();
        match sources.load_vertex_source("does/not/exist.glsl") {
            Err(RenderError::ShaderSourceRead { path, .. }) => assert!(path.ends_with("exist.glsl")),
            other => panic!("expected read error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_compile_error_carries_driver_log() {
        let device: DeviceRef =
            Rc::new(RecordingDevice::new().failing_compilation(ShaderStage::Vertex, "0:3: syntax error"));
        let result = ShaderSources::from_strings("bad", "ok").compile_and_link(&device);
        match result {
            Err(e) => assert!(e.to_string().contains("0:3: syntax error")),
            Ok(_) => panic!("compilation should fail"),
        }
    }

    #[test]
    fn test_program_released_on_drop() {
        let recorder = Rc::new(RecordingDevice::new());
        let device: DeviceRef = recorder.clone();
        {
            let program = ShaderSources::from_strings("v", "f").compile_and_link(&device).unwrap();
            program.use_program();
            assert_eq!(recorder.current_program(), Some(program.handle()));
            assert_eq!(recorder.live_objects(), 1);
        }
        assert_eq!(recorder.live_objects(), 0);
    }
}

//! Asset loading
//!
//! Turns files on disk into data ready for GPU upload:
//!
//! - [`ObjLoader`]: Wavefront OBJ into a flat triangle list
//! - [`tangents`]: per-triangle tangent frames for normal mapping
//! - [`indexer`]: vertex de-duplication into an indexed [`MeshData`]
//! - [`ImageData`]: texture decoding through the `image` crate
//!
//! [`load_mesh`] chains the first three steps.

pub mod obj_loader;
pub mod tangents;
pub mod indexer;
pub mod image_loader;

pub use image_loader::ImageData;
pub use indexer::{index_triangles, MeshData};
pub use obj_loader::{ObjLoader, TriangleSoup};
pub use tangents::{compute_tangents, TangentFrames};

use std::path::Path;
use thiserror::Error;

/// Result type for asset loading
pub type AssetResult<T> = Result<T, AssetError>;

/// Asset loading errors
#[derive(Error, Debug)]
pub enum AssetError {
    /// IO error during asset loading
    #[error("IO error reading {path}: {source}")]
    Io {
        /// File that was being read
        path: String,
        /// Underlying IO error
        source: std::io::Error,
    },

    /// A line of a text asset could not be parsed
    #[error("Parse error at line {line}: {message}")]
    ParseError {
        /// One-based line number
        line: usize,
        /// What went wrong
        message: String,
    },

    /// The file parsed but its content is unusable
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// Image decoding failed
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

/// Load an OBJ file and prepare it for upload
///
/// Reads the triangles, computes tangent frames and de-duplicates vertices.
pub fn load_mesh(path: impl AsRef<Path>) -> AssetResult<MeshData> {
    let path = path.as_ref();
    let soup = ObjLoader::load(path)?;
    let frames = compute_tangents(&soup);
    let mesh = index_triangles(&soup, &frames);
    log::info!(
        "Loaded mesh {}: {} triangles, {} unique vertices",
        path.display(),
        soup.triangle_count(),
        mesh.vertex_count()
    );
    Ok(mesh)
}

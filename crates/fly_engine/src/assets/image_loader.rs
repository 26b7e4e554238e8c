//! Image loading utilities for texture data
//!
//! Material textures are uploaded as tightly packed RGB8, whatever the source
//! format (JPEG colour maps, TGA normal maps, PNG loading screens).

use std::path::Path;

use crate::assets::{AssetError, AssetResult};

/// Decoded RGB8 pixels ready for GPU upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageData {
    /// Raw RGB pixel data, rows top to bottom
    pub data: Vec<u8>,
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
}

impl ImageData {
    /// Load an image from a file path
    pub fn from_file(path: impl AsRef<Path>) -> AssetResult<Self> {
        let path = path.as_ref();
        log::debug!("Loading image from {}", path.display());

        let bytes = std::fs::read(path).map_err(|source| AssetError::Io { path: path.display().to_string(), source })?;
        let image = Self::from_bytes(&bytes)?;

        log::info!("Loaded image {}x{} from {}", image.width, image.height, path.display());
        Ok(image)
    }

    /// Decode an image held in memory
    pub fn from_bytes(bytes: &[u8]) -> AssetResult<Self> {
        let rgb = image::load_from_memory(bytes)?.to_rgb8();
        let (width, height) = rgb.dimensions();
        if width == 0 || height == 0 {
            return Err(AssetError::InvalidFormat("image has no pixels".to_string()));
        }
        Ok(Self { data: rgb.into_raw(), width, height })
    }

    /// Solid colour image, used as a stand-in texture
    pub fn solid_color(width: u32, height: u32, color: [u8; 3]) -> Self {
        let data = color.repeat(width as usize * height as usize);
        Self { data, width, height }
    }

    /// Size of the pixel data in bytes
    pub fn size_bytes(&self) -> usize {
        self.data.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solid_color_image() {
        let img = ImageData::solid_color(4, 2, [255, 0, 0]);
        assert_eq!(img.size_bytes(), 4 * 2 * 3);
        assert_eq!(&img.data[0..3], &[255, 0, 0]);
    }

    #[test]
    fn test_decodes_png_to_rgb() {
        let mut source = image::RgbaImage::new(3, 2);
        source.put_pixel(0, 0, image::Rgba([10, 20, 30, 128]));
        let mut encoded = std::io::Cursor::new(Vec::new());
        source.write_to(&mut encoded, image::ImageFormat::Png).unwrap();

        let img = ImageData::from_bytes(encoded.get_ref()).unwrap();
        assert_eq!((img.width, img.height), (3, 2));
        assert_eq!(img.size_bytes(), 3 * 2 * 3);
        assert_eq!(&img.data[0..3], &[10, 20, 30]);
    }

    #[test]
    fn test_garbage_is_an_image_error() {
        assert!(matches!(ImageData::from_bytes(b"not an image"), Err(AssetError::Image(_))));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        assert!(matches!(ImageData::from_file("no/such/texture.tga"), Err(AssetError::Io { .. })));
    }
}

//! Panorama decoder
//!
//! Decodes equirectangular images to RGBA on a blocking task and hands
//! the pixels to iced as an image handle.

use iced::widget::image::Handle;
use std::path::{Path, PathBuf};
use tokio::task;

use super::MediaError;

/// A decoded panorama ready for drawing
#[derive(Debug, Clone)]
pub struct LoadedPanorama {
    pub handle: Handle,
    pub width: u32,
    pub height: u32,
}

/// Decode the panorama at `path`
///
/// # Returns
/// * `Ok(LoadedPanorama)` - RGBA pixels and dimensions
/// * `Err(MediaError)` - the file is missing, unreadable or not an image
pub async fn load_panorama(path: PathBuf) -> Result<LoadedPanorama, MediaError> {
    // Spawn blocking because decoding large panoramas is CPU-intensive
    task::spawn_blocking(move || load_panorama_blocking(&path))
        .await
        .map_err(|e| MediaError::Join(e.to_string()))?
}

/// Blocking implementation of panorama loading
fn load_panorama_blocking(path: &Path) -> Result<LoadedPanorama, MediaError> {
    let rgba = decode_rgba(path)?;
    let (width, height) = rgba.dimensions();

    log::info!("Decoded panorama {} ({}x{})", path.display(), width, height);

    Ok(LoadedPanorama {
        handle: Handle::from_rgba(width, height, rgba.into_raw()),
        width,
        height,
    })
}

/// Open and decode an image file into RGBA8
pub(crate) fn decode_rgba(path: &Path) -> Result<image::RgbaImage, MediaError> {
    if !path.exists() {
        return Err(MediaError::Io {
            path: path.display().to_string(),
            reason: "file not found".to_string(),
        });
    }

    let img = image::open(path).map_err(|e| MediaError::Decode {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;

    Ok(img.to_rgba8())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_load_panorama() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pano.png");
        image::RgbaImage::new(8, 4).save(&path).unwrap();

        let loaded = load_panorama(path).await.unwrap();
        assert_eq!((loaded.width, loaded.height), (8, 4));
    }

    #[tokio::test]
    async fn test_missing_file() {
        let result = load_panorama(PathBuf::from("/nonexistent/pano.jpg")).await;
        assert!(matches!(result, Err(MediaError::Io { .. })));
    }

    #[tokio::test]
    async fn test_not_an_image() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pano.jpg");
        std::fs::write(&path, b"definitely not a jpeg").unwrap();

        let result = load_panorama(path).await;
        assert!(matches!(result, Err(MediaError::Decode { .. })));
    }
}

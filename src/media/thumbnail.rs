use iced::widget::image::Handle;
use image::imageops::FilterType;
use std::path::{Path, PathBuf};

use super::loader::decode_rgba;
use super::MediaError;

/// Bounding box of generated thumbnails (panoramas are 2:1)
pub const THUMBNAIL_WIDTH: u32 = 160;
pub const THUMBNAIL_HEIGHT: u32 = 80;

/// Generate a gallery thumbnail for a panorama.
/// Thumbnails live in memory only; nothing is cached to disk.
pub async fn generate_thumbnail(path: PathBuf) -> Result<Handle, MediaError> {
    tokio::task::spawn_blocking(move || {
        let thumbnail = make_thumbnail(&path)?;
        let (width, height) = thumbnail.dimensions();
        log::debug!("Generated thumbnail for {} ({}x{})", path.display(), width, height);
        Ok(Handle::from_rgba(width, height, thumbnail.into_raw()))
    })
    .await
    .map_err(|e| MediaError::Join(e.to_string()))?
}

/// Decode and shrink to fit the thumbnail box, keeping the aspect ratio
fn make_thumbnail(path: &Path) -> Result<image::RgbaImage, MediaError> {
    let rgba = decode_rgba(path)?;
    let thumbnail = image::DynamicImage::ImageRgba8(rgba).resize(
        THUMBNAIL_WIDTH,
        THUMBNAIL_HEIGHT,
        FilterType::Lanczos3,
    );
    Ok(thumbnail.to_rgba8())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thumbnail_fits_box() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wide.png");
        image::RgbaImage::new(640, 320).save(&path).unwrap();

        let thumbnail = make_thumbnail(&path).unwrap();
        assert_eq!(thumbnail.dimensions(), (THUMBNAIL_WIDTH, THUMBNAIL_HEIGHT));
    }

    #[tokio::test]
    async fn test_missing_file_fails() {
        let result = generate_thumbnail(PathBuf::from("/nonexistent/1.jpg")).await;
        assert!(result.is_err());
    }
}

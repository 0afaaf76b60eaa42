use std::collections::HashSet;
use std::path::Path;
use walkdir::WalkDir;

use crate::state::data::PanoramaItem;

/// Extensions accepted as panoramas
pub const PANORAMA_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp"];

/// Check whether a path looks like a panorama image
pub fn is_panorama_file(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .is_some_and(|ext| PANORAMA_EXTENSIONS.contains(&ext.as_str()))
}

/// Build the seed gallery from the bundled assets folder.
///
/// Files are sorted by path and identified by their file stem. A second
/// file with an already-used stem is skipped.
pub fn discover_gallery(assets_dir: &Path) -> Vec<PanoramaItem> {
    let mut paths: Vec<_> = WalkDir::new(assets_dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|entry| entry.into_path())
        .filter(|path| path.is_file() && is_panorama_file(path))
        .collect();
    paths.sort();

    let mut seen = HashSet::new();
    let mut items = Vec::with_capacity(paths.len());

    for path in paths {
        let Some(stem) = path.file_stem().map(|s| s.to_string_lossy().to_string()) else {
            continue;
        };

        if !seen.insert(stem.clone()) {
            log::warn!("Skipping {}: id '{}' already used", path.display(), stem);
            continue;
        }

        items.push(PanoramaItem::new(stem, path.to_string_lossy()));
    }

    log::info!("Found {} panoramas in {}", items.len(), assets_dir.display());
    items
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discover_gallery() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("more")).unwrap();
        for name in ["2.jpg", "1.JPG", "notes.txt", "more/3.png", "more/1.webp"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }

        let items = discover_gallery(dir.path());
        let ids: Vec<&str> = items.iter().map(|i| i.id.as_str()).collect();

        assert_eq!(ids, vec!["1", "2", "3"]);
        assert!(items.iter().all(|i| !i.active && i.camera_pos.is_empty()));
        assert!(items[2].url.ends_with("3.png"));
    }

    #[test]
    fn test_missing_dir_is_empty() {
        assert!(discover_gallery(Path::new("/nonexistent/assets")).is_empty());
    }
}

//! Native file picker
//!
//! Shows the OS file dialog and hands the selection back in one of three
//! shapes: plain file references, `{url, file}` pairs backed by local object
//! URLs, or `{base64, file}` pairs holding data URIs.
//!
//! Cancelling the dialog is not an error: it yields an empty selection of
//! the requested shape.

use base64::Engine as _;
use std::path::{Path, PathBuf};

use crate::media::ObjectUrls;

/// MIME family accepted by the dialog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Accept {
    Image,
    Video,
    Audio,
    Application,
    Text,
    #[default]
    All,
}

impl Accept {
    /// Filter label shown by the dialog
    pub fn label(&self) -> &'static str {
        match self {
            Accept::Image => "Images",
            Accept::Video => "Videos",
            Accept::Audio => "Audio",
            Accept::Application => "Documents",
            Accept::Text => "Text",
            Accept::All => "All files",
        }
    }

    /// Extensions passed to the dialog filter; None means no filter
    pub fn extensions(&self) -> Option<&'static [&'static str]> {
        match self {
            Accept::Image => Some(&["jpg", "jpeg", "png", "webp", "gif", "bmp"]),
            Accept::Video => Some(&["mp4", "webm", "mov", "mkv"]),
            Accept::Audio => Some(&["mp3", "wav", "ogg", "flac"]),
            Accept::Application => Some(&["pdf", "zip", "json"]),
            Accept::Text => Some(&["txt", "md", "csv"]),
            Accept::All => None,
        }
    }
}

/// Shape of the resolved selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReturnType {
    #[default]
    File,
    Url,
    Base64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChooseFilesOptions {
    pub accept: Accept,
    pub multiple: bool,
    pub return_type: ReturnType,
}

/// A file chosen in the dialog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickedFile {
    pub name: String,
    pub path: PathBuf,
}

impl PickedFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        Self { name, path }
    }
}

impl From<rfd::FileHandle> for PickedFile {
    fn from(handle: rfd::FileHandle) -> Self {
        Self {
            name: handle.file_name(),
            path: handle.path().to_path_buf(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlFile {
    /// Revocable local reference, see [`ObjectUrls`]
    pub url: String,
    pub file: PickedFile,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Base64File {
    /// `data:<mime>;base64,<payload>`
    pub base64: String,
    pub file: PickedFile,
}

/// The resolved selection, in the requested shape
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PickedFiles {
    Files(Vec<PickedFile>),
    Urls(Vec<UrlFile>),
    Base64(Vec<Base64File>),
}

impl PickedFiles {
    fn empty(return_type: ReturnType) -> Self {
        match return_type {
            ReturnType::File => PickedFiles::Files(Vec::new()),
            ReturnType::Url => PickedFiles::Urls(Vec::new()),
            ReturnType::Base64 => PickedFiles::Base64(Vec::new()),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            PickedFiles::Files(files) => files.len(),
            PickedFiles::Urls(files) => files.len(),
            PickedFiles::Base64(files) => files.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Show the native dialog and resolve the selection.
///
/// Suspends until the user picks files or cancels; there is no timeout.
pub async fn choose_files(options: ChooseFilesOptions, urls: ObjectUrls) -> PickedFiles {
    let mut dialog = rfd::AsyncFileDialog::new().set_title("Choose files");
    if let Some(extensions) = options.accept.extensions() {
        dialog = dialog.add_filter(options.accept.label(), extensions);
    }

    let handles: Vec<rfd::FileHandle> = if options.multiple {
        dialog.pick_files().await.unwrap_or_default()
    } else {
        dialog.pick_file().await.into_iter().collect()
    };

    if handles.is_empty() {
        log::debug!("File dialog closed without a selection");
    }

    let files = handles.into_iter().map(PickedFile::from).collect();
    collect_selection(files, options.return_type, &urls).await
}

/// Convert picked files into the requested result shape.
///
/// Base64 reads run concurrently and are joined once, so the result keeps
/// selection order. A file that cannot be read is logged and left out.
pub async fn collect_selection(
    files: Vec<PickedFile>,
    return_type: ReturnType,
    urls: &ObjectUrls,
) -> PickedFiles {
    if files.is_empty() {
        return PickedFiles::empty(return_type);
    }

    match return_type {
        ReturnType::File => PickedFiles::Files(files),
        ReturnType::Url => PickedFiles::Urls(
            files
                .into_iter()
                .map(|file| UrlFile {
                    url: urls.create(file.path.clone()),
                    file,
                })
                .collect(),
        ),
        ReturnType::Base64 => {
            let reads = files.into_iter().map(read_base64);
            let results = futures::future::join_all(reads).await;
            PickedFiles::Base64(results.into_iter().flatten().collect())
        }
    }
}

async fn read_base64(file: PickedFile) -> Option<Base64File> {
    match tokio::fs::read(&file.path).await {
        Ok(bytes) => {
            let payload = base64::engine::general_purpose::STANDARD.encode(bytes);
            let base64 = format!("data:{};base64,{}", mime_for(&file.path), payload);
            Some(Base64File { base64, file })
        }
        Err(e) => {
            log::warn!("Failed to read {}: {}", file.path.display(), e);
            None
        }
    }
}

/// Best-effort MIME type from the file extension
fn mime_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "pdf" => "application/pdf",
        "json" => "application/json",
        "txt" => "text/plain",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_empty_selection_keeps_shape() {
        let urls = ObjectUrls::new();
        let result = collect_selection(Vec::new(), ReturnType::Url, &urls).await;
        assert_eq!(result, PickedFiles::Urls(Vec::new()));
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_file_mode_passes_through() {
        let urls = ObjectUrls::new();
        let files = vec![PickedFile::new("/tmp/a.jpg"), PickedFile::new("/tmp/b.jpg")];
        let result = collect_selection(files.clone(), ReturnType::File, &urls).await;
        assert_eq!(result, PickedFiles::Files(files));
    }

    #[tokio::test]
    async fn test_url_mode_registers_urls() {
        let urls = ObjectUrls::new();
        let result =
            collect_selection(vec![PickedFile::new("/tmp/pano.jpg")], ReturnType::Url, &urls).await;

        let PickedFiles::Urls(files) = result else {
            panic!("expected url results");
        };
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].file.name, "pano.jpg");
        assert_eq!(urls.resolve(&files[0].url), Some(PathBuf::from("/tmp/pano.jpg")));
    }

    #[tokio::test]
    async fn test_base64_keeps_selection_order() {
        let dir = tempfile::tempdir().unwrap();
        let big = dir.path().join("big.png");
        let small = dir.path().join("small.txt");
        std::fs::write(&big, vec![7u8; 256 * 1024]).unwrap();
        std::fs::write(&small, b"hi").unwrap();

        let urls = ObjectUrls::new();
        let files = vec![PickedFile::new(&big), PickedFile::new(&small)];
        let result = collect_selection(files, ReturnType::Base64, &urls).await;

        let PickedFiles::Base64(encoded) = result else {
            panic!("expected base64 results");
        };
        assert_eq!(encoded.len(), 2);
        assert_eq!(encoded[0].file.name, "big.png");
        assert!(encoded[0].base64.starts_with("data:image/png;base64,"));
        assert_eq!(encoded[1].base64, "data:text/plain;base64,aGk=");
    }

    #[tokio::test]
    async fn test_base64_skips_unreadable_files() {
        let dir = tempfile::tempdir().unwrap();
        let ok = dir.path().join("ok.bin");
        std::fs::write(&ok, [1u8, 2, 3]).unwrap();

        let urls = ObjectUrls::new();
        let files = vec![PickedFile::new("/nonexistent/gone.jpg"), PickedFile::new(&ok)];
        let result = collect_selection(files, ReturnType::Base64, &urls).await;

        let PickedFiles::Base64(encoded) = result else {
            panic!("expected base64 results");
        };
        assert_eq!(encoded.len(), 1);
        assert_eq!(encoded[0].base64, "data:application/octet-stream;base64,AQID");
    }

    #[test]
    fn test_accept_filters() {
        assert!(Accept::Image.extensions().unwrap().contains(&"jpg"));
        assert!(Accept::All.extensions().is_none());
        assert_eq!(ChooseFilesOptions::default().return_type, ReturnType::File);
    }
}

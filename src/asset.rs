//! Where pasted images live and how they get written
//!
//! Images go to `<document dir>/<asset dir>/<name>.png`. The link written into
//! the document is always relative to the document and uses forward slashes.

use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::host::{LogSink, Prompter};
use crate::workflow::{PasteError, Result};

/// File extension of saved images
pub const IMAGE_EXTENSION: &str = "png";

/// Computed location of a pasted image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetPath {
    /// Directory that will hold the image
    pub dir: PathBuf,
    /// Full filesystem path of the image
    pub file: PathBuf,
    /// Path used in the document link, relative and forward-slashed
    pub link: String,
}

impl AssetPath {
    /// Derive the target path for `name` next to `document`
    pub fn for_document(document: &Path, name: &str, config: &Config) -> Self {
        let doc_dir = document.parent().unwrap_or_else(|| Path::new(""));
        let segments = config.asset_dir_segments();

        let dir = segments
            .iter()
            .fold(doc_dir.to_path_buf(), |acc, segment| acc.join(segment));
        let file_name = file_name(name);
        let file = dir.join(&file_name);

        let mut link = segments.join("/");
        if !link.is_empty() {
            link.push('/');
        }
        link.push_str(&file_name);

        Self { dir, file, link }
    }
}

/// `name` with the image extension appended
pub fn file_name(name: &str) -> String {
    format!("{}.{}", name, IMAGE_EXTENSION)
}

/// Create `dir` and any missing parents
pub fn ensure_dir(dir: &Path, log: &dyn LogSink) -> Result<()> {
    if !dir.exists() {
        log.append_line(&format!("Creating directory: {}", dir.display()));
        std::fs::create_dir_all(dir).map_err(|e| {
            log.append_line(&format!("Error creating directory: {}", e));
            PasteError::CreateDir(e)
        })?;
    }
    Ok(())
}

/// Write `bytes` to `target.file`, asking before replacing an existing file.
///
/// Declining the overwrite is an error, not a cancellation: nothing is written.
pub fn persist(
    target: &AssetPath,
    bytes: &[u8],
    prompter: &mut dyn Prompter,
    log: &dyn LogSink,
) -> Result<()> {
    ensure_dir(&target.dir, log)?;
    log.append_line(&format!("Assets directory ensured: {}", target.dir.display()));
    log.append_line(&format!("Image will be saved to: {}", target.file.display()));

    let exists = target.file.try_exists().map_err(PasteError::WriteImage)?;
    if exists {
        let name = target
            .file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let message = format!("File {} already exists. Overwrite?", name);
        if !prompter.confirm(&message, "Yes", "No") {
            log.append_line("Overwrite declined");
            return Err(PasteError::FileExists);
        }
        log.append_line("Overwrite confirmed");
    }

    std::fs::write(&target.file, bytes).map_err(|e| {
        log.append_line(&format!("Error saving image: {}", e));
        PasteError::WriteImage(e)
    })?;
    log.append_line("Image saved successfully");
    Ok(())
}

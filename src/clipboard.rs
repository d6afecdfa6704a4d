//! Clipboard image acquisition
//!
//! Each operating system gets its own [`ClipboardReader`] strategy, chosen once
//! through [`reader_for`]. On macOS the image is captured with the `pngpaste`
//! utility; Windows and Linux are placeholders that report they are not
//! implemented yet.

use std::path::PathBuf;
use std::process::Command;

/// Utility used on macOS to dump the clipboard image to a file
pub const PNGPASTE: &str = "pngpaste";

/// Remediation shown when `pngpaste` is missing
pub const PNGPASTE_INSTALL_HINT: &str = "brew install pngpaste";

/// Error type for clipboard operations
#[derive(Debug, thiserror::Error)]
pub enum ClipboardError {
    #[error("Unsupported operating system: {0}")]
    UnsupportedPlatform(String),

    #[error("{platform} support not yet implemented")]
    NotImplemented { platform: Platform },

    #[error("{utility} utility is required. Install it with: {install_hint}")]
    MissingUtility {
        utility: String,
        install_hint: String,
    },

    #[error("Command '{command}' failed: {stderr}")]
    CommandFailed { command: String, stderr: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ClipboardError>;

/// Operating systems the clipboard reader knows about
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Platform {
    MacOs,
    Windows,
    Linux,
    Other(String),
}

impl Platform {
    /// Map an OS identifier to a platform.
    ///
    /// Accepts both Rust's `std::env::consts::OS` names (`macos`, `windows`)
    /// and the Node-style names (`darwin`, `win32`).
    pub fn from_os(id: &str) -> Self {
        match id {
            "macos" | "darwin" => Platform::MacOs,
            "windows" | "win32" => Platform::Windows,
            "linux" => Platform::Linux,
            other => Platform::Other(other.to_string()),
        }
    }

    /// The platform this binary was compiled for
    pub fn current() -> Self {
        Self::from_os(std::env::consts::OS)
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Platform::MacOs => write!(f, "macOS"),
            Platform::Windows => write!(f, "Windows"),
            Platform::Linux => write!(f, "Linux"),
            Platform::Other(id) => write!(f, "{}", id),
        }
    }
}

/// Source of raw PNG bytes from the system clipboard.
///
/// An empty vector means the clipboard holds no image.
pub trait ClipboardReader {
    fn read_image(&self) -> Result<Vec<u8>>;

    /// Short strategy name for log output
    fn name(&self) -> &str;
}

/// Select the clipboard strategy for a platform.
///
/// Unknown platforms get [`Unsupported`], which fails on read without
/// spawning a process or touching a file.
pub fn reader_for(platform: &Platform) -> Box<dyn ClipboardReader> {
    match platform {
        Platform::MacOs => Box::new(PngPaste::new()),
        Platform::Windows | Platform::Linux => Box::new(Unimplemented {
            platform: platform.clone(),
        }),
        Platform::Other(id) => Box::new(Unsupported { id: id.clone() }),
    }
}

/// Select the strategy for `os_id` and read the clipboard once
pub fn read_image(os_id: &str) -> Result<Vec<u8>> {
    reader_for(&Platform::from_os(os_id)).read_image()
}

/// macOS strategy: `pngpaste <temp file>`, read the file, remove it.
#[derive(Debug, Clone)]
pub struct PngPaste {
    program: PathBuf,
    temp_path: PathBuf,
}

impl PngPaste {
    pub fn new() -> Self {
        Self {
            program: PathBuf::from(PNGPASTE),
            temp_path: std::env::temp_dir().join("mdpaste-clipboard.png"),
        }
    }

    /// Use a different executable (must take the output path as its only argument)
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    pub fn with_temp_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.temp_path = path.into();
        self
    }
}

impl Default for PngPaste {
    fn default() -> Self {
        Self::new()
    }
}

impl ClipboardReader for PngPaste {
    fn read_image(&self) -> Result<Vec<u8>> {
        tracing::debug!(
            program = %self.program.display(),
            path = %self.temp_path.display(),
            "capturing clipboard image"
        );

        // output() waits for the child to exit, so the file is complete before we read it
        let output = Command::new(&self.program)
            .arg(&self.temp_path)
            .output()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    ClipboardError::MissingUtility {
                        utility: self.program.display().to_string(),
                        install_hint: PNGPASTE_INSTALL_HINT.to_string(),
                    }
                } else {
                    ClipboardError::Io(e)
                }
            })?;

        if !output.status.success() {
            return Err(ClipboardError::CommandFailed {
                command: format!("{} {}", self.program.display(), self.temp_path.display()),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let bytes = std::fs::read(&self.temp_path)?;
        let _ = std::fs::remove_file(&self.temp_path);
        Ok(bytes)
    }

    fn name(&self) -> &str {
        "pngpaste"
    }
}

/// Placeholder for platforms without a clipboard strategy yet
#[derive(Debug, Clone)]
pub struct Unimplemented {
    pub platform: Platform,
}

impl ClipboardReader for Unimplemented {
    fn read_image(&self) -> Result<Vec<u8>> {
        Err(ClipboardError::NotImplemented {
            platform: self.platform.clone(),
        })
    }

    fn name(&self) -> &str {
        "unimplemented"
    }
}

/// Strategy for operating systems without clipboard support
#[derive(Debug, Clone)]
pub struct Unsupported {
    pub id: String,
}

impl ClipboardReader for Unsupported {
    fn read_image(&self) -> Result<Vec<u8>> {
        Err(ClipboardError::UnsupportedPlatform(self.id.clone()))
    }

    fn name(&self) -> &str {
        "unsupported"
    }
}

//! The paste workflow
//!
//! One invocation runs these steps in order, stopping at the first failure:
//!
//! 1. validate the open document (exists, is Markdown, has been saved)
//! 2. read the clipboard image
//! 3. ask for a filename, then alt text (dismissing either cancels quietly)
//! 4. write `<doc dir>/assets/images/<name>.png`, confirming any overwrite
//! 5. insert `![alt](assets/images/<name>.png)` at the cursor
//!
//! Nothing is rolled back: if the insert fails the image stays on disk.

use std::path::PathBuf;

use regex::Regex;

use crate::asset::{self, AssetPath};
use crate::clipboard::{ClipboardError, ClipboardReader};
use crate::config::Config;
use crate::host::{Editor, InputRequest, LogSink, Notifier, Prompter, MARKDOWN_LANGUAGE_ID};

/// Error type for the paste workflow
#[derive(Debug, thiserror::Error)]
pub enum PasteError {
    #[error("No active editor found")]
    NoActiveEditor,

    #[error("Active file is not a Markdown file")]
    NotMarkdown { language_id: String },

    #[error("Please save the document before pasting an image")]
    Unsaved,

    #[error("No image found in clipboard")]
    NoImage,

    #[error(transparent)]
    Clipboard(#[from] ClipboardError),

    #[error("Invalid filename: {0}")]
    InvalidFilename(String),

    #[error("Failed to create directory: {0}")]
    CreateDir(std::io::Error),

    #[error("Operation cancelled: file already exists")]
    FileExists,

    #[error("Failed to save image: {0}")]
    WriteImage(std::io::Error),

    #[error("Failed to insert markdown link into document")]
    InsertFailed,
}

pub type Result<T> = std::result::Result<T, PasteError>;

/// How a workflow run ended when it did not fail
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PasteOutcome {
    /// Image written and link inserted
    Pasted {
        file_name: String,
        image_path: PathBuf,
        link: String,
    },
    /// The user dismissed a prompt; nothing was written
    Cancelled,
}

const FILENAME_PATTERN: &str = "^[A-Za-z0-9_-]+$";

/// Validation rule for the filename prompt.
///
/// Returns the message to show for rejected input, `None` when accepted.
pub fn validate_filename(value: &str) -> Option<String> {
    if value.is_empty() {
        return Some("Filename cannot be empty".to_string());
    }

    // The pattern is a literal, so this only fails if it is edited into something invalid
    let valid = Regex::new(FILENAME_PATTERN)
        .map(|re| re.is_match(value))
        .unwrap_or(false);
    if !valid {
        return Some(
            "Filename can only contain letters, numbers, hyphens and underscores".to_string(),
        );
    }

    None
}

/// Markdown image reference
pub fn link_text(alt_text: &str, link_path: &str) -> String {
    format!("![{}]({})", alt_text, link_path)
}

pub fn filename_request() -> InputRequest {
    InputRequest::new("Enter image filename (without extension)", "image-name")
        .with_validator(validate_filename)
}

pub fn alt_text_request(config: &Config) -> InputRequest {
    let placeholder = config
        .prompt
        .default_alt_text
        .clone()
        .unwrap_or_else(|| "Image description".to_string());
    InputRequest::new("Enter image alt text", placeholder)
}

/// One paste operation wired to its host capabilities
pub struct PasteWorkflow<'a> {
    editor: &'a mut dyn Editor,
    prompter: &'a mut dyn Prompter,
    clipboard: &'a dyn ClipboardReader,
    log: &'a dyn LogSink,
    config: Config,
}

impl<'a> PasteWorkflow<'a> {
    pub fn new(
        editor: &'a mut dyn Editor,
        prompter: &'a mut dyn Prompter,
        clipboard: &'a dyn ClipboardReader,
        log: &'a dyn LogSink,
    ) -> Self {
        Self {
            editor,
            prompter,
            clipboard,
            log,
            config: Config::default(),
        }
    }

    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Run the workflow once
    pub fn run(&mut self) -> Result<PasteOutcome> {
        let document = self.validate_context()?;

        self.log.append_line("Checking clipboard for image...");
        let image = self.clipboard.read_image()?;
        if image.is_empty() {
            return Err(PasteError::NoImage);
        }
        self.log.append_line("Image found in clipboard");
        tracing::debug!(
            bytes = image.len(),
            reader = self.clipboard.name(),
            "clipboard image read"
        );

        let Some(name) = self.prompt_filename()? else {
            return Ok(PasteOutcome::Cancelled);
        };
        let Some(alt_text) = self.prompt_alt_text() else {
            return Ok(PasteOutcome::Cancelled);
        };

        let target = AssetPath::for_document(&document, &name, &self.config);
        asset::persist(&target, &image, &mut *self.prompter, self.log)?;

        let link = link_text(&alt_text, &target.link);
        if !self.editor.insert_at_cursor(&link) {
            return Err(PasteError::InsertFailed);
        }
        self.log.append_line(&format!("Markdown link inserted: {}", link));

        Ok(PasteOutcome::Pasted {
            file_name: asset::file_name(&name),
            image_path: target.file,
            link,
        })
    }

    /// Returns the backing path of the open Markdown document
    fn validate_context(&self) -> Result<PathBuf> {
        let document = self
            .editor
            .active_document()
            .ok_or(PasteError::NoActiveEditor)?;

        if document.language_id != MARKDOWN_LANGUAGE_ID {
            return Err(PasteError::NotMarkdown {
                language_id: document.language_id,
            });
        }

        document.path.ok_or(PasteError::Unsaved)
    }

    fn prompt_filename(&mut self) -> Result<Option<String>> {
        let request = filename_request();
        match self.prompter.input(&request) {
            Some(name) if !name.is_empty() => {
                // Hosts own the re-prompt loop; refuse anything that slipped past it
                if let Some(message) = validate_filename(&name) {
                    return Err(PasteError::InvalidFilename(message));
                }
                self.log.append_line(&format!("Filename entered: {}", name));
                Ok(Some(name))
            }
            _ => {
                self.log.append_line("User cancelled filename input");
                Ok(None)
            }
        }
    }

    fn prompt_alt_text(&mut self) -> Option<String> {
        let request = alt_text_request(&self.config);
        match self.prompter.input(&request) {
            Some(alt_text) => {
                self.log.append_line(&format!("Alt text entered: {}", alt_text));
                Some(alt_text)
            }
            None => {
                self.log.append_line("User cancelled alt text input");
                None
            }
        }
    }
}

/// Top-level command boundary.
///
/// The only place errors are logged and shown to the user.
pub fn run_command(
    workflow: &mut PasteWorkflow<'_>,
    notifier: &dyn Notifier,
    log: &dyn LogSink,
) -> Result<PasteOutcome> {
    let result = workflow.run();
    match &result {
        Ok(PasteOutcome::Pasted { file_name, .. }) => {
            notifier.info(&format!("Image saved and linked as {}", file_name));
        }
        Ok(PasteOutcome::Cancelled) => {
            tracing::debug!("paste cancelled");
        }
        Err(e) => {
            log.append_line(&format!("Error: {}", e));
            notifier.error(&format!("Failed to paste image: {}", e));
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clipboard::{self, Platform};
    use crate::host::ActiveDocument;
    use crate::terminal::MemoryLog;
    use proptest::prelude::*;
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::path::Path;
    use tempfile::TempDir;

    struct FakeEditor {
        document: Option<ActiveDocument>,
        inserted: Vec<String>,
        accept_edits: bool,
    }

    impl FakeEditor {
        fn markdown(path: &Path) -> Self {
            Self {
                document: Some(ActiveDocument {
                    language_id: "markdown".to_string(),
                    path: Some(path.to_path_buf()),
                }),
                inserted: Vec::new(),
                accept_edits: true,
            }
        }

        fn none() -> Self {
            Self {
                document: None,
                inserted: Vec::new(),
                accept_edits: true,
            }
        }
    }

    impl Editor for FakeEditor {
        fn active_document(&self) -> Option<ActiveDocument> {
            self.document.clone()
        }

        fn insert_at_cursor(&mut self, text: &str) -> bool {
            if self.accept_edits {
                self.inserted.push(text.to_string());
            }
            self.accept_edits
        }
    }

    #[derive(Default)]
    struct ScriptedPrompter {
        answers: VecDeque<Option<String>>,
        overwrite: bool,
        inputs: usize,
        confirms: usize,
    }

    impl ScriptedPrompter {
        fn answering(answers: &[Option<&str>]) -> Self {
            Self {
                answers: answers.iter().map(|a| a.map(str::to_string)).collect(),
                ..Default::default()
            }
        }
    }

    impl Prompter for ScriptedPrompter {
        fn input(&mut self, _request: &InputRequest) -> Option<String> {
            self.inputs += 1;
            self.answers.pop_front().flatten()
        }

        fn confirm(&mut self, _message: &str, _yes: &str, _no: &str) -> bool {
            self.confirms += 1;
            self.overwrite
        }
    }

    struct FakeClipboard {
        image: Vec<u8>,
        reads: RefCell<usize>,
    }

    impl FakeClipboard {
        fn with(image: &[u8]) -> Self {
            Self {
                image: image.to_vec(),
                reads: RefCell::new(0),
            }
        }
    }

    impl ClipboardReader for FakeClipboard {
        fn read_image(&self) -> clipboard::Result<Vec<u8>> {
            *self.reads.borrow_mut() += 1;
            Ok(self.image.clone())
        }

        fn name(&self) -> &str {
            "fake"
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        infos: RefCell<Vec<String>>,
        errors: RefCell<Vec<String>>,
    }

    impl Notifier for RecordingNotifier {
        fn info(&self, message: &str) {
            self.infos.borrow_mut().push(message.to_string());
        }

        fn error(&self, message: &str) {
            self.errors.borrow_mut().push(message.to_string());
        }
    }

    const PNG: &[u8] = b"\x89PNG\r\n\x1a\nfake-image-data";

    #[test]
    fn test_validate_filename() {
        assert_eq!(validate_filename("test-image"), None);
        assert_eq!(validate_filename("Image_01"), None);
        assert_eq!(
            validate_filename(""),
            Some("Filename cannot be empty".to_string())
        );
        for bad in ["has space", "dot.png", "slash/name", "back\\slash", "ünï"] {
            assert!(validate_filename(bad).is_some(), "{} should be rejected", bad);
        }
    }

    #[test]
    fn test_link_text() {
        assert_eq!(
            link_text("Test image description", "assets/images/test-image.png"),
            "![Test image description](assets/images/test-image.png)"
        );
        assert_eq!(link_text("", "a.png"), "![](a.png)");
    }

    #[test]
    fn test_no_active_editor() {
        let mut editor = FakeEditor::none();
        let mut prompter = ScriptedPrompter::default();
        let clipboard = FakeClipboard::with(PNG);
        let log = MemoryLog::new();

        let err = PasteWorkflow::new(&mut editor, &mut prompter, &clipboard, &log)
            .run()
            .unwrap_err();

        assert!(err.to_string().contains("No active editor"));
        assert_eq!(prompter.inputs, 0);
        assert_eq!(*clipboard.reads.borrow(), 0);
        assert!(editor.inserted.is_empty());
    }

    #[test]
    fn test_not_markdown() {
        let mut editor = FakeEditor::markdown(Path::new("/test/path/main.rs"));
        if let Some(doc) = editor.document.as_mut() {
            doc.language_id = "rust".to_string();
        }
        let mut prompter = ScriptedPrompter::default();
        let clipboard = FakeClipboard::with(PNG);
        let log = MemoryLog::new();

        let err = PasteWorkflow::new(&mut editor, &mut prompter, &clipboard, &log)
            .run()
            .unwrap_err();

        assert!(err.to_string().contains("not a Markdown file"));
        assert_eq!(prompter.inputs, 0);
    }

    #[test]
    fn test_unsaved_document_skips_clipboard() {
        let mut editor = FakeEditor::markdown(Path::new("/unused.md"));
        if let Some(doc) = editor.document.as_mut() {
            doc.path = None;
        }
        let mut prompter = ScriptedPrompter::default();
        let clipboard = FakeClipboard::with(PNG);
        let log = MemoryLog::new();

        let err = PasteWorkflow::new(&mut editor, &mut prompter, &clipboard, &log)
            .run()
            .unwrap_err();

        assert!(matches!(err, PasteError::Unsaved));
        assert_eq!(*clipboard.reads.borrow(), 0);
    }

    #[test]
    fn test_empty_clipboard() {
        let dir = TempDir::new().unwrap();
        let mut editor = FakeEditor::markdown(&dir.path().join("document.md"));
        let mut prompter = ScriptedPrompter::answering(&[Some("x"), Some("y")]);
        let clipboard = FakeClipboard::with(b"");
        let log = MemoryLog::new();

        let err = PasteWorkflow::new(&mut editor, &mut prompter, &clipboard, &log)
            .run()
            .unwrap_err();

        assert_eq!(err.to_string(), "No image found in clipboard");
        assert_eq!(prompter.inputs, 0);
    }

    #[test]
    fn test_clipboard_error_aborts_before_prompts() {
        let dir = TempDir::new().unwrap();
        let mut editor = FakeEditor::markdown(&dir.path().join("document.md"));
        let mut prompter = ScriptedPrompter::answering(&[Some("x"), Some("y")]);
        let clipboard = clipboard::Unimplemented {
            platform: Platform::Linux,
        };
        let log = MemoryLog::new();

        let err = PasteWorkflow::new(&mut editor, &mut prompter, &clipboard, &log)
            .run()
            .unwrap_err();

        assert_eq!(err.to_string(), "Linux support not yet implemented");
        assert_eq!(prompter.inputs, 0);
    }

    #[test]
    fn test_unsupported_platform_checked_after_context() {
        let clipboard = clipboard::reader_for(&Platform::Other("freebsd".to_string()));
        let log = MemoryLog::new();

        let mut editor = FakeEditor::none();
        let mut prompter = ScriptedPrompter::default();
        let err = PasteWorkflow::new(&mut editor, &mut prompter, clipboard.as_ref(), &log)
            .run()
            .unwrap_err();
        assert!(matches!(err, PasteError::NoActiveEditor));

        let dir = TempDir::new().unwrap();
        let mut editor = FakeEditor::markdown(&dir.path().join("document.md"));
        let mut prompter = ScriptedPrompter::answering(&[Some("x"), Some("y")]);
        let err = PasteWorkflow::new(&mut editor, &mut prompter, clipboard.as_ref(), &log)
            .run()
            .unwrap_err();
        assert_eq!(err.to_string(), "Unsupported operating system: freebsd");
        assert_eq!(prompter.inputs, 0);
        assert!(!dir.path().join("assets").exists());
    }

    #[test]
    fn test_end_to_end() {
        let dir = TempDir::new().unwrap();
        let document = dir.path().join("document.md");
        let mut editor = FakeEditor::markdown(&document);
        let mut prompter =
            ScriptedPrompter::answering(&[Some("test-image"), Some("Test image description")]);
        let clipboard = FakeClipboard::with(PNG);
        let log = MemoryLog::new();
        let notifier = RecordingNotifier::default();

        let outcome = {
            let mut workflow = PasteWorkflow::new(&mut editor, &mut prompter, &clipboard, &log);
            run_command(&mut workflow, &notifier, &log).unwrap()
        };

        let image_path = dir.path().join("assets").join("images").join("test-image.png");
        assert!(dir.path().join("assets").join("images").is_dir());
        assert_eq!(std::fs::read(&image_path).unwrap(), PNG);
        assert_eq!(
            editor.inserted,
            vec!["![Test image description](assets/images/test-image.png)".to_string()]
        );
        assert_eq!(
            outcome,
            PasteOutcome::Pasted {
                file_name: "test-image.png".to_string(),
                image_path,
                link: "![Test image description](assets/images/test-image.png)".to_string(),
            }
        );
        assert_eq!(prompter.confirms, 0);
        assert!(notifier.infos.borrow()[0].contains("test-image.png"));
        assert!(notifier.errors.borrow().is_empty());
        assert!(log.contains("Markdown link inserted"));
    }

    #[test]
    fn test_end_to_end_overwrite_declined() {
        let dir = TempDir::new().unwrap();
        let images = dir.path().join("assets").join("images");
        std::fs::create_dir_all(&images).unwrap();
        std::fs::write(images.join("test-image.png"), b"existing").unwrap();

        let mut editor = FakeEditor::markdown(&dir.path().join("document.md"));
        let mut prompter =
            ScriptedPrompter::answering(&[Some("test-image"), Some("Test image description")]);
        let clipboard = FakeClipboard::with(PNG);
        let log = MemoryLog::new();
        let notifier = RecordingNotifier::default();

        let err = {
            let mut workflow = PasteWorkflow::new(&mut editor, &mut prompter, &clipboard, &log);
            run_command(&mut workflow, &notifier, &log).unwrap_err()
        };

        assert!(err.to_string().contains("file already exists"));
        assert_eq!(std::fs::read(images.join("test-image.png")).unwrap(), b"existing");
        assert_eq!(prompter.confirms, 1);
        assert!(editor.inserted.is_empty());
        assert_eq!(
            notifier.errors.borrow()[0],
            "Failed to paste image: Operation cancelled: file already exists"
        );
        assert!(log.contains("Error: Operation cancelled: file already exists"));
    }

    #[test]
    fn test_filename_cancel_is_silent() {
        let dir = TempDir::new().unwrap();
        let mut editor = FakeEditor::markdown(&dir.path().join("document.md"));
        let mut prompter = ScriptedPrompter::answering(&[None]);
        let clipboard = FakeClipboard::with(PNG);
        let log = MemoryLog::new();
        let notifier = RecordingNotifier::default();

        let outcome = {
            let mut workflow = PasteWorkflow::new(&mut editor, &mut prompter, &clipboard, &log);
            run_command(&mut workflow, &notifier, &log).unwrap()
        };

        assert_eq!(outcome, PasteOutcome::Cancelled);
        assert_eq!(prompter.inputs, 1);
        assert!(!dir.path().join("assets").exists());
        assert!(notifier.infos.borrow().is_empty());
        assert!(notifier.errors.borrow().is_empty());
    }

    #[test]
    fn test_alt_text_cancel_is_silent() {
        let dir = TempDir::new().unwrap();
        let mut editor = FakeEditor::markdown(&dir.path().join("document.md"));
        let mut prompter = ScriptedPrompter::answering(&[Some("shot"), None]);
        let clipboard = FakeClipboard::with(PNG);
        let log = MemoryLog::new();

        let outcome = PasteWorkflow::new(&mut editor, &mut prompter, &clipboard, &log)
            .run()
            .unwrap();

        assert_eq!(outcome, PasteOutcome::Cancelled);
        assert!(!dir.path().join("assets").exists());
        assert!(editor.inserted.is_empty());
        assert!(log.contains("User cancelled alt text input"));
    }

    #[test]
    fn test_empty_alt_text_accepted() {
        let dir = TempDir::new().unwrap();
        let mut editor = FakeEditor::markdown(&dir.path().join("document.md"));
        let mut prompter = ScriptedPrompter::answering(&[Some("shot"), Some("")]);
        let clipboard = FakeClipboard::with(PNG);
        let log = MemoryLog::new();

        PasteWorkflow::new(&mut editor, &mut prompter, &clipboard, &log)
            .run()
            .unwrap();

        assert_eq!(editor.inserted, vec!["![](assets/images/shot.png)".to_string()]);
    }

    #[test]
    fn test_invalid_filename_stops_before_alt_text() {
        let dir = TempDir::new().unwrap();
        let mut editor = FakeEditor::markdown(&dir.path().join("document.md"));
        let mut prompter = ScriptedPrompter::answering(&[Some("bad name!"), Some("alt")]);
        let clipboard = FakeClipboard::with(PNG);
        let log = MemoryLog::new();

        let err = PasteWorkflow::new(&mut editor, &mut prompter, &clipboard, &log)
            .run()
            .unwrap_err();

        assert!(matches!(err, PasteError::InvalidFilename(_)));
        assert_eq!(prompter.inputs, 1);
        assert!(!dir.path().join("assets").exists());
    }

    #[test]
    fn test_insert_failure_keeps_image() {
        let dir = TempDir::new().unwrap();
        let mut editor = FakeEditor::markdown(&dir.path().join("document.md"));
        editor.accept_edits = false;
        let mut prompter = ScriptedPrompter::answering(&[Some("kept"), Some("alt")]);
        let clipboard = FakeClipboard::with(PNG);
        let log = MemoryLog::new();

        let err = PasteWorkflow::new(&mut editor, &mut prompter, &clipboard, &log)
            .run()
            .unwrap_err();

        assert_eq!(err.to_string(), "Failed to insert markdown link into document");
        assert!(dir.path().join("assets/images/kept.png").exists());
    }

    #[test]
    fn test_configured_asset_dir() {
        let dir = TempDir::new().unwrap();
        let mut editor = FakeEditor::markdown(&dir.path().join("document.md"));
        let mut prompter = ScriptedPrompter::answering(&[Some("shot"), Some("Shot")]);
        let clipboard = FakeClipboard::with(PNG);
        let log = MemoryLog::new();
        let mut config = Config::default();
        config.assets.dir = "img".to_string();

        PasteWorkflow::new(&mut editor, &mut prompter, &clipboard, &log)
            .with_config(config)
            .run()
            .unwrap();

        assert!(dir.path().join("img").join("shot.png").exists());
        assert_eq!(editor.inserted, vec!["![Shot](img/shot.png)".to_string()]);
    }

    proptest! {
        #[test]
        fn prop_valid_filenames_accepted(name in "[A-Za-z0-9_-]{1,32}") {
            prop_assert_eq!(validate_filename(&name), None);
        }

        #[test]
        fn prop_foreign_char_rejected(
            prefix in "[A-Za-z0-9_-]{0,8}",
            bad in "[^A-Za-z0-9_-]",
            suffix in "[A-Za-z0-9_-]{0,8}",
        ) {
            let name = format!("{}{}{}", prefix, bad, suffix);
            prop_assert!(validate_filename(&name).is_some());
        }
    }
}

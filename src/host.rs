//! Host capabilities the paste workflow calls through
//!
//! The workflow never touches a terminal, an editor buffer or a log file
//! directly. It talks to these traits, and the binary (or a test) decides what
//! sits behind them.

use std::path::PathBuf;

/// Language id of documents the workflow accepts
pub const MARKDOWN_LANGUAGE_ID: &str = "markdown";

/// The document currently open in the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveDocument {
    /// Content type, e.g. `markdown`
    pub language_id: String,
    /// Backing file; `None` for a document that was never saved
    pub path: Option<PathBuf>,
}

impl ActiveDocument {
    pub fn is_untitled(&self) -> bool {
        self.path.is_none()
    }
}

/// A single-line text prompt.
///
/// `validate` returns `Some(message)` for rejected input. Hosts are expected
/// to keep asking until the input passes or the user dismisses the prompt.
#[derive(Clone)]
pub struct InputRequest {
    pub prompt: String,
    pub placeholder: String,
    pub validate: Option<fn(&str) -> Option<String>>,
}

impl std::fmt::Debug for InputRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InputRequest")
            .field("prompt", &self.prompt)
            .field("placeholder", &self.placeholder)
            .field("validated", &self.validate.is_some())
            .finish()
    }
}

impl InputRequest {
    pub fn new(prompt: impl Into<String>, placeholder: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            placeholder: placeholder.into(),
            validate: None,
        }
    }

    pub fn with_validator(mut self, validate: fn(&str) -> Option<String>) -> Self {
        self.validate = Some(validate);
        self
    }

    /// Run the validator, if any
    pub fn check(&self, value: &str) -> Option<String> {
        self.validate.and_then(|validate| validate(value))
    }
}

/// Access to the open document
pub trait Editor {
    fn active_document(&self) -> Option<ActiveDocument>;

    /// Insert `text` at the cursor as one edit. Returns false if the edit did not apply.
    fn insert_at_cursor(&mut self, text: &str) -> bool;
}

/// User prompts
pub trait Prompter {
    /// Ask for a line of text. `None` means the prompt was dismissed.
    fn input(&mut self, request: &InputRequest) -> Option<String>;

    /// Two-choice dialog. Returns true only if `yes` was chosen.
    fn confirm(&mut self, message: &str, yes: &str, no: &str) -> bool;
}

/// Append-only diagnostic log
pub trait LogSink {
    fn append_line(&self, line: &str);
}

/// User-facing notifications
pub trait Notifier {
    fn info(&self, message: &str);
    fn error(&self, message: &str);
}

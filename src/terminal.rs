//! Terminal host
//!
//! Implements the host capabilities for the command line: the "open editor"
//! is a Markdown file on disk, prompts are read from stdin and notifications
//! go to the terminal.

use colored::Colorize;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::host::{
    ActiveDocument, Editor, InputRequest, LogSink, Notifier, Prompter, MARKDOWN_LANGUAGE_ID,
};

/// Extensions treated as Markdown
const MARKDOWN_EXTENSIONS: &[&str] = &["md", "markdown", "mdown", "mkd"];

/// Language id for a file, derived from its extension
pub fn language_id_for(path: &Path) -> String {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    if MARKDOWN_EXTENSIONS.contains(&ext.as_str()) {
        MARKDOWN_LANGUAGE_ID.to_string()
    } else if ext.is_empty() {
        "plaintext".to_string()
    } else {
        ext
    }
}

/// Cursor location, 1-based like editor status bars
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

/// A document file on disk acting as the open editor
#[derive(Debug, Clone)]
pub struct FileEditor {
    path: Option<PathBuf>,
    cursor: Option<Position>,
}

impl FileEditor {
    /// `None` behaves like a host with no editor open
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path, cursor: None }
    }

    /// Insert at `cursor` instead of the end of the document
    pub fn with_cursor(mut self, cursor: Option<Position>) -> Self {
        self.cursor = cursor;
        self
    }
}

impl Editor for FileEditor {
    fn active_document(&self) -> Option<ActiveDocument> {
        let path = self.path.as_ref()?;
        Some(ActiveDocument {
            language_id: language_id_for(path),
            // A file that was never written to disk has nothing to save next to
            path: path.is_file().then(|| path.clone()),
        })
    }

    fn insert_at_cursor(&mut self, text: &str) -> bool {
        let Some(path) = self.path.as_ref() else {
            return false;
        };

        let mut contents = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "could not read document");
                return false;
            }
        };

        let offset = match self.cursor {
            Some(cursor) => byte_offset(&contents, cursor),
            None => contents.len(),
        };
        contents.insert_str(offset, text);

        match std::fs::write(path, contents) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "could not write document");
                false
            }
        }
    }
}

/// Byte offset of a 1-based line/column, clamped to the end of the line or document
pub fn byte_offset(text: &str, cursor: Position) -> usize {
    let mut line_start = 0;
    for _ in 1..cursor.line.max(1) {
        match text[line_start..].find('\n') {
            Some(i) => line_start += i + 1,
            None => return text.len(),
        }
    }

    let line = &text[line_start..];
    let line = &line[..line.find('\n').unwrap_or(line.len())];
    let line = line.strip_suffix('\r').unwrap_or(line);

    let column = cursor.column.max(1) - 1;
    let within = line
        .char_indices()
        .nth(column)
        .map(|(i, _)| i)
        .unwrap_or(line.len());
    line_start + within
}

/// Prompts on a line-oriented reader/writer pair (stdin/stderr in the binary).
///
/// End of input dismisses the prompt. Input rejected by the request's
/// validator is reported and asked again.
pub struct StdioPrompter<R, W> {
    reader: R,
    writer: W,
}

impl<R: BufRead, W: Write> StdioPrompter<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }

    fn read_line(&mut self) -> Option<String> {
        let mut line = String::new();
        match self.reader.read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(line.trim_end_matches(['\r', '\n']).to_string()),
        }
    }
}

impl<R: BufRead, W: Write> Prompter for StdioPrompter<R, W> {
    fn input(&mut self, request: &InputRequest) -> Option<String> {
        loop {
            let _ = write!(
                self.writer,
                "{} {} ",
                request.prompt.bold(),
                format!("({})", request.placeholder).dimmed()
            );
            let _ = self.writer.flush();

            let value = self.read_line()?;
            match request.check(&value) {
                Some(message) => {
                    let _ = writeln!(self.writer, "{}", message.yellow());
                }
                None => return Some(value),
            }
        }
    }

    fn confirm(&mut self, message: &str, yes: &str, no: &str) -> bool {
        let _ = write!(self.writer, "{} [{}/{}] ", message.yellow(), yes, no);
        let _ = self.writer.flush();

        self.read_line()
            .map(|answer| {
                let answer = answer.trim().to_lowercase();
                answer == yes.to_lowercase() || answer == "y"
            })
            .unwrap_or(false)
    }
}

/// Answers prompts from command-line flags, deferring to `inner` for the rest
pub struct PresetPrompter<P> {
    inner: P,
    answers: HashMap<String, String>,
    overwrite: Option<bool>,
}

impl<P: Prompter> PresetPrompter<P> {
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            answers: HashMap::new(),
            overwrite: None,
        }
    }

    /// Pre-answer the prompt whose text is `prompt`
    pub fn answer(mut self, prompt: &str, value: Option<String>) -> Self {
        if let Some(value) = value {
            self.answers.insert(prompt.to_string(), value);
        }
        self
    }

    pub fn overwrite(mut self, overwrite: Option<bool>) -> Self {
        self.overwrite = overwrite;
        self
    }
}

impl<P: Prompter> Prompter for PresetPrompter<P> {
    fn input(&mut self, request: &InputRequest) -> Option<String> {
        if let Some(value) = self.answers.remove(&request.prompt) {
            match request.check(&value) {
                None => return Some(value),
                Some(message) => {
                    tracing::warn!(value = %value, "{}", message);
                }
            }
        }
        self.inner.input(request)
    }

    fn confirm(&mut self, message: &str, yes: &str, no: &str) -> bool {
        match self.overwrite {
            Some(answer) => answer,
            None => self.inner.confirm(message, yes, no),
        }
    }
}

/// Prints notifications to the terminal
#[derive(Debug, Default)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn info(&self, message: &str) {
        println!("{}", message.green());
    }

    fn error(&self, message: &str) {
        eprintln!("{}", message.red());
    }
}

/// Forwards log lines to `tracing`
#[derive(Debug, Default)]
pub struct TracingLog;

impl LogSink for TracingLog {
    fn append_line(&self, line: &str) {
        tracing::info!(target: "mdpaste", "{}", line);
    }
}

/// Append-only log file, flushed when dropped
#[derive(Debug)]
pub struct FileLog {
    writer: Mutex<BufWriter<File>>,
}

impl FileLog {
    pub fn open(path: &Path) -> std::io::Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            writer: Mutex::new(BufWriter::new(file)),
        })
    }
}

impl LogSink for FileLog {
    fn append_line(&self, line: &str) {
        tracing::debug!(target: "mdpaste", "{}", line);
        if let Ok(mut writer) = self.writer.lock() {
            let stamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
            let _ = writeln!(writer, "[{}] {}", stamp, line);
        }
    }
}

impl Drop for FileLog {
    fn drop(&mut self) {
        if let Ok(writer) = self.writer.get_mut() {
            let _ = writer.flush();
        }
    }
}

/// Keeps log lines in memory
#[derive(Debug, Default)]
pub struct MemoryLog {
    lines: RefCell<Vec<String>>,
}

impl MemoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// True if any line contains `needle`
    pub fn contains(&self, needle: &str) -> bool {
        self.lines.borrow().iter().any(|l| l.contains(needle))
    }
}

impl LogSink for MemoryLog {
    fn append_line(&self, line: &str) {
        self.lines.borrow_mut().push(line.to_string());
    }
}

//! mdpaste - paste clipboard images into Markdown documents
//!
//! Saves the image on the clipboard next to a Markdown file and inserts a
//! link to it at the cursor.
//!
//! # Overview
//!
//! The crate has two halves:
//!
//! | Piece | Module |
//! |-------|--------|
//! | Clipboard reader, one strategy per OS | [`clipboard`] |
//! | Paste workflow: validate, prompt, save, link | [`workflow`] |
//!
//! The workflow only talks to the outside world through the traits in
//! [`host`], so any editor or front end can drive it. [`terminal`] is the
//! command-line host used by the `mdpaste` binary.
//!
//! # Quick Start
//!
//! ```no_run
//! use mdpaste::clipboard::{reader_for, Platform};
//! use mdpaste::terminal::{ConsoleNotifier, FileEditor, StdioPrompter, TracingLog};
//! use mdpaste::workflow::{run_command, PasteWorkflow};
//!
//! let reader = reader_for(&Platform::current());
//! let mut editor = FileEditor::new(Some("notes/today.md".into()));
//! let mut prompter = StdioPrompter::new(std::io::stdin().lock(), std::io::stderr());
//! let log = TracingLog;
//!
//! let mut workflow = PasteWorkflow::new(&mut editor, &mut prompter, reader.as_ref(), &log);
//! run_command(&mut workflow, &ConsoleNotifier, &log).unwrap();
//! ```

pub mod asset;
pub mod clipboard;
pub mod config;
pub mod host;
pub mod terminal;
pub mod workflow;

pub use asset::AssetPath;
pub use clipboard::{ClipboardError, ClipboardReader, Platform};
pub use config::Config;
pub use host::{ActiveDocument, Editor, InputRequest, LogSink, Notifier, Prompter};
pub use workflow::{PasteError, PasteOutcome, PasteWorkflow};

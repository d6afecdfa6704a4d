use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use std::io;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use mdpaste::clipboard::{self, ClipboardReader, Platform, PngPaste};
use mdpaste::host::LogSink;
use mdpaste::terminal::{
    ConsoleNotifier, FileEditor, FileLog, Position, PresetPrompter, StdioPrompter, TracingLog,
};
use mdpaste::workflow::{
    alt_text_request, filename_request, run_command, validate_filename, PasteWorkflow,
};
use mdpaste::Config;

#[derive(Parser, Debug)]
#[command(name = "mdpaste")]
#[command(
    author,
    version,
    about = "Save the clipboard image next to a Markdown document and link it"
)]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    paste: PasteArgs,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Paste the clipboard image into a Markdown document (default)
    Paste(PasteArgs),

    /// Print shell completions
    Completion {
        /// Target shell
        shell: Shell,
    },
}

#[derive(Args, Debug)]
struct PasteArgs {
    /// Markdown document to link the image from
    document: Option<PathBuf>,

    /// Cursor line (1-based); defaults to the end of the document
    #[arg(long, requires = "document")]
    line: Option<usize>,

    /// Cursor column (1-based); defaults to the start of the line
    #[arg(long, requires = "line")]
    column: Option<usize>,

    /// Image filename without extension (skips the prompt)
    #[arg(short, long, value_parser = parse_filename)]
    name: Option<String>,

    /// Alt text (skips the prompt)
    #[arg(short, long)]
    alt: Option<String>,

    /// Overwrite an existing image without asking
    #[arg(short, long, conflicts_with = "no_overwrite")]
    yes: bool,

    /// Fail instead of asking when the image already exists
    #[arg(long)]
    no_overwrite: bool,

    /// pngpaste-compatible command that writes the clipboard image to the path it is given
    #[arg(long, value_name = "PROGRAM")]
    clipboard_command: Option<PathBuf>,

    /// Append log lines to this file
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Show step-by-step log output
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();

    let args = match cli.command {
        Some(Command::Completion { shell }) => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "mdpaste", &mut io::stdout());
            return;
        }
        Some(Command::Paste(args)) => args,
        None => cli.paste,
    };

    init_tracing(args.verbose);

    if let Err(code) = paste(args) {
        std::process::exit(code);
    }
}

/// Same rule as the filename prompt, so a bad `--name` is a usage error
fn parse_filename(value: &str) -> Result<String, String> {
    match validate_filename(value) {
        Some(message) => Err(message),
        None => Ok(value.to_string()),
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "mdpaste=info" } else { "warn" };
    let filter =
        EnvFilter::try_from_env("MDPASTE_LOG").unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn paste(args: PasteArgs) -> Result<(), i32> {
    let notifier = ConsoleNotifier;

    let log: Box<dyn LogSink> = match &args.log_file {
        Some(path) => match FileLog::open(path) {
            Ok(log) => Box::new(log),
            Err(e) => {
                eprintln!("Failed to open log file {}: {}", path.display(), e);
                return Err(1);
            }
        },
        None => Box::new(TracingLog),
    };
    log.append_line("mdpaste started");

    let reader: Box<dyn ClipboardReader> = match &args.clipboard_command {
        Some(program) => Box::new(PngPaste::new().with_program(program)),
        None => clipboard::reader_for(&Platform::current()),
    };

    let config = args
        .document
        .as_ref()
        .and_then(|doc| doc.parent())
        .filter(|dir| !dir.as_os_str().is_empty())
        .map(|dir| dir.to_path_buf())
        .or_else(|| std::env::current_dir().ok())
        .map(|dir| Config::load(&dir))
        .unwrap_or_default();

    let cursor = args.line.map(|line| Position {
        line,
        column: args.column.unwrap_or(1),
    });
    let mut editor = FileEditor::new(args.document.clone()).with_cursor(cursor);

    let overwrite = if args.yes {
        Some(true)
    } else if args.no_overwrite {
        Some(false)
    } else {
        None
    };
    let stdin = io::stdin();
    let mut prompter = PresetPrompter::new(StdioPrompter::new(stdin.lock(), io::stderr()))
        .answer(&filename_request().prompt, args.name.clone())
        .answer(&alt_text_request(&config).prompt, args.alt.clone())
        .overwrite(overwrite);

    let result = {
        let mut workflow =
            PasteWorkflow::new(&mut editor, &mut prompter, reader.as_ref(), log.as_ref())
                .with_config(config);
        run_command(&mut workflow, &notifier, log.as_ref())
    };

    log.append_line("mdpaste finished");
    result.map(|_| ()).map_err(|_| 1)
}

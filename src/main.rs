mod app;
mod config;
mod fileio;
mod input;
mod mode;
mod tableview;
mod ui;

use std::fs::File;
use std::io::{self, Write};
use std::panic;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{error, info};
use tracing_subscriber::fmt::writer::MakeWriter;
use tracing_subscriber::EnvFilter;

use crossterm::{
    cursor::MoveToColumn,
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use app::App;
use config::AppConfig;
use fileio::FileIO;

/// Environment variable holding the log filter directives
const LOG_ENV: &str = "FASTTABLE_LOG";

struct Args {
    file_path: PathBuf,
    delimiter: Option<u8>,
    config: Option<PathBuf>,
    watch: bool,
    log_file: Option<PathBuf>,
}

/// Parse command line arguments
fn parse_args() -> Args {
    let args: Vec<String> = std::env::args().collect();
    let mut file_path: Option<PathBuf> = None;
    let mut delimiter: Option<u8> = None;
    let mut config: Option<PathBuf> = None;
    let mut watch = false;
    let mut log_file: Option<PathBuf> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-d" | "--delimiter" => {
                delimiter = Some(parse_delimiter(option_value(&args, i)));
                i += 2;
            }
            "-c" | "--config" => {
                config = Some(PathBuf::from(option_value(&args, i)));
                i += 2;
            }
            "--log" => {
                log_file = Some(PathBuf::from(option_value(&args, i)));
                i += 2;
            }
            "-w" | "--watch" => {
                watch = true;
                i += 1;
            }
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            arg if arg.starts_with('-') => {
                eprintln!("Unknown option: {}", arg);
                std::process::exit(1);
            }
            _ => {
                file_path = Some(PathBuf::from(&args[i]));
                i += 1;
            }
        }
    }

    let Some(file_path) = file_path else {
        print_help();
        std::process::exit(1);
    };

    Args { file_path, delimiter, config, watch, log_file }
}

fn option_value(args: &[String], i: usize) -> &str {
    match args.get(i + 1) {
        Some(value) => value,
        None => {
            eprintln!("Error: {} requires an argument", args[i]);
            std::process::exit(1);
        }
    }
}

/// Parse a delimiter string into a byte
fn parse_delimiter(s: &str) -> u8 {
    match s.to_lowercase().as_str() {
        "comma" | "," => b',',
        "tab" | "\\t" | "\t" => b'\t',
        "semicolon" | ";" => b';',
        "pipe" | "|" => b'|',
        _ if s.len() == 1 => s.as_bytes()[0],
        _ => {
            eprintln!("Invalid delimiter: '{}'. Use comma, tab, semicolon, pipe, or a single character.", s);
            std::process::exit(1);
        }
    }
}

/// Log to a file when asked, otherwise to the main screen
fn init_logging(log_file: Option<&Path>) -> io::Result<()> {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));

    match log_file {
        Some(path) => {
            let file = File::create(path)?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(MainScreenWriter)
            .init(),
    }
    Ok(())
}

/// Handle panics gracefully
fn install_panic_hook() {
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), DisableMouseCapture, LeaveAlternateScreen);

        if let Some(location) = info.location() {
            error!(file = location.file(), line = location.line(), "panic occurred");
        } else {
            error!("panic occurred");
        }

        if let Some(s) = info.payload().downcast_ref::<&str>() {
            error!(message = %s);
        } else if let Some(s) = info.payload().downcast_ref::<String>() {
            error!(message = %s);
        }

        default_hook(info);
    }));
}

/// A `MakeWriter` for `tracing` that logs to the **main screen** by leaving the alternate screen temporarily.
pub struct MainScreenWriter;

impl<'a> MakeWriter<'a> for MainScreenWriter {
    type Writer = MainScreenWriterHandle;

    fn make_writer(&'a self) -> Self::Writer {
        MainScreenWriterHandle
    }
}

/// A handle that writes to stdout outside the alternate screen
pub struct MainScreenWriterHandle;

impl Write for MainScreenWriterHandle {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        execute!(io::stdout(), LeaveAlternateScreen)?;
        println!();
        execute!(io::stdout(), MoveToColumn(0))?;
        let result = io::stdout().write(buf);
        execute!(io::stdout(), MoveToColumn(0))?;
        io::stdout().flush()?;
        execute!(io::stdout(), EnterAlternateScreen)?;
        result
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stdout().flush()
    }
}

fn print_help() {
    eprintln!("fasttable - page, filter, check and reorder the rows of a CSV file");
    eprintln!();
    eprintln!("USAGE:");
    eprintln!("    fasttable [OPTIONS] FILE");
    eprintln!();
    eprintln!("OPTIONS:");
    eprintln!("    -c, --config <FILE>      Read settings from a TOML file");
    eprintln!("    -d, --delimiter <DELIM>  Set the field delimiter (comma, tab, semicolon, pipe, or char)");
    eprintln!("    -w, --watch              Reload the file when it changes");
    eprintln!("    --log <FILE>             Write logs to FILE instead of the terminal");
    eprintln!("    -h, --help               Print this help message");
    eprintln!();
    eprintln!("KEYS:");
    eprintln!("    /                 Edit the filter (Enter applies, Esc clears)");
    eprintln!("    Left/Right        Previous/next page (Shift for first/last)");
    eprintln!("    Up/Down           Move the cursor");
    eprintln!("    Space             Check the cursor row (Shift for a range)");
    eprintln!("    a                 Check or uncheck all filtered rows");
    eprintln!("    mouse drag        Reorder rows; Esc cancels");
    eprintln!("    q                 Quit");
    eprintln!();
    eprintln!("Log verbosity follows {} (default: info).", LOG_ENV);
}

fn main() -> io::Result<()> {
    let args = parse_args();

    init_logging(args.log_file.as_deref())?;
    info!("fasttable started");

    install_panic_hook();

    let config = match &args.config {
        Some(path) => AppConfig::from_file(path).map_err(|e| {
            error!(error = %e, path = %path.display(), "failed to load config");
            e
        })?,
        None => AppConfig::default(),
    };

    let file_io = FileIO::new(args.file_path, args.delimiter);
    let load_result = file_io.load(&config).map_err(|e| {
        error!(error = %e, file = %file_io.file_name(), "failed to load file");
        e
    })?;
    info!(
        records = load_result.records.len(),
        delimiter = %file_io.delimiter_name(),
        "loaded"
    );

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(config, file_io, load_result, args.watch);
    let result = app.run(&mut terminal);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), DisableMouseCapture, LeaveAlternateScreen)?;

    result
}

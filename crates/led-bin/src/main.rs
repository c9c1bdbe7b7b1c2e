//! led entrypoint: a batch line editor over stdin/stdout.
use anyhow::{Context, Result};
use clap::Parser;
use core_actions::run_session;
use core_config::load_from;
use core_state::Editor;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read};
use std::path::{Path, PathBuf};
use std::sync::Once;
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;

/// CLI arguments.
#[derive(Parser, Debug)]
#[command(name = "led", version, about = "Line editor with deferred undo/redo")]
struct Args {
    /// Optional command script to execute. Reads stdin when omitted.
    pub script: Option<PathBuf>,
    /// Optional configuration file path (overrides discovery of `led.toml`).
    #[arg(long = "config")]
    pub config: Option<PathBuf>,
}

fn configure_logging() -> Option<WorkerGuard> {
    let log_dir = Path::new(".");
    let log_path = log_dir.join("led.log");
    if log_path.exists() {
        let _ = std::fs::remove_file(&log_path);
    }

    let file_appender = tracing_appender::rolling::never(log_dir, "led.log");
    let (nb_writer, guard) = tracing_appender::non_blocking(file_appender);
    match tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(nb_writer)
        .try_init()
    {
        Ok(()) => Some(guard),
        // Global tracing subscriber already installed; drop the guard so the
        // writer shuts down.
        Err(_err) => None,
    }
}

fn install_panic_hook() {
    static HOOK: Once = Once::new();
    HOOK.call_once(|| {
        let default_panic = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            tracing::error!(target: "runtime.panic", ?info, "panic");
            default_panic(info);
        }));
    });
}

fn open_input(args: &Args) -> Result<Box<dyn Read>> {
    match args.script.as_ref() {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("opening script {}", path.display()))?;
            info!(target: "runtime", script = %path.display(), "script_input");
            Ok(Box::new(file))
        }
        None => Ok(Box::new(io::stdin())),
    }
}

fn main() -> Result<()> {
    let _log_guard = configure_logging();
    install_panic_hook();
    info!(target: "runtime", "startup");

    let args = Args::parse();
    let config = load_from(args.config.clone())?;
    let mut editor = Editor::with_capacity(
        config.file.buffer.initial_rows,
        config.file.history.initial_records,
    );

    let input = BufReader::new(open_input(&args)?);
    let stdout = io::stdout();
    let mut output = BufWriter::new(stdout.lock());

    let summary = match run_session(&mut editor, input, &mut output) {
        Ok(summary) => summary,
        Err(err) => {
            error!(target: "runtime", %err, "session_failed");
            return Err(err.into());
        }
    };

    info!(
        target: "runtime",
        commands = summary.commands,
        parse_errors = summary.parse_errors,
        payload_mismatches = summary.payload_mismatches,
        rejected = summary.rejected,
        rows = editor.row_count(),
        undo_depth = editor.undo_depth(),
        redo_depth = editor.redo_depth(),
        "shutdown"
    );
    Ok(())
}

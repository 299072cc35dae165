//! Toolwrapper - bridge terminal lines to a long-lived text tool.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use toolwrapper::{
    ChannelConfig, ChannelError, ConfigError, ConfigLoader, ProcessChannel, TextEncoding,
};

#[derive(Parser)]
#[command(
    name = "toolwrapper",
    about = "Drive a line-oriented text tool: one line in, one line out",
    version
)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Channel configuration file (TOML).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Text encoding for the tool's pipes (utf-8, latin-1, ascii).
    #[arg(short, long)]
    encoding: Option<TextEncoding>,

    /// Working directory for the tool.
    #[arg(long)]
    cwd: Option<PathBuf>,

    /// Do not run the tool under `stdbuf -i0 -o0`.
    #[arg(long)]
    no_stdbuf: bool,

    /// Tool command and arguments.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    command: Vec<String>,
}

#[derive(thiserror::Error, Debug)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Channel(#[from] ChannelError),
    #[error("Terminal I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("No tool command given and no config file found")]
    NoCommand,
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

fn resolve_config(cli: Cli) -> Result<ChannelConfig, CliError> {
    let from_file = match &cli.config {
        Some(path) => Some(ConfigLoader::load_from_path(path)?),
        None if cli.command.is_empty() => ConfigLoader::new().load()?,
        None => None,
    };

    let mut config = match from_file {
        Some(mut config) => {
            if !cli.command.is_empty() {
                config.command = cli.command;
            }
            config
        }
        None if cli.command.is_empty() => return Err(CliError::NoCommand),
        None => ChannelConfig::new(cli.command),
    };

    if let Some(encoding) = cli.encoding {
        config = config.encoding(encoding);
    }
    if let Some(dir) = cli.cwd {
        config = config.working_dir(dir);
    }
    if cli.no_stdbuf {
        config = config.stdbuf(false);
    }
    Ok(config.auto_start(true))
}

fn run(cli: Cli) -> Result<(), CliError> {
    let config = resolve_config(cli)?;
    let mut channel = ProcessChannel::new(config)?;
    tracing::info!(channel = %channel, pid = ?channel.pid(), "Tool ready");

    let mut stdin = io::stdin().lock();
    let mut stdout = io::stdout().lock();
    let mut line = String::new();
    loop {
        line.clear();
        if stdin.read_line(&mut line)? == 0 {
            break;
        }
        // Only the newline is a terminator; a `\r` belongs to the record.
        let record = line.strip_suffix('\n').unwrap_or(&line);
        channel.writeline(record)?;
        let reply = channel.readline()?;
        writeln!(stdout, "{reply}")?;
        stdout.flush()?;
    }

    channel.close();
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "toolwrapper failed");
            eprintln!("toolwrapper: {e}");
            ExitCode::FAILURE
        }
    }
}

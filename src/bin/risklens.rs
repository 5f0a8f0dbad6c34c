//! Risklens CLI - Command-line interface for the risk engine
//!
//! Commands:
//! - analyze: Evaluate a recorded session into a full report
//! - score: Aggregate a set of signal tiers directly
//! - config: Print the effective configuration

use clap::{Parser, Subcommand};
use log::LevelFilter;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use risklens::types::EmailReputation;
use risklens::{
    aggregate, evaluate_recorded, AnalysisConfig, AnalysisError, RecordedSession, SignalTiers,
    PRODUCER_NAME, RISKLENS_VERSION,
};

/// Risklens - Browser fraud-risk self-check engine
#[derive(Parser)]
#[command(name = "risklens")]
#[command(version = RISKLENS_VERSION)]
#[command(about = "Score browser sessions for fraud risk", long_about = None)]
struct Cli {
    /// Enable debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a recorded session (batch mode)
    Analyze {
        /// Recorded session JSON (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Configuration file (defaults apply to missing fields)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Pretty-print the report
        #[arg(long)]
        pretty: bool,
    },

    /// Aggregate signal tiers into a verdict
    Score {
        /// Signal tiers JSON (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Email reputation JSON to include
        #[arg(long)]
        email: Option<PathBuf>,

        /// Configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Pretty-print the verdict
        #[arg(long)]
        pretty: bool,
    },

    /// Print the effective configuration
    Config {
        /// Configuration file to validate and print with defaults filled in
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), RisklensCliError> {
    match cli.command {
        Commands::Analyze {
            input,
            config,
            output,
            pretty,
        } => cmd_analyze(&input, config.as_deref(), &output, pretty),

        Commands::Score {
            input,
            email,
            config,
            pretty,
        } => cmd_score(&input, email.as_deref(), config.as_deref(), pretty),

        Commands::Config { config } => cmd_config(config.as_deref()),
    }
}

fn cmd_analyze(
    input: &Path,
    config: Option<&Path>,
    output: &Path,
    pretty: bool,
) -> Result<(), RisklensCliError> {
    let config = load_config(config)?;
    let input_data = read_input(input)?;
    if input_data.trim().is_empty() {
        return Err(RisklensCliError::EmptyInput);
    }

    let session = RecordedSession::from_json(&input_data)?;
    log::debug!(
        "replaying session: {} pointer samples, {} scroll samples",
        session.pointer.len(),
        session.scroll.len()
    );

    let report = evaluate_recorded(&session, &config);
    log::info!(
        "{} {}: score {} ({})",
        PRODUCER_NAME,
        report.run_id,
        report.verdict.score,
        report.verdict.tier
    );

    write_output(output, &report.to_json(pretty)?)
}

fn cmd_score(
    input: &Path,
    email: Option<&Path>,
    config: Option<&Path>,
    pretty: bool,
) -> Result<(), RisklensCliError> {
    let config = load_config(config)?;
    let tiers: SignalTiers = serde_json::from_str(&read_input(input)?)?;
    let reputation: Option<EmailReputation> = match email {
        Some(path) => Some(serde_json::from_str(&fs::read_to_string(path)?)?),
        None => None,
    };

    let verdict = aggregate(&tiers, reputation.as_ref(), &config.weights);
    let json = if pretty {
        serde_json::to_string_pretty(&verdict)?
    } else {
        serde_json::to_string(&verdict)?
    };
    println!("{}", json);
    Ok(())
}

fn cmd_config(config: Option<&Path>) -> Result<(), RisklensCliError> {
    let config = load_config(config)?;
    println!("{}", config.to_json()?);
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<AnalysisConfig, RisklensCliError> {
    match path {
        Some(path) => Ok(AnalysisConfig::from_file(path)?),
        None => Ok(AnalysisConfig::default()),
    }
}

fn read_input(input: &Path) -> Result<String, RisklensCliError> {
    if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn write_output(output: &Path, data: &str) -> Result<(), RisklensCliError> {
    if output.to_string_lossy() == "-" {
        println!("{}", data);
    } else {
        fs::write(output, data)?;
    }
    Ok(())
}

#[derive(Debug)]
enum RisklensCliError {
    Io(io::Error),
    Analysis(AnalysisError),
    Json(serde_json::Error),
    EmptyInput,
}

impl From<io::Error> for RisklensCliError {
    fn from(e: io::Error) -> Self {
        RisklensCliError::Io(e)
    }
}

impl From<AnalysisError> for RisklensCliError {
    fn from(e: AnalysisError) -> Self {
        RisklensCliError::Analysis(e)
    }
}

impl From<serde_json::Error> for RisklensCliError {
    fn from(e: serde_json::Error) -> Self {
        RisklensCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<RisklensCliError> for CliError {
    fn from(e: RisklensCliError) -> Self {
        match e {
            RisklensCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            RisklensCliError::Analysis(AnalysisError::Config(msg)) => CliError {
                code: "CONFIG_ERROR".to_string(),
                message: msg,
                hint: Some("Run 'risklens config' to see the expected layout".to_string()),
            },
            RisklensCliError::Analysis(e) => CliError {
                code: "ANALYSIS_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Ensure the input is a recorded session JSON object".to_string()),
            },
            RisklensCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            RisklensCliError::EmptyInput => CliError {
                code: "EMPTY_INPUT".to_string(),
                message: "No session data found in input".to_string(),
                hint: Some("Ensure input file is not empty".to_string()),
            },
        }
    }
}

use std::io::{self, Write};
use std::path::PathBuf;

use cellkit::runtime::RuntimeConfig;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::error::{DemoError, Result};
use crate::scenarios::{self, Scenario, Transcript};

#[derive(Debug, Parser)]
#[command(
    name = "cellkit-demo",
    about = "Replay owned-state, link and environment scenarios headlessly",
    version
)]
pub struct Cli {
    /// Scenario to replay.
    #[arg(long, value_enum, default_value_t = Scenario::All)]
    pub scenario: Scenario,

    /// TOML runtime configuration. `CELLKIT_*` variables still apply on top.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// `tracing` filter directive. Overrides `RUST_LOG` and the config file.
    #[arg(long)]
    pub log_filter: Option<String>,

    /// Emit transcripts as JSON instead of text.
    #[arg(long)]
    pub json: bool,
}

pub fn run_from_env() -> Result<()> {
    let cli = Cli::parse();
    run(cli)
}

pub fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli)?;
    init_logging(cli.log_filter.as_deref(), &config)?;

    let transcripts = scenarios::run(cli.scenario, &config)?;
    let mut out = io::stdout().lock();
    write_transcripts(&mut out, &transcripts, cli.json)?;
    out.flush()?;
    Ok(())
}

/// File (if given) first, then `CELLKIT_*` overrides.
pub fn load_config(cli: &Cli) -> Result<RuntimeConfig> {
    let base = match &cli.config {
        Some(path) => RuntimeConfig::load(path)?,
        None => RuntimeConfig::default(),
    };
    Ok(base.apply_env()?)
}

/// Filter precedence: `--log-filter`, `RUST_LOG`, `config.log_filter`.
fn resolve_filter(flag: Option<&str>, config: &RuntimeConfig) -> Result<EnvFilter> {
    let directive = match flag {
        Some(flag) => flag.to_string(),
        None => match std::env::var(EnvFilter::DEFAULT_ENV) {
            Ok(value) if !value.trim().is_empty() => value,
            _ => config.log_filter.clone(),
        },
    };
    EnvFilter::try_new(&directive).map_err(|err| DemoError::LogFilter {
        filter: directive,
        message: err.to_string(),
    })
}

fn init_logging(flag: Option<&str>, config: &RuntimeConfig) -> Result<()> {
    let filter = resolve_filter(flag, config)?;
    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
    if let Err(err) = installed {
        tracing::debug!(message = "demo.logging.skip", error = %err);
    }
    Ok(())
}

pub fn write_transcripts(
    out: &mut impl Write,
    transcripts: &[Transcript],
    json: bool,
) -> Result<()> {
    if json {
        serde_json::to_writer_pretty(&mut *out, transcripts)?;
        writeln!(out)?;
        return Ok(());
    }
    for (i, transcript) in transcripts.iter().enumerate() {
        if i > 0 {
            writeln!(out)?;
        }
        write!(out, "{transcript}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("cellkit-demo").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn defaults_to_all_scenarios() {
        let cli = parse(&[]);
        assert_eq!(cli.scenario, Scenario::All);
        assert!(cli.config.is_none());
        assert!(!cli.json);
    }

    #[test]
    fn parses_flags() {
        let cli = parse(&["--scenario", "sheet", "--json", "--log-filter", "debug"]);
        assert_eq!(cli.scenario, Scenario::Sheet);
        assert!(cli.json);
        assert_eq!(cli.log_filter.as_deref(), Some("debug"));
    }

    #[test]
    fn unknown_scenario_is_rejected() {
        let parsed = Cli::try_parse_from(["cellkit-demo", "--scenario", "carousel"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn flag_filter_wins_and_bad_filter_is_reported() {
        let config = RuntimeConfig::default();
        assert!(resolve_filter(Some("cellkit_runtime=debug"), &config).is_ok());

        let err = resolve_filter(Some("=[broken"), &config).unwrap_err();
        assert!(matches!(err, DemoError::LogFilter { ref filter, .. } if filter == "=[broken"));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn second_logging_init_is_tolerated() {
        let config = RuntimeConfig::default();
        assert!(init_logging(Some("warn"), &config).is_ok());
        assert!(init_logging(Some("warn"), &config).is_ok());
        assert!(init_logging(Some("=[broken"), &config).is_err());
    }

    #[test]
    fn config_file_is_loaded() {
        use std::io::Write as _;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "max_flush_passes = 5").unwrap();
        let cli = parse(&["--config", file.path().to_str().unwrap()]);
        let config = load_config(&cli).unwrap();
        assert_eq!(config.max_flush_passes, 5);

        let cli = parse(&["--config", "/nonexistent/cellkit.toml"]);
        assert!(matches!(load_config(&cli), Err(DemoError::Config(_))));
    }

    #[test]
    fn text_and_json_output() {
        let transcripts = scenarios::run(Scenario::Counter, &RuntimeConfig::default()).unwrap();

        let mut text = Vec::new();
        write_transcripts(&mut text, &transcripts, false).unwrap();
        let text = String::from_utf8(text).unwrap();
        assert!(text.starts_with("== counter"));
        assert!(text.contains("You've tapped 3 times"));

        let mut json = Vec::new();
        write_transcripts(&mut json, &transcripts, true).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&json).unwrap();
        assert_eq!(value[0]["scenario"], "counter");
        assert!(value[0]["frames"].as_array().is_some_and(|f| !f.is_empty()));
    }
}

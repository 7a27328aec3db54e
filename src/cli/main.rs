// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * VulCheck - Passive Client-Side Vulnerability Checks
 * Replays captured HTTP traffic through the passive checks
 *
 * Checks:
 * - Reverse tabnabbing
 * - Clickjacking
 * - XSSI (with live dynamic-content probing)
 * - Cross site flashing
 *
 * (c) 2026 Bountyy Oy
 */

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use vulcheck_scanner::capture::load_capture;
use vulcheck_scanner::config::{load_unvalidated_config, AppConfig, ChecksConfig, ConfigValidator};
use vulcheck_scanner::http_client::HttpClient;
use vulcheck_scanner::host::RequestSender;
use vulcheck_scanner::pipeline::{PassiveScanEngine, RetestSummary};
use vulcheck_scanner::reporting::{LogEntry, ReportStore, StatsUpdate};
use vulcheck_scanner::types::Finding;

const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

#[derive(Parser)]
#[command(name = "vulcheck")]
#[command(author = "Bountyy Oy <info@bountyy.fi>")]
#[command(version)]
#[command(about = "Passive checks for reverse tabnabbing, clickjacking, XSSI and cross site flashing", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    /// Quiet mode - only errors are logged
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Configuration file path (yaml, toml or json)
    #[arg(short, long, global = true, env = "VULCHECK_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the checks over a capture file
    Scan {
        /// JSON capture of request/response pairs
        #[arg(short, long)]
        input: PathBuf,

        /// Only exchanges for this host or its subdomains
        #[arg(long, default_value = "")]
        host: String,

        /// Enable every check regardless of configuration
        #[arg(long)]
        enable_all: bool,

        /// Do not send probe requests; XSSI will not report
        #[arg(long)]
        no_probe: bool,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Output file path (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Validate the configuration and print a report
    CheckConfig,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ScanReport {
    summary: RetestSummary,
    entries: Vec<LogEntry>,
    findings: Vec<Finding>,
    stats: Vec<StatsUpdate>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    // check-config reports range errors itself, so validation happens per command
    let config = load_unvalidated_config(cli.config.as_deref())?;

    init_logging(&cli, &config);

    match cli.command {
        Commands::Scan {
            input,
            host,
            enable_all,
            no_probe,
            format,
            output,
        } => {
            ConfigValidator::validate_app_config(&config)?;
            let mut config = config;
            if enable_all {
                config.checks = ChecksConfig::all_enabled();
            }
            if no_probe {
                config.probe.enabled = false;
            }
            run_scan(&config, &input, &host, format, output).await
        }
        Commands::CheckConfig => {
            let report = ConfigValidator::generate_validation_report(&config);
            report.log();
            if report.has_errors() {
                anyhow::bail!("Configuration is invalid");
            }
            info!("Configuration validation passed");
            Ok(())
        }
    }
}

fn init_logging(cli: &Cli, config: &AppConfig) {
    let level = if cli.debug {
        "debug"
    } else if cli.quiet {
        "error"
    } else if cli.verbose {
        "info"
    } else {
        config.observability.log_level.as_str()
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    if config.observability.json_logs {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn run_scan(
    config: &AppConfig,
    input: &PathBuf,
    host: &str,
    format: OutputFormat,
    output: Option<PathBuf>,
) -> Result<()> {
    let start = Instant::now();
    let exchanges = load_capture(input)?;
    info!("Loaded {} exchanges from {:?}", exchanges.len(), input);

    let sender: Option<Arc<dyn RequestSender>> = if config.probe.enabled {
        let client = HttpClient::with_config(
            config.http.timeout_secs,
            config.http.max_retries,
            config.http.accept_invalid_certs,
            config.http.max_body_bytes,
        )?;
        Some(Arc::new(client))
    } else {
        warn!("Probing disabled: XSSI findings cannot be confirmed");
        None
    };

    let store = Arc::new(ReportStore::new());
    let engine = PassiveScanEngine::from_config(config, store.clone(), sender);

    let summary = engine.retest(&exchanges, host).await;
    engine.shutdown(SHUTDOWN_GRACE).await;

    let report = ScanReport {
        summary,
        entries: store.entries(),
        findings: store.deduplicated_findings(),
        stats: store.stats_rows(),
    };

    let rendered = match format {
        OutputFormat::Json => serde_json::to_string_pretty(&report)?,
        OutputFormat::Text => render_text(&report),
    };

    match output {
        Some(path) => {
            std::fs::write(&path, rendered)
                .with_context(|| format!("Failed to write report: {:?}", path))?;
            info!("Report written to {:?}", path);
        }
        None => println!("{}", rendered),
    }

    info!(
        "Scan finished in {:.2}s: {} processed, {} finding(s)",
        start.elapsed().as_secs_f64(),
        report.summary.processed,
        report.findings.len()
    );
    Ok(())
}

fn render_text(report: &ScanReport) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "Exchanges: {} total, {} processed, {} without response, {} filtered by host\n\n",
        report.summary.total,
        report.summary.processed,
        report.summary.skipped_no_response,
        report.summary.skipped_host
    ));

    out.push_str("Checks:\n");
    for row in &report.stats {
        out.push_str(&format!(
            "  {:<22} {:<28} {} finding(s)\n",
            row.check_type.display_name(),
            row.status_line(),
            row.findings_count
        ));
    }

    out.push_str("\nLog:\n");
    for entry in &report.entries {
        out.push_str(&format!(
            "  {}  {:<22} {:<7} {}\n",
            entry.time_label(),
            entry.check_type.display_name(),
            entry.outcome.label(),
            entry.url
        ));
    }

    if !report.findings.is_empty() {
        out.push_str("\nFindings:\n");
        for finding in &report.findings {
            out.push_str(&format!(
                "  [{}/{}] {} - {}\n    {}\n",
                finding.severity, finding.confidence, finding.rule_name, finding.url, finding.detail
            ));
        }
    }

    out
}

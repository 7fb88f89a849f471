use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use log::{error, info, warn};
use rayon::prelude::*;
use serde::Serialize;

use scamshield::audit::{audit, AuditReport, AuditSummary};
use scamshield::banlist::LegacyBanlist;
use scamshield::scenario::{load_dir, LoadedFile};
use scamshield::simulate::{simulate, CorpusReport, SimulationResult, REQUIRED_SUCCESS_RATE};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

struct CheckConfig {
    /// Directory holding one `*.json` document per scenario.
    scenario_dir: PathBuf,
    /// Percent of scenarios that must pass both gates.
    required_success_rate: f64,
    /// Worker threads for the corpus (0 = one per core).
    threads: usize,
    /// Print the full structured report as JSON instead of a summary.
    json: bool,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            scenario_dir: PathBuf::from("assets/scenarios"),
            required_success_rate: REQUIRED_SUCCESS_RATE,
            threads: 0,
            json: false,
        }
    }
}

impl CheckConfig {
    fn from_args(args: &[String]) -> Self {
        let json = args.iter().any(|a| a == "--json");
        let positional: Vec<&String> = args.iter().skip(1).filter(|a| *a != "--json").collect();
        let defaults = Self::default();
        Self {
            scenario_dir: positional
                .first()
                .map(|s| PathBuf::from(s.as_str()))
                .unwrap_or(defaults.scenario_dir),
            required_success_rate: positional
                .get(1)
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.required_success_rate),
            threads: positional
                .get(2)
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.threads),
            json,
        }
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BanlistHit {
    file: String,
    errors: Vec<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CheckReport {
    required_success_rate: f64,
    banlist: Vec<BanlistHit>,
    audit: AuditSummary,
    simulation: CorpusReport,
    passed: bool,
}

fn print_summary(report: &CheckReport) {
    println!("\n========================================");
    println!("       SCENARIO CORPUS CHECK");
    println!("========================================");
    println!(
        "  Legacy fields : {} file(s) flagged",
        report.banlist.len()
    );
    println!(
        "  Validation    : {}/{} passed ({:.1}%)",
        report.audit.passed, report.audit.total, report.audit.reliability_score
    );
    println!(
        "  Simulation    : {}/{} scenarios completed ({:.1}%)",
        report.simulation.successful_scenarios,
        report.simulation.total_scenarios,
        report.simulation.success_rate
    );
    println!(
        "  Paths         : {} completed, {:.1} steps on average",
        report.simulation.total_completed_paths, report.simulation.average_steps
    );

    for hit in &report.banlist {
        println!("  [legacy] {}: {}", hit.file, hit.errors.join("; "));
    }
    for result in report.audit.results.iter().filter(|r| !r.valid) {
        println!("  [invalid] {}:", result.scenario_id);
        for e in &result.errors {
            println!("      - {e}");
        }
    }
    for failure in report.simulation.failures() {
        println!(
            "  [unfinished] {}: {}",
            failure.scenario_id,
            failure.error.as_deref().unwrap_or("no completed path")
        );
    }
    for id in &report.simulation.low_completion {
        println!("  [low completion] {id}");
    }

    let verdict = if report.passed { "PASSED" } else { "FAILED" };
    println!(
        "\n  Result: {verdict} (required {:.1}%)",
        report.required_success_rate
    );
    println!("========================================\n");
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

fn check_file(file: &LoadedFile) -> (AuditReport, SimulationResult) {
    match &file.scenario {
        Ok(scenario) => (audit(scenario), simulate(scenario)),
        Err(e) => {
            let name = file.name();
            warn!("{name}: {e:#}");
            (
                AuditReport::unreadable(&name, format!("{e:#}")),
                SimulationResult::failed(&name, format!("Failed to load scenario: {e:#}")),
            )
        }
    }
}

fn run(config: &CheckConfig) -> Result<CheckReport> {
    if config.threads > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(config.threads)
            .build_global()
            .context("failed to initialize worker pool")?;
    }

    let files = load_dir(&config.scenario_dir)?;
    info!(
        "Checking {} scenarios from {}",
        files.len(),
        config.scenario_dir.display()
    );

    let banlist = LegacyBanlist::new()?;
    let hits: Vec<BanlistHit> = files
        .iter()
        .filter_map(|f| {
            let errors = banlist.check(&f.content);
            (!errors.is_empty()).then(|| BanlistHit {
                file: f.name(),
                errors,
            })
        })
        .collect();
    for hit in &hits {
        warn!("{}: {}", hit.file, hit.errors.join("; "));
    }

    let (audits, results): (Vec<AuditReport>, Vec<SimulationResult>) =
        files.par_iter().map(check_file).unzip();

    let audit = AuditSummary::from_reports(audits);
    let simulation = CorpusReport::from_results(results);
    let passed = hits.is_empty()
        && audit.passes(config.required_success_rate)
        && simulation.passes(config.required_success_rate);

    Ok(CheckReport {
        required_success_rate: config.required_success_rate,
        banlist: hits,
        audit,
        simulation,
        passed,
    })
}

fn main() -> Result<ExitCode> {
    // Control verbosity with RUST_LOG:
    //   RUST_LOG=info   per-scenario outcomes
    //   RUST_LOG=debug  + per-path replay and traversal detail
    //   RUST_LOG=trace  + every trust/pressure update
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.iter().any(|a| a == "-h" || a == "--help") {
        println!(
            "Usage: scamshield-check [scenario_dir] [required_rate] [threads] [--json]\n\
             \n\
             Example:\n  scamshield-check assets/scenarios 95 4\n\
             \n\
             Logging: set RUST_LOG=debug or RUST_LOG=trace for verbose output"
        );
        return Ok(ExitCode::SUCCESS);
    }

    let config = CheckConfig::from_args(&args);
    let report = run(&config)
        .with_context(|| format!("check failed for {}", config.scenario_dir.display()))?;

    if config.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("failed to serialize report")?
        );
    } else {
        print_summary(&report);
    }

    if report.passed {
        info!("Corpus gate passed");
        Ok(ExitCode::SUCCESS)
    } else {
        error!(
            "Corpus gate failed: validation {:.1}%, simulation {:.1}%, required {:.1}%",
            report.audit.reliability_score,
            report.simulation.success_rate,
            config.required_success_rate
        );
        Ok(ExitCode::FAILURE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_config_defaults() {
        let c = CheckConfig::from_args(&args(&["scamshield-check"]));
        assert_eq!(c.scenario_dir, PathBuf::from("assets/scenarios"));
        assert_eq!(c.required_success_rate, 95.0);
        assert_eq!(c.threads, 0);
        assert!(!c.json);
    }

    #[test]
    fn test_config_positional_and_flag() {
        let c = CheckConfig::from_args(&args(&["bin", "--json", "content", "90", "4"]));
        assert_eq!(c.scenario_dir, PathBuf::from("content"));
        assert_eq!(c.required_success_rate, 90.0);
        assert_eq!(c.threads, 4);
        assert!(c.json);
    }

    #[test]
    fn test_config_ignores_unparsable_numbers() {
        let c = CheckConfig::from_args(&args(&["bin", "content", "lots"]));
        assert_eq!(c.required_success_rate, 95.0);
    }
}

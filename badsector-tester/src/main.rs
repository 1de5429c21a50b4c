mod common;
mod live;
mod logic;

use anyhow::{Context, Result};
use badsector_game::{Catalog, CatalogLoader, EmbeddedCatalog, JsonCatalog};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use common::scenario::{get_scenario, list_scenarios};
use common::split_csv;
use live::{FlavorConfig, LiveRunner, LiveTester, build_source};
use logic::{GameTester, LogicTester, ScenarioResult, resolve_seed_inputs};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TestMode {
    /// Deterministic runs on a virtual clock (fast)
    Logic,
    /// Real-time runs on tokio with a live flavor backend
    Live,
}

#[derive(Debug, Parser)]
#[command(name = "badsector-tester", version = "0.1.0")]
#[command(about = "Automated QA for the Bad Sector game core - logic sweeps and live sessions")]
struct Args {
    /// Test mode: logic (virtual clock) or live (wall clock)
    #[arg(long, value_enum, default_value_t = TestMode::Logic)]
    mode: TestMode,

    /// Scenarios to run (comma-separated, or "all")
    #[arg(long, default_value = "smoke")]
    scenarios: String,

    /// List all available scenarios and exit
    #[arg(long)]
    list_scenarios: bool,

    /// Seeds to run (comma-separated integers or a..b ranges)
    #[arg(long, default_value = "1337")]
    seeds: String,

    /// Number of iterations per scenario and seed
    #[arg(long, default_value_t = 10)]
    iterations: usize,

    /// Output report format
    #[arg(long, default_value = "console")]
    #[arg(value_parser = ["json", "markdown", "console"])]
    report: String,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Catalog JSON to play on instead of the embedded one
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Wall-clock budget per live run, in seconds
    #[arg(long, default_value_t = 30)]
    live_seconds: u64,

    /// OpenAI-compatible endpoint for lore (live mode)
    #[arg(long)]
    flavor_endpoint: Option<String>,

    /// Model name sent to the flavor endpoint
    #[arg(long)]
    flavor_model: Option<String>,

    /// Give up on a lore request after this many milliseconds
    #[arg(long)]
    flavor_timeout_ms: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if maybe_list_scenarios(&args)? {
        return Ok(());
    }

    announce_banner();

    let start_time = Instant::now();
    let scenarios = expand_scenarios(&args.scenarios);
    let seed_infos = resolve_seed_inputs(&split_csv(&args.seeds))?;
    let seeds: Vec<u64> = seed_infos.iter().map(|s| s.seed).collect();
    let catalog = Arc::new(load_catalog(args.catalog.as_deref())?);
    let game_tester = GameTester::new(catalog, args.verbose);

    let results = match args.mode {
        TestMode::Logic => run_logic_scenarios(&args, &scenarios, &seeds, &game_tester),
        TestMode::Live => run_live_scenarios(&args, &scenarios, &seeds, &game_tester).await?,
    };

    write_reports(&args, &results, start_time)?;

    if results.iter().any(|r| !r.passed) {
        std::process::exit(1);
    }

    Ok(())
}

fn maybe_list_scenarios(args: &Args) -> Result<bool> {
    if !args.list_scenarios {
        return Ok(false);
    }
    let mut output_target = OutputTarget::new(args.output.clone())?;
    writeln!(output_target.writer(), "Available scenarios:")?;
    for (key, description) in list_scenarios() {
        writeln!(output_target.writer(), "  {key:25} - {description}")?;
    }
    output_target.flush_inner()?;
    Ok(true)
}

fn announce_banner() {
    println!("{}", "🎮 Bad Sector Automated Tester".bright_cyan().bold());
    println!("{}", "================================".cyan());
}

fn expand_scenarios(scenarios_arg: &str) -> Vec<String> {
    let mut scenarios = split_csv(scenarios_arg);
    if scenarios.iter().any(|s| s == "all") {
        scenarios.retain(|s| s != "all");
        for (key, _) in list_scenarios() {
            if !scenarios.iter().any(|s| s == key) {
                scenarios.push(key.to_string());
            }
        }
    }
    scenarios
}

fn load_catalog(path: Option<&Path>) -> Result<Catalog> {
    let Some(path) = path else {
        return Ok(EmbeddedCatalog.load_catalog()?);
    };
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read catalog {}", path.display()))?;
    JsonCatalog::new(json)
        .load_catalog()
        .with_context(|| format!("invalid catalog {}", path.display()))
}

/// Defaults, then environment, then command line.
fn flavor_config(args: &Args) -> FlavorConfig {
    let mut config = FlavorConfig::default().with_env_overrides();
    if let Some(endpoint) = &args.flavor_endpoint {
        config.endpoint = Some(endpoint.clone());
    }
    if let Some(model) = &args.flavor_model {
        config.model = model.clone();
    }
    if let Some(timeout_ms) = args.flavor_timeout_ms {
        config.timeout_ms = timeout_ms;
    }
    config
}

fn run_logic_scenarios(
    args: &Args,
    scenarios: &[String],
    seeds: &[u64],
    game_tester: &GameTester,
) -> Vec<ScenarioResult> {
    println!("{}", "🧠 Running Logic Tests".bright_yellow().bold());
    println!("{}", "-".repeat(30).yellow());

    let logic_tester = LogicTester::new(game_tester.clone());
    let mut results = Vec::new();

    for scenario_name in scenarios {
        if let Some(scenario) = get_scenario(scenario_name) {
            results.extend(logic_tester.run_scenario(&scenario, seeds, args.iterations));
        } else {
            eprintln!("⚠️  Unknown scenario: {}", scenario_name.yellow());
        }
    }

    results
}

async fn run_live_scenarios(
    args: &Args,
    scenarios: &[String],
    seeds: &[u64],
    game_tester: &GameTester,
) -> Result<Vec<ScenarioResult>> {
    println!("{}", "📡 Running Live Sessions".bright_blue().bold());
    println!("{}", "-".repeat(30).blue());

    let config = flavor_config(args);
    let source = build_source(&config)?;
    let runner = LiveRunner::new(
        game_tester.catalog(),
        source,
        config.timeout(),
        Duration::from_secs(args.live_seconds),
        args.verbose,
    );
    let live_tester = LiveTester::new(runner);
    let mut results = Vec::new();

    for scenario_name in scenarios {
        if let Some(scenario) = get_scenario(scenario_name) {
            results.extend(
                live_tester
                    .run_scenario(&scenario, seeds, args.iterations)
                    .await,
            );
        } else {
            eprintln!("⚠️  Unknown scenario: {}", scenario_name.yellow());
        }
    }

    Ok(results)
}

fn write_reports(args: &Args, results: &[ScenarioResult], start_time: Instant) -> Result<()> {
    let mut output_target = OutputTarget::new(args.output.clone())?;

    match args.report.as_str() {
        "json" => logic::reports::generate_json_report(&mut output_target, results)?,
        "markdown" => {
            if results.is_empty() {
                writeln!(
                    &mut output_target,
                    "# Bad Sector Test Results\n\n_No scenarios executed._"
                )?;
            } else {
                logic::reports::generate_markdown_report(&mut output_target, results)?;
            }
        }
        _ => {
            let duration = start_time.elapsed();
            if results.is_empty() {
                writeln!(&mut output_target, "No scenarios executed.")?;
            } else {
                logic::reports::generate_console_report(&mut output_target, results, duration)?;
            }
            writeln!(&mut output_target)?;
            writeln!(&mut output_target, "🏁 Total time: {duration:?}")?;
        }
    }

    output_target.flush_inner()?;
    Ok(())
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    fn flush_inner(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}

impl Write for OutputTarget {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn base_args() -> Args {
        Args {
            mode: TestMode::Logic,
            scenarios: "smoke".to_string(),
            list_scenarios: false,
            seeds: "1337".to_string(),
            iterations: 1,
            report: "json".to_string(),
            verbose: false,
            output: None,
            catalog: None,
            live_seconds: 1,
            flavor_endpoint: None,
            flavor_model: None,
            flavor_timeout_ms: None,
        }
    }

    fn temp_path(label: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "badsector-main-{label}-{}-{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos()
        ))
    }

    fn sample_result() -> ScenarioResult {
        ScenarioResult::from_iterations(
            "Smoke Test",
            "logic",
            1,
            Vec::new(),
            vec![Duration::from_millis(2)],
        )
    }

    #[test]
    fn args_parse_from_the_command_line() {
        let args = Args::try_parse_from([
            "badsector-tester",
            "--mode",
            "live",
            "--seeds",
            "1..4",
            "--report",
            "markdown",
            "--flavor-model",
            "tiny",
        ])
        .unwrap();
        assert_eq!(args.mode, TestMode::Live);
        assert_eq!(args.seeds, "1..4");
        assert_eq!(args.flavor_model.as_deref(), Some("tiny"));
        assert!(Args::try_parse_from(["badsector-tester", "--report", "csv"]).is_err());
    }

    #[test]
    fn all_expands_to_every_scenario_once() {
        let expanded = expand_scenarios("combat-focus,all");
        assert_eq!(expanded[0], "combat-focus");
        assert_eq!(expanded.len(), list_scenarios().len());
        assert_eq!(expand_scenarios("smoke, escape-focus"), vec!["smoke", "escape-focus"]);
    }

    #[test]
    fn cli_flags_beat_defaults_for_flavor() {
        let mut args = base_args();
        args.flavor_endpoint = Some("http://127.0.0.1:9".to_string());
        args.flavor_model = Some("tiny".to_string());
        args.flavor_timeout_ms = Some(150);
        let config = flavor_config(&args);
        assert_eq!(config.endpoint.as_deref(), Some("http://127.0.0.1:9"));
        assert_eq!(config.model, "tiny");
        assert_eq!(config.timeout(), Duration::from_millis(150));
    }

    #[test]
    fn catalog_files_are_validated() {
        assert_eq!(load_catalog(None).unwrap().locations.len(), 4);

        let path = temp_path("catalog.json");
        std::fs::write(&path, r#"{"parts": [], "locations": [], "items": []}"#).unwrap();
        assert!(load_catalog(Some(&path)).is_err());

        let json = serde_json::to_string(badsector_game::catalog()).unwrap();
        std::fs::write(&path, json).unwrap();
        assert_eq!(load_catalog(Some(&path)).unwrap().items.len(), 4);
        let _ = std::fs::remove_file(path);
        assert!(load_catalog(Some(Path::new("/nonexistent/catalog.json"))).is_err());
    }

    #[test]
    fn list_scenarios_writes_to_file() {
        let path = temp_path("list");
        let mut args = base_args();
        args.list_scenarios = true;
        args.output = Some(path.clone());
        assert!(maybe_list_scenarios(&args).unwrap());
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("Available scenarios:"));
        assert!(text.contains("salvage-sweep"));
        let _ = std::fs::remove_file(path);

        assert!(!maybe_list_scenarios(&base_args()).unwrap());
    }

    #[test]
    fn reports_write_each_format() {
        let results = vec![sample_result()];
        for (format, needle) in [
            ("json", "\"scenario_name\": \"Smoke Test\""),
            ("markdown", "# Bad Sector Test Results"),
            ("console", "Total time"),
        ] {
            let path = temp_path(format);
            let mut args = base_args();
            args.report = format.to_string();
            args.output = Some(path.clone());
            write_reports(&args, &results, Instant::now()).unwrap();
            let text = std::fs::read_to_string(&path).unwrap();
            assert!(text.contains(needle), "{format}: {text}");
            let _ = std::fs::remove_file(path);
        }
    }

    #[test]
    fn empty_runs_still_report() {
        let path = temp_path("empty");
        let mut args = base_args();
        args.report = "markdown".to_string();
        args.output = Some(path.clone());
        write_reports(&args, &[], Instant::now()).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("_No scenarios executed._"));
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn logic_runs_skip_unknown_scenarios() {
        let args = base_args();
        let tester = GameTester::with_default_catalog(false);
        let results = run_logic_scenarios(
            &args,
            &["smoke".to_string(), "bogus".to_string()],
            &[1],
            &tester,
        );
        assert_eq!(results.len(), 1);
        assert!(results[0].passed, "{:?}", results[0].failures);
    }
}

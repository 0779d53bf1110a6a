mod common;
mod logic;

use anyhow::{Context, Result};
use balance_game::TeacherSettings;
use clap::Parser;
use colored::Colorize;
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::{Path, PathBuf};
use std::time::Instant;

use common::split_csv;
use logic::{LogicTester, TestScenario, get_scenario, list_scenarios, resolve_seed_inputs};

#[derive(Debug, Parser)]
#[command(name = "balance-tester", version = "0.1.0")]
#[command(about = "Seeded play sessions for the Balance Game with invariant checks")]
struct Args {
    /// Scenarios to run (comma-separated, `all` for every scenario)
    #[arg(long, default_value = "smoke")]
    scenarios: String,

    /// List all available scenarios and exit
    #[arg(long)]
    list_scenarios: bool,

    /// Seeds to run (comma-separated, decimal or 0x hex)
    #[arg(long, default_value = "1337")]
    seeds: String,

    /// Number of iterations per scenario and seed
    #[arg(long, default_value_t = 10)]
    iterations: usize,

    /// Override the number of rounds each scenario plays
    #[arg(long)]
    rounds: Option<usize>,

    /// Teacher settings JSON applied to every scenario
    #[arg(long)]
    teacher_config: Option<PathBuf>,

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
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if maybe_list_scenarios(&args)? {
        return Ok(());
    }

    announce_banner();

    let start_time = Instant::now();
    let teacher = args
        .teacher_config
        .as_deref()
        .map(load_teacher_settings)
        .transpose()?;
    let scenarios = resolve_scenarios(&args, teacher);
    let seeds = resolve_seed_inputs(&split_csv(&args.seeds))?;

    let results = run_logic_scenarios(&args, &scenarios, &seeds);
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
    for scenario in list_scenarios() {
        writeln!(
            output_target.writer(),
            "  {:20} - {}",
            scenario.name,
            scenario.description
        )?;
    }
    output_target.flush_inner()?;
    Ok(true)
}

fn announce_banner() {
    println!("{}", "⚖️  Balance Game Automated Tester".bright_cyan().bold());
    println!("{}", "================================".cyan());
}

fn load_teacher_settings(path: &Path) -> Result<TeacherSettings> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    TeacherSettings::from_json(&raw)
        .with_context(|| format!("invalid teacher settings in {}", path.display()))
}

fn expand_scenarios(scenarios_arg: &str) -> Vec<String> {
    let mut scenarios = split_csv(scenarios_arg);
    if scenarios.iter().any(|s| s.eq_ignore_ascii_case("all")) {
        scenarios.retain(|s| !s.eq_ignore_ascii_case("all"));
        for scenario in list_scenarios() {
            if !scenarios.contains(&scenario.name) {
                scenarios.push(scenario.name);
            }
        }
    }
    scenarios
}

fn resolve_scenarios(args: &Args, teacher: Option<TeacherSettings>) -> Vec<TestScenario> {
    let mut resolved = Vec::new();
    for name in expand_scenarios(&args.scenarios) {
        let Some(mut scenario) = get_scenario(&name) else {
            eprintln!("⚠️  Unknown scenario: {}", name.yellow());
            continue;
        };
        if let Some(rounds) = args.rounds {
            scenario.plan = scenario.plan.with_rounds(rounds);
        }
        if let Some(settings) = teacher {
            scenario.plan = scenario.plan.with_teacher(settings);
        }
        resolved.push(scenario);
    }
    resolved
}

fn run_logic_scenarios(
    args: &Args,
    scenarios: &[TestScenario],
    seeds: &[u64],
) -> Vec<logic::ScenarioResult> {
    println!("{}", "🧠 Running Logic Tests".bright_yellow().bold());
    println!("{}", "-".repeat(30).yellow());

    let logic_tester = LogicTester::new(args.verbose);
    let mut results = Vec::new();
    for scenario in scenarios {
        log::info!(
            "running {} ({} rounds, {})",
            scenario.name,
            scenario.plan.rounds,
            scenario.plan.style
        );
        results.extend(logic_tester.run_scenario(scenario, seeds, args.iterations));
    }
    results
}

fn write_reports(
    args: &Args,
    results: &[logic::ScenarioResult],
    start_time: Instant,
) -> Result<()> {
    let mut output_target = OutputTarget::new(args.output.clone())?;

    match args.report.as_str() {
        "json" => {
            if results.is_empty() {
                writeln!(&mut output_target, "[]")?;
            } else {
                logic::reports::generate_json_report(&mut output_target, results)?;
            }
        }
        "markdown" => {
            if results.is_empty() {
                writeln!(
                    &mut output_target,
                    "# Balance Game Logic Test Results\n\n_No scenarios executed._"
                )?;
            } else {
                logic::reports::generate_markdown_report(&mut output_target, results)?;
            }
        }
        _ => {
            if results.is_empty() {
                writeln!(&mut output_target, "No logic scenarios executed.")?;
            } else {
                logic::reports::generate_console_report(
                    &mut output_target,
                    results,
                    start_time.elapsed(),
                )?;
            }
        }
    }

    let duration = start_time.elapsed();
    writeln!(&mut output_target)?;
    writeln!(&mut output_target, "🏁 Total time: {duration:?}")?;
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

    fn base_args() -> Args {
        Args {
            scenarios: "smoke".to_string(),
            list_scenarios: false,
            seeds: "1337".to_string(),
            iterations: 1,
            rounds: None,
            teacher_config: None,
            report: "json".to_string(),
            verbose: false,
            output: None,
        }
    }

    fn temp_path(label: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "balance-tester-{label}-{}",
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos()
        ))
    }

    #[test]
    fn all_expands_to_every_scenario_once() {
        let expanded = expand_scenarios("smoke, all");
        assert_eq!(expanded.len(), list_scenarios().len());
        assert_eq!(expanded[0], "smoke");
    }

    #[test]
    fn rounds_override_and_unknown_names() {
        let mut args = base_args();
        args.scenarios = "perfect-run,bogus".to_string();
        args.rounds = Some(3);
        let scenarios = resolve_scenarios(&args, None);
        assert_eq!(scenarios.len(), 1);
        assert_eq!(scenarios[0].plan.rounds, 3);
    }

    #[test]
    fn teacher_config_is_loaded_and_validated() {
        let good = temp_path("teacher-good");
        std::fs::write(&good, r#"{"active":true,"timer_secs":0,"locked_level":2}"#).unwrap();
        let settings = load_teacher_settings(&good).unwrap();
        assert!(settings.active);
        assert_eq!(settings.locked_level, Some(2));

        let bad = temp_path("teacher-bad");
        std::fs::write(&bad, r#"{"active":true,"locked_level":9}"#).unwrap();
        assert!(load_teacher_settings(&bad).is_err());
        let _ = std::fs::remove_file(good);
        let _ = std::fs::remove_file(bad);
    }

    #[test]
    fn markdown_report_is_written_to_file() {
        let mut args = base_args();
        args.report = "markdown".to_string();
        let path = temp_path("report");
        args.output = Some(path.clone());
        let scenarios = resolve_scenarios(&args, None);
        let results = run_logic_scenarios(&args, &scenarios, &[1]);
        write_reports(&args, &results, Instant::now()).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("# Balance Game Logic Test Results"));
        assert!(text.contains("smoke"));
        let _ = std::fs::remove_file(path);
    }
}

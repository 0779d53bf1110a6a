use std::process::Command;

fn temp_path(label: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!(
        "balance-cli-{label}-{}",
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos()
    ))
}

#[test]
fn cli_list_scenarios_writes_output() {
    let exe = env!("CARGO_BIN_EXE_balance-tester");
    let output_path = temp_path("list");
    let status = Command::new(exe)
        .args(["--list-scenarios", "--output"])
        .arg(&output_path)
        .status()
        .expect("run cli");
    assert!(status.success());
    let content = std::fs::read_to_string(&output_path).expect("read output");
    assert!(content.contains("Available scenarios"));
    assert!(content.contains("timer-timeouts"));
    let _ = std::fs::remove_file(output_path);
}

#[test]
fn cli_runs_smoke_with_json_report() {
    let exe = env!("CARGO_BIN_EXE_balance-tester");
    let output_path = temp_path("run");
    let output = Command::new(exe)
        .args([
            "--report",
            "json",
            "--scenarios",
            "smoke,locked-level",
            "--iterations",
            "1",
            "--seeds",
            "1,0x2a",
            "--output",
        ])
        .arg(&output_path)
        .output()
        .expect("run cli");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Balance Game Automated Tester"));
    let content = std::fs::read_to_string(&output_path).expect("read output");
    assert_eq!(content.matches("\"scenario_name\"").count(), 4);
    assert!(content.contains("\"seed\": 42"));
    let _ = std::fs::remove_file(output_path);
}

#[test]
fn cli_rejects_unknown_report_format() {
    let exe = env!("CARGO_BIN_EXE_balance-tester");
    let output = Command::new(exe)
        .args(["--report", "csv"])
        .output()
        .expect("run cli");
    assert!(!output.status.success());
}

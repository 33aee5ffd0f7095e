use predicates::str::contains;
use std::fs;
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_log_path(label: &str) -> std::path::PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time should be available")
        .as_nanos();
    std::env::temp_dir().join(format!("queue-opt-{}-{}.csv", label, nanos))
}

fn generate_log(path: &std::path::Path, count: &str) {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("queue-opt");
    cmd.args([
        "generate",
        "--output",
        path.to_str().unwrap(),
        "--count",
        count,
        "--arrival-rate",
        "2",
        "--service-rate",
        "5",
    ]);
    cmd.assert()
        .success()
        .stdout(contains(format!("wrote {} records to", count)));
}

#[test]
fn generated_log_summarizes_to_the_input_rates() {
    let path = temp_log_path("stats");
    generate_log(&path, "2000");

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("queue-opt");
    cmd.args(["stats", "--input", path.to_str().unwrap()]);
    cmd.assert()
        .success()
        .stdout(contains("Log Summary\n"))
        .stdout(contains("records: 2000\n"))
        .stdout(contains("interarrival:\n"))
        .stdout(contains("service:\n"))
        .stdout(contains("  count: 1999\n"));
    fs::remove_file(&path).expect("log remove should succeed");
}

#[test]
fn fit_recovers_the_generating_family() {
    let path = temp_log_path("fit");
    generate_log(&path, "2000");

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("queue-opt");
    cmd.args([
        "fit",
        "--input",
        path.to_str().unwrap(),
        "--family",
        "exponential",
        "--family",
        "log-normal",
        "--gof",
    ]);
    cmd.assert()
        .success()
        .stdout(contains("sample size: 1999\n"))
        .stdout(contains("best fit: exponential"))
        .stdout(contains("KS statistic:"))
        .stdout(contains("chi-square:"));
    fs::remove_file(&path).expect("log remove should succeed");
}

#[test]
fn fit_service_column_selects_the_service_sample() {
    let path = temp_log_path("fit-service");
    generate_log(&path, "500");

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("queue-opt");
    cmd.args([
        "fit",
        "--input",
        path.to_str().unwrap(),
        "--sample",
        "service",
        "--family",
        "exponential",
    ]);
    cmd.assert()
        .success()
        .stdout(contains("sample size: 500\n"))
        .stdout(contains("family: exponential\n"));
    fs::remove_file(&path).expect("log remove should succeed");
}

#[test]
fn fit_json_plot_carries_coordinates() {
    let path = temp_log_path("fit-plot");
    generate_log(&path, "500");

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("queue-opt");
    cmd.args([
        "fit",
        "--input",
        path.to_str().unwrap(),
        "--family",
        "exponential",
        "--plot",
        "--format",
        "json",
    ]);
    cmd.assert()
        .success()
        .stdout(contains("\"best\": \"exponential\""))
        .stdout(contains("\"qq_theoretical\""))
        .stdout(contains("\"pdf_x\""));
    fs::remove_file(&path).expect("log remove should succeed");
}

#[test]
fn fit_needs_at_least_two_records_for_interarrival() {
    let path = temp_log_path("fit-short");
    fs::write(&path, "request_id,arrival_time,service_time\n1,0.0,0.5\n")
        .expect("log write should succeed");

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("queue-opt");
    cmd.args(["fit", "--input", path.to_str().unwrap()]);
    cmd.assert()
        .failure()
        .stderr(contains("Error: sample must not be empty"));
    fs::remove_file(&path).expect("log remove should succeed");
}

#[test]
fn generate_json_reports_the_written_file() {
    let path = temp_log_path("gen-json");

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("queue-opt");
    cmd.args([
        "generate",
        "--output",
        path.to_str().unwrap(),
        "--count",
        "50",
        "--arrival-rate",
        "2",
        "--service-rate",
        "5",
        "--seed",
        "7",
        "--format",
        "json",
    ]);
    cmd.assert()
        .success()
        .stdout(contains("\"records\": 50"))
        .stdout(contains("\"seed\": 7"));
    fs::remove_file(&path).expect("log remove should succeed");
}

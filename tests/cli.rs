use assert_cmd::Command;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn temp_workspace() -> TempDir {
    tempfile::tempdir().expect("create tempdir")
}

fn run_command(cmd: &mut Command) {
    cmd.assert().success();
}

fn file_arg(path: &Path) -> &str {
    path.file_name().unwrap().to_str().unwrap()
}

fn write_samples(dir: &Path) {
    let samples = dir.join("samples");
    fs::create_dir(&samples).expect("create samples directory");
    for i in 0..12u32 {
        let record = format!(
            "{{\"service\":\"checkout\",\"region\":\"eu-west-1\",\"status\":\"ok\",\"request\":{i},\"latency_ms\":{}}}\n",
            i * 13 % 97
        );
        fs::write(samples.join(format!("sample_{i:02}.json")), record.repeat(3))
            .expect("write sample");
    }
}

#[test]
fn train_info_eval_round_trip() {
    let workspace = temp_workspace();
    write_samples(workspace.path());
    let dict_path = workspace.path().join("records.dict");
    let metrics_path = workspace.path().join("metrics.json");

    let mut train = Command::cargo_bin("zdict").expect("binary exists");
    train.current_dir(workspace.path()).args([
        "--quiet",
        "train",
        "samples",
        "--max-size",
        "1024",
        "--hash-bytes",
        "6",
        "--compat",
        "--dict-id",
        "4242",
        "--no-progress",
        "--verify",
        "--metrics",
        file_arg(&metrics_path),
        "-o",
        file_arg(&dict_path),
    ]);
    run_command(&mut train);
    let dict = fs::read(&dict_path).expect("dictionary was written");
    assert!(!dict.is_empty() && dict.len() <= 1024);

    let metrics: Value =
        serde_json::from_slice(&fs::read(&metrics_path).expect("metrics written"))
            .expect("metrics are valid JSON");
    assert_eq!(metrics["samples"].as_u64(), Some(12));
    assert!(metrics["picks"].as_array().is_some_and(|picks| !picks.is_empty()));

    let mut info = Command::cargo_bin("zdict").expect("binary exists");
    let info_output = info
        .current_dir(workspace.path())
        .args(["--quiet", "info", file_arg(&dict_path), "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let summary: Value = serde_json::from_slice(&info_output).expect("info output is JSON");
    assert_eq!(summary["kind"], "zstd");
    assert_eq!(summary["dict_id"].as_u64(), Some(4242));
    assert_eq!(summary["size"].as_u64(), Some(dict.len() as u64));

    let mut eval = Command::cargo_bin("zdict").expect("binary exists");
    let eval_output = eval
        .current_dir(workspace.path())
        .args([
            "--quiet",
            "eval",
            "-d",
            file_arg(&dict_path),
            "samples",
            "--level",
            "best",
            "--json",
        ])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let report: Value = serde_json::from_slice(&eval_output).expect("eval output is JSON");
    assert_eq!(report["samples"].as_u64(), Some(12));
    assert!(
        report["compressed_bytes"].as_u64().unwrap() < report["raw_bytes"].as_u64().unwrap()
    );
}

#[test]
fn raw_training_reports_content_only() {
    let workspace = temp_workspace();
    write_samples(workspace.path());
    let dict_path = workspace.path().join("raw.dict");

    let mut train = Command::cargo_bin("zdict").expect("binary exists");
    train.current_dir(workspace.path()).args([
        "--quiet",
        "train",
        "samples",
        "--max-size",
        "256",
        "--order",
        "last",
        "--no-progress",
        "-o",
        file_arg(&dict_path),
    ]);
    run_command(&mut train);

    let mut info = Command::cargo_bin("zdict").expect("binary exists");
    let info_text = String::from_utf8(
        info.current_dir(workspace.path())
            .args(["--quiet", "info", file_arg(&dict_path)])
            .assert()
            .success()
            .get_output()
            .stdout
            .clone(),
    )
    .expect("info output is UTF-8");
    assert!(info_text.contains("Kind         : raw"));
    assert!(info_text.contains("Header bytes : 0"));
}

#[test]
fn single_input_fails_with_empty_corpus() {
    let workspace = temp_workspace();
    let input = workspace.path().join("only.bin");
    fs::write(&input, b"one lonely sample").expect("write input");

    let mut train = Command::cargo_bin("zdict").expect("binary exists");
    let output = train
        .current_dir(workspace.path())
        .args(["--quiet", "train", file_arg(&input), "--no-progress"])
        .assert()
        .failure()
        .get_output()
        .stderr
        .clone();
    let stderr = String::from_utf8_lossy(&output);
    assert!(stderr.contains("at least 2"), "stderr was {stderr}");
    assert!(!workspace.path().join("dictionary.bin").exists());
}

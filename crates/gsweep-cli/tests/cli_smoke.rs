#![cfg(unix)]

use std::fs;
use std::path::Path;
use std::process::Command;

const LINEAR_FILE: &str = "linear_stddev=0.1_seed=1_nreps=1-fd_h=0.01-dim_001-replication_0000.txt";

fn write_experiment(dir: &Path, nreps: &str, backend: &Path) {
    let yaml = format!(
        r#"programs:
  linear:
    params: [2.0, [0.0, 1.0, 2.0]]
    stddevs: 0.1
    seed: 1
    nreps: {nreps}
estimators:
  fd:
    params:
      h: 0.01
backends:
  fd:
    command: sh
    args: ["{}"]
"#,
        backend.display()
    );
    fs::write(dir.join("experiment.yaml"), yaml).expect("write experiment");
}

fn write_backend(dir: &Path) -> std::path::PathBuf {
    let script = dir.join("backend.sh");
    fs::write(
        &script,
        "read request\necho '{\"output\": 1.0, \"gradient\": [0.5, 0.25], \"time\": 3.0}'\n",
    )
    .expect("write backend");
    script
}

fn gsweep() -> Command {
    Command::new(env!("CARGO_BIN_EXE_gsweep"))
}

#[test]
fn dry_run_lists_scenario_file() {
    let temp = tempfile::tempdir().expect("tmp dir");
    let backend = write_backend(temp.path());
    write_experiment(temp.path(), "[1]", &backend);
    let out = temp.path().join("results");

    let output = gsweep()
        .arg(temp.path())
        .arg("--out")
        .arg(&out)
        .arg("--dry-run")
        .output()
        .expect("run gsweep");
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).expect("utf8");
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines, vec![out.join(LINEAR_FILE).display().to_string()]);
    assert!(!out.join(LINEAR_FILE).exists());
}

#[test]
fn sweep_writes_rows_and_report() {
    let temp = tempfile::tempdir().expect("tmp dir");
    let backend = write_backend(temp.path());
    write_experiment(temp.path(), "[1]", &backend);
    let out = temp.path().join("results");

    let status = gsweep()
        .arg(temp.path().join("experiment.yaml"))
        .args(["-r", "1", "-s", "--out"])
        .arg(&out)
        .status()
        .expect("run gsweep");
    assert!(status.success());

    let body = fs::read_to_string(out.join(LINEAR_FILE)).expect("result file");
    assert_eq!(
        body,
        "x0,x1,y,dydx0,dydx1,cumulative_time\n\
         2.0,0.0,1.0,0.5,0.25,3.0\n\
         2.0,1.0,1.0,0.5,0.25,6.0\n\
         2.0,2.0,1.0,0.5,0.25,9.0\n"
    );
    assert!(out.join("sweep_report.json").exists());
}

#[test]
fn multiple_nreps_fail_without_creating_files() {
    let temp = tempfile::tempdir().expect("tmp dir");
    let backend = write_backend(temp.path());
    write_experiment(temp.path(), "[1, 2]", &backend);
    let out = temp.path().join("results");

    let status = gsweep()
        .arg(temp.path())
        .arg("--out")
        .arg(&out)
        .status()
        .expect("run gsweep");
    assert!(!status.success());
    let txt_files = fs::read_dir(&out)
        .expect("out dir")
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().extension().and_then(|ext| ext.to_str()) == Some("txt"))
        .count();
    assert_eq!(txt_files, 0);
}

#[test]
fn downsample_sums_blocks() {
    let temp = tempfile::tempdir().expect("tmp dir");
    let input = temp.path().join("reference.csv");
    let rows: String = (0..5).map(|i| format!("{i},1,0.5\n")).collect();
    fs::write(&input, rows).expect("write reference");
    let out = temp.path().join("blocks.csv");

    let status = Command::new(env!("CARGO_BIN_EXE_gsweep-downsample"))
        .arg("--input")
        .arg(&input)
        .args(["--block", "2", "--out"])
        .arg(&out)
        .status()
        .expect("run downsample");
    assert!(status.success());
    let body = fs::read_to_string(&out).expect("blocks");
    assert_eq!(
        body,
        "block,sus,inf,rec\n0,1.0,2.0,1.0\n1,5.0,2.0,1.0\n2,4.0,1.0,0.5\n"
    );
}

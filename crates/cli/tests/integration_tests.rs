/// Integration tests for the rowstore shell: table edits, saving, reopening
/// lazily and eagerly, binary sidecars and error reporting.
use std::fs;
use std::path::Path;
use tempfile::tempdir;

/// Runs the shell on `dir` with extra environment `env`, feeds it
/// `commands` followed by EXIT, and returns its stdout.
fn run_cli(dir: &Path, env: &[(&str, &str)], commands: &str) -> String {
    run_cli_streams(dir, env, commands).0
}

/// Like `run_cli`, returning stdout and stderr.
fn run_cli_streams(dir: &Path, env: &[(&str, &str)], commands: &str) -> (String, String) {
    use std::io::Write;
    use std::process::{Command, Stdio};

    let mut child = Command::new(env!("CARGO_BIN_EXE_cli"))
        .env("ROWSTORE_DIR", dir)
        .env("RUST_LOG", "warn")
        .envs(env.iter().copied())
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to spawn CLI");

    {
        let stdin = child.stdin.as_mut().expect("Failed to open stdin");
        stdin
            .write_all(commands.as_bytes())
            .expect("Failed to write to stdin");
        stdin.write_all(b"EXIT\n").expect("Failed to write EXIT");
    }

    let output = child.wait_with_output().expect("Failed to read output");
    (
        String::from_utf8_lossy(&output.stdout).to_string(),
        String::from_utf8_lossy(&output.stderr).to_string(),
    )
}

#[test]
fn test_startup_banner_and_exit() {
    let dir = tempdir().unwrap();
    let output = run_cli(dir.path(), &[], "");

    assert!(output.contains("Rowstore started"));
    assert!(output.contains("lazy=true"));
    assert!(output.contains("bye"));
}

#[test]
fn test_empty_dataset_sizes() {
    let dir = tempdir().unwrap();
    let output = run_cli(dir.path(), &[], "SIZE\n");

    assert!(output.contains("CalFocus 0"));
    assert!(output.contains("FlagCmd 0"));
}

#[test]
fn test_flag_insertion_trims_neighbours() {
    let dir = tempdir().unwrap();
    let commands = "FLAG 10 10 wind\nFLAG 25 10 shadow\nFLAG 15 15 slew\nDUMP FlagCmd\n";
    let output = run_cli(dir.path(), &[], commands);

    assert!(output.contains("OK [10, 20)"));
    assert!(output.contains("OK [15, 25)"));
    assert!(output.contains("<timeInterval>10 5</timeInterval>"));
    assert!(output.contains("<timeInterval>15 10</timeInterval>"));
    assert!(output.contains("<timeInterval>25 10</timeInterval>"));
}

#[test]
fn test_duplicate_focus_row_is_refused() {
    let dir = tempdir().unwrap();
    let commands = "FOCUS DV01 ALMA_RB_03 271.5\nFOCUS DV01 ALMA_RB_03 280\nSIZE CalFocus\n";
    let output = run_cli(dir.path(), &[], commands);

    assert!(output.contains("ERR duplicate key"), "{output}");
    assert!(output.contains("CalFocus 1"));
}

#[test]
fn test_bad_arguments_report_usage() {
    let dir = tempdir().unwrap();
    let commands = "FLAG 10\nFLAG x 10 wind\nFLAG 10 0 wind\nFOCUS DV01 BAND_99 1\nDUMP\nDUMP Beam\nFORMAT FlagCmd json\nHELLO\n";
    let output = run_cli(dir.path(), &[], commands);

    assert!(output.contains("ERR usage: FLAG start duration reason"));
    assert!(output.contains("ERR invalid start 'x'"));
    assert!(output.contains("ERR duration must be positive"));
    assert!(output.contains("ERR unknown ReceiverBand 'BAND_99'"));
    assert!(output.contains("ERR usage: DUMP table"));
    assert!(output.contains("ERR no table named Beam"));
    assert!(output.contains("ERR usage: FORMAT table xml|bin"));
    assert!(output.contains("unknown command: HELLO"));
}

#[test]
fn test_save_and_reopen_lazily() {
    let dir = tempdir().unwrap();
    let commands = "FLAG 0 100 wind\nFLAG 200 50 rain\nFOCUS DA41 ALMA_RB_06 268.25\nSAVE\n";
    let output = run_cli(dir.path(), &[], commands);
    assert!(output.contains("OK"));

    let manifest = fs::read_to_string(dir.path().join("MANIFEST")).unwrap();
    assert!(manifest.contains("table:FlagCmd:2"));
    assert!(manifest.contains("table:CalFocus:1"));

    let output = run_cli(dir.path(), &[], "SIZE\nSTATS\n");
    assert!(output.contains("FlagCmd 2"));
    assert!(output.contains("CalFocus 1"));
    assert!(output.contains("OnDisk"));

    let output = run_cli(dir.path(), &[], "DUMP CalFocus\n");
    assert!(output.contains("<antennaName>DA41</antennaName>"));
    assert!(output.contains("<ambientTemperature>268.25</ambientTemperature>"));
}

#[test]
fn test_eager_open_loads_everything() {
    let dir = tempdir().unwrap();
    run_cli(dir.path(), &[], "FLAG 0 100 wind\nSAVE\n");

    let output = run_cli(dir.path(), &[("ROWSTORE_LAZY", "false")], "STATS\n");
    assert!(output.contains("lazy=false"));
    assert!(!output.contains("OnDisk"));
}

#[test]
fn test_binary_tables() {
    let dir = tempdir().unwrap();
    let env = [("ROWSTORE_BINARY", "true"), ("ROWSTORE_BYTE_ORDER", "Big_Endian")];
    run_cli(dir.path(), &env, "FLAG 0 100 wind\nFLAG 50 100 gust\nSAVE\n");

    assert!(dir.path().join("FlagCmd.bin").exists());
    let header = fs::read_to_string(dir.path().join("FlagCmd.xml")).unwrap();
    assert!(header.contains("byteOrder='Big_Endian'"));

    let output = run_cli(dir.path(), &[], "DUMP FlagCmd\n");
    assert!(output.contains("<timeInterval>0 50</timeInterval>"));
    assert!(output.contains("<reason>gust</reason>"));
}

#[test]
fn test_format_switch() {
    let dir = tempdir().unwrap();
    run_cli(dir.path(), &[], "FLAG 0 10 wind\nFORMAT flagcmd bin\nSAVE\n");
    assert!(dir.path().join("FlagCmd.bin").exists());

    run_cli(dir.path(), &[], "FORMAT FlagCmd xml\nSAVE\n");
    let xml = fs::read_to_string(dir.path().join("FlagCmd.xml")).unwrap();
    assert!(xml.contains("<row>"));
    assert!(!xml.contains("<BulkStoreRef"));
}

#[test]
fn test_corrupt_table_reports_error() {
    let dir = tempdir().unwrap();
    run_cli(dir.path(), &[], "FLAG 0 10 wind\nSAVE\n");
    fs::write(dir.path().join("FlagCmd.xml"), "<FlagCmdTable>").unwrap();

    let output = run_cli(dir.path(), &[], "DUMP FlagCmd\nSIZE FlagCmd\n");
    assert!(output.contains("ERR "));
    assert!(output.contains("FlagCmd 1"));
}

#[test]
fn test_invalid_byte_order_refuses_to_start() {
    let dir = tempdir().unwrap();
    let output = run_cli(dir.path(), &[("ROWSTORE_BYTE_ORDER", "Middle_Endian")], "SIZE\n");
    assert!(!output.contains("Rowstore started"));
}

#[test]
fn test_logs_go_to_stderr() {
    let dir = tempdir().unwrap();
    let (stdout, stderr) = run_cli_streams(dir.path(), &[("RUST_LOG", "debug")], "SIZE\n");

    assert!(stderr.contains("shell started"), "{stderr}");
    assert!(stderr.contains("running"), "{stderr}");
    assert!(!stdout.contains("shell started"));
}

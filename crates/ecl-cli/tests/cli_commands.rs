use chrono::NaiveDate;
use ecl_core::summary::{GridDims, SummarySpec};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

fn run_cli(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_ecl-rs"))
        .args(args)
        .output()
        .expect("ecl-rs should run")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn path_arg(path: &Path) -> &str {
    path.to_str().expect("temp paths are valid UTF-8")
}

fn write_header(dir: &Path, name: &str, wells: &[&str]) -> PathBuf {
    let start = NaiveDate::from_ymd_opt(2015, 1, 1)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .expect("valid start date");
    let mut spec = SummarySpec::writer(start, true, GridDims::new(10, 10, 5));
    spec.add_node("FOPR", None, None, "SM3/DAY", 0.0)
        .expect("field rate");
    for well in wells {
        spec.add_node("WOPR", Some(well), None, "SM3/DAY", 0.0)
            .expect("well rate");
    }
    spec.add_node("BPR", None, GridDims::new(10, 10, 5).cell_number(3, 4, 5), "BARSA", 0.0)
        .expect("block pressure");

    let path = dir.join(name);
    spec.write(&path, false).expect("header should be written");
    path
}

#[test]
fn classify_prints_one_line_per_mnemonic() {
    let output = run_cli(&["classify", "WOPR", "RNLF", "NEWTON", "LWBHP"]);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(
        stdout(&output),
        "WOPR WELL\nRNLF REGION_TO_REGION\nNEWTON MISC\nLWBHP LOCAL_WELL\n"
    );
}

#[test]
fn keys_lists_matching_keys_without_time() {
    let temp = TempDir::new().expect("tempdir should be created");
    let header = write_header(temp.path(), "CASE.SMSPEC", &["P10", "P2"]);

    let all = run_cli(&["keys", path_arg(&header)]);
    assert!(all.status.success(), "stderr: {}", stderr(&all));
    let keys: Vec<String> = stdout(&all).lines().map(str::to_string).collect();
    assert!(!keys.iter().any(|key| key == "TIME"));
    assert!(keys.iter().any(|key| key == "BPR:3,4,5"));

    let wells = run_cli(&[
        "keys",
        path_arg(&header),
        "--pattern",
        "WOPR:*",
        "--exclude",
        "WOPR:P10",
    ]);
    assert!(wells.status.success(), "stderr: {}", stderr(&wells));
    assert_eq!(stdout(&wells), "WOPR:P2\n");
}

#[test]
fn lookup_prints_the_column_as_json() {
    let temp = TempDir::new().expect("tempdir should be created");
    let header = write_header(temp.path(), "CASE.SMSPEC", &["P1"]);

    let output = run_cli(&["lookup", path_arg(&header), "WOPR:P1"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let node: Value = serde_json::from_str(&stdout(&output)).expect("lookup output is JSON");
    assert_eq!(node["keyword"], Value::from("WOPR"));
    assert_eq!(node["params_index"], Value::from(2));

    let missing = run_cli(&["lookup", path_arg(&header), "WOPR:P9"]);
    assert_eq!(missing.status.code(), Some(3));
    let diagnostics = stderr(&missing);
    assert!(diagnostics.contains("ERROR: [SMSPEC.UNKNOWN_KEY]"));
    assert!(diagnostics.contains("FATAL EXIT CODE: 3"));
}

#[test]
fn map_prints_columns_of_the_other_header() {
    let temp = TempDir::new().expect("tempdir should be created");
    let first = write_header(temp.path(), "A.SMSPEC", &["P1", "P2"]);
    let second = write_header(temp.path(), "B.SMSPEC", &["P2"]);

    let output = run_cli(&["map", path_arg(&first), path_arg(&second)]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let mapping: Vec<i64> = serde_json::from_str(&stdout(&output)).expect("mapping is JSON");
    assert_eq!(mapping, vec![0, 1, -1, 2, 3]);
}

#[test]
fn schedule_reports_steps_wells_and_events() {
    let temp = TempDir::new().expect("tempdir should be created");
    let deck = temp.path().join("CASE.DATA");
    fs::write(
        &deck,
        "RUNSPEC
START
 1 JAN 2000 /
SCHEDULE
WELSPECS
 'OP1' 'G1' 3 4 1* 'OIL' /
/
DATES
 1 FEB 2000 /
/
WCONPROD
 'OP1' 'OPEN' 'ORAT' 1000 /
/
TSTEP
 10 /
",
    )
    .expect("deck should be written");

    let output = run_cli(&["schedule", path_arg(&deck)]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let report: Value = serde_json::from_str(&stdout(&output)).expect("report is JSON");

    assert_eq!(report["num_timesteps"], Value::from(2));
    assert_eq!(report["wells"][0]["name"], Value::from("OP1"));
    assert_eq!(report["wells"][0]["status"], serde_json::json!(["SHUT", "OPEN", "OPEN"]));
    let step_one = report["steps"][1]["events"]
        .as_array()
        .expect("events are a list");
    assert!(step_one.contains(&Value::from("WELL_STATUS_CHANGE")));
    assert!(step_one.contains(&Value::from("PRODUCTION_UPDATE")));
}

#[test]
fn strict_schedule_fails_on_geo_modifiers() {
    let temp = TempDir::new().expect("tempdir should be created");
    let deck = temp.path().join("CASE.DATA");
    fs::write(&deck, "SCHEDULE\nMULTX\n 1.0 /\n").expect("deck should be written");

    let lenient = run_cli(&["schedule", path_arg(&deck)]);
    assert!(lenient.status.success(), "stderr: {}", stderr(&lenient));
    let report: Value = serde_json::from_str(&stdout(&lenient)).expect("report is JSON");
    assert_eq!(
        report["messages"][0]["placeholder"],
        Value::from("SCHEDULE.UNSUPPORTED_GEO_MODIFIER")
    );

    let strict = run_cli(&["schedule", path_arg(&deck), "--strict"]);
    assert_eq!(strict.status.code(), Some(4));
    assert!(stderr(&strict).contains("ERROR: [SCHEDULE.UNSUPPORTED_GEO_MODIFIER]"));
}

#[test]
fn usage_errors_exit_with_input_code() {
    let output = run_cli(&["classify"]);
    assert_eq!(output.status.code(), Some(3));
    assert!(stderr(&output).contains("[INPUT.CLI_USAGE]"));

    let help = run_cli(&["--help"]);
    assert!(help.status.success());
    assert!(stdout(&help).contains("schedule"));
}

#[test]
fn missing_header_is_an_io_error() {
    let temp = TempDir::new().expect("tempdir should be created");
    let output = run_cli(&["keys", path_arg(&temp.path().join("NOPE.SMSPEC"))]);
    assert_eq!(output.status.code(), Some(5));
    assert!(stderr(&output).contains("FATAL EXIT CODE: 5"));
}

use schedlog::errors::SchedlogError;
use schedlog::run_with_runtime;
use schedlog::runtime::{FakeClock, FakeFileSystem, FakeTerminal, FileSystem, ProductionRuntime};
use std::ffi::OsString;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

const BATCH: &str = r#"{"message":"child two","labels":{"scheduling_context":{"timestamp":"0.020 sec","thread":"MainThread","task":"Task-1","source":"main:4"},"timestamp":"0.300 sec","thread":"MainThread","task":"Task-3","source":"worker:9"}}
{"message":"child one","labels":{"scheduling_context":{"timestamp":"0.010 sec","thread":"MainThread","task":"Task-1","source":"main:4"},"timestamp":"0.500 sec","thread":"MainThread","task":"Task-2","source":"worker:9"}}
"#;

fn expected_lines() -> Vec<String> {
    vec![
        "[0.010 sec Task-1 - MainThread@main:4]".to_string(),
        "\t[0.500 sec Task-2 - MainThread@worker:9]\tchild one".to_string(),
        "[0.020 sec Task-1 - MainThread@main:4]".to_string(),
        "\t[0.300 sec Task-3 - MainThread@worker:9]\tchild two".to_string(),
    ]
}

fn args(list: &[&str]) -> Vec<OsString> {
    std::iter::once("schedlog")
        .chain(list.iter().copied())
        .map(OsString::from)
        .collect()
}

fn runtime(fs: &FakeFileSystem, terminal: &FakeTerminal) -> ProductionRuntime {
    ProductionRuntime {
        clock: Arc::new(FakeClock::ticking(Duration::from_millis(3))),
        file_system: Arc::new(fs.clone()),
        terminal: Arc::new(terminal.clone()),
    }
}

#[test]
fn batch_file_is_sorted_onto_the_terminal() {
    let fs = FakeFileSystem::with_file("/runs/batch.jsonl", BATCH);
    let terminal = FakeTerminal::new();

    let code = run_with_runtime(&args(&["/runs/batch.jsonl"]), &runtime(&fs, &terminal))
        .expect("sort batch");

    assert_eq!(code, 0);
    assert_eq!(terminal.written_lines(), expected_lines());
}

#[test]
fn output_flag_writes_a_file_instead_of_the_terminal() {
    let fs = FakeFileSystem::with_file("/runs/batch.jsonl", BATCH);
    let terminal = FakeTerminal::new();

    run_with_runtime(
        &args(&["--output", "/sorted/run.log", "/runs/batch.jsonl"]),
        &runtime(&fs, &terminal),
    )
    .expect("sort batch");

    assert!(terminal.written_lines().is_empty());
    assert_eq!(
        fs.contents(Path::new("/sorted/run.log")),
        Some(format!("{}\n", expected_lines().join("\n")))
    );
    assert_eq!(fs.created_dirs(), vec![Path::new("/sorted").to_path_buf()]);
}

#[test]
fn config_file_supplies_the_output_path() {
    let fs = FakeFileSystem::with_file("/runs/batch.jsonl", BATCH);
    fs.write_string(Path::new("/etc/schedlog.toml"), "[output]\npath = \"out.log\"\n")
        .expect("seed config");
    let terminal = FakeTerminal::new();

    run_with_runtime(
        &args(&["--config", "/etc/schedlog.toml", "/runs/batch.jsonl"]),
        &runtime(&fs, &terminal),
    )
    .expect("sort batch");

    assert!(fs.contents(Path::new("out.log")).is_some());
    assert!(fs.created_dirs().is_empty());
}

#[test]
fn missing_input_is_a_cli_error() {
    let fs = FakeFileSystem::default();
    let terminal = FakeTerminal::new();

    let err = run_with_runtime(&args(&[]), &runtime(&fs, &terminal)).expect_err("no input");
    assert!(matches!(err, SchedlogError::Cli(ref msg) if msg.contains("INPUT")));
}

#[test]
fn unknown_flag_is_a_cli_error() {
    let fs = FakeFileSystem::default();
    let terminal = FakeTerminal::new();

    let err = run_with_runtime(&args(&["--verbose"]), &runtime(&fs, &terminal))
        .expect_err("unknown flag");
    assert!(matches!(err, SchedlogError::Cli(_)));
}

#[test]
fn activation_level_above_all_bits_is_rejected() {
    let fs = FakeFileSystem::with_file("/runs/batch.jsonl", BATCH);
    let terminal = FakeTerminal::new();

    let err = run_with_runtime(
        &args(&["--activation-level", "9", "/runs/batch.jsonl"]),
        &runtime(&fs, &terminal),
    )
    .expect_err("level 9");
    assert!(matches!(err, SchedlogError::InvalidConfig(_)));
    assert!(terminal.written_lines().is_empty());
}

#[test]
fn unreadable_batch_surfaces_io_error() {
    let fs = FakeFileSystem::default();
    let terminal = FakeTerminal::new();

    let err = run_with_runtime(&args(&["/runs/absent.jsonl"]), &runtime(&fs, &terminal))
        .expect_err("absent batch");
    assert!(matches!(err, SchedlogError::Io(_)));
}

#[test]
fn demo_log_file_resorts_to_the_flushed_output() {
    let fs = FakeFileSystem::default();
    let terminal = FakeTerminal::new();
    let rt = runtime(&fs, &terminal);

    run_with_runtime(&args(&["--demo", "--log-file", "/logs/demo.jsonl"]), &rt)
        .expect("demo");

    let flushed = terminal.written_lines();
    assert_eq!(flushed.first().map(String::as_str), Some(""));
    assert!(fs.created_dirs().contains(&Path::new("/logs").to_path_buf()));

    let resorted =
        schedlog::sort_batch_file(&rt, Path::new("/logs/demo.jsonl")).expect("resort log file");
    assert_eq!(resorted, flushed[1..].to_vec());
}

#[test]
fn unknown_level_name_lists_the_known_ones() {
    let fs = FakeFileSystem::with_file("/runs/batch.jsonl", BATCH);
    let terminal = FakeTerminal::new();

    let err = run_with_runtime(
        &args(&["--level", "trace", "/runs/batch.jsonl"]),
        &runtime(&fs, &terminal),
    )
    .expect_err("unknown level");
    assert!(matches!(err, SchedlogError::Cli(ref msg) if msg.contains("info, detailed, debug")));
}

#[test]
fn level_and_activation_level_are_exclusive() {
    let fs = FakeFileSystem::with_file("/runs/batch.jsonl", BATCH);
    let terminal = FakeTerminal::new();

    let err = run_with_runtime(
        &args(&["--level", "debug", "--activation-level", "1", "/runs/batch.jsonl"]),
        &runtime(&fs, &terminal),
    )
    .expect_err("conflicting flags");
    assert!(matches!(err, SchedlogError::Cli(_)));
}

#[test]
fn named_level_runs_the_demo() {
    let fs = FakeFileSystem::default();
    let terminal = FakeTerminal::new();

    run_with_runtime(&args(&["--demo", "--level", "debug"]), &runtime(&fs, &terminal))
        .expect("demo");
    assert!(terminal
        .written_lines()
        .iter()
        .any(|line| line.contains("supervisor collected")));
}

#[test]
fn missing_config_file_is_reported_by_path() {
    let fs = FakeFileSystem::with_file("/runs/batch.jsonl", BATCH);
    let terminal = FakeTerminal::new();

    let err = run_with_runtime(
        &args(&["--config", "/etc/absent.toml", "/runs/batch.jsonl"]),
        &runtime(&fs, &terminal),
    )
    .expect_err("missing config");
    assert!(matches!(err, SchedlogError::InvalidConfig(ref msg) if msg.contains("/etc/absent.toml")));
    assert!(terminal.written_lines().is_empty());
}

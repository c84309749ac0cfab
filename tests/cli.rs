mod common;
use assert_cmd::Command;
use common::*;

fn driftcheck(project: &Project) -> Command {
    let mut cmd = Command::cargo_bin("driftcheck").unwrap();
    cmd.current_dir(project.root.path())
        .env_remove("DRIFTCHECK_MIGRATIONS")
        .env_remove("DRIFTCHECK_TYPES")
        .env_remove("DRIFTCHECK_MODULES");
    cmd
}

fn stdout_of(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn clean_project_exits_zero() {
    let project = clean_project();
    let output = driftcheck(&project).output().unwrap();

    assert_eq!(output.status.code(), Some(0));
    let stdout = stdout_of(&output);
    assert!(stdout.contains("Sync score: 100.0%"));
    assert!(stdout.contains("Cleanliness score: 100.0%"));
    assert!(stdout.ends_with("Result: PASS\n"));
}

#[test]
fn drift_exits_one() {
    let project = clean_project().module(
        "stats",
        "supabase.from('bilans').select('*').eq('nonexistent_col', 1)",
    );
    let output = driftcheck(&project).arg("usage").output().unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert!(stdout_of(&output).contains("      - nonexistent_col\n"));
}

#[test]
fn missing_input_exits_two_without_report() {
    let project = clean_project();
    let output = driftcheck(&project)
        .args(["--types", "nowhere.ts"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(2));
    assert!(output.stdout.is_empty());
    assert!(String::from_utf8_lossy(&output.stderr).contains("type file not found"));
}

#[test]
fn relations_never_fail() {
    let project = clean_project().module(
        "consultants",
        "supabase.from('bilans').eq('consultant_id', consultantId)",
    );
    let output = driftcheck(&project).arg("relations").output().unwrap();

    assert_eq!(output.status.code(), Some(0));
    let stdout = stdout_of(&output);
    assert!(stdout.contains("beneficiaire_id → profiles.id"));
    assert!(stdout.contains("bilans.consultant_id"));
}

#[test]
fn paths_can_come_from_environment() {
    let project = clean_project();
    let output = driftcheck(&project)
        .current_dir(std::env::temp_dir())
        .env("DRIFTCHECK_MIGRATIONS", project.migrations_dir())
        .env("DRIFTCHECK_TYPES", project.types_file())
        .arg("sync")
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(0));
}

#[test]
fn json_output_parses() {
    let project = clean_project();
    let output = driftcheck(&project)
        .args(["--format", "json"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(0));
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["passed"], true);
    assert_eq!(value["check"], "all");
    assert!(value["tables"]["profiles"].is_object());
}

#[test]
fn identical_runs_render_identically() {
    let project = clean_project().types("profiles: { Row: { id: string; avatar: string } }\n");
    let first = driftcheck(&project).output().unwrap();
    let second = driftcheck(&project).output().unwrap();

    assert_eq!(first.status.code(), Some(1));
    assert_eq!(first.stdout, second.stdout);
}

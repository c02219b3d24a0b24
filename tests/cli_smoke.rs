mod support;

use assert_cmd::Command;
use predicates::str::contains;
use support::{at, parent, project, snapshot, task, task_record, SnapshotDir, PROJECT};

fn festival() -> Result<SnapshotDir, Box<dyn std::error::Error>> {
    let mut concert = parent("Spring concert", &[11]);
    concert.due_date = Some(at(2024, 3, 10));
    let mut posters = task("Print posters");
    posters.due_date_relative = Some(2);

    SnapshotDir::new(&snapshot(
        vec![project(PROJECT, "Choir")],
        vec![
            task_record(10, PROJECT, concert),
            task_record(11, PROJECT, posters),
            task_record(12, PROJECT, task("Buy milk")),
        ],
    ))
}

fn taskdeck(dir: &SnapshotDir) -> Command {
    let mut cmd = Command::cargo_bin("taskdeck").expect("binary");
    cmd.current_dir(dir.path())
        .env_remove("TASKDECK_DATA")
        .env_remove("TASKDECK_ACTOR")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn taskdeck_help_works() {
    Command::cargo_bin("taskdeck")
        .expect("binary")
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("Task graph, search and relocation engine"));
}

#[test]
fn subcommand_help_works() {
    let subcommands = ["projects", "tree", "search", "visible", "due", "recurring", "validate", "moves"];

    for cmd in subcommands {
        Command::cargo_bin("taskdeck")
            .expect("binary")
            .args([cmd, "--help"])
            .assert()
            .success();
    }
}

#[test]
fn tree_renders_hierarchy() -> Result<(), Box<dyn std::error::Error>> {
    let dir = festival()?;
    taskdeck(&dir)
        .arg("tree")
        .assert()
        .success()
        .stdout(contains("Spring concert #10"))
        .stdout(contains("  [ ] Print posters #11 (due 2024-03-08)"));
    Ok(())
}

#[test]
fn search_emits_json_envelope() -> Result<(), Box<dyn std::error::Error>> {
    let dir = festival()?;
    taskdeck(&dir)
        .args(["search", "milk", "--json"])
        .assert()
        .success()
        .stdout(contains("\"schema_version\": \"taskdeck.v1\""))
        .stdout(contains("\"command\": \"search\""))
        .stdout(contains("\"name\": \"Buy milk\""));
    Ok(())
}

#[test]
fn due_reports_computed_date() -> Result<(), Box<dyn std::error::Error>> {
    let dir = festival()?;
    taskdeck(&dir)
        .args(["due", "11", "--now", "2024-03-09", "--json"])
        .assert()
        .success()
        .stdout(contains("2024-03-08T00:00:00"))
        .stdout(contains("\"due_color\": \"red\""))
        .stdout(contains("\"super_parent\": 10"));
    Ok(())
}

#[test]
fn missing_task_is_a_user_error() -> Result<(), Box<dyn std::error::Error>> {
    let dir = festival()?;
    taskdeck(&dir)
        .args(["due", "404", "--json"])
        .assert()
        .code(2)
        .stdout(contains("\"kind\": \"user_error\""));
    Ok(())
}

#[test]
fn unknown_project_is_a_user_error() -> Result<(), Box<dyn std::error::Error>> {
    let dir = festival()?;
    taskdeck(&dir)
        .args(["--project", "99", "tree"])
        .assert()
        .code(2)
        .stderr(contains("Project not found: 99"));
    Ok(())
}

#[test]
fn validate_fails_on_ambiguous_parent() -> Result<(), Box<dyn std::error::Error>> {
    let dir = SnapshotDir::new(&snapshot(
        vec![project(PROJECT, "Choir")],
        vec![
            task_record(1, PROJECT, parent("A", &[3])),
            task_record(2, PROJECT, parent("B", &[3])),
            task_record(3, PROJECT, task("Shared")),
        ],
    ))?;
    taskdeck(&dir)
        .args(["validate", "--json"])
        .assert()
        .code(3)
        .stdout(contains("\"kind\": \"integrity\""));
    Ok(())
}

#[test]
fn validate_passes_clean_snapshot() -> Result<(), Box<dyn std::error::Error>> {
    let dir = festival()?;
    taskdeck(&dir)
        .arg("validate")
        .assert()
        .success()
        .stdout(contains("status: ok"));
    Ok(())
}

#[test]
fn moves_list_starts_empty() -> Result<(), Box<dyn std::error::Error>> {
    let dir = festival()?;
    taskdeck(&dir)
        .args(["moves", "list"])
        .assert()
        .success()
        .stdout(contains("0 pending move(s)"));
    Ok(())
}

#[test]
fn missing_snapshot_is_reported() -> Result<(), Box<dyn std::error::Error>> {
    let dir = festival()?;
    taskdeck(&dir)
        .args(["--data", "nope.json", "tree"])
        .assert()
        .code(2)
        .stderr(contains("snapshot not found"));
    Ok(())
}

#[test]
fn config_file_is_picked_up_from_cwd() -> Result<(), Box<dyn std::error::Error>> {
    let dir = festival()?;
    dir.write_file("taskdeck.toml", "[search]\nthreshold = 2.0\n")?;
    // Invalid config in cwd falls back to defaults.
    taskdeck(&dir).args(["search", "milk"]).assert().success();

    dir.write_file("custom.toml", "[search]\nthreshold = 2.0\n")?;
    taskdeck(&dir)
        .args(["--config", "custom.toml", "search", "milk"])
        .assert()
        .code(2)
        .stderr(contains("Invalid configuration"));
    Ok(())
}

#[test]
fn projects_lists_task_counts() -> Result<(), Box<dyn std::error::Error>> {
    let dir = festival()?;
    taskdeck(&dir)
        .arg("projects")
        .assert()
        .success()
        .stdout(contains("1 project(s)"))
        .stdout(contains("1 Choir (project_1, 3 task(s))"));
    Ok(())
}

#[test]
fn visible_assumes_default_list() -> Result<(), Box<dyn std::error::Error>> {
    let dir = festival()?;
    taskdeck(&dir)
        .arg("visible")
        .assert()
        .success()
        .stdout(contains("2 of 3 task(s) visible in project 1"))
        .stdout(contains("Unsortiert (2)"))
        .stdout(contains("warning: project has no default list"));

    taskdeck(&dir)
        .args(["visible", "--sub-tasks", "--json"])
        .assert()
        .success()
        .stdout(contains("\"shown\": 2"));
    Ok(())
}

#[test]
fn recurring_reports_next_instance() -> Result<(), Box<dyn std::error::Error>> {
    let mut practice = task("Choir practice");
    practice.recurrence_pattern = Some(taskdeck::model::RecurrencePattern::Weekly);
    practice.due_date = Some(at(2024, 1, 1));
    let dir = SnapshotDir::new(&snapshot(
        vec![project(PROJECT, "Choir")],
        vec![task_record(1, PROJECT, practice)],
    ))?;

    taskdeck(&dir)
        .args(["recurring", "--now", "2024-01-09"])
        .assert()
        .success()
        .stdout(contains("1 recurring task(s) due"))
        .stdout(contains("Choir practice #1 (weekly) next due 2024-01-08"));
    Ok(())
}

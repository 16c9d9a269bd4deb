mod support;

use predicates::str::contains;
use support::TestHome;

#[test]
fn keeper_help_works() {
    let home = TestHome::new();
    home.keeper()
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("habit and task tracker"))
        .stdout(contains("tasks"))
        .stdout(contains("calendar"));
}

#[test]
fn subcommand_help_works() {
    let home = TestHome::new();
    let subcommands = [
        "tui", "plugins", "whoami", "migrate", "config", "tasks", "calendar",
    ];

    for cmd in subcommands {
        home.keeper().arg(cmd).arg("--help").assert().success();
    }
}

#[test]
fn first_run_creates_data_files() {
    let home = TestHome::new();
    home.keeper().arg("whoami").assert().success();
    assert!(home.path().join("keeper.db").exists());
    assert!(home.path().join("identity.json").exists());
}

#[test]
fn whoami_is_stable_across_runs() {
    let home = TestHome::new();
    let first = home.json(&["whoami"]);
    let second = home.json(&["whoami"]);
    assert_eq!(first["data"]["user_id"], second["data"]["user_id"]);
    assert_eq!(first["data"]["logged_in"], true);
    assert_eq!(first["schema_version"], "keeper.v1");
    assert_eq!(first["command"], "whoami");
}

#[test]
fn plugins_lists_builtin_providers() {
    let home = TestHome::new();
    let value = home.json(&["plugins"]);
    let ids: Vec<_> = value["data"]["plugins"]
        .as_array()
        .unwrap()
        .iter()
        .map(|entry| entry["id"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(ids, vec!["tasks", "calendar"]);
    assert_eq!(value["data"]["plugins"][1]["capabilities"][2], "migrations");
}

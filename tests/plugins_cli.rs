mod support;

use predicates::str::contains;
use support::TestHome;

#[test]
fn no_enabled_plugins_is_fatal() {
    let home = TestHome::new();
    home.write_config("[plugins]\ndisabled = [\"tasks\", \"calendar\"]\n")
        .unwrap();

    home.keeper()
        .arg("plugins")
        .assert()
        .code(1)
        .stderr(contains("No plugins found! Please add at least one plugin to begin"));
}

#[test]
fn disabled_plugin_loses_its_subcommand() {
    let home = TestHome::new();
    home.write_config("[plugins]\ndisabled = [\"calendar\"]\n")
        .unwrap();

    home.keeper().args(["tasks", "list"]).assert().success();
    home.keeper()
        .args(["calendar", "agenda"])
        .assert()
        .code(2);

    let value = home.json(&["plugins"]);
    assert_eq!(value["data"]["plugins"][1]["disabled"], true);
    assert_eq!(value["data"]["plugins"][1]["commands_loaded"], false);
}

#[test]
fn migrate_rejects_unknown_action() {
    let home = TestHome::new();
    home.keeper()
        .args(["migrate", "calendar", "upgrade"])
        .assert()
        .code(2)
        .stderr(contains("action must be 'create' or 'drop'"));
}

#[test]
fn migrate_rejects_unknown_plugin_and_plugins_without_tables() {
    let home = TestHome::new();
    home.keeper()
        .args(["migrate", "nope", "create"])
        .assert()
        .code(2)
        .stderr(contains("Unknown plugin: nope"));
    home.keeper()
        .args(["migrate", "tasks", "create"])
        .assert()
        .code(2)
        .stderr(contains("No migrations found for plugin 'tasks'"));
}

#[test]
fn calendar_notes_need_their_table() {
    let home = TestHome::new();
    home.keeper()
        .args(["calendar", "note", "2024-03-11", "dentist"])
        .assert()
        .code(3)
        .stderr(contains("keeper migrate calendar create"));

    let value = home.json(&["migrate", "calendar", "create"]);
    assert_eq!(value["data"]["action"], "create");

    home.keeper()
        .args(["calendar", "note", "2024-03-11", "dentist"])
        .assert()
        .success();
    let agenda = home.json(&["calendar", "agenda", "--date", "2024-03-11"]);
    assert_eq!(agenda["data"]["days"][0]["note"], "dentist");

    home.json(&["migrate", "calendar", "drop"]);
    let agenda = home.json(&["calendar", "agenda", "--date", "2024-03-11"]);
    assert!(agenda["data"]["days"][0]["note"].is_null());
}

#[test]
fn config_init_then_show() {
    let home = TestHome::new();
    home.keeper().args(["config", "init"]).assert().success();
    assert!(home.config_path().exists());
    home.keeper()
        .args(["config", "init"])
        .assert()
        .code(2)
        .stderr(contains("--force"));

    let value = home.json(&["config", "show"]);
    assert_eq!(value["data"]["exists"], true);
    assert_eq!(value["data"]["config"]["ui"]["sidebar_width"], 24);
    assert_eq!(value["data"]["config"]["tasks"]["toggle_on"], "completed");
}

#[test]
fn invalid_config_falls_back_with_warning() {
    let home = TestHome::new();
    home.write_config("[ui]\nsidebar_width = 3\n").unwrap();
    home.keeper()
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(contains("sidebar_width = 24"))
        .stdout(contains("file ignored"));
}

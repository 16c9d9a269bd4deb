mod support;

use predicates::str::contains;
use support::TestHome;

#[test]
fn scheduled_tasks_show_in_day_and_week_agendas() {
    let home = TestHome::new();
    let added = home.json(&[
        "calendar", "add", "Dentist", "--date", "2024-03-13", "--from", "9:30", "--to", "10:15",
    ]);
    assert_eq!(added["data"]["from_time"], "09:30");
    home.json(&["calendar", "add", "Groceries", "--date", "2024-03-15", "--points", "2"]);

    let day = home.json(&["calendar", "agenda", "--date", "2024-03-13"]);
    assert_eq!(day["data"]["mode"], "day");
    assert_eq!(day["data"]["days"].as_array().unwrap().len(), 1);
    assert_eq!(day["data"]["days"][0]["tasks"][0]["name"], "Dentist");
    assert_eq!(day["data"]["days"][0]["tasks"][0]["plugin_owner"], "core.calendar");

    let week = home.json(&["calendar", "agenda", "--date", "2024-03-13", "--week"]);
    assert_eq!(week["data"]["start"], "2024-03-10");
    assert_eq!(week["data"]["end"], "2024-03-16");
    assert_eq!(week["data"]["days"].as_array().unwrap().len(), 7);
    assert_eq!(week["data"]["summary"]["total"], 3);
}

#[test]
fn calendar_tasks_are_tasks() {
    let home = TestHome::new();
    let added = home.json(&["calendar", "add", "Call mom", "--date", "2024-03-13"]);
    let id = added["data"]["id"].as_i64().unwrap().to_string();
    home.json(&["tasks", "done", &id]);

    let day = home.json(&["calendar", "agenda", "--date", "2024-03-13"]);
    assert_eq!(day["data"]["days"][0]["tasks"][0]["completed"], true);
}

#[test]
fn bad_dates_and_times_are_user_errors() {
    let home = TestHome::new();
    home.keeper()
        .args(["calendar", "add", "X", "--date", "13/03/2024"])
        .assert()
        .code(2)
        .stderr(contains("expected YYYY-MM-DD"));
    home.keeper()
        .args(["calendar", "add", "X", "--date", "2024-03-13", "--from", "25:00"])
        .assert()
        .code(2)
        .stderr(contains("expected HH:MM"));
}

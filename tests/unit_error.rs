use keeper::error::{exit_codes, Error, JsonError};

#[test]
fn exit_codes_map_correctly() {
    let fatal = Error::NoPlugins { kind: "ui" };
    assert_eq!(fatal.exit_code(), exit_codes::NO_PLUGINS);
    assert_eq!(fatal.exit_code(), 1);

    let user = Error::InvalidArgument("bad".to_string());
    assert_eq!(user.exit_code(), exit_codes::USER_ERROR);

    let missing = Error::TrackableNotFound(3);
    assert_eq!(missing.exit_code(), exit_codes::USER_ERROR);

    let op = Error::ForeignKeyViolation { trackable_id: 9 };
    assert_eq!(op.exit_code(), exit_codes::OPERATION_FAILED);
}

#[test]
fn no_plugins_message_is_user_facing() {
    let err = Error::NoPlugins { kind: "command" };
    assert!(err
        .to_string()
        .starts_with("No plugins found! Please add at least one plugin to begin"));
}

#[test]
fn json_error_includes_code_and_details() {
    let err = Error::TrackableNotFound(12);
    let json = JsonError::from(&err);
    assert_eq!(json.code, exit_codes::USER_ERROR);
    assert!(json.error.contains("Trackable not found"));
    assert_eq!(json.details.unwrap()["trackable_id"], 12);
}

#[test]
fn load_failures_convert_to_plugin_load_errors() {
    let failure = keeper::plugin::PluginLoadFailure {
        plugin: "broken".to_string(),
        reason: "panicked: import failed".to_string(),
    };
    let err = Error::from(failure);
    assert_eq!(
        err.to_string(),
        "Plugin 'broken' failed to load: panicked: import failed"
    );
    assert_eq!(err.exit_code(), exit_codes::OPERATION_FAILED);
    assert_eq!(err.details().unwrap()["plugin"], "broken");
}

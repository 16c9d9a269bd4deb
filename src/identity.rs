//! Local identity management.
//!
//! keeper runs offline for a single user. On first run a user id is generated
//! and stored in `identity.json`; later runs reuse it. The file is a plain JSON
//! object and unknown keys are preserved on rewrite.

use std::path::Path;

use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::{Error, Result};

const USER_ID_KEY: &str = "user_id";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    user_id: Uuid,
}

impl Identity {
    /// Load the identity record, provisioning a user id when none exists yet.
    pub fn ensure(path: &Path) -> Result<Self> {
        let mut record = read_record(path)?;

        if let Some(user_id) = record.get(USER_ID_KEY).and_then(Value::as_str) {
            let user_id = Uuid::parse_str(user_id).map_err(|err| {
                Error::InvalidConfig(format!(
                    "{} has an invalid user_id: {err}",
                    path.display()
                ))
            })?;
            return Ok(Self { user_id });
        }

        let user_id = Uuid::new_v4();
        record.insert(USER_ID_KEY.to_string(), Value::String(user_id.to_string()));
        write_record(path, &record)?;
        tracing::info!(%user_id, "provisioned local identity");
        Ok(Self { user_id })
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    /// Offline mode has no login step.
    pub fn is_logged_in(&self) -> bool {
        true
    }
}

fn read_record(path: &Path) -> Result<Map<String, Value>> {
    if !path.exists() {
        return Ok(Map::new());
    }

    let raw = std::fs::read_to_string(path)?;
    if raw.trim().is_empty() {
        return Ok(Map::new());
    }

    match serde_json::from_str::<Value>(&raw)? {
        Value::Object(map) => Ok(map),
        _ => Err(Error::InvalidConfig(format!(
            "{} must contain a JSON object",
            path.display()
        ))),
    }
}

fn write_record(path: &Path, record: &Map<String, Value>) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let content = serde_json::to_string_pretty(record)?;
    std::fs::write(path, format!("{content}\n"))?;
    Ok(())
}

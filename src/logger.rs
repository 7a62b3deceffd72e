use std::fs::{File, OpenOptions};
use std::io::Write;

use chrono::Utc;
use serde_json::{json, Value};
use tracing::warn;

use crate::diff::status_events;
use crate::protocol::{form_to_json, Form, REDACTED};
use crate::types::Status;

pub enum MessageLogMode {
    Full,
    Diffed,
}

/// NDJSON record of portal traffic. Passwords and session tokens are masked.
pub(crate) struct MessageLogger {
    mode: MessageLogMode,
    file: File,
    previous: Option<Status>,
}

impl MessageLogger {
    pub fn new(mode: MessageLogMode, path: &str) -> std::io::Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        Ok(Self {
            mode,
            file,
            previous: None,
        })
    }

    pub fn log_login(&mut self, form: &Form, status: u16) {
        let entry = json!({
            "ts": Utc::now().to_rfc3339(),
            "dir": "login",
            "status": status,
            "form": form_to_json(form),
        });
        self.write_line(&entry);
    }

    /// In `Diffed` mode every read after the first carries only the typed
    /// changes since the last logged read.
    pub fn log_read(&mut self, status: &Status) {
        let entry = match (&self.mode, self.previous.as_ref()) {
            (MessageLogMode::Full, _) | (MessageLogMode::Diffed, None) => json!({
                "ts": Utc::now().to_rfc3339(),
                "dir": "read",
                "token": REDACTED,
                "status": status,
            }),
            (MessageLogMode::Diffed, Some(prev)) => json!({
                "ts": Utc::now().to_rfc3339(),
                "dir": "read",
                "token": REDACTED,
                "changes": status_events(Some(prev), status),
            }),
        };
        self.write_line(&entry);
        if matches!(self.mode, MessageLogMode::Diffed) {
            self.previous = Some(status.clone());
        }
    }

    pub fn log_write(&mut self, form: &Form, status: u16) {
        let entry = json!({
            "ts": Utc::now().to_rfc3339(),
            "dir": "write",
            "token": REDACTED,
            "status": status,
            "form": form_to_json(form),
        });
        self.write_line(&entry);
    }

    pub fn log_rejected(&mut self, path: &str, status: u16) {
        let entry = json!({
            "ts": Utc::now().to_rfc3339(),
            "dir": "rejected",
            "path": path,
            "status": status,
        });
        self.write_line(&entry);
    }

    fn write_line(&mut self, entry: &Value) {
        if let Ok(line) = serde_json::to_string(entry)
            && let Err(e) = writeln!(self.file, "{line}")
        {
            warn!("failed to write log entry: {e}");
        }
    }
}

use serde::Deserialize;
use serde_json::{json, Value};

use crate::types::{Session, Status};
use crate::{Error, Result};

pub const DEFAULT_BASE_URL: &str = "https://portal.icy.nl";

pub const LOGIN_PATH: &str = "/login";
pub const DATA_PATH: &str = "/data";

pub const SESSION_TOKEN_HEADER: &str = "Session-Token";

pub const REDACTED: &str = "********";

pub type Form = Vec<(&'static str, String)>;

pub fn login_form(username: &str, password: &str) -> Form {
    vec![
        ("username", username.to_string()),
        ("password", password.to_string()),
        ("remember", "1".to_string()),
    ]
}

pub fn write_form(session: &Session, status: &Status) -> Form {
    let mut form = vec![
        ("uid", session.serial.clone()),
        ("temperature1", status.target.to_portal_string()),
    ];
    form.extend(
        status
            .configuration
            .values()
            .iter()
            .map(|c| ("configuration[]", c.to_string())),
    );
    form
}

/// JSON view of a form for the wire log. Repeated keys collect into arrays,
/// the password is masked.
pub fn form_to_json(form: &Form) -> Value {
    let mut map = serde_json::Map::new();
    for (key, value) in form {
        let value = if *key == "password" { REDACTED } else { value.as_str() };
        match map.get_mut(*key) {
            Some(Value::Array(items)) => items.push(json!(value)),
            Some(existing) => {
                let first = existing.take();
                *existing = json!([first, value]);
            }
            None if key.ends_with("[]") => {
                map.insert(key.to_string(), json!([value]));
            }
            None => {
                map.insert(key.to_string(), json!(value));
            }
        }
    }
    Value::Object(map)
}

#[derive(Deserialize)]
struct LoginResponse {
    #[serde(rename = "serialthermostat1", default)]
    serial: Option<String>,
    #[serde(default)]
    token: Option<String>,
}

/// A well-formed body without a token means the portal refused the
/// credentials.
pub fn parse_login_response(body: &str) -> Result<Session> {
    let resp: LoginResponse = serde_json::from_str(body)?;
    match resp.token {
        Some(token) if !token.is_empty() => Ok(Session {
            serial: resp.serial.unwrap_or_default(),
            token,
        }),
        _ => Err(Error::Auth("no session token in response".to_string())),
    }
}

pub fn parse_status_response(body: &str) -> Result<Status> {
    Ok(serde_json::from_str(body)?)
}

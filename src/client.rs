use reqwest::StatusCode;
use reqwest::header::CONTENT_TYPE;
use tracing::{debug, trace};

use crate::diff::status_events;
use crate::logger::{MessageLogMode, MessageLogger};
use crate::protocol::{
    login_form, parse_login_response, parse_status_response, write_form,
    DATA_PATH, DEFAULT_BASE_URL, LOGIN_PATH, SESSION_TOKEN_HEADER,
};
use crate::types::*;
use crate::{Error, Result};

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

type EventCallback = Box<dyn Fn(&Event) + Send + Sync>;
type StatusCallback = Box<dyn Fn(&Status) + Send + Sync>;

pub struct PortalClientBuilder {
    base_url: String,
    event_callbacks: Vec<EventCallback>,
    status_callbacks: Vec<StatusCallback>,
    log_mode: Option<MessageLogMode>,
    log_path: Option<String>,
}

impl PortalClientBuilder {
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            event_callbacks: Vec::new(),
            status_callbacks: Vec::new(),
            log_mode: None,
            log_path: None,
        }
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn on_event(mut self, f: impl Fn(&Event) + Send + Sync + 'static) -> Self {
        self.event_callbacks.push(Box::new(f));
        self
    }

    pub fn on_status(mut self, f: impl Fn(&Status) + Send + Sync + 'static) -> Self {
        self.status_callbacks.push(Box::new(f));
        self
    }

    pub fn message_log(mut self, mode: MessageLogMode, path: impl Into<String>) -> Self {
        self.log_mode = Some(mode);
        self.log_path = Some(path.into());
        self
    }

    pub fn build(self) -> Result<PortalClient> {
        let http = reqwest::Client::builder().build()?;

        let logger = match (self.log_mode, self.log_path) {
            (Some(mode), Some(path)) => Some(MessageLogger::new(mode, &path)?),
            _ => None,
        };

        Ok(PortalClient {
            http,
            base_url: self.base_url.trim_end_matches('/').to_string(),
            session: None,
            status: Status::default(),
            has_status: false,
            event_callbacks: self.event_callbacks,
            status_callbacks: self.status_callbacks,
            logger,
        })
    }
}

impl Default for PortalClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Status starts zeroed; `read` replaces it, the setters change it locally.
pub struct PortalClient {
    http: reqwest::Client,
    base_url: String,
    session: Option<Session>,
    status: Status,
    has_status: bool,
    event_callbacks: Vec<EventCallback>,
    status_callbacks: Vec<StatusCallback>,
    logger: Option<MessageLogger>,
}

impl PortalClient {
    pub fn builder() -> PortalClientBuilder {
        PortalClientBuilder::new()
    }

    pub async fn login(&mut self, username: &str, password: &str) -> Result<&Session> {
        let url = format!("{}{LOGIN_PATH}", self.base_url);
        debug!(url = %url, username, "logging in to portal");

        let form = login_form(username, password);
        let resp = self.http.post(&url).form(&form).send().await?;
        let status = resp.status();
        if let Some(ref mut logger) = self.logger {
            logger.log_login(&form, status.as_u16());
        }
        if !status.is_success() {
            return Err(Error::Auth(format!("status {status}")));
        }

        let body = resp.text().await?;
        let session = parse_login_response(&body)?;
        debug!(serial = %session.serial, "logged in");
        Ok(&*self.session.insert(session))
    }

    /// Fetch the current status. The held status is only replaced when the
    /// whole body decodes.
    pub async fn read(&mut self) -> Result<&Status> {
        let token = self.session.as_ref().ok_or(Error::NotLoggedIn)?.token.clone();
        let url = format!("{}{DATA_PATH}", self.base_url);
        trace!(url = %url, "reading status");

        let resp = self
            .http
            .get(&url)
            .header(SESSION_TOKEN_HEADER, token)
            .send()
            .await?;
        let code = resp.status();
        if !code.is_success() {
            if let Some(ref mut logger) = self.logger {
                logger.log_rejected(DATA_PATH, code.as_u16());
            }
            return Err(Error::RemoteStatus(code));
        }

        let body = resp.text().await?;
        let status = parse_status_response(&body)?;
        if let Some(ref mut logger) = self.logger {
            logger.log_read(&status);
        }
        let events = status_events(self.has_status.then_some(&self.status), &status);
        self.status = status;
        self.has_status = true;

        for event in &events {
            for cb in &self.event_callbacks {
                cb(event);
            }
        }
        for cb in &self.status_callbacks {
            cb(&self.status);
        }

        if !events.is_empty() {
            debug!(count = events.len(), "status changed");
        }
        Ok(&self.status)
    }

    /// Anything but 200 is an error.
    pub async fn write(&mut self) -> Result<()> {
        let session = self.session.as_ref().ok_or(Error::NotLoggedIn)?;
        let form = write_form(session, &self.status);
        let token = session.token.clone();
        let url = format!("{}{DATA_PATH}", self.base_url);
        debug!(
            target_temp = %self.status.target,
            config = ?self.status.configuration.values(),
            "writing status"
        );

        let resp = self
            .http
            .post(&url)
            .header(SESSION_TOKEN_HEADER, token)
            .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
            .form(&form)
            .send()
            .await?;
        let code = resp.status();
        if let Some(ref mut logger) = self.logger {
            logger.log_write(&form, code.as_u16());
        }
        if code != StatusCode::OK {
            return Err(Error::RemoteStatus(code));
        }
        Ok(())
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    pub fn temperature(&self) -> Temperature {
        self.status.current
    }

    pub fn target_temperature(&self) -> Temperature {
        self.status.target
    }

    pub fn set_target_temperature(&mut self, temp: Temperature) {
        self.status.target = temp;
    }

    pub fn mode(&self) -> Result<Mode> {
        self.status.mode()
    }

    pub fn set_mode(&mut self, mode: Mode) -> Result<()> {
        self.status.configuration.set_mode(mode)
    }

    /// Set the mode and pull that mode's fallback setpoint into the target
    /// temperature. `Fixed` keeps the current target.
    pub fn select_mode(&mut self, mode: Mode) -> Result<()> {
        let fallback = self.status.configuration.fallback_setpoint(mode)?;
        self.status.configuration.set_mode(mode)?;
        if let Some(temp) = fallback {
            self.status.target = temp;
        }
        debug!(?mode, target_temp = %self.status.target, "selected mode");
        Ok(())
    }
}

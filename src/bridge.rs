use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::client::PortalClient;
use crate::types::*;
use crate::{Error, Result};

pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(20);

pub const MIN_TARGET_TEMPERATURE: f64 = 0.0;
pub const MAX_TARGET_TEMPERATURE: f64 = 30.0;
pub const TARGET_TEMPERATURE_STEP: f64 = 0.5;

/// Snap a requested setpoint to the accessory's 0.5 degree grid.
pub fn validate_target_temperature(celsius: f64) -> Result<Temperature> {
    let range = MIN_TARGET_TEMPERATURE..=MAX_TARGET_TEMPERATURE;
    if !celsius.is_finite() || !range.contains(&celsius) {
        return Err(Error::InvalidTemperature(celsius));
    }
    let snapped = (celsius / TARGET_TEMPERATURE_STEP).round() * TARGET_TEMPERATURE_STEP;
    Ok(Temperature::from_celsius(snapped))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessoryInfo {
    pub name: String,
    pub manufacturer: String,
}

impl Default for AccessoryInfo {
    fn default() -> Self {
        Self {
            name: "e-thermostaat".to_string(),
            manufacturer: "ICY".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurrentHeatingCoolingState {
    Off = 0,
    Heat = 1,
    Cool = 2,
}

impl CurrentHeatingCoolingState {
    pub fn as_u8(&self) -> u8 {
        *self as u8
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetHeatingCoolingState {
    Off = 0,
    Heat = 1,
    Cool = 2,
    Auto = 3,
}

impl TargetHeatingCoolingState {
    pub fn as_u8(&self) -> u8 {
        *self as u8
    }

    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(TargetHeatingCoolingState::Off),
            1 => Some(TargetHeatingCoolingState::Heat),
            2 => Some(TargetHeatingCoolingState::Cool),
            3 => Some(TargetHeatingCoolingState::Auto),
            _ => None,
        }
    }

    pub fn to_mode(&self) -> Mode {
        match self {
            TargetHeatingCoolingState::Off => Mode::Fixed,
            TargetHeatingCoolingState::Cool => Mode::Saving,
            TargetHeatingCoolingState::Heat | TargetHeatingCoolingState::Auto => Mode::Comfort,
        }
    }

    pub fn from_mode(mode: Mode) -> Self {
        match mode {
            Mode::Comfort => TargetHeatingCoolingState::Auto,
            Mode::Saving | Mode::Away | Mode::Fixed => TargetHeatingCoolingState::Off,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AccessoryState {
    pub current_temperature: Temperature,
    pub target_temperature: Temperature,
    pub current_state: CurrentHeatingCoolingState,
    pub target_state: TargetHeatingCoolingState,
}

impl AccessoryState {
    pub fn from_status(status: &Status) -> Result<Self> {
        let mode = status.mode()?;
        let current_state = if status.current < status.target {
            CurrentHeatingCoolingState::Heat
        } else if mode == Mode::Comfort {
            CurrentHeatingCoolingState::Cool
        } else {
            CurrentHeatingCoolingState::Off
        };
        Ok(Self {
            current_temperature: status.current,
            target_temperature: status.target,
            current_state,
            target_state: TargetHeatingCoolingState::from_mode(mode),
        })
    }
}

/// The smart-home framework's thermostat object.
pub trait Accessory: Send + Sync {
    fn info(&self) -> AccessoryInfo {
        AccessoryInfo::default()
    }

    fn update(&self, state: &AccessoryState);
}

/// Refresh ticks and remote update callbacks share the client through one lock.
#[derive(Clone)]
pub struct Bridge {
    client: Arc<Mutex<PortalClient>>,
    accessory: Arc<dyn Accessory>,
}

impl Bridge {
    pub async fn connect(
        mut client: PortalClient,
        username: &str,
        password: &str,
        accessory: Arc<dyn Accessory>,
    ) -> Result<Self> {
        client.login(username, password).await?;
        let bridge = Self {
            client: Arc::new(Mutex::new(client)),
            accessory,
        };
        bridge.refresh().await?;
        let info = bridge.accessory.info();
        info!(name = %info.name, manufacturer = %info.manufacturer, "bridge connected");
        Ok(bridge)
    }

    pub fn client(&self) -> &Arc<Mutex<PortalClient>> {
        &self.client
    }

    pub async fn refresh(&self) -> Result<()> {
        let state = {
            let mut client = self.client.lock().await;
            let status = client.read().await?;
            AccessoryState::from_status(status)?
        };
        self.accessory.update(&state);
        Ok(())
    }

    pub async fn on_target_temperature_changed(&self, celsius: f64) -> Result<()> {
        let temp = validate_target_temperature(celsius).inspect_err(|e| {
            warn!(error = %e, "ignoring target temperature");
        })?;
        let mut client = self.client.lock().await;
        client.set_target_temperature(temp);
        client.write().await.inspect_err(|e| {
            warn!(error = %e, celsius, "failed to upload target temperature");
        })
    }

    pub async fn on_target_mode_changed(&self, state: TargetHeatingCoolingState) -> Result<()> {
        let mode = state.to_mode();
        let mut client = self.client.lock().await;
        let result = match client.select_mode(mode) {
            Ok(()) => client.write().await,
            Err(e) => Err(e),
        };
        result.inspect_err(|e| {
            warn!(error = %e, ?mode, "failed to upload mode change");
        })
    }

    /// The first tick fires one `period` from now.
    pub fn spawn_refresh(&self, period: Duration) -> Result<RefreshTask> {
        if period.is_zero() {
            return Err(Error::InvalidInterval);
        }
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();
        let bridge = self.clone();

        let handle = tokio::spawn(async move {
            let start = tokio::time::Instant::now() + period;
            let mut ticker = tokio::time::interval_at(start, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    _ = ticker.tick() => {
                        match bridge.refresh().await {
                            Ok(()) => debug!("refresh complete"),
                            Err(e) => warn!(error = %e, "refresh failed, retrying next tick"),
                        }
                    }
                }
            }
            debug!("refresh task stopped");
        });

        Ok(RefreshTask {
            shutdown: Some(shutdown_tx),
            handle,
        })
    }
}

pub struct RefreshTask {
    shutdown: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

impl RefreshTask {
    /// Waits for an in-flight refresh to finish.
    pub async fn stop(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Err(e) = (&mut self.handle).await {
            warn!(error = %e, "refresh task ended abnormally");
        }
    }
}

impl Drop for RefreshTask {
    fn drop(&mut self) {
        if self.shutdown.is_some() {
            self.handle.abort();
        }
    }
}

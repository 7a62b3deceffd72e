mod bridge;
mod client;
mod diff;
mod error;
mod logger;
mod protocol;
mod types;

pub use bridge::{
    validate_target_temperature, Accessory, AccessoryInfo, AccessoryState, Bridge,
    CurrentHeatingCoolingState, RefreshTask, TargetHeatingCoolingState, DEFAULT_REFRESH_INTERVAL,
    MAX_TARGET_TEMPERATURE, MIN_TARGET_TEMPERATURE, TARGET_TEMPERATURE_STEP,
};
pub use client::{PortalClient, PortalClientBuilder};
pub use error::{Error, Result};
pub use logger::MessageLogMode;
pub use protocol::DEFAULT_BASE_URL;
pub use types::*;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

pub const MIN_CONFIGURATION_LEN: usize = 7;

/// Celsius. Fallback setpoints arrive as half-degree units.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Temperature(f64);

impl Temperature {
    pub fn from_celsius(c: f64) -> Self {
        Self(c)
    }

    pub fn from_half_degrees(units: i32) -> Self {
        Self(f64::from(units) / 2.0)
    }

    pub fn celsius(&self) -> f64 {
        self.0
    }

    pub fn to_portal_string(&self) -> String {
        format!("{:.1}", self.0)
    }
}

impl fmt::Display for Temperature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}\u{00b0}C", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Mode {
    Comfort,
    Saving,
    Away,
    /// Uploading this mode has been observed not to take effect on the
    /// portal backend.
    Fixed,
}

// Highest priority first; no match means Away.
const MODE_FLAGS: [(i32, Mode); 3] = [
    (0x80, Mode::Fixed),
    (0x40, Mode::Saving),
    (0x20, Mode::Comfort),
];

impl Mode {
    pub const ALL: [Mode; 4] = [Mode::Comfort, Mode::Saving, Mode::Away, Mode::Fixed];

    pub fn flags(&self) -> i32 {
        match self {
            Mode::Away => 0,
            Mode::Comfort => 32,
            Mode::Saving => 64,
            Mode::Fixed => 160,
        }
    }

    pub fn from_flags(value: i32) -> Self {
        MODE_FLAGS
            .iter()
            .find(|(mask, _)| value & mask == *mask)
            .map(|(_, mode)| *mode)
            .unwrap_or(Mode::Away)
    }

    fn fallback_index(&self) -> Option<usize> {
        match self {
            Mode::Away => Some(4),
            Mode::Saving => Some(5),
            Mode::Comfort => Some(6),
            Mode::Fixed => None,
        }
    }
}

/// New value for configuration[0]. Every bit is overwritten, so flags
/// unrelated to the mode are dropped.
fn encode_mode_flags(_previous: i32, mode: Mode) -> i32 {
    mode.flags()
}

/// Index 0 holds mode flags, indices 4..=6 the Away/Saving/Comfort fallback
/// setpoints.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Configuration(Vec<i32>);

impl Configuration {
    pub fn new(values: Vec<i32>) -> Self {
        Self(values)
    }

    pub fn values(&self) -> &[i32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<i32> {
        self.0.get(index).copied()
    }

    fn ensure_len(&self) -> Result<()> {
        if self.0.len() < MIN_CONFIGURATION_LEN {
            return Err(Error::ConfigurationTooShort { len: self.0.len() });
        }
        Ok(())
    }

    pub fn mode(&self) -> Result<Mode> {
        self.ensure_len()?;
        Ok(Mode::from_flags(self.0[0]))
    }

    pub fn set_mode(&mut self, mode: Mode) -> Result<()> {
        self.ensure_len()?;
        self.0[0] = encode_mode_flags(self.0[0], mode);
        Ok(())
    }

    pub fn fallback_setpoint(&self, mode: Mode) -> Result<Option<Temperature>> {
        self.ensure_len()?;
        Ok(mode
            .fallback_index()
            .map(|idx| Temperature::from_half_degrees(self.0[idx])))
    }
}

impl From<Vec<i32>> for Configuration {
    fn from(values: Vec<i32>) -> Self {
        Self(values)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Session {
    #[serde(rename = "serialthermostat1")]
    pub serial: String,
    pub token: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Status {
    #[serde(rename = "temperature2")]
    pub current: Temperature,
    #[serde(rename = "temperature1")]
    pub target: Temperature,
    pub configuration: Configuration,
}

impl Status {
    pub fn mode(&self) -> Result<Mode> {
        self.configuration.mode()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
    TemperatureChanged { temp: Temperature },
    TargetTemperatureChanged { temp: Temperature },
    ModeChanged { mode: Mode },
    ConfigurationChanged { index: usize, old: Option<i32>, new: i32 },
}

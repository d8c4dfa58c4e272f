//! Configuration system: TOML file + env var overrides + the dispatcher's default timing constants.

#![allow(missing_docs)]

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::errors::{LiftError, Result};

/// Full dispatcher configuration model.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub ports: PortsConfig,
    pub timing: TimingConfig,
    pub fleet: FleetConfig,
}

/// Port layout for the datagram fabric (loopback only).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PortsConfig {
    pub scheduler_ingress: u16,
    pub floor_ingress: u16,
    pub car_ingress_base: u16,
}

impl Default for PortsConfig {
    fn default() -> Self {
        Self {
            scheduler_ingress: 8000,
            floor_ingress: 8001,
            car_ingress_base: 9000,
        }
    }
}

impl PortsConfig {
    /// Port a given car id listens on: `car_ingress_base + car_id`.
    #[must_use]
    pub fn car_port(&self, car_id: u32) -> u16 {
        self.car_ingress_base.wrapping_add(car_id as u16)
    }
}

/// Simulated timing constants, bit-exact with the documented defaults unless overridden.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TimingConfig {
    pub time_btwn_1_floor: u64,
    pub time_btwn_2_floors: u64,
    pub time_btwn_3_floors: u64,
    pub time_btwn_x_floors_per_floor: u64,
    pub time_to_load_unload_1_passenger: u64,
    pub time_to_open_close_door: u64,
    pub recovery_time: u64,
    /// Polling interval used by every actor's non-blocking receive loop to
    /// re-check the shutdown flag.
    pub poll_interval_ms: u64,
    /// Minimum pacing delay the floor injector waits between sends.
    pub inject_pacing_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            time_btwn_1_floor: 9,
            time_btwn_2_floors: 11,
            time_btwn_3_floors: 13,
            time_btwn_x_floors_per_floor: 4,
            time_to_load_unload_1_passenger: 4,
            time_to_open_close_door: 2,
            recovery_time: 5,
            poll_interval_ms: 5,
            inject_pacing_ms: 5,
        }
    }
}

impl TimingConfig {
    /// Time (in configured units, here milliseconds) to move `delta` floors.
    ///
    /// | Δ | time |
    /// |---|---|
    /// | 0 | 0 |
    /// | 1 | `time_btwn_1_floor` |
    /// | 2 | `time_btwn_2_floors` |
    /// | 3 | `time_btwn_3_floors` |
    /// | ≥4 | `time_btwn_3_floors + per_floor * (Δ-3)` |
    #[must_use]
    pub fn move_between_floors_time(&self, delta: u32) -> u64 {
        match delta {
            0 => 0,
            1 => self.time_btwn_1_floor,
            2 => self.time_btwn_2_floors,
            3 => self.time_btwn_3_floors,
            n => self.time_btwn_3_floors + self.time_btwn_x_floors_per_floor * u64::from(n - 3),
        }
    }
}

/// Fleet sizing and per-car capacity.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FleetConfig {
    pub num_elevators: u32,
    pub elevator_capacity: u32,
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            num_elevators: 4,
            elevator_capacity: 10,
        }
    }
}

impl Config {
    /// Load config from an explicit path, or from `LIFTSIM_CONFIG`, falling back to
    /// defaults when neither is set. A missing file at an *explicit* path is an error;
    /// a missing file when falling back to env/defaults is not.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let env_path = if path.is_none() {
            env::var_os("LIFTSIM_CONFIG").map(PathBuf::from)
        } else {
            None
        };
        let is_explicit = path.is_some() || env_path.is_some();
        let effective_path = path.map(Path::to_path_buf).or(env_path);

        let mut cfg = match &effective_path {
            Some(p) if p.exists() => {
                let raw = fs::read_to_string(p).map_err(|source| LiftError::ConfigRead {
                    path: p.clone(),
                    source,
                })?;
                toml::from_str(&raw)?
            }
            Some(p) if is_explicit => {
                return Err(LiftError::MissingConfig { path: p.clone() });
            }
            _ => Self::default(),
        };

        cfg.apply_env_overrides()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        set_env_u16("LIFTSIM_SCHEDULER_PORT", &mut self.ports.scheduler_ingress)?;
        set_env_u16("LIFTSIM_FLOOR_PORT", &mut self.ports.floor_ingress)?;
        set_env_u16("LIFTSIM_CAR_PORT_BASE", &mut self.ports.car_ingress_base)?;
        set_env_u32("LIFTSIM_NUM_ELEVATORS", &mut self.fleet.num_elevators)?;
        set_env_u32("LIFTSIM_ELEVATOR_CAPACITY", &mut self.fleet.elevator_capacity)?;
        set_env_u64("LIFTSIM_POLL_INTERVAL_MS", &mut self.timing.poll_interval_ms)?;
        set_env_u64("LIFTSIM_RECOVERY_TIME", &mut self.timing.recovery_time)?;
        Ok(())
    }

    /// Validate invariants that aren't expressible in the type itself.
    pub fn validate(&self) -> Result<()> {
        if self.fleet.num_elevators == 0 {
            return Err(LiftError::InvalidConfig {
                details: "fleet.num_elevators must be at least 1".to_string(),
            });
        }
        if self.timing.poll_interval_ms == 0 {
            return Err(LiftError::InvalidConfig {
                details: "timing.poll_interval_ms must be positive".to_string(),
            });
        }
        if self.timing.inject_pacing_ms < 5 {
            return Err(LiftError::InvalidConfig {
                details: "timing.inject_pacing_ms must be at least 5 (spec minimum pacing)".to_string(),
            });
        }
        Ok(())
    }
}

fn env_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|raw| !raw.trim().is_empty())
}

fn set_env_u16(name: &str, slot: &mut u16) -> Result<()> {
    if let Some(raw) = env_var(name) {
        *slot = raw.parse::<u16>().map_err(|error| LiftError::ConfigParse {
            context: "env",
            details: format!("{name}={raw:?}: {error}"),
        })?;
    }
    Ok(())
}

fn set_env_u32(name: &str, slot: &mut u32) -> Result<()> {
    if let Some(raw) = env_var(name) {
        *slot = raw.parse::<u32>().map_err(|error| LiftError::ConfigParse {
            context: "env",
            details: format!("{name}={raw:?}: {error}"),
        })?;
    }
    Ok(())
}

fn set_env_u64(name: &str, slot: &mut u64) -> Result<()> {
    if let Some(raw) = env_var(name) {
        *slot = raw.parse::<u64>().map_err(|error| LiftError::ConfigParse {
            context: "env",
            details: format!("{name}={raw:?}: {error}"),
        })?;
    }
    Ok(())
}

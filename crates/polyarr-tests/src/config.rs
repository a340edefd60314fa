//! Which backends and device a conformance run targets
//!
//! Read once from the environment:
//!
//! - `POLYARR_BACKENDS`: comma-separated backend names (default: all)
//! - `POLYARR_DEVICE`: device every call is placed on (default: `cpu`)
//! - `POLYARR_CASES`: trials per procedure (default: 64)

use polyarr_core::Device;
use std::sync::OnceLock;
use thiserror::Error;

pub const DEFAULT_CASES: u32 = 64;

/// Backends the harness knows how to drive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendId {
    Cpu,
    Flat,
    Parallel,
}

impl BackendId {
    pub const ALL: [BackendId; 3] = [BackendId::Cpu, BackendId::Flat, BackendId::Parallel];

    /// Results of every backend are checked against this one
    pub const REFERENCE: BackendId = BackendId::Cpu;

    pub fn as_str(&self) -> &'static str {
        match self {
            BackendId::Cpu => "cpu",
            BackendId::Flat => "flat",
            BackendId::Parallel => "parallel",
        }
    }
}

impl std::fmt::Display for BackendId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BackendId {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, ConfigError> {
        BackendId::ALL
            .into_iter()
            .find(|b| b.as_str() == s.trim())
            .ok_or_else(|| ConfigError::UnknownBackend(s.trim().to_string()))
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("unknown backend '{0}' (expected one of cpu, flat, parallel)")]
    UnknownBackend(String),

    #[error("POLYARR_BACKENDS selects no backend")]
    NoBackends,

    #[error("invalid device: {0}")]
    Device(String),

    #[error("POLYARR_CASES must be a positive integer, got '{0}'")]
    Cases(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct HarnessConfig {
    pub backends: Vec<BackendId>,
    pub device: Device,
    pub cases: u32,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            backends: BackendId::ALL.to_vec(),
            device: Device::default(),
            cases: DEFAULT_CASES,
        }
    }
}

impl HarnessConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source.
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(raw) = var("POLYARR_BACKENDS") {
            let mut backends = Vec::new();
            for name in raw.split(',').filter(|s| !s.trim().is_empty()) {
                let id: BackendId = name.parse()?;
                if !backends.contains(&id) {
                    backends.push(id);
                }
            }
            if backends.is_empty() {
                return Err(ConfigError::NoBackends);
            }
            config.backends = backends;
        }

        if let Some(raw) = var("POLYARR_DEVICE") {
            config.device = raw
                .parse()
                .map_err(|e: polyarr_core::PolyarrError| ConfigError::Device(e.to_string()))?;
        }

        if let Some(raw) = var("POLYARR_CASES") {
            config.cases = match raw.trim().parse::<u32>() {
                Ok(n) if n > 0 => n,
                _ => return Err(ConfigError::Cases(raw)),
            };
        }

        log::debug!(
            "conformance config: backends={:?} device={} cases={}",
            config.backends,
            config.device,
            config.cases
        );
        Ok(config)
    }

    /// Process-wide configuration, read on first use.
    pub fn global() -> Result<&'static HarnessConfig, ConfigError> {
        static CONFIG: OnceLock<Result<HarnessConfig, ConfigError>> = OnceLock::new();
        CONFIG
            .get_or_init(|| {
                crate::init_logging();
                HarnessConfig::from_env()
            })
            .as_ref()
            .map_err(Clone::clone)
    }

    /// Trials per procedure; falls back to the default when the environment
    /// is invalid so the error surfaces from the procedure itself.
    pub fn cases() -> u32 {
        Self::global().map_or(DEFAULT_CASES, |c| c.cases)
    }
}

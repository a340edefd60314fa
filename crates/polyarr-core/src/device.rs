//! Device identifiers

use serde::{Deserialize, Serialize};

/// Where an array's storage lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Device {
    Cpu(usize),
}

impl Device {
    pub fn as_string(&self) -> String {
        match self {
            Device::Cpu(0) => "cpu".to_string(),
            Device::Cpu(n) => format!("cpu:{n}"),
        }
    }
}

impl Default for Device {
    fn default() -> Self {
        Device::Cpu(0)
    }
}

impl std::fmt::Display for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_string())
    }
}

impl std::str::FromStr for Device {
    type Err = crate::PolyarrError;

    /// Accepts `cpu` and `cpu:N`.
    fn from_str(s: &str) -> crate::Result<Self> {
        let unknown = || crate::PolyarrError::UnknownDevice(s.to_string());
        let s = s.trim();
        match s.split_once(':') {
            None if s == "cpu" => Ok(Device::Cpu(0)),
            Some(("cpu", ordinal)) => ordinal.parse().map(Device::Cpu).map_err(|_| unknown()),
            _ => Err(unknown()),
        }
    }
}

//! Target devices and compile hints.

use std::fmt;
use std::str::FromStr;

use crate::error::{AdaptorError, Result};

/// Device a model is compiled for.
///
/// Names follow the runtime's plugin naming: `CPU`, `GPU`, `GPU.1`, `NPU`,
/// `AUTO`. Composite plugin strings such as `HETERO:GPU,CPU` are kept
/// verbatim in [`Device::Plugin`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Device {
    /// CPU device.
    Cpu,
    /// GPU device, optionally pinned to an index.
    Gpu(Option<usize>),
    /// Neural processing unit.
    Npu,
    /// Let the runtime pick a device.
    Auto,
    /// Any other plugin name passed through unchanged.
    Plugin(String),
}

impl Device {
    /// Create a CPU device.
    pub fn cpu() -> Self {
        Self::Cpu
    }

    /// Create a GPU device with the given index.
    pub fn gpu(index: usize) -> Self {
        Self::Gpu(Some(index))
    }
}

impl FromStr for Device {
    type Err = AdaptorError;

    /// Parse a device string like "CPU", "gpu", "GPU.1", "AUTO".
    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(AdaptorError::config("Empty device name"));
        }

        let upper = trimmed.to_uppercase();
        match upper.as_str() {
            "CPU" => Ok(Self::Cpu),
            "GPU" => Ok(Self::Gpu(None)),
            "NPU" => Ok(Self::Npu),
            "AUTO" => Ok(Self::Auto),
            _ => {
                if let Some(idx) = upper.strip_prefix("GPU.") {
                    let index: usize = idx.parse().map_err(|_| {
                        AdaptorError::config(format!("Invalid GPU index: {}", idx))
                    })?;
                    Ok(Self::Gpu(Some(index)))
                } else {
                    Ok(Self::Plugin(trimmed.to_string()))
                }
            }
        }
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cpu => write!(f, "CPU"),
            Self::Gpu(None) => write!(f, "GPU"),
            Self::Gpu(Some(idx)) => write!(f, "GPU.{}", idx),
            Self::Npu => write!(f, "NPU"),
            Self::Auto => write!(f, "AUTO"),
            Self::Plugin(name) => write!(f, "{}", name),
        }
    }
}

/// Performance hint handed to the runtime when compiling a model.
///
/// The adaptor always compiles for latency; there is no throughput or
/// batching mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PerformanceHint {
    #[default]
    Latency,
}

impl PerformanceHint {
    /// Property value understood by the runtime.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Latency => "LATENCY",
        }
    }
}

impl fmt::Display for PerformanceHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

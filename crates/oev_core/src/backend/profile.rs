//! Device, precision and model-kind vocabulary.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Where a model runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceKind {
    /// CUDA accelerator.
    #[serde(rename = "cuda")]
    Accelerator,
    /// Host CPU.
    #[serde(rename = "cpu")]
    HostCpu,
}

impl DeviceKind {
    /// Runtime device string.
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceKind::Accelerator => "cuda",
            DeviceKind::HostCpu => "cpu",
        }
    }

    /// Precision tried first on this device.
    pub fn initial_precision(&self) -> Precision {
        match self {
            DeviceKind::Accelerator => Precision::LowFloat,
            DeviceKind::HostCpu => Precision::Int8,
        }
    }
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Numeric precision a model is initialized with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Precision {
    #[serde(rename = "float16")]
    LowFloat,
    #[serde(rename = "float32")]
    FullFloat,
    #[serde(rename = "int8")]
    Int8,
}

impl Precision {
    /// Runtime compute type string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Precision::LowFloat => "float16",
            Precision::FullFloat => "float32",
            Precision::Int8 => "int8",
        }
    }

    /// Whether this precision only exists on the accelerator.
    pub fn requires_accelerator(&self) -> bool {
        matches!(self, Precision::LowFloat)
    }
}

impl fmt::Display for Precision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which family of model is being loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    Speech,
    Translation,
}

impl ModelKind {
    /// Label used in log lines.
    pub fn label(&self) -> &'static str {
        match self {
            ModelKind::Speech => "Whisper",
            ModelKind::Translation => "NLLB",
        }
    }
}

/// Device and precision chosen for one initialization attempt.
///
/// Derived fresh at every load and never cached.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackendProfile {
    pub device: DeviceKind,
    pub precision: Precision,
    pub accelerator_memory_gib: f64,
}

impl fmt::Display for BackendProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "device={}, compute_type={}", self.device, self.precision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_cpu_starts_quantized() {
        assert_eq!(DeviceKind::HostCpu.initial_precision(), Precision::Int8);
        assert!(!DeviceKind::HostCpu.initial_precision().requires_accelerator());
        assert_eq!(DeviceKind::Accelerator.initial_precision(), Precision::LowFloat);
    }

    #[test]
    fn wire_names() {
        assert_eq!(serde_json::to_string(&DeviceKind::Accelerator).unwrap(), "\"cuda\"");
        assert_eq!(serde_json::to_string(&Precision::Int8).unwrap(), "\"int8\"");
        assert_eq!(serde_json::to_string(&ModelKind::Speech).unwrap(), "\"speech\"");
    }
}

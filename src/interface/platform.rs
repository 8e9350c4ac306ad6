use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Compute platform the engine should run on.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Platform {
    Reference,
    #[serde(rename = "CPU")]
    Cpu,
    #[serde(rename = "OpenCL")]
    OpenCl,
    #[serde(rename = "CUDA")]
    Cuda,
}

impl Platform {
    pub fn name(&self) -> &'static str {
        match self {
            Platform::Reference => "Reference",
            Platform::Cpu => "CPU",
            Platform::OpenCl => "OpenCL",
            Platform::Cuda => "CUDA",
        }
    }

    fn property_prefix(&self) -> Option<&'static str> {
        match self {
            Platform::Cuda => Some("Cuda"),
            Platform::OpenCl => Some("OpenCL"),
            _ => None,
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "reference" => Ok(Platform::Reference),
            "cpu" => Ok(Platform::Cpu),
            "opencl" => Ok(Platform::OpenCl),
            "cuda" => Ok(Platform::Cuda),
            _ => Err(format!("unknown platform '{}'", s)),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Precision {
    Single,
    Mixed,
    Double,
}

impl Precision {
    pub fn name(&self) -> &'static str {
        match self {
            Precision::Single => "single",
            Precision::Mixed => "mixed",
            Precision::Double => "double",
        }
    }
}

impl FromStr for Precision {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "single" => Ok(Precision::Single),
            "mixed" => Ok(Precision::Mixed),
            "double" => Ok(Precision::Double),
            _ => Err(format!("unknown precision '{}'", s)),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlatformSpec {
    pub platform: Platform,
    pub precision: Precision,
    pub device_index: Option<usize>,
}

impl PlatformSpec {
    /// Platform-specific properties, e.g. `CudaPrecision = mixed`.
    /// Reference and CPU platforms take no precision setting.
    pub fn properties(&self) -> HashMap<String, String> {
        let mut properties: HashMap<String, String> = HashMap::new();
        if let Some(prefix) = self.platform.property_prefix() {
            properties.insert(
                format!("{}Precision", prefix),
                self.precision.name().to_string(),
            );
            if let Some(index) = self.device_index {
                properties.insert(format!("{}DeviceIndex", prefix), index.to_string());
            }
        }
        properties
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cuda_mixed_precision() {
        let spec: PlatformSpec = PlatformSpec {
            platform: Platform::Cuda,
            precision: Precision::Mixed,
            device_index: Some(1),
        };
        let properties: HashMap<String, String> = spec.properties();
        assert_eq!(properties.len(), 2);
        assert_eq!(properties["CudaPrecision"], "mixed");
        assert_eq!(properties["CudaDeviceIndex"], "1");
    }

    #[test]
    fn reference_has_no_properties() {
        let spec: PlatformSpec = PlatformSpec {
            platform: Platform::Reference,
            precision: Precision::Double,
            device_index: Some(0),
        };
        assert!(spec.properties().is_empty());
    }

    #[test]
    fn parse_names() {
        assert_eq!("CUDA".parse::<Platform>(), Ok(Platform::Cuda));
        assert_eq!("opencl".parse::<Platform>(), Ok(Platform::OpenCl));
        assert!("Metal".parse::<Platform>().is_err());
        assert_eq!("Mixed".parse::<Precision>(), Ok(Precision::Mixed));
    }
}

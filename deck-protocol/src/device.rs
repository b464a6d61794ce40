//! Device descriptors as reported by the host.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Key grid dimensions of a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceSize {
    pub columns: u32,
    pub rows: u32,
}

/// Hardware family of a device, carried on the wire as an integer code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum DeviceType {
    Standard,
    Mini,
    Xl,
    Mobile,
    CorsairGKeys,
    Pedal,
    CorsairVoyager,
    Plus,
    ScufController,
    Neo,
    /// A code this crate does not know about
    Other(u8),
}

impl From<u8> for DeviceType {
    fn from(code: u8) -> Self {
        match code {
            0 => Self::Standard,
            1 => Self::Mini,
            2 => Self::Xl,
            3 => Self::Mobile,
            4 => Self::CorsairGKeys,
            5 => Self::Pedal,
            6 => Self::CorsairVoyager,
            7 => Self::Plus,
            8 => Self::ScufController,
            9 => Self::Neo,
            other => Self::Other(other),
        }
    }
}

impl From<DeviceType> for u8 {
    fn from(kind: DeviceType) -> Self {
        match kind {
            DeviceType::Standard => 0,
            DeviceType::Mini => 1,
            DeviceType::Xl => 2,
            DeviceType::Mobile => 3,
            DeviceType::CorsairGKeys => 4,
            DeviceType::Pedal => 5,
            DeviceType::CorsairVoyager => 6,
            DeviceType::Plus => 7,
            DeviceType::ScufController => 8,
            DeviceType::Neo => 9,
            DeviceType::Other(code) => code,
        }
    }
}

/// Descriptive fields of a device, without its id.
///
/// This is the `deviceInfo` object of a connect event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<DeviceSize>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<DeviceType>,
}

impl DeviceInfo {
    /// Overwrite fields with those present in `other`, keeping ours otherwise.
    pub fn merge(&mut self, other: &DeviceInfo) {
        if other.name.is_some() {
            self.name = other.name.clone();
        }
        if other.size.is_some() {
            self.size = other.size;
        }
        if other.kind.is_some() {
            self.kind = other.kind;
        }
    }
}

/// A device enumerated in the registration info.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceDescriptor {
    pub id: String,
    #[serde(flatten)]
    pub info: DeviceInfo,
}

impl DeviceDescriptor {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            info: DeviceInfo::default(),
        }
    }
}

/// The registration info document the host passes at launch.
///
/// Only `devices` is interpreted; the application and plugin sections are
/// kept as raw JSON for callers that need them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegistrationInfo {
    #[serde(default)]
    pub devices: Vec<DeviceDescriptor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plugin: Option<Value>,
}

//! Android ABI enumeration
//!
//! The native-library architectures a package can bundle. Each maps to a
//! `lib/<abi>/` directory inside the archive.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Target CPU architecture for native libraries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Abi {
    /// 32-bit ARM for older devices
    #[serde(rename = "armeabi-v7a")]
    ArmeabiV7a,
    /// ARM64 for physical devices
    #[serde(rename = "arm64-v8a")]
    Arm64V8a,
    /// 32-bit x86 for legacy emulators
    #[serde(rename = "x86")]
    X86,
    /// x86_64 for emulators and Chromebooks
    #[serde(rename = "x86_64")]
    X86_64,
}

impl Abi {
    /// Every supported ABI, in canonical order
    pub const ALL: [Abi; 4] = [Abi::ArmeabiV7a, Abi::Arm64V8a, Abi::X86, Abi::X86_64];

    /// Names of every supported ABI, in canonical order
    pub const NAMES: [&'static str; 4] = ["armeabi-v7a", "arm64-v8a", "x86", "x86_64"];

    /// NDK architecture name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ArmeabiV7a => "armeabi-v7a",
            Self::Arm64V8a => "arm64-v8a",
            Self::X86 => "x86",
            Self::X86_64 => "x86_64",
        }
    }

    /// Archive directory holding this ABI's native libraries
    pub fn lib_dir(&self) -> String {
        format!("lib/{}", self.as_str())
    }

    /// Get display name
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::ArmeabiV7a => "ARMv7",
            Self::Arm64V8a => "ARM64",
            Self::X86 => "x86",
            Self::X86_64 => "x86_64",
        }
    }

    /// Whether this is a 64-bit architecture
    pub fn is_64_bit(&self) -> bool {
        matches!(self, Self::Arm64V8a | Self::X86_64)
    }
}

impl fmt::Display for Abi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An ABI name outside the supported enumeration
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown ABI `{0}`")]
pub struct UnknownAbi(pub String);

impl FromStr for Abi {
    type Err = UnknownAbi;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|abi| abi.as_str() == s)
            .ok_or_else(|| UnknownAbi(s.to_string()))
    }
}

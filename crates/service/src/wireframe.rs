//! Wireframe overlay modes

use std::fmt;

use serde::{Deserialize, Serialize};

/// How wireframes are drawn over a rendered frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(i32)]
pub enum WireframeMode {
    /// No wireframe
    #[default]
    None = 0,
    /// Wireframe of the last draw call only
    Overlay = 1,
    /// Wireframe of every draw call
    All = 2,
}

impl WireframeMode {
    pub fn from_i32(value: i32) -> Option<Self> {
        match value {
            0 => Some(Self::None),
            1 => Some(Self::Overlay),
            2 => Some(Self::All),
            _ => None,
        }
    }

    pub fn as_i32(self) -> i32 {
        self as i32
    }
}

impl fmt::Display for WireframeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::None => "none",
            Self::Overlay => "overlay",
            Self::All => "all",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_i32() {
        assert_eq!(WireframeMode::from_i32(0), Some(WireframeMode::None));
        assert_eq!(WireframeMode::from_i32(1), Some(WireframeMode::Overlay));
        assert_eq!(WireframeMode::from_i32(2), Some(WireframeMode::All));
        assert_eq!(WireframeMode::from_i32(3), None);
        assert_eq!(WireframeMode::from_i32(-1), None);
    }

    #[test]
    fn test_values_round_trip() {
        for mode in [WireframeMode::None, WireframeMode::Overlay, WireframeMode::All] {
            assert_eq!(WireframeMode::from_i32(mode.as_i32()), Some(mode));
        }
    }
}

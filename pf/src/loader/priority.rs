//! Fetch priority

use serde::{Deserialize, Serialize};

/// How a request is admitted by a loader that caps concurrent fetches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Waits for a free fetch slot
    #[default]
    Normal,
    /// Skips the slot limit; navigations never queue behind other fetches
    Now,
}

impl Priority {
    pub fn waits_for_slot(self) -> bool {
        self == Self::Normal
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Normal => write!(f, "normal"),
            Self::Now => write!(f, "now"),
        }
    }
}

impl std::str::FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "normal" => Ok(Self::Normal),
            "now" => Ok(Self::Now),
            _ => Err(format!("Unknown priority: {}. Use: normal or now", s)),
        }
    }
}

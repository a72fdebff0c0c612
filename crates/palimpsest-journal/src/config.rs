#![forbid(unsafe_code)]

//! Journal configuration.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default retention budget: 8 MiB of undo records.
pub const DEFAULT_BUDGET_BYTES: usize = 8 * 1024 * 1024;

/// Retention settings for a [`History`](crate::History).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct JournalConfig {
    /// Undo stream size above which the oldest whole groups are discarded.
    /// The newest group is always kept.
    pub budget_bytes: usize,
}

impl Default for JournalConfig {
    fn default() -> Self {
        Self {
            budget_bytes: DEFAULT_BUDGET_BYTES,
        }
    }
}

impl JournalConfig {
    #[must_use]
    pub fn new(budget_bytes: usize) -> Self {
        Self { budget_bytes }
    }

    /// Never discard anything.
    #[must_use]
    pub fn unlimited() -> Self {
        Self {
            budget_bytes: usize::MAX,
        }
    }

    #[must_use]
    pub fn with_budget_bytes(mut self, budget_bytes: usize) -> Self {
        self.budget_bytes = budget_bytes;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_budget_is_eight_mebibytes() {
        assert_eq!(JournalConfig::default().budget_bytes, 8_388_608);
    }

    #[test]
    fn builder_overrides_budget() {
        let config = JournalConfig::unlimited().with_budget_bytes(100);
        assert_eq!(config, JournalConfig::new(100));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config: JournalConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, JournalConfig::default());
        let json = serde_json::to_string(&JournalConfig::new(64)).unwrap();
        assert_eq!(json, r#"{"budget_bytes":64}"#);
    }
}

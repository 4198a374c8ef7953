//! User preference record.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// List ordering preference, stored as `"date"` or `"priority"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Date,
    Priority,
}

impl SortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Date => "date",
            Self::Priority => "priority",
        }
    }

    /// Parses a sort criterion; unrecognized values yield `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "date" => Some(Self::Date),
            "priority" => Some(Self::Priority),
            _ => None,
        }
    }
}

impl Display for SortOrder {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Singleton-per-installation preference record.
///
/// Serialized with the persisted key names `isDarkMode` / `sortOrder`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPreferences {
    pub is_dark_mode: bool,
    pub sort_order: SortOrder,
}

#[cfg(test)]
mod tests {
    use super::{SortOrder, UserPreferences};

    #[test]
    fn default_is_light_mode_sorted_by_date() {
        let prefs = UserPreferences::default();
        assert!(!prefs.is_dark_mode);
        assert_eq!(prefs.sort_order, SortOrder::Date);
    }

    #[test]
    fn serializes_with_persisted_key_names() {
        let prefs = UserPreferences {
            is_dark_mode: true,
            sort_order: SortOrder::Priority,
        };
        let json = serde_json::to_string(&prefs).unwrap();
        assert_eq!(json, r#"{"isDarkMode":true,"sortOrder":"priority"}"#);
    }

    #[test]
    fn parse_rejects_unknown_criteria() {
        assert_eq!(SortOrder::parse("priority"), Some(SortOrder::Priority));
        assert_eq!(SortOrder::parse("Date"), None);
        assert_eq!(SortOrder::parse(""), None);
    }
}

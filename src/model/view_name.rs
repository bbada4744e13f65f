use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::AppError;

/// Identifier of one of the four sheet sections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ViewName {
    #[default]
    Vista1,
    Vista2,
    Vista3,
    Vista4,
}

impl ViewName {
    /// Declared order, used for navigation buttons and export
    pub const ALL: [ViewName; 4] = [
        ViewName::Vista1,
        ViewName::Vista2,
        ViewName::Vista3,
        ViewName::Vista4,
    ];

    /// Stable identifier used in saved files and durable storage
    pub fn id(self) -> &'static str {
        match self {
            ViewName::Vista1 => "vista1",
            ViewName::Vista2 => "vista2",
            ViewName::Vista3 => "vista3",
            ViewName::Vista4 => "vista4",
        }
    }

    /// Display name shown on navigation buttons and PDF pages
    pub fn title(self) -> &'static str {
        match self {
            ViewName::Vista1 => "Información General",
            ViewName::Vista2 => "Costos y Avíos",
            ViewName::Vista3 => "Corte",
            ViewName::Vista4 => "Muestras",
        }
    }

    /// Zero-based position in `ALL`
    pub fn index(self) -> usize {
        match self {
            ViewName::Vista1 => 0,
            ViewName::Vista2 => 1,
            ViewName::Vista3 => 2,
            ViewName::Vista4 => 3,
        }
    }
}

impl fmt::Display for ViewName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for ViewName {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ViewName::ALL
            .into_iter()
            .find(|v| v.id() == s.trim())
            .ok_or_else(|| AppError::Validation(format!("unknown view '{s}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_ids() {
        for view in ViewName::ALL {
            assert_eq!(view.id().parse::<ViewName>().unwrap(), view);
        }
    }

    #[test]
    fn test_parse_unknown_id_is_validation_error() {
        let err = "vista5".parse::<ViewName>().unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_serde_uses_ids() {
        let json = serde_json::to_string(&ViewName::Vista3).unwrap();
        assert_eq!(json, "\"vista3\"");
    }
}

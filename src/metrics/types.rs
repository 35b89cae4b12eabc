use serde::{Deserialize, Serialize};

/// Direction a commute time moved since the previous published snapshot.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    #[default]
    Flat,
}

impl Trend {
    pub fn arrow(&self) -> &'static str {
        match self {
            Trend::Up => "↑",
            Trend::Down => "↓",
            Trend::Flat => "→",
        }
    }
}

/// How far a commute exceeds the configured baseline.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    None,
    Moderate,
    Heavy,
}

impl Severity {
    pub fn css_class(&self) -> &'static str {
        match self {
            Severity::None => "",
            Severity::Moderate => "moderate-traffic",
            Severity::Heavy => "heavy-traffic",
        }
    }
}

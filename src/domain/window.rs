//! Rolling windows used for blacklist counting.

use std::fmt;
use std::str::FromStr;

use chrono::Duration;
use serde::{Deserialize, Serialize};

/// Supported blacklist windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BlacklistWindow {
    #[serde(rename = "15m")]
    FifteenMinutes,
    #[serde(rename = "30m")]
    ThirtyMinutes,
    #[default]
    #[serde(rename = "1h")]
    OneHour,
    #[serde(rename = "3h")]
    ThreeHours,
}

impl BlacklistWindow {
    /// Every supported window, shortest first.
    pub const ALL: [Self; 4] = [
        Self::FifteenMinutes,
        Self::ThirtyMinutes,
        Self::OneHour,
        Self::ThreeHours,
    ];

    /// Length of the window.
    #[must_use]
    pub fn duration(self) -> Duration {
        match self {
            Self::FifteenMinutes => Duration::minutes(15),
            Self::ThirtyMinutes => Duration::minutes(30),
            Self::OneHour => Duration::hours(1),
            Self::ThreeHours => Duration::hours(3),
        }
    }

    /// The longest window; events older than this are never counted.
    #[must_use]
    pub fn longest() -> Self {
        Self::ThreeHours
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::FifteenMinutes => "15m",
            Self::ThirtyMinutes => "30m",
            Self::OneHour => "1h",
            Self::ThreeHours => "3h",
        }
    }
}

impl fmt::Display for BlacklistWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for BlacklistWindow {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|w| w.label() == s)
            .ok_or_else(|| format!("unknown window '{s}' (expected 15m, 30m, 1h or 3h)"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_labels() {
        assert_eq!("1h".parse::<BlacklistWindow>(), Ok(BlacklistWindow::OneHour));
        assert_eq!(
            "15m".parse::<BlacklistWindow>(),
            Ok(BlacklistWindow::FifteenMinutes)
        );
        assert!("2h".parse::<BlacklistWindow>().is_err());
    }

    #[test]
    fn longest_window_is_three_hours() {
        let max = BlacklistWindow::ALL
            .iter()
            .map(|w| w.duration())
            .max()
            .unwrap();
        assert_eq!(max, BlacklistWindow::longest().duration());
    }
}

//! Supported sports and their provider routing

use crate::GatewayError;
use std::str::FromStr;

/// A sport the gateway can serve. Each maps to one upstream provider
/// endpoint plus an upcoming-events window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sport {
    Football,
    Basketball,
    Volleyball,
    Hockey,
    Mma,
    Boxing,
    Formula1,
    Cs2,
}

impl Sport {
    pub const ALL: [Sport; 8] = [
        Sport::Football,
        Sport::Basketball,
        Sport::Volleyball,
        Sport::Hockey,
        Sport::Mma,
        Sport::Boxing,
        Sport::Formula1,
        Sport::Cs2,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Football => "football",
            Self::Basketball => "basketball",
            Self::Volleyball => "volleyball",
            Self::Hockey => "hockey",
            Self::Mma => "mma",
            Self::Boxing => "boxing",
            Self::Formula1 => "formula1",
            Self::Cs2 => "cs2",
        }
    }

    /// API-SPORTS host for this sport. Boxing rides the MMA API upstream;
    /// CS2 is served by PandaScore instead.
    pub(crate) fn api_sports_base(self) -> Option<&'static str> {
        match self {
            Self::Football => Some("https://v3.football.api-sports.io"),
            Self::Basketball => Some("https://v1.basketball.api-sports.io"),
            Self::Volleyball => Some("https://v1.volleyball.api-sports.io"),
            Self::Hockey => Some("https://v1.hockey.api-sports.io"),
            Self::Mma | Self::Boxing => Some("https://v1.mma.api-sports.io"),
            Self::Formula1 => Some("https://v1.formula-1.api-sports.io"),
            Self::Cs2 => None,
        }
    }

    pub(crate) fn api_sports_path(self) -> &'static str {
        match self {
            Self::Football => "/fixtures",
            Self::Basketball | Self::Volleyball | Self::Hockey => "/games",
            Self::Mma | Self::Boxing => "/fights",
            Self::Formula1 => "/races",
            Self::Cs2 => "",
        }
    }

    /// How far ahead the upcoming listing looks.
    pub(crate) fn upcoming_window_days(self) -> i64 {
        match self {
            Self::Football => 7,
            Self::Basketball | Self::Volleyball | Self::Hockey => 5,
            Self::Mma | Self::Boxing => 90,
            Self::Formula1 => 120,
            Self::Cs2 => 0,
        }
    }

    /// Substrings that mark an event as live in the provider's status field.
    pub(crate) fn live_markers(self) -> &'static [&'static str] {
        match self {
            Self::Basketball | Self::Volleyball | Self::Hockey => &["live", "in play"],
            Self::Mma | Self::Boxing => &["live", "in progress"],
            Self::Formula1 => &["live", "running"],
            Self::Football | Self::Cs2 => &[],
        }
    }
}

impl FromStr for Sport {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "football" => Ok(Self::Football),
            "basketball" => Ok(Self::Basketball),
            "volleyball" => Ok(Self::Volleyball),
            "hockey" => Ok(Self::Hockey),
            "mma" => Ok(Self::Mma),
            "boxing" => Ok(Self::Boxing),
            "formula1" => Ok(Self::Formula1),
            "cs2" => Ok(Self::Cs2),
            other => Err(GatewayError::UnknownSport(other.to_string())),
        }
    }
}

impl std::fmt::Display for Sport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_sport_parses_from_its_name() {
        for sport in Sport::ALL {
            assert_eq!(sport.as_str().parse::<Sport>().unwrap(), sport);
        }
    }

    #[test]
    fn test_unknown_sport_is_an_error() {
        assert!(matches!("curling".parse::<Sport>(), Err(GatewayError::UnknownSport(_))));
    }

    #[test]
    fn test_boxing_shares_the_mma_api() {
        assert_eq!(Sport::Boxing.api_sports_base(), Sport::Mma.api_sports_base());
        assert_eq!(Sport::Boxing.api_sports_path(), "/fights");
    }

    #[test]
    fn test_cs2_has_no_api_sports_host() {
        assert!(Sport::Cs2.api_sports_base().is_none());
    }
}

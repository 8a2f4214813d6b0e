use serde::{Deserialize, Serialize};

/// Discrete maturity category derived from the overall score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MaturityLevel {
    Initial,
    Managed,
    Defined,
    Optimizing,
}

impl MaturityLevel {
    pub const fn ordered() -> [Self; 4] {
        [
            Self::Initial,
            Self::Managed,
            Self::Defined,
            Self::Optimizing,
        ]
    }

    /// Inclusive lower bound of the level's score band.
    pub const fn floor(self) -> f64 {
        match self {
            Self::Initial => 0.0,
            Self::Managed => 1.5,
            Self::Defined => 2.5,
            Self::Optimizing => 3.5,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Initial => "INITIAL",
            Self::Managed => "MANAGED",
            Self::Defined => "DEFINED",
            Self::Optimizing => "OPTIMIZING",
        }
    }

    /// Maps a score onto its band.
    ///
    /// Bands are `[0.0, 1.5)`, `[1.5, 2.5)`, `[2.5, 3.5)` and `[3.5, 5.0]`. The last band is
    /// closed at the top and absorbs anything above 5.0; anything below 1.5 (including
    /// negative or NaN input) is `Initial`.
    pub fn classify(score: f64) -> Self {
        if score >= Self::Optimizing.floor() {
            Self::Optimizing
        } else if score >= Self::Defined.floor() {
            Self::Defined
        } else if score >= Self::Managed.floor() {
            Self::Managed
        } else {
            Self::Initial
        }
    }
}

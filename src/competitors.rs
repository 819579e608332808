//! Supported competitor storefronts and their default domains.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Supported competitors. All of them run VTEX storefronts, so a single
/// search cascade covers every entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Competitor {
    Tata,
    ElDorado,
    ElClon,
    Mily,
}

impl Competitor {
    /// Returns the default storefront base URL for this competitor.
    pub fn default_base_url(&self) -> &'static str {
        match self {
            Competitor::Tata => "https://tata.com.uy",
            Competitor::ElDorado => "https://www.eldorado.com.uy",
            Competitor::ElClon => "https://www.elclon.com.uy",
            Competitor::Mily => "https://www.mily.com.uy",
        }
    }

    /// Returns the environment variable that overrides this competitor's base URL.
    pub fn base_env_var(&self) -> &'static str {
        match self {
            Competitor::Tata => "TATA_BASE",
            Competitor::ElDorado => "ELDORADO_BASE",
            Competitor::ElClon => "ELCLON_BASE",
            Competitor::Mily => "MILY_BASE",
        }
    }

    /// Returns all supported competitors.
    pub fn all() -> &'static [Competitor] {
        &[Competitor::Tata, Competitor::ElDorado, Competitor::ElClon, Competitor::Mily]
    }
}

impl fmt::Display for Competitor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let key = match self {
            Competitor::Tata => "tata",
            Competitor::ElDorado => "eldorado",
            Competitor::ElClon => "elclon",
            Competitor::Mily => "mily",
        };
        write!(f, "{}", key)
    }
}

impl FromStr for Competitor {
    type Err = CompetitorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "tata" => Ok(Competitor::Tata),
            "eldorado" | "el dorado" => Ok(Competitor::ElDorado),
            "elclon" | "el clon" => Ok(Competitor::ElClon),
            "mily" => Ok(Competitor::Mily),
            _ => Err(CompetitorParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CompetitorParseError(pub String);

impl fmt::Display for CompetitorParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Unknown competitor '{}'. Valid competitors: tata, eldorado, elclon, mily",
            self.0
        )
    }
}

impl std::error::Error for CompetitorParseError {}

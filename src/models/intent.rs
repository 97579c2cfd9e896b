use serde::{Deserialize, Serialize};

use super::AnimeRecord;

/// Titles scoring below this are considered hidden gems
pub const HIDDEN_GEM_SCORE_CEILING: f64 = 7.0;

/// Rating preference inferred from the query
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum RatingPreference {
    /// Prefer lower-rated, under-appreciated titles
    #[serde(rename = "hidden gem")]
    HiddenGem,
}

/// Structured filters extracted from a free-text query
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ParsedIntent {
    /// Matched genre directory keys, in the order they were found
    pub genres: Vec<String>,
    /// Episode ceiling from an "under N" phrase
    pub max_episodes: Option<u32>,
    pub rating_pref: Option<RatingPreference>,
}

impl ParsedIntent {
    /// Episode ceiling check; records with an unknown count never pass a ceiling
    pub fn allows_episodes(&self, record: &AnimeRecord) -> bool {
        match self.max_episodes {
            None => true,
            Some(max) => matches!(record.episodes, Some(eps) if eps > 0 && eps <= max),
        }
    }

    /// Rating preference check; records with an unknown score never pass as gems
    pub fn allows_rating(&self, record: &AnimeRecord) -> bool {
        match self.rating_pref {
            None => true,
            Some(RatingPreference::HiddenGem) => {
                matches!(record.score, Some(score) if score > 0.0 && score < HIDDEN_GEM_SCORE_CEILING)
            }
        }
    }

    pub fn accepts(&self, record: &AnimeRecord) -> bool {
        self.allows_episodes(record) && self.allows_rating(record)
    }
}

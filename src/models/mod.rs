use serde::{Deserialize, Serialize};

pub mod genre;
pub mod intent;

pub use genre::GenreDirectory;
pub use intent::{ParsedIntent, RatingPreference};

/// A single anime entry as returned by either catalog (or read back from cache)
///
/// Scores are on a 0-10 scale regardless of the source catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnimeRecord {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub episodes: Option<u32>,
    #[serde(default)]
    pub score: Option<f64>,
}

impl AnimeRecord {
    /// Records without a title or link are useless to the end user
    pub fn is_displayable(&self) -> bool {
        !self.title.trim().is_empty() && !self.url.trim().is_empty()
    }

    /// Score used for ranking; unknown scores rank as 0
    pub fn rank_score(&self) -> f64 {
        self.score.unwrap_or(0.0)
    }

    /// Title with season/sequel suffixes stripped, used to merge variants
    ///
    /// "Attack on Titan: Final Season" and "Attack on Titan - Part 2" both
    /// normalize to "attack on titan".
    pub fn base_title(&self) -> String {
        let before_colon = self.title.split(':').next().unwrap_or_default();
        let before_dash = before_colon.split('-').next().unwrap_or_default();
        before_dash.trim().to_lowercase()
    }
}

/// A recommendation returned to the client
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Recommendation {
    pub title: String,
    pub url: String,
}

impl From<AnimeRecord> for Recommendation {
    fn from(record: AnimeRecord) -> Self {
        Self {
            title: record.title,
            url: record.url,
        }
    }
}

// ============================================================================
// Jikan API Types
// ============================================================================

/// Envelope shared by every Jikan list endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct JikanPage<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
}

/// Jikan genre entry from GET /genres/anime
#[derive(Debug, Clone, Deserialize)]
pub struct JikanGenre {
    pub mal_id: u32,
    pub name: String,
}

// ============================================================================
// AniList API Types
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct AniListResponse {
    pub data: AniListData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AniListData {
    #[serde(rename = "Page")]
    pub page: AniListPage,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AniListPage {
    #[serde(default)]
    pub media: Vec<AniListMedia>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AniListMedia {
    pub title: AniListTitle,
    #[serde(default)]
    pub site_url: Option<String>,
    /// 0-100 scale
    #[serde(default)]
    pub average_score: Option<u32>,
    #[serde(default)]
    pub episodes: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AniListTitle {
    #[serde(default)]
    pub romaji: Option<String>,
}

impl From<AniListMedia> for AnimeRecord {
    fn from(media: AniListMedia) -> Self {
        AnimeRecord {
            title: media.title.romaji.unwrap_or_default(),
            url: media.site_url.unwrap_or_default(),
            episodes: media.episodes,
            score: media
                .average_score
                .filter(|score| *score > 0)
                .map(|score| f64::from(score) / 10.0),
        }
    }
}

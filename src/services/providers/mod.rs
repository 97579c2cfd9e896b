/// Anime catalog abstraction
///
/// The recommender talks to two independent catalogs: a primary REST catalog
/// (Jikan, mirroring MyAnimeList) used for genre, search and top listings, and
/// a secondary GraphQL catalog (AniList) consulted only when the primary one
/// comes back empty.
use std::time::Duration;

use crate::{
    error::AppResult,
    models::{AnimeRecord, GenreDirectory},
};

pub mod anilist;
pub mod jikan;

pub use anilist::AniListProvider;
pub use jikan::JikanProvider;

/// Minimum gap between consecutive requests to the same catalog
pub const PAGE_DELAY: Duration = Duration::from_secs(1);

/// Primary catalog: genre directory, by-genre listing, search and top listing
///
/// Paginated methods request pages 1..=`pages` one after another and fail as a
/// whole if any page fails.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait AnimeCatalog: Send + Sync {
    /// Fetch the full genre directory
    async fn fetch_genres(&self) -> AppResult<GenreDirectory>;

    /// Fetch titles tagged with a genre
    async fn fetch_by_genre(&self, genre_id: u32, pages: u32) -> AppResult<Vec<AnimeRecord>>;

    /// Free-text title search
    async fn search(&self, query: &str, pages: u32) -> AppResult<Vec<AnimeRecord>>;

    /// Currently top-ranked titles
    async fn top(&self, pages: u32) -> AppResult<Vec<AnimeRecord>>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}

/// Secondary catalog used as a search fallback
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait FallbackCatalog: Send + Sync {
    /// Free-text search returning at most `per_page` titles
    async fn search(&self, query: &str, per_page: u32) -> AppResult<Vec<AnimeRecord>>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}

use std::collections::HashSet;
use std::sync::Arc;

use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};

use crate::{
    error::AppResult,
    models::{AnimeRecord, GenreDirectory, ParsedIntent, Recommendation},
    services::{
        intent::IntentParser,
        providers::{AnimeCatalog, FallbackCatalog},
    },
};

/// Upper bound on the number of recommendations returned
pub const MAX_RECOMMENDATIONS: usize = 10;

const GENRE_PAGES: u32 = 2;
const SEARCH_PAGES: u32 = 1;
const FALLBACK_PER_PAGE: u32 = 10;
const TRENDING_PAGES: u32 = 2;

/// Where a candidate list came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateSource {
    /// Primary catalog listings for every matched genre
    Genre,
    /// Primary catalog free-text search
    Search,
    /// Secondary catalog free-text search
    Fallback,
    /// Primary catalog top listing, ignoring the query
    Trending,
}

/// Sources tried in order; the first non-empty candidate list wins
pub const FALLBACK_CHAIN: [CandidateSource; 4] = [
    CandidateSource::Genre,
    CandidateSource::Search,
    CandidateSource::Fallback,
    CandidateSource::Trending,
];

/// Generates anime recommendations from free-text queries
///
/// Parses the query into genres and filters, pulls candidates from the
/// catalogs following [`FALLBACK_CHAIN`], removes duplicates, applies the
/// filters and returns the highest-scored titles.
#[derive(Clone)]
pub struct Recommender {
    catalog: Arc<dyn AnimeCatalog>,
    fallback: Arc<dyn FallbackCatalog>,
    genres: Arc<GenreDirectory>,
    parser: IntentParser,
    rng_seed: Option<u64>,
}

impl Recommender {
    pub fn new(
        catalog: Arc<dyn AnimeCatalog>,
        fallback: Arc<dyn FallbackCatalog>,
        genres: Arc<GenreDirectory>,
    ) -> Self {
        Self {
            catalog,
            fallback,
            parser: IntentParser::new(genres.clone()),
            genres,
            rng_seed: None,
        }
    }

    /// Uses a fixed seed for the tie-breaking shuffle instead of OS entropy
    pub fn with_rng_seed(mut self, seed: u64) -> Self {
        self.rng_seed = Some(seed);
        self
    }

    pub fn genres(&self) -> &GenreDirectory {
        &self.genres
    }

    pub fn parse_user_request(&self, query: &str) -> ParsedIntent {
        self.parser.parse_user_request(query)
    }

    /// Recommends up to [`MAX_RECOMMENDATIONS`] titles for a free-text query
    pub async fn recommend_anime(&self, query: &str) -> AppResult<Vec<Recommendation>> {
        let intent = self.parse_user_request(query);
        let (source, candidates) = self.gather_candidates(query, &intent).await?;
        let fetched = candidates.len();

        let candidates: Vec<AnimeRecord> = dedupe_by_base_title(dedupe_by_url(candidates))
            .into_iter()
            .filter(|record| intent.accepts(record))
            .collect();

        let recommendations = rank(candidates, &mut self.rng());

        tracing::info!(
            query = %query,
            source = ?source,
            fetched = fetched,
            returned = recommendations.len(),
            "Recommendations generated"
        );

        Ok(recommendations)
    }

    /// Trending picks shown when there is no query at all
    pub async fn get_default_recs(&self) -> AppResult<Vec<Recommendation>> {
        let candidates = self.catalog.top(TRENDING_PAGES).await?;
        let recommendations = rank(candidates, &mut self.rng());

        tracing::info!(returned = recommendations.len(), "Default trending picks generated");

        Ok(recommendations)
    }

    async fn gather_candidates(
        &self,
        query: &str,
        intent: &ParsedIntent,
    ) -> AppResult<(CandidateSource, Vec<AnimeRecord>)> {
        for source in FALLBACK_CHAIN {
            let Some(candidates) = self.fetch_from(source, query, intent).await? else {
                continue;
            };

            tracing::debug!(
                source = ?source,
                candidates = candidates.len(),
                "Candidate source consulted"
            );

            if !candidates.is_empty() || source == CandidateSource::Trending {
                return Ok((source, candidates));
            }
        }

        Ok((CandidateSource::Trending, Vec::new()))
    }

    /// Fetches candidates from one source, or `None` when the source does not
    /// apply to this query
    async fn fetch_from(
        &self,
        source: CandidateSource,
        query: &str,
        intent: &ParsedIntent,
    ) -> AppResult<Option<Vec<AnimeRecord>>> {
        let query = query.trim();

        let candidates = match source {
            CandidateSource::Genre => {
                if intent.genres.is_empty() {
                    return Ok(None);
                }
                let mut all = Vec::new();
                for genre in &intent.genres {
                    if let Some(genre_id) = self.genres.id(genre) {
                        all.extend(self.catalog.fetch_by_genre(genre_id, GENRE_PAGES).await?);
                    }
                }
                all
            }
            CandidateSource::Search => {
                if !intent.genres.is_empty() || query.is_empty() {
                    return Ok(None);
                }
                self.catalog.search(query, SEARCH_PAGES).await?
            }
            CandidateSource::Fallback => {
                if query.is_empty() {
                    return Ok(None);
                }
                self.fallback.search(query, FALLBACK_PER_PAGE).await?
            }
            CandidateSource::Trending => self.catalog.top(TRENDING_PAGES).await?,
        };

        Ok(Some(candidates))
    }

    fn rng(&self) -> StdRng {
        match self.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}

/// Keeps the first record for every url, preserving order
pub fn dedupe_by_url(records: Vec<AnimeRecord>) -> Vec<AnimeRecord> {
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(AnimeRecord::is_displayable)
        .filter(|record| seen.insert(record.url.clone()))
        .collect()
}

/// Keeps the first record for every base title, preserving order
pub fn dedupe_by_base_title(records: Vec<AnimeRecord>) -> Vec<AnimeRecord> {
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|record| seen.insert(record.base_title()))
        .collect()
}

/// Shuffles, then stable-sorts by descending score and keeps the top entries
///
/// The shuffle randomizes the order of equally scored titles between calls.
pub fn rank<R: Rng + ?Sized>(mut records: Vec<AnimeRecord>, rng: &mut R) -> Vec<Recommendation> {
    records.shuffle(rng);
    records.sort_by(|a, b| b.rank_score().total_cmp(&a.rank_score()));
    records.truncate(MAX_RECOMMENDATIONS);
    records.into_iter().map(Recommendation::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::models::RatingPreference;
    use crate::services::providers::{MockAnimeCatalog, MockFallbackCatalog};

    fn anime(title: &str, id: u32, episodes: Option<u32>, score: Option<f64>) -> AnimeRecord {
        AnimeRecord {
            title: title.to_string(),
            url: format!("https://myanimelist.net/anime/{}", id),
            episodes,
            score,
        }
    }

    fn directory() -> Arc<GenreDirectory> {
        Arc::new(GenreDirectory::new([
            ("Action", 1),
            ("Comedy", 4),
            ("Romance", 22),
        ]))
    }

    fn recommender(catalog: MockAnimeCatalog, fallback: MockFallbackCatalog) -> Recommender {
        Recommender::new(Arc::new(catalog), Arc::new(fallback), directory()).with_rng_seed(7)
    }

    fn romance_listing() -> Vec<AnimeRecord> {
        vec![
            anime("Toradora!", 1, Some(25), Some(8.1)),
            anime("Kaguya-sama: Love is War", 2, Some(12), Some(8.4)),
            anime("Kaguya-sama: Love is War Season 2", 3, Some(12), Some(8.6)),
            anime("Tsurezure Children", 4, Some(12), Some(7.1)),
            anime("Kimi ni Todoke", 5, Some(25), Some(7.9)),
            anime("Upcoming Romance", 6, None, None),
            anime("Just Because!", 7, Some(12), Some(7.6)),
        ]
    }

    #[tokio::test]
    async fn test_romance_under_20_uses_genre_listing_and_episode_filter() {
        let mut catalog = MockAnimeCatalog::new();
        catalog
            .expect_fetch_by_genre()
            .withf(|genre_id, pages| *genre_id == 22 && *pages == 2)
            .times(1)
            .returning(|_, _| Ok(romance_listing()));
        catalog.expect_search().never();
        catalog.expect_top().never();
        let mut fallback = MockFallbackCatalog::new();
        fallback.expect_search().never();

        let results = recommender(catalog, fallback)
            .recommend_anime("romance under 20")
            .await
            .unwrap();

        let titles: Vec<&str> = results.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(
            titles,
            vec!["Kaguya-sama: Love is War", "Just Because!", "Tsurezure Children"]
        );
    }

    #[tokio::test]
    async fn test_action_hidden_gem_keeps_only_low_scores() {
        let mut catalog = MockAnimeCatalog::new();
        catalog.expect_fetch_by_genre().times(1).returning(|_, _| {
            Ok(vec![
                anime("Cowboy Bebop", 1, Some(26), Some(8.8)),
                anime("Hand Shakers", 2, Some(12), Some(4.9)),
                anime("Dimension W", 3, Some(12), Some(6.9)),
                anime("Unknown Score", 4, Some(12), None),
                anime("Seven Exactly", 5, Some(12), Some(7.0)),
            ])
        });
        let fallback = MockFallbackCatalog::new();

        let results = recommender(catalog, fallback)
            .recommend_anime("action hidden gem")
            .await
            .unwrap();

        let titles: Vec<&str> = results.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["Dimension W", "Hand Shakers"]);
    }

    #[tokio::test]
    async fn test_multiple_genres_are_concatenated() {
        let mut catalog = MockAnimeCatalog::new();
        catalog
            .expect_fetch_by_genre()
            .withf(|genre_id, _| *genre_id == 1)
            .times(1)
            .returning(|_, _| Ok(vec![anime("Trigun", 1, Some(26), Some(8.2))]));
        catalog
            .expect_fetch_by_genre()
            .withf(|genre_id, _| *genre_id == 4)
            .times(1)
            .returning(|_, _| Ok(vec![anime("Nichijou", 2, Some(26), Some(8.5))]));
        let fallback = MockFallbackCatalog::new();

        let results = recommender(catalog, fallback)
            .recommend_anime("action comedy")
            .await
            .unwrap();

        let titles: Vec<&str> = results.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["Nichijou", "Trigun"]);
    }

    #[tokio::test]
    async fn test_unmatched_query_uses_primary_search() {
        let mut catalog = MockAnimeCatalog::new();
        catalog
            .expect_search()
            .withf(|query, pages| query == "cowboy bebop" && *pages == 1)
            .times(1)
            .returning(|_, _| Ok(vec![anime("Cowboy Bebop", 1, Some(26), Some(8.8))]));
        catalog.expect_fetch_by_genre().never();
        let mut fallback = MockFallbackCatalog::new();
        fallback.expect_search().never();

        let results = recommender(catalog, fallback)
            .recommend_anime("  cowboy bebop ")
            .await
            .unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].url, "https://myanimelist.net/anime/1");
    }

    #[tokio::test]
    async fn test_empty_primary_search_falls_back_to_secondary_catalog() {
        let mut catalog = MockAnimeCatalog::new();
        catalog.expect_search().times(1).returning(|_, _| Ok(vec![]));
        catalog.expect_top().never();
        let mut fallback = MockFallbackCatalog::new();
        fallback
            .expect_search()
            .withf(|query, per_page| query == "kaiba" && *per_page == 10)
            .times(1)
            .returning(|_, _| {
                Ok(vec![AnimeRecord {
                    title: "Kaiba".to_string(),
                    url: "https://anilist.co/anime/5081".to_string(),
                    episodes: Some(12),
                    score: Some(7.8),
                }])
            });

        let results = recommender(catalog, fallback)
            .recommend_anime("kaiba")
            .await
            .unwrap();

        assert_eq!(
            results,
            vec![Recommendation {
                title: "Kaiba".to_string(),
                url: "https://anilist.co/anime/5081".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn test_everything_empty_falls_through_to_trending() {
        let mut catalog = MockAnimeCatalog::new();
        catalog.expect_search().times(1).returning(|_, _| Ok(vec![]));
        catalog
            .expect_top()
            .withf(|pages| *pages == 2)
            .times(1)
            .returning(|_| Ok(vec![anime("Frieren", 1, Some(28), Some(9.3))]));
        let mut fallback = MockFallbackCatalog::new();
        fallback.expect_search().times(1).returning(|_, _| Ok(vec![]));

        let results = recommender(catalog, fallback)
            .recommend_anime("zzzz qqqq")
            .await
            .unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].title, "Frieren");
    }

    #[tokio::test]
    async fn test_empty_genre_listing_skips_primary_search() {
        let mut catalog = MockAnimeCatalog::new();
        catalog.expect_fetch_by_genre().times(1).returning(|_, _| Ok(vec![]));
        catalog.expect_search().never();
        catalog.expect_top().never();
        let mut fallback = MockFallbackCatalog::new();
        fallback
            .expect_search()
            .withf(|query, _| query == "romance")
            .times(1)
            .returning(|_, _| Ok(vec![anime("Clannad", 1, Some(23), Some(8.0))]));

        let results = recommender(catalog, fallback)
            .recommend_anime("romance")
            .await
            .unwrap();

        assert_eq!(results[0].title, "Clannad");
    }

    #[tokio::test]
    async fn test_empty_query_goes_straight_to_trending() {
        let mut catalog = MockAnimeCatalog::new();
        catalog.expect_search().never();
        catalog.expect_fetch_by_genre().never();
        catalog
            .expect_top()
            .times(1)
            .returning(|_| Ok(vec![anime("Steins;Gate", 1, Some(24), Some(9.1))]));
        let mut fallback = MockFallbackCatalog::new();
        fallback.expect_search().never();

        let results = recommender(catalog, fallback)
            .recommend_anime("   ")
            .await
            .unwrap();

        assert_eq!(results.len(), 1);
    }

    #[tokio::test]
    async fn test_everything_empty_returns_no_results() {
        let mut catalog = MockAnimeCatalog::new();
        catalog.expect_top().times(1).returning(|_| Ok(vec![]));
        let fallback = MockFallbackCatalog::new();

        let results = recommender(catalog, fallback)
            .recommend_anime("")
            .await
            .unwrap();

        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_error_propagates_without_fallback() {
        let mut catalog = MockAnimeCatalog::new();
        catalog.expect_search().times(1).returning(|_, _| {
            Err(AppError::ExternalApi(
                "Jikan API returned status 503".to_string(),
            ))
        });
        catalog.expect_top().never();
        let mut fallback = MockFallbackCatalog::new();
        fallback.expect_search().never();

        let result = recommender(catalog, fallback)
            .recommend_anime("monster")
            .await;

        assert!(matches!(result, Err(AppError::ExternalApi(_))));
    }

    #[tokio::test]
    async fn test_results_are_deduplicated_and_bounded() {
        let mut listing = Vec::new();
        for i in 0..30u32 {
            listing.push(anime(&format!("Show {}", i), i, Some(12), Some(f64::from(i) / 4.0)));
        }
        // Same url as "Show 29"
        listing.push(anime("Show 29 Mirror", 29, Some(12), Some(9.9)));
        // Same base title as "Show 28"
        listing.push(AnimeRecord {
            title: "Show 28: Second Season".to_string(),
            url: "https://myanimelist.net/anime/999".to_string(),
            episodes: Some(12),
            score: Some(9.8),
        });

        let mut catalog = MockAnimeCatalog::new();
        catalog
            .expect_fetch_by_genre()
            .returning(move |_, _| Ok(listing.clone()));
        let fallback = MockFallbackCatalog::new();

        let results = recommender(catalog, fallback)
            .recommend_anime("action")
            .await
            .unwrap();

        assert_eq!(results.len(), MAX_RECOMMENDATIONS);
        assert_eq!(results[0].title, "Show 29");
        assert_eq!(results[1].title, "Show 28");

        let urls: HashSet<&str> = results.iter().map(|r| r.url.as_str()).collect();
        assert_eq!(urls.len(), results.len());
        assert!(results.iter().all(|r| !r.title.is_empty() && !r.url.is_empty()));
    }

    #[tokio::test]
    async fn test_default_recs_are_top_ten_by_score() {
        let mut catalog = MockAnimeCatalog::new();
        catalog.expect_top().times(1).returning(|_| {
            Ok((0..25u32)
                .map(|i| anime(&format!("Top {}", i), i, Some(12), Some(f64::from(i))))
                .collect())
        });
        let fallback = MockFallbackCatalog::new();

        let results = recommender(catalog, fallback)
            .get_default_recs()
            .await
            .unwrap();

        let titles: Vec<String> = results.into_iter().map(|r| r.title).collect();
        let expected: Vec<String> = (15..25u32).rev().map(|i| format!("Top {}", i)).collect();
        assert_eq!(titles, expected);
    }

    #[test]
    fn test_parse_user_request_delegates_to_parser() {
        let rec = recommender(MockAnimeCatalog::new(), MockFallbackCatalog::new());
        let intent = rec.parse_user_request("comedy hidden gem under 13");
        assert_eq!(intent.genres, vec!["comedy".to_string()]);
        assert_eq!(intent.max_episodes, Some(13));
        assert_eq!(intent.rating_pref, Some(RatingPreference::HiddenGem));
        assert_eq!(rec.genres().len(), 3);
    }

    #[test]
    fn test_dedupe_by_url_keeps_first() {
        let records = vec![
            anime("First", 1, None, Some(5.0)),
            anime("Second", 1, None, Some(9.0)),
            anime("Third", 2, None, None),
        ];
        let titles: Vec<String> = dedupe_by_url(records).into_iter().map(|r| r.title).collect();
        assert_eq!(titles, vec!["First", "Third"]);
    }

    #[test]
    fn test_dedupe_by_base_title_merges_seasons() {
        let records = vec![
            anime("Mob Psycho 100", 1, None, None),
            anime("Mob Psycho 100: Season 2", 2, None, None),
            anime("mob psycho 100 - OVA", 3, None, None),
            anime("One Punch Man", 4, None, None),
        ];
        let titles: Vec<String> = dedupe_by_base_title(records)
            .into_iter()
            .map(|r| r.title)
            .collect();
        assert_eq!(titles, vec!["Mob Psycho 100", "One Punch Man"]);
    }

    #[test]
    fn test_rank_sorts_descending_with_missing_scores_last() {
        let records = vec![
            anime("Unscored", 1, None, None),
            anime("Middle", 2, None, Some(7.0)),
            anime("Best", 3, None, Some(9.0)),
            anime("Worst", 4, None, Some(0.5)),
        ];
        let mut rng = StdRng::seed_from_u64(42);
        let titles: Vec<String> = rank(records, &mut rng).into_iter().map(|r| r.title).collect();
        assert_eq!(titles, vec!["Best", "Middle", "Worst", "Unscored"]);
    }

    #[test]
    fn test_rank_is_deterministic_for_fixed_seed() {
        let records: Vec<AnimeRecord> = (0..20u32)
            .map(|i| anime(&format!("Tie {}", i), i, None, Some(8.0)))
            .collect();

        let first = rank(records.clone(), &mut StdRng::seed_from_u64(3));
        let second = rank(records, &mut StdRng::seed_from_u64(3));
        assert_eq!(first, second);
        assert_eq!(first.len(), MAX_RECOMMENDATIONS);
    }
}

/// AniList GraphQL provider
///
/// Used only as a search fallback when the primary catalog has nothing for a
/// query. Results are cached on disk by lowercase query text. AniList reports
/// `averageScore` on a 0-100 scale; records are rescaled to 0-10 on decode.
use crate::{
    cached,
    db::{CacheKey, JsonCache},
    error::{AppError, AppResult},
    models::{AniListResponse, AnimeRecord},
    services::providers::FallbackCatalog,
};
use reqwest::Client as HttpClient;
use serde_json::json;

const PROVIDER_NAME: &str = "anilist";

const SEARCH_QUERY: &str = r#"
query ($search: String, $perPage: Int) {
  Page(perPage: $perPage) {
    media(search: $search, type: ANIME) {
      title { romaji }
      siteUrl
      averageScore
      episodes
    }
  }
}
"#;

#[derive(Clone)]
pub struct AniListProvider {
    http_client: HttpClient,
    api_url: String,
    cache: JsonCache,
}

impl AniListProvider {
    pub fn new(cache: JsonCache, api_url: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_url,
            cache,
        }
    }

    async fn query_media(&self, query: &str, per_page: u32) -> AppResult<Vec<AnimeRecord>> {
        let body = json!({
            "query": SEARCH_QUERY,
            "variables": { "search": query, "perPage": per_page },
        });

        let response = self
            .http_client
            .post(&self.api_url)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "AniList API returned status {}: {}",
                status, body
            )));
        }

        let payload: AniListResponse = response.json().await?;
        let records: Vec<AnimeRecord> = payload
            .data
            .page
            .media
            .into_iter()
            .map(AnimeRecord::from)
            .filter(AnimeRecord::is_displayable)
            .collect();

        Ok(records)
    }
}

#[async_trait::async_trait]
impl FallbackCatalog for AniListProvider {
    #[tracing::instrument(skip(self), fields(provider = PROVIDER_NAME))]
    async fn search(&self, query: &str, per_page: u32) -> AppResult<Vec<AnimeRecord>> {
        if query.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "Search query cannot be empty".to_string(),
            ));
        }

        cached!(
            self.cache,
            CacheKey::AniListSearch(query.to_string()),
            async move {
                let records = self.query_media(query, per_page).await?;

                tracing::info!(
                    query = %query,
                    results = records.len(),
                    provider = PROVIDER_NAME,
                    "Fallback search completed"
                );

                Ok::<_, AppError>(records)
            }
        )
    }

    fn name(&self) -> &'static str {
        PROVIDER_NAME
    }
}

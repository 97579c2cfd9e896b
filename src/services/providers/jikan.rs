/// Jikan (MyAnimeList) API provider
///
/// Endpoints used:
/// 1. Genres: /genres/anime → name + mal_id for the genre directory
/// 2. By genre: /anime?genres={id}&page={n} (cached on disk)
/// 3. Search: /anime?q={query}&page={n}
/// 4. Top: /top/anime?page={n}
use crate::{
    cached,
    db::{CacheKey, JsonCache},
    error::{AppError, AppResult},
    models::{AnimeRecord, GenreDirectory, JikanGenre, JikanPage},
    services::providers::{AnimeCatalog, PAGE_DELAY},
};
use reqwest::Client as HttpClient;
use std::sync::Arc;
use tokio::{sync::Mutex, time::Instant};

const PROVIDER_NAME: &str = "jikan";

#[derive(Clone)]
pub struct JikanProvider {
    http_client: HttpClient,
    api_url: String,
    genre_cache: JsonCache,
    /// When the last request went out; shared by clones so every caller is paced
    last_request: Arc<Mutex<Option<Instant>>>,
}

impl JikanProvider {
    pub fn new(genre_cache: JsonCache, api_url: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_url: api_url.trim_end_matches('/').to_string(),
            genre_cache,
            last_request: Arc::new(Mutex::new(None)),
        }
    }

    /// Waits until at least [`PAGE_DELAY`] has passed since the previous request
    ///
    /// Applies across fetches, so consecutive by-genre listings or a search
    /// followed by a top listing are spaced the same way as pages are.
    async fn pace(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(previous) = *last {
            let ready_at = previous + PAGE_DELAY;
            if Instant::now() < ready_at {
                tracing::debug!(
                    wait_ms = (ready_at - Instant::now()).as_millis() as u64,
                    provider = PROVIDER_NAME,
                    "Pacing request"
                );
                tokio::time::sleep_until(ready_at).await;
            }
        }
        *last = Some(Instant::now());
    }

    /// Issues a single GET and decodes the `data` envelope
    async fn get_data<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> AppResult<Vec<T>> {
        let url = format!("{}{}", self.api_url, path);

        self.pace().await;
        let response = self.http_client.get(&url).query(params).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "Jikan API returned status {}: {}",
                status, body
            )));
        }

        let page: JikanPage<T> = response.json().await?;
        Ok(page.data)
    }

    /// Fetches pages 1..=pages sequentially
    async fn paginate(
        &self,
        path: &str,
        params: &[(&str, String)],
        pages: u32,
    ) -> AppResult<Vec<AnimeRecord>> {
        let mut all_data = Vec::new();

        for page in 1..=pages {
            let mut page_params = params.to_vec();
            page_params.push(("page", page.to_string()));

            let records: Vec<AnimeRecord> = self.get_data(path, &page_params).await?;
            tracing::debug!(
                path = %path,
                page = page,
                results = records.len(),
                provider = PROVIDER_NAME,
                "Fetched page"
            );
            all_data.extend(records.into_iter().filter(AnimeRecord::is_displayable));
        }

        Ok(all_data)
    }
}

#[async_trait::async_trait]
impl AnimeCatalog for JikanProvider {
    async fn fetch_genres(&self) -> AppResult<GenreDirectory> {
        let genres: Vec<JikanGenre> = self.get_data("/genres/anime", &[]).await?;
        let directory = GenreDirectory::from(genres);

        tracing::info!(
            genres = directory.len(),
            provider = PROVIDER_NAME,
            "Loaded genre directory"
        );

        Ok(directory)
    }

    #[tracing::instrument(skip(self), fields(provider = PROVIDER_NAME))]
    async fn fetch_by_genre(&self, genre_id: u32, pages: u32) -> AppResult<Vec<AnimeRecord>> {
        cached!(
            self.genre_cache,
            CacheKey::Genre { genre_id, pages },
            async move {
                let records = self
                    .paginate("/anime", &[("genres", genre_id.to_string())], pages)
                    .await?;

                tracing::info!(
                    genre_id = genre_id,
                    pages = pages,
                    results = records.len(),
                    provider = PROVIDER_NAME,
                    "Genre listing completed"
                );

                Ok::<_, AppError>(records)
            }
        )
    }

    #[tracing::instrument(skip(self), fields(provider = PROVIDER_NAME))]
    async fn search(&self, query: &str, pages: u32) -> AppResult<Vec<AnimeRecord>> {
        if query.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "Search query cannot be empty".to_string(),
            ));
        }

        let records = self
            .paginate("/anime", &[("q", query.to_string())], pages)
            .await?;

        tracing::info!(
            query = %query,
            results = records.len(),
            provider = PROVIDER_NAME,
            "Title search completed"
        );

        Ok(records)
    }

    #[tracing::instrument(skip(self), fields(provider = PROVIDER_NAME))]
    async fn top(&self, pages: u32) -> AppResult<Vec<AnimeRecord>> {
        let records = self.paginate("/top/anime", &[], pages).await?;

        tracing::info!(
            pages = pages,
            results = records.len(),
            provider = PROVIDER_NAME,
            "Top listing completed"
        );

        Ok(records)
    }

    fn name(&self) -> &'static str {
        PROVIDER_NAME
    }
}

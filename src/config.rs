use serde::Deserialize;
use std::path::PathBuf;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Jikan (MyAnimeList) REST API base URL
    #[serde(default = "default_jikan_api_url")]
    pub jikan_api_url: String,

    /// AniList GraphQL endpoint
    #[serde(default = "default_anilist_api_url")]
    pub anilist_api_url: String,

    /// Directory holding the JSON cache files
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_jikan_api_url() -> String {
    "https://api.jikan.moe/v4".to_string()
}

fn default_anilist_api_url() -> String {
    "https://graphql.anilist.co".to_string()
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_iter(std::env::vars())
    }

    /// Build configuration from an explicit set of variables
    pub fn from_iter<I>(vars: I) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        envy::from_iter::<_, Config>(vars).map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    /// Path of the by-genre cache file
    pub fn genre_cache_path(&self) -> PathBuf {
        self.cache_dir.join("genre_cache.json")
    }

    /// Path of the AniList search cache file
    pub fn anilist_cache_path(&self) -> PathBuf {
        self.cache_dir.join("anilist_cache.json")
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_apply_when_unset() {
        let config = Config::from_iter(Vec::<(String, String)>::new()).unwrap();
        assert_eq!(config.jikan_api_url, "https://api.jikan.moe/v4");
        assert_eq!(config.anilist_api_url, "https://graphql.anilist.co");
        assert_eq!(config.bind_address(), "127.0.0.1:3000");
        assert_eq!(config.genre_cache_path(), PathBuf::from("data/genre_cache.json"));
        assert_eq!(
            config.anilist_cache_path(),
            PathBuf::from("data/anilist_cache.json")
        );
    }

    #[test]
    fn test_overrides_from_vars() {
        let vars = vec![
            ("PORT".to_string(), "8080".to_string()),
            ("CACHE_DIR".to_string(), "/tmp/oracle".to_string()),
        ];
        let config = Config::from_iter(vars).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.cache_dir, PathBuf::from("/tmp/oracle"));
    }

    #[test]
    fn test_invalid_port_is_rejected() {
        let vars = vec![("PORT".to_string(), "not-a-port".to_string())];
        assert!(Config::from_iter(vars).is_err());
    }
}

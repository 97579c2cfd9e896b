use std::collections::HashMap;

use super::JikanGenre;

/// Lowercase genre name → MyAnimeList genre id
///
/// Loaded once at startup and shared read-only between the intent parser and
/// the recommender.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenreDirectory {
    ids: HashMap<String, u32>,
}

impl GenreDirectory {
    /// Builds a directory from (name, id) pairs, lowercasing every name
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, u32)>,
        S: AsRef<str>,
    {
        let ids = entries
            .into_iter()
            .map(|(name, id)| (name.as_ref().trim().to_lowercase(), id))
            .filter(|(name, _)| !name.is_empty())
            .collect();

        Self { ids }
    }

    /// Looks up the id for an already-lowercased key
    pub fn id(&self, key: &str) -> Option<u32> {
        self.ids.get(key).copied()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.ids.contains_key(key)
    }

    /// All directory keys in alphabetical order
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.ids.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl From<Vec<JikanGenre>> for GenreDirectory {
    fn from(genres: Vec<JikanGenre>) -> Self {
        Self::new(genres.into_iter().map(|g| (g.name, g.mal_id)))
    }
}

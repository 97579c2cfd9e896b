/// Free-text intent parsing
///
/// Turns a query such as "romance under 20" or "hidden gem action" into a
/// [`ParsedIntent`]: matched genre keys, an optional episode ceiling and an
/// optional rating preference.
///
/// Keyword extraction keeps content words (nouns, adjectives, numerals and the
/// comparison word "under") and drops function words. Single words come out in
/// sentence order, followed by multi-word phrases so that genres such as
/// "slice of life" or "award winning" can be matched as a unit.
use std::collections::HashSet;
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::{GenreDirectory, ParsedIntent, RatingPreference};

static WORD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[a-z0-9]+(?:['\-][a-z0-9]+)*").expect("valid word regex"));

/// Longest phrase, in words, considered for multi-word genre names
const MAX_PHRASE_WORDS: usize = 3;

const EPISODE_CEILING_MARKER: &str = "under";

/// Closed-class words and request verbs that never carry intent
const FUNCTION_WORDS: &[&str] = &[
    "a", "an", "the", "and", "or", "but", "nor", "so", "yet", "of", "in", "on", "at", "to",
    "for", "with", "without", "from", "by", "about", "into", "onto", "over", "than", "then",
    "as", "i", "me", "my", "mine", "we", "us", "our", "you", "your", "he", "she", "him", "her",
    "they", "them", "their", "it", "its", "is", "are", "was", "were", "be", "been", "being",
    "am", "do", "does", "did", "have", "has", "had", "will", "would", "can", "could", "should",
    "shall", "may", "might", "must", "this", "that", "these", "those", "what", "which", "who",
    "whom", "some", "any", "something", "anything", "please", "just", "really", "very", "too",
    "want", "wanna", "like", "need", "show", "shows", "give", "find", "recommend", "watch",
    "see", "looking", "look", "get", "i'm", "im", "let's", "not", "no",
];

fn is_function_word(word: &str) -> bool {
    FUNCTION_WORDS.contains(&word)
}

fn is_numeral(word: &str) -> bool {
    !word.is_empty() && word.chars().all(|c| c.is_ascii_digit())
}

/// Extracts intent keywords from free text
///
/// The returned collection has no duplicates, except that a numeral directly
/// after "under" is always kept there even if it appeared earlier ("top 10
/// under 10"). Single-word keywords keep the order they have in the text;
/// phrases follow them.
pub fn extract_keywords(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    let words: Vec<&str> = WORD_RE.find_iter(&lowered).map(|m| m.as_str()).collect();

    let mut seen = HashSet::new();
    let mut keywords = Vec::new();

    for word in words.iter().filter(|w| !is_function_word(w)) {
        let follows_marker = keywords
            .last()
            .is_some_and(|k: &String| k == EPISODE_CEILING_MARKER);
        if seen.insert(word.to_string()) || (follows_marker && is_numeral(word)) {
            keywords.push(word.to_string());
        }
    }

    for len in 2..=MAX_PHRASE_WORDS {
        for window in words.windows(len) {
            let (first, last) = (window[0], window[len - 1]);
            if is_function_word(first) || is_function_word(last) {
                continue;
            }
            let phrase = window.join(" ");
            if seen.insert(phrase.clone()) {
                keywords.push(phrase);
            }
        }
    }

    keywords
}

/// Parses free-text queries against a fixed genre directory
#[derive(Debug, Clone)]
pub struct IntentParser {
    genres: Arc<GenreDirectory>,
}

impl IntentParser {
    pub fn new(genres: Arc<GenreDirectory>) -> Self {
        Self { genres }
    }

    pub fn parse_user_request(&self, text: &str) -> ParsedIntent {
        let keywords = extract_keywords(text);

        let genres: Vec<String> = keywords
            .iter()
            .filter(|k| self.genres.contains(k))
            .cloned()
            .collect();

        let max_episodes = episode_ceiling(&keywords);

        let has = |word: &str| keywords.iter().any(|k| k == word);
        let rating_pref = (has("hidden") && has("gem")).then_some(RatingPreference::HiddenGem);

        let intent = ParsedIntent {
            genres,
            max_episodes,
            rating_pref,
        };

        tracing::debug!(
            query = %text,
            keywords = ?keywords,
            genres = ?intent.genres,
            max_episodes = ?intent.max_episodes,
            rating_pref = ?intent.rating_pref,
            "Parsed user request"
        );

        intent
    }
}

/// "under" immediately followed by a numeral in the keyword collection
fn episode_ceiling(keywords: &[String]) -> Option<u32> {
    let idx = keywords.iter().position(|k| k == EPISODE_CEILING_MARKER)?;
    let next = keywords.get(idx + 1)?;
    if !is_numeral(next) {
        return None;
    }
    next.parse().ok()
}

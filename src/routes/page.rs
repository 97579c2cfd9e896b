/// The browser-facing recommendation form
///
/// A single GET form: pick genres from the directory, type a free-text query,
/// or click one of the canned suggestions. Selected genres win over the text
/// box; with neither, the page shows the trending picks.
use std::fmt::Write;
use std::sync::Arc;

use axum::{
    extract::State,
    response::{Html, IntoResponse, Response},
    Extension,
};
use axum_extra::extract::Query;
use serde::Deserialize;

use crate::{
    error::AppResult, middleware::request_id::RequestId, models::Recommendation,
    routes::AppState,
};

/// Canned queries offered as one-click buttons
pub const SUGGESTIONS: [&str; 4] = [
    "action hidden gem",
    "romance under 20",
    "comedy short",
    "dark thriller",
];

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    #[serde(default)]
    pub genre: Vec<String>,
    #[serde(default)]
    pub q: String,
}

/// What the page was asked to show
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    Genres(Vec<String>),
    Text(String),
    Trending,
}

impl Selection {
    pub fn from_query(params: &PageQuery) -> Self {
        let genres: Vec<String> = params
            .genre
            .iter()
            .map(|g| g.trim().to_string())
            .filter(|g| !g.is_empty())
            .collect();
        let text = params.q.trim();

        if !genres.is_empty() {
            Selection::Genres(genres)
        } else if !text.is_empty() {
            Selection::Text(text.to_string())
        } else {
            Selection::Trending
        }
    }

    pub fn heading(&self) -> String {
        match self {
            Selection::Genres(genres) => {
                format!("Recommendations for genre(s): {}", genres.join(", "))
            }
            Selection::Text(text) => format!("Recommendations for '{}'", text),
            Selection::Trending => "🔥 Trending Picks to Get You Started".to_string(),
        }
    }
}

/// Handler for the HTML page
pub async fn index(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Query(params): Query<PageQuery>,
) -> Response {
    let selection = Selection::from_query(&params);

    tracing::info!(
        request_id = %request_id,
        selection = ?selection,
        "Rendering recommendation page"
    );

    let result: AppResult<Vec<Recommendation>> = match &selection {
        Selection::Genres(genres) => state.recommender.recommend_anime(&genres.join(" ")).await,
        Selection::Text(text) => state.recommender.recommend_anime(text).await,
        Selection::Trending => state.recommender.get_default_recs().await,
    };

    let genre_names = state.recommender.genres().names();

    match result {
        Ok(recommendations) => Html(render_page(
            &genre_names,
            &params,
            &selection,
            Ok(recommendations.as_slice()),
        ))
        .into_response(),
        Err(e) => {
            tracing::error!(request_id = %request_id, error = %e, "Recommendation page failed");
            let status = e.status_code();
            let message = e.to_string();
            (
                status,
                Html(render_page(&genre_names, &params, &selection, Err(message.as_str()))),
            )
                .into_response()
        }
    }
}

/// Renders the full page
pub fn render_page(
    genre_names: &[String],
    params: &PageQuery,
    selection: &Selection,
    results: Result<&[Recommendation], &str>,
) -> String {
    let mut html = String::new();

    html.push_str(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>OtakuOracle</title>\n</head>\n<body>\n<h1>🔮 OtakuOracle</h1>\n\
         <p>Select genre(s), enter what you’re in the mood for, or pick one of the suggestions below:</p>\n",
    );

    html.push_str("<form method=\"get\" action=\"/\">\n");
    html.push_str("<label for=\"genre\">Pick anime genre(s)</label>\n");
    html.push_str("<select id=\"genre\" name=\"genre\" multiple>\n");
    for name in genre_names {
        let selected = if params.genre.iter().any(|g| g.trim() == name.as_str()) {
            " selected"
        } else {
            ""
        };
        let _ = writeln!(
            html,
            "<option value=\"{0}\"{1}>{0}</option>",
            escape_html(name),
            selected
        );
    }
    html.push_str("</select>\n");
    let _ = writeln!(
        html,
        "<input type=\"text\" name=\"q\" value=\"{}\" \
         placeholder=\"Or type a custom query (e.g. 'under 20 episodes', 'hidden gem action')\">",
        escape_html(&params.q)
    );
    html.push_str("<button type=\"submit\">Recommend</button>\n</form>\n");

    // Suggestions submit their own form; carry the genre selection along
    let kept_genres: String = params
        .genre
        .iter()
        .map(|g| g.trim())
        .filter(|g| !g.is_empty())
        .map(|g| format!("<input type=\"hidden\" name=\"genre\" value=\"{}\">", escape_html(g)))
        .collect();

    html.push_str("<div class=\"suggestions\">\n");
    for suggestion in SUGGESTIONS {
        let _ = writeln!(
            html,
            "<form method=\"get\" action=\"/\">{1}<button type=\"submit\" name=\"q\" value=\"{0}\">{0}</button></form>",
            escape_html(suggestion),
            kept_genres
        );
    }
    html.push_str("</div>\n");

    let _ = writeln!(html, "<h2>{}</h2>", escape_html(&selection.heading()));

    match results {
        Ok([]) => html.push_str("<p>No results found.</p>\n"),
        Ok(recommendations) => {
            html.push_str("<ol>\n");
            for rec in recommendations {
                let _ = writeln!(
                    html,
                    "<li><strong>{}</strong> — <a href=\"{}\">More Info</a></li>",
                    escape_html(&rec.title),
                    escape_html(&rec.url)
                );
            }
            html.push_str("</ol>\n");
        }
        Err(message) => {
            let _ = writeln!(
                html,
                "<p class=\"error\">Something went wrong: {}</p>",
                escape_html(message)
            );
        }
    }

    html.push_str("</body>\n</html>\n");
    html
}

/// Escapes text for use in HTML bodies and double-quoted attributes
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

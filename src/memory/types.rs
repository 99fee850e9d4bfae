//! Types for memory records and their composition.

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Title used when neither the analyzer nor the caller provided one.
pub const UNTITLED_MEMORY: &str = "Untitled Memory";

/// Records are stamped in the product's home timezone, UTC+05:30.
const IST_OFFSET_SECS: i32 = 5 * 3600 + 30 * 60;

/// Current time in the fixed +05:30 offset.
pub fn ist_now() -> DateTime<FixedOffset> {
    let offset = FixedOffset::east_opt(IST_OFFSET_SECS).unwrap();
    Utc::now().with_timezone(&offset)
}

/// Structured output of the analyzer collaborator.
///
/// Every field may be absent; the composer fills in defaults. Keys the
/// analyzer invents beyond the schema land in `extra` instead of being
/// dropped, and are carried into the persisted record.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnalysisResult {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub keywords: Option<Vec<String>>,
    #[serde(default)]
    pub emotions: Option<Vec<String>>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub source_url: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// Content-type tag derived from the captured URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Youtube,
    Linkedin,
    Twitter,
    Reddit,
    Github,
    Pdf,
    Article,
    Text,
}

impl ContentType {
    /// Derive the tag from a URL.
    ///
    /// Case-insensitive; host patterns are tried in a fixed priority
    /// order and the first match wins. Unmatched non-empty URLs are
    /// `Article`; no URL at all is `Text`.
    pub fn from_url(url: Option<&str>) -> Self {
        let Some(url) = url else {
            return Self::Text;
        };
        let u = url.to_lowercase();
        if u.contains("youtube.com") || u.contains("youtu.be") {
            return Self::Youtube;
        }
        if u.contains("linkedin.com") {
            return Self::Linkedin;
        }
        if u.contains("twitter.com") || u.contains("x.com") {
            return Self::Twitter;
        }
        if u.contains("reddit.com") {
            return Self::Reddit;
        }
        if u.contains("github.com") {
            return Self::Github;
        }
        if u.ends_with(".pdf") {
            return Self::Pdf;
        }
        Self::Article
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Youtube => write!(f, "youtube"),
            Self::Linkedin => write!(f, "linkedin"),
            Self::Twitter => write!(f, "twitter"),
            Self::Reddit => write!(f, "reddit"),
            Self::Github => write!(f, "github"),
            Self::Pdf => write!(f, "pdf"),
            Self::Article => write!(f, "article"),
            Self::Text => write!(f, "text"),
        }
    }
}

/// The persisted memory record.
///
/// Composed once per successful pipeline run and immutable afterwards;
/// only the dashboard ever flips `favorite`, never this service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryRecord {
    pub title: String,
    pub summary: String,
    pub keywords: Vec<String>,
    pub emotions: Vec<String>,
    /// Timestamp of the source content, per the analyzer.
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    pub url: Option<String>,
    pub original_url: Option<String>,
    #[serde(rename = "type")]
    pub kind: ContentType,
    /// When this record was created, in +05:30.
    pub created_at: String,
    pub favorite: bool,
    /// Reserved for scraper metadata; empty at creation.
    pub scrape_metadata: String,
    /// Reserved for the raw captured content; empty at creation.
    pub full_content: String,
    /// Analyzer keys outside the fixed schema, carried as-is.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl MemoryRecord {
    /// Merge an analysis with the original request into the final record.
    ///
    /// Title precedence: analyzer title, then `fallback_title` from the
    /// caller, then [`UNTITLED_MEMORY`]. Empty strings count as absent.
    /// `created_at` is stamped here, independent of any analyzer timestamp.
    pub fn compose(
        analysis: AnalysisResult,
        url: Option<&str>,
        fallback_title: Option<&str>,
    ) -> Self {
        let title = non_empty(analysis.title)
            .or_else(|| non_empty(fallback_title.map(str::to_string)))
            .unwrap_or_else(|| UNTITLED_MEMORY.to_string());

        let timestamp = non_empty(analysis.timestamp).unwrap_or_else(|| ist_now().to_rfc3339());

        Self {
            title,
            summary: analysis.summary.unwrap_or_default(),
            keywords: analysis.keywords.unwrap_or_default(),
            emotions: analysis.emotions.unwrap_or_default(),
            timestamp,
            source_url: analysis.source_url,
            url: url.map(str::to_string),
            original_url: url.map(str::to_string),
            kind: ContentType::from_url(url),
            created_at: ist_now().to_rfc3339(),
            favorite: false,
            scrape_metadata: String::new(),
            full_content: String::new(),
            extra: analysis.extra,
        }
    }
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.filter(|s| !s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derive_type_matches_known_hosts() {
        assert_eq!(
            ContentType::from_url(Some("https://youtu.be/abc")),
            ContentType::Youtube
        );
        assert_eq!(
            ContentType::from_url(Some("https://www.YouTube.com/watch?v=abc")),
            ContentType::Youtube
        );
        assert_eq!(
            ContentType::from_url(Some("https://www.linkedin.com/in/someone")),
            ContentType::Linkedin
        );
        assert_eq!(
            ContentType::from_url(Some("https://x.com/user/status/1")),
            ContentType::Twitter
        );
        assert_eq!(
            ContentType::from_url(Some("https://old.reddit.com/r/rust")),
            ContentType::Reddit
        );
        assert_eq!(
            ContentType::from_url(Some("https://github.com/owner/repo")),
            ContentType::Github
        );
        assert_eq!(
            ContentType::from_url(Some("https://example.com/paper.pdf")),
            ContentType::Pdf
        );
    }

    #[test]
    fn derive_type_defaults() {
        assert_eq!(
            ContentType::from_url(Some("https://example.com/post")),
            ContentType::Article
        );
        assert_eq!(ContentType::from_url(None), ContentType::Text);
    }

    #[test]
    fn derive_type_first_match_wins() {
        // A PDF hosted on GitHub resolves by host priority, not extension.
        assert_eq!(
            ContentType::from_url(Some("https://github.com/owner/repo/raw/main/doc.pdf")),
            ContentType::Github
        );
    }

    #[test]
    fn content_type_serializes_lowercase() {
        assert_eq!(
            serde_json::to_value(ContentType::Youtube).unwrap(),
            serde_json::json!("youtube")
        );
        assert_eq!(ContentType::Article.to_string(), "article");
    }

    #[test]
    fn title_precedence_analyzer_first() {
        let analysis = AnalysisResult {
            title: Some("From Analyzer".to_string()),
            ..Default::default()
        };
        let record = MemoryRecord::compose(analysis, None, Some("My Note"));
        assert_eq!(record.title, "From Analyzer");
    }

    #[test]
    fn title_precedence_falls_back_to_caller() {
        let record = MemoryRecord::compose(AnalysisResult::default(), None, Some("My Note"));
        assert_eq!(record.title, "My Note");
    }

    #[test]
    fn title_precedence_treats_empty_as_absent() {
        let analysis = AnalysisResult {
            title: Some("   ".to_string()),
            ..Default::default()
        };
        let record = MemoryRecord::compose(analysis, None, Some("My Note"));
        assert_eq!(record.title, "My Note");

        let record = MemoryRecord::compose(AnalysisResult::default(), None, None);
        assert_eq!(record.title, UNTITLED_MEMORY);
    }

    #[test]
    fn compose_stamps_created_at_in_ist() {
        let record = MemoryRecord::compose(AnalysisResult::default(), None, None);
        assert!(record.created_at.ends_with("+05:30"));
        assert!(!record.favorite);
    }

    #[test]
    fn compose_keeps_analyzer_timestamp_for_source() {
        let analysis = AnalysisResult {
            timestamp: Some("2020-01-01T00:00:00+05:30".to_string()),
            ..Default::default()
        };
        let record = MemoryRecord::compose(analysis, None, None);
        assert_eq!(record.timestamp, "2020-01-01T00:00:00+05:30");
        // created_at is stamped now, not taken from the analyzer.
        assert_ne!(record.created_at, record.timestamp);
    }

    #[test]
    fn compose_carries_url_and_type() {
        let record = MemoryRecord::compose(
            AnalysisResult::default(),
            Some("https://youtu.be/abc"),
            None,
        );
        assert_eq!(record.url.as_deref(), Some("https://youtu.be/abc"));
        assert_eq!(record.original_url.as_deref(), Some("https://youtu.be/abc"));
        assert_eq!(record.kind, ContentType::Youtube);
    }

    #[test]
    fn record_serializes_type_tag_and_flattens_extra() {
        let analysis: AnalysisResult = serde_json::from_str(
            r#"{"title": "T", "keywords": ["a"], "sentiment": "positive"}"#,
        )
        .unwrap();
        assert_eq!(
            analysis.extra.get("sentiment"),
            Some(&serde_json::json!("positive"))
        );

        let record = MemoryRecord::compose(analysis, Some("https://example.com/post"), None);
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["type"], "article");
        assert_eq!(value["sentiment"], "positive");
        assert_eq!(value["favorite"], false);
        assert_eq!(value["scrape_metadata"], "");
        assert_eq!(value["full_content"], "");
    }

    #[test]
    fn record_round_trips_through_json() {
        let record = MemoryRecord::compose(
            AnalysisResult {
                title: Some("T".to_string()),
                summary: Some("S".to_string()),
                keywords: Some(vec!["k".to_string()]),
                emotions: Some(vec!["calm".to_string()]),
                ..Default::default()
            },
            Some("https://example.com/post"),
            None,
        );

        let json = serde_json::to_string(&record).unwrap();
        let back: MemoryRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back.title, "T");
        assert_eq!(back.kind, ContentType::Article);
        assert_eq!(back.emotions, vec!["calm"]);
        assert!(!back.favorite);
    }
}

//! Video source capability: topic search and transcript fetching.
//!
//! The [`VideoSource`] trait is the seam between the pipelines and the
//! outside world; tests substitute stub sources. [`YouTubeSource`] is the
//! real implementation: Data API v3 `search.list` for discovery and the
//! timedtext caption endpoint for transcripts. A missing transcript is a
//! normal outcome (`Ok(None)`), not an error.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use crate::config::VideosConfig;
use crate::models::VideoHit;

/// Capability trait for discovering videos and fetching their transcripts.
#[async_trait]
pub trait VideoSource: Send + Sync {
    /// Search for recent videos matching `query`, most relevant first.
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<VideoHit>>;

    /// Fetch the transcript text for a video. `Ok(None)` when the video
    /// has no fetchable captions in any preferred language.
    async fn fetch_transcript(&self, video_id: &str) -> Result<Option<String>>;
}

/// YouTube-backed [`VideoSource`].
///
/// Requires the `YOUTUBE_API_KEY` environment variable for search.
pub struct YouTubeSource {
    client: reqwest::Client,
    api_key: String,
    recency_days: i64,
    region: String,
    languages: Vec<String>,
}

impl YouTubeSource {
    pub fn new(config: &VideosConfig) -> Result<Self> {
        let api_key = std::env::var("YOUTUBE_API_KEY")
            .context("YOUTUBE_API_KEY environment variable not set")?;

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            api_key,
            recency_days: config.recency_days,
            region: config.region.clone(),
            languages: config.languages.clone(),
        })
    }
}

#[async_trait]
impl VideoSource for YouTubeSource {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<VideoHit>> {
        let published_after = (Utc::now() - Duration::days(self.recency_days))
            .format("%Y-%m-%dT%H:%M:%SZ")
            .to_string();

        let response = self
            .client
            .get("https://www.googleapis.com/youtube/v3/search")
            .query(&[
                ("part", "snippet"),
                ("q", query),
                ("type", "video"),
                ("maxResults", &max_results.to_string()),
                ("order", "relevance"),
                ("publishedAfter", &published_after),
                ("regionCode", &self.region),
                ("relevanceLanguage", self.languages.first().map(String::as_str).unwrap_or("en")),
                ("key", &self.api_key),
            ])
            .send()
            .await
            .context("YouTube search request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("YouTube search API error {}: {}", status, body);
        }

        let json: serde_json::Value = response.json().await?;
        parse_search_response(&json)
    }

    async fn fetch_transcript(&self, video_id: &str) -> Result<Option<String>> {
        for lang in &self.languages {
            let response = self
                .client
                .get("https://video.google.com/timedtext")
                .query(&[("lang", lang.as_str()), ("v", video_id)])
                .send()
                .await
                .context("timedtext request failed")?;

            if !response.status().is_success() {
                continue;
            }

            let body = response.text().await.unwrap_or_default();
            if body.trim().is_empty() {
                // No caption track in this language.
                continue;
            }

            let text = parse_caption_xml(&body)?;
            if !text.is_empty() {
                return Ok(Some(text));
            }
        }

        Ok(None)
    }
}

/// Extract `(video_id, title, published_at)` triples from a `search.list`
/// response.
fn parse_search_response(json: &serde_json::Value) -> Result<Vec<VideoHit>> {
    let items = json
        .get("items")
        .and_then(|i| i.as_array())
        .ok_or_else(|| anyhow::anyhow!("Invalid search response: missing items array"))?;

    let mut hits = Vec::with_capacity(items.len());
    for item in items {
        let video_id = item
            .get("id")
            .and_then(|id| id.get("videoId"))
            .and_then(|v| v.as_str());
        let snippet = item.get("snippet");
        let title = snippet
            .and_then(|s| s.get("title"))
            .and_then(|t| t.as_str());

        // Non-video items (channels, playlists) carry no videoId; skip them.
        let (video_id, title) = match (video_id, title) {
            (Some(v), Some(t)) => (v, t),
            _ => continue,
        };

        let published_at: Option<DateTime<Utc>> = snippet
            .and_then(|s| s.get("publishedAt"))
            .and_then(|p| p.as_str())
            .and_then(|p| DateTime::parse_from_rfc3339(p).ok())
            .map(|dt| dt.with_timezone(&Utc));

        hits.push(VideoHit {
            video_id: video_id.to_string(),
            title: title.to_string(),
            published_at,
        });
    }

    Ok(hits)
}

/// Flatten a timedtext caption document into plain text.
///
/// The endpoint returns `<transcript><text start="…" dur="…">…</text>…`;
/// caption segments are joined with single spaces.
fn parse_caption_xml(xml: &str) -> Result<String> {
    use quick_xml::events::Event;
    use quick_xml::Reader;

    let mut reader = Reader::from_str(xml);
    let mut segments: Vec<String> = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Text(e)) => {
                let segment = e.unescape().unwrap_or_default().trim().to_string();
                if !segment.is_empty() {
                    segments.push(segment);
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => bail!("caption XML parse error: {}", e),
        }
    }

    Ok(segments.join(" "))
}

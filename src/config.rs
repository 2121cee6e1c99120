use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    #[serde(default)]
    pub completion: CompletionConfig,
    #[serde(default)]
    pub videos: VideosConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub research: ResearchConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

/// Completion capability settings. The API key is read from the
/// `OPENAI_API_KEY` environment variable; `base_url` may point at any
/// OpenAI-compatible endpoint (local models included).
#[derive(Debug, Deserialize, Clone)]
pub struct CompletionConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            max_retries: default_max_retries(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}
fn default_model() -> String {
    "gpt-4o-mini".to_string()
}
fn default_max_retries() -> u32 {
    3
}
fn default_timeout_secs() -> u64 {
    60
}

/// Video search settings. The API key is read from the `YOUTUBE_API_KEY`
/// environment variable.
#[derive(Debug, Deserialize, Clone)]
pub struct VideosConfig {
    #[serde(default = "default_max_results")]
    pub max_results: usize,
    /// Result cap for focused gap follow-up searches.
    #[serde(default = "default_focused_max_results")]
    pub focused_max_results: usize,
    /// Only consider videos published within this many days.
    #[serde(default = "default_recency_days")]
    pub recency_days: i64,
    #[serde(default = "default_region")]
    pub region: String,
    /// Preferred caption languages, in priority order.
    #[serde(default = "default_languages")]
    pub languages: Vec<String>,
}

impl Default for VideosConfig {
    fn default() -> Self {
        Self {
            max_results: default_max_results(),
            focused_max_results: default_focused_max_results(),
            recency_days: default_recency_days(),
            region: default_region(),
            languages: default_languages(),
        }
    }
}

fn default_max_results() -> usize {
    10
}
fn default_focused_max_results() -> usize {
    5
}
fn default_recency_days() -> i64 {
    90
}
fn default_region() -> String {
    "BR".to_string()
}
fn default_languages() -> Vec<String> {
    vec!["pt".to_string(), "en".to_string()]
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    /// Maximum excerpts returned as chat context.
    #[serde(default = "default_max_context")]
    pub max_context: usize,
    /// Character window each excerpt is truncated to.
    #[serde(default = "default_excerpt_chars")]
    pub excerpt_chars: usize,
    /// Relevance floor below which ranked results are discarded
    /// (tuning knob, not a correctness requirement).
    #[serde(default = "default_min_similarity")]
    pub min_similarity: f64,
    /// TF-IDF vocabulary cap.
    #[serde(default = "default_max_vocab")]
    pub max_vocab: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            max_context: default_max_context(),
            excerpt_chars: default_excerpt_chars(),
            min_similarity: default_min_similarity(),
            max_vocab: default_max_vocab(),
        }
    }
}

fn default_max_context() -> usize {
    3
}
fn default_excerpt_chars() -> usize {
    800
}
fn default_min_similarity() -> f64 {
    0.01
}
fn default_max_vocab() -> usize {
    1000
}

#[derive(Debug, Deserialize, Clone)]
pub struct ResearchConfig {
    /// Target chunk size in characters.
    #[serde(default = "default_chunk_chars")]
    pub chunk_chars: usize,
    /// Transcripts estimated above this many tokens are chunked in
    /// token-optimized runs (~4 chars per token).
    #[serde(default = "default_chunk_token_budget")]
    pub chunk_token_budget: usize,
    /// Character sample of a transcript given to full-document analysis.
    #[serde(default = "default_sample_chars")]
    pub sample_chars: usize,
    /// Per-analysis truncation when building the gap-identification prompt.
    #[serde(default = "default_gap_context_chars")]
    pub gap_context_chars: usize,
    /// Analyses folded per batch during progressive synthesis.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

impl Default for ResearchConfig {
    fn default() -> Self {
        Self {
            chunk_chars: default_chunk_chars(),
            chunk_token_budget: default_chunk_token_budget(),
            sample_chars: default_sample_chars(),
            gap_context_chars: default_gap_context_chars(),
            batch_size: default_batch_size(),
        }
    }
}

fn default_chunk_chars() -> usize {
    2000
}
fn default_chunk_token_budget() -> usize {
    2000
}
fn default_sample_chars() -> usize {
    3000
}
fn default_gap_context_chars() -> usize {
    500
}
fn default_batch_size() -> usize {
    3
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    if config.retrieval.max_context == 0 {
        anyhow::bail!("retrieval.max_context must be >= 1");
    }

    if config.retrieval.excerpt_chars == 0 {
        anyhow::bail!("retrieval.excerpt_chars must be > 0");
    }

    if !(0.0..=1.0).contains(&config.retrieval.min_similarity) {
        anyhow::bail!("retrieval.min_similarity must be in [0.0, 1.0]");
    }

    if config.research.chunk_chars == 0 {
        anyhow::bail!("research.chunk_chars must be > 0");
    }

    if config.research.batch_size == 0 {
        anyhow::bail!("research.batch_size must be >= 1");
    }

    if config.videos.max_results == 0 {
        anyhow::bail!("videos.max_results must be >= 1");
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(content: &str) -> (tempfile::TempDir, PathBuf) {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("tubesage.toml");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(content.as_bytes()).unwrap();
        (tmp, path)
    }

    #[test]
    fn test_minimal_config_gets_defaults() {
        let (_tmp, path) = write_config("[db]\npath = \"data/tubesage.sqlite\"\n");
        let config = load_config(&path).unwrap();
        assert_eq!(config.retrieval.max_context, 3);
        assert_eq!(config.retrieval.excerpt_chars, 800);
        assert!((config.retrieval.min_similarity - 0.01).abs() < 1e-12);
        assert_eq!(config.research.chunk_chars, 2000);
        assert_eq!(config.research.batch_size, 3);
        assert_eq!(config.videos.recency_days, 90);
        assert_eq!(config.videos.languages, vec!["pt", "en"]);
        assert_eq!(config.completion.base_url, "https://api.openai.com/v1");
    }

    #[test]
    fn test_rejects_zero_max_context() {
        let (_tmp, path) = write_config(
            "[db]\npath = \"x.sqlite\"\n\n[retrieval]\nmax_context = 0\n",
        );
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn test_rejects_similarity_out_of_range() {
        let (_tmp, path) = write_config(
            "[db]\npath = \"x.sqlite\"\n\n[retrieval]\nmin_similarity = 1.5\n",
        );
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn test_rejects_zero_batch_size() {
        let (_tmp, path) = write_config(
            "[db]\npath = \"x.sqlite\"\n\n[research]\nbatch_size = 0\n",
        );
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn test_overrides_apply() {
        let (_tmp, path) = write_config(
            r#"[db]
path = "x.sqlite"

[completion]
base_url = "http://localhost:1234/v1"
model = "qwen2.5-7b-instruct"

[retrieval]
max_context = 5
"#,
        );
        let config = load_config(&path).unwrap();
        assert_eq!(config.completion.base_url, "http://localhost:1234/v1");
        assert_eq!(config.completion.model, "qwen2.5-7b-instruct");
        assert_eq!(config.retrieval.max_context, 5);
    }
}

//! AI image analysis for new journal entries.
//!
//! One request per new image-bearing entry, no retries. Any failure is
//! replaced by [`Insight::fallback`] in [`analyze_or_fallback`], so callers
//! never have to handle an analysis error.

use crate::image::{DataUri, ImageError};
use crate::mode::CraftMode;
use async_trait::async_trait;
use claude::{Claude, Message, Request};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

/// Insight text used when the analysis service cannot be reached.
pub const FALLBACK_INSIGHT: &str = "无法连接到AI分析。这件作品看起来很有潜力！";

/// Errors from an analysis attempt.
#[derive(Debug, Error)]
pub enum InsightError {
    #[error("Image analysis is not configured")]
    NotConfigured,

    #[error("Unusable image: {0}")]
    Image(#[from] ImageError),

    #[error("Claude API error: {0}")]
    Api(#[from] claude::Error),

    #[error("Malformed analysis response: {0}")]
    Malformed(String),
}

/// A suggested title and free-text commentary for an image.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Insight {
    pub title: String,
    pub insight: String,
}

impl Insight {
    /// The deterministic pair substituted for a failed analysis.
    pub fn fallback(stage: &str) -> Self {
        Self {
            title: format!("{stage}记录"),
            insight: FALLBACK_INSIGHT.to_string(),
        }
    }
}

/// Something that can look at an image and describe it.
#[async_trait]
pub trait Analyzer: Send + Sync {
    async fn analyze(
        &self,
        mode: CraftMode,
        image: &str,
        stage: &str,
    ) -> Result<Insight, InsightError>;
}

/// Run one analysis attempt, degrading to the fallback pair on any error.
pub async fn analyze_or_fallback(
    analyzer: &dyn Analyzer,
    mode: CraftMode,
    image: &str,
    stage: &str,
) -> Insight {
    match analyzer.analyze(mode, image, stage).await {
        Ok(insight) => {
            debug!(title = %insight.title, "image analysis succeeded");
            insight
        }
        Err(e) => {
            warn!(error = %e, "image analysis failed, using fallback");
            Insight::fallback(stage)
        }
    }
}

/// Analyzer used when no credentials are configured. Always fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineAnalyzer;

#[async_trait]
impl Analyzer for OfflineAnalyzer {
    async fn analyze(
        &self,
        _mode: CraftMode,
        _image: &str,
        _stage: &str,
    ) -> Result<Insight, InsightError> {
        Err(InsightError::NotConfigured)
    }
}

/// Analyzer backed by Claude's vision support.
#[derive(Clone)]
pub struct ClaudeAnalyzer {
    client: Claude,
    max_tokens: usize,
}

impl ClaudeAnalyzer {
    pub fn new(client: Claude) -> Self {
        Self {
            client,
            max_tokens: 1024,
        }
    }

    /// Create an analyzer from the ANTHROPIC_API_KEY environment variable.
    pub fn from_env() -> Result<Self, InsightError> {
        Ok(Self::new(Claude::from_env()?))
    }

    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

#[async_trait]
impl Analyzer for ClaudeAnalyzer {
    async fn analyze(
        &self,
        mode: CraftMode,
        image: &str,
        stage: &str,
    ) -> Result<Insight, InsightError> {
        let uri = DataUri::parse(image)?;
        let request = Request::new(vec![Message::user_with_image(
            analysis_prompt(mode, stage),
            uri.media_type,
            uri.data,
        )])
        .with_max_tokens(self.max_tokens);

        let response = self.client.complete(request).await?;
        parse_insight(&response.text())
    }
}

fn analysis_prompt(mode: CraftMode, stage: &str) -> String {
    format!(
        "我正在进行{}创作，目前处于「{}」阶段。\n\
         请分析这张图片，只返回一个 JSON 对象，不要包含其他内容：\n\
         {{\"title\": \"一个富有诗意或简洁的标题\", \
         \"insight\": \"一段关于该作品造型、纹理或可能的改进建议\"}}",
        mode.label(),
        stage
    )
}

/// Extract the `{title, insight}` object from a model reply.
///
/// Prose or code fences around the object are ignored.
fn parse_insight(text: &str) -> Result<Insight, InsightError> {
    let start = text
        .find('{')
        .ok_or_else(|| InsightError::Malformed("no JSON object in reply".to_string()))?;
    let end = text
        .rfind('}')
        .filter(|end| *end > start)
        .ok_or_else(|| InsightError::Malformed("unterminated JSON object".to_string()))?;

    let insight: Insight = serde_json::from_str(&text[start..=end])
        .map_err(|e| InsightError::Malformed(e.to_string()))?;
    if insight.title.trim().is_empty() {
        return Err(InsightError::Malformed("empty title".to_string()));
    }
    Ok(insight)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_pair() {
        let fallback = Insight::fallback("素坯");
        assert_eq!(fallback.title, "素坯记录");
        assert_eq!(fallback.insight, FALLBACK_INSIGHT);
    }

    #[test]
    fn test_parse_insight_plain_json() {
        let insight = parse_insight(r#"{"title": "月白", "insight": "釉色均匀"}"#).unwrap();
        assert_eq!(insight.title, "月白");
        assert_eq!(insight.insight, "釉色均匀");
    }

    #[test]
    fn test_parse_insight_with_code_fence() {
        let text = "Here you go:\n```json\n{\"title\": \"Rim\", \"insight\": \"Even walls\"}\n```";
        let insight = parse_insight(text).unwrap();
        assert_eq!(insight.title, "Rim");
    }

    #[test]
    fn test_parse_insight_rejects_garbage() {
        assert!(parse_insight("no json here").is_err());
        assert!(parse_insight("} backwards {").is_err());
        assert!(parse_insight(r#"{"title": "", "insight": "x"}"#).is_err());
        assert!(parse_insight(r#"{"insight": "missing title"}"#).is_err());
    }

    #[test]
    fn test_prompt_mentions_mode_and_stage() {
        let prompt = analysis_prompt(CraftMode::Glass, "冷却·退火");
        assert!(prompt.contains("玻璃"));
        assert!(prompt.contains("冷却·退火"));
    }

    #[tokio::test]
    async fn test_offline_analyzer_degrades_to_fallback() {
        let insight =
            analyze_or_fallback(&OfflineAnalyzer, CraftMode::Pottery, "data:image/png;base64,AA", "泥坯")
                .await;
        assert_eq!(insight, Insight::fallback("泥坯"));
    }

    #[tokio::test]
    async fn test_claude_analyzer_rejects_non_data_uri_before_network() {
        let analyzer = ClaudeAnalyzer::new(Claude::new("test-key"));
        let result = analyzer
            .analyze(CraftMode::Pottery, "/tmp/bowl.jpg", "泥坯")
            .await;
        assert!(matches!(result, Err(InsightError::Image(_))));
    }
}

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::error::Category;
use thiserror::Error;
use tracing::{debug, warn};

use super::dto::AnalysisResult;

#[derive(Debug, Error)]
pub enum AnalysisParseError {
    #[error("the analysis service returned no text")]
    Empty,

    #[error("unexpected response envelope: {0}")]
    Envelope(String),

    #[error("reply is not JSON: {0}")]
    Syntax(#[source] serde_json::Error),

    #[error("reply does not match the analysis schema: {0}")]
    Schema(#[source] serde_json::Error),
}

impl From<serde_json::Error> for AnalysisParseError {
    fn from(e: serde_json::Error) -> Self {
        match e.classify() {
            Category::Data => Self::Schema(e),
            Category::Syntax | Category::Eof | Category::Io => Self::Syntax(e),
        }
    }
}

/// Returns the body of the first fenced code block. Without a closed block,
/// a dangling closing fence and then a dangling opening fence are cut off
/// separately. Either way the result is trimmed.
pub fn strip_code_fences(raw: &str) -> &str {
    lazy_static! {
        static ref FENCED: Regex =
            Regex::new(r"(?s)```[[:alpha:]]*[ \t]*\r?\n?(.*?)```").unwrap();
        static ref CLOSING: Regex = Regex::new(r"```\s*\z").unwrap();
        static ref OPENING: Regex = Regex::new(r"(?s)\A.*?```[[:alpha:]]*[ \t]*\r?\n?").unwrap();
    }
    if let Some(body) = FENCED.captures(raw).and_then(|c| c.get(1)) {
        return body.as_str().trim();
    }
    let mut body = raw.trim();
    if let Some(m) = CLOSING.find(body) {
        body = &body[..m.start()];
    }
    if let Some(m) = OPENING.find(body) {
        body = &body[m.end()..];
    }
    body.trim()
}

/// Decodes the service's reply into a typed result.
pub fn parse_analysis(raw: &str) -> Result<AnalysisResult, AnalysisParseError> {
    let body = strip_code_fences(raw);
    if body.is_empty() {
        return Err(AnalysisParseError::Empty);
    }

    let result: AnalysisResult = serde_json::from_str(body).map_err(|e| {
        let err = AnalysisParseError::from(e);
        warn!(error = %err, "analysis reply rejected");
        err
    })?;

    let takeaways = result.actionable_takeaways.len();
    if !(3..=5).contains(&takeaways) {
        debug!(takeaways, "unusual number of takeaways");
    }
    Ok(result)
}

use axum::http::StatusCode;
use thiserror::Error;

use crate::analysis::validator::AnalysisParseError;

/// Shown to the user whenever an analysis cycle fails, whatever the cause.
pub const ANALYSIS_RETRY_HINT: &str =
    "Had trouble analyzing. Try being more specific like \"2 eggs with toast\"";

#[derive(Debug, Error)]
pub enum PlannerError {
    #[error("{0}")]
    Validation(String),

    #[error("storage error: {0:#}")]
    Persistence(#[from] anyhow::Error),

    #[error("analysis service error: {0}")]
    AnalysisTransport(String),

    #[error("analysis reply could not be read: {0}")]
    AnalysisParse(#[from] AnalysisParseError),

    #[error("enter at least one meal before analyzing")]
    NothingToAnalyze,

    #[error("an analysis is already running")]
    AnalysisInFlight,

    #[error("the meals changed while analyzing; analyze again")]
    StaleAnalysis,

    #[error("deleting a template must be confirmed")]
    ConfirmationRequired,

    #[error("template {0} not found")]
    TemplateNotFound(String),
}

impl PlannerError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::NothingToAnalyze | Self::ConfirmationRequired => {
                StatusCode::BAD_REQUEST
            }
            Self::TemplateNotFound(_) => StatusCode::NOT_FOUND,
            Self::AnalysisInFlight | Self::StaleAnalysis => StatusCode::CONFLICT,
            Self::AnalysisTransport(_) | Self::AnalysisParse(_) => StatusCode::BAD_GATEWAY,
            Self::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Text safe to show to the user. Analysis failures collapse to one hint.
    pub fn user_message(&self) -> String {
        match self {
            Self::AnalysisTransport(_) | Self::AnalysisParse(_) => ANALYSIS_RETRY_HINT.to_string(),
            other => other.to_string(),
        }
    }
}

/// Handler-side rejection, in the `(StatusCode, String)` shape the routes use.
pub fn reject(e: PlannerError) -> (StatusCode, String) {
    if e.status().is_server_error() {
        tracing::error!(error = %e, "request failed");
    } else {
        tracing::warn!(error = %e, "request rejected");
    }
    (e.status(), e.user_message())
}

#[cfg(test)]
mod error_tests {
    use super::*;

    #[test]
    fn analysis_failures_share_one_user_message() {
        let transport = PlannerError::AnalysisTransport("connection reset".into());
        let parse = PlannerError::AnalysisParse(AnalysisParseError::Empty);
        assert_eq!(transport.user_message(), ANALYSIS_RETRY_HINT);
        assert_eq!(parse.user_message(), ANALYSIS_RETRY_HINT);
        assert_eq!(transport.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn status_mapping() {
        assert_eq!(
            PlannerError::Validation("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(PlannerError::AnalysisInFlight.status(), StatusCode::CONFLICT);
        assert_eq!(
            PlannerError::TemplateNotFound("template:1".into()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            PlannerError::Persistence(anyhow::anyhow!("down")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}

use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::analysis::client::ServiceError;
use crate::analysis::metrics::AnalysisView;
use crate::analysis::validator::{parse_analysis, AnalysisParseError};
use crate::error::PlannerError;
use crate::state::AppState;

use super::session::Completion;

impl From<ServiceError> for PlannerError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::Transport(msg) => PlannerError::AnalysisTransport(msg),
            ServiceError::Unreadable(msg) => {
                PlannerError::AnalysisParse(AnalysisParseError::Envelope(msg))
            }
        }
    }
}

/// One analysis cycle. The session lock is released while the service works,
/// so edits made meanwhile can invalidate the reply.
#[instrument(skip(state), fields(request_id = %Uuid::new_v4()))]
pub async fn run_analysis(state: &AppState) -> Result<AnalysisView, PlannerError> {
    let ticket = state
        .session
        .lock()
        .await
        .begin_analysis(&state.config.analysis)?;

    let outcome = match state.analyzer.analyze(&ticket.request).await {
        Ok(raw) => parse_analysis(&raw).map_err(PlannerError::from),
        Err(e) => Err(PlannerError::from(e)),
    };

    let mut session = state.session.lock().await;
    match outcome {
        Ok(result) => {
            let view_source = result.clone();
            match session.complete_analysis(&ticket, Ok(result)) {
                Completion::Applied => {
                    info!(generation = ticket.generation, "analysis ready");
                    Ok(AnalysisView::derive(view_source, session.targets()))
                }
                _ => Err(PlannerError::StaleAnalysis),
            }
        }
        Err(e) => {
            session.complete_analysis(&ticket, Err(&e));
            Err(e)
        }
    }
}

/// The current analysis with its derived figures, if there is one.
pub async fn current_view(state: &AppState) -> Option<AnalysisView> {
    let session = state.session.lock().await;
    let analysis = session.analysis()?;
    Some(AnalysisView::derive((*analysis).clone(), session.targets()))
}

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::analysis::dto::AnalysisResult;
use crate::analysis::prompt::{build_request, AnalysisRequest};
use crate::config::AnalysisConfig;
use crate::error::PlannerError;
use crate::meals::dto::{MealEntrySet, MealSlot};
use crate::targets::dto::UserTargets;
use crate::templates::dto::{MealTemplate, SkippedTemplate, TemplateListing};
use crate::templates::repo;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    Composing,
    Analyzing,
    Reviewing,
}

/// Handed out when an analysis is dispatched; completion must present it.
#[derive(Debug, Clone)]
pub struct AnalysisTicket {
    pub generation: u64,
    pub request: AnalysisRequest,
}

/// What happened to a completed analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Applied,
    /// The meals changed while the request was out; the reply was dropped.
    Stale,
    Failed,
}

/// In-memory state of one planning session. Only the owner mutates it.
#[derive(Debug, Default)]
pub struct PlannerSession {
    targets: UserTargets,
    meals: MealEntrySet,
    templates: Vec<MealTemplate>,
    skipped_templates: Vec<SkippedTemplate>,
    analysis: Option<Arc<AnalysisResult>>,
    generation: u64,
    in_flight: bool,
    notice: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub phase: Phase,
    pub generation: u64,
    pub analysis_in_flight: bool,
    pub has_analysis: bool,
    pub can_analyze: bool,
    pub template_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
}

impl PlannerSession {
    pub fn new(targets: UserTargets, listing: TemplateListing) -> Self {
        Self {
            targets,
            templates: listing.templates,
            skipped_templates: listing.skipped,
            ..Self::default()
        }
    }

    pub fn phase(&self) -> Phase {
        if self.in_flight {
            Phase::Analyzing
        } else if self.analysis.is_some() {
            Phase::Reviewing
        } else if self.meals.is_empty() {
            Phase::Idle
        } else {
            Phase::Composing
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            phase: self.phase(),
            generation: self.generation,
            analysis_in_flight: self.in_flight,
            has_analysis: self.analysis.is_some(),
            can_analyze: self.can_analyze(),
            template_count: self.templates.len(),
            notice: self.notice.clone(),
        }
    }

    /// Records a notice for the user; the next edit or dispatch clears it.
    pub fn set_notice(&mut self, notice: impl Into<String>) {
        self.notice = Some(notice.into());
    }

    pub fn targets(&self) -> UserTargets {
        self.targets
    }

    /// Replaces the whole target record (last write wins).
    pub fn set_targets(&mut self, targets: UserTargets) {
        self.targets = targets;
    }

    pub fn meals(&self) -> &MealEntrySet {
        &self.meals
    }

    /// Editing keeps the current analysis on screen.
    pub fn set_meals(&mut self, meals: MealEntrySet) {
        self.meals = meals;
        self.notice = None;
    }

    pub fn set_meal(&mut self, slot: MealSlot, text: String) {
        self.meals.set(slot, text);
        self.notice = None;
    }

    /// Starts a new day: empties the meals and drops the analysis.
    pub fn clear_meals(&mut self) {
        self.meals = MealEntrySet::default();
        self.discard_analysis();
        self.notice = None;
    }

    pub fn analysis(&self) -> Option<Arc<AnalysisResult>> {
        self.analysis.clone()
    }

    pub fn templates(&self) -> &[MealTemplate] {
        &self.templates
    }

    pub fn skipped_templates(&self) -> &[SkippedTemplate] {
        &self.skipped_templates
    }

    pub fn find_template(&self, id: &str) -> Result<&MealTemplate, PlannerError> {
        self.templates
            .iter()
            .find(|t| t.id == id)
            .ok_or_else(|| PlannerError::TemplateNotFound(id.to_string()))
    }

    pub fn add_template(&mut self, template: MealTemplate) {
        self.templates.push(template);
    }

    /// Drops exactly the template with `id` from the listing.
    pub fn remove_template(&mut self, id: &str) -> bool {
        let before = self.templates.len();
        self.templates.retain(|t| t.id != id);
        self.templates.len() != before
    }

    /// Replaces the meal texts with a template's; the old analysis no longer
    /// matches and is dropped.
    pub fn apply_template(&mut self, id: &str) -> Result<(), PlannerError> {
        let meals = repo::load(self.find_template(id)?);
        self.meals = meals;
        self.discard_analysis();
        self.notice = None;
        Ok(())
    }

    pub fn can_analyze(&self) -> bool {
        !self.in_flight && !self.meals.is_empty()
    }

    /// Marks an analysis as in flight and builds its request.
    pub fn begin_analysis(&mut self, config: &AnalysisConfig) -> Result<AnalysisTicket, PlannerError> {
        if self.in_flight {
            return Err(PlannerError::AnalysisInFlight);
        }
        if self.meals.is_empty() {
            return Err(PlannerError::NothingToAnalyze);
        }
        self.generation += 1;
        self.in_flight = true;
        self.notice = None;
        debug!(generation = self.generation, "analysis dispatched");
        Ok(AnalysisTicket {
            generation: self.generation,
            request: build_request(&self.targets, &self.meals, config),
        })
    }

    /// Applies the outcome of the ticket's analysis. A success only lands if
    /// nothing invalidated the ticket meanwhile; a failure keeps the prior
    /// result and records a notice for the user.
    pub fn complete_analysis(
        &mut self,
        ticket: &AnalysisTicket,
        outcome: Result<AnalysisResult, &PlannerError>,
    ) -> Completion {
        self.in_flight = false;
        match outcome {
            Ok(result) if ticket.generation == self.generation => {
                info!(generation = ticket.generation, "analysis applied");
                self.analysis = Some(Arc::new(result));
                Completion::Applied
            }
            Ok(_) => {
                warn!(
                    generation = ticket.generation,
                    current = self.generation,
                    "dropping stale analysis"
                );
                Completion::Stale
            }
            Err(e) => {
                warn!(generation = ticket.generation, error = %e, "analysis failed");
                self.notice = Some(e.user_message());
                Completion::Failed
            }
        }
    }

    fn discard_analysis(&mut self) {
        self.analysis = None;
        // an in-flight reply now describes texts that are gone
        self.generation += 1;
    }
}

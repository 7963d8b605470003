use std::collections::HashMap;

use tracing::warn;

use vetdesk_types::api::ContactUpdate;
use vetdesk_types::models::{Opportunity, PipelineStage};

/// The Kanban board over the complete in-memory opportunity set.
///
/// Columns are the five pipeline stages, always in `PipelineStage::ALL`
/// order. The board owns no persistence: a caller that moves a card is
/// responsible for the matching backend update. Not built for concurrent
/// mutation; one logical writer (the UI event loop) drives it.
#[derive(Debug, Default)]
pub struct StageBoard {
    opportunities: Vec<Opportunity>,
}

impl StageBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(opportunities: Vec<Opportunity>) -> Self {
        Self { opportunities }
    }

    /// Swap in a freshly fetched snapshot, discarding local state.
    pub fn replace(&mut self, opportunities: Vec<Opportunity>) {
        self.opportunities = opportunities;
    }

    /// Append a newly created record (form submissions land here).
    pub fn push(&mut self, opportunity: Opportunity) {
        self.opportunities.push(opportunity);
    }

    pub fn get(&self, id: uuid::Uuid) -> Option<&Opportunity> {
        self.opportunities.iter().find(|o| o.id == id)
    }

    pub fn records(&self) -> &[Opportunity] {
        &self.opportunities
    }

    pub fn len(&self) -> usize {
        self.opportunities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.opportunities.is_empty()
    }

    /// All opportunities sitting in `stage`, in source-collection order.
    /// No resort: a fetch snapshot renders in the order the backend
    /// returned it.
    pub fn list_by_stage(&self, stage: PipelineStage) -> Vec<&Opportunity> {
        self.opportunities
            .iter()
            .filter(|o| o.status == stage)
            .collect()
    }

    /// Every opportunity bucketed by stage. All five stages are present as
    /// keys, so empty columns still render.
    pub fn partition_by_stage(&self) -> HashMap<PipelineStage, Vec<&Opportunity>> {
        let mut columns: HashMap<PipelineStage, Vec<&Opportunity>> = PipelineStage::ALL
            .into_iter()
            .map(|stage| (stage, Vec::new()))
            .collect();
        for opportunity in &self.opportunities {
            columns
                .entry(opportunity.status)
                .or_default()
                .push(opportunity);
        }
        columns
    }

    /// Per-column totals for the board header, in display order.
    pub fn stage_counts(&self) -> [(PipelineStage, usize); 5] {
        PipelineStage::ALL.map(|stage| {
            (
                stage,
                self.opportunities
                    .iter()
                    .filter(|o| o.status == stage)
                    .count(),
            )
        })
    }

    /// Move one card to another column. Only the matching record's status
    /// changes; every other field and record is untouched. Moving an
    /// unknown id is a logged no-op, and repeating a move is
    /// indistinguishable from doing it once.
    pub fn move_to_stage(&mut self, id: uuid::Uuid, stage: PipelineStage) -> bool {
        match self.opportunities.iter_mut().find(|o| o.id == id) {
            Some(opportunity) => {
                opportunity.status = stage;
                true
            }
            None => {
                warn!("move_to_stage: no opportunity with id {}", id);
                false
            }
        }
    }

    /// Edit the contact fields of one card. Same unknown-id policy as
    /// `move_to_stage`.
    pub fn update_contact(&mut self, id: uuid::Uuid, update: &ContactUpdate) -> bool {
        match self.opportunities.iter_mut().find(|o| o.id == id) {
            Some(opportunity) => {
                update.apply_to(opportunity);
                true
            }
            None => {
                warn!("update_contact: no opportunity with id {}", id);
                false
            }
        }
    }
}

//! The entity a feedback event targets, with the operations the
//! processor needs implemented once per kind: fetch with its candidate
//! and role, render prompt context, transition status, and apply
//! modifications.

use chrono::Utc;
use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::models::{
    Candidate, EntityKind, MatchRecord, MatchStatus, MatchUpdate, OfferRecord, OfferStatus,
    OfferUpdate, Role,
};
use crate::store::{apply_dot_path, Store, StoreError};

/// Human decision applied as a status transition.
#[derive(Debug, Clone, Copy)]
pub enum ReviewOutcome {
    Approved,
    Rejected,
}

pub enum FeedbackEntity {
    Match {
        record: MatchRecord,
        candidate: Candidate,
        role: Role,
    },
    Offer {
        record: OfferRecord,
        candidate: Candidate,
        role: Role,
    },
}

impl FeedbackEntity {
    pub async fn fetch(
        store: &dyn Store,
        kind: EntityKind,
        entity_id: Uuid,
    ) -> Result<Self, StoreError> {
        match kind {
            EntityKind::Match => {
                let record = store.get_match(entity_id).await?;
                let candidate = store.get_candidate(record.candidate_id).await?;
                let role = store.get_role(record.role_id).await?;
                Ok(FeedbackEntity::Match {
                    record,
                    candidate,
                    role,
                })
            }
            EntityKind::Offer => {
                let record = store.get_offer(entity_id).await?;
                let candidate = store.get_candidate(record.candidate_id).await?;
                let role = store.get_role(record.role_id).await?;
                Ok(FeedbackEntity::Offer {
                    record,
                    candidate,
                    role,
                })
            }
        }
    }

    /// Context block for the analysis prompt.
    pub fn details_text(&self) -> String {
        match self {
            FeedbackEntity::Match {
                record,
                candidate,
                role,
            } => format!(
                "Entity Type: Match\n\n\
                 Match Details:\n\
                 Match Score: {}\n\
                 Status: {}\n\
                 Matched Skills: {}\n\
                 Missing Skills: {}\n\n\
                 Candidate:\n\
                 Name: {}\n\
                 Experience: {}\n\
                 Skills: {}\n\n\
                 Role:\n\
                 Title: {}\n\
                 Department: {}\n\
                 Required Skills: {}",
                record.match_score,
                status_text(&record.status),
                record.skill_match.matched.join(", "),
                record.skill_match.missing.join(", "),
                candidate.name,
                candidate.experience.as_deref().unwrap_or("Not specified"),
                candidate.skills.join(", "),
                role.title,
                role.department,
                role.required_skills.join(", "),
            ),
            FeedbackEntity::Offer {
                record,
                candidate,
                role,
            } => format!(
                "Entity Type: Offer\n\n\
                 Offer Details:\n\
                 {}\n\
                 Status: {}\n\n\
                 Candidate:\n\
                 Name: {}\n\
                 Experience: {}\n\
                 Current CTC: {}\n\
                 Expected CTC: {}\n\n\
                 Role:\n\
                 Title: {}\n\
                 Department: {}\n\
                 Location: {}",
                record.offer.package_text(),
                offer_status_text(&record.status),
                candidate.name,
                candidate.experience.as_deref().unwrap_or("Not specified"),
                candidate
                    .current_ctc
                    .map(|v| v.to_string())
                    .unwrap_or_else(|| "Not specified".to_string()),
                candidate
                    .expected_ctc
                    .map(|v| v.to_string())
                    .unwrap_or_else(|| "Not specified".to_string()),
                role.title,
                role.department,
                role.location.as_deref().unwrap_or("Not specified"),
            ),
        }
    }

    pub async fn apply_status(
        &self,
        store: &dyn Store,
        outcome: ReviewOutcome,
    ) -> Result<(), StoreError> {
        match self {
            FeedbackEntity::Match { record, .. } => {
                let status = match outcome {
                    ReviewOutcome::Approved => MatchStatus::Approved,
                    ReviewOutcome::Rejected => MatchStatus::Rejected,
                };
                store
                    .update_match(
                        record.id,
                        MatchUpdate {
                            status: Some(status),
                            ..Default::default()
                        },
                    )
                    .await?;
            }
            FeedbackEntity::Offer { record, .. } => {
                let status = match outcome {
                    ReviewOutcome::Approved => OfferStatus::Approved,
                    ReviewOutcome::Rejected => OfferStatus::Rejected,
                };
                store
                    .update_offer(
                        record.id,
                        OfferUpdate {
                            status: Some(status),
                            ..Default::default()
                        },
                    )
                    .await?;
            }
        }
        Ok(())
    }

    /// Applies field edits to the record as a JSON document, so flat keys
    /// hit the top level and dot-path keys ("offer.base_salary") route
    /// into nested structures. The record ends up Modified.
    pub async fn apply_modifications(
        &self,
        store: &dyn Store,
        modifications: &Map<String, Value>,
    ) -> Result<(), StoreError> {
        match self {
            FeedbackEntity::Match { record, .. } => {
                let mut doc = serde_json::to_value(record)?;
                for (key, value) in modifications {
                    apply_dot_path(&mut doc, key, value.clone());
                }
                apply_dot_path(&mut doc, "status", json!(MatchStatus::Modified));
                let mut updated: MatchRecord = serde_json::from_value(doc)?;
                updated.id = record.id;
                updated.updated_at = Utc::now();
                store.put_match(updated).await
            }
            FeedbackEntity::Offer { record, .. } => {
                let mut doc = serde_json::to_value(record)?;
                for (key, value) in modifications {
                    apply_dot_path(&mut doc, key, value.clone());
                }
                apply_dot_path(&mut doc, "status", json!(OfferStatus::Modified));
                let mut updated: OfferRecord = serde_json::from_value(doc)?;
                updated.id = record.id;
                updated.updated_at = Utc::now();
                store.put_offer(updated).await
            }
        }
    }
}

fn status_text(status: &MatchStatus) -> String {
    serde_json::to_value(status)
        .ok()
        .and_then(|v| v.as_str().map(str::to_owned))
        .unwrap_or_else(|| "Unknown".to_string())
}

fn offer_status_text(status: &OfferStatus) -> String {
    serde_json::to_value(status)
        .ok()
        .and_then(|v| v.as_str().map(str::to_owned))
        .unwrap_or_else(|| "Unknown".to_string())
}

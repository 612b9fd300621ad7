use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Which record kind a feedback event targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Match,
    Offer,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Match => "match",
            EntityKind::Offer => "offer",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackType {
    Approval,
    Rejection,
    Modification,
}

impl FeedbackType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedbackType::Approval => "approval",
            FeedbackType::Rejection => "rejection",
            FeedbackType::Modification => "modification",
        }
    }
}

/// A recorded human decision against a match or offer. `analysis` is
/// derived asynchronously by the feedback processor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feedback {
    pub id: Uuid,
    pub entity_type: EntityKind,
    pub entity_id: Uuid,
    pub feedback_type: FeedbackType,
    #[serde(default)]
    pub comments: Option<String>,
    /// Flat or dot-path keys ("offer.base_salary") applied on modification.
    #[serde(default)]
    pub modifications: Option<Map<String, Value>>,
    #[serde(default)]
    pub analysis: Option<FeedbackAnalysis>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackCreate {
    pub entity_type: EntityKind,
    pub entity_id: Uuid,
    pub feedback_type: FeedbackType,
    #[serde(default)]
    pub comments: Option<String>,
    #[serde(default)]
    pub modifications: Option<Map<String, Value>>,
}

impl Feedback {
    pub fn from_create(input: FeedbackCreate) -> Self {
        Self {
            id: Uuid::new_v4(),
            entity_type: input.entity_type,
            entity_id: input.entity_id,
            feedback_type: input.feedback_type,
            comments: input.comments,
            modifications: input.modifications,
            analysis: None,
            created_at: Utc::now(),
        }
    }
}

/// Structured insight extracted from one feedback event by the oracle.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeedbackAnalysis {
    #[serde(default)]
    pub learnings: Vec<String>,
    #[serde(default)]
    pub patterns: Patterns,
    #[serde(default)]
    pub parameters: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Patterns {
    #[serde(default)]
    pub reinforce: Vec<String>,
    #[serde(default)]
    pub avoid: Vec<String>,
}

/// One entry in the append-only knowledge log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearningEntry {
    pub recorded_at: DateTime<Utc>,
    pub learnings: Vec<String>,
    pub patterns: Patterns,
    pub parameters: Map<String, Value>,
}

impl LearningEntry {
    pub fn from_analysis(analysis: &FeedbackAnalysis) -> Self {
        Self {
            recorded_at: Utc::now(),
            learnings: analysis.learnings.clone(),
            patterns: analysis.patterns.clone(),
            parameters: analysis.parameters.clone(),
        }
    }
}

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{joined, text_or_unspecified};

/// A candidate profile as stored. Created on ingestion, refreshed on
/// re-ingestion (matched by email) or feedback-driven modification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    /// Free text with a leading-integer-years convention ("3 years").
    #[serde(default)]
    pub experience: Option<String>,
    #[serde(default)]
    pub education: Option<String>,
    #[serde(default)]
    pub certifications: Option<Vec<String>>,
    #[serde(default)]
    pub current_ctc: Option<f64>,
    #[serde(default)]
    pub expected_ctc: Option<f64>,
    #[serde(default)]
    pub notice_period: Option<i32>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub remote_preference: Option<String>,
    #[serde(default)]
    pub interview_scores: Option<HashMap<String, f64>>,
    #[serde(default)]
    pub interview_feedback: Option<String>,
    #[serde(default)]
    pub preferences: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payload for candidate ingestion. Upserted by email.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateCreate {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub experience: Option<String>,
    #[serde(default)]
    pub education: Option<String>,
    #[serde(default)]
    pub certifications: Option<Vec<String>>,
    #[serde(default)]
    pub current_ctc: Option<f64>,
    #[serde(default)]
    pub expected_ctc: Option<f64>,
    #[serde(default)]
    pub notice_period: Option<i32>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub remote_preference: Option<String>,
    #[serde(default)]
    pub interview_scores: Option<HashMap<String, f64>>,
    #[serde(default)]
    pub interview_feedback: Option<String>,
    #[serde(default)]
    pub preferences: Option<serde_json::Value>,
}

/// Partial update; only supplied fields are applied.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CandidateUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub skills: Option<Vec<String>>,
    pub experience: Option<String>,
    pub education: Option<String>,
    pub certifications: Option<Vec<String>>,
    pub current_ctc: Option<f64>,
    pub expected_ctc: Option<f64>,
    pub notice_period: Option<i32>,
    pub location: Option<String>,
    pub remote_preference: Option<String>,
    pub interview_scores: Option<HashMap<String, f64>>,
    pub interview_feedback: Option<String>,
    pub preferences: Option<serde_json::Value>,
}

impl Candidate {
    pub fn from_create(input: CandidateCreate) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: input.name,
            email: input.email,
            phone: input.phone,
            skills: input.skills,
            experience: input.experience,
            education: input.education,
            certifications: input.certifications,
            current_ctc: input.current_ctc,
            expected_ctc: input.expected_ctc,
            notice_period: input.notice_period,
            location: input.location,
            remote_preference: input.remote_preference,
            interview_scores: input.interview_scores,
            interview_feedback: input.interview_feedback,
            preferences: input.preferences,
            created_at: now,
            updated_at: now,
        }
    }

    /// Re-ingestion: replace profile fields, keep identity and created_at.
    pub fn refresh(&mut self, input: CandidateCreate) {
        let created_at = self.created_at;
        let id = self.id;
        *self = Candidate::from_create(input);
        self.id = id;
        self.created_at = created_at;
    }

    pub fn apply_update(&mut self, patch: CandidateUpdate) {
        if let Some(v) = patch.name {
            self.name = v;
        }
        if let Some(v) = patch.email {
            self.email = v;
        }
        if let Some(v) = patch.phone {
            self.phone = Some(v);
        }
        if let Some(v) = patch.skills {
            self.skills = v;
        }
        if let Some(v) = patch.experience {
            self.experience = Some(v);
        }
        if let Some(v) = patch.education {
            self.education = Some(v);
        }
        if let Some(v) = patch.certifications {
            self.certifications = Some(v);
        }
        if let Some(v) = patch.current_ctc {
            self.current_ctc = Some(v);
        }
        if let Some(v) = patch.expected_ctc {
            self.expected_ctc = Some(v);
        }
        if let Some(v) = patch.notice_period {
            self.notice_period = Some(v);
        }
        if let Some(v) = patch.location {
            self.location = Some(v);
        }
        if let Some(v) = patch.remote_preference {
            self.remote_preference = Some(v);
        }
        if let Some(v) = patch.interview_scores {
            self.interview_scores = Some(v);
        }
        if let Some(v) = patch.interview_feedback {
            self.interview_feedback = Some(v);
        }
        if let Some(v) = patch.preferences {
            self.preferences = Some(v);
        }
        self.updated_at = Utc::now();
    }

    /// Profile text handed to every oracle prompt that mentions this
    /// candidate. Single shared formatter for all call sites.
    pub fn profile_text(&self) -> String {
        let scores = self
            .interview_scores
            .as_ref()
            .and_then(|s| serde_json::to_string(s).ok())
            .unwrap_or_else(|| "Not available".to_string());
        format!(
            "Name: {}\n\
             Email: {}\n\
             Skills: {}\n\
             Experience: {}\n\
             Education: {}\n\
             Certifications: {}\n\
             Current CTC: {}\n\
             Expected CTC: {}\n\
             Notice Period: {}\n\
             Location: {}\n\
             Remote Preference: {}\n\
             Interview Scores: {}\n\
             Interview Feedback: {}",
            self.name,
            self.email,
            joined(&self.skills),
            text_or_unspecified(self.experience.as_deref()),
            text_or_unspecified(self.education.as_deref()),
            joined(self.certifications.as_deref().unwrap_or(&[])),
            self.current_ctc
                .map(|v| v.to_string())
                .unwrap_or_else(|| "Not specified".to_string()),
            self.expected_ctc
                .map(|v| v.to_string())
                .unwrap_or_else(|| "Not specified".to_string()),
            self.notice_period
                .map(|v| v.to_string())
                .unwrap_or_else(|| "Not specified".to_string()),
            text_or_unspecified(self.location.as_deref()),
            text_or_unspecified(self.remote_preference.as_deref()),
            scores,
            text_or_unspecified(self.interview_feedback.as_deref()),
        )
    }

    /// Text embedded for the candidate's self-vector.
    pub fn embedding_text(&self) -> String {
        format!(
            "{} {} {} {} {}",
            self.name,
            joined(&self.skills),
            self.experience.as_deref().unwrap_or(""),
            self.education.as_deref().unwrap_or(""),
            self.location.as_deref().unwrap_or(""),
        )
    }
}

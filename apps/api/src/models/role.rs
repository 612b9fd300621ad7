use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{joined, text_or_unspecified};

/// An open (or soft-deleted) job role. Soft-deleted via `is_active = false`;
/// hard deletion also purges the role's vector entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Role {
    pub id: Uuid,
    pub title: String,
    pub department: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub required_skills: Vec<String>,
    #[serde(default)]
    pub preferred_skills: Option<Vec<String>>,
    /// Free text with a leading-integer convention ("5+ years").
    #[serde(default)]
    pub experience_required: Option<String>,
    #[serde(default)]
    pub education_required: Option<String>,
    #[serde(default)]
    pub certifications_required: Option<Vec<String>>,
    /// When true, missing any required certification blacklists the pair.
    #[serde(default)]
    pub certifications_mandatory: bool,
    #[serde(default)]
    pub salary_range: Option<HashMap<String, f64>>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub remote_option: Option<String>,
    #[serde(default)]
    pub team_size: Option<i32>,
    #[serde(default)]
    pub hiring_manager: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleCreate {
    pub title: String,
    pub department: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub required_skills: Vec<String>,
    #[serde(default)]
    pub preferred_skills: Option<Vec<String>>,
    #[serde(default)]
    pub experience_required: Option<String>,
    #[serde(default)]
    pub education_required: Option<String>,
    #[serde(default)]
    pub certifications_required: Option<Vec<String>>,
    #[serde(default)]
    pub certifications_mandatory: bool,
    #[serde(default)]
    pub salary_range: Option<HashMap<String, f64>>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub remote_option: Option<String>,
    #[serde(default)]
    pub team_size: Option<i32>,
    #[serde(default)]
    pub hiring_manager: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoleUpdate {
    pub title: Option<String>,
    pub department: Option<String>,
    pub description: Option<String>,
    pub required_skills: Option<Vec<String>>,
    pub preferred_skills: Option<Vec<String>>,
    pub experience_required: Option<String>,
    pub education_required: Option<String>,
    pub certifications_required: Option<Vec<String>>,
    pub certifications_mandatory: Option<bool>,
    pub salary_range: Option<HashMap<String, f64>>,
    pub location: Option<String>,
    pub remote_option: Option<String>,
    pub team_size: Option<i32>,
    pub hiring_manager: Option<String>,
    pub is_active: Option<bool>,
}

impl Role {
    pub fn from_create(input: RoleCreate) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title: input.title,
            department: input.department,
            description: input.description,
            required_skills: input.required_skills,
            preferred_skills: input.preferred_skills,
            experience_required: input.experience_required,
            education_required: input.education_required,
            certifications_required: input.certifications_required,
            certifications_mandatory: input.certifications_mandatory,
            salary_range: input.salary_range,
            location: input.location,
            remote_option: input.remote_option,
            team_size: input.team_size,
            hiring_manager: input.hiring_manager,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// True when the patch touches fields that feed the role embedding.
    pub fn update_touches_embedding(patch: &RoleUpdate) -> bool {
        patch.title.is_some()
            || patch.department.is_some()
            || patch.description.is_some()
            || patch.required_skills.is_some()
            || patch.preferred_skills.is_some()
            || patch.experience_required.is_some()
    }

    pub fn apply_update(&mut self, patch: RoleUpdate) {
        if let Some(v) = patch.title {
            self.title = v;
        }
        if let Some(v) = patch.department {
            self.department = v;
        }
        if let Some(v) = patch.description {
            self.description = Some(v);
        }
        if let Some(v) = patch.required_skills {
            self.required_skills = v;
        }
        if let Some(v) = patch.preferred_skills {
            self.preferred_skills = Some(v);
        }
        if let Some(v) = patch.experience_required {
            self.experience_required = Some(v);
        }
        if let Some(v) = patch.education_required {
            self.education_required = Some(v);
        }
        if let Some(v) = patch.certifications_required {
            self.certifications_required = Some(v);
        }
        if let Some(v) = patch.certifications_mandatory {
            self.certifications_mandatory = v;
        }
        if let Some(v) = patch.salary_range {
            self.salary_range = Some(v);
        }
        if let Some(v) = patch.location {
            self.location = Some(v);
        }
        if let Some(v) = patch.remote_option {
            self.remote_option = Some(v);
        }
        if let Some(v) = patch.team_size {
            self.team_size = Some(v);
        }
        if let Some(v) = patch.hiring_manager {
            self.hiring_manager = Some(v);
        }
        if let Some(v) = patch.is_active {
            self.is_active = v;
        }
        self.updated_at = Utc::now();
    }

    /// Profile text handed to every oracle prompt that mentions this role.
    pub fn profile_text(&self) -> String {
        let salary = self
            .salary_range
            .as_ref()
            .and_then(|s| serde_json::to_string(s).ok())
            .unwrap_or_else(|| "Not specified".to_string());
        format!(
            "Title: {}\n\
             Department: {}\n\
             Description: {}\n\
             Required Skills: {}\n\
             Preferred Skills: {}\n\
             Experience Required: {}\n\
             Education Required: {}\n\
             Certifications Required: {}\n\
             Salary Range: {}\n\
             Location: {}\n\
             Remote Option: {}\n\
             Team Size: {}\n\
             Hiring Manager: {}",
            self.title,
            self.department,
            text_or_unspecified(self.description.as_deref()),
            joined(&self.required_skills),
            joined(self.preferred_skills.as_deref().unwrap_or(&[])),
            text_or_unspecified(self.experience_required.as_deref()),
            text_or_unspecified(self.education_required.as_deref()),
            joined(self.certifications_required.as_deref().unwrap_or(&[])),
            salary,
            text_or_unspecified(self.location.as_deref()),
            text_or_unspecified(self.remote_option.as_deref()),
            self.team_size
                .map(|v| v.to_string())
                .unwrap_or_else(|| "Not specified".to_string()),
            text_or_unspecified(self.hiring_manager.as_deref()),
        )
    }

    /// Text embedded for the role's self-vector.
    pub fn embedding_text(&self) -> String {
        format!(
            "{} {} {} {} {}",
            self.title,
            self.department,
            self.description.as_deref().unwrap_or(""),
            joined(&self.required_skills),
            self.experience_required.as_deref().unwrap_or(""),
        )
    }
}

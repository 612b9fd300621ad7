use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Candidate, Role};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OfferStatus {
    #[serde(rename = "Pending Approval")]
    PendingApproval,
    Approved,
    Rejected,
    Modified,
}

/// The compensation package recommended by the offer oracle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OfferPackage {
    pub base_salary: f64,
    #[serde(default)]
    pub bonus: Option<f64>,
    #[serde(default)]
    pub equity: Option<String>,
    #[serde(default)]
    pub benefits: Vec<String>,
    pub total_ctc: f64,
    /// "YYYY-MM-DD". Defaulted to 30 days from generation when absent.
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub remote: Option<String>,
}

/// One active offer per (candidate, role); references its parent match.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OfferRecord {
    pub id: Uuid,
    pub candidate_id: Uuid,
    pub role_id: Uuid,
    pub match_id: Uuid,
    pub match_score: i32,
    pub offer: OfferPackage,
    pub explanation: String,
    pub status: OfferStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct OfferUpsert {
    pub candidate_id: Uuid,
    pub role_id: Uuid,
    pub match_id: Uuid,
    pub match_score: i32,
    pub offer: OfferPackage,
    pub explanation: String,
    pub status: OfferStatus,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OfferUpdate {
    pub offer: Option<OfferPackage>,
    pub explanation: Option<String>,
    pub status: Option<OfferStatus>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OfferFilter {
    pub candidate_id: Option<Uuid>,
    pub role_id: Option<Uuid>,
    pub status: Option<OfferStatus>,
}

impl OfferFilter {
    pub fn accepts(&self, record: &OfferRecord) -> bool {
        if let Some(cid) = self.candidate_id {
            if record.candidate_id != cid {
                return false;
            }
        }
        if let Some(rid) = self.role_id {
            if record.role_id != rid {
                return false;
            }
        }
        if let Some(status) = self.status {
            if record.status != status {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct OfferWithDetails {
    #[serde(flatten)]
    pub record: OfferRecord,
    pub candidate: Candidate,
    pub role: Role,
}

impl OfferPackage {
    /// Package text handed to explanation prompts.
    pub fn package_text(&self) -> String {
        format!(
            "Base Salary: {}\n\
             Bonus: {}\n\
             Equity: {}\n\
             Benefits: {}\n\
             Total CTC: {}\n\
             Start Date: {}\n\
             Work Arrangement: {}",
            self.base_salary,
            self.bonus
                .map(|v| v.to_string())
                .unwrap_or_else(|| "Not specified".to_string()),
            self.equity.as_deref().unwrap_or("Not specified"),
            self.benefits.join(", "),
            self.total_ctc,
            self.start_date.as_deref().unwrap_or("Not specified"),
            self.remote.as_deref().unwrap_or("Not specified"),
        )
    }
}

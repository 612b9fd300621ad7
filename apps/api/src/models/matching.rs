use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Candidate, Role};

/// Lifecycle of a match record. Wire strings are fixed by the frontend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchStatus {
    Matched,
    #[serde(rename = "Review Needed")]
    ReviewNeeded,
    Modified,
    Approved,
    Rejected,
    Pending,
}

/// Scores at or above this are auto-accepted as "Matched".
pub const MATCH_SCORE_THRESHOLD: i32 = 70;

impl MatchStatus {
    pub fn from_score(score: i32) -> Self {
        if score >= MATCH_SCORE_THRESHOLD {
            MatchStatus::Matched
        } else {
            MatchStatus::ReviewNeeded
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillMatch {
    #[serde(default)]
    pub matched: Vec<String>,
    #[serde(default)]
    pub missing: Vec<String>,
}

/// One match per (candidate, role) pair; re-processing upserts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchRecord {
    pub id: Uuid,
    pub candidate_id: Uuid,
    pub role_id: Uuid,
    pub match_score: i32,
    pub skill_match: SkillMatch,
    pub explanation: String,
    pub status: MatchStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields refreshed on every upsert of a pair.
#[derive(Debug, Clone)]
pub struct MatchUpsert {
    pub candidate_id: Uuid,
    pub role_id: Uuid,
    pub match_score: i32,
    pub skill_match: SkillMatch,
    pub explanation: String,
    pub status: MatchStatus,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MatchUpdate {
    pub match_score: Option<i32>,
    pub skill_match: Option<SkillMatch>,
    pub explanation: Option<String>,
    pub status: Option<MatchStatus>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MatchFilter {
    pub candidate_id: Option<Uuid>,
    pub role_id: Option<Uuid>,
    pub min_score: Option<i32>,
    pub status: Option<MatchStatus>,
}

impl MatchFilter {
    /// Shared predicate so both store backends filter identically.
    pub fn accepts(&self, record: &MatchRecord) -> bool {
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
        if let Some(min) = self.min_score {
            if record.match_score < min {
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
pub struct MatchWithDetails {
    #[serde(flatten)]
    pub record: MatchRecord,
    pub candidate: Candidate,
    pub role: Role,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_threshold_is_70() {
        assert_eq!(MatchStatus::from_score(70), MatchStatus::Matched);
        assert_eq!(MatchStatus::from_score(100), MatchStatus::Matched);
        assert_eq!(MatchStatus::from_score(69), MatchStatus::ReviewNeeded);
        assert_eq!(MatchStatus::from_score(0), MatchStatus::ReviewNeeded);
    }

    #[test]
    fn status_serializes_wire_strings() {
        assert_eq!(
            serde_json::to_string(&MatchStatus::ReviewNeeded).unwrap(),
            "\"Review Needed\""
        );
        assert_eq!(
            serde_json::to_string(&MatchStatus::Matched).unwrap(),
            "\"Matched\""
        );
    }
}

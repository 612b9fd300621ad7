//! Rule-based pre-filter plus an oracle-backed deep check.
//!
//! The rule check is pure and cheap, so the matching engine runs it on
//! every pair before spending an oracle call. Both paths fail open: a
//! value we cannot interpret never blacklists anyone.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::llm_client::{oracle_json, Oracle};
use crate::models::{Candidate, Role};
use crate::store::Store;

use super::{prompts, select_candidates, select_roles};

/// Longest leading run of ASCII digits, so "5+ years" and "3 years" both
/// parse. `None` when the text does not start with a digit.
fn leading_years(text: &str) -> Option<i32> {
    let digits: String = text
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    if digits.is_empty() {
        None
    } else {
        digits.parse().ok()
    }
}

/// Four rules, fixed order, short-circuit on the first hit.
pub fn should_blacklist(candidate: &Candidate, role: &Role) -> bool {
    // 1. Years of experience below the role's minimum. Unparseable on
    // either side means no decision.
    if let (Some(required), Some(actual)) = (
        role.experience_required.as_deref(),
        candidate.experience.as_deref(),
    ) {
        if let (Some(required_years), Some(candidate_years)) =
            (leading_years(required), leading_years(actual))
        {
            if candidate_years < required_years {
                return true;
            }
        }
    }

    // 2. Remote-only candidate against an on-site role elsewhere.
    let remote_option = role
        .remote_option
        .as_deref()
        .unwrap_or("")
        .to_lowercase();
    let remote_preference = candidate
        .remote_preference
        .as_deref()
        .unwrap_or("")
        .to_lowercase();
    if role.location != candidate.location
        && remote_option == "no"
        && remote_preference == "remote only"
    {
        return true;
    }

    // 3. Education requirement explicitly marked "required" and absent
    // from the candidate's education text.
    if let Some(required) = role.education_required.as_deref() {
        let required_lower = required.to_lowercase();
        if required_lower.contains("required") {
            let education = candidate
                .education
                .as_deref()
                .unwrap_or("")
                .to_lowercase();
            if !education.contains(&required_lower) {
                return true;
            }
        }
    }

    // 4. Mandatory certifications not all held (case-insensitive).
    if role.certifications_mandatory {
        if let Some(required) = role.certifications_required.as_deref() {
            if !required.is_empty() {
                let held: Vec<String> = candidate
                    .certifications
                    .as_deref()
                    .unwrap_or(&[])
                    .iter()
                    .map(|c| c.to_lowercase())
                    .collect();
                if !required.iter().all(|c| held.contains(&c.to_lowercase())) {
                    return true;
                }
            }
        }
    }

    false
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlacklistVerdict {
    pub blacklist: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<String>,
}

impl BlacklistVerdict {
    fn pass() -> Self {
        Self {
            blacklist: false,
            reason: None,
            severity: None,
        }
    }
}

/// Oracle-backed evaluation of a single pair. Any oracle failure passes
/// the candidate through.
pub async fn evaluate(oracle: &dyn Oracle, candidate: &Candidate, role: &Role) -> BlacklistVerdict {
    let prompt = prompts::blacklist_prompt(&candidate.profile_text(), &role.profile_text());
    match oracle_json::<BlacklistVerdict>(oracle, &prompt, prompts::BLACKLIST_SYSTEM).await {
        Ok(verdict) => verdict,
        Err(e) => {
            warn!(
                candidate = %candidate.name,
                role = %role.title,
                "blacklist evaluation failed, passing candidate through: {e}"
            );
            BlacklistVerdict::pass()
        }
    }
}

/// One row of a batch evaluation.
#[derive(Debug, Serialize)]
pub struct BlacklistReport {
    pub candidate_id: Uuid,
    pub candidate_name: String,
    pub role_id: Uuid,
    pub role_title: String,
    #[serde(flatten)]
    pub verdict: BlacklistVerdict,
}

/// Evaluates every selected candidate against every selected active role.
pub async fn evaluate_batch(
    store: &dyn Store,
    oracle: &dyn Oracle,
    candidate_ids: Option<Vec<Uuid>>,
    role_ids: Option<Vec<Uuid>>,
) -> Result<Vec<BlacklistReport>, AppError> {
    let candidates = select_candidates(store, candidate_ids).await?;
    let roles = select_roles(store, role_ids).await?;
    info!(
        candidates = candidates.len(),
        roles = roles.len(),
        "evaluating blacklist for candidate-role pairs"
    );

    let mut reports = Vec::with_capacity(candidates.len() * roles.len());
    for candidate in &candidates {
        for role in &roles {
            let verdict = evaluate(oracle, candidate, role).await;
            reports.push(BlacklistReport {
                candidate_id: candidate.id,
                candidate_name: candidate.name.clone(),
                role_id: role.id,
                role_title: role.title.clone(),
                verdict,
            });
        }
    }
    Ok(reports)
}

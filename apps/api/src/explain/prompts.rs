//! Prompts for regenerated match and offer explanations.

pub const MATCH_EXPLANATION_SYSTEM: &str =
    "You are an expert HR professional explaining role match decisions to a hiring manager. \
     Your goal is to provide clear, concise, and insightful explanations that highlight key factors.";

pub fn match_explanation_prompt(
    candidate_profile: &str,
    role_profile: &str,
    match_score: i32,
    matched_skills: &str,
    missing_skills: &str,
) -> String {
    format!(
        r#"# Candidate Profile:
{candidate_profile}

# Job Role:
{role_profile}

# Match Information:
Match Score: {match_score}
Matched Skills: {matched_skills}
Missing Skills: {missing_skills}

Task: Generate a comprehensive explanation that covers:
1. Why this candidate is a good fit for the role (skills, experience, education)
2. Specific strengths that make them stand out
3. Any potential concerns or skill gaps
4. How their preferences align with the role requirements

Make your explanation HR-friendly, factual, and balanced. Aim for 2-3 paragraphs."#
    )
}

pub const OFFER_EXPLANATION_SYSTEM: &str =
    "You are an expert HR compensation analyst explaining an offer package to a hiring manager. \
     Your goal is to provide clear, concise, and insightful explanations that justify the offer components.";

pub fn offer_explanation_prompt(
    candidate_profile: &str,
    role_profile: &str,
    match_score: i32,
    offer_package: &str,
) -> String {
    format!(
        r#"# Candidate Profile:
{candidate_profile}

# Job Role:
{role_profile}

# Match Information:
Match Score: {match_score}

# Offer Package:
{offer_package}

Task: Generate a comprehensive explanation that covers:
1. Why this offer package is appropriate for the candidate
2. How it aligns with market standards for the role and location
3. Justification for the salary, bonus, and equity components
4. Reasoning behind benefits and work arrangement decisions
5. How the offer accounts for candidate's current compensation and expectations

Make your explanation HR-friendly, factual, and balanced. Aim for 2-3 paragraphs."#
    )
}

//! Prompts for match scoring and blacklist evaluation.

pub const MATCH_SYSTEM: &str =
    "You are an expert HR system designed to match candidates with job roles optimally. \
     You MUST respond with valid JSON only. \
     Do NOT include any text outside the JSON object. \
     Do NOT use markdown code fences.";

pub fn match_prompt(
    candidate_profile: &str,
    role_profile: &str,
    role_benchmarks: &str,
    skill_mapping: &str,
) -> String {
    format!(
        r#"# Candidate Profile:
{candidate_profile}

# Job Role:
{role_profile}

# Similar Role Benchmarks:
{role_benchmarks}

# Skill Mapping Context:
{skill_mapping}

Task: Analyze how well this candidate matches the role based on:
1. Skill alignment (exact and semantic matching)
2. Experience relevance
3. Education/certification fit
4. Candidate preferences match

Provide:
1. A match score (0-100)
2. A list of matched skills
3. A list of missing required skills
4. A detailed explanation of the match quality

Format your response as a valid JSON object with fields:
- match_score (integer)
- skill_match (object with "matched" and "missing" arrays)
- explanation (string)"#
    )
}

pub const BLACKLIST_SYSTEM: &str =
    "You are an AI system responsible for filtering out candidates who do not meet \
     minimum role requirements. You MUST respond with valid JSON only. \
     Do NOT include any text outside the JSON object. \
     Do NOT use markdown code fences.";

pub fn blacklist_prompt(candidate_profile: &str, role_profile: &str) -> String {
    format!(
        r#"# Candidate Profile:
{candidate_profile}

# Job Role:
{role_profile}

# Blacklist Criteria:
1. Missing critical required experience (e.g., years of experience below minimum)
2. Location conflict (e.g., remote-only candidate for on-site role)
3. Missing mandatory skills (e.g., lacking core technical skills)
4. Education mismatch (e.g., missing required degree)
5. Certification mismatch (e.g., missing required certifications)

Task: Evaluate if this candidate should be blacklisted for this role.

Format your response as a valid JSON object with fields:
- blacklist (boolean): true if candidate should be blacklisted, false otherwise
- reason (string): clear explanation of blacklist decision (only if blacklist is true)
- severity (string): "hard" for definite rejections, "soft" for borderline cases (only if blacklist is true)"#
    )
}

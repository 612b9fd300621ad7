//! Prompts for market data and offer package generation.

pub const MARKET_DATA_SYSTEM: &str =
    "You are an expert in compensation and salary benchmarks. \
     Format your response as market research data, not as recommendations.";

pub fn market_data_prompt(
    role_title: &str,
    department: &str,
    location: &str,
    experience: &str,
) -> String {
    format!(
        r#"Based on your knowledge, provide current market data for the following role:

Role: {role_title}
Department: {department}
Location: {location}
Experience Level: {experience}

Include:
1. Salary ranges (low, mid, high)
2. Standard benefits
3. Current demand for this role type
4. Any relevant industry trends affecting compensation"#
    )
}

pub const OFFER_SYSTEM: &str =
    "You are an expert HR compensation analyst responsible for generating fair and \
     competitive offer packages. You MUST respond with valid JSON only. \
     Do NOT include any text outside the JSON object. \
     Do NOT use markdown code fences.";

pub fn offer_prompt(
    candidate_profile: &str,
    role_profile: &str,
    match_score: i32,
    matched_skills: &str,
    missing_skills: &str,
    market_data: &str,
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

# Market Data:
{market_data}

Task: Generate a personalized offer package based on:
1. Skill-demand alignment (high-demand skills warrant higher CTC)
2. Market benchmarks for the role, location, and experience
3. Candidate preferences (remote vs on-site, etc.)
4. Match quality and interview performance
5. Current compensation (aim for 10-20% increase typically)

Provide:
1. Base salary
2. Bonus (if applicable)
3. Equity (if applicable)
4. Benefits package
5. Total CTC
6. Start date recommendation
7. Work arrangement (remote/hybrid/on-site)
8. Detailed explanation of the offer rationale

Format your response as a valid JSON object with fields:
- offer (object with base_salary, bonus, equity, benefits array, total_ctc, start_date, remote)
- explanation (string)"#
    )
}

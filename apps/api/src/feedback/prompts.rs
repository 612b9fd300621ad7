//! Prompt for feedback analysis.

pub const ANALYSIS_SYSTEM: &str =
    "You are an AI learning system analyzing HR feedback to improve recommendations. \
     Your goal is to extract actionable insights from HR feedback to fine-tune future \
     matches and offers. You MUST respond with valid JSON only. \
     Do NOT include any text outside the JSON object. \
     Do NOT use markdown code fences.";

pub fn analysis_prompt(
    entity_type: &str,
    feedback_type: &str,
    comments: &str,
    modifications: &str,
    entity_details: &str,
) -> String {
    format!(
        r#"# Feedback Information:
Entity Type: {entity_type} (match or offer)
Feedback Type: {feedback_type} (approval, rejection, modification)
Comments: {comments}
Modifications: {modifications}

# Entity Details:
{entity_details}

Task: Analyze this feedback and provide:
1. Key learnings from this feedback
2. Specific patterns to reinforce or avoid in future recommendations
3. Parameter adjustments that should be made to the system

Format your response as a valid JSON object with fields:
- learnings (array of string insights)
- patterns (object with "reinforce" and "avoid" arrays)
- parameters (object with parameter name keys and adjustment values)"#
    )
}

// Prompt templates for the two oracles.
// Placeholders are replaced with `str::replace` before the call.

use crate::llm_client::prompts::JSON_ONLY_SYSTEM;

pub fn scoring_system() -> String {
    format!(
        "You are an experienced technical recruiter who evaluates one résumé against one \
        job description and scores the fit honestly. {JSON_ONLY_SYSTEM}"
    )
}

pub fn comparison_system() -> String {
    format!(
        "You are a hiring strategist who compares ranked candidates across several open \
        positions and recommends the best placement for everyone. {JSON_ONLY_SYSTEM}"
    )
}

/// Replace `{job_description}`, `{resume_content}`, `{schema_instruction}` and `{output_schema}`.
pub const SCORING_PROMPT_TEMPLATE: &str = r#"Evaluate the résumé below against the job description.

Score each category as an integer:
- skills_match (0-30)
- experience_relevance (0-30)
- education_fit (0-15)
- cultural_fit (0-10)
- overall_impression (0-15)
and give a total_score from 0 to 100. List concrete key strengths and areas for improvement.

# Job Description
{job_description}

# Résumé
{resume_content}

{schema_instruction}
{output_schema}"#;

/// Replace `{flattened_context}`, `{schema_instruction}` and `{output_schema}`.
pub const COMPARISON_PROMPT_TEMPLATE: &str = r#"Below are several job openings, each followed by the candidates ranked for it with their full evaluations.

Compare every candidate across every job. For each job name the best candidate, for each candidate name the best job, score every job/candidate match from 0.0 to 1.0 with a short explanation, and finish with an overall recommendation.

In the per-job and per-candidate objects, each property stands for the job or candidate quoted in its description; answer with the exact original names as values.

{flattened_context}

{schema_instruction}
{output_schema}"#;

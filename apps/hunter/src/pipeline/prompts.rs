// Judgment prompts for the ranking and tailoring stages.
// Templates are filled with `fill`, which substitutes every `{placeholder}`
// in one pass so braces inside substituted text are never expanded.

/// System prompt for ranking. Combined with `JSON_ONLY_SYSTEM` at call time.
pub const RANKING_SYSTEM: &str = "You are an AI job fit evaluator. Return structured JSON only.";

/// Ranking prompt. Placeholders: {user_query}, {resume_text}, {jobs_json}
pub const RANKING_PROMPT_TEMPLATE: &str = r#"Given:
1) User search query
2) Candidate resume
3) Multiple job descriptions

Score each job from 0-100 based on:
- Skill match
- Relevance to query
- Career alignment
- Internship suitability

Return ONLY a valid JSON array.

Format:
[
  {
    "title": "...",
    "company": "...",
    "description": "...",
    "source_url": "...",
    "match_score": 87,
    "reason": "short explanation"
  }
]

------------------------------------

USER QUERY:
{user_query}

------------------------------------

CANDIDATE RESUME:
{resume_text}

------------------------------------

JOBS:
{jobs_json}

------------------------------------

Copy title, company, description and source_url exactly as given.
match_score must be an integer between 0 and 100.
Return sorted highest match_score first.
Return JSON only."#;

/// System prompt for tailoring.
pub const TAILORING_SYSTEM: &str =
    "You are an AI Career Strategy Assistant and a precise structured-output generator.";

/// Tailoring prompt. Placeholders: {no_fabrication}, {user_query}, {job_title},
/// {company}, {job_description}, {resume_text}
pub const TAILORING_PROMPT_TEMPLATE: &str = r#"Analyze:

1) Candidate Resume
2) Job Description
3) User Search Intent

and generate structured output.

{no_fabrication}

----------------------------------------
USER SEARCH QUERY:
{user_query}

----------------------------------------
JOB TITLE:
{job_title}

COMPANY:
{company}

JOB DESCRIPTION:
{job_description}

----------------------------------------
CANDIDATE RESUME:
{resume_text}

----------------------------------------

OUTPUT REQUIREMENTS:

Return ONLY a valid JSON object with exactly this structure:

{
  "skill_gap_analysis": {
    "missing_skills": [],
    "priority_levels": {
      "high": [],
      "medium": [],
      "low": []
    },
    "learning_recommendations": []
  },
  "cold_email": {
    "subject": "",
    "body": ""
  },
  "tailored_summary": "",
  "skill_emphasis_suggestions": []
}

INSTRUCTIONS:

1. Skill Gap:
   - Compare the job description against the resume.
   - Identify missing technical skills.
   - Prioritize realistically into high, medium and low. Use no other priority keys.
   - Suggest practical learning directions.

2. Cold Email:
   - Professional, 150-200 words.
   - Mention the company name.
   - Reference 1-2 relevant resume projects.
   - Show genuine interest. No exaggeration.

3. Tailored Summary:
   - 2-3 lines, technically strong, system-level thinking.
   - Confident tone, no student fluff.

4. Skill Emphasis Suggestions:
   - Existing resume skills that should be highlighted for this role.
   - No new invented skills.

Return JSON only."#;


/// Substitutes `{name}` placeholders from `values` in a single left-to-right
/// pass. Unknown `{...}` spans (such as the JSON examples above) are kept.
pub fn fill(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];

        let value = after.find('}').and_then(|close| {
            let name = &after[..close];
            values
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (close, *value))
        });

        match value {
            Some((close, value)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}

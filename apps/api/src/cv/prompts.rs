// LLM prompt constants for the CV pipeline.
// Shared fragments live in llm_client::prompts.

pub const CV_PARSE_SYSTEM: &str = "You are an expert CV parser. \
    Extract the content of a CV into structured JSON exactly as written. \
    Never invent information that is not present in the document.";

/// Prefixes the uploaded document (text or inline file).
pub const CV_PARSE_PROMPT: &str = r#"Extract the following CV into a JSON object with this EXACT schema:
{
  "contact": {
    "first_name": "", "last_name": "", "email": null, "phone": null,
    "location": null, "linkedin": null, "website": null, "title": null
  },
  "summary": "",
  "skills": ["..."],
  "languages": ["English (native)"],
  "experience": [
    {"company": "", "role": "", "start_date": "YYYY-MM", "end_date": "YYYY-MM or null if current", "description": ""}
  ],
  "education": [
    {"institution": "", "degree": null, "field": null, "start_date": null, "end_date": null}
  ],
  "certifications": ["..."]
}

Rules:
- Use null for unknown optional fields and [] for empty lists.
- Keep the candidate's own wording in descriptions; join bullet points with newlines.
- Skills are short tool or competency names, one per entry.

CV:
"#;

pub const JD_PARSE_SYSTEM: &str = "You are an expert job description analyst and resume strategist. \
    Parse a job description and extract structured information.";

/// Replace `{jd_text}` before sending.
pub const JD_PARSE_PROMPT_TEMPLATE: &str = r#"Parse the following job description.

Return a JSON object with this EXACT schema (no extra fields):
{
  "job_title": "Senior Data Engineer",
  "seniority": "senior",
  "hard_requirements": [
    {"text": "5+ years Python", "is_required": true}
  ],
  "soft_signals": ["Airflow experience a plus"],
  "keyword_inventory": [
    {"keyword": "Python", "frequency": 4, "position_weight": 0.8, "weighted_score": 3.2}
  ]
}

POSITION WEIGHTS for keyword scoring:
- Title / header: 1.0
- Requirements section ("Required:", "Must have:"): 0.8
- Responsibilities section ("You will:", "Responsibilities:"): 0.6
- About Us / company section: 0.3
weighted_score = frequency * position_weight

HARD REQUIREMENTS: explicit must-haves such as "required", "must have", minimum years.
SOFT SIGNALS: nice-to-haves such as "preferred", "bonus", "plus".
Keywords are concrete skills, tools, domains or qualifications, not filler words.

JOB DESCRIPTION:
{jd_text}"#;

pub const OPTIMIZE_SYSTEM: &str = "You are a senior career coach who tailors CVs to target roles. \
    Rewrite CV content so the candidate's real experience reads as directly relevant to the role.";

/// Replace `{target_role}`, `{job_description}`, `{fidelity}` and `{cv_json}` before sending.
pub const OPTIMIZE_PROMPT_TEMPLATE: &str = r#"Optimize this CV for the role: {target_role}

{job_description}

{fidelity}

Guidelines:
- Rewrite the summary in 2-4 sentences aimed at the target role.
- Reorder skills so the most relevant come first; drop none.
- Rewrite experience descriptions with strong action verbs and keep every metric.
- Keep contact details, employers, dates, education and certifications unchanged.

Return the full CV using the same JSON schema as the input.

CV:
{cv_json}"#;

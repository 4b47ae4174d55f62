// Shared prompt fragments. Each feature keeps its own prompts.rs alongside it.

/// System prompt fragment appended when the caller asks for JSON output.
pub const JSON_ONLY_SYSTEM: &str = "You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Keeps rewrites honest: the model may rephrase but never invent.
pub const FIDELITY_INSTRUCTION: &str = "\
    CRITICAL: Every statement in your output must be supported by the source CV. \
    Do NOT invent employers, dates, degrees, certifications, metrics or skills. \
    You may reorder, rephrase and emphasise existing content only.";

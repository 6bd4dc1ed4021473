// Shared prompt fragments for every judgment call.
// Stage-specific templates live in pipeline::prompts.

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON value. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Instruction appended to any prompt that sees the candidate profile.
pub const NO_FABRICATION_INSTRUCTION: &str = "\
    CRITICAL: DO NOT fabricate experience. \
    DO NOT invent skills that are not mentioned in the candidate resume. \
    Missing skills may only be reported separately as gaps.";

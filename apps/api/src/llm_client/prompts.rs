// Cross-cutting prompt fragments shared by both oracles.
// Oracle-specific templates live in pipeline/prompts.rs.

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Appended to every structured-output prompt, followed by the JSON Schema.
pub const SCHEMA_INSTRUCTION: &str = "\
    Return a single JSON object that validates against the JSON Schema below. \
    Use exactly the property names given; do not add, rename or omit properties.";

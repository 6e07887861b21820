// Shared prompt constants and prompt-building utilities.
// Each service that needs LLM calls defines its own prompts alongside it.
// This file contains cross-cutting prompt fragments.

/// System instruction that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You are a precise, structured assistant. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON value. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Instruction that keeps the model from reaching beyond the supplied document.
pub const EVIDENCE_ONLY_INSTRUCTION: &str = "\
    Base your decision solely on the provided document and criteria. \
    Do not make assumptions or use external knowledge about companies or \
    technologies beyond what is stated.";

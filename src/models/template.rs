//! Built-in Stage Templates
//!
//! Fixed prompt sets a user can apply to replace the current chain.

/// Identifier of the empty template
pub const BLANK_TEMPLATE: &str = "blank";

/// PRD / spec-writing chain
const SPEC_PROMPTS: &[&str] = &[
    "Draft a concise PRD (user problem, goals, constraints) for the requested feature.",
    "Create a structured outline (sections, bullet points) the PRD should follow.",
    "Generate a prioritized task list with owners and acceptance criteria.",
];

/// Bug triage chain
const DEBUG_PROMPTS: &[&str] = &[
    "Summarize the bug report with reproduction steps and expected vs actual behavior.",
    "Infer the likeliest root cause and suspect files given the stack trace.",
    "Produce a step-by-step fix plan plus regression checks.",
];

/// Content-marketing chain
const CONTENT_PROMPTS: &[&str] = &[
    "Brainstorm 5 differentiated angles for this idea with target audience included.",
    "Develop a strong headline and subhead for the best angle.",
    "Write 3 social captions with hashtags and a 1-sentence CTA.",
];

const BLANK_PROMPTS: &[&str] = &[""];

/// All known template identifiers
pub const TEMPLATE_IDS: &[&str] = &[BLANK_TEMPLATE, "spec", "debug", "content"];

/// Prompts for a template id. Unknown ids fall back to the blank template.
pub fn template_prompts(template_id: &str) -> &'static [&'static str] {
    match template_id {
        "spec" => SPEC_PROMPTS,
        "debug" => DEBUG_PROMPTS,
        "content" => CONTENT_PROMPTS,
        _ => BLANK_PROMPTS,
    }
}

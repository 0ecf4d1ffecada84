use once_cell::sync::Lazy;
use regex::Regex;

use crate::ai::backend::ChatBackend;
use crate::ai::prompts::{render_template, PromptSet, EXTRACT_USER_TEXT, TAILOR_USER_TEXT};
use crate::error::ProfilError;
use crate::model::profile::{Mode, Profile, ProjectRequirements};

const EXTRACT_MAX_TOKENS: u32 = 4096;
const TAILOR_MAX_TOKENS: u32 = 8192;

static FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```[a-zA-Z]*\s*(.*?)\s*(?:```\s*)?$").unwrap());

/// Unwraps a markdown-fenced block; a response without fences passes through
/// trimmed. The chat backends are told not to fence, but do anyway at times.
pub fn strip_markdown_fence(raw: &str) -> String {
    let trimmed = raw.trim();
    if !trimmed.starts_with("```") {
        return trimmed.to_string();
    }
    match FENCE.captures(trimmed).and_then(|c| c.get(1)) {
        Some(m) => m.as_str().trim().to_string(),
        None => trimmed.to_string(),
    }
}

fn parse_profile(raw: &str) -> crate::error::Result<Profile> {
    let cleaned = strip_markdown_fence(raw);
    serde_json::from_str(&cleaned)
        .map_err(|e| ProfilError::ExtractionParseFailure(e.to_string()))
}

/// Structures a raw transcript into a profile via the chat backend.
pub fn extract_profile(
    backend: &dyn ChatBackend,
    prompts: &PromptSet,
    transcript: &str,
) -> anyhow::Result<Profile> {
    let user = render_template(EXTRACT_USER_TEXT, &[("rohtext", transcript)]);
    let raw = backend.chat(&prompts.extract, &user, EXTRACT_MAX_TOKENS)?;
    Ok(parse_profile(&raw)?)
}

/// Re-weights a profile against project requirements. Returns a new profile
/// with the tailored mode and project reference set; the input is untouched.
pub fn tailor_profile(
    backend: &dyn ChatBackend,
    prompts: &PromptSet,
    profile: &Profile,
    requirements: &ProjectRequirements,
) -> anyhow::Result<Profile> {
    let profile_json = serde_json::to_string_pretty(profile)?;
    let block = format_requirements(requirements);
    let user = render_template(
        TAILOR_USER_TEXT,
        &[("profil_json", profile_json.as_str()), ("anforderungen", block.as_str())],
    );

    let raw = backend.chat(&prompts.tailor, &user, TAILOR_MAX_TOKENS)?;
    let mut tailored = parse_profile(&raw)?;
    tailored.mode = Mode::Tailored;
    tailored.project_reference = Some(requirements.title.clone());
    Ok(tailored)
}

/// Flat requirements block for the tailoring call: title first, optional
/// lines only when present, full requisition preferred over the short
/// description.
pub fn format_requirements(req: &ProjectRequirements) -> String {
    let mut parts = vec![format!("Projekttitel: {}", req.title)];
    if let Some(industry) = req.industry.as_deref() {
        parts.push(format!("Branche: {industry}"));
    }
    if let Some(duration) = req.duration.as_deref() {
        parts.push(format!("Dauer: {duration}"));
    }
    if !req.required_skills.is_empty() {
        parts.push(format!("Pflicht-Skills: {}", req.required_skills.join(", ")));
    }
    if !req.optional_skills.is_empty() {
        parts.push(format!("Wunsch-Skills: {}", req.optional_skills.join(", ")));
    }
    if !req.raw_posting.is_empty() {
        parts.push(format!("\nVollständige Ausschreibung:\n{}", req.raw_posting));
    } else if !req.description.is_empty() {
        parts.push(format!("\nBeschreibung:\n{}", req.description));
    }
    parts.join("\n")
}

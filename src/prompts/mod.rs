//! Prompt builders for the AI mentor
//!
//! The system prompt establishes the mentor persona; the naming prompt
//! asks the provider for a short session title after the first
//! exchange. Both are injected by the gateway and never persisted in
//! transcripts.

/// System prompt for every mentor completion.
pub const MENTOR_SYSTEM_PROMPT: &str = "You are an AI mentor for Uplevel, a management development platform. \
You help managers apply management concepts to real workplace situations. \
Be practical, supportive, and reference specific Uplevel content when relevant. \
Keep responses conversational and actionable.";

/// Build the prompt used to derive a session name from its opening
/// exchange.
///
/// The caller passes the first user message; the provider is asked for
/// a short title with no surrounding quotes.
///
/// # Examples
///
/// ```
/// use uplevel::prompts::naming_prompt;
///
/// let prompt = naming_prompt("How do I delegate effectively?");
/// assert!(prompt.contains("How do I delegate effectively?"));
/// ```
pub fn naming_prompt(first_user_message: &str) -> String {
    format!(
        "Suggest a very short title (at most five words) for a chat that starts with this \
message. Reply with the title only, no quotes, no punctuation at the end.\n\n{}",
        first_user_message
    )
}

/// Normalize a provider-suggested session name
///
/// Strips surrounding whitespace and quotes, collapses the title onto
/// one line, and caps the length so a rambling completion cannot blow
/// up the session list.
pub fn sanitize_session_name(raw: &str) -> String {
    let first_line = raw.lines().next().unwrap_or("").trim();
    let stripped = first_line.trim_matches(|c| c == '"' || c == '\'').trim();

    let mut name: String = stripped.chars().take(60).collect();
    if stripped.chars().count() > 60 {
        name.push('…');
    }
    name
}

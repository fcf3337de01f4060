//! Conversation transcript formatting.
//!
//! Turns the in-memory history of a session (alternating raw question and
//! answer strings) into the single labeled transcript fed to both the
//! standalone-question prompt and the answer prompt. The exact output format
//! is part of the model's effective input contract: changing a label or the
//! separator changes model behavior, so treat this as a regression-sensitive
//! surface.

/// Format an ordered sequence of turns into a "Human:"/"AI:" transcript.
///
/// Even indices are labeled `Human:`, odd indices `AI:`, joined with a
/// single newline. Empty input yields an empty string.
pub fn format_conv_history(messages: &[String]) -> String {
    messages
        .iter()
        .enumerate()
        .map(|(i, message)| {
            if i % 2 == 0 {
                format!("Human: {message}")
            } else {
                format!("AI: {message}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

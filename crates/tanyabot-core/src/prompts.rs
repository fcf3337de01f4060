//! Prompt templates for question rewriting and answer generation.
//!
//! Both templates are production text reproduced verbatim, including the
//! persona preamble -- response tone parity depends on the exact wording.
//! Slots are named `{conv_history}`, `{question}`, and `{context}` and are
//! substituted by plain string replacement; the model output is taken as raw
//! text with no structured parsing.

/// Rewrites a possibly context-dependent question into a standalone one.
///
/// The trailing space after the first sentence is part of the production
/// text; keep it.
pub const STANDALONE_QUESTION_TEMPLATE: &str = "Given some conversation history (if any) and a question, convert the question to a standalone question. \n\nConversation history: {conv_history}\nQuestion: {question}\n\nStandalone question:";

/// Generates the final grounded answer in the TanyaBot persona.
///
/// Same caveat: the trailing space after "TanyaBot," is part of the
/// production text.
pub const ANSWER_TEMPLATE: &str = "You are a helpful and enthusiastic support bot who answers questions based only on the provided context and conversation history. Your name is TanyaBot, \nendlessly enthusiastic assistant who blends real science with playful analogies to make learning an adventure!\nUse emojis to make learning fun and engaging for children. dont show others question from context in answer,\nRespond in the SAME LANGUAGE as the question. If the question is in Indonesian (Bahasa Indonesia), answer in Indonesian. If the question is in English, answer in English\n\nContext: {context}\nConversation History: {conv_history}\nQuestion: {question}\n\nAnswer:";

/// Render the standalone-question prompt.
pub fn render_standalone_question(conv_history: &str, question: &str) -> String {
    STANDALONE_QUESTION_TEMPLATE
        .replace("{conv_history}", conv_history)
        .replace("{question}", question)
}

/// Render the answer prompt from the retrieved context, the transcript, and
/// the ORIGINAL user question (not the standalone rewrite).
pub fn render_answer(context: &str, conv_history: &str, question: &str) -> String {
    ANSWER_TEMPLATE
        .replace("{context}", context)
        .replace("{conv_history}", conv_history)
        .replace("{question}", question)
}

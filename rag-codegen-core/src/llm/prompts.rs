//! Prompt templates for retrieval-augmented generation and review

use super::types::Message;

const SYSTEM_PROMPT: &str = "You are an expert programmer. Use the pieces of context provided \
with each question to answer it. If you don't know the answer, say that you don't know \
instead of making one up.";

const NO_CONTEXT: &str = "(no related code has been stored yet)";

/// Join retrieved snippets into a single context block
pub fn format_context<'a, I>(snippets: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let blocks: Vec<&str> =
        snippets.into_iter().map(str::trim).filter(|s| !s.is_empty()).collect();

    if blocks.is_empty() { NO_CONTEXT.to_string() } else { blocks.join("\n\n") }
}

/// Messages for a code generation request
pub fn generation_messages(requirement: &str, context: &str) -> Vec<Message> {
    vec![
        Message::system(SYSTEM_PROMPT),
        Message::user(format!(
            "Context:\n{}\n\nQuestion: {}\n\nAnswer with the complete code.",
            context,
            requirement.trim()
        )),
    ]
}

/// Messages asking the model to review a piece of code
pub fn review_messages(code: &str, context: &str) -> Vec<Message> {
    let question = format!(
        "Analyze the following code for vulnerabilities and potential improvements.\n\
         Consider:\n\
         1. Security vulnerabilities\n\
         2. Code quality issues\n\
         3. Performance improvements\n\
         4. Best practices\n\n\
         Code to analyze:\n```\n{}\n```\n\n\
         Provide a detailed analysis.",
        code.trim_end()
    );

    vec![
        Message::system(SYSTEM_PROMPT),
        Message::user(format!("Context:\n{}\n\nQuestion: {}", context, question)),
    ]
}

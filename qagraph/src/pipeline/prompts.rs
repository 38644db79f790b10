//! Prompt templates for the pipeline agents.

/// Phrase the validator is asked to use when the summary lacks context.
pub const NEED_MORE_CONTEXT: &str = "need more context";

pub fn decompose(query: &str, max_subquestions: usize) -> String {
    format!(
        "Break the following question into at most {max} self-contained sub-questions \
         that together answer it. Write one sub-question per line with no numbering \
         and no other text.\n\nQuestion: {query}",
        max = max_subquestions,
        query = query
    )
}

pub fn retrieve(subquestion: &str, chat_history: &str, external_context: Option<&str>) -> String {
    let context = match external_context {
        Some(c) => format!("External context:\n{}\n\n", c),
        None => String::new(),
    };
    format!(
        "Here is the prior conversation context:\n{}\n\n{}Now answer the following \
         sub-question in 2 sentences:\n{}",
        chat_history, context, subquestion
    )
}

pub fn synthesize(responses: &str, chat_history: &str) -> String {
    format!(
        "Here is the prior conversation:\n{}\n\nGiven these pieces of information:\n{}\n\n\
         Summarize the key insight in 3 sentences.",
        chat_history, responses
    )
}

pub fn validate(query: &str, summary: &str) -> String {
    format!(
        "Does this summary properly answer the question?\n\nQuestion: {}\n\nSummary: {}\n\n\
         Answer yes or no and explain briefly. If the summary cannot answer the question \
         without outside information, include the phrase \"{}\".",
        query, summary, NEED_MORE_CONTEXT
    )
}

pub fn explain(summary: &str, chat_history: &str) -> String {
    format!(
        "Here is the chat history:\n{}\n\nExplain this summary in more detail for a \
         technical audience:\n{}",
        chat_history, summary
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    /// **Scenario**: external context is included only when present.
    #[test]
    fn retrieve_includes_context_when_present() {
        let with = retrieve("q?", "User: hi", Some("abstract"));
        assert!(with.contains("External context:\nabstract"));
        assert!(with.ends_with("q?"));
        let without = retrieve("q?", "", None);
        assert!(!without.contains("External context"));
    }

    /// **Scenario**: validator prompt names the phrase the router relies on.
    #[test]
    fn validate_mentions_phrase() {
        assert!(validate("q", "s").contains(NEED_MORE_CONTEXT));
        assert!(decompose("why?", 3).contains("at most 3"));
    }
}

//! Assembles the outbound message list.

use openai_client::Message;

use crate::common::{ConversationTurn, TurnRole};
use crate::data::Instructions;
use crate::kernel::Snippet;

pub const FAQ_HEADING: &str = "# FAQ (summarize when relevant)";
pub const POLICY_HEADING: &str = "# Policy notes (adhere to these)";
pub const SNIPPETS_HEADING: &str = "# Reference snippets (from the knowledge base; cite only if relevant)";

/// System prompt, then FAQ and policy notes, then any retrieved snippets, then
/// the rendered provider context and its availability index.
pub fn compose_system_prompt(
    instructions: &Instructions,
    snippets: &[Snippet],
    provider_context: &str,
    availability_index: Option<&str>,
) -> String {
    let mut sections = vec![instructions.system_prompt().to_string()];

    if let Some(faqs) = &instructions.faqs {
        sections.push(format!("{}\n{}", FAQ_HEADING, faqs));
    }
    if let Some(policies) = &instructions.policies {
        sections.push(format!("{}\n{}", POLICY_HEADING, policies));
    }
    if !snippets.is_empty() {
        let lines: Vec<String> = snippets
            .iter()
            .map(|s| format!("- [{}] {}", s.source, s.text.trim()))
            .collect();
        sections.push(format!("{}\n{}", SNIPPETS_HEADING, lines.join("\n")));
    }
    if !provider_context.is_empty() {
        sections.push(provider_context.to_string());
    }
    if let Some(index) = availability_index {
        sections.push(index.to_string());
    }

    sections.join("\n\n")
}

/// `[system, ...history, user]`
pub fn build_messages(system: String, history: &[ConversationTurn], message: &str) -> Vec<Message> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(Message::system(system));
    messages.extend(history.iter().map(|turn| match turn.role {
        TurnRole::User => Message::user(turn.content.clone()),
        TurnRole::Assistant => Message::assistant(turn.content.clone()),
    }));
    messages.push(Message::user(message));
    messages
}

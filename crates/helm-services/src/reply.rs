use std::time::Duration;

use helm_core::{KnowledgeEntry, Provider};
use tokio::task::JoinHandle;
use uuid::Uuid;

pub const REPLY_DELAY: Duration = Duration::from_millis(1500);

// Aborts the scheduled assistant reply when dropped, so tearing down a chat
// session before the delay elapses never produces a late write.
#[must_use = "dropping a PendingReply cancels the scheduled assistant reply"]
pub struct PendingReply {
    provider_id: Uuid,
    handle: JoinHandle<()>,
}

impl PendingReply {
    pub(crate) fn new(provider_id: Uuid, handle: JoinHandle<()>) -> Self {
        Self {
            provider_id,
            handle,
        }
    }

    pub fn provider_id(&self) -> Uuid {
        self.provider_id
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    pub fn cancel(&self) {
        self.handle.abort();
    }
}

impl Drop for PendingReply {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

pub fn compose_reply(
    provider: &Provider,
    user_input: &str,
    locked_context: &[KnowledgeEntry],
) -> String {
    let mut reply = format!(
        "I'm {}. I received your message: \"{}\"",
        provider.name, user_input
    );

    if !locked_context.is_empty() {
        reply.push_str("\n\n[Using locked knowledge from previous conversations]");
        for entry in locked_context {
            reply.push_str("\n- ");
            reply.push_str(&entry.content);
        }
    }

    reply.push_str(&format!(
        "\n\nThis is a demo response. In a production environment, this would \
         connect to the actual {} API using your configured API key and include \
         context from your locked knowledge base.",
        provider.kind.label()
    ));

    reply
}

#[cfg(test)]
mod tests {
    use super::*;
    use helm_core::ProviderKind;

    #[test]
    fn reply_quotes_the_user_message_and_names_the_provider() {
        let provider = Provider::new("Claude (Anthropic)", ProviderKind::Anthropic, "#D97706", "🧠");
        let reply = compose_reply(&provider, "Hello", &[]);

        assert!(reply.contains("Hello"));
        assert!(reply.contains("Claude (Anthropic)"));
        assert!(reply.contains("anthropic"));
        assert!(!reply.contains("locked knowledge from previous conversations"));
    }

    #[test]
    fn reply_lists_locked_context_when_present() {
        let provider = Provider::new("OpenAI GPT-4", ProviderKind::OpenAi, "#10A37F", "🤖");
        let context = vec![
            KnowledgeEntry::locked("prefers rust", vec!["chat".to_owned()], "OpenAI GPT-4"),
            KnowledgeEntry::locked("hates yaml", vec!["chat".to_owned()], "OpenAI GPT-4"),
        ];
        let reply = compose_reply(&provider, "what do I like?", &context);

        assert!(reply.contains("[Using locked knowledge from previous conversations]"));
        assert!(reply.contains("- prefers rust"));
        assert!(reply.contains("- hates yaml"));
    }
}

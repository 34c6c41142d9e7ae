//! End-to-end tests of the chat pipeline with a mocked completion service.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::*;
use intake_core::domains::intake::{
    ChatError, ChatInput, ReplySource, FALLBACK_REPLY, NOT_CONFIGURED_REPLY, TOKEN_LIMIT_REPLY,
};
use intake_core::kernel::{CompletionError, MockCompletion, MockRetrieval};
use openai_client::FinishReason;
use serde_json::json;

const AZ_THERAPY_AETNA: &str = "I'm in Arizona and want therapy, I have Aetna";

#[tokio::test]
async fn unconfigured_service_returns_canned_reply_with_matches() {
    let service = unconfigured_service();

    let outcome = service
        .handle_at(ChatInput::new(AZ_THERAPY_AETNA), now())
        .await
        .unwrap();

    assert_eq!(outcome.reply, NOT_CONFIGURED_REPLY);
    assert_eq!(outcome.source, ReplySource::NotConfigured);
    assert_eq!(outcome.matched_provider_ids, vec!["prov_001"]);
    assert_eq!(outcome.hints.state.as_deref(), Some("AZ"));
    assert_eq!(outcome.hints.insurer.as_deref(), Some("aetna"));
}

#[tokio::test]
async fn empty_message_is_rejected() {
    let service = unconfigured_service();

    let result = service.handle_at(ChatInput::new("   "), now()).await;

    assert!(matches!(result, Err(ChatError::InvalidInput(_))));
}

#[tokio::test]
async fn model_reply_is_grounded_in_matched_providers() {
    let mock = Arc::new(MockCompletion::new().with_response("Allison Hill looks like a good fit."));
    let service = service_with(mock.clone());

    let outcome = service
        .handle_at(ChatInput::new(AZ_THERAPY_AETNA), now())
        .await
        .unwrap();

    assert_eq!(outcome.reply, "Allison Hill looks like a good fit.");
    assert_eq!(outcome.source, ReplySource::Model);
    assert!(!outcome.nudged);

    let calls = mock.calls();
    assert_eq!(calls.len(), 1);
    let system = calls[0].system_prompt();
    assert!(system.contains("### Allison Hill, PsyD (prov_001)"));
    assert!(system.contains("- [ ] 9:00 AM, Thursday, 01/01/2099"));
    assert!(system.contains("prov_001: 2099-01-01 09:00"));
    assert!(!system.contains("prov_002"));
    assert_eq!(calls[0].messages.last().unwrap().content, AZ_THERAPY_AETNA);
    assert_eq!(calls[0].params.max_tokens, 2048);
}

#[tokio::test]
async fn asking_for_a_list_adds_listing_directive() {
    let mock = Arc::new(MockCompletion::new().with_response("Here are two options."));
    let service = service_with(mock.clone());

    service
        .handle_at(ChatInput::new("I'm in Arizona, can you list some options?"), now())
        .await
        .unwrap();
    service.handle_at(ChatInput::new(AZ_THERAPY_AETNA), now()).await.unwrap();

    let calls = mock.calls();
    assert!(calls[0].system_prompt().contains("The user asked to see providers now"));
    assert!(!calls[1].system_prompt().contains("The user asked to see providers now"));
}

#[tokio::test]
async fn history_is_forwarded_and_token_budget_respected() {
    let mock = Arc::new(MockCompletion::new());
    let service = service_with(mock.clone());

    let input = ChatInput::from_json(&json!({
        "message": "Therapy please",
        "history": [
            {"role": "user", "content": "Hi, I'm in Texas"},
            {"role": "assistant", "content": "Thanks! What kind of care are you looking for?"},
            {"role": "system", "content": "ignored role becomes user"},
            {"role": "assistant", "content": "   "}
        ],
        "max_output_tokens": 4096
    }));
    service.handle_at(input, now()).await.unwrap();

    let call = &mock.calls()[0];
    let roles: Vec<&str> = call.messages.iter().map(|m| m.role.as_str()).collect();
    assert_eq!(roles, vec!["system", "user", "assistant", "user", "user"]);
    assert_eq!(call.params.max_tokens, 4096);
    assert!(call.system_prompt().contains("John Smith"));
}

#[tokio::test]
async fn truncated_reply_gets_continuation_marker() {
    let mock = Arc::new(MockCompletion::new().with_finish("Here are some options", FinishReason::Length));
    let service = service_with(mock.clone());

    let outcome = service.handle_at(ChatInput::new("hello"), now()).await.unwrap();

    assert_eq!(outcome.reply, "Here are some options …");
    assert_eq!(outcome.finish_reason, Some(FinishReason::Length));
}

#[tokio::test]
async fn empty_truncated_reply_asks_to_continue_without_nudging() {
    let mock = Arc::new(MockCompletion::new().with_finish("", FinishReason::Length));
    let service = service_with(mock.clone());

    let outcome = service.handle_at(ChatInput::new("hello"), now()).await.unwrap();

    assert_eq!(outcome.reply, TOKEN_LIMIT_REPLY);
    assert!(!outcome.nudged);
    assert_eq!(mock.call_count(), 1);
}

#[tokio::test]
async fn empty_reply_is_nudged_once() {
    let mock = Arc::new(
        MockCompletion::new()
            .with_response("")
            .with_response("Here is what I found."),
    );
    let service = service_with(mock.clone());

    let outcome = service.handle_at(ChatInput::new("hello"), now()).await.unwrap();

    assert_eq!(outcome.reply, "Here is what I found.");
    assert!(outcome.nudged);

    let calls = mock.calls();
    assert_eq!(calls.len(), 2);
    let retry_last = calls[1].messages.last().unwrap();
    assert_eq!(retry_last.role, "system");
    assert!(retry_last.content.contains("previous reply was empty"));
}

#[tokio::test]
async fn two_empty_replies_fall_back() {
    let mock = Arc::new(MockCompletion::new().with_response("").with_response(""));
    let service = service_with(mock.clone());

    let outcome = service.handle_at(ChatInput::new("hello"), now()).await.unwrap();

    assert_eq!(outcome.reply, FALLBACK_REPLY);
    assert_eq!(outcome.source, ReplySource::Fallback);
    assert_eq!(mock.call_count(), 2);
}

#[tokio::test]
async fn stalled_conversation_is_nudged_toward_options() {
    let mock = Arc::new(
        MockCompletion::new()
            .with_response("Could you tell me a bit more about what you're looking for?")
            .with_response("Here are two options:\n- [ ] Allison Hill"),
    );
    let service = service_with(mock.clone());

    let input = ChatInput::new("I just need someone soon").with_history(vec![
        json!({"role": "user", "content": "hi"}),
        json!({"role": "assistant", "content": "Which state are you in?"}),
        json!({"role": "user", "content": "AZ"}),
        json!({"role": "assistant", "content": "Do you prefer therapy or medication management?"}),
    ]);
    let outcome = service.handle_at(input, now()).await.unwrap();

    assert!(outcome.nudged);
    assert!(outcome.reply.starts_with("Here are two options"));
    assert!(mock.calls()[1]
        .messages
        .last()
        .unwrap()
        .content
        .contains("already asked enough clarifying questions"));
}

#[tokio::test]
async fn upstream_failure_is_reported_without_retry() {
    let mock = Arc::new(MockCompletion::new().with_error(CompletionError::Upstream {
        status: Some(429),
        detail: json!({"error": {"code": "rate_limited"}}),
        message: "API error (429)".into(),
    }));
    let service = service_with(mock.clone());

    let result = service.handle_at(ChatInput::new("hello"), now()).await;

    match result {
        Err(ChatError::Upstream { status, detail, .. }) => {
            assert_eq!(status, Some(429));
            assert_eq!(detail["error"]["code"], "rate_limited");
        }
        other => panic!("expected upstream error, got {:?}", other.map(|o| o.reply)),
    }
    assert_eq!(mock.call_count(), 1);
}

#[tokio::test]
async fn slow_completion_times_out() {
    let mock = Arc::new(
        MockCompletion::new()
            .with_response("too late")
            .with_delay(Duration::from_millis(500)),
    );
    let service = service_with_timeout(mock, Duration::from_millis(20));

    let result = service.handle_at(ChatInput::new("hello"), now()).await;

    assert!(matches!(result, Err(ChatError::Timeout(_))));
}

#[tokio::test]
async fn snippets_and_faq_reach_the_prompt() {
    let mock = Arc::new(MockCompletion::new());
    let retrieval = Arc::new(MockRetrieval::new().with_snippet("Intake calls take 15 minutes.", "intake.md"));
    let service = service_with_retrieval(mock.clone(), retrieval.clone());

    service.handle_at(ChatInput::new("How long is intake?"), now()).await.unwrap();

    let system = mock.calls()[0].system_prompt().to_string();
    assert!(system.starts_with("You are the intake assistant for Example Clinic."));
    assert!(system.contains("# FAQ (summarize when relevant)\nQ: Do you take Medicaid?"));
    assert!(system.contains("- [intake.md] Intake calls take 15 minutes."));
    assert_eq!(retrieval.queries(), vec!["How long is intake?"]);
}

#[tokio::test]
async fn failing_retrieval_is_ignored() {
    let mock = Arc::new(MockCompletion::new().with_response("Sure."));
    let service = service_with_retrieval(mock.clone(), Arc::new(MockRetrieval::failing()));

    let outcome = service.handle_at(ChatInput::new("hello"), now()).await.unwrap();

    assert_eq!(outcome.reply, "Sure.");
    assert!(!mock.calls()[0].system_prompt().contains("# Reference snippets"));
}

// =============================================================================
// Times requests answered from the schedule
// =============================================================================

#[tokio::test]
async fn times_request_is_answered_from_schedule() {
    let mock = Arc::new(MockCompletion::new());
    let service = service_with(mock.clone());

    let outcome = service
        .handle_at(ChatInput::new("What times does Allison Hill have available?"), now())
        .await
        .unwrap();

    assert_eq!(outcome.source, ReplySource::SlotListing);
    assert!(outcome.reply.starts_with("Here are the next openings for Allison Hill, PsyD:"));
    assert!(outcome.reply.contains("- [ ] 9:00 AM, Thursday, 01/01/2099"));
    assert!(outcome.reply.contains("- [ ] 1:00 PM, Thursday, 01/01/2099"));
    assert!(outcome.reply.contains("- [ ] 10:00 AM, Friday, 01/02/2099"));
    assert!(!outcome.reply.contains("01/05/2099"));
    assert_eq!(outcome.matched_provider_ids, vec!["prov_001"]);
    assert_eq!(mock.call_count(), 0);
}

#[tokio::test]
async fn more_times_pages_past_what_was_shown() {
    let service = unconfigured_service();

    let first = service
        .handle_at(ChatInput::new("What times does Allison Hill have?"), now())
        .await
        .unwrap();

    let input = ChatInput::new("Can you show me more times?").with_history(vec![
        json!({"role": "user", "content": "What times does Allison Hill have?"}),
        json!({"role": "assistant", "content": first.reply}),
    ]);
    let outcome = service.handle_at(input, now()).await.unwrap();

    assert!(outcome.reply.starts_with("Here are later openings for Allison Hill, PsyD:"));
    assert!(outcome.reply.contains("- [ ] 3:30 PM, Monday, 01/05/2099"));
    assert!(!outcome.reply.contains("01/01/2099"));
}

#[tokio::test]
async fn more_times_past_the_end_says_so() {
    let service = unconfigured_service();

    let input = ChatInput::new("Any later times for Allison Hill?").with_history(vec![json!({
        "role": "assistant",
        "content": "- [ ] 3:30 PM, Monday, 01/05/2099"
    })]);
    let outcome = service.handle_at(input, now()).await.unwrap();

    assert!(outcome.reply.starts_with("I don't see any more openings for Allison Hill, PsyD"));
}

#[tokio::test]
async fn shared_last_name_asks_which_provider() {
    let service = unconfigured_service();

    let outcome = service
        .handle_at(ChatInput::new("What times does Smith have?"), now())
        .await
        .unwrap();

    assert_eq!(outcome.source, ReplySource::SlotListing);
    assert!(outcome.reply.starts_with("I found more than one provider by that name."));
    let jane = outcome.reply.find("Jane Smith").unwrap();
    let john = outcome.reply.find("John Smith").unwrap();
    assert!(jane < john, "soonest opening should be listed first");
    assert_eq!(outcome.matched_provider_ids, vec!["prov_004", "prov_003"]);
}

#[tokio::test]
async fn shared_last_name_resolved_by_state_from_history() {
    let service = unconfigured_service();

    let input = ChatInput::new("What times does Smith have?")
        .with_history(vec![json!({"role": "user", "content": "I live in Texas"})]);
    let outcome = service.handle_at(input, now()).await.unwrap();

    assert!(outcome.reply.starts_with("Here are the next openings for John Smith, LPC:"));
    assert!(outcome.reply.contains("11:00 AM, Sunday, 01/04/2099"));
}

#[tokio::test]
async fn unknown_name_falls_through_to_model() {
    let mock = Arc::new(MockCompletion::new().with_response("I don't see that provider."));
    let service = service_with(mock.clone());

    let outcome = service
        .handle_at(ChatInput::new("What times does Dr. Nobody have?"), now())
        .await
        .unwrap();

    assert_eq!(outcome.source, ReplySource::Model);
    assert_eq!(mock.call_count(), 1);
}

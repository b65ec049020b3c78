//! Tests for cinegraph-agent: History, AgentRuntime decision loop, Conversation turn contract

use cinegraph_agent::*;
use cinegraph_core::{CinegraphConfig, Error, Speaker, Turn, NOT_IN_DATABASE};
use cinegraph_graph::MemoryGraph;
use cinegraph_llm::{ContentBlock, LlmContent, LlmMessage, MockBehavior, MockProvider};
use cinegraph_tools::{CapabilityRegistry, InformationTool, ResolutionOrchestrator};
use serde_json::json;
use std::sync::Arc;

const COUNT_ACTORS: &str = "MATCH (a:Person)-[:ACTED_IN]->(:Movie) RETURN count(DISTINCT a)";

fn runtime_with(
    provider: &Arc<MockProvider>,
    graph: MemoryGraph,
    config: &CinegraphConfig,
) -> Arc<AgentRuntime> {
    let orchestrator = Arc::new(ResolutionOrchestrator::from_config(
        Arc::new(graph),
        provider.clone(),
        config,
    ));
    let registry = CapabilityRegistry::new(InformationTool::new(orchestrator));
    Arc::new(AgentRuntime::new(
        provider.clone(),
        registry,
        AgentConfig::from_config(config),
    ))
}

fn runtime(provider: &Arc<MockProvider>) -> Arc<AgentRuntime> {
    runtime_with(provider, MemoryGraph::movies(), &CinegraphConfig::default())
}

fn ask_information(entity: &str, question: &str) -> MockBehavior {
    MockBehavior::tool("Information", json!({"entity": entity, "user_input": question}))
}

// ===========================================================================
// History
// ===========================================================================

#[test]
fn history_formats_pairs_in_order() {
    let pairs = [
        ("user", "Who played in The Matrix?"),
        ("bot", "Keanu Reeves, Carrie-Anne Moss"),
        ("user", "What else were they in?"),
        ("bot", "The Matrix Reloaded"),
        ("user", "Thanks"),
        ("agent", "You're welcome"),
    ];
    let history = History::from_pairs(pairs).unwrap();
    let messages = history.format();

    assert_eq!(messages.len(), 6);
    for (i, (message, (_, text))) in messages.iter().zip(pairs.iter()).enumerate() {
        let role = if i % 2 == 0 { "user" } else { "assistant" };
        assert_eq!(message.role, role);
        assert_eq!(message.text(), *text);
    }
}

#[test]
fn history_rejects_unknown_speaker() {
    let err = History::from_pairs([("user", "hi"), ("system", "be nice")]).unwrap_err();
    assert!(matches!(err, Error::MalformedHistory(_)));
}

#[test]
fn history_append_preserves_order() {
    let mut history = History::new();
    assert!(history.is_empty());
    history.append(Turn::user("a"));
    history.append(Turn::agent("b"));
    assert_eq!(history.len(), 2);
    assert_eq!(history.turns()[0].speaker(), Speaker::User);
    assert_eq!(history.turns()[1].text(), "b");
}

// ===========================================================================
// Feedback
// ===========================================================================

#[test]
fn feedback_prefix_detection() {
    assert!(Conversation::is_feedback("feedback: call me Mrs. Doubtfire"));
    assert!(Conversation::is_feedback("  Feedback: too long"));
    assert!(Conversation::is_feedback("FEEDBACK:x"));
    assert!(!Conversation::is_feedback("feedback"));
    assert!(!Conversation::is_feedback("Give feedback: no"));
}

#[tokio::test]
async fn feedback_is_stored_without_a_bot_turn() {
    let provider = Arc::new(MockProvider::constant(MockBehavior::text("unused")));
    let mut conversation = Conversation::new(runtime(&provider));

    let directive = "feedback: Please refer to me as Mrs. Doubtfire every response";
    let reply = conversation.submit(directive).await.unwrap();

    assert_eq!(reply, Reply::FeedbackRecorded);
    assert_eq!(conversation.history().turns(), &[Turn::user(directive)]);
    assert_eq!(provider.call_count(), 0);

    conversation.record_feedback("The answer was too short");
    assert_eq!(conversation.history().len(), 2);
    assert_eq!(conversation.history().turns()[1].text(), "Feedback: The answer was too short");
}

#[tokio::test]
async fn feedback_is_sent_with_next_question() {
    let provider = Arc::new(MockProvider::sequence(vec![
        ask_information("Sleepless in Seattle", "Tell me about Sleepless in Seattle"),
        MockBehavior::text("Mrs. Doubtfire, it is a 1993 movie."),
    ]));
    let mut conversation = Conversation::new(runtime(&provider));
    conversation.submit("feedback: call me Mrs. Doubtfire").await.unwrap();
    conversation.submit("Tell me about Sleepless in Seattle").await.unwrap();

    let first = &provider.requests()[0];
    assert_eq!(first.messages[0], LlmMessage::user("feedback: call me Mrs. Doubtfire"));
    assert_eq!(first.messages[1], LlmMessage::user("Tell me about Sleepless in Seattle"));
    assert_eq!(conversation.history().len(), 3);
}

// ===========================================================================
// End-to-end turns
// ===========================================================================

#[tokio::test]
async fn matrix_question_is_answered_from_lookup() {
    let provider = Arc::new(MockProvider::sequence(vec![
        ask_information("The Matrix", "Who played in The Matrix?"),
        MockBehavior::text("Keanu Reeves, Carrie-Anne Moss, Laurence Fishburne and Hugo Weaving."),
    ]));
    let mut conversation = Conversation::new(runtime(&provider));

    let reply = conversation.submit("Who played in The Matrix?").await.unwrap();
    assert_eq!(
        reply,
        Reply::Answer("Keanu Reeves, Carrie-Anne Moss, Laurence Fishburne and Hugo Weaving.".into())
    );
    assert_eq!(conversation.history().len(), 2);
    // no synthesis or QA calls: only the two agent decisions
    assert_eq!(provider.call_count(), 2);

    let second = &provider.requests()[1];
    assert_eq!(second.messages.len(), 3);
    assert_eq!(second.temperature, None);
    match &second.messages[2].content {
        LlmContent::Blocks(blocks) => match &blocks[0] {
            ContentBlock::ToolResult { content, is_error, .. } => {
                assert!(content.contains("ACTED_IN: Keanu Reeves"));
                assert_eq!(*is_error, None);
            }
            other => panic!("expected tool result, got {:?}", other),
        },
        other => panic!("expected blocks, got {:?}", other),
    }
}

#[tokio::test]
async fn count_question_falls_back_to_synthesis() {
    let provider = Arc::new(MockProvider::sequence(vec![
        ask_information("actors", "How many actors are there in the graph?"),
        MockBehavior::text(COUNT_ACTORS),
        MockBehavior::text("There are 102 actors in the graph."),
        MockBehavior::text("There are 102 actors in the graph."),
    ]));
    let graph = MemoryGraph::movies()
        .with_response(COUNT_ACTORS, vec![json!({"count(DISTINCT a)": 102})]);
    let runtime = runtime_with(&provider, graph, &CinegraphConfig::default());

    let output = runtime.run_turn("How many actors are there in the graph?", &[]).await.unwrap();
    assert_eq!(output.output, "There are 102 actors in the graph.");
    assert!(output.grounded());
    assert_eq!(output.steps.len(), 1);
    assert_eq!(output.steps[0].result, "There are 102 actors in the graph.");
    assert_eq!(provider.call_count(), 4);
    assert_eq!(provider.requests()[1].temperature, Some(0.0));
}

#[tokio::test]
async fn tool_definitions_are_offered() {
    let provider = Arc::new(MockProvider::sequence(vec![
        ask_information("The Matrix", "Who directed The Matrix?"),
        MockBehavior::text("The Wachowskis."),
    ]));
    runtime(&provider).run_turn("Who directed The Matrix?", &[]).await.unwrap();

    let request = &provider.requests()[0];
    let tools = request.tools.as_ref().unwrap();
    assert_eq!(tools.len(), 1);
    assert_eq!(tools[0].name, "Information");
    assert!(request.system.as_deref().unwrap().contains("Information tool"));
}

// ===========================================================================
// Grounding and limits
// ===========================================================================

#[tokio::test]
async fn ungrounded_answer_is_retried() {
    let provider = Arc::new(MockProvider::sequence(vec![
        MockBehavior::text("Keanu Reeves, I believe."),
        ask_information("The Matrix", "Who played in The Matrix?"),
        MockBehavior::text("Keanu Reeves and others."),
    ]));
    let output = runtime(&provider).run_turn("Who played in The Matrix?", &[]).await.unwrap();

    assert_eq!(output.output, "Keanu Reeves and others.");
    let retry = &provider.requests()[1];
    assert_eq!(retry.messages[1], LlmMessage::assistant("Keanu Reeves, I believe."));
    assert!(retry.messages[2].text().contains("Call the Information tool"));
}

#[tokio::test]
async fn exhausted_grounding_retries_yield_sentinel() {
    let provider = Arc::new(MockProvider::constant(MockBehavior::text("From memory: Keanu.")));
    let output = runtime(&provider).run_turn("Who played in The Matrix?", &[]).await.unwrap();

    assert_eq!(output.output, NOT_IN_DATABASE);
    assert!(!output.grounded());
    // first answer plus two retries
    assert_eq!(provider.call_count(), 3);
}

#[tokio::test]
async fn unknown_capability_is_reported_and_not_grounding() {
    let provider = Arc::new(MockProvider::sequence(vec![
        MockBehavior::tool("Search", json!({"q": "matrix"})),
        MockBehavior::text("Done."),
        ask_information("The Matrix", "Who played in The Matrix?"),
        MockBehavior::text("Keanu Reeves."),
    ]));
    let output = runtime(&provider).run_turn("Who played in The Matrix?", &[]).await.unwrap();

    assert_eq!(output.output, "Keanu Reeves.");
    assert!(output.steps[0].is_error);
    assert!(output.steps[0].result.contains("Tool not found"));
    assert!(!output.steps[1].is_error);
}

#[tokio::test]
async fn endless_tool_calls_hit_iteration_limit() {
    let provider = Arc::new(MockProvider::constant(ask_information("The Matrix", "Who?")));
    let mut config = CinegraphConfig::default();
    config.agent.max_iterations = 3;
    let runtime = runtime_with(&provider, MemoryGraph::movies(), &config);

    let err = runtime.run_turn("Who?", &[]).await.unwrap_err();
    assert!(matches!(err, Error::IterationLimit(3)));
    assert_eq!(provider.call_count(), 3);
}

#[tokio::test]
async fn history_window_bounds_prompt() {
    let provider = Arc::new(MockProvider::sequence(vec![
        ask_information("The Matrix", "And the director?"),
        MockBehavior::text("The Wachowskis."),
    ]));
    let mut config = CinegraphConfig::default();
    config.agent.history_window = 2;
    let runtime = runtime_with(&provider, MemoryGraph::movies(), &config);

    let history = History::from_pairs([
        ("user", "q1"),
        ("bot", "a1"),
        ("user", "Who played in The Matrix?"),
        ("bot", "Keanu Reeves."),
    ])
    .unwrap();
    runtime.run_turn("And the director?", history.turns()).await.unwrap();

    let messages = &provider.requests()[0].messages;
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[0], LlmMessage::user("Who played in The Matrix?"));
}

#[tokio::test]
async fn failed_turn_leaves_history_untouched() {
    let provider = Arc::new(MockProvider::constant(MockBehavior::Error("overloaded".into())));
    let mut conversation = Conversation::new(runtime(&provider));

    let err = conversation.submit("Who played in The Matrix?").await.unwrap_err();
    assert!(matches!(err, Error::Llm { .. }));
    assert!(conversation.history().is_empty());
}

// ===========================================================================
// Background turns
// ===========================================================================

#[tokio::test]
async fn spawned_turn_folds_into_history() {
    let provider = Arc::new(MockProvider::sequence(vec![
        ask_information("Sleepless in Seattle", "Who directed Sleepless in Seattle?"),
        MockBehavior::text("Nora Ephron."),
    ]));
    let mut conversation = Conversation::new(runtime(&provider));

    let pending = conversation.spawn_turn("Who directed Sleepless in Seattle?");
    assert_eq!(pending.input(), "Who directed Sleepless in Seattle?");
    let answer = conversation.complete_turn(pending).await.unwrap();

    assert_eq!(answer, "Nora Ephron.");
    let turns = conversation.history().turns();
    assert_eq!(turns.len(), 2);
    assert_eq!(turns[0], Turn::user("Who directed Sleepless in Seattle?"));
    assert_eq!(turns[1], Turn::agent("Nora Ephron."));
}

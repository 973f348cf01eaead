//! End-to-end scenarios: a research agent delegating to an email agent over
//! a scripted provider.

use std::sync::Arc;

use futures::StreamExt;
use serde_json::json;

use tandem_agent_research::{
    email_agent_with_tools, email_delegation, email_toolset, DraftStore, EmailDraft,
    InMemoryDraftStore, ResearchSystem,
};
use tandem_config::Config;
use tandem_protocols::agent::{Agent, AgentConfig, FailurePolicy, NestedTrace};
use tandem_protocols::deps::Dependencies;
use tandem_protocols::error::AgentError;
use tandem_protocols::event::StreamEvent;
use tandem_protocols::provider::LLMProvider;
use tandem_protocols::types::{ToolCallRecord, ToolCallStatus};
use tandem_protocols::usage::{UsageLedger, UsageSnapshot};
use tandem_provider_scripted::{ScriptedProvider, ScriptedTurn};
use tandem_runtime::{RunOutcome, RunRequest, Runner};

const PROMPT: &str = "Find out how async Rust works and email a summary to ana@example.com";

fn draft_args() -> serde_json::Value {
    json!({
        "recipient": "ana@example.com",
        "subject": "Rust findings",
        "body": "Hi Ana, Tokio drives async Rust."
    })
}

fn research_turns() -> Vec<ScriptedTurn> {
    vec![
        ScriptedTurn::tool_call("search_web", json!({"query": "rust async"})).with_usage(100, 20),
        ScriptedTurn::tool_call(
            "create_email_draft",
            json!({
                "recipient": "ana@example.com",
                "subject": "Rust findings",
                "context": "Tokio drives async Rust."
            }),
        )
        .with_usage(200, 30),
        ScriptedTurn::text("I researched async Rust and drafted an email to Ana.").with_usage(260, 15),
    ]
}

fn email_turns() -> Vec<ScriptedTurn> {
    vec![
        ScriptedTurn::tool_call("draft_email", draft_args()).with_usage(80, 40),
        ScriptedTurn::text(draft_args().to_string()).with_usage(150, 50),
    ]
}

fn scripted() -> Arc<ScriptedProvider> {
    Arc::new(
        ScriptedProvider::new()
            .with_turns("research", research_turns())
            .with_turns("email", email_turns()),
    )
}

fn system(config: Config, provider: &Arc<ScriptedProvider>) -> (ResearchSystem, Arc<InMemoryDraftStore>) {
    let drafts = Arc::new(InMemoryDraftStore::new());
    let system = ResearchSystem::builder(config)
        .provider(Arc::clone(provider) as Arc<dyn LLMProvider>)
        .draft_store(Arc::clone(&drafts) as Arc<dyn DraftStore>)
        .build()
        .unwrap();
    (system, drafts)
}

/// Record contents that must not vary between identical runs.
fn stable(records: &[ToolCallRecord]) -> Vec<(String, String, String, ToolCallStatus, bool)> {
    records
        .iter()
        .map(|r| {
            (
                r.call_id.clone(),
                r.tool_name.clone(),
                r.result_summary.clone(),
                r.status,
                r.delegated,
            )
        })
        .collect()
}

#[tokio::test]
async fn test_research_and_email() {
    let provider = scripted();
    let mut config = Config::default();
    config
        .delegate
        .deps
        .insert("signature".to_string(), json!("-- Research Bot"));
    let (system, drafts) = system(config, &provider);

    let report = system.run(PROMPT).await;
    assert_eq!(report.kind(), RunOutcome::Completed);
    let result = report.outcome.unwrap();
    assert_eq!(result.data, "I researched async Rust and drafted an email to Ana.");

    // Exactly one record for the delegation, in model order.
    let names: Vec<&str> = result.tool_calls.iter().map(|r| r.tool_name.as_str()).collect();
    assert_eq!(names, vec!["search_web", "create_email_draft"]);
    let delegated: Vec<_> = result.delegated_calls().collect();
    assert_eq!(delegated.len(), 1);
    assert_eq!(delegated[0].result_summary, "Draft to ana@example.com: Rust findings");
    assert_eq!(delegated[0].arguments["recipient"], "ana@example.com");
    assert!(delegated[0].succeeded());
    assert!(delegated[0].nested.is_none());

    // One ledger for the whole tree.
    assert_eq!(result.usage.requests_issued, 5);
    assert_eq!(result.usage.units_consumed, 120 + 230 + 275 + 120 + 200);
    assert_eq!(report.usage, result.usage);

    let stored = drafts.list();
    assert_eq!(stored.len(), 1);
    assert_eq!(
        stored[0].draft,
        serde_json::from_value::<EmailDraft>(draft_args()).unwrap()
    );

    // The delegate sees the rendered sub-prompt and its own deps only.
    let email_request = &provider.requests_for("email")[0];
    let sub_prompt = email_request.last_user_text().unwrap();
    assert!(sub_prompt.contains("ana@example.com"));
    assert!(sub_prompt.contains("Tokio drives async Rust."));
    assert_eq!(
        email_request.deps.get::<String>("signature").as_deref(),
        Some("-- Research Bot")
    );
    assert!(!provider.requests_for("research")[0].deps.contains("signature"));
}

#[tokio::test]
async fn test_empty_prompt_leaves_ledger_untouched() {
    let provider = scripted();
    let (system, _drafts) = system(Config::default(), &provider);
    let ledger = Arc::new(UsageLedger::new());

    let report = system.run_on("  \n", Arc::clone(&ledger)).await;
    assert!(matches!(report.outcome, Err(AgentError::InvalidInput(_))));
    assert_eq!(ledger.snapshot(), UsageSnapshot::default());
    assert!(provider.requests().is_empty());
}

#[tokio::test]
async fn test_ledger_is_monotonic_across_delegation() {
    let provider = scripted();
    let (system, _drafts) = system(Config::default(), &provider);

    let mut handle = system.run_stream(PROMPT);
    let mut snapshots = Vec::new();
    while let Some(event) = handle.events().next().await {
        if let StreamEvent::RunFinished { usage, depth, .. } = event {
            snapshots.push((depth, usage));
        }
    }
    let report = handle.join().await.unwrap();

    assert_eq!(snapshots.len(), 2);
    let (email_depth, after_email) = snapshots[0];
    let (research_depth, after_research) = snapshots[1];
    assert_eq!(email_depth, 1);
    assert_eq!(research_depth, 0);
    assert!(after_research.covers(&after_email));
    // The delegate's charges land on the same ledger before the parent finishes.
    assert_eq!(after_email.units_consumed, 120 + 230 + 120 + 200);
    assert_eq!(report.usage, after_research);
}

#[tokio::test]
async fn test_failed_delegation_is_recovered_and_recorded() {
    let provider = Arc::new(
        ScriptedProvider::new()
            .with_turns("research", research_turns())
            .with_turns("email", [ScriptedTurn::text("Sorry, I can't help with that.")]),
    );
    let (system, drafts) = system(Config::default(), &provider);

    let report = system.run(PROMPT).await;
    assert_eq!(report.kind(), RunOutcome::Degraded);
    let result = report.outcome.unwrap();
    assert_eq!(result.degradations.len(), 1);
    assert_eq!(result.degradations[0].tool_name, "create_email_draft");

    let record = result.delegated_calls().next().unwrap();
    assert_eq!(record.status, ToolCallStatus::Failed);
    assert!(record.result_summary.contains("email"));
    assert!(drafts.is_empty());

    // The failure is fed back to the model rather than hidden.
    let last = provider.requests_for("research").pop().unwrap();
    let feedback = last.messages.last().unwrap();
    assert!(feedback.content.starts_with("Error:"));
}

#[tokio::test]
async fn test_failed_delegation_is_fatal_when_configured() {
    let provider = Arc::new(
        ScriptedProvider::new()
            .with_turns("research", research_turns())
            .with_turns("email", [ScriptedTurn::text("Sorry, I can't help with that.")]),
    );
    let mut config = Config::default();
    config.orchestrator.agent.failure_policy = FailurePolicy::Fatal;
    let (system, _drafts) = system(config, &provider);

    let report = system.run(PROMPT).await;
    assert_eq!(report.kind(), RunOutcome::Failed);
    match report.outcome {
        Err(AgentError::DelegationFailure { tool, cause }) => {
            assert_eq!(tool, "create_email_draft");
            assert!(matches!(*cause, AgentError::GenerationFailure(_)));
        }
        other => panic!("Expected DelegationFailure, got {:?}", other.map(|r| r.data)),
    }
    // The trace up to the failure is still reported.
    assert_eq!(report.tool_calls.len(), 2);
    assert!(report.tool_calls[1].delegated);
    assert_eq!(provider.remaining("research"), 1);
}

#[tokio::test]
async fn test_identical_runs_with_fresh_ledgers_match() {
    let first_provider = scripted();
    let second_provider = scripted();
    let (first, _) = system(Config::default(), &first_provider);
    let (second, _) = system(Config::default(), &second_provider);

    let a = first.run(PROMPT).await;
    let b = second.run(PROMPT).await;

    let a = a.outcome.unwrap();
    let b = b.outcome.unwrap();
    assert_eq!(a.data, b.data);
    assert_eq!(a.usage, b.usage);
    assert_eq!(stable(&a.tool_calls), stable(&b.tool_calls));
}

#[tokio::test]
async fn test_shared_ledger_accumulates_across_runs() {
    let provider = Arc::new(
        ScriptedProvider::new()
            .with_turns("research", [ScriptedTurn::text("One.").with_usage(5, 5)])
            .with_turns("research", [ScriptedTurn::text("Two.").with_usage(5, 5)]),
    );
    let (system, _drafts) = system(Config::default(), &provider);
    let ledger = Arc::new(UsageLedger::new());

    system.run_on("first", Arc::clone(&ledger)).await;
    let report = system.run_on("second", Arc::clone(&ledger)).await;
    assert_eq!(report.usage.requests_issued, 2);
    assert_eq!(ledger.snapshot().units_consumed, 20);
}

/// research -> email -> email_relay, each link a `create_email_draft`-style
/// delegation.
fn relay_chain(provider: &Arc<ScriptedProvider>) -> tandem_agent_research::ResearchAgent {
    let llm = Arc::clone(provider) as Arc<dyn LLMProvider>;
    let store: Arc<dyn DraftStore> = Arc::new(InMemoryDraftStore::new());

    let relay = Arc::new(email_agent_with_tools(
        AgentConfig::new("email_relay", "Relay", "stub-model"),
        Arc::clone(&llm),
        email_toolset(Arc::clone(&store)).build().unwrap(),
    ));
    let email = Arc::new(email_agent_with_tools(
        AgentConfig::new("email", "Email Writer", "stub-model"),
        Arc::clone(&llm),
        email_toolset(Arc::clone(&store))
            .delegate(Arc::new(email_delegation(
                "forward_email",
                relay,
                Dependencies::new(),
                NestedTrace::Opaque,
            )))
            .build()
            .unwrap(),
    ));
    tandem_agent_research::research_agent(
        AgentConfig::new("research", "Research Assistant", "stub-model"),
        llm,
        Arc::new(tandem_agent_research::StaticSearchBackend::sample()),
        Arc::new(email_delegation(
            "create_email_draft",
            email,
            Dependencies::new(),
            NestedTrace::Opaque,
        )),
    )
    .unwrap()
}

fn forwarding_email_turns() -> Vec<ScriptedTurn> {
    vec![
        ScriptedTurn::tool_call(
            "forward_email",
            json!({"recipient": "bob@example.com", "subject": "Fwd", "context": "..."}),
        )
        .with_usage(10, 10),
        ScriptedTurn::text(draft_args().to_string()),
    ]
}

#[tokio::test]
async fn test_delegate_delegating_further_hits_depth_limit() {
    let provider = Arc::new(
        ScriptedProvider::new()
            .with_turns("research", research_turns())
            .with_turns("email", forwarding_email_turns())
            .with_turns("email_relay", [ScriptedTurn::text(draft_args().to_string())]),
    );
    let research = relay_chain(&provider);

    let report = Runner::new().run(&research, RunRequest::new(PROMPT)).await;
    assert!(matches!(
        report.outcome,
        Err(AgentError::DelegationDepthExceeded { depth: 2, max: 1 })
    ));
    assert!(provider.requests_for("email_relay").is_empty());
    assert_eq!(provider.remaining("email_relay"), 1);
    assert_eq!(research.id(), "research");
}

#[tokio::test]
async fn test_failure_recovered_two_levels_down_degrades_the_run() {
    let provider = Arc::new(
        ScriptedProvider::new()
            .with_turns("research", research_turns())
            .with_turns("email", forwarding_email_turns())
            .with_turns("email_relay", [ScriptedTurn::text("not json")]),
    );
    let research = relay_chain(&provider);

    let report = Runner::new()
        .with_max_depth(2)
        .run(&research, RunRequest::new(PROMPT))
        .await;
    assert_eq!(report.kind(), RunOutcome::Degraded);
    let result = report.outcome.unwrap();
    assert_eq!(result.degradations.len(), 1);
    assert_eq!(result.degradations[0].tool_name, "create_email_draft/forward_email");
    assert!(result.degradations[0].reason.contains("not valid output"));

    // The email agent itself recovered, so its delegation record succeeded.
    let record = result.delegated_calls().next().unwrap();
    assert_eq!(record.tool_name, "create_email_draft");
    assert!(record.succeeded());
    assert_eq!(provider.requests_for("email_relay").len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_stops_nested_run_from_charging() {
    let provider = Arc::new(
        ScriptedProvider::new()
            .with_turns("research", research_turns())
            .with_turns(
                "email",
                [ScriptedTurn::text(draft_args().to_string())
                    .with_usage(1_000, 1_000)
                    .with_delay_ms(60_000)],
            ),
    );
    let (system, drafts) = system(Config::default(), &provider);

    let mut handle = system.run_stream(PROMPT);
    let signal = handle.abort_signal();
    let mut events = Vec::new();
    while let Some(event) = handle.events().next().await {
        if matches!(event, StreamEvent::RunStarted { depth: 1, .. }) {
            signal.abort();
        }
        events.push(event);
    }
    let report = handle.join().await.unwrap();

    assert!(matches!(report.outcome, Err(AgentError::Cancelled)));
    assert_eq!(report.usage.units_consumed, 120 + 230);
    assert_eq!(report.usage.requests_issued, 2);
    assert!(drafts.is_empty());

    // Both the orchestrator and the interrupted delegate end in RunFailed.
    for depth in [0, 1] {
        let failed = events
            .iter()
            .filter(|e| e.depth() == depth && matches!(e, StreamEvent::RunFailed { .. }))
            .count();
        assert_eq!(failed, 1, "depth {}", depth);
    }
    let delegation_closed = events.iter().any(|e| {
        matches!(e, StreamEvent::ToolCallComplete { depth: 0, record, .. }
            if record.tool_name == "create_email_draft" && !record.succeeded())
    });
    assert!(delegation_closed);
}

#[tokio::test]
async fn test_attached_nested_trace() {
    let provider = scripted();
    let mut config = Config::default();
    config.delegation.nested_trace = NestedTrace::Attached;
    let (system, _drafts) = system(config, &provider);

    let result = system.run(PROMPT).await.outcome.unwrap();
    let record = result.delegated_calls().next().unwrap();
    let nested = record.nested.as_ref().unwrap();
    assert_eq!(nested.len(), 1);
    assert_eq!(nested[0].tool_name, "draft_email");
    assert!(nested[0].succeeded());
    // Nested records never leak into the parent's own list.
    assert_eq!(result.tool_calls.len(), 2);
}

#[tokio::test]
async fn test_bundled_demo_script() {
    let config = tandem_config::ConfigLoader::load_str(include_str!("../../../../config/tandem.toml")).unwrap();
    let script =
        tandem_provider_scripted::Script::from_json(include_str!("../../../../demos/research_email.json"))
            .unwrap();
    let provider = Arc::new(ScriptedProvider::from_script(script));
    let (system, drafts) = system(config, &provider);

    let report = system.run("How does async Rust work? Email the answer to ana@example.com").await;
    assert_eq!(report.kind(), RunOutcome::Completed);
    let result = report.outcome.unwrap();

    let search = &result.tool_calls[0];
    assert_eq!(search.tool_name, "search_web");
    assert!(search.succeeded());
    let delegated = result.delegated_calls().next().unwrap();
    assert_eq!(delegated.nested.as_ref().unwrap()[0].tool_name, "draft_email");
    assert_eq!(drafts.len(), 1);
    assert_eq!(result.usage.units_consumed, 138 + 474 + 560 + 220 + 300);
}

#[tokio::test]
async fn test_quantum_computing_research_and_email() {
    let prompt = "Research quantum computing and email the findings to a@b.com";
    let draft = json!({
        "recipient": "a@b.com",
        "subject": "Quantum computing findings",
        "body": "Quantum computers use qubits, which can hold superpositions of 0 and 1."
    });
    let provider = Arc::new(
        ScriptedProvider::new()
            .with_turns(
                "research",
                [
                    ScriptedTurn::tool_call("search_web", json!({"query": "quantum computing"})),
                    ScriptedTurn::tool_call(
                        "create_email_draft",
                        json!({
                            "recipient": "a@b.com",
                            "subject": "Quantum computing findings",
                            "context": "Quantum computers use qubits."
                        }),
                    ),
                    ScriptedTurn::text(
                        "Quantum computing relies on qubits and superposition. \
                         I drafted an email to a@b.com with these findings.",
                    ),
                ],
            )
            .with_turns(
                "email",
                [
                    ScriptedTurn::tool_call("draft_email", draft.clone()),
                    ScriptedTurn::text(draft.to_string()),
                ],
            ),
    );
    let backend = tandem_agent_research::StaticSearchBackend::new(vec![tandem_agent_research::SearchHit::new(
        "Quantum computing",
        "https://en.wikipedia.org/wiki/Quantum_computing",
        "A quantum computer exploits superposition and entanglement of qubits.",
    )]);
    let drafts = Arc::new(InMemoryDraftStore::new());
    let system = ResearchSystem::builder(Config::default())
        .provider(Arc::clone(&provider) as Arc<dyn LLMProvider>)
        .search_backend(Arc::new(backend))
        .draft_store(Arc::clone(&drafts) as Arc<dyn DraftStore>)
        .build()
        .unwrap();

    let report = system.run(prompt).await;
    assert_eq!(report.kind(), RunOutcome::Completed);
    let result = report.outcome.unwrap();

    let text = result.data.to_lowercase();
    assert!(text.contains("quantum computing"));
    assert!(text.contains("email"));
    assert!(text.contains("a@b.com"));

    let delegated: Vec<_> = result.delegated_calls().collect();
    assert_eq!(delegated.len(), 1);
    assert_eq!(delegated[0].arguments["recipient"], "a@b.com");
    assert_eq!(
        delegated[0].result_summary,
        "Draft to a@b.com: Quantum computing findings"
    );

    let stored = drafts.list();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].draft.recipient, "a@b.com");
    assert_eq!(result.usage.requests_issued, 5);

    let email_request = &provider.requests_for("email")[0];
    let sub_prompt = email_request.last_user_text().unwrap();
    assert!(sub_prompt.contains("a@b.com"));
    assert!(sub_prompt.contains("Quantum computers use qubits."));
    assert_eq!(provider.requests_for("research")[0].last_user_text().unwrap(), prompt);
}

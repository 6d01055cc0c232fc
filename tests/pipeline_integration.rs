//! End-to-end pipeline tests: a raw message dropped into the spool
//! becomes a delivered reply, with only the model and the SMTP relay
//! faked out.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use chrono::Utc;
use mail_agent::agent::{AgentExecutor, FALLBACK_REPLY, PromptContext};
use mail_agent::config::AgentConfig;
use mail_agent::email::EmailEvent;
use mail_agent::error::{LlmError, TransportError};
use mail_agent::llm::{ChatMessage, ModelClient};
use mail_agent::pipeline::Pipeline;
use mail_agent::store::{MessageStore, SpoolStore};
use mail_agent::tools::{Tool, ToolRegistry};
use mail_agent::transport::MailTransport;

/// Replays scripted completions in order.
struct ScriptedModel {
    responses: Mutex<Vec<String>>,
}

impl ScriptedModel {
    fn new(responses: &[&str]) -> Arc<Self> {
        let mut remaining: Vec<String> = responses.iter().map(|s| s.to_string()).collect();
        remaining.reverse();
        Arc::new(Self {
            responses: Mutex::new(remaining),
        })
    }
}

#[async_trait]
impl ModelClient for ScriptedModel {
    async fn complete(&self, _messages: &[ChatMessage]) -> Result<String, LlmError> {
        self.responses
            .lock()
            .unwrap()
            .pop()
            .ok_or_else(|| LlmError::InvalidResponse {
                reason: "script exhausted".to_string(),
            })
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

#[derive(Default)]
struct RecordingTransport {
    sent: Mutex<Vec<(String, String, String)>>,
}

#[async_trait]
impl MailTransport for RecordingTransport {
    async fn deliver(&self, to: &str, subject: &str, body: &str) -> Result<(), TransportError> {
        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), subject.to_string(), body.to_string()));
        Ok(())
    }
}

struct ShippingTool;

#[async_trait]
impl Tool for ShippingTool {
    fn name(&self) -> &str {
        "shipping_lookup"
    }

    fn description(&self) -> &str {
        "look up shipping status for an order number"
    }

    async fn invoke(&self, input: &str) -> Result<String, mail_agent::error::ToolError> {
        Ok(format!("order {} shipped yesterday", input.trim()))
    }
}

struct Harness {
    _dir: tempfile::TempDir,
    store: Arc<SpoolStore>,
    transport: Arc<RecordingTransport>,
    pipeline: Arc<Pipeline>,
}

impl Harness {
    async fn new(model: Arc<dyn ModelClient>) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(SpoolStore::new(dir.path()));
        store.ensure_dirs().await.unwrap();

        let mut tools = ToolRegistry::new();
        tools.register(Arc::new(ShippingTool));
        let tools = Arc::new(tools);

        let context = PromptContext {
            agent_name: "Jeff".to_string(),
            agent_email: "agent@example.com".to_string(),
            info_source: Some("https://example.com/docs".to_string()),
            tools: tools.descriptors(),
        };
        let executor = Arc::new(AgentExecutor::new(
            model,
            tools,
            context,
            3,
            Duration::from_secs(30),
        ));

        let config = AgentConfig {
            agent_email: "agent@example.com".to_string(),
            spool_dir: dir.path().to_path_buf(),
            poll_interval: Duration::from_millis(20),
            ..AgentConfig::default()
        };

        let transport = Arc::new(RecordingTransport::default());
        let pipeline = Arc::new(Pipeline::new(
            config,
            store.clone(),
            transport.clone(),
            executor,
        ));

        Self {
            _dir: dir,
            store,
            transport,
            pipeline,
        }
    }

    async fn spool(&self, id: &str, from: &str, subject: &str, body: &str) {
        let raw = format!(
            "From: {from}\r\nTo: agent@example.com\r\nSubject: {subject}\r\n\r\n{body}\r\n"
        );
        let path = self.store.root().join("emails").join(id);
        tokio::fs::write(path, raw).await.unwrap();
    }

    fn sent(&self) -> Vec<(String, String, String)> {
        self.transport.sent.lock().unwrap().clone()
    }
}

fn event(id: &str, from: &str, subject: &str) -> EmailEvent {
    EmailEvent {
        message_id: id.to_string(),
        sender: from.to_string(),
        subject: subject.to_string(),
        received_at: Utc::now(),
    }
}

#[tokio::test]
async fn one_shot_answer_flows_from_spool_to_reply() {
    let model = ScriptedModel::new(&[
        "Thought: I can answer directly\nFinal Answer: Your order is on the way.",
    ]);
    let harness = Harness::new(model).await;
    harness
        .spool("msg-1", "alice@customer.test", "Order #42", "Where is order 42?")
        .await;

    harness
        .pipeline
        .process_message(&event("msg-1", "alice@customer.test", "Order #42"))
        .await
        .unwrap();

    let sent = harness.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, "alice@customer.test");
    assert_eq!(sent[0].1, "RE:Order #42");
    assert_eq!(sent[0].2, "Your order is on the way.");
    assert!(harness.store.fetch("msg-1").await.is_err());
}

#[tokio::test]
async fn tool_assisted_answer_reaches_the_customer() {
    let model = ScriptedModel::new(&[
        "Thought: I should check shipping\nAction: shipping_lookup\nAction Input: 42",
        "Thought: I now know the final answer\nFinal Answer: Order 42 shipped yesterday.",
    ]);
    let harness = Harness::new(model).await;
    harness
        .spool("msg-1", "alice@customer.test", "Order #42", "Where is order 42?")
        .await;

    harness
        .pipeline
        .process_message(&event("msg-1", "alice@customer.test", "Order #42"))
        .await
        .unwrap();

    assert_eq!(harness.sent()[0].2, "Order 42 shipped yesterday.");
}

#[tokio::test]
async fn malformed_output_every_turn_falls_back_to_stock_reply() {
    let model = ScriptedModel::new(&["??", "??", "??"]);
    let harness = Harness::new(model).await;
    harness
        .spool("msg-1", "alice@customer.test", "Hello", "Hi there")
        .await;

    harness
        .pipeline
        .process_message(&event("msg-1", "alice@customer.test", "Hello"))
        .await
        .unwrap();

    let sent = harness.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].2, FALLBACK_REPLY);
}

#[tokio::test]
async fn near_miss_final_answer_is_recovered() {
    let model = ScriptedModel::new(&["the final answer: Your refund was issued."]);
    let harness = Harness::new(model).await;
    harness
        .spool("msg-1", "alice@customer.test", "Refund", "Any update?")
        .await;

    harness
        .pipeline
        .process_message(&event("msg-1", "alice@customer.test", "Refund"))
        .await
        .unwrap();

    assert_eq!(harness.sent()[0].2, "Your refund was issued.");
}

#[tokio::test]
async fn scan_picks_up_new_spool_files() {
    let model = ScriptedModel::new(&["Final Answer: Got it, thanks!"]);
    let harness = Harness::new(model).await;
    harness
        .spool("msg-1", "alice@customer.test", "Hello", "Hi there")
        .await;

    Arc::clone(&harness.pipeline).scan_once().await;

    for _ in 0..100 {
        if !harness.sent().is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(harness.sent().len(), 1);
    assert_eq!(harness.sent()[0].1, "RE:Hello");
}

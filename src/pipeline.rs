//! The per-email pipeline and the spool poller that feeds it.
//!
//! One inbound message flows fetch -> normalize -> reasoning loop ->
//! sanitize -> deliver. Each stage degrades rather than halts: a failed
//! fetch proceeds with an empty body, and the sanitizer guarantees
//! there is always reply text. Only delivery failure ends the unit
//! without a reply; the message is still removed from the spool so a
//! poisoned email cannot wedge the poller.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use tokio::sync::Semaphore;

use crate::agent::{AgentExecutor, sanitize};
use crate::config::AgentConfig;
use crate::email::{EmailEvent, InboundEmail, normalize};
use crate::error::PipelineError;
use crate::store::MessageStore;
use crate::transport::MailTransport;

/// Everything needed to turn one spooled email into a sent reply.
pub struct Pipeline {
    config: AgentConfig,
    store: Arc<dyn MessageStore>,
    transport: Arc<dyn MailTransport>,
    executor: Arc<AgentExecutor>,
    /// Ids currently being processed or already dispatched this scan.
    in_flight: Mutex<HashSet<String>>,
    permits: Arc<Semaphore>,
}

impl Pipeline {
    pub fn new(
        config: AgentConfig,
        store: Arc<dyn MessageStore>,
        transport: Arc<dyn MailTransport>,
        executor: Arc<AgentExecutor>,
    ) -> Self {
        let permits = Arc::new(Semaphore::new(config.max_concurrent));
        Self {
            config,
            store,
            transport,
            executor,
            in_flight: Mutex::new(HashSet::new()),
            permits,
        }
    }

    /// Polls the spool until ctrl-c, dispatching each new message id at
    /// most once and holding concurrency to `max_concurrent`.
    pub async fn run(self: Arc<Self>) {
        let mut ticker = tokio::time::interval(self.config.poll_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        tracing::info!(
            spool = %self.store_root_display(),
            interval = ?self.config.poll_interval,
            "Spool poller started"
        );

        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Shutdown signal received, stopping poller");
                    break;
                }
                _ = ticker.tick() => {
                    Arc::clone(&self).scan_once().await;
                }
            }
        }
    }

    /// One spool scan: build the envelope for every id not already in
    /// flight and dispatch it. Senderless and self-addressed messages
    /// are dropped here, before any model work.
    pub async fn scan_once(self: Arc<Self>) {
        let ids = match self.store.list().await {
            Ok(ids) => ids,
            Err(err) => {
                tracing::warn!(error = %err, "Spool scan failed, will retry next tick");
                return;
            }
        };

        for message_id in ids {
            if !self.claim(&message_id) {
                continue;
            }

            let raw = match self.store.fetch(&message_id).await {
                Ok(raw) => raw,
                Err(err) => {
                    // Possibly transient; leave the file for the next tick.
                    tracing::warn!(message_id = %message_id, error = %err, "Unreadable at scan");
                    self.release(&message_id);
                    continue;
                }
            };

            let Some(mut event) = EmailEvent::from_raw(&raw) else {
                tracing::warn!(message_id = %message_id, "No sender address, dropping message");
                self.discard(&message_id).await;
                self.release(&message_id);
                continue;
            };
            if event.sender.eq_ignore_ascii_case(&self.config.agent_email) {
                tracing::info!(message_id = %message_id, "Own message, dropping to avoid a reply loop");
                self.discard(&message_id).await;
                self.release(&message_id);
                continue;
            }
            // The spool filename is authoritative over the Message-ID
            // header: it is the key the scan dedupes and removes by.
            event.message_id = message_id.clone();

            let pipeline = Arc::clone(&self);
            tokio::spawn(async move {
                let _permit = match pipeline.permits.clone().acquire_owned().await {
                    Ok(permit) => permit,
                    // Closed only at shutdown.
                    Err(_) => return,
                };
                if let Err(err) = pipeline.process_message(&event).await {
                    tracing::error!(message_id = %event.message_id, error = %err, "Reply failed");
                }
                pipeline.release(&event.message_id);
            });
        }
    }

    /// Runs the full per-email pipeline for one envelope.
    ///
    /// The body is fetched here, separately from the scan that built the
    /// envelope; a failed fetch degrades to an empty body and the reply
    /// is still attempted from sender and subject alone. The message
    /// leaves the spool after exactly one delivery attempt.
    pub async fn process_message(&self, event: &EmailEvent) -> Result<(), PipelineError> {
        let message_id = event.message_id.as_str();
        tracing::info!(message_id = %message_id, "Processing inbound email");

        let raw = match self.store.fetch(message_id).await {
            Ok(raw) => raw,
            Err(err) => {
                tracing::warn!(
                    message_id = %message_id,
                    error = %err,
                    "Fetch failed, continuing with empty body"
                );
                Vec::new()
            }
        };

        let email = InboundEmail {
            sender: event.sender.clone(),
            subject: event.subject.clone(),
            raw_body: raw,
            message_id: message_id.to_string(),
        };

        let request = normalize(&email);
        let outcome = self.executor.run(&request).await;
        let result = sanitize(outcome);
        if result.used_fallback {
            tracing::warn!(message_id = %message_id, "Replying with fallback text");
        }

        let reply_subject = format!("RE:{}", event.subject);
        let delivery = self
            .transport
            .deliver(&event.sender, &reply_subject, &result.final_text)
            .await;

        // One attempt per message, success or not.
        self.discard(message_id).await;

        match delivery {
            Ok(()) => {
                tracing::info!(
                    message_id = %message_id,
                    to = %event.sender,
                    used_fallback = result.used_fallback,
                    "Reply sent"
                );
                Ok(())
            }
            Err(err) => Err(PipelineError::DeliveryFailed {
                message_id: message_id.to_string(),
                reason: err.to_string(),
            }),
        }
    }

    fn claim(&self, message_id: &str) -> bool {
        match self.in_flight.lock() {
            Ok(mut set) => set.insert(message_id.to_string()),
            Err(_) => false,
        }
    }

    fn release(&self, message_id: &str) {
        if let Ok(mut set) = self.in_flight.lock() {
            set.remove(message_id);
        }
    }

    async fn discard(&self, message_id: &str) {
        if let Err(err) = self.store.remove(message_id).await {
            tracing::warn!(message_id = %message_id, error = %err, "Failed to remove spooled message");
        }
    }

    fn store_root_display(&self) -> String {
        self.config.spool_dir.display().to_string()
    }
}

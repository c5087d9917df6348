//! In-memory scripted provider for tests.
//!
//! Records every request it receives so tests can assert on how many
//! sessions were opened and what history each completion carried.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use jarvis_types::llm::{CompletionRequest, CompletionResponse, LlmError, StopReason, Usage};

use super::provider::LlmProvider;

#[derive(Default)]
struct Script {
    requests: Mutex<Vec<CompletionRequest>>,
    instructions: Mutex<Vec<String>>,
    replies: Mutex<VecDeque<String>>,
    open_calls: AtomicUsize,
    fail_open: AtomicBool,
    fail_complete: AtomicBool,
    open_delay_ms: AtomicU64,
    complete_delay_ms: AtomicU64,
}

/// Provider double whose behaviour is scripted by the test.
///
/// Clones share state: keep one clone for assertions and hand another to
/// `BoxLlmProvider::new`.
#[derive(Clone)]
pub struct ScriptedProvider {
    script: Arc<Script>,
    model: String,
}

impl ScriptedProvider {
    pub fn new(model: &str) -> Self {
        Self {
            script: Arc::new(Script::default()),
            model: model.to_string(),
        }
    }

    /// Queue a reply. When the queue is empty, replies echo the turn number.
    pub fn push_reply(&self, reply: &str) -> &Self {
        self.script
            .replies
            .lock()
            .unwrap()
            .push_back(reply.to_string());
        self
    }

    pub fn set_fail_open(&self, fail: bool) {
        self.script.fail_open.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_complete(&self, fail: bool) {
        self.script.fail_complete.store(fail, Ordering::SeqCst);
    }

    /// Delay every `open_session` call, widening first-contact races.
    pub fn set_open_delay(&self, delay: Duration) {
        self.script
            .open_delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn set_complete_delay(&self, delay: Duration) {
        self.script
            .complete_delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn open_calls(&self) -> usize {
        self.script.open_calls.load(Ordering::SeqCst)
    }

    /// System instructions passed to `open_session`, in call order.
    pub fn instructions(&self) -> Vec<String> {
        self.script.instructions.lock().unwrap().clone()
    }

    /// Every completion request received, in call order.
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.script.requests.lock().unwrap().clone()
    }
}

impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn open_session(&self, system_instruction: &str) -> Result<(), LlmError> {
        self.script.open_calls.fetch_add(1, Ordering::SeqCst);

        let delay = self.script.open_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }

        if self.script.fail_open.load(Ordering::SeqCst) {
            return Err(LlmError::Unreachable("scripted open failure".to_string()));
        }

        self.script
            .instructions
            .lock()
            .unwrap()
            .push(system_instruction.to_string());
        Ok(())
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let delay = self.script.complete_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }

        let turn = {
            let mut requests = self.script.requests.lock().unwrap();
            requests.push(request.clone());
            requests.len()
        };

        if self.script.fail_complete.load(Ordering::SeqCst) {
            return Err(LlmError::Provider {
                message: "scripted completion failure".to_string(),
            });
        }

        let content = self
            .script
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| format!("reply {turn}"));

        Ok(CompletionResponse {
            content,
            model: self.model.clone(),
            stop_reason: StopReason::EndTurn,
            usage: Usage::default(),
        })
    }
}

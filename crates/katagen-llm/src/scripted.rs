//! Deterministic LLM substitute for tests: pops queued responses and
//! records every request it saw.

use std::collections::VecDeque;

use async_trait::async_trait;
use parking_lot::Mutex;

use katagen_core::error::CollaboratorError;
use katagen_core::external::{CompletionRequest, CompletionResponse, LlmClient};

/// Replays queued responses in order. An exhausted script reports a
/// transport failure, which the core treats as fatal.
#[derive(Debug, Default)]
pub struct ScriptedClient {
    responses: Mutex<VecDeque<String>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedClient {
    pub fn new(responses: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().map(Into::into).collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Append another scripted response.
    pub fn push(&self, response: impl Into<String>) {
        self.responses.lock().push_back(response.into());
    }

    /// Every request received so far, in call order.
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().clone()
    }

    pub fn remaining(&self) -> usize {
        self.responses.lock().len()
    }
}

#[async_trait]
impl LlmClient for ScriptedClient {
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, CollaboratorError> {
        self.requests.lock().push(request);
        let text = self
            .responses
            .lock()
            .pop_front()
            .ok_or_else(|| CollaboratorError::Transport("scripted responses exhausted".into()))?;
        Ok(CompletionResponse { text })
    }
}

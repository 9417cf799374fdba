//! Advisor clients: the HTTP chat-completions implementation and test
//! doubles.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use fleet_core::config::AdvisorConfig;
use serde::{Deserialize, Serialize};

use crate::error::{AdvisorError, AdvisorResult};

// ── Advisor trait ─────────────────────────────────────────────────────────────

/// One round trip to the external reasoning provider.
///
/// Stateless at the protocol level; implementations must tolerate
/// concurrent calls (`Send + Sync`).  The caller supplies the deadline —
/// the matcher and adapter run on different budgets.
pub trait Advisor: Send + Sync {
    fn advise(&self, system_prompt: &str, user_prompt: &str, timeout: Duration)
        -> AdvisorResult<String>;
}

// ── Chat-completions wire format ──────────────────────────────────────────────

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f64,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: String,
}

// ── ChatAdvisor ───────────────────────────────────────────────────────────────

/// Blocking client for an OpenAI-compatible chat-completions endpoint.
///
/// Temperature is kept low — the agents want deterministic reasoning, not
/// creativity — and responses are single text blocks, no streaming.
pub struct ChatAdvisor {
    http: reqwest::blocking::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
    temperature: f64,
    max_tokens: u32,
}

impl ChatAdvisor {
    pub fn new(config: &AdvisorConfig) -> Self {
        Self {
            http: reqwest::blocking::Client::new(),
            base_url: config.base_url.clone(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }
}

impl Advisor for ChatAdvisor {
    fn advise(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        timeout: Duration,
    ) -> AdvisorResult<String> {
        let body = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage { role: "system", content: system_prompt },
                ChatMessage { role: "user", content: user_prompt },
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let mut request = self.http.post(&self.base_url).timeout(timeout).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().map_err(|e| {
            if e.is_timeout() {
                AdvisorError::Timeout { budget_secs: timeout.as_secs_f64() }
            } else if e.is_connect() {
                AdvisorError::Connection(e.to_string())
            } else {
                AdvisorError::Api(e.to_string())
            }
        })?;

        match response.status().as_u16() {
            429 => {
                tracing::warn!("advisor rate limit exceeded");
                return Err(AdvisorError::RateLimited);
            }
            401 | 403 => {
                tracing::warn!("advisor rejected credentials");
                return Err(AdvisorError::Auth);
            }
            code if code >= 400 => {
                return Err(AdvisorError::Api(format!("HTTP {code}")));
            }
            _ => {}
        }

        let parsed: ChatResponse = response
            .json()
            .map_err(|e| AdvisorError::Api(format!("undecodable response: {e}")))?;

        Ok(parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .unwrap_or_default())
    }
}

// ── Test / offline advisors ───────────────────────────────────────────────────

/// Replays a fixed sequence of responses, then repeats the last one.
/// Drives deterministic tests and the offline demo.
pub struct ScriptedAdvisor {
    responses: Mutex<VecDeque<String>>,
    last: Mutex<String>,
}

impl ScriptedAdvisor {
    pub fn new(responses: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().map(Into::into).collect()),
            last: Mutex::new(String::new()),
        }
    }

    /// An advisor that answers every call with the same text.
    pub fn always(text: impl Into<String>) -> Self {
        Self::new([text.into()])
    }
}

impl Advisor for ScriptedAdvisor {
    fn advise(&self, _system: &str, _user: &str, _timeout: Duration) -> AdvisorResult<String> {
        let mut queue = self.responses.lock().expect("scripted advisor poisoned");
        match queue.pop_front() {
            Some(next) => {
                let mut last = self.last.lock().expect("scripted advisor poisoned");
                last.clone_from(&next);
                Ok(next)
            }
            None => Ok(self.last.lock().expect("scripted advisor poisoned").clone()),
        }
    }
}

/// Fails every call with a timeout.  Exercises the rule-based fallbacks.
pub struct FailingAdvisor;

impl Advisor for FailingAdvisor {
    fn advise(&self, _system: &str, _user: &str, timeout: Duration) -> AdvisorResult<String> {
        Err(AdvisorError::Timeout { budget_secs: timeout.as_secs_f64() })
    }
}

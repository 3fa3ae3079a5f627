//! Shared fixtures: a scripted in-memory invoker and sample responses

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use crate::error::ProviderFailure;
use crate::invoker::{InvocationResult, Invoker};
use crate::payload::PromptPayload;
use crate::registry::CandidateModel;

/// One scripted reply
#[derive(Debug, Clone)]
pub struct Step {
    pub delay: Duration,
    pub result: InvocationResult,
}

pub fn ok(text: &str) -> Step {
    Step {
        delay: Duration::ZERO,
        result: Ok(text.to_string()),
    }
}

pub fn transient() -> Step {
    Step {
        delay: Duration::ZERO,
        result: Err(ProviderFailure::transient("RESOURCE_EXHAUSTED", "quota exceeded").with_status_code(429)),
    }
}

pub fn permanent() -> Step {
    Step {
        delay: Duration::ZERO,
        result: Err(ProviderFailure::permanent("NOT_FOUND", "model not found").with_status_code(404)),
    }
}

pub fn slow(delay: Duration, step: Step) -> Step {
    Step { delay, ..step }
}

/// Invoker replaying per-candidate scripts and recording every call
pub struct ScriptedInvoker {
    scripts: Mutex<HashMap<String, VecDeque<Step>>>,
    calls: Mutex<Vec<String>>,
    credential: bool,
}

impl ScriptedInvoker {
    pub fn new() -> Self {
        Self {
            scripts: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            credential: true,
        }
    }

    pub fn without_credential() -> Self {
        Self {
            credential: false,
            ..Self::new()
        }
    }

    pub fn script(self, candidate: &str, steps: Vec<Step>) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(candidate.to_string(), steps.into());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self, candidate: &str) -> usize {
        self.calls().iter().filter(|c| c.as_str() == candidate).count()
    }
}

#[async_trait]
impl Invoker for ScriptedInvoker {
    fn name(&self) -> &str {
        "scripted"
    }

    fn has_credential(&self) -> bool {
        self.credential
    }

    async fn invoke(&self, candidate: &CandidateModel, _payload: &PromptPayload) -> InvocationResult {
        self.calls.lock().unwrap().push(candidate.id().to_string());

        let step = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(candidate.id())
            .and_then(VecDeque::pop_front);

        match step {
            Some(step) => {
                if !step.delay.is_zero() {
                    tokio::time::sleep(step.delay).await;
                }
                step.result
            }
            None => Err(ProviderFailure::permanent("UNSCRIPTED", "no scripted reply left")),
        }
    }
}

/// A schema-valid result as the provider would return it
pub fn valid_result_json() -> String {
    json!({
        "score": {
            "total": 85,
            "dimensions": [
                { "label": "structure", "score": 88, "comment": "Clear paragraphs." },
                { "label": "content", "score": 82, "comment": "Solid examples." },
                { "label": "language", "score": 86, "comment": "Vivid wording." },
                { "label": "grammar", "score": 84, "comment": "Few mistakes." }
            ]
        },
        "feedback": "A well organized essay with room for deeper analysis.",
        "suggestions": ["Expand the second argument.", "Tighten the conclusion."],
        "quotes": [
            { "text": "The pen is mightier than the sword.", "author": "Edward Bulwer-Lytton" },
            { "text": "Brevity is the soul of wit.", "author": "William Shakespeare" }
        ]
    })
    .to_string()
}

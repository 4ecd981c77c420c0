use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use slotwise_core::agent::LanguageModel;
use slotwise_core::{EmailMessage, Mailer};
use slotwise_domain::{Result as DomainResult, SlotwiseError, User};

/// Records every message instead of delivering it
#[derive(Default, Clone)]
pub struct RecordingMailer {
    sent: Arc<Mutex<Vec<EmailMessage>>>,
    failing: Arc<AtomicBool>,
}

impl RecordingMailer {
    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn subjects(&self) -> Vec<String> {
        self.sent().into_iter().map(|m| m.subject).collect()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, _sender: &User, message: &EmailMessage) -> DomainResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(SlotwiseError::Network("smtp down".into()));
        }
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }
}

/// Language model returning a fixed reply
#[derive(Clone)]
pub struct CannedModel {
    pub reply: String,
    pub prompts: Arc<Mutex<Vec<String>>>,
}

impl CannedModel {
    pub fn new(reply: &str) -> Self {
        Self { reply: reply.to_string(), prompts: Arc::default() }
    }
}

#[async_trait]
impl LanguageModel for CannedModel {
    async fn complete(&self, _system_prompt: &str, user_message: &str) -> DomainResult<String> {
        self.prompts.lock().unwrap().push(user_message.to_string());
        Ok(self.reply.clone())
    }
}

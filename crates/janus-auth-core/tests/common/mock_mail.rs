//! Capturing mailer for testing

use async_trait::async_trait;
use janus_auth_core::mailer::{MailError, Mailer, OutboundMail};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// Records every message instead of delivering it
#[derive(Default)]
pub struct CapturingMailer {
    sent: Mutex<Vec<OutboundMail>>,
    fail: AtomicBool,
}

impl CapturingMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent delivery fail
    #[allow(dead_code)]
    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::Relaxed);
    }

    /// Copies of everything sent so far
    pub fn sent(&self) -> Vec<OutboundMail> {
        self.sent.lock().expect("mailer lock poisoned").clone()
    }

    /// Number of messages sent so far
    #[allow(dead_code)]
    pub fn sent_count(&self) -> usize {
        self.sent.lock().expect("mailer lock poisoned").len()
    }
}

#[async_trait]
impl Mailer for CapturingMailer {
    async fn send(&self, mail: OutboundMail) -> Result<(), MailError> {
        if self.fail.load(Ordering::Relaxed) {
            return Err(MailError::Transport("simulated failure".to_string()));
        }
        self.sent.lock().expect("mailer lock poisoned").push(mail);
        Ok(())
    }
}

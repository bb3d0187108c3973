//! Background mail delivery
//!
//! A bounded `tokio::mpsc` queue with a single worker. Submitting never blocks
//! and never fails the caller: a full or closed queue drops the email with a
//! warning. Delivery outcomes are counted in [`NotificationStats`].

use async_trait::async_trait;
use navette_core::{
    config::MailConfig,
    traits::{Email, Mailer},
    AppError, AppResult,
};
use reqwest::Client;
use serde_json::json;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, error, info, warn};

/// Delivery counters shared between the queue handle and its worker
#[derive(Debug, Default)]
pub struct NotificationStats {
    sent: AtomicU64,
    failed: AtomicU64,
    dropped: AtomicU64,
}

impl NotificationStats {
    pub fn sent(&self) -> u64 {
        self.sent.load(Ordering::Relaxed)
    }

    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// Handle to the notification worker
#[derive(Clone)]
pub struct NotificationQueue {
    sender: mpsc::Sender<Email>,
    stats: Arc<NotificationStats>,
}

impl NotificationQueue {
    /// Spawn the worker on the current tokio runtime
    pub fn start(mailer: Arc<dyn Mailer>, capacity: usize) -> Self {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let stats = Arc::new(NotificationStats::default());

        tokio::spawn(run_worker(receiver, mailer, stats.clone()));
        info!(capacity, "Notification queue started");

        Self { sender, stats }
    }

    /// Queue an email without waiting
    pub fn submit(&self, email: Email) {
        match self.sender.try_send(email) {
            Ok(()) => debug!("Notification queued"),
            Err(TrySendError::Full(email)) => {
                self.stats.dropped.fetch_add(1, Ordering::Relaxed);
                warn!(to = %email.to, subject = %email.subject, "Notification queue full, dropping email");
            }
            Err(TrySendError::Closed(email)) => {
                self.stats.dropped.fetch_add(1, Ordering::Relaxed);
                warn!(to = %email.to, "Notification worker stopped, dropping email");
            }
        }
    }

    pub fn stats(&self) -> &NotificationStats {
        &self.stats
    }
}

async fn run_worker(
    mut receiver: mpsc::Receiver<Email>,
    mailer: Arc<dyn Mailer>,
    stats: Arc<NotificationStats>,
) {
    while let Some(email) = receiver.recv().await {
        if !email.to.contains('@') {
            stats.failed.fetch_add(1, Ordering::Relaxed);
            error!(to = %email.to, "Invalid recipient, email not sent");
            continue;
        }

        match mailer.send(&email).await {
            Ok(()) => {
                stats.sent.fetch_add(1, Ordering::Relaxed);
                info!(to = %email.to, subject = %email.subject, "Email sent");
            }
            Err(e) => {
                stats.failed.fetch_add(1, Ordering::Relaxed);
                error!(to = %email.to, error = %e, "Email delivery failed");
            }
        }
    }

    info!("Notification worker stopped");
}

/// SendGrid v3 mailer
pub struct SendGridMailer {
    http_client: Client,
    url: String,
    api_key: String,
    sender: String,
}

impl SendGridMailer {
    pub fn new(url: &str, api_key: &str, sender: &str) -> AppResult<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            url: url.to_string(),
            api_key: api_key.to_string(),
            sender: sender.to_string(),
        })
    }

    fn payload(&self, email: &Email) -> serde_json::Value {
        json!({
            "personalizations": [{ "to": [{ "email": email.to }] }],
            "from": { "email": self.sender },
            "subject": email.subject,
            "content": [{ "type": "text/plain", "value": email.body }],
        })
    }
}

#[async_trait]
impl Mailer for SendGridMailer {
    async fn send(&self, email: &Email) -> Result<(), AppError> {
        let response = self
            .http_client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&self.payload(email))
            .send()
            .await
            .map_err(|e| AppError::Notification(format!("SendGrid unreachable: {}", e)))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let detail = response.text().await.unwrap_or_default();
        Err(AppError::Notification(format!(
            "SendGrid returned {}: {}",
            status.as_u16(),
            detail
        )))
    }
}

/// Mailer used when delivery is not configured
pub struct DisabledMailer {
    reason: String,
}

impl DisabledMailer {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl Mailer for DisabledMailer {
    async fn send(&self, _email: &Email) -> Result<(), AppError> {
        Err(AppError::Notification(format!(
            "mail delivery disabled: {}",
            self.reason
        )))
    }
}

/// Pick the mailer for the given configuration
pub fn mailer_from_config(config: &MailConfig) -> AppResult<Arc<dyn Mailer>> {
    let api_key = config.sendgrid_api_key.as_deref().filter(|k| !k.is_empty());
    let sender = config.default_sender.as_deref().filter(|s| !s.is_empty());

    match (api_key, sender) {
        (Some(key), Some(sender)) => {
            info!(sender, "SendGrid mail delivery enabled");
            Ok(Arc::new(SendGridMailer::new(&config.sendgrid_url, key, sender)?))
        }
        (None, _) => {
            warn!("SENDGRID_API_KEY not set, mail delivery disabled");
            Ok(Arc::new(DisabledMailer::new("no SendGrid API key")))
        }
        (_, None) => {
            warn!("No default sender configured, mail delivery disabled");
            Ok(Arc::new(DisabledMailer::new("no sender address")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;
    use tokio::sync::Notify;

    #[derive(Default)]
    struct RecordingMailer {
        sent: Mutex<Vec<Email>>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send(&self, email: &Email) -> Result<(), AppError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.sent.lock().unwrap().push(email.clone());
            Ok(())
        }
    }

    /// Blocks every send until released
    struct GatedMailer {
        gate: Notify,
    }

    #[async_trait]
    impl Mailer for GatedMailer {
        async fn send(&self, _email: &Email) -> Result<(), AppError> {
            self.gate.notified().await;
            Ok(())
        }
    }

    fn email(to: &str) -> Email {
        Email {
            to: to.to_string(),
            subject: "Réservation".to_string(),
            body: "Merci".to_string(),
        }
    }

    async fn wait_for(queue: &NotificationQueue, processed: u64) {
        for _ in 0..100 {
            if queue.stats().sent() + queue.stats().failed() >= processed {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("worker did not process {} emails", processed);
    }

    #[tokio::test]
    async fn test_worker_sends_and_counts() {
        let mailer = Arc::new(RecordingMailer::default());
        let queue = NotificationQueue::start(mailer.clone(), 10);

        queue.submit(email("client@example.com"));
        queue.submit(email("admin@example.com"));
        wait_for(&queue, 2).await;

        assert_eq!(queue.stats().sent(), 2);
        assert_eq!(queue.stats().failed(), 0);
        let sent = mailer.sent.lock().unwrap();
        assert_eq!(sent[0].to, "client@example.com");
        assert_eq!(sent[1].to, "admin@example.com");
    }

    #[tokio::test]
    async fn test_invalid_recipient_counted_as_failure() {
        let mailer = Arc::new(RecordingMailer::default());
        let queue = NotificationQueue::start(mailer.clone(), 10);

        queue.submit(email("not-an-address"));
        queue.submit(email("ok@example.com"));
        wait_for(&queue, 2).await;

        assert_eq!(queue.stats().failed(), 1);
        assert_eq!(queue.stats().sent(), 1);
        assert_eq!(mailer.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_disabled_mailer_failures_are_counted() {
        let queue = NotificationQueue::start(Arc::new(DisabledMailer::new("test")), 10);

        queue.submit(email("client@example.com"));
        wait_for(&queue, 1).await;

        assert_eq!(queue.stats().failed(), 1);
        assert_eq!(queue.stats().sent(), 0);
    }

    #[tokio::test]
    async fn test_full_queue_drops_without_blocking() {
        let mailer = Arc::new(GatedMailer {
            gate: Notify::new(),
        });
        let queue = NotificationQueue::start(mailer.clone(), 1);

        // One in flight at the worker, one buffered, the rest must be dropped.
        for i in 0..10 {
            queue.submit(email(&format!("c{}@example.com", i)));
        }

        assert!(queue.stats().dropped() >= 8);
        mailer.gate.notify_waiters();
    }

    #[test]
    fn test_sendgrid_payload() {
        let mailer =
            SendGridMailer::new("http://localhost/send", "key", "noreply@navette.ci").unwrap();
        let payload = mailer.payload(&email("client@example.com"));

        assert_eq!(payload["personalizations"][0]["to"][0]["email"], "client@example.com");
        assert_eq!(payload["from"]["email"], "noreply@navette.ci");
        assert_eq!(payload["content"][0]["type"], "text/plain");
    }

    #[test]
    fn test_mailer_selection_without_key() {
        let config = MailConfig {
            sendgrid_api_key: None,
            sendgrid_url: "http://localhost/send".to_string(),
            default_sender: Some("noreply@navette.ci".to_string()),
            admin_email: None,
            queue_capacity: 10,
        };
        assert!(mailer_from_config(&config).is_ok());
    }
}

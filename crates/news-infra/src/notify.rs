//! Notifier implementations.

use async_trait::async_trait;

use news_core::notify::{CategoryNotice, Notifier, NotifyError};

/// Logs every email instead of sending it (for development).
pub struct LogNotifier {
    from: String,
    site_url: String,
}

impl LogNotifier {
    pub fn new(from: impl Into<String>, site_url: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            site_url: site_url.into(),
        }
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, notice: CategoryNotice) -> Result<(), NotifyError> {
        for email in notice.emails(&self.from, &self.site_url) {
            tracing::info!(
                to = %email.to,
                subject = %email.subject,
                category = %notice.category.name,
                "Email\n{}",
                email.body
            );
        }
        Ok(())
    }
}

/// Posts every email as JSON to a mail relay webhook.
pub struct WebhookNotifier {
    url: String,
    from: String,
    site_url: String,
    client: reqwest::Client,
}

impl WebhookNotifier {
    pub fn new(url: String, from: impl Into<String>, site_url: impl Into<String>) -> Self {
        Self {
            url,
            from: from.into(),
            site_url: site_url.into(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, notice: CategoryNotice) -> Result<(), NotifyError> {
        let mut failed = 0;
        let emails = notice.emails(&self.from, &self.site_url);
        let total = emails.len();

        for email in emails {
            let sent = self
                .client
                .post(&self.url)
                .json(&email)
                .send()
                .await
                .and_then(|r| r.error_for_status());
            if let Err(e) = sent {
                tracing::warn!(to = %email.to, error = %e, "Webhook delivery failed");
                failed += 1;
            }
        }

        if failed > 0 {
            return Err(NotifyError::Delivery(format!(
                "{} of {} emails for category '{}' not delivered",
                failed, total, notice.category.name
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use news_core::domain::{Category, Post, PostType, User};

    fn notice() -> CategoryNotice {
        CategoryNotice {
            category: Category {
                id: 1,
                name: "Science".to_string(),
            },
            post: Post {
                id: 3,
                post_type: PostType::Article,
                title: "Title".to_string(),
                text: "Text".to_string(),
                author_id: 1,
                publish_time: Utc::now(),
            },
            recipients: vec![User {
                id: 5,
                username: "reader".to_string(),
                email: "reader@example.com".to_string(),
                password_hash: String::new(),
                joined_at: Utc::now(),
            }],
        }
    }

    #[tokio::test]
    async fn test_log_notifier_never_fails() {
        let notifier = LogNotifier::new("news@example.com", "http://localhost:8080");
        assert!(notifier.notify(notice()).await.is_ok());
    }

    #[tokio::test]
    async fn test_unreachable_webhook_is_a_delivery_error() {
        let notifier = WebhookNotifier::new(
            "http://127.0.0.1:9/mail".to_string(),
            "news@example.com",
            "http://localhost:8080",
        );
        assert!(matches!(
            notifier.notify(notice()).await,
            Err(NotifyError::Delivery(_))
        ));
    }
}

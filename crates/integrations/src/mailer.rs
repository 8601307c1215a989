use async_trait::async_trait;
use domain::events::{LeafError, Mailer};
use reqwest::Client;

/// Outbound email adapter over a transactional-email HTTP API (SendGrid's
/// `/v3/mail/send` shape). Template names map 1:1 onto the dynamic
/// template ids configured on the provider side.
pub struct HttpMailer {
    client: Client,
    api_key: String,
    base_url: String,
    from_email: String,
}

impl HttpMailer {
    pub fn new(api_key: String, from_email: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: "https://api.sendgrid.com/v3/mail/send".to_string(),
            from_email,
        }
    }

    #[cfg(test)]
    fn with_base_url(api_key: String, from_email: String, base_url: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url,
            from_email,
        }
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(
        &self,
        template: &str,
        recipients: &[String],
        context: serde_json::Value,
    ) -> Result<(), LeafError> {
        if recipients.is_empty() {
            tracing::warn!(template, "mailer called with no recipients, skipping send");
            return Ok(());
        }

        let body = serde_json::json!({
            "personalizations": [{
                "to": recipients.iter().map(|r| serde_json::json!({ "email": r })).collect::<Vec<_>>(),
                "dynamic_template_data": context,
            }],
            "from": { "email": self.from_email },
            "template_id": template,
        });

        let response = self
            .client
            .post(&self.base_url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| LeafError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(LeafError(format!(
                "HTTP {}: {}",
                response.status(),
                response.text().await.unwrap_or_default()
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructs_with_base_url_override() {
        let mailer = HttpMailer::with_base_url("key".into(), "from@example.com".into(), "http://localhost".into());
        assert_eq!(mailer.base_url, "http://localhost");
    }
}

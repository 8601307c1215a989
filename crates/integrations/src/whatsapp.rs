use async_trait::async_trait;
use domain::events::{Chat, LeafError};
use reqwest::Client;

/// Outbound chat adapter over the Meta WhatsApp Cloud API. `phone_number_id`
/// identifies the business's sending number; `to` in every call is a
/// full `<country_prefix><digits>` phone number.
pub struct WhatsAppClient {
    client: Client,
    access_token: String,
    phone_number_id: String,
    base_url: String,
}

impl WhatsAppClient {
    pub fn new(access_token: String, phone_number_id: String) -> Self {
        Self {
            client: Client::new(),
            access_token,
            phone_number_id,
            base_url: "https://graph.facebook.com/v19.0".to_string(),
        }
    }

    fn messages_url(&self) -> String {
        format!("{}/{}/messages", self.base_url, self.phone_number_id)
    }

    async fn post(&self, body: serde_json::Value) -> Result<(), LeafError> {
        let response = self
            .client
            .post(self.messages_url())
            .bearer_auth(&self.access_token)
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

#[async_trait]
impl Chat for WhatsAppClient {
    async fn send_text(&self, to: &str, body: &str) -> Result<(), LeafError> {
        self.post(serde_json::json!({
            "messaging_product": "whatsapp",
            "to": to,
            "type": "text",
            "text": { "body": body },
        }))
        .await
    }

    async fn send_template(
        &self,
        to: &str,
        name: &str,
        params: serde_json::Value,
    ) -> Result<(), LeafError> {
        self.post(serde_json::json!({
            "messaging_product": "whatsapp",
            "to": to,
            "type": "template",
            "template": {
                "name": name,
                "language": { "code": "es" },
                "components": [{ "type": "body", "parameters": template_parameters(&params) }],
            },
        }))
        .await
    }
}

fn template_parameters(params: &serde_json::Value) -> Vec<serde_json::Value> {
    let Some(obj) = params.as_object() else {
        return Vec::new();
    };
    obj.values()
        .map(|v| {
            let text = match v {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            serde_json::json!({ "type": "text", "text": text })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_url_embeds_phone_number_id() {
        let client = WhatsAppClient::new("token".into(), "12345".into());
        assert_eq!(client.messages_url(), "https://graph.facebook.com/v19.0/12345/messages");
    }

    #[test]
    fn template_parameters_flatten_object_values() {
        let params = serde_json::json!({ "reservation_id": "abc", "token": "def" });
        let result = template_parameters(&params);
        assert_eq!(result.len(), 2);
    }
}

use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use pipeline::{Notifier, NotifyOptions, NotifyTarget};
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::covers::download;

pub struct SignalNotifier {
    client: Client,
    timeout: Duration,
}

impl SignalNotifier {
    pub fn new(client: Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    async fn attachment(&self, url: &str) -> Option<String> {
        match download(&self.client, url, self.timeout).await {
            Ok(bytes) => Some(STANDARD.encode(&bytes)),
            Err(err) => {
                warn!("Failed to fetch image {}: {}", url, err);
                None
            }
        }
    }
}

#[derive(Debug, Serialize)]
struct SendRequest<'a> {
    message: String,
    number: &'a str,
    recipients: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    base64_attachments: Option<Vec<String>>,
}

fn label(key: &str) -> String {
    let spaced = key.replace('_', " ").to_lowercase();
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub fn format_message(fields: &[(String, String)]) -> String {
    let mut message = String::new();
    for (key, value) in fields {
        message.push_str(&label(key));
        message.push_str(": ");
        message.push_str(value);
        message.push('\n');
    }
    message
}

#[async_trait]
impl Notifier for SignalNotifier {
    async fn notify(
        &self,
        target: &NotifyTarget,
        fields: &[(String, String)],
        options: &NotifyOptions,
    ) -> Result<(), String> {
        let base64_attachments = match &options.attachment_image {
            Some(url) => self.attachment(url).await.map(|encoded| vec![encoded]),
            None => None,
        };
        let request = SendRequest {
            message: format_message(fields),
            number: &target.sender,
            recipients: &target.recipients,
            base64_attachments,
        };
        let url = format!("{}/v2/send", target.endpoint.trim_end_matches('/'));
        let response = self
            .client
            .post(&url)
            .timeout(self.timeout)
            .json(&request)
            .send()
            .await
            .map_err(|err| err.to_string())?;
        if !response.status().is_success() {
            return Err(format!("http {}", response.status()));
        }
        if options.silent {
            debug!("Signal message sent to {}", target.recipients.join(", "));
        } else {
            info!("Signal message sent to {}", target.recipients.join(", "));
        }
        Ok(())
    }
}

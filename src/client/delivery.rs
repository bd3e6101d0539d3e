use std::time::Duration;

use anyhow::Context;

use reqwest::Client;

use secrecy::{ExposeSecret, Secret};

use serde::{Deserialize, Serialize};

use url::Url;

use crate::domain::EmailAddress;
use crate::error::{Error, Result};
use crate::model::RenderedMessage;

/// Client for the delivery provider. Messages are handed over with a
/// future-delivery instruction; the provider sends them at `scheduled_for`
/// and reports outcomes through the webhook.
#[derive(Debug)]
pub struct DeliveryClient {
    client: Client,
    sender: EmailAddress,

    api_emails_url: Url,
    api_auth_token: Secret<String>,
}

impl DeliveryClient {
    pub fn new(
        sender: EmailAddress,
        api_timeout: Duration,
        api_base_url: Url,
        api_auth_token: Secret<String>,
    ) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(api_timeout)
            .build()
            .context("Failed to build http client")?;

        let api_emails_url = api_base_url
            .join("emails")
            .context("Failed to create send email endpoint URL")?;

        Ok(Self {
            client,
            sender,
            api_emails_url,
            api_auth_token,
        })
    }

    /// Submit one rendered message for future delivery. Returns the
    /// provider-side id used later for cancellation and webhook matching.
    #[tracing::instrument(name = "Submit message for delivery", skip(self, message))]
    pub async fn schedule(
        &self,
        recipient: &EmailAddress,
        message: &RenderedMessage,
    ) -> Result<String> {
        let body = SendEmailRequest {
            from: self.sender.as_ref(),
            to: recipient.as_ref(),
            subject: &message.subject,
            text: &message.text_body,
            html: &message.html_body,
            scheduled_at: message.scheduled_for.to_rfc3339(),
        };

        let response: SendEmailResponse = self
            .client
            .post(self.api_emails_url.clone())
            .bearer_auth(self.api_auth_token.expose_secret())
            .json(&body)
            .send()
            .await
            .context("Delivery request failed")
            .map_err(Error::DeliverySubmission)?
            .error_for_status()
            .context("Delivery provider rejected the submission")
            .map_err(Error::DeliverySubmission)?
            .json()
            .await
            .context("Failed to decode delivery response")
            .map_err(Error::DeliverySubmission)?;

        Ok(response.id)
    }

    /// Cancel a previously scheduled delivery. Best-effort; the caller
    /// decides what a failure means.
    #[tracing::instrument(name = "Cancel scheduled delivery", skip(self))]
    pub async fn cancel(&self, external_delivery_id: &str) -> Result<()> {
        let url = self
            .api_emails_url
            .join(&format!("emails/{}/cancel", external_delivery_id))
            .context("Failed to create cancel endpoint URL")
            .map_err(Error::DeliveryCancel)?;

        self.client
            .post(url)
            .bearer_auth(self.api_auth_token.expose_secret())
            .send()
            .await
            .context("Cancel request failed")
            .map_err(Error::DeliveryCancel)?
            .error_for_status()
            .context("Delivery provider rejected the cancellation")
            .map_err(Error::DeliveryCancel)?;

        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    text: &'a str,
    html: &'a str,
    scheduled_at: String,
}

#[derive(Debug, Deserialize)]
struct SendEmailResponse {
    id: String,
}

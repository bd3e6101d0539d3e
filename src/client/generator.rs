use std::time::Duration;

use anyhow::Context;

use reqwest::Client;

use secrecy::{ExposeSecret, Secret};

use serde::{Deserialize, Serialize};

use url::Url;

use crate::curriculum::Phase;
use crate::error::{Error, Result};
use crate::model::DraftMessage;

const TEMPERATURE: f32 = 0.72;
const MAX_TOKENS: u32 = 4000;

/// Client for the generative provider (an OpenAI-compatible chat-completions
/// API). One call per phase; the provider is expected to answer with a JSON
/// array of drafts matching the phase's day list positionally.
#[derive(Debug)]
pub struct GeneratorClient {
    client: Client,
    api_chat_url: Url,
    api_auth_token: Secret<String>,
    model: String,
}

impl GeneratorClient {
    pub fn new(
        api_timeout: Duration,
        api_base_url: Url,
        api_auth_token: Secret<String>,
        model: String,
    ) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(api_timeout)
            .build()
            .context("Failed to build http client")?;

        let api_chat_url = api_base_url
            .join("chat/completions")
            .context("Failed to create chat completions endpoint URL")?;

        Ok(Self {
            client,
            api_chat_url,
            api_auth_token,
            model,
        })
    }

    /// Generate one phase's drafts for the given role description.
    ///
    /// Anything structurally off in the provider's answer (no decodable
    /// array, wrong count, days out of line with the phase) is
    /// `MalformedGeneration`; there is no partial salvage.
    #[tracing::instrument(name = "Generate phase drafts", skip(self, role_description))]
    pub async fn generate(
        &self,
        phase: &Phase,
        role_description: &str,
    ) -> Result<Vec<DraftMessage>> {
        let body = ChatRequest {
            model: &self.model,
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.into(),
                },
                ChatMessage {
                    role: "user",
                    content: user_prompt(phase, role_description),
                },
            ],
        };

        let response: ChatResponse = self
            .client
            .post(self.api_chat_url.clone())
            .bearer_auth(self.api_auth_token.expose_secret())
            .json(&body)
            .send()
            .await
            .context("Generator request failed")?
            .error_for_status()
            .context("Generator returned an error status")?
            .json()
            .await
            .context("Failed to decode generator response envelope")?;

        let raw = response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .unwrap_or_default();

        let drafts = extract_drafts(&raw)?;
        validate_against_phase(phase, &drafts)?;

        Ok(drafts)
    }
}

const SYSTEM_PROMPT: &str = "You are Jinshi — AGI transitions life coach. You write warm, direct, \
deeply personalised coaching emails. Never generic. Always reference the person's specific job. \
Tone: a trusted mentor who tells hard truths with compassion.";

fn user_prompt(phase: &Phase, role_description: &str) -> String {
    let briefs: String = phase
        .entries
        .iter()
        .map(|e| format!("- Day {}: {}\n", e.day, e.theme))
        .collect();

    format!(
        r#"Draft {count} personalised coaching emails for someone whose job is: "{role}"

Phase: {label}

CRITICAL: Respond ONLY with a valid JSON array. No markdown. No backticks. Start with [ end with ].

[
  {{
    "day": <number>,
    "subject": "<personal subject line — like a message from a friend, NOT a newsletter>",
    "preview": "<one sentence hook under 12 words>",
    "theme": "<3-4 word label>",
    "plainText": "<210-250 word email. Second person. Reference their specific role. End with one clear action. Sign off: Warmly,\nJinshi>"
  }}
]

Emails to write:
{briefs}"#,
        count = phase.entries.len(),
        role = role_description,
        label = phase.label,
        briefs = briefs,
    )
}

/// Find the first position in the raw text where a typed draft array
/// deserializes. Providers wrap their answer in prose often enough that
/// rejecting anything but a bare array would throw away good output.
fn extract_drafts(raw: &str) -> Result<Vec<DraftMessage>> {
    for (at, _) in raw.char_indices().filter(|(_, c)| *c == '[') {
        let mut deserializer = serde_json::Deserializer::from_str(&raw[at..]);
        if let Ok(drafts) = <Vec<DraftMessage> as serde::Deserialize>::deserialize(&mut deserializer)
        {
            return Ok(drafts);
        }
    }

    Err(Error::MalformedGeneration(
        "no decodable draft array in response".into(),
    ))
}

/// Enforce the positional contract with the curriculum table: same count,
/// same days in the same order, no empty content.
fn validate_against_phase(phase: &Phase, drafts: &[DraftMessage]) -> Result<()> {
    if drafts.len() != phase.entries.len() {
        return Err(Error::MalformedGeneration(format!(
            "expected {} drafts for {}, got {}",
            phase.entries.len(),
            phase.id,
            drafts.len()
        )));
    }

    for (entry, draft) in phase.entries.iter().zip(drafts) {
        if draft.day != entry.day {
            return Err(Error::MalformedGeneration(format!(
                "draft for day {} where day {} was expected",
                draft.day, entry.day
            )));
        }
        if draft.subject.trim().is_empty() || draft.plain_text.trim().is_empty() {
            return Err(Error::MalformedGeneration(format!(
                "empty subject or body for day {}",
                draft.day
            )));
        }
    }

    Ok(())
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    max_tokens: u32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

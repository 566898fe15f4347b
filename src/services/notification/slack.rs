//! Slack notifications through the Web API `chat.postMessage` method.

use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::{
	models::{Event, EventType, SecretString, SignerAnnotation},
	services::{
		notification::{NotificationError, Notifier},
		safe_api::constants::web_app_url,
	},
	utils::{logging::error::metadata, DEFAULT_SAFE_URL},
};

const SLACK_API_URL: &str = "https://slack.com/api";

const MALICIOUS_ALERT: &str =
	"\u{1F6A8} *ALERT! ACTION REQUIRED: MALICIOUS TRANSACTION DETECTED!* \u{1F6A8}";

/// Slack bot settings
#[derive(Debug, Clone)]
pub struct SlackConfig {
	pub token: SecretString,
	pub channel_id: String,
	/// Web API base URL, `https://slack.com/api` when unset
	pub api_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PostMessageResponse {
	ok: bool,
	#[serde(default)]
	error: Option<String>,
}

/// Posts one Block Kit message per event to a Slack channel.
pub struct SlackNotifier {
	token: SecretString,
	channel_id: String,
	api_url: String,
	client: Arc<ClientWithMiddleware>,
}

impl SlackNotifier {
	pub fn new(
		config: SlackConfig,
		client: Arc<ClientWithMiddleware>,
	) -> Result<Self, NotificationError> {
		if config.token.as_str().is_empty() || config.channel_id.is_empty() {
			return Err(NotificationError::config_error(
				"slack token and channel id are required",
				None,
				None,
			));
		}

		Ok(Self {
			token: config.token,
			channel_id: config.channel_id,
			api_url: config
				.api_url
				.unwrap_or_else(|| SLACK_API_URL.to_string())
				.trim_end_matches('/')
				.to_string(),
			client,
		})
	}

	/// Builds the `chat.postMessage` body for `event`.
	pub fn build_message(&self, event: &Event) -> Value {
		let mut message = format_message(event);
		message["channel"] = json!(self.channel_id);
		message
	}
}

fn format_signer(signer: &SignerAnnotation) -> String {
	match &signer.name {
		Some(name) => format!("*{}*", name),
		None => format!("`{}`", signer.address),
	}
}

fn mrkdwn_section(text: String) -> Value {
	json!({
		"type": "section",
		"text": { "type": "mrkdwn", "text": text },
	})
}

/// Queue page of the safe in the Safe web app.
pub(crate) fn queue_url(event: &Event) -> String {
	let prefix = event.safe.prefix.trim();
	format!(
		"{}/{}:{}/transactions/queue",
		web_app_url(prefix).unwrap_or(DEFAULT_SAFE_URL),
		prefix,
		event.safe.address
	)
}

/// Block Kit layout and fallback text, without the channel.
pub(crate) fn format_message(event: &Event) -> Value {
	let tx = &event.tx;
	let signatures = format!("{}/{}", tx.confirmations.len(), tx.confirmations_required);
	let proposer = tx
		.proposer
		.as_ref()
		.map(format_signer)
		.unwrap_or_else(|| "unknown".to_string());
	let signers = tx
		.confirmations
		.iter()
		.map(format_signer)
		.collect::<Vec<_>>()
		.join(", ");

	let mut blocks = Vec::new();
	if event.kind == EventType::Malicious {
		blocks.push(mrkdwn_section(MALICIOUS_ALERT.to_string()));
	}
	blocks.push(mrkdwn_section(format!(
		"*Transaction {}*\nChain: {}\nSafe: {}\nTx Hash: `{}`\nNonce: `{}`",
		event.kind,
		event.safe.prefix,
		event.safe.address,
		tx.safe_tx_hash,
		tx.nonce
	)));
	blocks.push(mrkdwn_section(format!("*Signatures*: {}", signatures)));
	blocks.push(mrkdwn_section(format!("*Proposer*: {}", proposer)));
	blocks.push(mrkdwn_section(format!("*Signers*: {}", signers)));
	blocks.push(json!({
		"type": "actions",
		"elements": [{
			"type": "button",
			"text": { "type": "plain_text", "text": "View Transaction" },
			"url": queue_url(event),
		}],
	}));

	json!({
		"text": format!(
			"Transaction {} [{}] with safeTxHash {}",
			event.kind, signatures, tx.safe_tx_hash
		),
		"blocks": blocks,
	})
}

#[async_trait]
impl Notifier for SlackNotifier {
	fn name(&self) -> &str {
		"slack"
	}

	async fn notify(&self, event: &Event) -> Result<(), NotificationError> {
		let url = format!("{}/chat.postMessage", self.api_url);
		let payload = self.build_message(event);

		let response = self
			.client
			.post(&url)
			.bearer_auth(self.token.as_str())
			.json(&payload)
			.send()
			.await
			.map_err(|e| {
				NotificationError::network_error(
					format!("Failed to send Slack message: {}", e),
					Some(e.into()),
					metadata([("tx", event.tx.safe_tx_hash.to_string())]),
				)
			})?;

		let status = response.status();
		if !status.is_success() {
			return Err(NotificationError::notify_failed(
				format!("Slack request failed with status: {}", status),
				None,
				metadata([("tx", event.tx.safe_tx_hash.to_string())]),
			));
		}

		let body: PostMessageResponse = response.json().await.map_err(|e| {
			NotificationError::internal_error(
				format!("Failed to parse Slack response: {}", e),
				Some(e.into()),
				None,
			)
		})?;

		if !body.ok {
			return Err(NotificationError::notify_failed(
				format!(
					"Slack rejected message: {}",
					body.error.as_deref().unwrap_or("unknown error")
				),
				None,
				metadata([("tx", event.tx.safe_tx_hash.to_string())]),
			));
		}

		tracing::debug!(tx = %event.tx.safe_tx_hash, "slack message sent successfully");
		Ok(())
	}
}

//! Telegram notifications through the Bot API `sendMessage` method.

use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::{
	models::{Event, EventType, SecretString, SignerAnnotation},
	services::notification::{NotificationError, Notifier},
	utils::logging::error::{metadata, BoxedSource},
};

const TELEGRAM_API_URL: &str = "https://api.telegram.org";

/// Telegram bot settings
#[derive(Debug, Clone)]
pub struct TelegramConfig {
	pub token: SecretString,
	pub channel_id: String,
	/// Safe web app used to build transaction links
	pub safe_url: String,
	/// Bot API base URL, `https://api.telegram.org` when unset
	pub api_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SendMessageResponse {
	ok: bool,
	#[serde(default)]
	description: Option<String>,
}

/// Sends one MarkdownV2 message per event to a Telegram chat.
pub struct TelegramNotifier {
	token: SecretString,
	channel_id: String,
	safe_url: String,
	api_url: String,
	client: Arc<ClientWithMiddleware>,
}

/// Escapes the characters MarkdownV2 reserves outside of code and links.
pub fn escape_markdown_v2(text: &str) -> String {
	const RESERVED: &[char] = &[
		'_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.', '!',
		'\\',
	];
	let mut escaped = String::with_capacity(text.len());
	for c in text.chars() {
		if RESERVED.contains(&c) {
			escaped.push('\\');
		}
		escaped.push(c);
	}
	escaped
}

fn format_signer(signer: &SignerAnnotation) -> String {
	match &signer.name {
		Some(name) => format!("*{}*", escape_markdown_v2(name)),
		None => format!("`{}`", signer.address),
	}
}

impl TelegramNotifier {
	pub fn new(
		config: TelegramConfig,
		client: Arc<ClientWithMiddleware>,
	) -> Result<Self, NotificationError> {
		if config.token.as_str().is_empty() || config.channel_id.is_empty() {
			return Err(NotificationError::config_error(
				"telegram token and channel id are required",
				None,
				None,
			));
		}

		Ok(Self {
			token: config.token,
			channel_id: config.channel_id,
			safe_url: config.safe_url.trim_end_matches('/').to_string(),
			api_url: config
				.api_url
				.unwrap_or_else(|| TELEGRAM_API_URL.to_string())
				.trim_end_matches('/')
				.to_string(),
			client,
		})
	}

	/// Transaction page in the Safe web app.
	pub fn transaction_url(&self, event: &Event) -> String {
		format!(
			"{}/transactions/tx?safe={}:{}&id=multisig_{}_{}",
			self.safe_url,
			event.safe.prefix,
			event.safe.address,
			event.safe.address,
			event.tx.safe_tx_hash
		)
	}

	/// Renders `event` as MarkdownV2.
	pub fn format_message(&self, event: &Event) -> String {
		let tx = &event.tx;
		let mut lines = Vec::new();

		if event.kind == EventType::Malicious {
			lines.push("\u{1F6A8} *MALICIOUS TRANSACTION DETECTED* \u{1F6A8}".to_string());
		}
		lines.push(format!(
			"*Transaction {}* in *{}*",
			event.kind,
			escape_markdown_v2(&event.name)
		));
		lines.push(format!("Chain: {}", escape_markdown_v2(&event.safe.prefix)));
		lines.push(format!("Safe: `{}`", event.safe.address));
		lines.push(format!("Tx Hash: `{}`", tx.safe_tx_hash));
		lines.push(format!("Nonce: `{}`", tx.nonce));
		lines.push(format!(
			"Signatures: {}/{}",
			tx.confirmations.len(),
			tx.confirmations_required
		));
		if let Some(proposer) = &tx.proposer {
			lines.push(format!("Proposer: {}", format_signer(proposer)));
		}
		if !tx.confirmations.is_empty() {
			let signers: Vec<String> = tx.confirmations.iter().map(format_signer).collect();
			lines.push(format!("Signers: {}", signers.join(", ")));
		}
		lines.push(format!(
			"[View transaction]({})",
			self.transaction_url(event).replace(')', "\\)")
		));

		lines.join("\n")
	}

	pub fn build_payload(&self, event: &Event) -> Value {
		json!({
			"chat_id": self.channel_id,
			"text": self.format_message(event),
			"parse_mode": "MarkdownV2",
			"disable_web_page_preview": true,
		})
	}
}

#[async_trait]
impl Notifier for TelegramNotifier {
	fn name(&self) -> &str {
		"telegram"
	}

	async fn notify(&self, event: &Event) -> Result<(), NotificationError> {
		let url = format!("{}/bot{}/sendMessage", self.api_url, self.token.as_str());

		let response = self
			.client
			.post(&url)
			.json(&self.build_payload(event))
			.send()
			.await
			.map_err(|e| {
				// The request URL carries the token
				let source: BoxedSource = match e {
					reqwest_middleware::Error::Reqwest(e) => Box::new(e.without_url()),
					other => Box::new(other),
				};
				NotificationError::network_error(
					"Failed to send Telegram message",
					Some(source),
					metadata([("tx", event.tx.safe_tx_hash.to_string())]),
				)
			})?;

		let status = response.status();
		let body: Option<SendMessageResponse> = response.json().await.ok();

		match body {
			Some(SendMessageResponse { ok: true, .. }) if status.is_success() => {
				tracing::debug!(tx = %event.tx.safe_tx_hash, "telegram message sent successfully");
				Ok(())
			}
			body => Err(NotificationError::notify_failed(
				format!(
					"Telegram rejected message with status {}: {}",
					status,
					body.and_then(|b| b.description)
						.unwrap_or_else(|| "no description".to_string())
				),
				None,
				metadata([("tx", event.tx.safe_tx_hash.to_string())]),
			)),
		}
	}
}

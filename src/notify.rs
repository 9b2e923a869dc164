//! Best-effort status notifications.
//!
//! The station runs unattended for days; the notification channel is how a
//! human keeps an eye on it. Publishing is strictly fire and forget: a
//! broken channel must never stall or abort the scan schedule, so failures
//! are logged locally and dropped.

use std::time::Duration;

use chrono::Local;
use ureq::Agent;

use crate::station::DeviceMap;

const DATE_FMT: &str = "%d/%m/%Y %H:%M:%S";

/// Local-time stamp appended to every notification.
pub fn timestamp() -> String {
    Local::now().format(DATE_FMT).to_string()
}

/// Upper-cased station acknowledgement with the standard timestamp line.
pub fn ack_message(message: &str) -> String {
    format!("{}\n\n[{}]", message.to_uppercase(), timestamp())
}

/// Arbitrary text with the standard timestamp line.
pub fn stamped(text: &str) -> String {
    format!("{text}\n[{}]", timestamp())
}

/// Human-readable device listing: one section per port, one `NN: board_id`
/// line per board.
pub fn device_listing(map: &DeviceMap) -> String {
    let mut text = String::new();
    for (port_name, boards) in &map.ports {
        text.push_str(&port_name.to_uppercase());
        text.push('\n');
        for board in boards {
            text.push_str(&format!("{:0>2}: {}\n", board.slot, board.board_id));
        }
        text.push('\n');
    }
    format!("{text}[{}]", timestamp())
}

/// Fire-and-forget sink for status lines.
pub trait Notify {
    /// Must not block beyond a short bounded timeout and must not fail.
    fn publish(&self, text: &str);
}

impl<T: Notify + ?Sized> Notify for Box<T> {
    fn publish(&self, text: &str) {
        (**self).publish(text)
    }
}

/// Mirrors notifications into the log; used when no chat channel is
/// configured.
pub struct LogNotifier;

impl Notify for LogNotifier {
    fn publish(&self, text: &str) {
        log::info!("notify: {}", text.replace('\n', " / "));
    }
}

/// Telegram Bot API sink.
pub struct TelegramNotifier {
    agent: Agent,
    url: String,
    chat_id: String,
    token: String,
}

impl TelegramNotifier {
    /// `timeout` bounds how long a single publish may stall the caller.
    pub fn new(token: &str, chat_id: &str, timeout: Duration) -> Self {
        let agent: Agent = Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build()
            .into();
        Self {
            agent,
            url: format!("https://api.telegram.org/bot{token}/sendMessage"),
            chat_id: chat_id.to_string(),
            token: token.to_string(),
        }
    }

    /// Transport errors can echo the request URL, which carries the bot
    /// token. Strip it before the text reaches the log.
    fn redact(&self, text: &str) -> String {
        text.replace(&self.token, "<token>")
    }
}

impl Notify for TelegramNotifier {
    fn publish(&self, text: &str) {
        let payload = serde_json::json!({
            "chat_id": self.chat_id,
            "text": text,
        });
        match self.agent.post(&self.url).send_json(&payload) {
            Ok(response) if response.status().is_success() => {}
            Ok(response) => {
                log::warn!("telegram rejected notification: HTTP {}", response.status());
            }
            Err(err) => {
                log::warn!(
                    "telegram notification failed: {}",
                    self.redact(&err.to_string())
                );
            }
        }
    }
}

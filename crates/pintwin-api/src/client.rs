// Board console HTTP client
//
// Wraps `reqwest::Client` with path normalization, content-type guarded
// JSON parsing, and envelope classification. Every command endpoint is a
// thin typed wrapper over `send`; the interesting logic is in `classify`.

use reqwest::Method;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::error::Error;
use crate::model::{BoardState, CommandAck};
use crate::transport::TransportConfig;

/// Longest raw-body preview carried inside a malformed-response error.
const BODY_PREVIEW_CHARS: usize = 100;

/// HTTP client for the board's console API.
///
/// All mutating endpoints are plain GETs with path-encoded parameters --
/// the firmware routes on path segments, not bodies. Responses use the
/// `{status: "ok"|"error", message?}` envelope; `send` classifies every
/// outcome before a caller sees it.
#[derive(Debug)]
pub struct DeviceClient {
    http: reqwest::Client,
    base_url: Url,
}

impl DeviceClient {
    /// Create a new client from a board base URL (e.g. `http://192.168.1.50`).
    ///
    /// URLs that cannot carry path segments (e.g. `mailto:`) are rejected
    /// here rather than surfacing on the first command.
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        if base_url.cannot_be_a_base() {
            return Err(Error::InvalidUrl {
                message: format!("{base_url} cannot be used as an HTTP base"),
            });
        }
        let http = transport.build_client()?;
        Ok(Self { http, base_url })
    }

    /// Create a client with a pre-built `reqwest::Client` (tests).
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self { http, base_url }
    }

    /// The board base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Build a full URL from a raw resource path, normalized to exactly
    /// one leading separator.
    fn resource_url(&self, path: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        Ok(Url::parse(&format!("{base}/{path}"))?)
    }

    /// Build a command URL from ordered path segments, percent-encoding
    /// each segment (SSIDs, radio names, and console text are free-form).
    fn command_url(&self, segments: &[&str]) -> Result<Url, Error> {
        let mut url = self.base_url.clone();
        {
            let mut parts = url.path_segments_mut().map_err(|()| Error::InvalidUrl {
                message: format!("{} cannot carry path segments", self.base_url),
            })?;
            parts.pop_if_empty();
            parts.extend(segments);
        }
        Ok(url)
    }

    // ── Request core ─────────────────────────────────────────────────

    /// Send a single request and classify the outcome.
    ///
    /// Returns the parsed JSON body on success. Failure classification:
    /// - unreachable board -> [`Error::Transport`]
    /// - non-JSON content type -> [`Error::MalformedResponse`] with a
    ///   truncated body preview (never parsed as data)
    /// - non-success HTTP status -> [`Error::Http`], message preferring
    ///   the body's `message` field over the bare status code
    /// - `{status: "error"}` envelope -> [`Error::Application`]
    pub async fn send(&self, path: &str, method: Method) -> Result<Value, Error> {
        let url = self.resource_url(path)?;
        debug!(%method, %url, "board request");

        let resp = self.http.request(method, url).send().await?;
        let status = resp.status();
        let is_json = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.contains("application/json"));
        let body = resp.text().await?;

        Self::classify(status, is_json, &body)
    }

    /// Classify one response into a parsed body or an [`Error`].
    fn classify(status: reqwest::StatusCode, is_json: bool, body: &str) -> Result<Value, Error> {
        if !is_json {
            let preview: String = body.chars().take(BODY_PREVIEW_CHARS).collect();
            if !status.is_success() {
                return Err(Error::Http {
                    status: status.as_u16(),
                    message: format!("HTTP {}", status.as_u16()),
                });
            }
            warn!(preview = %preview, "non-JSON response body");
            return Err(Error::MalformedResponse {
                message: format!("non-JSON response: {preview}"),
                preview,
            });
        }

        let value: Value = serde_json::from_str(body).map_err(|e| Error::MalformedResponse {
            message: e.to_string(),
            preview: body.chars().take(BODY_PREVIEW_CHARS).collect(),
        })?;

        // Message preference: envelope message, then status reason, then
        // the bare numeric code. Proxies routinely drop reason phrases,
        // so in practice the numeric form is what errors carry.
        let body_message = value
            .get("message")
            .and_then(Value::as_str)
            .map(String::from);

        if !status.is_success() {
            return Err(Error::Http {
                status: status.as_u16(),
                message: body_message.unwrap_or_else(|| format!("HTTP {}", status.as_u16())),
            });
        }

        if value.get("status").and_then(Value::as_str) == Some("error") {
            return Err(Error::Application {
                message: body_message.unwrap_or_else(|| "board reported an error".into()),
            });
        }

        Ok(value)
    }

    /// Send a command GET and parse the acknowledgement envelope.
    async fn command(&self, url: Url) -> Result<CommandAck, Error> {
        debug!(path = url.path(), "board command");
        let resp = self.http.get(url).send().await?;
        let status = resp.status();
        let is_json = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.contains("application/json"));
        let body = resp.text().await?;

        let value = Self::classify(status, is_json, &body)?;
        Ok(CommandAck {
            message: value
                .get("message")
                .and_then(Value::as_str)
                .map(String::from),
        })
    }

    // ── Snapshot endpoint ────────────────────────────────────────────

    /// Fetch the full board snapshot.
    ///
    /// A body missing the required `status` or `pins` sections is a
    /// malformed response: the indicator degrades but polling continues.
    pub async fn board_state(&self) -> Result<BoardState, Error> {
        let value = self.send("/api/board_state", Method::GET).await?;

        if value.get("status").is_none() || value.get("pins").is_none() {
            return Err(Error::MalformedResponse {
                message: "snapshot missing required `status` or `pins` section".into(),
                preview: value.to_string().chars().take(BODY_PREVIEW_CHARS).collect(),
            });
        }

        serde_json::from_value(value.clone()).map_err(|e| Error::MalformedResponse {
            message: e.to_string(),
            preview: value.to_string().chars().take(BODY_PREVIEW_CHARS).collect(),
        })
    }

    // ── Pin commands ─────────────────────────────────────────────────

    /// `GET pin/mode/{pinId}/{mode}` — set a pin's mode.
    pub async fn set_pin_mode(&self, pin_id: &str, mode: &str) -> Result<CommandAck, Error> {
        self.command(self.command_url(&["pin", "mode", pin_id, mode])?)
            .await
    }

    /// `GET pin/pull/{pinId}/{pull}` — set a pin's pull resistor.
    pub async fn set_pin_pull(&self, pin_id: &str, pull: &str) -> Result<CommandAck, Error> {
        self.command(self.command_url(&["pin", "pull", pin_id, pull])?)
            .await
    }

    /// `GET pin/value/{pinId}/{0|1}` — drive a digital output.
    pub async fn set_pin_value(&self, pin_id: &str, value: u8) -> Result<CommandAck, Error> {
        self.command(self.command_url(&["pin", "value", pin_id, &value.to_string()])?)
            .await
    }

    /// `GET pwm/set/{pinId}/{freqHz}/{dutyPct}` — configure PWM output.
    pub async fn set_pwm(&self, pin_id: &str, freq_hz: u32, duty_pct: f64) -> Result<CommandAck, Error> {
        self.command(self.command_url(&[
            "pwm",
            "set",
            pin_id,
            &freq_hz.to_string(),
            &format!("{duty_pct:.1}"),
        ])?)
        .await
    }

    // ── Radio / network commands ─────────────────────────────────────

    /// `GET wifi/connect/{ssid}/{password}` — reconfigure credentials.
    ///
    /// Fire-and-forget: the board drops off the network to re-join, so no
    /// response is awaited and any network outcome (including transport
    /// failure) is discarded.
    pub async fn connect_wifi(&self, ssid: &str, password: &SecretString) -> Result<(), Error> {
        let url = self.command_url(&["wifi", "connect", ssid, password.expose_secret()])?;
        debug!(%ssid, "wifi reconfigure (fire-and-forget)");
        let _ = self.http.get(url).send().await;
        Ok(())
    }

    /// `GET ble/set_name/{name}` — set the radio advertising name.
    pub async fn set_ble_name(&self, name: &str) -> Result<CommandAck, Error> {
        self.command(self.command_url(&["ble", "set_name", name])?)
            .await
    }

    /// `GET ble/{start|stop}` — toggle radio advertising.
    pub async fn set_ble_advertising(&self, enable: bool) -> Result<CommandAck, Error> {
        let action = if enable { "start" } else { "stop" };
        self.command(self.command_url(&["ble", action])?).await
    }

    // ── Console ──────────────────────────────────────────────────────

    /// `GET console/command/{text}` — append a command to the board's log.
    pub async fn console_command(&self, text: &str) -> Result<CommandAck, Error> {
        self.command(self.command_url(&["console", "command", text])?)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> DeviceClient {
        DeviceClient::with_client(
            reqwest::Client::new(),
            Url::parse("http://192.168.4.1").expect("static URL"),
        )
    }

    #[test]
    fn resource_url_normalizes_leading_separator() {
        let c = client();
        let with = c.resource_url("/api/board_state").expect("url");
        let without = c.resource_url("api/board_state").expect("url");
        assert_eq!(with, without);
        assert_eq!(with.path(), "/api/board_state");
    }

    #[test]
    fn command_url_percent_encodes_segments() {
        let c = client();
        let url = c
            .command_url(&["console", "command", "led on/off?"])
            .expect("url");
        assert_eq!(url.path(), "/console/command/led%20on%2Foff%3F");
    }

    #[test]
    fn new_rejects_url_that_cannot_be_a_base() {
        let url = Url::parse("mailto:board@example.com").expect("static URL");
        let err = DeviceClient::new(url, &TransportConfig::default())
            .expect_err("mailto URL must be rejected");
        assert!(matches!(err, Error::InvalidUrl { .. }));
    }

    #[test]
    fn command_url_fails_cleanly_for_non_base_url() {
        let c = DeviceClient::with_client(
            reqwest::Client::new(),
            Url::parse("mailto:board@example.com").expect("static URL"),
        );
        let err = c
            .command_url(&["pin", "mode", "5", "IN"])
            .expect_err("non-base URL must not build a command URL");
        assert!(matches!(err, Error::InvalidUrl { .. }));
    }

    #[test]
    fn classify_prefers_body_message_over_status() {
        let err = DeviceClient::classify(
            reqwest::StatusCode::INTERNAL_SERVER_ERROR,
            true,
            r#"{"status":"error","message":"bad pin"}"#,
        )
        .expect_err("must classify as failure");
        match err {
            Error::Http { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "bad pin");
            }
            other => panic!("expected Http error, got {other:?}"),
        }
    }

    #[test]
    fn classify_truncates_non_json_preview() {
        let long_body = "x".repeat(500);
        let err = DeviceClient::classify(reqwest::StatusCode::OK, false, &long_body)
            .expect_err("non-JSON must not classify as success");
        match err {
            Error::MalformedResponse { preview, .. } => {
                assert_eq!(preview.chars().count(), BODY_PREVIEW_CHARS);
            }
            other => panic!("expected MalformedResponse, got {other:?}"),
        }
    }
}

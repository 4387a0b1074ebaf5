//! # Speech Synthesis Client
//!
//! Turns chunk text into audio by calling the synthesis service.
//!
//! ## Wire format
//!
//! ```text
//! POST {base}/speak
//!   {"text": "...", "voice": "vi-VN-HoaiMyNeural", "rate": "+50%", "pitch": "-10Hz"}
//!   200 -> audio bytes (Content-Type, default audio/mpeg)
//!   4xx/5xx -> {"error": "..."}
//! GET  {base}/voices  -> [{"name": "...", "gender": "...", "locale": "..."}]
//! GET  {base}/health  -> {"status": "ok"}
//! ```
//!
//! The queue manager only sees the [`SpeechSynthesizer`] trait, so tests and
//! alternative backends plug in without an HTTP stack.

use crate::config::VoiceSettings;
use crate::error::{SynthesisError, SynthesisResult};
use bridge_traits::audio::{AudioResource, DEFAULT_AUDIO_MIME};
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, RetryPolicy};
use bridge_traits::platform::PlatformSendSync;
use core_runtime::config::NarratorConfig;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Default per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Produces audio for one chunk of text.
#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
pub trait SpeechSynthesizer: PlatformSendSync {
    async fn synthesize(&self, text: &str) -> SynthesisResult<AudioResource>;
}

/// Speed multiplier as a signed percentage offset from 1.0x.
///
/// ```rust
/// use core_narration::synthesis::format_rate;
///
/// assert_eq!(format_rate(1.2), "+20%");
/// assert_eq!(format_rate(1.0), "+0%");
/// assert_eq!(format_rate(0.5), "-50%");
/// ```
pub fn format_rate(speed: f32) -> String {
    let percent = ((speed - 1.0) * 100.0).round() as i32;
    format!("{:+}%", percent)
}

/// Pitch offset as a signed hertz string, e.g. `-10Hz`.
pub fn format_pitch(pitch_hz: i32) -> String {
    format!("{:+}Hz", pitch_hz)
}

#[derive(Debug, Serialize)]
struct SpeakRequest<'a> {
    text: &'a str,
    voice: &'a str,
    rate: String,
    pitch: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug, Deserialize)]
struct HealthBody {
    status: String,
}

/// A voice offered by the synthesis service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceInfo {
    pub name: String,
    pub gender: String,
    pub locale: String,
}

/// [`SpeechSynthesizer`] backed by the HTTP synthesis service.
pub struct HttpSynthesizer {
    http: Arc<dyn HttpClient>,
    base_url: String,
    voice: VoiceSettings,
    timeout: Duration,
    retry: RetryPolicy,
}

impl HttpSynthesizer {
    pub fn new(
        http: Arc<dyn HttpClient>,
        base_url: impl Into<String>,
        voice: VoiceSettings,
    ) -> Self {
        let base_url = base_url.into().trim().trim_end_matches('/').to_string();
        Self {
            http,
            base_url,
            voice,
            timeout: DEFAULT_REQUEST_TIMEOUT,
            retry: RetryPolicy::default(),
        }
    }

    pub fn from_config(http: Arc<dyn HttpClient>, config: &NarratorConfig) -> Self {
        Self::new(http, config.base_url(), VoiceSettings::from(config))
            .with_timeout(config.request_timeout)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn voice(&self) -> &VoiceSettings {
        &self.voice
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Voices the service can speak with.
    pub async fn list_voices(&self) -> SynthesisResult<Vec<VoiceInfo>> {
        let request =
            HttpRequest::new(HttpMethod::Get, self.endpoint("voices")).timeout(self.timeout);
        let response = self.http.execute(request).await?;
        let response = check_status(response)?;

        response
            .json::<Vec<VoiceInfo>>()
            .map_err(|e| SynthesisError::MalformedPayload(e.to_string()))
    }

    /// Returns `true` when the service reports itself healthy.
    pub async fn health(&self) -> SynthesisResult<bool> {
        let request =
            HttpRequest::new(HttpMethod::Get, self.endpoint("health")).timeout(self.timeout);
        let response = self.http.execute(request).await?;
        let response = check_status(response)?;

        let body = response
            .json::<HealthBody>()
            .map_err(|e| SynthesisError::MalformedPayload(e.to_string()))?;
        Ok(body.status == "ok")
    }
}

fn check_status(response: HttpResponse) -> SynthesisResult<HttpResponse> {
    if response.is_success() {
        return Ok(response);
    }

    let detail = response.json::<ErrorBody>().map(|body| body.error).ok();
    warn!(
        status = response.status,
        detail = detail.as_deref().unwrap_or(""),
        "Synthesis service returned an error status"
    );
    Err(SynthesisError::Status {
        status: response.status,
    })
}

#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
impl SpeechSynthesizer for HttpSynthesizer {
    #[instrument(skip(self, text), fields(chars = text.chars().count()))]
    async fn synthesize(&self, text: &str) -> SynthesisResult<AudioResource> {
        if text.trim().is_empty() {
            return Err(SynthesisError::InvalidParameter(
                "text must not be empty".to_string(),
            ));
        }

        let body = SpeakRequest {
            text,
            voice: &self.voice.voice,
            rate: format_rate(self.voice.speed),
            pitch: format_pitch(self.voice.pitch_hz),
        };
        let request = HttpRequest::new(HttpMethod::Post, self.endpoint("speak"))
            .timeout(self.timeout)
            .json(&body)
            .map_err(|e| SynthesisError::InvalidParameter(e.to_string()))?;

        let response = self
            .http
            .execute_with_retry(request, self.retry.clone())
            .await?;
        let response = check_status(response)?;

        if response.body.is_empty() {
            return Err(SynthesisError::MalformedPayload(
                "empty audio body".to_string(),
            ));
        }

        let mime_type = response
            .header("Content-Type")
            .filter(|value| !value.is_empty())
            .unwrap_or(DEFAULT_AUDIO_MIME)
            .to_string();

        debug!(bytes = response.body.len(), mime_type = %mime_type, "Synthesized chunk");
        Ok(AudioResource::new(response.body, mime_type))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::error::Result as BridgeResult;
    use bridge_traits::BridgeError;
    use bytes::Bytes;
    use mockall::mock;
    use std::collections::HashMap;

    mock! {
        HttpClient {}

        #[async_trait]
        impl HttpClient for HttpClient {
            async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse>;
        }
    }

    fn response(status: u16, content_type: Option<&str>, body: &'static [u8]) -> HttpResponse {
        let mut headers = HashMap::new();
        if let Some(content_type) = content_type {
            headers.insert("content-type".to_string(), content_type.to_string());
        }
        HttpResponse {
            status,
            headers,
            body: Bytes::from_static(body),
        }
    }

    fn synthesizer(mock: MockHttpClient) -> HttpSynthesizer {
        HttpSynthesizer::new(
            Arc::new(mock),
            "http://localhost:5000/",
            VoiceSettings {
                voice: "vi-VN-NamMinhNeural".to_string(),
                speed: 1.2,
                pitch_hz: -10,
                volume: 1.0,
            },
        )
    }

    #[test]
    fn rate_and_pitch_formatting() {
        assert_eq!(format_rate(1.2), "+20%");
        assert_eq!(format_rate(1.5), "+50%");
        assert_eq!(format_rate(1.0), "+0%");
        assert_eq!(format_rate(0.75), "-25%");
        assert_eq!(format_pitch(-10), "-10Hz");
        assert_eq!(format_pitch(0), "+0Hz");
        assert_eq!(format_pitch(5), "+5Hz");
    }

    #[tokio::test]
    async fn speak_posts_voice_parameters() {
        let mut mock = MockHttpClient::new();
        mock.expect_execute()
            .times(1)
            .withf(|request| {
                let body: serde_json::Value =
                    serde_json::from_slice(request.body.as_ref().unwrap()).unwrap();
                request.method == HttpMethod::Post
                    && request.url == "http://localhost:5000/speak"
                    && body["text"] == "Xin chào."
                    && body["voice"] == "vi-VN-NamMinhNeural"
                    && body["rate"] == "+20%"
                    && body["pitch"] == "-10Hz"
            })
            .returning(|_| Ok(response(200, Some("audio/mpeg"), b"ID3audio")));

        let audio = synthesizer(mock).synthesize("Xin chào.").await.unwrap();
        assert_eq!(audio.data, Bytes::from_static(b"ID3audio"));
        assert_eq!(audio.mime_type, "audio/mpeg");
    }

    #[tokio::test]
    async fn missing_content_type_defaults_to_mpeg() {
        let mut mock = MockHttpClient::new();
        mock.expect_execute()
            .returning(|_| Ok(response(200, None, b"audio")));

        let audio = synthesizer(mock).synthesize("Hello.").await.unwrap();
        assert_eq!(audio.mime_type, DEFAULT_AUDIO_MIME);
    }

    #[tokio::test]
    async fn error_status_is_reported() {
        let mut mock = MockHttpClient::new();
        mock.expect_execute().returning(|_| {
            Ok(response(
                500,
                Some("application/json"),
                br#"{"error": "voice unavailable"}"#,
            ))
        });

        let err = synthesizer(mock).synthesize("Hello.").await.unwrap_err();
        assert_eq!(err, SynthesisError::Status { status: 500 });
    }

    #[tokio::test]
    async fn empty_body_is_malformed() {
        let mut mock = MockHttpClient::new();
        mock.expect_execute()
            .returning(|_| Ok(response(200, Some("audio/mpeg"), b"")));

        let err = synthesizer(mock).synthesize("Hello.").await.unwrap_err();
        assert!(matches!(err, SynthesisError::MalformedPayload(_)));
    }

    #[tokio::test]
    async fn transport_failure_maps_to_transport() {
        let mut mock = MockHttpClient::new();
        mock.expect_execute()
            .returning(|_| Err(BridgeError::OperationFailed("connection refused".into())));

        let err = synthesizer(mock).synthesize("Hello.").await.unwrap_err();
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn blank_text_never_hits_the_network() {
        let mut mock = MockHttpClient::new();
        mock.expect_execute().times(0);

        let err = synthesizer(mock).synthesize("   ").await.unwrap_err();
        assert!(matches!(err, SynthesisError::InvalidParameter(_)));
    }

    #[tokio::test]
    async fn lists_voices() {
        let mut mock = MockHttpClient::new();
        mock.expect_execute()
            .withf(|request| {
                request.method == HttpMethod::Get && request.url == "http://localhost:5000/voices"
            })
            .returning(|_| {
                Ok(response(
                    200,
                    Some("application/json"),
                    br#"[{"name": "vi-VN-HoaiMyNeural", "gender": "Female", "locale": "vi-VN"}]"#,
                ))
            });

        let voices = synthesizer(mock).list_voices().await.unwrap();
        assert_eq!(voices.len(), 1);
        assert_eq!(voices[0].name, "vi-VN-HoaiMyNeural");
        assert_eq!(voices[0].gender, "Female");
    }

    #[tokio::test]
    async fn health_reads_status_field() {
        let mut mock = MockHttpClient::new();
        mock.expect_execute()
            .returning(|_| Ok(response(200, Some("application/json"), br#"{"status": "ok"}"#)));

        assert!(synthesizer(mock).health().await.unwrap());
    }
}

//! ElevenLabs text-to-speech client.
//!
//! Two calls: list the account's voices, and synthesize text with one of
//! them. The voice list is cached locally through [`VoiceCache`].

use std::sync::Arc;

use reqwest::Url;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use sidechat_core::{CredentialStore, Result, Secret, SidechatError, Voice, VoiceCache, VoiceSettings};

use crate::dispatcher::DispatchOptions;
use crate::http;
use crate::registry::{self, ProviderSpec};

const SPEECH_PROVIDER: &str = "elevenlabs";

#[derive(Deserialize)]
struct VoicesResponse {
    voices: Option<Vec<Voice>>,
}

#[derive(Serialize)]
struct SynthesisRequest<'a> {
    text: &'a str,
    voice_settings: VoiceSettings,
}

pub struct SpeechClient {
    client: reqwest::Client,
    credentials: Arc<CredentialStore>,
    spec: &'static ProviderSpec,
    api_base: String,
}

impl SpeechClient {
    pub fn new(credentials: Arc<CredentialStore>, options: &DispatchOptions) -> Result<Self> {
        let spec = registry::describe(SPEECH_PROVIDER)?;
        Ok(Self {
            client: http::build_client(options.timeout)?,
            credentials,
            spec,
            api_base: options.api_base_for(spec),
        })
    }

    fn api_key(&self) -> Result<Secret> {
        self.credentials
            .get(SPEECH_PROVIDER)
            .ok_or_else(|| SidechatError::MissingCredential {
                provider: SPEECH_PROVIDER.to_string(),
            })
    }

    fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(self.api_base.trim_end_matches('/'))
            .map_err(|e| SidechatError::validation(format!("invalid speech API base: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| SidechatError::validation("speech API base cannot carry a path"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Fetch the voice list from the vendor.
    pub async fn list_voices(&self) -> Result<Vec<Voice>> {
        let api_key = self.api_key()?;
        let url = self.url(&["voices"])?;

        let call = self.client.get(url).header("xi-api-key", api_key.expose());
        let response = http::execute(self.spec, call).await?;
        let parsed: VoicesResponse = http::parse_json(self.spec, response).await?;

        let voices = parsed
            .voices
            .ok_or_else(|| http::malformed(self.spec, "missing voices array"))?;
        debug!(count = voices.len(), "fetched voices");
        Ok(voices)
    }

    /// Voice list, served from `cache` while fresh. `refresh` drops the cached
    /// entry first and always fetches.
    ///
    /// Cache read and write failures are logged and otherwise ignored.
    pub async fn voices(&self, cache: &VoiceCache, refresh: bool) -> Result<Vec<Voice>> {
        if refresh {
            if let Err(e) = cache.invalidate().await {
                warn!(error = %e, "failed to drop cached voices");
            }
        } else {
            match cache.get().await {
                Ok(Some(voices)) => {
                    debug!(count = voices.len(), "voice cache hit");
                    return Ok(voices);
                }
                Ok(None) => {}
                Err(e) => warn!(error = %e, "voice cache unreadable, fetching"),
            }
        }

        let voices = self.list_voices().await?;
        if let Err(e) = cache.put(&voices).await {
            warn!(error = %e, "failed to cache voices");
        }
        Ok(voices)
    }

    /// Synthesize `text` and return the encoded audio bytes.
    pub async fn synthesize(&self, text: &str, voice_id: &str, settings: VoiceSettings) -> Result<Vec<u8>> {
        if text.trim().is_empty() {
            return Err(SidechatError::validation("text cannot be empty"));
        }
        if voice_id.trim().is_empty() {
            return Err(SidechatError::validation("voice id cannot be empty"));
        }
        let api_key = self.api_key()?;

        let mut url = self.url(&["text-to-speech", voice_id.trim()])?;
        url.query_pairs_mut().append_pair("optimize_streaming_latency", "0");

        let body = SynthesisRequest {
            text,
            voice_settings: settings,
        };
        let call = self
            .client
            .post(url)
            .header("xi-api-key", api_key.expose())
            .header("Accept", "audio/mpeg")
            .json(&body);
        let response = http::execute(self.spec, call).await?;

        let audio = response.bytes().await.map_err(|e| SidechatError::Network {
            provider: self.spec.display_name.to_string(),
            message: e.to_string(),
        })?;
        if audio.is_empty() {
            return Err(http::malformed(self.spec, "empty audio body"));
        }

        info!(voice = voice_id, bytes = audio.len(), "speech synthesized");
        Ok(audio.to_vec())
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

//! Shared application state

use std::sync::Arc;
use std::time::Duration;

use lingotutor_config::Settings;
use lingotutor_core::{Error, LanguageModel, MemoryStore, Transcriber, UsageGate};
use lingotutor_engine::{EngineConfig, InMemoryMemoryStore, TutorEngine};
use lingotutor_llm::{BackendConfig, MeteredModel, OpenAiBackend};
use lingotutor_speech::{HttpSynthesizer, HttpTranscriber, SpeechConfig};
use lingotutor_usage::{AllowAllGate, InMemoryUsageLedger};

use crate::audio::AudioCache;

/// Everything the handlers share
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub engine: Arc<TutorEngine>,
    pub model: Arc<dyn LanguageModel>,
    pub gate: Arc<dyn UsageGate>,
    pub memory: Arc<dyn MemoryStore>,
    pub transcriber: Arc<dyn Transcriber>,
    pub backend: Arc<OpenAiBackend>,
    pub audio: Arc<AudioCache>,
}

impl AppState {
    /// Wire the application from settings
    pub fn new(settings: Settings) -> Result<Self, Error> {
        let backend = Arc::new(OpenAiBackend::new(BackendConfig {
            endpoint: settings.llm.endpoint.clone(),
            api_key: Some(settings.llm.api_key.clone()).filter(|k| !k.is_empty()),
            model: settings.llm.model.clone(),
            max_tokens: settings.llm.max_tokens,
            temperature: settings.llm.temperature,
            timeout: Duration::from_secs(settings.llm.timeout_secs),
            max_retries: settings.llm.max_retries,
            ..BackendConfig::default()
        })?);
        let model: Arc<dyn LanguageModel> = backend.clone();

        let speech_config = SpeechConfig {
            endpoint: settings.speech.endpoint.clone(),
            api_key: Some(settings.speech.api_key.clone()).filter(|k| !k.is_empty()),
            tts_model: settings.speech.tts_model.clone(),
            voice: settings.speech.voice.clone(),
            audio_format: settings.speech.audio_format.clone(),
            stt_model: settings.speech.stt_model.clone(),
            timeout: Duration::from_secs(settings.speech.timeout_secs),
        };
        let synthesizer = Arc::new(HttpSynthesizer::new(speech_config.clone())?);
        let transcriber: Arc<dyn Transcriber> = Arc::new(HttpTranscriber::new(speech_config)?);

        let gate: Arc<dyn UsageGate> = if settings.usage.enabled {
            Arc::new(InMemoryUsageLedger::new(settings.usage.daily_token_limit))
        } else {
            tracing::info!("usage limiting disabled, all callers admitted");
            Arc::new(AllowAllGate)
        };

        let memory: Arc<dyn MemoryStore> = Arc::new(InMemoryMemoryStore::new());

        let engine = Arc::new(TutorEngine::new(
            model.clone(),
            synthesizer,
            gate.clone(),
            memory.clone(),
            EngineConfig {
                tutor_name: settings.tutor.name.clone(),
                grammar_temperature: settings.tutor.grammar_temperature,
                reply_temperature: settings.tutor.reply_temperature,
                max_reply_tokens: settings.tutor.max_reply_tokens,
            },
        ));

        let audio = Arc::new(AudioCache::new(settings.server.audio_cache_clips));

        Ok(Self {
            settings: Arc::new(settings),
            engine,
            model,
            gate,
            memory,
            transcriber,
            backend,
            audio,
        })
    }

    /// A model that checks and charges the caller's usage on every
    /// completion. Built per request so the caller IP travels with it.
    pub fn metered_model(&self, client_ip: &str) -> Arc<dyn LanguageModel> {
        Arc::new(MeteredModel::new(
            Arc::clone(&self.model),
            Arc::clone(&self.gate),
            client_ip,
        ))
    }
}

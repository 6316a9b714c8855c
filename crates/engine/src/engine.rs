//! Turn orchestration
//!
//! `TutorEngine::run_turn` drives one conversational turn through the
//! phase graph: usage gate, grammar verdict, correction or free reply,
//! then speech. Three provider calls at most, one conditional branch,
//! and a history commit that only happens once the reply text is safely
//! in hand.

use std::sync::Arc;

use chrono::Utc;

use lingotutor_core::{
    contains_correction, next_utc_midnight, wrap_correction, Error, LanguageModel, MemoryStore,
    Result, SpeechSynthesizer, TurnReply, TurnRequest, UsageGate,
};
use lingotutor_llm::MeteredModel;

use crate::classifier::parse_verdict;
use crate::memory::exchange_entry;
use crate::prompts::TutorPrompts;
use crate::state::{TurnEvent, TurnState};

/// Engine tuning
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Name the tutor uses for itself
    pub tutor_name: String,
    /// Temperature for grammar verdicts
    pub grammar_temperature: f32,
    /// Temperature for corrections and replies
    pub reply_temperature: f32,
    /// Token budget for corrections and replies
    pub max_reply_tokens: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tutor_name: "Lingo".to_string(),
            grammar_temperature: 0.0,
            reply_temperature: 0.7,
            max_reply_tokens: 256,
        }
    }
}

/// The conversational tutoring engine
pub struct TutorEngine {
    model: Arc<dyn LanguageModel>,
    synthesizer: Arc<dyn SpeechSynthesizer>,
    gate: Arc<dyn UsageGate>,
    memory: Arc<dyn MemoryStore>,
    prompts: TutorPrompts,
}

impl TutorEngine {
    /// Wire an engine from its providers
    pub fn new(
        model: Arc<dyn LanguageModel>,
        synthesizer: Arc<dyn SpeechSynthesizer>,
        gate: Arc<dyn UsageGate>,
        memory: Arc<dyn MemoryStore>,
        config: EngineConfig,
    ) -> Self {
        let prompts = TutorPrompts::new(
            config.tutor_name,
            config.grammar_temperature,
            config.reply_temperature,
            config.max_reply_tokens,
        );
        Self {
            model,
            synthesizer,
            gate,
            memory,
            prompts,
        }
    }

    /// Run one conversational turn for the caller at `caller_ip`.
    ///
    /// Blocked callers are refused before any completion is attempted.
    /// The thread transcript is extended only on the free-reply path, and
    /// only after the reply text is complete, so an abandoned or failed
    /// turn never leaves a half-written exchange behind.
    pub async fn run_turn(&self, request: TurnRequest, caller_ip: &str) -> Result<TurnReply> {
        if request.thread_id.trim().is_empty() {
            return Err(Error::InvalidRequest(
                "thread_id must not be blank".to_string(),
            ));
        }

        if self.gate.is_blocked(caller_ip).await? {
            tracing::info!(ip = caller_ip, "turn refused: usage limit");
            return Err(Error::UsageLimit {
                ip: caller_ip.to_string(),
                blocked_until: Some(next_utc_midnight(Utc::now())),
            });
        }

        let metered = MeteredModel::new(
            Arc::clone(&self.model),
            Arc::clone(&self.gate),
            caller_ip,
        );

        // The client's running transcript wins when it sends one;
        // otherwise the server-held thread memory carries the context.
        let prior = if request.history.is_empty() {
            self.memory.read(&request.thread_id).await?
        } else {
            request.history.clone()
        };

        let mut state = TurnState::new(request);
        let thread_id = state.request.thread_id.clone();

        let trimmed_input = state.request.user_input.trim().to_string();
        let has_error = if trimmed_input.is_empty() {
            false
        } else {
            let verdict = metered
                .complete(self.prompts.grammar_check(&trimmed_input))
                .await
                .map_err(|e| e.in_thread(thread_id.as_str()))?;
            parse_verdict(&verdict.text)
        };
        state.has_grammar_error = has_error;
        state.advance(TurnEvent::GrammarChecked { has_error });

        if has_error {
            let response = metered
                .complete(self.prompts.correction(&state.request))
                .await
                .map_err(|e| e.in_thread(thread_id.as_str()))?;

            let text = response.text.trim().to_string();
            let ai_output = if contains_correction(&text) {
                text
            } else {
                wrap_correction(&text)
            };
            state.grammar_correction = Some(ai_output.clone());
            state.ai_output = ai_output;
            state.advance(TurnEvent::CorrectionProduced);

            // Corrections are read, not spoken; synthesis is skipped.
            state.advance(TurnEvent::SpeechFinished);

            tracing::info!(thread_id = %thread_id, "turn complete: correction");
            return Ok(TurnReply {
                ai_output: state.ai_output,
                history: prior,
                has_grammar_error: true,
                speech: None,
            });
        }

        let response = metered
            .complete(self.prompts.free_reply(&state.request, &prior))
            .await
            .map_err(|e| e.in_thread(thread_id.as_str()))?;
        state.ai_output = response.text.trim().to_string();

        let entry = exchange_entry(&state.request.user_input, &state.ai_output);
        let history = format!("{prior}{entry}");
        self.memory.append(&thread_id, &entry).await?;
        state.advance(TurnEvent::ReplyProduced);

        // Tagged output is read, not spoken, even on the reply path.
        if contains_correction(&state.ai_output) {
            tracing::debug!(
                thread_id = %thread_id,
                "reply carries a correction tag, skipping synthesis"
            );
        } else {
            match self.synthesizer.synthesize(&state.ai_output).await {
                Ok(clip) => {
                    state.has_speech_output = true;
                    state.speech = Some(clip);
                }
                Err(err) => {
                    tracing::warn!(
                        thread_id = %thread_id,
                        error = %err,
                        "speech synthesis failed, returning text only"
                    );
                }
            }
        }
        state.advance(TurnEvent::SpeechFinished);

        tracing::info!(
            thread_id = %thread_id,
            speech = state.has_speech_output,
            "turn complete: reply"
        );
        Ok(TurnReply {
            ai_output: state.ai_output,
            history,
            has_grammar_error: false,
            speech: state.speech,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryMemoryStore;
    use async_trait::async_trait;
    use lingotutor_core::{CefrLevel, ChatRequest, ChatResponse, SpeechClip, UsageRecord};
    use std::collections::VecDeque;
    use std::sync::Mutex;

    struct ScriptedModel {
        responses: Mutex<VecDeque<String>>,
        calls: Mutex<u32>,
    }

    impl ScriptedModel {
        fn new(responses: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.iter().map(|s| s.to_string()).collect()),
                calls: Mutex::new(0),
            })
        }

        fn calls(&self) -> u32 {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl LanguageModel for ScriptedModel {
        async fn complete(&self, _request: ChatRequest) -> Result<ChatResponse> {
            *self.calls.lock().unwrap() += 1;
            match self.responses.lock().unwrap().pop_front() {
                Some(text) => Ok(ChatResponse::text(text)),
                None => Err(Error::upstream("script exhausted")),
            }
        }

        fn model_name(&self) -> &str {
            "scripted"
        }
    }

    struct OkSynth;

    #[async_trait]
    impl SpeechSynthesizer for OkSynth {
        async fn synthesize(&self, _text: &str) -> Result<SpeechClip> {
            Ok(SpeechClip::mp3(b"AUDIO".to_vec()))
        }

        fn voice_name(&self) -> &str {
            "test"
        }
    }

    struct FailSynth;

    #[async_trait]
    impl SpeechSynthesizer for FailSynth {
        async fn synthesize(&self, _text: &str) -> Result<SpeechClip> {
            Err(Error::upstream("tts down"))
        }

        fn voice_name(&self) -> &str {
            "test"
        }
    }

    struct TestGate {
        blocked: bool,
        charges: Mutex<Vec<u32>>,
    }

    impl TestGate {
        fn open() -> Arc<Self> {
            Arc::new(Self {
                blocked: false,
                charges: Mutex::new(Vec::new()),
            })
        }

        fn closed() -> Arc<Self> {
            Arc::new(Self {
                blocked: true,
                charges: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl UsageGate for TestGate {
        async fn is_blocked(&self, _ip: &str) -> Result<bool> {
            Ok(self.blocked)
        }

        async fn record_usage(&self, ip: &str, tokens: u32) -> Result<UsageRecord> {
            self.charges.lock().unwrap().push(tokens);
            let mut record = UsageRecord::new(ip, Utc::now().date_naive());
            record.tokens_used = tokens;
            record.requests = 1;
            Ok(record)
        }
    }

    fn engine(
        model: Arc<ScriptedModel>,
        synthesizer: Arc<dyn SpeechSynthesizer>,
        gate: Arc<TestGate>,
        memory: Arc<InMemoryMemoryStore>,
    ) -> TutorEngine {
        TutorEngine::new(model, synthesizer, gate, memory, EngineConfig::default())
    }

    fn food_request(input: &str) -> TurnRequest {
        TurnRequest::new("t1", "Food", input).with_level(CefrLevel::A1)
    }

    #[tokio::test]
    async fn test_errored_input_returns_tagged_correction() {
        let model = ScriptedModel::new(&[
            "YES",
            "<error-correction>I eat an apple. \"eats\" is for he/she/it.</error-correction>",
        ]);
        let gate = TestGate::open();
        let memory = Arc::new(InMemoryMemoryStore::new());
        let engine = engine(model.clone(), Arc::new(OkSynth), gate.clone(), memory.clone());

        let prior = "User: Hallo\nAI: Was isst du gern?\n";
        let reply = engine
            .run_turn(food_request("I eats apple").with_history(prior), "10.0.0.1")
            .await
            .unwrap();

        assert!(reply.has_grammar_error);
        assert!(contains_correction(&reply.ai_output));
        assert!(reply.speech.is_none());
        // Correction turns leave the transcript untouched.
        assert_eq!(reply.history, prior);
        assert_eq!(memory.read("t1").await.unwrap(), "");
        assert_eq!(model.calls(), 2);
        assert_eq!(gate.charges.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_same_input_with_clean_verdict_takes_reply_branch() {
        // The verdict alone decides the branch, not the input text.
        let model = ScriptedModel::new(&["NO", "Apples are a great choice! Do you like them raw?"]);
        let memory = Arc::new(InMemoryMemoryStore::new());
        let engine = engine(model, Arc::new(OkSynth), TestGate::open(), memory.clone());

        let reply = engine
            .run_turn(food_request("I eats apple"), "10.0.0.1")
            .await
            .unwrap();

        assert!(!reply.has_grammar_error);
        assert!(!contains_correction(&reply.ai_output));
        assert!(reply.speech.is_some());
        assert_eq!(
            reply.history,
            "User: I eats apple\nAI: Apples are a great choice! Do you like them raw?\n"
        );
    }

    #[tokio::test]
    async fn test_tag_carrying_reply_skips_synthesis() {
        // Playback follows the text, not the branch: a clean-verdict reply
        // that quotes the marker comes back silent.
        let model = ScriptedModel::new(&[
            "NO",
            "Der Kasten <error-correction>so</error-correction> zeigt dir die verbesserte Form.",
        ]);
        let memory = Arc::new(InMemoryMemoryStore::new());
        let engine = engine(model.clone(), Arc::new(OkSynth), TestGate::open(), memory.clone());

        let reply = engine
            .run_turn(food_request("Was bedeutet der Kasten?"), "10.0.0.1")
            .await
            .unwrap();

        assert!(!reply.has_grammar_error);
        assert!(reply.speech.is_none());
        // Still a reply turn: the exchange commits.
        assert_eq!(
            memory.read("t1").await.unwrap(),
            "User: Was bedeutet der Kasten?\n\
             AI: Der Kasten <error-correction>so</error-correction> zeigt dir die verbesserte Form.\n"
        );
        assert_eq!(model.calls(), 2);
    }

    #[tokio::test]
    async fn test_untagged_correction_gets_wrapped() {
        let model = ScriptedModel::new(&["YES", "I eat an apple."]);
        let engine = engine(
            model,
            Arc::new(OkSynth),
            TestGate::open(),
            Arc::new(InMemoryMemoryStore::new()),
        );

        let reply = engine
            .run_turn(food_request("I eats apple"), "10.0.0.1")
            .await
            .unwrap();

        assert_eq!(
            reply.ai_output,
            "<error-correction>I eat an apple.</error-correction>"
        );
    }

    #[tokio::test]
    async fn test_clean_input_extends_history_exactly_once() {
        let model = ScriptedModel::new(&["NO", "Das klingt lecker! Was trinkst du dazu?"]);
        let memory = Arc::new(InMemoryMemoryStore::new());
        let engine = engine(model.clone(), Arc::new(OkSynth), TestGate::open(), memory.clone());

        let prior = "User: Hallo\nAI: Was isst du gern?\n";
        let reply = engine
            .run_turn(
                food_request("Ich esse gern Pizza").with_history(prior),
                "10.0.0.1",
            )
            .await
            .unwrap();

        assert!(!reply.has_grammar_error);
        assert!(!contains_correction(&reply.ai_output));
        assert_eq!(
            reply.history,
            format!("{prior}User: Ich esse gern Pizza\nAI: Das klingt lecker! Was trinkst du dazu?\n")
        );
        assert_eq!(
            memory.read("t1").await.unwrap(),
            "User: Ich esse gern Pizza\nAI: Das klingt lecker! Was trinkst du dazu?\n"
        );
        assert_eq!(reply.speech.unwrap().audio, b"AUDIO");
        assert_eq!(model.calls(), 2);
    }

    #[tokio::test]
    async fn test_empty_input_skips_classifier() {
        let model = ScriptedModel::new(&["Worüber möchtest du sprechen?"]);
        let engine = engine(
            model.clone(),
            Arc::new(OkSynth),
            TestGate::open(),
            Arc::new(InMemoryMemoryStore::new()),
        );

        let reply = engine.run_turn(food_request("   "), "10.0.0.1").await.unwrap();

        assert!(!reply.has_grammar_error);
        // Only the free reply ran; no verdict completion was consumed.
        assert_eq!(model.calls(), 1);
    }

    #[tokio::test]
    async fn test_speech_failure_nulls_only_speech() {
        let model = ScriptedModel::new(&["NO", "Guten Morgen!"]);
        let memory = Arc::new(InMemoryMemoryStore::new());
        let engine = engine(model, Arc::new(FailSynth), TestGate::open(), memory.clone());

        let reply = engine
            .run_turn(food_request("Guten Morgen"), "10.0.0.1")
            .await
            .unwrap();

        assert!(reply.speech.is_none());
        assert_eq!(reply.ai_output, "Guten Morgen!");
        assert!(!reply.has_grammar_error);
        // The exchange still committed.
        assert_eq!(
            memory.read("t1").await.unwrap(),
            "User: Guten Morgen\nAI: Guten Morgen!\n"
        );
    }

    #[tokio::test]
    async fn test_blocked_caller_spends_no_completions() {
        let model = ScriptedModel::new(&["NO", "never reached"]);
        let gate = TestGate::closed();
        let engine = engine(
            model.clone(),
            Arc::new(OkSynth),
            gate.clone(),
            Arc::new(InMemoryMemoryStore::new()),
        );

        let err = engine
            .run_turn(food_request("Hallo"), "10.0.0.1")
            .await
            .unwrap_err();

        match err {
            Error::UsageLimit { ip, blocked_until } => {
                assert_eq!(ip, "10.0.0.1");
                assert!(blocked_until.is_some());
            }
            other => panic!("expected usage limit, got {other:?}"),
        }
        assert_eq!(model.calls(), 0);
        assert!(gate.charges.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_prior_transcript_comes_from_store_when_request_is_bare() {
        let model = ScriptedModel::new(&["NO", "Mir geht es gut, danke!"]);
        let memory = Arc::new(InMemoryMemoryStore::new());
        memory
            .append("t1", "User: Hallo\nAI: Guten Tag!\n")
            .await
            .unwrap();
        let engine = engine(model, Arc::new(OkSynth), TestGate::open(), memory.clone());

        let reply = engine
            .run_turn(food_request("Wie geht es dir?"), "10.0.0.1")
            .await
            .unwrap();

        assert_eq!(
            reply.history,
            "User: Hallo\nAI: Guten Tag!\nUser: Wie geht es dir?\nAI: Mir geht es gut, danke!\n"
        );
        assert_eq!(reply.history, memory.read("t1").await.unwrap());
    }

    #[tokio::test]
    async fn test_returned_history_round_trips_across_turns() {
        let model = ScriptedModel::new(&[
            "NO",
            "Hallo! Was möchtest du heute essen?",
            "NO",
            "Pizza ist immer gut. Mit welchem Belag?",
        ]);
        let memory = Arc::new(InMemoryMemoryStore::new());
        let engine = engine(model, Arc::new(OkSynth), TestGate::open(), memory.clone());

        let first = engine
            .run_turn(food_request("Hallo"), "10.0.0.1")
            .await
            .unwrap();

        // Feeding the returned transcript back must extend it verbatim.
        let second = engine
            .run_turn(
                food_request("Ich nehme Pizza").with_history(&first.history),
                "10.0.0.1",
            )
            .await
            .unwrap();

        assert!(second.history.starts_with(&first.history));
        assert_eq!(
            second.history,
            "User: Hallo\nAI: Hallo! Was möchtest du heute essen?\n\
             User: Ich nehme Pizza\nAI: Pizza ist immer gut. Mit welchem Belag?\n"
        );
        assert_eq!(second.history, memory.read("t1").await.unwrap());
    }

    #[tokio::test]
    async fn test_upstream_failure_carries_thread_context() {
        // Verdict succeeds, correction call finds the script exhausted.
        let model = ScriptedModel::new(&["YES"]);
        let memory = Arc::new(InMemoryMemoryStore::new());
        let engine = engine(model, Arc::new(OkSynth), TestGate::open(), memory.clone());

        let err = engine
            .run_turn(food_request("I eats apple"), "10.0.0.1")
            .await
            .unwrap_err();

        match err {
            Error::UpstreamModel { thread_id, .. } => {
                assert_eq!(thread_id.as_deref(), Some("t1"));
            }
            other => panic!("expected upstream error, got {other:?}"),
        }
        assert_eq!(memory.read("t1").await.unwrap(), "");
    }

    #[tokio::test]
    async fn test_blank_thread_id_is_invalid() {
        let model = ScriptedModel::new(&[]);
        let engine = engine(
            model.clone(),
            Arc::new(OkSynth),
            TestGate::open(),
            Arc::new(InMemoryMemoryStore::new()),
        );

        let err = engine
            .run_turn(TurnRequest::new("  ", "Food", "Hallo"), "10.0.0.1")
            .await
            .unwrap_err();

        assert!(matches!(err, Error::InvalidRequest(_)));
        assert_eq!(model.calls(), 0);
    }
}

//! Scripted fakes shared by unit tests

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing_subscriber::fmt::MakeWriter;

use crate::core::errors::{LlmError, TranslationError};
use crate::core::llm::LlmClient;
use crate::core::models::Language;
use crate::providers::TranslationProvider;

type ChunkFn = dyn Fn(&str, Language, Language) -> Result<String, TranslationError> + Send + Sync;

/// Provider whose behaviour is supplied by a closure
pub(crate) struct ScriptedProvider {
    name: String,
    max_chunk_chars: usize,
    delay: Option<Duration>,
    script: Box<ChunkFn>,
    calls: AtomicUsize,
}

impl ScriptedProvider {
    pub(crate) fn new<F>(name: &str, script: F) -> Self
    where
        F: Fn(&str, Language, Language) -> Result<String, TranslationError> + Send + Sync + 'static,
    {
        Self {
            name: name.to_string(),
            max_chunk_chars: 2000,
            delay: None,
            script: Box::new(script),
            calls: AtomicUsize::new(0),
        }
    }

    /// Tags every chunk with the target code, e.g. `[es] text`
    pub(crate) fn tagging(name: &str) -> Self {
        Self::new(name, |text, _, target| Ok(format!("[{}] {}", target.code(), text)))
    }

    pub(crate) fn failing(name: &str) -> Self {
        Self::new(name, |_, _, _| {
            Err(TranslationError::NetworkError {
                message: "connection refused".to_string(),
            })
        })
    }

    pub(crate) fn empty(name: &str) -> Self {
        Self::new(name, |_, _, _| Ok("   ".to_string()))
    }

    /// Never answers within any sane deadline
    pub(crate) fn hanging(name: &str) -> Self {
        Self::tagging(name).with_delay(Duration::from_secs(3600))
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub(crate) fn with_max_chunk_chars(mut self, max: usize) -> Self {
        self.max_chunk_chars = max;
        self
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }
}

#[async_trait]
impl TranslationProvider for ScriptedProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn max_chunk_chars(&self) -> usize {
        self.max_chunk_chars
    }

    async fn translate_chunk(
        &self,
        text: &str,
        source: Language,
        target: Language,
    ) -> Result<String, TranslationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        (self.script)(text, source, target)
    }
}

/// LLM double returning a canned reply or error
pub(crate) struct FakeLlm {
    reply: Result<String, fn() -> LlmError>,
    delay: Option<Duration>,
    calls: AtomicUsize,
    last_prompt: Mutex<Option<String>>,
}

impl FakeLlm {
    pub(crate) fn replying(reply: &str) -> Self {
        Self {
            reply: Ok(reply.to_string()),
            delay: None,
            calls: AtomicUsize::new(0),
            last_prompt: Mutex::new(None),
        }
    }

    pub(crate) fn failing(error: fn() -> LlmError) -> Self {
        Self {
            reply: Err(error),
            delay: None,
            calls: AtomicUsize::new(0),
            last_prompt: Mutex::new(None),
        }
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn last_prompt(&self) -> Option<String> {
        self.last_prompt.lock().unwrap().clone()
    }

    pub(crate) fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }
}

#[async_trait]
impl LlmClient for FakeLlm {
    async fn complete(&self, prompt: &str, _max_tokens: u32) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_prompt.lock().unwrap() = Some(prompt.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match &self.reply {
            Ok(text) => Ok(text.clone()),
            Err(make) => Err(make()),
        }
    }
}

/// In-memory sink for formatted tracing output
#[derive(Clone, Default)]
pub(crate) struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl LogCapture {
    pub(crate) fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl std::io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogCapture {
    type Writer = LogCapture;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

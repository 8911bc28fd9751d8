//! The podcast generation job.
//!
//! A job runs on its own task and reports progress through a bounded channel
//! that the HTTP layer streams to the client:
//!
//! ```text
//! pending -> generating_text -> generating_audio -> uploading -> completed
//!        \______________\_________________\______________\__-> failed
//! ```
//!
//! 1. **Text**: one script-writer call with the URL listing
//! 2. **Chunk**: line-aligned split within the speech byte budget
//! 3. **Audio**: one synthesis task per chunk, all in flight at once, joined
//!    back by chunk index
//! 4. **Upload**: write script and audio, then add the index entry
//!
//! Every stage returns a `Result`; the first error is logged here and turned
//! into the terminal `failed` token. Error detail never reaches the stream.
//! A client that goes away does not stop the job, so files and index stay
//! consistent.

use super::artifacts::ArtifactStore;
use super::chunker::{self, TextEncoding};
use super::script::ScriptWriter;
use super::speech::SpeechSynthesizer;
use crate::error::PodcastError;
use crate::models::{GenerationRequest, PipelineStatus, TtsModel};
use crate::store::RankedStore;
use crate::utils::unix_timestamp;
use itertools::Itertools;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio::time::sleep;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, error, info, instrument};

pub const DEFAULT_MAX_CHUNK_BYTES: usize = 4000;
pub const DEFAULT_FLUSH_DELAY: Duration = Duration::from_millis(500);

/// One `- <url>` line per URL, in input order.
pub fn url_listing(urls: &[String]) -> String {
    urls.iter().map(|url| format!("- {url}")).join("\n")
}

/// Sends status tokens to the job's listener, tolerating a departed listener.
struct StatusReporter {
    tx: mpsc::Sender<PipelineStatus>,
    listener_gone: bool,
}

impl StatusReporter {
    fn new(tx: mpsc::Sender<PipelineStatus>) -> Self {
        Self {
            tx,
            listener_gone: false,
        }
    }

    async fn emit(&mut self, status: PipelineStatus) {
        debug!(%status, terminal = status.is_terminal(), "Pipeline status");
        if self.listener_gone {
            return;
        }
        if self.tx.send(status).await.is_err() {
            debug!(%status, "Listener disconnected; job continues");
            self.listener_gone = true;
        }
    }
}

/// Orchestrates script generation, speech synthesis and artifact upload.
pub struct PodcastPipeline<W, T, S> {
    writer: Arc<W>,
    speech: Arc<T>,
    store: Arc<S>,
    artifacts: ArtifactStore,
    max_chunk_bytes: usize,
    chunk_encoding: TextEncoding,
    flush_delay: Duration,
}

impl<W, T, S> PodcastPipeline<W, T, S>
where
    W: ScriptWriter,
    T: SpeechSynthesizer,
    S: RankedStore,
{
    pub fn new(writer: Arc<W>, speech: Arc<T>, store: Arc<S>, artifacts: ArtifactStore) -> Self {
        Self {
            writer,
            speech,
            store,
            artifacts,
            max_chunk_bytes: DEFAULT_MAX_CHUNK_BYTES,
            chunk_encoding: TextEncoding::default(),
            flush_delay: DEFAULT_FLUSH_DELAY,
        }
    }

    /// Largest chunk, in UTF-8 bytes, sent in one synthesis call.
    pub fn with_max_chunk_bytes(mut self, max_chunk_bytes: usize) -> Self {
        self.max_chunk_bytes = max_chunk_bytes;
        self
    }

    /// Encoding in which chunk sizes are measured.
    pub fn with_chunk_encoding(mut self, chunk_encoding: TextEncoding) -> Self {
        self.chunk_encoding = chunk_encoding;
        self
    }

    /// Pause after the first token and before the terminal one, giving the
    /// transport time to flush.
    pub fn with_flush_delay(mut self, flush_delay: Duration) -> Self {
        self.flush_delay = flush_delay;
        self
    }

    pub fn artifacts(&self) -> &ArtifactStore {
        &self.artifacts
    }

    /// Start a job on its own task and return its status stream.
    ///
    /// The stream ends right after `completed` or `failed`.
    pub fn start(self: &Arc<Self>, request: GenerationRequest) -> ReceiverStream<PipelineStatus> {
        let (tx, rx) = mpsc::channel(8);
        let pipeline = Arc::clone(self);
        tokio::spawn(async move {
            pipeline.run(request, tx).await;
        });
        ReceiverStream::new(rx)
    }

    /// Drive one job to its terminal status.
    #[instrument(
        level = "info",
        skip_all,
        fields(provider = %request.provider, urls = request.urls.len(), prefix = %request.filename_prefix)
    )]
    pub async fn run(&self, request: GenerationRequest, tx: mpsc::Sender<PipelineStatus>) -> PipelineStatus {
        let t0 = Instant::now();
        let mut reporter = StatusReporter::new(tx);

        reporter.emit(PipelineStatus::Pending).await;
        sleep(self.flush_delay).await;

        let terminal = match self.execute(&request, &mut reporter).await {
            Ok(name) => {
                info!(%name, elapsed_ms = t0.elapsed().as_millis() as u64, "Podcast completed");
                PipelineStatus::Completed
            }
            Err(e) => {
                error!(error = %e, elapsed_ms = t0.elapsed().as_millis() as u64, "Podcast generation failed");
                sleep(self.flush_delay).await;
                PipelineStatus::Failed
            }
        };
        reporter.emit(terminal).await;
        terminal
    }

    async fn execute(
        &self,
        request: &GenerationRequest,
        reporter: &mut StatusReporter,
    ) -> Result<String, PodcastError> {
        let listing = url_listing(&request.urls);

        reporter.emit(PipelineStatus::GeneratingText).await;
        let script = self.writer.write_script(request.text_model, &listing).await?;
        if script.trim().is_empty() {
            return Err(PodcastError::Upstream("script is empty".to_string()));
        }
        let chunks = chunker::split(&script, self.max_chunk_bytes, self.chunk_encoding)?;
        info!(script_bytes = script.len(), chunks = chunks.len(), "Script ready");

        reporter.emit(PipelineStatus::GeneratingAudio).await;
        let audio = self.synthesize_all(request.tts_model, chunks).await?;

        reporter.emit(PipelineStatus::Uploading).await;
        let timestamp = unix_timestamp();
        let name = self
            .artifacts
            .write(&request.filename_prefix, timestamp, &script, &audio)
            .await?;
        self.artifacts
            .record(self.store.as_ref(), request.provider, &name, timestamp)
            .await?;
        sleep(self.flush_delay).await;

        Ok(name)
    }

    /// Synthesize every chunk concurrently and concatenate in chunk order.
    ///
    /// The first failure aborts the remaining tasks.
    async fn synthesize_all(&self, model: TtsModel, chunks: Vec<String>) -> Result<Vec<u8>, PodcastError> {
        let count = chunks.len();
        let mut tasks = JoinSet::new();
        for (index, chunk) in chunks.into_iter().enumerate() {
            let speech = Arc::clone(&self.speech);
            tasks.spawn(async move { (index, speech.synthesize(model, &chunk).await) });
        }

        let mut parts: Vec<Option<Vec<u8>>> = vec![None; count];
        while let Some(joined) = tasks.join_next().await {
            let (index, result) =
                joined.map_err(|e| PodcastError::Upstream(format!("speech task failed: {e}")))?;
            parts[index] = Some(result?);
        }

        let audio: Vec<u8> = parts.into_iter().flatten().flatten().collect();
        info!(chunks = count, audio_bytes = audio.len(), "Audio ready");
        Ok(audio)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Provider, TextModel};
    use crate::store::FileRankedStore;
    use futures::StreamExt;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use PipelineStatus::*;

    struct FakeWriter {
        script: Option<String>,
        calls: AtomicUsize,
        seen_listing: Mutex<Option<String>>,
    }

    impl FakeWriter {
        fn ok(script: &str) -> Self {
            Self {
                script: Some(script.to_string()),
                calls: AtomicUsize::new(0),
                seen_listing: Mutex::new(None),
            }
        }

        fn failing() -> Self {
            Self {
                script: None,
                calls: AtomicUsize::new(0),
                seen_listing: Mutex::new(None),
            }
        }
    }

    impl ScriptWriter for FakeWriter {
        async fn write_script(&self, _model: TextModel, url_listing: &str) -> Result<String, PodcastError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.seen_listing.lock().unwrap() = Some(url_listing.to_string());
            self.script
                .clone()
                .ok_or_else(|| PodcastError::Upstream("quota exceeded".to_string()))
        }
    }

    /// Returns `[chunk]` as audio. Chunks whose first line ends in a larger
    /// number finish sooner, so completion order is the reverse of input order.
    struct FakeSpeech {
        fail_containing: Option<&'static str>,
        calls: AtomicUsize,
        completed: Mutex<Vec<String>>,
    }

    impl FakeSpeech {
        fn new() -> Self {
            Self {
                fail_containing: None,
                calls: AtomicUsize::new(0),
                completed: Mutex::new(Vec::new()),
            }
        }

        fn failing_on(marker: &'static str) -> Self {
            Self {
                fail_containing: Some(marker),
                ..Self::new()
            }
        }
    }

    impl SpeechSynthesizer for FakeSpeech {
        async fn synthesize(&self, _model: TtsModel, text: &str) -> Result<Vec<u8>, PodcastError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let position: u64 = text
                .lines()
                .next()
                .and_then(|l| l.rsplit(' ').next())
                .and_then(|n| n.parse().ok())
                .unwrap_or(0);
            sleep(Duration::from_millis(60u64.saturating_sub(position * 15))).await;
            if let Some(marker) = self.fail_containing {
                if text.contains(marker) {
                    return Err(PodcastError::Upstream("tts unavailable".to_string()));
                }
            }
            self.completed.lock().unwrap().push(text.to_string());
            Ok(format!("[{text}]").into_bytes())
        }
    }

    const SCRIPT: &str = "Speaker1: 0\nSpeaker2: 1\nSpeaker1: 2\nSpeaker2: 3\n";

    struct Harness {
        _tmp: tempfile::TempDir,
        store: Arc<FileRankedStore>,
        pipeline: Arc<PodcastPipeline<FakeWriter, FakeSpeech, FileRankedStore>>,
    }

    async fn harness(writer: FakeWriter, speech: FakeSpeech) -> Harness {
        let tmp = tempfile::tempdir().unwrap();
        let store = Arc::new(FileRankedStore::open(tmp.path().join("store.json")).await.unwrap());
        let artifacts = ArtifactStore::new(tmp.path().join("podcasts"));
        let pipeline = PodcastPipeline::new(Arc::new(writer), Arc::new(speech), Arc::clone(&store), artifacts)
            .with_max_chunk_bytes(12)
            .with_flush_delay(Duration::ZERO);
        Harness {
            _tmp: tmp,
            store,
            pipeline: Arc::new(pipeline),
        }
    }

    fn request() -> GenerationRequest {
        GenerationRequest {
            urls: vec!["https://a.example/1".to_string(), "https://b.example/2".to_string()],
            text_model: TextModel::Gpt41Mini,
            tts_model: TtsModel::GeminiFlashTts,
            filename_prefix: "show_".to_string(),
            provider: Provider::HackerNews,
        }
    }

    async fn podcast_names(store: &FileRankedStore) -> Vec<String> {
        store
            .rev_range(Provider::HackerNews.podcasts_key(), 0, 100)
            .await
            .unwrap()
    }

    #[test]
    fn test_url_listing() {
        let urls = vec!["https://a.example/1".to_string(), "https://b.example/2".to_string()];
        assert_eq!(url_listing(&urls), "- https://a.example/1\n- https://b.example/2");
    }

    #[tokio::test]
    async fn test_successful_job_emits_every_stage_once() {
        let h = harness(FakeWriter::ok(SCRIPT), FakeSpeech::new()).await;
        let statuses: Vec<PipelineStatus> = h.pipeline.start(request()).collect().await;
        assert_eq!(statuses, [Pending, GeneratingText, GeneratingAudio, Uploading, Completed]);

        assert_eq!(
            h.pipeline.writer.seen_listing.lock().unwrap().as_deref(),
            Some("- https://a.example/1\n- https://b.example/2")
        );

        let names = podcast_names(&h.store).await;
        assert_eq!(names.len(), 1);
        let name = &names[0];
        let timestamp: i64 = name.strip_prefix("show_").unwrap().parse().unwrap();
        assert_eq!(
            h.store.score(Provider::HackerNews.podcasts_key(), name).await.unwrap(),
            Some(timestamp as f64)
        );

        let dir = h.pipeline.artifacts().dir();
        let text = tokio::fs::read_to_string(dir.join(format!("{name}.txt"))).await.unwrap();
        assert_eq!(text, SCRIPT);
    }

    #[tokio::test]
    async fn test_audio_is_joined_in_chunk_order() {
        let h = harness(FakeWriter::ok(SCRIPT), FakeSpeech::new()).await;
        let statuses: Vec<PipelineStatus> = h.pipeline.start(request()).collect().await;
        assert_eq!(statuses.last(), Some(&Completed));

        // Every line is its own chunk, and they finished in reverse.
        let completed = h.pipeline.speech.completed.lock().unwrap().clone();
        assert_eq!(completed.first().map(String::as_str), Some("Speaker2: 3\n"));
        assert_eq!(h.pipeline.speech.calls.load(Ordering::SeqCst), 4);

        let name = &podcast_names(&h.store).await[0];
        let audio = tokio::fs::read(h.pipeline.artifacts().dir().join(format!("{name}.mp3")))
            .await
            .unwrap();
        let expected: String = SCRIPT.split_inclusive('\n').map(|l| format!("[{l}]")).collect();
        assert_eq!(String::from_utf8(audio).unwrap(), expected);
    }

    #[tokio::test]
    async fn test_text_failure_stops_before_audio() {
        let h = harness(FakeWriter::failing(), FakeSpeech::new()).await;
        let statuses: Vec<PipelineStatus> = h.pipeline.start(request()).collect().await;
        assert_eq!(statuses, [Pending, GeneratingText, Failed]);
        assert_eq!(h.pipeline.speech.calls.load(Ordering::SeqCst), 0);
        assert!(podcast_names(&h.store).await.is_empty());
        assert!(!h.pipeline.artifacts().dir().exists());
    }

    #[tokio::test]
    async fn test_oversized_line_fails_before_synthesis() {
        let script = format!("Speaker1: ok\n{}\n", "x".repeat(5000));
        let writer = Arc::new(FakeWriter::ok(&script));
        let speech = Arc::new(FakeSpeech::new());
        let tmp = tempfile::tempdir().unwrap();
        let store = Arc::new(FileRankedStore::open(tmp.path().join("store.json")).await.unwrap());
        let pipeline = Arc::new(
            PodcastPipeline::new(
                writer,
                Arc::clone(&speech),
                Arc::clone(&store),
                ArtifactStore::new(tmp.path().join("podcasts")),
            )
            .with_max_chunk_bytes(DEFAULT_MAX_CHUNK_BYTES)
            .with_flush_delay(Duration::ZERO),
        );

        assert!(matches!(
            chunker::split(&script, DEFAULT_MAX_CHUNK_BYTES, TextEncoding::Utf8),
            Err(PodcastError::SizeViolation { line: 2, bytes: 5001, max: 4000 })
        ));
        let statuses: Vec<PipelineStatus> = pipeline.start(request()).collect().await;
        assert_eq!(statuses, [Pending, GeneratingText, Failed]);
        assert_eq!(speech.calls.load(Ordering::SeqCst), 0);
        assert!(podcast_names(&store).await.is_empty());
    }

    #[tokio::test]
    async fn test_chunk_encoding_sets_the_budget_unit() {
        // One line: 16 bytes in UTF-8, 12 in UTF-16.
        let script = "가나다라마\n";
        let tmp = tempfile::tempdir().unwrap();
        let store = Arc::new(FileRankedStore::open(tmp.path().join("store.json")).await.unwrap());
        let speech = Arc::new(FakeSpeech::new());
        let pipeline = Arc::new(
            PodcastPipeline::new(
                Arc::new(FakeWriter::ok(script)),
                Arc::clone(&speech),
                Arc::clone(&store),
                ArtifactStore::new(tmp.path().join("podcasts")),
            )
            .with_max_chunk_bytes(12)
            .with_chunk_encoding(TextEncoding::Utf16)
            .with_flush_delay(Duration::ZERO),
        );
        let statuses: Vec<PipelineStatus> = pipeline.start(request()).collect().await;
        assert_eq!(statuses.last(), Some(&Completed));
        assert_eq!(speech.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_empty_script_fails() {
        let h = harness(FakeWriter::ok("  \n"), FakeSpeech::new()).await;
        let statuses: Vec<PipelineStatus> = h.pipeline.start(request()).collect().await;
        assert_eq!(statuses, [Pending, GeneratingText, Failed]);
    }

    #[tokio::test]
    async fn test_any_chunk_failure_fails_audio_stage() {
        let h = harness(FakeWriter::ok(SCRIPT), FakeSpeech::failing_on("Speaker2: 1")).await;
        let statuses: Vec<PipelineStatus> = h.pipeline.start(request()).collect().await;
        assert_eq!(statuses, [Pending, GeneratingText, GeneratingAudio, Failed]);
        assert!(podcast_names(&h.store).await.is_empty());
        assert!(!h.pipeline.artifacts().dir().exists());
    }

    #[tokio::test]
    async fn test_upload_failure_is_reported() {
        let h = harness(FakeWriter::ok(SCRIPT), FakeSpeech::new()).await;
        // A regular file where the output directory should be.
        tokio::fs::write(h.pipeline.artifacts().dir(), b"").await.unwrap();
        let statuses: Vec<PipelineStatus> = h.pipeline.start(request()).collect().await;
        assert_eq!(statuses, [Pending, GeneratingText, GeneratingAudio, Uploading, Failed]);
        assert!(podcast_names(&h.store).await.is_empty());
    }

    #[tokio::test]
    async fn test_job_finishes_after_listener_disconnects() {
        let h = harness(FakeWriter::ok(SCRIPT), FakeSpeech::new()).await;
        drop(h.pipeline.start(request()));

        for _ in 0..100 {
            if !podcast_names(&h.store).await.is_empty() {
                return;
            }
            sleep(Duration::from_millis(20)).await;
        }
        panic!("job did not complete after the listener went away");
    }

    #[tokio::test]
    async fn test_run_returns_terminal_status() {
        let h = harness(FakeWriter::ok(SCRIPT), FakeSpeech::new()).await;
        let (tx, mut rx) = mpsc::channel(8);
        let terminal = h.pipeline.run(request(), tx).await;
        assert_eq!(terminal, Completed);
        let mut seen = Vec::new();
        while let Some(status) = rx.recv().await {
            seen.push(status);
        }
        assert_eq!(seen.len(), 5);
        assert_eq!(h.pipeline.writer.calls.load(Ordering::SeqCst), 1);
    }
}

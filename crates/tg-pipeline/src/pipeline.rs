//! Background rendering with last-request-wins publication.

use std::any::Any;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tg_core::{DiagramRenderer, GenerationKey, RasterImage, RenderError, RenderState};
use tracing::{debug, trace, warn};

type RenderOutput = Result<RasterImage, RenderError>;

struct RenderTask {
    id: u64,
    key: GenerationKey,
    handle: JoinHandle<RenderOutput>,
}

/// Dispatches descriptions to a [`DiagramRenderer`] on worker threads.
///
/// Each request runs on its own thread and is never cancelled. When a worker
/// finishes, its result is published only if its key is still the current
/// one. Dropping the pipeline detaches any workers still running.
pub struct RenderPipeline {
    renderer: Arc<dyn DiagramRenderer>,
    current: Option<GenerationKey>,
    state: RenderState,
    last_image: Option<Arc<RasterImage>>,
    tasks: Vec<RenderTask>,
    next_id: u64,
}

impl RenderPipeline {
    #[must_use]
    pub fn new(renderer: Arc<dyn DiagramRenderer>) -> Self {
        Self {
            renderer,
            current: None,
            state: RenderState::Idle,
            last_image: None,
            tasks: Vec::new(),
            next_id: 0,
        }
    }

    #[must_use]
    pub const fn state(&self) -> &RenderState {
        &self.state
    }

    #[must_use]
    pub fn current_key(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// Most recent successfully rendered image, kept across later failures.
    #[must_use]
    pub fn last_image(&self) -> Option<&Arc<RasterImage>> {
        self.last_image.as_ref()
    }

    /// Renders started but not yet drained.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.tasks.len()
    }

    #[must_use]
    pub fn renderer_name(&self) -> &'static str {
        self.renderer.name()
    }

    /// Make `source` the current generation and start rendering it.
    ///
    /// Returns `false` without doing anything when `source` is already the
    /// current key. Renders in flight for older keys keep running.
    pub fn request(&mut self, source: &str) -> bool {
        if self.current.as_deref() == Some(source) {
            return false;
        }
        let key: GenerationKey = Arc::from(source);
        self.current = Some(Arc::clone(&key));

        if self.tasks.iter().any(|task| task.key == key) {
            debug!(bytes = key.len(), "render for key already in flight");
            self.state = RenderState::Rendering { key };
            return true;
        }

        self.state = match self.spawn(Arc::clone(&key)) {
            Ok(id) => {
                debug!(id, bytes = key.len(), "render requested");
                RenderState::Rendering { key }
            }
            Err(error) => {
                warn!(%error, "could not start render");
                RenderState::Failed { key, error }
            }
        };
        true
    }

    /// Apply every finished render without blocking. Returns whether the
    /// visible state changed.
    pub fn poll(&mut self) -> bool {
        let (finished, running): (Vec<RenderTask>, Vec<RenderTask>) =
            std::mem::take(&mut self.tasks)
                .into_iter()
                .partition(|task| task.handle.is_finished());
        self.tasks = running;

        let mut changed = false;
        for task in finished {
            changed |= self.complete(task);
        }
        changed
    }

    /// Block until the current key has been rendered.
    pub fn wait_current(&mut self) -> &RenderState {
        if let Some(current) = self.current.clone() {
            let (waiting, rest): (Vec<RenderTask>, Vec<RenderTask>) =
                std::mem::take(&mut self.tasks)
                    .into_iter()
                    .partition(|task| task.key == current);
            self.tasks = rest;
            for task in waiting {
                self.complete(task);
            }
        }
        self.poll();
        &self.state
    }

    /// Block until every render in flight has finished.
    pub fn wait_all(&mut self) -> &RenderState {
        for task in std::mem::take(&mut self.tasks) {
            self.complete(task);
        }
        &self.state
    }

    fn spawn(&mut self, key: GenerationKey) -> Result<u64, RenderError> {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);

        let renderer = Arc::clone(&self.renderer);
        let source = Arc::clone(&key);
        let handle = thread::Builder::new()
            .name(format!("tg-render-{id}"))
            .spawn(move || renderer.render(&source))
            .map_err(|error| RenderError::Spawn(error.to_string()))?;
        trace!(id, renderer = self.renderer.name(), "spawned render worker");

        self.tasks.push(RenderTask { id, key, handle });
        Ok(id)
    }

    fn complete(&mut self, task: RenderTask) -> bool {
        let RenderTask { id, key, handle } = task;
        let outcome = handle.join();

        if self.current.as_ref() != Some(&key) {
            debug!(id, "discarding stale render result");
            return false;
        }

        self.state = match outcome {
            Ok(Ok(image)) => {
                debug!(id, width = image.width(), height = image.height(), "render ready");
                let image = Arc::new(image);
                self.last_image = Some(Arc::clone(&image));
                RenderState::Ready { key, image }
            }
            Ok(Err(error)) => {
                warn!(id, %error, "render failed");
                RenderState::Failed { key, error }
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                warn!(id, panic = %message, "renderer panicked");
                RenderState::Failed {
                    key,
                    error: RenderError::Panicked(message),
                }
            }
        };
        true
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc::{self, Receiver, Sender};

    fn image_of(source: &str) -> RasterImage {
        let mut image = RasterImage::new(source.chars().count(), 1);
        image.set_str(0, 0, source);
        image
    }

    /// Echoes the source, or fails for sources starting with `bad`.
    struct EchoRenderer {
        calls: AtomicUsize,
    }

    impl EchoRenderer {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
            })
        }
    }

    impl DiagramRenderer for EchoRenderer {
        fn render(&self, source: &str) -> Result<RasterImage, RenderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if source.starts_with("bad") {
                return Err(RenderError::Backend(format!("cannot render {source}")));
            }
            Ok(image_of(source))
        }
    }

    /// Blocks each render until the test releases its key.
    #[derive(Default)]
    struct GatedRenderer {
        gates: Mutex<HashMap<String, Receiver<()>>>,
    }

    impl GatedRenderer {
        fn gate(&self, key: &str) -> Sender<()> {
            let (tx, rx) = mpsc::channel();
            self.gates.lock().unwrap().insert(key.to_string(), rx);
            tx
        }
    }

    impl DiagramRenderer for GatedRenderer {
        fn render(&self, source: &str) -> Result<RasterImage, RenderError> {
            let gate = self.gates.lock().unwrap().remove(source);
            if let Some(gate) = gate {
                let _ = gate.recv();
            }
            Ok(image_of(source))
        }
    }

    struct PanickingRenderer;

    impl DiagramRenderer for PanickingRenderer {
        fn render(&self, _source: &str) -> Result<RasterImage, RenderError> {
            panic!("renderer exploded");
        }
    }

    fn shown(state: &RenderState) -> Option<String> {
        state.image().map(ToString::to_string)
    }

    #[test]
    fn starts_idle() {
        let pipeline = RenderPipeline::new(EchoRenderer::new());
        assert_eq!(pipeline.state().as_str(), "idle");
        assert_eq!(pipeline.in_flight(), 0);
        assert!(pipeline.last_image().is_none());
    }

    #[test]
    fn request_then_wait_publishes_image() {
        let mut pipeline = RenderPipeline::new(EchoRenderer::new());
        assert!(pipeline.request("hello"));
        assert!(pipeline.state().is_pending());
        let state = pipeline.wait_current();
        assert_eq!(state.key(), Some("hello"));
        assert_eq!(shown(state).as_deref(), Some("hello"));
        assert_eq!(pipeline.in_flight(), 0);
    }

    #[test]
    fn unchanged_key_does_not_rerender() {
        let renderer = EchoRenderer::new();
        let mut pipeline = RenderPipeline::new(renderer.clone());
        assert!(pipeline.request("same"));
        assert!(!pipeline.request("same"));
        pipeline.wait_all();
        assert!(!pipeline.request("same"));
        assert_eq!(renderer.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn stale_result_finishing_last_is_discarded() {
        let renderer = Arc::new(GatedRenderer::default());
        let release_a = renderer.gate("A");
        let release_b = renderer.gate("B");
        let mut pipeline = RenderPipeline::new(renderer.clone());

        pipeline.request("A");
        pipeline.request("B");
        assert_eq!(pipeline.in_flight(), 2);

        release_b.send(()).unwrap();
        assert_eq!(shown(pipeline.wait_current()).as_deref(), Some("B"));

        release_a.send(()).unwrap();
        let state = pipeline.wait_all();
        assert_eq!(state.key(), Some("B"));
        assert_eq!(shown(state).as_deref(), Some("B"));
        assert_eq!(pipeline.last_image().map(ToString::to_string).as_deref(), Some("B"));
    }

    #[test]
    fn stale_result_finishing_first_is_discarded() {
        let renderer = Arc::new(GatedRenderer::default());
        let release_a = renderer.gate("A");
        let release_b = renderer.gate("B");
        let mut pipeline = RenderPipeline::new(renderer.clone());

        pipeline.request("A");
        pipeline.request("B");
        release_a.send(()).unwrap();
        // Joining everything also joins A, which must not become visible.
        release_b.send(()).unwrap();
        let state = pipeline.wait_all();
        assert_eq!(shown(state).as_deref(), Some("B"));
    }

    #[test]
    fn pending_state_survives_stale_completion() {
        let renderer = Arc::new(GatedRenderer::default());
        let release_a = renderer.gate("A");
        let release_b = renderer.gate("B");
        let mut pipeline = RenderPipeline::new(renderer.clone());

        pipeline.request("A");
        pipeline.request("B");
        release_a.send(()).unwrap();
        while pipeline.in_flight() == 2 {
            pipeline.poll();
            thread::yield_now();
        }
        assert!(pipeline.state().is_pending());
        assert_eq!(pipeline.state().key(), Some("B"));

        release_b.send(()).unwrap();
        pipeline.wait_current();
        assert_eq!(shown(pipeline.state()).as_deref(), Some("B"));
    }

    #[test]
    fn returning_to_in_flight_key_reuses_the_worker() {
        let renderer = Arc::new(GatedRenderer::default());
        let release_a = renderer.gate("A");
        let release_b = renderer.gate("B");
        let mut pipeline = RenderPipeline::new(renderer.clone());

        pipeline.request("A");
        pipeline.request("B");
        assert!(pipeline.request("A"));
        assert_eq!(pipeline.in_flight(), 2);

        release_a.send(()).unwrap();
        release_b.send(()).unwrap();
        assert_eq!(shown(pipeline.wait_all()).as_deref(), Some("A"));
    }

    #[test]
    fn renderer_error_fails_and_keeps_last_image() {
        let mut pipeline = RenderPipeline::new(EchoRenderer::new());
        pipeline.request("good");
        pipeline.wait_current();
        pipeline.request("bad input");
        let state = pipeline.wait_current();
        assert_eq!(state.as_str(), "failed");
        assert_eq!(
            state.error(),
            Some(&RenderError::Backend("cannot render bad input".into()))
        );
        assert_eq!(pipeline.last_image().map(ToString::to_string).as_deref(), Some("good"));
    }

    #[test]
    fn failure_is_not_retried_until_key_changes() {
        let renderer = EchoRenderer::new();
        let mut pipeline = RenderPipeline::new(renderer.clone());
        pipeline.request("bad");
        pipeline.wait_current();
        assert!(!pipeline.request("bad"));
        assert_eq!(renderer.calls.load(Ordering::SeqCst), 1);
        assert!(pipeline.request("good"));
        assert_eq!(shown(pipeline.wait_current()).as_deref(), Some("good"));
    }

    #[test]
    fn panicking_renderer_becomes_failed() {
        let mut pipeline = RenderPipeline::new(Arc::new(PanickingRenderer));
        pipeline.request("anything");
        let state = pipeline.wait_current();
        assert_eq!(
            state.error(),
            Some(&RenderError::Panicked("renderer exploded".into()))
        );
        assert!(pipeline.last_image().is_none());
    }

    #[test]
    fn poll_reports_changes_once() {
        let mut pipeline = RenderPipeline::new(EchoRenderer::new());
        pipeline.request("x");
        let mut changed = false;
        while pipeline.in_flight() > 0 {
            changed |= pipeline.poll();
            thread::yield_now();
        }
        assert!(changed);
        assert!(!pipeline.poll());
        assert_eq!(shown(pipeline.state()).as_deref(), Some("x"));
    }

    #[test]
    fn panic_message_handles_payload_kinds() {
        assert_eq!(panic_message(&"static"), "static");
        assert_eq!(panic_message(&String::from("owned")), "owned");
        assert_eq!(panic_message(&42_u8), "unknown panic payload");
    }
}

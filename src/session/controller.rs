//! Edit-State Controller
//!
//! Owns the session and the document buffer and sequences cue application,
//! rendering and zooming in response to host triggers.
//!
//! Re-entrancy: `dispatch` takes `&mut self`, so a host cannot call back in
//! while a trigger is being handled. The only way back in is the buffer's own
//! change echo, which the controller feeds through its guard while it is still
//! busy. Those echoes are always suppressed, so one external trigger runs at
//! most one cue pass.

use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::document::{DocumentBuffer, apply_cues, clear_cues};
use crate::render::{CommonMarkConverter, MarkdownConverter, RenderQueue, RenderSnapshot, Renderer};
use crate::session::edit_session::EditSession;
use crate::session::files::{read_shared, validate_drop, write_text};
use crate::session::trigger::{Activity, Outcome, Status, Trigger};
use crate::zoom::{Pane, ZoomController, ZoomDirection};

/// Extension accepted for dropped files unless configured otherwise
pub const DEFAULT_MARKDOWN_EXTENSION: &str = "md";

/// Counters of the work done by the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DispatchStats {
    /// Cue passes run
    pub cue_passes: usize,
    /// Documents rendered from the buffer
    pub renders: usize,
    /// Documents handed to the display surface
    pub deliveries: usize,
    /// Change notifications dropped by the re-entrancy guard
    pub suppressed: usize,
}

/// The live-preview state machine
pub struct EditController<C: MarkdownConverter = CommonMarkConverter> {
    session: EditSession,
    buffer: DocumentBuffer,
    zoom: ZoomController,
    renderer: Renderer<C>,
    queue: RenderQueue,
    markdown_extension: String,
    status: Status,
    last_snapshot: Option<RenderSnapshot>,
    last_generation: u64,
    stats: DispatchStats,
}

/// Result of rendering the buffer
enum Render {
    Submitted,
    Unchanged,
    Failed(String),
}

impl<C: MarkdownConverter> EditController<C> {
    pub fn new(
        session: EditSession,
        zoom: ZoomController,
        renderer: Renderer<C>,
        queue: RenderQueue,
    ) -> Self {
        let buffer = DocumentBuffer::new(session.line_height(zoom.line_height_multiplier()));

        Self {
            session,
            buffer,
            zoom,
            renderer,
            queue,
            markdown_extension: DEFAULT_MARKDOWN_EXTENSION.to_string(),
            status: Status::Idle,
            last_snapshot: None,
            last_generation: 0,
            stats: DispatchStats::default(),
        }
    }

    /// Build a controller from the configuration
    pub fn from_config(config: &Config, renderer: Renderer<C>, queue: RenderQueue) -> Self {
        let zoom = ZoomController::new(
            config.editor_zoom.bounds(),
            config.preview_zoom.bounds(),
            config.line_height_multiplier,
        );

        Self::new(EditSession::from_config(config), zoom, renderer, queue)
            .with_markdown_extension(&config.markdown_extension)
    }

    /// Accept dropped files with this extension instead of `md`
    pub fn with_markdown_extension(mut self, extension: &str) -> Self {
        self.markdown_extension = extension.trim_start_matches('.').to_string();
        self
    }

    pub fn session(&self) -> &EditSession {
        &self.session
    }

    pub fn buffer(&self) -> &DocumentBuffer {
        &self.buffer
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn stats(&self) -> DispatchStats {
        self.stats
    }

    pub fn renderer(&self) -> &Renderer<C> {
        &self.renderer
    }

    /// Last document submitted to the display surface
    pub fn last_snapshot(&self) -> Option<&RenderSnapshot> {
        self.last_snapshot.as_ref()
    }

    pub fn queue_mut(&mut self) -> &mut RenderQueue {
        &mut self.queue
    }

    /// Handle one trigger from the host
    pub fn dispatch(&mut self, trigger: Trigger) -> Outcome {
        self.accept(trigger)
    }

    fn accept(&mut self, trigger: Trigger) -> Outcome {
        if let Status::Busy(activity) = self.status {
            self.stats.suppressed += 1;
            log::trace!("Suppressed {} while {:?}", trigger_name(&trigger), activity);
            return Outcome::Suppressed;
        }

        log::debug!("Dispatching {}", trigger_name(&trigger));
        match trigger {
            Trigger::TextChanged { content } => self.text_changed(content),
            Trigger::FilesDropped(paths) => self.files_dropped(paths),
            Trigger::Zoom { pane, direction } => self.zoom(pane, direction),
            Trigger::Save => self.save(),
            Trigger::SaveAs(path) => self.save_as(path),
            Trigger::SetSimpleEdit(enabled) => self.set_simple_edit(enabled),
        }
    }

    fn text_changed(&mut self, content: Option<String>) -> Outcome {
        if let Some(content) = content {
            self.buffer.replace_text(&content);
            // The edit is the notification being handled, not an echo of it
            self.buffer.take_echoes();
            self.session.set_dirty(true);
        }
        self.refresh()
    }

    fn files_dropped(&mut self, paths: Vec<PathBuf>) -> Outcome {
        let path = match validate_drop(&paths, &self.markdown_extension) {
            Ok(path) => self.session.resolve(&path),
            Err(rejection) => {
                log::info!("Drop rejected: {}", rejection);
                return Outcome::Failed(rejection.into());
            }
        };

        let text = match read_shared(&path) {
            Ok(text) => text,
            Err(e) => {
                log::warn!("{}", e);
                return Outcome::Failed(e);
            }
        };

        self.status = Status::Busy(Activity::Loading);
        self.buffer.replace_text(&text);
        self.drain_echoes();
        self.status = Status::Idle;

        log::info!("Loaded {}", path.display());
        self.session.associate(path);
        self.session.set_dirty(false);

        self.refresh()
    }

    fn zoom(&mut self, pane: Pane, direction: ZoomDirection) -> Outcome {
        self.status = Status::Busy(Activity::Zooming);
        let scale = self
            .zoom
            .apply(&mut self.session, &mut self.buffer, pane, direction);
        self.drain_echoes();
        self.status = Status::Idle;

        log::debug!("{:?} zoom is now {}", pane, scale);
        Outcome::Zoomed { pane, scale }
    }

    fn save(&mut self) -> Outcome {
        let Some(path) = self.session.file().map(Path::to_path_buf) else {
            log::debug!("Save ignored: no file associated");
            return Outcome::Ignored;
        };
        self.write_to(path)
    }

    fn save_as(&mut self, path: PathBuf) -> Outcome {
        let path = self.session.resolve(&path);
        let outcome = self.write_to(path.clone());
        if matches!(outcome, Outcome::Saved(_)) {
            self.session.associate(path);
        }
        outcome
    }

    fn write_to(&mut self, path: PathBuf) -> Outcome {
        match write_text(&path, &self.buffer.plain_text()) {
            Ok(()) => {
                log::info!("Saved {}", path.display());
                self.session.set_dirty(false);
                Outcome::Saved(path)
            }
            Err(e) => {
                log::warn!("{}", e);
                Outcome::Failed(e)
            }
        }
    }

    fn set_simple_edit(&mut self, enabled: bool) -> Outcome {
        if self.session.simple_edit() == enabled {
            return Outcome::Ignored;
        }
        self.session.set_simple_edit(enabled);

        self.status = Status::Busy(Activity::ApplyingCues);
        if enabled {
            clear_cues(&mut self.buffer);
        } else {
            apply_cues(&mut self.buffer, &self.session);
            self.stats.cue_passes += 1;
        }
        self.drain_echoes();
        self.status = Status::Idle;

        Outcome::ModeChanged {
            simple_edit: enabled,
        }
    }

    /// Cue pass followed by a render
    fn refresh(&mut self) -> Outcome {
        self.status = Status::Busy(Activity::ApplyingCues);
        if !apply_cues(&mut self.buffer, &self.session).skipped {
            self.stats.cue_passes += 1;
        }
        self.drain_echoes();

        self.status = Status::Busy(Activity::Rendering);
        let render = self.render();
        self.status = Status::Idle;

        match render {
            Render::Submitted => Outcome::Refreshed { rendered: true },
            Render::Unchanged => Outcome::Refreshed { rendered: false },
            Render::Failed(message) => Outcome::RenderFailed { message },
        }
    }

    fn render(&mut self) -> Render {
        let snapshot = match self.renderer.render(&self.buffer.plain_text()) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                log::warn!("Preview not updated: {:#}", e);
                return Render::Failed(format!("{e:#}"));
            }
        };
        self.stats.renders += 1;

        // Resend only if the same document failed to reach the surface
        if self.last_snapshot.as_ref() == Some(&snapshot)
            && !self.queue.has_failed(self.last_generation)
        {
            log::trace!("Preview unchanged, skipping delivery");
            return Render::Unchanged;
        }

        self.last_generation = self.queue.submit(&snapshot);
        self.stats.deliveries += 1;
        self.last_snapshot = Some(snapshot);
        Render::Submitted
    }

    /// Feed the buffer's change notifications back through the guard
    fn drain_echoes(&mut self) {
        for _ in 0..self.buffer.take_echoes() {
            self.accept(Trigger::echo());
        }
    }
}

fn trigger_name(trigger: &Trigger) -> &'static str {
    match trigger {
        Trigger::TextChanged { content: Some(_) } => "text-changed",
        Trigger::TextChanged { content: None } => "change-notification",
        Trigger::FilesDropped(_) => "files-dropped",
        Trigger::Zoom { .. } => "zoom",
        Trigger::Save => "save",
        Trigger::SaveAs(_) => "save-as",
        Trigger::SetSimpleEdit(_) => "simple-edit",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::BlockStyle;
    use crate::render::{
        ChannelSurface, DeliveryReport, DisplaySurface, HtmlTemplate, surface_ready,
    };
    use crate::syntax::CueCategory;
    use anyhow::{Result, anyhow, bail};
    use std::future::{self, Future};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::mpsc::{self, UnboundedReceiver};

    #[derive(Default)]
    struct CountingConverter {
        calls: AtomicUsize,
        fail: bool,
    }

    impl MarkdownConverter for CountingConverter {
        fn convert(&self, markdown: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                bail!("converter exploded");
            }
            CommonMarkConverter::new().convert(markdown)
        }
    }

    fn controller_with(
        converter: CountingConverter,
        simple_edit: bool,
    ) -> (EditController<CountingConverter>, UnboundedReceiver<String>) {
        let (surface, documents) = ChannelSurface::new();
        let (signal, ready) = surface_ready();
        signal.mark_ready();
        let queue = RenderQueue::spawn(surface, ready, None);
        let session = EditSession::new(PathBuf::from("."), simple_edit, 10.0, 16.0);
        let renderer = Renderer::new(converter, HtmlTemplate::default());
        (
            EditController::new(session, ZoomController::default(), renderer, queue),
            documents,
        )
    }

    /// Surface whose first load fails
    struct FlakySurface {
        attempts: Arc<AtomicUsize>,
        documents: mpsc::UnboundedSender<String>,
    }

    impl DisplaySurface for FlakySurface {
        fn load_document(&mut self, html: String) -> impl Future<Output = Result<()>> + Send {
            let result = if self.attempts.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(anyhow!("surface hiccup"))
            } else {
                self.documents
                    .send(html)
                    .map_err(|_| anyhow!("preview receiver closed"))
            };
            future::ready(result)
        }
    }

    fn controller() -> (EditController<CountingConverter>, UnboundedReceiver<String>) {
        controller_with(CountingConverter::default(), false)
    }

    fn typed(text: &str) -> Trigger {
        Trigger::TextChanged {
            content: Some(text.to_string()),
        }
    }

    #[tokio::test]
    async fn test_text_change_runs_one_cue_pass_and_render() {
        let (mut controller, mut documents) = controller();

        let outcome = controller.dispatch(typed("# Title\nbody text"));

        assert!(matches!(outcome, Outcome::Refreshed { rendered: true }));
        assert!(controller.status().is_idle());
        assert!(controller.session().is_dirty());
        let stats = controller.stats();
        assert_eq!(stats.cue_passes, 1);
        assert_eq!(stats.renders, 1);
        assert_eq!(controller.renderer().converter().calls.load(Ordering::SeqCst), 1);

        let html = documents.recv().await.unwrap();
        assert!(html.contains("<h1>Title</h1>"));
    }

    #[tokio::test]
    async fn test_style_echoes_are_suppressed() {
        let (mut controller, _documents) = controller();

        controller.dispatch(typed("# One\n## Two\nplain\n![i](i.png)"));

        // Three blocks changed style; each echoed a change notification
        let stats = controller.stats();
        assert_eq!(stats.suppressed, 3);
        assert_eq!(stats.cue_passes, 1);
    }

    #[tokio::test]
    async fn test_unchanged_document_is_not_resubmitted() {
        let (mut controller, _documents) = controller();

        controller.dispatch(typed("same"));
        let outcome = controller.dispatch(Trigger::echo());

        assert!(matches!(outcome, Outcome::Refreshed { rendered: false }));
        let stats = controller.stats();
        assert_eq!(stats.renders, 2);
        assert_eq!(stats.deliveries, 1);
    }

    #[tokio::test]
    async fn test_render_failure_keeps_previous_snapshot() {
        let converter = CountingConverter {
            fail: true,
            ..CountingConverter::default()
        };
        let (mut controller, _documents) = controller_with(converter, false);

        let outcome = controller.dispatch(typed("# Title"));

        match outcome {
            Outcome::RenderFailed { message } => assert!(message.contains("converter exploded")),
            other => panic!("Expected render failure, got {other:?}"),
        }
        assert!(controller.last_snapshot().is_none());
        assert_eq!(controller.buffer().blocks()[0].cue(), CueCategory::Heading);
        assert!(controller.status().is_idle());
    }

    #[tokio::test]
    async fn test_zoom_does_not_render_or_cue() {
        let (mut controller, _documents) = controller();
        controller.dispatch(typed("a\nb"));
        let before = controller.stats();

        let outcome = controller.dispatch(Trigger::Zoom {
            pane: Pane::Editor,
            direction: ZoomDirection::Increase,
        });

        assert!(matches!(
            outcome,
            Outcome::Zoomed {
                pane: Pane::Editor,
                scale
            } if scale == 12.0
        ));
        let after = controller.stats();
        assert_eq!(after.cue_passes, before.cue_passes);
        assert_eq!(after.renders, before.renders);
        assert_eq!(after.suppressed, before.suppressed + 2);
        assert!(controller.buffer().blocks().iter().all(|b| b.line_height() == 18.0));
    }

    #[tokio::test]
    async fn test_new_text_keeps_zoomed_line_height() {
        let (mut controller, _documents) = controller();
        controller.dispatch(Trigger::Zoom {
            pane: Pane::Editor,
            direction: ZoomDirection::Increase,
        });
        controller.dispatch(typed("one\ntwo"));

        assert!(controller.buffer().blocks().iter().all(|b| b.line_height() == 18.0));
    }

    #[tokio::test]
    async fn test_entering_simple_edit_clears_cues() {
        let (mut controller, _documents) = controller();
        controller.dispatch(typed("# Title\nbody"));

        let outcome = controller.dispatch(Trigger::SetSimpleEdit(true));
        assert!(matches!(outcome, Outcome::ModeChanged { simple_edit: true }));
        assert!(
            controller
                .buffer()
                .blocks()
                .iter()
                .all(|b| b.style() == BlockStyle::PLAIN)
        );

        // Further edits stay uncued
        controller.dispatch(typed("# Title\n## Sub"));
        assert!(
            controller
                .buffer()
                .blocks()
                .iter()
                .all(|b| b.cue() == CueCategory::None)
        );
    }

    #[tokio::test]
    async fn test_leaving_simple_edit_reapplies_cues() {
        let (mut controller, _documents) = controller_with(CountingConverter::default(), true);
        controller.dispatch(typed("# Title"));
        assert_eq!(controller.buffer().blocks()[0].cue(), CueCategory::None);

        controller.dispatch(Trigger::SetSimpleEdit(false));
        assert_eq!(controller.buffer().blocks()[0].cue(), CueCategory::Heading);

        assert!(matches!(
            controller.dispatch(Trigger::SetSimpleEdit(false)),
            Outcome::Ignored
        ));
    }

    #[tokio::test]
    async fn test_save_as_associates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("new.md");
        let (mut controller, _documents) = controller();
        controller.dispatch(typed("# Draft"));

        let outcome = controller.dispatch(Trigger::SaveAs(path.clone()));

        assert!(matches!(outcome, Outcome::Saved(ref saved) if saved == &path));
        assert_eq!(controller.session().file(), Some(path.as_path()));
        assert!(!controller.session().is_dirty());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "# Draft");
    }

    #[tokio::test]
    async fn test_failed_save_keeps_dirty_flag() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing-dir").join("x.md");
        let (mut controller, _documents) = controller();
        controller.dispatch(typed("text"));

        let outcome = controller.dispatch(Trigger::SaveAs(path));

        assert!(outcome.error().is_some());
        assert!(controller.session().is_dirty());
        assert!(controller.session().file().is_none());
    }

    #[tokio::test]
    async fn test_failed_delivery_is_retried() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let (documents_tx, mut documents) = mpsc::unbounded_channel();
        let surface = FlakySurface {
            attempts: Arc::clone(&attempts),
            documents: documents_tx,
        };
        let (signal, ready) = surface_ready();
        signal.mark_ready();
        let session = EditSession::new(PathBuf::from("."), false, 10.0, 16.0);
        let mut controller = EditController::new(
            session,
            ZoomController::default(),
            Renderer::default(),
            RenderQueue::spawn(surface, ready, None),
        );
        let mut reports = controller.queue_mut().take_reports().unwrap();

        controller.dispatch(typed("# Title"));
        assert!(matches!(
            reports.recv().await,
            Some(DeliveryReport::Failed { generation: 1, .. })
        ));

        let outcome = controller.dispatch(typed("# Title"));
        assert!(matches!(outcome, Outcome::Refreshed { rendered: true }));
        assert_eq!(
            reports.recv().await,
            Some(DeliveryReport::Delivered { generation: 2 })
        );
        assert!(documents.recv().await.unwrap().contains("<h1>Title</h1>"));
        assert_eq!(attempts.load(Ordering::SeqCst), 2);

        // Delivered now, so the same text is debounced again
        let outcome = controller.dispatch(typed("# Title"));
        assert!(matches!(outcome, Outcome::Refreshed { rendered: false }));
    }

    #[tokio::test]
    async fn test_simple_edit_runs_no_cue_pass() {
        let (mut controller, _documents) = controller_with(CountingConverter::default(), true);

        controller.dispatch(typed("# Title\nbody"));

        let stats = controller.stats();
        assert_eq!(stats.cue_passes, 0);
        assert_eq!(stats.renders, 1);
        assert_eq!(stats.suppressed, 0);
    }

    #[tokio::test]
    async fn test_relative_save_as_uses_edit_folder() {
        let dir = tempfile::tempdir().unwrap();
        let (surface, _documents) = ChannelSurface::new();
        let (_signal, ready) = surface_ready();
        let session = EditSession::new(dir.path().to_path_buf(), false, 14.0, 16.0);
        let mut controller = EditController::new(
            session,
            ZoomController::default(),
            Renderer::default(),
            RenderQueue::spawn(surface, ready, None),
        );
        controller.dispatch(typed("# Draft"));

        let outcome = controller.dispatch(Trigger::SaveAs(PathBuf::from("draft.md")));

        let expected = dir.path().join("draft.md");
        assert!(matches!(outcome, Outcome::Saved(ref saved) if saved == &expected));
        assert_eq!(controller.session().file(), Some(expected.as_path()));
        assert_eq!(std::fs::read_to_string(&expected).unwrap(), "# Draft");
    }
}

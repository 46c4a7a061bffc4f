//! Viewer session: one document being annotated.
//!
//! The session owns every piece of viewer state (viewport, loaded page,
//! gesture, pending capture, annotation cache and overlay). Operations take
//! `&mut self`, so a session can be driven and inspected without a surface.

use crate::annotation::{Annotation, AnnotationId, AnnotationListEntry, PendingAnnotation};
use crate::backend::{Backend, BackendResult};
use crate::config::ViewerConfig;
use crate::document::{DocumentId, DocumentInfo, PageContext, PageInfo};
use crate::error::ViewerError;
use crate::gesture::{GestureClassifier, GestureOutcome, GestureState, MouseButton, PointerEvent};
use crate::overlay::{Overlay, OverlayRenderer};
use crate::presenter::{Confirmation, Presenter};
use crate::store::{AnnotationStore, PageKey};
use crate::transform::CoordinateTransformer;
use crate::viewport::ViewportState;
use kurbo::{Point, Size};

/// Last pointer position in display and document space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateReadout {
    pub display: Point,
    pub document: Point,
}

impl CoordinateReadout {
    /// Readout text, e.g. `"Display: (120, 48) | Document: (57.60, 23.04)"`.
    pub fn text(&self) -> String {
        format!(
            "Display: ({:.0}, {:.0}) | Document: ({:.2}, {:.2})",
            self.display.x.round(),
            self.display.y.round(),
            self.document.x,
            self.document.y
        )
    }
}

/// A page load that has been issued but not applied yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLoadTicket {
    pub sequence: u64,
    pub document_id: DocumentId,
    pub page_number: u32,
}

/// Backend replies for one page load.
#[derive(Debug)]
pub struct FetchedPage {
    pub ticket: PageLoadTicket,
    pub page: BackendResult<PageInfo>,
    /// Only requested when the page itself loaded.
    pub annotations: Option<BackendResult<Vec<Annotation>>>,
}

impl PageLoadTicket {
    /// Fetch page metadata, then the page's annotations.
    ///
    /// Borrows nothing from the session, so several loads may be in flight.
    pub async fn fetch<B: Backend + ?Sized>(self, backend: &B) -> FetchedPage {
        let page = backend.page(self.document_id, self.page_number).await;
        let annotations = match page {
            Ok(_) => Some(backend.annotations(self.document_id, self.page_number).await),
            Err(_) => None,
        };
        FetchedPage {
            ticket: self,
            page,
            annotations,
        }
    }
}

/// What happened to a finished page load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageLoadOutcome {
    /// The page is now shown.
    Applied,
    /// A newer load was issued meanwhile; this one was discarded.
    Superseded,
    /// The request was invalid (e.g. page out of range) and nothing was loaded.
    Skipped,
}

/// State of one viewer working on one document.
#[derive(Debug, Clone)]
pub struct ViewerSession {
    document_id: DocumentId,
    viewport: ViewportState,
    page: Option<PageContext>,
    gesture: GestureClassifier,
    pending: Option<PendingAnnotation>,
    store: AnnotationStore,
    overlay: OverlayRenderer,
    readout: Option<CoordinateReadout>,
    /// A page load is in flight.
    busy: bool,
    /// Sequence number of the most recently issued page load.
    latest_load: u64,
    zoom_step: f64,
}

impl ViewerSession {
    /// Create a session for `document` with default settings.
    pub fn new(document: &DocumentInfo) -> Self {
        Self::with_config(document, &ViewerConfig::default())
    }

    pub fn with_config(document: &DocumentInfo, config: &ViewerConfig) -> Self {
        let config = config.clone().sanitized();
        let mut viewport = ViewportState::new(document.page_count);
        viewport.set_zoom(config.initial_zoom);
        Self {
            document_id: document.id,
            viewport,
            page: None,
            gesture: GestureClassifier::with_threshold(config.click_threshold),
            pending: None,
            store: AnnotationStore::new(),
            overlay: OverlayRenderer::new(),
            readout: None,
            busy: false,
            latest_load: 0,
            zoom_step: config.zoom_step,
        }
    }

    pub fn document_id(&self) -> DocumentId {
        self.document_id
    }

    pub fn viewport(&self) -> &ViewportState {
        &self.viewport
    }

    /// The loaded page, if any.
    pub fn page(&self) -> Option<&PageContext> {
        self.page.as_ref()
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn gesture_state(&self) -> GestureState {
        self.gesture.state()
    }

    pub fn pending(&self) -> Option<&PendingAnnotation> {
        self.pending.as_ref()
    }

    pub fn annotations(&self) -> &[Annotation] {
        self.store.annotations()
    }

    pub fn store(&self) -> &AnnotationStore {
        &self.store
    }

    pub fn overlay(&self) -> &Overlay {
        self.overlay.current()
    }

    pub fn overlay_revision(&self) -> u64 {
        self.overlay.revision()
    }

    pub fn readout(&self) -> Option<&CoordinateReadout> {
        self.readout.as_ref()
    }

    /// Transformer for the loaded page at the current zoom.
    pub fn transformer(&self) -> CoordinateTransformer {
        let zoom = self.viewport.zoom();
        match &self.page {
            Some(page) => CoordinateTransformer::new(page.scale_factor, zoom),
            None => CoordinateTransformer::unloaded(zoom),
        }
    }

    /// Size of the zoomed canvas (zero when no page is loaded).
    pub fn canvas_size(&self) -> Size {
        self.page
            .as_ref()
            .map(|page| page.canvas_size(self.viewport.zoom()))
            .unwrap_or(Size::ZERO)
    }

    pub fn calibration_summary(&self) -> Option<String> {
        self.page.as_ref().map(PageContext::calibration_summary)
    }

    /// Recompute the overlay from the annotation cache and gesture.
    pub fn refresh_overlay(&mut self) -> &Overlay {
        let transformer = self.transformer();
        let canvas = self.canvas_size();
        self.overlay.sync(
            self.store.annotations(),
            &transformer,
            canvas,
            self.gesture.selection_rect(),
        )
    }

    // ------------------------------------------------------------------
    // Page loading
    // ------------------------------------------------------------------

    /// Issue a load of `page_number`. Returns `None` for pages out of range.
    ///
    /// Every ticket supersedes the ones issued before it.
    pub fn begin_page_load(&mut self, page_number: u32) -> Option<PageLoadTicket> {
        if !self.viewport.contains_page(page_number) {
            log::debug!("Ignoring load of page {} (out of range)", page_number);
            return None;
        }
        self.latest_load += 1;
        self.busy = true;
        Some(PageLoadTicket {
            sequence: self.latest_load,
            document_id: self.document_id,
            page_number,
        })
    }

    /// Apply the result of a page load.
    ///
    /// Results of superseded loads are dropped. A failed page fetch keeps the
    /// previous page. If only the annotation fetch failed, the new page is
    /// shown with an empty cache and the error is returned.
    pub fn finish_page_load(&mut self, fetched: FetchedPage) -> Result<PageLoadOutcome, ViewerError> {
        let ticket = fetched.ticket;
        if ticket.sequence != self.latest_load || ticket.document_id != self.document_id {
            log::debug!(
                "Discarding superseded load of page {} (sequence {}, latest {})",
                ticket.page_number,
                ticket.sequence,
                self.latest_load
            );
            return Ok(PageLoadOutcome::Superseded);
        }
        self.busy = false;

        let info = match fetched.page {
            Ok(info) => info,
            Err(source) => {
                log::error!("Failed to load page {}: {}", ticket.page_number, source);
                return Err(ViewerError::PageLoad {
                    page: ticket.page_number,
                    source,
                });
            }
        };

        self.viewport.set_current_page(ticket.page_number);
        self.page = Some(PageContext::new(ticket.page_number, info));
        self.gesture.cancel();
        self.pending = None;
        self.readout = None;
        let key = PageKey::new(self.document_id, ticket.page_number);
        self.store.reset(Some(key));
        log::info!(
            "Showing page {} of {}",
            ticket.page_number,
            self.viewport.total_pages()
        );

        let result = match fetched.annotations {
            Some(Ok(annotations)) => {
                self.store.replace(key, annotations);
                Ok(PageLoadOutcome::Applied)
            }
            Some(Err(source)) => {
                log::error!(
                    "Failed to load annotations for page {}: {}",
                    ticket.page_number,
                    source
                );
                Err(ViewerError::AnnotationLoad {
                    page: ticket.page_number,
                    source,
                })
            }
            None => Ok(PageLoadOutcome::Applied),
        };
        self.refresh_overlay();
        result
    }

    /// Load `page_number` and its annotations.
    pub async fn load_page<B: Backend + ?Sized>(
        &mut self,
        backend: &B,
        page_number: u32,
    ) -> Result<PageLoadOutcome, ViewerError> {
        let Some(ticket) = self.begin_page_load(page_number) else {
            return Ok(PageLoadOutcome::Skipped);
        };
        let fetched = ticket.fetch(backend).await;
        self.finish_page_load(fetched)
    }

    /// Load the current page (page 1 for a fresh session).
    pub async fn open<B: Backend + ?Sized>(&mut self, backend: &B) -> Result<PageLoadOutcome, ViewerError> {
        self.load_page(backend, self.viewport.current_page()).await
    }

    pub async fn next_page<B: Backend + ?Sized>(&mut self, backend: &B) -> Result<PageLoadOutcome, ViewerError> {
        match self.viewport.next_page() {
            Some(page) => self.load_page(backend, page).await,
            None => Ok(PageLoadOutcome::Skipped),
        }
    }

    pub async fn prev_page<B: Backend + ?Sized>(&mut self, backend: &B) -> Result<PageLoadOutcome, ViewerError> {
        match self.viewport.prev_page() {
            Some(page) => self.load_page(backend, page).await,
            None => Ok(PageLoadOutcome::Skipped),
        }
    }

    pub async fn go_to_page<B: Backend + ?Sized>(
        &mut self,
        backend: &B,
        page_number: u32,
    ) -> Result<PageLoadOutcome, ViewerError> {
        self.load_page(backend, page_number).await
    }

    /// Go to a page typed by the user. Invalid input leaves the current page
    /// in place; the caller shows [`ViewerSession::page_input_text`] again.
    pub async fn go_to_page_input<B: Backend + ?Sized>(
        &mut self,
        backend: &B,
        input: &str,
    ) -> Result<PageLoadOutcome, ViewerError> {
        match self.viewport.parse_page_input(input) {
            Some(page) => self.load_page(backend, page).await,
            None => {
                log::debug!("Reverting invalid page input {:?}", input);
                Ok(PageLoadOutcome::Skipped)
            }
        }
    }

    /// Text for the page number input.
    pub fn page_input_text(&self) -> String {
        self.viewport.current_page().to_string()
    }

    // ------------------------------------------------------------------
    // Zoom
    // ------------------------------------------------------------------

    /// Set the zoom level (clamped). An active drag is cancelled because its
    /// display coordinates no longer match the canvas.
    pub fn set_zoom(&mut self, level: f64) -> bool {
        if !self.viewport.set_zoom(level) {
            return false;
        }
        self.gesture.cancel();
        self.refresh_overlay();
        true
    }

    pub fn zoom_in(&mut self) -> bool {
        self.set_zoom(self.viewport.zoom() + self.zoom_step)
    }

    pub fn zoom_out(&mut self) -> bool {
        self.set_zoom(self.viewport.zoom() - self.zoom_step)
    }

    /// Zoom readout, e.g. `"125%"`.
    pub fn zoom_label(&self) -> String {
        format!("{}%", self.viewport.zoom_percent())
    }

    // ------------------------------------------------------------------
    // Pointer input
    // ------------------------------------------------------------------

    /// Start a gesture. Ignored without a page or while a capture awaits
    /// confirmation.
    pub fn pointer_down(&mut self, position: Point) -> GestureOutcome {
        if self.page.is_none() || self.pending.is_some() {
            return GestureOutcome::Ignored;
        }
        let outcome = self.gesture.pointer_down(position);
        self.overlay.set_selection(self.gesture.selection_rect());
        outcome
    }

    /// Track the pointer. Updates the coordinate readout on every move.
    pub fn pointer_move(&mut self, position: Point) -> GestureOutcome {
        if self.page.is_none() {
            return GestureOutcome::Ignored;
        }
        self.readout = Some(CoordinateReadout {
            display: position,
            document: self.transformer().to_document(position),
        });
        let outcome = self.gesture.pointer_move(position);
        if let GestureOutcome::Updated { selection } = outcome {
            self.overlay.set_selection(Some(selection));
        }
        outcome
    }

    /// Finish a gesture; a classified capture becomes the pending annotation.
    pub fn pointer_up(&mut self, position: Point) -> GestureOutcome {
        let outcome = self.gesture.pointer_up(position);
        if let GestureOutcome::Resolved(capture) = outcome {
            self.overlay.set_selection(None);
            self.pending = PendingAnnotation::from_capture(capture, &self.transformer());
            if let Some(pending) = &self.pending {
                log::debug!("Captured {}", pending.summary());
            }
        }
        outcome
    }

    /// Process a pointer event. Only the left button drives gestures.
    pub fn handle_pointer_event(&mut self, event: PointerEvent) -> GestureOutcome {
        match event {
            PointerEvent::Down {
                position,
                button: MouseButton::Left,
            } => self.pointer_down(position),
            PointerEvent::Up {
                position,
                button: MouseButton::Left,
            } => self.pointer_up(position),
            PointerEvent::Move { position } => self.pointer_move(position),
            PointerEvent::Down { .. } | PointerEvent::Up { .. } => GestureOutcome::Ignored,
        }
    }

    // ------------------------------------------------------------------
    // Annotations
    // ------------------------------------------------------------------

    /// Discard the pending capture. Returns false if there was none.
    pub fn cancel_pending(&mut self) -> bool {
        self.pending.take().is_some()
    }

    /// Save the pending capture with `description`.
    ///
    /// If the backend rejects it the capture stays pending for a retry.
    pub async fn confirm_pending<B: Backend + ?Sized>(
        &mut self,
        backend: &B,
        description: &str,
    ) -> Result<Annotation, ViewerError> {
        let pending = self.pending.ok_or(ViewerError::NoPending)?;
        let result = self.store.create(backend, &pending, description).await;
        if !matches!(result, Err(ViewerError::Create(_) | ViewerError::NoPage)) {
            self.pending = None;
        }
        self.refresh_overlay();
        result
    }

    pub async fn delete_annotation<B: Backend + ?Sized>(
        &mut self,
        backend: &B,
        id: AnnotationId,
    ) -> Result<(), ViewerError> {
        let result = self.store.delete(backend, id).await;
        self.refresh_overlay();
        result
    }

    /// Delete every annotation on the current page. Returns the number deleted.
    pub async fn clear_annotations<B: Backend + ?Sized>(&mut self, backend: &B) -> Result<usize, ViewerError> {
        let result = self.store.clear_all(backend).await;
        self.refresh_overlay();
        result
    }

    /// Refetch the current page's annotations.
    pub async fn reload_annotations<B: Backend + ?Sized>(&mut self, backend: &B) -> Result<(), ViewerError> {
        let result = self.store.refresh(backend).await;
        self.refresh_overlay();
        result
    }

    /// Rows for an annotation list, labelled like the overlay markers.
    pub fn annotation_list(&self) -> Vec<AnnotationListEntry> {
        self.store
            .annotations()
            .iter()
            .enumerate()
            .map(|(index, annotation)| annotation.list_entry(index))
            .collect()
    }

    // ------------------------------------------------------------------
    // Presenter-driven flows
    // ------------------------------------------------------------------

    /// Ask for a description of the pending capture and save it.
    ///
    /// Returns the saved annotation; `None` if the user discarded the capture
    /// or saving failed (the error goes to the presenter).
    pub async fn resolve_pending<B, P>(&mut self, backend: &B, presenter: &mut P) -> Option<Annotation>
    where
        B: Backend + ?Sized,
        P: Presenter + ?Sized,
    {
        let pending = self.pending?;
        let Some(description) = presenter.request_description(&pending) else {
            self.cancel_pending();
            return None;
        };
        match self.confirm_pending(backend, &description).await {
            Ok(annotation) => Some(annotation),
            Err(err) => {
                presenter.report_error(&err);
                None
            }
        }
    }

    /// Delete one annotation after the user confirms. Returns true if deleted.
    pub async fn delete_with_confirmation<B, P>(
        &mut self,
        backend: &B,
        presenter: &mut P,
        id: AnnotationId,
    ) -> bool
    where
        B: Backend + ?Sized,
        P: Presenter + ?Sized,
    {
        let Some(index) = self.store.index_of(id) else {
            log::debug!("Annotation {} is not on the current page", id);
            return false;
        };
        let label = self.store.annotations()[index].kind().label(index);
        if !presenter.confirm(&Confirmation::DeleteAnnotation { label }) {
            return false;
        }
        match self.delete_annotation(backend, id).await {
            Ok(()) => true,
            Err(err) => {
                presenter.report_error(&err);
                false
            }
        }
    }

    /// Clear the current page after the user confirms. Returns the number
    /// of annotations deleted.
    pub async fn clear_with_confirmation<B, P>(&mut self, backend: &B, presenter: &mut P) -> usize
    where
        B: Backend + ?Sized,
        P: Presenter + ?Sized,
    {
        let count = self.store.len();
        if count == 0 || !presenter.confirm(&Confirmation::ClearAll { count }) {
            return 0;
        }
        match self.clear_annotations(backend).await {
            Ok(cleared) => cleared,
            Err(err) => {
                presenter.report_error(&err);
                match &err {
                    ViewerError::ClearAll { failed, attempted, .. } => attempted - failed,
                    _ => 0,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::{AnnotationKind, AnnotationShape};
    use crate::backend::MemoryBackend;
    use crate::gesture::Capture;
    use crate::overlay::MarkerGeometry;
    use crate::testing::{block_on, letter_document};
    use kurbo::Rect;

    fn opened(backend: &MemoryBackend) -> ViewerSession {
        let mut session = ViewerSession::new(&letter_document());
        assert_eq!(block_on(session.open(backend)).unwrap(), PageLoadOutcome::Applied);
        session
    }

    fn backend() -> MemoryBackend {
        let backend = MemoryBackend::with_document(letter_document());
        backend.set_dpi(72);
        backend
    }

    fn click(session: &mut ViewerSession, at: Point) {
        session.pointer_down(at);
        session.pointer_up(at);
    }

    fn drag(session: &mut ViewerSession, from: Point, to: Point) {
        session.pointer_down(from);
        session.pointer_move(to);
        session.pointer_up(to);
    }

    #[derive(Default)]
    struct ScriptedPresenter {
        description: Option<String>,
        accept: bool,
        prompts: Vec<String>,
        errors: Vec<String>,
    }

    impl Presenter for ScriptedPresenter {
        fn request_description(&mut self, _pending: &PendingAnnotation) -> Option<String> {
            self.description.clone()
        }

        fn confirm(&mut self, confirmation: &Confirmation) -> bool {
            self.prompts.push(confirmation.prompt());
            self.accept
        }

        fn report_error(&mut self, error: &ViewerError) {
            self.errors.push(error.to_string());
        }
    }

    #[test]
    fn test_open_loads_first_page() {
        let backend = backend();
        let session = opened(&backend);
        assert_eq!(session.viewport().current_page(), 1);
        assert_eq!(session.canvas_size(), Size::new(612.0, 792.0));
        assert_eq!(session.calibration_summary().as_deref(), Some("1.00 px/pt @ 72 dpi"));
        assert!(!session.is_busy());
        assert!(session.overlay().markers.is_empty());
    }

    #[test]
    fn test_pointer_ignored_without_page() {
        let mut session = ViewerSession::new(&letter_document());
        assert_eq!(session.pointer_down(Point::new(1.0, 1.0)), GestureOutcome::Ignored);
        assert_eq!(session.pointer_up(Point::new(1.0, 1.0)), GestureOutcome::Ignored);
        assert!(session.pending().is_none());
        assert!(session.readout().is_none());
    }

    #[test]
    fn test_click_threshold_boundary() {
        let backend = backend();
        let mut session = opened(&backend);

        drag(&mut session, Point::new(100.0, 100.0), Point::new(104.0, 104.0));
        assert_eq!(session.pending().map(|p| p.shape.kind()), Some(AnnotationKind::Point));
        session.cancel_pending();

        drag(&mut session, Point::new(100.0, 100.0), Point::new(105.0, 100.0));
        assert_eq!(session.pending().map(|p| p.shape.kind()), Some(AnnotationKind::Area));
    }

    #[test]
    fn test_reverse_drag_is_normalized() {
        let backend = backend();
        let mut session = opened(&backend);
        session.set_zoom(2.0);

        drag(&mut session, Point::new(150.0, 150.0), Point::new(50.0, 50.0));
        let pending = session.pending().copied().unwrap();
        assert_eq!(pending.shape.origin(), Point::new(25.0, 25.0));
        assert_eq!(pending.display_anchor, Point::new(50.0, 50.0));
        assert_eq!(pending.effective_scale, 2.0);
    }

    #[test]
    fn test_zoom_keeps_document_coordinates() {
        let backend = backend();
        let mut session = opened(&backend);

        click(&mut session, Point::new(100.0, 50.0));
        let saved = block_on(session.confirm_pending(&backend, "")).unwrap();
        assert_eq!(saved.shape, AnnotationShape::Point { x: 100.0, y: 50.0 });
        assert_eq!(
            session.overlay().markers[0].geometry,
            MarkerGeometry::Anchor(Point::new(100.0, 50.0))
        );

        assert!(session.set_zoom(2.0));
        assert_eq!(session.annotations()[0].shape, AnnotationShape::Point { x: 100.0, y: 50.0 });
        assert_eq!(
            session.overlay().markers[0].geometry,
            MarkerGeometry::Anchor(Point::new(200.0, 100.0))
        );
        assert_eq!(session.canvas_size(), Size::new(1224.0, 1584.0));
    }

    #[test]
    fn test_overlay_refresh_is_idempotent() {
        let backend = backend();
        let mut session = opened(&backend);
        drag(&mut session, Point::new(10.0, 10.0), Point::new(60.0, 40.0));
        block_on(session.confirm_pending(&backend, "box")).unwrap();

        let first = session.refresh_overlay().clone();
        let second = session.refresh_overlay().clone();
        assert_eq!(first, second);
        assert_eq!(second.markers.len(), 1);
    }

    #[test]
    fn test_live_selection_while_dragging() {
        let backend = backend();
        let mut session = opened(&backend);
        session.pointer_down(Point::new(80.0, 80.0));
        session.pointer_move(Point::new(20.0, 30.0));
        assert_eq!(
            session.overlay().selection,
            Some(Rect::new(20.0, 30.0, 80.0, 80.0))
        );
        session.pointer_up(Point::new(20.0, 30.0));
        assert_eq!(session.overlay().selection, None);
    }

    #[test]
    fn test_readout_tracks_pointer() {
        let backend = backend();
        let mut session = opened(&backend);
        session.set_zoom(2.0);
        session.pointer_move(Point::new(120.4, 48.0));
        let readout = session.readout().copied().unwrap();
        assert_eq!(readout.text(), "Display: (120, 48) | Document: (60.20, 24.00)");
    }

    #[test]
    fn test_stale_page_load_is_discarded() {
        let backend = backend();
        let mut session = opened(&backend);

        let slow = session.begin_page_load(2).unwrap();
        let fast = session.begin_page_load(3).unwrap();
        let fast_result = block_on(fast.fetch(&backend));
        assert_eq!(session.finish_page_load(fast_result).unwrap(), PageLoadOutcome::Applied);
        assert!(!session.is_busy());

        let slow_result = block_on(slow.fetch(&backend));
        assert_eq!(session.finish_page_load(slow_result).unwrap(), PageLoadOutcome::Superseded);
        assert_eq!(session.viewport().current_page(), 3);
        assert_eq!(session.page().map(|p| p.page_number), Some(3));
    }

    #[test]
    fn test_busy_while_loading() {
        let backend = backend();
        let mut session = opened(&backend);
        let ticket = session.begin_page_load(2).unwrap();
        assert!(session.is_busy());
        let fetched = block_on(ticket.fetch(&backend));
        session.finish_page_load(fetched).unwrap();
        assert!(!session.is_busy());
    }

    #[test]
    fn test_page_change_drops_pending_and_gesture() {
        let backend = backend();
        let mut session = opened(&backend);
        click(&mut session, Point::new(5.0, 5.0));
        assert!(session.pending().is_some());

        block_on(session.next_page(&backend)).unwrap();
        assert!(session.pending().is_none());
        assert_eq!(session.gesture_state(), GestureState::Idle);
        assert_eq!(session.store().key(), Some(PageKey::new(1, 2)));
    }

    #[test]
    fn test_navigation_bounds() {
        let backend = backend();
        let mut session = opened(&backend);
        assert_eq!(block_on(session.prev_page(&backend)).unwrap(), PageLoadOutcome::Skipped);
        block_on(session.go_to_page(&backend, 3)).unwrap();
        assert_eq!(block_on(session.next_page(&backend)).unwrap(), PageLoadOutcome::Skipped);
        assert_eq!(session.viewport().current_page(), 3);
    }

    #[test]
    fn test_invalid_page_input_reverts() {
        let backend = backend();
        let mut session = opened(&backend);
        for input in ["abc", "0", "9", ""] {
            assert_eq!(
                block_on(session.go_to_page_input(&backend, input)).unwrap(),
                PageLoadOutcome::Skipped
            );
        }
        assert_eq!(session.page_input_text(), "1");
        block_on(session.go_to_page_input(&backend, " 2 ")).unwrap();
        assert_eq!(session.page_input_text(), "2");
    }

    #[test]
    fn test_failed_page_load_keeps_state() {
        let backend = backend();
        let mut session = opened(&backend);
        click(&mut session, Point::new(5.0, 5.0));
        backend.set_fail_loads(true);

        let result = block_on(session.next_page(&backend));
        assert!(matches!(result, Err(ViewerError::PageLoad { page: 2, .. })));
        assert_eq!(session.viewport().current_page(), 1);
        assert!(session.pending().is_some());
        assert!(!session.is_busy());
    }

    #[test]
    fn test_zoom_clamps_and_cancels_drag() {
        let backend = backend();
        let mut session = opened(&backend);
        session.pointer_down(Point::new(1.0, 1.0));
        assert!(session.set_zoom(10.0));
        assert_eq!(session.zoom_label(), "300%");
        assert_eq!(session.gesture_state(), GestureState::Idle);
        assert!(!session.zoom_in());
        assert!(session.zoom_out());
        assert_eq!(session.zoom_label(), "275%");
        assert!(!session.set_zoom(f64::NAN));
    }

    #[test]
    fn test_failed_create_keeps_pending() {
        let backend = backend();
        let mut session = opened(&backend);
        click(&mut session, Point::new(5.0, 5.0));
        backend.set_fail_creates(true);

        let result = block_on(session.confirm_pending(&backend, "retry me"));
        assert!(matches!(result, Err(ViewerError::Create(_))));
        assert!(session.pending().is_some());

        backend.set_fail_creates(false);
        block_on(session.confirm_pending(&backend, "retry me")).unwrap();
        assert!(session.pending().is_none());
        assert_eq!(session.annotations().len(), 1);
    }

    #[test]
    fn test_confirm_without_pending() {
        let backend = backend();
        let mut session = opened(&backend);
        assert!(matches!(
            block_on(session.confirm_pending(&backend, "")),
            Err(ViewerError::NoPending)
        ));
    }

    #[test]
    fn test_pending_blocks_new_gesture() {
        let backend = backend();
        let mut session = opened(&backend);
        click(&mut session, Point::new(5.0, 5.0));
        assert_eq!(session.pointer_down(Point::new(9.0, 9.0)), GestureOutcome::Ignored);
    }

    #[test]
    fn test_resolve_pending_with_presenter() {
        let backend = backend();
        let mut session = opened(&backend);
        let mut presenter = ScriptedPresenter {
            description: Some("initials".to_string()),
            ..Default::default()
        };

        click(&mut session, Point::new(5.0, 5.0));
        let saved = block_on(session.resolve_pending(&backend, &mut presenter)).unwrap();
        assert_eq!(saved.description, "initials");

        presenter.description = None;
        click(&mut session, Point::new(8.0, 8.0));
        assert!(block_on(session.resolve_pending(&backend, &mut presenter)).is_none());
        assert!(session.pending().is_none());
        assert_eq!(session.annotation_list().len(), 1);
    }

    #[test]
    fn test_delete_requires_confirmation() {
        let backend = backend();
        let mut session = opened(&backend);
        click(&mut session, Point::new(5.0, 5.0));
        let saved = block_on(session.confirm_pending(&backend, "")).unwrap();

        let mut presenter = ScriptedPresenter::default();
        assert!(!block_on(session.delete_with_confirmation(&backend, &mut presenter, saved.id)));
        assert_eq!(presenter.prompts, ["Delete Point 1?"]);
        assert_eq!(session.annotations().len(), 1);

        presenter.accept = true;
        assert!(block_on(session.delete_with_confirmation(&backend, &mut presenter, saved.id)));
        assert!(session.annotations().is_empty());
        assert!(session.overlay().markers.is_empty());
    }

    #[test]
    fn test_clear_reports_partial_failure_once() {
        let backend = backend();
        let mut session = opened(&backend);
        let mut ids = Vec::new();
        for x in [5.0, 50.0, 95.0] {
            click(&mut session, Point::new(x, x));
            ids.push(block_on(session.confirm_pending(&backend, "")).unwrap().id);
        }
        backend.fail_deletes_of(ids[0]);

        let mut presenter = ScriptedPresenter {
            accept: true,
            ..Default::default()
        };
        let cleared = block_on(session.clear_with_confirmation(&backend, &mut presenter));
        assert_eq!(cleared, 2);
        assert_eq!(presenter.errors.len(), 1);
        assert_eq!(session.annotations().len(), 1);
        assert_eq!(session.overlay().markers.len(), 1);
    }

    #[test]
    fn test_annotation_load_failure_still_shows_page() {
        let backend = backend();
        let mut session = opened(&backend);
        let ticket = session.begin_page_load(2).unwrap();
        let mut fetched = block_on(ticket.fetch(&backend));
        fetched.annotations = Some(Err(crate::backend::BackendError::Transport("offline".into())));

        let result = session.finish_page_load(fetched);
        assert!(matches!(result, Err(ViewerError::AnnotationLoad { page: 2, .. })));
        assert_eq!(session.viewport().current_page(), 2);
        assert!(session.annotations().is_empty());
    }

    #[test]
    fn test_pending_matches_capture_conversion() {
        let backend = backend();
        let mut session = opened(&backend);
        session.set_zoom(1.5);
        click(&mut session, Point::new(30.0, 45.0));
        let expected =
            PendingAnnotation::from_capture(Capture::Point(Point::new(30.0, 45.0)), &session.transformer());
        assert_eq!(session.pending().copied(), expected);
    }
}

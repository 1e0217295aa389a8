use wasm_bindgen::JsValue;
use web_sys::HtmlCanvasElement;

use crate::annotation::{Annotation, AnnotationStore, Draft};
use crate::config::{ConfigError, ViewerConfig, parse_color};
use crate::input::{InputState, ShapeKind, Tool, UiState};
use crate::loader::{LoadCompletion, LoadError, LoadTicket, LoadedImage, SlideId};
use crate::render::{self, Scene, Surface};
use crate::viewport::{Point, Size, Viewport};
use crate::web::{self, ImageCache, WebSurface};

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

/// Actions returned from input handlers and commands for the host to process.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// An annotation was finalized. Emitted exactly once per annotation.
    AnnotationCreated(Annotation),
    /// The canvas cursor should change to this CSS cursor.
    SetCursor(String),
    /// Visible state changed; the canvas must be redrawn.
    RenderNeeded,
}

/// Progress of the raster load for the active slide.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LoadStatus {
    /// No slide is active.
    #[default]
    Idle,
    /// A load has been issued and has not completed.
    Loading,
    /// The raster is available for drawing.
    Ready,
    /// The load failed; the canvas shows no base image.
    Failed(LoadError),
}

/// What happened to a completed load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The raster is now the base image.
    Applied,
    /// The load failed for the active slide.
    Failed(LoadError),
    /// The load belongs to an earlier activation and was dropped.
    StaleIgnored,
}

/// Core engine state: everything that doesn't depend on the canvas element.
///
/// Separated from `Engine` so it can be tested without WASM/browser dependencies.
/// Viewport, annotations and the base image belong to the active slide and are
/// rebuilt from scratch by [`EngineCore::set_active_slide`].
pub struct EngineCore {
    viewport: Viewport,
    annotations: AnnotationStore,
    image: Option<LoadedImage>,
    active: Option<LoadTicket>,
    load_status: LoadStatus,
    generation: u64,
    ui: UiState,
    input: InputState,
    canvas_width: f64,
    canvas_height: f64,
    dpr: f64,
}

impl Default for EngineCore {
    fn default() -> Self {
        Self {
            viewport: Viewport::default(),
            annotations: AnnotationStore::new(),
            image: None,
            active: None,
            load_status: LoadStatus::Idle,
            generation: 0,
            ui: UiState::default(),
            input: InputState::default(),
            canvas_width: 0.0,
            canvas_height: 0.0,
            dpr: 1.0,
        }
    }
}

impl EngineCore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// An engine whose new annotations use the configured color.
    #[must_use]
    pub fn with_config(config: &ViewerConfig) -> Self {
        let mut core = Self::new();
        core.ui.color.clone_from(&config.annotation_color);
        core
    }

    // --- Slide lifecycle ---

    /// Make `slide` the active slide and return the ticket to load its raster with.
    ///
    /// Resets the viewport, empties the annotation store, drops the base image
    /// and cancels any gesture. Every call issues a new ticket, so loads issued
    /// for earlier activations (even of the same slide) become stale. The
    /// actions restore the idle cursor and request a redraw.
    pub fn set_active_slide(&mut self, slide: SlideId) -> (LoadTicket, Vec<Action>) {
        self.generation += 1;
        let ticket = LoadTicket { slide, generation: self.generation };
        tracing::info!(slide = %ticket.slide, generation = ticket.generation, "slide activated");

        self.viewport = Viewport::default();
        self.annotations = AnnotationStore::new();
        self.image = None;
        self.input = InputState::Idle;
        self.load_status = LoadStatus::Loading;
        self.active = Some(ticket.clone());
        (ticket, vec![Action::SetCursor(self.ui.tool.cursor().to_owned()), Action::RenderNeeded])
    }

    /// Deactivate the current slide (e.g. it was deleted by the host).
    pub fn clear_active_slide(&mut self) -> Vec<Action> {
        self.generation += 1;
        self.viewport = Viewport::default();
        self.annotations = AnnotationStore::new();
        self.image = None;
        self.input = InputState::Idle;
        self.load_status = LoadStatus::Idle;
        self.active = None;
        vec![Action::RenderNeeded]
    }

    /// Accept a completed load if it still belongs to the active slide.
    pub fn apply_image_load(&mut self, completion: LoadCompletion) -> LoadOutcome {
        let LoadCompletion { ticket, result } = completion;
        if self.active.as_ref() != Some(&ticket) {
            tracing::debug!(slide = %ticket.slide, generation = ticket.generation, "stale slide load ignored");
            return LoadOutcome::StaleIgnored;
        }

        match result {
            Ok(surface) => {
                tracing::info!(
                    slide = %ticket.slide,
                    width = surface.width,
                    height = surface.height,
                    "slide image loaded"
                );
                self.image = Some(LoadedImage { ticket, surface });
                self.load_status = LoadStatus::Ready;
                LoadOutcome::Applied
            }
            Err(e) => {
                tracing::warn!(slide = %ticket.slide, fetch = e.is_fetch(), error = %e, "slide image load failed");
                self.image = None;
                self.load_status = LoadStatus::Failed(e.clone());
                LoadOutcome::Failed(e)
            }
        }
    }

    /// [`Self::apply_image_load`], reported as actions. Stale loads produce none.
    pub fn complete_image_load(&mut self, completion: LoadCompletion) -> Vec<Action> {
        match self.apply_image_load(completion) {
            LoadOutcome::Applied | LoadOutcome::Failed(_) => vec![Action::RenderNeeded],
            LoadOutcome::StaleIgnored => Vec::new(),
        }
    }

    // --- Commands ---

    /// Set the active tool. Any gesture in progress is cancelled without emitting.
    pub fn set_tool(&mut self, tool: Tool) -> Vec<Action> {
        let mut actions = self.cancel_gesture();
        self.ui.tool = tool;
        actions.push(Action::SetCursor(tool.cursor().to_owned()));
        actions
    }

    pub fn zoom_in(&mut self) -> Vec<Action> {
        self.viewport.zoom_in();
        vec![Action::RenderNeeded]
    }

    pub fn zoom_out(&mut self) -> Vec<Action> {
        self.viewport.zoom_out();
        vec![Action::RenderNeeded]
    }

    /// Back to 100% with no pan.
    pub fn reset(&mut self) -> Vec<Action> {
        self.viewport.reset();
        vec![Action::RenderNeeded]
    }

    /// Shift the viewport without a drag (keyboard/scripted panning).
    pub fn pan_by(&mut self, dx: f64, dy: f64) -> Vec<Action> {
        self.viewport.pan_by(dx, dy);
        vec![Action::RenderNeeded]
    }

    /// Remove every stored annotation. Already-emitted records are unaffected.
    pub fn clear_annotations(&mut self) -> Vec<Action> {
        self.annotations.clear();
        vec![Action::RenderNeeded]
    }

    /// Color for annotations finalized from now on.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] unless `color` is `#rgb` or `#rrggbb`.
    pub fn set_annotation_color(&mut self, color: &str) -> Result<(), ConfigError> {
        self.ui.color = parse_color("annotation color", color)?;
        Ok(())
    }

    /// Label for annotations finalized from now on; `None` or empty clears it.
    pub fn set_label(&mut self, label: Option<String>) {
        self.ui.label = label.filter(|l| !l.is_empty());
    }

    /// Update canvas dimensions (CSS pixels) and device pixel ratio.
    pub fn set_canvas_size(&mut self, width: f64, height: f64, dpr: f64) -> Vec<Action> {
        self.canvas_width = width.max(0.0);
        self.canvas_height = height.max(0.0);
        self.dpr = if dpr > 0.0 { dpr } else { 1.0 };
        vec![Action::RenderNeeded]
    }

    // --- Pointer input ---

    pub fn on_pointer_down(&mut self, pt: Point) -> Vec<Action> {
        if self.active.is_none() || self.input.is_active() {
            return Vec::new();
        }

        match self.ui.tool {
            Tool::Pan => {
                let pan = self.viewport.pan();
                self.input = InputState::Panning { drag_origin: Point::new(pt.x - pan.x, pt.y - pan.y) };
                vec![Action::SetCursor("grabbing".to_owned())]
            }
            Tool::Point => {
                let annotation = Annotation::point(pt, &self.ui.color, self.ui.label.clone());
                vec![self.commit(annotation), Action::RenderNeeded]
            }
            Tool::Rectangle => self.begin_draft(ShapeKind::Rectangle, pt),
            Tool::Circle => self.begin_draft(ShapeKind::Circle, pt),
        }
    }

    pub fn on_pointer_move(&mut self, pt: Point) -> Vec<Action> {
        match &mut self.input {
            InputState::Idle => Vec::new(),
            InputState::Panning { drag_origin } => {
                let origin = *drag_origin;
                self.viewport.pan_to(Point::new(pt.x - origin.x, pt.y - origin.y));
                vec![Action::RenderNeeded]
            }
            InputState::Drawing { draft, .. } => {
                draft.drag_to(pt);
                vec![Action::RenderNeeded]
            }
        }
    }

    /// Finish the gesture. The draft keeps the extent of the last move.
    pub fn on_pointer_up(&mut self, _pt: Point) -> Vec<Action> {
        match std::mem::take(&mut self.input) {
            InputState::Idle => Vec::new(),
            InputState::Panning { .. } => vec![Action::SetCursor(self.ui.tool.cursor().to_owned())],
            InputState::Drawing { shape, draft } => {
                let annotation = Annotation::from_draft(shape.into(), &draft, &self.ui.color, self.ui.label.clone());
                vec![self.commit(annotation), Action::RenderNeeded]
            }
        }
    }

    /// The pointer left the canvas: end panning, discard any draft.
    pub fn on_pointer_leave(&mut self) -> Vec<Action> {
        let was_panning = matches!(self.input, InputState::Panning { .. });
        let mut actions = self.cancel_gesture();
        if was_panning {
            actions.push(Action::SetCursor(self.ui.tool.cursor().to_owned()));
        }
        actions
    }

    // --- Rendering ---

    /// Borrowed view of everything the render pipeline draws.
    #[must_use]
    pub fn scene(&self) -> Scene<'_> {
        Scene {
            canvas: self.canvas_size(),
            viewport: &self.viewport,
            image: self.image.as_ref(),
            annotations: &self.annotations,
            draft: self.input.draft(),
        }
    }

    /// Draw the current state onto `surface`.
    ///
    /// # Errors
    ///
    /// Returns the surface's error if any drawing call fails.
    pub fn render_to<S: Surface>(&self, surface: &mut S) -> Result<(), S::Error> {
        render::draw(surface, &self.scene())
    }

    // --- Queries ---

    #[must_use]
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    #[must_use]
    pub fn annotations(&self) -> &AnnotationStore {
        &self.annotations
    }

    #[must_use]
    pub fn tool(&self) -> Tool {
        self.ui.tool
    }

    /// Tool, color and label applied to the next annotation.
    #[must_use]
    pub fn ui(&self) -> &UiState {
        &self.ui
    }

    #[must_use]
    pub fn input(&self) -> &InputState {
        &self.input
    }

    /// The in-progress draft, if a rectangle/circle drag is active.
    #[must_use]
    pub fn draft(&self) -> Option<(ShapeKind, &Draft)> {
        self.input.draft()
    }

    #[must_use]
    pub fn image(&self) -> Option<&LoadedImage> {
        self.image.as_ref()
    }

    #[must_use]
    pub fn active_slide(&self) -> Option<&SlideId> {
        self.active.as_ref().map(|t| &t.slide)
    }

    #[must_use]
    pub fn load_status(&self) -> &LoadStatus {
        &self.load_status
    }

    #[must_use]
    pub fn canvas_size(&self) -> Size {
        Size::new(self.canvas_width, self.canvas_height)
    }

    #[must_use]
    pub fn dpr(&self) -> f64 {
        self.dpr
    }

    /// CSS cursor for the current tool and gesture.
    #[must_use]
    pub fn cursor(&self) -> &'static str {
        match self.input {
            InputState::Panning { .. } => "grabbing",
            InputState::Idle | InputState::Drawing { .. } => self.ui.tool.cursor(),
        }
    }

    // --- Internals ---

    fn begin_draft(&mut self, shape: ShapeKind, pt: Point) -> Vec<Action> {
        self.input = InputState::Drawing { shape, draft: Draft::new(pt) };
        vec![Action::RenderNeeded]
    }

    fn commit(&mut self, annotation: Annotation) -> Action {
        tracing::debug!(id = %annotation.id, kind = ?annotation.kind, "annotation finalized");
        self.annotations.add(annotation.clone());
        Action::AnnotationCreated(annotation)
    }

    /// Return to `Idle`. A discarded draft needs a redraw; an ended pan does not.
    fn cancel_gesture(&mut self) -> Vec<Action> {
        match std::mem::take(&mut self.input) {
            InputState::Idle => Vec::new(),
            InputState::Panning { .. } => {
                tracing::debug!("pan gesture ended");
                Vec::new()
            }
            InputState::Drawing { shape, .. } => {
                tracing::debug!(?shape, "draft discarded");
                vec![Action::RenderNeeded]
            }
        }
    }
}

/// The full canvas engine. Wraps `EngineCore` and owns the browser canvas element.
///
/// Every command and pointer handler redraws synchronously when the core asks
/// for it, then hands the actions back so the host can forward
/// [`Action::AnnotationCreated`] records and apply cursor changes.
pub struct Engine {
    canvas: HtmlCanvasElement,
    images: ImageCache,
    core: EngineCore,
}

impl Engine {
    /// Create a new engine bound to the given canvas element.
    #[must_use]
    pub fn new(canvas: HtmlCanvasElement, config: &ViewerConfig) -> Self {
        Self { canvas, images: ImageCache::new(), core: EngineCore::with_config(config) }
    }

    // --- Slide lifecycle ---

    /// Read-only view of the engine state.
    #[must_use]
    pub fn core(&self) -> &EngineCore {
        &self.core
    }

    /// Activate a slide; the host runs [`crate::loader::ImageLoader::load`] with the returned ticket.
    pub fn set_active_slide(&mut self, slide: SlideId) -> (LoadTicket, Vec<Action>) {
        self.images.clear();
        let (ticket, actions) = self.core.set_active_slide(slide);
        (ticket, self.flush(actions))
    }

    pub fn clear_active_slide(&mut self) -> Vec<Action> {
        self.images.clear();
        let actions = self.core.clear_active_slide();
        self.flush(actions)
    }

    pub fn complete_image_load(&mut self, completion: LoadCompletion) -> Vec<Action> {
        let actions = self.core.complete_image_load(completion);
        self.flush(actions)
    }

    // --- Delegated commands ---

    pub fn set_tool(&mut self, tool: Tool) -> Vec<Action> {
        let actions = self.core.set_tool(tool);
        self.flush(actions)
    }

    pub fn zoom_in(&mut self) -> Vec<Action> {
        let actions = self.core.zoom_in();
        self.flush(actions)
    }

    pub fn zoom_out(&mut self) -> Vec<Action> {
        let actions = self.core.zoom_out();
        self.flush(actions)
    }

    pub fn reset(&mut self) -> Vec<Action> {
        let actions = self.core.reset();
        self.flush(actions)
    }

    pub fn pan_by(&mut self, dx: f64, dy: f64) -> Vec<Action> {
        let actions = self.core.pan_by(dx, dy);
        self.flush(actions)
    }

    pub fn clear_annotations(&mut self) -> Vec<Action> {
        let actions = self.core.clear_annotations();
        self.flush(actions)
    }

    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] unless `color` is `#rgb` or `#rrggbb`.
    pub fn set_annotation_color(&mut self, color: &str) -> Result<(), ConfigError> {
        self.core.set_annotation_color(color)
    }

    pub fn set_label(&mut self, label: Option<String>) {
        self.core.set_label(label);
    }

    /// Update viewport dimensions and device pixel ratio, resizing the backing store.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn set_canvas_size(&mut self, width_css: f64, height_css: f64, dpr: f64) -> Vec<Action> {
        let actions = self.core.set_canvas_size(width_css, height_css, dpr);
        let dpr = self.core.dpr();
        let size = self.core.canvas_size();
        self.canvas.set_width((size.width * dpr).round() as u32);
        self.canvas.set_height((size.height * dpr).round() as u32);
        self.flush(actions)
    }

    // --- Input events ---

    pub fn on_pointer_down(&mut self, pt: Point) -> Vec<Action> {
        let actions = self.core.on_pointer_down(pt);
        self.flush(actions)
    }

    pub fn on_pointer_move(&mut self, pt: Point) -> Vec<Action> {
        let actions = self.core.on_pointer_move(pt);
        self.flush(actions)
    }

    pub fn on_pointer_up(&mut self, pt: Point) -> Vec<Action> {
        let actions = self.core.on_pointer_up(pt);
        self.flush(actions)
    }

    pub fn on_pointer_leave(&mut self) -> Vec<Action> {
        let actions = self.core.on_pointer_leave();
        self.flush(actions)
    }

    // --- Render ---

    /// Draw the current state to the canvas.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the 2D context is unavailable or any Canvas2D call fails.
    pub fn render(&mut self) -> Result<(), JsValue> {
        let ctx = web::context_2d(&self.canvas)?;
        let mut surface = WebSurface::new(&ctx, self.core.dpr(), &mut self.images);
        self.core.render_to(&mut surface)
    }

    fn flush(&mut self, actions: Vec<Action>) -> Vec<Action> {
        if needs_render(&actions) {
            if let Err(e) = self.render() {
                tracing::warn!(error = ?e, "canvas render failed");
            }
        }
        actions
    }
}

/// Whether any action asks for a redraw.
#[must_use]
pub fn needs_render(actions: &[Action]) -> bool {
    actions.iter().any(|a| matches!(a, Action::RenderNeeded))
}

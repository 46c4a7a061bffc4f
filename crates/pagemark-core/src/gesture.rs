//! Pointer gesture tracking and point/area classification.

use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};

/// Maximum displacement (display pixels, per axis) for a gesture to count
/// as a click. Not adjusted for zoom.
pub const CLICK_THRESHOLD: f64 = 5.0;

/// Mouse button identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// Pointer event in display coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PointerEvent {
    Down { position: Point, button: MouseButton },
    Up { position: Point, button: MouseButton },
    Move { position: Point },
}

/// An in-progress pointer-down/up cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionGesture {
    pub start: Point,
    pub end: Point,
}

impl SelectionGesture {
    pub fn new(position: Point) -> Self {
        Self {
            start: position,
            end: position,
        }
    }

    /// Bounding box of start and end with the top-left corner first.
    pub fn rect(&self) -> Rect {
        Rect::from_points(self.start, self.end)
    }
}

/// Gesture state machine states.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum GestureState {
    #[default]
    Idle,
    Dragging(SelectionGesture),
}

/// What a finished gesture captured, in display coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Capture {
    Point(Point),
    Area(Rect),
}

/// Result of feeding one pointer event to the classifier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureOutcome {
    /// Event had no effect on the gesture.
    Ignored,
    /// A drag started.
    Started,
    /// The drag moved; the live selection needs redrawing.
    Updated { selection: Rect },
    /// The gesture finished and was classified.
    Resolved(Capture),
}

/// Classify a gesture by its displacement.
///
/// Both axes must move less than `threshold` for a point capture, which is
/// reported at `end`. Anything larger is an area spanning both positions.
pub fn classify(start: Point, end: Point, threshold: f64) -> Capture {
    let dx = (end.x - start.x).abs();
    let dy = (end.y - start.y).abs();
    if dx < threshold && dy < threshold {
        Capture::Point(end)
    } else {
        Capture::Area(Rect::from_points(start, end))
    }
}

/// Tracks one pointer gesture at a time and classifies it on release.
#[derive(Debug, Clone)]
pub struct GestureClassifier {
    state: GestureState,
    threshold: f64,
}

impl Default for GestureClassifier {
    fn default() -> Self {
        Self {
            state: GestureState::Idle,
            threshold: CLICK_THRESHOLD,
        }
    }
}

impl GestureClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a custom click threshold (display pixels).
    pub fn with_threshold(threshold: f64) -> Self {
        Self {
            threshold,
            ..Self::default()
        }
    }

    pub fn state(&self) -> GestureState {
        self.state
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, GestureState::Dragging(_))
    }

    /// Normalized bounds of the active drag.
    pub fn selection_rect(&self) -> Option<Rect> {
        match self.state {
            GestureState::Dragging(gesture) => Some(gesture.rect()),
            GestureState::Idle => None,
        }
    }

    /// Start a gesture. A press during an active drag restarts it.
    pub fn pointer_down(&mut self, position: Point) -> GestureOutcome {
        self.state = GestureState::Dragging(SelectionGesture::new(position));
        GestureOutcome::Started
    }

    pub fn pointer_move(&mut self, position: Point) -> GestureOutcome {
        match &mut self.state {
            GestureState::Dragging(gesture) => {
                gesture.end = position;
                GestureOutcome::Updated {
                    selection: gesture.rect(),
                }
            }
            GestureState::Idle => GestureOutcome::Ignored,
        }
    }

    /// Finish the gesture and classify it. Ignored when idle.
    pub fn pointer_up(&mut self, position: Point) -> GestureOutcome {
        match std::mem::take(&mut self.state) {
            GestureState::Dragging(gesture) => {
                GestureOutcome::Resolved(classify(gesture.start, position, self.threshold))
            }
            GestureState::Idle => GestureOutcome::Ignored,
        }
    }

    /// Drop any active gesture.
    pub fn cancel(&mut self) {
        self.state = GestureState::Idle;
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
}

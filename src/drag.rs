//! Pointer handling for the two selection handles.
//!
//! Dragging is a small state machine. [`transition`] is pure: it takes the
//! current state and one pointer event and returns the next state plus the
//! selection edit to apply, if any. [`DragController`] wraps it for callers
//! that hold a [`SelectionRange`].

use crate::selection::SelectionRange;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DragState {
    #[default]
    Idle,
    DraggingStart,
    DraggingEnd,
}

/// One of the two selection boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handle {
    Start,
    End,
}

/// Horizontal extent of the waveform on screen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub x: f32,
    pub width: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    /// Button pressed on a handle.
    Press(Handle),
    /// Pointer moved to absolute horizontal position `x`.
    Move { x: f32, bounds: Bounds },
    /// Button released, wherever the pointer is.
    Release,
}

/// Selection update produced by a drag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SelectionEdit {
    Start(f64),
    End(f64),
}

impl SelectionEdit {
    pub fn apply(self, range: &mut SelectionRange) {
        match self {
            Self::Start(t) => range.set_start(t),
            Self::End(t) => range.set_end(t),
        }
    }
}

/// Position of `x` within `bounds` as a fraction clamped to `[0, 1]`.
/// `None` when the bounds have no usable width.
pub fn pointer_fraction(x: f32, bounds: Bounds) -> Option<f64> {
    if !bounds.width.is_finite() || bounds.width <= 0.0 || !x.is_finite() {
        return None;
    }
    let fraction = f64::from(x - bounds.x) / f64::from(bounds.width);
    Some(fraction.clamp(0.0, 1.0))
}

/// Advance the drag state machine by one event.
pub fn transition(
    state: DragState,
    event: PointerEvent,
    duration: f64,
) -> (DragState, Option<SelectionEdit>) {
    match (state, event) {
        (DragState::Idle, PointerEvent::Press(Handle::Start)) => (DragState::DraggingStart, None),
        (DragState::Idle, PointerEvent::Press(Handle::End)) => (DragState::DraggingEnd, None),
        (_, PointerEvent::Release) => (DragState::Idle, None),
        (DragState::Idle, PointerEvent::Move { .. }) => (DragState::Idle, None),
        (dragging, PointerEvent::Move { x, bounds }) => {
            let edit = pointer_fraction(x, bounds).map(|fraction| {
                let time = fraction * duration;
                match dragging {
                    DragState::DraggingStart => SelectionEdit::Start(time),
                    _ => SelectionEdit::End(time),
                }
            });
            (dragging, edit)
        }
        // A press while dragging waits for the release.
        (dragging, PointerEvent::Press(_)) => (dragging, None),
    }
}

/// Which handle, if any, a press at `x` (relative to the waveform's left
/// edge) grabs. The nearer handle wins when both are in reach.
pub fn hit_test(x: f32, width: f32, range: &SelectionRange, grab_radius: f32) -> Option<Handle> {
    if width <= 0.0 || !x.is_finite() {
        return None;
    }
    let start_x = range.start_fraction() as f32 * width;
    let end_x = range.end_fraction() as f32 * width;
    let to_start = (x - start_x).abs();
    let to_end = (x - end_x).abs();

    match (to_start <= grab_radius, to_end <= grab_radius) {
        (false, false) => None,
        (true, false) => Some(Handle::Start),
        (false, true) => Some(Handle::End),
        // Handles overlap: prefer the one on the pointer's side.
        (true, true) if to_start < to_end => Some(Handle::Start),
        (true, true) if to_end < to_start => Some(Handle::End),
        (true, true) if x > end_x => Some(Handle::End),
        (true, true) => Some(Handle::Start),
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DragController {
    state: DragState,
}

impl DragController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> DragState {
        self.state
    }

    pub fn is_dragging(&self) -> bool {
        self.state != DragState::Idle
    }

    /// The handle currently held, if any.
    pub fn active_handle(&self) -> Option<Handle> {
        match self.state {
            DragState::Idle => None,
            DragState::DraggingStart => Some(Handle::Start),
            DragState::DraggingEnd => Some(Handle::End),
        }
    }

    /// Feed one event and apply its edit immediately. Returns the edit so
    /// callers can react to it.
    pub fn handle(
        &mut self,
        event: PointerEvent,
        range: &mut SelectionRange,
    ) -> Option<SelectionEdit> {
        let (next, edit) = transition(self.state, event, range.duration());
        self.state = next;
        if let Some(edit) = edit {
            edit.apply(range);
        }
        edit
    }
}

//! Per-source editor state.
//!
//! Everything derived from one audio source (envelope, selection, playback
//! position, drag state) lives in a single [`TrimSession`]. Assigning a new
//! source replaces the session wholesale, and every asynchronous result is
//! tagged with the [`SourceId`] it was produced for, so anything tagged
//! with an older id is dropped.

use std::sync::Arc;

use crate::audio::types::AudioData;
use crate::config::{RenderConfig, TrimConfig};
use crate::drag::{self, DragController, Handle, PointerEvent};
use crate::envelope::{Envelope, Extracted};
use crate::error::TrimError;
use crate::playback::{PlaybackController, PlaybackState, TickOutcome, Transport};
use crate::render::{self, DrawCommand, RenderInput, Viewport};
use crate::selection::SelectionRange;
use crate::source::{AudioSource, SourceId};

/// State owned on behalf of one audio source.
#[derive(Debug)]
pub struct TrimSession {
    source: SourceId,
    envelope: Envelope,
    decoded: bool,
    selection: Option<SelectionRange>,
    playback: PlaybackController,
    drag: DragController,
    error: Option<TrimError>,
}

impl TrimSession {
    fn new(source: SourceId, bucket_count: usize) -> Self {
        Self {
            source,
            envelope: Envelope::silent(bucket_count),
            decoded: false,
            selection: None,
            playback: PlaybackController::new(),
            drag: DragController::new(),
            error: None,
        }
    }

    pub fn source(&self) -> SourceId {
        self.source
    }

    pub fn envelope(&self) -> &Envelope {
        &self.envelope
    }

    /// Whether the envelope has been computed from decoded audio.
    pub fn is_decoded(&self) -> bool {
        self.decoded
    }

    pub fn selection(&self) -> Option<&SelectionRange> {
        self.selection.as_ref()
    }

    pub fn playback(&self) -> PlaybackState {
        self.playback.state()
    }

    pub fn active_handle(&self) -> Option<Handle> {
        self.drag.active_handle()
    }

    pub fn error(&self) -> Option<&TrimError> {
        self.error.as_ref()
    }
}

/// Result of handing an asynchronous result to the editor.
#[derive(Debug, Clone)]
pub enum Delivery {
    /// Decoding succeeded; the media is ready for the playback engine.
    Ready(Arc<AudioData>),
    /// Accepted for the current source.
    Applied,
    /// Accepted, but recorded a failure on the current source.
    Failed,
    /// Produced for a source that has since been replaced. Ignored.
    Stale,
}

/// Owns the current session and the transport that plays it.
#[derive(Debug)]
pub struct TrimEditor<T> {
    transport: T,
    bucket_count: usize,
    render_config: RenderConfig,
    last_issued: SourceId,
    session: Option<TrimSession>,
}

impl<T: Transport> TrimEditor<T> {
    pub fn new(transport: T, config: &TrimConfig) -> Self {
        Self {
            transport,
            bucket_count: config.bucket_count,
            render_config: config.render,
            last_issued: SourceId::new(0),
            session: None,
        }
    }

    pub fn session(&self) -> Option<&TrimSession> {
        self.session.as_ref()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn render_config(&self) -> &RenderConfig {
        &self.render_config
    }

    /// Replace the current source. Playback stops and all derived state is
    /// reset; results still in flight for the old source will be dropped.
    pub fn set_source(&mut self, bytes: impl Into<Arc<[u8]>>) -> AudioSource {
        if let Some(mut old) = self.session.take() {
            old.playback.stop(&mut self.transport);
        }
        self.last_issued = self.last_issued.next();
        let source = AudioSource::new(self.last_issued, bytes);
        tracing::info!(source = %source.id(), bytes = source.bytes().len(), "audio source replaced");
        self.session = Some(TrimSession::new(source.id(), self.bucket_count));
        source
    }

    /// Hand over an extraction result.
    pub fn apply_extraction(&mut self, extracted: Extracted) -> Delivery {
        let Some(session) = current(&mut self.session, extracted.source) else {
            return Delivery::Stale;
        };
        match extracted.result {
            Ok(extraction) => {
                tracing::info!(
                    source = %session.source,
                    buckets = extraction.envelope.len(),
                    "waveform ready"
                );
                session.envelope = extraction.envelope;
                session.decoded = true;
                Delivery::Ready(extraction.media)
            }
            Err(e) => {
                tracing::warn!(source = %session.source, error = %e, "could not decode audio");
                session.error = Some(TrimError::Decode(e));
                Delivery::Failed
            }
        }
    }

    /// The host resolved the source's total duration. Only the first report
    /// per source counts.
    pub fn resolve_duration(&mut self, source: SourceId, duration: f64) -> Delivery {
        let Some(session) = current(&mut self.session, source) else {
            return Delivery::Stale;
        };
        if session.selection.is_some() {
            return Delivery::Applied;
        }
        match SelectionRange::initialize(duration) {
            Some(range) => {
                tracing::info!(%source, duration, "duration resolved");
                session.selection = Some(range);
                session.playback = PlaybackController::new();
                Delivery::Applied
            }
            None => {
                tracing::warn!(%source, duration, "unusable duration");
                session.error = Some(TrimError::MetadataUnavailable);
                Delivery::Failed
            }
        }
    }

    /// The host gave up waiting for the source's duration.
    pub fn metadata_unavailable(&mut self, source: SourceId) -> Delivery {
        let Some(session) = current(&mut self.session, source) else {
            return Delivery::Stale;
        };
        if session.selection.is_some() {
            return Delivery::Applied;
        }
        session.error = Some(TrimError::MetadataUnavailable);
        Delivery::Failed
    }

    pub fn selection(&self) -> Option<SelectionRange> {
        self.session.as_ref().and_then(|s| s.selection)
    }

    pub fn playback(&self) -> PlaybackState {
        self.session
            .as_ref()
            .map(TrimSession::playback)
            .unwrap_or_default()
    }

    pub fn error(&self) -> Option<&TrimError> {
        self.session.as_ref().and_then(TrimSession::error)
    }

    /// Whether the selection may be handed to clip generation.
    pub fn can_generate(&self) -> bool {
        self.session
            .as_ref()
            .is_some_and(|s| s.selection.is_some() && s.error.is_none())
    }

    /// Bounds of the clip to generate, when generation is allowed.
    pub fn clip_bounds(&self) -> Option<(f64, f64)> {
        if !self.can_generate() {
            return None;
        }
        self.selection().map(|range| (range.start(), range.end()))
    }

    /// Which handle a press at `x` (from the waveform's left edge) grabs.
    pub fn handle_at(&self, x: f32, width: f32) -> Option<Handle> {
        let range = self.session.as_ref()?.selection.as_ref()?;
        drag::hit_test(x, width, range, self.render_config.handle_grab_radius)
    }

    pub fn is_dragging(&self) -> bool {
        self.session.as_ref().is_some_and(|s| s.drag.is_dragging())
    }

    /// Feed a pointer event to the drag state machine.
    pub fn pointer(&mut self, event: PointerEvent) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let Some(range) = session.selection.as_mut() else {
            return;
        };
        if session.drag.handle(event, range).is_some() {
            session
                .playback
                .on_selection_changed(range, &mut self.transport);
        }
    }

    /// Move the selection start programmatically.
    pub fn set_start(&mut self, seconds: f64) {
        self.edit_selection(|range| range.set_start(seconds));
    }

    /// Move the selection end programmatically.
    pub fn set_end(&mut self, seconds: f64) {
        self.edit_selection(|range| range.set_end(seconds));
    }

    fn edit_selection(&mut self, edit: impl FnOnce(&mut SelectionRange)) {
        if let Some((session, range)) = playable(&mut self.session) {
            let mut range = range;
            edit(&mut range);
            session.selection = Some(range);
            session
                .playback
                .on_selection_changed(&range, &mut self.transport);
        }
    }

    pub fn play(&mut self) {
        if let Some((session, range)) = playable(&mut self.session) {
            session.playback.play(&range, &mut self.transport);
        }
    }

    pub fn pause(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.playback.pause(&mut self.transport);
        }
    }

    pub fn toggle(&mut self) {
        if let Some((session, range)) = playable(&mut self.session) {
            session.playback.toggle(&range, &mut self.transport);
        }
    }

    pub fn reset(&mut self) {
        if let Some((session, range)) = playable(&mut self.session) {
            session.playback.reset(&range, &mut self.transport);
        }
    }

    /// Position report from the host clock for `source`.
    pub fn on_tick(&mut self, source: SourceId, seconds: f64) -> Option<TickOutcome> {
        let session = current(&mut self.session, source)?;
        let range = session.selection?;
        let outcome = session
            .playback
            .on_tick(seconds, &range, &mut self.transport);
        if outcome == TickOutcome::BoundaryStop {
            tracing::debug!(%source, start = range.start(), "playback stopped at selection end");
        }
        Some(outcome)
    }

    /// The host ran out of media for `source`.
    pub fn on_ended(&mut self, source: SourceId) {
        if let Some(session) = current(&mut self.session, source) {
            session.playback.on_ended();
        }
    }

    pub fn render(&self, viewport: Viewport) -> Vec<DrawCommand> {
        let Some(session) = self.session.as_ref() else {
            return vec![DrawCommand::Clear {
                width: viewport.width,
                height: viewport.height,
            }];
        };
        let input = RenderInput {
            envelope: &session.envelope,
            selection: session.selection.as_ref(),
            playback: session.playback.state(),
            active_handle: session.drag.active_handle(),
        };
        render::render(&input, viewport, &self.render_config)
    }
}

/// The session for `source`, or `None` if it has been superseded.
fn current(session: &mut Option<TrimSession>, source: SourceId) -> Option<&mut TrimSession> {
    match session.as_mut() {
        Some(session) if session.source == source => Some(session),
        _ => {
            tracing::debug!(%source, "dropping result for superseded source");
            None
        }
    }
}

/// The session and its selection, once the duration is known.
fn playable(session: &mut Option<TrimSession>) -> Option<(&mut TrimSession, SelectionRange)> {
    let session = session.as_mut()?;
    let range = session.selection?;
    Some((session, range))
}

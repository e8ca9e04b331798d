use crate::selection::SelectionRange;

/// The host's media clock, driven by [`PlaybackController`].
pub trait Transport {
    fn seek(&mut self, seconds: f64);
    fn resume(&mut self);
    fn pause(&mut self);
}

/// Playback position and whether the clock is running.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PlaybackState {
    pub current_time: f64,
    pub is_playing: bool,
}

/// What a clock tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Advanced,
    /// The tick reached the selection end; playback paused and rewound.
    BoundaryStop,
    /// Report from before the last rewind, still in flight. Ignored.
    Overtaken,
}

/// Keeps playback inside the current selection.
///
/// Playing past the selection end pauses once and rewinds to the start;
/// it never loops. All operations are total.
#[derive(Debug, Clone, Default)]
pub struct PlaybackController {
    state: PlaybackState,
    /// Set by a boundary stop until the host reports a position back
    /// inside the selection.
    rewinding: bool,
}

impl PlaybackController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn current_time(&self) -> f64 {
        self.state.current_time
    }

    pub fn is_playing(&self) -> bool {
        self.state.is_playing
    }

    fn seek(&mut self, seconds: f64, transport: &mut impl Transport) {
        self.state.current_time = seconds;
        transport.seek(seconds);
    }

    /// Start the clock, first rewinding to the selection start if the
    /// position is outside `[start, end)`.
    pub fn play(&mut self, range: &SelectionRange, transport: &mut impl Transport) {
        let t = self.state.current_time;
        if t < range.start() || t >= range.end() {
            self.seek(range.start(), transport);
        }
        transport.resume();
        self.state.is_playing = true;
    }

    pub fn pause(&mut self, transport: &mut impl Transport) {
        transport.pause();
        self.state.is_playing = false;
    }

    /// Pause when playing, otherwise [`play`](Self::play).
    pub fn toggle(&mut self, range: &SelectionRange, transport: &mut impl Transport) {
        if self.state.is_playing {
            self.pause(transport);
        } else {
            self.play(range, transport);
        }
    }

    /// Pause and rewind to the selection start.
    pub fn reset(&mut self, range: &SelectionRange, transport: &mut impl Transport) {
        self.pause(transport);
        self.seek(range.start(), transport);
    }

    /// Stop and rewind to zero. Used when the source goes away.
    pub fn stop(&mut self, transport: &mut impl Transport) {
        transport.pause();
        *self = Self::default();
    }

    /// Record a position report from the host clock.
    pub fn on_tick(
        &mut self,
        seconds: f64,
        range: &SelectionRange,
        transport: &mut impl Transport,
    ) -> TickOutcome {
        if self.rewinding {
            // The host may still report positions past the end that it
            // produced before the rewind reached it.
            if seconds.is_nan() || seconds >= range.end() {
                return TickOutcome::Overtaken;
            }
            self.rewinding = false;
        }
        if seconds.is_finite() {
            self.state.current_time = seconds.clamp(0.0, range.duration());
        }

        if self.state.is_playing && self.state.current_time >= range.end() {
            tracing::debug!(
                position = self.state.current_time,
                end = range.end(),
                "selection end reached, rewinding"
            );
            self.pause(transport);
            self.seek(range.start(), transport);
            self.rewinding = true;
            return TickOutcome::BoundaryStop;
        }
        TickOutcome::Advanced
    }

    /// React to a selection change made elsewhere: a start moved past the
    /// playhead drags the playhead with it.
    pub fn on_selection_changed(&mut self, range: &SelectionRange, transport: &mut impl Transport) {
        if self.state.current_time < range.start() {
            self.seek(range.start(), transport);
        }
    }

    /// The host ran out of media. Ignored while a boundary rewind is in
    /// flight, since that end belongs to the run that was just stopped.
    pub fn on_ended(&mut self) {
        if !self.rewinding {
            self.state.is_playing = false;
        }
    }

    /// Fraction of the source the playhead has reached.
    pub fn fraction(&self, duration: f64) -> f64 {
        if duration > 0.0 {
            self.state.current_time / duration
        } else {
            0.0
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq)]
    pub(crate) enum Call {
        Seek(f64),
        Resume,
        Pause,
    }

    /// Transport that records every call.
    #[derive(Debug, Default)]
    pub(crate) struct RecordingTransport {
        pub(crate) calls: Vec<Call>,
    }

    impl Transport for RecordingTransport {
        fn seek(&mut self, seconds: f64) {
            self.calls.push(Call::Seek(seconds));
        }

        fn resume(&mut self) {
            self.calls.push(Call::Resume);
        }

        fn pause(&mut self) {
            self.calls.push(Call::Pause);
        }
    }

    fn range(start: f64, end: f64, duration: f64) -> SelectionRange {
        let mut range = SelectionRange::initialize(duration).unwrap();
        range.set_end(end);
        range.set_start(start);
        range
    }

    #[test]
    fn play_outside_range_seeks_to_start_then_boundary_stops() {
        let range = range(10.0, 20.0, 60.0);
        let mut transport = RecordingTransport::default();
        let mut playback = PlaybackController::new();
        playback.on_tick(5.0, &range, &mut transport);

        playback.play(&range, &mut transport);
        assert_eq!(playback.current_time(), 10.0);
        assert!(playback.is_playing());
        assert_eq!(transport.calls, vec![Call::Seek(10.0), Call::Resume]);

        assert_eq!(playback.on_tick(15.0, &range, &mut transport), TickOutcome::Advanced);
        assert_eq!(playback.current_time(), 15.0);

        transport.calls.clear();
        assert_eq!(playback.on_tick(20.0, &range, &mut transport), TickOutcome::BoundaryStop);
        assert_eq!(playback.current_time(), 10.0);
        assert!(!playback.is_playing());
        assert_eq!(transport.calls, vec![Call::Pause, Call::Seek(10.0)]);
    }

    #[test]
    fn boundary_stop_fires_once() {
        let range = range(0.0, 2.0, 4.0);
        let mut transport = RecordingTransport::default();
        let mut playback = PlaybackController::new();
        playback.play(&range, &mut transport);

        assert_eq!(playback.on_tick(2.5, &range, &mut transport), TickOutcome::BoundaryStop);
        // A late tick from the host after the pause must not restart anything.
        assert_eq!(playback.on_tick(2.6, &range, &mut transport), TickOutcome::Overtaken);
        assert!(!playback.is_playing());
        assert_eq!(playback.current_time(), 0.0);
    }

    #[test]
    fn replay_before_late_reports_drain_keeps_playing() {
        let range = range(10.0, 20.0, 60.0);
        let mut transport = RecordingTransport::default();
        let mut playback = PlaybackController::new();
        playback.play(&range, &mut transport);
        assert_eq!(playback.on_tick(20.1, &range, &mut transport), TickOutcome::BoundaryStop);

        // Play again before the host's pause echo at the old end arrives.
        playback.play(&range, &mut transport);
        transport.calls.clear();
        assert_eq!(playback.on_tick(20.2, &range, &mut transport), TickOutcome::Overtaken);
        playback.on_ended();

        assert!(playback.is_playing());
        assert_eq!(playback.current_time(), 10.0);
        assert!(transport.calls.is_empty());

        assert_eq!(playback.on_tick(10.5, &range, &mut transport), TickOutcome::Advanced);
        assert_eq!(playback.current_time(), 10.5);
        assert_eq!(playback.on_tick(20.0, &range, &mut transport), TickOutcome::BoundaryStop);
    }

    #[test]
    fn play_inside_range_keeps_position() {
        let range = range(10.0, 20.0, 60.0);
        let mut transport = RecordingTransport::default();
        let mut playback = PlaybackController::new();
        playback.on_tick(12.0, &range, &mut transport);

        playback.play(&range, &mut transport);

        assert_eq!(playback.current_time(), 12.0);
        assert_eq!(transport.calls, vec![Call::Resume]);
    }

    #[test]
    fn play_at_end_restarts_from_start() {
        let range = range(10.0, 20.0, 60.0);
        let mut transport = RecordingTransport::default();
        let mut playback = PlaybackController::new();
        playback.on_tick(20.0, &range, &mut transport);

        playback.play(&range, &mut transport);

        assert_eq!(playback.current_time(), 10.0);
    }

    #[test]
    fn reset_pauses_and_rewinds() {
        let range = range(3.0, 9.0, 10.0);
        let mut transport = RecordingTransport::default();
        let mut playback = PlaybackController::new();
        playback.play(&range, &mut transport);
        playback.on_tick(6.0, &range, &mut transport);

        playback.reset(&range, &mut transport);

        assert!(!playback.is_playing());
        assert_eq!(playback.current_time(), 3.0);
    }

    #[test]
    fn toggle_alternates() {
        let range = range(0.0, 5.0, 5.0);
        let mut transport = RecordingTransport::default();
        let mut playback = PlaybackController::new();

        playback.toggle(&range, &mut transport);
        assert!(playback.is_playing());
        playback.toggle(&range, &mut transport);
        assert!(!playback.is_playing());
    }

    #[test]
    fn raising_start_past_playhead_moves_playhead_while_paused() {
        let mut range = range(0.0, 30.0, 30.0);
        let mut transport = RecordingTransport::default();
        let mut playback = PlaybackController::new();
        playback.on_tick(4.0, &range, &mut transport);

        range.set_start(8.0);
        playback.on_selection_changed(&range, &mut transport);

        assert_eq!(playback.current_time(), 8.0);
        assert!(!playback.is_playing());
        assert_eq!(transport.calls, vec![Call::Seek(8.0)]);

        range.set_start(2.0);
        playback.on_selection_changed(&range, &mut transport);
        assert_eq!(playback.current_time(), 8.0);
    }

    #[test]
    fn ticks_are_clamped_to_duration() {
        let range = range(0.0, 10.0, 10.0);
        let mut transport = RecordingTransport::default();
        let mut playback = PlaybackController::new();

        playback.on_tick(-1.0, &range, &mut transport);
        assert_eq!(playback.current_time(), 0.0);
        playback.on_tick(99.0, &range, &mut transport);
        assert_eq!(playback.current_time(), 10.0);
        playback.on_tick(f64::NAN, &range, &mut transport);
        assert_eq!(playback.current_time(), 10.0);
    }

    #[test]
    fn ended_clears_playing() {
        let range = range(0.0, 10.0, 10.0);
        let mut transport = RecordingTransport::default();
        let mut playback = PlaybackController::new();
        playback.play(&range, &mut transport);

        playback.on_ended();

        assert!(!playback.is_playing());
    }
}

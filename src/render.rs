//! Waveform drawing as a pure function.
//!
//! [`render`] turns the editor state into a list of [`DrawCommand`]s in
//! logical pixels. It keeps no state between calls, so hosts can call it
//! after every change and on every resize and paint the result directly.

use crate::config::RenderConfig;
use crate::drag::Handle;
use crate::envelope::Envelope;
use crate::playback::PlaybackState;
use crate::selection::SelectionRange;

/// A colour in HSL space, as the palette is written.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hsl {
    /// Hue in degrees.
    pub h: f32,
    /// Saturation in `[0, 1]`.
    pub s: f32,
    /// Lightness in `[0, 1]`.
    pub l: f32,
}

impl Hsl {
    pub const fn new(h: f32, s: f32, l: f32) -> Self {
        Self { h, s, l }
    }

    /// Convert to linear `[r, g, b]` components in `[0, 1]`.
    pub fn to_rgb(self) -> [f32; 3] {
        let s = self.s.clamp(0.0, 1.0);
        let l = self.l.clamp(0.0, 1.0);
        let chroma = (1.0 - (2.0 * l - 1.0).abs()) * s;
        let h = self.h.rem_euclid(360.0) / 60.0;
        let x = chroma * (1.0 - (h % 2.0 - 1.0).abs());
        let (r, g, b) = match h as u32 {
            0 => (chroma, x, 0.0),
            1 => (x, chroma, 0.0),
            2 => (0.0, chroma, x),
            3 => (0.0, x, chroma),
            4 => (x, 0.0, chroma),
            _ => (chroma, 0.0, x),
        };
        let m = l - chroma / 2.0;
        [r + m, g + m, b + m]
    }
}

pub mod palette {
    use super::Hsl;

    pub const PRIMARY: Hsl = Hsl::new(175.0, 0.8, 0.45);
    pub const ACCENT: Hsl = Hsl::new(280.0, 0.7, 0.55);
    pub const FOREGROUND: Hsl = Hsl::new(0.0, 0.0, 0.98);
    pub const BACKGROUND: Hsl = Hsl::new(220.0, 0.2, 0.08);

    pub const IN_RANGE: (Hsl, Hsl) = (PRIMARY, ACCENT);
    pub const PLAYED: (Hsl, Hsl) = (Hsl::new(175.0, 0.8, 0.55), Hsl::new(280.0, 0.7, 0.65));
    pub const MUTED: (Hsl, Hsl) = (Hsl::new(220.0, 0.15, 0.22), Hsl::new(220.0, 0.15, 0.18));

    pub const OVERLAY_ALPHA: f32 = 0.05;
    pub const PLAYHEAD_ALPHA: f32 = 0.8;
}

/// How a bar is coloured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BarTone {
    /// Outside the selection.
    Muted,
    InRange,
    /// Inside the selection and already passed by the playhead.
    Played,
}

impl BarTone {
    /// Top and bottom stops of the bar's vertical gradient.
    pub fn gradient(self) -> (Hsl, Hsl) {
        match self {
            Self::Muted => palette::MUTED,
            Self::InRange => palette::IN_RANGE,
            Self::Played => palette::PLAYED,
        }
    }
}

/// Size of the drawing surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
    /// Physical pixels per logical pixel.
    pub scale_factor: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            scale_factor: 1.0,
        }
    }

    pub fn with_scale_factor(mut self, scale_factor: f32) -> Self {
        self.scale_factor = scale_factor;
        self
    }

    /// Backing-store size a host should allocate to stay sharp on
    /// high-density displays.
    pub fn physical_size(&self) -> (u32, u32) {
        let scale = if self.scale_factor > 0.0 {
            self.scale_factor
        } else {
            1.0
        };
        (
            (self.width * scale).round().max(0.0) as u32,
            (self.height * scale).round().max(0.0) as u32,
        )
    }

    fn is_drawable(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

/// One envelope bucket.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bar {
    pub index: usize,
    /// Left edge of the bucket's slot, `index * width / N`.
    pub x: f32,
    pub slot_width: f32,
    /// Space left empty inside the slot, split evenly on both sides.
    pub gap: f32,
    pub y: f32,
    pub height: f32,
    pub radius: f32,
    pub tone: BarTone,
}

impl Bar {
    /// Left edge and width of the filled body.
    pub fn body(&self) -> (f32, f32) {
        (self.x + self.gap / 2.0, (self.slot_width - self.gap).max(0.0))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DrawCommand {
    Clear { width: f32, height: f32 },
    Bar(Bar),
    /// Translucent band behind the selected range.
    SelectionOverlay { x: f32, width: f32, height: f32 },
    Handle {
        handle: Handle,
        x: f32,
        height: f32,
        active: bool,
    },
    Playhead { x: f32, height: f32 },
}

impl DrawCommand {
    /// Whether the command belongs to the background layer (clear and
    /// bars), which only changes when a bar's geometry or tone does.
    pub fn is_background(&self) -> bool {
        matches!(self, DrawCommand::Clear { .. } | DrawCommand::Bar(_))
    }
}

/// Everything the waveform depends on.
#[derive(Debug, Clone, Copy)]
pub struct RenderInput<'a> {
    pub envelope: &'a Envelope,
    /// `None` until the duration is known.
    pub selection: Option<&'a SelectionRange>,
    pub playback: PlaybackState,
    /// Handle being dragged, drawn highlighted.
    pub active_handle: Option<Handle>,
}

pub fn render(input: &RenderInput<'_>, viewport: Viewport, config: &RenderConfig) -> Vec<DrawCommand> {
    let Viewport { width, height, .. } = viewport;
    let mut commands = vec![DrawCommand::Clear { width, height }];

    let Some(range) = input.selection else {
        return commands;
    };
    if !viewport.is_drawable() {
        return commands;
    }

    let duration = range.duration();
    let start_fraction = range.start_fraction();
    let end_fraction = range.end_fraction();
    let played_fraction = input.playback.current_time / duration;
    let playing = input.playback.is_playing;

    let buckets = input.envelope.buckets();
    let n = buckets.len();
    if n > 0 {
        let slot_width = width / n as f32;
        let gap = config.bar_gap.clamp(0.0, slot_width / 2.0);
        commands.reserve(n + 4);

        for (index, &value) in buckets.iter().enumerate() {
            let progress = index as f64 / n as f64;
            let in_range = progress >= start_fraction && progress <= end_fraction;
            let tone = match (in_range, playing && progress <= played_fraction) {
                (false, _) => BarTone::Muted,
                (true, true) => BarTone::Played,
                (true, false) => BarTone::InRange,
            };
            let bar_height = value * height * config.bar_height_ratio;
            commands.push(DrawCommand::Bar(Bar {
                index,
                x: index as f32 * slot_width,
                slot_width,
                gap,
                y: (height - bar_height) / 2.0,
                height: bar_height,
                radius: config.bar_radius,
                tone,
            }));
        }
    }

    let start_x = (start_fraction * f64::from(width)) as f32;
    let end_x = (end_fraction * f64::from(width)) as f32;
    commands.push(DrawCommand::SelectionOverlay {
        x: start_x,
        width: end_x - start_x,
        height,
    });
    for (handle, x) in [(Handle::Start, start_x), (Handle::End, end_x)] {
        commands.push(DrawCommand::Handle {
            handle,
            x,
            height,
            active: input.active_handle == Some(handle),
        });
    }

    if playing && range.contains(input.playback.current_time) {
        commands.push(DrawCommand::Playhead {
            x: (played_fraction * f64::from(width)) as f32,
            height,
        });
    }

    commands
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bars(commands: &[DrawCommand]) -> Vec<Bar> {
        commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Bar(bar) => Some(*bar),
                _ => None,
            })
            .collect()
    }

    fn playhead(commands: &[DrawCommand]) -> Option<f32> {
        commands.iter().find_map(|c| match c {
            DrawCommand::Playhead { x, .. } => Some(*x),
            _ => None,
        })
    }

    fn ramp(n: usize) -> Envelope {
        let samples: Vec<f32> = (0..n * 10).map(|i| (i / 10 + 1) as f32).collect();
        Envelope::from_samples(samples, n)
    }

    fn selection(start: f64, end: f64, duration: f64) -> SelectionRange {
        let mut range = SelectionRange::initialize(duration).unwrap();
        range.set_end(end);
        range.set_start(start);
        range
    }

    #[test]
    fn hsl_converts_to_rgb() {
        assert_eq!(Hsl::new(0.0, 1.0, 0.5).to_rgb(), [1.0, 0.0, 0.0]);
        assert_eq!(Hsl::new(120.0, 1.0, 0.5).to_rgb(), [0.0, 1.0, 0.0]);
        assert_eq!(Hsl::new(0.0, 0.0, 1.0).to_rgb(), [1.0, 1.0, 1.0]);
        let [r, g, b] = Hsl::new(240.0, 1.0, 0.25).to_rgb();
        assert_eq!((r, g), (0.0, 0.0));
        assert!((b - 0.5).abs() < 1e-6);
    }

    #[test]
    fn bar_geometry_follows_envelope() {
        let envelope = Envelope::from_samples(vec![1.0; 100], 4);
        let range = selection(0.0, 8.0, 8.0);
        let input = RenderInput {
            envelope: &envelope,
            selection: Some(&range),
            playback: PlaybackState::default(),
            active_handle: None,
        };

        let commands = render(&input, Viewport::new(400.0, 100.0), &RenderConfig::default());
        let bars = bars(&commands);

        assert_eq!(bars.len(), 4);
        for (i, bar) in bars.iter().enumerate() {
            assert_eq!(bar.x, i as f32 * 100.0);
            assert_eq!(bar.height, 85.0);
            assert_eq!(bar.y, 7.5);
            assert_eq!(bar.body(), (bar.x + 1.0, 98.0));
        }
        assert!(matches!(commands[0], DrawCommand::Clear { .. }));
    }

    #[test]
    fn resize_scales_bar_positions() {
        let envelope = ramp(120);
        let range = selection(0.0, 60.0, 60.0);
        let input = RenderInput {
            envelope: &envelope,
            selection: Some(&range),
            playback: PlaybackState::default(),
            active_handle: None,
        };
        let config = RenderConfig::default();

        let narrow = bars(&render(&input, Viewport::new(600.0, 80.0), &config));
        let wide = bars(&render(&input, Viewport::new(1_500.0, 80.0), &config));

        assert_eq!(narrow.len(), 120);
        assert_eq!(wide.len(), 120);
        for (a, b) in narrow.iter().zip(&wide) {
            assert!((b.x - a.x * 2.5).abs() < 1e-3, "{} vs {}", a.x, b.x);
        }
        for (bars, width) in [(&narrow, 600.0f32), (&wide, 1_500.0)] {
            let slot = width / 120.0;
            let last = bars.last().unwrap();
            let occupied = last.x + last.slot_width;
            assert!((width - occupied).abs() <= slot, "{occupied} of {width}");
        }
    }

    #[test]
    fn tones_follow_selection_and_playhead() {
        let envelope = ramp(10);
        let range = selection(2.0, 8.0, 10.0);
        let playback = PlaybackState {
            current_time: 5.0,
            is_playing: true,
        };
        let input = RenderInput {
            envelope: &envelope,
            selection: Some(&range),
            playback,
            active_handle: None,
        };

        let tones: Vec<BarTone> = bars(&render(&input, Viewport::new(100.0, 50.0), &RenderConfig::default()))
            .iter()
            .map(|b| b.tone)
            .collect();

        use BarTone::*;
        assert_eq!(
            tones,
            vec![Muted, Muted, Played, Played, Played, Played, InRange, InRange, InRange, Muted]
        );
    }

    #[test]
    fn background_only_changes_when_playhead_crosses_a_bucket() {
        let envelope = ramp(10);
        let range = selection(0.0, 10.0, 10.0);
        let config = RenderConfig::default();
        let background_at = |t: f64| -> Vec<DrawCommand> {
            let input = RenderInput {
                envelope: &envelope,
                selection: Some(&range),
                playback: PlaybackState {
                    current_time: t,
                    is_playing: true,
                },
                active_handle: None,
            };
            render(&input, Viewport::new(100.0, 50.0), &config)
                .into_iter()
                .filter(DrawCommand::is_background)
                .collect()
        };

        assert_eq!(background_at(3.1), background_at(3.9));
        assert_ne!(background_at(3.9), background_at(4.0));
        assert_eq!(background_at(3.1).len(), 11);
    }

    #[test]
    fn paused_playback_has_no_played_bars_or_playhead() {
        let envelope = ramp(10);
        let range = selection(0.0, 10.0, 10.0);
        let input = RenderInput {
            envelope: &envelope,
            selection: Some(&range),
            playback: PlaybackState {
                current_time: 5.0,
                is_playing: false,
            },
            active_handle: None,
        };

        let commands = render(&input, Viewport::new(100.0, 50.0), &RenderConfig::default());

        assert!(bars(&commands).iter().all(|b| b.tone == BarTone::InRange));
        assert_eq!(playhead(&commands), None);
    }

    #[test]
    fn playhead_only_inside_selection() {
        let envelope = ramp(10);
        let range = selection(2.0, 8.0, 10.0);
        let config = RenderConfig::default();
        let viewport = Viewport::new(200.0, 50.0);
        let at = |t: f64| {
            let input = RenderInput {
                envelope: &envelope,
                selection: Some(&range),
                playback: PlaybackState {
                    current_time: t,
                    is_playing: true,
                },
                active_handle: None,
            };
            playhead(&render(&input, viewport, &config))
        };

        assert_eq!(at(5.0), Some(100.0));
        assert_eq!(at(8.0), Some(160.0));
        assert_eq!(at(1.0), None);
        assert_eq!(at(9.0), None);
    }

    #[test]
    fn handles_and_overlay_mark_selection() {
        let envelope = ramp(10);
        let range = selection(2.5, 7.5, 10.0);
        let input = RenderInput {
            envelope: &envelope,
            selection: Some(&range),
            playback: PlaybackState::default(),
            active_handle: Some(Handle::End),
        };

        let commands = render(&input, Viewport::new(400.0, 50.0), &RenderConfig::default());

        assert!(commands.contains(&DrawCommand::SelectionOverlay {
            x: 100.0,
            width: 200.0,
            height: 50.0
        }));
        assert!(commands.contains(&DrawCommand::Handle {
            handle: Handle::Start,
            x: 100.0,
            height: 50.0,
            active: false
        }));
        assert!(commands.contains(&DrawCommand::Handle {
            handle: Handle::End,
            x: 300.0,
            height: 50.0,
            active: true
        }));
    }

    #[test]
    fn nothing_but_clear_without_duration_or_area() {
        let envelope = ramp(10);
        let range = selection(0.0, 10.0, 10.0);
        let config = RenderConfig::default();

        let no_duration = RenderInput {
            envelope: &envelope,
            selection: None,
            playback: PlaybackState::default(),
            active_handle: None,
        };
        assert_eq!(render(&no_duration, Viewport::new(100.0, 50.0), &config).len(), 1);

        let zero_area = RenderInput {
            selection: Some(&range),
            ..no_duration
        };
        assert_eq!(render(&zero_area, Viewport::new(0.0, 50.0), &config).len(), 1);
    }

    #[test]
    fn physical_size_accounts_for_scale_factor() {
        let viewport = Viewport::new(640.0, 128.0).with_scale_factor(2.0);
        assert_eq!(viewport.physical_size(), (1280, 256));
    }
}

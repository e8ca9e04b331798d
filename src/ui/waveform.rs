use std::cell::RefCell;

use iced::mouse;
use iced::widget::canvas::{self, Action, Cache, Event, Frame, Geometry, Path, Stroke};
use iced::{Color, Point, Rectangle, Renderer, Size, Theme};

use crate::drag::{Bounds, Handle, PointerEvent};
use crate::playback::Transport;
use crate::render::{palette, Bar, DrawCommand, Hsl, Viewport};
use crate::session::TrimEditor;

const GRIP_WIDTH: f32 = 16.0;
const GRIP_HEIGHT: f32 = 40.0;

/// Interactions on the waveform.
#[derive(Debug, Clone)]
pub enum WaveformMessage {
    Pointer(PointerEvent),
}

/// Bars are cached between frames; handles and the playhead are redrawn
/// every time.
#[derive(Default)]
pub struct WaveformLayers {
    background: Cache,
    /// Background commands the cache currently holds.
    drawn: RefCell<Vec<DrawCommand>>,
}

/// Canvas program painting the editor's drawing commands.
pub struct WaveformCanvas<'a, T> {
    editor: &'a TrimEditor<T>,
}

impl<'a, T> WaveformCanvas<'a, T> {
    pub fn new(editor: &'a TrimEditor<T>) -> Self {
        Self { editor }
    }
}

fn color(hsl: Hsl, alpha: f32) -> Color {
    let [r, g, b] = hsl.to_rgb();
    Color::from_rgba(r, g, b, alpha)
}

fn handle_color(handle: Handle) -> Hsl {
    match handle {
        Handle::Start => palette::PRIMARY,
        Handle::End => palette::ACCENT,
    }
}

fn paint_bar(frame: &mut Frame, bar: &Bar) {
    let (x, width) = bar.body();
    if width <= 0.0 || bar.height <= 0.0 {
        return;
    }
    let (top, bottom) = bar.tone.gradient();
    let path = Path::rounded_rectangle(
        Point::new(x, bar.y),
        Size::new(width, bar.height),
        bar.radius.into(),
    );
    let gradient = canvas::gradient::Linear::new(
        Point::new(x, bar.y),
        Point::new(x, bar.y + bar.height),
    )
    .add_stop(0.0, color(top, 1.0))
    .add_stop(1.0, color(bottom, 1.0));
    frame.fill(&path, canvas::Gradient::Linear(gradient));
}

fn paint_handle(frame: &mut Frame, handle: Handle, x: f32, height: f32, active: bool) {
    let hue = handle_color(handle);
    let line_alpha = if active { 1.0 } else { 0.7 };

    let line = Path::line(Point::new(x, 0.0), Point::new(x, height));
    frame.stroke(
        &line,
        Stroke::default()
            .with_color(color(hue, line_alpha))
            .with_width(if active { 4.0 } else { 3.0 }),
    );

    let grip = Path::rounded_rectangle(
        Point::new(x - GRIP_WIDTH / 2.0, (height - GRIP_HEIGHT) / 2.0),
        Size::new(GRIP_WIDTH, GRIP_HEIGHT),
        6.0_f32.into(),
    );
    let fill = if active {
        color(hue, 1.0)
    } else {
        color(palette::BACKGROUND, 1.0)
    };
    frame.fill(&grip, fill);
    frame.stroke(
        &grip,
        Stroke::default()
            .with_color(color(hue, line_alpha))
            .with_width(2.0),
    );
}

fn paint(frame: &mut Frame, command: &DrawCommand) {
    match *command {
        DrawCommand::Clear { width, height } => {
            frame.fill_rectangle(
                Point::ORIGIN,
                Size::new(width, height),
                color(palette::BACKGROUND, 1.0),
            );
        }
        DrawCommand::Bar(ref bar) => paint_bar(frame, bar),
        DrawCommand::SelectionOverlay { x, width, height } => {
            frame.fill_rectangle(
                Point::new(x, 0.0),
                Size::new(width, height),
                color(palette::PRIMARY, palette::OVERLAY_ALPHA),
            );
        }
        DrawCommand::Handle {
            handle,
            x,
            height,
            active,
        } => paint_handle(frame, handle, x, height, active),
        DrawCommand::Playhead { x, height } => {
            let playhead = Path::line(Point::new(x, 0.0), Point::new(x, height));
            frame.stroke(
                &playhead,
                Stroke::default()
                    .with_color(color(palette::FOREGROUND, palette::PLAYHEAD_ALPHA))
                    .with_width(2.0),
            );
        }
    }
}

impl<T: Transport> canvas::Program<WaveformMessage> for WaveformCanvas<'_, T> {
    type State = WaveformLayers;

    fn draw(
        &self,
        layers: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<Geometry> {
        // Bounds are measured fresh on every draw, so resizes re-layout the bars.
        let (background, overlay): (Vec<_>, Vec<_>) = self
            .editor
            .render(Viewport::new(bounds.width, bounds.height))
            .into_iter()
            .partition(DrawCommand::is_background);

        if *layers.drawn.borrow() != background {
            layers.background.clear();
            *layers.drawn.borrow_mut() = background;
        }

        let drawn = layers.drawn.borrow();
        let waveform = layers.background.draw(renderer, bounds.size(), |frame| {
            for command in drawn.iter() {
                paint(frame, command);
            }
        });

        let mut frame = Frame::new(renderer, bounds.size());
        for command in &overlay {
            paint(&mut frame, command);
        }
        vec![waveform, frame.into_geometry()]
    }

    fn update(
        &self,
        _layers: &mut Self::State,
        event: &Event,
        bounds: Rectangle,
        cursor: mouse::Cursor,
    ) -> Option<Action<WaveformMessage>> {
        let pointer = match event {
            Event::Mouse(mouse::Event::ButtonPressed(mouse::Button::Left)) => {
                let position = cursor.position_in(bounds)?;
                let handle = self.editor.handle_at(position.x, bounds.width)?;
                PointerEvent::Press(handle)
            }
            Event::Mouse(mouse::Event::CursorMoved { position }) if self.editor.is_dragging() => {
                PointerEvent::Move {
                    x: position.x,
                    bounds: Bounds {
                        x: bounds.x,
                        width: bounds.width,
                    },
                }
            }
            // Released anywhere, inside the canvas or not.
            Event::Mouse(mouse::Event::ButtonReleased(mouse::Button::Left))
                if self.editor.is_dragging() =>
            {
                PointerEvent::Release
            }
            _ => return None,
        };
        Some(Action::publish(WaveformMessage::Pointer(pointer)).and_capture())
    }

    fn mouse_interaction(
        &self,
        _layers: &Self::State,
        bounds: Rectangle,
        cursor: mouse::Cursor,
    ) -> mouse::Interaction {
        let over_handle = cursor
            .position_in(bounds)
            .is_some_and(|p| self.editor.handle_at(p.x, bounds.width).is_some());
        if self.editor.is_dragging() || over_handle {
            mouse::Interaction::ResizingHorizontally
        } else {
            mouse::Interaction::default()
        }
    }
}

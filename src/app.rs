use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender};
use iced::keyboard;
use iced::widget::{canvas, center, column, container, text};
use iced::{Element, Length, Subscription, Task, Theme};

use crate::audio::decoder::SymphoniaDecoder;
use crate::audio::engine::{self, EngineTransport};
use crate::audio::types::{AudioCommand, AudioData, AudioEvent};
use crate::config::TrimConfig;
use crate::envelope::{EnvelopeExtractor, Extracted};
use crate::error::Result;
use crate::session::{Delivery, TrimEditor};
use crate::source::SourceId;
use crate::ui::controls::{self, ControlMessage};
use crate::ui::waveform::{WaveformCanvas, WaveformMessage};

const WAVEFORM_HEIGHT: f32 = 160.0;

/// What the host hands over at startup.
#[derive(Debug, Clone)]
pub struct Launch {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

pub struct App {
    config: TrimConfig,
    editor: TrimEditor<EngineTransport>,
    extractor: EnvelopeExtractor,
    event_rx: Option<Receiver<AudioEvent>>,
    /// Decoded media waiting for the engine to come up.
    media: Option<(SourceId, Arc<AudioData>)>,
    filename: Option<String>,
    status: Option<String>,
}

#[derive(Debug, Clone)]
pub enum Message {
    EngineReady(std::result::Result<(Sender<AudioCommand>, Receiver<AudioEvent>), String>),
    Extracted(Extracted),
    Control(ControlMessage),
    Waveform(WaveformMessage),
    Tick,
    KeyEvent(keyboard::Event),
}

fn boot(config: TrimConfig, launch: Launch) -> (App, Task<Message>) {
    let extractor = EnvelopeExtractor::new(Arc::new(SymphoniaDecoder), config.bucket_count);
    let mut app = App {
        editor: TrimEditor::new(EngineTransport::default(), &config),
        extractor,
        event_rx: None,
        media: None,
        filename: None,
        status: None,
        config,
    };

    let engine = Task::perform(
        async {
            match tokio::task::spawn_blocking(engine::spawn_engine).await {
                Ok(result) => result.map_err(|e| e.to_string()),
                Err(e) => Err(e.to_string()),
            }
        },
        Message::EngineReady,
    );

    let load = open(&mut app, launch);
    (app, Task::batch([engine, load]))
}

/// Replace the current source and start decoding it.
fn open(app: &mut App, launch: Launch) -> Task<Message> {
    if let Some(rx) = &app.event_rx {
        // Position reports still queued belong to the old source.
        rx.try_iter().for_each(drop);
    }
    app.editor.transport().send(AudioCommand::Unload);
    app.media = None;
    app.status = None;
    app.filename = Some(launch.file_name);

    let source = app.editor.set_source(launch.bytes);
    Task::perform(app.extractor.clone().extract(source), Message::Extracted)
}

fn title(app: &App) -> String {
    match &app.filename {
        Some(name) => format!("Trimwave - {name}"),
        None => "Trimwave".to_string(),
    }
}

fn load_media(app: &mut App) {
    if !app.editor.transport().is_connected() {
        return;
    }
    if let Some((source, media)) = app.media.take() {
        app.editor
            .transport()
            .send(AudioCommand::LoadAudio(source, media));
    }
}

fn update(app: &mut App, message: Message) -> Task<Message> {
    match message {
        Message::EngineReady(result) => {
            match result {
                Ok((tx, rx)) => {
                    *app.editor.transport_mut() = EngineTransport::new(tx);
                    app.event_rx = Some(rx);
                    load_media(app);
                }
                Err(e) => {
                    tracing::error!(error = %e, "audio engine unavailable");
                    app.status = Some(format!("Audio engine error: {e}"));
                }
            }
            Task::none()
        }
        Message::Extracted(extracted) => {
            let source = extracted.source;
            match app.editor.apply_extraction(extracted) {
                Delivery::Ready(media) => {
                    // The decoded stream is the host's metadata for duration.
                    let duration = media.duration;
                    app.media = Some((source, media));
                    load_media(app);
                    app.editor.resolve_duration(source, duration);
                }
                Delivery::Applied | Delivery::Failed | Delivery::Stale => {}
            }
            if let Some(err) = app.editor.error() {
                app.status = Some(err.to_string());
            }
            Task::none()
        }
        Message::Control(ctrl) => {
            match ctrl {
                ControlMessage::TogglePlay => app.editor.toggle(),
                ControlMessage::Reset => app.editor.reset(),
                ControlMessage::Generate => {
                    if let Some((start, end)) = app.editor.clip_bounds() {
                        tracing::info!(start, end, "clip submitted for generation");
                        app.status = Some(format!(
                            "Clip {} - {} submitted",
                            controls::format_time(start),
                            controls::format_time(end)
                        ));
                    }
                }
            }
            Task::none()
        }
        Message::Waveform(WaveformMessage::Pointer(event)) => {
            app.editor.pointer(event);
            Task::none()
        }
        Message::Tick => {
            let events: Vec<AudioEvent> = match &app.event_rx {
                Some(rx) => rx.try_iter().collect(),
                None => Vec::new(),
            };
            for event in events {
                match event {
                    AudioEvent::PositionChanged(source, pos) => {
                        app.editor.on_tick(source, pos);
                    }
                    AudioEvent::PlaybackFinished(source) => app.editor.on_ended(source),
                    AudioEvent::Error(e) => {
                        tracing::error!(error = %e, "audio stream error");
                        app.status = Some(format!("Audio stream error: {e}"));
                    }
                }
            }
            Task::none()
        }
        Message::KeyEvent(keyboard::Event::KeyPressed { key, .. }) => match key.as_ref() {
            keyboard::Key::Named(keyboard::key::Named::Space) => {
                update(app, Message::Control(ControlMessage::TogglePlay))
            }
            keyboard::Key::Named(keyboard::key::Named::Home) => {
                update(app, Message::Control(ControlMessage::Reset))
            }
            _ => Task::none(),
        },
        Message::KeyEvent(_) => Task::none(),
    }
}

fn view(app: &App) -> Element<'_, Message> {
    let selection = app.editor.selection();
    let controls = controls::view_controls(
        app.editor.playback(),
        selection.map(|range| range.duration()),
        app.editor.can_generate(),
    )
    .map(Message::Control);

    let waveform: Element<Message> = if selection.is_some() {
        let canvas_el: Element<WaveformMessage> =
            canvas::Canvas::new(WaveformCanvas::new(&app.editor))
                .width(Length::Fill)
                .height(Length::Fixed(WAVEFORM_HEIGHT))
                .into();
        column![
            canvas_el.map(Message::Waveform),
            controls::view_range(selection.as_ref()).map(Message::Control),
        ]
        .spacing(6)
        .into()
    } else {
        let hint = if app.editor.error().is_some() {
            "This file could not be read"
        } else {
            "Decoding audio..."
        };
        center(text(hint).size(18))
            .width(Length::Fill)
            .height(Length::Fixed(WAVEFORM_HEIGHT))
            .into()
    };

    let mut content = column![waveform, controls].spacing(5);

    if let Some(status) = &app.status {
        content = content.push(container(text(status.clone()).size(14)).padding(10));
    }

    container(content)
        .padding(10)
        .width(Length::Fill)
        .height(Length::Fill)
        .into()
}

fn subscription(app: &App) -> Subscription<Message> {
    let tick = iced::time::every(std::time::Duration::from_millis(app.config.tick_interval_ms))
        .map(|_| Message::Tick);

    let keys = keyboard::listen().map(Message::KeyEvent);

    Subscription::batch([tick, keys])
}

fn theme(_app: &App) -> Theme {
    Theme::Dark
}

pub fn run(config: TrimConfig, launch: Launch) -> Result<()> {
    let window_size = (config.window_width, config.window_height);
    iced::application(
        move || boot(config.clone(), launch.clone()),
        update,
        view,
    )
    .title(title)
    .subscription(subscription)
    .theme(theme)
    .window_size(window_size)
    .run()?;
    Ok(())
}

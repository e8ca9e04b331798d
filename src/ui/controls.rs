use iced::widget::{button, container, text, Column, Row};
use iced::{Alignment, Element, Length};

use crate::playback::PlaybackState;
use crate::selection::SelectionRange;

#[derive(Debug, Clone)]
pub enum ControlMessage {
    TogglePlay,
    Reset,
    Generate,
}

/// Format seconds as M:SS.
pub fn format_time(seconds: f64) -> String {
    let total_secs = if seconds.is_finite() && seconds > 0.0 {
        seconds as u64
    } else {
        0
    };
    let mins = total_secs / 60;
    let secs = total_secs % 60;
    format!("{mins}:{secs:02}")
}

/// Start, clip length and end of the selection, shown under the waveform.
pub fn view_range<'a>(selection: Option<&SelectionRange>) -> Element<'a, ControlMessage> {
    let Some(range) = selection else {
        return Row::new().into();
    };

    Row::new()
        .push(text(format_time(range.start())).size(14))
        .push(
            container(text(format!("Duration: {}", format_time(range.length()))).size(14))
                .center_x(Length::Fill),
        )
        .push(text(format_time(range.end())).size(14))
        .align_y(Alignment::Center)
        .padding([0, 10])
        .into()
}

/// Build the transport controls view.
pub fn view_controls<'a>(
    playback: PlaybackState,
    duration: Option<f64>,
    can_generate: bool,
) -> Element<'a, ControlMessage> {
    let play_label = if playback.is_playing { "Pause" } else { "Play" };
    let ready = duration.is_some();

    let reset_btn = button(text("Reset")).on_press_maybe(ready.then_some(ControlMessage::Reset));
    let play_btn =
        button(text(play_label)).on_press_maybe(ready.then_some(ControlMessage::TogglePlay));
    let generate_btn = button(text("Generate Video"))
        .on_press_maybe(can_generate.then_some(ControlMessage::Generate));

    let time_display = text(format!(
        "{} / {}",
        format_time(playback.current_time),
        format_time(duration.unwrap_or(0.0))
    ))
    .size(16);

    let controls_row = Row::new()
        .spacing(10)
        .align_y(Alignment::Center)
        .push(reset_btn)
        .push(play_btn)
        .push(time_display)
        .push(container(generate_btn).align_right(Length::Fill));

    container(Column::new().push(controls_row))
        .padding(10)
        .into()
}

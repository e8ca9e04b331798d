use std::sync::Arc;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::{Receiver, Sender};

use super::types::{AudioCommand, AudioData, AudioEvent};
use crate::error::{Result, TrimError};
use crate::playback::Transport;
use crate::source::SourceId;

/// How often (in output frames) to send position updates.
const POSITION_UPDATE_INTERVAL: usize = 1024;

struct EngineState {
    loaded: Option<(SourceId, Arc<AudioData>)>,
    /// Read position in source frames. Fractional when the source and output
    /// rates differ.
    position: f64,
    playing: bool,
    output_sample_rate: u32,
    frames_since_update: usize,
}

impl EngineState {
    fn new(output_sample_rate: u32) -> Self {
        Self {
            loaded: None,
            position: 0.0,
            playing: false,
            output_sample_rate,
            frames_since_update: 0,
        }
    }

    fn report_position(&self, event_tx: &Sender<AudioEvent>) {
        if let Some((source, audio)) = &self.loaded {
            let pos_secs = self.position / audio.sample_rate as f64;
            let _ = event_tx.try_send(AudioEvent::PositionChanged(*source, pos_secs));
        }
    }

    fn handle_command(&mut self, cmd: AudioCommand, event_tx: &Sender<AudioEvent>) {
        match cmd {
            AudioCommand::LoadAudio(source, data) => {
                self.loaded = Some((source, data));
                self.position = 0.0;
                self.playing = false;
                self.frames_since_update = 0;
            }
            AudioCommand::Unload => {
                self.loaded = None;
                self.position = 0.0;
                self.playing = false;
            }
            AudioCommand::Play => {
                if self.loaded.is_some() {
                    self.playing = true;
                }
            }
            AudioCommand::Pause => {
                self.playing = false;
                self.report_position(event_tx);
            }
            AudioCommand::Seek(time) => {
                if let Some((_, audio)) = &self.loaded {
                    let frame = (time * audio.sample_rate as f64).max(0.0);
                    self.position = frame.min(audio.num_frames() as f64);
                    self.report_position(event_tx);
                }
            }
        }
    }

    /// Fill the output buffer with the loaded audio.
    fn fill_buffer(&mut self, output: &mut [f32], channels: u16, event_tx: &Sender<AudioEvent>) {
        if !self.playing {
            output.fill(0.0);
            return;
        }

        let (source, audio) = match &self.loaded {
            Some((source, audio)) => (*source, audio.clone()),
            None => {
                output.fill(0.0);
                return;
            }
        };

        let audio_channels = audio.channels.max(1) as usize;
        let out_channels = channels.max(1) as usize;
        let total_frames = audio.num_frames();
        let step = audio.sample_rate as f64 / self.output_sample_rate.max(1) as f64;
        let mut finished = false;

        for frame in output.chunks_mut(out_channels) {
            let index = self.position as usize;
            if finished || index >= total_frames {
                finished = true;
                frame.fill(0.0);
                continue;
            }
            for (c, sample) in frame.iter_mut().enumerate() {
                *sample = audio.samples[index * audio_channels + c % audio_channels];
            }
            self.position += step;
            self.frames_since_update += 1;
        }

        if finished {
            self.playing = false;
            self.position = total_frames as f64;
            self.report_position(event_tx);
            let _ = event_tx.try_send(AudioEvent::PlaybackFinished(source));
        } else if self.frames_since_update >= POSITION_UPDATE_INTERVAL {
            self.frames_since_update = 0;
            self.report_position(event_tx);
        }
    }
}

/// Spawn the audio engine thread and return command/event channels.
pub fn spawn_engine() -> Result<(Sender<AudioCommand>, Receiver<AudioEvent>)> {
    let (cmd_tx, cmd_rx) = crossbeam_channel::bounded::<AudioCommand>(64);
    let (event_tx, event_rx) = crossbeam_channel::bounded::<AudioEvent>(256);

    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| TrimError::Engine("No audio output device found".to_string()))?;

    let config = device
        .default_output_config()
        .map_err(|e| TrimError::Engine(format!("Failed to get output config: {e}")))?;

    let sample_rate = config.sample_rate();
    let channels = config.channels();
    let sample_format = config.sample_format();

    let mut state = EngineState::new(sample_rate);
    let event_tx_clone = event_tx.clone();

    let stream = match sample_format {
        cpal::SampleFormat::F32 => device
            .build_output_stream(
                &config.into(),
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    // Process commands
                    while let Ok(cmd) = cmd_rx.try_recv() {
                        state.handle_command(cmd, &event_tx_clone);
                    }
                    state.fill_buffer(data, channels, &event_tx_clone);
                },
                move |err| {
                    let _ = event_tx.try_send(AudioEvent::Error(err.to_string()));
                },
                None,
            )
            .map_err(|e| TrimError::Engine(format!("Failed to build output stream: {e}")))?,
        _ => {
            return Err(TrimError::Engine(format!(
                "Unsupported sample format: {sample_format:?}"
            )))
        }
    };

    stream
        .play()
        .map_err(|e| TrimError::Engine(format!("Failed to start stream: {e}")))?;

    tracing::info!(sample_rate, channels, "audio output started");

    // Keep stream alive by moving it into a thread
    std::thread::Builder::new()
        .name("audio-keepalive".into())
        .spawn(move || {
            let _stream = stream;
            loop {
                std::thread::park();
            }
        })
        .map_err(|e| TrimError::Engine(format!("Failed to spawn keepalive thread: {e}")))?;

    Ok((cmd_tx, event_rx))
}

/// [`Transport`] that forwards to the engine thread. Without an engine it
/// does nothing, so the editor keeps working with no output device.
#[derive(Debug, Clone, Default)]
pub struct EngineTransport {
    cmd_tx: Option<Sender<AudioCommand>>,
}

impl EngineTransport {
    pub fn new(cmd_tx: Sender<AudioCommand>) -> Self {
        Self {
            cmd_tx: Some(cmd_tx),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.cmd_tx.is_some()
    }

    pub fn send(&self, cmd: AudioCommand) {
        if let Some(tx) = &self.cmd_tx {
            if let Err(e) = tx.try_send(cmd) {
                tracing::warn!(error = %e, "audio engine command dropped");
            }
        }
    }
}

impl Transport for EngineTransport {
    fn seek(&mut self, seconds: f64) {
        self.send(AudioCommand::Seek(seconds));
    }

    fn resume(&mut self) {
        self.send(AudioCommand::Play);
    }

    fn pause(&mut self) {
        self.send(AudioCommand::Pause);
    }
}

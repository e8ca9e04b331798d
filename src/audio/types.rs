use std::sync::Arc;

use crate::source::SourceId;

/// Decoded audio data stored entirely in memory.
#[derive(Clone, Debug)]
pub struct AudioData {
    /// Interleaved samples normalized to [-1.0, 1.0].
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub channels: u16,
    /// Duration in seconds.
    pub duration: f64,
}

impl AudioData {
    /// Total number of frames (samples per channel).
    pub fn num_frames(&self) -> usize {
        if self.channels == 0 {
            return 0;
        }
        self.samples.len() / self.channels as usize
    }

    /// Copy out one channel's samples. Channels past the last are empty.
    pub fn channel(&self, index: usize) -> Vec<f32> {
        let ch = self.channels as usize;
        if index >= ch {
            return Vec::new();
        }
        if ch == 1 {
            return self.samples.clone();
        }
        self.samples
            .chunks_exact(ch)
            .map(|frame| frame[index])
            .collect()
    }
}

/// Commands sent from the UI thread to the audio thread.
#[derive(Debug, Clone)]
pub enum AudioCommand {
    LoadAudio(SourceId, Arc<AudioData>),
    Unload,
    Play,
    Pause,
    Seek(f64),
}

/// Events sent from the audio thread to the UI thread.
#[derive(Debug, Clone)]
pub enum AudioEvent {
    PositionChanged(SourceId, f64),
    PlaybackFinished(SourceId),
    Error(String),
}

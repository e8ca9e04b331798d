use thiserror::Error;

/// Result alias carrying [`TrimError`].
pub type Result<T> = std::result::Result<T, TrimError>;

/// Failure to turn raw bytes into channel samples.
#[derive(Debug, Clone, Error)]
pub enum DecodeError {
    /// The container could not be recognised.
    #[error("Unsupported audio format: {0}")]
    Probe(String),

    #[error("No decodable audio track found")]
    NoTrack,

    #[error("No sample rate in track")]
    MissingSampleRate,

    /// The codec could not be instantiated for the track.
    #[error("Unsupported codec: {0}")]
    Codec(String),

    /// Reading or decoding a packet failed for a reason other than end of stream.
    #[error("Corrupt audio stream: {0}")]
    Read(String),

    #[error("Audio stream contains no samples")]
    Empty,
}

/// Errors surfaced to the host around an audio source.
#[derive(Debug, Error)]
pub enum TrimError {
    #[error("Decode failed: {0}")]
    Decode(#[from] DecodeError),

    /// The source never reported a usable duration.
    #[error("Audio duration is unavailable")]
    MetadataUnavailable,

    /// The playback engine could not be started or has failed.
    #[error("Audio engine error: {0}")]
    Engine(String),

    #[error("Invalid configuration: {0}")]
    Config(#[from] toml::de::Error),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("Window error: {0}")]
    Window(#[from] iced::Error),
}

impl TrimError {
    /// Whether this error leaves the source unusable for clip generation.
    pub fn disables_generate(&self) -> bool {
        matches!(self, Self::Decode(_) | Self::MetadataUnavailable)
    }
}

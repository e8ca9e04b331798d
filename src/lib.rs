//! Waveform trimming engine.
//!
//! Decodes an audio source into a fixed-resolution amplitude envelope, keeps
//! a clamped `[start, end]` selection that two drag handles edit, and keeps
//! playback inside that selection. [`render::render`] turns the whole state
//! into drawing commands for whatever surface the host paints on.

pub mod app;
pub mod audio;
pub mod config;
pub mod drag;
pub mod envelope;
pub mod error;
pub mod playback;
pub mod render;
pub mod selection;
pub mod session;
pub mod source;
pub mod ui;

pub use config::TrimConfig;
pub use drag::{DragController, DragState, Handle, PointerEvent};
pub use envelope::{Envelope, EnvelopeExtractor, Extracted};
pub use error::{DecodeError, Result, TrimError};
pub use playback::{PlaybackController, PlaybackState, Transport};
pub use render::{DrawCommand, Viewport};
pub use selection::{SelectionRange, MIN_GAP};
pub use session::{Delivery, TrimEditor, TrimSession};
pub use source::{AudioSource, SourceId};

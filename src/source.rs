use std::fmt;
use std::sync::Arc;

/// Generation number of an audio source. Strictly increasing per editor, so
/// comparing ids is enough to tell whether a result is still current.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SourceId(u64);

impl SourceId {
    pub const fn new(generation: u64) -> Self {
        Self(generation)
    }

    pub fn generation(self) -> u64 {
        self.0
    }

    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "source#{}", self.0)
    }
}

/// A decodable byte stream tagged with its identity.
#[derive(Clone)]
pub struct AudioSource {
    id: SourceId,
    bytes: Arc<[u8]>,
}

impl AudioSource {
    pub fn new(id: SourceId, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            id,
            bytes: bytes.into(),
        }
    }

    pub fn id(&self) -> SourceId {
        self.id
    }

    pub fn bytes(&self) -> &Arc<[u8]> {
        &self.bytes
    }
}

impl fmt::Debug for AudioSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioSource")
            .field("id", &self.id)
            .field("bytes", &format!("<{} bytes>", self.bytes.len()))
            .finish()
    }
}

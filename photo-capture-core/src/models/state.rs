use std::fmt;
use std::path::PathBuf;

/// Artifact accumulation state for a single capture request.
///
/// State transitions:
/// ```text
/// awaiting → raw-only ──────┐
///     │                     ├→ both → finalized
///     └→ compressed-only ───┘
/// ```
///
/// The RAW artifact is a staged file on disk; the compressed artifact is
/// held in memory until both are handed to the photo library together.
#[derive(Clone, PartialEq, Eq)]
pub enum ArtifactState {
    AwaitingArtifacts,
    RawOnly { raw_file: PathBuf },
    CompressedOnly { compressed: Vec<u8> },
    Both { raw_file: PathBuf, compressed: Vec<u8> },
    Finalized,
}

impl ArtifactState {
    pub fn is_awaiting(&self) -> bool {
        matches!(self, Self::AwaitingArtifacts)
    }

    /// Whether both artifacts have arrived.
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Both { .. })
    }

    pub fn is_finalized(&self) -> bool {
        matches!(self, Self::Finalized)
    }

    /// Record the staged RAW container file for this request.
    ///
    /// A repeated RAW delivery replaces the previous path; a finalized state
    /// is left untouched.
    pub fn record_raw_file(&mut self, raw_file: PathBuf) {
        let previous = std::mem::replace(self, Self::Finalized);
        *self = match previous {
            Self::AwaitingArtifacts | Self::RawOnly { .. } => Self::RawOnly { raw_file },
            Self::CompressedOnly { compressed } | Self::Both { compressed, .. } => Self::Both {
                raw_file,
                compressed,
            },
            Self::Finalized => Self::Finalized,
        };
    }

    /// Record the compressed container bytes for this request.
    pub fn record_compressed(&mut self, compressed: Vec<u8>) {
        let previous = std::mem::replace(self, Self::Finalized);
        *self = match previous {
            Self::AwaitingArtifacts | Self::CompressedOnly { .. } => {
                Self::CompressedOnly { compressed }
            }
            Self::RawOnly { raw_file } | Self::Both { raw_file, .. } => Self::Both {
                raw_file,
                compressed,
            },
            Self::Finalized => Self::Finalized,
        };
    }

    /// Mark the request finished, returning whatever had accumulated.
    pub fn finalize(&mut self) -> ArtifactState {
        std::mem::replace(self, Self::Finalized)
    }
}

impl fmt::Debug for ArtifactState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AwaitingArtifacts => write!(f, "AwaitingArtifacts"),
            Self::RawOnly { raw_file } => {
                f.debug_struct("RawOnly").field("raw_file", raw_file).finish()
            }
            Self::CompressedOnly { compressed } => f
                .debug_struct("CompressedOnly")
                .field("compressed_bytes", &compressed.len())
                .finish(),
            Self::Both { raw_file, compressed } => f
                .debug_struct("Both")
                .field("raw_file", raw_file)
                .field("compressed_bytes", &compressed.len())
                .finish(),
            Self::Finalized => write!(f, "Finalized"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_then_compressed_reaches_both() {
        let mut state = ArtifactState::AwaitingArtifacts;
        state.record_raw_file(PathBuf::from("/tmp/a.dng"));
        assert!(matches!(state, ArtifactState::RawOnly { .. }));

        state.record_compressed(vec![1, 2, 3]);
        assert!(state.is_complete());
        match &state {
            ArtifactState::Both { raw_file, compressed } => {
                assert_eq!(raw_file, &PathBuf::from("/tmp/a.dng"));
                assert_eq!(compressed, &vec![1, 2, 3]);
            }
            other => panic!("unexpected state: {:?}", other),
        }
    }

    #[test]
    fn compressed_then_raw_reaches_both() {
        let mut state = ArtifactState::AwaitingArtifacts;
        state.record_compressed(vec![9]);
        assert!(matches!(state, ArtifactState::CompressedOnly { .. }));

        state.record_raw_file(PathBuf::from("/tmp/b.dng"));
        assert!(state.is_complete());
    }

    #[test]
    fn finalize_returns_accumulated_artifacts() {
        let mut state = ArtifactState::AwaitingArtifacts;
        state.record_raw_file(PathBuf::from("/tmp/c.dng"));
        state.record_compressed(vec![4, 5]);

        let collected = state.finalize();
        assert!(collected.is_complete());
        assert!(state.is_finalized());
    }

    #[test]
    fn records_after_finalize_are_ignored() {
        let mut state = ArtifactState::Finalized;
        state.record_raw_file(PathBuf::from("/tmp/late.dng"));
        assert!(state.is_finalized());

        state.record_compressed(vec![1]);
        assert!(state.is_finalized());
    }

    #[test]
    fn repeated_raw_delivery_replaces_path() {
        let mut state = ArtifactState::AwaitingArtifacts;
        state.record_raw_file(PathBuf::from("/tmp/first.dng"));
        state.record_raw_file(PathBuf::from("/tmp/second.dng"));
        match state {
            ArtifactState::RawOnly { raw_file } => {
                assert_eq!(raw_file, PathBuf::from("/tmp/second.dng"));
            }
            other => panic!("unexpected state: {:?}", other),
        }
    }
}

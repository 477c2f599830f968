//! Sequence assembly: variable-length capture windows to fixed-length input.
//!
//! Classifiers consume exactly `T` frames. Short captures are front-padded
//! with zero vectors so the most recent, most discriminative motion stays at
//! the end of the window; long captures keep only their last `T` frames.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::landmarks::LandmarkFrame;
use crate::normalize::feature_vector;

/// One gesture sample: a time-ordered list of per-frame feature vectors,
/// variable length as captured.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Sequence {
    pub frames: Vec<Vec<f32>>,
}

impl Sequence {
    pub fn new(frames: Vec<Vec<f32>>) -> Self {
        Self { frames }
    }

    /// Normalize a window of typed frames into a sequence.
    pub fn from_landmark_frames(frames: &[LandmarkFrame]) -> Self {
        Self {
            frames: frames.iter().map(feature_vector).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

/// Fit a sequence to exactly `target_len` frames of dimension `dim`.
///
/// Deterministic and idempotent: an already-conforming input is returned
/// unchanged. An empty input yields `target_len` zero vectors. A frame with
/// the wrong dimensionality is a client error, never silently corrected.
pub fn fit_to_length(
    frames: &[Vec<f32>],
    target_len: usize,
    dim: usize,
) -> Result<Vec<Vec<f32>>> {
    for frame in frames {
        if frame.len() != dim {
            return Err(Error::DimensionMismatch {
                expected: dim,
                actual: frame.len(),
            });
        }
    }

    if frames.len() >= target_len {
        // Keep the most recent frames, drop the oldest.
        return Ok(frames[frames.len() - target_len..].to_vec());
    }

    let mut fitted = vec![vec![0.0; dim]; target_len - frames.len()];
    fitted.extend_from_slice(frames);
    Ok(fitted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmarks::FEATURE_DIM;

    fn frame(value: f32, dim: usize) -> Vec<f32> {
        vec![value; dim]
    }

    #[test]
    fn sequence_from_landmark_frames_normalizes_each_frame() {
        let frames = [LandmarkFrame::empty(), LandmarkFrame::empty()];
        let sequence = Sequence::from_landmark_frames(&frames);

        assert_eq!(sequence.len(), 2);
        assert!(sequence
            .frames
            .iter()
            .all(|f| f.len() == FEATURE_DIM && f.iter().all(|&v| v == 0.0)));
    }

    #[test]
    fn short_sequence_front_padded() {
        let frames: Vec<_> = (0..7).map(|i| frame(i as f32 + 1.0, 4)).collect();
        let fitted = fit_to_length(&frames, 10, 4).unwrap();

        assert_eq!(fitted.len(), 10);
        for padded in &fitted[..3] {
            assert!(padded.iter().all(|&v| v == 0.0));
        }
        // Original frames unchanged, in original order, at the end.
        assert_eq!(&fitted[3..], &frames[..]);
    }

    #[test]
    fn long_sequence_keeps_last_frames() {
        let frames: Vec<_> = (0..15).map(|i| frame(i as f32, 4)).collect();
        let fitted = fit_to_length(&frames, 10, 4).unwrap();

        assert_eq!(fitted.len(), 10);
        assert_eq!(fitted[0][0], 5.0);
        assert_eq!(fitted[9][0], 14.0);
    }

    #[test]
    fn exact_length_is_identity() {
        let frames: Vec<_> = (0..10).map(|i| frame(i as f32, 4)).collect();
        let fitted = fit_to_length(&frames, 10, 4).unwrap();
        assert_eq!(fitted, frames);

        // Idempotent when re-applied.
        let again = fit_to_length(&fitted, 10, 4).unwrap();
        assert_eq!(again, fitted);
    }

    #[test]
    fn empty_sequence_becomes_all_zeros() {
        let fitted = fit_to_length(&[], 5, 3).unwrap();
        assert_eq!(fitted.len(), 5);
        assert!(fitted.iter().all(|f| f.len() == 3 && f.iter().all(|&v| v == 0.0)));
    }

    #[test]
    fn wrong_dimension_rejected() {
        let frames = vec![frame(1.0, 4), frame(2.0, 3)];
        assert!(matches!(
            fit_to_length(&frames, 10, 4),
            Err(Error::DimensionMismatch {
                expected: 4,
                actual: 3
            })
        ));
    }
}

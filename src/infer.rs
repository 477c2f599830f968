//! Inference over one gesture sequence.
//!
//! Each request resolves to one of two strategies, chosen once by artifact
//! availability: the learned classifier from the store, or the rule-based
//! hand heuristic when nothing has been trained yet. The engine is
//! stateless across requests; readers are never blocked by a training run.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::heuristic;
use crate::landmarks::Hand;
use crate::normalize::hand_from_features;
use crate::store::ArtifactStore;
use crate::vocab::UNKNOWN_LABEL;

/// Confidence floor for the learned path. A winning probability below this
/// maps to the unknown sentinel instead of a low-quality label.
pub const MIN_CONFIDENCE: f32 = 0.4;

/// Which strategy produced a prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PredictionPath {
    Learned,
    Heuristic,
}

/// The recognition result for one sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Recognition {
    /// A gesture was recognized with the given confidence in `[0, 1]`.
    Gesture { label: String, confidence: f32 },
    /// Nothing recognizable: empty input, no hand in frame, an unmatched
    /// heuristic pattern, or a learned prediction below the confidence
    /// floor. An expected outcome, not an error.
    NoGesture,
}

impl Recognition {
    fn unknown() -> Self {
        Recognition::NoGesture
    }

    /// The label a caller should display; the unknown sentinel for
    /// no-gesture outcomes.
    pub fn display_label(&self) -> &str {
        match self {
            Recognition::Gesture { label, .. } => label,
            Recognition::NoGesture => UNKNOWN_LABEL,
        }
    }
}

/// One inference response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferenceOutcome {
    pub recognition: Recognition,
    pub path: PredictionPath,
    /// Artifact version consulted; `None` on the heuristic path.
    pub version: Option<u64>,
}

/// Per-request view over the artifact store.
pub struct InferenceEngine<'a> {
    store: &'a ArtifactStore,
    min_confidence: f32,
}

impl<'a> InferenceEngine<'a> {
    pub fn new(store: &'a ArtifactStore) -> Self {
        Self {
            store,
            min_confidence: MIN_CONFIDENCE,
        }
    }

    pub fn with_min_confidence(mut self, min_confidence: f32) -> Self {
        self.min_confidence = min_confidence;
        self
    }

    /// Recognize one raw, variable-length sequence of feature vectors.
    ///
    /// With `version` set, that exact artifact is consulted and a missing
    /// version is an error; otherwise the latest committed artifact is
    /// used, falling back to the heuristic when none exists. Malformed
    /// input is a client error and is never retried.
    pub fn recognize(
        &self,
        frames: &[Vec<f32>],
        version: Option<u64>,
    ) -> Result<InferenceOutcome> {
        let artifact = match version {
            Some(v) => Some(self.store.load(v)?),
            None => self.store.load_latest()?,
        };

        let Some(artifact) = artifact else {
            return self.recognize_heuristic(frames);
        };

        let (slot, confidence) = artifact.predict(frames)?;
        let recognition = if confidence >= self.min_confidence {
            match artifact.vocabulary.label_of(slot) {
                Some(label) => Recognition::Gesture {
                    label: label.to_string(),
                    confidence,
                },
                None => Recognition::unknown(),
            }
        } else {
            Recognition::unknown()
        };

        Ok(InferenceOutcome {
            recognition,
            path: PredictionPath::Learned,
            version: Some(artifact.version),
        })
    }

    /// The no-model path: classify the latest frame's hand landmarks with
    /// the fixed pattern table. Never consults any vocabulary.
    fn recognize_heuristic(&self, frames: &[Vec<f32>]) -> Result<InferenceOutcome> {
        let outcome = |recognition| InferenceOutcome {
            recognition,
            path: PredictionPath::Heuristic,
            version: None,
        };

        let Some(last) = frames.last() else {
            return Ok(outcome(Recognition::NoGesture));
        };

        // Prefer the dominant (right) hand when both are present.
        let hand = match hand_from_features(last, Hand::Right)? {
            Some(hand) => Some(hand),
            None => hand_from_features(last, Hand::Left)?,
        };
        let Some(hand) = hand else {
            return Ok(outcome(Recognition::NoGesture));
        };

        let recognition = match heuristic::classify(&hand).label() {
            Some(label) => Recognition::Gesture {
                label: label.to_string(),
                confidence: 1.0,
            },
            None => Recognition::NoGesture,
        };
        Ok(outcome(recognition))
    }
}

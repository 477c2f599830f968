use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::network::SequenceClassifier;
use crate::sequence::fit_to_length;
use crate::vocab::Vocabulary;

/// The persisted output of one successful training run: a classifier bound
/// to the vocabulary and input shape it was trained with, plus the version
/// it was published under.
///
/// Artifacts are immutable; retraining publishes a new version instead of
/// mutating an existing one.
///
/// # Usage
///
/// ```ignore
/// let artifact = ModelArtifact::load("models/model-1700000000.bin")?;
/// let scores = artifact.scores(&sequence)?;
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub classifier: SequenceClassifier,
    pub vocabulary: Vocabulary,
    pub version: u64,
}

impl ModelArtifact {
    pub fn new(classifier: SequenceClassifier, vocabulary: Vocabulary, version: u64) -> Self {
        Self {
            classifier,
            vocabulary,
            version,
        }
    }

    /// Load an artifact from a binary file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        let artifact: Self = bincode::deserialize(&bytes)?;
        Ok(artifact)
    }

    /// Save the artifact to a binary file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        let bytes = bincode::serialize(self)?;
        writer.write_all(&bytes)?;
        Ok(())
    }

    /// Sequence length the classifier was trained with.
    pub fn seq_len(&self) -> usize {
        self.classifier.seq_len()
    }

    /// Feature dimension the classifier was trained with.
    pub fn feature_dim(&self) -> usize {
        self.classifier.feature_dim()
    }

    /// Score a raw, variable-length sequence against every vocabulary slot.
    ///
    /// The input is padded/truncated to the artifact's bound sequence length
    /// first; a frame of the wrong dimension is a client error.
    pub fn scores(&self, frames: &[Vec<f32>]) -> Result<Vec<f32>> {
        let fitted = fit_to_length(frames, self.seq_len(), self.feature_dim())?;
        Ok(self.classifier.forward(&fitted))
    }

    /// Best non-unknown slot and its probability for a raw sequence.
    pub fn predict(&self, frames: &[Vec<f32>]) -> Result<(usize, f32)> {
        let scores = self.scores(frames)?;
        let mut best = 1;
        let mut best_score = f32::NEG_INFINITY;
        // Slot 0 is the unknown sentinel and never wins directly.
        for (slot, &score) in scores.iter().enumerate().skip(1) {
            if score > best_score {
                best = slot;
                best_score = score;
            }
        }
        Ok((best, best_score))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::ModelFamily;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn dummy_artifact() -> ModelArtifact {
        let mut rng = StdRng::seed_from_u64(11);
        let vocabulary = Vocabulary::from_labels(["left", "right"]);
        let classifier = SequenceClassifier::new(
            ModelFamily::FrameAverage,
            6,
            4,
            vocabulary.num_slots(),
            0,
            &mut rng,
        );
        ModelArtifact::new(classifier, vocabulary, 1)
    }

    #[test]
    fn scores_pad_short_input() {
        let artifact = dummy_artifact();
        let frames = vec![vec![0.5; 4]; 2];

        let scores = artifact.scores(&frames).unwrap();
        assert_eq!(scores.len(), 3);
        let sum: f32 = scores.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);
    }

    #[test]
    fn predict_never_reports_unknown_slot() {
        let artifact = dummy_artifact();
        let frames = vec![vec![0.1; 4]; 6];

        let (slot, confidence) = artifact.predict(&frames).unwrap();
        assert!(slot >= 1 && slot <= 2);
        assert!(confidence > 0.0);
    }

    #[test]
    fn save_and_load_round_trip() {
        let artifact = dummy_artifact();
        let path = std::env::temp_dir().join("handsign_model_roundtrip.bin");

        artifact.save(&path).unwrap();
        let loaded = ModelArtifact::load(&path).unwrap();

        assert_eq!(loaded.version, artifact.version);
        assert_eq!(loaded.vocabulary, artifact.vocabulary);
        assert_eq!(loaded.classifier, artifact.classifier);

        std::fs::remove_file(path).ok();
    }
}

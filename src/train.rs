//! Training coordination: dataset validation, the fitting loop, and
//! atomic publication of the resulting artifact.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::dataset::Dataset;
use crate::error::{Error, Result};
use crate::network::{ModelFamily, SequenceClassifier};
use crate::sequence::fit_to_length;
use crate::store::ArtifactStore;
use crate::vocab::Vocabulary;

/// Epochs without validation-accuracy improvement before stopping early.
const EARLY_STOP_PATIENCE: usize = 5;

/// Below this many total samples accuracy is unlikely to be meaningful.
const ADVISORY_MIN_SAMPLES: usize = 10;

/// Training-loop configuration. Vocabulary size is derived from the
/// dataset, never set by the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Frames every sample is padded/truncated to.
    pub sequence_length: usize,
    pub epochs: usize,
    pub batch_size: usize,
    /// Fraction of samples held out for validation and early stopping.
    pub validation_split: f32,
    pub learning_rate: f32,
    /// Hidden width for families that have a hidden layer.
    pub hidden_units: usize,
    pub family: ModelFamily,
    /// Fix for reproducible shuffles and weight init.
    pub seed: Option<u64>,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            sequence_length: 30,
            epochs: 50,
            batch_size: 16,
            validation_split: 0.2,
            learning_rate: 0.05,
            hidden_units: 64,
            family: ModelFamily::PooledMlp,
            seed: None,
        }
    }
}

/// A finished, not-yet-published training run.
#[derive(Debug, Clone)]
pub struct TrainedModel {
    pub classifier: SequenceClassifier,
    pub vocabulary: Vocabulary,
    pub accuracy: f32,
    pub val_accuracy: f32,
    pub samples: usize,
}

/// The outcome reported to a training submitter.
#[derive(Debug, Clone, Serialize)]
pub struct TrainingReport {
    pub accuracy: f32,
    pub val_accuracy: f32,
    pub samples: usize,
    pub vocabulary: Vec<String>,
    pub version: u64,
}

/// Fit a classifier to the dataset without touching any store.
///
/// Validates preconditions first (at least two labels, non-empty samples,
/// one consistent feature dimension); a validation failure consumes no
/// training resources. Sequences may be raw variable-length captures; they
/// are fitted to `config.sequence_length` here.
pub fn train(dataset: &Dataset, config: &TrainingConfig) -> Result<TrainedModel> {
    let feature_dim = dataset.validate_for_training()?;
    let vocabulary = Vocabulary::from_labels(dataset.labels());

    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    // Encode every sample as (fitted sequence, target slot).
    let mut encoded: Vec<(Vec<Vec<f32>>, usize)> = Vec::with_capacity(dataset.num_samples());
    for (label, samples) in dataset.iter() {
        let slot = vocabulary
            .slot_of(label)
            .ok_or_else(|| Error::InvalidDataset(format!("label \"{}\" not in vocabulary", label)))?;
        for sample in samples {
            let fitted = fit_to_length(&sample.frames, config.sequence_length, feature_dim)?;
            encoded.push((fitted, slot));
        }
    }

    if encoded.len() < ADVISORY_MIN_SAMPLES {
        warn!(
            samples = encoded.len(),
            "small dataset; accuracy is unlikely to be meaningful"
        );
    }

    encoded.shuffle(&mut rng);
    let val_len = (encoded.len() as f32 * config.validation_split).floor() as usize;
    // Keep at least one training sample; tiny datasets train on everything.
    let val_len = val_len.min(encoded.len().saturating_sub(1));
    let (val_set, train_set) = encoded.split_at(val_len);

    info!(
        classes = vocabulary.len(),
        train_samples = train_set.len(),
        val_samples = val_set.len(),
        family = ?config.family,
        "training started"
    );

    let mut classifier = SequenceClassifier::new(
        config.family,
        config.sequence_length,
        feature_dim,
        vocabulary.num_slots(),
        config.hidden_units,
        &mut rng,
    );

    let mut order: Vec<usize> = (0..train_set.len()).collect();
    let mut best: Option<(SequenceClassifier, f32)> = None;
    let mut stalled = 0;

    for epoch in 0..config.epochs {
        order.shuffle(&mut rng);
        let mut epoch_loss = 0.0;
        let mut batches = 0;

        for chunk in order.chunks(config.batch_size.max(1)) {
            let batch: Vec<(&[Vec<f32>], usize)> = chunk
                .iter()
                .map(|&i| (train_set[i].0.as_slice(), train_set[i].1))
                .collect();
            epoch_loss += classifier.train_batch(&batch, config.learning_rate);
            batches += 1;
        }

        let mean_loss = epoch_loss / batches.max(1) as f32;
        if !mean_loss.is_finite() {
            return Err(Error::Training(format!(
                "non-finite loss at epoch {}",
                epoch
            )));
        }

        // Early stopping on validation plateau, restoring the best weights.
        if !val_set.is_empty() {
            let val_accuracy = classifier.accuracy(val_set);
            let improved = best
                .as_ref()
                .map(|(_, best_acc)| val_accuracy > *best_acc)
                .unwrap_or(true);
            if improved {
                best = Some((classifier.clone(), val_accuracy));
                stalled = 0;
            } else {
                stalled += 1;
                if stalled >= EARLY_STOP_PATIENCE {
                    info!(epoch, "validation accuracy plateaued, stopping early");
                    break;
                }
            }
        }
    }

    let (classifier, val_accuracy) = match best {
        Some((best_classifier, best_acc)) => (best_classifier, best_acc),
        None => {
            // No validation set: report training accuracy in its place.
            let acc = classifier.accuracy(train_set);
            (classifier, acc)
        }
    };
    let accuracy = classifier.accuracy(train_set);

    info!(accuracy, val_accuracy, "training finished");

    Ok(TrainedModel {
        classifier,
        vocabulary,
        accuracy,
        val_accuracy,
        samples: encoded.len(),
    })
}

/// Train on the dataset and atomically publish the result to the store.
///
/// Nothing is committed on any failure; the store's previous version stays
/// authoritative throughout.
pub fn train_and_publish(
    store: &ArtifactStore,
    dataset: &Dataset,
    config: &TrainingConfig,
) -> Result<TrainingReport> {
    let trained = train(dataset, config)?;
    let vocabulary = trained.vocabulary.labels().to_vec();
    let version = store.publish(trained.classifier, trained.vocabulary)?;

    Ok(TrainingReport {
        accuracy: trained.accuracy,
        val_accuracy: trained.val_accuracy,
        samples: trained.samples,
        vocabulary,
        version,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequence::Sequence;

    fn config(epochs: usize) -> TrainingConfig {
        TrainingConfig {
            sequence_length: 8,
            epochs,
            batch_size: 4,
            validation_split: 0.0,
            learning_rate: 0.5,
            hidden_units: 8,
            family: ModelFamily::FrameAverage,
            seed: Some(99),
        }
    }

    fn two_class_dataset() -> Dataset {
        let mut ds = Dataset::new();
        for i in 0..4 {
            let jitter = i as f32 * 0.01;
            ds.insert("low", Sequence::new(vec![vec![0.1 + jitter; 6]; 5]));
            ds.insert("high", Sequence::new(vec![vec![0.9 - jitter; 6]; 12]));
        }
        ds
    }

    #[test]
    fn rejects_single_label_dataset() {
        let mut ds = Dataset::new();
        ds.insert("only", Sequence::new(vec![vec![0.0; 6]; 5]));

        assert!(matches!(
            train(&ds, &config(5)),
            Err(Error::InvalidDataset(_))
        ));
    }

    #[test]
    fn learns_separable_classes() {
        let trained = train(&two_class_dataset(), &config(200)).unwrap();

        assert_eq!(trained.vocabulary.labels(), &["high", "low"]);
        assert_eq!(trained.samples, 8);
        assert!(
            trained.accuracy > 0.99,
            "train accuracy {}",
            trained.accuracy
        );
    }

    #[test]
    fn validation_split_enables_early_stopping() {
        let mut cfg = config(200);
        cfg.validation_split = 0.25;

        let trained = train(&two_class_dataset(), &cfg).unwrap();
        assert!(trained.val_accuracy > 0.99);
    }

    #[test]
    fn fits_variable_length_sequences() {
        let mut ds = Dataset::new();
        // Shorter and longer than the configured window.
        ds.insert("short", Sequence::new(vec![vec![0.2; 6]; 3]));
        ds.insert("short", Sequence::new(vec![vec![0.2; 6]; 4]));
        ds.insert("long", Sequence::new(vec![vec![0.8; 6]; 20]));
        ds.insert("long", Sequence::new(vec![vec![0.8; 6]; 25]));

        let trained = train(&ds, &config(200)).unwrap();
        assert!(trained.accuracy > 0.99);
    }

    #[test]
    fn reproducible_with_fixed_seed() {
        let first = train(&two_class_dataset(), &config(20)).unwrap();
        let second = train(&two_class_dataset(), &config(20)).unwrap();
        assert_eq!(first.classifier, second.classifier);
    }
}

//! Labeled gesture datasets: validation and stratified splitting.

use std::collections::BTreeMap;

use rand::seq::index::sample;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::sequence::Sequence;

/// A labeled training dataset: label to gesture samples.
///
/// Labels iterate in sorted order, so vocabulary construction is
/// deterministic across runs. Serializes as a plain label-to-samples map,
/// the interchange format produced by recording tools.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Dataset {
    classes: BTreeMap<String, Vec<Sequence>>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, label: impl Into<String>, sample: Sequence) {
        self.classes.entry(label.into()).or_default().push(sample);
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.classes.keys().map(String::as_str)
    }

    pub fn num_classes(&self) -> usize {
        self.classes.len()
    }

    pub fn num_samples(&self) -> usize {
        self.classes.values().map(Vec::len).sum()
    }

    pub fn samples_for(&self, label: &str) -> Option<&[Sequence]> {
        self.classes.get(label).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Sequence])> {
        self.classes
            .iter()
            .map(|(label, samples)| (label.as_str(), samples.as_slice()))
    }

    /// Check the preconditions for training: at least two distinct labels,
    /// every sample non-empty, and a single consistent feature dimension
    /// across all frames. Returns that dimension.
    pub fn validate_for_training(&self) -> Result<usize> {
        if self.num_classes() < 2 {
            return Err(Error::InvalidDataset(format!(
                "training requires at least 2 distinct labels, got {}",
                self.num_classes()
            )));
        }

        let mut dim = None;
        for (label, samples) in self.iter() {
            if samples.is_empty() {
                return Err(Error::InvalidDataset(format!(
                    "label \"{}\" has no samples",
                    label
                )));
            }
            for sample in samples {
                if sample.is_empty() {
                    return Err(Error::InvalidDataset(format!(
                        "label \"{}\" contains an empty sequence",
                        label
                    )));
                }
                for frame in &sample.frames {
                    match dim {
                        None => dim = Some(frame.len()),
                        Some(expected) if frame.len() != expected => {
                            return Err(Error::DimensionMismatch {
                                expected,
                                actual: frame.len(),
                            });
                        }
                        Some(_) => {}
                    }
                }
            }
        }

        // num_classes >= 2 guarantees at least one frame was seen.
        dim.ok_or_else(|| Error::InvalidDataset("dataset contains no frames".into()))
    }

    /// Split into disjoint (train, test) partitions with `holdout` samples
    /// per class drawn uniformly without replacement into the test set.
    ///
    /// A class with too few samples to leave any training data is rejected
    /// rather than silently handed wholesale to the test partition.
    pub fn split<R: Rng>(&self, holdout: usize, rng: &mut R) -> Result<(Dataset, Dataset)> {
        for (label, samples) in self.iter() {
            if samples.len() <= holdout {
                return Err(Error::InsufficientSamples {
                    label: label.to_string(),
                    available: samples.len(),
                    requested: holdout,
                });
            }
        }

        let mut train = Dataset::new();
        let mut test = Dataset::new();

        for (label, samples) in self.iter() {
            let picked = sample(rng, samples.len(), holdout);
            let mut in_test = vec![false; samples.len()];
            for idx in picked.iter() {
                in_test[idx] = true;
            }
            for (idx, sample) in samples.iter().enumerate() {
                if in_test[idx] {
                    test.insert(label, sample.clone());
                } else {
                    train.insert(label, sample.clone());
                }
            }
        }

        Ok((train, test))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn sequence(value: f32, frames: usize) -> Sequence {
        Sequence::new(vec![vec![value; 4]; frames])
    }

    fn dataset(counts: &[(&str, usize)]) -> Dataset {
        let mut ds = Dataset::new();
        for &(label, count) in counts {
            for i in 0..count {
                ds.insert(label, sequence(i as f32, 3));
            }
        }
        ds
    }

    #[test]
    fn labels_iterate_sorted() {
        let ds = dataset(&[("zebra", 1), ("apple", 1), ("mango", 1)]);
        let labels: Vec<_> = ds.labels().collect();
        assert_eq!(labels, ["apple", "mango", "zebra"]);
    }

    #[test]
    fn validation_requires_two_labels() {
        let ds = dataset(&[("only", 3)]);
        assert!(matches!(
            ds.validate_for_training(),
            Err(Error::InvalidDataset(_))
        ));
    }

    #[test]
    fn validation_rejects_empty_sequences() {
        let mut ds = dataset(&[("a", 1), ("b", 1)]);
        ds.insert("a", Sequence::new(Vec::new()));
        assert!(matches!(
            ds.validate_for_training(),
            Err(Error::InvalidDataset(_))
        ));
    }

    #[test]
    fn validation_rejects_mixed_dimensions() {
        let mut ds = dataset(&[("a", 1), ("b", 1)]);
        ds.insert("b", Sequence::new(vec![vec![0.0; 7]]));
        assert!(matches!(
            ds.validate_for_training(),
            Err(Error::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn validation_reports_dimension() {
        let ds = dataset(&[("a", 2), ("b", 2)]);
        assert_eq!(ds.validate_for_training().unwrap(), 4);
    }

    #[test]
    fn split_is_disjoint_and_exhaustive() {
        let ds = dataset(&[("a", 8), ("b", 6)]);

        for seed in 0..5 {
            let mut rng = StdRng::seed_from_u64(seed);
            let (train, test) = ds.split(2, &mut rng).unwrap();

            for label in ["a", "b"] {
                let original = ds.samples_for(label).unwrap();
                let train_part = train.samples_for(label).unwrap();
                let test_part = test.samples_for(label).unwrap();

                // Stratified coverage: exactly `holdout` per class.
                assert_eq!(test_part.len(), 2);
                assert_eq!(train_part.len(), original.len() - 2);

                // Every sample lands in exactly one partition.
                let mut rejoined: Vec<_> = train_part.iter().chain(test_part).cloned().collect();
                rejoined.sort_by(|x, y| {
                    x.frames[0][0]
                        .partial_cmp(&y.frames[0][0])
                        .expect("finite test values")
                });
                let mut expected: Vec<_> = original.to_vec();
                expected.sort_by(|x, y| {
                    x.frames[0][0]
                        .partial_cmp(&y.frames[0][0])
                        .expect("finite test values")
                });
                assert_eq!(rejoined, expected);
            }
        }
    }

    #[test]
    fn split_rejects_class_smaller_than_holdout() {
        let ds = dataset(&[("a", 5), ("b", 2)]);
        let mut rng = StdRng::seed_from_u64(0);

        let err = ds.split(2, &mut rng).unwrap_err();
        assert!(matches!(
            err,
            Error::InsufficientSamples {
                available: 2,
                requested: 2,
                ..
            }
        ));
    }

    #[test]
    fn zero_holdout_leaves_test_empty() {
        let ds = dataset(&[("a", 3), ("b", 3)]);
        let mut rng = StdRng::seed_from_u64(1);

        let (train, test) = ds.split(0, &mut rng).unwrap();
        assert_eq!(train.num_samples(), 6);
        assert_eq!(test.num_samples(), 0);
    }
}

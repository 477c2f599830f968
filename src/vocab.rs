//! The closed set of recognizable labels bound to one trained model.
//!
//! Slot 0 is reserved for the unknown sentinel and never appears in training
//! data; label `i` occupies slot `i + 1`. The mapping is explicit and
//! bidirectional, never inferred from array positions elsewhere.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Label reported for the reserved unknown slot.
pub const UNKNOWN_LABEL: &str = "<unk>";

/// Ordered, duplicate-free label list with slot lookup in both directions.
///
/// Serializes as the bare ordered label list, so a persisted vocabulary is
/// directly index-addressable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct Vocabulary {
    labels: Vec<String>,
    slots: HashMap<String, usize>,
}

impl Vocabulary {
    /// Build from labels in the given order, dropping duplicates.
    pub fn from_labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut unique = Vec::new();
        let mut slots = HashMap::new();
        for label in labels {
            let label = label.into();
            if !slots.contains_key(&label) {
                // Slot 0 is the unknown sentinel.
                slots.insert(label.clone(), unique.len() + 1);
                unique.push(label);
            }
        }
        Self {
            labels: unique,
            slots,
        }
    }

    /// Number of labels, excluding the unknown sentinel.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Classifier output width: one slot per label plus the unknown slot.
    pub fn num_slots(&self) -> usize {
        self.labels.len() + 1
    }

    /// Slot index for a label, if the label is in the vocabulary.
    pub fn slot_of(&self, label: &str) -> Option<usize> {
        self.slots.get(label).copied()
    }

    /// Label at a slot; slot 0 reports the unknown sentinel.
    pub fn label_of(&self, slot: usize) -> Option<&str> {
        if slot == 0 {
            Some(UNKNOWN_LABEL)
        } else {
            self.labels.get(slot - 1).map(String::as_str)
        }
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }
}

impl From<Vec<String>> for Vocabulary {
    fn from(labels: Vec<String>) -> Self {
        Self::from_labels(labels)
    }
}

impl From<Vocabulary> for Vec<String> {
    fn from(vocab: Vocabulary) -> Self {
        vocab.labels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slots_start_after_unknown_sentinel() {
        let vocab = Vocabulary::from_labels(["hello", "thanks"]);

        assert_eq!(vocab.len(), 2);
        assert_eq!(vocab.num_slots(), 3);
        assert_eq!(vocab.slot_of("hello"), Some(1));
        assert_eq!(vocab.slot_of("thanks"), Some(2));
        assert_eq!(vocab.slot_of("missing"), None);
    }

    #[test]
    fn label_lookup_is_inverse_of_slot_lookup() {
        let vocab = Vocabulary::from_labels(["a", "b", "c"]);

        assert_eq!(vocab.label_of(0), Some(UNKNOWN_LABEL));
        for label in vocab.labels() {
            let slot = vocab.slot_of(label).unwrap();
            assert_eq!(vocab.label_of(slot), Some(label.as_str()));
        }
        assert_eq!(vocab.label_of(4), None);
    }

    #[test]
    fn duplicates_dropped_preserving_order() {
        let vocab = Vocabulary::from_labels(["b", "a", "b"]);
        assert_eq!(vocab.labels(), &["b".to_string(), "a".to_string()]);
    }

    #[test]
    fn serializes_as_plain_label_list() {
        let vocab = Vocabulary::from_labels(["x", "y"]);
        let json = serde_json::to_string(&vocab).unwrap();
        assert_eq!(json, r#"["x","y"]"#);

        let back: Vocabulary = serde_json::from_str(&json).unwrap();
        assert_eq!(back, vocab);
    }
}

//! Integration tests for the full train-then-recognize pipeline.

use std::path::PathBuf;

use handsign::{
    train_and_publish, ArtifactStore, Dataset, Error, InferenceEngine, ModelFamily,
    PredictionPath, Recognition, Sequence, TrainingConfig, FEATURE_DIM,
};

fn temp_store(name: &str) -> ArtifactStore {
    let dir: PathBuf =
        std::env::temp_dir().join(format!("handsign_e2e_{}_{}", name, std::process::id()));
    std::fs::remove_dir_all(&dir).ok();
    ArtifactStore::open(dir).expect("store dir creatable")
}

/// A gesture capture hovering around one spatial anchor, with a slow drift
/// so frames are not all identical.
fn capture(anchor: f32, frames: usize) -> Vec<Vec<f32>> {
    (0..frames)
        .map(|t| {
            let drift = t as f32 * 1e-4;
            vec![anchor + drift; FEATURE_DIM]
        })
        .collect()
}

fn config() -> TrainingConfig {
    TrainingConfig {
        sequence_length: 30,
        epochs: 300,
        batch_size: 2,
        validation_split: 0.0,
        learning_rate: 0.5,
        hidden_units: 8,
        family: ModelFamily::FrameAverage,
        seed: Some(7),
    }
}

#[test]
fn end_to_end_train_then_recognize() {
    let store = temp_store("roundtrip");

    // One 10-frame sample for "A" (padded to 30) and one 40-frame sample
    // for "B" (truncated to the last 30).
    let sample_a = capture(0.2, 10);
    let sample_b = capture(0.8, 40);

    let mut dataset = Dataset::new();
    dataset.insert("A", Sequence::new(sample_a.clone()));
    dataset.insert("B", Sequence::new(sample_b.clone()));

    let report = train_and_publish(&store, &dataset, &config()).expect("training succeeds");

    assert_eq!(report.vocabulary, ["A".to_string(), "B".to_string()]);
    assert_eq!(report.samples, 2);
    assert!(report.accuracy > 0.99, "accuracy {}", report.accuracy);

    // The freshly published artifact serves the original "A" capture.
    let engine = InferenceEngine::new(&store);
    let outcome = engine.recognize(&sample_a, None).expect("inference succeeds");

    assert_eq!(outcome.path, PredictionPath::Learned);
    assert_eq!(outcome.version, Some(report.version));
    match outcome.recognition {
        Recognition::Gesture { label, confidence } => {
            assert_eq!(label, "A");
            assert!(confidence > 0.4 && confidence <= 1.0);
        }
        Recognition::NoGesture => panic!("expected a recognized gesture"),
    }

    // And "B" as well.
    let outcome = engine.recognize(&sample_b, None).expect("inference succeeds");
    match outcome.recognition {
        Recognition::Gesture { label, .. } => assert_eq!(label, "B"),
        Recognition::NoGesture => panic!("expected a recognized gesture"),
    }

    std::fs::remove_dir_all(store.dir()).ok();
}

#[test]
fn retraining_replaces_vocabulary_atomically() {
    let store = temp_store("readafterwrite");

    let mut first = Dataset::new();
    first.insert("A", Sequence::new(capture(0.2, 12)));
    first.insert("B", Sequence::new(capture(0.8, 12)));
    let first_report = train_and_publish(&store, &first, &config()).expect("first run");

    let mut second = Dataset::new();
    second.insert("C", Sequence::new(capture(0.3, 12)));
    second.insert("D", Sequence::new(capture(0.7, 12)));
    let second_report = train_and_publish(&store, &second, &config()).expect("second run");

    assert!(second_report.version > first_report.version);

    // An immediate read of "latest" observes the new vocabulary, never the
    // prior one and never a mixture.
    let latest = store.load_latest().expect("readable").expect("published");
    assert_eq!(latest.version, second_report.version);
    assert_eq!(
        latest.vocabulary.labels(),
        &["C".to_string(), "D".to_string()]
    );

    // The superseded version remains addressable for pinned requests.
    let engine = InferenceEngine::new(&store);
    let pinned = engine
        .recognize(&capture(0.2, 12), Some(first_report.version))
        .expect("pinned inference");
    assert_eq!(pinned.version, Some(first_report.version));

    std::fs::remove_dir_all(store.dir()).ok();
}

#[test]
fn single_label_dataset_rejected_without_artifact() {
    let store = temp_store("rejected");

    let mut dataset = Dataset::new();
    dataset.insert("only", Sequence::new(capture(0.5, 10)));
    dataset.insert("only", Sequence::new(capture(0.5, 11)));

    let err = train_and_publish(&store, &dataset, &config()).unwrap_err();
    assert!(matches!(err, Error::InvalidDataset(_)));

    // No artifact was produced by the failed run.
    assert!(store.versions().expect("readable").is_empty());
    assert!(store.load_latest().expect("readable").is_none());

    std::fs::remove_dir_all(store.dir()).ok();
}

#[test]
fn no_model_falls_back_to_heuristic() {
    let store = temp_store("fallback");
    let engine = InferenceEngine::new(&store);

    // A featureless sequence: no hands detected anywhere.
    let no_detection = vec![vec![0.0; FEATURE_DIM]; 5];
    let outcome = engine
        .recognize(&no_detection, None)
        .expect("fallback inference");

    assert_eq!(outcome.path, PredictionPath::Heuristic);
    assert_eq!(outcome.version, None);
    assert_eq!(outcome.recognition, Recognition::NoGesture);

    std::fs::remove_dir_all(store.dir()).ok();
}

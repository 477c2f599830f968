//! # handsign
//!
//! Sign-language gesture recognition from pose landmark sequences.
//!
//! This crate provides the full classification pipeline between a black-box
//! pose estimator and a vocabulary of gesture words:
//!
//! - **Landmark normalization**: fixed-schema frames (two hands + body
//!   pose) flattened into 225-dimensional feature vectors, with zero spans
//!   for undetected groups
//! - **Sequence assembly**: variable-length captures front-padded or
//!   tail-truncated to a fixed window
//! - **Dataset splitting**: stratified per-class holdout
//! - **Training**: an interchangeable sequence classifier fitted with
//!   gradient descent, early-stopped on a validation plateau
//! - **Versioned artifacts**: atomic publish, monotonic versions, readers
//!   never see a partial write
//! - **Inference**: the latest (or a pinned) artifact, with a rule-based
//!   finger-pattern fallback when nothing has been trained yet
//!
//! ## Quick Start
//!
//! ```rust
//! use handsign::{
//!     feature_vector, fit_to_length, HandLandmarks, LandmarkFrame, Point3,
//!     FEATURE_DIM, HAND_POINTS,
//! };
//!
//! // One estimator frame: a single detected hand.
//! let hand = HandLandmarks::from_points(
//!     &vec![Point3::new(0.5, 0.5, 0.0); HAND_POINTS],
//! ).unwrap();
//! let frame = LandmarkFrame {
//!     left_hand: None,
//!     right_hand: Some(hand),
//!     pose: None,
//! };
//!
//! // Normalize and fit a short capture to a 30-frame window.
//! let features = feature_vector(&frame);
//! assert_eq!(features.len(), FEATURE_DIM);
//!
//! let window = fit_to_length(&[features], 30, FEATURE_DIM).unwrap();
//! assert_eq!(window.len(), 30);
//! ```
//!
//! Training and inference share a versioned [`ArtifactStore`]: the
//! coordinator publishes new `(classifier, vocabulary)` pairs atomically,
//! and [`InferenceEngine`] reads whichever version is committed at request
//! time.

pub mod dataset;
mod error;
pub mod heuristic;
pub mod infer;
pub mod landmarks;
mod model;
pub mod network;
pub mod normalize;
pub mod sequence;
pub mod store;
pub mod train;
pub mod vocab;

pub use dataset::Dataset;
pub use error::{Error, Result};
pub use heuristic::HeuristicGesture;
pub use infer::{
    InferenceEngine, InferenceOutcome, PredictionPath, Recognition, MIN_CONFIDENCE,
};
pub use landmarks::{
    Hand, HandLandmarks, LandmarkFrame, Point3, PoseLandmarks, FEATURE_DIM, HAND_POINTS,
    POSE_POINTS,
};
pub use model::ModelArtifact;
pub use network::{ModelFamily, SequenceClassifier};
pub use normalize::feature_vector;
pub use sequence::{fit_to_length, Sequence};
pub use store::ArtifactStore;
pub use train::{train, train_and_publish, TrainedModel, TrainingConfig, TrainingReport};
pub use vocab::{Vocabulary, UNKNOWN_LABEL};

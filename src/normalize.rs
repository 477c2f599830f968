//! Landmark normalization: typed frames to fixed-dimension feature vectors.
//!
//! The flattened layout is left hand (63), right hand (63), body pose (99),
//! x/y/z per point in the estimator's point order. Undetected groups occupy
//! their span with zeros, so the output length is always [`FEATURE_DIM`].

use crate::error::{Error, Result};
use crate::landmarks::{
    Hand, HandLandmarks, LandmarkFrame, Point3, FEATURE_DIM, HAND_POINTS, POSE_POINTS,
};

/// Element offsets of each group's span inside a feature vector.
pub const LEFT_HAND_OFFSET: usize = 0;
pub const RIGHT_HAND_OFFSET: usize = HAND_POINTS * 3;
pub const POSE_OFFSET: usize = 2 * HAND_POINTS * 3;

/// Flatten one frame into a feature vector of length [`FEATURE_DIM`].
///
/// Pure function: values are passed through as the estimator produced them,
/// no scaling or clamping. The only guarantees are dimensional completeness
/// and canonical group ordering.
pub fn feature_vector(frame: &LandmarkFrame) -> Vec<f32> {
    let mut features = Vec::with_capacity(FEATURE_DIM);

    match &frame.left_hand {
        Some(hand) => extend_points(&mut features, &hand.points),
        None => features.resize(features.len() + HAND_POINTS * 3, 0.0),
    }
    match &frame.right_hand {
        Some(hand) => extend_points(&mut features, &hand.points),
        None => features.resize(features.len() + HAND_POINTS * 3, 0.0),
    }
    match &frame.pose {
        Some(pose) => extend_points(&mut features, &pose.points),
        None => features.resize(features.len() + POSE_POINTS * 3, 0.0),
    }

    debug_assert_eq!(features.len(), FEATURE_DIM);
    features
}

/// Recover one hand's landmarks from a feature vector.
///
/// Returns `None` when the hand's span is all zeros, i.e. the hand was not
/// detected in the frame the vector came from. The vector must have the
/// canonical dimension.
pub fn hand_from_features(features: &[f32], hand: Hand) -> Result<Option<HandLandmarks>> {
    if features.len() != FEATURE_DIM {
        return Err(Error::DimensionMismatch {
            expected: FEATURE_DIM,
            actual: features.len(),
        });
    }

    let offset = match hand {
        Hand::Left => LEFT_HAND_OFFSET,
        Hand::Right => RIGHT_HAND_OFFSET,
    };
    let span = &features[offset..offset + HAND_POINTS * 3];
    if span.iter().all(|&v| v == 0.0) {
        return Ok(None);
    }
    HandLandmarks::from_coords(span).map(Some)
}

fn extend_points(features: &mut Vec<f32>, points: &[Point3]) {
    for p in points {
        features.push(p.x);
        features.push(p.y);
        features.push(p.z);
    }
}

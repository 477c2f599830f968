use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Number of keypoints the estimator reports per hand.
pub const HAND_POINTS: usize = 21;

/// Number of body keypoints the estimator reports.
pub const POSE_POINTS: usize = 33;

/// Flattened feature dimension: two hands plus the body pose, x/y/z each.
pub const FEATURE_DIM: usize = 2 * HAND_POINTS * 3 + POSE_POINTS * 3;

// Hand keypoint indices, in the estimator's fixed point order.
pub const WRIST: usize = 0;
pub const THUMB_CMC: usize = 1;
pub const THUMB_MCP: usize = 2;
pub const THUMB_IP: usize = 3;
pub const THUMB_TIP: usize = 4;
pub const INDEX_MCP: usize = 5;
pub const INDEX_PIP: usize = 6;
pub const INDEX_DIP: usize = 7;
pub const INDEX_TIP: usize = 8;
pub const MIDDLE_MCP: usize = 9;
pub const MIDDLE_PIP: usize = 10;
pub const MIDDLE_DIP: usize = 11;
pub const MIDDLE_TIP: usize = 12;
pub const RING_MCP: usize = 13;
pub const RING_PIP: usize = 14;
pub const RING_DIP: usize = 15;
pub const RING_TIP: usize = 16;
pub const PINKY_MCP: usize = 17;
pub const PINKY_PIP: usize = 18;
pub const PINKY_DIP: usize = 19;
pub const PINKY_TIP: usize = 20;

/// A 3D point with floating-point coordinates, as produced by the
/// upstream pose estimator. Values are passed through unmodified.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Point3 {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub const fn zero() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            z: 0.0,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// Which hand a landmark group belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Hand {
    Left,
    Right,
}

/// One detected hand: a fixed-count list of keypoints in estimator order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HandLandmarks {
    pub points: [Point3; HAND_POINTS],
}

impl HandLandmarks {
    /// Build from a point list, validating count and coordinate values at
    /// the estimator boundary so downstream code never re-checks.
    pub fn from_points(points: &[Point3]) -> Result<Self> {
        if points.len() != HAND_POINTS {
            return Err(Error::DimensionMismatch {
                expected: HAND_POINTS,
                actual: points.len(),
            });
        }
        validate_finite(points)?;
        let mut fixed = [Point3::zero(); HAND_POINTS];
        fixed.copy_from_slice(points);
        Ok(Self { points: fixed })
    }

    /// Build from a flat `[x, y, z, x, y, z, ...]` coordinate buffer.
    pub fn from_coords(coords: &[f32]) -> Result<Self> {
        let points = points_from_coords(coords, HAND_POINTS)?;
        Self::from_points(&points)
    }
}

/// The detected body pose: a fixed-count list of keypoints in estimator order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoseLandmarks {
    #[serde(with = "pose_array_serde")]
    pub points: [Point3; POSE_POINTS],
}

/// serde helper for `[Point3; POSE_POINTS]`: serde's built-in array impls stop
/// at 32 elements, and `POSE_POINTS` is 33. This serializes/deserializes the
/// array exactly as serde's derived array support would (a fixed-length tuple
/// of elements), so the on-wire representation is unchanged.
mod pose_array_serde {
    use super::{Point3, POSE_POINTS};
    use serde::de::{SeqAccess, Visitor};
    use serde::ser::SerializeTuple;
    use serde::{Deserializer, Serializer};
    use std::fmt;

    pub fn serialize<S>(arr: &[Point3; POSE_POINTS], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut tup = serializer.serialize_tuple(POSE_POINTS)?;
        for p in arr.iter() {
            tup.serialize_element(p)?;
        }
        tup.end()
    }

    struct PoseArrayVisitor;

    impl<'de> Visitor<'de> for PoseArrayVisitor {
        type Value = [Point3; POSE_POINTS];

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            write!(f, "an array of {} Point3 values", POSE_POINTS)
        }

        fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
        where
            A: SeqAccess<'de>,
        {
            let mut arr = [Point3::zero(); POSE_POINTS];
            for (i, slot) in arr.iter_mut().enumerate() {
                *slot = seq
                    .next_element()?
                    .ok_or_else(|| serde::de::Error::invalid_length(i, &self))?;
            }
            Ok(arr)
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<[Point3; POSE_POINTS], D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_tuple(POSE_POINTS, PoseArrayVisitor)
    }
}

impl PoseLandmarks {
    pub fn from_points(points: &[Point3]) -> Result<Self> {
        if points.len() != POSE_POINTS {
            return Err(Error::DimensionMismatch {
                expected: POSE_POINTS,
                actual: points.len(),
            });
        }
        validate_finite(points)?;
        let mut fixed = [Point3::zero(); POSE_POINTS];
        fixed.copy_from_slice(points);
        Ok(Self { points: fixed })
    }

    pub fn from_coords(coords: &[f32]) -> Result<Self> {
        let points = points_from_coords(coords, POSE_POINTS)?;
        Self::from_points(&points)
    }
}

/// One frame of estimator output with a fixed schema: every group slot is
/// always present, `None` meaning the estimator did not detect the group.
///
/// The canonical group order is left hand, right hand, body pose; feature
/// flattening relies on it.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LandmarkFrame {
    pub left_hand: Option<HandLandmarks>,
    pub right_hand: Option<HandLandmarks>,
    pub pose: Option<PoseLandmarks>,
}

impl LandmarkFrame {
    /// A frame with no detections: valid input, distinct from corrupt data.
    pub fn empty() -> Self {
        Self::default()
    }

    /// True when the estimator found nothing in this frame.
    pub fn is_empty(&self) -> bool {
        self.left_hand.is_none() && self.right_hand.is_none() && self.pose.is_none()
    }

    pub fn hand(&self, hand: Hand) -> Option<&HandLandmarks> {
        match hand {
            Hand::Left => self.left_hand.as_ref(),
            Hand::Right => self.right_hand.as_ref(),
        }
    }
}

fn validate_finite(points: &[Point3]) -> Result<()> {
    for (i, p) in points.iter().enumerate() {
        if !p.is_finite() {
            return Err(Error::MalformedFrame(format!(
                "non-finite coordinate at landmark {}",
                i
            )));
        }
    }
    Ok(())
}

fn points_from_coords(coords: &[f32], count: usize) -> Result<Vec<Point3>> {
    if coords.len() != count * 3 {
        return Err(Error::DimensionMismatch {
            expected: count * 3,
            actual: coords.len(),
        });
    }
    Ok(coords
        .chunks_exact(3)
        .map(|c| Point3::new(c[0], c[1], c[2]))
        .collect())
}

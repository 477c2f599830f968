//! Sequence-classifier internals.
//!
//! The learning algorithm is a replaceable detail behind a fixed contract:
//! input is a `(seq_len, feature_dim)` padded sequence, output a probability
//! distribution over `num_slots` vocabulary slots (slot 0 = unknown). Two
//! interchangeable families are provided:
//!
//! - `PooledMlp`: per-frame dense features with ReLU, mean-pooled over time,
//!   then a softmax output layer.
//! - `FrameAverage`: per-frame linear softmax, averaged over the window.
//!
//! Both train with mini-batch gradient descent on cross-entropy.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Selector for the interchangeable classifier architectures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModelFamily {
    PooledMlp,
    FrameAverage,
}

impl std::str::FromStr for ModelFamily {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "pooled-mlp" => Ok(Self::PooledMlp),
            "frame-average" => Ok(Self::FrameAverage),
            other => Err(format!(
                "unknown model family \"{}\" (expected pooled-mlp or frame-average)",
                other
            )),
        }
    }
}

/// A fully-connected layer with row-major weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DenseLayer {
    weights: Vec<f32>,
    biases: Vec<f32>,
    in_dim: usize,
    out_dim: usize,
}

impl DenseLayer {
    fn init<R: Rng>(in_dim: usize, out_dim: usize, rng: &mut R) -> Self {
        let limit = (1.0 / in_dim as f32).sqrt();
        let weights = (0..in_dim * out_dim)
            .map(|_| rng.gen_range(-limit..limit))
            .collect();
        Self {
            weights,
            biases: vec![0.0; out_dim],
            in_dim,
            out_dim,
        }
    }

    fn forward(&self, input: &[f32]) -> Vec<f32> {
        debug_assert_eq!(input.len(), self.in_dim);
        let mut out = self.biases.clone();
        for (o, out_val) in out.iter_mut().enumerate() {
            let row = &self.weights[o * self.in_dim..(o + 1) * self.in_dim];
            let mut acc = 0.0;
            for (w, x) in row.iter().zip(input) {
                acc += w * x;
            }
            *out_val += acc;
        }
        out
    }
}

/// Zero-filled gradient accumulator matching a layer's shape.
struct DenseGrad {
    weights: Vec<f32>,
    biases: Vec<f32>,
}

impl DenseGrad {
    fn zeros(layer: &DenseLayer) -> Self {
        Self {
            weights: vec![0.0; layer.weights.len()],
            biases: vec![0.0; layer.biases.len()],
        }
    }

    fn apply(&self, layer: &mut DenseLayer, scale: f32) {
        for (w, g) in layer.weights.iter_mut().zip(&self.weights) {
            *w -= scale * g;
        }
        for (b, g) in layer.biases.iter_mut().zip(&self.biases) {
            *b -= scale * g;
        }
    }
}

/// Numerically stable softmax.
pub fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|&l| (l - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.iter().map(|&e| e / sum).collect()
}

/// A trained (or in-training) gesture sequence classifier.
///
/// Bound to one input shape `(seq_len, feature_dim)` and one output width
/// `num_slots`; the binding never changes after construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SequenceClassifier {
    PooledMlp {
        seq_len: usize,
        feature_dim: usize,
        hidden: DenseLayer,
        output: DenseLayer,
    },
    FrameAverage {
        seq_len: usize,
        feature_dim: usize,
        output: DenseLayer,
    },
}

impl SequenceClassifier {
    pub fn new<R: Rng>(
        family: ModelFamily,
        seq_len: usize,
        feature_dim: usize,
        num_slots: usize,
        hidden_units: usize,
        rng: &mut R,
    ) -> Self {
        match family {
            ModelFamily::PooledMlp => Self::PooledMlp {
                seq_len,
                feature_dim,
                hidden: DenseLayer::init(feature_dim, hidden_units, rng),
                output: DenseLayer::init(hidden_units, num_slots, rng),
            },
            ModelFamily::FrameAverage => Self::FrameAverage {
                seq_len,
                feature_dim,
                output: DenseLayer::init(feature_dim, num_slots, rng),
            },
        }
    }

    pub fn family(&self) -> ModelFamily {
        match self {
            Self::PooledMlp { .. } => ModelFamily::PooledMlp,
            Self::FrameAverage { .. } => ModelFamily::FrameAverage,
        }
    }

    pub fn seq_len(&self) -> usize {
        match self {
            Self::PooledMlp { seq_len, .. } | Self::FrameAverage { seq_len, .. } => *seq_len,
        }
    }

    pub fn feature_dim(&self) -> usize {
        match self {
            Self::PooledMlp { feature_dim, .. } | Self::FrameAverage { feature_dim, .. } => {
                *feature_dim
            }
        }
    }

    pub fn num_slots(&self) -> usize {
        match self {
            Self::PooledMlp { output, .. } | Self::FrameAverage { output, .. } => output.out_dim,
        }
    }

    /// Probability distribution over vocabulary slots for one padded
    /// sequence. Callers guarantee the `(seq_len, feature_dim)` shape.
    pub fn forward(&self, frames: &[Vec<f32>]) -> Vec<f32> {
        debug_assert_eq!(frames.len(), self.seq_len());

        match self {
            Self::PooledMlp { hidden, output, .. } => {
                let pooled = mean_pooled_hidden(hidden, frames);
                softmax(&output.forward(&pooled))
            }
            Self::FrameAverage { output, .. } => {
                let mut probs = vec![0.0; output.out_dim];
                for frame in frames {
                    let q = softmax(&output.forward(frame));
                    for (p, qv) in probs.iter_mut().zip(&q) {
                        *p += qv;
                    }
                }
                let t = frames.len() as f32;
                for p in &mut probs {
                    *p /= t;
                }
                probs
            }
        }
    }

    /// Slot with the highest probability and that probability.
    pub fn predict_slot(&self, frames: &[Vec<f32>]) -> (usize, f32) {
        argmax(&self.forward(frames))
    }

    /// One gradient-descent step on a mini-batch. Returns the mean
    /// cross-entropy loss over the batch.
    pub fn train_batch(&mut self, batch: &[(&[Vec<f32>], usize)], learning_rate: f32) -> f32 {
        if batch.is_empty() {
            return 0.0;
        }
        match self {
            Self::PooledMlp { hidden, output, .. } => {
                pooled_mlp_step(hidden, output, batch, learning_rate)
            }
            Self::FrameAverage { output, .. } => frame_average_step(output, batch, learning_rate),
        }
    }

    /// Fraction of samples whose argmax slot matches the target.
    pub fn accuracy(&self, samples: &[(Vec<Vec<f32>>, usize)]) -> f32 {
        if samples.is_empty() {
            return 0.0;
        }
        let correct = samples
            .iter()
            .filter(|(frames, target)| self.predict_slot(frames).0 == *target)
            .count();
        correct as f32 / samples.len() as f32
    }
}

pub fn argmax(values: &[f32]) -> (usize, f32) {
    let mut best = 0;
    let mut best_val = f32::NEG_INFINITY;
    for (i, &v) in values.iter().enumerate() {
        if v > best_val {
            best = i;
            best_val = v;
        }
    }
    (best, best_val)
}

fn mean_pooled_hidden(hidden: &DenseLayer, frames: &[Vec<f32>]) -> Vec<f32> {
    let mut pooled = vec![0.0; hidden.out_dim];
    for frame in frames {
        let z = hidden.forward(frame);
        for (p, zv) in pooled.iter_mut().zip(&z) {
            *p += zv.max(0.0);
        }
    }
    let t = frames.len() as f32;
    for p in &mut pooled {
        *p /= t;
    }
    pooled
}

fn pooled_mlp_step(
    hidden: &mut DenseLayer,
    output: &mut DenseLayer,
    batch: &[(&[Vec<f32>], usize)],
    learning_rate: f32,
) -> f32 {
    let mut hidden_grad = DenseGrad::zeros(hidden);
    let mut output_grad = DenseGrad::zeros(output);
    let mut total_loss = 0.0;

    for &(frames, target) in batch {
        let t = frames.len() as f32;

        // Forward, caching per-frame pre-activations.
        let zs: Vec<Vec<f32>> = frames.iter().map(|f| hidden.forward(f)).collect();
        let mut pooled = vec![0.0; hidden.out_dim];
        for z in &zs {
            for (p, zv) in pooled.iter_mut().zip(z) {
                *p += zv.max(0.0);
            }
        }
        for p in &mut pooled {
            *p /= t;
        }
        let probs = softmax(&output.forward(&pooled));
        total_loss -= probs[target].max(1e-12).ln();

        // Output layer gradients.
        let mut dlogits = probs;
        dlogits[target] -= 1.0;
        for (o, &dl) in dlogits.iter().enumerate() {
            output_grad.biases[o] += dl;
            let row = &mut output_grad.weights[o * output.in_dim..(o + 1) * output.in_dim];
            for (g, p) in row.iter_mut().zip(&pooled) {
                *g += dl * p;
            }
        }

        // Back through the pooling into the hidden layer.
        let mut dpooled = vec![0.0; hidden.out_dim];
        for (o, &dl) in dlogits.iter().enumerate() {
            let row = &output.weights[o * output.in_dim..(o + 1) * output.in_dim];
            for (dp, w) in dpooled.iter_mut().zip(row) {
                *dp += dl * w;
            }
        }
        for (frame, z) in frames.iter().zip(&zs) {
            for (j, &zv) in z.iter().enumerate() {
                if zv > 0.0 {
                    let g = dpooled[j] / t;
                    hidden_grad.biases[j] += g;
                    let row = &mut hidden_grad.weights[j * hidden.in_dim..(j + 1) * hidden.in_dim];
                    for (gw, x) in row.iter_mut().zip(frame) {
                        *gw += g * x;
                    }
                }
            }
        }
    }

    let scale = learning_rate / batch.len() as f32;
    hidden_grad.apply(hidden, scale);
    output_grad.apply(output, scale);
    total_loss / batch.len() as f32
}

fn frame_average_step(
    output: &mut DenseLayer,
    batch: &[(&[Vec<f32>], usize)],
    learning_rate: f32,
) -> f32 {
    let mut grad = DenseGrad::zeros(output);
    let mut total_loss = 0.0;

    for &(frames, target) in batch {
        let t = frames.len() as f32;

        let qs: Vec<Vec<f32>> = frames
            .iter()
            .map(|f| softmax(&output.forward(f)))
            .collect();
        let mut probs = vec![0.0; output.out_dim];
        for q in &qs {
            for (p, qv) in probs.iter_mut().zip(q) {
                *p += qv;
            }
        }
        for p in &mut probs {
            *p /= t;
        }
        total_loss -= probs[target].max(1e-12).ln();

        // d(loss)/d(mean prob) is nonzero only at the target slot.
        let dprob_target = -1.0 / probs[target].max(1e-12);

        for (frame, q) in frames.iter().zip(&qs) {
            // Softmax Jacobian applied to the single nonzero upstream term.
            let dq_target = dprob_target / t;
            let inner = dq_target * q[target];
            for (j, &qj) in q.iter().enumerate() {
                let upstream = if j == target { dq_target } else { 0.0 };
                let dlogit = qj * (upstream - inner);
                grad.biases[j] += dlogit;
                let row = &mut grad.weights[j * output.in_dim..(j + 1) * output.in_dim];
                for (g, x) in row.iter_mut().zip(frame) {
                    *g += dlogit * x;
                }
            }
        }
    }

    let scale = learning_rate / batch.len() as f32;
    grad.apply(output, scale);
    total_loss / batch.len() as f32
}

//! CLI application for training and running gesture recognition.
//!
//! Usage:
//!   handsign train --dataset data.json --store models/
//!   handsign recognize --sequence seq.json --store models/
//!   handsign recognize --sequence seq.json --store models/ --json
//!   handsign versions --store models/
//!   handsign sample -o data.json
//!
//! Dataset files map labels to gesture samples, each sample a list of
//! frames, each frame a flat feature vector:
//! `{"hello": [[[0.1, 0.2, ...], ...], ...], ...}`

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing_subscriber::EnvFilter;

use handsign::{
    ArtifactStore, Dataset, InferenceEngine, ModelFamily, Sequence, TrainingConfig, FEATURE_DIM,
    MIN_CONFIDENCE,
};

#[derive(Parser, Debug)]
#[command(name = "handsign")]
#[command(author, version, about = "Gesture recognition from landmark sequences", long_about = None)]
struct Args {
    /// Show verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Train a classifier on a labeled dataset and publish it
    Train {
        /// Dataset JSON file
        #[arg(long)]
        dataset: PathBuf,

        /// Artifact store directory
        #[arg(long, default_value = "models")]
        store: PathBuf,

        /// Frames each sample is padded/truncated to
        #[arg(long, default_value = "30")]
        seq_len: usize,

        #[arg(long, default_value = "50")]
        epochs: usize,

        #[arg(long, default_value = "16")]
        batch_size: usize,

        #[arg(long, default_value = "0.2")]
        validation_split: f32,

        #[arg(long, default_value = "0.05")]
        learning_rate: f32,

        #[arg(long, default_value = "64")]
        hidden_units: usize,

        /// Classifier family: pooled-mlp or frame-average
        #[arg(long, default_value = "pooled-mlp")]
        family: ModelFamily,

        /// Fix the random seed for a reproducible run
        #[arg(long)]
        seed: Option<u64>,

        /// Output the training report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Recognize one gesture sequence
    Recognize {
        /// Sequence JSON file (list of frames)
        #[arg(long)]
        sequence: PathBuf,

        /// Artifact store directory
        #[arg(long, default_value = "models")]
        store: PathBuf,

        /// Pin a specific artifact version instead of the latest
        #[arg(long)]
        model_version: Option<u64>,

        /// Confidence floor below which no gesture is reported
        #[arg(long, default_value_t = MIN_CONFIDENCE)]
        min_confidence: f32,

        /// Output as JSON
        #[arg(long)]
        json: bool,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List committed artifact versions
    Versions {
        /// Artifact store directory
        #[arg(long, default_value = "models")]
        store: PathBuf,
    },

    /// Generate a synthetic dataset for smoke-testing the pipeline
    Sample {
        /// Output dataset file
        #[arg(short, long, default_value = "sample_dataset.json")]
        output: PathBuf,

        /// Number of gesture words
        #[arg(long, default_value = "3")]
        words: usize,

        /// Samples per word
        #[arg(long, default_value = "5")]
        samples: usize,

        /// Frames per sample
        #[arg(long, default_value = "30")]
        frames: usize,

        /// Fix the random seed
        #[arg(long)]
        seed: Option<u64>,
    },
}

fn main() {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(args.command) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(command: Command) -> anyhow::Result<()> {
    match command {
        Command::Train {
            dataset,
            store,
            seq_len,
            epochs,
            batch_size,
            validation_split,
            learning_rate,
            hidden_units,
            family,
            seed,
            json,
        } => {
            let contents = std::fs::read_to_string(&dataset)?;
            let dataset: Dataset = serde_json::from_str(&contents)?;

            let config = TrainingConfig {
                sequence_length: seq_len,
                epochs,
                batch_size,
                validation_split,
                learning_rate,
                hidden_units,
                family,
                seed,
            };

            let store = ArtifactStore::open(&store)?;
            let report = handsign::train_and_publish(&store, &dataset, &config)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("Version:             {}", report.version);
                println!("Samples:             {}", report.samples);
                println!("Vocabulary:          {}", report.vocabulary.join(", "));
                println!("Accuracy:            {:.1}%", report.accuracy * 100.0);
                println!("Validation accuracy: {:.1}%", report.val_accuracy * 100.0);
            }
            Ok(())
        }

        Command::Recognize {
            sequence,
            store,
            model_version,
            min_confidence,
            json,
            output,
        } => {
            let contents = std::fs::read_to_string(&sequence)?;
            let sequence: Sequence = serde_json::from_str(&contents)?;

            let store = ArtifactStore::open(&store)?;
            let engine = InferenceEngine::new(&store).with_min_confidence(min_confidence);
            let outcome = engine.recognize(&sequence.frames, model_version)?;

            let output_str = if json {
                serde_json::to_string_pretty(&outcome)?
            } else {
                format_outcome(&outcome)
            };

            match output {
                Some(path) => std::fs::write(path, &output_str)?,
                None => println!("{}", output_str),
            }
            Ok(())
        }

        Command::Versions { store } => {
            let store = ArtifactStore::open(&store)?;
            let versions = store.versions()?;
            let latest = store.latest_version()?;

            if versions.is_empty() {
                println!("No artifacts published.");
            }
            for version in versions {
                let marker = if Some(version) == latest { "  (latest)" } else { "" };
                println!("{}{}", version, marker);
            }
            Ok(())
        }

        Command::Sample {
            output,
            words,
            samples,
            frames,
            seed,
        } => {
            let mut rng = match seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            };
            let dataset = synthetic_dataset(words, samples, frames, &mut rng);
            std::fs::write(&output, serde_json::to_string(&dataset)?)?;
            println!(
                "Wrote {} words x {} samples to {}",
                words,
                samples,
                output.display()
            );
            Ok(())
        }
    }
}

fn format_outcome(outcome: &handsign::InferenceOutcome) -> String {
    let mut s = String::new();
    match &outcome.recognition {
        handsign::Recognition::Gesture { label, confidence } => {
            s.push_str(&format!("Gesture:    {}\n", label));
            s.push_str(&format!("Confidence: {:.1}%\n", confidence * 100.0));
        }
        handsign::Recognition::NoGesture => {
            s.push_str("No detectable gesture.\n");
        }
    }
    let path = match outcome.path {
        handsign::PredictionPath::Learned => "learned classifier",
        handsign::PredictionPath::Heuristic => "heuristic fallback",
    };
    s.push_str(&format!("Path:       {}", path));
    if let Some(version) = outcome.version {
        s.push_str(&format!("\nModel:      version {}", version));
    }
    s
}

/// Synthetic gesture words: each word gets a distinct spatial anchor with
/// per-sample jitter, enough structure for a classifier to separate.
fn synthetic_dataset<R: Rng>(
    words: usize,
    samples: usize,
    frames: usize,
    rng: &mut R,
) -> Dataset {
    let mut dataset = Dataset::new();
    for w in 0..words {
        let label = format!("word-{}", w + 1);
        let anchor = 0.2 + 0.6 * w as f32 / words.max(1) as f32;
        for _ in 0..samples {
            let mut sample_frames = Vec::with_capacity(frames);
            for t in 0..frames {
                let phase = t as f32 / frames.max(1) as f32;
                let frame: Vec<f32> = (0..FEATURE_DIM)
                    .map(|i| {
                        let wave = (phase * std::f32::consts::TAU + i as f32 * 0.01).sin() * 0.05;
                        anchor + wave + rng.gen_range(-0.02..0.02)
                    })
                    .collect();
                sample_frames.push(frame);
            }
            dataset.insert(&label, Sequence::new(sample_frames));
        }
    }
    dataset
}

//! classify_image - run the classifier against a single image file
//!
//! Prints the coarse label plus the backend's top classes, and can
//! optionally run the detection simulator and write an annotated copy.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;

use aisle_finder::annotate;
use aisle_finder::classify::registry_from_settings;
use aisle_finder::config::ClassifierSettings;
use aisle_finder::sim::simulate_detections;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Path to the image file to classify.
    image: PathBuf,
    /// Classifier backend to use (stub or tract).
    #[arg(long, default_value = "stub")]
    backend: String,
    /// Path to an ONNX classifier model (tract backend).
    #[arg(long)]
    model_path: Option<PathBuf>,
    /// Path to the model's class label list (tract backend).
    #[arg(long)]
    labels_path: Option<PathBuf>,
    /// How many top classes to report.
    #[arg(long, default_value_t = 5)]
    top_k: usize,
    /// Also simulate object detections and write an annotated copy.
    #[arg(long)]
    simulate: bool,
    /// Seed for the detection simulator (random when omitted).
    #[arg(long)]
    seed: Option<u64>,
    /// Where to write the annotated JPEG (with --simulate).
    #[arg(long, default_value = "annotated.jpg")]
    out: PathBuf,
    /// TrueType font for detection labels (system fonts tried when omitted).
    #[arg(long)]
    font: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();

    let settings = ClassifierSettings {
        backend: args.backend.clone(),
        model_path: args.model_path.clone(),
        labels_path: args.labels_path.clone(),
        top_k: args.top_k,
    };
    let registry = registry_from_settings(&settings)?;

    let bytes = std::fs::read(&args.image)
        .with_context(|| format!("failed to read {}", args.image.display()))?;
    let frame = annotate::decode_image(&bytes)?;
    let (width, height) = frame.dimensions();

    let classification = registry.classify_with_default(frame.as_raw(), width, height)?;
    let label = classification.coarse_label();
    println!("label: {} (confidence {:.3})", label, classification.confidence());
    for entry in &classification.top {
        println!("  {:<32} {:.4}", entry.label, entry.score);
    }

    if args.simulate {
        let detections = match args.seed {
            Some(seed) => {
                let mut rng = StdRng::seed_from_u64(seed);
                simulate_detections(width, height, label.as_str(), &mut rng)
            }
            None => simulate_detections(width, height, label.as_str(), &mut rand::thread_rng()),
        };
        for detection in &detections {
            let [x1, y1, x2, y2] = detection.bbox;
            println!(
                "detected {} ({:.2}) at ({}, {}) - ({}, {})",
                detection.label, detection.confidence, x1, y1, x2, y2
            );
        }

        let font = annotate::load_font(args.font.as_deref());
        let annotated = annotate::draw_detections(&frame, &detections, font.as_ref());
        std::fs::write(&args.out, annotate::encode_jpeg(&annotated)?)
            .with_context(|| format!("failed to write {}", args.out.display()))?;
        println!("annotated image written to {}", args.out.display());
    }

    Ok(())
}

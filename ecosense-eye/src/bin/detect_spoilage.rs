//! Binary for running spoilage detection on an image file from the command line

use anyhow::Context;
use ecosense_eye::{VisionConfig, VisionEngine};
use std::env;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: detect_spoilage <image> [annotated_output] [config.toml]");
        std::process::exit(1);
    }

    let config = match args.get(3) {
        Some(path) => VisionConfig::load(path).with_context(|| format!("loading config {}", path))?,
        None => VisionConfig::default(),
    };
    let engine = VisionEngine::ready(config)?;

    let image = image::open(&args[1])
        .with_context(|| format!("decoding {}", args[1]))?
        .to_rgb8();
    let result = engine.detect_spoilage(&image)?;

    println!("{}", serde_json::to_string_pretty(&result)?);
    println!("Recommended action: {}", result.kind.recommended_action());

    if let Some(output) = args.get(2) {
        engine
            .annotate(&image, &result)
            .save(output)
            .with_context(|| format!("writing {}", output))?;
        println!("Annotated image written to {}", output);
    }

    Ok(())
}

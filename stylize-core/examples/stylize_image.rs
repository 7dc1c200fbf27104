//! Stylize a single image with a serialized model.
//!
//! Usage: `cargo run --example stylize_image -- model.tflite input.png output.png`

use std::env;
use std::fs;

use anyhow::{bail, Context, Result};
use image::imageops::FilterType;
use image::RgbaImage;
use stylize_core::importer::ensure_single_io;
use stylize_core::{StyleModel, StylePipeline};
use stylize_utils::gpu::{GpuAvailability, GpuContext, GpuContextOptions};

/// Pull the frame extent out of the model's declared input shape.
fn model_extent(model: &[u8]) -> Result<(u32, u32)> {
    let parsed = StyleModel::parse(model)?;
    let (input, _) = ensure_single_io(&parsed.subgraph())?;
    let shape = parsed.tensor_shape(&parsed.tensor(input)?);
    let [1, height, width, _] = shape[..] else {
        bail!("model input shape {shape:?} is not [1, height, width, channels]");
    };
    Ok((width as u32, height as u32))
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let [_, model_path, input_path, output_path] = &args[..] else {
        bail!("usage: stylize_image <model> <input image> <output image>");
    };

    let context = match GpuContext::init_with_fallback(&GpuContextOptions::default()) {
        GpuAvailability::Available(ctx) => ctx,
        GpuAvailability::Disabled { reason } => bail!("GPU disabled: {reason}"),
        GpuAvailability::Unavailable { error } => bail!("no usable GPU adapter: {error}"),
    };

    let model = fs::read(model_path).with_context(|| format!("reading {model_path}"))?;
    let (width, height) = model_extent(&model)?;
    let pipeline = StylePipeline::new(context, width, height, &model)?;
    println!(
        "Model imported: {}x{} frames on {}",
        pipeline.width(),
        pipeline.height(),
        stylize_core::version()
    );

    let source = image::open(input_path)
        .with_context(|| format!("opening {input_path}"))?
        .resize_exact(pipeline.width(), pipeline.height(), FilterType::Lanczos3)
        .to_rgba8();
    let mut pixels = source.into_raw();

    pipeline.process_rgba(&mut pixels)?;

    let styled = RgbaImage::from_raw(pipeline.width(), pipeline.height(), pixels)
        .context("styled frame has unexpected length")?;
    styled
        .save(output_path)
        .with_context(|| format!("writing {output_path}"))?;
    println!("Wrote {output_path}");
    Ok(())
}

//! Common helpers shared across the stylize crates.

/// Scalar linear/perceptual color-transfer math.
pub mod color;
/// Shared GPU context initialization and buffer pooling.
pub mod gpu;
/// Instrumentation helpers for optional performance tracing.
pub mod telemetry;

use std::path::Path;

use anyhow::Result;
use log::LevelFilter;

pub use color::{
    BRIGHTNESS_ADJUSTMENT, GAMMA_EXPONENT, linear_to_perceptual, perceptual_to_linear,
};
pub use gpu::{
    GpuAvailability, GpuBufferPool, GpuContext, GpuContextOptions, GpuInitError,
    pack_rgba_pixels, unpack_rgba_pixels,
};
pub use telemetry::{TimingGuard, timing_guard};

/// Initialize logging once for library consumers and examples.
///
/// Respects the `RUST_LOG` environment variable when set; otherwise falls
/// back to the provided default filter level.
pub fn init_logging(default_filter: LevelFilter) -> Result<()> {
    let mut builder = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(default_filter.as_str()),
    );
    builder.filter_module("stylize::telemetry", LevelFilter::Trace);

    if builder.try_init().is_err() {
        // Logger already initialized; nothing to do.
    }
    Ok(())
}

/// Validate that a path exists and resolve it to an absolute path.
pub fn normalize_path<P: AsRef<Path>>(path: P) -> Result<std::path::PathBuf> {
    let path = path.as_ref();
    anyhow::ensure!(path.exists(), "path does not exist: {}", path.display());
    Ok(path.canonicalize()?)
}

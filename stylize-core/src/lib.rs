//! GPU style-transfer runtime.
//!
//! This crate imports serialized style-transfer models, translates them into
//! a fixed sequence of WGSL compute dispatches with `wgpu`, and runs that
//! sequence against packed RGBA frames.

/// WGSL compute pipelines and tensor storage.
pub mod gpu;
/// Model-to-network translation.
pub mod importer;
/// Tensor stride arithmetic and kernel reordering.
pub mod layout;
/// The operation graph container.
pub mod network;
/// High-level frame processing.
pub mod pipeline;
/// Serialized model reading.
pub mod tflite;

pub use gpu::{
    ActivationKind, Channels, FrameConfig, GpuTensor, Padding2d, QuantizationInfo, SpatialDims,
    TensorShape,
};
pub use importer::{calculate_same_padding, import_style_model, ImportError, SupportedOperator};
pub use layout::TensorLayout;
pub use network::{ConvParams, DeconvParams, DepthwiseParams, StyleNetwork, TensorId};
pub use pipeline::StylePipeline;
pub use tflite::{ModelError, StyleModel};

/// Returns the crate version for diagnostics.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

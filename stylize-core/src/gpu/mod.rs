//! WGSL compute pipelines for the style-transfer operator set.
//!
//! Each module owns one shader family: the convolution variants, the
//! transposed convolution, the elementwise trio (activation, add, power),
//! spatial padding, and the two frame endpoints that bridge between the
//! packed RGBA buffer and float tensors.

pub(crate) mod conv2d;
pub(crate) mod deconv2d;
pub(crate) mod elementwise;
pub(crate) mod pad;
pub(crate) mod quantize;
pub(crate) mod step;
pub mod tensor;
pub mod utils;

pub use conv2d::{Channels, Conv2dConfig, DepthwiseConv2dConfig, Padding2d, SpatialDims};
pub use deconv2d::Deconv2dConfig;
pub use elementwise::ActivationKind;
pub use pad::PadConfig;
pub use quantize::{FrameConfig, QuantizationInfo};
pub use tensor::{GpuTensor, TensorShape};
pub use utils::{conv_output_dim, deconv_output_dim};

use super::conv2d::{build_conv_pipeline, conv_bind_group, Channels, Padding2d, SpatialDims};
use super::step::{Step, StepBinding};
use super::tensor::GpuTensor;
use super::utils::{create_uniform_buffer, deconv_output_dim};

use anyhow::{Context, Result};
use bytemuck::{Pod, Zeroable};

const DECONV2D_WGSL: &str = include_str!("deconv2d.wgsl");
const DECONV_WORKGROUP_X: u32 = 8;
const DECONV_WORKGROUP_Y: u32 = 8;

/// Geometry for a transposed convolution layer.
#[derive(Debug, Clone)]
pub struct Deconv2dConfig {
    pub input_channels: u32,
    pub output_channels: u32,
    pub input_width: u32,
    pub input_height: u32,
    pub kernel_width: u32,
    pub kernel_height: u32,
    pub stride_x: u32,
    pub stride_y: u32,
    pub padding: Padding2d,
    pub output_width: u32,
    pub output_height: u32,
}

impl Deconv2dConfig {
    pub fn new(
        channels: Channels,
        input: SpatialDims,
        kernel: SpatialDims,
        stride: SpatialDims,
        padding: Padding2d,
    ) -> Result<Self> {
        anyhow::ensure!(channels.input > 0, "input channels must be > 0");
        anyhow::ensure!(channels.output > 0, "output channels must be > 0");
        anyhow::ensure!(
            kernel.width > 0 && kernel.height > 0,
            "kernel must be non-zero"
        );
        anyhow::ensure!(
            stride.width > 0 && stride.height > 0,
            "stride must be non-zero"
        );

        let output_width = deconv_output_dim(
            input.width,
            padding.front_x,
            padding.back_x,
            kernel.width,
            stride.width,
        )
        .context("invalid transposed convolution width configuration")?;
        let output_height = deconv_output_dim(
            input.height,
            padding.front_y,
            padding.back_y,
            kernel.height,
            stride.height,
        )
        .context("invalid transposed convolution height configuration")?;

        Ok(Self {
            input_channels: channels.input,
            output_channels: channels.output,
            input_width: input.width,
            input_height: input.height,
            kernel_width: kernel.width,
            kernel_height: kernel.height,
            stride_x: stride.width,
            stride_y: stride.height,
            padding,
            output_width,
            output_height,
        })
    }

    pub fn output_dims(&self) -> [usize; 3] {
        [
            self.output_channels as usize,
            self.output_width as usize,
            self.output_height as usize,
        ]
    }

    pub fn validate(&self, input_len: usize, weight_len: usize, bias_len: usize) -> Result<()> {
        let expected_input =
            self.input_channels as usize * self.input_width as usize * self.input_height as usize;
        anyhow::ensure!(
            input_len == expected_input,
            "deconv input tensor expected {expected_input} elements, got {input_len}"
        );
        let expected_weights = self.input_channels as usize
            * self.kernel_width as usize
            * self.kernel_height as usize
            * self.output_channels as usize;
        anyhow::ensure!(
            weight_len == expected_weights,
            "deconv weights expected {expected_weights} elements, got {weight_len}"
        );
        anyhow::ensure!(
            bias_len == self.output_channels as usize,
            "deconv bias expected {} elements, got {bias_len}",
            self.output_channels
        );
        Ok(())
    }
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct Deconv2dUniforms {
    input_width: u32,
    input_height: u32,
    input_channels: u32,
    output_width: u32,
    output_height: u32,
    output_channels: u32,
    kernel_width: u32,
    kernel_height: u32,
    stride_x: u32,
    stride_y: u32,
    pad_x: u32,
    pad_y: u32,
}

impl From<&Deconv2dConfig> for Deconv2dUniforms {
    fn from(value: &Deconv2dConfig) -> Self {
        // The gather indexing offsets by the symmetric padding the output
        // formula trimmed, so the larger of front/back is used on each axis.
        Self {
            input_width: value.input_width,
            input_height: value.input_height,
            input_channels: value.input_channels,
            output_width: value.output_width,
            output_height: value.output_height,
            output_channels: value.output_channels,
            kernel_width: value.kernel_width,
            kernel_height: value.kernel_height,
            stride_x: value.stride_x,
            stride_y: value.stride_y,
            pad_x: value.padding.front_x.max(value.padding.back_x),
            pad_y: value.padding.front_y.max(value.padding.back_y),
        }
    }
}

#[derive(Debug)]
pub(crate) struct Deconv2dPipeline {
    pipeline: wgpu::ComputePipeline,
    bind_group_layout: wgpu::BindGroupLayout,
}

impl Deconv2dPipeline {
    pub(crate) fn new(device: &wgpu::Device) -> Result<Self> {
        let (pipeline, bind_group_layout) = build_conv_pipeline(device, "deconv2d", DECONV2D_WGSL);
        Ok(Self {
            pipeline,
            bind_group_layout,
        })
    }

    pub(crate) fn configure(
        &self,
        device: &wgpu::Device,
        input: &GpuTensor,
        weights: &GpuTensor,
        bias: &GpuTensor,
        output: &GpuTensor,
        config: &Deconv2dConfig,
    ) -> Step {
        let uniforms = Deconv2dUniforms::from(config);
        let uniform_buffer = create_uniform_buffer(device, "stylize_deconv2d_uniforms", &uniforms);
        let bind_group = conv_bind_group(
            device,
            "stylize_deconv2d_bg",
            &self.bind_group_layout,
            input,
            weights,
            bias,
            output,
            &uniform_buffer,
        );
        Step {
            label: "conv2d_transpose",
            pipeline: self.pipeline.clone(),
            binding: StepBinding::Ready(bind_group),
            workgroups: [
                config.output_width.div_ceil(DECONV_WORKGROUP_X),
                config.output_height.div_ceil(DECONV_WORKGROUP_Y),
                config.output_channels,
            ],
        }
    }
}

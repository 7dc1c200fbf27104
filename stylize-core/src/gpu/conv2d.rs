use super::step::{Step, StepBinding};
use super::tensor::GpuTensor;
use super::utils::{buffer_entry, conv_output_dim, create_uniform_buffer, uniform_entry};

use anyhow::{Context, Result};
use bytemuck::{Pod, Zeroable};

const CONV2D_WGSL: &str = include_str!("conv2d.wgsl");
const DEPTHWISE_WGSL: &str = include_str!("depthwise.wgsl");
const CONV_WORKGROUP_X: u32 = 8;
const CONV_WORKGROUP_Y: u32 = 8;

/// Input/output channel pair for a convolution layer.
#[derive(Debug, Clone, Copy)]
pub struct Channels {
    pub input: u32,
    pub output: u32,
}

impl Channels {
    pub const fn new(input: u32, output: u32) -> Self {
        Self { input, output }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SpatialDims {
    pub width: u32,
    pub height: u32,
}

impl SpatialDims {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub const fn square(extent: u32) -> Self {
        Self {
            width: extent,
            height: extent,
        }
    }
}

impl From<(u32, u32)> for SpatialDims {
    fn from(value: (u32, u32)) -> Self {
        Self {
            width: value.0,
            height: value.1,
        }
    }
}

/// Per-axis front/back padding amounts.
#[derive(Debug, Clone, Copy, Default)]
pub struct Padding2d {
    pub front_x: u32,
    pub back_x: u32,
    pub front_y: u32,
    pub back_y: u32,
}

impl Padding2d {
    pub const fn new(front_x: u32, back_x: u32, front_y: u32, back_y: u32) -> Self {
        Self {
            front_x,
            back_x,
            front_y,
            back_y,
        }
    }
}

/// Geometry for a convolution layer with resolved output extents.
#[derive(Debug, Clone)]
pub struct Conv2dConfig {
    pub input_channels: u32,
    pub output_channels: u32,
    pub input_width: u32,
    pub input_height: u32,
    pub kernel_width: u32,
    pub kernel_height: u32,
    pub stride_x: u32,
    pub stride_y: u32,
    pub dilation_x: u32,
    pub dilation_y: u32,
    pub padding: Padding2d,
    pub fused_relu: bool,
    pub output_width: u32,
    pub output_height: u32,
}

impl Conv2dConfig {
    pub fn new(
        channels: Channels,
        input: SpatialDims,
        kernel: SpatialDims,
        stride: SpatialDims,
        dilation: SpatialDims,
        padding: Padding2d,
        fused_relu: bool,
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

        let output_width = conv_output_dim(
            input.width,
            padding.front_x,
            padding.back_x,
            kernel.width,
            stride.width,
            dilation.width,
        )
        .context("invalid convolution width configuration")?;
        let output_height = conv_output_dim(
            input.height,
            padding.front_y,
            padding.back_y,
            kernel.height,
            stride.height,
            dilation.height,
        )
        .context("invalid convolution height configuration")?;

        Ok(Self {
            input_channels: channels.input,
            output_channels: channels.output,
            input_width: input.width,
            input_height: input.height,
            kernel_width: kernel.width,
            kernel_height: kernel.height,
            stride_x: stride.width,
            stride_y: stride.height,
            dilation_x: dilation.width,
            dilation_y: dilation.height,
            padding,
            fused_relu,
            output_width,
            output_height,
        })
    }

    /// Output shape in channel-minor order.
    pub fn output_dims(&self) -> [usize; 3] {
        [
            self.output_channels as usize,
            self.output_width as usize,
            self.output_height as usize,
        ]
    }

    /// Check tensor element counts against this geometry.
    pub fn validate(&self, input_len: usize, weight_len: usize, bias_len: usize) -> Result<()> {
        let expected_input =
            self.input_channels as usize * self.input_width as usize * self.input_height as usize;
        anyhow::ensure!(
            input_len == expected_input,
            "conv input tensor expected {expected_input} elements, got {input_len}"
        );
        let expected_weights = self.output_channels as usize
            * self.kernel_width as usize
            * self.kernel_height as usize
            * self.input_channels as usize;
        anyhow::ensure!(
            weight_len == expected_weights,
            "conv weights expected {expected_weights} elements, got {weight_len}"
        );
        anyhow::ensure!(
            bias_len == self.output_channels as usize,
            "conv bias expected {} elements, got {bias_len}",
            self.output_channels
        );
        Ok(())
    }
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct Conv2dUniforms {
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
    dilation_x: u32,
    dilation_y: u32,
    pad_x: u32,
    pad_y: u32,
    activation_mode: u32,
    _pad: u32,
}

impl From<&Conv2dConfig> for Conv2dUniforms {
    fn from(value: &Conv2dConfig) -> Self {
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
            dilation_x: value.dilation_x,
            dilation_y: value.dilation_y,
            pad_x: value.padding.front_x,
            pad_y: value.padding.front_y,
            activation_mode: value.fused_relu as u32,
            _pad: 0,
        }
    }
}

#[derive(Debug)]
pub(crate) struct Conv2dPipeline {
    pipeline: wgpu::ComputePipeline,
    bind_group_layout: wgpu::BindGroupLayout,
}

impl Conv2dPipeline {
    pub(crate) fn new(device: &wgpu::Device) -> Result<Self> {
        let (pipeline, bind_group_layout) = build_conv_pipeline(device, "conv2d", CONV2D_WGSL);
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
        config: &Conv2dConfig,
    ) -> Step {
        let uniforms = Conv2dUniforms::from(config);
        let uniform_buffer = create_uniform_buffer(device, "stylize_conv2d_uniforms", &uniforms);
        let bind_group = conv_bind_group(
            device,
            "stylize_conv2d_bg",
            &self.bind_group_layout,
            input,
            weights,
            bias,
            output,
            &uniform_buffer,
        );
        Step {
            label: "conv2d",
            pipeline: self.pipeline.clone(),
            binding: StepBinding::Ready(bind_group),
            workgroups: [
                config.output_width.div_ceil(CONV_WORKGROUP_X),
                config.output_height.div_ceil(CONV_WORKGROUP_Y),
                config.output_channels,
            ],
        }
    }
}

/// Geometry for a depthwise convolution (depth multiplier 1).
#[derive(Debug, Clone)]
pub struct DepthwiseConv2dConfig {
    pub channels: u32,
    pub input_width: u32,
    pub input_height: u32,
    pub kernel_width: u32,
    pub kernel_height: u32,
    pub stride_x: u32,
    pub stride_y: u32,
    pub dilation_x: u32,
    pub dilation_y: u32,
    pub padding: Padding2d,
    pub fused_relu: bool,
    pub output_width: u32,
    pub output_height: u32,
}

impl DepthwiseConv2dConfig {
    pub fn new(
        channels: u32,
        input: SpatialDims,
        kernel: SpatialDims,
        stride: SpatialDims,
        dilation: SpatialDims,
        padding: Padding2d,
        fused_relu: bool,
    ) -> Result<Self> {
        anyhow::ensure!(channels > 0, "channels must be > 0");
        anyhow::ensure!(
            kernel.width > 0 && kernel.height > 0,
            "kernel must be non-zero"
        );
        anyhow::ensure!(
            stride.width > 0 && stride.height > 0,
            "stride must be non-zero"
        );

        let output_width = conv_output_dim(
            input.width,
            padding.front_x,
            padding.back_x,
            kernel.width,
            stride.width,
            dilation.width,
        )
        .context("invalid depthwise convolution width configuration")?;
        let output_height = conv_output_dim(
            input.height,
            padding.front_y,
            padding.back_y,
            kernel.height,
            stride.height,
            dilation.height,
        )
        .context("invalid depthwise convolution height configuration")?;

        Ok(Self {
            channels,
            input_width: input.width,
            input_height: input.height,
            kernel_width: kernel.width,
            kernel_height: kernel.height,
            stride_x: stride.width,
            stride_y: stride.height,
            dilation_x: dilation.width,
            dilation_y: dilation.height,
            padding,
            fused_relu,
            output_width,
            output_height,
        })
    }

    pub fn output_dims(&self) -> [usize; 3] {
        [
            self.channels as usize,
            self.output_width as usize,
            self.output_height as usize,
        ]
    }

    pub fn validate(&self, input_len: usize, weight_len: usize, bias_len: usize) -> Result<()> {
        let expected_input =
            self.channels as usize * self.input_width as usize * self.input_height as usize;
        anyhow::ensure!(
            input_len == expected_input,
            "depthwise input tensor expected {expected_input} elements, got {input_len}"
        );
        let expected_weights =
            self.kernel_width as usize * self.kernel_height as usize * self.channels as usize;
        anyhow::ensure!(
            weight_len == expected_weights,
            "depthwise weights expected {expected_weights} elements, got {weight_len}"
        );
        anyhow::ensure!(
            bias_len == self.channels as usize,
            "depthwise bias expected {} elements, got {bias_len}",
            self.channels
        );
        Ok(())
    }
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct DepthwiseUniforms {
    input_width: u32,
    input_height: u32,
    channels: u32,
    output_width: u32,
    output_height: u32,
    kernel_width: u32,
    kernel_height: u32,
    stride_x: u32,
    stride_y: u32,
    dilation_x: u32,
    dilation_y: u32,
    pad_x: u32,
    pad_y: u32,
    activation_mode: u32,
    _pad0: u32,
    _pad1: u32,
}

impl From<&DepthwiseConv2dConfig> for DepthwiseUniforms {
    fn from(value: &DepthwiseConv2dConfig) -> Self {
        Self {
            input_width: value.input_width,
            input_height: value.input_height,
            channels: value.channels,
            output_width: value.output_width,
            output_height: value.output_height,
            kernel_width: value.kernel_width,
            kernel_height: value.kernel_height,
            stride_x: value.stride_x,
            stride_y: value.stride_y,
            dilation_x: value.dilation_x,
            dilation_y: value.dilation_y,
            pad_x: value.padding.front_x,
            pad_y: value.padding.front_y,
            activation_mode: value.fused_relu as u32,
            _pad0: 0,
            _pad1: 0,
        }
    }
}

#[derive(Debug)]
pub(crate) struct DepthwiseConv2dPipeline {
    pipeline: wgpu::ComputePipeline,
    bind_group_layout: wgpu::BindGroupLayout,
}

impl DepthwiseConv2dPipeline {
    pub(crate) fn new(device: &wgpu::Device) -> Result<Self> {
        let (pipeline, bind_group_layout) = build_conv_pipeline(device, "depthwise", DEPTHWISE_WGSL);
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
        config: &DepthwiseConv2dConfig,
    ) -> Step {
        let uniforms = DepthwiseUniforms::from(config);
        let uniform_buffer = create_uniform_buffer(device, "stylize_depthwise_uniforms", &uniforms);
        let bind_group = conv_bind_group(
            device,
            "stylize_depthwise_bg",
            &self.bind_group_layout,
            input,
            weights,
            bias,
            output,
            &uniform_buffer,
        );
        Step {
            label: "depthwise_conv2d",
            pipeline: self.pipeline.clone(),
            binding: StepBinding::Ready(bind_group),
            workgroups: [
                config.output_width.div_ceil(CONV_WORKGROUP_X),
                config.output_height.div_ceil(CONV_WORKGROUP_Y),
                config.channels,
            ],
        }
    }
}

pub(super) fn build_conv_pipeline(
    device: &wgpu::Device,
    name: &str,
    source: &str,
) -> (wgpu::ComputePipeline, wgpu::BindGroupLayout) {
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(&format!("stylize_{name}_shader")),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    });

    let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some(&format!("stylize_{name}_bgl")),
        entries: &[
            buffer_entry(0, wgpu::BufferBindingType::Storage { read_only: true }),
            buffer_entry(1, wgpu::BufferBindingType::Storage { read_only: true }),
            buffer_entry(2, wgpu::BufferBindingType::Storage { read_only: true }),
            buffer_entry(3, wgpu::BufferBindingType::Storage { read_only: false }),
            uniform_entry(4),
        ],
    });

    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(&format!("stylize_{name}_pipeline_layout")),
        bind_group_layouts: &[&bind_group_layout],
        push_constant_ranges: &[],
    });

    let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
        label: Some(&format!("stylize_{name}_pipeline")),
        layout: Some(&pipeline_layout),
        module: &shader,
        entry_point: Some("main"),
        compilation_options: wgpu::PipelineCompilationOptions::default(),
        cache: None,
    });

    (pipeline, bind_group_layout)
}

#[allow(clippy::too_many_arguments)]
pub(super) fn conv_bind_group(
    device: &wgpu::Device,
    label: &str,
    layout: &wgpu::BindGroupLayout,
    input: &GpuTensor,
    weights: &GpuTensor,
    bias: &GpuTensor,
    output: &GpuTensor,
    uniforms: &wgpu::Buffer,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(label),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: input.buffer().as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: weights.buffer().as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: bias.buffer().as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 3,
                resource: output.buffer().as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 4,
                resource: uniforms.as_entire_binding(),
            },
        ],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn same_padding(kernel: u32) -> Padding2d {
        let pad = (kernel - 1) / 2;
        Padding2d::new(pad, kernel - 1 - pad, pad, kernel - 1 - pad)
    }

    #[test]
    fn unit_stride_same_padding_preserves_extent() {
        let config = Conv2dConfig::new(
            Channels::new(3, 16),
            SpatialDims::square(256),
            SpatialDims::square(3),
            SpatialDims::square(1),
            SpatialDims::square(1),
            same_padding(3),
            false,
        )
        .expect("config");
        assert_eq!(config.output_dims(), [16, 256, 256]);
    }

    #[test]
    fn validate_flags_wrong_weight_count() {
        let config = Conv2dConfig::new(
            Channels::new(3, 8),
            SpatialDims::square(32),
            SpatialDims::square(3),
            SpatialDims::square(1),
            SpatialDims::square(1),
            same_padding(3),
            false,
        )
        .expect("config");
        assert!(config.validate(3 * 32 * 32, 8 * 3 * 3 * 3, 8).is_ok());
        assert!(config.validate(3 * 32 * 32, 8 * 3 * 3, 8).is_err());
        assert!(config.validate(3 * 32 * 32, 8 * 3 * 3 * 3, 4).is_err());
    }

    #[test]
    fn depthwise_validate_uses_per_channel_weights() {
        let config = DepthwiseConv2dConfig::new(
            16,
            SpatialDims::square(64),
            SpatialDims::square(3),
            SpatialDims::square(2),
            SpatialDims::square(1),
            Padding2d::new(0, 1, 0, 1),
            true,
        )
        .expect("config");
        assert_eq!(config.output_dims(), [16, 32, 32]);
        assert!(config.validate(16 * 64 * 64, 3 * 3 * 16, 16).is_ok());
        assert!(config.validate(16 * 64 * 64, 3 * 3 * 16 * 16, 16).is_err());
    }
}

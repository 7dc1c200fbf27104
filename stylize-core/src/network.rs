//! The operation graph container.
//!
//! A [`StyleNetwork`] owns every tensor and configured operation the importer
//! creates. Tensors live in a single arena and are referenced by [`TensorId`]
//! handles; operations are recorded as [`Step`]s and executed strictly in
//! insertion order, once per [`run`](StyleNetwork::run).
//!
//! Every `add_*` method validates its configuration before configuring it,
//! but a validation failure is advisory: it is logged and the operation is
//! configured anyway, matching the compute-runtime convention where validate
//! and configure are distinct calls and only configure is binding.

use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use log::{debug, error, Level};
use stylize_utils::gpu::{GpuBufferPool, GpuContext};
use stylize_utils::telemetry;

use crate::gpu::conv2d::{Channels, Conv2dConfig, Conv2dPipeline, DepthwiseConv2dConfig, DepthwiseConv2dPipeline, Padding2d, SpatialDims};
use crate::gpu::deconv2d::{Deconv2dConfig, Deconv2dPipeline};
use crate::gpu::elementwise::{ActivationKind, ActivationPipeline, AddPipeline, PowerPipeline};
use crate::gpu::pad::{PadConfig, PadPipeline};
use crate::gpu::quantize::{DequantizePipeline, FrameConfig, QuantizePipeline};
use crate::gpu::step::Step;
use crate::gpu::tensor::GpuTensor;
use stylize_utils::color::{
    BRIGHTNESS_ADJUSTMENT, DECODE_OFFSET, ENCODE_OFFSET, ENCODE_SCALE, GAMMA_EXPONENT,
};

/// Stable handle to a tensor in the network's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TensorId(usize);

/// Parameters for a regular convolution layer.
#[derive(Debug, Clone)]
pub struct ConvParams {
    pub output_channels: u32,
    pub kernel: SpatialDims,
    pub stride: SpatialDims,
    pub dilation: SpatialDims,
    pub padding: Padding2d,
    pub fused_relu: bool,
}

/// Parameters for a depthwise convolution layer.
#[derive(Debug, Clone)]
pub struct DepthwiseParams {
    pub kernel: SpatialDims,
    pub stride: SpatialDims,
    pub dilation: SpatialDims,
    pub padding: Padding2d,
    pub fused_relu: bool,
}

/// Parameters for a transposed convolution layer.
#[derive(Debug, Clone)]
pub struct DeconvParams {
    pub output_channels: u32,
    pub kernel: SpatialDims,
    pub stride: SpatialDims,
    pub padding: Padding2d,
}

struct Pipelines {
    conv2d: Conv2dPipeline,
    depthwise: DepthwiseConv2dPipeline,
    deconv2d: Deconv2dPipeline,
    activation: ActivationPipeline,
    add: AddPipeline,
    power: PowerPipeline,
    pad: PadPipeline,
    dequantize: DequantizePipeline,
    quantize: QuantizePipeline,
}

impl Pipelines {
    fn new(device: &wgpu::Device) -> Result<Self> {
        Ok(Self {
            conv2d: Conv2dPipeline::new(device)?,
            depthwise: DepthwiseConv2dPipeline::new(device)?,
            deconv2d: Deconv2dPipeline::new(device)?,
            activation: ActivationPipeline::new(device)?,
            add: AddPipeline::new(device)?,
            power: PowerPipeline::new(device)?,
            pad: PadPipeline::new(device)?,
            dequantize: DequantizePipeline::new(device)?,
            quantize: QuantizePipeline::new(device)?,
        })
    }
}

/// Ordered list of configured operations plus the tensors they touch.
pub struct StyleNetwork {
    context: Arc<GpuContext>,
    pool: Arc<GpuBufferPool>,
    pipelines: Pipelines,
    tensors: Vec<GpuTensor>,
    steps: Vec<Step>,
    frame: Option<FrameConfig>,
}

impl StyleNetwork {
    pub fn new(context: Arc<GpuContext>) -> Result<Self> {
        let pipelines = Pipelines::new(context.device())?;
        let pool = Arc::new(GpuBufferPool::new(context.clone(), None));
        Ok(Self {
            context,
            pool,
            pipelines,
            tensors: Vec::new(),
            steps: Vec::new(),
            frame: None,
        })
    }

    /// Allocate a new float tensor of the given channel-minor shape.
    pub fn create_tensor(&mut self, dims: &[usize]) -> Result<TensorId> {
        let tensor = GpuTensor::uninitialized_with_pool(
            self.context.clone(),
            Some(self.pool.clone()),
            dims,
            Some("stylize_net_tensor"),
        )?;
        self.tensors.push(tensor);
        Ok(TensorId(self.tensors.len() - 1))
    }

    /// Shape of a previously created tensor.
    pub fn tensor_dims(&self, id: TensorId) -> Result<&[usize]> {
        Ok(self.lookup(id)?.shape().dims())
    }

    /// Replace a tensor's contents with the provided values.
    pub fn set_tensor_values(&self, id: TensorId, values: &[f32]) -> Result<()> {
        self.lookup(id)?.write(values)
    }

    /// Write a single scalar to every element of a tensor.
    pub fn fill_tensor(&self, id: TensorId, value: f32) -> Result<()> {
        let tensor = self.lookup(id)?;
        let data = vec![value; tensor.shape().elements()];
        tensor.write(&data)
    }

    /// Download a tensor's contents, mainly for tests and debugging.
    pub fn read_tensor(&self, id: TensorId) -> Result<Vec<f32>> {
        self.lookup(id)?.to_vec()
    }

    /// Number of configured operations.
    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    /// Frame geometry established by [`add_dequantization`](Self::add_dequantization).
    pub fn frame_config(&self) -> Option<&FrameConfig> {
        self.frame.as_ref()
    }

    /// Unpack the caller's RGBA frame into a new float tensor. Must be the
    /// first operation; establishes the frame geometry for the network.
    pub fn add_dequantization(&mut self, frame: FrameConfig) -> Result<TensorId> {
        anyhow::ensure!(
            self.frame.is_none(),
            "dequantization endpoint already configured"
        );
        let output = self.create_tensor(&frame.tensor_dims())?;
        let step = self.pipelines.dequantize.configure(
            self.context.device(),
            self.lookup(output)?,
            &frame,
        );
        self.steps.push(step);
        self.frame = Some(frame);
        Ok(output)
    }

    /// Pack a float tensor back into the caller's RGBA frame. Terminal
    /// operation; produces no new tensor.
    pub fn add_quantization(&mut self, input: TensorId) -> Result<()> {
        let frame = self
            .frame
            .clone()
            .ok_or_else(|| anyhow!("quantization requires a dequantization endpoint first"))?;
        if let Err(err) = self.validate_quantization(input, &frame) {
            self.advise("quantize", &err);
        }
        let step =
            self.pipelines
                .quantize
                .configure(self.context.device(), self.lookup(input)?, &frame);
        self.steps.push(step);
        Ok(())
    }

    /// Elementwise activation over a tensor.
    pub fn add_activation(&mut self, input: TensorId, kind: ActivationKind) -> Result<TensorId> {
        let dims = self.tensor_dims(input)?.to_vec();
        let output = self.create_tensor(&dims)?;
        let step = self.pipelines.activation.configure(
            self.context.device(),
            self.lookup(input)?,
            self.lookup(output)?,
            kind,
        );
        self.steps.push(step);
        Ok(output)
    }

    /// Elementwise addition of two tensors of identical shape.
    pub fn add_addition(
        &mut self,
        lhs: TensorId,
        rhs: TensorId,
        fused_relu: bool,
    ) -> Result<TensorId> {
        if let Err(err) = self.validate_addition(lhs, rhs) {
            self.advise("add", &err);
        }
        let dims = self.tensor_dims(lhs)?.to_vec();
        let output = self.create_tensor(&dims)?;
        let step = self.pipelines.add.configure(
            self.context.device(),
            self.lookup(lhs)?,
            self.lookup(rhs)?,
            self.lookup(output)?,
            fused_relu,
        );
        self.steps.push(step);
        Ok(output)
    }

    /// Elementwise `post_scale * max(x, 0) ^ exponent + post_offset`.
    pub fn add_power(
        &mut self,
        input: TensorId,
        exponent: f32,
        post_scale: f32,
        post_offset: f32,
    ) -> Result<TensorId> {
        let dims = self.tensor_dims(input)?.to_vec();
        let exponent_id = self.create_tensor(&[1])?;
        self.set_tensor_values(exponent_id, &[exponent])?;
        let output = self.create_tensor(&dims)?;
        let step = self.pipelines.power.configure(
            self.context.device(),
            self.lookup(input)?,
            self.lookup(exponent_id)?,
            self.lookup(output)?,
            post_scale,
            post_offset,
        );
        self.steps.push(step);
        Ok(output)
    }

    /// Gamma-encode a linear tensor: scale into `[0, 1]` with the brightness
    /// multiplier, then apply the perceptual power curve.
    pub fn add_linear_to_srgb(&mut self, input: TensorId) -> Result<TensorId> {
        let normalized = self.add_activation(
            input,
            ActivationKind::Linear {
                a: BRIGHTNESS_ADJUSTMENT / 255.0,
                b: 0.0,
            },
        )?;
        self.add_power(normalized, 1.0 / GAMMA_EXPONENT, ENCODE_SCALE, ENCODE_OFFSET)
    }

    /// Decode a gamma-encoded tensor back to linear intensities.
    pub fn add_srgb_to_linear(&mut self, input: TensorId) -> Result<TensorId> {
        let normalized = self.add_activation(
            input,
            ActivationKind::Linear {
                a: 1.0 / ENCODE_SCALE,
                b: DECODE_OFFSET / (1.0 + DECODE_OFFSET),
            },
        )?;
        self.add_power(normalized, GAMMA_EXPONENT, 255.0, 0.0)
    }

    /// Spatial constant padding.
    pub fn add_pad(&mut self, input: TensorId, padding: Padding2d, fill: f32) -> Result<TensorId> {
        let [channels, width, height] = self.spatial_dims(input)?;
        let config = PadConfig::new(channels, width, height, padding, fill)?;
        if let Err(err) = config.validate(self.lookup(input)?.shape().elements()) {
            self.advise("pad", &err);
        }
        let output = self.create_tensor(&config.output_dims())?;
        let step = self.pipelines.pad.configure(
            self.context.device(),
            self.lookup(input)?,
            self.lookup(output)?,
            &config,
        );
        self.steps.push(step);
        Ok(output)
    }

    /// 2D convolution with learned weights (output-feature-major layout)
    /// and bias.
    pub fn add_conv2d(
        &mut self,
        input: TensorId,
        weights: &[f32],
        bias: &[f32],
        params: &ConvParams,
    ) -> Result<TensorId> {
        let [channels, width, height] = self.spatial_dims(input)?;
        let config = Conv2dConfig::new(
            Channels::new(channels, params.output_channels),
            SpatialDims::new(width, height),
            params.kernel,
            params.stride,
            params.dilation,
            params.padding,
            params.fused_relu,
        )?;
        if let Err(err) = config.validate(
            self.lookup(input)?.shape().elements(),
            weights.len(),
            bias.len(),
        ) {
            self.advise("conv2d", &err);
        }

        let weight_tensor = self.upload_constant(weights, "stylize_conv2d_weights")?;
        let bias_tensor = self.upload_constant(bias, "stylize_conv2d_bias")?;
        let output = self.create_tensor(&config.output_dims())?;
        let step = self.pipelines.conv2d.configure(
            self.context.device(),
            self.lookup(input)?,
            self.lookup(weight_tensor)?,
            self.lookup(bias_tensor)?,
            self.lookup(output)?,
            &config,
        );
        self.steps.push(step);
        Ok(output)
    }

    /// Depthwise convolution (depth multiplier 1) with channel-minor weights.
    pub fn add_depthwise_conv2d(
        &mut self,
        input: TensorId,
        weights: &[f32],
        bias: &[f32],
        params: &DepthwiseParams,
    ) -> Result<TensorId> {
        let [channels, width, height] = self.spatial_dims(input)?;
        let config = DepthwiseConv2dConfig::new(
            channels,
            SpatialDims::new(width, height),
            params.kernel,
            params.stride,
            params.dilation,
            params.padding,
            params.fused_relu,
        )?;
        if let Err(err) = config.validate(
            self.lookup(input)?.shape().elements(),
            weights.len(),
            bias.len(),
        ) {
            self.advise("depthwise_conv2d", &err);
        }

        let weight_tensor = self.upload_constant(weights, "stylize_depthwise_weights")?;
        let bias_tensor = self.upload_constant(bias, "stylize_depthwise_bias")?;
        let output = self.create_tensor(&config.output_dims())?;
        let step = self.pipelines.depthwise.configure(
            self.context.device(),
            self.lookup(input)?,
            self.lookup(weight_tensor)?,
            self.lookup(bias_tensor)?,
            self.lookup(output)?,
            &config,
        );
        self.steps.push(step);
        Ok(output)
    }

    /// Transposed convolution with input-channel-major weights.
    pub fn add_conv2d_transpose(
        &mut self,
        input: TensorId,
        weights: &[f32],
        bias: &[f32],
        params: &DeconvParams,
    ) -> Result<TensorId> {
        let [channels, width, height] = self.spatial_dims(input)?;
        let config = Deconv2dConfig::new(
            Channels::new(channels, params.output_channels),
            SpatialDims::new(width, height),
            params.kernel,
            params.stride,
            params.padding,
        )?;
        if let Err(err) = config.validate(
            self.lookup(input)?.shape().elements(),
            weights.len(),
            bias.len(),
        ) {
            self.advise("conv2d_transpose", &err);
        }

        let weight_tensor = self.upload_constant(weights, "stylize_deconv2d_weights")?;
        let bias_tensor = self.upload_constant(bias, "stylize_deconv2d_bias")?;
        let output = self.create_tensor(&config.output_dims())?;
        let step = self.pipelines.deconv2d.configure(
            self.context.device(),
            self.lookup(input)?,
            self.lookup(weight_tensor)?,
            self.lookup(bias_tensor)?,
            self.lookup(output)?,
            &config,
        );
        self.steps.push(step);
        Ok(output)
    }

    /// Execute every configured operation in insertion order against the
    /// provided frame buffer, blocking until the queue drains.
    pub fn run(&self, frame: &wgpu::Buffer) -> Result<()> {
        let _guard = telemetry::timing_guard("network_run", Level::Debug);
        anyhow::ensure!(!self.steps.is_empty(), "network has no configured operations");
        if let Some(config) = &self.frame {
            anyhow::ensure!(
                frame.size() >= config.frame_bytes(),
                "frame buffer holds {} bytes, network expects at least {}",
                frame.size(),
                config.frame_bytes()
            );
        }

        let device = self.context.device();
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("stylize_network_encoder"),
        });

        for step in &self.steps {
            let bind_group = step.bind_group(device, frame);
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some(step.label),
                timestamp_writes: None,
            });
            pass.set_pipeline(&step.pipeline);
            pass.set_bind_group(0, &bind_group, &[]);
            pass.dispatch_workgroups(step.workgroups[0], step.workgroups[1], step.workgroups[2]);
        }

        self.context.queue().submit(Some(encoder.finish()));
        self.context
            .device()
            .poll(wgpu::PollType::Wait {
                submission_index: None,
                timeout: None,
            })
            .map_err(|e| anyhow!("device poll failed while draining network queue: {e}"))?;
        debug!(
            target: "stylize::network",
            "Executed {} operations", self.steps.len()
        );
        Ok(())
    }

    fn lookup(&self, id: TensorId) -> Result<&GpuTensor> {
        self.tensors
            .get(id.0)
            .with_context(|| format!("tensor handle {} is not in this network", id.0))
    }

    fn spatial_dims(&self, id: TensorId) -> Result<[u32; 3]> {
        let dims = self.tensor_dims(id)?;
        anyhow::ensure!(
            dims.len() == 3,
            "operation requires a [channels, width, height] tensor, got {dims:?}"
        );
        Ok([dims[0] as u32, dims[1] as u32, dims[2] as u32])
    }

    fn upload_constant(&mut self, values: &[f32], label: &str) -> Result<TensorId> {
        let tensor = GpuTensor::from_slice_with_pool(
            self.context.clone(),
            Some(self.pool.clone()),
            [values.len()],
            values,
            Some(label),
        )?;
        self.tensors.push(tensor);
        Ok(TensorId(self.tensors.len() - 1))
    }

    /// Report a validation failure without blocking configuration. Validation
    /// results are advisory by convention here; only configure is binding.
    fn advise(&self, operation: &str, err: &anyhow::Error) {
        error!(
            target: "stylize::network",
            "{operation} validation failed: {err:#}; configuring anyway"
        );
    }

    fn validate_addition(&self, lhs: TensorId, rhs: TensorId) -> Result<()> {
        let lhs_dims = self.tensor_dims(lhs)?;
        let rhs_dims = self.tensor_dims(rhs)?;
        anyhow::ensure!(
            lhs_dims == rhs_dims,
            "addition operands have mismatched shapes {lhs_dims:?} vs {rhs_dims:?}"
        );
        Ok(())
    }

    fn validate_quantization(&self, input: TensorId, frame: &FrameConfig) -> Result<()> {
        let dims = self.tensor_dims(input)?;
        let expected = frame.tensor_dims();
        anyhow::ensure!(
            dims == expected,
            "quantization input shape {dims:?} does not match frame shape {expected:?}"
        );
        Ok(())
    }
}

impl std::fmt::Debug for StyleNetwork {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StyleNetwork")
            .field("tensors", &self.tensors.len())
            .field("steps", &self.steps.len())
            .field("frame", &self.frame)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::quantize::QuantizationInfo;
    use stylize_utils::gpu::{pack_rgba_pixels, unpack_rgba_pixels, GpuAvailability, GpuContextOptions};

    fn test_context() -> Option<Arc<GpuContext>> {
        match GpuContext::init_with_fallback(&GpuContextOptions::default()) {
            GpuAvailability::Available(ctx) => Some(ctx),
            other => {
                eprintln!("Skipping GPU network test: {other:?}");
                None
            }
        }
    }

    fn frame_buffer(ctx: &Arc<GpuContext>, pixels: &[u8]) -> wgpu::Buffer {
        use wgpu::util::DeviceExt;
        let packed = pack_rgba_pixels(pixels);
        ctx.device()
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("test_frame"),
                contents: bytemuck::cast_slice(&packed),
                usage: wgpu::BufferUsages::STORAGE
                    | wgpu::BufferUsages::COPY_SRC
                    | wgpu::BufferUsages::COPY_DST,
            })
    }

    fn read_frame(ctx: &Arc<GpuContext>, buffer: &wgpu::Buffer, pixels: usize) -> Vec<u8> {
        let device = ctx.device();
        let size = (pixels * 4) as u64;
        let staging = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("test_frame_readback"),
            size,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("test_frame_readback_encoder"),
        });
        encoder.copy_buffer_to_buffer(buffer, 0, &staging, 0, size);
        ctx.queue().submit(Some(encoder.finish()));

        let slice = staging.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        device
            .poll(wgpu::PollType::Wait {
                submission_index: None,
                timeout: None,
            })
            .expect("poll for frame readback");
        rx.recv().expect("map callback").expect("map frame staging");
        let words: Vec<u32> = bytemuck::cast_slice(&slice.get_mapped_range()).to_vec();
        staging.unmap();
        unpack_rgba_pixels(&words)
    }

    fn identity_frame(width: u32, height: u32) -> FrameConfig {
        FrameConfig::new(width, height, 3, QuantizationInfo::default()).expect("frame config")
    }

    #[test]
    fn dequantize_unpacks_color_channels() {
        let Some(ctx) = test_context() else {
            return;
        };
        let mut network = StyleNetwork::new(ctx.clone()).expect("network");
        let input = network
            .add_dequantization(identity_frame(2, 2))
            .expect("dequantize");
        let pixels: Vec<u8> = vec![
            10, 20, 30, 255, 40, 50, 60, 255, 70, 80, 90, 255, 100, 110, 120, 255,
        ];
        let frame = frame_buffer(&ctx, &pixels);
        network.run(&frame).expect("run");

        let values = network.read_tensor(input).expect("read");
        assert_eq!(values.len(), 12);
        assert_eq!(&values[0..3], &[10.0, 20.0, 30.0]);
        assert_eq!(&values[9..12], &[100.0, 110.0, 120.0]);
    }

    #[test]
    fn quantize_round_trips_and_preserves_alpha() {
        let Some(ctx) = test_context() else {
            return;
        };
        let mut network = StyleNetwork::new(ctx.clone()).expect("network");
        let input = network
            .add_dequantization(identity_frame(2, 1))
            .expect("dequantize");
        network.add_quantization(input).expect("quantize");

        let pixels: Vec<u8> = vec![5, 6, 7, 200, 250, 251, 252, 77];
        let frame = frame_buffer(&ctx, &pixels);
        network.run(&frame).expect("run");
        assert_eq!(read_frame(&ctx, &frame, 2), pixels);
    }

    #[test]
    fn addition_doubles_the_frame() {
        let Some(ctx) = test_context() else {
            return;
        };
        let mut network = StyleNetwork::new(ctx.clone()).expect("network");
        let input = network
            .add_dequantization(identity_frame(1, 1))
            .expect("dequantize");
        let sum = network.add_addition(input, input, false).expect("add");
        network.add_quantization(sum).expect("quantize");

        let frame = frame_buffer(&ctx, &[10, 20, 30, 9]);
        network.run(&frame).expect("run");
        assert_eq!(read_frame(&ctx, &frame, 1), vec![20, 40, 60, 9]);
    }

    #[test]
    fn relu_clamps_negative_activations() {
        let Some(ctx) = test_context() else {
            return;
        };
        let mut network = StyleNetwork::new(ctx.clone()).expect("network");
        let input = network.create_tensor(&[4]).expect("tensor");
        network
            .set_tensor_values(input, &[-2.0, -0.5, 0.0, 3.0])
            .expect("values");
        let output = network
            .add_activation(input, ActivationKind::Relu)
            .expect("relu");

        // No frame endpoints; any buffer satisfies the binding contract.
        let frame = frame_buffer(&ctx, &[0, 0, 0, 0]);
        network.run(&frame).expect("run");
        assert_eq!(
            network.read_tensor(output).expect("read"),
            vec![0.0, 0.0, 0.0, 3.0]
        );
    }

    #[test]
    fn conv2d_identity_kernel_passes_values_through() {
        let Some(ctx) = test_context() else {
            return;
        };
        let mut network = StyleNetwork::new(ctx.clone()).expect("network");
        let input = network.create_tensor(&[1, 3, 3]).expect("tensor");
        let values: Vec<f32> = (1..=9).map(|v| v as f32).collect();
        network.set_tensor_values(input, &values).expect("values");

        // 1x1 kernel, single feature, weight 1, bias 0.
        let output = network
            .add_conv2d(
                input,
                &[1.0],
                &[0.0],
                &ConvParams {
                    output_channels: 1,
                    kernel: SpatialDims::square(1),
                    stride: SpatialDims::square(1),
                    dilation: SpatialDims::square(1),
                    padding: Padding2d::default(),
                    fused_relu: false,
                },
            )
            .expect("conv");

        let frame = frame_buffer(&ctx, &[0, 0, 0, 0]);
        network.run(&frame).expect("run");
        assert_eq!(network.read_tensor(output).expect("read"), values);
    }

    #[test]
    fn conv2d_sums_neighborhood_with_same_padding() {
        let Some(ctx) = test_context() else {
            return;
        };
        let mut network = StyleNetwork::new(ctx.clone()).expect("network");
        let input = network.create_tensor(&[1, 3, 1]).expect("tensor");
        network
            .set_tensor_values(input, &[1.0, 2.0, 3.0])
            .expect("values");

        // 3x1 box kernel with same padding: output is the sliding window sum.
        let output = network
            .add_conv2d(
                input,
                &[1.0, 1.0, 1.0],
                &[0.0],
                &ConvParams {
                    output_channels: 1,
                    kernel: SpatialDims::new(3, 1),
                    stride: SpatialDims::square(1),
                    dilation: SpatialDims::square(1),
                    padding: Padding2d::new(1, 1, 0, 0),
                    fused_relu: false,
                },
            )
            .expect("conv");

        let frame = frame_buffer(&ctx, &[0, 0, 0, 0]);
        network.run(&frame).expect("run");
        assert_eq!(
            network.read_tensor(output).expect("read"),
            vec![3.0, 6.0, 5.0]
        );
    }

    #[test]
    fn depthwise_conv_keeps_channels_independent() {
        let Some(ctx) = test_context() else {
            return;
        };
        let mut network = StyleNetwork::new(ctx.clone()).expect("network");
        let input = network.create_tensor(&[2, 2, 1]).expect("tensor");
        network
            .set_tensor_values(input, &[1.0, 10.0, 2.0, 20.0])
            .expect("values");

        // 1x1 depthwise kernel scaling channel 0 by 2 and channel 1 by 3.
        let output = network
            .add_depthwise_conv2d(
                input,
                &[2.0, 3.0],
                &[0.0, 0.0],
                &DepthwiseParams {
                    kernel: SpatialDims::square(1),
                    stride: SpatialDims::square(1),
                    dilation: SpatialDims::square(1),
                    padding: Padding2d::default(),
                    fused_relu: false,
                },
            )
            .expect("depthwise");

        let frame = frame_buffer(&ctx, &[0, 0, 0, 0]);
        network.run(&frame).expect("run");
        assert_eq!(
            network.read_tensor(output).expect("read"),
            vec![2.0, 30.0, 4.0, 60.0]
        );
    }

    #[test]
    fn deconv_upsamples_by_stride() {
        let Some(ctx) = test_context() else {
            return;
        };
        let mut network = StyleNetwork::new(ctx.clone()).expect("network");
        let input = network.create_tensor(&[1, 2, 1]).expect("tensor");
        network.set_tensor_values(input, &[1.0, 2.0]).expect("values");

        // Kernel [1, 1] with stride 2 and no padding scatters each input
        // element to two adjacent outputs: [1, 1, 2, 2] then the tail tap.
        let output = network
            .add_conv2d_transpose(
                input,
                &[1.0, 1.0],
                &[0.0],
                &DeconvParams {
                    output_channels: 1,
                    kernel: SpatialDims::new(2, 1),
                    stride: SpatialDims::new(2, 1),
                    padding: Padding2d::default(),
                },
            )
            .expect("deconv");

        assert_eq!(network.tensor_dims(output).expect("dims"), &[1, 4, 1]);
        let frame = frame_buffer(&ctx, &[0, 0, 0, 0]);
        network.run(&frame).expect("run");
        assert_eq!(
            network.read_tensor(output).expect("read"),
            vec![1.0, 1.0, 2.0, 2.0]
        );
    }

    #[test]
    fn pad_inserts_constant_border() {
        let Some(ctx) = test_context() else {
            return;
        };
        let mut network = StyleNetwork::new(ctx.clone()).expect("network");
        let input = network.create_tensor(&[1, 2, 1]).expect("tensor");
        network.set_tensor_values(input, &[5.0, 6.0]).expect("values");
        let output = network
            .add_pad(input, Padding2d::new(1, 1, 0, 0), -1.0)
            .expect("pad");

        let frame = frame_buffer(&ctx, &[0, 0, 0, 0]);
        network.run(&frame).expect("run");
        assert_eq!(
            network.read_tensor(output).expect("read"),
            vec![-1.0, 5.0, 6.0, -1.0]
        );
    }

    #[test]
    fn gamma_round_trip_recovers_brightness_scaled_input() {
        let Some(ctx) = test_context() else {
            return;
        };
        let mut network = StyleNetwork::new(ctx.clone()).expect("network");
        let input = network.create_tensor(&[4]).expect("tensor");
        let values = [0.0f32, 16.0, 128.0, 255.0];
        network.set_tensor_values(input, &values).expect("values");

        let encoded = network.add_linear_to_srgb(input).expect("encode");
        let decoded = network.add_srgb_to_linear(encoded).expect("decode");

        let frame = frame_buffer(&ctx, &[0, 0, 0, 0]);
        network.run(&frame).expect("run");
        let round = network.read_tensor(decoded).expect("read");
        for (output, input) in round.iter().zip(values.iter()) {
            let recovered = output / BRIGHTNESS_ADJUSTMENT;
            assert!(
                (recovered - input).abs() < 1e-2,
                "expected {input}, recovered {recovered}"
            );
        }
    }

    #[test]
    fn mismatched_addition_is_advisory_not_fatal() {
        let Some(ctx) = test_context() else {
            return;
        };
        let mut network = StyleNetwork::new(ctx).expect("network");
        let a = network.create_tensor(&[1, 2, 2]).expect("tensor");
        let b = network.create_tensor(&[1, 3, 3]).expect("tensor");
        // Shapes disagree; validation logs but configuration proceeds.
        let result = network.add_addition(a, b, false);
        assert!(result.is_ok());
        assert_eq!(network.step_count(), 1);
    }

    #[test]
    fn quantization_requires_a_frame_endpoint() {
        let Some(ctx) = test_context() else {
            return;
        };
        let mut network = StyleNetwork::new(ctx).expect("network");
        let input = network.create_tensor(&[3, 2, 2]).expect("tensor");
        assert!(network.add_quantization(input).is_err());
    }

    #[test]
    fn runs_are_deterministic() {
        let Some(ctx) = test_context() else {
            return;
        };
        let mut network = StyleNetwork::new(ctx.clone()).expect("network");
        let input = network
            .add_dequantization(identity_frame(2, 2))
            .expect("dequantize");
        let encoded = network.add_linear_to_srgb(input).expect("encode");
        let sum = network.add_addition(encoded, encoded, true).expect("add");
        let decoded = network.add_srgb_to_linear(sum).expect("decode");
        network.add_quantization(decoded).expect("quantize");

        let pixels: Vec<u8> = vec![
            12, 34, 56, 255, 78, 90, 101, 255, 1, 2, 3, 0, 200, 100, 50, 128,
        ];
        let frame = frame_buffer(&ctx, &pixels);
        network.run(&frame).expect("first run");
        let first = read_frame(&ctx, &frame, 4);

        // Reset the frame and run the identical sequence again.
        let packed = pack_rgba_pixels(&pixels);
        ctx.queue()
            .write_buffer(&frame, 0, bytemuck::cast_slice(&packed));
        network.run(&frame).expect("second run");
        let second = read_frame(&ctx, &frame, 4);
        assert_eq!(first, second);
    }
}

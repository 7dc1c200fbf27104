//! Frame endpoints: dequantize unpacks the caller's RGBA frame buffer into a
//! float tensor, quantize packs a float tensor back into it. Both bind the
//! frame at run time via [`StepBinding::Frame`] since the buffer belongs to
//! the caller, not the network.

use super::step::{Step, StepBinding};
use super::tensor::GpuTensor;
use super::utils::{buffer_entry, create_uniform_buffer, uniform_entry};

use anyhow::Result;
use bytemuck::{Pod, Zeroable};

const DEQUANTIZE_WGSL: &str = include_str!("dequantize.wgsl");
const QUANTIZE_WGSL: &str = include_str!("quantize.wgsl");
const QUANT_WORKGROUP_X: u32 = 8;
const QUANT_WORKGROUP_Y: u32 = 8;

/// Asymmetric 8-bit quantization parameters of the frame buffer.
#[derive(Debug, Clone, Copy)]
pub struct QuantizationInfo {
    pub scale: f32,
    pub zero_point: i32,
}

impl Default for QuantizationInfo {
    fn default() -> Self {
        // The render target stores raw 8-bit intensities.
        Self {
            scale: 1.0,
            zero_point: 0,
        }
    }
}

/// Frame geometry shared by the two endpoints.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    pub width: u32,
    pub height: u32,
    pub channels: u32,
    pub quantization: QuantizationInfo,
}

impl FrameConfig {
    pub fn new(width: u32, height: u32, channels: u32, quantization: QuantizationInfo) -> Result<Self> {
        anyhow::ensure!(width > 0 && height > 0, "frame extent must be non-zero");
        anyhow::ensure!(
            channels > 0 && channels <= 4,
            "frame channels must be between 1 and 4 (got {channels})"
        );
        anyhow::ensure!(
            quantization.scale != 0.0,
            "quantization scale must be non-zero"
        );
        Ok(Self {
            width,
            height,
            channels,
            quantization,
        })
    }

    pub fn tensor_dims(&self) -> [usize; 3] {
        [
            self.channels as usize,
            self.width as usize,
            self.height as usize,
        ]
    }

    /// Size in bytes of the packed frame buffer (one `u32` word per pixel).
    pub fn frame_bytes(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height) * 4
    }
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct FrameUniforms {
    width: u32,
    height: u32,
    channels: u32,
    zero_point: i32,
    scale: f32,
    _pad0: u32,
    _pad1: u32,
    _pad2: u32,
}

fn frame_pipeline(
    device: &wgpu::Device,
    name: &str,
    source: &str,
) -> (wgpu::ComputePipeline, wgpu::BindGroupLayout) {
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(&format!("stylize_{name}_shader")),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    });

    // Binding 0 is the frame for dequantize and the tensor for quantize; in
    // both cases slot 1 is the written buffer.
    let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some(&format!("stylize_{name}_bgl")),
        entries: &[
            buffer_entry(0, wgpu::BufferBindingType::Storage { read_only: true }),
            buffer_entry(1, wgpu::BufferBindingType::Storage { read_only: false }),
            uniform_entry(2),
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

#[derive(Debug)]
pub(crate) struct DequantizePipeline {
    pipeline: wgpu::ComputePipeline,
    bind_group_layout: wgpu::BindGroupLayout,
}

impl DequantizePipeline {
    pub(crate) fn new(device: &wgpu::Device) -> Result<Self> {
        let (pipeline, bind_group_layout) =
            frame_pipeline(device, "dequantize", DEQUANTIZE_WGSL);
        Ok(Self {
            pipeline,
            bind_group_layout,
        })
    }

    pub(crate) fn configure(
        &self,
        device: &wgpu::Device,
        output: &GpuTensor,
        config: &FrameConfig,
    ) -> Step {
        let uniforms = FrameUniforms {
            width: config.width,
            height: config.height,
            channels: config.channels,
            zero_point: config.quantization.zero_point,
            scale: config.quantization.scale,
            _pad0: 0,
            _pad1: 0,
            _pad2: 0,
        };
        let uniform_buffer = create_uniform_buffer(device, "stylize_dequantize_uniforms", &uniforms);
        Step {
            label: "dequantize",
            pipeline: self.pipeline.clone(),
            binding: StepBinding::Frame {
                layout: self.bind_group_layout.clone(),
                frame_binding: 0,
                fixed: vec![(1, output.buffer().clone()), (2, uniform_buffer)],
            },
            workgroups: [
                config.width.div_ceil(QUANT_WORKGROUP_X),
                config.height.div_ceil(QUANT_WORKGROUP_Y),
                1,
            ],
        }
    }
}

#[derive(Debug)]
pub(crate) struct QuantizePipeline {
    pipeline: wgpu::ComputePipeline,
    bind_group_layout: wgpu::BindGroupLayout,
}

impl QuantizePipeline {
    pub(crate) fn new(device: &wgpu::Device) -> Result<Self> {
        let (pipeline, bind_group_layout) = frame_pipeline(device, "quantize", QUANTIZE_WGSL);
        Ok(Self {
            pipeline,
            bind_group_layout,
        })
    }

    pub(crate) fn configure(
        &self,
        device: &wgpu::Device,
        input: &GpuTensor,
        config: &FrameConfig,
    ) -> Step {
        let uniforms = FrameUniforms {
            width: config.width,
            height: config.height,
            channels: config.channels,
            zero_point: config.quantization.zero_point,
            scale: 1.0 / config.quantization.scale,
            _pad0: 0,
            _pad1: 0,
            _pad2: 0,
        };
        let uniform_buffer = create_uniform_buffer(device, "stylize_quantize_uniforms", &uniforms);
        Step {
            label: "quantize",
            pipeline: self.pipeline.clone(),
            binding: StepBinding::Frame {
                layout: self.bind_group_layout.clone(),
                frame_binding: 1,
                fixed: vec![(0, input.buffer().clone()), (2, uniform_buffer)],
            },
            workgroups: [
                config.width.div_ceil(QUANT_WORKGROUP_X),
                config.height.div_ceil(QUANT_WORKGROUP_Y),
                1,
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_config_sizes_tensor_and_buffer() {
        let config = FrameConfig::new(640, 480, 3, QuantizationInfo::default()).expect("config");
        assert_eq!(config.tensor_dims(), [3, 640, 480]);
        assert_eq!(config.frame_bytes(), 640 * 480 * 4);
    }

    #[test]
    fn zero_scale_is_rejected() {
        let quant = QuantizationInfo {
            scale: 0.0,
            zero_point: 0,
        };
        assert!(FrameConfig::new(8, 8, 3, quant).is_err());
    }
}

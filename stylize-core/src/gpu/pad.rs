use super::conv2d::Padding2d;
use super::step::{Step, StepBinding};
use super::tensor::GpuTensor;
use super::utils::{buffer_entry, create_uniform_buffer, uniform_entry};

use anyhow::Result;
use bytemuck::{Pod, Zeroable};

const PAD_WGSL: &str = include_str!("pad.wgsl");
const PAD_WORKGROUP_X: u32 = 8;
const PAD_WORKGROUP_Y: u32 = 8;

/// Geometry for a spatial constant-padding operation.
#[derive(Debug, Clone)]
pub struct PadConfig {
    pub channels: u32,
    pub input_width: u32,
    pub input_height: u32,
    pub padding: Padding2d,
    pub fill: f32,
    pub output_width: u32,
    pub output_height: u32,
}

impl PadConfig {
    pub fn new(channels: u32, input_width: u32, input_height: u32, padding: Padding2d, fill: f32) -> Result<Self> {
        anyhow::ensure!(channels > 0, "channels must be > 0");
        anyhow::ensure!(
            input_width > 0 && input_height > 0,
            "input extent must be non-zero"
        );
        Ok(Self {
            channels,
            input_width,
            input_height,
            padding,
            fill,
            output_width: input_width + padding.front_x + padding.back_x,
            output_height: input_height + padding.front_y + padding.back_y,
        })
    }

    pub fn output_dims(&self) -> [usize; 3] {
        [
            self.channels as usize,
            self.output_width as usize,
            self.output_height as usize,
        ]
    }

    pub fn validate(&self, input_len: usize) -> Result<()> {
        let expected =
            self.channels as usize * self.input_width as usize * self.input_height as usize;
        anyhow::ensure!(
            input_len == expected,
            "pad input tensor expected {expected} elements, got {input_len}"
        );
        Ok(())
    }
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct PadUniforms {
    input_width: u32,
    input_height: u32,
    channels: u32,
    output_width: u32,
    output_height: u32,
    pad_x: u32,
    pad_y: u32,
    fill: f32,
}

#[derive(Debug)]
pub(crate) struct PadPipeline {
    pipeline: wgpu::ComputePipeline,
    bind_group_layout: wgpu::BindGroupLayout,
}

impl PadPipeline {
    pub(crate) fn new(device: &wgpu::Device) -> Result<Self> {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("stylize_pad_shader"),
            source: wgpu::ShaderSource::Wgsl(PAD_WGSL.into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("stylize_pad_bgl"),
            entries: &[
                buffer_entry(0, wgpu::BufferBindingType::Storage { read_only: true }),
                buffer_entry(1, wgpu::BufferBindingType::Storage { read_only: false }),
                uniform_entry(2),
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("stylize_pad_pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("stylize_pad_pipeline"),
            layout: Some(&pipeline_layout),
            module: &shader,
            entry_point: Some("main"),
            compilation_options: wgpu::PipelineCompilationOptions::default(),
            cache: None,
        });

        Ok(Self {
            pipeline,
            bind_group_layout,
        })
    }

    pub(crate) fn configure(
        &self,
        device: &wgpu::Device,
        input: &GpuTensor,
        output: &GpuTensor,
        config: &PadConfig,
    ) -> Step {
        let uniforms = PadUniforms {
            input_width: config.input_width,
            input_height: config.input_height,
            channels: config.channels,
            output_width: config.output_width,
            output_height: config.output_height,
            pad_x: config.padding.front_x,
            pad_y: config.padding.front_y,
            fill: config.fill,
        };
        let uniform_buffer = create_uniform_buffer(device, "stylize_pad_uniforms", &uniforms);
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("stylize_pad_bg"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: input.buffer().as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: output.buffer().as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: uniform_buffer.as_entire_binding(),
                },
            ],
        });
        Step {
            label: "pad",
            pipeline: self.pipeline.clone(),
            binding: StepBinding::Ready(bind_group),
            workgroups: [
                config.output_width.div_ceil(PAD_WORKGROUP_X),
                config.output_height.div_ceil(PAD_WORKGROUP_Y),
                config.channels,
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn asymmetric_padding_grows_output() {
        let config = PadConfig::new(3, 100, 50, Padding2d::new(1, 2, 0, 3), 0.0).expect("config");
        assert_eq!(config.output_dims(), [3, 103, 53]);
        assert!(config.validate(3 * 100 * 50).is_ok());
        assert!(config.validate(3 * 103 * 53).is_err());
    }
}

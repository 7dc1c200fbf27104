//! Elementwise pipelines: activation (linear map or relu), addition, and
//! power with affine post-scaling. All three dispatch one thread per tensor
//! element.

use super::step::{Step, StepBinding};
use super::tensor::GpuTensor;
use super::utils::{buffer_entry, create_uniform_buffer, uniform_entry};

use anyhow::Result;
use bytemuck::{Pod, Zeroable};

const ACTIVATION_WGSL: &str = include_str!("activation.wgsl");
const ADD_WGSL: &str = include_str!("add.wgsl");
const POWER_WGSL: &str = include_str!("power.wgsl");
const ELEMENTWISE_WORKGROUP: u32 = 256;

/// What the activation pipeline computes per element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ActivationKind {
    /// `a * x + b`.
    Linear { a: f32, b: f32 },
    /// `max(x, 0)`.
    Relu,
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct ActivationUniforms {
    elements: u32,
    mode: u32,
    a: f32,
    b: f32,
}

#[derive(Debug)]
pub(crate) struct ActivationPipeline {
    pipeline: wgpu::ComputePipeline,
    bind_group_layout: wgpu::BindGroupLayout,
}

impl ActivationPipeline {
    pub(crate) fn new(device: &wgpu::Device) -> Result<Self> {
        let (pipeline, bind_group_layout) =
            build_elementwise_pipeline(device, "activation", ACTIVATION_WGSL, 2);
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
        kind: ActivationKind,
    ) -> Step {
        let elements = input.shape().elements() as u32;
        let uniforms = match kind {
            ActivationKind::Linear { a, b } => ActivationUniforms {
                elements,
                mode: 0,
                a,
                b,
            },
            ActivationKind::Relu => ActivationUniforms {
                elements,
                mode: 1,
                a: 0.0,
                b: 0.0,
            },
        };
        let uniform_buffer = create_uniform_buffer(device, "stylize_activation_uniforms", &uniforms);
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("stylize_activation_bg"),
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
            label: match kind {
                ActivationKind::Linear { .. } => "activation_linear",
                ActivationKind::Relu => "activation_relu",
            },
            pipeline: self.pipeline.clone(),
            binding: StepBinding::Ready(bind_group),
            workgroups: [elements.div_ceil(ELEMENTWISE_WORKGROUP), 1, 1],
        }
    }
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct AddUniforms {
    elements: u32,
    activation_mode: u32,
    _pad0: u32,
    _pad1: u32,
}

#[derive(Debug)]
pub(crate) struct AddPipeline {
    pipeline: wgpu::ComputePipeline,
    bind_group_layout: wgpu::BindGroupLayout,
}

impl AddPipeline {
    pub(crate) fn new(device: &wgpu::Device) -> Result<Self> {
        let (pipeline, bind_group_layout) = build_elementwise_pipeline(device, "add", ADD_WGSL, 3);
        Ok(Self {
            pipeline,
            bind_group_layout,
        })
    }

    pub(crate) fn configure(
        &self,
        device: &wgpu::Device,
        lhs: &GpuTensor,
        rhs: &GpuTensor,
        output: &GpuTensor,
        fused_relu: bool,
    ) -> Step {
        let elements = lhs.shape().elements() as u32;
        let uniforms = AddUniforms {
            elements,
            activation_mode: fused_relu as u32,
            _pad0: 0,
            _pad1: 0,
        };
        let uniform_buffer = create_uniform_buffer(device, "stylize_add_uniforms", &uniforms);
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("stylize_add_bg"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: lhs.buffer().as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: rhs.buffer().as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: output.buffer().as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: uniform_buffer.as_entire_binding(),
                },
            ],
        });
        Step {
            label: "add",
            pipeline: self.pipeline.clone(),
            binding: StepBinding::Ready(bind_group),
            workgroups: [elements.div_ceil(ELEMENTWISE_WORKGROUP), 1, 1],
        }
    }
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct PowerUniforms {
    elements: u32,
    post_scale: f32,
    post_offset: f32,
    _pad: u32,
}

#[derive(Debug)]
pub(crate) struct PowerPipeline {
    pipeline: wgpu::ComputePipeline,
    bind_group_layout: wgpu::BindGroupLayout,
}

impl PowerPipeline {
    pub(crate) fn new(device: &wgpu::Device) -> Result<Self> {
        let (pipeline, bind_group_layout) =
            build_elementwise_pipeline(device, "power", POWER_WGSL, 3);
        Ok(Self {
            pipeline,
            bind_group_layout,
        })
    }

    pub(crate) fn configure(
        &self,
        device: &wgpu::Device,
        input: &GpuTensor,
        exponent: &GpuTensor,
        output: &GpuTensor,
        post_scale: f32,
        post_offset: f32,
    ) -> Step {
        let elements = input.shape().elements() as u32;
        let uniforms = PowerUniforms {
            elements,
            post_scale,
            post_offset,
            _pad: 0,
        };
        let uniform_buffer = create_uniform_buffer(device, "stylize_power_uniforms", &uniforms);
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("stylize_power_bg"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: input.buffer().as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: exponent.buffer().as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: output.buffer().as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: uniform_buffer.as_entire_binding(),
                },
            ],
        });
        Step {
            label: "power",
            pipeline: self.pipeline.clone(),
            binding: StepBinding::Ready(bind_group),
            workgroups: [elements.div_ceil(ELEMENTWISE_WORKGROUP), 1, 1],
        }
    }
}

/// Build a 1D elementwise pipeline with `storage_bindings` storage slots
/// (the last one read-write, the rest read-only) and a trailing uniform slot.
fn build_elementwise_pipeline(
    device: &wgpu::Device,
    name: &str,
    source: &str,
    storage_bindings: u32,
) -> (wgpu::ComputePipeline, wgpu::BindGroupLayout) {
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(&format!("stylize_{name}_shader")),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    });

    let mut entries = Vec::new();
    for binding in 0..storage_bindings - 1 {
        entries.push(buffer_entry(
            binding,
            wgpu::BufferBindingType::Storage { read_only: true },
        ));
    }
    entries.push(buffer_entry(
        storage_bindings - 1,
        wgpu::BufferBindingType::Storage { read_only: false },
    ));
    entries.push(uniform_entry(storage_bindings));

    let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some(&format!("stylize_{name}_bgl")),
        entries: &entries,
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

//! A recorded unit of work in the execution list.
//!
//! Internal operations bind only tensors the network owns, so their bind
//! groups are built once at configure time. The dequantize and quantize
//! endpoints additionally bind the caller's frame buffer, which is only known
//! at run time, so those steps keep their layout and fixed bindings and
//! assemble a bind group per invocation.

pub(crate) enum StepBinding {
    /// All resources known at configure time.
    Ready(wgpu::BindGroup),
    /// One slot is filled with the frame buffer on every run.
    Frame {
        layout: wgpu::BindGroupLayout,
        frame_binding: u32,
        fixed: Vec<(u32, wgpu::Buffer)>,
    },
}

pub(crate) struct Step {
    pub label: &'static str,
    pub pipeline: wgpu::ComputePipeline,
    pub binding: StepBinding,
    pub workgroups: [u32; 3],
}

impl Step {
    /// Resolve the bind group for this step, building one when the step
    /// touches the frame buffer.
    pub fn bind_group(&self, device: &wgpu::Device, frame: &wgpu::Buffer) -> wgpu::BindGroup {
        match &self.binding {
            StepBinding::Ready(bind_group) => bind_group.clone(),
            StepBinding::Frame {
                layout,
                frame_binding,
                fixed,
            } => {
                let mut entries: Vec<wgpu::BindGroupEntry> = fixed
                    .iter()
                    .map(|(binding, buffer)| wgpu::BindGroupEntry {
                        binding: *binding,
                        resource: buffer.as_entire_binding(),
                    })
                    .collect();
                entries.push(wgpu::BindGroupEntry {
                    binding: *frame_binding,
                    resource: frame.as_entire_binding(),
                });
                device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some(self.label),
                    layout,
                    entries: &entries,
                })
            }
        }
    }

    /// Whether this step reads or writes the caller's frame buffer.
    pub fn touches_frame(&self) -> bool {
        matches!(self.binding, StepBinding::Frame { .. })
    }
}

impl std::fmt::Debug for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Step")
            .field("label", &self.label)
            .field("workgroups", &self.workgroups)
            .field("frame", &self.touches_frame())
            .finish()
    }
}

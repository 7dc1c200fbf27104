//! One-call frame processing on top of the network and importer.
//!
//! [`StylePipeline`] owns the GPU-resident frame buffer alongside the
//! imported network, so callers that just want "stylize these pixels" never
//! touch `wgpu` types directly.

use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use log::{debug, Level};
use stylize_utils::gpu::{pack_rgba_pixels, unpack_rgba_pixels, GpuContext};
use stylize_utils::telemetry;

use crate::gpu::{FrameConfig, QuantizationInfo};
use crate::importer::import_style_model;
use crate::network::StyleNetwork;

/// An imported model bound to a reusable frame buffer.
pub struct StylePipeline {
    context: Arc<GpuContext>,
    network: StyleNetwork,
    frame: FrameConfig,
    frame_buffer: wgpu::Buffer,
}

impl StylePipeline {
    /// Import a serialized model for the given frame extent and allocate
    /// the reusable frame buffer.
    pub fn new(context: Arc<GpuContext>, width: u32, height: u32, model: &[u8]) -> Result<Self> {
        let frame = FrameConfig::new(width, height, 3, QuantizationInfo::default())?;
        let mut network = StyleNetwork::new(context.clone())?;
        import_style_model(model, frame.clone(), &mut network)?;

        let frame_buffer = context.device().create_buffer(&wgpu::BufferDescriptor {
            label: Some("stylize_pipeline_frame"),
            size: frame.frame_bytes(),
            usage: wgpu::BufferUsages::STORAGE
                | wgpu::BufferUsages::COPY_SRC
                | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        debug!(
            target: "stylize::pipeline",
            "Pipeline ready: {}x{} frames, {} operations",
            frame.width,
            frame.height,
            network.step_count()
        );

        Ok(Self {
            context,
            network,
            frame,
            frame_buffer,
        })
    }

    /// Frame width in pixels.
    pub fn width(&self) -> u32 {
        self.frame.width
    }

    /// Frame height in pixels.
    pub fn height(&self) -> u32 {
        self.frame.height
    }

    /// Run the network against a caller-managed frame buffer.
    ///
    /// The buffer must hold at least `width * height` packed RGBA words and
    /// carry `STORAGE` usage.
    pub fn run(&self, frame: &wgpu::Buffer) -> Result<()> {
        self.network.run(frame)
    }

    /// Stylize a frame of tightly packed RGBA bytes in place.
    ///
    /// Alpha passes through untouched. The slice length must match the
    /// model's input geometry exactly.
    pub fn process_rgba(&self, pixels: &mut [u8]) -> Result<()> {
        let _guard = telemetry::timing_guard("pipeline_frame", Level::Debug);
        let expected = self.frame.frame_bytes() as usize;
        anyhow::ensure!(
            pixels.len() == expected,
            "frame is {} bytes, model expects {expected} ({}x{} RGBA)",
            pixels.len(),
            self.frame.width,
            self.frame.height
        );

        let packed = pack_rgba_pixels(pixels);
        self.context
            .queue()
            .write_buffer(&self.frame_buffer, 0, bytemuck::cast_slice(&packed));
        self.network.run(&self.frame_buffer)?;

        let words = self.read_frame_words(packed.len())?;
        pixels.copy_from_slice(&unpack_rgba_pixels(&words));
        Ok(())
    }

    fn read_frame_words(&self, words: usize) -> Result<Vec<u32>> {
        let device = self.context.device();
        let size = (words * 4) as u64;
        let staging = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("stylize_pipeline_readback"),
            size,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("stylize_pipeline_readback_encoder"),
        });
        encoder.copy_buffer_to_buffer(&self.frame_buffer, 0, &staging, 0, size);
        self.context.queue().submit(Some(encoder.finish()));

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
            .map_err(|e| anyhow!("device poll failed during frame readback: {e}"))?;
        rx.recv()
            .context("frame readback callback dropped")?
            .context("failed to map frame readback buffer")?;

        let words = bytemuck::cast_slice(&slice.get_mapped_range()).to_vec();
        staging.unmap();
        Ok(words)
    }
}

impl std::fmt::Debug for StylePipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StylePipeline")
            .field("width", &self.frame.width)
            .field("height", &self.frame.height)
            .field("steps", &self.network.step_count())
            .finish()
    }
}

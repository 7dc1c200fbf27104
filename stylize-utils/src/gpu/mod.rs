//! GPU context management helpers built on top of `wgpu`.
//!
//! This module keeps device/queue initialization in one place so the
//! post-processing graph and its tests share the same plumbing while still
//! reporting a clean reason when no compatible adapter is present.

pub mod buffer_pool;
pub use buffer_pool::{BufferPoolError, GpuBufferPool};

use std::sync::Arc;

use log::{debug, info, warn};
use pollster::block_on;
use thiserror::Error;
use wgpu::{
    Adapter, AdapterInfo, Backends, Device, DeviceDescriptor, Dx12Compiler, ExperimentalFeatures,
    Features, Instance, InstanceDescriptor, InstanceFlags, Limits, MemoryHints, PowerPreference,
    Queue, RequestAdapterError, RequestAdapterOptions, RequestDeviceError, Trace,
};

/// High-level configuration for creating a [`GpuContext`].
#[derive(Clone, Debug)]
pub struct GpuContextOptions {
    /// Whether GPU support is enabled.
    pub enabled: bool,
    /// Allow environment variables (e.g. `WGPU_BACKEND`) to override defaults.
    pub respect_env: bool,
    /// Which backends should be considered.
    pub backends: Backends,
    /// Instance flags (debug/validation toggles).
    pub flags: InstanceFlags,
    /// Adapter preference (high-performance vs low-power).
    pub power_preference: PowerPreference,
    /// Force wgpu to pick its fallback adapter implementation.
    pub force_fallback_adapter: bool,
    /// Features that must be present on the selected adapter.
    pub required_features: Features,
    /// Optional features that will be enabled when supported.
    pub optional_features: Features,
    /// Limits that must be available. Defaults to the adapter limits.
    pub required_limits: Option<Limits>,
    /// DX12 shader compiler selection for Windows targets.
    pub dx12_shader_compiler: Dx12Compiler,
    /// Optional debug label for the logical device.
    pub label: Option<String>,
    /// Memory allocation hints forwarded to `wgpu`.
    pub memory_hints: Option<MemoryHints>,
}

impl Default for GpuContextOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            respect_env: true,
            backends: Backends::PRIMARY,
            flags: InstanceFlags::from_build_config(),
            power_preference: PowerPreference::HighPerformance,
            force_fallback_adapter: false,
            required_features: Features::empty(),
            optional_features: Features::empty(),
            required_limits: None,
            dx12_shader_compiler: Dx12Compiler::default(),
            label: Some("stylize GPU context".to_string()),
            memory_hints: None,
        }
    }
}

impl GpuContextOptions {
    /// Convenience helper for explicitly disabling GPU usage.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }
}

/// Result of attempting to initialize a GPU context.
#[derive(Debug)]
pub enum GpuAvailability {
    /// GPU resources are ready to use.
    Available(Arc<GpuContext>),
    /// GPU code path has been disabled by configuration.
    Disabled { reason: String },
    /// GPU initialization failed; post-processing cannot run.
    Unavailable { error: GpuInitError },
}

impl GpuAvailability {
    /// Returns `true` when a GPU context was created successfully.
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available(_))
    }

    /// Returns a reference to the underlying GPU context when it exists.
    pub fn context(&self) -> Option<&Arc<GpuContext>> {
        match self {
            Self::Available(ctx) => Some(ctx),
            _ => None,
        }
    }
}

/// Shared GPU device/queue wrapper with a little bit of metadata.
#[derive(Debug)]
pub struct GpuContext {
    instance: Option<Instance>,
    adapter: Option<Adapter>,
    device: Device,
    queue: Queue,
    info: AdapterInfo,
    features: Features,
    limits: Limits,
}

impl GpuContext {
    /// Initialize a new GPU context with the provided options.
    pub fn initialize(options: &GpuContextOptions) -> Result<Self, GpuInitError> {
        if !options.enabled {
            return Err(GpuInitError::Disabled);
        }

        let mut instance_desc = if options.respect_env {
            InstanceDescriptor::from_env_or_default()
        } else {
            InstanceDescriptor::default()
        };

        let backends = if options.respect_env {
            options.backends.with_env()
        } else {
            options.backends
        };

        instance_desc.backends = backends;
        instance_desc.flags = if options.respect_env {
            options.flags.with_env()
        } else {
            options.flags
        };
        instance_desc.backend_options.dx12.shader_compiler = options.dx12_shader_compiler.clone();

        let instance = Instance::new(&instance_desc);
        let adapter = block_on(instance.request_adapter(&RequestAdapterOptions {
            power_preference: options.power_preference,
            force_fallback_adapter: options.force_fallback_adapter,
            compatible_surface: None,
        }))
        .map_err(|source| GpuInitError::Adapter { backends, source })?;

        let info = adapter.get_info();
        let supported_features = adapter.features();

        if !supported_features.contains(options.required_features) {
            return Err(GpuInitError::MissingFeatures {
                requested: options.required_features,
                supported: supported_features,
            });
        }

        let mut features = options.required_features;
        let optional = options.optional_features & supported_features;
        if !optional.is_empty() {
            debug!(
                target: "stylize::gpu",
                "Enabling optional GPU features: {:?}", optional
            );
            features |= optional;
        }

        let missing_optional = options.optional_features & !supported_features;
        if !missing_optional.is_empty() {
            debug!(
                target: "stylize::gpu",
                "Skipping unsupported optional GPU features: {:?}", missing_optional
            );
        }

        let limits = options
            .required_limits
            .clone()
            .unwrap_or_else(|| adapter.limits());

        let device_desc = DeviceDescriptor {
            label: options.label.as_deref(),
            required_features: features,
            required_limits: limits.clone(),
            experimental_features: ExperimentalFeatures::default(),
            memory_hints: options.memory_hints.clone().unwrap_or_default(),
            trace: Trace::default(),
        };

        let (device, queue) =
            block_on(adapter.request_device(&device_desc)).map_err(GpuInitError::from)?;

        info!(
            target: "stylize::gpu",
            "Using GPU adapter '{}' ({:?}/{:?}) with features {:?}",
            info.name, info.backend, info.device_type, features
        );

        Ok(Self {
            instance: Some(instance),
            adapter: Some(adapter),
            device,
            queue,
            info,
            features,
            limits,
        })
    }

    /// Attempt to create a GPU context and report a reason when that fails.
    pub fn init_with_fallback(options: &GpuContextOptions) -> GpuAvailability {
        if !options.enabled {
            return GpuAvailability::Disabled {
                reason: "GPU acceleration disabled via configuration".to_string(),
            };
        }

        match Self::initialize(options) {
            Ok(ctx) => GpuAvailability::Available(Arc::new(ctx)),
            Err(GpuInitError::Disabled) => GpuAvailability::Disabled {
                reason: "GPU acceleration disabled via configuration".to_string(),
            },
            Err(err) => {
                warn!(
                    target: "stylize::gpu",
                    "GPU initialization failed ({err}); post-processing unavailable."
                );
                GpuAvailability::Unavailable { error: err }
            }
        }
    }

    /// Wrap an existing device/queue pair created by an external renderer.
    pub fn from_existing(
        instance: Option<Instance>,
        adapter: Option<Adapter>,
        device: Device,
        queue: Queue,
        info: AdapterInfo,
    ) -> Self {
        let features = device.features();
        let limits = device.limits();
        Self {
            instance,
            adapter,
            device,
            queue,
            info,
            features,
            limits,
        }
    }

    /// Returns the shared `wgpu::Device`.
    pub fn device(&self) -> &Device {
        &self.device
    }

    /// Returns the shared `wgpu::Queue`.
    pub fn queue(&self) -> &Queue {
        &self.queue
    }

    /// Adapter metadata handy for diagnostics.
    pub fn adapter_info(&self) -> &AdapterInfo {
        &self.info
    }

    /// `wgpu::Features` enabled on this context.
    pub fn features(&self) -> Features {
        self.features
    }

    /// `wgpu::Limits` negotiated for this context.
    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Returns the underlying `wgpu::Instance` if this context owns one.
    pub fn instance(&self) -> Option<&Instance> {
        self.instance.as_ref()
    }

    /// Returns the underlying adapter when available.
    pub fn adapter(&self) -> Option<&Adapter> {
        self.adapter.as_ref()
    }
}

/// Pack little-endian RGBA bytes into a single `u32` per pixel.
///
/// Each returned element stores the four 8-bit color channels in the order
/// `R | G << 8 | B << 16 | A << 24`, which is the representation the frame
/// buffer uses on the GPU.
pub fn pack_rgba_pixels(bytes: &[u8]) -> Vec<u32> {
    debug_assert!(
        bytes.len() % 4 == 0,
        "RGBA buffer must have a multiple of 4 elements"
    );
    bytes
        .chunks_exact(4)
        .map(|chunk| u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

/// Expand packed RGBA pixels back into a `Vec<u8>` buffer.
pub fn unpack_rgba_pixels(packed: &[u32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(packed.len() * 4);
    for value in packed {
        bytes.extend(value.to_le_bytes());
    }
    bytes
}

/// Tracks GPU initialization failures.
#[derive(Debug, Error)]
pub enum GpuInitError {
    #[error("GPU adapter request failed for {backends:?}: {source}")]
    Adapter {
        backends: Backends,
        #[source]
        source: RequestAdapterError,
    },
    #[error(
        "GPU adapter missing required features (requested={requested:?}, supported={supported:?})"
    )]
    MissingFeatures {
        requested: Features,
        supported: Features,
    },
    #[error("GPU device creation failed: {0}")]
    Device(#[from] RequestDeviceError),
    #[error("GPU acceleration disabled")]
    Disabled,
}

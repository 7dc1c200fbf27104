use anyhow::{Context, Result};
use bytemuck::{bytes_of, Pod};

pub(crate) fn create_uniform_buffer(
    device: &wgpu::Device,
    label: &str,
    data: &impl Pod,
) -> wgpu::Buffer {
    use wgpu::util::DeviceExt;

    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(label),
        contents: bytes_of(data),
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    })
}

pub(crate) fn buffer_entry(
    binding: u32,
    ty: wgpu::BufferBindingType,
) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

pub(crate) fn uniform_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

/// Output spatial extent of a forward convolution with explicit padding.
///
/// `ceil((input + 2 * max(pad_front, pad_back) - dilation * (kernel - 1)) / stride)`.
pub fn conv_output_dim(
    input: u32,
    pad_front: u32,
    pad_back: u32,
    kernel: u32,
    stride: u32,
    dilation: u32,
) -> Result<u32> {
    anyhow::ensure!(stride > 0, "stride must be > 0");
    anyhow::ensure!(kernel > 0, "kernel must be > 0");
    anyhow::ensure!(dilation > 0, "dilation must be > 0");
    let pad = pad_front.max(pad_back) * 2;
    let span = dilation * (kernel - 1);
    let numerator = input
        .checked_add(pad)
        .context("padding overflowed u32")?
        .checked_sub(span)
        .context("dilated kernel larger than padded input")?;
    anyhow::ensure!(numerator > 0, "convolution output would be empty");
    Ok(numerator.div_ceil(stride))
}

/// Output spatial extent of a transposed convolution:
/// `(input - 1) * stride - 2 * max(pad_front, pad_back) + kernel`.
pub fn deconv_output_dim(
    input: u32,
    pad_front: u32,
    pad_back: u32,
    kernel: u32,
    stride: u32,
) -> Result<u32> {
    anyhow::ensure!(stride > 0, "stride must be > 0");
    anyhow::ensure!(kernel > 0, "kernel must be > 0");
    anyhow::ensure!(input > 0, "input extent must be > 0");
    let upsampled = (input - 1)
        .checked_mul(stride)
        .context("transposed convolution extent overflowed u32")?;
    let trimmed = upsampled
        .checked_sub(pad_front.max(pad_back) * 2)
        .context("padding exceeds upsampled extent")?;
    trimmed
        .checked_add(kernel)
        .context("transposed convolution extent overflowed u32")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_padded_conv_keeps_extent_at_unit_stride() {
        assert_eq!(conv_output_dim(256, 1, 1, 3, 1, 1).unwrap(), 256);
    }

    #[test]
    fn strided_conv_halves_extent() {
        assert_eq!(conv_output_dim(128, 0, 1, 3, 2, 1).unwrap(), 64);
    }

    #[test]
    fn dilation_widens_the_kernel_span() {
        // Dilated 3-kernel spans 5 elements.
        assert_eq!(conv_output_dim(256, 2, 2, 3, 1, 2).unwrap(), 256);
    }

    #[test]
    fn deconv_inverts_strided_conv_sizing() {
        assert_eq!(deconv_output_dim(128, 1, 1, 4, 2).unwrap(), 256);
    }

    #[test]
    fn oversized_kernel_is_rejected() {
        assert!(conv_output_dim(2, 0, 0, 5, 1, 1).is_err());
    }
}

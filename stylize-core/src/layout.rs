//! Host-side tensor layout arithmetic.
//!
//! Network tensors use a channel-minor ordering: for a logical shape of
//! `[channels, width, height]` the element at `(c, x, y)` lives at linear
//! index `(y * width + x) * channels + c`. Constant weights arrive from the
//! model file in an output-feature-minor layout and are permuted here into
//! the layouts the compute shaders index.

use anyhow::{Context, Result};

/// Maximum number of logical dimensions a layout may describe.
pub const MAX_DIMS: usize = 5;

/// Shape plus per-dimension element strides for a tensor's native memory.
///
/// Strides allow a destination with padded rows (alignment slack between
/// logical elements) to be filled from a dense source and read back out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TensorLayout {
    dims: Vec<usize>,
    strides: Vec<usize>,
}

impl TensorLayout {
    /// Dense layout: stride of each dimension is the product of the faster
    /// dimensions' extents.
    pub fn contiguous(dims: &[usize]) -> Result<Self> {
        let mut strides = Vec::with_capacity(dims.len());
        let mut stride = 1usize;
        for (idx, dim) in dims.iter().enumerate() {
            anyhow::ensure!(
                *dim > 0,
                "dimension {idx} must be greater than zero (got {dim})"
            );
            strides.push(stride);
            stride = stride
                .checked_mul(*dim)
                .with_context(|| format!("layout would overflow usize at dimension {idx}"))?;
        }
        Self::with_strides(dims, &strides)
    }

    /// Layout with caller-supplied element strides, e.g. for padded rows.
    pub fn with_strides(dims: &[usize], strides: &[usize]) -> Result<Self> {
        anyhow::ensure!(
            !dims.is_empty() && dims.len() <= MAX_DIMS,
            "layout must have between 1 and {MAX_DIMS} dimensions (got {})",
            dims.len()
        );
        anyhow::ensure!(
            dims.len() == strides.len(),
            "layout has {} dimensions but {} strides",
            dims.len(),
            strides.len()
        );
        for (idx, dim) in dims.iter().enumerate() {
            anyhow::ensure!(
                *dim > 0,
                "dimension {idx} must be greater than zero (got {dim})"
            );
        }
        Ok(Self {
            dims: dims.to_vec(),
            strides: strides.to_vec(),
        })
    }

    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    pub fn strides(&self) -> &[usize] {
        &self.strides
    }

    /// Number of logical elements (ignores stride slack).
    pub fn elements(&self) -> usize {
        self.dims.iter().product()
    }

    /// Smallest native buffer length (in elements) this layout addresses.
    pub fn required_len(&self) -> usize {
        let mut last = 0usize;
        for (dim, stride) in self.dims.iter().zip(&self.strides) {
            last += (dim - 1) * stride;
        }
        last + 1
    }

    /// Copy a dense, logically ordered source array into native memory.
    pub fn copy_from_dense(&self, src: &[f32], dst: &mut [f32]) -> Result<()> {
        anyhow::ensure!(
            src.len() == self.elements(),
            "dense source has {} elements, layout expects {}",
            src.len(),
            self.elements()
        );
        anyhow::ensure!(
            dst.len() >= self.required_len(),
            "native destination has {} elements, layout needs at least {}",
            dst.len(),
            self.required_len()
        );
        self.for_each_offset(|dense, native| dst[native] = src[dense]);
        Ok(())
    }

    /// Copy native memory back out into a dense, logically ordered array.
    pub fn copy_to_dense(&self, src: &[f32], dst: &mut [f32]) -> Result<()> {
        anyhow::ensure!(
            src.len() >= self.required_len(),
            "native source has {} elements, layout needs at least {}",
            src.len(),
            self.required_len()
        );
        anyhow::ensure!(
            dst.len() == self.elements(),
            "dense destination has {} elements, layout expects {}",
            dst.len(),
            self.elements()
        );
        self.for_each_offset(|dense, native| dst[dense] = src[native]);
        Ok(())
    }

    /// Write a single scalar to every logical element of native memory.
    pub fn fill(&self, value: f32, dst: &mut [f32]) -> Result<()> {
        anyhow::ensure!(
            dst.len() >= self.required_len(),
            "native destination has {} elements, layout needs at least {}",
            dst.len(),
            self.required_len()
        );
        self.for_each_offset(|_, native| dst[native] = value);
        Ok(())
    }

    fn for_each_offset(&self, mut visit: impl FnMut(usize, usize)) {
        let mut dims = [1usize; MAX_DIMS];
        let mut strides = [0usize; MAX_DIMS];
        dims[..self.dims.len()].copy_from_slice(&self.dims);
        strides[..self.strides.len()].copy_from_slice(&self.strides);

        let mut dense = 0usize;
        for i4 in 0..dims[4] {
            for i3 in 0..dims[3] {
                for i2 in 0..dims[2] {
                    for i1 in 0..dims[1] {
                        let row = i4 * strides[4] + i3 * strides[3] + i2 * strides[2] + i1 * strides[1];
                        for i0 in 0..dims[0] {
                            visit(dense, row + i0 * strides[0]);
                            dense += 1;
                        }
                    }
                }
            }
        }
    }
}

/// Permute convolution weights from the model's height/width/input/output
/// ordering (output-feature minor) into the output-feature-major layout the
/// convolution shader indexes as `((f * kh + y) * kw + x) * in + c`.
pub fn transpose_conv_kernel(
    values: &[f32],
    width: usize,
    height: usize,
    input_channels: usize,
    output_features: usize,
) -> Result<Vec<f32>> {
    let expected = width * height * input_channels * output_features;
    anyhow::ensure!(
        values.len() == expected,
        "kernel blob has {} values, expected {expected} for {height}x{width}x{input_channels}x{output_features}",
        values.len()
    );
    let mut out = vec![0.0f32; expected];
    for y in 0..height {
        for x in 0..width {
            for c in 0..input_channels {
                for f in 0..output_features {
                    let src = ((y * width + x) * input_channels + c) * output_features + f;
                    let dst = ((f * height + y) * width + x) * input_channels + c;
                    out[dst] = values[src];
                }
            }
        }
    }
    Ok(out)
}

/// Permute transposed-convolution weights from the model's ordering into the
/// input-channel-major layout the deconvolution shader indexes as
/// `((c * kh + y) * kw + x) * out + f`.
pub fn transpose_deconv_kernel(
    values: &[f32],
    width: usize,
    height: usize,
    input_channels: usize,
    output_features: usize,
) -> Result<Vec<f32>> {
    let expected = width * height * input_channels * output_features;
    anyhow::ensure!(
        values.len() == expected,
        "kernel blob has {} values, expected {expected} for {height}x{width}x{input_channels}x{output_features}",
        values.len()
    );
    let mut out = vec![0.0f32; expected];
    for y in 0..height {
        for x in 0..width {
            for c in 0..input_channels {
                for f in 0..output_features {
                    let src = ((y * width + x) * input_channels + c) * output_features + f;
                    let dst = ((c * height + y) * width + x) * output_features + f;
                    out[dst] = values[src];
                }
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contiguous_strides_are_products_of_faster_dims() {
        let layout = TensorLayout::contiguous(&[3, 4, 5]).expect("layout");
        assert_eq!(layout.strides(), &[1, 3, 12]);
        assert_eq!(layout.elements(), 60);
        assert_eq!(layout.required_len(), 60);
    }

    #[test]
    fn strided_copy_round_trips_through_padded_memory() {
        // 3-wide rows padded out to a stride of 5 elements.
        let layout = TensorLayout::with_strides(&[3, 4], &[1, 5]).expect("layout");
        assert_eq!(layout.required_len(), 3 * 5 + 3);

        let dense: Vec<f32> = (0..12).map(|i| i as f32).collect();
        let mut native = vec![-1.0f32; layout.required_len()];
        layout.copy_from_dense(&dense, &mut native).expect("copy in");

        // Padding slack is untouched.
        assert_eq!(native[3], -1.0);
        assert_eq!(native[4], -1.0);
        assert_eq!(native[5], 3.0);

        let mut round = vec![0.0f32; 12];
        layout.copy_to_dense(&native, &mut round).expect("copy out");
        assert_eq!(round, dense);
    }

    #[test]
    fn fill_writes_only_logical_elements() {
        let layout = TensorLayout::with_strides(&[2, 2], &[1, 4]).expect("layout");
        let mut native = vec![0.0f32; layout.required_len()];
        layout.fill(7.0, &mut native).expect("fill");
        assert_eq!(native[0], 7.0);
        assert_eq!(native[1], 7.0);
        assert_eq!(native[2], 0.0);
        assert_eq!(native[4], 7.0);
        assert_eq!(native[5], 7.0);
    }

    #[test]
    fn dense_length_mismatch_is_rejected() {
        let layout = TensorLayout::contiguous(&[2, 2]).expect("layout");
        let mut native = vec![0.0f32; 4];
        assert!(layout.copy_from_dense(&[1.0, 2.0, 3.0], &mut native).is_err());
    }

    #[test]
    fn conv_kernel_reorder_is_a_bijection() {
        let (w, h, ic, of) = (3usize, 2, 4, 5);
        let values: Vec<f32> = (0..w * h * ic * of).map(|i| i as f32).collect();
        let forward = transpose_conv_kernel(&values, w, h, ic, of).expect("forward");

        // Invert by mapping every destination index back to its source.
        let mut inverse = vec![0.0f32; values.len()];
        for y in 0..h {
            for x in 0..w {
                for c in 0..ic {
                    for f in 0..of {
                        let src = ((y * w + x) * ic + c) * of + f;
                        let dst = ((f * h + y) * w + x) * ic + c;
                        inverse[src] = forward[dst];
                    }
                }
            }
        }
        assert_eq!(inverse, values);
    }

    #[test]
    fn deconv_kernel_reorder_is_a_bijection() {
        let (w, h, ic, of) = (4usize, 4, 2, 3);
        let values: Vec<f32> = (0..w * h * ic * of).map(|i| i as f32).collect();
        let forward = transpose_deconv_kernel(&values, w, h, ic, of).expect("forward");

        let mut inverse = vec![0.0f32; values.len()];
        for y in 0..h {
            for x in 0..w {
                for c in 0..ic {
                    for f in 0..of {
                        let src = ((y * w + x) * ic + c) * of + f;
                        let dst = ((c * h + y) * w + x) * of + f;
                        inverse[src] = forward[dst];
                    }
                }
            }
        }
        assert_eq!(inverse, values);
    }

    #[test]
    fn conv_and_deconv_reorders_differ_for_multichannel_kernels() {
        let (w, h, ic, of) = (2usize, 2, 2, 2);
        let values: Vec<f32> = (0..w * h * ic * of).map(|i| i as f32).collect();
        let conv = transpose_conv_kernel(&values, w, h, ic, of).expect("conv");
        let deconv = transpose_deconv_kernel(&values, w, h, ic, of).expect("deconv");
        assert_ne!(conv, deconv);
    }
}

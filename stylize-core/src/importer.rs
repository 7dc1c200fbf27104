//! Translating a serialized model into a configured [`StyleNetwork`].
//!
//! The importer walks the model's single subgraph in declaration order,
//! resolving each operator against the closed set this runtime executes.
//! Activations flow through a transient map from model tensor index to the
//! network's [`TensorId`]; the map exists only for the duration of the
//! import, so nothing in the configured network refers back to the model.
//!
//! Around the translated operators the importer inserts the four fixed
//! frame endpoints: dequantize and gamma-encode in front of the graph,
//! gamma-decode and quantize behind it.

use std::collections::HashMap;

use anyhow::Result;
use log::debug;
use thiserror::Error;

use crate::gpu::{ActivationKind, FrameConfig, Padding2d, SpatialDims};
use crate::layout;
use crate::network::{ConvParams, DeconvParams, DepthwiseParams, StyleNetwork, TensorId};
use crate::tflite::{schema, ModelError, StyleModel};

/// The closed set of operators the runtime executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupportedOperator {
    Add,
    Conv2d,
    DepthwiseConv2d,
    Relu,
    TransposeConv,
}

impl SupportedOperator {
    /// Map a resolved builtin operator code onto the supported set.
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            schema::BUILTIN_OPERATOR_ADD => Some(Self::Add),
            schema::BUILTIN_OPERATOR_CONV_2D => Some(Self::Conv2d),
            schema::BUILTIN_OPERATOR_DEPTHWISE_CONV_2D => Some(Self::DepthwiseConv2d),
            schema::BUILTIN_OPERATOR_RELU => Some(Self::Relu),
            schema::BUILTIN_OPERATOR_TRANSPOSE_CONV => Some(Self::TransposeConv),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum ImportError {
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error("model declares {inputs} graph inputs and {outputs} graph outputs, expected 1 and 1")]
    GraphIo { inputs: usize, outputs: usize },
    #[error("operator {operator} uses builtin code {code}, which this runtime does not execute")]
    UnknownOperator { operator: usize, code: i32 },
    #[error("operator {operator} declares {inputs} inputs and {outputs} outputs, expected {expected_inputs} and 1")]
    OperatorIo {
        operator: usize,
        inputs: usize,
        outputs: usize,
        expected_inputs: usize,
    },
    #[error("operator {operator} reads tensor {tensor}, which no earlier operator produced")]
    MissingProducer { operator: usize, tensor: i32 },
    #[error("no operator produced the graph output tensor {0}")]
    MissingOutput(i32),
    #[error("operator {operator} requests fused activation {activation}, only none and relu are executable")]
    UnsupportedActivation { operator: usize, activation: i8 },
    #[error("operator {operator} uses depth multiplier {multiplier}, only 1 is executable")]
    DepthMultiplier { operator: usize, multiplier: i32 },
    #[error("operator {operator} tensor {tensor} has weight shape {shape:?}, expected {expected}")]
    WeightShape {
        operator: usize,
        tensor: i32,
        shape: Vec<usize>,
        expected: &'static str,
    },
}

/// Symmetric-as-possible padding that keeps `ceil(input / stride)` outputs.
///
/// When the total is odd the extra element goes on the trailing edge.
pub fn calculate_same_padding(input: u32, kernel: u32, stride: u32, dilation: u32) -> (u32, u32) {
    let output = input.div_ceil(stride);
    let dilated = kernel + (dilation - 1) * (kernel - 1);
    let needed = (output - 1) * stride + dilated;
    let total = needed.saturating_sub(input);
    let front = total / 2;
    (front, total - front)
}

/// Check that the subgraph has exactly one input and one output tensor,
/// returning their indices.
pub fn ensure_single_io(subgraph: &schema::SubGraph<'_>) -> Result<(i32, i32), ImportError> {
    let inputs = subgraph.inputs().map(|v| v.len()).unwrap_or(0);
    let outputs = subgraph.outputs().map(|v| v.len()).unwrap_or(0);
    if inputs != 1 || outputs != 1 {
        return Err(ImportError::GraphIo { inputs, outputs });
    }
    Ok((
        subgraph.inputs().unwrap().get(0),
        subgraph.outputs().unwrap().get(0),
    ))
}

/// Build the complete operation sequence for a serialized model against the
/// caller's frame geometry.
///
/// The frame descriptor is authoritative for pixel extent; the model's own
/// declared input shape is checked against it and a mismatch is logged, not
/// fatal. On success the network ends with its quantization endpoint
/// configured and is ready to [`run`](StyleNetwork::run).
pub fn import_style_model(
    data: &[u8],
    frame: FrameConfig,
    network: &mut StyleNetwork,
) -> Result<()> {
    let model = StyleModel::parse(data)?;
    let subgraph = model.subgraph();
    let (graph_input, graph_output) = ensure_single_io(&subgraph)?;

    let input_shape = model.tensor_shape(&model.tensor(graph_input)?);
    let declared = [
        1,
        frame.height as usize,
        frame.width as usize,
        frame.channels as usize,
    ];
    if input_shape != declared {
        log::error!(
            target: "stylize::importer",
            "model declares input shape {input_shape:?}, frame provides {declared:?}; \
             configuring anyway"
        );
    }
    debug!(
        target: "stylize::importer",
        "Importing model for {}x{} frames", frame.width, frame.height
    );

    let raw = network.add_dequantization(frame)?;
    let encoded = network.add_linear_to_srgb(raw)?;

    // Model tensor index -> network tensor, alive only during the import.
    let mut produced: HashMap<i32, TensorId> = HashMap::new();
    produced.insert(graph_input, encoded);

    let mut operator_count = 0;
    if let Some(operators) = subgraph.operators() {
        operator_count = operators.len();
        for (index, op) in operators.iter().enumerate() {
            let code = model.builtin_code(&op)?;
            let kind = SupportedOperator::from_code(code).ok_or(ImportError::UnknownOperator {
                operator: index,
                code,
            })?;
            let output = translate_operator(&model, network, &produced, index, &op, kind)?;
            let output_index = op
                .outputs()
                .map(|v| v.get(0))
                .expect("operator io checked in translate_operator");
            produced.insert(output_index, output);
        }
    }

    let final_tensor = produced
        .get(&graph_output)
        .copied()
        .ok_or(ImportError::MissingOutput(graph_output))?;
    let decoded = network.add_srgb_to_linear(final_tensor)?;
    network.add_quantization(decoded)?;
    debug!(
        target: "stylize::importer",
        "Imported {operator_count} operators into {} operations",
        network.step_count()
    );
    Ok(())
}

fn translate_operator(
    model: &StyleModel<'_>,
    network: &mut StyleNetwork,
    produced: &HashMap<i32, TensorId>,
    index: usize,
    op: &schema::Operator<'_>,
    kind: SupportedOperator,
) -> Result<TensorId> {
    let inputs = check_operator_io(index, op, kind)?;
    let resolve = |tensor: i32| -> Result<TensorId, ImportError> {
        produced
            .get(&tensor)
            .copied()
            .ok_or(ImportError::MissingProducer {
                operator: index,
                tensor,
            })
    };

    match kind {
        SupportedOperator::Relu => {
            let input = resolve(inputs[0])?;
            network.add_activation(input, ActivationKind::Relu)
        }
        SupportedOperator::Add => {
            let lhs = resolve(inputs[0])?;
            let rhs = resolve(inputs[1])?;
            let fused_relu = match op.builtin_options_as_add_options() {
                Some(options) => fused_relu(index, options.fused_activation_function())?,
                None => false,
            };
            network.add_addition(lhs, rhs, fused_relu)
        }
        SupportedOperator::Conv2d => translate_conv2d(model, network, index, op, &inputs, resolve),
        SupportedOperator::DepthwiseConv2d => {
            translate_depthwise(model, network, index, op, &inputs, resolve)
        }
        SupportedOperator::TransposeConv => {
            translate_deconv(model, network, index, op, &inputs, resolve)
        }
    }
}

fn translate_conv2d(
    model: &StyleModel<'_>,
    network: &mut StyleNetwork,
    index: usize,
    op: &schema::Operator<'_>,
    inputs: &[i32],
    resolve: impl Fn(i32) -> Result<TensorId, ImportError>,
) -> Result<TensorId> {
    let input = resolve(inputs[0])?;
    let weight_tensor = model.tensor(inputs[1])?;
    let weight_shape = model.tensor_shape(&weight_tensor);
    let [kernel_h, kernel_w, input_channels, output_channels] = weight_shape[..] else {
        return Err(ImportError::WeightShape {
            operator: index,
            tensor: inputs[1],
            shape: weight_shape,
            expected: "[kernel_h, kernel_w, in, out]",
        }
        .into());
    };
    // Stored output-feature-minor; the kernel reads output-feature-major.
    let weights = model.constant_f32(&weight_tensor)?;
    let weights =
        layout::transpose_conv_kernel(&weights, kernel_w, kernel_h, input_channels, output_channels)?;
    let bias = model.constant_f32(&model.tensor(inputs[2])?)?;

    let options = op.builtin_options_as_conv_2d_options();
    let (stride, dilation, padding_mode, fused) = match &options {
        Some(o) => (
            SpatialDims::new(o.stride_w() as u32, o.stride_h() as u32),
            SpatialDims::new(o.dilation_w_factor() as u32, o.dilation_h_factor() as u32),
            o.padding(),
            o.fused_activation_function(),
        ),
        None => (
            SpatialDims::square(1),
            SpatialDims::square(1),
            schema::PADDING_VALID,
            schema::ACTIVATION_NONE,
        ),
    };
    let padding = conv_padding(
        network,
        input,
        SpatialDims::new(kernel_w as u32, kernel_h as u32),
        stride,
        dilation,
        padding_mode,
    )?;

    network.add_conv2d(
        input,
        &weights,
        &bias,
        &ConvParams {
            output_channels: output_channels as u32,
            kernel: SpatialDims::new(kernel_w as u32, kernel_h as u32),
            stride,
            dilation,
            padding,
            fused_relu: fused_relu(index, fused)?,
        },
    )
}

fn translate_depthwise(
    model: &StyleModel<'_>,
    network: &mut StyleNetwork,
    index: usize,
    op: &schema::Operator<'_>,
    inputs: &[i32],
    resolve: impl Fn(i32) -> Result<TensorId, ImportError>,
) -> Result<TensorId> {
    let input = resolve(inputs[0])?;
    let weight_tensor = model.tensor(inputs[1])?;
    let weight_shape = model.tensor_shape(&weight_tensor);
    let [1, kernel_h, kernel_w, _channels] = weight_shape[..] else {
        return Err(ImportError::WeightShape {
            operator: index,
            tensor: inputs[1],
            shape: weight_shape,
            expected: "[1, kernel_h, kernel_w, channels]",
        }
        .into());
    };
    // Channel-minor rows per tap, the layout the kernel reads directly.
    let weights = model.constant_f32(&weight_tensor)?;
    let bias = model.constant_f32(&model.tensor(inputs[2])?)?;

    let options = op.builtin_options_as_depthwise_conv_2d_options();
    let (stride, dilation, padding_mode, fused, multiplier) = match &options {
        Some(o) => (
            SpatialDims::new(o.stride_w() as u32, o.stride_h() as u32),
            SpatialDims::new(o.dilation_w_factor() as u32, o.dilation_h_factor() as u32),
            o.padding(),
            o.fused_activation_function(),
            o.depth_multiplier(),
        ),
        None => (
            SpatialDims::square(1),
            SpatialDims::square(1),
            schema::PADDING_VALID,
            schema::ACTIVATION_NONE,
            1,
        ),
    };
    if multiplier != 1 {
        return Err(ImportError::DepthMultiplier {
            operator: index,
            multiplier,
        }
        .into());
    }
    let padding = conv_padding(
        network,
        input,
        SpatialDims::new(kernel_w as u32, kernel_h as u32),
        stride,
        dilation,
        padding_mode,
    )?;

    network.add_depthwise_conv2d(
        input,
        &weights,
        &bias,
        &DepthwiseParams {
            kernel: SpatialDims::new(kernel_w as u32, kernel_h as u32),
            stride,
            dilation,
            padding,
            fused_relu: fused_relu(index, fused)?,
        },
    )
}

fn translate_deconv(
    model: &StyleModel<'_>,
    network: &mut StyleNetwork,
    index: usize,
    op: &schema::Operator<'_>,
    inputs: &[i32],
    resolve: impl Fn(i32) -> Result<TensorId, ImportError>,
) -> Result<TensorId> {
    // Input order: output shape, weights, activation input, optional bias.
    let input = resolve(inputs[2])?;
    let weight_tensor = model.tensor(inputs[1])?;
    let weight_shape = model.tensor_shape(&weight_tensor);
    let [kernel_h, kernel_w, input_channels, output_channels] = weight_shape[..] else {
        return Err(ImportError::WeightShape {
            operator: index,
            tensor: inputs[1],
            shape: weight_shape,
            expected: "[kernel_h, kernel_w, in, out]",
        }
        .into());
    };
    let weights = model.constant_f32(&weight_tensor)?;
    let weights = layout::transpose_deconv_kernel(
        &weights,
        kernel_w,
        kernel_h,
        input_channels,
        output_channels,
    )?;
    let bias = if inputs.len() > 3 {
        model.constant_f32(&model.tensor(inputs[3])?)?
    } else {
        vec![0.0; output_channels]
    };

    let options = op.builtin_options_as_transpose_conv_options();
    let (stride, padding_mode) = match &options {
        Some(o) => (
            SpatialDims::new(o.stride_w() as u32, o.stride_h() as u32),
            o.padding(),
        ),
        None => (SpatialDims::square(1), schema::PADDING_VALID),
    };
    // Same padding on a transposed convolution is derived from the input
    // extent, exactly as for the forward direction; the output then lands on
    // input * stride whenever stride divides the input.
    let padding = conv_padding(
        network,
        input,
        SpatialDims::new(kernel_w as u32, kernel_h as u32),
        stride,
        SpatialDims::square(1),
        padding_mode,
    )?;

    network.add_conv2d_transpose(
        input,
        &weights,
        &bias,
        &DeconvParams {
            output_channels: output_channels as u32,
            kernel: SpatialDims::new(kernel_w as u32, kernel_h as u32),
            stride,
            padding,
        },
    )
}

fn conv_padding(
    network: &StyleNetwork,
    input: TensorId,
    kernel: SpatialDims,
    stride: SpatialDims,
    dilation: SpatialDims,
    mode: i8,
) -> Result<Padding2d> {
    if mode != schema::PADDING_SAME {
        return Ok(Padding2d::default());
    }
    let dims = network.tensor_dims(input)?;
    let (front_x, back_x) =
        calculate_same_padding(dims[1] as u32, kernel.width, stride.width, dilation.width);
    let (front_y, back_y) =
        calculate_same_padding(dims[2] as u32, kernel.height, stride.height, dilation.height);
    Ok(Padding2d::new(front_x, back_x, front_y, back_y))
}

fn fused_relu(operator: usize, activation: i8) -> Result<bool, ImportError> {
    match activation {
        schema::ACTIVATION_NONE => Ok(false),
        schema::ACTIVATION_RELU => Ok(true),
        other => Err(ImportError::UnsupportedActivation {
            operator,
            activation: other,
        }),
    }
}

fn check_operator_io(
    index: usize,
    op: &schema::Operator<'_>,
    kind: SupportedOperator,
) -> Result<Vec<i32>, ImportError> {
    let expected = match kind {
        SupportedOperator::Relu => 1,
        SupportedOperator::Add => 2,
        SupportedOperator::Conv2d | SupportedOperator::DepthwiseConv2d => 3,
        SupportedOperator::TransposeConv => 3,
    };
    let inputs: Vec<i32> = op
        .inputs()
        .map(|v| v.iter().collect())
        .unwrap_or_default();
    let outputs = op.outputs().map(|v| v.len()).unwrap_or(0);
    // Transpose convolutions may carry a fourth, bias input.
    let input_ok = inputs.len() == expected
        || (kind == SupportedOperator::TransposeConv && inputs.len() == 4);
    if !input_ok || outputs != 1 {
        return Err(ImportError::OperatorIo {
            operator: index,
            inputs: inputs.len(),
            outputs,
            expected_inputs: expected,
        });
    }
    Ok(inputs)
}

//! End-to-end importer coverage against synthetic serialized models.

use std::sync::Arc;

use flatbuffers::FlatBufferBuilder;
use stylize_core::importer::ensure_single_io;
use stylize_core::tflite::schema;
use stylize_core::{
    import_style_model, FrameConfig, ImportError, QuantizationInfo, StyleModel, StyleNetwork,
};
use stylize_utils::gpu::{
    pack_rgba_pixels, unpack_rgba_pixels, GpuAvailability, GpuContext, GpuContextOptions,
};

fn frame(width: u32, height: u32) -> FrameConfig {
    FrameConfig::new(width, height, 3, QuantizationInfo::default()).expect("frame config")
}

/// Tensor description for [`build_model`]: logical shape plus an optional
/// constant payload.
struct TensorSpec {
    shape: Vec<i32>,
    data: Option<Vec<u8>>,
}

impl TensorSpec {
    fn variable(shape: &[i32]) -> Self {
        Self {
            shape: shape.to_vec(),
            data: None,
        }
    }

    fn constant_f32(shape: &[i32], values: &[f32]) -> Self {
        Self {
            shape: shape.to_vec(),
            data: Some(values.iter().flat_map(|v| v.to_le_bytes()).collect()),
        }
    }
}

/// Builtin-options payload for an [`OpSpec`]. Ops that rely on the reader's
/// defaults can leave it at `None`.
enum OpOptions {
    None,
    TransposeConv {
        padding: i8,
        stride_w: i32,
        stride_h: i32,
    },
}

/// Operator description: opcode-table index plus tensor indices.
struct OpSpec {
    opcode: u32,
    inputs: Vec<i32>,
    outputs: Vec<i32>,
    options: OpOptions,
}

fn build_model(
    opcodes: &[i32],
    tensors: &[TensorSpec],
    ops: &[OpSpec],
    graph_inputs: &[i32],
    graph_outputs: &[i32],
) -> Vec<u8> {
    let mut fbb = FlatBufferBuilder::new();

    // Buffer 0 is the conventional empty sentinel; constants follow in
    // tensor order.
    let mut buffer_offsets = vec![schema::BufferBuilder::new(&mut fbb).finish()];
    let mut tensor_buffers = Vec::with_capacity(tensors.len());
    for spec in tensors {
        match &spec.data {
            Some(bytes) => {
                let blob = fbb.create_vector(bytes);
                let mut buffer = schema::BufferBuilder::new(&mut fbb);
                buffer.add_data(blob);
                buffer_offsets.push(buffer.finish());
                tensor_buffers.push((buffer_offsets.len() - 1) as u32);
            }
            None => tensor_buffers.push(0),
        }
    }
    let buffers = fbb.create_vector(&buffer_offsets);

    let mut tensor_offsets = Vec::with_capacity(tensors.len());
    for (spec, buffer) in tensors.iter().zip(&tensor_buffers) {
        let shape = fbb.create_vector(&spec.shape);
        let mut tensor = schema::TensorBuilder::new(&mut fbb);
        tensor.add_shape(shape);
        tensor.add_type(schema::TENSOR_TYPE_FLOAT32);
        tensor.add_buffer(*buffer);
        tensor_offsets.push(tensor.finish());
    }
    let tensor_vec = fbb.create_vector(&tensor_offsets);

    let mut code_offsets = Vec::with_capacity(opcodes.len());
    for code in opcodes {
        let mut builder = schema::OperatorCodeBuilder::new(&mut fbb);
        builder.add_builtin_code(*code);
        code_offsets.push(builder.finish());
    }
    let codes = fbb.create_vector(&code_offsets);

    let mut op_offsets = Vec::with_capacity(ops.len());
    for op in ops {
        let inputs = fbb.create_vector(&op.inputs);
        let outputs = fbb.create_vector(&op.outputs);
        let options = match op.options {
            OpOptions::None => None,
            OpOptions::TransposeConv {
                padding,
                stride_w,
                stride_h,
            } => {
                let mut options = schema::TransposeConvOptionsBuilder::new(&mut fbb);
                options.add_padding(padding);
                options.add_stride_w(stride_w);
                options.add_stride_h(stride_h);
                Some((
                    schema::BUILTIN_OPTIONS_TRANSPOSE_CONV_OPTIONS,
                    options.finish().as_union_value(),
                ))
            }
        };
        let mut builder = schema::OperatorBuilder::new(&mut fbb);
        builder.add_opcode_index(op.opcode);
        builder.add_inputs(inputs);
        builder.add_outputs(outputs);
        if let Some((type_, table)) = options {
            builder.add_builtin_options_type(type_);
            builder.add_builtin_options(table);
        }
        op_offsets.push(builder.finish());
    }
    let op_vec = fbb.create_vector(&op_offsets);

    let inputs = fbb.create_vector(graph_inputs);
    let outputs = fbb.create_vector(graph_outputs);
    let mut subgraph = schema::SubGraphBuilder::new(&mut fbb);
    subgraph.add_tensors(tensor_vec);
    subgraph.add_inputs(inputs);
    subgraph.add_outputs(outputs);
    subgraph.add_operators(op_vec);
    let subgraph = subgraph.finish();
    let subgraphs = fbb.create_vector(&[subgraph]);

    let mut model = schema::ModelBuilder::new(&mut fbb);
    model.add_version(3);
    model.add_operator_codes(codes);
    model.add_subgraphs(subgraphs);
    model.add_buffers(buffers);
    let model = model.finish();
    schema::finish_model_buffer(&mut fbb, model);
    fbb.finished_data().to_vec()
}

/// A 2x2 model whose single 1x1 convolution is the identity map.
fn identity_conv_model() -> Vec<u8> {
    // Weights stored output-feature-minor: (in, out) element at in * 3 + out.
    let identity = [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0];
    build_model(
        &[schema::BUILTIN_OPERATOR_CONV_2D],
        &[
            TensorSpec::variable(&[1, 2, 2, 3]),
            TensorSpec::constant_f32(&[1, 1, 3, 3], &identity),
            TensorSpec::constant_f32(&[3], &[0.0, 0.0, 0.0]),
            TensorSpec::variable(&[1, 2, 2, 3]),
        ],
        &[OpSpec {
            opcode: 0,
            inputs: vec![0, 1, 2],
            outputs: vec![3],
            options: OpOptions::None,
        }],
        &[0],
        &[3],
    )
}

fn relu_model() -> Vec<u8> {
    build_model(
        &[schema::BUILTIN_OPERATOR_RELU],
        &[
            TensorSpec::variable(&[1, 1, 2, 3]),
            TensorSpec::variable(&[1, 1, 2, 3]),
        ],
        &[OpSpec {
            opcode: 0,
            inputs: vec![0],
            outputs: vec![1],
            options: OpOptions::None,
        }],
        &[0],
        &[1],
    )
}

/// A 5x1 model with one strided transposed convolution whose 1x4 kernel has a
/// single unit tap, so every surviving output element is a copy of an input
/// element.
fn strided_deconv_model() -> Vec<u8> {
    // Weights output-feature-minor [1, 4, in, out]: unit tap at kx = 2 on the
    // matching channel.
    let mut weights = vec![0.0; 4 * 3 * 3];
    for c in 0..3 {
        weights[(2 * 3 + c) * 3 + c] = 1.0;
    }
    build_model(
        &[schema::BUILTIN_OPERATOR_TRANSPOSE_CONV],
        &[
            TensorSpec::variable(&[1, 1, 5, 3]),
            TensorSpec::constant_f32(&[4], &[1.0, 1.0, 8.0, 3.0]),
            TensorSpec::constant_f32(&[1, 4, 3, 3], &weights),
            TensorSpec::constant_f32(&[3], &[0.0, 0.0, 0.0]),
            TensorSpec::variable(&[1, 1, 8, 3]),
        ],
        &[OpSpec {
            opcode: 0,
            inputs: vec![1, 2, 0, 3],
            outputs: vec![4],
            options: OpOptions::TransposeConv {
                padding: schema::PADDING_SAME,
                stride_w: 2,
                stride_h: 1,
            },
        }],
        &[0],
        &[4],
    )
}

fn test_context() -> Option<Arc<GpuContext>> {
    match GpuContext::init_with_fallback(&GpuContextOptions::default()) {
        GpuAvailability::Available(ctx) => Some(ctx),
        other => {
            eprintln!("Skipping GPU importer test: {other:?}");
            None
        }
    }
}

fn run_on_pixels(ctx: &Arc<GpuContext>, network: &StyleNetwork, pixels: &[u8]) -> Vec<u8> {
    use wgpu::util::DeviceExt;
    let packed = pack_rgba_pixels(pixels);
    let frame = ctx
        .device()
        .create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("importer_test_frame"),
            contents: bytemuck::cast_slice(&packed),
            usage: wgpu::BufferUsages::STORAGE
                | wgpu::BufferUsages::COPY_SRC
                | wgpu::BufferUsages::COPY_DST,
        });
    network.run(&frame).expect("network run");

    let size = (packed.len() * 4) as u64;
    let staging = ctx.device().create_buffer(&wgpu::BufferDescriptor {
        label: Some("importer_test_readback"),
        size,
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });
    let mut encoder = ctx
        .device()
        .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: None });
    encoder.copy_buffer_to_buffer(&frame, 0, &staging, 0, size);
    ctx.queue().submit(Some(encoder.finish()));

    let slice = staging.slice(..);
    let (tx, rx) = std::sync::mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = tx.send(result);
    });
    ctx.device()
        .poll(wgpu::PollType::Wait {
            submission_index: None,
            timeout: None,
        })
        .expect("poll");
    rx.recv().expect("map callback").expect("map staging");
    let words: Vec<u32> = bytemuck::cast_slice(&slice.get_mapped_range()).to_vec();
    staging.unmap();
    unpack_rgba_pixels(&words)
}

#[test]
fn single_io_check_rejects_two_graph_inputs() {
    let bytes = build_model(
        &[schema::BUILTIN_OPERATOR_RELU],
        &[
            TensorSpec::variable(&[1, 2, 2, 3]),
            TensorSpec::variable(&[1, 2, 2, 3]),
            TensorSpec::variable(&[1, 2, 2, 3]),
        ],
        &[],
        &[0, 1],
        &[2],
    );
    let model = StyleModel::parse(&bytes).expect("parse");
    let err = ensure_single_io(&model.subgraph()).expect_err("must fail");
    assert!(matches!(
        err,
        ImportError::GraphIo {
            inputs: 2,
            outputs: 1
        }
    ));
}

#[test]
fn single_io_check_accepts_one_in_one_out() {
    let bytes = relu_model();
    let model = StyleModel::parse(&bytes).expect("parse");
    let (input, output) = ensure_single_io(&model.subgraph()).expect("single io");
    assert_eq!((input, output), (0, 1));
}

#[test]
fn unknown_operator_code_is_fatal() {
    let Some(ctx) = test_context() else {
        return;
    };
    // MUL is adjacent to the supported set but not part of it.
    let bytes = build_model(
        &[18],
        &[
            TensorSpec::variable(&[1, 2, 2, 3]),
            TensorSpec::variable(&[1, 2, 2, 3]),
        ],
        &[OpSpec {
            opcode: 0,
            inputs: vec![0],
            outputs: vec![1],
            options: OpOptions::None,
        }],
        &[0],
        &[1],
    );
    let mut network = StyleNetwork::new(ctx).expect("network");
    let err = import_style_model(&bytes, frame(2, 2), &mut network).expect_err("must fail");
    let import = err.downcast_ref::<ImportError>().expect("import error");
    assert!(matches!(
        import,
        ImportError::UnknownOperator {
            operator: 0,
            code: 18
        }
    ));
}

#[test]
fn unproduced_operand_is_fatal() {
    let Some(ctx) = test_context() else {
        return;
    };
    // Tensor 1 exists but nothing writes it before the add reads it.
    let bytes = build_model(
        &[schema::BUILTIN_OPERATOR_ADD],
        &[
            TensorSpec::variable(&[1, 2, 2, 3]),
            TensorSpec::variable(&[1, 2, 2, 3]),
            TensorSpec::variable(&[1, 2, 2, 3]),
        ],
        &[OpSpec {
            opcode: 0,
            inputs: vec![0, 1],
            outputs: vec![2],
            options: OpOptions::None,
        }],
        &[0],
        &[2],
    );
    let mut network = StyleNetwork::new(ctx).expect("network");
    let err = import_style_model(&bytes, frame(2, 2), &mut network).expect_err("must fail");
    let import = err.downcast_ref::<ImportError>().expect("import error");
    assert!(matches!(
        import,
        ImportError::MissingProducer {
            operator: 0,
            tensor: 1
        }
    ));
}

#[test]
fn declared_shape_mismatch_is_advisory() {
    let Some(ctx) = test_context() else {
        return;
    };
    // The model claims a 4x4 input; the caller's 2x2 frame wins and the
    // mismatch only gets logged.
    let bytes = build_model(
        &[schema::BUILTIN_OPERATOR_RELU],
        &[
            TensorSpec::variable(&[1, 4, 4, 3]),
            TensorSpec::variable(&[1, 4, 4, 3]),
        ],
        &[OpSpec {
            opcode: 0,
            inputs: vec![0],
            outputs: vec![1],
            options: OpOptions::None,
        }],
        &[0],
        &[1],
    );
    let mut network = StyleNetwork::new(ctx).expect("network");
    import_style_model(&bytes, frame(2, 2), &mut network).expect("advisory import");
    assert!(network.step_count() > 0);
    let configured = network.frame_config().expect("frame endpoints configured");
    assert_eq!((configured.width, configured.height), (2, 2));
}

#[test]
fn identity_convolution_applies_brightness_curve() {
    let Some(ctx) = test_context() else {
        return;
    };
    let mut network = StyleNetwork::new(ctx.clone()).expect("network");
    import_style_model(&identity_conv_model(), frame(2, 2), &mut network).expect("import");

    // Dequantize, gamma encode, identity conv, gamma decode, quantize.
    // The frame endpoints bake in a 1.7x brightness lift, so an identity
    // graph maps each channel to clamp(1.7 * value).
    let pixels: Vec<u8> = vec![
        10, 20, 30, 255, 40, 50, 60, 128, 70, 80, 90, 0, 100, 110, 120, 7,
    ];
    let output = run_on_pixels(&ctx, &network, &pixels);
    for (i, (&got, &fed)) in output.iter().zip(pixels.iter()).enumerate() {
        if i % 4 == 3 {
            assert_eq!(got, fed, "alpha must pass through untouched");
        } else {
            let expected = (f32::from(fed) * 1.7).round().min(255.0) as i32;
            let diff = (i32::from(got) - expected).abs();
            assert!(
                diff <= 2,
                "channel {i}: fed {fed}, expected about {expected}, got {got}"
            );
        }
    }
}

#[test]
fn relu_graph_matches_identity_on_positive_frames() {
    let Some(ctx) = test_context() else {
        return;
    };
    let mut network = StyleNetwork::new(ctx.clone()).expect("network");
    import_style_model(&relu_model(), frame(2, 1), &mut network).expect("import");

    let pixels: Vec<u8> = vec![5, 50, 100, 255, 1, 2, 3, 9];
    let output = run_on_pixels(&ctx, &network, &pixels);
    for (i, (&got, &fed)) in output.iter().zip(pixels.iter()).enumerate() {
        if i % 4 == 3 {
            assert_eq!(got, fed);
        } else {
            let expected = (f32::from(fed) * 1.7).round().min(255.0) as i32;
            assert!((i32::from(got) - expected).abs() <= 2);
        }
    }
}

#[test]
fn strided_deconv_same_padding_follows_the_input_extent() {
    let Some(ctx) = test_context() else {
        return;
    };
    let mut network = StyleNetwork::new(ctx.clone()).expect("network");
    import_style_model(&strided_deconv_model(), frame(5, 1), &mut network).expect("import");

    // Width 5, kernel 4, stride 2: same padding derived from the input extent
    // is (1, 2), so the gather offsets by two taps and output element 2t is a
    // copy of input element t. Deriving it as kernel - stride would offset by
    // a single tap and push every copy onto the odd positions instead.
    let pixels: Vec<u8> = vec![
        100, 50, 25, 255, 40, 80, 120, 255, 10, 20, 30, 255, 90, 60, 45, 255, 5, 15, 35, 255,
    ];
    let output = run_on_pixels(&ctx, &network, &pixels);
    for pixel in 0..5 {
        for channel in 0..3 {
            let got = i32::from(output[pixel * 4 + channel]);
            let expected = if pixel % 2 == 0 {
                let fed = f32::from(pixels[(pixel / 2) * 4 + channel]);
                (fed * 1.7).round().min(255.0) as i32
            } else {
                0
            };
            assert!(
                (got - expected).abs() <= 2,
                "pixel {pixel} channel {channel}: expected about {expected}, got {got}"
            );
        }
        assert_eq!(output[pixel * 4 + 3], 255, "alpha must pass through");
    }
}

#[test]
fn repeated_runs_are_bit_identical() {
    let Some(ctx) = test_context() else {
        return;
    };
    let mut network = StyleNetwork::new(ctx.clone()).expect("network");
    import_style_model(&identity_conv_model(), frame(2, 2), &mut network).expect("import");

    let pixels: Vec<u8> = vec![
        13, 37, 200, 255, 0, 255, 91, 3, 66, 66, 66, 66, 128, 64, 32, 16,
    ];
    let first = run_on_pixels(&ctx, &network, &pixels);
    let second = run_on_pixels(&ctx, &network, &pixels);
    assert_eq!(first, second);
}

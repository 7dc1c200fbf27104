//! Hand-maintained subset of the TensorFlow Lite flatbuffer schema.
//!
//! Mirrors the layout produced by `flatc --rust` for `schema.fbs`, trimmed to
//! the tables and fields the style-transfer importer reads. Field virtual
//! table offsets match the upstream schema so real `.tflite` files parse with
//! these accessors; the builders exist so tests can assemble models in
//! memory.

#![allow(clippy::derivable_impls)]

use flatbuffers::{self, Follow, ForwardsUOffset, Vector};

/// `BuiltinOperator` values for the operator kinds the importer dispatches on.
pub const BUILTIN_OPERATOR_ADD: i32 = 0;
pub const BUILTIN_OPERATOR_CONV_2D: i32 = 3;
pub const BUILTIN_OPERATOR_DEPTHWISE_CONV_2D: i32 = 4;
pub const BUILTIN_OPERATOR_RELU: i32 = 19;
pub const BUILTIN_OPERATOR_TRANSPOSE_CONV: i32 = 67;

/// `BuiltinOptions` union discriminants for the option tables we decode.
pub const BUILTIN_OPTIONS_NONE: u8 = 0;
pub const BUILTIN_OPTIONS_CONV_2D_OPTIONS: u8 = 1;
pub const BUILTIN_OPTIONS_DEPTHWISE_CONV_2D_OPTIONS: u8 = 2;
pub const BUILTIN_OPTIONS_ADD_OPTIONS: u8 = 11;
pub const BUILTIN_OPTIONS_TRANSPOSE_CONV_OPTIONS: u8 = 49;

/// `Padding` enum.
pub const PADDING_SAME: i8 = 0;
pub const PADDING_VALID: i8 = 1;

/// `ActivationFunctionType` enum (only the values this model family uses).
pub const ACTIVATION_NONE: i8 = 0;
pub const ACTIVATION_RELU: i8 = 1;

/// `TensorType` enum.
pub const TENSOR_TYPE_FLOAT32: i8 = 0;
pub const TENSOR_TYPE_INT32: i8 = 2;
pub const TENSOR_TYPE_UINT8: i8 = 3;

pub const MODEL_IDENTIFIER: &str = "TFL3";

/// Returns true when the buffer carries the TFLite file identifier.
pub fn model_buffer_has_identifier(buf: &[u8]) -> bool {
    flatbuffers::buffer_has_identifier(buf, MODEL_IDENTIFIER, false)
}

// ---------------------------------------------------------------------------
// Buffer

#[derive(Copy, Clone, PartialEq)]
pub struct Buffer<'a> {
    pub _tab: flatbuffers::Table<'a>,
}

impl<'a> Follow<'a> for Buffer<'a> {
    type Inner = Buffer<'a>;
    #[inline]
    unsafe fn follow(buf: &'a [u8], loc: usize) -> Self::Inner {
        Self {
            _tab: flatbuffers::Table::new(buf, loc),
        }
    }
}

impl<'a> Buffer<'a> {
    pub const VT_DATA: flatbuffers::VOffsetT = 4;

    pub fn data(&self) -> Option<Vector<'a, u8>> {
        unsafe {
            self._tab
                .get::<ForwardsUOffset<Vector<'a, u8>>>(Buffer::VT_DATA, None)
        }
    }
}

impl flatbuffers::Verifiable for Buffer<'_> {
    #[inline]
    fn run_verifier(
        v: &mut flatbuffers::Verifier,
        pos: usize,
    ) -> Result<(), flatbuffers::InvalidFlatbuffer> {
        v.visit_table(pos)?
            .visit_field::<ForwardsUOffset<Vector<'_, u8>>>("data", Self::VT_DATA, false)?
            .finish();
        Ok(())
    }
}

pub struct BufferBuilder<'a: 'b, 'b> {
    fbb_: &'b mut flatbuffers::FlatBufferBuilder<'a>,
    start_: flatbuffers::WIPOffset<flatbuffers::TableUnfinishedWIPOffset>,
}

impl<'a: 'b, 'b> BufferBuilder<'a, 'b> {
    pub fn new(fbb: &'b mut flatbuffers::FlatBufferBuilder<'a>) -> Self {
        let start = fbb.start_table();
        Self { fbb_: fbb, start_: start }
    }

    pub fn add_data(&mut self, data: flatbuffers::WIPOffset<Vector<'b, u8>>) {
        self.fbb_
            .push_slot_always::<flatbuffers::WIPOffset<_>>(Buffer::VT_DATA, data);
    }

    pub fn finish(self) -> flatbuffers::WIPOffset<Buffer<'a>> {
        let o = self.fbb_.end_table(self.start_);
        flatbuffers::WIPOffset::new(o.value())
    }
}

// ---------------------------------------------------------------------------
// Tensor

#[derive(Copy, Clone, PartialEq)]
pub struct Tensor<'a> {
    pub _tab: flatbuffers::Table<'a>,
}

impl<'a> Follow<'a> for Tensor<'a> {
    type Inner = Tensor<'a>;
    #[inline]
    unsafe fn follow(buf: &'a [u8], loc: usize) -> Self::Inner {
        Self {
            _tab: flatbuffers::Table::new(buf, loc),
        }
    }
}

impl<'a> Tensor<'a> {
    pub const VT_SHAPE: flatbuffers::VOffsetT = 4;
    pub const VT_TYPE: flatbuffers::VOffsetT = 6;
    pub const VT_BUFFER: flatbuffers::VOffsetT = 8;
    pub const VT_NAME: flatbuffers::VOffsetT = 10;

    pub fn shape(&self) -> Option<Vector<'a, i32>> {
        unsafe {
            self._tab
                .get::<ForwardsUOffset<Vector<'a, i32>>>(Tensor::VT_SHAPE, None)
        }
    }

    pub fn type_(&self) -> i8 {
        unsafe { self._tab.get::<i8>(Tensor::VT_TYPE, Some(0)).unwrap() }
    }

    pub fn buffer(&self) -> u32 {
        unsafe { self._tab.get::<u32>(Tensor::VT_BUFFER, Some(0)).unwrap() }
    }

    pub fn name(&self) -> Option<&'a str> {
        unsafe {
            self._tab
                .get::<ForwardsUOffset<&str>>(Tensor::VT_NAME, None)
        }
    }
}

impl flatbuffers::Verifiable for Tensor<'_> {
    #[inline]
    fn run_verifier(
        v: &mut flatbuffers::Verifier,
        pos: usize,
    ) -> Result<(), flatbuffers::InvalidFlatbuffer> {
        v.visit_table(pos)?
            .visit_field::<ForwardsUOffset<Vector<'_, i32>>>("shape", Self::VT_SHAPE, false)?
            .visit_field::<i8>("type_", Self::VT_TYPE, false)?
            .visit_field::<u32>("buffer", Self::VT_BUFFER, false)?
            .visit_field::<ForwardsUOffset<&str>>("name", Self::VT_NAME, false)?
            .finish();
        Ok(())
    }
}

pub struct TensorBuilder<'a: 'b, 'b> {
    fbb_: &'b mut flatbuffers::FlatBufferBuilder<'a>,
    start_: flatbuffers::WIPOffset<flatbuffers::TableUnfinishedWIPOffset>,
}

impl<'a: 'b, 'b> TensorBuilder<'a, 'b> {
    pub fn new(fbb: &'b mut flatbuffers::FlatBufferBuilder<'a>) -> Self {
        let start = fbb.start_table();
        Self { fbb_: fbb, start_: start }
    }

    pub fn add_shape(&mut self, shape: flatbuffers::WIPOffset<Vector<'b, i32>>) {
        self.fbb_
            .push_slot_always::<flatbuffers::WIPOffset<_>>(Tensor::VT_SHAPE, shape);
    }

    pub fn add_type(&mut self, type_: i8) {
        self.fbb_.push_slot::<i8>(Tensor::VT_TYPE, type_, 0);
    }

    pub fn add_buffer(&mut self, buffer: u32) {
        self.fbb_.push_slot::<u32>(Tensor::VT_BUFFER, buffer, 0);
    }

    pub fn add_name(&mut self, name: flatbuffers::WIPOffset<&'b str>) {
        self.fbb_
            .push_slot_always::<flatbuffers::WIPOffset<_>>(Tensor::VT_NAME, name);
    }

    pub fn finish(self) -> flatbuffers::WIPOffset<Tensor<'a>> {
        let o = self.fbb_.end_table(self.start_);
        flatbuffers::WIPOffset::new(o.value())
    }
}

// ---------------------------------------------------------------------------
// OperatorCode

#[derive(Copy, Clone, PartialEq)]
pub struct OperatorCode<'a> {
    pub _tab: flatbuffers::Table<'a>,
}

impl<'a> Follow<'a> for OperatorCode<'a> {
    type Inner = OperatorCode<'a>;
    #[inline]
    unsafe fn follow(buf: &'a [u8], loc: usize) -> Self::Inner {
        Self {
            _tab: flatbuffers::Table::new(buf, loc),
        }
    }
}

impl<'a> OperatorCode<'a> {
    pub const VT_DEPRECATED_BUILTIN_CODE: flatbuffers::VOffsetT = 4;
    pub const VT_CUSTOM_CODE: flatbuffers::VOffsetT = 6;
    pub const VT_VERSION: flatbuffers::VOffsetT = 8;
    pub const VT_BUILTIN_CODE: flatbuffers::VOffsetT = 10;

    pub fn deprecated_builtin_code(&self) -> i8 {
        unsafe {
            self._tab
                .get::<i8>(OperatorCode::VT_DEPRECATED_BUILTIN_CODE, Some(0))
                .unwrap()
        }
    }

    pub fn custom_code(&self) -> Option<&'a str> {
        unsafe {
            self._tab
                .get::<ForwardsUOffset<&str>>(OperatorCode::VT_CUSTOM_CODE, None)
        }
    }

    pub fn version(&self) -> i32 {
        unsafe {
            self._tab
                .get::<i32>(OperatorCode::VT_VERSION, Some(1))
                .unwrap()
        }
    }

    pub fn builtin_code(&self) -> i32 {
        unsafe {
            self._tab
                .get::<i32>(OperatorCode::VT_BUILTIN_CODE, Some(0))
                .unwrap()
        }
    }
}

impl flatbuffers::Verifiable for OperatorCode<'_> {
    #[inline]
    fn run_verifier(
        v: &mut flatbuffers::Verifier,
        pos: usize,
    ) -> Result<(), flatbuffers::InvalidFlatbuffer> {
        v.visit_table(pos)?
            .visit_field::<i8>(
                "deprecated_builtin_code",
                Self::VT_DEPRECATED_BUILTIN_CODE,
                false,
            )?
            .visit_field::<ForwardsUOffset<&str>>("custom_code", Self::VT_CUSTOM_CODE, false)?
            .visit_field::<i32>("version", Self::VT_VERSION, false)?
            .visit_field::<i32>("builtin_code", Self::VT_BUILTIN_CODE, false)?
            .finish();
        Ok(())
    }
}

pub struct OperatorCodeBuilder<'a: 'b, 'b> {
    fbb_: &'b mut flatbuffers::FlatBufferBuilder<'a>,
    start_: flatbuffers::WIPOffset<flatbuffers::TableUnfinishedWIPOffset>,
}

impl<'a: 'b, 'b> OperatorCodeBuilder<'a, 'b> {
    pub fn new(fbb: &'b mut flatbuffers::FlatBufferBuilder<'a>) -> Self {
        let start = fbb.start_table();
        Self { fbb_: fbb, start_: start }
    }

    pub fn add_deprecated_builtin_code(&mut self, code: i8) {
        self.fbb_
            .push_slot::<i8>(OperatorCode::VT_DEPRECATED_BUILTIN_CODE, code, 0);
    }

    pub fn add_version(&mut self, version: i32) {
        self.fbb_.push_slot::<i32>(OperatorCode::VT_VERSION, version, 1);
    }

    pub fn add_builtin_code(&mut self, code: i32) {
        self.fbb_
            .push_slot::<i32>(OperatorCode::VT_BUILTIN_CODE, code, 0);
    }

    pub fn finish(self) -> flatbuffers::WIPOffset<OperatorCode<'a>> {
        let o = self.fbb_.end_table(self.start_);
        flatbuffers::WIPOffset::new(o.value())
    }
}

// ---------------------------------------------------------------------------
// Conv2DOptions

#[derive(Copy, Clone, PartialEq)]
pub struct Conv2DOptions<'a> {
    pub _tab: flatbuffers::Table<'a>,
}

impl<'a> Follow<'a> for Conv2DOptions<'a> {
    type Inner = Conv2DOptions<'a>;
    #[inline]
    unsafe fn follow(buf: &'a [u8], loc: usize) -> Self::Inner {
        Self {
            _tab: flatbuffers::Table::new(buf, loc),
        }
    }
}

impl<'a> Conv2DOptions<'a> {
    pub const VT_PADDING: flatbuffers::VOffsetT = 4;
    pub const VT_STRIDE_W: flatbuffers::VOffsetT = 6;
    pub const VT_STRIDE_H: flatbuffers::VOffsetT = 8;
    pub const VT_FUSED_ACTIVATION_FUNCTION: flatbuffers::VOffsetT = 10;
    pub const VT_DILATION_W_FACTOR: flatbuffers::VOffsetT = 12;
    pub const VT_DILATION_H_FACTOR: flatbuffers::VOffsetT = 14;

    pub(crate) unsafe fn init_from_table(table: flatbuffers::Table<'a>) -> Self {
        Self { _tab: table }
    }

    pub fn padding(&self) -> i8 {
        unsafe {
            self._tab
                .get::<i8>(Conv2DOptions::VT_PADDING, Some(0))
                .unwrap()
        }
    }

    pub fn stride_w(&self) -> i32 {
        unsafe {
            self._tab
                .get::<i32>(Conv2DOptions::VT_STRIDE_W, Some(0))
                .unwrap()
        }
    }

    pub fn stride_h(&self) -> i32 {
        unsafe {
            self._tab
                .get::<i32>(Conv2DOptions::VT_STRIDE_H, Some(0))
                .unwrap()
        }
    }

    pub fn fused_activation_function(&self) -> i8 {
        unsafe {
            self._tab
                .get::<i8>(Conv2DOptions::VT_FUSED_ACTIVATION_FUNCTION, Some(0))
                .unwrap()
        }
    }

    pub fn dilation_w_factor(&self) -> i32 {
        unsafe {
            self._tab
                .get::<i32>(Conv2DOptions::VT_DILATION_W_FACTOR, Some(1))
                .unwrap()
        }
    }

    pub fn dilation_h_factor(&self) -> i32 {
        unsafe {
            self._tab
                .get::<i32>(Conv2DOptions::VT_DILATION_H_FACTOR, Some(1))
                .unwrap()
        }
    }
}

impl flatbuffers::Verifiable for Conv2DOptions<'_> {
    #[inline]
    fn run_verifier(
        v: &mut flatbuffers::Verifier,
        pos: usize,
    ) -> Result<(), flatbuffers::InvalidFlatbuffer> {
        v.visit_table(pos)?
            .visit_field::<i8>("padding", Self::VT_PADDING, false)?
            .visit_field::<i32>("stride_w", Self::VT_STRIDE_W, false)?
            .visit_field::<i32>("stride_h", Self::VT_STRIDE_H, false)?
            .visit_field::<i8>(
                "fused_activation_function",
                Self::VT_FUSED_ACTIVATION_FUNCTION,
                false,
            )?
            .visit_field::<i32>("dilation_w_factor", Self::VT_DILATION_W_FACTOR, false)?
            .visit_field::<i32>("dilation_h_factor", Self::VT_DILATION_H_FACTOR, false)?
            .finish();
        Ok(())
    }
}

pub struct Conv2DOptionsBuilder<'a: 'b, 'b> {
    fbb_: &'b mut flatbuffers::FlatBufferBuilder<'a>,
    start_: flatbuffers::WIPOffset<flatbuffers::TableUnfinishedWIPOffset>,
}

impl<'a: 'b, 'b> Conv2DOptionsBuilder<'a, 'b> {
    pub fn new(fbb: &'b mut flatbuffers::FlatBufferBuilder<'a>) -> Self {
        let start = fbb.start_table();
        Self { fbb_: fbb, start_: start }
    }

    pub fn add_padding(&mut self, padding: i8) {
        self.fbb_.push_slot::<i8>(Conv2DOptions::VT_PADDING, padding, 0);
    }

    pub fn add_stride_w(&mut self, stride_w: i32) {
        self.fbb_.push_slot::<i32>(Conv2DOptions::VT_STRIDE_W, stride_w, 0);
    }

    pub fn add_stride_h(&mut self, stride_h: i32) {
        self.fbb_.push_slot::<i32>(Conv2DOptions::VT_STRIDE_H, stride_h, 0);
    }

    pub fn add_fused_activation_function(&mut self, activation: i8) {
        self.fbb_
            .push_slot::<i8>(Conv2DOptions::VT_FUSED_ACTIVATION_FUNCTION, activation, 0);
    }

    pub fn add_dilation_w_factor(&mut self, dilation: i32) {
        self.fbb_
            .push_slot::<i32>(Conv2DOptions::VT_DILATION_W_FACTOR, dilation, 1);
    }

    pub fn add_dilation_h_factor(&mut self, dilation: i32) {
        self.fbb_
            .push_slot::<i32>(Conv2DOptions::VT_DILATION_H_FACTOR, dilation, 1);
    }

    pub fn finish(self) -> flatbuffers::WIPOffset<Conv2DOptions<'a>> {
        let o = self.fbb_.end_table(self.start_);
        flatbuffers::WIPOffset::new(o.value())
    }
}

// ---------------------------------------------------------------------------
// DepthwiseConv2DOptions

#[derive(Copy, Clone, PartialEq)]
pub struct DepthwiseConv2DOptions<'a> {
    pub _tab: flatbuffers::Table<'a>,
}

impl<'a> Follow<'a> for DepthwiseConv2DOptions<'a> {
    type Inner = DepthwiseConv2DOptions<'a>;
    #[inline]
    unsafe fn follow(buf: &'a [u8], loc: usize) -> Self::Inner {
        Self {
            _tab: flatbuffers::Table::new(buf, loc),
        }
    }
}

impl<'a> DepthwiseConv2DOptions<'a> {
    pub const VT_PADDING: flatbuffers::VOffsetT = 4;
    pub const VT_STRIDE_W: flatbuffers::VOffsetT = 6;
    pub const VT_STRIDE_H: flatbuffers::VOffsetT = 8;
    pub const VT_DEPTH_MULTIPLIER: flatbuffers::VOffsetT = 10;
    pub const VT_FUSED_ACTIVATION_FUNCTION: flatbuffers::VOffsetT = 12;
    pub const VT_DILATION_W_FACTOR: flatbuffers::VOffsetT = 14;
    pub const VT_DILATION_H_FACTOR: flatbuffers::VOffsetT = 16;

    pub(crate) unsafe fn init_from_table(table: flatbuffers::Table<'a>) -> Self {
        Self { _tab: table }
    }

    pub fn padding(&self) -> i8 {
        unsafe {
            self._tab
                .get::<i8>(DepthwiseConv2DOptions::VT_PADDING, Some(0))
                .unwrap()
        }
    }

    pub fn stride_w(&self) -> i32 {
        unsafe {
            self._tab
                .get::<i32>(DepthwiseConv2DOptions::VT_STRIDE_W, Some(0))
                .unwrap()
        }
    }

    pub fn stride_h(&self) -> i32 {
        unsafe {
            self._tab
                .get::<i32>(DepthwiseConv2DOptions::VT_STRIDE_H, Some(0))
                .unwrap()
        }
    }

    pub fn depth_multiplier(&self) -> i32 {
        unsafe {
            self._tab
                .get::<i32>(DepthwiseConv2DOptions::VT_DEPTH_MULTIPLIER, Some(0))
                .unwrap()
        }
    }

    pub fn fused_activation_function(&self) -> i8 {
        unsafe {
            self._tab
                .get::<i8>(DepthwiseConv2DOptions::VT_FUSED_ACTIVATION_FUNCTION, Some(0))
                .unwrap()
        }
    }

    pub fn dilation_w_factor(&self) -> i32 {
        unsafe {
            self._tab
                .get::<i32>(DepthwiseConv2DOptions::VT_DILATION_W_FACTOR, Some(1))
                .unwrap()
        }
    }

    pub fn dilation_h_factor(&self) -> i32 {
        unsafe {
            self._tab
                .get::<i32>(DepthwiseConv2DOptions::VT_DILATION_H_FACTOR, Some(1))
                .unwrap()
        }
    }
}

impl flatbuffers::Verifiable for DepthwiseConv2DOptions<'_> {
    #[inline]
    fn run_verifier(
        v: &mut flatbuffers::Verifier,
        pos: usize,
    ) -> Result<(), flatbuffers::InvalidFlatbuffer> {
        v.visit_table(pos)?
            .visit_field::<i8>("padding", Self::VT_PADDING, false)?
            .visit_field::<i32>("stride_w", Self::VT_STRIDE_W, false)?
            .visit_field::<i32>("stride_h", Self::VT_STRIDE_H, false)?
            .visit_field::<i32>("depth_multiplier", Self::VT_DEPTH_MULTIPLIER, false)?
            .visit_field::<i8>(
                "fused_activation_function",
                Self::VT_FUSED_ACTIVATION_FUNCTION,
                false,
            )?
            .visit_field::<i32>("dilation_w_factor", Self::VT_DILATION_W_FACTOR, false)?
            .visit_field::<i32>("dilation_h_factor", Self::VT_DILATION_H_FACTOR, false)?
            .finish();
        Ok(())
    }
}

pub struct DepthwiseConv2DOptionsBuilder<'a: 'b, 'b> {
    fbb_: &'b mut flatbuffers::FlatBufferBuilder<'a>,
    start_: flatbuffers::WIPOffset<flatbuffers::TableUnfinishedWIPOffset>,
}

impl<'a: 'b, 'b> DepthwiseConv2DOptionsBuilder<'a, 'b> {
    pub fn new(fbb: &'b mut flatbuffers::FlatBufferBuilder<'a>) -> Self {
        let start = fbb.start_table();
        Self { fbb_: fbb, start_: start }
    }

    pub fn add_padding(&mut self, padding: i8) {
        self.fbb_
            .push_slot::<i8>(DepthwiseConv2DOptions::VT_PADDING, padding, 0);
    }

    pub fn add_stride_w(&mut self, stride_w: i32) {
        self.fbb_
            .push_slot::<i32>(DepthwiseConv2DOptions::VT_STRIDE_W, stride_w, 0);
    }

    pub fn add_stride_h(&mut self, stride_h: i32) {
        self.fbb_
            .push_slot::<i32>(DepthwiseConv2DOptions::VT_STRIDE_H, stride_h, 0);
    }

    pub fn add_depth_multiplier(&mut self, depth_multiplier: i32) {
        self.fbb_
            .push_slot::<i32>(DepthwiseConv2DOptions::VT_DEPTH_MULTIPLIER, depth_multiplier, 0);
    }

    pub fn add_fused_activation_function(&mut self, activation: i8) {
        self.fbb_.push_slot::<i8>(
            DepthwiseConv2DOptions::VT_FUSED_ACTIVATION_FUNCTION,
            activation,
            0,
        );
    }

    pub fn add_dilation_w_factor(&mut self, dilation: i32) {
        self.fbb_
            .push_slot::<i32>(DepthwiseConv2DOptions::VT_DILATION_W_FACTOR, dilation, 1);
    }

    pub fn add_dilation_h_factor(&mut self, dilation: i32) {
        self.fbb_
            .push_slot::<i32>(DepthwiseConv2DOptions::VT_DILATION_H_FACTOR, dilation, 1);
    }

    pub fn finish(self) -> flatbuffers::WIPOffset<DepthwiseConv2DOptions<'a>> {
        let o = self.fbb_.end_table(self.start_);
        flatbuffers::WIPOffset::new(o.value())
    }
}

// ---------------------------------------------------------------------------
// TransposeConvOptions

#[derive(Copy, Clone, PartialEq)]
pub struct TransposeConvOptions<'a> {
    pub _tab: flatbuffers::Table<'a>,
}

impl<'a> Follow<'a> for TransposeConvOptions<'a> {
    type Inner = TransposeConvOptions<'a>;
    #[inline]
    unsafe fn follow(buf: &'a [u8], loc: usize) -> Self::Inner {
        Self {
            _tab: flatbuffers::Table::new(buf, loc),
        }
    }
}

impl<'a> TransposeConvOptions<'a> {
    pub const VT_PADDING: flatbuffers::VOffsetT = 4;
    pub const VT_STRIDE_W: flatbuffers::VOffsetT = 6;
    pub const VT_STRIDE_H: flatbuffers::VOffsetT = 8;
    pub const VT_FUSED_ACTIVATION_FUNCTION: flatbuffers::VOffsetT = 10;

    pub(crate) unsafe fn init_from_table(table: flatbuffers::Table<'a>) -> Self {
        Self { _tab: table }
    }

    pub fn padding(&self) -> i8 {
        unsafe {
            self._tab
                .get::<i8>(TransposeConvOptions::VT_PADDING, Some(0))
                .unwrap()
        }
    }

    pub fn stride_w(&self) -> i32 {
        unsafe {
            self._tab
                .get::<i32>(TransposeConvOptions::VT_STRIDE_W, Some(0))
                .unwrap()
        }
    }

    pub fn stride_h(&self) -> i32 {
        unsafe {
            self._tab
                .get::<i32>(TransposeConvOptions::VT_STRIDE_H, Some(0))
                .unwrap()
        }
    }

    pub fn fused_activation_function(&self) -> i8 {
        unsafe {
            self._tab
                .get::<i8>(TransposeConvOptions::VT_FUSED_ACTIVATION_FUNCTION, Some(0))
                .unwrap()
        }
    }
}

impl flatbuffers::Verifiable for TransposeConvOptions<'_> {
    #[inline]
    fn run_verifier(
        v: &mut flatbuffers::Verifier,
        pos: usize,
    ) -> Result<(), flatbuffers::InvalidFlatbuffer> {
        v.visit_table(pos)?
            .visit_field::<i8>("padding", Self::VT_PADDING, false)?
            .visit_field::<i32>("stride_w", Self::VT_STRIDE_W, false)?
            .visit_field::<i32>("stride_h", Self::VT_STRIDE_H, false)?
            .visit_field::<i8>(
                "fused_activation_function",
                Self::VT_FUSED_ACTIVATION_FUNCTION,
                false,
            )?
            .finish();
        Ok(())
    }
}

pub struct TransposeConvOptionsBuilder<'a: 'b, 'b> {
    fbb_: &'b mut flatbuffers::FlatBufferBuilder<'a>,
    start_: flatbuffers::WIPOffset<flatbuffers::TableUnfinishedWIPOffset>,
}

impl<'a: 'b, 'b> TransposeConvOptionsBuilder<'a, 'b> {
    pub fn new(fbb: &'b mut flatbuffers::FlatBufferBuilder<'a>) -> Self {
        let start = fbb.start_table();
        Self { fbb_: fbb, start_: start }
    }

    pub fn add_padding(&mut self, padding: i8) {
        self.fbb_
            .push_slot::<i8>(TransposeConvOptions::VT_PADDING, padding, 0);
    }

    pub fn add_stride_w(&mut self, stride_w: i32) {
        self.fbb_
            .push_slot::<i32>(TransposeConvOptions::VT_STRIDE_W, stride_w, 0);
    }

    pub fn add_stride_h(&mut self, stride_h: i32) {
        self.fbb_
            .push_slot::<i32>(TransposeConvOptions::VT_STRIDE_H, stride_h, 0);
    }

    pub fn finish(self) -> flatbuffers::WIPOffset<TransposeConvOptions<'a>> {
        let o = self.fbb_.end_table(self.start_);
        flatbuffers::WIPOffset::new(o.value())
    }
}

// ---------------------------------------------------------------------------
// AddOptions

#[derive(Copy, Clone, PartialEq)]
pub struct AddOptions<'a> {
    pub _tab: flatbuffers::Table<'a>,
}

impl<'a> Follow<'a> for AddOptions<'a> {
    type Inner = AddOptions<'a>;
    #[inline]
    unsafe fn follow(buf: &'a [u8], loc: usize) -> Self::Inner {
        Self {
            _tab: flatbuffers::Table::new(buf, loc),
        }
    }
}

impl<'a> AddOptions<'a> {
    pub const VT_FUSED_ACTIVATION_FUNCTION: flatbuffers::VOffsetT = 4;

    pub(crate) unsafe fn init_from_table(table: flatbuffers::Table<'a>) -> Self {
        Self { _tab: table }
    }

    pub fn fused_activation_function(&self) -> i8 {
        unsafe {
            self._tab
                .get::<i8>(AddOptions::VT_FUSED_ACTIVATION_FUNCTION, Some(0))
                .unwrap()
        }
    }
}

impl flatbuffers::Verifiable for AddOptions<'_> {
    #[inline]
    fn run_verifier(
        v: &mut flatbuffers::Verifier,
        pos: usize,
    ) -> Result<(), flatbuffers::InvalidFlatbuffer> {
        v.visit_table(pos)?
            .visit_field::<i8>(
                "fused_activation_function",
                Self::VT_FUSED_ACTIVATION_FUNCTION,
                false,
            )?
            .finish();
        Ok(())
    }
}

pub struct AddOptionsBuilder<'a: 'b, 'b> {
    fbb_: &'b mut flatbuffers::FlatBufferBuilder<'a>,
    start_: flatbuffers::WIPOffset<flatbuffers::TableUnfinishedWIPOffset>,
}

impl<'a: 'b, 'b> AddOptionsBuilder<'a, 'b> {
    pub fn new(fbb: &'b mut flatbuffers::FlatBufferBuilder<'a>) -> Self {
        let start = fbb.start_table();
        Self { fbb_: fbb, start_: start }
    }

    pub fn add_fused_activation_function(&mut self, activation: i8) {
        self.fbb_
            .push_slot::<i8>(AddOptions::VT_FUSED_ACTIVATION_FUNCTION, activation, 0);
    }

    pub fn finish(self) -> flatbuffers::WIPOffset<AddOptions<'a>> {
        let o = self.fbb_.end_table(self.start_);
        flatbuffers::WIPOffset::new(o.value())
    }
}

// ---------------------------------------------------------------------------
// Operator

#[derive(Copy, Clone, PartialEq)]
pub struct Operator<'a> {
    pub _tab: flatbuffers::Table<'a>,
}

impl<'a> Follow<'a> for Operator<'a> {
    type Inner = Operator<'a>;
    #[inline]
    unsafe fn follow(buf: &'a [u8], loc: usize) -> Self::Inner {
        Self {
            _tab: flatbuffers::Table::new(buf, loc),
        }
    }
}

impl<'a> Operator<'a> {
    pub const VT_OPCODE_INDEX: flatbuffers::VOffsetT = 4;
    pub const VT_INPUTS: flatbuffers::VOffsetT = 6;
    pub const VT_OUTPUTS: flatbuffers::VOffsetT = 8;
    pub const VT_BUILTIN_OPTIONS_TYPE: flatbuffers::VOffsetT = 10;
    pub const VT_BUILTIN_OPTIONS: flatbuffers::VOffsetT = 12;

    pub fn opcode_index(&self) -> u32 {
        unsafe {
            self._tab
                .get::<u32>(Operator::VT_OPCODE_INDEX, Some(0))
                .unwrap()
        }
    }

    pub fn inputs(&self) -> Option<Vector<'a, i32>> {
        unsafe {
            self._tab
                .get::<ForwardsUOffset<Vector<'a, i32>>>(Operator::VT_INPUTS, None)
        }
    }

    pub fn outputs(&self) -> Option<Vector<'a, i32>> {
        unsafe {
            self._tab
                .get::<ForwardsUOffset<Vector<'a, i32>>>(Operator::VT_OUTPUTS, None)
        }
    }

    pub fn builtin_options_type(&self) -> u8 {
        unsafe {
            self._tab
                .get::<u8>(Operator::VT_BUILTIN_OPTIONS_TYPE, Some(0))
                .unwrap()
        }
    }

    pub fn builtin_options(&self) -> Option<flatbuffers::Table<'a>> {
        unsafe {
            self._tab
                .get::<ForwardsUOffset<flatbuffers::Table<'a>>>(Operator::VT_BUILTIN_OPTIONS, None)
        }
    }

    pub fn builtin_options_as_conv_2d_options(&self) -> Option<Conv2DOptions<'a>> {
        if self.builtin_options_type() == BUILTIN_OPTIONS_CONV_2D_OPTIONS {
            self.builtin_options()
                .map(|t| unsafe { Conv2DOptions::init_from_table(t) })
        } else {
            None
        }
    }

    pub fn builtin_options_as_depthwise_conv_2d_options(
        &self,
    ) -> Option<DepthwiseConv2DOptions<'a>> {
        if self.builtin_options_type() == BUILTIN_OPTIONS_DEPTHWISE_CONV_2D_OPTIONS {
            self.builtin_options()
                .map(|t| unsafe { DepthwiseConv2DOptions::init_from_table(t) })
        } else {
            None
        }
    }

    pub fn builtin_options_as_transpose_conv_options(&self) -> Option<TransposeConvOptions<'a>> {
        if self.builtin_options_type() == BUILTIN_OPTIONS_TRANSPOSE_CONV_OPTIONS {
            self.builtin_options()
                .map(|t| unsafe { TransposeConvOptions::init_from_table(t) })
        } else {
            None
        }
    }

    pub fn builtin_options_as_add_options(&self) -> Option<AddOptions<'a>> {
        if self.builtin_options_type() == BUILTIN_OPTIONS_ADD_OPTIONS {
            self.builtin_options()
                .map(|t| unsafe { AddOptions::init_from_table(t) })
        } else {
            None
        }
    }
}

impl flatbuffers::Verifiable for Operator<'_> {
    #[inline]
    fn run_verifier(
        v: &mut flatbuffers::Verifier,
        pos: usize,
    ) -> Result<(), flatbuffers::InvalidFlatbuffer> {
        v.visit_table(pos)?
            .visit_field::<u32>("opcode_index", Self::VT_OPCODE_INDEX, false)?
            .visit_field::<ForwardsUOffset<Vector<'_, i32>>>("inputs", Self::VT_INPUTS, false)?
            .visit_field::<ForwardsUOffset<Vector<'_, i32>>>("outputs", Self::VT_OUTPUTS, false)?
            .visit_union::<u8, _>(
                "builtin_options_type",
                Self::VT_BUILTIN_OPTIONS_TYPE,
                "builtin_options",
                Self::VT_BUILTIN_OPTIONS,
                false,
                |key, v, pos| match key {
                    BUILTIN_OPTIONS_CONV_2D_OPTIONS => v
                        .verify_union_variant::<ForwardsUOffset<Conv2DOptions>>(
                            "Conv2DOptions",
                            pos,
                        ),
                    BUILTIN_OPTIONS_DEPTHWISE_CONV_2D_OPTIONS => v
                        .verify_union_variant::<ForwardsUOffset<DepthwiseConv2DOptions>>(
                            "DepthwiseConv2DOptions",
                            pos,
                        ),
                    BUILTIN_OPTIONS_ADD_OPTIONS => v
                        .verify_union_variant::<ForwardsUOffset<AddOptions>>("AddOptions", pos),
                    BUILTIN_OPTIONS_TRANSPOSE_CONV_OPTIONS => v
                        .verify_union_variant::<ForwardsUOffset<TransposeConvOptions>>(
                            "TransposeConvOptions",
                            pos,
                        ),
                    _ => Ok(()),
                },
            )?
            .finish();
        Ok(())
    }
}

pub struct OperatorBuilder<'a: 'b, 'b> {
    fbb_: &'b mut flatbuffers::FlatBufferBuilder<'a>,
    start_: flatbuffers::WIPOffset<flatbuffers::TableUnfinishedWIPOffset>,
}

impl<'a: 'b, 'b> OperatorBuilder<'a, 'b> {
    pub fn new(fbb: &'b mut flatbuffers::FlatBufferBuilder<'a>) -> Self {
        let start = fbb.start_table();
        Self { fbb_: fbb, start_: start }
    }

    pub fn add_opcode_index(&mut self, index: u32) {
        self.fbb_.push_slot::<u32>(Operator::VT_OPCODE_INDEX, index, 0);
    }

    pub fn add_inputs(&mut self, inputs: flatbuffers::WIPOffset<Vector<'b, i32>>) {
        self.fbb_
            .push_slot_always::<flatbuffers::WIPOffset<_>>(Operator::VT_INPUTS, inputs);
    }

    pub fn add_outputs(&mut self, outputs: flatbuffers::WIPOffset<Vector<'b, i32>>) {
        self.fbb_
            .push_slot_always::<flatbuffers::WIPOffset<_>>(Operator::VT_OUTPUTS, outputs);
    }

    pub fn add_builtin_options_type(&mut self, type_: u8) {
        self.fbb_
            .push_slot::<u8>(Operator::VT_BUILTIN_OPTIONS_TYPE, type_, 0);
    }

    pub fn add_builtin_options(
        &mut self,
        options: flatbuffers::WIPOffset<flatbuffers::UnionWIPOffset>,
    ) {
        self.fbb_
            .push_slot_always::<flatbuffers::WIPOffset<_>>(Operator::VT_BUILTIN_OPTIONS, options);
    }

    pub fn finish(self) -> flatbuffers::WIPOffset<Operator<'a>> {
        let o = self.fbb_.end_table(self.start_);
        flatbuffers::WIPOffset::new(o.value())
    }
}

// ---------------------------------------------------------------------------
// SubGraph

#[derive(Copy, Clone, PartialEq)]
pub struct SubGraph<'a> {
    pub _tab: flatbuffers::Table<'a>,
}

impl<'a> Follow<'a> for SubGraph<'a> {
    type Inner = SubGraph<'a>;
    #[inline]
    unsafe fn follow(buf: &'a [u8], loc: usize) -> Self::Inner {
        Self {
            _tab: flatbuffers::Table::new(buf, loc),
        }
    }
}

impl<'a> SubGraph<'a> {
    pub const VT_TENSORS: flatbuffers::VOffsetT = 4;
    pub const VT_INPUTS: flatbuffers::VOffsetT = 6;
    pub const VT_OUTPUTS: flatbuffers::VOffsetT = 8;
    pub const VT_OPERATORS: flatbuffers::VOffsetT = 10;
    pub const VT_NAME: flatbuffers::VOffsetT = 12;

    pub fn tensors(&self) -> Option<Vector<'a, ForwardsUOffset<Tensor<'a>>>> {
        unsafe {
            self._tab
                .get::<ForwardsUOffset<Vector<'a, ForwardsUOffset<Tensor>>>>(
                    SubGraph::VT_TENSORS,
                    None,
                )
        }
    }

    pub fn inputs(&self) -> Option<Vector<'a, i32>> {
        unsafe {
            self._tab
                .get::<ForwardsUOffset<Vector<'a, i32>>>(SubGraph::VT_INPUTS, None)
        }
    }

    pub fn outputs(&self) -> Option<Vector<'a, i32>> {
        unsafe {
            self._tab
                .get::<ForwardsUOffset<Vector<'a, i32>>>(SubGraph::VT_OUTPUTS, None)
        }
    }

    pub fn operators(&self) -> Option<Vector<'a, ForwardsUOffset<Operator<'a>>>> {
        unsafe {
            self._tab
                .get::<ForwardsUOffset<Vector<'a, ForwardsUOffset<Operator>>>>(
                    SubGraph::VT_OPERATORS,
                    None,
                )
        }
    }

    pub fn name(&self) -> Option<&'a str> {
        unsafe {
            self._tab
                .get::<ForwardsUOffset<&str>>(SubGraph::VT_NAME, None)
        }
    }
}

impl flatbuffers::Verifiable for SubGraph<'_> {
    #[inline]
    fn run_verifier(
        v: &mut flatbuffers::Verifier,
        pos: usize,
    ) -> Result<(), flatbuffers::InvalidFlatbuffer> {
        v.visit_table(pos)?
            .visit_field::<ForwardsUOffset<Vector<'_, ForwardsUOffset<Tensor>>>>(
                "tensors",
                Self::VT_TENSORS,
                false,
            )?
            .visit_field::<ForwardsUOffset<Vector<'_, i32>>>("inputs", Self::VT_INPUTS, false)?
            .visit_field::<ForwardsUOffset<Vector<'_, i32>>>("outputs", Self::VT_OUTPUTS, false)?
            .visit_field::<ForwardsUOffset<Vector<'_, ForwardsUOffset<Operator>>>>(
                "operators",
                Self::VT_OPERATORS,
                false,
            )?
            .visit_field::<ForwardsUOffset<&str>>("name", Self::VT_NAME, false)?
            .finish();
        Ok(())
    }
}

pub struct SubGraphBuilder<'a: 'b, 'b> {
    fbb_: &'b mut flatbuffers::FlatBufferBuilder<'a>,
    start_: flatbuffers::WIPOffset<flatbuffers::TableUnfinishedWIPOffset>,
}

impl<'a: 'b, 'b> SubGraphBuilder<'a, 'b> {
    pub fn new(fbb: &'b mut flatbuffers::FlatBufferBuilder<'a>) -> Self {
        let start = fbb.start_table();
        Self { fbb_: fbb, start_: start }
    }

    pub fn add_tensors(
        &mut self,
        tensors: flatbuffers::WIPOffset<Vector<'b, ForwardsUOffset<Tensor<'b>>>>,
    ) {
        self.fbb_
            .push_slot_always::<flatbuffers::WIPOffset<_>>(SubGraph::VT_TENSORS, tensors);
    }

    pub fn add_inputs(&mut self, inputs: flatbuffers::WIPOffset<Vector<'b, i32>>) {
        self.fbb_
            .push_slot_always::<flatbuffers::WIPOffset<_>>(SubGraph::VT_INPUTS, inputs);
    }

    pub fn add_outputs(&mut self, outputs: flatbuffers::WIPOffset<Vector<'b, i32>>) {
        self.fbb_
            .push_slot_always::<flatbuffers::WIPOffset<_>>(SubGraph::VT_OUTPUTS, outputs);
    }

    pub fn add_operators(
        &mut self,
        operators: flatbuffers::WIPOffset<Vector<'b, ForwardsUOffset<Operator<'b>>>>,
    ) {
        self.fbb_
            .push_slot_always::<flatbuffers::WIPOffset<_>>(SubGraph::VT_OPERATORS, operators);
    }

    pub fn finish(self) -> flatbuffers::WIPOffset<SubGraph<'a>> {
        let o = self.fbb_.end_table(self.start_);
        flatbuffers::WIPOffset::new(o.value())
    }
}

// ---------------------------------------------------------------------------
// Model

#[derive(Copy, Clone, PartialEq)]
pub struct Model<'a> {
    pub _tab: flatbuffers::Table<'a>,
}

impl<'a> Follow<'a> for Model<'a> {
    type Inner = Model<'a>;
    #[inline]
    unsafe fn follow(buf: &'a [u8], loc: usize) -> Self::Inner {
        Self {
            _tab: flatbuffers::Table::new(buf, loc),
        }
    }
}

impl<'a> Model<'a> {
    pub const VT_VERSION: flatbuffers::VOffsetT = 4;
    pub const VT_OPERATOR_CODES: flatbuffers::VOffsetT = 6;
    pub const VT_SUBGRAPHS: flatbuffers::VOffsetT = 8;
    pub const VT_DESCRIPTION: flatbuffers::VOffsetT = 10;
    pub const VT_BUFFERS: flatbuffers::VOffsetT = 12;

    pub fn version(&self) -> u32 {
        unsafe { self._tab.get::<u32>(Model::VT_VERSION, Some(0)).unwrap() }
    }

    pub fn operator_codes(&self) -> Option<Vector<'a, ForwardsUOffset<OperatorCode<'a>>>> {
        unsafe {
            self._tab
                .get::<ForwardsUOffset<Vector<'a, ForwardsUOffset<OperatorCode>>>>(
                    Model::VT_OPERATOR_CODES,
                    None,
                )
        }
    }

    pub fn subgraphs(&self) -> Option<Vector<'a, ForwardsUOffset<SubGraph<'a>>>> {
        unsafe {
            self._tab
                .get::<ForwardsUOffset<Vector<'a, ForwardsUOffset<SubGraph>>>>(
                    Model::VT_SUBGRAPHS,
                    None,
                )
        }
    }

    pub fn description(&self) -> Option<&'a str> {
        unsafe {
            self._tab
                .get::<ForwardsUOffset<&str>>(Model::VT_DESCRIPTION, None)
        }
    }

    pub fn buffers(&self) -> Option<Vector<'a, ForwardsUOffset<Buffer<'a>>>> {
        unsafe {
            self._tab
                .get::<ForwardsUOffset<Vector<'a, ForwardsUOffset<Buffer>>>>(
                    Model::VT_BUFFERS,
                    None,
                )
        }
    }
}

impl flatbuffers::Verifiable for Model<'_> {
    #[inline]
    fn run_verifier(
        v: &mut flatbuffers::Verifier,
        pos: usize,
    ) -> Result<(), flatbuffers::InvalidFlatbuffer> {
        v.visit_table(pos)?
            .visit_field::<u32>("version", Self::VT_VERSION, false)?
            .visit_field::<ForwardsUOffset<Vector<'_, ForwardsUOffset<OperatorCode>>>>(
                "operator_codes",
                Self::VT_OPERATOR_CODES,
                false,
            )?
            .visit_field::<ForwardsUOffset<Vector<'_, ForwardsUOffset<SubGraph>>>>(
                "subgraphs",
                Self::VT_SUBGRAPHS,
                false,
            )?
            .visit_field::<ForwardsUOffset<&str>>("description", Self::VT_DESCRIPTION, false)?
            .visit_field::<ForwardsUOffset<Vector<'_, ForwardsUOffset<Buffer>>>>(
                "buffers",
                Self::VT_BUFFERS,
                false,
            )?
            .finish();
        Ok(())
    }
}

pub struct ModelBuilder<'a: 'b, 'b> {
    fbb_: &'b mut flatbuffers::FlatBufferBuilder<'a>,
    start_: flatbuffers::WIPOffset<flatbuffers::TableUnfinishedWIPOffset>,
}

impl<'a: 'b, 'b> ModelBuilder<'a, 'b> {
    pub fn new(fbb: &'b mut flatbuffers::FlatBufferBuilder<'a>) -> Self {
        let start = fbb.start_table();
        Self { fbb_: fbb, start_: start }
    }

    pub fn add_version(&mut self, version: u32) {
        self.fbb_.push_slot::<u32>(Model::VT_VERSION, version, 0);
    }

    pub fn add_operator_codes(
        &mut self,
        codes: flatbuffers::WIPOffset<Vector<'b, ForwardsUOffset<OperatorCode<'b>>>>,
    ) {
        self.fbb_
            .push_slot_always::<flatbuffers::WIPOffset<_>>(Model::VT_OPERATOR_CODES, codes);
    }

    pub fn add_subgraphs(
        &mut self,
        subgraphs: flatbuffers::WIPOffset<Vector<'b, ForwardsUOffset<SubGraph<'b>>>>,
    ) {
        self.fbb_
            .push_slot_always::<flatbuffers::WIPOffset<_>>(Model::VT_SUBGRAPHS, subgraphs);
    }

    pub fn add_buffers(
        &mut self,
        buffers: flatbuffers::WIPOffset<Vector<'b, ForwardsUOffset<Buffer<'b>>>>,
    ) {
        self.fbb_
            .push_slot_always::<flatbuffers::WIPOffset<_>>(Model::VT_BUFFERS, buffers);
    }

    pub fn finish(self) -> flatbuffers::WIPOffset<Model<'a>> {
        let o = self.fbb_.end_table(self.start_);
        flatbuffers::WIPOffset::new(o.value())
    }
}

/// Finish the buffer with the TFLite file identifier.
pub fn finish_model_buffer<'a>(
    fbb: &mut flatbuffers::FlatBufferBuilder<'a>,
    root: flatbuffers::WIPOffset<Model<'a>>,
) {
    fbb.finish(root, Some(MODEL_IDENTIFIER));
}

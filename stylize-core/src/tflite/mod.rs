//! Reading the serialized style-transfer model.
//!
//! [`StyleModel`] wraps the verified flatbuffer root and exposes the handful
//! of lookups the importer needs: subgraph access, resolved builtin operator
//! codes, and constant weight blobs reinterpreted as `f32` arrays.

pub mod schema;

use std::cmp;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model buffer is missing the TFL3 file identifier")]
    MissingIdentifier,
    #[error("model buffer failed flatbuffer verification: {0}")]
    Malformed(#[from] flatbuffers::InvalidFlatbuffer),
    #[error("model declares {0} subgraphs, expected exactly 1")]
    SubgraphCount(usize),
    #[error("operator references opcode index {0} but the model declares {1} operator codes")]
    OpcodeIndex(u32, usize),
    #[error("model has no tensor at index {0}")]
    MissingTensor(i32),
    #[error("tensor '{name}' references missing data buffer {buffer}")]
    MissingBuffer { name: String, buffer: u32 },
    #[error("tensor '{name}' weight blob is {len} bytes, not a multiple of 4")]
    WeightBlobSize { name: String, len: usize },
}

/// Parsed, verified model with exactly one subgraph.
pub struct StyleModel<'a> {
    model: schema::Model<'a>,
}

impl std::fmt::Debug for StyleModel<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StyleModel").finish_non_exhaustive()
    }
}

impl<'a> StyleModel<'a> {
    /// Verify and wrap a serialized model buffer.
    pub fn parse(data: &'a [u8]) -> Result<Self, ModelError> {
        if !schema::model_buffer_has_identifier(data) {
            return Err(ModelError::MissingIdentifier);
        }
        let model = flatbuffers::root::<schema::Model>(data)?;
        let count = model.subgraphs().map(|s| s.len()).unwrap_or(0);
        if count != 1 {
            return Err(ModelError::SubgraphCount(count));
        }
        Ok(Self { model })
    }

    pub fn subgraph(&self) -> schema::SubGraph<'a> {
        // Presence checked in parse.
        self.model.subgraphs().unwrap().get(0)
    }

    /// Resolve an operator's builtin code through the operator-code table.
    ///
    /// Newer schema versions moved the code to a wider field; files written
    /// before that carry it only in `deprecated_builtin_code`, so the larger
    /// of the two values is authoritative.
    pub fn builtin_code(&self, op: &schema::Operator<'a>) -> Result<i32, ModelError> {
        let codes = self.model.operator_codes().ok_or_else(|| {
            ModelError::OpcodeIndex(op.opcode_index(), 0)
        })?;
        let index = op.opcode_index();
        if index as usize >= codes.len() {
            return Err(ModelError::OpcodeIndex(index, codes.len()));
        }
        let code = codes.get(index as usize);
        Ok(cmp::max(
            i32::from(code.deprecated_builtin_code()),
            code.builtin_code(),
        ))
    }

    pub fn tensor(&self, index: i32) -> Result<schema::Tensor<'a>, ModelError> {
        let tensors = self
            .subgraph()
            .tensors()
            .ok_or(ModelError::MissingTensor(index))?;
        if index < 0 || index as usize >= tensors.len() {
            return Err(ModelError::MissingTensor(index));
        }
        Ok(tensors.get(index as usize))
    }

    /// Logical shape of a tensor, empty when the model omits it.
    pub fn tensor_shape(&self, tensor: &schema::Tensor<'a>) -> Vec<usize> {
        tensor
            .shape()
            .map(|s| s.iter().map(|d| d.max(0) as usize).collect())
            .unwrap_or_default()
    }

    /// Constant tensor data reinterpreted as little-endian `f32` values.
    pub fn constant_f32(&self, tensor: &schema::Tensor<'a>) -> Result<Vec<f32>, ModelError> {
        let name = tensor.name().unwrap_or("<unnamed>").to_string();
        let index = tensor.buffer();
        let buffers = self.model.buffers().ok_or(ModelError::MissingBuffer {
            name: name.clone(),
            buffer: index,
        })?;
        if index as usize >= buffers.len() {
            return Err(ModelError::MissingBuffer { name, buffer: index });
        }
        let data = buffers
            .get(index as usize)
            .data()
            .ok_or(ModelError::MissingBuffer {
                name: name.clone(),
                buffer: index,
            })?;
        let bytes = data.bytes();
        if bytes.len() % 4 != 0 {
            return Err(ModelError::WeightBlobSize {
                name,
                len: bytes.len(),
            });
        }
        // Flatbuffer byte vectors carry no alignment guarantee, so decode
        // word by word instead of casting the slice.
        Ok(bytes
            .chunks_exact(4)
            .map(|w| f32::from_le_bytes([w[0], w[1], w[2], w[3]]))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flatbuffers::FlatBufferBuilder;

    fn single_subgraph_model(data: &[f32]) -> Vec<u8> {
        let mut fbb = FlatBufferBuilder::new();

        let empty = schema::BufferBuilder::new(&mut fbb).finish();
        let bytes: Vec<u8> = data.iter().flat_map(|v| v.to_le_bytes()).collect();
        let blob = fbb.create_vector(&bytes);
        let mut buffer = schema::BufferBuilder::new(&mut fbb);
        buffer.add_data(blob);
        let constant = buffer.finish();
        let buffers = fbb.create_vector(&[empty, constant]);

        let shape = fbb.create_vector(&[data.len() as i32]);
        let mut tensor = schema::TensorBuilder::new(&mut fbb);
        tensor.add_shape(shape);
        tensor.add_type(schema::TENSOR_TYPE_FLOAT32);
        tensor.add_buffer(1);
        let tensor = tensor.finish();
        let tensors = fbb.create_vector(&[tensor]);

        let mut code = schema::OperatorCodeBuilder::new(&mut fbb);
        code.add_deprecated_builtin_code(schema::BUILTIN_OPERATOR_RELU as i8);
        let code = code.finish();
        let codes = fbb.create_vector(&[code]);

        let mut subgraph = schema::SubGraphBuilder::new(&mut fbb);
        subgraph.add_tensors(tensors);
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

    #[test]
    fn parse_accepts_a_well_formed_model() {
        let bytes = single_subgraph_model(&[1.0, 2.0, 3.0]);
        let model = StyleModel::parse(&bytes).expect("parse");
        assert_eq!(model.subgraph().tensors().unwrap().len(), 1);
    }

    #[test]
    fn parse_rejects_buffers_without_identifier() {
        let err = StyleModel::parse(&[0u8; 32]).expect_err("must fail");
        assert!(matches!(err, ModelError::MissingIdentifier));
    }

    #[test]
    fn constant_data_round_trips_as_f32() {
        let values = [0.5f32, -1.25, 269.025];
        let bytes = single_subgraph_model(&values);
        let model = StyleModel::parse(&bytes).expect("parse");
        let tensor = model.tensor(0).expect("tensor");
        assert_eq!(model.tensor_shape(&tensor), vec![3]);
        assert_eq!(model.constant_f32(&tensor).expect("blob"), values);
    }

    #[test]
    fn missing_tensor_index_is_reported() {
        let bytes = single_subgraph_model(&[0.0]);
        let model = StyleModel::parse(&bytes).expect("parse");
        assert!(matches!(
            model.tensor(7),
            Err(ModelError::MissingTensor(7))
        ));
    }

    #[test]
    fn deprecated_code_wins_when_larger() {
        let bytes = single_subgraph_model(&[0.0]);
        let model = StyleModel::parse(&bytes).expect("parse");
        let ops_missing = model.subgraph().operators();
        assert!(ops_missing.is_none());

        // The only declared code stores RELU in the deprecated field.
        let codes = model.model.operator_codes().unwrap();
        let code = codes.get(0);
        assert_eq!(
            i32::from(code.deprecated_builtin_code()),
            schema::BUILTIN_OPERATOR_RELU
        );
        assert_eq!(code.builtin_code(), 0);
    }
}

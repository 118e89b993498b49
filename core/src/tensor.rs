//! Input and output tensor maps.
//!
//! Inputs arrive as a flat buffer plus the shape it should take, keyed by the
//! stringified input index. Outputs are keyed the same way and borrow the
//! engine's memory instead of copying it.

use ndarray::{ArrayViewD, IxDyn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{AdaptorError, Result};

/// Raw input buffer and the shape it is reshaped to before binding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputTensor {
    pub data: Vec<f32>,
    pub shape: Vec<usize>,
}

impl InputTensor {
    pub fn new(data: Vec<f32>, shape: Vec<usize>) -> Self {
        Self { data, shape }
    }

    /// Number of elements the declared shape holds, or `None` if that count
    /// does not fit in `usize`.
    pub fn expected_len(&self) -> Option<usize> {
        self.shape.iter().try_fold(1usize, |acc, &d| acc.checked_mul(d))
    }

    /// Zero-copy view of the buffer in its declared shape.
    ///
    /// Fails with [`AdaptorError::ShapeMismatch`] when the buffer length does
    /// not equal the shape's element count.
    pub fn reshaped(&self, key: &str) -> Result<ArrayViewD<'_, f32>> {
        let expected = self.expected_len().ok_or_else(|| {
            AdaptorError::tensor(format!(
                "Shape {:?} of input '{}' overflows the element count",
                self.shape, key
            ))
        })?;
        if expected != self.data.len() {
            return Err(AdaptorError::ShapeMismatch {
                key: key.to_string(),
                shape: self.shape.clone(),
                expected,
                actual: self.data.len(),
            });
        }

        ArrayViewD::from_shape(IxDyn(&self.shape), &self.data)
            .map_err(|e| AdaptorError::tensor(format!("Failed to reshape input '{}': {}", key, e)))
    }
}

/// Inputs keyed by stringified input index ("0", "1", ...).
pub type InputTensorMap = BTreeMap<String, InputTensor>;

/// Parse an input key into the input index it names.
pub fn parse_input_index(key: &str) -> Result<usize> {
    key.trim()
        .parse()
        .map_err(|_| AdaptorError::InvalidInputKey(key.to_string()))
}

/// Reshape and index every input, in ascending index order.
pub fn prepare_inputs(inputs: &InputTensorMap) -> Result<Vec<(usize, ArrayViewD<'_, f32>)>> {
    let mut prepared = inputs
        .iter()
        .map(|(key, tensor)| Ok((parse_input_index(key)?, tensor.reshaped(key)?)))
        .collect::<Result<Vec<_>>>()?;
    prepared.sort_by_key(|(index, _)| *index);

    if let Some(pair) = prepared.windows(2).find(|pair| pair[0].0 == pair[1].0) {
        return Err(AdaptorError::InvalidInputKey(format!(
            "duplicate input index {}",
            pair[0].0
        )));
    }
    Ok(prepared)
}

/// One output slot: a view of engine memory and its shape.
#[derive(Debug, Clone)]
pub struct OutputTensor<'a> {
    pub data: ArrayViewD<'a, f32>,
    pub shape: Vec<usize>,
}

impl<'a> OutputTensor<'a> {
    pub fn new(data: ArrayViewD<'a, f32>) -> Self {
        let shape = data.shape().to_vec();
        Self { data, shape }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Copy the values out in logical order.
    pub fn to_vec(&self) -> Vec<f32> {
        self.data.iter().copied().collect()
    }
}

/// Outputs keyed by stringified output index ("0".."N-1").
pub type OutputTensorMap<'a> = BTreeMap<String, OutputTensor<'a>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reshape_matching() {
        let tensor = InputTensor::new((0..6).map(|v| v as f32).collect(), vec![1, 2, 3]);
        let view = tensor.reshaped("0").unwrap();
        assert_eq!(view.shape(), &[1, 2, 3]);
        assert_eq!(view[[0, 1, 2]], 5.0);
    }

    #[test]
    fn test_reshape_mismatch() {
        let tensor = InputTensor::new(vec![0.0; 5], vec![2, 3]);
        match tensor.reshaped("1") {
            Err(AdaptorError::ShapeMismatch {
                key,
                expected,
                actual,
                ..
            }) => {
                assert_eq!(key, "1");
                assert_eq!(expected, 6);
                assert_eq!(actual, 5);
            }
            other => panic!("expected ShapeMismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_reshape_overflowing_shape() {
        let tensor = InputTensor::new(vec![], vec![usize::MAX, 2]);
        assert_eq!(tensor.expected_len(), None);
        assert!(matches!(tensor.reshaped("0"), Err(AdaptorError::Tensor(_))));
    }

    #[test]
    fn test_scalar_shape() {
        let tensor = InputTensor::new(vec![3.5], vec![]);
        let view = tensor.reshaped("0").unwrap();
        assert_eq!(view.ndim(), 0);
        assert_eq!(view.sum(), 3.5);
    }

    #[test]
    fn test_parse_input_index() {
        assert_eq!(parse_input_index("0").unwrap(), 0);
        assert_eq!(parse_input_index("12").unwrap(), 12);
        assert!(matches!(
            parse_input_index("image"),
            Err(AdaptorError::InvalidInputKey(_))
        ));
        assert!(parse_input_index("-1").is_err());
    }

    #[test]
    fn test_prepare_orders_by_index() {
        let mut inputs = InputTensorMap::new();
        inputs.insert("10".to_string(), InputTensor::new(vec![1.0], vec![1]));
        inputs.insert("2".to_string(), InputTensor::new(vec![2.0, 3.0], vec![2]));

        let prepared = prepare_inputs(&inputs).unwrap();
        let indices: Vec<usize> = prepared.iter().map(|(i, _)| *i).collect();
        assert_eq!(indices, vec![2, 10]);
    }

    #[test]
    fn test_prepare_rejects_duplicate_index() {
        let mut inputs = InputTensorMap::new();
        inputs.insert("1".to_string(), InputTensor::new(vec![1.0], vec![1]));
        inputs.insert("01".to_string(), InputTensor::new(vec![1.0], vec![1]));
        assert!(matches!(
            prepare_inputs(&inputs),
            Err(AdaptorError::InvalidInputKey(_))
        ));
    }

    #[test]
    fn test_input_json_format() {
        let inputs: InputTensorMap =
            serde_json::from_str(r#"{"0": {"data": [1, 2, 3, 4], "shape": [2, 2]}}"#).unwrap();
        assert_eq!(inputs["0"].shape, vec![2, 2]);
        assert_eq!(inputs["0"].data, vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_output_tensor_shape() {
        let data = vec![1.0f32, 2.0, 3.0, 4.0];
        let view = ArrayViewD::from_shape(IxDyn(&[2, 2]), &data).unwrap();
        let out = OutputTensor::new(view);
        assert_eq!(out.shape, vec![2, 2]);
        assert_eq!(out.len(), 4);
        assert_eq!(out.to_vec(), data);
    }
}

//! Deterministic engine double for adaptor tests.
//!
//! Output `i` is the first bound input scaled by `i + 1`. Output 0 keeps the
//! input's shape; every other output is flattened to `[1, len]`.

#![allow(dead_code)]

use ndarray::{ArrayD, ArrayViewD, IxDyn};
use ovtk_adaptor::{
    AdaptorError, CompiledModel, Device, InferRequest, InferenceEngine, InputTensor,
    InputTensorMap, ModelFiles, PerformanceHint, Result,
};
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

#[derive(Debug, Clone)]
pub struct CompileCall {
    pub files: ModelFiles,
    pub device: Device,
    pub hint: PerformanceHint,
}

/// Everything the engine double was asked to do.
#[derive(Debug, Default)]
pub struct EngineLog {
    pub compiles: Vec<CompileCall>,
    pub requests_created: usize,
    pub requests_released: usize,
    pub inferences: usize,
    pub fail_next_compile: bool,
}

pub type SharedLog = Rc<RefCell<EngineLog>>;

pub struct ScaleEngine {
    num_outputs: usize,
    log: SharedLog,
}

impl ScaleEngine {
    pub fn new(num_outputs: usize) -> (Self, SharedLog) {
        let log = SharedLog::default();
        (
            Self {
                num_outputs,
                log: Rc::clone(&log),
            },
            log,
        )
    }
}

pub struct ScaleModel {
    num_outputs: usize,
    log: SharedLog,
}

pub struct ScaleRequest {
    num_outputs: usize,
    outputs: Vec<ArrayD<f32>>,
    log: SharedLog,
}

impl InferenceEngine for ScaleEngine {
    type Model = ScaleModel;

    fn compile_model(
        &self,
        files: &ModelFiles,
        device: &Device,
        hint: PerformanceHint,
    ) -> Result<ScaleModel> {
        let mut log = self.log.borrow_mut();
        if log.fail_next_compile {
            log.fail_next_compile = false;
            return Err(AdaptorError::engine("Failed to compile model"));
        }
        log.compiles.push(CompileCall {
            files: files.clone(),
            device: device.clone(),
            hint,
        });
        Ok(ScaleModel {
            num_outputs: self.num_outputs,
            log: Rc::clone(&self.log),
        })
    }

    fn available_devices(&self) -> Result<Vec<String>> {
        Ok(vec!["CPU".to_string()])
    }

    fn version(&self) -> String {
        "scale-engine".to_string()
    }
}

impl CompiledModel for ScaleModel {
    type Request = ScaleRequest;

    fn num_outputs(&self) -> usize {
        self.num_outputs
    }

    fn create_infer_request(&self) -> Result<ScaleRequest> {
        self.log.borrow_mut().requests_created += 1;
        Ok(ScaleRequest {
            num_outputs: self.num_outputs,
            outputs: Vec::new(),
            log: Rc::clone(&self.log),
        })
    }
}

impl InferRequest for ScaleRequest {
    fn infer(&mut self, inputs: &[(usize, ArrayViewD<'_, f32>)]) -> Result<()> {
        let (_, first) = inputs
            .first()
            .ok_or_else(|| AdaptorError::inference("No inputs bound"))?;
        self.log.borrow_mut().inferences += 1;

        self.outputs = (0..self.num_outputs)
            .map(|i| {
                let scaled = first.mapv(|v| v * (i + 1) as f32);
                if i == 0 {
                    scaled
                } else {
                    let len = scaled.len();
                    ArrayD::from_shape_vec(IxDyn(&[1, len]), scaled.iter().copied().collect())
                        .unwrap()
                }
            })
            .collect();
        Ok(())
    }

    fn output(&self, index: usize) -> Result<ArrayViewD<'_, f32>> {
        self.outputs
            .get(index)
            .map(|a| a.view())
            .ok_or_else(|| AdaptorError::tensor(format!("No output tensor {}", index)))
    }
}

impl Drop for ScaleRequest {
    fn drop(&mut self) {
        self.log.borrow_mut().requests_released += 1;
    }
}

/// Write `<name>.xml` and `<name>.bin` into `dir`; returns the descriptor path.
pub fn write_model(dir: &Path, name: &str) -> PathBuf {
    let xml = dir.join(format!("{}.xml", name));
    std::fs::write(&xml, format!("<net name=\"{}\"/>", name)).unwrap();
    std::fs::write(dir.join(format!("{}.bin", name)), [0u8; 16]).unwrap();
    xml
}

/// A single input bound at index 0.
pub fn single_input(data: Vec<f32>, shape: Vec<usize>) -> InputTensorMap {
    let mut inputs = InputTensorMap::new();
    inputs.insert("0".to_string(), InputTensor::new(data, shape));
    inputs
}

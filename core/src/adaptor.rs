//! Inference adaptor: load a model once, run detections against it.
//!
//! The adaptor owns one compiled graph and one reusable infer request at a
//! time. Loading a second model releases the first before compiling the new
//! one. Detections take `&mut self`, so the single request can never be
//! driven from two call sites at once, and the returned outputs borrow the
//! request's memory until the next detection.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use crate::error::{AdaptorError, Result};
use crate::inference::{
    CompiledModel, Device, InferRequest, InferenceEngine, ModelFiles, PerformanceHint,
};
use crate::loader::ModelLoader;
use crate::tensor::{prepare_inputs, InputTensorMap, OutputTensor, OutputTensorMap};

/// Status reported after a successful load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ModelStatus {
    /// Model compiled and ready for detections.
    Available = 30,
}

impl ModelStatus {
    /// Numeric status code reported to callers.
    pub fn code(self) -> i32 {
        self as i32
    }
}

/// Wall-clock time spent in each stage of one detection, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StageTimings {
    pub input_prep_ms: f64,
    pub inference_ms: f64,
    pub output_prep_ms: f64,
}

impl StageTimings {
    pub fn total_ms(&self) -> f64 {
        self.input_prep_ms + self.inference_ms + self.output_prep_ms
    }
}

impl fmt::Display for StageTimings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "INPUT_Prep:{} Inference_TIME:{} OUTPUT_Prep:{}",
            self.input_prep_ms, self.inference_ms, self.output_prep_ms
        )
    }
}

fn millis(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

/// Result of one detection.
#[derive(Debug)]
pub struct Detection<'a> {
    /// Output tensors keyed "0".."N-1".
    pub outputs: OutputTensorMap<'a>,
    pub timings: StageTimings,
}

/// Compiled graph plus the request bound to it.
struct LoadedModel<M: CompiledModel> {
    // Declared first so the request is released before its graph.
    request: M::Request,
    model: M,
    name: Option<String>,
    files: ModelFiles,
}

/// Model-loading and inference adaptor over an [`InferenceEngine`].
pub struct InferenceAdaptor<E: InferenceEngine> {
    engine: E,
    device: Device,
    loader: ModelLoader,
    loaded: Option<LoadedModel<E::Model>>,
}

impl<E: InferenceEngine> InferenceAdaptor<E> {
    /// Create an adaptor compiling for `device`, staging models named
    /// `model_name` under `path`. Performs no I/O.
    pub fn new(
        engine: E,
        model_name: impl Into<String>,
        path: impl AsRef<Path>,
        device: Device,
    ) -> Self {
        Self {
            engine,
            device,
            loader: ModelLoader::new(model_name, path),
            loaded: None,
        }
    }

    /// Replace the staging loader, e.g. to change its poll interval.
    pub fn with_loader(mut self, loader: ModelLoader) -> Self {
        self.loader = loader;
        self
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn loader(&self) -> &ModelLoader {
        &self.loader
    }

    /// Whether a model is compiled and ready for detections.
    pub fn is_loaded(&self) -> bool {
        self.loaded.is_some()
    }

    /// Files of the currently loaded model.
    pub fn model_files(&self) -> Option<&ModelFiles> {
        self.loaded.as_ref().map(|l| &l.files)
    }

    /// Name the current model was loaded under, if one was given.
    pub fn model_name(&self) -> Option<&str> {
        self.loaded.as_ref().and_then(|l| l.name.as_deref())
    }

    /// Number of outputs of the loaded graph.
    pub fn num_outputs(&self) -> Option<usize> {
        self.loaded.as_ref().map(|l| l.model.num_outputs())
    }

    /// Read `descriptor` and its weights file, compile them for the
    /// adaptor's device with a latency hint, and create the infer request.
    ///
    /// Any previously loaded model is released first; if this load fails the
    /// adaptor is left without a model.
    ///
    /// # Errors
    ///
    /// [`AdaptorError::MissingDescriptor`] for an empty path,
    /// [`AdaptorError::FileNotFound`] when either file is missing, and any
    /// engine error from reading or compiling.
    pub fn load_model(
        &mut self,
        descriptor: impl AsRef<Path>,
        model_name: Option<&str>,
    ) -> Result<ModelStatus> {
        let descriptor = descriptor.as_ref();
        if descriptor.as_os_str().is_empty() {
            error!("Model descriptor path missing");
            return Err(AdaptorError::MissingDescriptor);
        }

        let files = ModelFiles::from_descriptor(descriptor)?;
        info!(
            "Loading network files:\n\t{}\n\t{}",
            files.descriptor.display(),
            files.weights.display()
        );

        if let Some(previous) = self.loaded.take() {
            warn!(
                previous = %previous.files.descriptor.display(),
                "Releasing previously loaded model"
            );
            drop(previous);
        }

        files.ensure_exist()?;

        info!("Using device: {}", self.device);
        let model = self
            .engine
            .compile_model(&files, &self.device, PerformanceHint::Latency)?;
        let request = model.create_infer_request()?;
        info!(
            "Infer request created for model: {}",
            model_name.unwrap_or("<unnamed>")
        );

        self.loaded = Some(LoadedModel {
            request,
            model,
            name: model_name.map(str::to_string),
            files,
        });
        Ok(ModelStatus::Available)
    }

    /// Load the model staged by this adaptor's loader.
    pub fn load_staged_model(&mut self) -> Result<ModelStatus> {
        let descriptor = self.loader.descriptor_path();
        let name = self.loader.model_name().to_string();
        self.load_model(descriptor, Some(&name))
    }

    /// Release the loaded model, if any.
    pub fn unload(&mut self) {
        if let Some(previous) = self.loaded.take() {
            info!(model = %previous.files.descriptor.display(), "Model released");
        }
    }

    /// Reshape each input to its declared shape, run one synchronous
    /// inference, and collect every output slot under its stringified index.
    ///
    /// Stage timings are printed to stdout and returned with the outputs.
    ///
    /// # Errors
    ///
    /// [`AdaptorError::NotLoaded`] before a successful load,
    /// [`AdaptorError::ShapeMismatch`] / [`AdaptorError::InvalidInputKey`]
    /// for malformed inputs, and any engine error from inference.
    pub fn run_detection(&mut self, inputs: &InputTensorMap) -> Result<Detection<'_>> {
        let start = Instant::now();

        let Some(loaded) = self.loaded.as_mut() else {
            error!("Infer request is null; load a model first");
            return Err(AdaptorError::NotLoaded);
        };

        let prepared = prepare_inputs(inputs)?;
        let prepared_at = Instant::now();

        loaded.request.infer(&prepared)?;
        let inferred_at = Instant::now();

        let outputs = collect_outputs(loaded)?;
        let finished_at = Instant::now();

        let timings = StageTimings {
            input_prep_ms: millis(prepared_at - start),
            inference_ms: millis(inferred_at - prepared_at),
            output_prep_ms: millis(finished_at - inferred_at),
        };
        println!("{}", timings);
        debug!(inputs = prepared.len(), outputs = outputs.len(), "Detection complete");

        Ok(Detection { outputs, timings })
    }

    /// Prepare the loader's staging directory.
    pub fn prepare_dir(&self) -> Result<()> {
        self.loader.prepare_dir()
    }

    /// Remove the loader's staging directory.
    pub fn clean_up(&self) -> Result<()> {
        self.loader.clean_up()
    }

    /// Append a chunk of the model descriptor to the staging directory.
    pub fn save_descriptor_chunk(&self, chunk: &[u8]) -> Result<()> {
        self.loader.save_descriptor_chunk(chunk)
    }

    /// Append a chunk of the model weights to the staging directory.
    pub fn save_weights_chunk(&self, chunk: &[u8]) -> Result<()> {
        self.loader.save_weights_chunk(chunk)
    }

    /// Whether the staged model is complete, waiting up to `timeout`.
    pub fn is_model_loaded(&self, timeout: Duration) -> bool {
        self.loader.is_model_loaded(timeout)
    }

    /// Path the loader stages the descriptor at.
    pub fn staged_descriptor_path(&self) -> PathBuf {
        self.loader.descriptor_path()
    }
}

fn collect_outputs<M: CompiledModel>(loaded: &LoadedModel<M>) -> Result<OutputTensorMap<'_>> {
    (0..loaded.model.num_outputs())
        .map(|index| {
            let view = loaded.request.output(index)?;
            Ok((index.to_string(), OutputTensor::new(view)))
        })
        .collect()
}

#[cfg(feature = "openvino")]
impl InferenceAdaptor<crate::inference::openvino::Core> {
    /// Create an adaptor backed by a fresh OpenVINO runtime context.
    pub fn with_openvino(
        model_name: impl Into<String>,
        path: impl AsRef<Path>,
        device: Device,
    ) -> Result<Self> {
        let core = crate::inference::openvino::Core::new()?;
        Ok(Self::new(core, model_name, path, device))
    }
}

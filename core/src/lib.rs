//! ovtk-adaptor: model-loading and inference adaptor over the OpenVINO runtime.
//!
//! The adaptor takes a model descriptor (`.xml`) and its weights (`.bin`),
//! compiles them for a device with a latency hint, and runs one synchronous
//! inference per call, reporting how long input preparation, inference, and
//! output collection took. Graph compilation and kernel dispatch stay inside
//! the runtime behind the [`InferenceEngine`] trait.
//!
//! # Features
//!
//! - **openvino**: Link the OpenVINO C runtime and enable
//!   `inference::openvino::Core`.
//!
//! # Example
//!
//! ```ignore
//! use ovtk_adaptor::{Device, InferenceAdaptor, InputTensor, InputTensorMap};
//!
//! let mut adaptor = InferenceAdaptor::with_openvino("face", "/tmp/models", Device::cpu())?;
//! adaptor.load_model("face-detection.xml", Some("face"))?;
//!
//! let mut inputs = InputTensorMap::new();
//! inputs.insert("0".into(), InputTensor::new(vec![0.0; 3 * 300 * 300], vec![1, 3, 300, 300]));
//!
//! let detection = adaptor.run_detection(&inputs)?;
//! for (key, out) in &detection.outputs {
//!     println!("output {}: {:?}", key, out.shape);
//! }
//! ```
//!
//! # Building
//!
//! The default build has no native dependencies. To link OpenVINO:
//!
//! ```bash
//! # Either point at an install...
//! export OPENVINO_DIR=/opt/intel/openvino
//! # ...or let the build script find the pip package
//! pip install openvino
//!
//! cargo build --release --features openvino
//! ```

pub mod adaptor;
pub mod cli;
pub mod config;
pub mod error;
pub mod inference;
pub mod loader;
pub mod tensor;

// Re-export commonly used types
pub use adaptor::{Detection, InferenceAdaptor, ModelStatus, StageTimings};
pub use error::{AdaptorError, Result};
pub use inference::{
    CompiledModel, Device, InferRequest, InferenceEngine, ModelFiles, PerformanceHint,
};
pub use loader::ModelLoader;
pub use tensor::{InputTensor, InputTensorMap, OutputTensor, OutputTensorMap};

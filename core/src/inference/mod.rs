//! Inference engine seam.
//!
//! The adaptor never compiles graphs or runs kernels itself; it drives an
//! [`InferenceEngine`] through the three traits below. With the `openvino`
//! feature enabled, `openvino::Core` implements them over the OpenVINO C
//! runtime.

mod device;
#[cfg(feature = "openvino")]
mod ffi;
mod files;
#[cfg(feature = "openvino")]
pub mod openvino;

pub use device::{Device, PerformanceHint};
pub use files::{ModelFiles, WEIGHTS_EXTENSION};

use ndarray::ArrayViewD;

use crate::error::Result;

/// An inference runtime able to compile model files for a device.
pub trait InferenceEngine {
    /// Compiled, executable graph produced by this engine.
    type Model: CompiledModel;

    /// Read the descriptor and weights and compile them for `device`.
    fn compile_model(
        &self,
        files: &ModelFiles,
        device: &Device,
        hint: PerformanceHint,
    ) -> Result<Self::Model>;

    /// Device names the runtime can compile for.
    fn available_devices(&self) -> Result<Vec<String>>;

    /// Runtime version string.
    fn version(&self) -> String;
}

/// A graph compiled for one device.
pub trait CompiledModel {
    /// Reusable execution context bound to this graph.
    type Request: InferRequest;

    /// Number of output slots on the graph.
    fn num_outputs(&self) -> usize;

    /// Create an execution context for this graph.
    fn create_infer_request(&self) -> Result<Self::Request>;
}

/// A reusable execution context.
///
/// Outputs returned by [`InferRequest::output`] borrow memory owned by the
/// request and stay valid until the next call to [`InferRequest::infer`].
pub trait InferRequest {
    /// Bind `inputs` (by input index) and run one synchronous inference.
    fn infer(&mut self, inputs: &[(usize, ArrayViewD<'_, f32>)]) -> Result<()>;

    /// View of the output tensor at `index` from the last inference.
    fn output(&self, index: usize) -> Result<ArrayViewD<'_, f32>>;
}

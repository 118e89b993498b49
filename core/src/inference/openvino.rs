//! Safe wrappers over the OpenVINO C runtime.
//!
//! Every handle is owned by exactly one Rust value and released in `Drop`,
//! so a failed compile or a dropped adaptor never leaks runtime objects.

use ndarray::{ArrayViewD, IxDyn};
use std::ffi::{c_void, CStr, CString};
use std::path::Path;
use std::ptr;
use tracing::debug;

use super::ffi;
use super::{CompiledModel, Device, InferRequest, InferenceEngine, ModelFiles, PerformanceHint};
use crate::error::{AdaptorError, Result};

/// Human-readable message for a runtime status code.
fn status_message(status: ffi::OvStatus) -> String {
    unsafe {
        let msg = ffi::ov_get_error_info(status);
        if msg.is_null() {
            format!("Unknown error (status {})", status)
        } else {
            CStr::from_ptr(msg).to_string_lossy().into_owned()
        }
    }
}

fn check(status: ffi::OvStatus, context: &str) -> Result<()> {
    if status == ffi::OV_OK {
        Ok(())
    } else {
        Err(AdaptorError::engine(format!(
            "{}: {}",
            context,
            status_message(status)
        )))
    }
}

fn path_cstring(path: &Path) -> Result<CString> {
    CString::new(path.to_string_lossy().as_ref())
        .map_err(|_| AdaptorError::model_load(format!("Invalid path encoding: {}", path.display())))
}

/// OpenVINO runtime context.
///
/// # Example
///
/// ```ignore
/// use ovtk_adaptor::inference::openvino::Core;
/// use ovtk_adaptor::{Device, InferenceAdaptor};
///
/// let mut adaptor = InferenceAdaptor::new(Core::new()?, "face", "/tmp/models", Device::cpu());
/// adaptor.load_model("face.xml", Some("face"))?;
/// ```
pub struct Core {
    handle: ffi::CoreHandle,
}

// SAFETY: ov::Core is thread-safe for reading and compiling models.
unsafe impl Send for Core {}
unsafe impl Sync for Core {}

impl Core {
    /// Initialize a runtime context.
    pub fn new() -> Result<Self> {
        let mut handle = ptr::null_mut();
        check(unsafe { ffi::ov_core_create(&mut handle) }, "Failed to create core")?;
        Ok(Self { handle })
    }
}

impl Drop for Core {
    fn drop(&mut self) {
        if !self.handle.is_null() {
            unsafe {
                ffi::ov_core_free(self.handle);
            }
        }
    }
}

/// A model read from disk but not compiled yet.
struct ReadModel(ffi::ModelHandle);

impl Drop for ReadModel {
    fn drop(&mut self) {
        if !self.0.is_null() {
            unsafe {
                ffi::ov_model_free(self.0);
            }
        }
    }
}

impl InferenceEngine for Core {
    type Model = OvCompiledModel;

    fn compile_model(
        &self,
        files: &ModelFiles,
        device: &Device,
        hint: PerformanceHint,
    ) -> Result<OvCompiledModel> {
        let xml = path_cstring(&files.descriptor)?;
        let bin = path_cstring(&files.weights)?;

        let mut model = ptr::null_mut();
        check(
            unsafe { ffi::ov_core_read_model(self.handle, xml.as_ptr(), bin.as_ptr(), &mut model) },
            "Failed to read model",
        )?;
        let model = ReadModel(model);

        let device_cstr = CString::new(device.to_string())
            .map_err(|_| AdaptorError::model_load("Invalid device string"))?;
        let hint_cstr = CString::new(hint.as_str())
            .map_err(|_| AdaptorError::model_load("Invalid performance hint"))?;

        let mut compiled = ptr::null_mut();
        let status = unsafe {
            ffi::ov_core_compile_model(
                self.handle,
                model.0,
                device_cstr.as_ptr(),
                2,
                &mut compiled,
                ffi::ov_property_key_hint_performance_mode,
                hint_cstr.as_ptr(),
            )
        };
        check(status, &format!("Failed to compile model for {}", device))?;

        OvCompiledModel::from_handle(compiled)
    }

    fn available_devices(&self) -> Result<Vec<String>> {
        let mut devices = ffi::OvAvailableDevices {
            devices: ptr::null_mut(),
            size: 0,
        };
        check(
            unsafe { ffi::ov_core_get_available_devices(self.handle, &mut devices) },
            "Failed to query devices",
        )?;

        let names = (0..devices.size)
            .filter_map(|i| unsafe {
                let name = *devices.devices.add(i);
                (!name.is_null()).then(|| CStr::from_ptr(name).to_string_lossy().into_owned())
            })
            .collect();

        unsafe {
            ffi::ov_available_devices_free(&mut devices);
        }
        Ok(names)
    }

    fn version(&self) -> String {
        let mut version = ffi::OvVersion {
            build_number: ptr::null(),
            description: ptr::null(),
        };
        let status = unsafe { ffi::ov_get_openvino_version(&mut version) };
        if status != ffi::OV_OK {
            return "unknown".to_string();
        }

        let build = if version.build_number.is_null() {
            "unknown".to_string()
        } else {
            unsafe { CStr::from_ptr(version.build_number) }
                .to_string_lossy()
                .into_owned()
        };
        unsafe {
            ffi::ov_version_free(&mut version);
        }
        build
    }
}

/// A graph compiled for one device.
pub struct OvCompiledModel {
    handle: ffi::CompiledModelHandle,
    num_inputs: usize,
    num_outputs: usize,
}

// SAFETY: ov::CompiledModel is thread-safe; requests are created per caller.
unsafe impl Send for OvCompiledModel {}
unsafe impl Sync for OvCompiledModel {}

impl OvCompiledModel {
    fn from_handle(handle: ffi::CompiledModelHandle) -> Result<Self> {
        let mut model = Self {
            handle,
            num_inputs: 0,
            num_outputs: 0,
        };
        check(
            unsafe { ffi::ov_compiled_model_inputs_size(model.handle, &mut model.num_inputs) },
            "Failed to query inputs",
        )?;
        check(
            unsafe { ffi::ov_compiled_model_outputs_size(model.handle, &mut model.num_outputs) },
            "Failed to query outputs",
        )?;
        debug!(
            inputs = model.num_inputs,
            outputs = model.num_outputs,
            "Compiled model ready"
        );
        Ok(model)
    }
}

impl CompiledModel for OvCompiledModel {
    type Request = OvInferRequest;

    fn num_outputs(&self) -> usize {
        self.num_outputs
    }

    fn create_infer_request(&self) -> Result<OvInferRequest> {
        let mut handle = ptr::null_mut();
        check(
            unsafe { ffi::ov_compiled_model_create_infer_request(self.handle, &mut handle) },
            "Failed to create infer request",
        )?;
        Ok(OvInferRequest {
            handle,
            num_inputs: self.num_inputs,
            num_outputs: self.num_outputs,
            outputs: Vec::new(),
        })
    }
}

impl Drop for OvCompiledModel {
    fn drop(&mut self) {
        if !self.handle.is_null() {
            unsafe {
                ffi::ov_compiled_model_free(self.handle);
            }
        }
    }
}

/// Reusable execution context bound to one compiled model.
pub struct OvInferRequest {
    handle: ffi::InferRequestHandle,
    num_inputs: usize,
    num_outputs: usize,
    outputs: Vec<OvTensor>,
}

// SAFETY: the request is only ever used through `&mut self` or while
// borrowed from it, so it is never touched from two threads at once.
unsafe impl Send for OvInferRequest {}

impl InferRequest for OvInferRequest {
    fn infer(&mut self, inputs: &[(usize, ArrayViewD<'_, f32>)]) -> Result<()> {
        self.outputs.clear();

        // Input tensors wrap caller memory, so every input must be rebound
        // on every call.
        for index in 0..self.num_inputs {
            if !inputs.iter().any(|(i, _)| *i == index) {
                return Err(AdaptorError::inference(format!("Input {} not provided", index)));
            }
        }

        let mut bound = Vec::with_capacity(inputs.len());
        for (index, view) in inputs {
            let tensor = OvTensor::from_view(view)?;
            check(
                unsafe {
                    ffi::ov_infer_request_set_input_tensor_by_index(self.handle, *index, tensor.handle)
                },
                &format!("Failed to bind input {}", index),
            )?;
            bound.push(tensor);
        }

        check(
            unsafe { ffi::ov_infer_request_infer(self.handle) },
            "Inference failed",
        )?;

        let mut outputs = Vec::with_capacity(self.num_outputs);
        for index in 0..self.num_outputs {
            let mut handle = ptr::null_mut();
            check(
                unsafe {
                    ffi::ov_infer_request_get_output_tensor_by_index(self.handle, index, &mut handle)
                },
                &format!("Failed to get output tensor {}", index),
            )?;
            outputs.push(OvTensor { handle });
        }
        self.outputs = outputs;
        Ok(())
    }

    fn output(&self, index: usize) -> Result<ArrayViewD<'_, f32>> {
        self.outputs
            .get(index)
            .ok_or_else(|| AdaptorError::tensor(format!("No output tensor {}", index)))?
            .view()
    }
}

impl Drop for OvInferRequest {
    fn drop(&mut self) {
        self.outputs.clear();
        if !self.handle.is_null() {
            unsafe {
                ffi::ov_infer_request_free(self.handle);
            }
        }
    }
}

/// Owned tensor handle.
struct OvTensor {
    handle: ffi::TensorHandle,
}

impl OvTensor {
    /// Wrap a contiguous f32 view without copying.
    fn from_view(view: &ArrayViewD<'_, f32>) -> Result<Self> {
        let data = view
            .as_slice()
            .ok_or_else(|| AdaptorError::tensor("Input tensor is not contiguous"))?;
        let dims: Vec<i64> = view.shape().iter().map(|&d| d as i64).collect();

        let mut shape = ffi::OvShape {
            rank: 0,
            dims: ptr::null_mut(),
        };
        check(
            unsafe { ffi::ov_shape_create(dims.len() as i64, dims.as_ptr(), &mut shape) },
            "Failed to create shape",
        )?;

        let mut handle = ptr::null_mut();
        let status = unsafe {
            ffi::ov_tensor_create_from_host_ptr(
                ffi::OV_ELEMENT_F32,
                shape,
                data.as_ptr() as *mut c_void,
                &mut handle,
            )
        };
        unsafe {
            ffi::ov_shape_free(&mut shape);
        }
        check(status, "Failed to create input tensor")?;

        Ok(Self { handle })
    }

    /// Borrow the tensor's memory as an f32 array view.
    fn view(&self) -> Result<ArrayViewD<'_, f32>> {
        let mut element_type = 0;
        check(
            unsafe { ffi::ov_tensor_get_element_type(self.handle, &mut element_type) },
            "Failed to get element type",
        )?;
        if element_type != ffi::OV_ELEMENT_F32 {
            return Err(AdaptorError::tensor(format!(
                "Unsupported output element type {}",
                element_type
            )));
        }

        let mut shape = ffi::OvShape {
            rank: 0,
            dims: ptr::null_mut(),
        };
        check(
            unsafe { ffi::ov_tensor_get_shape(self.handle, &mut shape) },
            "Failed to get tensor shape",
        )?;
        let dims: Vec<usize> = if shape.rank > 0 && !shape.dims.is_null() {
            unsafe { std::slice::from_raw_parts(shape.dims, shape.rank as usize) }
                .iter()
                .map(|&d| d as usize)
                .collect()
        } else {
            Vec::new()
        };
        unsafe {
            ffi::ov_shape_free(&mut shape);
        }

        let mut numel = 0;
        check(
            unsafe { ffi::ov_tensor_get_size(self.handle, &mut numel) },
            "Failed to get tensor size",
        )?;
        let mut data = ptr::null_mut();
        check(
            unsafe { ffi::ov_tensor_data(self.handle, &mut data) },
            "Failed to get tensor data",
        )?;

        let slice: &[f32] = if numel == 0 {
            &[]
        } else if data.is_null() {
            return Err(AdaptorError::tensor("Null tensor data"));
        } else {
            unsafe { std::slice::from_raw_parts(data as *const f32, numel) }
        };

        ArrayViewD::from_shape(IxDyn(&dims), slice)
            .map_err(|e| AdaptorError::tensor(format!("Array shape error: {}", e)))
    }
}

impl Drop for OvTensor {
    fn drop(&mut self) {
        if !self.handle.is_null() {
            unsafe {
                ffi::ov_tensor_free(self.handle);
            }
        }
    }
}

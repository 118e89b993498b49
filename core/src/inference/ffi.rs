//! FFI declarations for the OpenVINO C API (`openvino_c`).
//!
//! This module contains the raw FFI bindings. Use the safe wrappers
//! in the `openvino` module instead of calling these directly.

use std::ffi::c_void;
use std::os::raw::c_char;

/// `ov_status_e`; zero is success.
pub type OvStatus = i32;

pub const OV_OK: OvStatus = 0;

/// `ov_element_type_e`.
pub type OvElementType = u32;

pub const OV_ELEMENT_F32: OvElementType = 5;

/// Opaque handle to `ov_core_t`.
pub type CoreHandle = *mut c_void;

/// Opaque handle to a read, uncompiled `ov_model_t`.
pub type ModelHandle = *mut c_void;

/// Opaque handle to `ov_compiled_model_t`.
pub type CompiledModelHandle = *mut c_void;

/// Opaque handle to `ov_infer_request_t`.
pub type InferRequestHandle = *mut c_void;

/// Opaque handle to `ov_tensor_t`.
pub type TensorHandle = *mut c_void;

/// `ov_shape_t`.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct OvShape {
    pub rank: i64,
    pub dims: *mut i64,
}

/// `ov_available_devices_t`.
#[repr(C)]
pub struct OvAvailableDevices {
    pub devices: *mut *mut c_char,
    pub size: usize,
}

/// `ov_version_t`.
#[repr(C)]
pub struct OvVersion {
    pub build_number: *const c_char,
    pub description: *const c_char,
}

extern "C" {
    // Property keys
    pub static ov_property_key_hint_performance_mode: *const c_char;

    // Errors and version
    pub fn ov_get_error_info(status: OvStatus) -> *const c_char;
    pub fn ov_get_openvino_version(version: *mut OvVersion) -> OvStatus;
    pub fn ov_version_free(version: *mut OvVersion);

    // Core lifecycle
    pub fn ov_core_create(core: *mut CoreHandle) -> OvStatus;
    pub fn ov_core_free(core: CoreHandle);
    pub fn ov_core_get_available_devices(
        core: CoreHandle,
        devices: *mut OvAvailableDevices,
    ) -> OvStatus;
    pub fn ov_available_devices_free(devices: *mut OvAvailableDevices);

    // Model read and compile
    pub fn ov_core_read_model(
        core: CoreHandle,
        model_path: *const c_char,
        bin_path: *const c_char,
        model: *mut ModelHandle,
    ) -> OvStatus;
    pub fn ov_model_free(model: ModelHandle);
    pub fn ov_core_compile_model(
        core: CoreHandle,
        model: ModelHandle,
        device_name: *const c_char,
        property_args_size: usize,
        compiled_model: *mut CompiledModelHandle,
        ...
    ) -> OvStatus;
    pub fn ov_compiled_model_inputs_size(
        compiled_model: CompiledModelHandle,
        size: *mut usize,
    ) -> OvStatus;
    pub fn ov_compiled_model_outputs_size(
        compiled_model: CompiledModelHandle,
        size: *mut usize,
    ) -> OvStatus;
    pub fn ov_compiled_model_create_infer_request(
        compiled_model: CompiledModelHandle,
        infer_request: *mut InferRequestHandle,
    ) -> OvStatus;
    pub fn ov_compiled_model_free(compiled_model: CompiledModelHandle);

    // Inference
    pub fn ov_infer_request_set_input_tensor_by_index(
        infer_request: InferRequestHandle,
        idx: usize,
        tensor: TensorHandle,
    ) -> OvStatus;
    pub fn ov_infer_request_infer(infer_request: InferRequestHandle) -> OvStatus;
    pub fn ov_infer_request_get_output_tensor_by_index(
        infer_request: InferRequestHandle,
        idx: usize,
        tensor: *mut TensorHandle,
    ) -> OvStatus;
    pub fn ov_infer_request_free(infer_request: InferRequestHandle);

    // Tensors and shapes
    pub fn ov_shape_create(rank: i64, dims: *const i64, shape: *mut OvShape) -> OvStatus;
    pub fn ov_shape_free(shape: *mut OvShape) -> OvStatus;
    pub fn ov_tensor_create_from_host_ptr(
        element_type: OvElementType,
        shape: OvShape,
        host_ptr: *mut c_void,
        tensor: *mut TensorHandle,
    ) -> OvStatus;
    pub fn ov_tensor_get_shape(tensor: TensorHandle, shape: *mut OvShape) -> OvStatus;
    pub fn ov_tensor_get_element_type(
        tensor: TensorHandle,
        element_type: *mut OvElementType,
    ) -> OvStatus;
    pub fn ov_tensor_get_size(tensor: TensorHandle, elements_size: *mut usize) -> OvStatus;
    pub fn ov_tensor_data(tensor: TensorHandle, data: *mut *mut c_void) -> OvStatus;
    pub fn ov_tensor_free(tensor: TensorHandle);
}

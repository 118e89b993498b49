#![cfg(feature = "openvino")]

use anyhow::{bail, Context, Result};
use approx::assert_abs_diff_eq;
use ovtk_adaptor::{
    AdaptorError, Device, InferenceAdaptor, InferenceEngine, InputTensor, InputTensorMap,
    ModelStatus,
};
use std::path::PathBuf;

fn fixture() -> Result<PathBuf> {
    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let model_path = manifest_dir.join("../tests/fixtures/scale_shift.xml");
    if !model_path.exists() || !model_path.with_extension("bin").exists() {
        bail!(
            "Missing test fixture at {} (and its .bin weights).",
            model_path.display()
        );
    }
    Ok(model_path)
}

fn input(data: Vec<f32>, shape: Vec<usize>) -> InputTensorMap {
    let mut inputs = InputTensorMap::new();
    inputs.insert("0".to_string(), InputTensor::new(data, shape));
    inputs
}

#[test]
fn infer_scale_shift_outputs() -> Result<()> {
    let model_path = fixture()?;
    let staging = tempfile::tempdir()?;
    let mut adaptor = InferenceAdaptor::with_openvino("scale_shift", staging.path(), Device::cpu())?;

    let status = adaptor
        .load_model(&model_path, Some("scale_shift"))
        .context("Failed to load scale_shift fixture")?;
    assert_eq!(status, ModelStatus::Available);
    assert_eq!(status.code(), 30);
    assert_eq!(adaptor.num_outputs(), Some(2));

    let detection = adaptor.run_detection(&input(vec![1.0, 2.0, 3.0, 4.0], vec![1, 4]))?;

    let keys: Vec<&str> = detection.outputs.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["0", "1"], "expected 2 outputs");

    let scaled = &detection.outputs["0"];
    assert_eq!(scaled.shape, vec![1, 4]);
    for (v, exp) in scaled.to_vec().iter().zip([2.0, 4.0, 6.0, 8.0].iter()) {
        assert_abs_diff_eq!(*v, *exp, epsilon = 1e-5);
    }

    let shifted = &detection.outputs["1"];
    assert_eq!(shifted.shape, vec![1, 4]);
    for (v, exp) in shifted.to_vec().iter().zip([1.5, 2.5, 3.5, 4.5].iter()) {
        assert_abs_diff_eq!(*v, *exp, epsilon = 1e-5);
    }

    Ok(())
}

#[test]
fn repeated_detection_reuses_request() -> Result<()> {
    let model_path = fixture()?;
    let staging = tempfile::tempdir()?;
    let mut adaptor = InferenceAdaptor::with_openvino("scale_shift", staging.path(), Device::cpu())?;
    adaptor.load_model(&model_path, None)?;

    let first = adaptor
        .run_detection(&input(vec![0.0; 4], vec![1, 4]))?
        .outputs["1"]
        .to_vec();
    let second = adaptor
        .run_detection(&input(vec![-1.0; 4], vec![1, 4]))?
        .outputs["1"]
        .to_vec();

    for v in first {
        assert_abs_diff_eq!(v, 0.5, epsilon = 1e-5);
    }
    for v in second {
        assert_abs_diff_eq!(v, -0.5, epsilon = 1e-5);
    }
    Ok(())
}

#[test]
fn shape_mismatch_never_reaches_runtime() -> Result<()> {
    let model_path = fixture()?;
    let staging = tempfile::tempdir()?;
    let mut adaptor = InferenceAdaptor::with_openvino("scale_shift", staging.path(), Device::cpu())?;
    adaptor.load_model(&model_path, None)?;

    let result = adaptor.run_detection(&input(vec![1.0; 3], vec![1, 4]));
    assert!(matches!(result, Err(AdaptorError::ShapeMismatch { .. })));
    Ok(())
}

#[test]
fn runtime_reports_cpu_and_version() -> Result<()> {
    let staging = tempfile::tempdir()?;
    let adaptor = InferenceAdaptor::with_openvino("scale_shift", staging.path(), Device::cpu())?;

    let devices = adaptor.engine().available_devices()?;
    assert!(devices.iter().any(|d| d == "CPU"), "devices: {:?}", devices);
    assert_ne!(adaptor.engine().version(), "unknown");
    Ok(())
}

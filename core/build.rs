//! Build script for ovtk-adaptor.
//!
//! Links the OpenVINO C runtime (`libopenvino_c`) when the `openvino` feature
//! is enabled. Without the feature the crate has no native dependencies and
//! this script does nothing.
//!
//! # Locating OpenVINO
//!
//! 1. `OPENVINO_LIB_DIR`: directory containing `libopenvino_c`
//! 2. `OPENVINO_DIR` / `INTEL_OPENVINO_DIR`: install root (`runtime/lib/<arch>`)
//! 3. The `openvino` Python package (`.venv`, `python3`, `python`)
//!
//! # Environment Variables
//!
//! - `OPENVINO_SKIP_LINK`: Set to "1" to skip linking (for development)

use std::env;
use std::path::{Path, PathBuf};
use std::process::Command;

fn main() {
    println!("cargo:rerun-if-env-changed=OPENVINO_LIB_DIR");
    println!("cargo:rerun-if-env-changed=OPENVINO_DIR");
    println!("cargo:rerun-if-env-changed=INTEL_OPENVINO_DIR");
    println!("cargo:rerun-if-env-changed=OPENVINO_SKIP_LINK");

    if env::var_os("CARGO_FEATURE_OPENVINO").is_none() {
        return;
    }
    link_openvino();
}

/// Python executables to try, venvs first.
fn python_candidates() -> Vec<PathBuf> {
    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap_or_default());
    let mut candidates = Vec::new();
    for name in [".venv", "venv"] {
        candidates.push(manifest_dir.join(format!("../{}/bin/python", name)));
        candidates.push(manifest_dir.join(format!("{}/bin/python", name)));
    }
    candidates.push(PathBuf::from("python3"));
    candidates.push(PathBuf::from("python"));
    candidates
}

/// Run a Python snippet and return its trimmed stdout.
fn python_eval(python: &Path, code: &str) -> Option<String> {
    let output = Command::new(python).args(["-c", code]).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let stdout = String::from_utf8(output.stdout).ok()?;
    let value = stdout.trim().to_string();
    (!value.is_empty()).then_some(value)
}

/// Detect the pip `openvino` package, which ships its libraries in `libs/`.
///
/// Returns (lib_dir, version) on success.
fn detect_openvino_from_python() -> Option<(PathBuf, Option<String>)> {
    for python in python_candidates() {
        if let Some(path) = python_eval(&python, "import openvino; print(openvino.__path__[0])") {
            let lib_dir = PathBuf::from(path).join("libs");
            if has_c_library(&lib_dir) {
                let version = python_eval(&python, "import openvino; print(openvino.__version__)");
                return Some((lib_dir, version));
            }
        }
    }
    None
}

/// Find `runtime/lib/<arch>` under an install root.
fn lib_dir_from_install(root: &Path) -> Option<PathBuf> {
    let runtime_lib = root.join("runtime/lib");
    let arch = match env::var("CARGO_CFG_TARGET_ARCH").as_deref() {
        Ok("x86_64") => "intel64",
        Ok("aarch64") => "aarch64",
        Ok("arm") => "armv7l",
        _ => "intel64",
    };
    [runtime_lib.join(arch), runtime_lib, root.join("lib")]
        .into_iter()
        .find(|dir| has_c_library(dir))
}

fn has_c_library(dir: &Path) -> bool {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return false;
    };
    entries.flatten().any(|entry| {
        let name = entry.file_name().to_string_lossy().to_string();
        name.starts_with("libopenvino_c.") || name == "openvino_c.lib"
    })
}

fn link_openvino() {
    if env::var("OPENVINO_SKIP_LINK")
        .map(|v| v == "1")
        .unwrap_or(false)
    {
        println!("cargo:warning=Skipping OpenVINO link (OPENVINO_SKIP_LINK=1)");
        return;
    }

    let (lib_dir, version) = if let Ok(dir) = env::var("OPENVINO_LIB_DIR") {
        (PathBuf::from(dir), None)
    } else if let Some(dir) = env::var("OPENVINO_DIR")
        .or_else(|_| env::var("INTEL_OPENVINO_DIR"))
        .ok()
        .and_then(|root| lib_dir_from_install(Path::new(&root)))
    {
        (dir, None)
    } else if let Some((dir, version)) = detect_openvino_from_python() {
        eprintln!("info: Auto-detected OpenVINO from Python: {}", dir.display());
        (dir, version)
    } else {
        panic!(
            "Could not find an OpenVINO installation.\n\
             Checked: OPENVINO_LIB_DIR, OPENVINO_DIR, INTEL_OPENVINO_DIR, python `openvino` package\n\
             \n\
             To fix, either:\n\
             1. Install the runtime: pip install openvino\n\
             2. Set OPENVINO_DIR to your OpenVINO install root\n\
             3. Build without the openvino feature"
        );
    };

    if !lib_dir.exists() {
        panic!(
            "OpenVINO library path does not exist: {}",
            lib_dir.display()
        );
    }

    if let Some(version) = version {
        println!("cargo:rustc-env=OPENVINO_VERSION={}", version);
    }

    println!("cargo:rustc-link-search=native={}", lib_dir.display());
    println!("cargo:rustc-link-lib=dylib=openvino_c");

    // Use RPATH (not RUNPATH) so the plugins next to libopenvino_c resolve.
    if env::var("CARGO_CFG_TARGET_OS").as_deref() == Ok("linux") {
        println!("cargo:rustc-link-arg=-Wl,--disable-new-dtags");
        println!("cargo:rustc-link-arg=-Wl,-rpath,{}", lib_dir.display());
    }
}

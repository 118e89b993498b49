//! CLI entry point for ovtk-adaptor.

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use ovtk_adaptor::cli::{Cli, Commands};
use ovtk_adaptor::config::Config;
use ovtk_adaptor::inference::ModelFiles;
use ovtk_adaptor::{Device, InferenceAdaptor, InferenceEngine, InputTensorMap, ModelLoader};

/// Get the OpenVINO version seen by the build script.
#[cfg_attr(not(feature = "openvino"), allow(dead_code))]
fn openvino_version() -> &'static str {
    option_env!("OPENVINO_VERSION").unwrap_or("unknown")
}

/// Get the enabled features.
#[cfg_attr(not(feature = "openvino"), allow(dead_code))]
fn enabled_features() -> &'static str {
    if cfg!(feature = "openvino") {
        "openvino"
    } else {
        "none"
    }
}

fn main() -> Result<()> {
    // Initialize logging
    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .init();

    let cli = Cli::parse_args();

    let config = if let Some(config_path) = &cli.config {
        Config::from_yaml_file(config_path)
            .with_context(|| format!("Failed to load config: {}", config_path.display()))?
    } else {
        Config::default()
    };

    match cli.command {
        Commands::Stage {
            name,
            dir,
            model,
            chunk_size,
        } => {
            let name = name.unwrap_or_else(|| config.model.name.clone());
            let dir = dir.unwrap_or_else(|| PathBuf::from(&config.model.staging_dir));
            let chunk_size = chunk_size.unwrap_or(config.loader.chunk_size);

            let files = ModelFiles::from_descriptor(&model)?;
            let loader = ModelLoader::new(&name, &dir);

            info!("Staging model '{}' into {}", name, loader.model_dir().display());
            loader
                .stage_from_files(&files.descriptor, &files.weights, chunk_size)
                .with_context(|| format!("Failed to stage model: {}", model.display()))?;
            println!("{}", loader.descriptor_path().display());
        }

        Commands::Wait {
            name,
            dir,
            timeout_ms,
        } => {
            let name = name.unwrap_or_else(|| config.model.name.clone());
            let dir = dir.unwrap_or_else(|| PathBuf::from(&config.model.staging_dir));
            let timeout = timeout_ms
                .map(Duration::from_millis)
                .unwrap_or_else(|| config.loader.load_timeout());

            let loader =
                ModelLoader::new(&name, &dir).with_poll_interval(config.loader.poll_interval());

            info!("Waiting up to {:?} for model '{}'", timeout, name);
            if !loader.is_model_loaded(timeout) {
                bail!("Model '{}' was not staged within {:?}", name, timeout);
            }
            println!("{}", loader.descriptor_path().display());
        }

        command => run_with_engine(&config, command)?,
    }

    Ok(())
}

#[cfg(feature = "openvino")]
fn run_with_engine(config: &Config, command: Commands) -> Result<()> {
    let core = ovtk_adaptor::inference::openvino::Core::new()?;
    run_engine_command(core, config, command)
}

#[cfg(not(feature = "openvino"))]
fn run_with_engine(_config: &Config, _command: Commands) -> Result<()> {
    bail!("ovtk-adaptor was built without an inference runtime; rebuild with `--features openvino`")
}

/// Resolve the model descriptor from the command line, then the config.
#[cfg_attr(not(feature = "openvino"), allow(dead_code))]
fn resolve_model(model: Option<PathBuf>, config: &Config) -> Result<PathBuf> {
    model
        .or_else(|| config.model.descriptor_path.as_ref().map(PathBuf::from))
        .context("No model given: pass --model or set model.descriptor_path in the config")
}

#[cfg_attr(not(feature = "openvino"), allow(dead_code))]
fn resolve_device(device: Option<String>, config: &Config) -> Result<Device> {
    let device = device.unwrap_or_else(|| config.model.device.clone());
    Ok(device.parse()?)
}

#[cfg_attr(not(feature = "openvino"), allow(dead_code))]
fn run_engine_command<E: InferenceEngine>(
    engine: E,
    config: &Config,
    command: Commands,
) -> Result<()> {
    match command {
        Commands::Infer {
            model,
            device,
            input,
            format,
            full,
        } => {
            let model = resolve_model(model, config)?;
            let device = resolve_device(device, config)?;
            info!("Using device: {}", device);

            let mut adaptor = InferenceAdaptor::new(
                engine,
                &config.model.name,
                &config.model.staging_dir,
                device,
            );

            info!("Loading model: {}", model.display());
            let status = adaptor.load_model(&model, Some(&config.model.name))?;
            info!("Model loaded successfully (status {})", status.code());

            info!("Loading input: {}", input.display());
            let inputs: InputTensorMap = serde_json::from_str(
                &fs::read_to_string(&input)
                    .with_context(|| format!("Failed to read input: {}", input.display()))?,
            )
            .context("Input must map input index to {\"data\": [...], \"shape\": [...]}")?;

            info!("Running inference...");
            let detection = adaptor.run_detection(&inputs)?;
            info!(
                "Inference complete: {} outputs in {:.2}ms",
                detection.outputs.len(),
                detection.timings.inference_ms
            );

            let output = serde_json::json!({
                "status": status.code(),
                "num_outputs": detection.outputs.len(),
                "timings_ms": {
                    "input_prep": detection.timings.input_prep_ms,
                    "inference": detection.timings.inference_ms,
                    "output_prep": detection.timings.output_prep_ms,
                },
                "outputs": detection.outputs.iter().map(|(key, t)| {
                    let mut entry = serde_json::json!({
                        "index": key,
                        "shape": t.shape,
                        "numel": t.len(),
                    });
                    if full {
                        entry["data"] = serde_json::json!(t.to_vec());
                    }
                    entry
                }).collect::<Vec<_>>()
            });

            if format == "pretty" {
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else {
                println!("{}", serde_json::to_string(&output)?);
            }
        }

        Commands::Info { model, device } => {
            let model = resolve_model(model, config)?;
            let device = resolve_device(device, config)?;

            println!("ovtk-adaptor v{}", env!("CARGO_PKG_VERSION"));
            println!("openvino (build): {}", openvino_version());
            println!("openvino (runtime): {}", engine.version());
            println!("features: {}", enabled_features());
            println!();
            println!("Model: {}", model.display());
            println!("Device: {}", device);

            // Try to load the model to verify it works
            info!("Loading model...");
            let mut adaptor = InferenceAdaptor::new(
                engine,
                &config.model.name,
                &config.model.staging_dir,
                device,
            );
            adaptor.load_model(&model, Some(&config.model.name))?;
            println!(
                "Status: OK (model loaded, {} outputs)",
                adaptor.num_outputs().unwrap_or(0)
            );
        }

        Commands::Devices => {
            let devices = engine.available_devices()?;
            if devices.is_empty() {
                eprintln!("No devices reported by the runtime");
                std::process::exit(1);
            }
            for device in devices {
                println!("{}", device);
            }
        }

        Commands::Stage { .. } | Commands::Wait { .. } => {
            bail!("staging commands do not run on an engine")
        }
    }

    Ok(())
}

use anyhow::{bail, Result};
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use std::collections::HashMap;
use std::path::Path;

/// Load model weights from a HuggingFace-style model directory, preferring
/// `model.safetensors` and falling back to `pytorch_model.bin`.
pub fn load_weights(model_dir: &Path, dtype: DType, device: &Device) -> Result<VarBuilder<'static>> {
    let safetensors_path = model_dir.join("model.safetensors");
    if safetensors_path.exists() {
        let data = std::fs::read(&safetensors_path)?;
        return Ok(VarBuilder::from_buffered_safetensors(data, dtype, device)?);
    }
    let pickle_path = model_dir.join("pytorch_model.bin");
    if pickle_path.exists() {
        let weights = candle_core::pickle::read_all(&pickle_path)?;
        let tensors: HashMap<String, Tensor> = weights.into_iter().collect();
        return Ok(VarBuilder::from_tensors(tensors, dtype, device));
    }
    bail!(
        "no model.safetensors or pytorch_model.bin under {}",
        model_dir.display()
    )
}

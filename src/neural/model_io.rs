//! Model I/O utilities using safetensors format
//!
//! Weights go through safetensors so checkpoints stay portable across
//! libtorch versions. The optimizer side is a small JSON record, since `tch`
//! does not expose Adam's moment buffers.

use safetensors::serialize_to_file;
use safetensors::tensor::{Dtype, SafeTensors, TensorView};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::Path;
use tch::{nn, Device, Kind, Tensor};

use crate::{Result, ZeroError};

/// Save every variable of a VarStore (including BatchNorm running stats).
pub fn save_varstore(vs: &nn::VarStore, path: impl AsRef<Path>) -> Result<()> {
    let mut encoded: Vec<(String, Dtype, Vec<usize>, Vec<u8>)> = Vec::new();
    for (name, tensor) in vs.variables() {
        let shape: Vec<usize> = tensor.size().iter().map(|&x| x as usize).collect();
        let (bytes, dtype) = tensor_to_bytes(&tensor)?;
        encoded.push((name, dtype, shape, bytes));
    }

    let views = encoded
        .iter()
        .map(|(name, dtype, shape, bytes)| {
            TensorView::new(*dtype, shape.clone(), bytes).map(|view| (name.clone(), view))
        })
        .collect::<std::result::Result<Vec<_>, _>>()?;

    serialize_to_file(views, &None, path.as_ref())?;
    Ok(())
}

/// Load a safetensors file into an already-built VarStore.
///
/// Every variable must be present with a matching shape.
pub fn load_varstore(vs: &mut nn::VarStore, path: impl AsRef<Path>) -> Result<()> {
    let buffer = fs::read(path.as_ref())?;
    let tensors = SafeTensors::deserialize(&buffer)?;
    let device = vs.device();

    for (name, mut var) in vs.variables() {
        let view = tensors.tensor(&name).map_err(|_| {
            ZeroError::Network(format!(
                "tensor '{}' missing from {}",
                name,
                path.as_ref().display()
            ))
        })?;
        let loaded = tensor_view_to_tensor(&view)?;
        if loaded.size() != var.size() {
            return Err(ZeroError::Network(format!(
                "tensor '{}' has shape {:?} on disk, expected {:?}",
                name,
                loaded.size(),
                var.size()
            )));
        }

        tch::no_grad(|| var.f_copy_(&loaded.to_device(device)))?;
    }

    Ok(())
}

/// Optimizer side of an iteration checkpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizerCheckpoint {
    pub iteration: usize,
    pub learning_rate: f64,
    pub weight_decay: f64,
    /// Optimizer steps taken so far
    pub steps: u64,
}

impl OptimizerCheckpoint {
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let writer = BufWriter::new(File::create(path.as_ref())?);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let reader = BufReader::new(File::open(path.as_ref())?);
        Ok(serde_json::from_reader(reader)?)
    }
}

fn tensor_to_bytes(tensor: &Tensor) -> Result<(Vec<u8>, Dtype)> {
    let flat = tensor.to_device(Device::Cpu).flatten(0, -1).contiguous();

    match tensor.kind() {
        Kind::Float | Kind::Half | Kind::BFloat16 => {
            let data = Vec::<f32>::try_from(&flat.to_kind(Kind::Float))?;
            Ok((data.iter().flat_map(|x| x.to_le_bytes()).collect(), Dtype::F32))
        }
        Kind::Double => {
            let data = Vec::<f64>::try_from(&flat)?;
            Ok((data.iter().flat_map(|x| x.to_le_bytes()).collect(), Dtype::F64))
        }
        Kind::Int64 => {
            let data = Vec::<i64>::try_from(&flat)?;
            Ok((data.iter().flat_map(|x| x.to_le_bytes()).collect(), Dtype::I64))
        }
        kind => Err(ZeroError::Network(format!("unsupported tensor kind: {kind:?}"))),
    }
}

fn tensor_view_to_tensor(view: &TensorView) -> Result<Tensor> {
    let shape: Vec<i64> = view.shape().iter().map(|&x| x as i64).collect();
    let data = view.data();

    let tensor = match view.dtype() {
        Dtype::F32 => {
            let floats: Vec<f32> = data
                .chunks_exact(4)
                .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                .collect();
            Tensor::from_slice(&floats)
        }
        Dtype::F64 => {
            let doubles: Vec<f64> = data
                .chunks_exact(8)
                .map(|c| f64::from_le_bytes([c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7]]))
                .collect();
            Tensor::from_slice(&doubles)
        }
        Dtype::I64 => {
            let longs: Vec<i64> = data
                .chunks_exact(8)
                .map(|c| i64::from_le_bytes([c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7]]))
                .collect();
            Tensor::from_slice(&longs)
        }
        dtype => return Err(ZeroError::Network(format!("unsupported dtype: {dtype:?}"))),
    };
    Ok(tensor.reshape(shape.as_slice()))
}

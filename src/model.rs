//! Strategy models: anything that maps an encoded game state to a pass/bet
//! probability vector.
//!
//! The match never talks to a model during play. `LearnedStrategy` queries it
//! once per decision state up front and keeps the answers.

use std::collections::HashMap;
use std::path::Path;

use candle_core::{DType, Device, Tensor, D};
use candle_nn::{linear, ops::softmax, Linear, Module, VarBuilder};
use itertools::Itertools;

use crate::cards::{Card, ALL_CARDS};
use crate::error::{KuhnError, KuhnResult};
use crate::game_tree::{History, DECISION_HISTORIES};
use crate::strategy::textbook_strategy;

/// 3 card one-hot slots followed by 4 history one-hot slots.
pub const FEATURE_DIM: usize = 7;

/// Number of outputs a model must produce: P(pass), P(bet).
pub const OUTPUT_DIM: usize = 2;

pub trait StrategyModel {
    /// Raw output for one encoded state. Shape and sum are checked by the
    /// caller, so a model only fails here when it cannot evaluate at all.
    fn predict(&self, features: &[f64; FEATURE_DIM]) -> KuhnResult<Vec<f64>>;
}

// ---------------------------------------------------------------------------
// Feature encoding
// ---------------------------------------------------------------------------

/// One-hot encode a decision state. Terminal histories have no encoding.
pub fn encode_features(card: Card, history: History) -> KuhnResult<[f64; FEATURE_DIM]> {
    let slot = history
        .decision_index()
        .ok_or_else(|| KuhnError::NoDecision(history.as_str().to_string()))?;
    let mut features = [0.0; FEATURE_DIM];
    features[card.index()] = 1.0;
    features[ALL_CARDS.len() + slot] = 1.0;
    Ok(features)
}

/// Inverse of `encode_features`, picking the hot slot of each block.
pub fn decode_features(features: &[f64; FEATURE_DIM]) -> KuhnResult<(Card, History)> {
    let (card_block, history_block) = features.split_at(ALL_CARDS.len());
    let card = hot_slot(card_block).map(|i| ALL_CARDS[i]);
    let history = hot_slot(history_block).map(|i| DECISION_HISTORIES[i]);
    match (card, history) {
        (Some(card), Some(history)) => Ok((card, history)),
        _ => Err(KuhnError::InvalidModel(format!(
            "features {:?} are not a one-hot state encoding",
            features
        ))),
    }
}

fn hot_slot(block: &[f64]) -> Option<usize> {
    let mut hot = block.iter().enumerate().filter(|&(_, &v)| v == 1.0);
    let first = hot.next().map(|(i, _)| i)?;
    let rest_zero = block
        .iter()
        .enumerate()
        .all(|(i, &v)| i == first || v == 0.0);
    rest_zero.then_some(first)
}

// ---------------------------------------------------------------------------
// Dense network (forward pass only)
// ---------------------------------------------------------------------------

/// Multi-layer perceptron with ReLU hidden layers and a softmax head, the
/// shape used by the 7-16-16-2 strategy network.
///
/// Parameters are named `layer{i}.weight` (`[out, in]`) and `layer{i}.bias`
/// (`[out]`), as written by a safetensors export.
#[derive(Debug, Clone)]
pub struct Mlp {
    layers: Vec<Linear>,
    shape: Vec<usize>,
    device: Device,
}

impl Mlp {
    /// Build from named tensors already in memory.
    pub fn from_tensors(tensors: HashMap<String, Tensor>) -> KuhnResult<Mlp> {
        let device = Device::Cpu;
        let shape = layer_shape(&tensors)?;
        let vs = VarBuilder::from_tensors(tensors, DType::F64, &device);
        Mlp::build(shape, &vs, device)
    }

    /// Build from a safetensors buffer.
    pub fn from_safetensors(bytes: Vec<u8>) -> KuhnResult<Mlp> {
        let device = Device::Cpu;
        let shape = layer_shape(&candle_core::safetensors::load_buffer(&bytes, &device)?)?;
        let vs = VarBuilder::from_buffered_safetensors(bytes, DType::F64, &device)?;
        Mlp::build(shape, &vs, device)
    }

    /// Load weights exported as a `.safetensors` file.
    pub fn load(path: &Path) -> KuhnResult<Mlp> {
        Mlp::from_safetensors(std::fs::read(path)?)
    }

    fn build(shape: Vec<usize>, vs: &VarBuilder, device: Device) -> KuhnResult<Mlp> {
        let layers = shape
            .iter()
            .tuple_windows()
            .enumerate()
            .map(|(i, (&inputs, &outputs))| linear(inputs, outputs, vs.pp(layer_name(i))))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Mlp {
            layers,
            shape,
            device,
        })
    }

    /// Layer widths from input to output, e.g. `[7, 16, 16, 2]`.
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn forward(&self, input: &[f64]) -> KuhnResult<Vec<f64>> {
        let last = self.layers.len().saturating_sub(1);
        let mut xs = Tensor::from_slice(input, (1, input.len()), &self.device)?;
        for (i, layer) in self.layers.iter().enumerate() {
            xs = layer.forward(&xs)?;
            if i < last {
                xs = xs.relu()?;
            }
        }
        let probs = softmax(&xs, D::Minus1)?;
        Ok(probs.squeeze(0)?.to_vec1::<f64>()?)
    }
}

impl StrategyModel for Mlp {
    fn predict(&self, features: &[f64; FEATURE_DIM]) -> KuhnResult<Vec<f64>> {
        self.forward(features)
    }
}

fn layer_name(index: usize) -> String {
    format!("layer{}", index)
}

/// Check the named tensors form a `FEATURE_DIM -> ... -> OUTPUT_DIM` chain of
/// finite dense layers and return the layer widths.
fn layer_shape(tensors: &HashMap<String, Tensor>) -> KuhnResult<Vec<usize>> {
    let invalid = |reason: String| KuhnError::InvalidModel(reason);
    let mut shape = vec![FEATURE_DIM];
    while let Some(weight) = tensors.get(&format!("{}.weight", layer_name(shape.len() - 1))) {
        let i = shape.len() - 1;
        let width = shape[i];
        let (outputs, inputs) = weight
            .dims2()
            .map_err(|_| invalid(format!("layer {} weight has shape {:?}", i, weight.dims())))?;
        if outputs == 0 {
            return Err(invalid(format!("layer {} is empty", i)));
        }
        if inputs != width {
            return Err(invalid(format!("layer {} expects {} inputs", i, width)));
        }
        let bias = tensors
            .get(&format!("{}.bias", layer_name(i)))
            .ok_or_else(|| invalid(format!("layer {} has no bias", i)))?;
        if bias.dims1().ok() != Some(outputs) {
            return Err(invalid(format!(
                "layer {} has {} outputs but bias shape {:?}",
                i,
                outputs,
                bias.dims()
            )));
        }
        if !all_finite(weight)? || !all_finite(bias)? {
            return Err(invalid(format!("layer {} has non-finite parameters", i)));
        }
        shape.push(outputs);
    }

    let layers = shape.len() - 1;
    if layers == 0 {
        return Err(invalid("network has no layers".to_string()));
    }
    if tensors.len() != 2 * layers {
        let extra = tensors
            .keys()
            .filter(|name| {
                !(0..layers).any(|i| {
                    **name == format!("{}.weight", layer_name(i))
                        || **name == format!("{}.bias", layer_name(i))
                })
            })
            .sorted()
            .join(", ");
        return Err(invalid(format!("unexpected tensors: {}", extra)));
    }
    if shape[layers] != OUTPUT_DIM {
        return Err(invalid(format!(
            "output layer has {} units, expected {}",
            shape[layers], OUTPUT_DIM
        )));
    }
    Ok(shape)
}

fn all_finite(tensor: &Tensor) -> KuhnResult<bool> {
    let values = tensor.to_dtype(DType::F64)?.flatten_all()?.to_vec1::<f64>()?;
    Ok(values.iter().all(|v| v.is_finite()))
}

// ---------------------------------------------------------------------------
// Label-table model
// ---------------------------------------------------------------------------

/// Answers with the textbook equilibrium labels, i.e. a perfectly fitted
/// network. Serves as the default learned side when no weights are supplied.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextbookModel;

impl StrategyModel for TextbookModel {
    fn predict(&self, features: &[f64; FEATURE_DIM]) -> KuhnResult<Vec<f64>> {
        let (card, history) = decode_features(features)?;
        Ok(textbook_strategy(card, history)?.probabilities().to_vec())
    }
}

//! Architecture configuration structures
//!
//! This module describes a network as a JSON-loadable list of layer
//! configurations and turns it into a [`Network`] in two phases:
//!
//! 1. [`plan_shapes`] chains the output-size arithmetic through every layer
//!    to learn each intermediate shape, including the flattened length.
//! 2. [`build_network`] draws parameters of exactly those shapes from a
//!    [`ParamProvider`] and assembles the layers.
//!
//! A dense layer's input size therefore never has to be written by hand or
//! discovered by running data through the convolution stages first.

use crate::error::{CnnError, Result};
use crate::init::ParamProvider;
use crate::layers::{Conv2DLayer, DenseLayer, FlattenLayer, Layer, MaxPool2DLayer};
use crate::network::Network;
use crate::tensor::Shape;
use crate::utils::shape::{element_count, output_size};
use crate::utils::Activation;
use serde::Deserialize;
use std::fs;
use std::path::Path;

const LAYER_TYPES: [&str; 4] = ["conv2d", "maxpool2d", "flatten", "dense"];

/// Shape of the image tensor fed to the first layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct InputConfig {
    pub channels: usize,
    pub height: usize,
    pub width: usize,
}

impl InputConfig {
    pub fn shape(&self) -> Shape {
        Shape::spatial(self.channels, self.height, self.width)
    }
}

/// Configuration for a single layer in the network.
///
/// Defines the layer type and its parameters. Different layer types use
/// different fields:
///
/// - **conv2d**: `filters`, and either `kernel_size` or both `kernel_height`
///   and `kernel_width`; optional `stride` (default 1), `padding` (default 0),
///   `in_channels` (checked against the plan when present)
/// - **maxpool2d**: `pool_size`, optional `stride` (default `pool_size`)
/// - **flatten**: no parameters
/// - **dense**: `output_size`, optional `input_size` (checked against the plan
///   when present)
///
/// Every layer accepts an optional `name` (used in reports) and an optional
/// `activation` (`"relu"` by default, or `"identity"`).
///
/// # Examples
///
/// ```json
/// {
///   "layer_type": "conv2d",
///   "filters": 3,
///   "kernel_size": 3,
///   "stride": 1,
///   "padding": 1
/// }
/// ```
///
/// ```json
/// {
///   "layer_type": "dense",
///   "output_size": 10
/// }
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LayerConfig {
    /// Type of layer: "conv2d", "maxpool2d", "flatten" or "dense"
    pub layer_type: String,
    /// Label printed in stage reports (default: type-based, e.g. "conv1")
    pub name: Option<String>,
    /// Activation applied after bias addition (conv2d and dense only)
    pub activation: Option<Activation>,

    // Conv2D layer parameters
    /// Number of filters (output channels)
    pub filters: Option<usize>,
    /// Expected input channel count
    pub in_channels: Option<usize>,
    /// Square kernel size
    pub kernel_size: Option<usize>,
    /// Kernel height (with `kernel_width`, for rectangular kernels)
    pub kernel_height: Option<usize>,
    /// Kernel width
    pub kernel_width: Option<usize>,
    /// Zero-padding on every side (default: 0)
    pub padding: Option<usize>,
    /// Window stride for conv2d (default: 1) and maxpool2d (default: pool_size)
    pub stride: Option<usize>,

    // MaxPool2D layer parameters
    /// Square pooling window size
    pub pool_size: Option<usize>,

    // Dense layer parameters
    /// Expected input length
    pub input_size: Option<usize>,
    /// Number of output neurons
    pub output_size: Option<usize>,
}

impl LayerConfig {
    pub fn conv2d(filters: usize, kernel_size: usize, stride: usize, padding: usize) -> Self {
        Self {
            layer_type: "conv2d".to_string(),
            filters: Some(filters),
            kernel_size: Some(kernel_size),
            stride: Some(stride),
            padding: Some(padding),
            ..Self::default()
        }
    }

    pub fn maxpool2d(pool_size: usize, stride: usize) -> Self {
        Self {
            layer_type: "maxpool2d".to_string(),
            pool_size: Some(pool_size),
            stride: Some(stride),
            ..Self::default()
        }
    }

    pub fn flatten() -> Self {
        Self {
            layer_type: "flatten".to_string(),
            ..Self::default()
        }
    }

    pub fn dense(output_size: usize) -> Self {
        Self {
            layer_type: "dense".to_string(),
            output_size: Some(output_size),
            ..Self::default()
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    fn kind(&self) -> String {
        let kind = self.layer_type.to_lowercase();
        match kind.as_str() {
            "maxpool" | "pool" => "maxpool2d".to_string(),
            "conv" => "conv2d".to_string(),
            _ => kind,
        }
    }

    fn kernel_dims(&self, index: usize) -> Result<(usize, usize)> {
        match (self.kernel_size, self.kernel_height, self.kernel_width) {
            (Some(k), None, None) => Ok((k, k)),
            (None, Some(h), Some(w)) => Ok((h, w)),
            (Some(_), _, _) => Err(CnnError::invalid_config(format!(
                "Layer {}: use either 'kernel_size' or 'kernel_height'/'kernel_width', not both",
                index
            ))),
            _ => Err(CnnError::invalid_config(format!(
                "Layer {}: Conv2D layer requires 'kernel_size' or 'kernel_height'/'kernel_width'",
                index
            ))),
        }
    }
}

/// Configuration for the entire network architecture.
///
/// # Example
///
/// ```json
/// {
///   "input": { "channels": 1, "height": 28, "width": 28 },
///   "layers": [
///     { "layer_type": "conv2d", "filters": 3, "kernel_size": 3, "padding": 1 },
///     { "layer_type": "maxpool2d", "pool_size": 2, "stride": 2 },
///     { "layer_type": "flatten" },
///     { "layer_type": "dense", "output_size": 10 }
///   ]
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct ArchitectureConfig {
    pub input: InputConfig,
    /// Sequence of layer configurations defining the network structure
    pub layers: Vec<LayerConfig>,
}

impl ArchitectureConfig {
    /// Side length of the reference input image.
    pub const REFERENCE_IMAGE_SIZE: usize = 28;

    /// The reference classifier:
    /// Conv(3, 3x3, pad 1) → Pool(2) → Conv(5, 3x3, pad 1) → Pool(2) →
    /// Flatten → Dense(128) → Dense(10), over a 1×28×28 image.
    pub fn reference() -> Self {
        Self {
            input: InputConfig {
                channels: 1,
                height: Self::REFERENCE_IMAGE_SIZE,
                width: Self::REFERENCE_IMAGE_SIZE,
            },
            layers: vec![
                LayerConfig::conv2d(3, 3, 1, 1).named("conv1"),
                LayerConfig::maxpool2d(2, 2).named("pool1"),
                LayerConfig::conv2d(5, 3, 1, 1).named("conv2"),
                LayerConfig::maxpool2d(2, 2).named("pool2"),
                LayerConfig::flatten().named("flatten"),
                LayerConfig::dense(128).named("dense1"),
                LayerConfig::dense(10).named("dense2"),
            ],
        }
    }

    /// Report labels for every layer: the configured name, or the layer kind
    /// followed by its 1-based position among layers of that kind.
    pub fn labels(&self) -> Vec<String> {
        let mut counts = [0usize; LAYER_TYPES.len()];
        self.layers
            .iter()
            .map(|layer| {
                let kind = layer.kind();
                let position = LAYER_TYPES.iter().position(|t| *t == kind);
                if let Some(i) = position {
                    counts[i] += 1;
                }
                match (&layer.name, position) {
                    (Some(name), _) => name.clone(),
                    (None, Some(i)) => match kind.as_str() {
                        "conv2d" => format!("conv{}", counts[i]),
                        "maxpool2d" => format!("pool{}", counts[i]),
                        "flatten" => "flatten".to_string(),
                        _ => format!("dense{}", counts[i]),
                    },
                    (None, None) => layer.layer_type.clone(),
                }
            })
            .collect()
    }
}

impl Default for ArchitectureConfig {
    fn default() -> Self {
        Self::reference()
    }
}

/// Loads an architecture configuration from a JSON file.
///
/// Reads the file at `path`, deserializes it and runs the full shape plan so
/// an architecture that cannot be built is rejected here.
///
/// # Examples
///
/// ```no_run
/// use cnn_inference::architecture::load_architecture;
///
/// let arch = load_architecture("config/architectures/reference_cnn.json").unwrap();
/// assert!(!arch.layers.is_empty());
/// ```
pub fn load_architecture(path: impl AsRef<Path>) -> Result<ArchitectureConfig> {
    let contents = fs::read_to_string(path)?;
    let config: ArchitectureConfig = serde_json::from_str(&contents)?;
    validate_architecture(&config)?;
    Ok(config)
}

/// Validates an architecture configuration.
///
/// Checks that:
/// - the input shape and every layer's parameters are positive
/// - every layer has the fields its type requires
/// - the layer chain is shape-consistent end to end and ends in a flat vector
pub fn validate_architecture(config: &ArchitectureConfig) -> Result<()> {
    let shapes = plan_shapes(config)?;
    ensure_flat_output(&shapes)
}

fn ensure_flat_output(shapes: &[Shape]) -> Result<()> {
    match shapes.last() {
        Some(shape) if shape.is_flat() => Ok(()),
        Some(shape) => Err(CnnError::invalid_config(format!(
            "Architecture must end with a flat output, last layer produces {}",
            shape
        ))),
        None => Err(CnnError::invalid_config(
            "Architecture must have at least one layer",
        )),
    }
}

/// Validates a single layer configuration in isolation.
fn validate_layer(layer: &LayerConfig, index: usize) -> Result<()> {
    let require = |value: Option<usize>, field: &str| -> Result<()> {
        match value {
            None => Err(CnnError::invalid_config(format!(
                "Layer {}: {} layer requires '{}'",
                index, layer.layer_type, field
            ))),
            Some(0) => Err(CnnError::invalid_config(format!(
                "Layer {}: {} must be greater than 0",
                index, field
            ))),
            Some(_) => Ok(()),
        }
    };
    let positive_if_set = |value: Option<usize>, field: &str| -> Result<()> {
        if value == Some(0) {
            return Err(CnnError::invalid_config(format!(
                "Layer {}: {} must be greater than 0",
                index, field
            )));
        }
        Ok(())
    };

    match layer.kind().as_str() {
        "conv2d" => {
            require(layer.filters, "filters")?;
            let (kh, kw) = layer.kernel_dims(index)?;
            require(Some(kh), "kernel_height")?;
            require(Some(kw), "kernel_width")?;
            positive_if_set(layer.stride, "stride")?;
            positive_if_set(layer.in_channels, "in_channels")?;
        }
        "maxpool2d" => {
            require(layer.pool_size, "pool_size")?;
            positive_if_set(layer.stride, "stride")?;
        }
        "flatten" => {}
        "dense" => {
            require(layer.output_size, "output_size")?;
            positive_if_set(layer.input_size, "input_size")?;
        }
        _ => {
            return Err(CnnError::invalid_config(format!(
                "Layer {}: Invalid layer type '{}'. Must be one of: {}",
                index,
                layer.layer_type,
                LAYER_TYPES.join(", ")
            )));
        }
    }

    if layer.activation.is_some() && !matches!(layer.kind().as_str(), "conv2d" | "dense") {
        return Err(CnnError::invalid_config(format!(
            "Layer {}: {} layer has no activation",
            index, layer.layer_type
        )));
    }

    Ok(())
}

/// Output shape of one configured layer for a given input shape.
fn plan_layer(layer: &LayerConfig, index: usize, input: Shape) -> Result<Shape> {
    let at_layer = move |e: CnnError| match e {
        CnnError::InvalidConfig(msg) => {
            CnnError::invalid_config(format!("Layer {}: {}", index, msg))
        }
        other => other,
    };

    match (layer.kind().as_str(), input) {
        (
            "conv2d",
            Shape::Spatial {
                channels,
                height,
                width,
            },
        ) => {
            if let Some(expected) = layer.in_channels {
                if expected != channels {
                    return Err(CnnError::shape_mismatch(
                        format!("layer {} in_channels", index),
                        expected,
                        channels,
                    ));
                }
            }
            let (kh, kw) = layer.kernel_dims(index)?;
            let stride = layer.stride.unwrap_or(1);
            let padding = layer.padding.unwrap_or(0);
            let filters = layer.filters.unwrap_or(0);
            let out_h = output_size(height, kh, stride, padding).map_err(at_layer)?;
            let out_w = output_size(width, kw, stride, padding).map_err(at_layer)?;
            element_count(&[filters, channels, kh, kw]).map_err(at_layer)?;
            let shape = Shape::spatial(filters, out_h, out_w);
            shape.total().map_err(at_layer)?;
            Ok(shape)
        }
        (
            "maxpool2d",
            Shape::Spatial {
                channels,
                height,
                width,
            },
        ) => {
            let pool = layer.pool_size.unwrap_or(0);
            let stride = layer.stride.unwrap_or(pool);
            let out_h = output_size(height, pool, stride, 0).map_err(at_layer)?;
            let out_w = output_size(width, pool, stride, 0).map_err(at_layer)?;
            Ok(Shape::spatial(channels, out_h, out_w))
        }
        ("flatten", Shape::Spatial { .. }) => Ok(Shape::Flat(input.total().map_err(at_layer)?)),
        ("dense", Shape::Flat(len)) => {
            if let Some(expected) = layer.input_size {
                if expected != len {
                    return Err(CnnError::shape_mismatch(
                        format!("layer {} input_size", index),
                        expected,
                        len,
                    ));
                }
            }
            let output = layer.output_size.unwrap_or(0);
            element_count(&[output, len]).map_err(at_layer)?;
            Ok(Shape::Flat(output))
        }
        (kind, shape) => Err(CnnError::shape_mismatch(
            format!("layer {} ({}) input", index, kind),
            if kind == "dense" {
                "a flat vector"
            } else {
                "a CxHxW tensor"
            },
            shape,
        )),
    }
}

/// Phase 1: computes the output shape of every layer analytically.
///
/// Returns one shape per layer, in order.
pub fn plan_shapes(config: &ArchitectureConfig) -> Result<Vec<Shape>> {
    let InputConfig {
        channels,
        height,
        width,
    } = config.input;
    if channels == 0 || height == 0 || width == 0 {
        return Err(CnnError::invalid_config(format!(
            "input dimensions must be positive, got {}x{}x{}",
            channels, height, width
        )));
    }
    if config.layers.is_empty() {
        return Err(CnnError::invalid_config(
            "Architecture must have at least one layer",
        ));
    }

    let mut shape = config.input.shape();
    let mut shapes = Vec::with_capacity(config.layers.len());
    for (i, layer) in config.layers.iter().enumerate() {
        validate_layer(layer, i)?;
        shape = plan_layer(layer, i, shape)?;
        shapes.push(shape);
    }
    Ok(shapes)
}

/// Phase 2: builds the network, drawing every parameter array from `params`.
///
/// Parameters are requested layer by layer in order: filters then biases for
/// each conv2d, weights then biases for each dense layer.
pub fn build_network(
    config: &ArchitectureConfig,
    params: &mut dyn ParamProvider,
) -> Result<Network> {
    let shapes = plan_shapes(config)?;
    ensure_flat_output(&shapes)?;
    let labels = config.labels();

    let mut network = Network::new(config.input.shape());
    let mut input_shape = config.input.shape();

    for (i, layer_config) in config.layers.iter().enumerate() {
        let activation = layer_config.activation.unwrap_or_default();
        let kind = layer_config.kind();
        let layer: Box<dyn Layer> = match (kind.as_str(), input_shape, shapes[i]) {
            (
                "conv2d",
                Shape::Spatial { channels, .. },
                Shape::Spatial {
                    channels: filters, ..
                },
            ) => {
                let (kh, kw) = layer_config.kernel_dims(i)?;
                let bank = params.filter_bank(filters, channels, kh, kw)?;
                let biases = params.bias(filters);
                let layer = Conv2DLayer::new(
                    bank,
                    biases,
                    layer_config.stride.unwrap_or(1),
                    layer_config.padding.unwrap_or(0),
                )?;
                Box::new(layer.with_activation(activation))
            }
            ("maxpool2d", _, _) => {
                let pool = layer_config.pool_size.unwrap_or(0);
                Box::new(MaxPool2DLayer::new(pool, layer_config.stride.unwrap_or(pool))?)
            }
            ("flatten", _, _) => Box::new(FlattenLayer),
            ("dense", Shape::Flat(input_size), Shape::Flat(output_size)) => {
                let weights = params.weight_matrix(output_size, input_size)?;
                let biases = params.bias(output_size);
                let layer = DenseLayer::new(weights, biases, input_size, output_size)?;
                Box::new(layer.with_activation(activation))
            }
            (kind, _, _) => {
                return Err(CnnError::invalid_config(format!(
                    "Layer {}: cannot build {} layer from planned shape {}",
                    i, kind, input_shape
                )));
            }
        };

        input_shape = network.push(labels[i].clone(), layer)?;
    }

    tracing::info!(
        layers = network.len(),
        parameters = network.parameter_count(),
        input = %network.input_shape(),
        output = %network.output_shape(),
        "network assembled"
    );
    Ok(network)
}

//! CNN Inference Library
//!
//! A forward-only convolutional network over a single image tensor:
//! Conv → Pool → Conv → Pool → Flatten → Dense → Dense in the reference
//! topology, producing a vector of class scores.
//!
//! # Modules
//!
//! - `tensor`: `Tensor3D`, `Vector1D` and the `Shape` flowing between stages
//! - `layers`: Layer trait and the conv2d, maxpool2d, flatten and dense stages
//! - `network`: the ordered stage chain and its forward pass
//! - `architecture`: JSON topology description, shape planning and building
//! - `init`: parameter providers (seeded Gaussian, constant)
//! - `image`: PNG to normalized luma tensor
//! - `config`: run configuration
//! - `report`: console output formatting
//! - `utils`: shape arithmetic and activation functions
//!
//! # Example
//!
//! ```no_run
//! use cnn_inference::architecture::{build_network, ArchitectureConfig};
//! use cnn_inference::image::load_image;
//! use cnn_inference::init::GaussianInit;
//!
//! let arch = ArchitectureConfig::reference();
//! let mut init = GaussianInit::new(42, GaussianInit::DEFAULT_STD)?;
//! let network = build_network(&arch, &mut init)?;
//! let input = load_image("android_Ninja.png", 28, 28)?;
//! let scores = network.forward(input)?;
//! assert_eq!(scores.len(), 10);
//! # Ok::<(), cnn_inference::CnnError>(())
//! ```

pub mod architecture;
pub mod config;
pub mod error;
pub mod image;
pub mod init;
pub mod layers;
pub mod network;
pub mod report;
pub mod tensor;
pub mod utils;

pub use error::{CnnError, Result};
pub use init::{ConstantInit, GaussianInit, ParamProvider};
pub use layers::{Conv2DLayer, DenseLayer, FilterBank, FlattenLayer, Layer, MaxPool2DLayer};
pub use network::{Network, StageReport};
pub use tensor::{Shape, Tensor, Tensor3D, Vector1D};

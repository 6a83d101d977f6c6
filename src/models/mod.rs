// src/models/mod.rs
pub mod gbm;
pub mod heston;
pub mod merton;
pub mod model;

pub use gbm::Gbm;
pub use heston::{Heston, HestonParams, HestonScheme};
pub use merton::{Merton, MertonParams};
pub use model::{Dynamics, PathModel};

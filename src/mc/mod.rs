// src/mc/mod.rs
pub mod brownian_bridge;
pub mod estimators;
pub mod greeks;
pub mod importance;
pub mod mc_engine;
pub mod path_generator;
pub mod payoffs;
pub mod quasi;
pub mod stats;

pub use estimators::{ControlVariateSpec, CvCoefficient, DrawSource, Estimator};
pub use mc_engine::McConfig;
pub use payoffs::{CustomPayoff, Payoff};
pub use stats::{DrawProvenance, EstimatorResult};

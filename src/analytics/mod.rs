// src/analytics/mod.rs
pub mod bjerksund;
pub mod bs_analytic;
pub mod merton;
pub mod trees;

pub use bjerksund::bjerksund_stensland;
pub use bs_analytic::{
    black_scholes, black_scholes_greeks, bs_call_price, bs_greeks, bs_price, bs_put_price, Greeks,
};
pub use merton::merton_jump_price;
pub use trees::{binomial_price, trinomial_price, ExerciseStyle};

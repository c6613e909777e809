pub mod european;

pub use crate::core::types::OptionType;
pub use european::black_scholes_price;

pub mod analysis;
pub mod sma;

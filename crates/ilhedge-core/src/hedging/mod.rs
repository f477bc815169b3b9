pub mod analysis;
pub mod payoffs;

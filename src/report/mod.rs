//! Dashboard report rendering.

pub mod generator;

pub use generator::render;

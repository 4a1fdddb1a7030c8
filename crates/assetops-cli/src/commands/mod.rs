pub mod demo;
pub mod matrix;
pub mod normalize;

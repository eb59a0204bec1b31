pub mod gradient_clipping;
pub mod trainer;

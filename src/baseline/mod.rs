pub mod sampler;

pub use sampler::{BaselineMethod, BaselineSampler};

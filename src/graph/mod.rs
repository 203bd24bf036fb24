pub mod construction;
pub mod model;
pub mod serialization;

pub use construction::GraphLoader;
pub use model::{EdgeAttributes, GraphId, GraphInstance, NodeAttributes, RawGraph};
pub use serialization::GraphWriter;

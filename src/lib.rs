pub mod baseline;
pub mod count;
pub mod datasets;
pub mod graph;
pub mod queries;
pub mod report;

pub use baseline::{BaselineMethod, BaselineSampler};
pub use count::{CountConfig, CountDispatcher, CountMethod, ExternalMatcher};
pub use datasets::DatasetLoader;
pub use graph::{GraphId, GraphInstance, GraphLoader, GraphWriter};
pub use queries::QuerySet;
pub use report::CountReport;

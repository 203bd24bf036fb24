pub mod dispatcher;
pub mod exact;
pub mod external;
pub mod isomorphism;
pub mod signature;

pub use dispatcher::{CountConfig, CountDispatcher, CountMethod};
pub use exact::count_exact;
pub use external::ExternalMatcher;

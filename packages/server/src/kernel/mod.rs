//! Kernel module - server infrastructure and dependencies.

pub mod ai;
pub mod deps;
pub mod emr;
pub mod search;
pub mod test_dependencies;
pub mod traits;

pub use ai::OpenAICompletion;
pub use deps::ServerDeps;
pub use emr::EmrClient;
pub use search::AzureSearchRetriever;
pub use test_dependencies::{MockCompletion, MockEmr, MockRetrieval};
pub use traits::*;

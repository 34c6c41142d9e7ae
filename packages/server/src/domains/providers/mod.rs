//! Providers domain - the clinician directory.

pub mod insurers;
pub mod lookup;
pub mod models;
pub mod parser;

pub use insurers::{canonical_insurer, find_insurer_mentions, CASH_PAY};
pub use lookup::DirectoryFilter;
pub use models::{Provider, ProviderRole};
pub use parser::parse_providers;

// HTTP routes
pub mod chat;
pub mod diag;
pub mod directory;
pub mod health;

pub use chat::*;
pub use diag::*;
pub use directory::*;
pub use health::*;

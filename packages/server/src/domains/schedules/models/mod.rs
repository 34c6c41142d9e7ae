pub mod slot;

pub use slot::*;

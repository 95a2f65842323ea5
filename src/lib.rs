pub mod config;
pub mod dwarf;
pub mod error;
pub mod lister;
pub mod runner;
pub mod symbols;
pub mod tree;

pub use error::{Error, Result};

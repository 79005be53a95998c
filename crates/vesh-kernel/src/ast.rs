//! Abstract syntax tree consumed by the compiler.
//!
//! The parser lives outside this crate; it hands over trees of these types.
//! `build` offers constructors for assembling trees by hand.

pub mod build;
mod types;

pub use types::*;

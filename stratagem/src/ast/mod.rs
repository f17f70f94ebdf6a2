//! Abstract Syntax Tree definitions
//!
//! The tree is produced by an external front end. `Cast` nodes never come
//! from the front end: the type checker inserts them.

mod build;
mod expr;

pub use expr::*;

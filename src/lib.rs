//! Dungeon Tables: dice-driven random tables for procedural dungeon text.
//!
//! Compiles plain-text range tables and named blocks into a library, then
//! rolls on them recursively: entries may call other tables and blocks,
//! with cycle and depth guards keeping every resolution finite.

pub mod core;
pub mod schema;

pub use crate::core::config::GeneratorConfig;
pub use crate::core::pipeline::{DungeonGenerator, GeneratorError};
pub use crate::core::resolver::{ResolveError, Resolver};

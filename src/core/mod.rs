//! Compilation, resolution, and the generator pipeline.

pub mod bestiary;
pub mod blocks;
pub mod config;
pub mod context;
pub mod dice;
pub mod entry;
pub mod library;
pub mod pipeline;
pub mod registry;
pub mod resolver;
pub mod sources;
pub mod tables;

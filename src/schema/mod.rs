//! Data model shared by the compilers and the resolver.

pub mod block;
pub mod dice;
pub mod monster;
pub mod table;

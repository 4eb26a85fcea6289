/// Table library: the compiled tables, blocks, and dice registry that a
/// resolution reads from.

use std::collections::HashMap;
use tracing::debug;

use crate::core::blocks::{compile_block_sources, compile_blocks, BlockError};
use crate::core::registry::DiceRegistry;
use crate::core::sources::SourceSet;
use crate::core::tables::{compile_tables, loose_key, parse_table_source, table_key, TableError};
use crate::schema::block::NamedBlock;
use crate::schema::table::RangeTable;

/// What a start name matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartPoint<'a> {
    Table(&'a str),
    Block(&'a str),
}

#[derive(Debug, Clone, Default)]
pub struct TableLibrary {
    tables: HashMap<String, RangeTable>,
    blocks: HashMap<String, NamedBlock>,
    dice: DiceRegistry,
}

impl TableLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile every source in `sources`. With `skip_unreadable`, files
    /// that cannot be read are logged and left out; otherwise the first
    /// failure aborts compilation.
    pub fn compile(sources: &SourceSet, skip_unreadable: bool) -> Result<Self, LibraryError> {
        let mut library = Self::new();
        library.tables = compile_tables(&sources.table_files, skip_unreadable)?;
        library.blocks = compile_blocks(&sources.block_files, &mut library.dice, skip_unreadable)?;

        debug!(
            tables = library.tables.len(),
            blocks = library.blocks.len(),
            notations = library.dice.len(),
            "compiled library"
        );
        Ok(library)
    }

    /// Build a library from in-memory sources: `(name, text)` table
    /// sources and block source texts.
    pub fn from_sources(tables: &[(&str, &str)], block_sources: &[&str]) -> Self {
        let mut library = Self::new();
        for (name, text) in tables {
            library.insert_table(name, parse_table_source(text));
        }
        library.add_block_sources(block_sources.iter().copied());
        library
    }

    pub fn insert_table(&mut self, name: &str, table: RangeTable) {
        self.tables.insert(table_key(name), table);
    }

    /// Compile block sources into this library; blocks replace existing
    /// blocks with the same name.
    pub fn add_block_sources<'a, I>(&mut self, sources: I)
    where
        I: IntoIterator<Item = &'a str>,
    {
        let compiled = compile_block_sources(sources, &mut self.dice);
        self.blocks.extend(compiled);
    }

    pub fn table(&self, name: &str) -> Option<&RangeTable> {
        self.tables.get(name)
    }

    pub fn block(&self, name: &str) -> Option<&NamedBlock> {
        self.blocks.get(name)
    }

    pub fn tables(&self) -> &HashMap<String, RangeTable> {
        &self.tables
    }

    pub fn blocks(&self) -> &HashMap<String, NamedBlock> {
        &self.blocks
    }

    pub fn dice(&self) -> &DiceRegistry {
        &self.dice
    }

    pub fn dice_mut(&mut self) -> &mut DiceRegistry {
        &mut self.dice
    }

    pub fn table_names(&self) -> Vec<&str> {
        sorted_keys(&self.tables)
    }

    pub fn block_names(&self) -> Vec<&str> {
        sorted_keys(&self.blocks)
    }

    /// Match a user-supplied start name, ignoring case, `-` and `_`.
    /// Tables are tried before blocks; among several candidates the
    /// alphabetically first wins.
    pub fn find_start(&self, input: &str) -> Option<StartPoint<'_>> {
        let wanted = loose_key(input);
        if let Some(name) = self
            .table_names()
            .into_iter()
            .find(|k| loose_key(k) == wanted)
        {
            return Some(StartPoint::Table(name));
        }
        self.block_names()
            .into_iter()
            .find(|k| loose_key(k) == wanted)
            .map(StartPoint::Block)
    }
}

fn sorted_keys<V>(map: &HashMap<String, V>) -> Vec<&str> {
    let mut keys: Vec<&str> = map.keys().map(String::as_str).collect();
    keys.sort_unstable();
    keys
}

#[derive(Debug, thiserror::Error)]
pub enum LibraryError {
    #[error(transparent)]
    Table(#[from] TableError),
    #[error(transparent)]
    Block(#[from] BlockError),
}

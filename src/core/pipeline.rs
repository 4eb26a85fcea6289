/// The generator pipeline: sources → compiled library → resolved text.
///
/// Wires together source discovery, table and block compilation,
/// configuration, the resolver, and the optional bestiary.

use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

use crate::core::bestiary::{Bestiary, BestiaryError};
use crate::core::config::{ConfigError, GeneratorConfig};
use crate::core::context::ResolutionContext;
use crate::core::dice::Roller;
use crate::core::library::{LibraryError, TableLibrary};
use crate::core::resolver::{ResolveError, Resolver};
use crate::core::sources::{SourceError, SourceSet};

#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("source error: {0}")]
    Sources(#[from] SourceError),
    #[error("library error: {0}")]
    Library(#[from] LibraryError),
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("bestiary error: {0}")]
    Bestiary(#[from] BestiaryError),
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error("no table or block sources found in '{}'", .0.display())]
    NoSources(PathBuf),
}

/// The top-level generator. Built via `DungeonGenerator::builder()`.
pub struct DungeonGenerator {
    library: TableLibrary,
    config: GeneratorConfig,
    bestiary: Option<Bestiary>,
    rng: StdRng,
}

/// Builder for constructing a `DungeonGenerator`.
pub struct DungeonGeneratorBuilder {
    source_dir: Option<PathBuf>,
    subdir: Option<String>,
    config_path: Option<PathBuf>,
    bestiary_path: Option<PathBuf>,
    seed: Option<u64>,
    skip_unreadable: bool,
    /// Directly provided config (for testing without files).
    config: Option<GeneratorConfig>,
    /// Directly provided library (for testing without files).
    library: Option<TableLibrary>,
}

impl DungeonGenerator {
    pub fn builder() -> DungeonGeneratorBuilder {
        DungeonGeneratorBuilder {
            source_dir: None,
            subdir: None,
            config_path: None,
            bestiary_path: None,
            seed: None,
            skip_unreadable: false,
            config: None,
            library: None,
        }
    }

    /// Resolve one start table or block.
    pub fn generate(&mut self, start: &str) -> Result<String, GeneratorError> {
        let mut ctx = ResolutionContext::new();
        self.generate_traced(start, &mut ctx)
    }

    /// Like [`DungeonGenerator::generate`], leaving the resolution
    /// diagnostics in `ctx`.
    pub fn generate_traced(
        &mut self,
        start: &str,
        ctx: &mut ResolutionContext,
    ) -> Result<String, GeneratorError> {
        let resolver = Resolver::new(&self.library, &self.config);
        let output = resolver.resolve_with(start, ctx, &mut self.rng)?;
        debug!(
            start,
            deepest = ctx.deepest(),
            cycles = ctx.cycles().len(),
            missing = ctx.missing().len(),
            depth_cutoffs = ctx.depth_cutoffs(),
            "resolution finished"
        );
        Ok(output)
    }

    /// Resolve with a caller-supplied roller, leaving the generator's own
    /// random state untouched.
    pub fn generate_with<R: Roller + ?Sized>(&self, start: &str, rng: &mut R) -> Result<String, ResolveError> {
        Resolver::new(&self.library, &self.config).resolve(start, rng)
    }

    /// The stat table for monsters mentioned in `text`, when a bestiary is
    /// loaded and anything matched.
    pub fn monster_stats(&self, text: &str) -> Option<String> {
        self.bestiary.as_ref().and_then(|b| b.stats_for(text))
    }

    pub fn library(&self) -> &TableLibrary {
        &self.library
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub fn bestiary(&self) -> Option<&Bestiary> {
        self.bestiary.as_ref()
    }
}

impl DungeonGeneratorBuilder {
    /// Directory holding `.tab` tables and `.txt` block sources.
    pub fn source_dir(mut self, path: impl AsRef<Path>) -> Self {
        self.source_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// Content set inside the source directory whose files override the
    /// top-level ones.
    pub fn subdir(mut self, name: &str) -> Self {
        self.subdir = Some(name.to_string());
        self
    }

    pub fn config_path(mut self, path: impl AsRef<Path>) -> Self {
        self.config_path = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn bestiary(mut self, path: impl AsRef<Path>) -> Self {
        self.bestiary_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Fix the random seed. Without one the generator seeds from entropy.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Leave out source files that cannot be read instead of failing.
    pub fn skip_unreadable(mut self, skip: bool) -> Self {
        self.skip_unreadable = skip;
        self
    }

    /// Provide a config directly (for testing without files).
    pub fn with_config(mut self, config: GeneratorConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Provide a compiled library directly (for testing without files).
    pub fn with_library(mut self, library: TableLibrary) -> Self {
        self.library = Some(library);
        self
    }

    pub fn build(self) -> Result<DungeonGenerator, GeneratorError> {
        let config = match (self.config, &self.config_path) {
            (Some(config), _) => config,
            (None, Some(path)) => GeneratorConfig::load_from_ron(path)?,
            (None, None) => GeneratorConfig::default(),
        };

        let library = match (self.library, &self.source_dir) {
            (Some(library), _) => library,
            (None, Some(dir)) => {
                let sources = SourceSet::discover(dir, self.subdir.as_deref())?;
                if sources.is_empty() {
                    return Err(GeneratorError::NoSources(dir.clone()));
                }
                TableLibrary::compile(&sources, self.skip_unreadable)?
            }
            (None, None) => TableLibrary::new(),
        };

        let bestiary = self
            .bestiary_path
            .as_deref()
            .map(Bestiary::load)
            .transpose()?;

        let rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        info!(
            tables = library.tables().len(),
            blocks = library.blocks().len(),
            seed = ?self.seed,
            "generator ready"
        );

        Ok(DungeonGenerator {
            library,
            config,
            bestiary,
            rng,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::dice::ScriptedRoller;

    fn sample_library() -> TableLibrary {
        TableLibrary::from_sources(
            &[
                ("room", "1-4 Empty\n5-8 Wandering()\n9-12 [[Trap & Dressing]]"),
                ("trap", "1-6 Pit\n7-12 Darts"),
                ("dressing", "1-12 \"Bones\""),
            ],
            &["Wandering\n(\n1-6 3 Clanrats\n7-12 Nothing stirs\n)"],
        )
    }

    fn build(seed: u64) -> DungeonGenerator {
        DungeonGenerator::builder()
            .seed(seed)
            .with_library(sample_library())
            .build()
            .unwrap()
    }

    #[test]
    fn same_seed_same_output() {
        let mut a = build(42);
        let mut b = build(42);
        for _ in 0..20 {
            assert_eq!(a.generate("room").unwrap(), b.generate("room").unwrap());
        }
    }

    #[test]
    fn generate_with_scripted_rolls() {
        let generator = build(0);
        let mut roller = ScriptedRoller::new(vec![10, 3]);
        assert_eq!(generator.generate_with("room", &mut roller).unwrap(), "Pit\nBones");
    }

    #[test]
    fn unknown_start_is_an_error() {
        let mut generator = build(1);
        let err = generator.generate("kitchen").unwrap_err();
        assert!(matches!(err, GeneratorError::Resolve(ResolveError::NotFound { .. })));
        assert!(err.to_string().starts_with("[Table 'kitchen' not found."));
    }

    #[test]
    fn builder_defaults() {
        let generator = DungeonGenerator::builder().build().unwrap();
        assert!(generator.library().tables().is_empty());
        assert_eq!(generator.config(), &GeneratorConfig::default());
        assert!(generator.monster_stats("3 Clanrats").is_none());
    }

    #[test]
    fn empty_source_dir_is_reported() {
        let err = DungeonGenerator::builder()
            .source_dir("src/schema")
            .build()
            .err()
            .unwrap();
        assert!(matches!(err, GeneratorError::NoSources(_)));
    }
}

/// Table Linter: checks table and block sources for unreachable entries,
/// gaps, and broken references.
///
/// Usage: table_linter <dir> [--subdir <name>] [--config <file.ron>]

use std::path::PathBuf;
use std::process;

use clap::Parser;

use dungeon_tables::core::config::GeneratorConfig;
use dungeon_tables::core::dice::MAX_DICE;
use dungeon_tables::core::entry::{inline_calls, Entry};
use dungeon_tables::core::library::TableLibrary;
use dungeon_tables::core::resolver::Resolver;
use dungeon_tables::core::sources::SourceSet;
use dungeon_tables::core::tables::table_key;
use dungeon_tables::schema::dice::DiceSpec;
use dungeon_tables::schema::table::RangeTable;

#[derive(Parser)]
#[command(name = "table_linter", version, about = "Check dungeon tables and named blocks")]
struct Cli {
    /// Directory holding .tab tables and .txt block sources
    dir: PathBuf,

    /// Content set inside <dir> to lint merged over the top level
    #[arg(short, long)]
    subdir: Option<String>,

    /// Generator config (RON) supplying default dice
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();

    let config = match cli.config {
        Some(ref path) => match GeneratorConfig::load_from_ron(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("ERROR: Failed to load config: {e}");
                process::exit(1);
            }
        },
        None => GeneratorConfig::default(),
    };

    let sources = match SourceSet::discover(&cli.dir, cli.subdir.as_deref()) {
        Ok(sources) => sources,
        Err(e) => {
            eprintln!("ERROR: {e}");
            process::exit(1);
        }
    };
    for path in &sources.block_files {
        println!("  Found: {}", path.display());
    }

    let library = match TableLibrary::compile(&sources, false) {
        Ok(library) => library,
        Err(e) => {
            eprintln!("ERROR: {e}");
            process::exit(1);
        }
    };

    println!(
        "Loaded {} tables and {} blocks",
        library.tables().len(),
        library.blocks().len()
    );

    let (errors, warnings) = lint_library(&library, &config);

    println!("\n=== Table Lint Report ===\n");

    if errors.is_empty() && warnings.is_empty() {
        println!("All checks passed!");
    }

    for warning in &warnings {
        println!("WARNING: {warning}");
    }

    for error in &errors {
        println!("ERROR: {error}");
    }

    println!(
        "\nSummary: {} errors, {} warnings",
        errors.len(),
        warnings.len()
    );

    if errors.is_empty() {
        process::exit(0);
    } else {
        process::exit(1);
    }
}

fn lint_library(library: &TableLibrary, config: &GeneratorConfig) -> (Vec<String>, Vec<String>) {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();
    let resolver = Resolver::new(library, config);

    for name in library.table_names() {
        let Some(table) = library.table(name) else {
            continue;
        };
        let label = format!("Table '{name}'");
        let dice = resolver.table_notation(name);
        check_coverage(&label, table, dice, &mut warnings);

        for content in table.contents() {
            if let Entry::NestedRefs(refs) = Entry::parse(content) {
                for table_ref in refs {
                    if library.table(&table_ref).is_none() {
                        errors.push(format!("{label} references non-existent table '{table_ref}'"));
                    }
                }
            }
            check_calls(&label, content, library, &mut errors);
        }
    }

    for name in library.block_names() {
        let Some(block) = library.block(name) else {
            continue;
        };
        let label = format!("Block '{name}'");
        let Some(outer) = block.outer() else {
            errors.push(format!("{label} has no entries"));
            continue;
        };

        let dice = resolver.block_notation(block);
        check_coverage(&label, &outer.table, dice, &mut warnings);
        if let Some(nested) = block.nested() {
            let dice = nested.dice.unwrap_or(config.default_dice);
            let nested_label = format!("{label} (nested level)");
            check_coverage(&nested_label, &nested.table, dice, &mut warnings);
        }

        let contents = outer.table.contents();
        if !contents.is_empty() && contents.iter().all(|c| table_key(c) == block.name) {
            errors.push(format!("{label} can only roll its own name"));
        }

        for level in &block.levels {
            for content in level.table.contents() {
                check_calls(&label, content, library, &mut errors);
            }
        }
    }

    (errors, warnings)
}

fn check_coverage(label: &str, table: &RangeTable, dice: DiceSpec, warnings: &mut Vec<String>) {
    let dice = if dice.count > MAX_DICE { DiceSpec::DEFAULT } else { dice };
    let (min, max) = (dice.min_total(), dice.max_total());

    let shadowed = table.shadowed_rolls();
    if !shadowed.is_empty() {
        warnings.push(format!(
            "{label} has overlapping ranges; rolls {} always take the earlier entry",
            format_spans(&shadowed)
        ));
    }
    let uncovered = table.uncovered_rolls(min, max);
    if !uncovered.is_empty() {
        warnings.push(format!(
            "{label} has no entry for rolls {} of {dice} ({min}-{max})",
            format_spans(&uncovered)
        ));
    }
}

fn format_spans(spans: &[(u32, u32)]) -> String {
    spans
        .iter()
        .map(|(lo, hi)| if lo == hi { lo.to_string() } else { format!("{lo}-{hi}") })
        .collect::<Vec<_>>()
        .join(", ")
}

fn check_calls(label: &str, content: &str, library: &TableLibrary, errors: &mut Vec<String>) {
    for call in inline_calls(content) {
        let key = table_key(call);
        if library.block(&key).is_none() && library.table(&key).is_none() {
            errors.push(format!("{label} calls non-existent table or block '{call}'"));
        }
    }
}

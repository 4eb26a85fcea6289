/// Dungeon Gen: rolls start tables or blocks and prints the result.
///
/// Usage: dungeon_gen <start>[,<start>...] [--dir <path>] [--subdir <name>]
///        [--seed <n>] [--config <file.ron>] [--bestiary <file.csv>] [-v]

use std::path::PathBuf;
use std::process;

use clap::Parser;
use tracing_subscriber::filter::LevelFilter;

use dungeon_tables::core::pipeline::DungeonGenerator;
use dungeon_tables::core::sources::list_subdirs;

#[derive(Parser)]
#[command(name = "dungeon_gen", version, about = "Roll on dungeon tables and named blocks")]
struct Cli {
    /// Start tables or blocks, comma-separated
    #[arg(value_delimiter = ',')]
    starts: Vec<String>,

    /// Directory holding .tab tables and .txt block sources
    #[arg(short, long, default_value = "tables")]
    dir: PathBuf,

    /// Content set inside --dir whose files override the top level
    #[arg(short, long)]
    subdir: Option<String>,

    /// Fixed random seed for repeatable output
    #[arg(long)]
    seed: Option<u64>,

    /// Generator config (RON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Monster CSV; stats for monsters mentioned in the output are appended
    #[arg(short, long)]
    bestiary: Option<PathBuf>,

    /// Leave out unreadable source files instead of failing
    #[arg(long)]
    skip_unreadable: bool,

    /// Log every roll and soft failure to stderr
    #[arg(short, long)]
    verbose: bool,

    /// List available tables and blocks and exit
    #[arg(long)]
    list: bool,

    /// List content sets (sub-directories of --dir) and exit
    #[arg(long)]
    list_dirs: bool,
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if cli.list_dirs {
        match list_subdirs(&cli.dir) {
            Ok(dirs) => dirs.iter().for_each(|d| println!("{d}")),
            Err(e) => {
                eprintln!("ERROR: {e}");
                process::exit(1);
            }
        }
        return;
    }

    let mut builder = DungeonGenerator::builder()
        .source_dir(&cli.dir)
        .skip_unreadable(cli.skip_unreadable);
    if let Some(ref subdir) = cli.subdir {
        builder = builder.subdir(subdir);
    }
    if let Some(seed) = cli.seed {
        builder = builder.seed(seed);
    }
    if let Some(ref path) = cli.config {
        builder = builder.config_path(path);
    }
    if let Some(ref path) = cli.bestiary {
        builder = builder.bestiary(path);
    }

    let mut generator = match builder.build() {
        Ok(generator) => generator,
        Err(e) => {
            eprintln!("ERROR: {e}");
            process::exit(1);
        }
    };

    if cli.list {
        println!("Tables:");
        for name in generator.library().table_names() {
            println!("  {name}");
        }
        println!("Blocks:");
        for name in generator.library().block_names() {
            println!("  {name}");
        }
        return;
    }

    let starts: Vec<&str> = cli
        .starts
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect();
    if starts.is_empty() {
        eprintln!("Usage: dungeon_gen <start>[,<start>...] (see --list for names)");
        process::exit(2);
    }

    let mut outputs = Vec::with_capacity(starts.len());
    let mut failed = false;
    for start in starts {
        match generator.generate(start) {
            Ok(text) => {
                if !text.is_empty() {
                    println!("{text}");
                }
                outputs.push(text);
            }
            Err(e) => {
                println!("{e}");
                failed = true;
            }
        }
    }

    if let Some(stats) = generator.monster_stats(&outputs.join("\n")) {
        println!("\n{stats}");
    }

    if failed {
        process::exit(1);
    }
}

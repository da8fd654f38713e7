use std::path::{Path, PathBuf};

use clap::Parser;
use log::{error, info, warn};
use serde::Serialize;
use walkdir::WalkDir;

use fieldscript_core::{EntityRecord, LineRecord, SpawnPoint};

mod lzs;
mod names;

use names::{NameTables, TableFormatter};

#[derive(Debug, Parser)]
#[command(name = "fieldscript", version, about = "Field script decompiler")]
struct Args {
    /// Field file, or a directory to convert in batch.
    #[arg(long)]
    input: PathBuf,

    /// Output file (single input) or directory (batch). Defaults next to
    /// the input.
    #[arg(long)]
    output: Option<PathBuf>,

    /// JSON tables of friendly variable/entity/function/animation/map
    /// names.
    #[arg(long)]
    names: Option<PathBuf>,

    /// Also write the entity and line-trigger side lists as JSON.
    #[arg(long, default_value_t = false)]
    dump_entities: bool,

    /// Inputs are already-decompressed script sections rather than whole
    /// LZS field files.
    #[arg(long, default_value_t = false)]
    raw_section: bool,

    #[arg(long, default_value_t = false)]
    verbose: bool,
}

fn main() {
    let args = Args::parse();
    if let Err(err) = setup_logging(args.verbose) {
        eprintln!("Failed to initialise logging: {err}");
    }
    if let Err(err) = run(&args) {
        error!("{err}");
        std::process::exit(1);
    }
}

fn setup_logging(verbose: bool) -> Result<(), fern::InitError> {
    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{} {} {}] {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.target(),
                message
            ))
        })
        .level(level)
        .chain(std::io::stderr())
        .apply()?;
    Ok(())
}

fn run(args: &Args) -> Result<(), String> {
    let tables = load_tables(args.names.as_deref())?;

    if args.input.is_dir() {
        convert_directory(args, &tables)
    } else {
        let output = args
            .output
            .clone()
            .unwrap_or_else(|| args.input.with_extension("lua"));
        convert_file(args, &tables, &args.input, &output, 0)
    }
}

fn load_tables(path: Option<&Path>) -> Result<NameTables, String> {
    match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .map_err(|e| format!("cannot read {}: {e}", path.display()))?;
            serde_json::from_str(&text)
                .map_err(|e| format!("cannot parse {}: {e}", path.display()))
        }
        None => Ok(NameTables::default()),
    }
}

fn convert_directory(args: &Args, tables: &NameTables) -> Result<(), String> {
    let out_dir = args.output.clone().unwrap_or_else(|| args.input.clone());
    std::fs::create_dir_all(&out_dir)
        .map_err(|e| format!("cannot create {}: {e}", out_dir.display()))?;

    let mut converted = 0usize;
    let mut failed = 0usize;
    let mut map_id = 0u32;

    for entry in WalkDir::new(&args.input).into_iter().filter_map(|e| e.ok()) {
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if !is_field_file(path) {
            continue;
        }

        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("field");
        let output = out_dir.join(format!("{stem}.lua"));

        // A structural failure aborts only this file; the batch goes on.
        match convert_file(args, tables, path, &output, map_id) {
            Ok(()) => converted += 1,
            Err(err) => {
                warn!("skipping {}: {err}", path.display());
                failed += 1;
            }
        }
        map_id += 1;
    }

    info!("converted {converted} field file(s), {failed} failed");
    Ok(())
}

fn is_field_file(path: &Path) -> bool {
    matches!(
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref(),
        Some("dat" | "lzs")
    )
}

#[derive(Serialize)]
struct SideLists<'a> {
    entities: &'a [EntityRecord],
    lines: &'a [LineRecord],
    spawn_points: &'a [SpawnPoint],
}

fn convert_file(
    args: &Args,
    tables: &NameTables,
    input: &Path,
    output: &Path,
    map_id: u32,
) -> Result<(), String> {
    let raw = std::fs::read(input).map_err(|e| format!("cannot read {}: {e}", input.display()))?;

    // A fresh formatter (and decompiler pipeline) per file: no decoder
    // state is shared across fields.
    let mut formatter = TableFormatter::new(tables);
    let result = if args.raw_section {
        fieldscript_core::decompile(&raw, &mut formatter, map_id)
    } else {
        let bytes = lzs::decompress(&raw)?;
        fieldscript_core::decompile_field_file(&bytes, &mut formatter, map_id)
    }
    .map_err(|e| e.to_string())?;

    std::fs::write(output, &result.script)
        .map_err(|e| format!("cannot write {}: {e}", output.display()))?;
    info!(
        "{} -> {} ({} entities, {} line triggers)",
        input.display(),
        output.display(),
        result.entities.len(),
        result.lines.len()
    );

    if args.dump_entities {
        let lists = SideLists {
            entities: &result.entities,
            lines: &result.lines,
            spawn_points: formatter.spawn_points(),
        };
        let json = serde_json::to_string_pretty(&lists).map_err(|e| e.to_string())?;
        let dump_path = output.with_extension("entities.json");
        std::fs::write(&dump_path, json)
            .map_err(|e| format!("cannot write {}: {e}", dump_path.display()))?;
    }

    Ok(())
}

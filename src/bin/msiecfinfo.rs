//! `msiecfinfo` — thin read-only inspector over `msiecf-core`.
//!
//! The binary owns argument parsing, output formatting, and notification
//! streams (all explicitly out of core scope), and is otherwise a thin shell
//! around `msiecf_core::File`.

use clap::{Parser, Subcommand};
use msiecf_core::{File, ItemKind};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "msiecfinfo", version = "1.0.0", about = "MSIE URL cache file (index.dat) inspector")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show file header, directory table, and bitmap/hash-chain summary
    Info {
        input: PathBuf,
        /// Codepage for string decoding (numeric identifier, e.g. 1252)
        #[arg(long, default_value = "1252")]
        codepage: u32,
    },
    /// List live items (URL/REDR/LEAK records reachable via the allocation bitmap)
    List {
        input: PathBuf,
        #[arg(long, default_value = "1252")]
        codepage: u32,
        /// Emit newline-delimited JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// List recovered items (found in unallocated space, including partial fragments)
    Recover {
        input: PathBuf,
        #[arg(long, default_value = "1252")]
        codepage: u32,
        #[arg(long)]
        json: bool,
    },
}

fn open(input: &PathBuf, codepage: u32) -> Result<File<std::fs::File>, Box<dyn std::error::Error>> {
    let file = File::open(input)?;
    file.set_codepage(codepage)?;
    Ok(file)
}

fn kind_label(kind: ItemKind) -> &'static str {
    match kind {
        ItemKind::Url => "URL",
        ItemKind::Redirected => "REDR",
        ItemKind::Leak => "LEAK",
        ItemKind::Undefined => "?",
    }
}

fn print_descriptor_only_json(offset: u64, size: u32, kind: ItemKind, recovered: bool, partial: bool, tainted: bool, error: &str) {
    let json = serde_json::json!({
        "offset": offset,
        "size": size,
        "kind": kind_label(kind),
        "recovered": recovered,
        "partial": partial,
        "tainted": tainted,
        "decode_error": error,
    });
    println!("{json}");
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    match Cli::parse().command {
        Commands::Info { input, codepage } => {
            let file = open(&input, codepage)?;
            println!("── index.dat ─────────────────────────────────────────────");
            println!("  Path                 {}", input.display());
            println!("  File size            {} B", file.file_size());
            let (major, minor) = file.format_version();
            println!("  Format version       {major}.{minor}");
            println!("  Cache directories    {}", file.num_cache_directories());
            for i in 0..file.num_cache_directories() {
                let name = file.cache_directory_name(i).unwrap();
                let name_str = String::from_utf8_lossy(&name[..8]);
                let count = file.cache_directory_file_count(i).unwrap_or(0);
                println!("    [{i:2}] {name_str}  ({count} cached files)");
            }
            println!("  Unallocated ranges   {}", file.num_unallocated_blocks());
            println!("  Allocated-count check {}", if file.allocated_count_mismatch() { "MISMATCH" } else { "ok" });
            println!("  Hash chain           {}", if file.hash_chain_valid() {
                format!("ok ({} entries)", file.hash_chain_entry_count().unwrap_or(0))
            } else {
                "structurally invalid (non-fatal, scanner is authoritative)".to_string()
            });
            println!("  Live items           {}", file.num_items());
            let (url, redr, leak) = file.recovered_item_count_by_kind();
            println!("  Recovered items      {} (URL={url} REDR={redr} LEAK={leak})", file.num_recovered_items());
        }

        Commands::List { input, codepage, json } => {
            let mut file = open(&input, codepage)?;
            if !json {
                println!("{:<10} {:>10} {:<6}  Location / Filename", "Offset", "Size", "Kind");
            }
            for i in 0..file.num_items() {
                let descriptor = *file.item(i).unwrap();
                let materialized = file.item_values(i);
                if json {
                    match &materialized {
                        Ok(item) => println!("{}", serde_json::to_string(item)?),
                        Err(e) => print_descriptor_only_json(
                            descriptor.file_offset,
                            descriptor.record_size,
                            descriptor.kind,
                            descriptor.is_recovered(),
                            descriptor.is_partial(),
                            descriptor.is_tainted(),
                            &e.to_string(),
                        ),
                    }
                    continue;
                }
                let label = match &materialized {
                    Ok(item) => match &item.values {
                        msiecf_core::ItemValues::Url(v) => v
                            .location
                            .as_ref()
                            .map(|l| l.to_utf8_string())
                            .unwrap_or_default(),
                        msiecf_core::ItemValues::Redirected(v) => v.location.to_utf8_string(),
                        msiecf_core::ItemValues::Leak(v) => {
                            v.filename.as_ref().map(|f| f.to_utf8_string()).unwrap_or_default()
                        }
                    },
                    Err(e) => format!("<decode failed: {e}>"),
                };
                println!(
                    "0x{:<8x} {:>10} {:<6}  {}",
                    descriptor.file_offset,
                    descriptor.record_size,
                    kind_label(descriptor.kind),
                    label
                );
            }
        }

        Commands::Recover { input, codepage, json } => {
            let mut file = open(&input, codepage)?;
            if !json {
                println!(
                    "{:<10} {:>10} {:<6} {:<9}  Location / Filename",
                    "Offset", "Size", "Kind", "Flags"
                );
            }
            for i in 0..file.num_recovered_items() {
                let descriptor = *file.recovered_item(i).unwrap();
                let materialized = file.recovered_item_values(i);
                if json {
                    match &materialized {
                        Ok(item) => println!("{}", serde_json::to_string(item)?),
                        Err(e) => print_descriptor_only_json(
                            descriptor.file_offset,
                            descriptor.record_size,
                            descriptor.kind,
                            descriptor.is_recovered(),
                            descriptor.is_partial(),
                            descriptor.is_tainted(),
                            &e.to_string(),
                        ),
                    }
                    continue;
                }
                let flags = format!(
                    "{}{}",
                    if descriptor.is_partial() { "P" } else { "-" },
                    if descriptor.is_tainted() { "T" } else { "-" },
                );
                let label = match &materialized {
                    Ok(item) => match &item.values {
                        msiecf_core::ItemValues::Url(v) => v
                            .location
                            .as_ref()
                            .map(|l| l.to_utf8_string())
                            .unwrap_or_default(),
                        msiecf_core::ItemValues::Redirected(v) => v.location.to_utf8_string(),
                        msiecf_core::ItemValues::Leak(v) => {
                            v.filename.as_ref().map(|f| f.to_utf8_string()).unwrap_or_default()
                        }
                    },
                    Err(e) => format!("<decode failed: {e}>"),
                };
                println!(
                    "0x{:<8x} {:>10} {:<6} {:<9}  {}",
                    descriptor.file_offset,
                    descriptor.record_size,
                    kind_label(descriptor.kind),
                    flags,
                    label
                );
            }
        }
    }

    Ok(())
}

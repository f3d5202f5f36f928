//! patchnotes: classify patch-note posts into hero, item and general changes.

use std::path::PathBuf;

use tracing::info;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::Context;

fn resolve_data_dir() -> PathBuf {
    std::env::var("PATCHNOTES_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let exe_dir = std::env::current_exe()
                .ok()
                .and_then(|p| p.parent().map(|p| p.to_path_buf()));
            if let Some(dir) = exe_dir {
                let parent_data = dir.join("../data");
                if parent_data.exists() {
                    return parent_data;
                }
            }
            PathBuf::from("data")
        })
}

fn print_help() {
    println!("patchnotes — patch note classifier");
    println!();
    println!("Usage: patchnotes <command> [args]");
    println!();
    println!("Commands:");
    println!("  process [id ...|--all]     Classify stored patches (default: all)");
    println!("  show <id>                  Print the stored classification of a patch");
    println!("  summary <id>               Print change counts for a processed patch");
    println!("  classify <file>            Classify a file without storing the result");
    println!("  add-patch <file> [--link URL] [--title TEXT] [--timestamp TS]");
    println!("                             Store a raw patch body");
    println!("  import-vocab <file>        Upsert heroes and items from a JSON snapshot");
    println!("  export-vocab               Print the stored vocabulary as JSON");
    println!("  stats                      Show database statistics");
    println!("  help                       Show this help message");
    println!();
    println!("Environment:");
    println!("  PATCHNOTES_DATA_DIR        Data directory (default: data/)");
    println!("  PATCHNOTES_RULES           Rules file (default: <data-dir>/rules.json)");
    println!("  RUST_LOG                   Log filter (default: info)");
}

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    let Some(command) = args.get(1).map(String::as_str) else {
        print_help();
        std::process::exit(1);
    };
    let rest = &args[2..];

    if matches!(command, "--help" | "-h" | "help") {
        print_help();
        return Ok(());
    }

    let data_dir = resolve_data_dir();
    info!("Data directory: {}", data_dir.display());
    let ctx = Context::open(&data_dir)?;

    match command {
        "process" => {
            let report = commands::process(&ctx, rest)?;
            commands::print_report(&report);
            std::process::exit(if report.is_clean() { 0 } else { 1 });
        }
        "show" => commands::show(&ctx, commands::required_arg(rest, "show <id>")?),
        "summary" => commands::summary(&ctx, commands::required_arg(rest, "summary <id>")?),
        "classify" => commands::classify_file(&ctx, commands::required_arg(rest, "classify <file>")?),
        "add-patch" => commands::add_patch(&ctx, rest),
        "import-vocab" => {
            commands::import_vocab(&ctx, commands::required_arg(rest, "import-vocab <file>")?)
        }
        "export-vocab" => commands::export_vocab(&ctx),
        "stats" => commands::stats(&ctx),
        _ => {
            eprintln!("Unknown command: {}. Use 'patchnotes help' for usage.", command);
            std::process::exit(1);
        }
    }
}

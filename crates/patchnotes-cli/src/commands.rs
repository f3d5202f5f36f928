//! Subcommand implementations.

use std::path::Path;

use anyhow::{anyhow, bail, Context as _};
use patchnotes_classify::{classify, ClassificationResult, CompiledRules, PatchSummary, RuleSet};
use patchnotes_core::PatchNotesConfig;
use patchnotes_pipeline::{load_vocabulary, BatchReport, PatchPipeline};
use patchnotes_store::{AddPatchOptions, SqliteStore, VocabularySnapshot};
use tracing::info;

/// Everything a command needs: configuration, store and compiled rules.
pub struct Context {
    pub config: PatchNotesConfig,
    pub store: SqliteStore,
    pub rules: CompiledRules,
}

impl Context {
    pub fn open(data_dir: &Path) -> anyhow::Result<Self> {
        let config = PatchNotesConfig::from_env(data_dir)?;
        let store = SqliteStore::open(&config.data_paths.root)
            .map_err(|e| anyhow!("Failed to open store: {}", e))?;
        let rules = RuleSet::load_or_default(&config.rules_path)?.compile()?;
        Ok(Self {
            config,
            store,
            rules,
        })
    }
}

pub fn required_arg<'a>(args: &'a [String], usage: &str) -> anyhow::Result<&'a str> {
    args.first()
        .map(String::as_str)
        .ok_or_else(|| anyhow!("Usage: patchnotes {}", usage))
}

fn parse_id(raw: &str) -> anyhow::Result<i64> {
    raw.parse::<i64>()
        .with_context(|| format!("invalid patch id '{}'", raw))
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// `process [id ...|--all]`. No ids means every stored patch.
pub fn process(ctx: &Context, args: &[String]) -> anyhow::Result<BatchReport> {
    let vocabulary = load_vocabulary(&ctx.store)?;
    let pipeline = PatchPipeline::new(&ctx.store, &vocabulary, &ctx.rules);

    if args.is_empty() || args.iter().any(|a| a == "--all") {
        return Ok(pipeline.run_all()?);
    }
    let ids = args
        .iter()
        .map(|a| parse_id(a))
        .collect::<anyhow::Result<Vec<i64>>>()?;
    Ok(pipeline.run(&ids))
}

pub fn print_report(report: &BatchReport) {
    println!("=== Classification Report ===");
    println!();
    println!("Updated:            {}", report.updated);
    println!("Unchanged:          {}", report.unchanged);
    println!("Failed:             {}", report.failures.len());
    println!("Duration:           {}ms", report.duration_ms);

    if !report.failures.is_empty() {
        println!();
        println!("Errors:");
        for f in &report.failures {
            println!("  - patch {}: {}", f.id, f.error);
        }
    }
}

fn stored_result(ctx: &Context, id: i64) -> anyhow::Result<ClassificationResult> {
    let json = ctx
        .store
        .get_classification(id)?
        .ok_or_else(|| anyhow!("patch {} has no stored classification; run 'patchnotes process {}'", id, id))?;
    ClassificationResult::from_json(&json)
        .with_context(|| format!("stored classification of patch {} is not valid JSON", id))
}

pub fn show(ctx: &Context, raw_id: &str) -> anyhow::Result<()> {
    let result = stored_result(ctx, parse_id(raw_id)?)?;
    print_json(&result)
}

pub fn summary(ctx: &Context, raw_id: &str) -> anyhow::Result<()> {
    let result = stored_result(ctx, parse_id(raw_id)?)?;
    print_json(&PatchSummary::from_result(&result))
}

/// Classify a file's content with the stored vocabulary; nothing is written.
pub fn classify_file(ctx: &Context, path: &str) -> anyhow::Result<()> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path))?;
    let vocabulary = load_vocabulary(&ctx.store)?;
    let result = classify(&content, &vocabulary, &ctx.rules);
    print_json(&result)
}

/// Parsed `add-patch` arguments.
#[derive(Debug, Default, PartialEq)]
struct AddPatchArgs {
    file: String,
    link: Option<String>,
    title: Option<String>,
    timestamp: Option<String>,
}

fn parse_add_patch(args: &[String]) -> anyhow::Result<AddPatchArgs> {
    let mut parsed = AddPatchArgs::default();
    let mut file = None;
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        let slot = match arg.as_str() {
            "--link" => &mut parsed.link,
            "--title" => &mut parsed.title,
            "--timestamp" => &mut parsed.timestamp,
            flag if flag.starts_with("--") => bail!("unknown option {}", flag),
            _ => {
                if file.replace(arg.clone()).is_some() {
                    bail!("add-patch takes a single file");
                }
                continue;
            }
        };
        let value = iter
            .next()
            .ok_or_else(|| anyhow!("{} needs a value", arg))?;
        *slot = Some(value.clone());
    }
    parsed.file = file.ok_or_else(|| anyhow!("Usage: patchnotes add-patch <file> [--link URL] [--title TEXT] [--timestamp TS]"))?;
    Ok(parsed)
}

pub fn add_patch(ctx: &Context, args: &[String]) -> anyhow::Result<()> {
    let parsed = parse_add_patch(args)?;
    let content = std::fs::read_to_string(&parsed.file)
        .with_context(|| format!("failed to read {}", parsed.file))?;
    let id = ctx.store.add_patch(
        &content,
        AddPatchOptions {
            link: parsed.link,
            title: parsed.title,
            timestamp: parsed.timestamp,
        },
    )?;
    info!("Stored patch {} from {}", id, parsed.file);
    println!("{}", id);
    Ok(())
}

pub fn import_vocab(ctx: &Context, path: &str) -> anyhow::Result<()> {
    let raw = std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path))?;
    let snapshot: VocabularySnapshot =
        serde_json::from_str(&raw).with_context(|| format!("invalid vocabulary snapshot {}", path))?;
    let (heroes, items) = ctx.store.import_vocabulary(&snapshot)?;
    println!("Imported {} heroes, {} items", heroes, items);
    Ok(())
}

pub fn export_vocab(ctx: &Context) -> anyhow::Result<()> {
    print_json(&ctx.store.vocabulary_snapshot()?)
}

pub fn stats(ctx: &Context) -> anyhow::Result<()> {
    let stats = ctx.store.get_stats()?;
    println!("Database:           {}", stats.db_path);
    println!("Size:               {:.2} MB", stats.db_size_mb);
    println!("Patches:            {}", stats.total_patches);
    println!("Processed:          {}", stats.processed_patches);
    println!("Heroes:             {}", stats.heroes);
    println!("Items:              {}", stats.items);
    println!("Rules:              {}", ctx.config.rules_path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    fn test_context() -> (Context, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let ctx = Context::open(dir.path()).unwrap();
        (ctx, dir)
    }

    #[test]
    fn test_parse_add_patch() {
        let parsed = parse_add_patch(&args(&["notes.html", "--link", "https://forums.example.com/t/9", "--title", "Update"])).unwrap();
        assert_eq!(parsed.file, "notes.html");
        assert_eq!(parsed.link.as_deref(), Some("https://forums.example.com/t/9"));
        assert_eq!(parsed.title.as_deref(), Some("Update"));
        assert!(parsed.timestamp.is_none());
    }

    #[test]
    fn test_parse_add_patch_errors() {
        assert!(parse_add_patch(&args(&[])).is_err());
        assert!(parse_add_patch(&args(&["a.html", "--link"])).is_err());
        assert!(parse_add_patch(&args(&["a.html", "--bogus", "x"])).is_err());
        assert!(parse_add_patch(&args(&["a.html", "b.html"])).is_err());
    }

    #[test]
    fn test_process_selected_ids() {
        let (ctx, _dir) = test_context();
        let id = ctx
            .store
            .add_patch("- Fixed a crash on load", AddPatchOptions::default())
            .unwrap();

        let report = process(&ctx, &args(&[&id.to_string()])).unwrap();
        assert_eq!(report.updated, 1);
        assert!(stored_result(&ctx, id).unwrap().fixes.len() == 1);

        assert!(process(&ctx, &args(&["abc"])).is_err());
    }

    #[test]
    fn test_stored_result_missing() {
        let (ctx, _dir) = test_context();
        assert!(stored_result(&ctx, 1).is_err());
    }
}

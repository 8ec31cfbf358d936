use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context as _;
use bundle_core::{
    add_tags, create, current_user, remove_tags, rename, verify_bundle, Bundle, CreateOptions,
    SymlinkPolicy,
};
use bundle_pool::{Config, ImportMode};
use bundle_types::Tags;
use chrono::{DateTime, Utc};
use colored::Colorize;
use serde::Serialize;

use crate::cli::*;

/// Settings shared by every command.
pub struct Context {
    pub format: OutputFormat,
    pub config: Option<PathBuf>,
}

impl Context {
    fn json(&self) -> bool {
        self.format == OutputFormat::Json
    }

    fn load_config(&self) -> anyhow::Result<Config> {
        match Config::locate(self.config.as_deref()) {
            Some(path) => Ok(Config::load(&path)?),
            None => Ok(Config::default()),
        }
    }
}

pub fn run_command(ctx: &Context, command: Command) -> anyhow::Result<ExitCode> {
    match command {
        Command::Create(args) => cmd_create(ctx, args),
        Command::Verify(args) => cmd_verify(ctx, &args.path),
        Command::Info(args) => cmd_info(ctx, &args.path),
        Command::Files(args) => cmd_files(ctx, &args.path),
        Command::Rename(args) => cmd_rename(ctx, args),
        Command::Tag(args) => cmd_tag(ctx, args.action),
        Command::Import(args) => cmd_import(ctx, args),
        Command::Pool(args) => match args.action {
            PoolAction::List { pool } => cmd_pool_list(ctx, &pool),
        },
        Command::Pools => cmd_pools(ctx),
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Format a byte count with binary units: `512 B`, `1.5 KB`, `3.0 MB`.
pub fn human_size(bytes: u64) -> String {
    const UNIT: u64 = 1024;
    const UNITS: [&str; 5] = ["KB", "MB", "GB", "TB", "PB"];
    if bytes < UNIT {
        return format!("{bytes} B");
    }
    let mut div = UNIT;
    let mut exp = 0;
    let mut n = bytes / UNIT;
    while n >= UNIT && exp < UNITS.len() - 1 {
        div *= UNIT;
        exp += 1;
        n /= UNIT;
    }
    format!("{:.1} {}", bytes as f64 / div as f64, UNITS[exp])
}

#[derive(Serialize)]
struct BundleSummary<'a> {
    path: &'a Path,
    title: &'a str,
    checksum: String,
    author: &'a str,
    created_at: DateTime<Utc>,
    files: usize,
    size_bytes: u64,
    verified: bool,
    last_checked: DateTime<Utc>,
    tags: Vec<String>,
    replicas: &'a [String],
}

impl<'a> BundleSummary<'a> {
    fn new(bundle: &'a Bundle) -> Self {
        Self {
            path: &bundle.path,
            title: &bundle.metadata.title,
            checksum: bundle.identity().to_hex(),
            author: &bundle.metadata.author,
            created_at: bundle.metadata.created_at,
            files: bundle.manifest.len(),
            size_bytes: bundle.state.size_bytes,
            verified: bundle.state.verified,
            last_checked: bundle.state.last_checked,
            tags: bundle.tags.list(),
            replicas: &bundle.state.replicas,
        }
    }
}

fn cmd_create(ctx: &Context, args: CreateArgs) -> anyhow::Result<ExitCode> {
    let options = CreateOptions {
        title: args.title,
        author: current_user(),
        tags: args.tags,
        symlinks: if args.follow_symlinks {
            SymlinkPolicy::Follow
        } else {
            SymlinkPolicy::Skip
        },
    };
    let bundle = create(&args.path, &options)?;
    if ctx.json() {
        print_json(&BundleSummary::new(&bundle))?;
    } else {
        println!(
            "{} Created bundle {} in {}",
            "✓".green().bold(),
            bundle.title().bold(),
            bundle.path.display()
        );
        println!("  Checksum: {}", bundle.identity().to_hex().cyan());
        println!(
            "  Files: {} ({})",
            bundle.manifest.len(),
            human_size(bundle.state.size_bytes)
        );
    }
    Ok(ExitCode::SUCCESS)
}

#[derive(Serialize)]
struct VerifyOutput<'a> {
    path: &'a Path,
    valid: bool,
    files_checked: usize,
    corrupted: Vec<&'a str>,
    checked_at: DateTime<Utc>,
}

fn cmd_verify(ctx: &Context, path: &Path) -> anyhow::Result<ExitCode> {
    let report = verify_bundle(path)?;
    if ctx.json() {
        print_json(&VerifyOutput {
            path,
            valid: report.is_valid(),
            files_checked: report.files_checked,
            corrupted: report.corrupted.iter().map(String::as_str).collect(),
            checked_at: report.checked_at,
        })?;
    } else if report.is_valid() {
        println!(
            "{} Bundle verified: {} files intact",
            "✓".green().bold(),
            report.files_checked
        );
    } else {
        println!(
            "{} {} of {} files corrupted or missing:",
            "✗".red().bold(),
            report.corrupted.len(),
            report.files_checked
        );
        for file in &report.corrupted {
            println!("  {} {}", "corrupted:".red(), file);
        }
    }
    Ok(if report.is_valid() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    })
}

fn cmd_info(ctx: &Context, path: &Path) -> anyhow::Result<ExitCode> {
    let bundle = Bundle::load(path)?;
    let summary = BundleSummary::new(&bundle);
    if ctx.json() {
        print_json(&summary)?;
        return Ok(ExitCode::SUCCESS);
    }
    println!("{}", summary.title.bold());
    println!("  Path:     {}", summary.path.display());
    println!("  Checksum: {}", summary.checksum.cyan());
    println!("  Author:   {}", summary.author);
    let created = summary.created_at.format("%Y-%m-%d %H:%M:%S");
    println!("  Created:  {created}");
    println!("  Files:    {}", summary.files);
    println!("  Size:     {}", human_size(summary.size_bytes));
    let status = if summary.verified {
        "verified".green()
    } else {
        "not verified".red()
    };
    println!(
        "  Status:   {} ({})",
        status,
        summary.last_checked.format("%Y-%m-%d %H:%M:%S")
    );
    if !summary.tags.is_empty() {
        println!("  Tags:     {}", summary.tags.join(", ").yellow());
    }
    for replica in summary.replicas {
        println!("  Replica:  {replica}");
    }
    Ok(ExitCode::SUCCESS)
}

#[derive(Serialize)]
struct FileRow<'a> {
    path: &'a str,
    checksum: String,
    size: Option<u64>,
}

fn cmd_files(ctx: &Context, path: &Path) -> anyhow::Result<ExitCode> {
    let bundle = Bundle::load(path)?;
    let mut rows: Vec<FileRow> = bundle
        .manifest
        .iter()
        .map(|record| FileRow {
            path: &record.path,
            checksum: record.hash.to_hex(),
            size: fs::metadata(path.join(&record.path)).ok().map(|m| m.len()),
        })
        .collect();
    rows.sort_by(|a, b| a.path.cmp(b.path));

    if ctx.json() {
        print_json(&rows)?;
        return Ok(ExitCode::SUCCESS);
    }
    let total: u64 = rows.iter().filter_map(|r| r.size).sum();
    for row in &rows {
        let size = row.size.map(human_size).unwrap_or_else(|| "-".to_string());
        println!("{}  {:>10}  {}", row.checksum.dimmed(), size, row.path);
    }
    println!("{} files, {}", rows.len(), human_size(total));
    Ok(ExitCode::SUCCESS)
}

fn cmd_rename(ctx: &Context, args: RenameArgs) -> anyhow::Result<ExitCode> {
    let old = rename(&args.path, &args.title)?;
    if ctx.json() {
        print_json(&serde_json::json!({ "old_title": old, "title": args.title }))?;
    } else {
        println!(
            "{} Renamed {} to {}",
            "✓".green().bold(),
            old.yellow(),
            args.title.yellow().bold()
        );
    }
    Ok(ExitCode::SUCCESS)
}

fn print_tags(ctx: &Context, tags: &Tags) -> anyhow::Result<()> {
    if ctx.json() {
        return print_json(&tags.list());
    }
    if tags.is_empty() {
        println!("No tags.");
    }
    for tag in tags.list() {
        println!("{}", tag.yellow());
    }
    Ok(())
}

fn cmd_tag(ctx: &Context, action: TagAction) -> anyhow::Result<ExitCode> {
    let tags = match action {
        TagAction::Add { path, tags } => add_tags(&path, &tags)?,
        TagAction::Remove { path, tags } => remove_tags(&path, &tags)?,
        TagAction::List { path } => Bundle::load(&path)?.tags,
    };
    print_tags(ctx, &tags)?;
    Ok(ExitCode::SUCCESS)
}

fn cmd_import(ctx: &Context, args: ImportArgs) -> anyhow::Result<ExitCode> {
    let pool = ctx.load_config()?.pool(&args.pool)?;
    let mode = if args.move_source {
        ImportMode::Move
    } else {
        ImportMode::Copy
    };
    let entry = pool
        .import(&args.path, mode)
        .with_context(|| format!("importing {} into {}", args.path.display(), pool.name()))?;
    if ctx.json() {
        print_json(&entry)?;
    } else {
        let verb = if args.move_source {
            "Moved"
        } else {
            "Copied"
        };
        println!(
            "{} {} bundle into {} ({})",
            "✓".green().bold(),
            verb,
            pool.title().bold(),
            pool.name()
        );
        println!("  Checksum: {}", entry.identity.to_hex().cyan());
        println!("  Path:     {}", entry.path.display());
    }
    Ok(ExitCode::SUCCESS)
}

fn cmd_pool_list(ctx: &Context, name: &str) -> anyhow::Result<ExitCode> {
    let pool = ctx.load_config()?.pool(name)?;
    let listings = pool.list()?;
    if ctx.json() {
        print_json(&listings)?;
        return Ok(ExitCode::SUCCESS);
    }
    println!("{} ({})", pool.title().bold(), pool.root().display());
    if listings.is_empty() {
        println!("  No bundles.");
    }
    for item in &listings {
        println!(
            "  {}  {}  {}  {}",
            item.identity.short_hex().cyan(),
            item.created_at.format("%Y-%m-%d"),
            item.title.bold(),
            item.author.dimmed()
        );
    }
    Ok(ExitCode::SUCCESS)
}

fn cmd_pools(ctx: &Context) -> anyhow::Result<ExitCode> {
    let pools = ctx.load_config()?.all_pools()?;
    if ctx.json() {
        print_json(&pools)?;
        return Ok(ExitCode::SUCCESS);
    }
    if pools.is_empty() {
        println!("No pools configured.");
    }
    for pool in &pools {
        println!(
            "{}  {}  {}",
            pool.name().yellow().bold(),
            pool.title(),
            pool.root().display().to_string().dimmed()
        );
    }
    Ok(ExitCode::SUCCESS)
}

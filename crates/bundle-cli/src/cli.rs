use std::path::PathBuf;

use bundle_pool::DEFAULT_POOL;
use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "bundle",
    about = "Content-addressed file bundles: create, verify, import into pools",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Show debug logging
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Configuration file (defaults to $BUNDLE_CONFIG, then the user config dir)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Turn a directory into a bundle (or refresh its manifest)
    Create(CreateArgs),
    /// Check files against the bundle manifest
    Verify(PathArgs),
    /// Show bundle metadata
    Info(PathArgs),
    /// List the files recorded in the manifest
    Files(PathArgs),
    /// Change a bundle's title
    Rename(RenameArgs),
    /// Manage bundle tags
    Tag(TagArgs),
    /// Copy or move a bundle into a pool
    Import(ImportArgs),
    /// Inspect a pool
    Pool(PoolArgs),
    /// List configured pools
    Pools,
}

#[derive(Args)]
pub struct PathArgs {
    pub path: PathBuf,
}

#[derive(Args)]
pub struct CreateArgs {
    pub path: PathBuf,
    #[arg(short, long)]
    pub title: Option<String>,
    #[arg(short = 'T', long = "tag")]
    pub tags: Vec<String>,
    /// Hash symlinked files through their targets
    #[arg(long)]
    pub follow_symlinks: bool,
}

#[derive(Args)]
pub struct RenameArgs {
    pub path: PathBuf,
    pub title: String,
}

#[derive(Args)]
pub struct TagArgs {
    #[command(subcommand)]
    pub action: TagAction,
}

#[derive(Subcommand)]
pub enum TagAction {
    Add {
        path: PathBuf,
        #[arg(required = true)]
        tags: Vec<String>,
    },
    Remove {
        path: PathBuf,
        #[arg(required = true)]
        tags: Vec<String>,
    },
    List {
        path: PathBuf,
    },
}

#[derive(Args)]
pub struct ImportArgs {
    pub path: PathBuf,
    #[arg(short, long, default_value = DEFAULT_POOL)]
    pub pool: String,
    /// Remove the source after a successful import
    #[arg(short, long = "move")]
    pub move_source: bool,
}

#[derive(Args)]
pub struct PoolArgs {
    #[command(subcommand)]
    pub action: PoolAction,
}

#[derive(Subcommand)]
pub enum PoolAction {
    /// List bundles stored in a pool
    List {
        #[arg(short, long, default_value = DEFAULT_POOL)]
        pool: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_create() {
        let argv = [
            "bundle", "create", "/data", "-t", "Photos", "-T", "a", "--tag", "b",
        ];
        let cli = Cli::try_parse_from(argv).unwrap();
        if let Command::Create(args) = cli.command {
            assert_eq!(args.path, PathBuf::from("/data"));
            assert_eq!(args.title, Some("Photos".into()));
            assert_eq!(args.tags, vec!["a", "b"]);
            assert!(!args.follow_symlinks);
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_verify() {
        let cli = Cli::try_parse_from(["bundle", "verify", "."]).unwrap();
        assert!(matches!(cli.command, Command::Verify(_)));
    }

    #[test]
    fn verify_requires_path() {
        assert!(Cli::try_parse_from(["bundle", "verify"]).is_err());
    }

    #[test]
    fn parse_rename() {
        let cli = Cli::try_parse_from(["bundle", "rename", "x", "New title"]).unwrap();
        if let Command::Rename(args) = cli.command {
            assert_eq!(args.title, "New title");
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_tag_add() {
        let cli = Cli::try_parse_from(["bundle", "tag", "add", "x", "one", "two"]).unwrap();
        if let Command::Tag(TagArgs {
            action: TagAction::Add { path, tags },
        }) = cli.command
        {
            assert_eq!(path, PathBuf::from("x"));
            assert_eq!(tags, vec!["one", "two"]);
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn tag_add_requires_tags() {
        assert!(Cli::try_parse_from(["bundle", "tag", "add", "x"]).is_err());
    }

    #[test]
    fn parse_import_defaults() {
        let cli = Cli::try_parse_from(["bundle", "import", "x"]).unwrap();
        if let Command::Import(args) = cli.command {
            assert_eq!(args.pool, "default");
            assert!(!args.move_source);
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_import_move() {
        let argv = ["bundle", "import", "x", "--pool", "backup", "--move"];
        let cli = Cli::try_parse_from(argv).unwrap();
        if let Command::Import(args) = cli.command {
            assert_eq!(args.pool, "backup");
            assert!(args.move_source);
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_pool_list() {
        let cli = Cli::try_parse_from(["bundle", "pool", "list", "-p", "backup"]).unwrap();
        if let Command::Pool(PoolArgs {
            action: PoolAction::List { pool },
        }) = cli.command
        {
            assert_eq!(pool, "backup");
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_globals() {
        let argv = [
            "bundle",
            "pools",
            "--verbose",
            "--format",
            "json",
            "--config",
            "/c.toml",
        ];
        let cli = Cli::try_parse_from(argv).unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.format, OutputFormat::Json);
        assert_eq!(cli.config, Some(PathBuf::from("/c.toml")));
    }

    #[test]
    fn verbose_and_quiet_conflict() {
        assert!(Cli::try_parse_from(["bundle", "-v", "-q", "pools"]).is_err());
    }
}

//! Developer tasks for ms: `cargo xtask check` before pushing, `cargo xtask install`
//! to put the binary on PATH.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use xshell::{cmd, Shell};

#[derive(Parser)]
#[command(name = "xtask", about = "Developer tasks for ms")]
struct Cli {
    #[command(subcommand)]
    task: Task,
}

#[derive(Subcommand)]
enum Task {
    /// Formatting, clippy and the test suite
    Check {
        /// Rewrite files instead of failing on formatting differences
        #[arg(long)]
        fix: bool,
    },
    /// cargo install the ms binary from this checkout
    Install,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let sh = Shell::new()?;
    sh.change_dir(workspace_root()?);

    match cli.task {
        Task::Check { fix } => check(&sh, fix),
        Task::Install => {
            cmd!(sh, "cargo install --locked --path .").run()?;
            Ok(())
        }
    }
}

fn workspace_root() -> Result<PathBuf> {
    let manifest = std::env::var("CARGO_MANIFEST_DIR").context("run through `cargo xtask`")?;
    PathBuf::from(manifest)
        .parent()
        .map(PathBuf::from)
        .context("xtask has no parent directory")
}

fn check(sh: &Shell, fix: bool) -> Result<()> {
    if fix {
        cmd!(sh, "cargo fmt --all").run()?;
    } else {
        cmd!(sh, "cargo fmt --all -- --check").run()?;
    }
    cmd!(sh, "cargo clippy --workspace --all-targets -- -D warnings").run()?;
    cmd!(sh, "cargo test -p ms").run()?;
    Ok(())
}

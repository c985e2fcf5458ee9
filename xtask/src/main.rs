//! Development tasks for abbr-wrap.
//!
//! ```text
//! cargo xtask man [--out DIR]
//! cargo xtask completions [--out DIR] [--shell SHELL]...
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use clap_complete::Shell;

#[derive(Parser)]
#[command(name = "xtask", about = "Development tasks for abbr-wrap")]
struct Xtask {
    #[command(subcommand)]
    task: Task,
}

#[derive(Subcommand)]
enum Task {
    /// Generate man pages for the CLI and each subcommand
    Man {
        /// Output directory
        #[arg(long, default_value = "target/man")]
        out: PathBuf,
    },
    /// Generate shell completion scripts
    Completions {
        /// Output directory
        #[arg(long, default_value = "target/completions")]
        out: PathBuf,
        /// Shells to generate for (default: all)
        #[arg(long, value_enum)]
        shell: Vec<Shell>,
    },
}

fn main() -> io::Result<()> {
    match Xtask::parse().task {
        Task::Man { out } => generate_man(&out),
        Task::Completions { out, shell } => {
            let shells = if shell.is_empty() {
                vec![
                    Shell::Bash,
                    Shell::Zsh,
                    Shell::Fish,
                    Shell::PowerShell,
                    Shell::Elvish,
                ]
            } else {
                shell
            };
            generate_completions(&out, &shells)
        }
    }
}

fn generate_man(out: &Path) -> io::Result<()> {
    fs::create_dir_all(out)?;
    let cmd = abbr_wrap::command();
    let name = cmd.get_name().to_string();

    write_man_page(out, &name, cmd.clone())?;
    for sub in cmd.get_subcommands() {
        let page = format!("{name}-{}", sub.get_name());
        write_man_page(out, &page, sub.clone().name(page.clone()))?;
    }
    Ok(())
}

fn write_man_page(out: &Path, page: &str, cmd: clap::Command) -> io::Result<()> {
    let mut buffer = Vec::new();
    clap_mangen::Man::new(cmd).render(&mut buffer)?;
    let path = out.join(format!("{page}.1"));
    fs::write(&path, buffer)?;
    println!("wrote {}", path.display());
    Ok(())
}

fn generate_completions(out: &Path, shells: &[Shell]) -> io::Result<()> {
    fs::create_dir_all(out)?;
    let mut cmd = abbr_wrap::command();
    let name = cmd.get_name().to_string();

    for shell in shells {
        let path = clap_complete::generate_to(*shell, &mut cmd, &name, out)?;
        println!("wrote {}", path.display());
    }
    Ok(())
}

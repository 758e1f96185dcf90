use std::env;
use std::path::PathBuf;

use anyhow::Context;
use chrono::Local;
use colored::Colorize;
use tracing::debug;

use sprig_repo::{Commit, MergeOutcome, RemoveOutcome, Repository, StageChange, StatusReport};

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    debug!(command = ?cli.command, "running");
    match cli.command {
        Command::Init(args) => cmd_init(args),
        Command::Add(args) => cmd_add(args),
        Command::Rm(args) => cmd_rm(args),
        Command::Commit(args) => cmd_commit(args),
        Command::Log => cmd_log(),
        Command::GlobalLog => cmd_global_log(),
        Command::Find(args) => cmd_find(args),
        Command::Status => cmd_status(),
        Command::Checkout(args) => cmd_checkout(args),
        Command::Branch(args) => {
            open()?.branch(&args.name)?;
            Ok(())
        }
        Command::RmBranch(args) => {
            open()?.remove_branch(&args.name)?;
            Ok(())
        }
        Command::Reset(args) => {
            open()?.reset(&args.commit)?;
            Ok(())
        }
        Command::Merge(args) => cmd_merge(args),
        Command::AddRemote(args) => {
            open()?.add_remote(&args.name, args.path)?;
            Ok(())
        }
        Command::RmRemote(args) => {
            open()?.remove_remote(&args.name)?;
            Ok(())
        }
        Command::Fetch(args) => cmd_fetch(args),
        Command::Push(args) => cmd_push(args),
        Command::Pull(args) => cmd_pull(args),
    }
}

fn current_dir() -> anyhow::Result<PathBuf> {
    env::current_dir().context("cannot read the current directory")
}

fn open() -> anyhow::Result<Repository> {
    let cwd = current_dir()?;
    Ok(Repository::discover(cwd)?)
}

fn cmd_init(args: InitArgs) -> anyhow::Result<()> {
    let root = match args.path {
        Some(path) => path,
        None => current_dir()?,
    };
    Repository::init(&root)?;
    println!(
        "{} Initialized empty sprig repository in {}",
        "✓".green().bold(),
        root.display().to_string().bold()
    );
    Ok(())
}

fn cmd_add(args: AddArgs) -> anyhow::Result<()> {
    let repo = open()?;
    for file in &args.files {
        match repo.add(file)? {
            StageChange::Staged(blob) => {
                debug!(file = %file, revision = blob.revision, "staged");
            }
            StageChange::Unchanged => debug!(file = %file, "matches current commit"),
        }
    }
    Ok(())
}

fn cmd_rm(args: RmArgs) -> anyhow::Result<()> {
    match open()?.remove(&args.file)? {
        RemoveOutcome::Unstaged => debug!(file = %args.file, "unstaged"),
        RemoveOutcome::MarkedRemoved => debug!(file = %args.file, "removed"),
    }
    Ok(())
}

fn cmd_commit(args: CommitArgs) -> anyhow::Result<()> {
    let repo = open()?;
    let commit = repo.commit(&args.message)?;
    println!(
        "[{} {}] {}",
        repo.current_branch()?.green(),
        commit.id().short_hex().yellow(),
        commit.message()
    );
    Ok(())
}

/// One `log` entry, followed by a blank line.
pub fn log_entry(commit: &Commit) -> String {
    let mut lines = vec![
        "===".dimmed().to_string(),
        format!("{} {}", "commit".yellow(), commit.id().to_hex().yellow()),
    ];
    if let (Some(first), Some(second)) = (commit.parent(), commit.second_parent()) {
        lines.push(format!("Merge: {} {}", first.short_hex(), second.short_hex()));
    }
    let date = commit.timestamp().with_timezone(&Local);
    lines.push(format!("Date: {}", date.format("%a %b %-d %H:%M:%S %Y %z")));
    lines.push(commit.message().to_string());
    join_lines(&lines)
}

fn join_lines(lines: &[String]) -> String {
    lines.iter().map(|line| format!("{line}\n")).collect()
}

fn cmd_log() -> anyhow::Result<()> {
    for commit in open()?.log()? {
        println!("{}", log_entry(&commit));
    }
    Ok(())
}

fn cmd_global_log() -> anyhow::Result<()> {
    for commit in open()?.global_log()? {
        println!("{}", log_entry(&commit));
    }
    Ok(())
}

fn cmd_find(args: FindArgs) -> anyhow::Result<()> {
    let found = open()?.find(&args.message)?;
    if found.is_empty() {
        println!("Found no commit with that message.");
    }
    for commit in found {
        println!("{}", commit.id());
    }
    Ok(())
}

/// The `status` listing.
pub fn status_text(report: &StatusReport) -> String {
    let mut lines = vec!["=== Branches ===".to_string()];
    for branch in &report.branches {
        if *branch == report.current_branch {
            lines.push(format!("*{}", branch.green().bold()));
        } else {
            lines.push(branch.clone());
        }
    }

    let files = &report.files;
    lines.push(String::new());
    lines.push("=== Staged Files ===".to_string());
    lines.extend(files.staged.iter().map(|f| f.green().to_string()));
    lines.push(String::new());
    lines.push("=== Removed Files ===".to_string());
    lines.extend(files.removed.iter().map(|f| f.red().to_string()));
    lines.push(String::new());
    lines.push("=== Modifications Not Staged For Commit ===".to_string());
    lines.extend(files.unstaged.iter().map(|e| e.to_string().yellow().to_string()));
    lines.push(String::new());
    lines.push("=== Untracked Files ===".to_string());
    lines.extend(files.untracked.iter().cloned());
    join_lines(&lines)
}

fn cmd_status() -> anyhow::Result<()> {
    println!("{}", status_text(&open()?.status()?));
    Ok(())
}

fn cmd_checkout(args: CheckoutArgs) -> anyhow::Result<()> {
    let repo = open()?;
    match (args.target, args.file) {
        (Some(branch), None) => repo.checkout_branch(&branch)?,
        (None, Some(file)) => repo.checkout_file(&file)?,
        (Some(commit), Some(file)) => repo.checkout_commit_file(&commit, &file)?,
        (None, None) => anyhow::bail!("Incorrect operands."),
    }
    Ok(())
}

fn cmd_merge(args: MergeArgs) -> anyhow::Result<()> {
    print_merge(&open()?.merge(&args.branch)?);
    Ok(())
}

fn print_merge(outcome: &MergeOutcome) {
    match outcome {
        MergeOutcome::AlreadyUpToDate => {
            println!("Given branch is an ancestor of the current branch.")
        }
        MergeOutcome::FastForward { .. } => println!("Current branch fast-forwarded."),
        MergeOutcome::Merged { commit, conflicts } => {
            if !conflicts.is_empty() {
                println!("{}", "Encountered a merge conflict.".red().bold());
                for file in conflicts {
                    println!("  {} {}", "conflict:".red(), file);
                }
            }
            debug!(commit = %commit.id().short_hex(), "merge commit");
        }
    }
}

fn cmd_fetch(args: RemoteBranchArgs) -> anyhow::Result<()> {
    let result = open()?.fetch(&args.remote, &args.branch)?;
    println!(
        "{} -> {} ({} commits)",
        format!("{}/{}", args.remote, args.branch).bold(),
        result.updated.new.short_hex().yellow(),
        result.transfer.commits.len()
    );
    Ok(())
}

fn cmd_push(args: RemoteBranchArgs) -> anyhow::Result<()> {
    let result = open()?.push(&args.remote, &args.branch)?;
    let from = result
        .updated
        .old
        .map_or_else(|| "(new branch)".to_string(), |id| id.short_hex());
    println!(
        "{} {}..{} ({} commits)",
        format!("{}/{}", args.remote, args.branch).bold(),
        from,
        result.updated.new.short_hex().yellow(),
        result.transfer.commits.len()
    );
    Ok(())
}

fn cmd_pull(args: RemoteBranchArgs) -> anyhow::Result<()> {
    let result = open()?.pull(&args.remote, &args.branch)?;
    debug!(commits = result.fetch.transfer.commits.len(), "fetched");
    print_merge(&result.merge);
    Ok(())
}

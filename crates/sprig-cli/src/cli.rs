use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "sprig", about = "sprig, a small content-addressed version control system", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Log debug events to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create a repository in the current (or given) directory
    Init(InitArgs),
    /// Stage files for the next commit
    Add(AddArgs),
    /// Unstage a file, or stage its removal and delete it
    Rm(RmArgs),
    /// Record the staged changes
    Commit(CommitArgs),
    /// Show the current branch's history
    Log,
    /// Show every commit ever made
    GlobalLog,
    /// Print the ids of commits with the given message
    Find(FindArgs),
    /// Show branches, staged files and working-tree changes
    Status,
    /// Restore files or switch branches
    Checkout(CheckoutArgs),
    /// Create a branch at the current commit
    Branch(BranchArgs),
    /// Delete a branch pointer
    RmBranch(BranchArgs),
    /// Check out a commit and move the current branch to it
    Reset(ResetArgs),
    /// Merge a branch into the current branch
    Merge(MergeArgs),
    /// Register another repository's .sprig directory as a remote
    AddRemote(AddRemoteArgs),
    /// Forget a remote
    RmRemote(RmRemoteArgs),
    /// Copy a remote branch into <remote>/<branch>
    Fetch(RemoteBranchArgs),
    /// Send the current branch to a remote branch
    Push(RemoteBranchArgs),
    /// Fetch a remote branch and merge it
    Pull(RemoteBranchArgs),
}

#[derive(Debug, Args)]
pub struct InitArgs {
    pub path: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct AddArgs {
    #[arg(required = true)]
    pub files: Vec<String>,
}

#[derive(Debug, Args)]
pub struct RmArgs {
    pub file: String,
}

#[derive(Debug, Args)]
pub struct CommitArgs {
    pub message: String,
}

#[derive(Debug, Args)]
pub struct FindArgs {
    pub message: String,
}

/// `checkout <branch>`, `checkout -- <file>` or `checkout <commit> -- <file>`.
#[derive(Debug, Args)]
pub struct CheckoutArgs {
    /// Branch name, or commit id when a file follows `--`
    pub target: Option<String>,
    #[arg(last = true)]
    pub file: Option<String>,
}

#[derive(Debug, Args)]
pub struct BranchArgs {
    pub name: String,
}

#[derive(Debug, Args)]
pub struct ResetArgs {
    pub commit: String,
}

#[derive(Debug, Args)]
pub struct MergeArgs {
    pub branch: String,
}

#[derive(Debug, Args)]
pub struct AddRemoteArgs {
    pub name: String,
    /// Path of the remote's .sprig directory
    pub path: PathBuf,
}

#[derive(Debug, Args)]
pub struct RmRemoteArgs {
    pub name: String,
}

#[derive(Debug, Args)]
pub struct RemoteBranchArgs {
    pub remote: String,
    pub branch: String,
}

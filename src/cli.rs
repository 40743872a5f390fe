// src/cli.rs

//! CLI definitions for quarry
//!
//! This module contains the command-line interface definitions using clap.
//! The actual command implementations are in the `commands` module.

use clap::{Parser, Subcommand};
use clap_complete::Shell;

#[derive(Parser)]
#[command(name = "quarry")]
#[command(author = "Quarry Project")]
#[command(version)]
#[command(about = "Fetch a git revision and register it in a content-addressed store", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch a revision from a remote repository
    Fetch {
        /// Remote repository URL
        url: String,

        /// Revision to fetch: a full commit hash or a refs/... name
        rev: String,

        /// Symbolic name for the store entry
        #[arg(short, long, default_value = "git-export")]
        name: String,

        /// Expected digest, hex or base-32, optionally prefixed with its
        /// kind (e.g. sha256:...). Enables the store cache short-circuit.
        #[arg(long)]
        expected_hash: Option<String>,

        /// Digest kind: md5, sha1 or sha256
        #[arg(long, default_value = "sha256")]
        hash_type: String,

        /// Keep normalized .git metadata in the registered tree
        #[arg(long)]
        leave_dot_git: bool,

        /// Always fetch full history, even when a shallow fetch would do
        #[arg(long)]
        deep_clone: bool,

        /// Do not recurse into submodules
        #[arg(long)]
        no_submodules: bool,
    },

    /// Generate shell completions
    Completion {
        /// Target shell
        shell: Shell,
    },
}

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset};
use clap::{Parser, Subcommand};

use gitreader_core::{rev, treediff, Identity, Repository};

/// Renders an identity's epoch timestamp in its own recorded timezone.
/// Falls back to printing the raw fields if the `%s %z` pair won't parse
/// (a sentinel identity, say — those still carry a well-formed `+0000`,
/// but nothing guarantees a hand-rolled caller does).
fn format_identity_date(identity: &Identity) -> String {
    let stamp = format!("{} {}", identity.timestamp, identity.timezone);
    match DateTime::<FixedOffset>::parse_from_str(&stamp, "%s %z") {
        Ok(dt) => dt.format("%a %b %e %T %Y %z").to_string(),
        Err(_) => format!("{} {}", identity.timestamp, identity.timezone),
    }
}

#[derive(Parser)]
#[command(name = "gitreader", about = "Read-only inspector for a loose-object git repository")]
struct Opts {
    /// Path to the repository (worktree root or .git directory)
    #[arg(short, long, default_value = ".")]
    repo: PathBuf,

    /// Increase logging verbosity; may be repeated
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    subcmd: SubCommand,
}

#[derive(Subcommand)]
enum SubCommand {
    /// Walk commit history from a root revision
    Log {
        #[arg(default_value = "HEAD")]
        rev: String,
        #[arg(short = 'n', long, default_value_t = 20)]
        limit: usize,
    },
    /// Show one commit's metadata and the files it changed
    Show { rev: String },
    /// List branches, marking the current one
    Branches,
    /// List tags, classifying annotated vs. lightweight
    Tags,
    /// Unified diff of one path between two revisions
    Diff {
        old_rev: String,
        new_rev: String,
        path: String,
    },
    /// Print a decoded object, like the teacher's plumbing command
    CatFile { rev: String },
    /// Resolve a revision to its full hash
    RevParse { rev: String },
}

fn do_main(opts: &Opts) -> Result<()> {
    let repo = Repository::open(&opts.repo).context("failed to open repository")?;
    let store = repo.store();

    match &opts.subcmd {
        SubCommand::Log { rev, limit } => {
            let root = rev::resolve(store, rev).context("failed to resolve revision")?;
            for commit in repo.walk_history(&[root], *limit) {
                println!("{} {}", &commit.hash.to_hex()[..8], commit.message);
            }
        }
        SubCommand::Show { rev } => {
            let hash = rev::resolve(store, rev).context("failed to resolve revision")?;
            let details = repo.commit_details(&hash)?;
            println!("commit {}", details.commit.hash);
            println!(
                "Author: {} <{}>",
                details.commit.author.name, details.commit.author.email
            );
            println!("Date:   {}", format_identity_date(&details.commit.author));
            println!();
            println!("    {}", details.commit.message);
            println!();
            for file in &details.files {
                println!(
                    "{:?}\t{}\t+{} -{}",
                    file.change_type, file.path, file.additions, file.deletions
                );
            }
            println!(
                "{} file(s) changed, {} insertion(s)(+), {} deletion(s)(-)",
                details.stats.files_changed, details.stats.additions, details.stats.deletions
            );
        }
        SubCommand::Branches => {
            for branch in repo.list_branches()? {
                let marker = if branch.is_current { '*' } else { ' ' };
                println!("{} {} {}", marker, branch.name, &branch.commit_sha.to_hex()[..8]);
            }
        }
        SubCommand::Tags => {
            for tag in repo.list_tags()? {
                println!("{} {}", tag.name, &tag.commit_sha.to_hex()[..8]);
            }
        }
        SubCommand::Diff { old_rev, new_rev, path } => {
            let old_hash = rev::resolve(store, old_rev).context("failed to resolve old revision")?;
            let new_hash = rev::resolve(store, new_rev).context("failed to resolve new revision")?;
            let old_tree = repo.get_commit(&old_hash)?.tree;
            let new_tree = repo.get_commit(&new_hash)?.tree;

            let old_blob = treediff::flatten(store, old_tree).get(path).copied();
            let new_blob = treediff::flatten(store, new_tree).get(path).copied();

            let record = repo.diff_blobs(old_blob, new_blob, path)?;
            if record.is_binary {
                println!("Binary files differ");
            } else {
                print!("{}", record.text.unwrap_or_default());
            }
        }
        SubCommand::CatFile { rev } => {
            let hash = rev::resolve(store, rev).context("failed to resolve revision")?;
            let object = store.open_object(&hash)?;
            println!("{:#?}", object);
        }
        SubCommand::RevParse { rev } => {
            let hash = rev::resolve(store, rev).context("failed to resolve revision")?;
            println!("{}", hash);
        }
    }

    Ok(())
}

fn main() {
    let opts = Opts::parse();

    const INFO: usize = 2;
    stderrlog::new()
        .module(module_path!())
        .verbosity(opts.verbose as usize + INFO)
        .timestamp(stderrlog::Timestamp::Off)
        .init()
        .unwrap();

    if let Err(e) = do_main(&opts) {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

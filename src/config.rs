//! Command-line configuration and logging setup

use crate::game::word_sets::{WordSet, WordSets};
use crate::game::Difficulty;
use crate::storage::Storage;
use anyhow::{Context, Result};
use clap::Parser;
use env_logger::{Env, Target};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

pub const LOG_FILE: &str = "wordscramble.log";

#[derive(Parser, Debug)]
#[command(
    name = "wordscramble",
    about = "Unscramble words in the terminal. Each word is shown briefly, then scrambled.",
    version
)]
pub struct Args {
    /// Difficulty for random words: easy, medium or hard
    #[arg(short, long, default_value_t = Difficulty::Easy)]
    pub difficulty: Difficulty,

    /// Play a curated word set by id instead of random words
    #[arg(short, long, value_name = "SET_ID")]
    pub mode: Option<String>,

    /// Start the next word automatically after a solve
    #[arg(short, long)]
    pub auto_advance: bool,

    /// JSON file of curated word sets (replaces the built-in sets)
    #[arg(long, value_name = "PATH")]
    pub word_sets: Option<PathBuf>,

    /// Directory for the database and log file
    #[arg(long, value_name = "PATH")]
    pub data_dir: Option<PathBuf>,

    /// Session name; curated queue positions are kept per session
    #[arg(long, env = "WORDSCRAMBLE_SESSION", default_value = "default")]
    pub session: String,

    /// Forget this session's queue positions before starting
    #[arg(long)]
    pub reset_session: bool,

    /// Log file path (default: wordscramble.log in the data directory)
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Print the configured word sets and exit
    #[arg(long)]
    pub list_sets: bool,
}

/// Resolved settings for one run.
#[derive(Debug, Clone)]
pub struct Settings {
    pub difficulty: Difficulty,
    /// Set id asked for on the command line
    pub requested_set: Option<String>,
    /// Curated set to play, `None` for random words
    pub word_set: Option<WordSet>,
    pub auto_advance: bool,
    pub word_sets: WordSets,
    /// `None` when no data directory could be determined
    pub data_dir: Option<PathBuf>,
    pub session: String,
    pub reset_session: bool,
    pub log_file: Option<PathBuf>,
    pub list_sets: bool,
}

impl Settings {
    pub fn from_args(args: Args) -> Result<Self> {
        let word_sets = match &args.word_sets {
            Some(path) => WordSets::load(path)
                .with_context(|| format!("failed to load word sets from {}", path.display()))?,
            None => WordSets::embedded().clone(),
        };

        // An unknown set id falls back to random words
        let word_set = args.mode.as_deref().and_then(|id| word_sets.find(id).cloned());

        let data_dir = args.data_dir.clone().or_else(|| Storage::data_dir().ok());
        let log_file = args
            .log_file
            .clone()
            .or_else(|| data_dir.as_ref().map(|dir| dir.join(LOG_FILE)));

        Ok(Self {
            difficulty: args.difficulty,
            requested_set: args.mode,
            word_set,
            auto_advance: args.auto_advance,
            word_sets,
            data_dir,
            session: args.session,
            reset_session: args.reset_session,
            log_file,
            list_sets: args.list_sets,
        })
    }
}

/// Send `log` output to a file so it never draws over the TUI.
/// The level comes from `RUST_LOG`, defaulting to `info`.
pub fn init_logging(path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create log directory {}", dir.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open log file {}", path.display()))?;

    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .target(Target::Pipe(Box::new(file)))
        .try_init()
        .context("logger already initialised")?;
    Ok(())
}

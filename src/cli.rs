//! Command implementations behind the `bpx` binary.
//!
//! Each subcommand loads the dump, runs against the record table and writes
//! plain text to the supplied writer. `interactive` is the keystroke-driven
//! mode: every input line is a new query handed to the search scheduler, and
//! outcomes are printed as they are delivered.

use crate::command::Command;
use crate::render;
use anyhow::Context;
use bpx_core::config::Config;
use bpx_core::db::LoadProgress;
use bpx_core::{loader, BlueprintDb, SearchOutcome, SearchScheduler};
use clap::Subcommand;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Subcommand)]
pub enum Action {
    /// Rank blueprints against a query and print the matches.
    Search {
        query: String,
        /// Print at most this many rows (default: `[search] result_limit`).
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Print a blueprint as an indented tree.
    Show {
        /// GUID or exact name.
        target: String,
        /// Only show branches whose key or value contains this text.
        #[arg(long)]
        filter: Option<String>,
    },
    /// Print what a blueprint references and what references it.
    Refs { target: String },
    /// Print the component types embedded in a blueprint.
    Components { target: String },
    /// Read queries from stdin, one per line; lines starting with `:` are commands.
    Interactive,
    /// Print the load summary, including skipped records.
    Stats,
}

/// Pick the dump to load: the command line wins over the config file.
pub fn dataset_path(cli: Option<PathBuf>, config: &Config) -> anyhow::Result<PathBuf> {
    cli.or_else(|| config.dataset.path.clone())
        .context("no dataset: pass --dataset or set [dataset] path in config.toml")
}

/// Read a dump and build the record table off the async threads.
pub async fn load(path: &Path, config: &Config) -> anyhow::Result<BlueprintDb> {
    let raw = loader::read_dump(path).await?;
    let search = config.search.clone();
    let db = tokio::task::spawn_blocking(move || {
        BlueprintDb::load_with_progress(raw, &search, |p: LoadProgress| {
            if p.loaded % 10_000 == 0 || p.loaded == p.total {
                tracing::debug!(loaded = p.loaded, total = p.total, "parsing blueprints");
            }
        })
    })
    .await?;
    Ok(db)
}

fn resolve(db: &BlueprintDb, target: &str) -> anyhow::Result<usize> {
    db.resolve(target)
        .with_context(|| format!("no blueprint matches {target:?}"))
}

/// Run one non-interactive action.
pub async fn run<W: Write>(action: Action, db: Arc<BlueprintDb>, config: &Config, out: &mut W) -> anyhow::Result<()> {
    match action {
        Action::Search { query, limit } => {
            let results = db
                .score_all(&query, bpx_core::BufferId::FIRST, &CancellationToken::new())
                .unwrap_or_default();
            let limit = limit.unwrap_or(config.search.result_limit);
            write!(out, "{}", render::result_rows(&db, &results, bpx_core::BufferId::FIRST, limit))?;
        }
        Action::Show { target, filter } => {
            let index = resolve(&db, &target)?;
            let text = render::tree(&db, index, filter.as_deref().unwrap_or(""), &config.display)?;
            write!(out, "{text}")?;
        }
        Action::Refs { target } => {
            let index = resolve(&db, &target)?;
            write!(out, "{}", render::references(&db, index))?;
        }
        Action::Components { target } => {
            let index = resolve(&db, &target)?;
            write!(out, "{}", render::components(&db, index))?;
        }
        Action::Stats => write!(out, "{}", render::load_summary(db.report()))?,
        Action::Interactive => {
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            interactive(db, config, stdin, out).await?;
        }
    }
    Ok(())
}

/// State carried between interactive commands.
#[derive(Debug, Default)]
struct Session {
    history: Vec<usize>,
    filter: String,
}

impl Session {
    fn show<W: Write>(&self, db: &BlueprintDb, config: &Config, out: &mut W) -> anyhow::Result<()> {
        if let Some(&index) = self.history.last() {
            write!(out, "{}", render::tree(db, index, &self.filter, &config.display)?)?;
        }
        Ok(())
    }

    /// Returns `false` when the session should end.
    fn execute<W: Write>(&mut self, command: Command, db: &BlueprintDb, config: &Config, out: &mut W) -> anyhow::Result<bool> {
        match command {
            Command::Quit => return Ok(false),
            Command::Show(target) => match db.resolve(&target) {
                Some(index) => {
                    self.history.push(index);
                    self.show(db, config, out)?;
                }
                None => writeln!(out, "no blueprint matches {target:?}")?,
            },
            Command::Refs(target) => match db.resolve(&target) {
                Some(index) => write!(out, "{}", render::references(db, index))?,
                None => writeln!(out, "no blueprint matches {target:?}")?,
            },
            Command::Components(target) => match db.resolve(&target) {
                Some(index) => write!(out, "{}", render::components(db, index))?,
                None => writeln!(out, "no blueprint matches {target:?}")?,
            },
            Command::Filter(filter) => {
                self.filter = filter;
                self.show(db, config, out)?;
            }
            Command::Back => {
                self.history.pop();
                self.show(db, config, out)?;
            }
            Command::Stats => write!(out, "{}", render::load_summary(db.report()))?,
        }
        Ok(true)
    }
}

fn print_outcome<W: Write>(db: &BlueprintDb, config: &Config, outcome: &SearchOutcome, out: &mut W) -> anyhow::Result<()> {
    writeln!(
        out,
        "[{}] {:?}: {} results",
        outcome.generation,
        outcome.query,
        outcome.results.len()
    )?;
    write!(
        out,
        "{}",
        render::result_rows(db, &outcome.results, outcome.buffer, config.search.result_limit)
    )?;
    Ok(())
}

/// Drive the scheduler from a line-oriented input.
///
/// Each query line supersedes the previous one, exactly as a keystroke does
/// in a search box. At end of input the searches still running are allowed
/// to finish, so the outcome of the last query is always printed.
pub async fn interactive<R, W>(db: Arc<BlueprintDb>, config: &Config, input: R, out: &mut W) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let (mut scheduler, mut outcomes) = SearchScheduler::new(Arc::clone(&db));
    let mut session = Session::default();
    let mut lines = input.lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if let Some(raw) = line.strip_prefix(':') {
                    match Command::parse(raw) {
                        Ok(command) => {
                            if !session.execute(command, &db, config, out)? {
                                break;
                            }
                        }
                        Err(message) if message.is_empty() => {}
                        Err(message) => writeln!(out, "{message}")?,
                    }
                } else {
                    scheduler.schedule(line).await?;
                }
            }
            Some(outcome) = outcomes.recv() => print_outcome(&db, config, &outcome, out)?,
        }
    }

    scheduler.finish().await?;
    while let Some(outcome) = outcomes.recv().await {
        print_outcome(&db, config, &outcome, out)?;
    }
    out.flush()?;
    Ok(())
}

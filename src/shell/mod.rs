//! Interactive command layer over an [`AvlTree`]
//!
//! A [`Session`] owns one tree and the settings used to talk to it. Input
//! text is parsed into [`Command`]s, each of which produces a [`Response`];
//! rendering is left to [`render`].

mod error;
mod parser;
pub mod render;

pub use error::{ShellError, ShellResult};
pub use parser::{Command, parser};

use std::path::{Path, PathBuf};

use chumsky::Parser;
use log::{debug, info};
use serde::Serialize;

use crate::avl::{AvlTree, NodeInfo, Tolerance, TreeError};
use crate::config::SessionConfig;
use crate::filter::{self, Criterion, YearlyAverages};
use crate::loader::{self, LoadOptions};
use crate::record::{Key, Record, RecordId};

/// Parse a batch of `;`-terminated statements
pub fn parse(input: &str) -> ShellResult<Vec<Command>> {
    parser()
        .parse(input)
        .into_result()
        .map_err(|errors| ShellError::Parse(errors.into_iter().map(|e| e.to_string()).collect()))
}

/// Aggregate figures over the whole tree
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stats {
    pub len: usize,
    pub height: i32,
    pub sum: f64,
    pub mean: Option<f64>,
    pub minimum: Option<Key>,
    pub maximum: Option<Key>,
}

/// Outcome of one command
///
/// Every variant owns its data, so a response outlives later mutations of
/// the session that produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum Response {
    /// Comments and empty statements
    Nothing,
    Message(String),
    Inserted(Record),
    /// The record was not inserted: `existing` already holds its key
    Duplicate { rejected: Record, existing: Record },
    Removed(Record),
    Found(Record),
    NotFound(Key),
    Info(NodeInfo),
    Records(Vec<Record>),
    Levels { codes: bool, levels: Vec<Vec<Record>> },
    Stats(Stats),
    Selection {
        criterion: Criterion,
        threshold: f64,
        records: Vec<Record>,
    },
    Loaded {
        path: PathBuf,
        loaded: usize,
        duplicates: usize,
    },
}

/// A tree together with the settings used to query it
#[derive(Debug)]
pub struct Session {
    tree: AvlTree,
    config: SessionConfig,
    tolerance: Tolerance,
    load_options: LoadOptions,
    averages: YearlyAverages,
    next_id: RecordId,
}

impl Session {
    /// Start an empty session
    ///
    /// The configured dataset, if any, is not loaded; see [`Session::open`].
    pub fn new(config: SessionConfig) -> ShellResult<Self> {
        let tolerance = config.key_tolerance()?;
        let load_options = config.load_options()?;
        let averages = YearlyAverages::new(config.first_year);

        Ok(Self {
            tree: AvlTree::new(),
            config,
            tolerance,
            load_options,
            averages,
            next_id: 1,
        })
    }

    /// Start a session and load the configured dataset
    pub fn open(config: SessionConfig) -> ShellResult<Self> {
        let data = config.data.clone();
        let mut session = Self::new(config)?;
        if let Some(path) = data {
            session.load(&path)?;
        }
        Ok(session)
    }

    pub fn tree(&self) -> &AvlTree {
        &self.tree
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Replace the tree with the records of a CSV file
    ///
    /// On error the current tree is kept.
    pub fn load(&mut self, path: &Path) -> ShellResult<Response> {
        let records = loader::load_path(path, &self.load_options)?;
        let loaded = records.len();
        self.next_id = records.iter().map(Record::id).max().map_or(1, |id| id + 1);

        let (tree, duplicates) = loader::build_tree(records);
        self.tree = tree;
        self.averages.invalidate();

        Ok(Response::Loaded {
            path: path.to_path_buf(),
            loaded,
            duplicates,
        })
    }

    /// Parse `input` and execute every statement in order
    ///
    /// Stops at the first failing statement. Statements before it stay
    /// applied; use [`Session::run_each`] to see their responses as well.
    pub fn run(&mut self, input: &str) -> ShellResult<Vec<Response>> {
        let mut responses = Vec::new();
        self.run_each(input, |response| {
            responses.push(response);
            Ok(())
        })?;
        Ok(responses)
    }

    /// Parse `input`, then hand each statement's response to `emit` as soon
    /// as it executes
    ///
    /// Nothing runs if `input` does not parse. Execution stops at the first
    /// statement or `emit` call that fails, after every earlier response has
    /// been emitted.
    pub fn run_each<F>(&mut self, input: &str, mut emit: F) -> ShellResult<()>
    where
        F: FnMut(Response) -> ShellResult<()>,
    {
        for command in parse(input)? {
            emit(self.execute(command)?)?;
        }
        Ok(())
    }

    pub fn execute(&mut self, command: Command) -> ShellResult<Response> {
        debug!("Executing {command:?}");

        let response = match command {
            Command::Insert {
                name,
                code,
                measurements,
            } => self.insert(name, code, measurements)?,
            Command::Delete(key) => self.delete(key),
            Command::Search(key) => match self.tree.search_within(key, self.tolerance) {
                Some(record) => Response::Found(record.clone()),
                None => Response::NotFound(key),
            },
            Command::Info(key) => match self.tree.node_info(key, self.tolerance) {
                Ok(Some(info)) => Response::Info(info),
                Ok(None) | Err(TreeError::EmptyTree) => Response::NotFound(key),
                Err(e) => return Err(e.into()),
            },
            Command::List => Response::Records(self.tree.in_order().cloned().collect()),
            Command::Levels { codes } => Response::Levels {
                codes,
                levels: self
                    .tree
                    .levels()
                    .into_iter()
                    .map(|row| row.into_iter().cloned().collect())
                    .collect(),
            },
            Command::Stats => Response::Stats(self.stats()),
            Command::Clear => {
                self.tree.clear();
                self.averages.invalidate();
                Response::Message("Tree cleared".to_string())
            }
            Command::Load(path) => self.load(Path::new(&path))?,
            Command::Filter(criterion) => {
                let selection = filter::select(&self.tree, criterion, &mut self.averages);
                Response::Selection {
                    criterion,
                    threshold: selection.threshold,
                    records: selection.records.into_iter().cloned().collect(),
                }
            }
            Command::Comment(_) | Command::Empty => Response::Nothing,
        };
        Ok(response)
    }

    fn insert(
        &mut self,
        name: String,
        code: String,
        measurements: Vec<f64>,
    ) -> ShellResult<Response> {
        let record = Record::new(self.next_id, name, code, measurements)?;

        if let Some(existing) = self.tree.search(record.key()) {
            return Ok(Response::Duplicate {
                existing: existing.clone(),
                rejected: record,
            });
        }

        self.tree.insert(record.clone());
        self.next_id += 1;
        self.averages.invalidate();
        info!("Inserted {} with key {}", record.code(), record.key());
        Ok(Response::Inserted(record))
    }

    /// Resolve `key` within the tolerance, then remove the stored key exactly
    fn delete(&mut self, key: Key) -> Response {
        let Some(stored) = self
            .tree
            .search_within(key, self.tolerance)
            .map(Record::key)
        else {
            return Response::NotFound(key);
        };

        match self.tree.remove(stored) {
            Some(record) => {
                self.averages.invalidate();
                info!("Removed {} with key {}", record.code(), record.key());
                Response::Removed(record)
            }
            None => Response::NotFound(key),
        }
    }

    fn stats(&self) -> Stats {
        Stats {
            len: self.tree.len(),
            height: self.tree.height(),
            sum: self.tree.sum_of_keys(),
            mean: self.tree.mean_key(),
            minimum: self.tree.minimum().ok().map(Record::key),
            maximum: self.tree.maximum().ok().map(Record::key),
        }
    }
}

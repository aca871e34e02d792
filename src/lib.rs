pub mod avl;
pub mod config;
pub mod filter;
pub mod loader;
pub mod logger;
pub mod record;
pub mod shell;

pub use avl::{
    AvlTree, BinarySearchTree, InsertOutcome, NodeInfo, SearchTree, Tolerance, TreeError,
    TreeResult,
};
pub use config::{ConfigError, ConfigResult, SessionConfig};
pub use filter::{Criterion, Selection, YearlyAverages};
pub use loader::{LoadError, LoadOptions, LoadResult};
pub use record::{Key, Record, RecordError, RecordId, RecordResult};
pub use shell::{Command, Response, Session, ShellError, ShellResult};

use std::path::PathBuf;

use clap::Parser;

use climavl::config::{ConfigResult, SessionConfig};

#[derive(Parser)]
#[command(version, about = "Country temperature variations kept in an AVL tree")]
pub struct Options {
    /// CSV dataset to load at startup.
    #[arg(short, long)]
    pub data: Option<PathBuf>,

    /// JSON session configuration. Flags given on the command line override its values.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// CSV field delimiter.
    #[arg(long)]
    pub delimiter: Option<char>,

    /// The CSV has no header row.
    #[arg(long)]
    pub no_headers: bool,

    /// Distance under which a typed key matches a stored key.
    #[arg(short, long)]
    pub tolerance: Option<f64>,

    /// Year of the first measurement column.
    #[arg(long)]
    pub first_year: Option<i32>,

    /// Run these statements and exit instead of starting the shell.
    #[arg(short, long)]
    pub execute: Option<String>,

    /// Print responses as JSON.
    #[arg(long)]
    pub json: bool,
}

impl Options {
    /// Configuration file (or defaults) with the command-line overrides applied
    pub fn session_config(&self) -> ConfigResult<SessionConfig> {
        let mut config = match &self.config {
            Some(path) => SessionConfig::load(path)?,
            None => SessionConfig::default(),
        };

        if let Some(data) = &self.data {
            config.data = Some(data.clone());
        }
        if let Some(delimiter) = self.delimiter {
            config.delimiter = delimiter;
        }
        if self.no_headers {
            config.has_headers = false;
        }
        if let Some(tolerance) = self.tolerance {
            config.tolerance = tolerance;
        }
        if let Some(first_year) = self.first_year {
            config.first_year = first_year;
        }

        config.validate()?;
        Ok(config)
    }
}

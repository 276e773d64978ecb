//! Error types for postsmith
//!
//! `PostError` covers everything that can go wrong with a single source file.
//! Those are collected into the build report and never abort a run.
//! `BuildError` is fatal: the run stops and the process exits non-zero.

use std::path::PathBuf;
use thiserror::Error;

/// A failure confined to one post. The post is skipped, the build continues.
#[derive(Error, Debug)]
pub enum PostError {
    #[error("failed to read file: {0}")]
    Read(#[from] std::io::Error),

    #[error("no metadata header found")]
    MissingHeader,

    #[error("malformed metadata header: {0}")]
    MalformedHeader(String),

    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    #[error("invalid date `{0}`")]
    InvalidDate(String),

    #[error("could not derive a slug from `{0}`")]
    EmptySlug(String),

    #[error("markdown conversion failed: {0}")]
    Render(String),

    #[error("template rendering failed: {0}")]
    Template(String),

    #[error("slug `{slug}` is already used by {existing}")]
    SlugCollision { slug: String, existing: String },
}

/// A failure that stops the whole build.
#[derive(Error, Debug)]
pub enum BuildError {
    #[error("input directory does not exist: {0}")]
    InputMissing(PathBuf),

    #[error("input path is not a directory: {0}")]
    InputNotDirectory(PathBuf),

    #[error("output directory is not writable: {path}")]
    OutputUnwritable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {path}: {message}")]
    Config { path: PathBuf, message: String },

    #[error("template error: {0}")]
    Template(#[from] tera::Error),
}

impl BuildError {
    pub(crate) fn output(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::OutputUnwritable {
            path: path.into(),
            source,
        }
    }
}

impl From<tera::Error> for PostError {
    fn from(e: tera::Error) -> Self {
        // tera nests the useful message in the source chain
        let mut message = e.to_string();
        let mut source = std::error::Error::source(&e);
        while let Some(inner) = source {
            message = format!("{}: {}", message, inner);
            source = inner.source();
        }
        PostError::Template(message)
    }
}

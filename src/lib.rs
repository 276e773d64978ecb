//! postsmith: a small static renderer for Markdown blog posts
//!
//! Reads a directory of posts (metadata header + Markdown body), renders each
//! to `YYYY-MM-DD-slug.html` and writes an `index.html` listing them newest
//! first. Optional artifacts (feed, category pages, search index) are toggled
//! in `_config.yml`.

pub mod commands;
pub mod config;
pub mod content;
pub mod error;
pub mod generator;
pub mod templates;

use chrono::FixedOffset;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use config::{Extension, SiteConfig};
use error::BuildError;

/// Config file looked up in the input directory when none is given
pub const CONFIG_FILE: &str = "_config.yml";

/// Stands in for a path when a config was built in code
const INLINE_CONFIG: &str = "<inline config>";

/// One build's worth of settings and paths
#[derive(Debug, Clone)]
pub struct Site {
    /// Site configuration
    pub config: SiteConfig,
    /// Directory holding the post sources
    pub input_dir: PathBuf,
    /// Directory receiving the rendered files
    pub output_dir: PathBuf,
    /// Offset for dates written without one
    pub offset: FixedOffset,
    /// Extensions enabled in the config
    pub extensions: BTreeSet<Extension>,
}

impl Site {
    /// Create a site, loading `config_path` or `<input>/_config.yml` if present
    pub fn new<P: AsRef<Path>, Q: AsRef<Path>>(
        input_dir: P,
        output_dir: Q,
        config_path: Option<&Path>,
    ) -> Result<Self, BuildError> {
        let input_dir = input_dir.as_ref().to_path_buf();
        let default_path = input_dir.join(CONFIG_FILE);

        let (config, source) = match config_path {
            Some(path) => (SiteConfig::load(path)?, Some(path)),
            None if default_path.is_file() => {
                (SiteConfig::load(&default_path)?, Some(default_path.as_path()))
            }
            None => (SiteConfig::default(), None),
        };

        Self::assemble(config, source, &input_dir, output_dir.as_ref())
    }

    /// Create a site from an already built config
    pub fn with_config<P: AsRef<Path>, Q: AsRef<Path>>(
        config: SiteConfig,
        input_dir: P,
        output_dir: Q,
    ) -> Result<Self, BuildError> {
        Self::assemble(config, None, input_dir.as_ref(), output_dir.as_ref())
    }

    /// `source` is the file the config was read from, used in error reports
    fn assemble(
        config: SiteConfig,
        source: Option<&Path>,
        input_dir: &Path,
        output_dir: &Path,
    ) -> Result<Self, BuildError> {
        let config_error = |message: String| BuildError::Config {
            path: source.map_or_else(|| PathBuf::from(INLINE_CONFIG), Path::to_path_buf),
            message,
        };
        config.validate().map_err(config_error)?;
        let offset = config.offset().map_err(config_error)?;
        let extensions = config.enabled_extensions();

        Ok(Self {
            config,
            input_dir: input_dir.to_path_buf(),
            output_dir: output_dir.to_path_buf(),
            offset,
            extensions,
        })
    }

    pub fn has_extension(&self, ext: Extension) -> bool {
        self.extensions.contains(&ext)
    }

    /// Fail unless the input directory exists
    pub fn check_input(&self) -> Result<(), BuildError> {
        if !self.input_dir.exists() {
            return Err(BuildError::InputMissing(self.input_dir.clone()));
        }
        if !self.input_dir.is_dir() {
            return Err(BuildError::InputNotDirectory(self.input_dir.clone()));
        }
        Ok(())
    }

    /// Render the site
    pub fn build(&self) -> Result<commands::build::BuildReport, BuildError> {
        commands::build::run(self)
    }

    /// Remove the output directory
    pub fn clean(&self) -> anyhow::Result<()> {
        commands::clean::run(self)
    }
}

//! Site configuration (_config.yml)

use chrono::format::{Item, StrftimeItems};
use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::error::BuildError;

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Site
    pub title: String,
    pub description: String,
    pub author: String,

    /// Absolute base URL, only used where links must be absolute (feed)
    pub url: String,

    /// Offset applied to dates written without one, e.g. `+08:00`
    pub timezone: String,

    /// chrono format string for dates shown on pages
    pub date_format: String,

    /// Number of posts included in atom.xml
    pub feed_limit: usize,

    #[serde(default)]
    pub highlight: HighlightConfig,

    /// Optional output artifacts, each either listed or not
    #[serde(default)]
    pub extensions: Vec<String>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "Blog".to_string(),
            description: String::new(),
            author: String::new(),
            url: "http://example.com".to_string(),
            timezone: String::new(),
            date_format: "%b %-d, %Y".to_string(),
            feed_limit: 20,
            highlight: HighlightConfig::default(),
            extensions: Vec::new(),
        }
    }
}

impl SiteConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, BuildError> {
        let path = path.as_ref();
        let config_error = |message: String| BuildError::Config {
            path: path.to_path_buf(),
            message,
        };

        let content = fs::read_to_string(path).map_err(|e| config_error(e.to_string()))?;
        // An empty file is a valid, all-defaults config
        let config: SiteConfig = if content.trim().is_empty() {
            SiteConfig::default()
        } else {
            serde_yaml::from_str(&content).map_err(|e| config_error(e.to_string()))?
        };

        config.validate().map_err(config_error)?;
        tracing::debug!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Check the fields that are only interpreted later in the build
    pub fn validate(&self) -> Result<(), String> {
        self.offset()?;
        let bad_format = StrftimeItems::new(&self.date_format).any(|item| item == Item::Error);
        if bad_format {
            return Err(format!("invalid date_format `{}`", self.date_format));
        }
        Ok(())
    }

    /// Parse `timezone` into a fixed offset. Empty or `UTC` means +00:00.
    pub fn offset(&self) -> Result<FixedOffset, String> {
        parse_offset(&self.timezone)
            .ok_or_else(|| format!("invalid timezone offset `{}`", self.timezone))
    }

    /// Resolve the extension list. Unknown names are logged and dropped.
    pub fn enabled_extensions(&self) -> BTreeSet<Extension> {
        let mut enabled = BTreeSet::new();
        for name in &self.extensions {
            match name.parse::<Extension>() {
                Ok(ext) => {
                    enabled.insert(ext);
                }
                Err(()) => {
                    tracing::warn!("Ignoring unsupported extension `{}`", name);
                }
            }
        }
        enabled
    }
}

fn parse_offset(tz: &str) -> Option<FixedOffset> {
    let tz = tz.trim();
    if tz.is_empty() || tz.eq_ignore_ascii_case("utc") || tz == "Z" {
        return FixedOffset::east_opt(0);
    }

    tz.parse::<FixedOffset>().ok()
}

/// Optional artifacts produced alongside the post pages and index
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Extension {
    /// atom.xml
    Feed,
    /// categories/<slug>.html
    Categories,
    /// search.json
    Search,
}

impl FromStr for Extension {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "feed" | "atom" => Ok(Extension::Feed),
            "categories" | "category" => Ok(Extension::Categories),
            "search" => Ok(Extension::Search),
            _ => Err(()),
        }
    }
}

/// Code highlighting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightConfig {
    pub enable: bool,
    pub line_number: bool,
    pub theme: String,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            enable: true,
            line_number: true,
            theme: "base16-ocean.dark".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SiteConfig::default();
        assert_eq!(config.feed_limit, 20);
        assert!(config.extensions.is_empty());
        assert_eq!(config.offset().unwrap().local_minus_utc(), 0);
    }

    #[test]
    fn test_parse_config() {
        let yaml = r#"
title: Notes on C++
author: Test User
timezone: "+08:00"
extensions:
  - feed
  - categories
highlight:
  line_number: false
"#;
        let config: SiteConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.title, "Notes on C++");
        assert_eq!(config.author, "Test User");
        assert!(!config.highlight.line_number);
        assert!(config.highlight.enable);
        assert_eq!(config.offset().unwrap().local_minus_utc(), 8 * 3600);

        let enabled = config.enabled_extensions();
        assert!(enabled.contains(&Extension::Feed));
        assert!(enabled.contains(&Extension::Categories));
        assert!(!enabled.contains(&Extension::Search));
    }

    #[test]
    fn test_unknown_extensions_are_dropped() {
        let config = SiteConfig {
            extensions: vec!["sitemap".into(), "paginate".into(), "search".into()],
            ..Default::default()
        };
        let enabled = config.enabled_extensions();
        assert_eq!(enabled.len(), 1);
        assert!(enabled.contains(&Extension::Search));
    }

    #[test]
    fn test_parse_offset() {
        assert_eq!(parse_offset("-0500").unwrap().local_minus_utc(), -5 * 3600);
        assert_eq!(parse_offset("+05:30").unwrap().local_minus_utc(), 19800);
        assert!(parse_offset("Europe/Paris").is_none());
        assert!(parse_offset("+25:00").is_none());
        assert_eq!(parse_offset("utc").unwrap().local_minus_utc(), 0);
        assert_eq!(parse_offset(" Z ").unwrap().local_minus_utc(), 0);
        assert_eq!(parse_offset("-05:30").unwrap().local_minus_utc(), -19800);
    }

    #[test]
    fn test_load_rejects_bad_timezone() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("_config.yml");
        fs::write(&path, "timezone: Mars/Olympus\n").unwrap();
        assert!(matches!(
            SiteConfig::load(&path),
            Err(BuildError::Config { .. })
        ));
    }

    #[test]
    fn test_validate_date_format() {
        let config = SiteConfig {
            date_format: "%Y-%m-%d".into(),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
        let config = SiteConfig {
            date_format: "%Q".into(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("_config.yml");
        fs::write(&path, "").unwrap();
        let config = SiteConfig::load(&path).unwrap();
        assert_eq!(config.title, "Blog");
    }
}

//! Clean the output directory

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::Site;

/// Remove the output directory and everything in it.
///
/// Refuses when the output holds the input directory, which covers `.` and
/// an output set to the input itself.
pub fn run(site: &Site) -> Result<()> {
    if !site.output_dir.exists() {
        tracing::debug!("Nothing to clean at {:?}", site.output_dir);
        return Ok(());
    }

    let output = resolve(&site.output_dir)?;
    let input = resolve(&site.input_dir)?;
    if input.starts_with(&output) {
        bail!(
            "Refusing to delete {:?}: it contains the input directory {:?}",
            site.output_dir,
            site.input_dir
        );
    }

    fs::remove_dir_all(&site.output_dir)
        .with_context(|| format!("Failed to delete {:?}", site.output_dir))?;
    tracing::info!("Deleted: {:?}", site.output_dir);

    Ok(())
}

/// Absolute form of `path`, with symlinks resolved when it exists
fn resolve(path: &Path) -> Result<PathBuf> {
    match fs::canonicalize(path) {
        Ok(path) => Ok(path),
        Err(_) if path.is_absolute() => Ok(path.to_path_buf()),
        Err(_) => Ok(std::env::current_dir()
            .context("Failed to read the current directory")?
            .join(path)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;

    #[test]
    fn test_clean_removes_output() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("_site");
        fs::create_dir_all(out.join("categories")).unwrap();
        fs::write(out.join("index.html"), "old").unwrap();

        let site = Site::with_config(SiteConfig::default(), dir.path(), &out).unwrap();
        run(&site).unwrap();
        assert!(!out.exists());

        // Cleaning twice is fine
        run(&site).unwrap();
    }

    #[test]
    fn test_clean_refuses_input_or_its_parents() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("blog");
        fs::create_dir_all(&input).unwrap();
        fs::write(input.join("post.md"), "---\ntitle: Keep\n---\n").unwrap();

        for output in [input.clone(), dir.path().to_path_buf(), input.join("..")] {
            let site = Site::with_config(SiteConfig::default(), &input, &output).unwrap();
            assert!(run(&site).is_err(), "{:?} should be refused", output);
        }
        assert!(input.join("post.md").is_file());
    }

    #[test]
    fn test_clean_allows_output_beside_input() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("blog");
        let out = dir.path().join("blog-site");
        fs::create_dir_all(&input).unwrap();
        fs::create_dir_all(&out).unwrap();

        let site = Site::with_config(SiteConfig::default(), &input, &out).unwrap();
        run(&site).unwrap();
        assert!(!out.exists());
        assert!(input.is_dir());
    }
}

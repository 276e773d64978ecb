//! Build the static site

use std::time::Instant;

use crate::content::{ContentLoader, PostFailure, PostSummary};
use crate::error::BuildError;
use crate::generator::Generator;
use crate::Site;

/// Outcome of a build that did not fail outright
#[derive(Debug, Default)]
pub struct BuildReport {
    /// Posts written, newest first
    pub rendered: Vec<PostSummary>,
    /// Skipped posts, ordered by source path
    pub failures: Vec<PostFailure>,
    /// Unpublished posts left out on purpose
    pub drafts: usize,
}

impl BuildReport {
    /// True when no post was skipped because of an error
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// Log the end-of-run summary, one line per failed post
    pub fn log_summary(&self) {
        if self.failures.is_empty() {
            tracing::info!("Rendered {} posts", self.rendered.len());
            return;
        }

        tracing::warn!(
            "Rendered {} posts, skipped {} with errors:",
            self.rendered.len(),
            self.failures.len()
        );
        for failure in &self.failures {
            tracing::warn!("  {}", failure);
        }
    }
}

/// Load every post under the input directory and write the site.
///
/// The input directory is checked before anything is written.
pub fn run(site: &Site) -> Result<BuildReport, BuildError> {
    let start = Instant::now();

    // Load content
    let loader = ContentLoader::new(site);
    let loaded = loader.load_posts()?;
    tracing::info!(
        "Loaded {} posts from {:?} ({} failed, {} drafts)",
        loaded.posts.len(),
        site.input_dir,
        loaded.failures.len(),
        loaded.drafts
    );

    // Generate site
    let generator = Generator::new(site)?;
    let generated = generator.generate(&loaded.posts)?;

    let mut failures = loaded.failures;
    failures.extend(generated.failures);
    failures.sort_by(|a, b| a.source.cmp(&b.source));

    let report = BuildReport {
        rendered: generated.rendered,
        failures,
        drafts: loaded.drafts,
    };
    report.log_summary();

    let duration = start.elapsed();
    tracing::info!("Generated in {:.2}s", duration.as_secs_f64());

    Ok(report)
}

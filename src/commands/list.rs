//! List the posts a build would render

use anyhow::Result;

use crate::content::ContentLoader;
use crate::Site;

/// Print loaded posts newest first, then any files that would be skipped
pub fn run(site: &Site) -> Result<()> {
    let loader = ContentLoader::new(site);
    let loaded = loader.load_posts()?;

    println!("Posts ({}):", loaded.posts.len());
    for post in &loaded.posts {
        println!(
            "  {} - {} [{}]",
            post.date.format("%Y-%m-%d"),
            post.title,
            post.output_name()
        );
    }

    if !loaded.failures.is_empty() {
        println!("Skipped ({}):", loaded.failures.len());
        for failure in &loaded.failures {
            println!("  {}", failure);
        }
    }

    if loaded.drafts > 0 {
        println!("Drafts: {}", loaded.drafts);
    }

    Ok(())
}

//! Configuration module

mod site;

pub use site::Extension;
pub use site::HighlightConfig;
pub use site::SiteConfig;

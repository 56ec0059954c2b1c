pub mod client;
pub mod sources;
pub mod traits;

pub use client::{ScrapedSource, SourceClient};
pub use sources::{default_sources, SourceDescriptor};
pub use traits::PropertySource;

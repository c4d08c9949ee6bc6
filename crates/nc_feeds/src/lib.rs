pub mod logging;
pub mod manager;
pub mod sources;

pub use logging::{init_logging, Logger};
pub use manager::{IngestManager, IngestReport};
pub use sources::{FeedSource, NewsApiConfig, NewsApiSource};

pub mod prelude {
    pub use super::manager::IngestManager;
    pub use super::sources::FeedSource;
    pub use nc_core::{Article, Error, Result};
}

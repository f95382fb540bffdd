pub mod crawler;
pub mod error;
pub mod rate_limit;
pub mod resolver;
pub mod routing;
mod sources;

pub use crawler::{CityDirectoryClient, CrawlerError};
pub use error::SourceError;
pub use rate_limit::MinInterval;
pub use resolver::{CepResolver, ResolverConfig};
pub use routing::{OsrmClient, RoutingError};

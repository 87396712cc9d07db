pub mod config;
pub mod error;
pub mod http;
pub mod source;

pub use config::ClientConfig;
pub use error::FetchError;
pub use http::HttpDataSource;
pub use source::DataSource;

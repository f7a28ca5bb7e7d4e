pub mod aggregate;
pub mod color;
pub mod config;
pub mod error;
pub mod export;
pub mod hierarchy;
pub mod loader;
pub mod logging;
pub mod measure;
pub mod model;
pub mod reconcile;
pub mod search;
pub mod session;
pub mod treemap;

pub use config::*;
pub use error::*;
pub use model::*;
pub use session::*;

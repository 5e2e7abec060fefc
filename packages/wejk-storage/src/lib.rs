pub mod db;
pub mod qdrant;
pub mod rate_limits;
pub mod schema;
pub mod traces;

mod error;

pub use error::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

pub mod schema;

pub use schema::{Config, LoginConfig, PublishConfig, ServiceConfig};

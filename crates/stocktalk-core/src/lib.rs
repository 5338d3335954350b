pub mod db;
pub mod error;
pub mod events;
pub mod fetch;
pub mod loader;
pub mod normalize;
pub mod pipeline;
pub mod query;
pub mod types;

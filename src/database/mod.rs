pub mod connector;
pub mod models;
pub mod repository;

#[allow(unused_imports)]
pub use connector::{DB, connect, connect_with_settings, ping};

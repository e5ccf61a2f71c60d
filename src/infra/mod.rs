//! Concrete adapters for the ports in `app::ports`.

pub mod cache;
pub mod http_client;

pub use cache::{FileCache, InMemoryCache};
pub use http_client::ReqwestHttp;

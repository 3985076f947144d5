//! Fetch strategies.

mod closure;
mod http;

pub use closure::FnFetchStrategy;
pub use http::HttpFetchStrategy;

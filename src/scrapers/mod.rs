//! Page fetching: rendered browser sessions and plain HTTP.

pub mod browser;
mod http_client;

pub use browser::{
    BrowserError, BrowserSession, BrowserSessionConfig, PageLoadOptions, PageView,
    ARTICLE_READY_SELECTOR,
};
pub use http_client::{resolve_user_agent, HttpClient, USER_AGENT};

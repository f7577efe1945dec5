//! BlogForge: blog article scraping and LLM-assisted rewriting.
//!
//! The crate scrapes articles from a blog listing with a headless browser,
//! stores them in SQLite, finds related coverage through web search, and
//! produces rewritten copies of each article with an LLM provider chain.

pub mod cli;
pub mod config;
pub mod content;
pub mod llm;
pub mod models;
pub mod pipeline;
pub mod repository;
pub mod scrapers;
pub mod search;

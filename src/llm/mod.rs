//! LLM-backed article enhancement.

mod client;
mod config;
mod prompts;

pub use client::{EnhanceError, EnhancementClient, MIN_ENHANCEMENT_LENGTH};
pub use config::EnhancerConfig;
pub use prompts::{build_enhancement_prompt, SYSTEM_PROMPT};

//! Text-generation providers for toolscribe.
//!
//! All providers implement the `toolscribe_core::Provider` trait. The
//! factory builds the configured provider; [`RetryingClient`] wraps it with
//! rate-limit backoff and truncation detection for every AI-producing stage.

pub mod factory;
pub mod openai_compat;
pub mod retry;

pub use factory::build_default_provider;
pub use openai_compat::OpenAiCompatProvider;
pub use retry::{RetryPolicy, RetryingClient, Sleeper, TokioSleeper};

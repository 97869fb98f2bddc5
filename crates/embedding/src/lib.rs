//! Text to vector plumbing for catalog search.
//!
//! Everything that talks to an embedding provider lives here. The
//! [`EmbeddingsClient`] is the front door: it checks the [`EmbeddingCache`]
//! first, sends whatever is left to the provider in chunks of `batch_size`,
//! retries a transient failure once, L2-normalizes what comes back and caches
//! it. Provider trouble never turns into an error for the caller. A text that
//! could not be embedded simply has no vector, and search treats it as "no
//! match".
//!
//! Two providers ship with the crate:
//!
//! - [`GeminiProvider`]: the real thing, `batchEmbedContents` over HTTPS.
//! - [`StubProvider`]: hashed bag-of-words vectors for offline runs and tests.
//!
//! ```no_run
//! use embedding::{EmbeddingConfig, EmbeddingsClient};
//!
//! # async fn demo() -> Result<(), embedding::EmbeddingError> {
//! let client = EmbeddingsClient::from_config(&EmbeddingConfig::stub())?;
//! let vector = client.embed("waterproof hiking boots").await;
//! assert!(vector.is_some());
//! # Ok(())
//! # }
//! ```

mod api;
mod cache;
mod client;
mod config;
mod error;
mod normalize;
mod provider;
mod retry;
mod serde_millis;
mod stub;
mod types;

pub use api::GeminiProvider;
pub use cache::{cache_key, EmbeddingCache};
pub use client::{CacheStats, EmbeddingsClient};
pub use config::{EmbeddingConfig, ProviderKind};
pub use error::{EmbeddingError, ProviderFailure};
pub use provider::{EmbeddingProvider, ProviderResult};
pub use retry::{execute_with_retry, RetryConfig, RetryOutcome};
pub use stub::StubProvider;
pub use types::Embedding;

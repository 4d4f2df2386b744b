//! Completion provider implementations.

pub mod gemini;
pub mod shared;

use futures_util::future::BoxFuture;
pub use shared::{
    ERROR_MARKER, ProviderError, ProviderErrorKind, ProviderResult, is_error_text,
    resolve_api_key, resolve_base_url,
};

/// A request/response text completion backend.
///
/// Implementations never stream: the future resolves once with the full
/// answer, or with a classified [`ProviderError`].
pub trait CompletionProvider: Send + Sync {
    fn complete<'a>(&'a self, prompt: &'a str) -> BoxFuture<'a, ProviderResult<String>>;
}

pub mod fireworks;
pub mod mock;

use std::sync::Arc;

use bytes::Bytes;
use futures_util::future::BoxFuture;
use futures_util::stream::BoxStream;

use crate::config::UpstreamConfig;
use crate::error::PlaygroundError;
use crate::observability::mask_api_key;
use crate::protocol::{ChatCompletionRequest, ModelDescriptor};
use crate::transport::HttpTransport;

pub use fireworks::FireworksClient;
pub use mock::{MockFireworks, MockTiming};

/// Raw SSE bytes from an upstream chat completion.
pub type ByteStream = BoxStream<'static, Result<Bytes, PlaygroundError>>;

/// Hosted model API used by the routes.
pub trait ModelApi: Send + Sync {
    /// Models offered by the upstream.
    fn list_models(&self) -> BoxFuture<'_, Result<Vec<ModelDescriptor>, PlaygroundError>>;

    /// Start a streaming chat completion and return the response body stream.
    fn chat_completion_stream(
        &self,
        request: ChatCompletionRequest,
    ) -> BoxFuture<'_, Result<ByteStream, PlaygroundError>>;

    fn is_mock(&self) -> bool {
        false
    }
}

/// Select the mock or the real upstream from configuration.
///
/// A missing credential does not fail here: the real client reports it on
/// every call instead.
#[must_use]
pub fn build_model_api(config: &UpstreamConfig, transport: HttpTransport) -> Arc<dyn ModelApi> {
    if config.mock {
        tracing::info!("using mock upstream");
        return Arc::new(MockFireworks::new(MockTiming::from_config(config)));
    }

    match config.api_key() {
        Some(key) => tracing::info!(api_key = %mask_api_key(key), base_url = %config.base_url, "using hosted upstream"),
        None => tracing::warn!("FIREWORKS_API_KEY is not configured; upstream calls will fail"),
    }
    Arc::new(FireworksClient::new(transport, config))
}

#[cfg(feature = "default-client")]
pub mod default;

use http::{Request, Response};

/// An abstract HTTP client.
///
/// All outbound protocol calls (registration, token exchange, profile fetch)
/// go through this trait so that hosts can plug in their own transport.
#[async_trait::async_trait]
pub trait HttpClient {
    async fn send_http(
        &self,
        request: Request<Vec<u8>>,
    ) -> core::result::Result<Response<Vec<u8>>, Box<dyn std::error::Error + Send + Sync + 'static>>;
}

use super::HttpClient;
use reqwest::Client;

pub struct DefaultHttpClient {
    client: Client,
}

#[async_trait::async_trait]
impl HttpClient for DefaultHttpClient {
    async fn send_http(
        &self,
        request: http::Request<Vec<u8>>,
    ) -> core::result::Result<
        http::Response<Vec<u8>>,
        Box<dyn std::error::Error + Send + Sync + 'static>,
    > {
        let response = self.client.execute(request.try_into()?).await?;
        let mut builder = http::Response::builder().status(response.status());
        for (k, v) in response.headers() {
            builder = builder.header(k, v);
        }
        builder.body(response.bytes().await?.to_vec()).map_err(Into::into)
    }
}

impl Default for DefaultHttpClient {
    fn default() -> Self {
        Self { client: reqwest::Client::new() }
    }
}

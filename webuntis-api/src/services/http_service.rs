use std::time::Duration;

use anyhow::Result;
use reqwest::{Client as HttpClient, RequestBuilder, Response};
use tower::{Service, ServiceBuilder};

use crate::util::USER_AGENT;

/// Executes prepared HTTP requests, strictly one at a time. Responsible for nothing at a higher
/// level, including the RPC envelope and authentication.
pub fn service() -> impl HttpService {
    ServiceBuilder::new()
        .concurrency_limit(1)
        .map_err(|err: reqwest::Error| anyhow::Error::from(err))
        .service_fn(|request_builder: RequestBuilder| request_builder.send())
}

pub trait HttpService: Service<RequestBuilder, Response = Response, Error = anyhow::Error> {}
impl<T: Service<RequestBuilder, Response = Response, Error = anyhow::Error>> HttpService for T {}

/// The cookie store keeps the session cookie WebUntis sets on `authenticate`.
pub(super) fn http_client() -> Result<HttpClient> {
    let client = HttpClient::builder()
        .cookie_store(true)
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(30))
        .build()?;

    Ok(client)
}

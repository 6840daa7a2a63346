use anyhow::{Context, Result, bail};
use reqwest::{Client as HttpClient, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::{Value, json};
use thiserror::Error;
use tower::{Service, ServiceBuilder, ServiceExt};
use tracing::{debug, info, warn};
use url::Url;

use crate::creds::Creds;
use crate::types::Institution;
use crate::util::{AUTHENTICATE_METHOD, rpc_url};

use super::http_service::{self, HttpService, http_client};

/// WebUntis fault code for an unknown user or a wrong password.
pub const BAD_CREDENTIALS: i64 = -8504;

/// Specialized client for the JSON-RPC endpoint of one school. Responsible for the RPC envelope
/// and authentication; the returned service is logged in.
pub async fn service(institution: Institution, creds: Creds) -> Result<impl UntisService> {
    let url = rpc_url(&institution)?;
    let http_client = http_client()?;

    let mut unauthed = rpc_service(http_client, url, http_service::service());
    authenticate(&mut unauthed, creds).await?;
    info!(%institution, "logged in to WebUntis");

    Ok(unauthed)
}

pub trait UntisService: Service<RpcRequest, Response = Value, Error = anyhow::Error> {}
impl<T: Service<RpcRequest, Response = Value, Error = anyhow::Error>> UntisService for T {}

async fn authenticate(unauthed: &mut impl UntisService, creds: Creds) -> Result<()> {
    let request = RpcRequest::new(AUTHENTICATE_METHOD, creds.authenticate_params());
    let result = unauthed.oneshot(request).await.map_err(|err| {
        if let Some(fault) = err.downcast_ref::<RpcFault>() {
            if fault.is_bad_credentials() {
                warn!(user = creds.user(), "WebUntis rejected the credentials");
            }
        }
        err.context("authentication failed")
    })?;
    check_authenticated(result)
}

fn check_authenticated(result: Value) -> Result<()> {
    let session: AuthResult =
        serde_json::from_value(result).context("authentication failed")?;

    if session.session_id.is_empty() {
        bail!("authentication failed: WebUntis returned an empty session");
    }
    debug!(person_id = ?session.person_id, "session started");
    Ok(())
}

fn rpc_service(http_client: HttpClient, url: Url, http: impl HttpService) -> impl UntisService {
    ServiceBuilder::new()
        .map_request(move |request: RpcRequest| request.request_builder(&http_client, &url))
        .service(http)
        .and_then(|response: Response| async move {
            let response = response
                .error_for_status()
                .context("WebUntis responded with an error")?;
            let envelope: RpcResponse = response
                .json()
                .await
                .context("could not parse WebUntis response")?;
            envelope.into_result()
        })
}

#[derive(Debug, Clone)]
pub struct RpcRequest {
    method: String,
    params: Value,
}

impl RpcRequest {
    pub fn new(method: &str, params: Value) -> Self {
        Self {
            method: method.to_owned(),
            params,
        }
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn params(&self) -> &Value {
        &self.params
    }

    fn envelope(&self) -> Value {
        json!({
            "id": self.method,
            "method": self.method,
            "params": self.params,
            "jsonrpc": "2.0",
        })
    }

    pub fn request_builder(&self, http_client: &HttpClient, url: &Url) -> RequestBuilder {
        http_client.post(url.clone()).json(&self.envelope())
    }
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Value,
    #[serde(default)]
    error: Option<RpcFault>,
}

impl RpcResponse {
    fn into_result(self) -> Result<Value> {
        match self.error {
            Some(fault) => Err(fault.into()),
            None => Ok(self.result),
        }
    }
}

/// Error member of a JSON-RPC response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Error)]
#[error("WebUntis error {code}: {message}")]
pub struct RpcFault {
    code: i64,
    message: String,
}

impl RpcFault {
    pub fn code(&self) -> i64 {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_bad_credentials(&self) -> bool {
        self.code == BAD_CREDENTIALS
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthResult {
    session_id: String,
    #[serde(default)]
    person_id: Option<u64>,
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use tower::service_fn;

    use super::*;

    #[test]
    fn envelope_is_json_rpc_2() {
        let request = RpcRequest::new("getKlassen", json!({}));
        assert_eq!(
            request.envelope(),
            json!({
                "id": "getKlassen",
                "method": "getKlassen",
                "params": {},
                "jsonrpc": "2.0",
            })
        );
    }

    #[test]
    fn fault_takes_precedence_over_result() {
        let response: RpcResponse = serde_json::from_value(json!({
            "id": "getStudents",
            "jsonrpc": "2.0",
            "error": { "code": -8520, "message": "not authenticated" },
        }))
        .unwrap();

        let err = response.into_result().unwrap_err();
        let fault = err.downcast_ref::<RpcFault>().unwrap();
        assert_eq!(fault.code(), -8520);
        assert_eq!(fault.message(), "not authenticated");
        assert_eq!(err.to_string(), "WebUntis error -8520: not authenticated");
    }

    #[test]
    fn missing_result_is_null() {
        let response: RpcResponse =
            serde_json::from_value(json!({ "id": "logout", "jsonrpc": "2.0" })).unwrap();
        assert_eq!(response.into_result().unwrap(), Value::Null);
    }

    #[test]
    fn session_id_is_required() {
        assert!(check_authenticated(json!({ "sessionId": "ABC123", "personId": 7 })).is_ok());
        assert!(check_authenticated(json!({ "sessionId": "" })).is_err());
        assert!(check_authenticated(json!({ "personType": 2 })).is_err());
    }

    #[tokio::test]
    async fn authenticate_sends_credentials_and_client_name() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let recorder = seen.clone();
        let mut service = service_fn(move |request: RpcRequest| {
            recorder.lock().unwrap().push(request);
            async { Ok::<_, anyhow::Error>(json!({ "sessionId": "ABC123" })) }
        });

        let creds = Creds::new("lehrer".to_owned(), "geheim".to_owned());
        authenticate(&mut service, creds).await.unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].method(), "authenticate");
        assert_eq!(
            seen[0].params(),
            &json!({ "user": "lehrer", "password": "geheim", "client": "FehlzeitenTool" })
        );
    }

    #[tokio::test]
    async fn bad_credentials_fail_authentication() {
        let mut service = service_fn(|_: RpcRequest| async {
            Err::<Value, _>(anyhow::Error::from(RpcFault {
                code: BAD_CREDENTIALS,
                message: "bad credentials".to_owned(),
            }))
        });

        let creds = Creds::new("lehrer".to_owned(), "falsch".to_owned());
        let err = authenticate(&mut service, creds).await.unwrap_err();

        assert_eq!(err.to_string(), "authentication failed");
        assert!(err.downcast_ref::<RpcFault>().unwrap().is_bad_credentials());
    }
}

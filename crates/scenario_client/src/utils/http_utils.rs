use std::error::Error;
use std::sync::Arc;

use log::{error, info, warn};
use reqwest::{Client, IntoUrl, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::ApiError;

/// Executes a request with an optional JSON body.
/// No retries: a failed call is reported to the caller as is.
pub async fn execute_request<T: Serialize + ?Sized>(
    client: &Arc<Client>,
    method: Method,
    url: impl IntoUrl,
    json_body: Option<&T>,
) -> Result<Response, ApiError> {
    let url_val = url.into_url()?;
    let mut request_builder = client.request(method, url_val);
    if let Some(body) = json_body {
        request_builder = request_builder.json(body);
    }
    send_request(request_builder).await
}

/// Sends a prepared request, logging timing and transport failures.
pub async fn send_request(request_builder: RequestBuilder) -> Result<Response, ApiError> {
    let (client, request) = request_builder.build_split();
    let request = request?;
    let method = request.method().clone();
    let url_val = request.url().clone();
    info!("Sending {} request to {}", method, url_val);

    let start_time = std::time::Instant::now();
    match client.execute(request).await {
        Ok(resp) => {
            info!(
                "Got response from {} after {:?} with status {}",
                url_val,
                start_time.elapsed(),
                resp.status()
            );
            Ok(resp)
        }
        Err(e) => {
            error!("Failed HTTP request to {}: {}", url_val, e);
            if let Some(source) = e.source() {
                error!("Error source: {:?}", source);
            }
            if e.is_timeout() {
                error!("Request timed out");
            }
            if e.is_connect() {
                error!("Connection error");
            }
            Err(ApiError::Transport(e))
        }
    }
}

/// Maps a non-2xx response to an `ApiError`.
///
/// A 404 becomes `NotFound` when the endpoint names the missing resource.
pub fn check_status(
    response: Response,
    context: &'static str,
    not_found: Option<&'static str>,
) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if let (StatusCode::NOT_FOUND, Some(message)) = (status, not_found) {
        warn!("{} ({})", message, response.url());
        return Err(ApiError::NotFound(message));
    }
    warn!("{}: HTTP {} ({})", context, status, response.url());
    Err(ApiError::Status { context, status })
}

/// Reads the whole body and decodes it as JSON.
pub async fn read_json<T: DeserializeOwned>(
    response: Response,
    context: &'static str,
) -> Result<T, ApiError> {
    let body = response.bytes().await?;
    serde_json::from_slice(&body).map_err(|source| {
        error!(
            "{}: could not decode body {}",
            context,
            String::from_utf8_lossy(&body)
        );
        ApiError::Decode { context, source }
    })
}

//! HTTP request handler for the flat-parameter RPC contract
//!
//! Every request that reaches the handler is answered with a JSON-RPC
//! response document and status 200. Transport-level failures (unreadable
//! or oversized bodies) are the only non-200 answers.

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::header::CONTENT_TYPE;
use hyper::{Method, Request, Response, StatusCode};
use tracing::{debug, error, warn};

use arity_json_rpc::{
    Dispatcher, LifecycleEvent, LifecycleObserver, LifecyclePhase, RpcConfig, RpcRequest,
    RpcResponse, wrap_jsonp,
};

use crate::server::ServerConfig;

/// Flat parameter that switches on pretty-printed output.
const DEBUG_PARAM: &str = "debug";
/// Flat parameter naming the JSONP callback.
const CALLBACK_PARAM: &str = "callback";

/// HTTP handler for RPC requests
#[derive(Clone)]
pub struct RpcHttpHandler {
    config: ServerConfig,
    rpc_config: RpcConfig,
    dispatcher: Arc<Dispatcher>,
    observers: Arc<Vec<Arc<dyn LifecycleObserver>>>,
}

impl RpcHttpHandler {
    /// Create a new handler
    pub fn new(
        config: ServerConfig,
        rpc_config: RpcConfig,
        dispatcher: Arc<Dispatcher>,
        observers: Vec<Arc<dyn LifecycleObserver>>,
    ) -> Self {
        Self {
            config,
            rpc_config,
            dispatcher,
            observers: Arc::new(observers),
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn rpc_config(&self) -> &RpcConfig {
        &self.rpc_config
    }

    pub(crate) fn fire(&self, event: LifecycleEvent<'_>) {
        for observer in self.observers.iter() {
            observer.observe(&event);
        }
    }

    /// Handle one RPC-endpoint request.
    ///
    /// Generic over the body type so tests can drive it with prebuilt
    /// bodies; the server feeds it `hyper::body::Incoming`.
    pub async fn handle<B>(&self, req: Request<B>) -> Response<Full<Bytes>>
    where
        B: http_body::Body,
        B::Error: std::fmt::Display,
    {
        let method = req.method().clone();
        let query = req.uri().query().map(str::to_string);
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|ct| ct.to_str().ok())
            .unwrap_or("")
            .to_string();

        // Read request body
        let body_bytes = match req.into_body().collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(err) => {
                error!("Failed to read request body: {}", err);
                return plain(StatusCode::BAD_REQUEST, "Failed to read request body");
            }
        };

        if body_bytes.len() > self.config.max_body_size {
            warn!("Request body too large: {} bytes", body_bytes.len());
            return plain(StatusCode::PAYLOAD_TOO_LARGE, "Request body too large");
        }

        // Flat parameters: query string first, then a form-encoded body.
        // The first value seen for a key wins.
        let mut flat = HashMap::new();
        if let Some(query) = &query {
            collect_pairs(query.as_bytes(), &mut flat);
        }

        let mut body_envelope = None;
        if method == Method::POST && !body_bytes.is_empty() {
            if content_type.starts_with("application/x-www-form-urlencoded") {
                collect_pairs(&body_bytes, &mut flat);
            } else if content_type.starts_with("application/json") {
                match std::str::from_utf8(&body_bytes) {
                    Ok(text) => body_envelope = Some(text.to_string()),
                    Err(err) => {
                        error!("Invalid UTF-8 in request body: {}", err);
                        return plain(StatusCode::BAD_REQUEST, "Request body must be valid UTF-8");
                    }
                }
            } else {
                debug!(
                    "ignoring {} byte body with content type [{}]",
                    body_bytes.len(),
                    content_type
                );
            }
        }

        let text = self.serve(&flat, body_envelope.as_deref());
        Response::builder()
            .status(StatusCode::OK)
            .header(CONTENT_TYPE, "text/plain")
            .body(Full::new(Bytes::from(text)))
            .unwrap()
    }

    /// Run the dispatch pipeline over assembled parameters and render the
    /// response text, JSONP-wrapped and newline-terminated.
    ///
    /// `body_envelope` is consulted only when no `json` or `data` flat
    /// parameter carries an envelope.
    pub fn serve(&self, flat: &HashMap<String, String>, body_envelope: Option<&str>) -> String {
        self.fire(LifecycleEvent::new(LifecyclePhase::BeforeRequest).with_config(&self.rpc_config));

        let envelope = RpcRequest::envelope_param(flat).or(body_envelope);
        let mut response = RpcResponse::new();

        match RpcRequest::normalize(envelope, flat) {
            Ok(request) => {
                self.fire(LifecycleEvent::new(LifecyclePhase::AfterRequest).with_request(&request));
                if let Some(id) = request.id() {
                    response.set_id(id);
                }
                match self.dispatcher.dispatch(&request) {
                    Ok(result) => response.set_result(result),
                    Err(err) => {
                        debug!("dispatch failed: {}", err);
                        response.set_error(err.to_error_object());
                        self.fire(
                            LifecycleEvent::new(LifecyclePhase::Exception).with_response(&response),
                        );
                    }
                }
            }
            Err(err) => {
                debug!("request failed to normalize: {}", err);
                response.set_error(err.to_error_object());
                self.fire(LifecycleEvent::new(LifecyclePhase::Exception).with_response(&response));
            }
        }

        if !self.rpc_config.detailed_errors {
            response.sanitize_error();
        }
        self.fire(LifecycleEvent::new(LifecyclePhase::BeforeResponse).with_response(&response));

        let pretty = flat.get(DEBUG_PARAM).is_some_and(|v| v == "true");
        let rendered = response.render(pretty);
        let callback = flat.get(CALLBACK_PARAM).map(String::as_str);
        let mut text = wrap_jsonp(&rendered, callback).into_owned();
        text.push('\n');

        self.fire(LifecycleEvent::new(LifecyclePhase::AfterResponse).with_response(&response));
        text
    }
}

/// Decode percent-encoded pairs into the flat map, keeping the first value
/// seen for each key.
fn collect_pairs(raw: &[u8], flat: &mut HashMap<String, String>) {
    for (key, value) in url::form_urlencoded::parse(raw) {
        flat.entry(key.into_owned())
            .or_insert_with(|| value.into_owned());
    }
}

fn plain(status: StatusCode, message: &'static str) -> Response<Full<Bytes>> {
    Response::builder()
        .status(status)
        .body(Full::new(Bytes::from(message)))
        .unwrap()
}

//! Handler-level tests driving the full request pipeline
//!
//! These build the handler directly with prebuilt bodies, covering
//! parameter assembly from the query string and both body encodings,
//! rendering options and observer ordering.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use http::Request;
use http_body_util::{BodyExt, Full};
use hyper::StatusCode;
use hyper::header::CONTENT_TYPE;
use serde_json::{Value, json};

use arity_json_rpc::{
    Dispatcher, Fault, LifecycleEvent, LifecycleObserver, MethodRegistry, ParamType, RpcConfig,
    UnitBuilder, UnitDef,
};

use crate::handler::RpcHttpHandler;
use crate::server::ServerConfig;

fn calculator() -> UnitDef {
    UnitBuilder::new("calculator")
        .static_method("add", &[ParamType::Float, ParamType::Float], "float", |args| {
            Ok(json!(args.float(0)? + args.float(1)?))
        })
        .static_method("crash", &[], "string", |_args| {
            Err(Fault::new("index out of bounds").with_detail(json!("frame 3")))
        })
        .build()
}

fn handler_with(
    config: ServerConfig,
    rpc_config: RpcConfig,
    observers: Vec<Arc<dyn LifecycleObserver>>,
) -> RpcHttpHandler {
    let catalog = vec![calculator()];
    let registry = Arc::new(MethodRegistry::build(&catalog, &rpc_config).unwrap());
    let dispatcher = Arc::new(Dispatcher::new(
        Arc::clone(&registry),
        rpc_config.expose_methods,
    ));
    RpcHttpHandler::new(config, rpc_config, dispatcher, observers)
}

fn test_handler() -> RpcHttpHandler {
    handler_with(
        ServerConfig::default(),
        RpcConfig::default().with_units(["calculator"]),
        Vec::new(),
    )
}

fn get(uri: &str) -> Request<Full<Bytes>> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Full::new(Bytes::new()))
        .unwrap()
}

fn post(uri: &str, content_type: &str, body: &str) -> Request<Full<Bytes>> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(CONTENT_TYPE, content_type)
        .body(Full::new(Bytes::from(body.to_string())))
        .unwrap()
}

async fn body_text(response: http::Response<Full<Bytes>>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_get_query_dispatch() {
    let handler = test_handler();
    let response = handler
        .handle(get("/rpc?method=add&params=%5B1.5%2C2.25%5D&id=42"))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[CONTENT_TYPE], "text/plain");

    let text = body_text(response).await;
    assert!(text.ends_with('\n'));
    let parsed: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(parsed, json!({"id": "42", "result": 3.75}));
}

#[tokio::test]
async fn test_post_form_dispatch() {
    let handler = test_handler();
    let response = handler
        .handle(post(
            "/rpc",
            "application/x-www-form-urlencoded",
            "method=add&params=%5B1%2C2%5D",
        ))
        .await;

    let parsed: Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(parsed, json!({"id": null, "result": 3.0}));
}

#[tokio::test]
async fn test_post_json_body_as_envelope() {
    let handler = test_handler();
    let response = handler
        .handle(post(
            "/rpc",
            "application/json",
            r#"{"id":"7","method":"add","params":[2,3]}"#,
        ))
        .await;

    let parsed: Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(parsed, json!({"id": "7", "result": 5.0}));
}

#[tokio::test]
async fn test_flat_envelope_param_wins_over_json_body() {
    let handler = test_handler();
    // query: json={"id":"q","method":"add","params":[1,1]}
    let uri = "/rpc?json=%7B%22id%22%3A%22q%22%2C%22method%22%3A%22add%22%2C%22params%22%3A%5B1%2C1%5D%7D";
    let response = handler
        .handle(post(uri, "application/json", r#"{"id":"b","method":"crash"}"#))
        .await;

    let parsed: Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(parsed, json!({"id": "q", "result": 2.0}));
}

#[tokio::test]
async fn test_query_wins_over_form_body() {
    let handler = test_handler();
    let response = handler
        .handle(post(
            "/rpc?method=add&params=%5B1%2C2%5D",
            "application/x-www-form-urlencoded",
            "method=crash",
        ))
        .await;

    let parsed: Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(parsed["result"], json!(3.0));
}

#[tokio::test]
async fn test_debug_param_pretty_prints() {
    let handler = test_handler();
    let response = handler
        .handle(get("/rpc?method=add&params=%5B1%2C2%5D&debug=true"))
        .await;

    let text = body_text(response).await;
    assert!(text.contains("\n  "));
    let parsed: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(parsed["result"], json!(3.0));
}

#[tokio::test]
async fn test_callback_param_wraps_response() {
    let handler = test_handler();
    let response = handler
        .handle(get("/rpc?method=add&params=%5B1%2C2%5D&callback=render"))
        .await;

    let text = body_text(response).await;
    assert!(text.starts_with("render("));
    assert!(text.ends_with(")\n"));

    let inner = &text["render(".len()..text.len() - 2];
    let parsed: Value = serde_json::from_str(inner).unwrap();
    assert_eq!(parsed["result"], json!(3.0));
}

#[tokio::test]
async fn test_oversized_body_is_rejected() {
    let config = ServerConfig {
        max_body_size: 8,
        ..ServerConfig::default()
    };
    let handler = handler_with(
        config,
        RpcConfig::default().with_units(["calculator"]),
        Vec::new(),
    );
    let response = handler
        .handle(post(
            "/rpc",
            "application/x-www-form-urlencoded",
            "method=add&params=%5B1%2C2%5D",
        ))
        .await;

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_malformed_json_body_reports_parse_error() {
    let handler = test_handler();
    let response = handler.handle(post("/rpc", "application/json", "{not json")).await;

    assert_eq!(response.status(), StatusCode::OK);
    let parsed: Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(parsed["id"], Value::Null);
    assert_eq!(parsed["error"]["code"], json!(-32700));
}

#[tokio::test]
async fn test_fault_detail_passes_through_when_detailed() {
    let handler = test_handler();
    let response = handler.handle(get("/rpc?method=crash&params=%5B%5D")).await;

    let parsed: Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(parsed["error"]["code"], json!(-32603));
    assert_eq!(parsed["error"]["message"], json!("index out of bounds"));
    assert_eq!(parsed["error"]["data"], json!("frame 3"));
}

#[tokio::test]
async fn test_errors_sanitized_when_detailed_off() {
    let mut rpc_config = RpcConfig::default().with_units(["calculator"]);
    rpc_config.detailed_errors = false;
    let handler = handler_with(ServerConfig::default(), rpc_config, Vec::new());

    let response = handler.handle(get("/rpc?method=crash&params=%5B%5D")).await;
    let parsed: Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(parsed["error"]["code"], json!(-32603));
    assert_eq!(parsed["error"]["message"], json!("Internal error"));
    assert!(parsed["error"].get("data").is_none());
}

struct PhaseRecorder {
    codes: Mutex<Vec<u32>>,
}

impl LifecycleObserver for PhaseRecorder {
    fn observe(&self, event: &LifecycleEvent<'_>) {
        self.codes.lock().unwrap().push(event.code());
    }
}

#[test]
fn test_observer_sees_phases_in_order() {
    let recorder = Arc::new(PhaseRecorder {
        codes: Mutex::new(Vec::new()),
    });
    let handler = handler_with(
        ServerConfig::default(),
        RpcConfig::default().with_units(["calculator"]),
        vec![recorder.clone()],
    );

    let mut flat = HashMap::new();
    flat.insert("method".to_string(), "add".to_string());
    flat.insert("params".to_string(), "[1,2]".to_string());
    handler.serve(&flat, None);

    assert_eq!(*recorder.codes.lock().unwrap(), vec![20, 30, 40, 50]);
}

#[test]
fn test_observer_sees_exception_phase() {
    let recorder = Arc::new(PhaseRecorder {
        codes: Mutex::new(Vec::new()),
    });
    let handler = handler_with(
        ServerConfig::default(),
        RpcConfig::default().with_units(["calculator"]),
        vec![recorder.clone()],
    );

    let mut flat = HashMap::new();
    flat.insert("method".to_string(), "crash".to_string());
    flat.insert("params".to_string(), "[]".to_string());
    handler.serve(&flat, None);

    assert_eq!(*recorder.codes.lock().unwrap(), vec![20, 30, 60, 40, 50]);
}

//! Calculator RPC Server
//!
//! A runnable server exposing an arithmetic unit and a stateful counter unit
//! over HTTP, callable with flat parameters or full JSON-RPC envelopes.
//!
//! Usage:
//! ```bash
//! # Default (port 8080, both units, introspection on)
//! RUST_LOG=info cargo run --package calculator-server
//!
//! # Hide the method listing and sanitize error responses
//! cargo run --package calculator-server -- --expose-methods false --detailed-errors false
//!
//! # Fresh counter instance per call
//! cargo run --package calculator-server -- --persist-class false
//! ```
//!
//! Try it:
//! ```bash
//! curl 'http://127.0.0.1:8080/rpc?method=add&params=%5B1.5,2.25%5D'
//! curl 'http://127.0.0.1:8080/rpc?method=hits'
//! curl -X POST http://127.0.0.1:8080/rpc \
//!   -H 'Content-Type: application/json' \
//!   -d '{"id":"1","method":"list","params":[1,2,3]}'
//! curl 'http://127.0.0.1:8080/rpc?debug=true&callback=render'
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use anyhow::Result;
use clap::Parser;
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use arity_http_server::RpcHttpServer;
use arity_json_rpc::{
    LifecycleEvent, LifecycleObserver, LifecyclePhase, ParamType, RpcConfig, UnitBuilder, UnitDef,
};

/// Command-line arguments for the calculator server
#[derive(Parser, Debug)]
#[command(name = "calculator-server")]
#[command(about = "Flat-parameter JSON-RPC server with example calculator units")]
struct Args {
    /// Port to bind the server to
    #[arg(short, long, default_value = "8080")]
    port: u16,

    /// Path of the RPC endpoint
    #[arg(long, default_value = "/rpc")]
    path: String,

    /// Comma-separated names of the units to register
    #[arg(long, default_value = "calculator,counter")]
    units: String,

    /// Serve the method listing when no method is supplied (true/false)
    #[arg(long, default_value = "true")]
    expose_methods: String,

    /// Keep fault messages and detail in error responses (true/false)
    #[arg(long, default_value = "true")]
    detailed_errors: String,

    /// Share one constructed instance per unit across calls (true/false)
    #[arg(long, default_value = "true")]
    persist_class: String,
}

/// The arithmetic unit. All methods are stateless; `dump` declares a
/// non-remotable parameter, so registration skips it.
fn calculator() -> UnitDef {
    UnitBuilder::new("calculator")
        .static_method("test", &[], "string", |_args| Ok(json!("test successful")))
        .static_method(
            "add",
            &[ParamType::Float, ParamType::Float],
            "float",
            |args| Ok(json!(args.float(0)? + args.float(1)?)),
        )
        .static_method(
            "sub",
            &[ParamType::Float, ParamType::Float],
            "float",
            |args| Ok(json!(args.float(0)? - args.float(1)?)),
        )
        .static_method(
            "list",
            &[ParamType::Int, ParamType::Int, ParamType::Int],
            "string",
            |args| {
                Ok(json!(format!(
                    "a:{} b:{} c:{}",
                    args.int(0)?,
                    args.int(1)?,
                    args.int(2)?
                )))
            },
        )
        .static_method("echo", &[ParamType::Str], "string", |args| {
            Ok(json!(args.str(0)?))
        })
        .static_method("describe", &[ParamType::Object], "string", |args| {
            let compact = Value::Object(args.object(0)?.clone()).to_string();
            Ok(json!(urlencoding::encode(&compact).into_owned()))
        })
        .static_method("echo_obj", &[ParamType::Object], "object", |args| {
            Ok(Value::Object(args.object(0)?.clone()))
        })
        .static_method(
            "dump",
            &[ParamType::Unsupported("writer")],
            "void",
            |_args| Ok(Value::Null),
        )
        .build()
}

/// Stateful unit showing instance persistence: with persistence on, one
/// counter survives across calls; with it off every call starts from zero.
fn counter() -> UnitDef {
    UnitBuilder::with_constructor("counter", || {
        debug!("constructing counter state");
        Ok(AtomicI64::new(0))
    })
    .method("hits", &[], "long", |state, _args| {
        Ok(json!(state.fetch_add(1, Ordering::SeqCst) + 1))
    })
    .method("reset", &[], "long", |state, _args| {
        Ok(json!(state.swap(0, Ordering::SeqCst)))
    })
    .build()
}

/// Logs every lifecycle phase; failed calls get promoted to warnings.
struct LogObserver;

impl LifecycleObserver for LogObserver {
    fn observe(&self, event: &LifecycleEvent<'_>) {
        match event.phase {
            LifecyclePhase::Exception => {
                if let Some(error) = event.response.and_then(|r| r.error()) {
                    warn!("call failed (phase {}): {}", event.code(), error.message);
                }
            }
            LifecyclePhase::AfterRequest => {
                if let Some(request) = event.request {
                    debug!(
                        "phase {}: method={:?} params={}",
                        event.code(),
                        request.method(),
                        request.params().shape()
                    );
                }
            }
            _ => debug!("phase {}", event.code()),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .init();

    let mut params = HashMap::new();
    params.insert("units".to_string(), args.units);
    params.insert("expose_methods".to_string(), args.expose_methods);
    params.insert("detailed_errors".to_string(), args.detailed_errors);
    params.insert("persist_class".to_string(), args.persist_class);
    let rpc_config = RpcConfig::from_params(&params);

    let bind_address: std::net::SocketAddr = format!("127.0.0.1:{}", args.port).parse()?;
    info!(
        "Starting calculator RPC server on http://{}{}",
        bind_address, args.path
    );

    let server = RpcHttpServer::builder()
        .bind_address(bind_address)
        .rpc_path(args.path)
        .rpc_config(rpc_config)
        .unit(calculator())
        .unit(counter())
        .observer(Arc::new(LogObserver))
        .build()?;

    server.run().await?;

    Ok(())
}

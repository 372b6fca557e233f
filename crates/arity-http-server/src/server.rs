//! HTTP server wiring for the RPC endpoint
//!
//! Binds a TCP listener and serves the configured endpoint over HTTP/1.1.
//! All dispatch state is fixed at build time, so the running server is
//! cheap to clone into per-connection tasks.

use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::Full;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use tracing::{debug, error, info};

use arity_json_rpc::{
    Dispatcher, LifecycleEvent, LifecycleObserver, LifecyclePhase, MethodRegistry, RpcConfig,
    UnitDef,
};

use crate::Result;
use crate::handler::RpcHttpHandler;

/// Configuration for the HTTP RPC server
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to
    pub bind_address: SocketAddr,
    /// Path for the RPC endpoint
    pub rpc_path: String,
    /// Maximum request body size
    pub max_body_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8080".parse().unwrap(),
            rpc_path: "/rpc".to_string(),
            max_body_size: 1024 * 1024, // 1MB
        }
    }
}

/// Builder for the HTTP RPC server
pub struct RpcHttpServerBuilder {
    config: ServerConfig,
    rpc_config: RpcConfig,
    catalog: Vec<UnitDef>,
    observers: Vec<Arc<dyn LifecycleObserver>>,
}

impl RpcHttpServerBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            config: ServerConfig::default(),
            rpc_config: RpcConfig::default(),
            catalog: Vec::new(),
            observers: Vec::new(),
        }
    }

    /// Set the bind address
    pub fn bind_address(mut self, addr: SocketAddr) -> Self {
        self.config.bind_address = addr;
        self
    }

    /// Set the RPC endpoint path
    pub fn rpc_path(mut self, path: impl Into<String>) -> Self {
        self.config.rpc_path = path.into();
        self
    }

    /// Set maximum request body size
    pub fn max_body_size(mut self, size: usize) -> Self {
        self.config.max_body_size = size;
        self
    }

    /// Set the dispatch configuration
    pub fn rpc_config(mut self, config: RpcConfig) -> Self {
        self.rpc_config = config;
        self
    }

    /// Add a unit to the catalog the dispatch configuration selects from
    pub fn unit(mut self, unit: UnitDef) -> Self {
        self.catalog.push(unit);
        self
    }

    /// Add a lifecycle observer
    pub fn observer(mut self, observer: Arc<dyn LifecycleObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    /// Build the server, registering every configured unit.
    ///
    /// Fails when the registry comes up empty; a server with no callable
    /// methods refuses to start.
    pub fn build(self) -> Result<RpcHttpServer> {
        let registry = Arc::new(MethodRegistry::build(&self.catalog, &self.rpc_config)?);
        let dispatcher = Arc::new(Dispatcher::new(
            Arc::clone(&registry),
            self.rpc_config.expose_methods,
        ));

        let handler =
            RpcHttpHandler::new(self.config.clone(), self.rpc_config, dispatcher, self.observers);
        handler.fire(LifecycleEvent::new(LifecyclePhase::Init).with_config(handler.rpc_config()));

        Ok(RpcHttpServer { config: self.config, handler })
    }
}

impl Default for RpcHttpServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// HTTP RPC server
#[derive(Clone)]
pub struct RpcHttpServer {
    config: ServerConfig,
    handler: RpcHttpHandler,
}

impl RpcHttpServer {
    /// Create a new builder
    pub fn builder() -> RpcHttpServerBuilder {
        RpcHttpServerBuilder::new()
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// The endpoint handler, for embedding in an existing server.
    pub fn handler(&self) -> &RpcHttpHandler {
        &self.handler
    }

    /// Run the server
    pub async fn run(&self) -> Result<()> {
        let listener = TcpListener::bind(&self.config.bind_address).await?;
        info!("HTTP RPC server listening on {}", self.config.bind_address);
        info!("RPC endpoint available at: {}", self.config.rpc_path);

        loop {
            let (stream, peer_addr) = listener.accept().await?;
            debug!("New connection from {}", peer_addr);

            let handler = self.handler.clone();
            tokio::spawn(async move {
                let io = TokioIo::new(stream);
                let service = service_fn(move |req| handle_request(req, handler.clone()));

                if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                    // Client disconnects surface here as errors; keep them at debug.
                    let err_str = err.to_string();
                    if err_str.contains("connection closed before message completed") {
                        debug!("Client disconnected (normal): {}", err);
                    } else {
                        error!("Error serving connection: {}", err);
                    }
                }
            });
        }
    }
}

/// Route one request: only the RPC endpoint exists, and only for GET and POST.
pub(crate) async fn handle_request<B>(
    req: Request<B>,
    handler: RpcHttpHandler,
) -> std::result::Result<Response<Full<Bytes>>, hyper::Error>
where
    B: http_body::Body,
    B::Error: std::fmt::Display,
{
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    debug!("Handling {} {}", method, path);

    if path != handler.config().rpc_path {
        return Ok(Response::builder()
            .status(StatusCode::NOT_FOUND)
            .body(Full::new(Bytes::from("Not found")))
            .unwrap());
    }

    if method != Method::GET && method != Method::POST {
        return Ok(Response::builder()
            .status(StatusCode::METHOD_NOT_ALLOWED)
            .header(hyper::header::ALLOW, "GET, POST")
            .body(Full::new(Bytes::from("Method not allowed")))
            .unwrap());
    }

    Ok(handler.handle(req).await)
}

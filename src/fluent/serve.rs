//! Serving a sealed dispatcher over HTTP with Axum.
//!
//! The dispatcher is mounted as the single fallback of an `axum::Router`, so
//! every request reaches [`Dispatcher::resolve`] and route matching stays in
//! this crate. The host adds what the dispatch core leaves to the process
//! boundary:
//!
//! 1. **Request ID** - preserved from `x-request-id` or generated (UUIDv7), and echoed back
//! 2. **Logging** - a `tower-http` trace span per request carrying the request id
//! 3. **Timeout** - `408 Request Timeout` when `http.request_timeout` is set
//! 4. **Body limit** - `413 Payload Too Large` above `http.max_payload_size_bytes`
//! 5. **Panic isolation** - a panicking handler yields `500` instead of killing the connection
//!
//! Dispatch is synchronous, so each request runs on tokio's blocking pool.

use {
    super::{
        dispatch::Dispatcher,
        request::Request,
        response::{BufferedResponse, Reply},
        shutdown::{ShutdownPhase, shutdown_signal},
    },
    crate::{Error, Result, utils::RequestIdGenerator},
    axum::{
        Router,
        body::Body,
        extract::State,
        response::{IntoResponse, Response},
    },
    http::StatusCode,
    std::{net::SocketAddr, sync::Arc},
    tokio::net::TcpListener,
    tower_http::{
        request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
        timeout::TimeoutLayer,
        trace::TraceLayer,
    },
};

impl Dispatcher {
    /// Wraps the dispatcher in an `axum::Router` with the host layers applied.
    ///
    /// ```rust
    /// use kiwi_dispatch::{Config, FluentRouter, Reply, ResponseSink};
    /// use http::StatusCode;
    ///
    /// # fn main() -> kiwi_dispatch::Result<()> {
    /// let mut router = FluentRouter::new("".parse::<Config>()?)?;
    /// router.get("/ping", |_, res| {
    ///     res.send(Reply::text(StatusCode::OK, "pong"));
    /// }, ())?;
    /// let app: axum::Router = router.seal()?.into_axum_router();
    /// # Ok(())
    /// # }
    /// ```
    pub fn into_axum_router(self) -> Router {
        let request_timeout = self.config.http.request_timeout;

        let mut router = Router::new()
            .fallback(dispatch)
            .with_state(Arc::new(self));

        if let Some(timeout) = request_timeout {
            router = router.layer(TimeoutLayer::with_status_code(
                StatusCode::REQUEST_TIMEOUT,
                timeout,
            ));
        }

        router
            .layer(
                TraceLayer::new_for_http().make_span_with(|request: &http::Request<Body>| {
                    let request_id = request
                        .headers()
                        .get("x-request-id")
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("unknown");

                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = %request_id,
                    )
                }),
            )
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(RequestIdGenerator))
    }

    /// Binds `http.bind_addr:http.bind_port` and serves until shutdown.
    ///
    /// Shutdown starts on Ctrl+C, SIGTERM, or when the router's cancellation
    /// token is cancelled. In-flight requests then get `http.shutdown_timeout`
    /// to drain.
    pub async fn start(self) -> Result<()> {
        let bind_addr = self.config.http.full_bind_addr();
        let listener = TcpListener::bind(&bind_addr).await?;
        tracing::info!("Bound to {}", &bind_addr);
        self.serve(listener).await
    }

    /// Serves on an already bound listener until shutdown. See [`Dispatcher::start`].
    ///
    /// Handlers see the peer address through [`Request::client_addr`].
    pub async fn serve(self, listener: TcpListener) -> Result<()> {
        let shutdown_timeout = self.config.http.shutdown_timeout;
        let notifier = self.shutdown_notifier.clone();
        let mut shutdown_rx = notifier.subscribe();

        tracing::info!("Waiting for connections");
        let app = self
            .into_axum_router()
            .into_make_service_with_connect_info::<SocketAddr>();
        let serve_future = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal(shutdown_timeout, notifier.clone()));

        // The grace period only starts counting once shutdown has been initiated.
        tokio::select! {
            result = serve_future => {
                tracing::info!("Graceful shutdown completed");
                result?;
            }
            _ = async {
                loop {
                    match shutdown_rx.recv().await {
                        Ok(ShutdownPhase::Initiated) => break,
                        Ok(_) => continue,
                        Err(_) => return,
                    }
                }
                tokio::time::sleep(shutdown_timeout).await;
            } => {
                tracing::warn!("Graceful shutdown timeout expired, forcing shutdown");
                notifier.emit(ShutdownPhase::GracePeriodEnded);
            }
        }

        Ok(())
    }
}

async fn dispatch(
    State(dispatcher): State<Arc<Dispatcher>>,
    request: axum::extract::Request,
) -> Response {
    let (parts, body) = request.into_parts();
    let body = match axum::body::to_bytes(body, dispatcher.config.http.body_limit()).await {
        Ok(body) => body,
        Err(err) => {
            tracing::warn!(error = %err, "Rejected request body");
            return Reply::text(StatusCode::PAYLOAD_TOO_LARGE, "Payload Too Large").into_response();
        }
    };

    let request = Request::from_parts(&parts, body);
    let task = tokio::task::spawn_blocking(move || {
        let mut sink = BufferedResponse::new();
        dispatcher.resolve(request, &mut sink);
        sink
    });

    match task.await {
        Ok(sink) => sink.into_response(),
        Err(err) => Error::internal(format!("Dispatch failed: {err}")).into_response(),
    }
}

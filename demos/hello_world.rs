//! Hello World Example
//!
//! The simplest possible kiwi-dispatch application.
//!
//! Run with:
//! ```bash
//! cargo run --example hello_world
//! ```
//!
//! Then test:
//! ```bash
//! curl http://localhost:3000/
//! curl http://localhost:3000/hello/ada
//! curl http://localhost:3000/debug/routes
//! ```

use http::StatusCode;
use kiwi_dispatch::{Config, FluentRouter, Reply, ResponseSink, Result};
use serde::Serialize;

#[derive(Serialize)]
struct Message {
    message: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration from inline string
    // In production, use Config::default() to load from config/{RUST_ENV}.toml
    let config: Config = r#"
[http]
bind_addr = "127.0.0.1"
bind_port = 3000
max_payload_size_bytes = "1MiB"
request_timeout = "30s"

[router]
routes_endpoint = "/debug/routes"

[logging]
format = "default"
"#
    .parse()?;

    // Setup logging based on config
    config.setup_tracing();

    println!("Starting server on http://127.0.0.1:3000");

    let mut router = FluentRouter::new(config)?;
    router.get(
        "/",
        |_, res| {
            res.send(Reply::json(
                StatusCode::OK,
                &Message {
                    message: "Hello, World!".into(),
                },
            ));
        },
        (),
    )?;
    router.get(
        "/hello/:name",
        |request, res| {
            let name = request.param("name").unwrap_or("stranger");
            res.send(Reply::json(
                StatusCode::OK,
                &Message {
                    message: format!("Hello, {name}!"),
                },
            ));
        },
        (),
    )?;

    router.seal()?.start().await
}

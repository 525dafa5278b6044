//! Orders API Example
//!
//! A controller wired to an in-memory store through an interface binding,
//! with a token guard on the write routes.
//!
//! Run with:
//! ```bash
//! cargo run --example orders_api
//! ```
//!
//! Then test:
//! ```bash
//! curl http://localhost:3000/api/orders
//! curl -X POST http://localhost:3000/api/orders \
//!      -H 'Authorization: Bearer secret123' \
//!      -d '{"item":"green tea","quantity":2}'
//! curl http://localhost:3000/api/orders/1
//! curl -X DELETE http://localhost:3000/api/orders/1 -H 'Authorization: Bearer secret123'
//! curl http://localhost:3000/debug/routes
//! ```

use http::StatusCode;
use kiwi_dispatch::{
    Arguments, Component, Config, Controller, ControllerRoutes, FluentRouter, Flow, GroupOptions,
    Parameter, Params, Reply, Request, ResponseSink, Result,
};
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    sync::{Arc, LazyLock, Mutex},
};

#[derive(Debug, Clone, Serialize)]
struct Order {
    id: u64,
    item: String,
    quantity: u32,
}

#[derive(Debug, Deserialize)]
struct NewOrder {
    item: String,
    quantity: u32,
}

trait OrderStore: Send + Sync {
    fn list(&self) -> Vec<Order>;
    fn get(&self, id: u64) -> Option<Order>;
    fn insert(&self, order: NewOrder) -> Order;
    fn remove(&self, id: u64) -> bool;
}

#[derive(Default)]
struct MemoryOrders {
    orders: Mutex<BTreeMap<u64, Order>>,
}

static ORDERS: LazyLock<Arc<MemoryOrders>> = LazyLock::new(Arc::default);

impl Component for MemoryOrders {
    fn create() -> Self {
        Self::default()
    }

    fn shared() -> Option<Arc<Self>> {
        Some(Arc::clone(&ORDERS))
    }
}

impl OrderStore for MemoryOrders {
    fn list(&self) -> Vec<Order> {
        self.orders.lock().map(|o| o.values().cloned().collect()).unwrap_or_default()
    }

    fn get(&self, id: u64) -> Option<Order> {
        self.orders.lock().ok()?.get(&id).cloned()
    }

    fn insert(&self, order: NewOrder) -> Order {
        let mut orders = self.orders.lock().unwrap_or_else(|e| e.into_inner());
        let id = orders.keys().next_back().map_or(1, |last| last + 1);
        let order = Order {
            id,
            item: order.item,
            quantity: order.quantity,
        };
        orders.insert(id, order.clone());
        order
    }

    fn remove(&self, id: u64) -> bool {
        self.orders
            .lock()
            .map(|mut o| o.remove(&id).is_some())
            .unwrap_or(false)
    }
}

struct OrdersController {
    store: Arc<dyn OrderStore>,
}

impl OrdersController {
    fn id(request: &Request) -> Option<u64> {
        request.param("id")?.parse().ok()
    }

    fn index(&self, _: &Request, res: &mut dyn ResponseSink) {
        res.send(Reply::json(StatusCode::OK, &self.store.list()));
    }

    fn show(&self, request: &Request, res: &mut dyn ResponseSink) {
        let reply = match Self::id(request).and_then(|id| self.store.get(id)) {
            Some(order) => Reply::json(StatusCode::OK, &order),
            None => Reply::not_found("Order not found"),
        };
        res.send(reply);
    }

    fn create(&self, request: &Request, res: &mut dyn ResponseSink) {
        let reply = match request.json::<NewOrder>() {
            Ok(order) => Reply::json(StatusCode::CREATED, &self.store.insert(order)),
            Err(err) => Reply::json(StatusCode::BAD_REQUEST, &err.to_error_response()),
        };
        res.send(reply);
    }

    fn destroy(&self, request: &Request, res: &mut dyn ResponseSink) {
        let removed = Self::id(request).is_some_and(|id| self.store.remove(id));
        let reply = if removed {
            Reply::new(StatusCode::NO_CONTENT)
        } else {
            Reply::not_found("Order not found")
        };
        res.send(reply);
    }
}

impl Controller for OrdersController {
    const NAME: &'static str = "OrdersController";

    fn parameters() -> Vec<Parameter> {
        vec![
            Parameter::string("prefix"),
            Parameter::list("middleware"),
            Parameter::interface::<dyn OrderStore>("store"),
        ]
    }

    fn construct(args: &Arguments) -> Result<Self> {
        Ok(Self {
            store: args.dependency("store")?,
        })
    }

    fn register_routes(&self, routes: &mut ControllerRoutes<'_, Self>) -> Result<()> {
        routes
            .get("/", "index", Self::index, ())?
            .get("/:id", "show", Self::show, ())?
            .post("/", "create", Self::create, "auth")?
            .delete("/:id", "destroy", Self::destroy, "auth")?;
        Ok(())
    }
}

fn require_token(request: &Request, params: Params) -> Flow {
    match request.header("authorization") {
        Some("Bearer secret123") => Flow::Continue(params),
        _ => Flow::Halt(Reply::json(
            StatusCode::UNAUTHORIZED,
            &serde_json::json!({ "error": "Unauthorized" }),
        )),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config: Config = r#"
[http]
bind_addr = "127.0.0.1"
bind_port = 3000
max_payload_size_bytes = "64KiB"
request_timeout = "10s"

[router]
routes_endpoint = "/debug/routes"

[logging]
format = "compact"
"#
    .parse()?;
    config.setup_tracing();

    let mut router = FluentRouter::new(config)?;
    router
        .add_global_middleware(|request, params| {
            tracing::info!(
                method = request.method(),
                path = request.path(),
                client = ?request.client_ip(),
                "Dispatching"
            );
            Flow::Continue(params)
        })
        .add_named_middleware("auth", require_token)
        .bind::<dyn OrderStore, MemoryOrders>(|c| c);

    router.group(GroupOptions::new("/api"), |api| {
        api.add_controller::<OrdersController>("/orders", ())?;
        Ok(())
    })?;

    router.seal()?.start().await
}

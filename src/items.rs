//! In-memory item store served through the dispatcher.
//!
//! | Method | Path           | Handler  |
//! |--------|----------------|----------|
//! | GET    | `/items`       | `list`   |
//! | POST   | `/items`       | `create` |
//! | GET    | `/items/{id}`  | `get`    |
//! | PUT    | `/items/{id}`  | `update` |
//! | DELETE | `/items/{id}`  | `delete` |

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::http::header::LOCATION;
use axum::http::{HeaderValue, StatusCode};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::codec::BoxError;
use crate::controller::{Call, Controller, ControllerConfig};
use crate::http::Response;
use crate::routing::HandlerRegistry;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub quantity: u32,
}

/// Request body for create and update.
#[derive(Debug, Deserialize)]
struct ItemFields {
    name: String,
    #[serde(default)]
    quantity: u32,
}

pub struct ItemsController {
    items: DashMap<u64, Item>,
    next_id: AtomicU64,
    config: ControllerConfig,
}

impl ItemsController {
    pub fn new(config: ControllerConfig) -> Self {
        Self {
            items: DashMap::new(),
            next_id: AtomicU64::new(1),
            config,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    async fn list(self: Arc<Self>, _call: Call) -> Result<Response, BoxError> {
        let mut items: Vec<Item> = self.items.iter().map(|e| e.value().clone()).collect();
        items.sort_by_key(|item| item.id);
        Ok(Response::ok(json!(items)))
    }

    async fn get(self: Arc<Self>, call: Call) -> Result<Response, BoxError> {
        let id = match call.parse_arg::<u64>(0) {
            Ok(id) => id,
            Err(e) => return Ok(Response::error(StatusCode::BAD_REQUEST, e)),
        };
        Ok(match self.items.get(&id) {
            Some(item) => Response::ok(json!(item.value())),
            None => missing(id),
        })
    }

    async fn create(self: Arc<Self>, call: Call) -> Result<Response, BoxError> {
        let fields = match call.body_as::<ItemFields>() {
            Ok(fields) => fields,
            Err(e) => return Ok(Response::error(StatusCode::UNPROCESSABLE_ENTITY, e)),
        };
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let item = Item {
            id,
            name: fields.name,
            quantity: fields.quantity,
        };
        self.items.insert(id, item.clone());
        tracing::debug!(request_id = %call.request_id(), item_id = id, "Item created");

        let location = HeaderValue::from_str(&format!("/items/{id}"))?;
        Ok(Response::created(json!(item)).with_header(LOCATION, location))
    }

    async fn update(self: Arc<Self>, call: Call) -> Result<Response, BoxError> {
        let id = match call.parse_arg::<u64>(0) {
            Ok(id) => id,
            Err(e) => return Ok(Response::error(StatusCode::BAD_REQUEST, e)),
        };
        let fields = match call.body_as::<ItemFields>() {
            Ok(fields) => fields,
            Err(e) => return Ok(Response::error(StatusCode::UNPROCESSABLE_ENTITY, e)),
        };
        Ok(match self.items.get_mut(&id) {
            Some(mut item) => {
                item.name = fields.name;
                item.quantity = fields.quantity;
                Response::ok(json!(*item))
            }
            None => missing(id),
        })
    }

    async fn delete(self: Arc<Self>, call: Call) -> Result<Response, BoxError> {
        let id = match call.parse_arg::<u64>(0) {
            Ok(id) => id,
            Err(e) => return Ok(Response::error(StatusCode::BAD_REQUEST, e)),
        };
        Ok(match self.items.remove(&id) {
            Some(_) => Response::no_content(),
            None => missing(id),
        })
    }
}

fn missing(id: u64) -> Response {
    Response::error(StatusCode::NOT_FOUND, format!("no item with id {id}"))
}

impl Default for ItemsController {
    fn default() -> Self {
        Self::new(ControllerConfig::default())
    }
}

impl Controller for ItemsController {
    fn routes() -> HandlerRegistry<Self> {
        HandlerRegistry::new()
            .route("GET", &[], Self::list)
            .route("POST", &[], Self::create)
            .route("GET", &["id"], Self::get)
            .route("PUT", &["id"], Self::update)
            .route("DELETE", &["id"], Self::delete)
    }

    fn config(&self) -> ControllerConfig {
        self.config.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(args: &[&str], body: Option<serde_json::Value>) -> Call {
        Call::new(
            "test",
            args.iter().map(|a| a.to_string()).collect(),
            body,
            Default::default(),
        )
    }

    #[tokio::test]
    async fn test_crud_cycle() {
        let items = Arc::new(ItemsController::default());

        let created = Arc::clone(&items)
            .create(call(&[], Some(json!({"name": "bolt", "quantity": 3}))))
            .await
            .unwrap();
        assert_eq!(created.status(), StatusCode::CREATED);
        assert_eq!(created.headers()[LOCATION], "/items/1");
        assert_eq!(items.len(), 1);

        let fetched = Arc::clone(&items).get(call(&["1"], None)).await.unwrap();
        assert_eq!(fetched.body(), Some(&json!({"id": 1, "name": "bolt", "quantity": 3})));

        let updated = Arc::clone(&items)
            .update(call(&["1"], Some(json!({"name": "nut"}))))
            .await
            .unwrap();
        assert_eq!(updated.body(), Some(&json!({"id": 1, "name": "nut", "quantity": 0})));

        let deleted = Arc::clone(&items).delete(call(&["1"], None)).await.unwrap();
        assert_eq!(deleted.status(), StatusCode::NO_CONTENT);
        assert!(items.is_empty());

        let gone = Arc::clone(&items).get(call(&["1"], None)).await.unwrap();
        assert_eq!(gone.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_bad_input_is_answered_not_raised() {
        let items = Arc::new(ItemsController::default());

        let bad_id = Arc::clone(&items).get(call(&["abc"], None)).await.unwrap();
        assert_eq!(bad_id.status(), StatusCode::BAD_REQUEST);

        let bad_body = Arc::clone(&items)
            .create(call(&[], Some(json!({"quantity": 1}))))
            .await
            .unwrap();
        assert_eq!(bad_body.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_routes_declared() {
        let routes = ItemsController::routes();
        assert_eq!(routes.len(), 5);
        let shapes: Vec<String> = routes.iter().map(|b| b.route().to_string()).collect();
        assert_eq!(
            shapes,
            ["GET {}", "POST {}", "GET {id}", "PUT {id}", "DELETE {id}"]
        );
    }
}

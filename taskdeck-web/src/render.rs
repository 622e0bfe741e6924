/// View rendering seam
///
/// Handlers never format HTML. They hand a view name and a data bag to a
/// [`Renderer`] and return whatever response it produces; the template layer
/// lives entirely behind this trait. [`DataRenderer`] is the default
/// implementation and emits the view name plus data bag as JSON, which is
/// what the bundled front end consumes and what the integration tests assert
/// against. A server-side template engine can be wired in by implementing
/// the trait and swapping it into `AppState` without touching any handler.

use axum::{
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};

/// Produces a response from a view name and a data bag
pub trait Renderer: Send + Sync {
    fn render(&self, view: &str, data: Value) -> Response;
}

/// Default renderer: emits `{ "view": ..., "data": ... }`
#[derive(Debug, Clone, Default)]
pub struct DataRenderer;

impl Renderer for DataRenderer {
    fn render(&self, view: &str, data: Value) -> Response {
        Json(json!({
            "view": view,
            "data": data,
        }))
        .into_response()
    }
}

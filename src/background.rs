//! Background coordinator: routes popup requests to the store and tells
//! connected popups to reload after a bulk import. No business logic of its
//! own beyond store access.

use crate::error::js_message;
use crate::messaging::{ImportResponse, Request};
use crate::record::GptRecord;
use crate::store;
use std::cell::RefCell;
use std::collections::HashSet;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

// Import JS bridge functions
#[wasm_bindgen(module = "/background.js")]
extern "C" {
    fn onRuntimeMessage(handler: &js_sys::Function);

    fn onPortConnect(on_connect: &js_sys::Function, on_disconnect: &js_sys::Function);

    #[wasm_bindgen(catch)]
    async fn sendRuntimeMessage(message: JsValue) -> Result<JsValue, JsValue>;
}

/// The set of live connections, keyed by context id (`"popup:3"` etc.),
/// maintained from connect/disconnect events and queried before any
/// broadcast.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    connections: HashSet<String>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        ConnectionRegistry { connections: HashSet::new() }
    }

    /// Returns false when the id was already registered.
    pub fn connect(&mut self, id: String) -> bool {
        self.connections.insert(id)
    }

    /// Returns false when the id was not registered.
    pub fn disconnect(&mut self, id: &str) -> bool {
        self.connections.remove(id)
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Is any connection from the named context (the part before `:`) live?
    pub fn has_context(&self, context: &str) -> bool {
        self.connections
            .iter()
            .any(|id| id.split(':').next() == Some(context))
    }
}

thread_local! {
    static REGISTRY: RefCell<ConnectionRegistry> = RefCell::new(ConnectionRegistry::new());
}

async fn notify_popups() {
    let connected = REGISTRY.with(|registry| registry.borrow().has_context("popup"));
    if !connected {
        return;
    }
    if let Ok(message) = serde_wasm_bindgen::to_value(&Request::RefreshPopup) {
        if let Err(e) = sendRuntimeMessage(message).await {
            // The popup can close between the query and the send.
            log::debug!("refresh broadcast not delivered: {}", js_message(&e));
        }
    }
}

/// Merge an imported batch into the store. An empty batch is an error, not
/// a zero-change merge.
async fn process_import(records: Vec<GptRecord>) -> ImportResponse {
    if records.is_empty() {
        return ImportResponse::error("empty import batch");
    }
    match store::update(|library| library.merge(records)).await {
        Ok((outcome, library)) => {
            log::info!(
                "import merged: {} added, {} updated, {} total",
                outcome.added,
                outcome.updated,
                library.len()
            );
            notify_popups().await;
            ImportResponse::success(outcome)
        }
        Err(e) => ImportResponse::error(e.to_string()),
    }
}

/// Wire up the coordinator's listeners. Called once from the service-worker
/// entry point.
pub fn start() {
    let on_connect = Closure::<dyn FnMut(JsValue)>::new(|id: JsValue| {
        if let Some(id) = id.as_string() {
            REGISTRY.with(|registry| registry.borrow_mut().connect(id));
        }
    });
    let on_disconnect = Closure::<dyn FnMut(JsValue)>::new(|id: JsValue| {
        if let Some(id) = id.as_string() {
            REGISTRY.with(|registry| registry.borrow_mut().disconnect(&id));
        }
    });
    onPortConnect(
        on_connect.as_ref().unchecked_ref(),
        on_disconnect.as_ref().unchecked_ref(),
    );
    on_connect.forget();
    on_disconnect.forget();

    let handler = Closure::<dyn FnMut(JsValue) -> js_sys::Promise>::new(|request: JsValue| {
        match serde_wasm_bindgen::from_value::<Request>(request) {
            Ok(Request::ProcessCsvData(records)) => {
                wasm_bindgen_futures::future_to_promise(async move {
                    let response = process_import(records).await;
                    Ok(serde_wasm_bindgen::to_value(&response).unwrap_or(JsValue::NULL))
                })
            }
            _ => js_sys::Promise::resolve(&JsValue::UNDEFINED),
        }
    });
    onRuntimeMessage(handler.as_ref().unchecked_ref());
    handler.forget();

    log::info!("background coordinator started");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_connect_and_disconnect() {
        let mut registry = ConnectionRegistry::new();

        assert!(registry.connect("popup:1".to_string()));
        assert_eq!(registry.len(), 1);

        assert!(registry.disconnect("popup:1"));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_registry_double_connect_is_single_entry() {
        let mut registry = ConnectionRegistry::new();

        registry.connect("popup:1".to_string());
        assert!(!registry.connect("popup:1".to_string()));

        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_registry_disconnect_unknown_id() {
        let mut registry = ConnectionRegistry::new();

        assert!(!registry.disconnect("popup:9"));
    }

    #[test]
    fn test_registry_queries_by_context() {
        let mut registry = ConnectionRegistry::new();
        registry.connect("popup:1".to_string());
        registry.connect("popup:2".to_string());

        assert!(registry.has_context("popup"));
        assert!(!registry.has_context("options"));

        registry.disconnect("popup:1");
        assert!(registry.has_context("popup"));
        registry.disconnect("popup:2");
        assert!(!registry.has_context("popup"));
    }
}

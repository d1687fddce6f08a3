//! Content-script side: scrape the GPT landing page once its content has
//! rendered.

use crate::error::{js_message, Error};
use crate::messaging::{Request, ScrapeResponse};
use crate::record::GptRecord;
use futures::channel::oneshot;
use std::cell::RefCell;
use std::rc::Rc;
use url::Url;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, MutationObserver, MutationObserverInit};

// Import JS bridge functions
#[wasm_bindgen(module = "/content.js")]
extern "C" {
    fn onRuntimeMessage(handler: &js_sys::Function);
}

/// The GPT title node. Its presence is the signal that the page content has
/// finished rendering.
pub const MARKER_SELECTOR: &str = ".text-center.text-2xl.font-medium";

/// The GPT description node.
pub const DESCRIPTION_SELECTOR: &str =
    ".max-w-md.text-center.text-sm.font-normal.text-token-text-primary";

/// Ceiling on the marker wait. Past this the scrape fails instead of
/// hanging on a page that never renders the marker.
pub const DEFAULT_WAIT_MS: i32 = 10_000;

fn page_document() -> Result<Document, Error> {
    web_sys::window()
        .and_then(|window| window.document())
        .ok_or_else(|| Error::scrape("no document in this context"))
}

fn query(document: &Document, selector: &str) -> Result<Option<Element>, Error> {
    document
        .query_selector(selector)
        .map_err(|e| Error::scrape(js_message(&e)))
}

fn element_text(element: Option<Element>) -> Option<String> {
    element
        .and_then(|el| el.text_content())
        .map(|text| text.trim().to_string())
}

/// Wait until `selector` matches something, re-checking on each mutation
/// burst of the page body. Resolves immediately when the marker already
/// exists; fails with `marker not found` once `timeout_ms` elapses.
async fn wait_for_marker(document: &Document, selector: &str, timeout_ms: i32) -> Result<(), Error> {
    if query(document, selector)?.is_some() {
        return Ok(());
    }

    let (sender, receiver) = oneshot::channel::<bool>();
    let sender = Rc::new(RefCell::new(Some(sender)));

    let observer_sender = Rc::clone(&sender);
    let observer_document = document.clone();
    let observer_selector = selector.to_string();
    let on_mutation = Closure::<dyn FnMut()>::new(move || {
        let found = observer_document
            .query_selector(&observer_selector)
            .ok()
            .flatten()
            .is_some();
        if found {
            if let Some(sender) = observer_sender.borrow_mut().take() {
                let _ = sender.send(true);
            }
        }
    });
    let observer = MutationObserver::new(on_mutation.as_ref().unchecked_ref())
        .map_err(|e| Error::scrape(js_message(&e)))?;
    let init = MutationObserverInit::new();
    init.set_child_list(true);
    init.set_subtree(true);
    let body = document
        .body()
        .ok_or_else(|| Error::scrape("page has no body"))?;
    observer
        .observe_with_options(&body, &init)
        .map_err(|e| Error::scrape(js_message(&e)))?;

    let timeout_sender = Rc::clone(&sender);
    let on_timeout = Closure::<dyn FnMut()>::new(move || {
        if let Some(sender) = timeout_sender.borrow_mut().take() {
            let _ = sender.send(false);
        }
    });
    let window = web_sys::window().ok_or_else(|| Error::scrape("no window in this context"))?;
    let timer = window
        .set_timeout_with_callback_and_timeout_and_arguments_0(
            on_timeout.as_ref().unchecked_ref(),
            timeout_ms,
        )
        .map_err(|e| Error::scrape(js_message(&e)))?;

    let found = receiver.await.unwrap_or(false);

    observer.disconnect();
    window.clear_timeout_with_handle(timer);

    if found {
        Ok(())
    } else {
        Err(Error::scrape("marker not found"))
    }
}

/// Assemble a record from the raw page fields. Empty name or description
/// fails the scrape; nothing reaches storage on failure.
fn build_record(
    name: Option<String>,
    description: Option<String>,
    href: &str,
) -> Result<GptRecord, Error> {
    let name = name.unwrap_or_default();
    if name.trim().is_empty() {
        return Err(Error::scrape("name not found"));
    }
    let description = description.unwrap_or_default();
    if description.trim().is_empty() {
        return Err(Error::scrape("description not found"));
    }
    let url = Url::parse(href.trim())
        .map_err(|_| Error::scrape("page address is not a valid url"))?;
    Ok(GptRecord::new(
        name.trim(),
        description.trim(),
        String::from(url),
    ))
}

/// Scrape the current page. Reads the DOM only; never mutates the page.
pub async fn scrape_page() -> Result<GptRecord, Error> {
    let document = page_document()?;
    wait_for_marker(&document, MARKER_SELECTOR, DEFAULT_WAIT_MS).await?;

    let name = element_text(query(&document, MARKER_SELECTOR)?);
    let description = element_text(query(&document, DESCRIPTION_SELECTOR)?);
    let href = web_sys::window()
        .ok_or_else(|| Error::scrape("no window in this context"))?
        .location()
        .href()
        .map_err(|e| Error::scrape(js_message(&e)))?;

    build_record(name, description, &href)
}

/// Register the content-script message handler. Answers `scrapeGptData`
/// with a `ScrapeResponse`; ignores everything else.
pub fn install_message_handler() {
    let handler = Closure::<dyn FnMut(JsValue) -> js_sys::Promise>::new(|request: JsValue| {
        match serde_wasm_bindgen::from_value::<Request>(request) {
            Ok(Request::ScrapeGptData) => wasm_bindgen_futures::future_to_promise(async {
                let response = match scrape_page().await {
                    Ok(record) => {
                        log::info!("scraped {}", record.url);
                        ScrapeResponse::ok(record)
                    }
                    Err(e) => ScrapeResponse::err(e.to_string()),
                };
                Ok(serde_wasm_bindgen::to_value(&response).unwrap_or(JsValue::NULL))
            }),
            _ => js_sys::Promise::resolve(&JsValue::UNDEFINED),
        }
    });
    onRuntimeMessage(handler.as_ref().unchecked_ref());
    handler.forget();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_record_success() {
        let record = build_record(
            Some("  Code Tutor  ".to_string()),
            Some("Explains code".to_string()),
            "https://example.com/g/abc",
        )
        .unwrap();

        assert_eq!(record.name, "Code Tutor");
        assert_eq!(record.description, "Explains code");
        assert_eq!(record.url, "https://example.com/g/abc");
    }

    #[test]
    fn test_build_record_empty_name_fails() {
        let err = build_record(
            Some("   ".to_string()),
            Some("desc".to_string()),
            "https://example.com",
        )
        .unwrap_err();

        assert_eq!(err, Error::scrape("name not found"));
    }

    #[test]
    fn test_build_record_missing_name_fails() {
        let err = build_record(None, Some("desc".to_string()), "https://example.com").unwrap_err();

        assert_eq!(err, Error::scrape("name not found"));
    }

    #[test]
    fn test_build_record_empty_description_fails() {
        let err = build_record(
            Some("Name".to_string()),
            Some("".to_string()),
            "https://example.com",
        )
        .unwrap_err();

        assert_eq!(err, Error::scrape("description not found"));
    }

    #[test]
    fn test_build_record_invalid_url_fails() {
        let err = build_record(
            Some("Name".to_string()),
            Some("desc".to_string()),
            "not a url",
        )
        .unwrap_err();

        assert!(matches!(err, Error::Scrape(_)));
    }
}

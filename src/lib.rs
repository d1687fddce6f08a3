//! GPT Library - Chrome extension for collecting GPT listings
//! Built with Rust + WASM + Yew

mod background;
mod csv_io;
mod error;
mod library;
mod messaging;
mod ops;
mod record;
mod scrape;
mod store;
pub mod ui;

use wasm_bindgen::prelude::*;

// Set up panic hook for better error messages in the browser console
#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
    wasm_logger::init(wasm_logger::Config::default());
}

// Start the Yew app for the popup
#[wasm_bindgen]
pub fn start_popup() {
    yew::Renderer::<ui::popup::App>::new().render();
}

// Register the scraper in the page the content script was injected into
#[wasm_bindgen]
pub fn run_content_script() {
    scrape::install_message_handler();
}

// Start the background coordinator (service worker context)
#[wasm_bindgen]
pub fn start_background() {
    background::start();
}

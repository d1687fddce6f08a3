//! Popup panel: the saved-GPT table with search, sort, save, import,
//! export, and delete.

use crate::csv_io;
use crate::error::{js_message, Error};
use crate::library::Upsert;
use crate::messaging::{ImportResponse, Request, ScrapeResponse};
use crate::ops::{filter_records, sort_by_name};
use crate::record::GptRecord;
use crate::store;
use patternfly_yew::prelude::*;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys::HtmlInputElement;
use yew::prelude::*;

// Import JS bridge functions
#[wasm_bindgen(module = "/popup.js")]
extern "C" {
    #[wasm_bindgen(catch)]
    async fn sendMessageToActiveTab(message: JsValue) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn sendRuntimeMessage(message: JsValue) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn readImportFile() -> Result<JsValue, JsValue>;

    fn exportToFile(data: &str, filename: &str);

    fn connectPort(name: &str);

    fn onRuntimeMessage(handler: &js_sys::Function);
}

/// How long a status notice stays on screen.
const STATUS_CLEAR_MS: i32 = 3000;

#[derive(Clone, PartialEq)]
enum Notice {
    Success(String),
    Failure(String),
}

/// Show a transient notice and schedule its removal. The generation stamp
/// keeps an old timer from clearing a newer notice.
fn show_notice(
    notice: &UseStateHandle<Option<Notice>>,
    generation: &Rc<RefCell<u32>>,
    value: Notice,
) {
    *generation.borrow_mut() += 1;
    let stamp = *generation.borrow();
    notice.set(Some(value));

    let notice = notice.clone();
    let generation = Rc::clone(generation);
    let clear = Closure::once_into_js(move || {
        if *generation.borrow() == stamp {
            notice.set(None);
        }
    });
    if let Some(window) = web_sys::window() {
        let _ = window.set_timeout_with_callback_and_timeout_and_arguments_0(
            clear.unchecked_ref(),
            STATUS_CLEAR_MS,
        );
    }
}

#[function_component(App)]
pub fn app() -> Html {
    let records = use_state(Vec::<GptRecord>::new);
    let search_query = use_state(String::new);
    let notice = use_state(|| None::<Notice>);
    let notice_generation = use_mut_ref(|| 0u32);
    let loading = use_state(|| true);
    let busy = use_state(|| false);

    // Connect to the background, install the refresh listener, load data
    {
        let records = records.clone();
        let loading = loading.clone();
        let notice = notice.clone();
        let generation = notice_generation.clone();

        use_effect_with((), move |_| {
            connectPort("popup");

            let refresh_records = records.clone();
            let handler = Closure::<dyn FnMut(JsValue)>::new(move |request: JsValue| {
                if let Ok(Request::RefreshPopup) =
                    serde_wasm_bindgen::from_value::<Request>(request)
                {
                    let records = refresh_records.clone();
                    spawn_local(async move {
                        let _ = reload(records).await;
                    });
                }
            });
            onRuntimeMessage(handler.as_ref().unchecked_ref());
            handler.forget();

            spawn_local(async move {
                if let Err(e) = reload(records).await {
                    show_notice(&notice, &generation, Notice::Failure(e.to_string()));
                }
                loading.set(false);
            });
            || ()
        });
    }

    // Save the GPT shown in the active tab
    let on_save_current = {
        let records = records.clone();
        let notice = notice.clone();
        let generation = notice_generation.clone();
        let busy = busy.clone();

        Callback::from(move |_| {
            let records = records.clone();
            let notice = notice.clone();
            let generation = generation.clone();
            let busy = busy.clone();

            busy.set(true);
            spawn_local(async move {
                match save_current_page(records.clone()).await {
                    Ok(message) => show_notice(&notice, &generation, Notice::Success(message)),
                    Err(e) => {
                        show_notice(&notice, &generation, Notice::Failure(e.to_string()));
                        let _ = reload(records).await;
                    }
                }
                busy.set(false);
            });
        })
    };

    // Import a CSV file chosen in the file picker
    let on_import = {
        let records = records.clone();
        let notice = notice.clone();
        let generation = notice_generation.clone();
        let busy = busy.clone();

        Callback::from(move |_| {
            let records = records.clone();
            let notice = notice.clone();
            let generation = generation.clone();
            let busy = busy.clone();

            busy.set(true);
            spawn_local(async move {
                match import_csv(records.clone()).await {
                    Ok(message) => show_notice(&notice, &generation, Notice::Success(message)),
                    Err(e) => {
                        show_notice(&notice, &generation, Notice::Failure(e.to_string()));
                        let _ = reload(records).await;
                    }
                }
                busy.set(false);
            });
        })
    };

    // Export the whole library as CSV
    let on_export = {
        let notice = notice.clone();
        let generation = notice_generation.clone();
        let busy = busy.clone();

        Callback::from(move |_| {
            let notice = notice.clone();
            let generation = generation.clone();
            let busy = busy.clone();

            busy.set(true);
            spawn_local(async move {
                match export_library().await {
                    Ok(message) => show_notice(&notice, &generation, Notice::Success(message)),
                    Err(e) => show_notice(&notice, &generation, Notice::Failure(e.to_string())),
                }
                busy.set(false);
            });
        })
    };

    // Re-sort the displayed copy by name
    let on_sort = {
        let records = records.clone();
        Callback::from(move |_| {
            records.set(sort_by_name(&records));
        })
    };

    // Delete one row by url
    let on_delete = {
        let records = records.clone();
        let notice = notice.clone();
        let generation = notice_generation.clone();

        Callback::from(move |url: String| {
            let records = records.clone();
            let notice = notice.clone();
            let generation = generation.clone();

            spawn_local(async move {
                match store::update(|library| library.remove(&url)).await {
                    Ok((removed, library)) => {
                        records.set(library.records);
                        let message = if removed { "Removed." } else { "Nothing to remove." };
                        show_notice(&notice, &generation, Notice::Success(message.to_string()));
                    }
                    Err(e) => {
                        show_notice(&notice, &generation, Notice::Failure(e.to_string()));
                        let _ = reload(records).await;
                    }
                }
            });
        })
    };

    // Clear the whole library (asks first)
    let on_delete_all = {
        let records = records.clone();
        let notice = notice.clone();
        let generation = notice_generation.clone();
        let busy = busy.clone();

        Callback::from(move |_| {
            let confirmed = web_sys::window()
                .map(|w| {
                    w.confirm_with_message("Delete all saved GPTs?")
                        .unwrap_or(false)
                })
                .unwrap_or(false);
            if !confirmed {
                return;
            }

            let records = records.clone();
            let notice = notice.clone();
            let generation = generation.clone();
            let busy = busy.clone();

            busy.set(true);
            spawn_local(async move {
                match store::update(|library| library.clear()).await {
                    Ok((_, library)) => {
                        records.set(library.records);
                        show_notice(
                            &notice,
                            &generation,
                            Notice::Success("All entries deleted.".to_string()),
                        );
                    }
                    Err(e) => {
                        show_notice(&notice, &generation, Notice::Failure(e.to_string()));
                        let _ = reload(records).await;
                    }
                }
                busy.set(false);
            });
        })
    };

    // Search handler
    let on_search_input = {
        let search_query = search_query.clone();
        Callback::from(move |e: InputEvent| {
            if let Some(input) = e.target_dyn_into::<HtmlInputElement>() {
                search_query.set(input.value());
            }
        })
    };

    let displayed = filter_records(&records, &search_query);
    let is_busy = *busy;

    html! {
        <div class="padding-20">
            <h1 class="popup-title">{"GPT Library"}</h1>

            // Status notice (auto-clears)
            if let Some(current) = (*notice).clone() {
                {match current {
                    Notice::Success(text) => html! {
                        <Alert r#type={AlertType::Success} title={text} inline={true}>
                        </Alert>
                    },
                    Notice::Failure(text) => html! {
                        <Alert r#type={AlertType::Danger} title={text} inline={true}>
                        </Alert>
                    },
                }}
            }

            <div class="actions-column">
                <Button onclick={on_save_current} disabled={is_busy} block={true}>
                    {"💾 Save Current GPT"}
                </Button>
                <Button onclick={on_import} disabled={is_busy} variant={ButtonVariant::Secondary} block={true}>
                    {"📂 Import CSV"}
                </Button>
                <Button onclick={on_export} disabled={is_busy} variant={ButtonVariant::Secondary} block={true}>
                    {"📤 Export CSV"}
                </Button>
                <Button onclick={on_sort} disabled={is_busy} variant={ButtonVariant::Secondary} block={true}>
                    {"🔤 Sort by Name"}
                </Button>
                <Button onclick={on_delete_all} disabled={is_busy} variant={ButtonVariant::Danger} block={true}>
                    {"🗑️ Delete All"}
                </Button>
            </div>

            <input type="file" id="csvFileInput" accept=".csv" class="file-input" />

            <div class="search-container">
                <input
                    type="text"
                    placeholder="Search by name or description..."
                    value={(*search_query).clone()}
                    oninput={on_search_input}
                    class="search-input"
                />
            </div>

            if *loading {
                <div class="loading-text-center">
                    <Spinner />
                    <p class="loading-text">{"Loading library..."}</p>
                </div>
            } else if displayed.is_empty() {
                <div class="empty-state">
                    if search_query.is_empty() {
                        <p>{"No saved GPTs yet."}</p>
                        <p class="empty-state-hint">{"Open a GPT page and press Save."}</p>
                    } else {
                        <p>{"No entries match your search."}</p>
                    }
                </div>
            } else {
                <table class="gpt-table">
                    <thead>
                        <tr>
                            <th>{"Name"}</th>
                            <th>{"Description"}</th>
                            <th></th>
                        </tr>
                    </thead>
                    <tbody>
                        {for displayed.iter().map(|record| {
                            let url = record.url.clone();
                            html! {
                                <tr key={record.url.clone()}>
                                    <td>
                                        <a href={record.url.clone()} target="_blank">{&record.name}</a>
                                    </td>
                                    <td class="description-cell">{&record.description}</td>
                                    <td>
                                        <Button
                                            onclick={on_delete.reform(move |_| url.clone())}
                                            variant={ButtonVariant::Danger}
                                            size={ButtonSize::Small}
                                        >
                                            {"✗"}
                                        </Button>
                                    </td>
                                </tr>
                            }
                        })}
                    </tbody>
                </table>
            }

            <p class="footer-popup">
                {format!("{} saved • GPT Library v0.1.0", records.len())}
            </p>
        </div>
    }
}

// Helper functions

/// Re-read the authoritative list and hand it to the renderer.
async fn reload(records: UseStateHandle<Vec<GptRecord>>) -> Result<usize, Error> {
    let library = store::load().await?;
    let count = library.len();
    records.set(library.records);
    Ok(count)
}

async fn save_current_page(records: UseStateHandle<Vec<GptRecord>>) -> Result<String, Error> {
    let request = serde_wasm_bindgen::to_value(&Request::ScrapeGptData)
        .map_err(|e| Error::messaging(e.to_string()))?;
    let response = sendMessageToActiveTab(request)
        .await
        .map_err(|e| Error::messaging(js_message(&e)))?;
    if response.is_null() || response.is_undefined() {
        return Err(Error::messaging("no response from the page"));
    }
    let response: ScrapeResponse = serde_wasm_bindgen::from_value(response)
        .map_err(|e| Error::messaging(format!("malformed scrape response: {e}")))?;

    let record = match (response.success, response.data) {
        (true, Some(record)) => record,
        _ => {
            return Err(Error::scrape(
                response.error.unwrap_or_else(|| "scrape failed".to_string()),
            ));
        }
    };

    let name = record.name.clone();
    let (result, library) = store::update(move |library| library.upsert(record)).await?;
    records.set(library.records);
    Ok(match result {
        Some(Upsert::Updated) => format!("Updated \"{name}\"."),
        _ => format!("Saved \"{name}\"."),
    })
}

async fn import_csv(records: UseStateHandle<Vec<GptRecord>>) -> Result<String, Error> {
    let text = readImportFile()
        .await
        .map_err(|e| Error::import(js_message(&e)))?;
    let Some(text) = text.as_string() else {
        return Err(Error::import("no file selected"));
    };
    let batch = csv_io::parse_import(&text)?;

    // The merge itself happens in the background context
    let request = serde_wasm_bindgen::to_value(&Request::ProcessCsvData(batch))
        .map_err(|e| Error::messaging(e.to_string()))?;
    let response = sendRuntimeMessage(request)
        .await
        .map_err(|e| Error::messaging(js_message(&e)))?;
    if response.is_null() || response.is_undefined() {
        return Err(Error::messaging("no response from the background worker"));
    }
    let response: ImportResponse = serde_wasm_bindgen::from_value(response)
        .map_err(|e| Error::messaging(format!("malformed import response: {e}")))?;
    if !response.is_success() {
        return Err(Error::import(
            response.message.unwrap_or_else(|| "import failed".to_string()),
        ));
    }

    let count = reload(records).await?;
    Ok(format!(
        "Imported: {} added, {} updated ({count} total).",
        response.added, response.updated
    ))
}

async fn export_library() -> Result<String, Error> {
    let library = store::load().await?;
    let csv = csv_io::export_csv(&library.records)?;
    exportToFile(&csv, csv_io::EXPORT_FILENAME);
    Ok(format!("Exported {} entries.", library.len()))
}

//! `web-sys` implementations of the controller capabilities.
use std::cell::RefCell;
use std::rc::Rc;

use slotmap::SlotMap;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

use hashdialog_core::{
    ControllerError, ControllerOptions, Dialog, Dispose, Focus, Host, Listener, ListenerId,
    WidgetError, check_environment,
};

use crate::selector::href_selector;

type Callbacks = RefCell<SlotMap<ListenerId, Closure<dyn FnMut()>>>;

/// Install the console logger and panic hook. Call once at startup.
#[wasm_bindgen(js_name = initLogging)]
pub fn init_logging(level: Option<String>) {
    std::panic::set_hook(Box::new(console_error_panic_hook::hook));
    let level = level
        .and_then(|l| l.parse::<log::Level>().ok())
        .unwrap_or(log::Level::Info);
    let _ = console_log::init_with_level(level);
}

/// The global window, location, history and document.
pub struct WebHost {
    window: Option<web_sys::Window>,
    callbacks: Callbacks,
}

impl WebHost {
    pub fn current() -> Self {
        Self {
            window: web_sys::window(),
            callbacks: RefCell::new(SlotMap::with_key()),
        }
    }

    fn document(&self) -> Option<web_sys::Document> {
        self.window.as_ref()?.document()
    }
}

impl Host for WebHost {
    fn has_browsing_context(&self) -> bool {
        self.document().is_some()
    }

    fn hash(&self) -> String {
        self.window
            .as_ref()
            .and_then(|w| w.location().hash().ok())
            .unwrap_or_default()
    }

    fn clear_hash_silently(&self) {
        let Some(window) = &self.window else {
            return;
        };
        // pushState never fires hashchange; " " resolves to the current
        // address without its fragment.
        let pushed = window
            .history()
            .and_then(|h| h.push_state_with_url(&JsValue::NULL, "", Some(" ")));
        if let Err(e) = pushed {
            log::warn!("clearing hash failed: {}", describe(&e));
        }
    }

    fn anchor_for(&self, hash: &str) -> Option<Rc<dyn Focus>> {
        let document = self.document()?;
        let element = match document.query_selector(&href_selector(hash)) {
            Ok(found) => found?,
            Err(e) => {
                log::debug!("no anchor lookup for {hash:?}: {}", describe(&e));
                return None;
            }
        };
        let element = element.dyn_into::<web_sys::HtmlElement>().ok()?;
        Some(Rc::new(WebFocus(element)))
    }

    fn set_scroll_lock(&self, engaged: bool) {
        let Some(body) = self.document().and_then(|d| d.body()) else {
            return;
        };
        let value = if engaged { "hidden" } else { "visible" };
        let _ = body.style().set_property("overflow", value);
    }

    fn add_hash_listener(&self, listener: Listener) -> ListenerId {
        let closure = Closure::<dyn FnMut()>::new(move || listener());
        if let Some(window) = &self.window
            && let Err(e) = window
                .add_event_listener_with_callback("hashchange", closure.as_ref().unchecked_ref())
        {
            log::warn!("hashchange listener not attached: {}", describe(&e));
        }
        self.callbacks.borrow_mut().insert(closure)
    }

    fn remove_hash_listener(&self, id: ListenerId) {
        let Some(closure) = self.callbacks.borrow_mut().remove(id) else {
            return;
        };
        if let Some(window) = &self.window {
            let _ = window.remove_event_listener_with_callback(
                "hashchange",
                closure.as_ref().unchecked_ref(),
            );
        }
    }
}

pub struct WebDialog {
    element: web_sys::HtmlDialogElement,
    callbacks: Callbacks,
}

impl WebDialog {
    pub fn new(element: web_sys::HtmlDialogElement) -> Self {
        Self {
            element,
            callbacks: RefCell::new(SlotMap::with_key()),
        }
    }
}

impl Dialog for WebDialog {
    fn tag_name(&self) -> String {
        self.element.tag_name()
    }

    fn is_open(&self) -> bool {
        self.element.open()
    }

    fn show_modal(&self) -> Result<(), WidgetError> {
        self.element
            .show_modal()
            .map_err(|e| WidgetError::InvalidState(describe(&e)))
    }

    fn close(&self) {
        self.element.close();
    }

    fn add_close_listener(&self, listener: Listener) -> ListenerId {
        let closure = Closure::<dyn FnMut()>::new(move || listener());
        if let Err(e) = self
            .element
            .add_event_listener_with_callback("close", closure.as_ref().unchecked_ref())
        {
            log::warn!("close listener not attached: {}", describe(&e));
        }
        self.callbacks.borrow_mut().insert(closure)
    }

    fn remove_close_listener(&self, id: ListenerId) {
        let Some(closure) = self.callbacks.borrow_mut().remove(id) else {
            return;
        };
        let _ = self
            .element
            .remove_event_listener_with_callback("close", closure.as_ref().unchecked_ref());
    }
}

pub struct WebFocus(web_sys::HtmlElement);

impl Focus for WebFocus {
    fn focus(&self) {
        if let Err(e) = self.0.focus() {
            log::debug!("focus failed: {}", describe(&e));
        }
    }
}

#[wasm_bindgen]
pub struct HashDialogHandle {
    dispose: Dispose,
}

#[wasm_bindgen]
impl HashDialogHandle {
    /// Detach from `hashchange` and the dialog's `close` event. Idempotent.
    #[wasm_bindgen(js_name = removeEventListeners)]
    pub fn remove_event_listeners(&self) {
        self.dispose.run();
    }

    #[wasm_bindgen(getter, js_name = isAttached)]
    pub fn is_attached(&self) -> bool {
        !self.dispose.is_disposed()
    }
}

/// `controlDialogWithUrlHash(dialog, "auto" | "manual", { onHashRemoval }?)`
///
/// Throws `EnvironmentError` outside a window, `InvalidArgumentError` for a
/// non-dialog or an unknown overflow value. Nothing is attached on error.
#[wasm_bindgen(js_name = controlDialogWithUrlHash)]
pub fn control_dialog_with_url_hash(
    dialog: JsValue,
    overflow: JsValue,
    options: JsValue,
) -> Result<HashDialogHandle, JsValue> {
    let host = WebHost::current();
    check_environment(&host).map_err(to_js_error)?;

    // Namespaced `dialog` elements fail this cast as well as non-elements.
    let element = dialog
        .dyn_into::<web_sys::HtmlDialogElement>()
        .map_err(|_| invalid_argument("invalid dialog argument"))?;
    let overflow = overflow
        .as_string()
        .ok_or_else(|| invalid_argument("invalid overflow argument"))?;

    let dispose = hashdialog_core::control_dialog_with_url_hash(
        Rc::new(host),
        Rc::new(WebDialog::new(element)),
        &overflow,
        Some(read_options(&options)),
    )
    .map_err(to_js_error)?;

    Ok(HashDialogHandle { dispose })
}

fn read_options(options: &JsValue) -> ControllerOptions {
    let mut out = ControllerOptions::new();
    if !options.is_object() {
        return out;
    }
    let callback = js_sys::Reflect::get(options, &JsValue::from_str("onHashRemoval"))
        .ok()
        .and_then(|v| v.dyn_into::<js_sys::Function>().ok());
    if let Some(f) = callback {
        out = out.on_hash_removal(move || {
            if let Err(e) = f.call0(&JsValue::NULL) {
                log::warn!("onHashRemoval threw: {}", describe(&e));
            }
        });
    }
    out
}

fn invalid_argument(msg: &str) -> JsValue {
    to_js_error(ControllerError::InvalidArgument(msg.into()))
}

fn to_js_error(err: ControllerError) -> JsValue {
    let e = js_sys::Error::new(&err.to_string());
    e.set_name(err.name());
    e.into()
}

fn describe(value: &JsValue) -> String {
    if let Some(e) = value.dyn_ref::<js_sys::Error>() {
        return String::from(e.message());
    }
    value.as_string().unwrap_or_else(|| format!("{value:?}"))
}

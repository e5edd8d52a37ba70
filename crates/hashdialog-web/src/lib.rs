//! Browser binding for `hashdialog-core` (wasm32 via `web-sys`).
//!
//! From script:
//!
//! ```js
//! import init, { controlDialogWithUrlHash } from "hashdialog_web";
//!
//! await init();
//! const handle = controlDialogWithUrlHash(document.querySelector("dialog"), "auto", {
//!   onHashRemoval: () => console.log("hash cleared"),
//! });
//! // later
//! handle.removeEventListeners();
//! ```

mod selector;

pub use selector::href_selector;

#[cfg(target_arch = "wasm32")]
mod web;

#[cfg(target_arch = "wasm32")]
pub use web::*;

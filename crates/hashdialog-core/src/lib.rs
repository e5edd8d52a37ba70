//! # Hash-linked dialogs
//!
//! Keeps a modal dialog open exactly while the page address fragment
//! (`#some-id`) names an anchor on the page, so dialogs can be deep-linked:
//! opening a shared `…/page#some-id` shows the dialog, and dismissing the
//! dialog clears the fragment again.
//!
//! The controller never talks to a browser directly. It works against a
//! small capability surface:
//!
//! - [`Host`]: fragment read/observe, silent navigation, anchor lookup and
//!   the page scroll lock.
//! - [`Dialog`]: open query, `show_modal`, `close` and the close
//!   notification.
//! - [`Focus`]: anything that can take keyboard focus back.
//!
//! `hashdialog-web` implements these over `web-sys`; [`memory`] implements
//! them in memory for headless use and tests:
//!
//! ```rust
//! use std::rc::Rc;
//! use hashdialog_core::*;
//! use hashdialog_core::memory::MemoryHost;
//!
//! let host = MemoryHost::new().with_hash("#terms");
//! host.add_anchor("#terms");
//! let dialog = host.create_dialog();
//!
//! let controller = HashDialogController::new(
//!     Rc::new(host.clone()),
//!     Rc::new(dialog.clone()),
//!     OverflowPolicy::Auto,
//!     ControllerOptions::default(),
//! )
//! .unwrap();
//! assert!(dialog.is_open());
//!
//! dialog.press_escape();
//! host.run_until_idle();
//! assert_eq!(host.current_hash(), "");
//!
//! controller.dispose();
//! ```
//!
//! ## Run to completion
//!
//! All of this is single threaded. Notifications are handled one at a time;
//! the controller's own writes (clearing the hash, closing the dialog) never
//! re-enter a handler synchronously. Clearing the hash goes through
//! [`Host::clear_hash_silently`], which must not raise a fragment-change
//! notification. The dialog's close notification, which closing raises
//! later, re-runs the close sequence against an already-clean state and
//! changes nothing.

pub mod capability;
pub mod controller;
pub mod effects;
pub mod error;
pub mod memory;
pub mod policy;
pub mod signal;

#[cfg(test)]
mod tests;

pub use capability::*;
pub use controller::*;
pub use effects::*;
pub use error::*;
pub use policy::*;
pub use signal::*;

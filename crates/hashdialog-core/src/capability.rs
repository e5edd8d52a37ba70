//! What the controller needs from its surroundings.
//!
//! Hashes are passed around the way `location.hash` reports them: with the
//! leading `#`, or the empty string when the address has no fragment.

use std::rc::Rc;

use crate::error::WidgetError;
use crate::signal::{Listener, ListenerId};

/// An element that can take keyboard focus.
pub trait Focus {
    fn focus(&self);
}

/// A dialog widget.
pub trait Dialog {
    /// Upper-case element tag, `"DIALOG"` for real dialogs.
    fn tag_name(&self) -> String;

    fn is_open(&self) -> bool;

    /// Fails when the dialog is already open.
    fn show_modal(&self) -> Result<(), WidgetError>;

    /// No-op on a closed dialog. Closing an open dialog raises the close
    /// notification after the current handler has run to completion.
    fn close(&self);

    fn add_close_listener(&self, listener: Listener) -> ListenerId;
    fn remove_close_listener(&self, id: ListenerId);
}

/// Window, location, history and document, as one capability.
pub trait Host {
    /// False when there is no window/document to work against.
    fn has_browsing_context(&self) -> bool;

    /// Current fragment, `""` or `"#..."`.
    fn hash(&self) -> String;

    /// Drop the fragment from the address. Must not raise a fragment-change
    /// notification.
    fn clear_hash_silently(&self);

    /// The element whose `href` attribute equals `hash`, if any.
    fn anchor_for(&self, hash: &str) -> Option<Rc<dyn Focus>>;

    /// Page-level scroll lock (body `overflow: hidden` / `visible`).
    fn set_scroll_lock(&self, engaged: bool);

    fn add_hash_listener(&self, listener: Listener) -> ListenerId;
    fn remove_hash_listener(&self, id: ListenerId);
}

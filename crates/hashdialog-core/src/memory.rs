//! In-memory host for running controllers without a browser.
//!
//! Notifications are queued, not delivered inline: user navigation and
//! closing an open dialog push onto a FIFO that [`MemoryHost::run_until_idle`]
//! drains one message at a time, each handled to completion before the next.
//! Every capability call made against the host is appended to a journal.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::capability::{Dialog, Focus, Host};
use crate::error::WidgetError;
use crate::signal::{Listener, ListenerId, Listeners};

/// A capability call recorded by [`MemoryHost`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HostOp {
    ClearHash,
    ScrollLock(bool),
    ShowModal,
    Close,
    Focus(String),
}

impl fmt::Display for HostOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostOp::ClearHash => f.write_str("clear-hash"),
            HostOp::ScrollLock(true) => f.write_str("scroll-lock on"),
            HostOp::ScrollLock(false) => f.write_str("scroll-lock off"),
            HostOp::ShowModal => f.write_str("show-modal"),
            HostOp::Close => f.write_str("close"),
            HostOp::Focus(href) => write!(f, "focus {href}"),
        }
    }
}

enum Notification {
    HashChanged,
    DialogClosed(MemoryDialog),
}

struct State {
    browsing_context: bool,
    hash: RefCell<String>,
    anchors: RefCell<Vec<Rc<MemoryAnchor>>>,
    scroll_locked: Cell<bool>,
    focused: RefCell<Option<String>>,
    journal: RefCell<Vec<HostOp>>,
    queue: RefCell<VecDeque<Notification>>,
    hash_listeners: Listeners,
}

impl State {
    fn record(&self, op: HostOp) {
        log::trace!("host: {op}");
        self.journal.borrow_mut().push(op);
    }
}

/// Page stand-in: address fragment, anchors, body scroll lock and the
/// notification queue.
#[derive(Clone)]
pub struct MemoryHost(Rc<State>);

impl Default for MemoryHost {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::build(true)
    }

    /// A host without a browsing context; controllers refuse to attach.
    pub fn detached() -> Self {
        Self::build(false)
    }

    fn build(browsing_context: bool) -> Self {
        Self(Rc::new(State {
            browsing_context,
            hash: RefCell::new(String::new()),
            anchors: RefCell::new(Vec::new()),
            scroll_locked: Cell::new(false),
            focused: RefCell::new(None),
            journal: RefCell::new(Vec::new()),
            queue: RefCell::new(VecDeque::new()),
            hash_listeners: Listeners::new(),
        }))
    }

    /// Set the fragment as the page loaded with it (no notification).
    pub fn with_hash(self, hash: &str) -> Self {
        *self.0.hash.borrow_mut() = normalize(hash);
        self
    }

    /// User navigation (link click, typed address, back button). Queues a
    /// fragment-change notification when the fragment actually changes.
    pub fn navigate(&self, hash: &str) {
        let hash = normalize(hash);
        if *self.0.hash.borrow() == hash {
            return;
        }
        *self.0.hash.borrow_mut() = hash;
        self.0.queue.borrow_mut().push_back(Notification::HashChanged);
    }

    pub fn add_anchor(&self, href: &str) -> Rc<MemoryAnchor> {
        let anchor = Rc::new(MemoryAnchor {
            href: href.to_string(),
            host: Rc::downgrade(&self.0),
        });
        self.0.anchors.borrow_mut().push(anchor.clone());
        anchor
    }

    pub fn remove_anchor(&self, href: &str) {
        self.0.anchors.borrow_mut().retain(|a| a.href != href);
    }

    pub fn create_dialog(&self) -> MemoryDialog {
        self.create_element("dialog")
    }

    /// Any HTML element kind; only `dialog` passes the controller's check.
    pub fn create_element(&self, tag: &str) -> MemoryDialog {
        self.create_element_ns(&tag.to_ascii_uppercase())
    }

    /// Like `createElementNS`: the tag keeps its case, so a namespaced
    /// `dialog` reports `"dialog"`.
    pub fn create_element_ns(&self, tag: &str) -> MemoryDialog {
        MemoryDialog(Rc::new(DialogState {
            tag: tag.to_string(),
            open: Cell::new(false),
            close_listeners: Listeners::new(),
            host: Rc::downgrade(&self.0),
        }))
    }

    pub fn current_hash(&self) -> String {
        self.0.hash.borrow().clone()
    }

    pub fn scroll_locked(&self) -> bool {
        self.0.scroll_locked.get()
    }

    /// `href` of the anchor that last received focus.
    pub fn focused(&self) -> Option<String> {
        self.0.focused.borrow().clone()
    }

    pub fn journal(&self) -> Vec<HostOp> {
        self.0.journal.borrow().clone()
    }

    pub fn take_journal(&self) -> Vec<HostOp> {
        std::mem::take(&mut *self.0.journal.borrow_mut())
    }

    /// Journal as one op per line.
    pub fn journal_text(&self) -> String {
        self.0
            .journal
            .borrow()
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn pending(&self) -> usize {
        self.0.queue.borrow().len()
    }

    pub fn hash_listener_count(&self) -> usize {
        self.0.hash_listeners.len()
    }

    /// Deliver the oldest queued notification. Returns false when idle.
    pub fn dispatch_next(&self) -> bool {
        let next = self.0.queue.borrow_mut().pop_front();
        match next {
            Some(Notification::HashChanged) => self.0.hash_listeners.emit(),
            Some(Notification::DialogClosed(dialog)) => dialog.0.close_listeners.emit(),
            None => return false,
        }
        true
    }

    /// Drain the queue, including notifications raised by handlers.
    /// Returns the number delivered.
    pub fn run_until_idle(&self) -> usize {
        let mut delivered = 0;
        while self.dispatch_next() {
            delivered += 1;
        }
        delivered
    }
}

fn normalize(hash: &str) -> String {
    match hash {
        "" | "#" => String::new(),
        h if h.starts_with('#') => h.to_string(),
        h => format!("#{h}"),
    }
}

impl Host for MemoryHost {
    fn has_browsing_context(&self) -> bool {
        self.0.browsing_context
    }

    fn hash(&self) -> String {
        self.current_hash()
    }

    fn clear_hash_silently(&self) {
        self.0.record(HostOp::ClearHash);
        self.0.hash.borrow_mut().clear();
    }

    fn anchor_for(&self, hash: &str) -> Option<Rc<dyn Focus>> {
        self.0
            .anchors
            .borrow()
            .iter()
            .find(|a| a.href == hash)
            .cloned()
            .map(|a| a as Rc<dyn Focus>)
    }

    fn set_scroll_lock(&self, engaged: bool) {
        self.0.record(HostOp::ScrollLock(engaged));
        self.0.scroll_locked.set(engaged);
    }

    fn add_hash_listener(&self, listener: Listener) -> ListenerId {
        self.0.hash_listeners.subscribe(listener)
    }

    fn remove_hash_listener(&self, id: ListenerId) {
        self.0.hash_listeners.unsubscribe(id);
    }
}

/// An element carrying an `href`.
pub struct MemoryAnchor {
    href: String,
    host: Weak<State>,
}

impl MemoryAnchor {
    pub fn href(&self) -> &str {
        &self.href
    }
}

impl Focus for MemoryAnchor {
    fn focus(&self) {
        if let Some(host) = self.host.upgrade() {
            host.record(HostOp::Focus(self.href.clone()));
            *host.focused.borrow_mut() = Some(self.href.clone());
        }
    }
}

struct DialogState {
    tag: String,
    open: Cell<bool>,
    close_listeners: Listeners,
    host: Weak<State>,
}

/// A dialog element (or, via [`MemoryHost::create_element`], some other
/// element posing as one).
#[derive(Clone)]
pub struct MemoryDialog(Rc<DialogState>);

impl MemoryDialog {
    /// Native dismissal (Escape key, form `method=dialog`). Not journaled:
    /// it is the user, not the controller, closing the dialog.
    pub fn press_escape(&self) {
        self.finish_close();
    }

    pub fn close_listener_count(&self) -> usize {
        self.0.close_listeners.len()
    }

    fn finish_close(&self) {
        if !self.0.open.replace(false) {
            return;
        }
        if let Some(host) = self.0.host.upgrade() {
            host.queue
                .borrow_mut()
                .push_back(Notification::DialogClosed(self.clone()));
        }
    }

    fn record(&self, op: HostOp) {
        if let Some(host) = self.0.host.upgrade() {
            host.record(op);
        }
    }
}

impl Dialog for MemoryDialog {
    fn tag_name(&self) -> String {
        self.0.tag.clone()
    }

    fn is_open(&self) -> bool {
        self.0.open.get()
    }

    fn show_modal(&self) -> Result<(), WidgetError> {
        self.record(HostOp::ShowModal);
        if self.0.open.replace(true) {
            return Err(WidgetError::InvalidState("dialog is already open".into()));
        }
        Ok(())
    }

    fn close(&self) {
        self.record(HostOp::Close);
        self.finish_close();
    }

    fn add_close_listener(&self, listener: Listener) -> ListenerId {
        self.0.close_listeners.subscribe(listener)
    }

    fn remove_close_listener(&self, id: ListenerId) {
        self.0.close_listeners.unsubscribe(id);
    }
}

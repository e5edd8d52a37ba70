use std::cell::RefCell;
use std::rc::Rc;

use crate::capability::{Dialog, Host};
use crate::effects::Dispose;
use crate::error::ControllerError;
use crate::policy::{ControllerOptions, OverflowPolicy};

/// Keeps one dialog open exactly while the address fragment names an
/// existing anchor (`[href='#...']`), and clears the fragment when the
/// dialog is dismissed.
///
/// Listeners stay registered until [`dispose`](Self::dispose) is called;
/// dropping the controller value does not detach it.
pub struct HashDialogController {
    inner: Rc<Inner>,
    dispose: Dispose,
}

struct Inner {
    host: Rc<dyn Host>,
    dialog: Rc<dyn Dialog>,
    overflow: OverflowPolicy,
    on_hash_removal: Option<Rc<dyn Fn()>>,
    /// Hash that last opened the dialog; its anchor gets focus back when the
    /// dialog closes under a different (or no) anchor.
    opened_for: RefCell<Option<String>>,
}

impl HashDialogController {
    /// Validates the arguments, reconciles once against the current hash,
    /// then subscribes to fragment changes and the dialog's close event.
    pub fn new(
        host: Rc<dyn Host>,
        dialog: Rc<dyn Dialog>,
        overflow: OverflowPolicy,
        options: ControllerOptions,
    ) -> Result<Self, ControllerError> {
        check_environment(host.as_ref())?;
        check_dialog(dialog.as_ref())?;
        Ok(Self::attach(host, dialog, overflow, options))
    }

    fn attach(
        host: Rc<dyn Host>,
        dialog: Rc<dyn Dialog>,
        overflow: OverflowPolicy,
        options: ControllerOptions,
    ) -> Self {
        let inner = Rc::new(Inner {
            host,
            dialog,
            overflow,
            on_hash_removal: options.on_hash_removal,
            opened_for: RefCell::new(None),
        });
        log::debug!("attaching hash dialog controller (overflow: {overflow})");

        inner.reconcile();

        let hash_id = inner.host.add_hash_listener({
            let inner = inner.clone();
            Rc::new(move || inner.reconcile())
        });
        let close_id = inner.dialog.add_close_listener({
            let inner = inner.clone();
            Rc::new(move || inner.close())
        });

        // The listeners own clones of `inner`; removing them releases it.
        let dispose = Dispose::new({
            let host = inner.host.clone();
            let dialog = inner.dialog.clone();
            move || {
                host.remove_hash_listener(hash_id);
                dialog.remove_close_listener(close_id);
                log::debug!("hash dialog controller detached");
            }
        });

        Self { inner, dispose }
    }

    /// Re-derive the dialog state from the current hash, as if the fragment
    /// had just changed. Useful after anchors were added to the page.
    pub fn reconcile(&self) {
        if self.is_attached() {
            self.inner.reconcile();
        }
    }

    /// Remove both listeners. Idempotent.
    pub fn dispose(&self) {
        self.dispose.run();
    }

    pub fn is_attached(&self) -> bool {
        !self.dispose.is_disposed()
    }

    /// A handle that detaches this controller when run.
    pub fn handle(&self) -> Dispose {
        self.dispose.clone()
    }

    pub fn overflow(&self) -> OverflowPolicy {
        self.inner.overflow
    }
}

impl std::fmt::Debug for HashDialogController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HashDialogController")
            .field("overflow", &self.inner.overflow)
            .field("attached", &self.is_attached())
            .finish()
    }
}

impl Inner {
    fn reconcile(&self) {
        let hash = self.host.hash();
        if hash.is_empty() || self.host.anchor_for(&hash).is_none() {
            log::trace!("no anchor for {hash:?}, closing");
            return self.close();
        }

        if self.overflow.manages_scroll_lock() {
            self.host.set_scroll_lock(true);
        }
        *self.opened_for.borrow_mut() = Some(hash.clone());
        if !self.dialog.is_open() {
            log::trace!("opening dialog for {hash:?}");
            if let Err(e) = self.dialog.show_modal() {
                log::warn!("showModal failed for {hash:?}: {e}");
            }
        }
    }

    fn close(&self) {
        let hash = self.host.hash();
        let opener = self.opened_for.borrow_mut().take();

        // Silent, so the fragment change does not re-enter `reconcile`.
        if !hash.is_empty() {
            self.host.clear_hash_silently();
            if let Some(cb) = &self.on_hash_removal {
                cb();
            }
        }
        if self.overflow.manages_scroll_lock() {
            self.host.set_scroll_lock(false);
        }
        self.dialog.close();

        let anchor = if hash.is_empty() {
            None
        } else {
            self.host.anchor_for(&hash)
        }
        .or_else(|| opener.as_deref().and_then(|h| self.host.anchor_for(h)));
        if let Some(anchor) = anchor {
            log::trace!("returning focus after closing for {hash:?}");
            anchor.focus();
        }
    }
}

/// Fails unless `host` has a window/document to work against.
pub fn check_environment(host: &dyn Host) -> Result<(), ControllerError> {
    if host.has_browsing_context() {
        Ok(())
    } else {
        Err(ControllerError::Environment("window is not defined".into()))
    }
}

fn check_dialog(dialog: &dyn Dialog) -> Result<(), ControllerError> {
    // Exact match: namespaced (XML) `dialog` elements report a lowercase
    // tag and are not dialog widgets.
    if dialog.tag_name() == "DIALOG" {
        Ok(())
    } else {
        Err(ControllerError::InvalidArgument(
            "invalid dialog argument".into(),
        ))
    }
}

/// Attach a [`HashDialogController`] from loosely typed arguments and return
/// only its disposal handle.
///
/// Checks run in order (environment, dialog, overflow) and nothing is
/// touched unless all of them pass.
pub fn control_dialog_with_url_hash(
    host: Rc<dyn Host>,
    dialog: Rc<dyn Dialog>,
    overflow: &str,
    options: Option<ControllerOptions>,
) -> Result<Dispose, ControllerError> {
    check_environment(host.as_ref())?;
    check_dialog(dialog.as_ref())?;
    let overflow: OverflowPolicy = overflow.parse()?;
    let controller =
        HashDialogController::attach(host, dialog, overflow, options.unwrap_or_default());
    Ok(controller.handle())
}

use std::cell::RefCell;
use std::rc::Rc;

use slotmap::{SlotMap, new_key_type};
use smallvec::SmallVec;

new_key_type! {
    /// Registration handle for a listener added to a [`Listeners`] list or to
    /// a host/dialog capability.
    pub struct ListenerId;
}

pub type Listener = Rc<dyn Fn()>;

/// Notification fan-out for a single event kind.
///
/// Emission snapshots the registered listeners first, so a listener may
/// add or remove listeners (including itself) while being notified. A
/// listener removed during emission is skipped if it has not run yet.
#[derive(Default)]
pub struct Listeners {
    subs: RefCell<SlotMap<ListenerId, Listener>>,
}

impl Listeners {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, f: Listener) -> ListenerId {
        self.subs.borrow_mut().insert(f)
    }

    /// Returns false if `id` was not (or no longer) registered.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        self.subs.borrow_mut().remove(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.subs.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.subs.borrow().is_empty()
    }

    pub fn emit(&self) {
        let ids: SmallVec<[ListenerId; 4]> = self.subs.borrow().keys().collect();
        for id in ids {
            let f = self.subs.borrow().get(id).cloned();
            if let Some(f) = f {
                f();
            }
        }
    }
}

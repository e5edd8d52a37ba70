use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::memory::{HostOp, MemoryDialog, MemoryHost};
use crate::*;

fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn page(hash: &str, anchors: &[&str]) -> (MemoryHost, MemoryDialog) {
    init_logs();
    let host = MemoryHost::new().with_hash(hash);
    for href in anchors {
        host.add_anchor(href);
    }
    let dialog = host.create_dialog();
    (host, dialog)
}

fn attach(
    host: &MemoryHost,
    dialog: &MemoryDialog,
    overflow: OverflowPolicy,
    options: ControllerOptions,
) -> HashDialogController {
    HashDialogController::new(
        Rc::new(host.clone()),
        Rc::new(dialog.clone()),
        overflow,
        options,
    )
    .unwrap()
}

fn counter() -> (Rc<Cell<u32>>, ControllerOptions) {
    let calls = Rc::new(Cell::new(0));
    let options = ControllerOptions::new().on_hash_removal({
        let calls = calls.clone();
        move || calls.set(calls.get() + 1)
    });
    (calls, options)
}

#[test]
fn test_opens_when_initial_hash_has_anchor() {
    let (host, dialog) = page("#a", &["#a"]);
    let _c = attach(&host, &dialog, OverflowPolicy::Auto, ControllerOptions::default());

    assert!(dialog.is_open());
    assert!(host.scroll_locked());
    assert_eq!(host.pending(), 0);
    insta::assert_snapshot!(host.journal_text(), @r"
    scroll-lock on
    show-modal
    ");
}

#[test]
fn test_empty_initial_hash_leaves_dialog_closed() {
    let (host, dialog) = page("", &["#a"]);
    let (calls, options) = counter();
    let _c = attach(&host, &dialog, OverflowPolicy::Auto, options);

    assert!(!dialog.is_open());
    assert!(!host.scroll_locked());
    assert_eq!(host.focused(), None);
    assert_eq!(calls.get(), 0);
    assert!(!host.journal().contains(&HostOp::ClearHash));
    assert!(!host.journal().contains(&HostOp::ShowModal));
}

#[test]
fn test_initial_hash_without_anchor_is_cleared() {
    let (host, dialog) = page("#missing", &["#a"]);
    let _c = attach(&host, &dialog, OverflowPolicy::Auto, ControllerOptions::default());

    assert!(!dialog.is_open());
    assert_eq!(host.current_hash(), "");
    insta::assert_snapshot!(host.journal_text(), @r"
    clear-hash
    scroll-lock off
    close
    ");
}

#[test]
fn test_navigating_to_unknown_hash_closes_and_refocuses_opener() {
    let (host, dialog) = page("#a", &["#a"]);
    let (calls, options) = counter();
    let _c = attach(&host, &dialog, OverflowPolicy::Auto, options);
    host.take_journal();

    host.navigate("#b");
    // hashchange, then the dialog's own close event
    assert_eq!(host.run_until_idle(), 2);

    assert!(!dialog.is_open());
    assert!(!host.scroll_locked());
    assert_eq!(host.current_hash(), "");
    assert_eq!(host.focused().as_deref(), Some("#a"));
    assert_eq!(calls.get(), 1);
    insta::assert_snapshot!(host.journal_text(), @r"
    clear-hash
    scroll-lock off
    close
    focus #a
    scroll-lock off
    close
    ");
}

#[test]
fn test_escape_clears_hash_and_notifies() {
    let (host, dialog) = page("#a", &["#a"]);
    let (calls, options) = counter();
    let _c = attach(&host, &dialog, OverflowPolicy::Auto, options);
    host.take_journal();

    dialog.press_escape();
    assert_eq!(host.run_until_idle(), 1);

    assert!(!dialog.is_open());
    assert_eq!(host.current_hash(), "");
    assert_eq!(host.focused().as_deref(), Some("#a"));
    assert_eq!(calls.get(), 1);
    insta::assert_snapshot!(host.journal_text(), @r"
    clear-hash
    scroll-lock off
    close
    focus #a
    ");
}

#[test]
fn test_round_trip_through_navigation_and_close() {
    let (host, dialog) = page("", &["#x"]);
    let _c = attach(&host, &dialog, OverflowPolicy::Auto, ControllerOptions::default());

    host.navigate("#x");
    host.run_until_idle();
    assert!(dialog.is_open());
    assert!(host.scroll_locked());
    assert_eq!(host.current_hash(), "#x");

    dialog.press_escape();
    host.run_until_idle();
    assert!(!dialog.is_open());
    assert!(!host.scroll_locked());
    assert_eq!(host.current_hash(), "");
    assert_eq!(host.focused().as_deref(), Some("#x"));
}

#[test]
fn test_reconcile_twice_shows_modal_once() {
    let (host, dialog) = page("#a", &["#a"]);
    let c = attach(&host, &dialog, OverflowPolicy::Auto, ControllerOptions::default());

    c.reconcile();
    c.reconcile();

    let shows = host
        .journal()
        .iter()
        .filter(|op| **op == HostOp::ShowModal)
        .count();
    assert_eq!(shows, 1);
    assert!(dialog.is_open());
}

#[test]
fn test_switching_between_anchors_keeps_dialog_open() {
    let (host, dialog) = page("#a", &["#a", "#c"]);
    let _c = attach(&host, &dialog, OverflowPolicy::Auto, ControllerOptions::default());
    host.take_journal();

    host.navigate("#c");
    host.run_until_idle();
    assert!(dialog.is_open());
    insta::assert_snapshot!(host.journal_text(), @"scroll-lock on");

    // focus goes back to the link for the hash that was showing last
    host.take_journal();
    dialog.press_escape();
    host.run_until_idle();
    assert_eq!(host.focused().as_deref(), Some("#c"));
}

#[test]
fn test_close_sequence_is_idempotent() {
    let (host, dialog) = page("", &[]);
    let c = attach(&host, &dialog, OverflowPolicy::Auto, ControllerOptions::default());

    c.reconcile();
    c.reconcile();

    assert!(!dialog.is_open());
    assert_eq!(host.pending(), 0);
    insta::assert_snapshot!(host.journal_text(), @r"
    scroll-lock off
    close
    scroll-lock off
    close
    scroll-lock off
    close
    ");
}

#[test]
fn test_invariant_holds_after_every_transition() {
    let (host, dialog) = page("", &["#a", "#c"]);
    let _c = attach(&host, &dialog, OverflowPolicy::Auto, ControllerOptions::default());

    for hash in ["#a", "#b", "#a", "", "#c", "#a", "#a", "#zzz", "#c"] {
        host.navigate(hash);
        host.run_until_idle();

        let current = host.current_hash();
        let authorized = !current.is_empty() && host.anchor_for(&current).is_some();
        assert_eq!(dialog.is_open(), authorized, "after navigating to {hash:?}");
        assert_eq!(host.scroll_locked(), authorized, "after navigating to {hash:?}");
    }
}

#[test]
fn test_removed_anchor_closes_on_next_reconcile() {
    let (host, dialog) = page("#a", &["#a"]);
    let c = attach(&host, &dialog, OverflowPolicy::Auto, ControllerOptions::default());

    host.remove_anchor("#a");
    // no notification yet, the dialog stays as it was
    assert!(dialog.is_open());

    c.reconcile();
    host.run_until_idle();
    assert!(!dialog.is_open());
    assert_eq!(host.current_hash(), "");
    assert_eq!(host.focused(), None);
}

#[test]
fn test_anchor_added_after_construction() {
    let (host, dialog) = page("#late", &[]);
    let c = attach(&host, &dialog, OverflowPolicy::Auto, ControllerOptions::default());
    assert!(!dialog.is_open());

    host.add_anchor("#late");
    host.navigate("#late");
    host.run_until_idle();
    assert!(dialog.is_open());
    assert!(c.is_attached());
}

#[test]
fn test_manual_policy_never_touches_scroll_lock() {
    let (host, dialog) = page("#a", &["#a"]);
    let _c = attach(&host, &dialog, OverflowPolicy::Manual, ControllerOptions::default());

    host.navigate("#b");
    host.run_until_idle();
    host.navigate("#a");
    host.run_until_idle();
    assert!(dialog.is_open());
    dialog.press_escape();
    host.run_until_idle();
    host.navigate("");
    host.run_until_idle();

    assert!(
        !host
            .journal()
            .iter()
            .any(|op| matches!(op, HostOp::ScrollLock(_)))
    );
    assert!(!host.scroll_locked());
}

#[test]
fn test_dispose_stops_reconciliation() {
    let (host, dialog) = page("#a", &["#a", "#b"]);
    let c = attach(&host, &dialog, OverflowPolicy::Auto, ControllerOptions::default());
    assert_eq!(host.hash_listener_count(), 1);
    assert_eq!(dialog.close_listener_count(), 1);

    c.dispose();
    c.dispose();
    assert!(!c.is_attached());
    assert_eq!(host.hash_listener_count(), 0);
    assert_eq!(dialog.close_listener_count(), 0);

    host.take_journal();
    host.navigate("#zzz");
    host.run_until_idle();
    dialog.press_escape();
    host.run_until_idle();
    c.reconcile();

    assert!(host.journal().is_empty());
    assert_eq!(host.current_hash(), "#zzz");
}

#[test]
fn test_queued_close_after_dispose_is_ignored() {
    let (host, dialog) = page("#a", &["#a"]);
    let handle = attach(&host, &dialog, OverflowPolicy::Auto, ControllerOptions::default()).handle();

    dialog.press_escape();
    assert_eq!(host.pending(), 1);
    handle.run();
    host.take_journal();

    host.run_until_idle();
    assert!(host.journal().is_empty());
    assert_eq!(host.current_hash(), "#a");
}

#[test]
fn test_dispose_from_hash_removal_callback() {
    let (host, dialog) = page("#a", &["#a"]);
    let slot: Rc<RefCell<Option<Dispose>>> = Rc::new(RefCell::new(None));
    let options = ControllerOptions::new().on_hash_removal({
        let slot = slot.clone();
        move || {
            if let Some(d) = slot.borrow().as_ref() {
                d.run();
            }
        }
    });
    let c = attach(&host, &dialog, OverflowPolicy::Auto, options);
    *slot.borrow_mut() = Some(c.handle());

    dialog.press_escape();
    host.run_until_idle();
    assert!(!c.is_attached());
    // the interrupted sequence still finished
    assert!(!host.scroll_locked());
    assert_eq!(host.focused().as_deref(), Some("#a"));

    host.navigate("#a");
    host.run_until_idle();
    assert!(!dialog.is_open());
}

#[test]
fn test_rejects_non_dialog_without_side_effects() {
    let (host, _) = page("#a", &["#a"]);
    let div = host.create_element("div");

    let err = HashDialogController::new(
        Rc::new(host.clone()),
        Rc::new(div.clone()),
        OverflowPolicy::Auto,
        ControllerOptions::default(),
    )
    .unwrap_err();

    assert_eq!(err, ControllerError::InvalidArgument("invalid dialog argument".into()));
    assert_eq!(err.name(), "InvalidArgumentError");
    assert_eq!(host.hash_listener_count(), 0);
    assert_eq!(div.close_listener_count(), 0);
    assert!(host.journal().is_empty());
    assert_eq!(host.current_hash(), "#a");
}

#[test]
fn test_rejects_lowercase_dialog_tag() {
    let (host, _) = page("#a", &["#a"]);
    let xml_dialog = host.create_element_ns("dialog");

    let err = HashDialogController::new(
        Rc::new(host.clone()),
        Rc::new(xml_dialog.clone()),
        OverflowPolicy::Auto,
        ControllerOptions::default(),
    )
    .unwrap_err();

    assert_eq!(err.name(), "InvalidArgumentError");
    assert_eq!(host.hash_listener_count(), 0);
    assert_eq!(xml_dialog.close_listener_count(), 0);
    assert!(host.journal().is_empty());

    // an HTML dialog created from a lowercase tag name is still accepted
    let html_dialog = host.create_element("dialog");
    assert_eq!(html_dialog.tag_name(), "DIALOG");
    let _c = attach(&host, &html_dialog, OverflowPolicy::Auto, ControllerOptions::default());
    assert!(html_dialog.is_open());
}

#[test]
fn test_rejects_missing_browsing_context() {
    init_logs();
    let host = MemoryHost::detached();
    let dialog = host.create_dialog();

    let err = control_dialog_with_url_hash(
        Rc::new(host.clone()),
        Rc::new(dialog.clone()),
        "auto",
        None,
    )
    .unwrap_err();

    assert_eq!(err.name(), "EnvironmentError");
    assert_eq!(err.to_string(), "window is not defined");
    assert_eq!(host.hash_listener_count(), 0);
    assert_eq!(dialog.close_listener_count(), 0);
}

#[test]
fn test_environment_checked_before_arguments() {
    let host = MemoryHost::detached();
    let div = host.create_element("div");

    let err =
        control_dialog_with_url_hash(Rc::new(host), Rc::new(div), "sideways", None).unwrap_err();
    assert!(matches!(err, ControllerError::Environment(_)));
}

#[test]
fn test_rejects_unknown_overflow_without_side_effects() {
    let (host, dialog) = page("#a", &["#a"]);

    let err = control_dialog_with_url_hash(
        Rc::new(host.clone()),
        Rc::new(dialog.clone()),
        "hidden",
        None,
    )
    .unwrap_err();

    assert_eq!(err, ControllerError::InvalidArgument("invalid overflow argument".into()));
    assert!(!dialog.is_open());
    assert!(host.journal().is_empty());
    assert_eq!(host.hash_listener_count(), 0);
}

#[test]
fn test_free_function_handle_detaches() {
    let (host, dialog) = page("#a", &["#a"]);
    let (calls, options) = counter();

    let handle = control_dialog_with_url_hash(
        Rc::new(host.clone()),
        Rc::new(dialog.clone()),
        "manual",
        Some(options),
    )
    .unwrap();
    assert!(dialog.is_open());

    // still attached although the controller value itself is gone
    dialog.press_escape();
    host.run_until_idle();
    assert_eq!(calls.get(), 1);

    handle.run();
    assert!(handle.is_disposed());
    assert_eq!(host.hash_listener_count(), 0);
}

#[test]
fn test_overflow_policy_parsing() {
    assert_eq!("auto".parse::<OverflowPolicy>(), Ok(OverflowPolicy::Auto));
    assert_eq!(OverflowPolicy::try_from("manual"), Ok(OverflowPolicy::Manual));
    assert!("Auto".parse::<OverflowPolicy>().is_err());
    assert!("".parse::<OverflowPolicy>().is_err());
    assert_eq!(OverflowPolicy::Manual.to_string(), "manual");
    assert_eq!(OverflowPolicy::default(), OverflowPolicy::Auto);
}

#[test]
fn test_navigate_normalizes_and_skips_same_hash() {
    let host = MemoryHost::new();
    host.navigate("a");
    assert_eq!(host.current_hash(), "#a");
    host.navigate("#a");
    assert_eq!(host.pending(), 1);
    host.navigate("#");
    assert_eq!(host.current_hash(), "");
    assert_eq!(host.pending(), 2);
}

#[test]
fn test_show_modal_on_open_dialog_fails() {
    let host = MemoryHost::new();
    let dialog = host.create_dialog();
    assert!(dialog.show_modal().is_ok());
    assert!(matches!(dialog.show_modal(), Err(WidgetError::InvalidState(_))));
}

#[test]
fn test_dispose_runs_once() {
    let runs = Rc::new(Cell::new(0));
    let d = Dispose::new({
        let runs = runs.clone();
        move || runs.set(runs.get() + 1)
    });
    let d2 = d.clone();

    assert!(!d.is_disposed());
    d.run();
    d2.run();
    assert_eq!(runs.get(), 1);
    assert!(d2.is_disposed());
    assert!(Dispose::noop().is_disposed());
}

#[test]
fn test_listener_may_unsubscribe_during_emit() {
    let listeners = Rc::new(Listeners::new());
    let seen = Rc::new(RefCell::new(Vec::new()));
    let second: Rc<Cell<Option<ListenerId>>> = Rc::new(Cell::new(None));

    listeners.subscribe({
        let listeners = listeners.clone();
        let seen = seen.clone();
        let second = second.clone();
        Rc::new(move || {
            seen.borrow_mut().push("first");
            if let Some(id) = second.get() {
                listeners.unsubscribe(id);
            }
        })
    });
    let id = listeners.subscribe({
        let seen = seen.clone();
        Rc::new(move || seen.borrow_mut().push("second"))
    });
    second.set(Some(id));

    listeners.emit();
    assert_eq!(*seen.borrow(), vec!["first"]);
    assert_eq!(listeners.len(), 1);
    assert!(!listeners.unsubscribe(id));
}

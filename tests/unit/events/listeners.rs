use super::*;
use crate::core::{DiagnosticReport, HandlerError};
use crate::models::ComponentOptions;
use serde_json::json;
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Default)]
struct RecordingOps {
    calls: Vec<String>,
}

impl ListenerOps for RecordingOps {
    fn add(&mut self, event: &str, _handler: Handler) {
        self.calls.push(format!("add:{}", event));
    }

    fn remove(&mut self, event: &str, _handler: &Handler) {
        self.calls.push(format!("remove:{}", event));
    }

    fn create_once(&mut self, event: &str, handler: Handler) -> Handler {
        self.calls.push(format!("once:{}", event));
        Handler::once(event, handler)
    }

    fn invalid_handler(&mut self, event: &str) {
        self.calls.push(format!("invalid:{}", event));
    }
}

fn noop() -> Handler {
    Handler::new(|_, _, _| Ok(()))
}

fn map(entries: &[(&str, ListenerBinding)]) -> ListenerMap {
    entries
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

/// Reconciles `listeners` against nothing so they carry attachments.
fn attached(ops: &mut RecordingOps, mut listeners: ListenerMap) -> ListenerMap {
    reconcile(ops, &mut listeners, &ListenerMap::new());
    ops.calls.clear();
    listeners
}

#[test]
fn fresh_listeners_are_all_added() {
    let mut ops = RecordingOps::default();
    let mut new = map(&[
        ("click", ListenerBinding::new(noop())),
        ("hover", ListenerBinding::new(noop())),
    ]);

    reconcile(&mut ops, &mut new, &ListenerMap::new());

    assert_eq!(ops.calls, vec!["add:click", "add:hover"]);
    assert!(new["click"].attached().is_some());
}

#[test]
fn adding_a_name_adds_only_that_name() {
    let (f1, f2) = (noop(), noop());
    let mut ops = RecordingOps::default();
    let old = attached(&mut ops, map(&[("click", ListenerBinding::new(f1.clone()))]));

    let mut new = map(&[
        ("click", ListenerBinding::new(f1)),
        ("hover", ListenerBinding::new(f2)),
    ]);
    reconcile(&mut ops, &mut new, &old);

    assert_eq!(ops.calls, vec!["add:hover"]);
    assert!(new["click"]
        .attached()
        .unwrap()
        .ptr_eq(old["click"].attached().unwrap()));
}

#[test]
fn dropping_a_name_removes_only_that_name() {
    let (f1, f2) = (noop(), noop());
    let mut ops = RecordingOps::default();
    let old = attached(
        &mut ops,
        map(&[
            ("click", ListenerBinding::new(f1.clone())),
            ("hover", ListenerBinding::new(f2)),
        ]),
    );

    let mut new = map(&[("click", ListenerBinding::new(f1))]);
    reconcile(&mut ops, &mut new, &old);

    assert_eq!(ops.calls, vec!["remove:hover"]);
}

#[test]
fn unchanged_listeners_cause_no_calls() {
    let f1 = noop();
    let mut ops = RecordingOps::default();
    let old = attached(&mut ops, map(&[("click", ListenerBinding::new(f1.clone()))]));

    let mut new = map(&[("click", ListenerBinding::new(f1))]);
    reconcile(&mut ops, &mut new, &old);

    assert!(ops.calls.is_empty());
}

#[test]
fn changed_handler_is_patched_in_place() {
    let (f1, f2) = (noop(), noop());
    let mut ops = RecordingOps::default();
    let old = attached(&mut ops, map(&[("click", ListenerBinding::new(f1))]));

    let mut new = map(&[("click", ListenerBinding::new(f2.clone()))]);
    reconcile(&mut ops, &mut new, &old);

    assert!(ops.calls.is_empty());
    let invoker = new["click"].attached().unwrap();
    let fns = invoker.fns().unwrap();
    assert_eq!(fns.len(), 1);
    assert!(fns[0].ptr_eq(&f2));
}

#[test]
fn once_bindings_go_through_create_once() {
    let mut ops = RecordingOps::default();
    let mut new = map(&[("submit", ListenerBinding::new(noop()).once())]);

    reconcile(&mut ops, &mut new, &ListenerMap::new());

    assert_eq!(ops.calls, vec!["once:submit", "add:submit"]);
    assert!(new["submit"].attached().unwrap().is_once());
}

#[test]
fn toggling_once_reattaches() {
    let f1 = noop();
    let mut ops = RecordingOps::default();
    let old = attached(&mut ops, map(&[("submit", ListenerBinding::new(f1.clone()))]));

    let mut new = map(&[("submit", ListenerBinding::new(f1).once())]);
    reconcile(&mut ops, &mut new, &old);

    assert_eq!(ops.calls, vec!["remove:submit", "once:submit", "add:submit"]);
}

#[test]
fn empty_binding_is_reported_and_old_one_removed() {
    let mut ops = RecordingOps::default();
    let old = attached(&mut ops, map(&[("click", ListenerBinding::new(noop()))]));

    let mut new = map(&[("click", ListenerBinding::many(Vec::new()))]);
    reconcile(&mut ops, &mut new, &old);

    assert_eq!(ops.calls, vec!["invalid:click", "remove:click"]);
}

#[test]
fn parent_listeners_land_on_the_instance_bus() {
    let mut tree = ComponentTree::new();
    let root = tree.create(None, ComponentOptions::new()).unwrap();

    let seen = Rc::new(RefCell::new(Vec::new()));
    let log = Rc::clone(&seen);
    let on_input = Handler::new(move |_, _, args| {
        log.borrow_mut().push(args.to_vec());
        Ok(())
    });
    let listeners = map(&[("input", ListenerBinding::new(on_input))]);
    let child = tree
        .create(Some(root), ComponentOptions::new().with_listeners(listeners))
        .unwrap();

    tree.emit(child, "input", &[json!("x")]);

    assert_eq!(*seen.borrow(), vec![vec![json!("x")]]);
    assert_eq!(tree.listener_count(child, "input"), 1);
}

#[test]
fn panicking_parent_listener_does_not_stop_its_siblings() {
    let mut tree = ComponentTree::new();
    let root = tree.create(None, ComponentOptions::new()).unwrap();
    let failures = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&failures);
    tree.set_error_handler(move |failure| sink.borrow_mut().push(failure.clone()));

    let hits = Rc::new(RefCell::new(0));
    let counter = {
        let hits = Rc::clone(&hits);
        Handler::new(move |_, _, _| {
            *hits.borrow_mut() += 1;
            Ok(())
        })
    };
    let panicking = Handler::new(|_, _, _| panic!("listener exploded"));
    let listeners = map(&[("click", ListenerBinding::many(vec![panicking, counter]))]);
    let child = tree
        .create(Some(root), ComponentOptions::new().with_listeners(listeners))
        .unwrap();

    tree.emit(child, "click", &[]);

    assert_eq!(*hits.borrow(), 1);
    assert_eq!(failures.borrow().len(), 1);
    assert!(matches!(failures.borrow()[0].error, HandlerError::Panicked(_)));
}

#[test]
fn every_failing_parent_listener_is_reported() {
    let mut tree = ComponentTree::new();
    let root = tree.create(None, ComponentOptions::new()).unwrap();
    let failures = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&failures);
    tree.set_error_handler(move |failure| sink.borrow_mut().push(failure.clone()));

    let first = Handler::new(|_, _, _| Err(HandlerError::failed("first")));
    let second = Handler::new(|_, _, _| Err(HandlerError::failed("second")));
    let listeners = map(&[("click", ListenerBinding::many(vec![first, second]))]);
    let child = tree
        .create(Some(root), ComponentOptions::new().with_listeners(listeners))
        .unwrap();

    tree.emit(child, "click", &[]);

    let failures = failures.borrow();
    assert_eq!(failures.len(), 2);
    assert!(failures.iter().all(|f| f.instance == child && f.event == "click"));
}

#[test]
fn updating_parent_listeners_diffs_against_the_last_set() {
    let mut tree = ComponentTree::new();
    let root = tree.create(None, ComponentOptions::new()).unwrap();
    let hits = Rc::new(RefCell::new(Vec::<&'static str>::new()));
    let tagged = |tag: &'static str| {
        let hits = Rc::clone(&hits);
        Handler::new(move |_, _, _| {
            hits.borrow_mut().push(tag);
            Ok(())
        })
    };

    let (a, b) = (tagged("a"), tagged("b"));
    let child = tree
        .create(
            Some(root),
            ComponentOptions::new()
                .with_listeners(map(&[("change", ListenerBinding::new(a.clone()))])),
        )
        .unwrap();

    tree.update_parent_listeners(
        child,
        map(&[
            ("change", ListenerBinding::new(b)),
            ("close", ListenerBinding::new(a)),
        ]),
    );
    assert_eq!(tree.listener_count(child, "change"), 1);
    assert_eq!(tree.listener_count(child, "close"), 1);

    tree.emit(child, "change", &[]).emit(child, "close", &[]);
    assert_eq!(*hits.borrow(), vec!["b", "a"]);

    tree.update_parent_listeners(child, ListenerMap::new());
    assert_eq!(tree.listener_count(child, "change"), 0);
    assert_eq!(tree.listener_count(child, "close"), 0);
}

#[test]
fn once_parent_listener_fires_once() {
    let mut tree = ComponentTree::new();
    let root = tree.create(None, ComponentOptions::new()).unwrap();
    let hits = Rc::new(RefCell::new(0));
    let counter = Rc::clone(&hits);
    let handler = Handler::new(move |_, _, _| {
        *counter.borrow_mut() += 1;
        Ok(())
    });
    let child = tree
        .create(
            Some(root),
            ComponentOptions::new()
                .with_listeners(map(&[("done", ListenerBinding::new(handler).once())])),
        )
        .unwrap();

    tree.emit(child, "done", &[]).emit(child, "done", &[]);

    assert_eq!(*hits.borrow(), 1);
}

#[test]
fn empty_parent_binding_reports_invalid_handler() {
    let mut tree = ComponentTree::new();
    let reports = Rc::new(RefCell::new(Vec::<DiagnosticReport>::new()));
    let sink = Rc::clone(&reports);
    tree.set_warn_handler(move |report| sink.borrow_mut().push(report.clone()));
    let root = tree.create(None, ComponentOptions::new()).unwrap();

    tree.create(
        Some(root),
        ComponentOptions::new().with_listeners(map(&[("click", ListenerBinding::default())])),
    )
    .unwrap();

    assert_eq!(
        reports.borrow()[0].diagnostic,
        Diagnostic::InvalidHandler {
            event: "click".to_string()
        }
    );
}

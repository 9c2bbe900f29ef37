//! Runtime contract integration tests (spec §8 scenario 3 "Parameterized
//! resolve", plus `weak` release and parent-container fallback).

use std::cell::RefCell;
use std::rc::Rc;

use weaver_compiler::model::CompositeType;
use weaver_compiler::runtime::{Container, InstanceKey, Scope};

fn key(name: &str) -> InstanceKey {
    InstanceKey::simple(CompositeType::named(name))
}

fn parameterized_key(name: &str, param: &str) -> InstanceKey {
    InstanceKey::new(CompositeType::named(name), vec![CompositeType::named(param)])
}

#[test]
fn resolutions_differing_only_by_parameter_type_cache_independently() {
    let container = Container::new(None);
    let builds = Rc::new(RefCell::new(Vec::new()));

    let builds_int = Rc::clone(&builds);
    container.register(parameterized_key("Widget", "Int"), Scope::Graph, move |_resolver| {
        builds_int.borrow_mut().push("Int");
        "widget-for-int".to_string()
    });
    let builds_string = Rc::clone(&builds);
    container.register(parameterized_key("Widget", "String"), Scope::Graph, move |_resolver| {
        builds_string.borrow_mut().push("String");
        "widget-for-string".to_string()
    });

    let a = container.resolve::<String>(parameterized_key("Widget", "Int")).unwrap();
    let b = container.resolve::<String>(parameterized_key("Widget", "String")).unwrap();
    assert_eq!(*a, "widget-for-int");
    assert_eq!(*b, "widget-for-string");
    assert_eq!(builds.borrow().len(), 2);
}

#[test]
fn weak_scope_reuses_the_live_instance_but_rebuilds_once_it_is_dropped() {
    let container = Container::new(None);
    let calls = Rc::new(RefCell::new(0));
    let calls_clone = Rc::clone(&calls);
    container.register(key("Session"), Scope::Weak, move |_resolver| {
        *calls_clone.borrow_mut() += 1;
        *calls_clone.borrow()
    });

    let first = container.resolve::<i32>(key("Session")).unwrap();
    assert_eq!(*first, 1);

    // A strong holder is still alive, so the weak cache upgrades instead of rebuilding.
    let still_alive = container.resolve::<i32>(key("Session")).unwrap();
    assert_eq!(*still_alive, 1);
    assert_eq!(*calls.borrow(), 1);

    drop(first);
    drop(still_alive);

    // No external strong holder remains, so the cached weak ref fails to
    // upgrade and the builder runs again.
    let rebuilt = container.resolve::<i32>(key("Session")).unwrap();
    assert_eq!(*rebuilt, 2);
    assert_eq!(*calls.borrow(), 2);
}

#[test]
fn a_child_container_falls_back_to_its_parents_registrations() {
    let parent = Container::new(None);
    parent.register(key("Config"), Scope::Container, |_resolver| "parent-config".to_string());

    let child = Container::new(Some(&parent));
    let resolved = child.resolve::<String>(key("Config")).unwrap();
    assert_eq!(*resolved, "parent-config");
}

#[test]
fn an_unregistered_key_resolves_to_none() {
    let container = Container::new(None);
    assert!(container.resolve::<String>(key("Missing")).is_none());
}

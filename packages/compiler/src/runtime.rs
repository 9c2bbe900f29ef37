//! The runtime contract generated code targets (spec §4.6, §5, §9).
//!
//! A [`Container`] owns a [`BuilderStore`] (read-only during `resolve`) and
//! an [`InstanceCache`] (mutated during `resolve`). Builder closures receive
//! a [`Resolver`] — a non-owning handle back to the container — so the
//! container never retains its own resolved values through the closures it
//! stores; that is the invariant that makes `weak` scope possible (spec §9
//! "Runtime container cycles").

use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak as RcWeak};

use crate::model::CompositeType;

/// Canonical cache identity: the declared abstract type plus an ordered
/// list of parameter types (spec §3 "InstanceKey").
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InstanceKey {
    pub abstract_type: CompositeType,
    pub parameter_types: Vec<CompositeType>,
}

impl InstanceKey {
    pub fn new(abstract_type: CompositeType, parameter_types: Vec<CompositeType>) -> Self {
        InstanceKey { abstract_type, parameter_types }
    }

    pub fn simple(abstract_type: CompositeType) -> Self {
        InstanceKey { abstract_type, parameter_types: Vec::new() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    Transient,
    Graph,
    Container,
    Weak,
    Lazy,
}

type AnyValue = Rc<dyn Any>;
type Builder = Rc<dyn Fn(&Resolver) -> AnyValue>;

/// Maps `InstanceKey -> (scope, builder)`. Lookups fall through to a parent
/// store when no local entry exists, so a type resolved deep in a nested
/// container chain can still find a `container`-scope registration made by
/// an ancestor.
pub struct BuilderStore {
    entries: RefCell<HashMap<InstanceKey, (Scope, Builder)>>,
    parent: Option<Rc<BuilderStore>>,
}

impl BuilderStore {
    pub fn new(parent: Option<Rc<BuilderStore>>) -> Self {
        BuilderStore { entries: RefCell::new(HashMap::new()), parent }
    }

    pub fn set<F>(&self, key: InstanceKey, scope: Scope, builder: F)
    where
        F: Fn(&Resolver) -> AnyValue + 'static,
    {
        self.entries.borrow_mut().insert(key, (scope, Rc::new(builder)));
    }

    pub fn get(&self, key: &InstanceKey) -> Option<(Scope, Builder)> {
        if let Some(entry) = self.entries.borrow().get(key) {
            return Some(entry.clone());
        }
        self.parent.as_ref().and_then(|p| p.get(key))
    }
}

/// Cache slot state for `lazy` scope (spec §9 "Scope `weak` and `lazy`").
/// `container`/`graph`/`transient` don't need the full state machine and
/// are handled directly in `InstanceCache::get_or_build`. `weak` doesn't use
/// this state machine either — it's held as a genuine non-owning `RcWeak`
/// (see `weak_scoped` below), so it needs no explicit `Released` state: it
/// goes stale on its own the moment the last external strong holder drops.
enum CacheState {
    Building,
    Built(AnyValue),
}

/// Per-container instance cache. `graph` entries live in a side table that
/// is cleared when the outermost `resolve` on the current call stack
/// returns (see [`GraphScopeGuard`]); `container`/`lazy` entries live for
/// the container's own lifetime; `weak` entries are held non-owning and
/// rebuilt whenever their last external strong holder has been dropped.
pub struct InstanceCache {
    container_scoped: RefCell<HashMap<InstanceKey, AnyValue>>,
    graph_scoped: RefCell<HashMap<InstanceKey, AnyValue>>,
    lazy: RefCell<HashMap<InstanceKey, CacheState>>,
    weak_scoped: RefCell<HashMap<InstanceKey, RcWeak<dyn Any>>>,
    /// Depth of nested `resolve` calls on this cache; `graph` entries are
    /// released only when this returns to zero.
    resolve_depth: RefCell<usize>,
}

impl Default for InstanceCache {
    fn default() -> Self {
        InstanceCache {
            container_scoped: RefCell::new(HashMap::new()),
            graph_scoped: RefCell::new(HashMap::new()),
            lazy: RefCell::new(HashMap::new()),
            weak_scoped: RefCell::new(HashMap::new()),
            resolve_depth: RefCell::new(0),
        }
    }
}

impl InstanceCache {
    pub fn new() -> Self {
        InstanceCache::default()
    }

    /// Marks entry into a `resolve` call; returns a guard that marks exit
    /// and, if this was the outermost call, releases `graph`-scoped
    /// entries.
    pub fn enter_resolve(self: Rc<Self>) -> GraphScopeGuard {
        *self.resolve_depth.borrow_mut() += 1;
        GraphScopeGuard { cache: self }
    }

    pub fn get_or_build(
        &self,
        key: &InstanceKey,
        scope: Scope,
        build: impl FnOnce() -> AnyValue,
    ) -> AnyValue {
        match scope {
            Scope::Transient => build(),
            Scope::Graph => {
                if let Some(v) = self.graph_scoped.borrow().get(key) {
                    return Rc::clone(v);
                }
                let value = build();
                self.graph_scoped.borrow_mut().insert(key.clone(), Rc::clone(&value));
                value
            }
            Scope::Container => {
                if let Some(v) = self.container_scoped.borrow().get(key) {
                    return Rc::clone(v);
                }
                let value = build();
                self.container_scoped.borrow_mut().insert(key.clone(), Rc::clone(&value));
                value
            }
            Scope::Lazy => {
                let existing = match self.lazy.borrow().get(key) {
                    Some(CacheState::Built(v)) => Some(Rc::clone(v)),
                    _ => None,
                };
                if let Some(v) = existing {
                    return v;
                }
                self.lazy.borrow_mut().insert(key.clone(), CacheState::Building);
                let value = build();
                self.lazy.borrow_mut().insert(key.clone(), CacheState::Built(Rc::clone(&value)));
                value
            }
            Scope::Weak => {
                let existing = self.weak_scoped.borrow().get(key).and_then(RcWeak::upgrade);
                if let Some(v) = existing {
                    return v;
                }
                let value = build();
                self.weak_scoped.borrow_mut().insert(key.clone(), Rc::downgrade(&value));
                value
            }
        }
    }

    fn exit_resolve(&self) {
        let mut depth = self.resolve_depth.borrow_mut();
        *depth = depth.saturating_sub(1);
        if *depth == 0 {
            self.graph_scoped.borrow_mut().clear();
        }
    }
}

/// RAII guard releasing graph-scoped instances when the outermost `resolve`
/// call on a given cache returns (spec §5 "Exiting the outermost `resolve`
/// releases graph-scoped values before returning").
pub struct GraphScopeGuard {
    cache: Rc<InstanceCache>,
}

impl Drop for GraphScopeGuard {
    fn drop(&mut self) {
        self.cache.exit_resolve();
    }
}

/// Non-owning handle to a [`Container`], passed into builder closures so
/// they can resolve their own dependencies without the container retaining
/// itself through its own builder store (spec glossary "Resolver").
#[derive(Clone)]
pub struct Resolver {
    container: RcWeak<ContainerInner>,
}

impl Resolver {
    pub fn resolve<T: 'static>(&self, key: InstanceKey) -> Option<Rc<T>> {
        let container = self.container.upgrade()?;
        container.resolve_any(&key, &self.clone()).and_then(|v| v.downcast::<T>().ok())
    }
}

struct ContainerInner {
    store: Rc<BuilderStore>,
    cache: Rc<InstanceCache>,
}

impl ContainerInner {
    fn resolve_any(&self, key: &InstanceKey, resolver: &Resolver) -> Option<AnyValue> {
        let (scope, builder) = self.store.get(key)?;
        let _guard = Rc::clone(&self.cache).enter_resolve();
        Some(self.cache.get_or_build(key, scope, || builder(resolver)))
    }
}

/// The container generated code constructs. Holds its `BuilderStore` and
/// `InstanceCache`; is reclaimable once all external strong holders drop it,
/// because builder closures only ever receive a non-owning [`Resolver`].
pub struct Container {
    inner: Rc<ContainerInner>,
}

impl Container {
    pub fn new(parent: Option<&Container>) -> Self {
        let parent_store = parent.map(|p| Rc::clone(&p.inner.store));
        Container {
            inner: Rc::new(ContainerInner {
                store: Rc::new(BuilderStore::new(parent_store)),
                cache: Rc::new(InstanceCache::new()),
            }),
        }
    }

    pub fn register<F, T>(&self, key: InstanceKey, scope: Scope, builder: F)
    where
        F: Fn(&Resolver) -> T + 'static,
        T: 'static,
    {
        self.inner.store.set(key, scope, move |resolver| -> AnyValue { Rc::new(builder(resolver)) });
    }

    pub fn resolve<T: 'static>(&self, key: InstanceKey) -> Option<Rc<T>> {
        self.resolver().resolve(key)
    }

    /// A non-owning handle to this container, safe to stash in a builder
    /// closure without creating a retain cycle.
    pub fn resolver(&self) -> Resolver {
        Resolver { container: Rc::downgrade(&self.inner) }
    }

    /// Number of external strong holders of this container (always ≥ 1
    /// while `self` is alive); used by golden tests asserting no retain
    /// cycle survives `register` + `resolve`.
    pub fn strong_count(&self) -> usize {
        Rc::strong_count(&self.inner)
    }
}

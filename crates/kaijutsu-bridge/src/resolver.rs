//! Method resolution: which remote method serves each local interface method.
//!
//! For every method of the local interface, the remote type's methods are
//! scanned in enumeration order and the first one with the same name, the
//! same arity, and parameters at least as broad as the local ones wins.
//! Local methods with no candidate are left out of the map; calling one
//! through a proxy is a `ResolutionFailure`.
//!
//! Maps are cached for the life of the process. Two threads resolving the
//! same pair may both compute it; the results are equivalent, so whichever
//! insert lands last is kept.

use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use dashmap::DashMap;
use kaijutsu_reflect::{MethodDescriptor, MethodId, MethodRef, TypeDescriptor, TypeKey};
use tracing::debug;

/// Cache key: (remote type, local interface).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MethodKey {
    pub remote: TypeKey,
    pub local: TypeKey,
}

impl MethodKey {
    pub fn new(remote: &TypeDescriptor, local: &TypeDescriptor) -> Self {
        Self {
            remote: remote.key(),
            local: local.key(),
        }
    }
}

/// Local method → remote method, for one [`MethodKey`].
#[derive(Debug, Default)]
pub struct MethodMap {
    /// Matched pairs in local enumeration order.
    pairs: Vec<(MethodRef, MethodRef)>,
    index: HashMap<MethodId, usize>,
    unmatched: Vec<MethodRef>,
}

impl MethodMap {
    /// The remote method serving `local`, if any matched.
    pub fn get(&self, local: &MethodDescriptor) -> Option<&MethodRef> {
        self.index.get(&local.id()).map(|&i| &self.pairs[i].1)
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Matched (local, remote) pairs in local enumeration order.
    pub fn pairs(&self) -> impl Iterator<Item = (&MethodRef, &MethodRef)> {
        self.pairs.iter().map(|(l, r)| (l, r))
    }

    /// Local methods that found no remote counterpart.
    pub fn unmatched(&self) -> &[MethodRef] {
        &self.unmatched
    }

    fn compute(remote: &TypeDescriptor, local: &TypeDescriptor) -> Self {
        let candidates = remote.all_methods();
        let mut map = Self::default();

        for method in local.all_methods() {
            match candidates.iter().find(|c| accepts(c, &method)) {
                Some(found) => {
                    map.index.insert(method.id(), map.pairs.len());
                    map.pairs.push((method, Arc::clone(found)));
                }
                None => map.unmatched.push(method),
            }
        }
        map
    }
}

/// Whether `remote` can serve calls made against `local`.
///
/// Parameters are contravariant: each remote parameter type must be
/// assignable from the local one.
fn accepts(remote: &MethodDescriptor, local: &MethodDescriptor) -> bool {
    remote.name() == local.name()
        && remote.arity() == local.arity()
        && remote
            .params()
            .iter()
            .zip(local.params())
            .all(|(r, l)| r.is_assignable_from(l))
}

static CACHE: LazyLock<DashMap<MethodKey, Arc<MethodMap>>> = LazyLock::new(DashMap::new);

/// The method map for (`remote`, `local`), computed on first use.
pub fn resolve(remote: &TypeDescriptor, local: &TypeDescriptor) -> Arc<MethodMap> {
    let key = MethodKey::new(remote, local);
    if let Some(hit) = CACHE.get(&key) {
        return Arc::clone(hit.value());
    }

    let map = Arc::new(MethodMap::compute(remote, local));
    debug!(
        remote = %remote.name(),
        local = %local.name(),
        matched = map.len(),
        unmatched = map.unmatched.len(),
        "Resolved method map"
    );

    CACHE.insert(key, Arc::clone(&map));
    map
}

/// Number of cached method maps.
pub fn cached_entries() -> usize {
    CACHE.len()
}

//! Resource Ring
//!
//! N mutually exclusive resources arranged in a circle: resource `i` is
//! adjacent to resource `(i + 1) mod n`.
//!
//! ## Ordering
//!
//! Each resource carries a sequential [`ResourceId`] assigned at creation.
//! Workers acquire their pair in increasing id order, which is what rules out
//! a circular wait. The id is never derived from a memory address.

use std::{fmt, sync::Arc};

use parking_lot::{Mutex, MutexGuard};

use crate::error::SimulationError;

/// Stable, totally ordered identity of a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResourceId(pub u32);

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{}", self.0)
    }
}

/// A mutual-exclusion guarded unit shared by two adjacent workers.
///
/// The lock is non-reentrant: acquiring it twice from the same thread blocks
/// forever. It also does not poison, so a worker that unwinds while holding
/// it leaves it usable for its neighbours.
#[derive(Debug)]
pub struct Resource {
    id: ResourceId,
    lock: Mutex<()>,
}

/// Held acquisition of a [`Resource`]. Dropping it releases the resource.
#[must_use = "the resource is released as soon as the guard is dropped"]
pub struct ResourceGuard<'a> {
    id: ResourceId,
    _held: MutexGuard<'a, ()>,
}

impl ResourceGuard<'_> {
    /// Identity of the held resource.
    pub fn id(&self) -> ResourceId {
        self.id
    }
}

impl fmt::Debug for ResourceGuard<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceGuard").field("id", &self.id).finish()
    }
}

impl Resource {
    fn new(id: ResourceId) -> Self {
        Self { id, lock: Mutex::new(()) }
    }

    /// Identity used as the acquisition ordering key.
    pub fn id(&self) -> ResourceId {
        self.id
    }

    /// Blocks until the resource is granted.
    pub fn acquire(&self) -> ResourceGuard<'_> {
        ResourceGuard { id: self.id, _held: self.lock.lock() }
    }

    /// Non-blocking probe, `None` if another holder has it.
    pub fn try_acquire(&self) -> Option<ResourceGuard<'_>> {
        self.lock.try_lock().map(|held| ResourceGuard { id: self.id, _held: held })
    }

    /// Whether some holder currently has the resource.
    pub fn is_held(&self) -> bool {
        self.lock.is_locked()
    }
}

/// Fixed circular arrangement of resources.
#[derive(Debug, Clone)]
pub struct ResourceRing {
    resources: Vec<Arc<Resource>>,
}

impl ResourceRing {
    /// Allocate `n` resources with ids `0..n` in creation order.
    pub fn create(n: usize) -> Result<Self, SimulationError> {
        if n < 1 {
            return Err(SimulationError::invalid(format!(
                "resource ring needs at least 1 resource, got {n}"
            )));
        }

        let n = u32::try_from(n)
            .map_err(|_| SimulationError::invalid(format!("ring size {n} exceeds u32::MAX")))?;

        let resources = (0..n).map(|i| Arc::new(Resource::new(ResourceId(i)))).collect();
        Ok(Self { resources })
    }

    /// Number of resources in the ring.
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    /// Always false; a ring holds at least one resource.
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Resource at position `index`.
    pub fn get(&self, index: usize) -> Option<&Arc<Resource>> {
        self.resources.get(index)
    }

    /// Resources in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Resource>> {
        self.resources.iter()
    }

    /// Resources `index` and `(index + 1) mod len`.
    ///
    /// `index` is reduced modulo the ring size first. For a ring of one
    /// resource both halves are the same resource.
    pub fn adjacent(&self, index: usize) -> (Arc<Resource>, Arc<Resource>) {
        let n = self.resources.len();
        let here = index % n;
        let next = (here + 1) % n;
        (Arc::clone(&self.resources[here]), Arc::clone(&self.resources[next]))
    }
}

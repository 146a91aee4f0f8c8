//! The seam between the population and whatever draws it.

use bevy_ecs::prelude::Resource;
use std::collections::BTreeMap;

use crate::category::Category;
use crate::cell::Pose;

/// A place renderables live in.
///
/// The population owns every handle it gets from [`Scene::spawn`] and hands
/// each one back exactly once through [`Scene::release`].
pub trait Scene {
    /// Owned reference to one renderable.
    type Handle;

    /// Build the renderable for `category` and place it at `pose`.
    fn spawn(&mut self, category: Category, pose: Pose) -> Self::Handle;

    /// Free the renderable and everything it owns.
    ///
    /// Must not fail if parts of it are already gone.
    fn release(&mut self, handle: Self::Handle);

    /// Move the renderable.
    fn place(&mut self, handle: &Self::Handle, pose: Pose);

    /// Show or hide the renderable.
    fn set_visible(&mut self, handle: &Self::Handle, visible: bool);
}

/// Handle into a [`LedgerScene`].
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct LedgerHandle(u64);

impl LedgerHandle {
    pub fn id(&self) -> u64 {
        self.0
    }
}

/// What a [`LedgerScene`] knows about one live renderable.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerEntry {
    pub category: Category,
    pub pose: Pose,
    pub visible: bool,
}

/// In-memory scene that only keeps books.
///
/// Used by the headless runner and by tests to observe what the population
/// does to its renderables.
#[derive(Resource, Debug, Default)]
pub struct LedgerScene {
    next_id: u64,
    live: BTreeMap<u64, LedgerEntry>,
    spawned: u64,
    released: u64,
    placements: u64,
}

impl LedgerScene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a live renderable by id.
    pub fn get(&self, id: u64) -> Option<&LedgerEntry> {
        self.live.get(&id)
    }

    /// Check if an id still refers to a live renderable.
    pub fn is_live(&self, id: u64) -> bool {
        self.live.contains_key(&id)
    }

    /// Number of live renderables.
    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Ids of every live, visible renderable in ascending order.
    pub fn visible_ids(&self) -> Vec<u64> {
        self.live
            .iter()
            .filter(|(_, entry)| entry.visible)
            .map(|(&id, _)| id)
            .collect()
    }

    /// Total renderables ever spawned.
    pub fn spawned(&self) -> u64 {
        self.spawned
    }

    /// Total renderables released.
    pub fn released(&self) -> u64 {
        self.released
    }

    /// Total pose writes.
    pub fn placements(&self) -> u64 {
        self.placements
    }
}

impl Scene for LedgerScene {
    type Handle = LedgerHandle;

    fn spawn(&mut self, category: Category, pose: Pose) -> LedgerHandle {
        let id = self.next_id;
        self.next_id += 1;
        self.spawned += 1;
        self.live.insert(
            id,
            LedgerEntry {
                category,
                pose,
                visible: true,
            },
        );
        LedgerHandle(id)
    }

    fn release(&mut self, handle: LedgerHandle) {
        if self.live.remove(&handle.0).is_some() {
            self.released += 1;
        }
    }

    fn place(&mut self, handle: &LedgerHandle, pose: Pose) {
        if let Some(entry) = self.live.get_mut(&handle.0) {
            entry.pose = pose;
            self.placements += 1;
        }
    }

    fn set_visible(&mut self, handle: &LedgerHandle, visible: bool) {
        if let Some(entry) = self.live.get_mut(&handle.0) {
            entry.visible = visible;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy_math::Vec3;

    fn pose(z: f32) -> Pose {
        Pose {
            position: Vec3::new(0.0, 0.0, z),
            rotation: Vec3::ZERO,
            scale: 1.0,
        }
    }

    #[test]
    fn test_ledger_tracks_lifecycle() {
        let mut scene = LedgerScene::new();
        let a = scene.spawn(Category::Red, pose(0.0));
        let b = scene.spawn(Category::White, pose(1.0));
        assert_ne!(a.id(), b.id());
        assert_eq!(scene.live_count(), 2);

        scene.place(&a, pose(5.0));
        assert_eq!(scene.get(a.id()).unwrap().pose.position.z, 5.0);

        scene.set_visible(&b, false);
        assert_eq!(scene.visible_ids(), vec![a.id()]);

        let a_id = a.id();
        scene.release(a);
        assert!(!scene.is_live(a_id));
        assert_eq!(scene.live_count(), 1);
        assert_eq!(scene.spawned(), 2);
        assert_eq!(scene.released(), 1);
    }

    #[test]
    fn test_release_of_missing_entry_is_noop() {
        let mut scene = LedgerScene::new();
        scene.release(LedgerHandle(99));
        assert_eq!(scene.released(), 0);
    }
}

//! The authoritative set of running feature processes.
//!
//! Owned by the supervisor actor; every mutation goes through these methods,
//! which is what keeps the at-most-one-per-feature invariant.

use rustc_hash::FxHashMap;

use super::ProcessHandle;
use crate::{debug, log};

#[derive(Debug, Default)]
pub struct ProcessRegistry {
    entries: FxHashMap<&'static str, ProcessHandle>,
    generation: u64,
}

impl ProcessRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fresh generation number for the next spawned handle.
    pub fn next_generation(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    pub fn is_running(&self, feature: &str) -> bool {
        self.entries.contains_key(feature)
    }

    pub fn get(&self, feature: &str) -> Option<&ProcessHandle> {
        self.entries.get(feature)
    }

    /// Insert `handle` unless its feature already has one.
    ///
    /// A rejected handle is dropped, which kills its process.
    pub fn register(&mut self, handle: ProcessHandle) -> bool {
        let feature = handle.feature();
        if let Some(existing) = self.entries.get(feature) {
            log!("supervisor"; "{} already registered (generation {}), dropping duplicate", feature, existing.generation());
            return false;
        }
        debug!("supervisor"; "registered {} (generation {})", feature, handle.generation());
        self.entries.insert(feature, handle);
        true
    }

    /// Remove and return the entry for `feature`. Removing an absent entry is fine.
    pub fn unregister(&mut self, feature: &str) -> Option<ProcessHandle> {
        self.entries.remove(feature)
    }

    /// Remove the entry only if it is the handle that exited.
    ///
    /// A late exit from a replaced process never evicts its successor.
    pub fn unregister_exited(&mut self, feature: &str, generation: u64) -> Option<ProcessHandle> {
        match self.entries.get(feature) {
            Some(handle) if handle.generation() == generation => self.entries.remove(feature),
            Some(handle) => {
                debug!("supervisor"; "stale exit for {} (generation {}, current {})", feature, generation, handle.generation());
                None
            }
            None => None,
        }
    }

    /// Names of registered features, sorted.
    pub fn running(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.entries.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Remove every entry.
    pub fn drain(&mut self) -> Vec<ProcessHandle> {
        let mut handles: Vec<_> = self.entries.drain().map(|(_, handle)| handle).collect();
        handles.sort_unstable_by_key(|h| h.feature());
        handles
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle(registry: &mut ProcessRegistry, feature: &'static str) -> ProcessHandle {
        ProcessHandle::detached(feature, registry.next_generation())
    }

    #[test]
    fn test_register_at_most_one() {
        let mut registry = ProcessRegistry::new();
        let first = handle(&mut registry, "night_limit");
        let second = handle(&mut registry, "night_limit");

        assert!(registry.register(first));
        assert!(!registry.register(second));
        assert_eq!(registry.running(), vec!["night_limit"]);
        assert_eq!(registry.get("night_limit").unwrap().generation(), 1);
    }

    #[test]
    fn test_unregister_idempotent() {
        let mut registry = ProcessRegistry::new();
        let h = handle(&mut registry, "daily_limit");
        registry.register(h);

        assert!(registry.unregister("daily_limit").is_some());
        assert!(registry.unregister("daily_limit").is_none());
        assert!(!registry.is_running("daily_limit"));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_stale_exit_does_not_evict_successor() {
        let mut registry = ProcessRegistry::new();
        let old = handle(&mut registry, "blue_light_filter");
        let old_generation = old.generation();
        registry.register(old);

        // Replaced by a restart before the old exit arrives
        registry.unregister("blue_light_filter");
        let new = handle(&mut registry, "blue_light_filter");
        let new_generation = new.generation();
        registry.register(new);

        assert!(registry.unregister_exited("blue_light_filter", old_generation).is_none());
        assert!(registry.is_running("blue_light_filter"));

        assert!(registry.unregister_exited("blue_light_filter", new_generation).is_some());
        assert!(!registry.is_running("blue_light_filter"));
        assert!(registry.unregister_exited("blue_light_filter", new_generation).is_none());
    }

    #[test]
    fn test_running_sorted_and_drain() {
        let mut registry = ProcessRegistry::new();
        for feature in ["night_limit", "break_reminders", "distance_check"] {
            let h = handle(&mut registry, feature);
            registry.register(h);
        }

        assert_eq!(
            registry.running(),
            vec!["break_reminders", "distance_check", "night_limit"]
        );

        let drained = registry.drain();
        assert_eq!(drained.len(), 3);
        assert_eq!(drained[0].feature(), "break_reminders");
        assert!(registry.is_empty());
    }

    #[test]
    fn test_generations_increase() {
        let mut registry = ProcessRegistry::new();
        let a = registry.next_generation();
        let b = registry.next_generation();
        assert!(b > a);
    }
}

use super::{Router, RouterError};
use crate::store::OptionStore;

/// The set of available routing backends, looked up by name
#[derive(Default)]
pub struct RouterRegistry {
    routers: Vec<Box<dyn Router>>,
}

impl RouterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a backend. A backend with the same name replaces the old one.
    pub fn register(&mut self, router: Box<dyn Router>) {
        let name = router.name();
        match self.routers.iter_mut().find(|existing| existing.name() == name) {
            Some(slot) => {
                tracing::debug!(router = name, "Replacing registered router");
                *slot = router;
            }
            None => self.routers.push(router),
        }
    }

    /// Case-insensitive lookup
    pub fn get(&self, name: &str) -> Option<&dyn Router> {
        self.routers
            .iter()
            .find(|router| router.name().eq_ignore_ascii_case(name))
            .map(|router| &**router)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut (dyn Router + 'static)> {
        self.routers
            .iter_mut()
            .find(|router| router.name().eq_ignore_ascii_case(name))
            .map(|router| &mut **router)
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.routers.iter().map(|router| router.name()).collect()
    }

    /// Load options for every backend; stops at the first failure
    pub fn load_options(&mut self, store: &dyn OptionStore) -> Result<(), RouterError> {
        for router in self.routers.iter_mut().filter(|router| router.has_options()) {
            router.load_options(store)?;
        }
        Ok(())
    }

    pub fn save_options(&self, store: &dyn OptionStore) -> Result<(), RouterError> {
        for router in self.routers.iter().filter(|router| router.has_options()) {
            router.save_options(store)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::{DirectRouter, SpeedClass};
    use crate::{MemoryStore, ProjectionHandle};

    fn registry() -> RouterRegistry {
        let mut registry = RouterRegistry::new();
        registry.register(Box::new(DirectRouter::new(ProjectionHandle::default())));
        registry
    }

    #[test]
    fn test_lookup_by_name() {
        let registry = registry();
        assert_eq!(registry.names(), vec!["Direct"]);
        assert!(registry.get("direct").is_some());
        assert!(registry.get("Teleport").is_none());
    }

    #[test]
    fn test_register_replaces_same_name() {
        let mut registry = registry();
        registry.register(Box::new(DirectRouter::new(ProjectionHandle::default())));
        assert_eq!(registry.names().len(), 1);
    }

    #[test]
    fn test_options_for_all_routers() {
        let store = MemoryStore::new();
        store.set_int("routers/direct/speed", SpeedClass::Fast.code()).unwrap();

        let mut registry = registry();
        registry.load_options(&store).unwrap();
        registry.save_options(&store).unwrap();
        assert_eq!(store.get_int("routers/direct/speed").unwrap(), Some(3));
        assert!(store.get_int("routers/direct/steps").unwrap().is_some());

        store.set_int("routers/direct/speed", 42).unwrap();
        assert!(registry.load_options(&store).is_err());
        assert!(registry.get_mut("DIRECT").is_some());
    }
}

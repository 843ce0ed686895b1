use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};

use crate::{
    object::{NetworkObject, ObjectBehavior},
    types::CreateCode,
};

type Factory = Arc<dyn Fn(&NetworkObject) -> Box<dyn ObjectBehavior> + Send + Sync>;

/// Maps application create codes to the function that builds the behavior
/// for a newly created object. The engine never knows concrete types
pub struct ObjectFactory {
    factories: RwLock<HashMap<CreateCode, Factory>>,
}

impl ObjectFactory {
    pub fn new() -> Self {
        Self {
            factories: RwLock::new(HashMap::new()),
        }
    }

    /// Returns true if a previous factory for `create_code` was replaced
    pub fn register<F>(&self, create_code: CreateCode, factory: F) -> bool
    where
        F: Fn(&NetworkObject) -> Box<dyn ObjectBehavior> + Send + Sync + 'static,
    {
        let Ok(mut factories) = self.factories.write() else {
            return false;
        };
        factories.insert(create_code, Arc::new(factory)).is_some()
    }

    pub fn contains(&self, create_code: CreateCode) -> bool {
        self.factories
            .read()
            .map(|factories| factories.contains_key(&create_code))
            .unwrap_or(false)
    }

    /// Builds a behavior for the object's create code. The factory runs
    /// without the table lock held
    pub fn build(&self, object: &NetworkObject) -> Option<Box<dyn ObjectBehavior>> {
        let factory = self
            .factories
            .read()
            .ok()?
            .get(&object.create_code())
            .cloned()?;
        Some(factory(object))
    }
}

impl Default for ObjectFactory {
    fn default() -> Self {
        Self::new()
    }
}

use std::sync::{Arc, Mutex};

use peerlink_engine::{ObserverKey, Observers};

/// Collects every notification of one observer list
pub struct Recorder<T> {
    items: Arc<Mutex<Vec<T>>>,
    key: ObserverKey,
}

impl<T: Clone + Send + 'static> Recorder<T> {
    pub fn attach(observers: &Observers<T>) -> Self {
        let items = Arc::new(Mutex::new(Vec::new()));
        let sink = items.clone();
        let key = observers.register(move |item: &T| {
            sink.lock().unwrap().push(item.clone());
        });
        Self { items, key }
    }

    pub fn items(&self) -> Vec<T> {
        self.items.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.items.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn last(&self) -> Option<T> {
        self.items.lock().unwrap().last().cloned()
    }

    pub fn clear(&self) {
        self.items.lock().unwrap().clear();
    }

    pub fn key(&self) -> ObserverKey {
        self.key
    }
}

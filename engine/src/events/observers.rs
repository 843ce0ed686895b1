use std::sync::{Arc, Mutex};

/// Returned on registration, used to unregister
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ObserverKey(u64);

type Observer<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct ObserversInner<T> {
    next_key: u64,
    list: Vec<(ObserverKey, Observer<T>)>,
}

/// A list of listeners for one kind of event.
///
/// `notify` calls every listener registered at the moment it starts, over a
/// snapshot taken under the lock; the lock is not held while listeners run.
/// A listener unregistered during a notification still receives that
/// notification but none after it.
pub struct Observers<T> {
    inner: Mutex<ObserversInner<T>>,
}

impl<T> Observers<T> {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(ObserversInner {
                next_key: 0,
                list: Vec::new(),
            }),
        }
    }

    pub fn register<F: Fn(&T) + Send + Sync + 'static>(&self, observer: F) -> ObserverKey {
        let mut inner = match self.inner.lock() {
            Ok(inner) => inner,
            Err(poisoned) => poisoned.into_inner(),
        };
        let key = ObserverKey(inner.next_key);
        inner.next_key += 1;
        inner.list.push((key, Arc::new(observer)));
        key
    }

    /// Returns false if the key was not registered
    pub fn unregister(&self, key: ObserverKey) -> bool {
        let mut inner = match self.inner.lock() {
            Ok(inner) => inner,
            Err(poisoned) => poisoned.into_inner(),
        };
        let before = inner.list.len();
        inner.list.retain(|(existing, _)| *existing != key);
        inner.list.len() != before
    }

    pub fn notify(&self, event: &T) {
        let snapshot: Vec<Observer<T>> = match self.inner.lock() {
            Ok(inner) => inner.list.iter().map(|(_, observer)| observer.clone()).collect(),
            Err(poisoned) => poisoned
                .into_inner()
                .list
                .iter()
                .map(|(_, observer)| observer.clone())
                .collect(),
        };
        for observer in snapshot {
            observer(event);
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().map(|inner| inner.list.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> Default for Observers<T> {
    fn default() -> Self {
        Self::new()
    }
}

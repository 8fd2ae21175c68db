//! Observer targets.
//!
//! The observer loop is the only writer of a target but runs concurrently with the
//! caller's own code, so a target is always a caller-owned handle carrying the
//! caller's choice of synchronization. The loop takes that guard for each merge and
//! never holds it across an await point.
//!
//! Provided handles:
//! - `Arc<RwLock<T>>` and `Arc<Mutex<T>>`: readers lock like any other shared state
//! - `Arc<ArcSwap<T>>`: readers take a consistent snapshot with `load()` and never block
//!
//! Implement [`ObserverTarget`] directly for anything else.

use std::sync::{Arc, Mutex, RwLock};

use arc_swap::ArcSwap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::DecodeError;
use crate::observer::merge::merge_document;

/// Destination of pushed documents.
pub trait ObserverTarget: Send + Sync + 'static {
    /// Merge one decoded document into the target.
    fn apply(&self, document: Value) -> Result<(), DecodeError>;
}

impl<T> ObserverTarget for Arc<RwLock<T>>
where
    T: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    fn apply(&self, document: Value) -> Result<(), DecodeError> {
        let mut guard = self.write().map_err(|_| DecodeError::Poisoned)?;
        *guard = merge_document(&*guard, document)?;
        Ok(())
    }
}

impl<T> ObserverTarget for Arc<Mutex<T>>
where
    T: Serialize + DeserializeOwned + Send + 'static,
{
    fn apply(&self, document: Value) -> Result<(), DecodeError> {
        let mut guard = self.lock().map_err(|_| DecodeError::Poisoned)?;
        *guard = merge_document(&*guard, document)?;
        Ok(())
    }
}

impl<T> ObserverTarget for Arc<ArcSwap<T>>
where
    T: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    fn apply(&self, document: Value) -> Result<(), DecodeError> {
        let current = self.load();
        let merged = merge_document(&**current, document)?;
        self.store(Arc::new(merged));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
    struct Settings {
        name: String,
        enabled: bool,
    }

    #[test]
    fn test_rwlock_target() {
        let target = Arc::new(RwLock::new(Settings::default()));
        target.apply(json!({"name": "svc-a"})).unwrap();
        target.apply(json!({"enabled": true})).unwrap();

        let settings = target.read().unwrap();
        assert_eq!(settings.name, "svc-a");
        assert!(settings.enabled);
    }

    #[test]
    fn test_mutex_target_keeps_value_on_error() {
        let target = Arc::new(Mutex::new(Settings {
            name: "svc-a".into(),
            enabled: true,
        }));
        let err = target.apply(json!({"enabled": "yes"})).unwrap_err();
        assert!(matches!(err, DecodeError::Document(_)));
        assert_eq!(target.lock().unwrap().name, "svc-a");
    }

    #[test]
    fn test_snapshot_target() {
        let target = Arc::new(ArcSwap::from_pointee(Settings::default()));
        let before = target.load_full();

        target.apply(json!({"name": "svc-b"})).unwrap();

        assert_eq!(before.name, "");
        assert_eq!(target.load().name, "svc-b");
    }

    #[test]
    fn test_poisoned_lock() {
        let target = Arc::new(RwLock::new(Settings::default()));
        let poisoner = Arc::clone(&target);
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.write().unwrap();
            panic!("poison");
        })
        .join();

        assert!(matches!(
            target.apply(json!({"name": "x"})),
            Err(DecodeError::Poisoned)
        ));
    }
}

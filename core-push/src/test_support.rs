//! In-memory doubles shared by the unit tests.

use async_trait::async_trait;
use bridge_traits::error::Result as BridgeResult;
use bridge_traits::SettingsStore;
use std::collections::HashMap;
use tokio::sync::Mutex;

#[derive(Default)]
pub(crate) struct MemorySettings {
    strings: Mutex<HashMap<String, String>>,
    bools: Mutex<HashMap<String, bool>>,
}

#[async_trait]
impl SettingsStore for MemorySettings {
    async fn set_string(&self, key: &str, value: &str) -> BridgeResult<()> {
        self.strings.lock().await.insert(key.into(), value.into());
        Ok(())
    }

    async fn get_string(&self, key: &str) -> BridgeResult<Option<String>> {
        Ok(self.strings.lock().await.get(key).cloned())
    }

    async fn set_bool(&self, key: &str, value: bool) -> BridgeResult<()> {
        self.bools.lock().await.insert(key.into(), value);
        Ok(())
    }

    async fn get_bool(&self, key: &str) -> BridgeResult<Option<bool>> {
        Ok(self.bools.lock().await.get(key).copied())
    }

    async fn delete(&self, key: &str) -> BridgeResult<()> {
        self.strings.lock().await.remove(key);
        self.bools.lock().await.remove(key);
        Ok(())
    }

    async fn has_key(&self, key: &str) -> BridgeResult<bool> {
        Ok(self.strings.lock().await.contains_key(key)
            || self.bools.lock().await.contains_key(key))
    }

    async fn list_keys(&self) -> BridgeResult<Vec<String>> {
        let mut keys: Vec<String> = self.strings.lock().await.keys().cloned().collect();
        keys.extend(self.bools.lock().await.keys().cloned());
        Ok(keys)
    }

    async fn clear_all(&self) -> BridgeResult<()> {
        self.strings.lock().await.clear();
        self.bools.lock().await.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_keys_cover_both_value_kinds() {
        let settings = MemorySettings::default();
        settings.set_string("a", "1").await.unwrap();
        settings.set_bool("b", true).await.unwrap();

        let mut keys = settings.list_keys().await.unwrap();
        keys.sort();
        assert_eq!(keys, vec!["a".to_string(), "b".to_string()]);
        assert!(settings.has_key("b").await.unwrap());

        settings.delete("b").await.unwrap();
        assert!(!settings.has_key("b").await.unwrap());
    }
}

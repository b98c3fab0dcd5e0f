use crate::application::GuestIdStore;
use async_trait::async_trait;
use jaboway_errors::AppError;
use std::sync::Mutex;

/// Guest id kept only for the life of the process.
#[derive(Default)]
pub struct MemoryGuestStore {
    guest_id: Mutex<Option<String>>,
}

#[async_trait]
impl GuestIdStore for MemoryGuestStore {
    async fn load(&self) -> Result<Option<String>, AppError> {
        Ok(self
            .guest_id
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone())
    }

    async fn save(&self, guest_id: &str) -> Result<(), AppError> {
        *self
            .guest_id
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(guest_id.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_keeps_last_saved_id() {
        let store = MemoryGuestStore::default();
        assert_eq!(store.load().await.unwrap(), None);
        store.save("guest_1_42").await.unwrap();
        store.save("guest_2_7").await.unwrap();
        assert_eq!(store.load().await.unwrap().as_deref(), Some("guest_2_7"));
    }
}

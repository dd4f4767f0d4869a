use std::sync::Mutex;

use domain_types::settings::{MerchantSettings, MerchantSettingsUpdate};

/// Storage seam for merchant configuration. The service only ever reads
/// a full snapshot or applies a partial update, so the trait mirrors
/// exactly those two operations.
pub trait SettingsRepository: Send + Sync {
    fn load(&self) -> MerchantSettings;
    fn apply(&self, update: MerchantSettingsUpdate) -> MerchantSettings;
}

/// Mutex-backed store holding a single merchant configuration.
#[derive(Debug, Default)]
pub struct InMemorySettingsRepository {
    inner: Mutex<MerchantSettings>,
}

impl InMemorySettingsRepository {
    pub fn new(settings: MerchantSettings) -> Self {
        Self {
            inner: Mutex::new(settings),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MerchantSettings> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl SettingsRepository for InMemorySettingsRepository {
    fn load(&self) -> MerchantSettings {
        self.lock().clone()
    }

    fn apply(&self, update: MerchantSettingsUpdate) -> MerchantSettings {
        let mut settings = self.lock();
        settings.apply(update);
        settings.clone()
    }
}

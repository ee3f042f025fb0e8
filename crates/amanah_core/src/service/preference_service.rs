//! UI preferences.

use crate::model::language::Language;
use crate::repo::keys::LANGUAGE;
use crate::repo::{load_value, save_value, RepoResult};
use crate::store::KvStore;
use log::info;

pub struct PreferenceService<S: KvStore> {
    store: S,
}

impl<S: KvStore> PreferenceService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Stored language, or English when missing or unrecognized.
    pub fn language(&self) -> RepoResult<Language> {
        Ok(load_value(&self.store, LANGUAGE)?.unwrap_or_default())
    }

    pub fn set_language(&self, language: Language) -> RepoResult<()> {
        save_value(&self.store, LANGUAGE, &language)?;
        info!(
            "event=language_set module=service status=ok language={}",
            language.code()
        );
        Ok(())
    }
}

//! Per-dataset view preferences.
//!
//! Kept apart from change tracking: losing preferences never loses edits.

use crate::core::{DatasetId, Result};
use crate::view::SortSpec;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewPreferences {
    pub page_size: Option<usize>,
    pub sort: Option<SortSpec>,
}

pub trait PreferenceStore: Send + Sync {
    fn load(&self, dataset_id: &DatasetId) -> Result<Option<ViewPreferences>>;

    fn save(&self, dataset_id: &DatasetId, prefs: &ViewPreferences) -> Result<()>;
}

/// Preferences held as JSON documents, the way a browser's local storage would.
#[derive(Debug, Default)]
pub struct MemoryPreferences {
    documents: RwLock<HashMap<DatasetId, String>>,
}

impl MemoryPreferences {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raw(&self, dataset_id: &DatasetId) -> Result<Option<String>> {
        Ok(self.documents.read()?.get(dataset_id).cloned())
    }
}

impl PreferenceStore for MemoryPreferences {
    fn load(&self, dataset_id: &DatasetId) -> Result<Option<ViewPreferences>> {
        let Some(doc) = self.raw(dataset_id)? else {
            return Ok(None);
        };
        Ok(Some(serde_json::from_str(&doc)?))
    }

    fn save(&self, dataset_id: &DatasetId, prefs: &ViewPreferences) -> Result<()> {
        let doc = serde_json::to_string(prefs)?;
        self.documents.write()?.insert(dataset_id.clone(), doc);
        Ok(())
    }
}

//! Database configuration document

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::index::SectionId;

use super::AccessPermission;

/// Per-database settings maintained by the layer above the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DbConfig {
    pub db_name: String,

    /// Index size at which callers should roll over to a new section
    pub max_section_index_size: u64,

    pub current_section_id: SectionId,

    pub sections: Vec<SectionId>,

    /// Raw `AccessPermission` bits
    pub permissions: u16,

    pub owner_id: i64,

    pub group_id: i64,
}

impl DbConfig {
    pub const DEFAULT_MAX_SECTION_INDEX_SIZE: u64 = u16::MAX as u64;

    pub fn new(db_name: impl Into<String>) -> Self {
        Self {
            db_name: db_name.into(),
            ..Self::default()
        }
    }

    /// Whether `entry_count` has reached the rollover threshold
    pub fn should_rotate(&self, entry_count: u64) -> bool {
        entry_count >= self.max_section_index_size
    }

    /// Make `id` the current section, tracking it in `sections`
    pub fn set_current_section(&mut self, id: SectionId) {
        if !self.sections.contains(&id) {
            self.sections.push(id);
        }
        self.current_section_id = id;
    }

    pub fn access(&self) -> AccessPermission {
        AccessPermission::from_bits_retain(self.permissions)
    }

    pub fn set_access(&mut self, access: AccessPermission) {
        self.permissions = access.bits();
    }
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            db_name: String::new(),
            max_section_index_size: Self::DEFAULT_MAX_SECTION_INDEX_SIZE,
            current_section_id: Uuid::nil(),
            sections: Vec::new(),
            permissions: 0,
            owner_id: 0,
            group_id: 0,
        }
    }
}

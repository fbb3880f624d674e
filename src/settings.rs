//! Player application settings accumulator
//!
//! Settings discovery is a chain of small queries: list the attributes, list the values
//! of every attribute one at a time, fetch display texts for the extended (menu)
//! attributes, then read the current values. The accumulator collects the answers and
//! keeps the cursors that say which query comes next.

use crate::constants::{FIRST_EXTENDED_ATTRIBUTE, MAX_APP_ATTRIBUTES, MAX_APP_VALUES};
use crate::packets::SettingText;
use heapless::Vec;

/// One discovered setting attribute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerAppAttribute {
    /// Attribute id
    pub id: u8,
    /// Allowed value ids
    pub values: Vec<u8, MAX_APP_VALUES>,
    /// Display name (extended attributes only)
    pub name: Option<SettingText>,
    /// Display names of the values (extended attributes only)
    pub value_names: Vec<SettingText, MAX_APP_VALUES>,
}

impl PlayerAppAttribute {
    /// Attribute without values or texts
    #[must_use]
    pub const fn new(id: u8) -> Self {
        Self {
            id,
            values: Vec::new(),
            name: None,
            value_names: Vec::new(),
        }
    }

    /// Extended attributes carry their own display texts
    #[must_use]
    pub const fn is_extended(&self) -> bool {
        self.id >= FIRST_EXTENDED_ATTRIBUTE
    }
}

/// Attributes flushed to the platform
pub type PlayerAppAttributes = Vec<PlayerAppAttribute, MAX_APP_ATTRIBUTES>;

/// Collected settings state of one discovery run
#[derive(Debug, Default)]
pub(crate) struct SettingsAccumulator {
    standard: PlayerAppAttributes,
    extended: PlayerAppAttributes,
    standard_cursor: usize,
    extended_cursor: usize,
    text_cursor: usize,
    /// Discovery has been started on this connection
    pub query_started: bool,
}

impl SettingsAccumulator {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Split listed attribute ids into the standard and extended lists
    pub fn load_attributes(&mut self, ids: &[u8]) {
        self.standard.clear();
        self.extended.clear();
        self.standard_cursor = 0;
        self.extended_cursor = 0;
        self.text_cursor = 0;
        for &id in ids {
            let list = if id >= FIRST_EXTENDED_ATTRIBUTE {
                &mut self.extended
            } else {
                &mut self.standard
            };
            if !list.iter().any(|attribute| attribute.id == id) {
                list.push(PlayerAppAttribute::new(id)).ok();
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.standard.is_empty() && self.extended.is_empty()
    }

    pub fn has_extended(&self) -> bool {
        !self.extended.is_empty()
    }

    /// Attribute whose values are queried next
    pub fn next_value_query(&self) -> Option<u8> {
        self.standard
            .get(self.standard_cursor)
            .or_else(|| self.extended.get(self.extended_cursor))
            .map(|attribute| attribute.id)
    }

    /// Store the values of the attribute at the cursor and advance
    pub fn store_values(&mut self, values: &[u8]) {
        let attribute = if self.standard_cursor < self.standard.len() {
            self.standard_cursor += 1;
            self.standard.get_mut(self.standard_cursor - 1)
        } else if self.extended_cursor < self.extended.len() {
            self.extended_cursor += 1;
            self.extended.get_mut(self.extended_cursor - 1)
        } else {
            None
        };
        if let Some(attribute) = attribute {
            attribute.values = crate::packets::truncated(values);
        }
    }

    pub fn standard_ids(&self) -> Vec<u8, MAX_APP_ATTRIBUTES> {
        self.standard.iter().map(|attribute| attribute.id).collect()
    }

    pub fn extended_ids(&self) -> Vec<u8, MAX_APP_ATTRIBUTES> {
        self.extended.iter().map(|attribute| attribute.id).collect()
    }

    /// Standard then extended ids
    pub fn all_ids(&self) -> Vec<u8, MAX_APP_ATTRIBUTES> {
        self.standard
            .iter()
            .chain(self.extended.iter())
            .take(MAX_APP_ATTRIBUTES)
            .map(|attribute| attribute.id)
            .collect()
    }

    pub fn store_attribute_texts(&mut self, texts: &[SettingText]) {
        for text in texts {
            if let Some(attribute) = self.extended.iter_mut().find(|a| a.id == text.id) {
                attribute.name = Some(text.clone());
            }
        }
    }

    /// Extended attribute and values whose texts are queried next
    pub fn next_value_text_query(&self) -> Option<(u8, Vec<u8, MAX_APP_VALUES>)> {
        self.extended
            .get(self.text_cursor)
            .map(|attribute| (attribute.id, attribute.values.clone()))
    }

    /// Store value texts for the extended attribute at the cursor and advance
    pub fn store_value_texts(&mut self, texts: &[SettingText]) {
        if let Some(attribute) = self.extended.get_mut(self.text_cursor) {
            attribute.value_names = texts.iter().cloned().collect();
            self.text_cursor += 1;
        }
    }

    pub fn drop_extended(&mut self) {
        self.extended.clear();
        self.extended_cursor = 0;
        self.text_cursor = 0;
    }

    /// Snapshot for the platform
    pub fn snapshot(&self, include_extended: bool) -> PlayerAppAttributes {
        let extended = if include_extended {
            self.extended.as_slice()
        } else {
            &[]
        };
        self.standard
            .iter()
            .chain(extended.iter())
            .take(MAX_APP_ATTRIBUTES)
            .cloned()
            .collect()
    }
}

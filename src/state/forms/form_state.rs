//! Form state storage and navigation

use super::field::FormField;
use std::collections::HashMap;

/// Trait for common form operations
pub trait Form {
    fn field_count(&self) -> usize;
    fn active_field(&self) -> usize;
    fn set_active_field(&mut self, index: usize);
    fn next_field(&mut self) {
        let count = self.field_count();
        if count == 0 {
            return;
        }
        let current = self.active_field();
        self.set_active_field((current + 1) % count);
    }
    fn prev_field(&mut self) {
        let count = self.field_count();
        if count == 0 {
            return;
        }
        let current = self.active_field();
        if current == 0 {
            self.set_active_field(count - 1);
        } else {
            self.set_active_field(current - 1);
        }
    }
    fn get_field(&self, index: usize) -> Option<&FormField>;
}

/// Field values keyed by field name, shared across every step of a session
#[derive(Debug, Clone, Default)]
pub struct FormState {
    fields: HashMap<String, FormField>,
}

impl FormState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field unless one with the same name already exists.
    /// Returns true if it was added.
    pub fn insert(&mut self, field: FormField) -> bool {
        if self.fields.contains_key(&field.name) {
            return false;
        }
        self.fields.insert(field.name.clone(), field);
        true
    }

    pub fn get(&self, name: &str) -> Option<&FormField> {
        self.fields.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut FormField> {
        self.fields.get_mut(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Trimmed value of a field, empty when unknown
    pub fn value(&self, name: &str) -> String {
        self.fields
            .get(name)
            .map(|f| f.raw_value().trim().to_string())
            .unwrap_or_default()
    }

    /// Keep only the fields accepted by `keep`
    pub fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.fields.retain(|name, _| keep(name));
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn clear(&mut self) {
        self.fields.clear();
    }
}

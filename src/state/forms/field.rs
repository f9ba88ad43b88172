//! Form field value objects

use super::validation::FieldError;
use crate::data::ChoiceDef;

/// Type-safe field values
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    /// Selected option value, if any
    Choice(Option<String>),
    Flag(bool),
}

impl Default for FieldValue {
    fn default() -> Self {
        FieldValue::Text(String::new())
    }
}

/// Represents a single form field with its value and display metadata
#[derive(Debug, Clone)]
pub struct FormField {
    pub name: String,
    pub label: String,
    pub value: FieldValue,
    pub is_multiline: bool,
    /// Options for choice fields
    pub options: &'static [ChoiceDef],
    /// Set once the user has visited the field or asked for validation
    pub touched: bool,
    pub error: Option<FieldError>,
}

impl FormField {
    fn new(name: &str, label: &str, value: FieldValue) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            value,
            is_multiline: false,
            options: &[],
            touched: false,
            error: None,
        }
    }

    /// Create a new text field
    pub fn text(name: &str, label: &str, is_multiline: bool) -> Self {
        Self {
            is_multiline,
            ..Self::new(name, label, FieldValue::Text(String::new()))
        }
    }

    /// Create a new choice field with no selection
    pub fn choice(name: &str, label: &str, options: &'static [ChoiceDef]) -> Self {
        Self {
            options,
            ..Self::new(name, label, FieldValue::Choice(None))
        }
    }

    /// Create a new unchecked flag field
    pub fn flag(name: &str, label: &str) -> Self {
        Self::new(name, label, FieldValue::Flag(false))
    }

    /// Get the text value (returns empty string for other kinds)
    pub fn as_text(&self) -> &str {
        match &self.value {
            FieldValue::Text(s) => s,
            FieldValue::Choice(_) | FieldValue::Flag(_) => "",
        }
    }

    /// Get the selected option value
    pub fn as_choice(&self) -> Option<&str> {
        match &self.value {
            FieldValue::Choice(c) => c.as_deref(),
            FieldValue::Text(_) | FieldValue::Flag(_) => None,
        }
    }

    /// Get the flag value (false for other kinds)
    pub fn as_flag(&self) -> bool {
        matches!(self.value, FieldValue::Flag(true))
    }

    /// The value as submitted and validated
    pub fn raw_value(&self) -> String {
        match &self.value {
            FieldValue::Text(s) => s.clone(),
            FieldValue::Choice(c) => c.clone().unwrap_or_default(),
            FieldValue::Flag(b) => b.to_string(),
        }
    }

    pub fn is_choice(&self) -> bool {
        matches!(self.value, FieldValue::Choice(_))
    }

    pub fn is_flag(&self) -> bool {
        matches!(self.value, FieldValue::Flag(_))
    }

    /// Set the text value. Ignored for non-text fields.
    pub fn set_text(&mut self, value: String) {
        if let FieldValue::Text(s) = &mut self.value {
            *s = value;
        }
    }

    /// Select an option by value. Returns false if the value is not an option.
    pub fn select(&mut self, value: &str) -> bool {
        if !self.options.iter().any(|o| o.value == value) {
            return false;
        }
        match &mut self.value {
            FieldValue::Choice(c) => {
                *c = Some(value.to_string());
                true
            }
            FieldValue::Text(_) | FieldValue::Flag(_) => false,
        }
    }

    /// Step through the options, wrapping at both ends
    pub fn cycle_choice(&mut self, forward: bool) -> Option<&'static str> {
        if self.options.is_empty() {
            return None;
        }
        let count = self.options.len();
        let current = self
            .as_choice()
            .and_then(|v| self.options.iter().position(|o| o.value == v));
        let next = match (current, forward) {
            (None, true) => 0,
            (None, false) => count - 1,
            (Some(i), true) => (i + 1) % count,
            (Some(0), false) => count - 1,
            (Some(i), false) => i - 1,
        };
        let value = self.options[next].value;
        self.select(value);
        Some(value)
    }

    /// Toggle the flag value
    pub fn toggle(&mut self) {
        if let FieldValue::Flag(b) = &mut self.value {
            *b = !*b;
        }
    }

    /// Remove the last character from the field value
    pub fn pop_char(&mut self) {
        if let FieldValue::Text(s) = &mut self.value {
            s.pop();
        }
    }

    /// Clear the field value and its error state
    pub fn clear(&mut self) {
        match &mut self.value {
            FieldValue::Text(s) => s.clear(),
            FieldValue::Choice(c) => *c = None,
            FieldValue::Flag(b) => *b = false,
        }
        self.error = None;
        self.touched = false;
    }

    /// Label of the selected option
    pub fn choice_label(&self) -> Option<&'static str> {
        let value = self.as_choice()?;
        self.options
            .iter()
            .find(|o| o.value == value)
            .map(|o| o.label)
    }

    /// Get the display value for rendering
    pub fn display_value(&self) -> String {
        match &self.value {
            FieldValue::Text(s) => s.clone(),
            FieldValue::Choice(_) => self
                .choice_label()
                .map(str::to_string)
                .unwrap_or_else(|| "Select...".to_string()),
            FieldValue::Flag(true) => "[x]".to_string(),
            FieldValue::Flag(false) => "[ ]".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::GENDERS;

    #[test]
    fn test_text_field_set_and_pop() {
        let mut field = FormField::text("fullName", "Full Name", false);
        field.set_text("Asha".to_string());
        field.pop_char();
        assert_eq!(field.as_text(), "Ash");
        assert_eq!(field.raw_value(), "Ash");
    }

    #[test]
    fn test_select_rejects_unknown_option() {
        let mut field = FormField::choice("gender", "Gender", GENDERS);
        assert!(!field.select("robot"));
        assert_eq!(field.as_choice(), None);
        assert!(field.select("female"));
        assert_eq!(field.as_choice(), Some("female"));
        assert_eq!(field.display_value(), "Female");
    }

    #[test]
    fn test_cycle_choice_wraps() {
        let mut field = FormField::choice("gender", "Gender", GENDERS);
        assert_eq!(field.cycle_choice(false), Some("other"));
        assert_eq!(field.cycle_choice(true), Some("male"));
        assert_eq!(field.cycle_choice(false), Some("other"));
    }

    #[test]
    fn test_flag_toggle() {
        let mut field = FormField::flag("sameAsPermanent", "Different address");
        assert!(!field.as_flag());
        field.toggle();
        assert!(field.as_flag());
        assert_eq!(field.raw_value(), "true");
        assert_eq!(field.display_value(), "[x]");
    }

    #[test]
    fn test_clear_resets_touched_and_error() {
        let mut field = FormField::text("city", "City", false);
        field.set_text("Thane".to_string());
        field.touched = true;
        field.error = Some(FieldError::Format("bad".to_string()));
        field.clear();
        assert_eq!(field.as_text(), "");
        assert!(!field.touched);
        assert!(field.error.is_none());
    }

    #[test]
    fn test_set_text_ignored_on_choice() {
        let mut field = FormField::choice("gender", "Gender", GENDERS);
        field.set_text("male".to_string());
        assert_eq!(field.as_choice(), None);
    }
}

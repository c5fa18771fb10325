use serde::{Deserialize, Serialize};
use strum::Display;

/// Kinds of interactive elements
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ElementKind {
    TextInput,
    EmailInput,
    PasswordInput,
    Textarea,
    Select,
    Checkbox,
    Radio,
    Button,
    Submit,
    Link,
    Unknown,
}

impl ElementKind {
    /// Classify an element from its tag name and `type` attribute
    pub fn classify(tag: &str, type_attr: Option<&str>) -> Self {
        let type_attr = type_attr.map(str::to_ascii_lowercase);
        match tag.to_ascii_lowercase().as_str() {
            "input" => match type_attr.as_deref().unwrap_or("text") {
                "email" => Self::EmailInput,
                "password" => Self::PasswordInput,
                "checkbox" => Self::Checkbox,
                "radio" => Self::Radio,
                "submit" => Self::Submit,
                "button" | "reset" => Self::Button,
                _ => Self::TextInput,
            },
            "textarea" => Self::Textarea,
            "select" => Self::Select,
            "button" => match type_attr.as_deref() {
                // a <button> without a type submits its form
                Some("submit") | None => Self::Submit,
                _ => Self::Button,
            },
            "a" => Self::Link,
            _ => Self::Unknown,
        }
    }

    /// Elements that accept typed text
    pub fn is_text(self) -> bool {
        matches!(
            self,
            Self::TextInput | Self::EmailInput | Self::PasswordInput | Self::Textarea
        )
    }
}

/// An interactive element as seen by the environment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementDescriptor {
    /// Stable identifier, used to address the element when acting on it
    pub id: String,
    pub kind: ElementKind,
    #[serde(default)]
    pub required: bool,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    /// Holds a value, or is checked for checkboxes and radios
    #[serde(default)]
    pub filled: bool,
    /// Option values of a select
    #[serde(default)]
    pub options: Vec<String>,
}

fn enabled_by_default() -> bool {
    true
}

impl ElementDescriptor {
    pub fn new(id: impl Into<String>, kind: ElementKind) -> Self {
        Self {
            id: id.into(),
            kind,
            required: false,
            enabled: true,
            filled: false,
            options: Vec::new(),
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn filled(mut self, filled: bool) -> Self {
        self.filled = filled;
        self
    }

    pub fn with_options<I, T>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.options = options.into_iter().map(Into::into).collect();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_inputs() {
        assert_eq!(ElementKind::classify("input", None), ElementKind::TextInput);
        assert_eq!(
            ElementKind::classify("INPUT", Some("Email")),
            ElementKind::EmailInput
        );
        assert_eq!(
            ElementKind::classify("input", Some("password")),
            ElementKind::PasswordInput
        );
        assert_eq!(
            ElementKind::classify("input", Some("checkbox")),
            ElementKind::Checkbox
        );
        assert_eq!(ElementKind::classify("input", Some("radio")), ElementKind::Radio);
        assert_eq!(ElementKind::classify("input", Some("submit")), ElementKind::Submit);
        assert_eq!(ElementKind::classify("input", Some("tel")), ElementKind::TextInput);
    }

    #[test]
    fn classify_other_tags() {
        assert_eq!(ElementKind::classify("textarea", None), ElementKind::Textarea);
        assert_eq!(ElementKind::classify("select", None), ElementKind::Select);
        assert_eq!(ElementKind::classify("button", None), ElementKind::Submit);
        assert_eq!(ElementKind::classify("button", Some("button")), ElementKind::Button);
        assert_eq!(ElementKind::classify("a", None), ElementKind::Link);
        assert_eq!(ElementKind::classify("div", None), ElementKind::Unknown);
    }

    #[test]
    fn kind_names_are_snake_case() {
        assert_eq!(ElementKind::EmailInput.to_string(), "email_input");
        assert_eq!(
            serde_json::to_string(&ElementKind::PasswordInput).unwrap(),
            "\"password_input\""
        );
    }

    #[test]
    fn descriptor_defaults_when_deserializing() {
        let element: ElementDescriptor =
            serde_json::from_str(r#"{"id": "name", "kind": "text_input"}"#).unwrap();
        assert_eq!(element, ElementDescriptor::new("name", ElementKind::TextInput));
        assert!(element.enabled);
    }
}

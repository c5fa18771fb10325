use std::fmt;

use serde::{Deserialize, Serialize};
use strum::Display;

use super::{ElementDescriptor, ElementKind};

/// Interaction primitives
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ActionKind {
    Click,
    Type,
    Select,
    Check,
    Uncheck,
    Clear,
    Submit,
}

/// A concrete action against one element of the form
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FormAction {
    pub kind: ActionKind,
    /// Id of the target element
    pub target: String,
    /// Text to type or option to select
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl FormAction {
    pub fn new(kind: ActionKind, target: impl Into<String>) -> Self {
        Self {
            kind,
            target: target.into(),
            text: None,
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }
}

impl fmt::Display for FormAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.target)?;
        if let Some(text) = &self.text {
            write!(f, "={text}")?;
        }
        Ok(())
    }
}

impl ElementKind {
    /// Actions that make sense for this kind of element
    pub fn action_kinds(self) -> &'static [ActionKind] {
        use ActionKind::*;
        match self {
            Self::TextInput | Self::EmailInput | Self::PasswordInput | Self::Textarea => {
                &[Click, Type, Clear]
            }
            Self::Select => &[Click, Select],
            Self::Checkbox => &[Check, Uncheck],
            Self::Radio | Self::Button | Self::Link => &[Click],
            Self::Submit => &[Click, Submit],
            Self::Unknown => &[],
        }
    }
}

/// Candidate values to type into a text element
pub fn sample_texts(element: &ElementDescriptor) -> [&'static str; 2] {
    match element.kind {
        ElementKind::EmailInput => ["test@example.com", "user@demo.com"],
        ElementKind::Textarea => ["AI learning demo", "Test description"],
        _ if element.id.to_ascii_lowercase().contains("name") => ["John Doe", "Jane Smith"],
        _ => ["sample text", "test input"],
    }
}

/// Build the action set for a list of elements
///
/// Disabled elements contribute nothing. The result follows the order of `elements`, so the
/// same page always yields the same action set.
pub fn actions_for(elements: &[ElementDescriptor]) -> Vec<FormAction> {
    let mut actions = Vec::new();

    for element in elements.iter().filter(|e| e.enabled) {
        for &kind in element.kind.action_kinds() {
            let action = FormAction::new(kind, &element.id);
            match kind {
                ActionKind::Type => actions.extend(
                    sample_texts(element)
                        .into_iter()
                        .map(|text| action.clone().with_text(text)),
                ),
                ActionKind::Select if !element.options.is_empty() => actions.extend(
                    element
                        .options
                        .iter()
                        .map(|option| action.clone().with_text(option)),
                ),
                _ => actions.push(action),
            }
        }
    }

    actions
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_text() {
        let action = FormAction::new(ActionKind::Type, "email").with_text("a@b.c");
        assert_eq!(action.to_string(), "type:email=a@b.c");
        assert_eq!(
            FormAction::new(ActionKind::Submit, "send").to_string(),
            "submit:send"
        );
    }

    #[test]
    fn actions_per_kind() {
        let elements = [
            ElementDescriptor::new("fullName", ElementKind::TextInput).required(),
            ElementDescriptor::new("age", ElementKind::Select).with_options(["18-25", "26-35"]),
            ElementDescriptor::new("terms", ElementKind::Checkbox),
            ElementDescriptor::new("send", ElementKind::Submit),
        ];
        let actions: Vec<String> = actions_for(&elements)
            .iter()
            .map(ToString::to_string)
            .collect();

        assert_eq!(
            actions,
            [
                "click:fullName",
                "type:fullName=John Doe",
                "type:fullName=Jane Smith",
                "clear:fullName",
                "click:age",
                "select:age=18-25",
                "select:age=26-35",
                "check:terms",
                "uncheck:terms",
                "click:send",
                "submit:send",
            ]
        );
    }

    #[test]
    fn disabled_and_unknown_elements_have_no_actions() {
        let elements = [
            ElementDescriptor::new("news", ElementKind::Checkbox).disabled(),
            ElementDescriptor::new("blob", ElementKind::Unknown),
        ];
        assert!(actions_for(&elements).is_empty());
    }

    #[test]
    fn select_without_options_gets_one_action() {
        let elements = [ElementDescriptor::new("country", ElementKind::Select)];
        let actions = actions_for(&elements);
        assert_eq!(actions.len(), 2);
        assert_eq!(actions[1], FormAction::new(ActionKind::Select, "country"));
    }

    #[test]
    fn sample_texts_by_kind() {
        let email = ElementDescriptor::new("contact", ElementKind::EmailInput);
        assert_eq!(sample_texts(&email)[0], "test@example.com");
        let name = ElementDescriptor::new("userName", ElementKind::TextInput);
        assert_eq!(sample_texts(&name)[1], "Jane Smith");
        let other = ElementDescriptor::new("city", ElementKind::TextInput);
        assert_eq!(sample_texts(&other)[0], "sample text");
    }
}

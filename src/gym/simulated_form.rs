use std::collections::HashMap;

use crate::web::{
    ActionKind, Completion, ElementDescriptor, ElementKind, FormAction, Page, PageError,
    Performed,
};

/// An in-memory registration form
///
/// Mirrors the demo page: required name, email, age and terms fields, an optional bio, a
/// disabled newsletter checkbox and a submit button that only goes through once every required
/// field is filled.
///
/// Intended for use with a [FormEnv](crate::web::FormEnv)
pub struct SimulatedForm {
    template: Vec<ElementDescriptor>,
    elements: Vec<ElementDescriptor>,
    values: HashMap<String, String>,
    submitted: bool,
    loads: u32,
    performed: u32,
    lose_session_after: Option<u32>,
    lost: bool,
}

impl SimulatedForm {
    pub fn new() -> Self {
        Self::with_elements(vec![
            ElementDescriptor::new("fullName", ElementKind::TextInput).required(),
            ElementDescriptor::new("email", ElementKind::EmailInput).required(),
            ElementDescriptor::new("age", ElementKind::Select)
                .required()
                .with_options(["18-25", "26-35", "36-45", "46+"]),
            ElementDescriptor::new("bio", ElementKind::Textarea),
            ElementDescriptor::new("terms", ElementKind::Checkbox).required(),
            ElementDescriptor::new("newsletter", ElementKind::Checkbox).disabled(),
            ElementDescriptor::new("submitBtn", ElementKind::Submit),
        ])
    }

    /// A form made of arbitrary elements, all of them initially empty
    pub fn with_elements(elements: Vec<ElementDescriptor>) -> Self {
        let template: Vec<_> = elements.into_iter().map(|e| e.filled(false)).collect();
        Self {
            elements: template.clone(),
            template,
            values: HashMap::new(),
            submitted: false,
            loads: 0,
            performed: 0,
            lose_session_after: None,
            lost: false,
        }
    }

    /// Drop the session once `actions` actions have been performed
    pub fn lose_session_after(mut self, actions: u32) -> Self {
        self.lose_session_after = Some(actions);
        self
    }

    pub fn is_submitted(&self) -> bool {
        self.submitted
    }

    /// Number of times the page was loaded
    pub fn loads(&self) -> u32 {
        self.loads
    }

    /// Current value of a text field or select
    pub fn value(&self, id: &str) -> Option<&str> {
        self.values.get(id).map(String::as_str)
    }

    fn check_session(&self) -> Result<(), PageError> {
        if self.lost {
            Err(session_closed())
        } else {
            Ok(())
        }
    }

    fn is_complete(&self) -> bool {
        self.elements.iter().filter(|e| e.required).all(|e| e.filled)
    }

    fn set(&mut self, index: usize, value: Option<String>) -> Performed {
        let id = self.elements[index].id.clone();
        let current = self.values.get(&id);
        if current == value.as_ref() {
            return Performed::Unchanged;
        }
        self.elements[index].filled = value.as_deref().is_some_and(|v| !v.is_empty());
        match value {
            Some(value) => self.values.insert(id, value),
            None => self.values.remove(&id),
        };
        Performed::Changed
    }

    fn toggle(&mut self, index: usize, checked: bool) -> Performed {
        let element = &mut self.elements[index];
        if element.filled == checked {
            return Performed::Unchanged;
        }
        element.filled = checked;
        Performed::Changed
    }

    fn submit(&mut self) -> Performed {
        if self.submitted || !self.is_complete() {
            return Performed::Unchanged;
        }
        self.submitted = true;
        Performed::Changed
    }
}

fn session_closed() -> PageError {
    PageError::SessionLost(String::from("simulated session closed"))
}

impl Default for SimulatedForm {
    fn default() -> Self {
        Self::new()
    }
}

impl Page for SimulatedForm {
    fn load(&mut self) -> Result<(), PageError> {
        self.check_session()?;
        self.elements = self.template.clone();
        self.values.clear();
        self.submitted = false;
        self.loads += 1;
        Ok(())
    }

    fn list_interactive_elements(&mut self) -> Result<Vec<ElementDescriptor>, PageError> {
        self.check_session()?;
        Ok(self.elements.clone())
    }

    fn completion(&mut self) -> Result<Completion, PageError> {
        self.check_session()?;
        let required = self.elements.iter().filter(|e| e.required).count();
        let filled = self
            .elements
            .iter()
            .filter(|e| e.required && e.filled)
            .count();
        let progress = if required == 0 {
            100.0
        } else {
            filled as f64 / required as f64 * 100.0
        };
        Ok(Completion {
            progress,
            complete: filled == required,
            submitted: self.submitted,
        })
    }

    fn perform(
        &mut self,
        action: &FormAction,
        _element: &ElementDescriptor,
    ) -> Result<Performed, PageError> {
        self.check_session()?;
        if self.lose_session_after.is_some_and(|n| self.performed >= n) {
            self.lost = true;
            return Err(session_closed());
        }
        self.performed += 1;

        let index = self
            .elements
            .iter()
            .position(|e| e.id == action.target)
            .ok_or_else(|| PageError::ElementNotFound(action.target.clone()))?;
        let element = &self.elements[index];
        let kind = element.kind;

        let blocked = |reason: String| PageError::NotInteractable {
            id: action.target.clone(),
            reason,
        };
        if !element.enabled {
            return Err(blocked(String::from("disabled")));
        }
        if !element.kind.action_kinds().contains(&action.kind) {
            return Err(blocked(format!("cannot {} a {}", action.kind, element.kind)));
        }

        let performed = match action.kind {
            ActionKind::Type => {
                let text = action.text.clone().unwrap_or_default();
                self.set(index, Some(text))
            }
            ActionKind::Clear => self.set(index, None),
            ActionKind::Select => {
                let option = match &action.text {
                    Some(option) if element.options.contains(option) => option.clone(),
                    Some(option) => return Err(blocked(format!("no option `{option}`"))),
                    None => match element.options.first() {
                        Some(first) => first.clone(),
                        None => return Err(blocked(String::from("no options"))),
                    },
                };
                self.set(index, Some(option))
            }
            ActionKind::Check => self.toggle(index, true),
            ActionKind::Uncheck => self.toggle(index, false),
            ActionKind::Submit => self.submit(),
            ActionKind::Click => match kind {
                ElementKind::Submit => self.submit(),
                ElementKind::Radio => self.toggle(index, true),
                // focus only
                _ => Performed::Changed,
            },
        };
        Ok(performed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn act(form: &mut SimulatedForm, action: FormAction) -> Result<Performed, PageError> {
        let element = ElementDescriptor::new(action.target.clone(), ElementKind::Unknown);
        form.perform(&action, &element)
    }

    #[test]
    fn progress_tracks_required_fields() {
        let mut form = SimulatedForm::new();
        form.load().unwrap();
        assert_eq!(form.completion().unwrap().progress, 0.0);

        act(
            &mut form,
            FormAction::new(ActionKind::Type, "fullName").with_text("Jane Smith"),
        )
        .unwrap();
        act(&mut form, FormAction::new(ActionKind::Type, "bio").with_text("hi")).unwrap();
        let completion = form.completion().unwrap();
        assert_eq!(completion.progress, 25.0);
        assert!(!completion.complete);
        assert_eq!(form.value("fullName"), Some("Jane Smith"));
    }

    #[test]
    fn repeated_action_is_unchanged() {
        let mut form = SimulatedForm::new();
        form.load().unwrap();
        let check = FormAction::new(ActionKind::Check, "terms");
        assert_eq!(act(&mut form, check.clone()), Ok(Performed::Changed));
        assert_eq!(act(&mut form, check), Ok(Performed::Unchanged));
        assert_eq!(
            act(&mut form, FormAction::new(ActionKind::Clear, "email")),
            Ok(Performed::Unchanged)
        );
    }

    #[test]
    fn submit_requires_complete_form() {
        let mut form = SimulatedForm::new();
        form.load().unwrap();
        let submit = FormAction::new(ActionKind::Click, "submitBtn");
        assert_eq!(act(&mut form, submit.clone()), Ok(Performed::Unchanged));

        for action in [
            FormAction::new(ActionKind::Type, "fullName").with_text("John Doe"),
            FormAction::new(ActionKind::Type, "email").with_text("user@demo.com"),
            FormAction::new(ActionKind::Select, "age"),
            FormAction::new(ActionKind::Check, "terms"),
        ] {
            act(&mut form, action).unwrap();
        }
        assert_eq!(form.value("age"), Some("18-25"));
        assert_eq!(act(&mut form, submit), Ok(Performed::Changed));
        assert!(form.is_submitted());
        assert!(form.completion().unwrap().submitted);
    }

    #[test]
    fn load_restores_initial_condition() {
        let mut form = SimulatedForm::new();
        form.load().unwrap();
        let initial = form.list_interactive_elements().unwrap();
        act(&mut form, FormAction::new(ActionKind::Check, "terms")).unwrap();
        assert_ne!(form.list_interactive_elements().unwrap(), initial);

        form.load().unwrap();
        assert_eq!(form.list_interactive_elements().unwrap(), initial);
        assert_eq!(form.loads(), 2);
    }

    #[test]
    fn rejects_impossible_actions() {
        let mut form = SimulatedForm::new();
        form.load().unwrap();
        assert!(matches!(
            act(&mut form, FormAction::new(ActionKind::Check, "newsletter")),
            Err(PageError::NotInteractable { .. })
        ));
        assert!(matches!(
            act(&mut form, FormAction::new(ActionKind::Select, "age").with_text("99")),
            Err(PageError::NotInteractable { .. })
        ));
        assert_eq!(
            act(&mut form, FormAction::new(ActionKind::Click, "missing")),
            Err(PageError::ElementNotFound(String::from("missing")))
        );
    }

    #[test]
    fn lost_session_stays_lost() {
        let mut form = SimulatedForm::new().lose_session_after(0);
        form.load().unwrap();
        let err = act(&mut form, FormAction::new(ActionKind::Click, "fullName")).unwrap_err();
        assert!(err.is_fatal());
        assert!(form.load().unwrap_err().is_fatal());
        assert!(form.completion().is_err());
    }
}

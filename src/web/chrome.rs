//! [`Page`] backed by a Chrome session driven through `headless_chrome`

use std::{fmt::Display, sync::Arc, thread, time::Duration};

use headless_chrome::{Browser, Element, LaunchOptions, Tab};
use log::{debug, info};
use serde::Deserialize;
use serde_json::{json, Value};

use super::{
    ActionKind, Completion, ElementDescriptor, ElementKind, FormAction, Page, PageError, Performed,
};

/// Lists visible interactive elements as a JSON string. Elements without an id get one, so they
/// can be addressed later.
const DETECT_JS: &str = r#"
(() => {
  const visible = el => {
    const s = getComputedStyle(el);
    return el.getClientRects().length > 0 && s.visibility !== 'hidden' && s.display !== 'none';
  };
  const out = [];
  document.querySelectorAll('input, textarea, select, button, a[href]').forEach((el, i) => {
    if (el.type === 'hidden' || !visible(el)) return;
    if (!el.id) el.id = 'form-rl-' + i;
    const tag = el.tagName.toLowerCase();
    const checkable = el.type === 'checkbox' || el.type === 'radio';
    let filled = false;
    if (checkable) filled = el.checked;
    else if (tag === 'select' || tag === 'input' || tag === 'textarea') {
      filled = (el.value || '').trim() !== '';
    }
    out.push({
      id: el.id,
      tag,
      type: el.getAttribute('type'),
      required: !!el.required,
      enabled: !el.disabled,
      filled,
      options: tag === 'select' ? [...el.options].map(o => o.value).filter(v => v !== '') : [],
    });
  });
  return JSON.stringify(out);
})()
"#;

/// Reads the success panel and the page's own `checkFormState()`, falling back to counting
/// filled required fields when the page does not provide one.
const COMPLETION_JS: &str = r#"
(() => {
  const panel = document.getElementById('successPanel');
  const submitted = !!panel && panel.getClientRects().length > 0
    && getComputedStyle(panel).visibility !== 'hidden';
  const state = window.checkFormState ? window.checkFormState() : null;
  if (state) {
    const progress = Number(state.progress) || 0;
    return JSON.stringify({ submitted, progress, complete: !!state.isComplete });
  }
  const required = [...document.querySelectorAll('[required]')];
  const filled = required.filter(el =>
    (el.type === 'checkbox' || el.type === 'radio') ? el.checked : (el.value || '').trim() !== '');
  const progress = required.length ? filled.length / required.length * 100 : 0;
  const complete = required.length > 0 && filled.length === required.length;
  return JSON.stringify({ submitted, progress, complete });
})()
"#;

const VALUE_FN: &str = "function() { return this.value; }";
const CHECKED_FN: &str = "function() { return this.checked; }";
const CLEAR_FN: &str = "function() {
  this.value = '';
  this.dispatchEvent(new Event('input', { bubbles: true }));
  this.dispatchEvent(new Event('change', { bubbles: true }));
}";
const SELECT_FN: &str = "function(v) {
  if (this.value === v) return false;
  this.value = v;
  this.dispatchEvent(new Event('change', { bubbles: true }));
  return true;
}";

#[derive(Deserialize)]
struct DetectedElement {
    id: String,
    tag: String,
    #[serde(rename = "type")]
    type_attr: Option<String>,
    required: bool,
    enabled: bool,
    filled: bool,
    options: Vec<String>,
}

impl From<DetectedElement> for ElementDescriptor {
    fn from(e: DetectedElement) -> Self {
        Self {
            kind: ElementKind::classify(&e.tag, e.type_attr.as_deref()),
            id: e.id,
            required: e.required,
            enabled: e.enabled,
            filled: e.filled,
            options: e.options,
        }
    }
}

#[derive(Deserialize)]
struct PageCompletion {
    submitted: bool,
    progress: f64,
    complete: bool,
}

/// A form page in a Chrome tab
pub struct ChromePage {
    _browser: Browser,
    tab: Arc<Tab>,
    url: String,
    settle: Duration,
}

impl ChromePage {
    /// Launch Chrome and open a tab for the form at `url`
    ///
    /// The page itself is only loaded by [`Page::load`].
    pub fn launch(url: impl Into<String>, headless: bool) -> Result<Self, PageError> {
        let options = LaunchOptions {
            headless,
            window_size: Some((1280, 900)),
            ..Default::default()
        };
        let browser = Browser::new(options).map_err(|e| lost("failed to launch browser", e))?;
        let tab = browser
            .new_tab()
            .map_err(|e| lost("failed to open tab", e))?;
        info!("browser ready");

        Ok(Self {
            _browser: browser,
            tab,
            url: url.into(),
            settle: Duration::from_millis(300),
        })
    }

    /// Time to wait after every action for the page to react
    pub fn with_settle(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn eval_json<T: for<'de> Deserialize<'de>>(&self, js: &str) -> Result<T, PageError> {
        let result = self.tab.evaluate(js, false).map_err(script_error)?;
        let raw = result
            .value
            .as_ref()
            .and_then(Value::as_str)
            .ok_or_else(|| PageError::Script(String::from("script returned no value")))?;
        serde_json::from_str(raw).map_err(|e| PageError::Script(e.to_string()))
    }

    fn find(&self, id: &str) -> Result<Element<'_>, PageError> {
        let selector = format!(r#"[id="{}"]"#, id.replace('"', "\\\""));
        self.tab
            .find_element(&selector)
            .map_err(|_| PageError::ElementNotFound(id.to_string()))
    }
}

impl Page for ChromePage {
    fn load(&mut self) -> Result<(), PageError> {
        self.tab
            .navigate_to(&self.url)
            .and_then(|tab| tab.wait_until_navigated())
            .map_err(|e| lost("failed to load page", e))?;
        thread::sleep(self.settle);
        debug!("loaded {}", self.url);
        Ok(())
    }

    fn list_interactive_elements(&mut self) -> Result<Vec<ElementDescriptor>, PageError> {
        let detected: Vec<DetectedElement> = self.eval_json(DETECT_JS)?;
        Ok(detected.into_iter().map(Into::into).collect())
    }

    fn completion(&mut self) -> Result<Completion, PageError> {
        let state: PageCompletion = self.eval_json(COMPLETION_JS)?;
        if state.submitted {
            return Ok(Completion {
                progress: 100.0,
                complete: true,
                submitted: true,
            });
        }
        Ok(Completion {
            progress: state.progress.clamp(0.0, 100.0),
            complete: state.complete,
            submitted: false,
        })
    }

    fn perform(
        &mut self,
        action: &FormAction,
        element: &ElementDescriptor,
    ) -> Result<Performed, PageError> {
        let id = &action.target;
        let node = self.find(id)?;
        let blocked = |e: &dyn Display| interaction_error(id, e);

        let performed = match action.kind {
            ActionKind::Click | ActionKind::Submit => {
                node.click().map_err(|e| blocked(&e))?;
                Performed::Changed
            }
            ActionKind::Type => {
                let text = action.text.as_deref().unwrap_or_default();
                let current = node
                    .call_js_fn(VALUE_FN, vec![], false)
                    .map_err(|e| blocked(&e))?
                    .value;
                if current.as_ref().and_then(Value::as_str) == Some(text) {
                    Performed::Unchanged
                } else {
                    node.click().map_err(|e| blocked(&e))?;
                    node.call_js_fn(CLEAR_FN, vec![], false)
                        .map_err(|e| blocked(&e))?;
                    node.type_into(text).map_err(|e| blocked(&e))?;
                    Performed::Changed
                }
            }
            ActionKind::Clear => {
                let current = node
                    .call_js_fn(VALUE_FN, vec![], false)
                    .map_err(|e| blocked(&e))?
                    .value;
                let text = current.as_ref().and_then(Value::as_str);
                if text.unwrap_or_default().is_empty() {
                    Performed::Unchanged
                } else {
                    node.call_js_fn(CLEAR_FN, vec![], false)
                        .map_err(|e| blocked(&e))?;
                    Performed::Changed
                }
            }
            ActionKind::Select => {
                let option = action
                    .text
                    .as_ref()
                    .or_else(|| element.options.first())
                    .ok_or_else(|| blocked(&"no options to select"))?;
                let changed = node
                    .call_js_fn(SELECT_FN, vec![json!(option)], false)
                    .map_err(|e| blocked(&e))?;
                match changed.value {
                    Some(Value::Bool(false)) => Performed::Unchanged,
                    _ => Performed::Changed,
                }
            }
            ActionKind::Check | ActionKind::Uncheck => {
                let want = action.kind == ActionKind::Check;
                let checked = node
                    .call_js_fn(CHECKED_FN, vec![], false)
                    .map_err(|e| blocked(&e))?
                    .value;
                if checked.as_ref().and_then(Value::as_bool) == Some(want) {
                    Performed::Unchanged
                } else {
                    node.click().map_err(|e| blocked(&e))?;
                    Performed::Changed
                }
            }
        };

        thread::sleep(self.settle);
        Ok(performed)
    }
}

fn is_disconnect(message: &str) -> bool {
    let message = message.to_ascii_lowercase();
    message.contains("connection is closed") || message.contains("connectionclosed")
}

fn lost(context: &str, err: impl Display) -> PageError {
    PageError::SessionLost(format!("{context}: {err}"))
}

fn script_error(err: impl Display) -> PageError {
    let message = err.to_string();
    if is_disconnect(&message) {
        PageError::SessionLost(message)
    } else {
        PageError::Script(message)
    }
}

fn interaction_error(id: &str, err: &dyn Display) -> PageError {
    let reason = err.to_string();
    if is_disconnect(&reason) {
        PageError::SessionLost(reason)
    } else if reason.contains("No node with given id") {
        PageError::Stale(id.to_string())
    } else {
        PageError::NotInteractable {
            id: id.to_string(),
            reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detected_elements_are_classified() {
        let raw = r#"[
            {"id": "email", "tag": "input", "type": "email", "required": true,
             "enabled": true, "filled": false, "options": []},
            {"id": "go", "tag": "button", "type": null, "required": false,
             "enabled": true, "filled": false, "options": []}
        ]"#;
        let detected: Vec<DetectedElement> = serde_json::from_str(raw).unwrap();
        let elements: Vec<ElementDescriptor> = detected.into_iter().map(Into::into).collect();
        assert_eq!(elements[0].kind, ElementKind::EmailInput);
        assert!(elements[0].required);
        assert_eq!(elements[1].kind, ElementKind::Submit);
    }

    #[test]
    fn disconnects_are_fatal() {
        let closed = "Unable to make method calls because underlying connection is closed";
        assert!(script_error(closed).is_fatal());
        assert!(!script_error("ReferenceError: foo is not defined").is_fatal());
        assert_eq!(
            interaction_error("x", &"No node with given id found"),
            PageError::Stale(String::from("x"))
        );
    }
}

use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};

use super::{Completion, ElementDescriptor, ElementKind};

/// Summary of the observable condition of a form
///
/// Element counts are kept in an ordered map, so the state does not depend on the order in
/// which elements were enumerated.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FormState {
    /// Completion progress rounded down to a multiple of ten
    pub progress: u8,
    /// Required fields holding a value
    pub filled: usize,
    pub required: usize,
    pub complete: bool,
    pub submitted: bool,
    pub kinds: BTreeMap<ElementKind, usize>,
}

impl FormState {
    pub fn observe(elements: &[ElementDescriptor], completion: &Completion) -> Self {
        let mut kinds = BTreeMap::new();
        let (mut filled, mut required) = (0, 0);

        for element in elements {
            *kinds.entry(element.kind).or_insert(0) += 1;
            if element.required {
                required += 1;
                if element.filled {
                    filled += 1;
                }
            }
        }

        Self {
            progress: bucket(completion.progress),
            filled,
            required,
            complete: completion.complete,
            submitted: completion.submitted,
            kinds,
        }
    }
}

fn bucket(progress: f64) -> u8 {
    if !progress.is_finite() {
        return 0;
    }
    let clamped = progress.clamp(0.0, 100.0);
    ((clamped / 10.0).floor() * 10.0) as u8
}

impl fmt::Display for FormState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "progress_{}|filled_{}|required_{}|complete_{}|submitted_{}",
            self.progress, self.filled, self.required, self.complete, self.submitted
        )?;
        for (kind, count) in &self.kinds {
            write!(f, "|{kind}_{count}")?;
        }
        Ok(())
    }
}

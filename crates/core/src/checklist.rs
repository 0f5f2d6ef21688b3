//! Visit checklist completion.

use crate::model::{Appointment, ChecklistItem};
use std::collections::BTreeSet;

/// Percentage of the required care items that were completed.
///
/// An empty requirement list yields exactly `0.0`. Completed items that are not required do not
/// count towards the ratio, and duplicate required items count once.
pub fn completion_percentage(required: &[ChecklistItem], completed: &BTreeSet<ChecklistItem>) -> f64 {
    let required: BTreeSet<ChecklistItem> = required.iter().copied().collect();
    if required.is_empty() {
        return 0.0;
    }

    let done = required.intersection(completed).count();
    100.0 * done as f64 / required.len() as f64
}

/// Replaces the completed checklist of a visit.
///
/// Items are stored as submitted, including ones outside the client's required list; the
/// client's requirements are never touched.
pub fn update_checklist(appointment: &mut Appointment, items: impl IntoIterator<Item = ChecklistItem>) {
    appointment.checklist_items = items.into_iter().collect();
}

#[cfg(test)]
mod tests {
    use super::*;
    use ChecklistItem::*;

    fn set(items: &[ChecklistItem]) -> BTreeSet<ChecklistItem> {
        items.iter().copied().collect()
    }

    #[test]
    fn empty_requirements_are_zero_percent() {
        assert_eq!(completion_percentage(&[], &set(&[])), 0.0);
        assert_eq!(completion_percentage(&[], &set(&[Hygiene, Nutrition])), 0.0);
    }

    #[test]
    fn ratio_of_required_items() {
        let required = [Hygiene, Nutrition];
        assert_eq!(completion_percentage(&required, &set(&[Hygiene, Nutrition])), 100.0);
        assert_eq!(completion_percentage(&required, &set(&[])), 0.0);
        assert_eq!(completion_percentage(&required, &set(&[Hygiene])), 50.0);
    }

    #[test]
    fn items_outside_requirements_are_ignored() {
        let required = [Hygiene, Nutrition, Mobility];
        let pct = completion_percentage(&required, &set(&[Hygiene, WoundCare, Transportation]));
        assert!((pct - 100.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn duplicate_requirements_count_once() {
        let required = [Hygiene, Hygiene, Nutrition];
        assert_eq!(completion_percentage(&required, &set(&[Hygiene])), 50.0);
    }
}

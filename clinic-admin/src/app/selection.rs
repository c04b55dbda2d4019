use clinic_api::AppointmentId;

use super::entities::AppointmentStore;

/// Rows currently ticked in the appointment grid, in the order they were
/// selected. Enablement of view/edit/delete is derived from it on read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    ids: Vec<AppointmentId>,
}

impl Selection {
    pub fn set_selection(&mut self, ids: impl IntoIterator<Item = AppointmentId>) {
        self.ids.clear();
        for id in ids {
            if !self.ids.contains(&id) {
                self.ids.push(id);
            }
        }
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn ids(&self) -> &[AppointmentId] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// The selected id, when exactly one is selected.
    pub fn single(&self) -> Option<AppointmentId> {
        match self.ids.as_slice() {
            [id] => Some(*id),
            _ => None,
        }
    }

    pub fn can_view_or_edit(&self) -> bool {
        self.single().is_some()
    }

    pub fn can_delete(&self) -> bool {
        !self.ids.is_empty()
    }

    /// Drop ids that are no longer in `store`.
    pub fn retain_present(&mut self, store: &AppointmentStore) {
        self.ids.retain(|id| store.contains(*id));
    }
}

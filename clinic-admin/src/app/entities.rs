use clinic_api::{
    ApiError, Appointment, AppointmentId, ClinicApi, ErrorKind, Patient, PatientId,
};
use futures::future::join_all;
use std::{fmt, future::Future, hash::Hash};

use super::status::{failure_message, OperationStatus};

/// Something held in an [`EntityStore`], addressable by a server id.
pub trait Entity: Clone {
    type Id: Copy + Eq + Hash + fmt::Display + fmt::Debug;

    fn id(&self) -> Self::Id;
}

impl Entity for Appointment {
    type Id = AppointmentId;

    fn id(&self) -> AppointmentId {
        self.id
    }
}

impl Entity for Patient {
    type Id = PatientId;

    fn id(&self) -> PatientId {
        self.id
    }
}

/// A fetched collection plus the status of the last fetch or mutation.
///
/// The collection is always the last server snapshot, minus any ids that were
/// deleted successfully since. It is never reordered or edited in place.
#[derive(Debug, Clone)]
pub struct EntityStore<T> {
    items: Vec<T>,
    status: OperationStatus,
}

pub type AppointmentStore = EntityStore<Appointment>;
pub type PatientStore = EntityStore<Patient>;

impl<T> Default for EntityStore<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            status: OperationStatus::Idle,
        }
    }
}

impl<T: Entity> EntityStore<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: T::Id) -> Option<&T> {
        self.items.iter().find(|item| item.id() == id)
    }

    pub fn contains(&self, id: T::Id) -> bool {
        self.get(id).is_some()
    }

    pub fn status(&self) -> &OperationStatus {
        &self.status
    }

    pub fn last_error(&self) -> Option<&str> {
        self.status.error()
    }

    /// Run `fetch` and replace the collection with its result. A failed
    /// fetch leaves the previous items in place.
    async fn load<F>(&mut self, label: &str, fetch: F) -> bool
    where
        F: Future<Output = Result<Vec<T>, ApiError>>,
    {
        self.status.begin();
        match fetch.await {
            Ok(items) => {
                tracing::debug!("loaded {} {}", items.len(), label);
                self.items = items;
                self.status.succeed();
                true
            }
            Err(e) => {
                tracing::warn!("failed to load {}: {}", label, e);
                self.status
                    .fail(failure_message(&e, &format!("Failed to load {}", label)));
                false
            }
        }
    }

    fn remove(&mut self, id: T::Id) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item.id() != id);
        self.items.len() != before
    }
}

#[cfg(test)]
impl<T: Entity> EntityStore<T> {
    pub fn ids(&self) -> Vec<T::Id> {
        self.items.iter().map(Entity::id).collect()
    }
}

impl EntityStore<Patient> {
    pub async fn fetch_all(&mut self, api: &dyn ClinicApi, token: Option<&str>) -> bool {
        self.load("patients", api.patients(token)).await
    }
}

impl EntityStore<Appointment> {
    pub async fn fetch_all(&mut self, api: &dyn ClinicApi, token: Option<&str>) -> bool {
        self.load("appointments", api.appointments(token)).await
    }

    pub async fn delete_one(
        &mut self,
        api: &dyn ClinicApi,
        token: Option<&str>,
        id: AppointmentId,
    ) -> DeleteOutcome {
        self.status.begin();
        let outcome = DeleteOutcome::new(id, api.delete_appointment(token, id).await);
        self.apply(&outcome);

        match &outcome.result {
            Ok(()) => self.status.succeed(),
            Err(failure) => self.status.fail(failure.message.clone()),
        }
        outcome
    }

    /// Delete every id independently.
    ///
    /// Requests go out in the given order and run concurrently; the report
    /// lists outcomes in that same order. Successes are removed, failures stay.
    pub async fn delete_many(
        &mut self,
        api: &dyn ClinicApi,
        token: Option<&str>,
        ids: &[AppointmentId],
    ) -> BatchDeleteReport {
        if ids.is_empty() {
            return BatchDeleteReport::default();
        }

        self.status.begin();
        let requests = ids.iter().map(|&id| async move {
            DeleteOutcome::new(id, api.delete_appointment(token, id).await)
        });
        let outcomes = join_all(requests).await;

        for outcome in &outcomes {
            self.apply(outcome);
        }
        let report = BatchDeleteReport { outcomes };

        match report.failure_summary() {
            Some(summary) => self.status.fail(summary),
            None => self.status.succeed(),
        }
        report
    }

    fn apply(&mut self, outcome: &DeleteOutcome) {
        match &outcome.result {
            Ok(()) => {
                if !self.remove(outcome.id) {
                    tracing::debug!("deleted appointment {} was not loaded", outcome.id);
                }
            }
            Err(failure) => {
                tracing::warn!(
                    "delete of appointment {} failed: {}",
                    outcome.id,
                    failure.message
                );
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteFailure {
    pub kind: ErrorKind,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteOutcome {
    pub id: AppointmentId,
    pub result: Result<(), DeleteFailure>,
}

impl DeleteOutcome {
    fn new(id: AppointmentId, result: Result<(), ApiError>) -> Self {
        Self {
            id,
            result: result.map_err(|e| DeleteFailure {
                kind: e.kind(),
                message: failure_message(&e, "Delete failed"),
            }),
        }
    }

    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Per-id results of a multi-row delete, in the order the ids were given.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchDeleteReport {
    pub outcomes: Vec<DeleteOutcome>,
}

impl BatchDeleteReport {
    pub fn deleted(&self) -> Vec<AppointmentId> {
        self.outcomes
            .iter()
            .filter(|o| o.is_success())
            .map(|o| o.id)
            .collect()
    }

    pub fn failed(&self) -> Vec<&DeleteOutcome> {
        self.outcomes.iter().filter(|o| !o.is_success()).collect()
    }

    pub fn all_succeeded(&self) -> bool {
        self.outcomes.iter().all(DeleteOutcome::is_success)
    }

    /// One-line description of the failures, or `None` when nothing failed.
    pub fn failure_summary(&self) -> Option<String> {
        let failed = self.failed();
        if failed.is_empty() {
            return None;
        }

        let details = failed
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|f| format!("{}: {}", o.id, f.message)))
            .collect::<Vec<_>>()
            .join("; ");
        Some(format!(
            "Failed to delete {} of {} appointments ({})",
            failed.len(),
            self.outcomes.len(),
            details
        ))
    }
}

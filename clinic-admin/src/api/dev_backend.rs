use async_trait::async_trait;
use clinic_api::{
    ApiError, Appointment, AppointmentId, ClinicApi, Credentials, NewUser, Patient, PatientId,
    PatientSummary, ProfileData, Session, UserId,
};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use time::OffsetDateTime;

/// In-memory stand-in for the clinic backend.
///
/// Backs `--dev` mode and the store tests. Failures and per-request delays can
/// be injected, and every call is recorded with the token it carried.
#[derive(Debug, Clone, Default)]
pub struct DevBackend {
    state: Arc<Mutex<DevState>>,
}

#[derive(Debug, Default)]
struct DevState {
    users: Vec<DevUser>,
    appointments: Vec<Appointment>,
    patients: Vec<Patient>,
    failing_deletes: HashSet<AppointmentId>,
    delete_delays: HashMap<AppointmentId, Duration>,
    offline: bool,
    fail_logout: bool,
    requests: Vec<DevRequest>,
}

#[derive(Debug, Clone)]
struct DevUser {
    username: String,
    password: String,
    session: Session,
}

/// One recorded call, with the token and appointment id it carried.
#[allow(dead_code)]
#[derive(Debug, Clone, PartialEq)]
pub struct DevRequest {
    pub call: &'static str,
    pub token: Option<String>,
    pub appointment: Option<AppointmentId>,
}

impl DevBackend {
    /// A backend with one user (`alice` / `pw`) and a few appointments around now.
    pub fn seeded() -> Self {
        let backend = Self::default();
        {
            let mut state = backend.state();
            state.users.push(dev_user("alice", "pw", "u-1", "Alice", "Moreau", "ADMIN"));
            state.patients = seed_patients();
            state.appointments = seed_appointments(&state.patients);
        }
        backend
    }

    fn state(&self) -> MutexGuard<'_, DevState> {
        self.state.lock().expect("dev store lock poisoned")
    }

    /// Record the call and fail it when the backend is offline.
    fn enter(&self, call: &'static str, token: Option<&str>) -> Result<(), ApiError> {
        self.enter_for(call, token, None)
    }

    fn enter_for(
        &self,
        call: &'static str,
        token: Option<&str>,
        appointment: Option<AppointmentId>,
    ) -> Result<(), ApiError> {
        let mut state = self.state();
        state.requests.push(DevRequest {
            call,
            token: token.map(str::to_string),
            appointment,
        });
        tracing::debug!("dev backend call #{}: {}", state.requests.len(), call);
        if state.offline {
            return Err(ApiError::network(call, "dev backend is offline"));
        }
        Ok(())
    }

    fn session_for_token(&self, call: &'static str, token: &str) -> Result<Session, ApiError> {
        self.state()
            .users
            .iter()
            .find(|u| u.session.token == token)
            .map(|u| u.session.clone())
            .ok_or_else(|| ApiError::from_status(call, 401, Some("Invalid token".to_string())))
    }
}

#[cfg(test)]
impl DevBackend {
    pub fn with_appointments(self, appointments: Vec<Appointment>) -> Self {
        self.state().appointments = appointments;
        self
    }

    pub fn fail_delete_of(&self, id: AppointmentId) {
        self.state().failing_deletes.insert(id);
    }

    pub fn delay_delete_of(&self, id: AppointmentId, delay: Duration) {
        self.state().delete_delays.insert(id, delay);
    }

    pub fn set_offline(&self, offline: bool) {
        self.state().offline = offline;
    }

    pub fn fail_logout(&self) {
        self.state().fail_logout = true;
    }

    pub fn requests(&self) -> Vec<DevRequest> {
        self.state().requests.clone()
    }

    pub fn requests_to(&self, call: &str) -> Vec<DevRequest> {
        self.state()
            .requests
            .iter()
            .filter(|r| r.call == call)
            .cloned()
            .collect()
    }

    /// Appointment ids the backend still holds, in order.
    pub fn appointment_ids(&self) -> Vec<AppointmentId> {
        self.state().appointments.iter().map(|a| a.id).collect()
    }
}

#[async_trait]
impl ClinicApi for DevBackend {
    async fn login(&self, credentials: &Credentials) -> Result<Session, ApiError> {
        const CALL: &str = "POST /auth/login";
        self.enter(CALL, None)?;

        self.state()
            .users
            .iter()
            .find(|u| u.username == credentials.username && u.password == credentials.password)
            .map(|u| u.session.clone())
            .ok_or_else(|| ApiError::from_status(CALL, 401, Some("Bad credentials".to_string())))
    }

    async fn register(&self, new_user: &NewUser) -> Result<Session, ApiError> {
        const CALL: &str = "POST /auth/register";
        self.enter(CALL, None)?;

        let mut state = self.state();
        if state.users.iter().any(|u| u.username == new_user.username) {
            return Err(ApiError::from_status(
                CALL,
                400,
                Some("Username already taken".to_string()),
            ));
        }

        let user = dev_user(
            &new_user.username,
            &new_user.password,
            &format!("u-{}", state.users.len() + 1),
            &new_user.first_name,
            &new_user.last_name,
            &new_user.role,
        );
        let mut session = user.session.clone();
        session.email = new_user.email.clone();
        state.users.push(DevUser {
            session: session.clone(),
            ..user
        });
        Ok(session)
    }

    async fn logout(&self, token: &str) -> Result<(), ApiError> {
        const CALL: &str = "POST /auth/logout";
        self.enter(CALL, Some(token))?;

        if self.state().fail_logout {
            return Err(ApiError::from_status(CALL, 500, None));
        }
        self.session_for_token(CALL, token).map(|_| ())
    }

    async fn profile(&self, token: &str) -> Result<ProfileData, ApiError> {
        const CALL: &str = "GET /auth/profile";
        self.enter(CALL, Some(token))?;

        let session = self.session_for_token(CALL, token)?;
        Ok(ProfileData {
            first_name: session.first_name,
            last_name: session.last_name,
            email: session.email,
            role: session.role,
        })
    }

    async fn appointments(&self, token: Option<&str>) -> Result<Vec<Appointment>, ApiError> {
        self.enter("GET /appointments", token)?;
        Ok(self.state().appointments.clone())
    }

    async fn delete_appointment(
        &self,
        token: Option<&str>,
        id: AppointmentId,
    ) -> Result<(), ApiError> {
        const CALL: &str = "DELETE /appointments/:id";
        self.enter_for(CALL, token, Some(id))?;

        let delay = self.state().delete_delays.get(&id).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state();
        if state.failing_deletes.contains(&id) {
            return Err(ApiError::from_status(
                CALL,
                500,
                Some(format!("Could not delete appointment {}", id)),
            ));
        }

        let before = state.appointments.len();
        state.appointments.retain(|a| a.id != id);
        if state.appointments.len() == before {
            return Err(ApiError::from_status(
                CALL,
                404,
                Some("No such appointment".to_string()),
            ));
        }
        Ok(())
    }

    async fn patients(&self, token: Option<&str>) -> Result<Vec<Patient>, ApiError> {
        self.enter("GET /patients", token)?;
        Ok(self.state().patients.clone())
    }
}

fn dev_user(
    username: &str,
    password: &str,
    id: &str,
    first_name: &str,
    last_name: &str,
    role: &str,
) -> DevUser {
    DevUser {
        username: username.to_string(),
        password: password.to_string(),
        session: Session {
            user_id: UserId::new(id),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            email: format!("{}@clinic.test", username),
            role: role.to_string(),
            token: format!("dev-token-{}", username),
        },
    }
}

fn seed_patients() -> Vec<Patient> {
    let patient = |id: i64, ssn: &str, first: &str, surname: &str| Patient {
        id: PatientId::new(id),
        social_security: ssn.to_string(),
        first_name: first.to_string(),
        surname: surname.to_string(),
    };

    vec![
        patient(1, "190-22-4411", "Ana", "Lima"),
        patient(2, "190-87-1020", "Jonas", "Berg"),
        patient(3, "201-05-7733", "Mei", "Tanaka"),
    ]
}

fn seed_appointments(patients: &[Patient]) -> Vec<Appointment> {
    let now = crate::time_utils::to_local_time(OffsetDateTime::now_utc());
    let summary = |index: usize| {
        patients.get(index).map(|p| PatientSummary {
            id: Some(p.id),
            social_security: p.social_security.clone(),
            first_name: p.first_name.clone(),
            surname: p.surname.clone(),
            raw: None,
        })
    };
    let at = |offset: time::Duration| {
        let t = now + offset;
        format!(
            "{:04}-{:02}-{:02}T{:02}:{:02}:00",
            t.year(),
            t.month() as u8,
            t.day(),
            t.hour(),
            t.minute()
        )
    };

    vec![
        Appointment {
            id: AppointmentId::new(1),
            description: "Annual checkup".to_string(),
            schedule: at(time::Duration::hours(-2)),
            patient: summary(0),
        },
        Appointment {
            id: AppointmentId::new(2),
            description: "Blood test results".to_string(),
            schedule: at(time::Duration::minutes(20)),
            patient: summary(1),
        },
        Appointment {
            id: AppointmentId::new(3),
            description: "Physiotherapy follow-up".to_string(),
            schedule: at(time::Duration::days(3)),
            patient: summary(2),
        },
        Appointment {
            id: AppointmentId::new(4),
            description: "Walk-in consultation".to_string(),
            schedule: at(time::Duration::days(1)),
            patient: None,
        },
    ]
}

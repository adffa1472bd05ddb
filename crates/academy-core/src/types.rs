use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

pub type Id = u64;

// ---------------------------------------------------------------------------
// Accounts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    Student,
    Admin,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Student => write!(f, "student"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Id,
    pub email: String,
    #[serde(default, alias = "name")]
    pub full_name: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub cohort_id: Option<Id>,
    /// Account tier; changes after a verified payment.
    #[serde(default)]
    pub tier: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cohort {
    pub id: Id,
    pub name: String,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewCohort {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enrollment {
    pub id: Id,
    pub cohort_id: Id,
    #[serde(default)]
    pub status: String,
}

/// The current user enriched with the lookups the dashboard needs on every
/// page: their cohort and enrollments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub user: User,
    #[serde(default)]
    pub cohort: Option<Cohort>,
    #[serde(default)]
    pub enrollments: Vec<Enrollment>,
}

// ---------------------------------------------------------------------------
// Auth payloads
// ---------------------------------------------------------------------------

/// Response of the login and register endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthSession {
    #[serde(alias = "token", alias = "access")]
    pub access_token: String,
    #[serde(default, alias = "refresh")]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub user: Option<User>,
}

#[derive(Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Clone, Serialize)]
pub struct RegisterRequest {
    pub full_name: String,
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cohort_id: Option<Id>,
}

impl std::fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("full_name", &self.full_name)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("cohort_id", &self.cohort_id)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Learning
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurriculumModule {
    pub id: Id,
    pub title: String,
    #[serde(default)]
    pub order: u32,
    #[serde(default)]
    pub completed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub id: Id,
    pub title: String,
    #[serde(default)]
    pub module_id: Option<Id>,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub max_score: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    #[default]
    Submitted,
    Graded,
    Returned,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    pub id: Id,
    pub assignment_id: Id,
    #[serde(default)]
    pub student_id: Option<Id>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub status: SubmissionStatus,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub feedback: Option<String>,
    #[serde(default)]
    pub submitted_at: Option<DateTime<Utc>>,
}

/// Admin grading of one submission.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Grade {
    pub score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
    pub status: SubmissionStatus,
}

impl Grade {
    pub fn new(score: f64, feedback: Option<String>) -> Self {
        Self {
            score,
            feedback,
            status: SubmissionStatus::Graded,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceStatus {
    Present,
    Late,
    Absent,
    Excused,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub id: Id,
    #[serde(default)]
    pub session_date: Option<NaiveDate>,
    pub status: AttendanceStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Certificate {
    pub id: Id,
    pub title: String,
    #[serde(default)]
    pub issued_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub url: Option<String>,
}

// ---------------------------------------------------------------------------
// Payments
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: Id,
    pub amount: f64,
    #[serde(default)]
    pub currency: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Returned when a payment is started; the user completes it at
/// `authorization_url` and the callback verifies `reference`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentCheckout {
    pub reference: String,
    #[serde(default)]
    pub authorization_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn user_defaults_role_and_accepts_name_alias() {
        let user: User = serde_json::from_value(json!({
            "id": 1,
            "email": "sam@academy.test",
            "name": "Sam Rep",
            "unknown_field": true
        }))
        .unwrap();
        assert_eq!(user.role, Role::Student);
        assert_eq!(user.full_name, "Sam Rep");
        assert_eq!(user.cohort_id, None);
    }

    #[test]
    fn auth_session_accepts_token_alias() {
        let session: AuthSession =
            serde_json::from_value(json!({"token": "abc", "refresh": "r1"})).unwrap();
        assert_eq!(session.access_token, "abc");
        assert_eq!(session.refresh_token.as_deref(), Some("r1"));
        assert!(session.user.is_none());
    }

    #[test]
    fn login_request_debug_redacts_password() {
        let req = LoginRequest {
            email: "a@b.c".into(),
            password: "hunter2".into(),
        };
        let rendered = format!("{req:?}");
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn register_request_omits_missing_cohort() {
        let req = RegisterRequest {
            full_name: "A".into(),
            email: "a@b.c".into(),
            password: "pw".into(),
            cohort_id: None,
        };
        let value = serde_json::to_value(&req).unwrap();
        assert!(value.get("cohort_id").is_none());
    }

    #[test]
    fn grade_serializes_graded_status() {
        let value = serde_json::to_value(Grade::new(88.5, None)).unwrap();
        assert_eq!(value, json!({"score": 88.5, "status": "graded"}));
    }

    #[test]
    fn attendance_status_is_snake_case() {
        let rec: AttendanceRecord =
            serde_json::from_value(json!({"id": 1, "status": "excused"})).unwrap();
        assert_eq!(rec.status, AttendanceStatus::Excused);
    }
}

use academy_core::envelope;
use academy_core::types::{
    Assignment, AttendanceRecord, Certificate, Cohort, CurriculumModule, Grade, Id, NewCohort,
    Payment, PaymentCheckout, Submission, User,
};
use serde_json::json;

use crate::{ApiClient, Result};

// ---------------------------------------------------------------------------
// Student dashboard
// ---------------------------------------------------------------------------

impl ApiClient {
    pub async fn curriculum(&self) -> Result<Vec<CurriculumModule>> {
        self.get_list("/curriculum/modules").await
    }

    pub async fn assignments(&self) -> Result<Vec<Assignment>> {
        self.get_list("/assignments").await
    }

    pub async fn my_submissions(&self) -> Result<Vec<Submission>> {
        self.get_list("/submissions").await
    }

    pub async fn submit_assignment(&self, assignment_id: Id, content: &str) -> Result<Submission> {
        let value = self
            .post(
                &format!("/assignments/{assignment_id}/submissions"),
                &json!({ "content": content }),
            )
            .await?;
        Ok(envelope::entity(value, "submission")?)
    }

    pub async fn attendance(&self) -> Result<Vec<AttendanceRecord>> {
        self.get_list("/attendance").await
    }

    pub async fn certificates(&self) -> Result<Vec<Certificate>> {
        self.get_list("/certificates").await
    }

    pub async fn payments(&self) -> Result<Vec<Payment>> {
        self.get_list("/payments").await
    }

    /// Start a checkout for `plan`. The payment is confirmed later with
    /// [`verify_payment`](Self::verify_payment).
    pub async fn initiate_payment(&self, plan: &str) -> Result<PaymentCheckout> {
        let value = self
            .post("/payments/initialize", &json!({ "plan": plan }))
            .await?;
        Ok(envelope::entity(value, "payment")?)
    }

    /// Confirm a payment after the provider callback.
    ///
    /// A verified payment can change the account tier, so the cached profile
    /// is dropped.
    pub async fn verify_payment(&self, reference: &str) -> Result<Payment> {
        let value = self
            .post("/payments/verify", &json!({ "reference": reference }))
            .await?;
        let payment = envelope::entity(value, "payment")?;
        self.invalidate_profile()?;
        Ok(payment)
    }
}

// ---------------------------------------------------------------------------
// Admin back-office
// ---------------------------------------------------------------------------

impl ApiClient {
    pub async fn students(&self) -> Result<Vec<User>> {
        self.get_list("/admin/students").await
    }

    pub async fn cohorts(&self) -> Result<Vec<Cohort>> {
        self.get_list("/cohorts").await
    }

    pub async fn create_cohort(&self, cohort: &NewCohort) -> Result<Cohort> {
        let value = self.post("/cohorts", cohort).await?;
        Ok(envelope::entity(value, "cohort")?)
    }

    pub async fn submissions(&self) -> Result<Vec<Submission>> {
        self.get_list("/admin/submissions").await
    }

    pub async fn grade_submission(&self, submission_id: Id, grade: &Grade) -> Result<Submission> {
        let value = self
            .patch(&format!("/admin/submissions/{submission_id}"), grade)
            .await?;
        Ok(envelope::entity(value, "submission")?)
    }

    pub async fn issue_certificate(&self, student_id: Id, title: &str) -> Result<Certificate> {
        let value = self
            .post(
                "/admin/certificates",
                &json!({ "student_id": student_id, "title": title }),
            )
            .await?;
        Ok(envelope::entity(value, "certificate")?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{client, FakeTransport, Reply};
    use crate::ApiError;
    use academy_core::types::SubmissionStatus;
    use serde_json::json;

    #[tokio::test]
    async fn lists_accept_both_envelopes() {
        let fake = FakeTransport::new();
        fake.script(
            "/api/curriculum/modules",
            vec![Reply::ok(json!([{"id": 1, "title": "Prospecting", "completed": true}]))],
        );
        fake.script(
            "/api/assignments",
            vec![Reply::ok(json!({"items": [{"id": 4, "title": "Cold call script"}], "total": 1}))],
        );
        let (client, _dir) = client(&fake);

        let modules = client.curriculum().await.unwrap();
        assert!(modules[0].completed);
        let assignments = client.assignments().await.unwrap();
        assert_eq!(assignments[0].title, "Cold call script");
    }

    #[tokio::test]
    async fn unknown_list_shape_fails_loudly() {
        let fake = FakeTransport::new();
        fake.script("/api/certificates", vec![Reply::ok(json!({"results": []}))]);
        let (client, _dir) = client(&fake);

        let err = client.certificates().await.unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn verify_payment_invalidates_profile() {
        let fake = FakeTransport::new();
        fake.script(
            "/api/users/me",
            vec![Reply::ok(json!({"id": 7, "email": "s@a.test", "tier": "free"}))],
        );
        fake.script("/api/enrollments", vec![Reply::ok(json!([]))]);
        fake.script(
            "/api/payments/verify",
            vec![Reply::ok(json!({"payment": {"id": 3, "amount": 499.0, "status": "success"}}))],
        );
        let (client, _dir) = client(&fake);

        client.profile().await.unwrap();
        let payment = client.verify_payment("ref-9").await.unwrap();
        assert_eq!(payment.status, "success");
        client.profile().await.unwrap();
        assert_eq!(fake.calls("/api/users/me"), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_verification_keeps_profile() {
        let fake = FakeTransport::new();
        fake.script("/api/users/me", vec![Reply::ok(json!({"id": 7, "email": "s@a.test"}))]);
        fake.script("/api/enrollments", vec![Reply::ok(json!([]))]);
        fake.script("/api/payments/verify", vec![Reply::status(402, "declined")]);
        let (client, _dir) = client(&fake);

        client.profile().await.unwrap();
        assert!(client.verify_payment("ref-9").await.is_err());
        client.profile().await.unwrap();
        assert_eq!(fake.calls("/api/users/me"), 1);
    }

    #[tokio::test]
    async fn submit_posts_content() {
        let fake = FakeTransport::new();
        fake.script(
            "/api/assignments/4/submissions",
            vec![Reply::ok(json!({"submission": {"id": 11, "assignment_id": 4}}))],
        );
        let (client, _dir) = client(&fake);

        let sub = client.submit_assignment(4, "my pitch").await.unwrap();
        assert_eq!(sub.id, 11);
        assert_eq!(sub.status, SubmissionStatus::Submitted);
        let req = fake.last_request().unwrap();
        assert_eq!(req.method, reqwest::Method::POST);
        assert_eq!(req.body.as_deref(), Some(r#"{"content":"my pitch"}"#));
    }

    #[tokio::test]
    async fn grade_uses_patch() {
        let fake = FakeTransport::new();
        fake.script(
            "/api/admin/submissions/11",
            vec![Reply::ok(json!({"id": 11, "assignment_id": 4, "status": "graded", "score": 92.0}))],
        );
        let (client, _dir) = client(&fake);

        let graded = client
            .grade_submission(11, &Grade::new(92.0, Some("Strong close".into())))
            .await
            .unwrap();
        assert_eq!(graded.score, Some(92.0));
        assert_eq!(fake.last_request().unwrap().method, reqwest::Method::PATCH);
    }

    #[tokio::test]
    async fn create_cohort_unwraps_named_key() {
        let fake = FakeTransport::new();
        fake.script(
            "/api/cohorts",
            vec![Reply::ok(json!({"cohort": {"id": 5, "name": "Summer"}, "message": "created"}))],
        );
        let (client, _dir) = client(&fake);

        let cohort = client
            .create_cohort(&NewCohort {
                name: "Summer".into(),
                start_date: None,
                end_date: None,
            })
            .await
            .unwrap();
        assert_eq!(cohort.id, 5);
    }
}

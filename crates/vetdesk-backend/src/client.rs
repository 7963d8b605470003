use reqwest::{Client, Method, RequestBuilder};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use uuid::Uuid;

use vetdesk_types::api::{ContactUpdate, StagePatch};
use vetdesk_types::models::{
    Appointment, Budget, Employee, Invoice, Opportunity, Owner, Patient, PipelineStage,
    Prescription, Sale,
};

use crate::error::{BackendError, snippet};

/// Typed client for the managed records backend.
///
/// One instance per session, cloned freely (reqwest clients share their
/// pool). Every call is a single request: no retries, a failure surfaces
/// to the caller and prior state stays where it was.
#[derive(Debug, Clone)]
pub struct BackendClient {
    http: Client,
    base_url: String,
    token: String,
}

impl BackendClient {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url, token)
    }

    /// Build on a caller-provided client, e.g. one with an explicit timeout.
    pub fn with_client(http: Client, base_url: impl Into<String>, token: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            http,
            base_url,
            token: token.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        debug!("backend {} {}", method, path);
        self.http
            .request(method, self.url(path))
            .header("Authorization", format!("Bearer {}", self.token))
    }

    async fn recv<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, BackendError> {
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(BackendError::Status {
                status: status.as_u16(),
                body: snippet(&body),
            });
        }
        let bytes = resp.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| BackendError::Decode(e.to_string()))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, BackendError> {
        let resp = self.request(Method::GET, path).send().await?;
        Self::recv(resp).await
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, BackendError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let resp = self.request(Method::POST, path).json(body).send().await?;
        Self::recv(resp).await
    }

    async fn put_json<B, T>(&self, path: &str, body: &B) -> Result<T, BackendError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let resp = self.request(Method::PUT, path).json(body).send().await?;
        Self::recv(resp).await
    }

    async fn patch_json<B, T>(&self, path: &str, body: &B) -> Result<T, BackendError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let resp = self.request(Method::PATCH, path).json(body).send().await?;
        Self::recv(resp).await
    }

    async fn delete(&self, path: &str) -> Result<(), BackendError> {
        let resp = self.request(Method::DELETE, path).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(BackendError::Status {
                status: status.as_u16(),
                body: snippet(&body),
            });
        }
        Ok(())
    }

    // ── Opportunities ────────────────────────────────────────────────────
    // No delete path: discarded leads stay on the board in the Discarded
    // column.

    pub async fn list_opportunities(&self) -> Result<Vec<Opportunity>, BackendError> {
        self.get_json("/opportunities").await
    }

    pub async fn create_opportunity(&self, record: &Opportunity) -> Result<Opportunity, BackendError> {
        self.post_json("/opportunities", record).await
    }

    /// Persist a board move. The in-memory board has already mutated by the
    /// time this runs.
    pub async fn update_opportunity_stage(
        &self,
        id: Uuid,
        stage: PipelineStage,
    ) -> Result<Opportunity, BackendError> {
        let patch = StagePatch { status: stage };
        self.patch_json(&format!("/opportunities/{}", id), &patch).await
    }

    pub async fn update_opportunity_contact(
        &self,
        id: Uuid,
        update: &ContactUpdate,
    ) -> Result<Opportunity, BackendError> {
        self.patch_json(&format!("/opportunities/{}", id), update).await
    }

    // ── Owners and patients ──────────────────────────────────────────────

    pub async fn list_owners(&self) -> Result<Vec<Owner>, BackendError> {
        self.get_json("/owners").await
    }

    pub async fn get_owner(&self, id: Uuid) -> Result<Owner, BackendError> {
        self.get_json(&format!("/owners/{}", id)).await
    }

    pub async fn create_owner(&self, record: &Owner) -> Result<Owner, BackendError> {
        self.post_json("/owners", record).await
    }

    pub async fn update_owner(&self, record: &Owner) -> Result<Owner, BackendError> {
        self.put_json(&format!("/owners/{}", record.id), record).await
    }

    pub async fn list_patients(&self) -> Result<Vec<Patient>, BackendError> {
        self.get_json("/patients").await
    }

    pub async fn get_patient(&self, id: Uuid) -> Result<Patient, BackendError> {
        self.get_json(&format!("/patients/{}", id)).await
    }

    /// Patients of one owner, for the owner detail view.
    pub async fn list_patients_of(&self, owner_id: Uuid) -> Result<Vec<Patient>, BackendError> {
        self.get_json(&format!("/owners/{}/patients", owner_id)).await
    }

    pub async fn create_patient(&self, record: &Patient) -> Result<Patient, BackendError> {
        self.post_json("/patients", record).await
    }

    pub async fn update_patient(&self, record: &Patient) -> Result<Patient, BackendError> {
        self.put_json(&format!("/patients/{}", record.id), record).await
    }

    // ── Appointments ─────────────────────────────────────────────────────

    pub async fn list_appointments(&self) -> Result<Vec<Appointment>, BackendError> {
        self.get_json("/appointments").await
    }

    pub async fn get_appointment(&self, id: Uuid) -> Result<Appointment, BackendError> {
        self.get_json(&format!("/appointments/{}", id)).await
    }

    pub async fn create_appointment(&self, record: &Appointment) -> Result<Appointment, BackendError> {
        self.post_json("/appointments", record).await
    }

    pub async fn update_appointment(&self, record: &Appointment) -> Result<Appointment, BackendError> {
        self.put_json(&format!("/appointments/{}", record.id), record).await
    }

    pub async fn delete_appointment(&self, id: Uuid) -> Result<(), BackendError> {
        self.delete(&format!("/appointments/{}", id)).await
    }

    // ── Billing ──────────────────────────────────────────────────────────

    pub async fn list_invoices(&self) -> Result<Vec<Invoice>, BackendError> {
        self.get_json("/invoices").await
    }

    pub async fn get_invoice(&self, id: Uuid) -> Result<Invoice, BackendError> {
        self.get_json(&format!("/invoices/{}", id)).await
    }

    pub async fn create_invoice(&self, record: &Invoice) -> Result<Invoice, BackendError> {
        self.post_json("/invoices", record).await
    }

    pub async fn update_invoice(&self, record: &Invoice) -> Result<Invoice, BackendError> {
        self.put_json(&format!("/invoices/{}", record.id), record).await
    }

    pub async fn delete_invoice(&self, id: Uuid) -> Result<(), BackendError> {
        self.delete(&format!("/invoices/{}", id)).await
    }

    pub async fn list_budgets(&self) -> Result<Vec<Budget>, BackendError> {
        self.get_json("/budgets").await
    }

    pub async fn get_budget(&self, id: Uuid) -> Result<Budget, BackendError> {
        self.get_json(&format!("/budgets/{}", id)).await
    }

    pub async fn create_budget(&self, record: &Budget) -> Result<Budget, BackendError> {
        self.post_json("/budgets", record).await
    }

    pub async fn update_budget(&self, record: &Budget) -> Result<Budget, BackendError> {
        self.put_json(&format!("/budgets/{}", record.id), record).await
    }

    pub async fn delete_budget(&self, id: Uuid) -> Result<(), BackendError> {
        self.delete(&format!("/budgets/{}", id)).await
    }

    pub async fn list_sales(&self) -> Result<Vec<Sale>, BackendError> {
        self.get_json("/sales").await
    }

    pub async fn get_sale(&self, id: Uuid) -> Result<Sale, BackendError> {
        self.get_json(&format!("/sales/{}", id)).await
    }

    pub async fn create_sale(&self, record: &Sale) -> Result<Sale, BackendError> {
        self.post_json("/sales", record).await
    }

    pub async fn update_sale(&self, record: &Sale) -> Result<Sale, BackendError> {
        self.put_json(&format!("/sales/{}", record.id), record).await
    }

    // ── Prescriptions and staff ──────────────────────────────────────────

    pub async fn list_prescriptions(&self) -> Result<Vec<Prescription>, BackendError> {
        self.get_json("/prescriptions").await
    }

    pub async fn get_prescription(&self, id: Uuid) -> Result<Prescription, BackendError> {
        self.get_json(&format!("/prescriptions/{}", id)).await
    }

    pub async fn create_prescription(&self, record: &Prescription) -> Result<Prescription, BackendError> {
        self.post_json("/prescriptions", record).await
    }

    pub async fn update_prescription(&self, record: &Prescription) -> Result<Prescription, BackendError> {
        self.put_json(&format!("/prescriptions/{}", record.id), record).await
    }

    pub async fn list_employees(&self) -> Result<Vec<Employee>, BackendError> {
        self.get_json("/employees").await
    }

    pub async fn get_employee(&self, id: Uuid) -> Result<Employee, BackendError> {
        self.get_json(&format!("/employees/{}", id)).await
    }

    pub async fn create_employee(&self, record: &Employee) -> Result<Employee, BackendError> {
        self.post_json("/employees", record).await
    }

    pub async fn update_employee(&self, record: &Employee) -> Result<Employee, BackendError> {
        self.put_json(&format!("/employees/{}", record.id), record).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slashes_do_not_double_up() {
        let client = BackendClient::new("https://api.example.com/", "tok");
        assert_eq!(client.url("/owners"), "https://api.example.com/owners");
    }

    #[test]
    fn bare_base_url_joins_cleanly() {
        let client = BackendClient::new("https://api.example.com", "tok");
        assert_eq!(
            client.url("/opportunities/abc"),
            "https://api.example.com/opportunities/abc"
        );
    }
}

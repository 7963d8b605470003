use async_trait::async_trait;
use uuid::Uuid;

use vetdesk_types::api::ContactUpdate;
use vetdesk_types::models::{
    Appointment, Budget, Employee, Invoice, Opportunity, Owner, Patient, PipelineStage,
    Prescription, Sale,
};

use crate::client::BackendClient;
use crate::error::BackendError;

/// The slice of the records backend the session orchestrates through.
///
/// Production is [`BackendClient`]; tests inject an in-memory fake. The
/// full read surface (per-family gets and lists) stays on the concrete
/// client, which views reach directly.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn list_opportunities(&self) -> Result<Vec<Opportunity>, BackendError>;

    async fn create_opportunity(&self, record: &Opportunity) -> Result<Opportunity, BackendError>;

    async fn update_opportunity_stage(
        &self,
        id: Uuid,
        stage: PipelineStage,
    ) -> Result<Opportunity, BackendError>;

    async fn update_opportunity_contact(
        &self,
        id: Uuid,
        update: &ContactUpdate,
    ) -> Result<Opportunity, BackendError>;

    async fn create_owner(&self, record: &Owner) -> Result<Owner, BackendError>;

    async fn create_patient(&self, record: &Patient) -> Result<Patient, BackendError>;

    async fn create_appointment(&self, record: &Appointment) -> Result<Appointment, BackendError>;

    async fn create_prescription(
        &self,
        record: &Prescription,
    ) -> Result<Prescription, BackendError>;

    async fn create_invoice(&self, record: &Invoice) -> Result<Invoice, BackendError>;

    async fn create_budget(&self, record: &Budget) -> Result<Budget, BackendError>;

    async fn create_sale(&self, record: &Sale) -> Result<Sale, BackendError>;

    async fn create_employee(&self, record: &Employee) -> Result<Employee, BackendError>;
}

#[async_trait]
impl RecordStore for BackendClient {
    async fn list_opportunities(&self) -> Result<Vec<Opportunity>, BackendError> {
        BackendClient::list_opportunities(self).await
    }

    async fn create_opportunity(&self, record: &Opportunity) -> Result<Opportunity, BackendError> {
        BackendClient::create_opportunity(self, record).await
    }

    async fn update_opportunity_stage(
        &self,
        id: Uuid,
        stage: PipelineStage,
    ) -> Result<Opportunity, BackendError> {
        BackendClient::update_opportunity_stage(self, id, stage).await
    }

    async fn update_opportunity_contact(
        &self,
        id: Uuid,
        update: &ContactUpdate,
    ) -> Result<Opportunity, BackendError> {
        BackendClient::update_opportunity_contact(self, id, update).await
    }

    async fn create_owner(&self, record: &Owner) -> Result<Owner, BackendError> {
        BackendClient::create_owner(self, record).await
    }

    async fn create_patient(&self, record: &Patient) -> Result<Patient, BackendError> {
        BackendClient::create_patient(self, record).await
    }

    async fn create_appointment(&self, record: &Appointment) -> Result<Appointment, BackendError> {
        BackendClient::create_appointment(self, record).await
    }

    async fn create_prescription(
        &self,
        record: &Prescription,
    ) -> Result<Prescription, BackendError> {
        BackendClient::create_prescription(self, record).await
    }

    async fn create_invoice(&self, record: &Invoice) -> Result<Invoice, BackendError> {
        BackendClient::create_invoice(self, record).await
    }

    async fn create_budget(&self, record: &Budget) -> Result<Budget, BackendError> {
        BackendClient::create_budget(self, record).await
    }

    async fn create_sale(&self, record: &Sale) -> Result<Sale, BackendError> {
        BackendClient::create_sale(self, record).await
    }

    async fn create_employee(&self, record: &Employee) -> Result<Employee, BackendError> {
        BackendClient::create_employee(self, record).await
    }
}

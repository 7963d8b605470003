use std::sync::Arc;

use futures_util::future::join_all;
use tokio::sync::{RwLock, broadcast};
use tracing::{debug, warn};
use uuid::Uuid;

use vetdesk_backend::{BackendClient, RecordStore};
use vetdesk_inbox::{Composer, aggregate_threads, unread_total};
use vetdesk_mail::{HttpMailGateway, MailError, MailProvider};
use vetdesk_pipeline::StageBoard;
use vetdesk_types::api::{
    AppointmentDraft, ContactUpdate, OpportunityDraft, OwnerDraft, PatientDraft, PrescriptionDraft,
};
use vetdesk_types::events::{RecordKind, SessionEvent};
use vetdesk_types::models::{
    AccountStatus, Appointment, Budget, ConnectedAccount, Employee, Invoice, MailFolder,
    MailMessage, Opportunity, Owner, Patient, PipelineStage, Prescription, Sale, Thread,
};
use vetdesk_types::validate::ValidationError;

use crate::config::SessionConfig;
use crate::error::SessionError;

const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// Upper bound on pages pulled per account per refresh, in case a gateway
/// keeps handing out `next_page`.
const PAGE_FETCH_CAP: u32 = 50;

/// Fetch state of one UI surface (a folder view or the pipeline board).
#[derive(Debug, Clone, Default)]
pub struct FetchStatus {
    pub loading: bool,
    pub error: Option<String>,
}

#[derive(Debug, Default)]
struct Surface {
    status: FetchStatus,
    generation: u64,
}

impl Surface {
    /// Start a refresh: bump the generation and flag loading. The caller
    /// must present the returned generation when committing results.
    fn begin(&mut self) -> u64 {
        self.generation += 1;
        self.status.loading = true;
        self.status.error = None;
        self.generation
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation == generation
    }
}

#[derive(Debug, Default)]
struct FolderState {
    messages: Vec<MailMessage>,
    threads: Vec<Thread>,
    surface: Surface,
}

#[derive(Debug, Default)]
struct PipelineState {
    board: StageBoard,
    surface: Surface,
}

struct SessionInner {
    backend: Arc<dyn RecordStore>,
    mail: Arc<dyn MailProvider>,
    attachment_limit_bytes: usize,
    events_tx: broadcast::Sender<SessionEvent>,
    accounts: RwLock<Vec<ConnectedAccount>>,
    received: RwLock<FolderState>,
    sent: RwLock<FolderState>,
    pipeline: RwLock<PipelineState>,
}

/// The one state object behind the UI shell.
///
/// Holds the connected accounts, the per-folder message/thread snapshots
/// and the opportunity board. Cheap to clone; all mutation goes through
/// its methods and every committed change fires a [`SessionEvent`].
///
/// One logical writer (the UI event loop) drives it. Fetches run async and
/// commit against a generation check, so a result that arrives after the
/// surface moved on is discarded instead of clobbering newer state.
#[derive(Clone)]
pub struct ClinicSession {
    inner: Arc<SessionInner>,
}

impl ClinicSession {
    /// Constructor injection: callers hand in the backend and mail seams.
    pub fn new(
        backend: Arc<dyn RecordStore>,
        mail: Arc<dyn MailProvider>,
        attachment_limit_bytes: usize,
    ) -> Self {
        let (events_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(SessionInner {
                backend,
                mail,
                attachment_limit_bytes,
                events_tx,
                accounts: RwLock::new(Vec::new()),
                received: RwLock::new(FolderState::default()),
                sent: RwLock::new(FolderState::default()),
                pipeline: RwLock::new(PipelineState::default()),
            }),
        }
    }

    /// Production wiring: one shared HTTP client with the configured
    /// timeout behind both the records backend and the mail gateway.
    pub fn from_config(config: &SessionConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()?;
        let backend = BackendClient::with_client(
            http.clone(),
            config.backend_url.clone(),
            config.backend_token.clone(),
        );
        let mail = HttpMailGateway::with_client(http, config.mail_url.clone(), config.page_size);
        Ok(Self::new(
            Arc::new(backend),
            Arc::new(mail),
            config.attachment_limit_bytes,
        ))
    }

    /// Subscribe to session events. Dropped receivers are fine.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.inner.events_tx.subscribe()
    }

    fn emit(&self, event: SessionEvent) {
        let _ = self.inner.events_tx.send(event);
    }

    fn folder(&self, folder: MailFolder) -> &RwLock<FolderState> {
        match folder {
            MailFolder::Received => &self.inner.received,
            MailFolder::Sent => &self.inner.sent,
        }
    }

    // ── Accounts ─────────────────────────────────────────────────────────

    pub async fn set_accounts(&self, accounts: Vec<ConnectedAccount>) {
        *self.inner.accounts.write().await = accounts;
    }

    pub async fn accounts(&self) -> Vec<ConnectedAccount> {
        self.inner.accounts.read().await.clone()
    }

    /// Flip one account to `Disconnected` and announce it. Returns false
    /// for unknown ids; an already disconnected account stays silent.
    pub async fn disconnect_account(&self, account_id: Uuid) -> bool {
        let address = {
            let mut accounts = self.inner.accounts.write().await;
            let Some(account) = accounts.iter_mut().find(|a| a.id == account_id) else {
                return false;
            };
            if account.status == AccountStatus::Disconnected {
                return true;
            }
            account.status = AccountStatus::Disconnected;
            account.address.clone()
        };
        self.emit(SessionEvent::AccountDisconnected {
            account_id,
            address,
        });
        true
    }

    async fn account_for(&self, account_id: Uuid) -> Result<ConnectedAccount, SessionError> {
        let accounts = self.inner.accounts.read().await;
        let account = accounts
            .iter()
            .find(|a| a.id == account_id)
            .ok_or(SessionError::UnknownAccount(account_id))?;
        if !account.is_active() {
            return Err(SessionError::AccountInactive(account_id));
        }
        Ok(account.clone())
    }

    // ── Inbox ────────────────────────────────────────────────────────────

    /// Re-pull `folder` across every active account and rebuild its thread
    /// list from the full snapshot.
    ///
    /// Accounts fail independently: a bad account is skipped (and, on an
    /// auth rejection, disconnected) while the rest still aggregate. Only
    /// when every account fails does the previous snapshot stay in place.
    pub async fn refresh_inbox(&self, folder: MailFolder) {
        let generation = self.folder(folder).write().await.surface.begin();

        let accounts: Vec<ConnectedAccount> = {
            let guard = self.inner.accounts.read().await;
            guard.iter().filter(|a| a.is_active()).cloned().collect()
        };

        let fetches = accounts.iter().map(|account| {
            let mail = self.inner.mail.clone();
            async move { fetch_all_pages(mail.as_ref(), account, folder).await }
        });
        let results = join_all(fetches).await;

        let mut messages: Vec<MailMessage> = Vec::new();
        let mut failures: Vec<String> = Vec::new();
        let mut any_ok = false;
        for (account, result) in accounts.iter().zip(results) {
            match result {
                Ok(batch) => {
                    any_ok = true;
                    messages.extend(batch);
                }
                Err(e) if e.is_auth() => {
                    warn!("account {} rejected its credential: {}", account.address, e);
                    failures.push(account.address.clone());
                    self.disconnect_account(account.id).await;
                }
                Err(e) => {
                    warn!("account {} fetch failed: {}", account.address, e);
                    failures.push(account.address.clone());
                }
            }
        }

        let mut state = self.folder(folder).write().await;
        if !state.surface.is_current(generation) {
            debug!(
                "discarding stale {} fetch (generation {})",
                folder.as_str(),
                generation
            );
            return;
        }
        state.surface.status.loading = false;

        if !any_ok && !accounts.is_empty() {
            // Every account failed: keep whatever was on screen.
            let message = format!("could not refresh: {}", failures.join(", "));
            state.surface.status.error = Some(message.clone());
            drop(state);
            self.emit(SessionEvent::InboxFailed { folder, message });
            return;
        }

        let threads = aggregate_threads(&messages, folder);
        let thread_count = threads.len();
        let unread = unread_total(&threads);
        state.messages = messages;
        state.threads = threads;
        state.surface.status.error = if failures.is_empty() {
            None
        } else {
            Some(format!("some accounts failed: {}", failures.join(", ")))
        };
        let partial = state.surface.status.error.clone();
        drop(state);

        if let Some(message) = partial {
            self.emit(SessionEvent::InboxFailed { folder, message });
        }
        self.emit(SessionEvent::InboxUpdated {
            folder,
            thread_count,
            unread_total: unread,
        });
    }

    /// Send a composed draft through one account's provider, then refresh
    /// the Sent snapshot so the new message threads in.
    pub async fn send_draft(
        &self,
        account_id: Uuid,
        composer: &Composer,
    ) -> Result<String, SessionError> {
        let account = self.account_for(account_id).await?;
        let outgoing = composer.build_outgoing(self.inner.attachment_limit_bytes)?;
        let receipt = self.inner.mail.send_message(&account, &outgoing).await?;
        self.emit(SessionEvent::DraftSent {
            account_id,
            message_id: receipt.message_id.clone(),
        });
        self.refresh_inbox(MailFolder::Sent).await;
        Ok(receipt.message_id)
    }

    /// Mark every unread message of one conversation read, at the provider
    /// first and then locally. Returns how many messages flipped.
    pub async fn mark_thread_read(
        &self,
        account_id: Uuid,
        conversation_id: &str,
    ) -> Result<usize, SessionError> {
        let account = self.account_for(account_id).await?;

        let pending: Vec<String> = {
            let state = self.inner.received.read().await;
            state
                .messages
                .iter()
                .filter(|m| {
                    m.account_id == account_id
                        && m.conversation_id == conversation_id
                        && !m.is_read
                })
                .map(|m| m.id.clone())
                .collect()
        };
        if pending.is_empty() {
            return Ok(0);
        }

        for message_id in &pending {
            self.inner.mail.mark_read(&account, message_id).await?;
        }

        let mut state = self.inner.received.write().await;
        for message in state.messages.iter_mut() {
            if pending.iter().any(|id| id == &message.id) {
                message.is_read = true;
            }
        }
        let threads = aggregate_threads(&state.messages, MailFolder::Received);
        let thread_count = threads.len();
        let unread = unread_total(&threads);
        state.threads = threads;
        drop(state);

        self.emit(SessionEvent::InboxUpdated {
            folder: MailFolder::Received,
            thread_count,
            unread_total: unread,
        });
        Ok(pending.len())
    }

    // ── Pipeline ─────────────────────────────────────────────────────────

    /// Re-pull the opportunity list. On failure the previous board stays
    /// and the error string surfaces; there are no retries.
    pub async fn refresh_pipeline(&self) {
        let generation = self.inner.pipeline.write().await.surface.begin();

        let result = self.inner.backend.list_opportunities().await;

        let mut state = self.inner.pipeline.write().await;
        if !state.surface.is_current(generation) {
            debug!("discarding stale pipeline fetch (generation {})", generation);
            return;
        }
        state.surface.status.loading = false;
        match result {
            Ok(records) => {
                let total = records.len();
                state.board.replace(records);
                state.surface.status.error = None;
                drop(state);
                self.emit(SessionEvent::PipelineUpdated { total });
            }
            Err(e) => {
                warn!("pipeline refresh failed: {}", e);
                state.surface.status.error = Some(e.to_string());
            }
        }
    }

    /// Move a card to another column. The board mutates immediately and
    /// the persist call follows; if that call fails the local move stands
    /// until the next refresh. An unknown id is a no-op, `Ok(false)`.
    pub async fn move_opportunity(
        &self,
        id: Uuid,
        stage: PipelineStage,
    ) -> Result<bool, SessionError> {
        let moved = self.inner.pipeline.write().await.board.move_to_stage(id, stage);
        if !moved {
            return Ok(false);
        }
        self.emit(SessionEvent::OpportunityMoved { id, stage });
        self.inner.backend.update_opportunity_stage(id, stage).await?;
        Ok(true)
    }

    /// Validate and submit the lead form. The created record always starts
    /// in `Unassigned` and lands on the board.
    pub async fn create_opportunity(
        &self,
        draft: OpportunityDraft,
    ) -> Result<Opportunity, SessionError> {
        let record = draft.build()?;
        let created = self.inner.backend.create_opportunity(&record).await?;
        self.inner.pipeline.write().await.board.push(created.clone());
        self.emit(SessionEvent::OpportunityCreated { id: created.id });
        Ok(created)
    }

    /// Edit a card's contact fields. Unknown ids are a no-op, `Ok(false)`.
    pub async fn update_opportunity_contact(
        &self,
        id: Uuid,
        update: ContactUpdate,
    ) -> Result<bool, SessionError> {
        let changed = self.inner.pipeline.write().await.board.update_contact(id, &update);
        if !changed {
            return Ok(false);
        }
        self.inner
            .backend
            .update_opportunity_contact(id, &update)
            .await?;
        Ok(true)
    }

    // ── Record forms ─────────────────────────────────────────────────────

    pub async fn save_owner(&self, draft: OwnerDraft) -> Result<Owner, SessionError> {
        let record = draft.build()?;
        let saved = self.inner.backend.create_owner(&record).await?;
        self.emit(SessionEvent::RecordSaved {
            kind: RecordKind::Owner,
            id: saved.id,
        });
        Ok(saved)
    }

    pub async fn save_patient(&self, draft: PatientDraft) -> Result<Patient, SessionError> {
        let record = draft.build()?;
        let saved = self.inner.backend.create_patient(&record).await?;
        self.emit(SessionEvent::RecordSaved {
            kind: RecordKind::Patient,
            id: saved.id,
        });
        Ok(saved)
    }

    pub async fn save_appointment(
        &self,
        draft: AppointmentDraft,
    ) -> Result<Appointment, SessionError> {
        let record = draft.build()?;
        let saved = self.inner.backend.create_appointment(&record).await?;
        self.emit(SessionEvent::RecordSaved {
            kind: RecordKind::Appointment,
            id: saved.id,
        });
        Ok(saved)
    }

    pub async fn save_prescription(
        &self,
        draft: PrescriptionDraft,
    ) -> Result<Prescription, SessionError> {
        let record = draft.build()?;
        let saved = self.inner.backend.create_prescription(&record).await?;
        self.emit(SessionEvent::RecordSaved {
            kind: RecordKind::Prescription,
            id: saved.id,
        });
        Ok(saved)
    }

    /// Invoices and budgets come in as full records from their forms; the
    /// only local check is a non-empty line list.
    pub async fn save_invoice(&self, record: Invoice) -> Result<Invoice, SessionError> {
        if record.lines.is_empty() {
            return Err(ValidationError::EmptyList("line").into());
        }
        let saved = self.inner.backend.create_invoice(&record).await?;
        self.emit(SessionEvent::RecordSaved {
            kind: RecordKind::Invoice,
            id: saved.id,
        });
        Ok(saved)
    }

    pub async fn save_budget(&self, record: Budget) -> Result<Budget, SessionError> {
        if record.lines.is_empty() {
            return Err(ValidationError::EmptyList("line").into());
        }
        let saved = self.inner.backend.create_budget(&record).await?;
        self.emit(SessionEvent::RecordSaved {
            kind: RecordKind::Budget,
            id: saved.id,
        });
        Ok(saved)
    }

    pub async fn save_sale(&self, record: Sale) -> Result<Sale, SessionError> {
        let saved = self.inner.backend.create_sale(&record).await?;
        self.emit(SessionEvent::RecordSaved {
            kind: RecordKind::Sale,
            id: saved.id,
        });
        Ok(saved)
    }

    pub async fn save_employee(&self, record: Employee) -> Result<Employee, SessionError> {
        let saved = self.inner.backend.create_employee(&record).await?;
        self.emit(SessionEvent::RecordSaved {
            kind: RecordKind::Employee,
            id: saved.id,
        });
        Ok(saved)
    }

    // ── Lifecycle ────────────────────────────────────────────────────────

    /// Invalidate every in-flight fetch (navigation away). Whatever lands
    /// later fails its generation check and is discarded.
    pub async fn reset(&self) {
        for folder in [MailFolder::Received, MailFolder::Sent] {
            let mut state = self.folder(folder).write().await;
            state.surface.generation += 1;
            state.surface.status.loading = false;
        }
        let mut pipeline = self.inner.pipeline.write().await;
        pipeline.surface.generation += 1;
        pipeline.surface.status.loading = false;
    }

    // ── Snapshots ────────────────────────────────────────────────────────

    pub async fn threads(&self, folder: MailFolder) -> Vec<Thread> {
        self.folder(folder).read().await.threads.clone()
    }

    /// Messages of one conversation, oldest first, for the detail view.
    pub async fn conversation_messages(
        &self,
        folder: MailFolder,
        conversation_id: &str,
    ) -> Vec<MailMessage> {
        let state = self.folder(folder).read().await;
        let mut messages: Vec<MailMessage> = state
            .messages
            .iter()
            .filter(|m| m.conversation_id == conversation_id)
            .cloned()
            .collect();
        messages.sort_by(|a, b| a.effective_timestamp().cmp(&b.effective_timestamp()));
        messages
    }

    pub async fn inbox_status(&self, folder: MailFolder) -> FetchStatus {
        self.folder(folder).read().await.surface.status.clone()
    }

    pub async fn unread_total(&self) -> usize {
        unread_total(&self.inner.received.read().await.threads)
    }

    pub async fn pipeline_status(&self) -> FetchStatus {
        self.inner.pipeline.read().await.surface.status.clone()
    }

    pub async fn stage_counts(&self) -> [(PipelineStage, usize); 5] {
        self.inner.pipeline.read().await.board.stage_counts()
    }

    pub async fn opportunities_in(&self, stage: PipelineStage) -> Vec<Opportunity> {
        self.inner
            .pipeline
            .read()
            .await
            .board
            .list_by_stage(stage)
            .into_iter()
            .cloned()
            .collect()
    }

    pub async fn opportunity(&self, id: Uuid) -> Option<Opportunity> {
        self.inner.pipeline.read().await.board.get(id).cloned()
    }
}

/// Walk an account's folder page by page until the gateway stops handing
/// out a next page (or the cap trips).
async fn fetch_all_pages(
    mail: &dyn MailProvider,
    account: &ConnectedAccount,
    folder: MailFolder,
) -> Result<Vec<MailMessage>, MailError> {
    let mut messages = Vec::new();
    let mut page = 0u32;
    loop {
        let batch = mail.fetch_messages(account, folder, page).await?;
        messages.extend(batch.messages);
        match batch.next_page {
            None => break,
            Some(next) if next <= page => {
                warn!(
                    "account {}: gateway returned non-advancing page {}, stopping",
                    account.address, next
                );
                break;
            }
            Some(next) if next >= PAGE_FETCH_CAP => {
                warn!(
                    "account {}: stopping after {} pages",
                    account.address, PAGE_FETCH_CAP
                );
                break;
            }
            Some(next) => page = next,
        }
    }
    Ok(messages)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a_new_generation_invalidates_older_fetches() {
        let mut surface = Surface::default();
        let first = surface.begin();
        let second = surface.begin();
        assert!(!surface.is_current(first));
        assert!(surface.is_current(second));
    }

    #[test]
    fn begin_clears_the_previous_error() {
        let mut surface = Surface::default();
        surface.status.error = Some("old failure".to_string());
        surface.begin();
        assert!(surface.status.loading);
        assert!(surface.status.error.is_none());
    }
}

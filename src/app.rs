//! Application state and core logic

use crate::backend::{LoanBackendTrait, OtpRequest};
use crate::config::WizardConfig;
use crate::state::{
    AppState, ChallengeHandle, ChallengeId, Clock, CommitOutcome, CommitProgress, DocumentTracker,
    FileRef, Form, LoanSelection, MetadataKey, NoticeKind, Notifier, OtpDialog, OtpDispatch, OtpVerdict,
    SessionContext, SessionKey, SlotMetadata, StepId, UploadPrompt, UploadRejected,
    VerificationError, VerificationStatus, View, Wizard, WizardError,
};
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};

/// Digits in an OTP
pub const OTP_LENGTH: usize = 6;

/// Results of backend round-trips, applied on the event loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendEvent {
    OtpDelivered {
        field: &'static str,
        challenge_id: ChallengeId,
        result: Result<ChallengeHandle, String>,
    },
    OtpChecked {
        field: &'static str,
        challenge_id: ChallengeId,
        result: Result<OtpVerdict, String>,
    },
    StepCommitted {
        step: StepId,
        outcome: CommitOutcome,
    },
}

/// Attach a file to a document and report the result through `notifier`
pub fn record_upload(
    tracker: &mut DocumentTracker,
    notifier: &mut dyn Notifier,
    document_id: &str,
    file: FileRef,
) -> Result<bool, UploadRejected> {
    match tracker.set_file(document_id, file, SlotMetadata::default()) {
        Ok(true) => {
            if let Some(message) = tracker.upload_notice(document_id) {
                notifier.notify(NoticeKind::Success, &message);
            }
            Ok(true)
        }
        Ok(false) => {
            notifier.notify(NoticeKind::Info, "That file is already attached");
            Ok(false)
        }
        Err(err) => {
            notifier.notify(NoticeKind::Error, &err.to_string());
            Err(err)
        }
    }
}

/// Main application struct
pub struct App {
    /// Current application state
    pub state: AppState,
    pub config: WizardConfig,
    backend: Arc<dyn LoanBackendTrait>,
    clock: Arc<dyn Clock>,
    events_tx: UnboundedSender<BackendEvent>,
    events_rx: UnboundedReceiver<BackendEvent>,
    loader_delay: Duration,
    /// Whether the app should quit
    quit: bool,
}

impl App {
    /// Create a new App instance
    pub fn new(config: WizardConfig, backend: Arc<dyn LoanBackendTrait>, clock: Arc<dyn Clock>) -> Self {
        let documents = DocumentTracker::new(config.document_checklist(), config.max_upload_bytes());
        let (events_tx, events_rx) = unbounded_channel();
        Self {
            state: AppState::new(documents),
            loader_delay: config.loader_delay(),
            config,
            backend,
            clock,
            events_tx,
            events_rx,
            quit: false,
        }
    }

    /// Check if app should quit
    pub fn should_quit(&self) -> bool {
        self.quit
    }

    pub fn now(&self) -> Instant {
        self.clock.now()
    }

    pub fn is_loading(&self) -> bool {
        self.state.is_loading(self.clock.now())
    }

    /// Push an error message to the error queue for display
    pub fn push_error(&mut self, message: impl Into<String>) {
        self.state.push_error(message.into());
    }

    fn notify(&mut self, kind: NoticeKind, message: &str) {
        let now = self.clock.now();
        self.state.notices.push(kind, message, now);
    }

    /// Timer work: expire notices and the loader, settle debounced
    /// checks, apply finished backend calls
    pub fn tick(&mut self) {
        let now = self.clock.now();
        self.state.notices.prune(now);
        if self.state.loading_until.is_some_and(|until| now >= until) {
            self.state.loading_until = None;
        }
        if let Some(wizard) = self.state.wizard.as_mut() {
            wizard.poll_debounce();
        }
        while let Ok(event) = self.events_rx.try_recv() {
            self.apply_backend_event(event);
        }
    }

    /// Wait for the next backend result
    #[cfg(test)]
    pub async fn next_backend_event(&mut self) -> Option<BackendEvent> {
        self.events_rx.recv().await
    }

    /// Jump straight into the wizard for a loan selection
    pub fn start_wizard(&mut self, selection: LoanSelection) {
        match self.state.wizard.as_mut() {
            Some(wizard) => wizard.change_selection(selection),
            None => {
                let session = SessionContext::new()
                    .with(SessionKey::CustomerId, self.config.customer_id.clone())
                    .with(SessionKey::MobileForOtp, self.config.mobile_number.clone());
                self.state.wizard = Some(Wizard::new(
                    selection,
                    session,
                    self.config.wizard_options(),
                    self.clock.clone(),
                ));
            }
        }
        info!(loan = %selection, "starting application");
        self.state.choosing_subtype = false;
        self.state.current_view = View::Wizard;
        self.state.start_loading(self.clock.now(), self.loader_delay);
    }

    /// Handle a key event
    pub fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        // Handle error dialog dismissal first (modal)
        if self.state.has_errors() {
            if matches!(key.code, KeyCode::Enter | KeyCode::Esc) {
                self.state.dismiss_error();
            }
            return Ok(());
        }

        // Input is ignored while the loader shows
        if self.is_loading() {
            return Ok(());
        }

        match self.state.current_view {
            View::LoanSelect => self.handle_loan_select_key(key),
            View::Wizard => {
                if self.state.otp_dialog.is_some() {
                    self.handle_otp_dialog_key(key);
                } else {
                    self.handle_wizard_key(key);
                }
            }
            View::Documents => {
                if self.state.upload_prompt.is_some() {
                    self.handle_upload_prompt_key(key);
                } else {
                    self.handle_documents_key(key);
                }
            }
            View::Sanction => self.handle_sanction_key(key),
            View::ThankYou => self.handle_thank_you_key(key),
        }
        Ok(())
    }

    fn handle_loan_select_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => self.state.move_selection_down(),
            KeyCode::Char('k') | KeyCode::Up => self.state.move_selection_up(),
            KeyCode::Enter => {
                if self.state.highlighted_loan().has_subtypes() && !self.state.choosing_subtype {
                    self.state.choosing_subtype = true;
                    self.state.subtype_cursor = 0;
                } else {
                    let selection = self.state.highlighted_selection();
                    self.start_wizard(selection);
                }
            }
            KeyCode::Esc if self.state.choosing_subtype => self.state.choosing_subtype = false,
            KeyCode::Char('q') | KeyCode::Esc => self.quit = true,
            _ => {}
        }
    }

    fn handle_wizard_key(&mut self, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let Some(wizard) = self.state.wizard.as_mut() else {
            self.state.current_view = View::LoanSelect;
            return;
        };
        match key.code {
            KeyCode::Tab | KeyCode::Down => wizard.next_field(),
            KeyCode::BackTab | KeyCode::Up => wizard.prev_field(),
            KeyCode::Left => {
                wizard.cycle_active_choice(false);
            }
            KeyCode::Right => {
                wizard.cycle_active_choice(true);
            }
            KeyCode::Char('o') if ctrl => self.request_otp(),
            KeyCode::Char('e') if ctrl => self.edit_active_field(),
            KeyCode::Enter => self.advance(),
            KeyCode::Esc => {
                if !wizard.go_back() {
                    self.state.current_view = View::LoanSelect;
                }
            }
            KeyCode::Backspace => {
                wizard.pop_char();
            }
            KeyCode::Char(' ') if wizard.toggle_active() => {}
            KeyCode::Char(c) if !ctrl => {
                wizard.push_char(c);
            }
            _ => {}
        }
    }

    /// Clear the active field so a verified value can be re-entered
    fn edit_active_field(&mut self) {
        let Some(wizard) = self.state.wizard.as_mut() else {
            return;
        };
        let Some(name) = wizard.active_field_name() else {
            return;
        };
        match wizard.clear_field(name) {
            Ok(()) | Err(WizardError::CommitInFlight(_)) => {}
            Err(err) => warn!("failed to clear {name}: {err}"),
        }
    }

    /// Commit the current step and submit it in the background
    fn advance(&mut self) {
        let Some(wizard) = self.state.wizard.as_mut() else {
            return;
        };
        let step = wizard.current_step().id;
        match wizard.commit_step(step) {
            Ok(submission) => {
                let backend = self.backend.clone();
                let tx = self.events_tx.clone();
                tokio::spawn(async move {
                    let outcome = match backend.submit_step(&submission).await {
                        Ok(response) => response.into_outcome(),
                        Err(err) => {
                            warn!("step submission failed: {err:#}");
                            CommitOutcome::Failed(format!(
                                "Could not save {}: {err}",
                                step.title()
                            ))
                        }
                    };
                    let _ = tx.send(BackendEvent::StepCommitted { step, outcome });
                });
            }
            Err(WizardError::StepIncomplete(errors)) => {
                debug!(fields = ?errors.keys().collect::<Vec<_>>(), "step incomplete");
                self.notify(NoticeKind::Error, "Please complete the highlighted fields");
            }
            Err(WizardError::CommitInFlight(_)) => {}
            Err(err) => self.push_error(err.to_string()),
        }
    }

    fn request_otp(&mut self) {
        let Some(wizard) = self.state.wizard.as_mut() else {
            return;
        };
        let Some(name) = wizard.active_field_name() else {
            return;
        };
        match wizard.request_otp(name) {
            Ok(dispatch) => {
                let label = wizard.field_spec(name).map(|s| s.label).unwrap_or(name);
                let delivered = matches!(
                    wizard.verification_status(name),
                    Some(VerificationStatus::ChallengePending(p)) if p.handle.is_some()
                );
                let mut dialog = OtpDialog::new(
                    dispatch.field,
                    label,
                    dispatch.challenge_id,
                    dispatch.destination.clone(),
                );
                dialog.busy = !delivered;
                self.state.otp_dialog = Some(dialog);
                if dispatch.is_new {
                    self.spawn_delivery(dispatch);
                }
            }
            Err(WizardError::NotOtpGated(_)) => {
                self.notify(NoticeKind::Info, "This field does not need OTP verification");
            }
            Err(err) => self.notify(NoticeKind::Error, &err.to_string()),
        }
    }

    fn spawn_delivery(&self, dispatch: OtpDispatch) {
        let backend = self.backend.clone();
        let tx = self.events_tx.clone();
        let request = OtpRequest::from(&dispatch);
        tokio::spawn(async move {
            let result = backend
                .request_otp(&request)
                .await
                .map_err(|err| err.to_string());
            let _ = tx.send(BackendEvent::OtpDelivered {
                field: dispatch.field,
                challenge_id: dispatch.challenge_id,
                result,
            });
        });
    }

    fn handle_otp_dialog_key(&mut self, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let Some(dialog) = self.state.otp_dialog.as_mut() else {
            return;
        };
        match key.code {
            KeyCode::Char('r') if ctrl => self.resend_otp(),
            KeyCode::Char(c) if c.is_ascii_digit() && dialog.input.len() < OTP_LENGTH => {
                dialog.input.push(c);
            }
            KeyCode::Backspace => {
                dialog.input.pop();
            }
            KeyCode::Enter => self.submit_otp(),
            KeyCode::Esc => self.close_otp_dialog(),
            _ => {}
        }
    }

    fn submit_otp(&mut self) {
        let (Some(wizard), Some(dialog)) =
            (self.state.wizard.as_mut(), self.state.otp_dialog.as_mut())
        else {
            return;
        };
        match wizard.submit_otp(dialog.field, dialog.challenge_id, &dialog.input) {
            Ok(submission) => {
                dialog.busy = true;
                dialog.message = None;
                let field = dialog.field;
                let backend = self.backend.clone();
                let tx = self.events_tx.clone();
                tokio::spawn(async move {
                    let result = backend
                        .verify_otp(&submission.handle, &submission.code)
                        .await
                        .map_err(|err| err.to_string());
                    let _ = tx.send(BackendEvent::OtpChecked {
                        field,
                        challenge_id: submission.challenge_id,
                        result,
                    });
                });
            }
            Err(WizardError::Verification(
                err @ (VerificationError::EmptyCode
                | VerificationError::NotDelivered
                | VerificationError::AwaitingResult),
            )) => dialog.set_error(err.to_string()),
            Err(err) => {
                self.state.otp_dialog = None;
                if !matches!(
                    err,
                    WizardError::Verification(VerificationError::StaleChallengeResponse)
                ) {
                    self.notify(NoticeKind::Error, &err.to_string());
                }
            }
        }
    }

    fn resend_otp(&mut self) {
        let (Some(wizard), Some(dialog)) =
            (self.state.wizard.as_mut(), self.state.otp_dialog.as_mut())
        else {
            return;
        };
        match wizard.resend_otp(dialog.field) {
            Ok(dispatch) => {
                dialog.challenge_id = dispatch.challenge_id;
                dialog.input.clear();
                dialog.busy = true;
                dialog.set_info("A new OTP is on its way");
                self.spawn_delivery(dispatch);
            }
            Err(err) => dialog.set_error(err.to_string()),
        }
    }

    /// Close the dialog, abandoning its challenge
    fn close_otp_dialog(&mut self) {
        let Some(dialog) = self.state.otp_dialog.take() else {
            return;
        };
        if let Some(wizard) = self.state.wizard.as_mut() {
            if let Ok(true) = wizard.cancel_otp(dialog.field) {
                debug!(field = dialog.field, "otp challenge cancelled");
            }
        }
    }

    /// Dialog still showing the given challenge
    fn dialog_for(&mut self, challenge_id: ChallengeId) -> Option<&mut OtpDialog> {
        self.state
            .otp_dialog
            .as_mut()
            .filter(|d| d.challenge_id == challenge_id)
    }

    /// Apply a finished backend call
    pub fn apply_backend_event(&mut self, event: BackendEvent) {
        let Some(wizard) = self.state.wizard.as_mut() else {
            debug!("dropping backend result without an application");
            return;
        };
        match event {
            BackendEvent::OtpDelivered {
                field,
                challenge_id,
                result,
            } => match wizard.otp_delivered(field, challenge_id, result) {
                Ok(()) => {
                    if let Some(dialog) = self.dialog_for(challenge_id) {
                        dialog.busy = false;
                        let sent = format!("OTP sent to {}", dialog.masked_destination());
                        dialog.set_info(sent);
                    }
                }
                Err(err) => self.otp_error(challenge_id, err),
            },
            BackendEvent::OtpChecked {
                field,
                challenge_id,
                result: Ok(verdict),
            } => match wizard.otp_resolved(field, challenge_id, verdict) {
                Ok(()) => {
                    let label = wizard.field_spec(field).map(|s| s.label).unwrap_or(field);
                    if self.dialog_for(challenge_id).is_some() {
                        self.state.otp_dialog = None;
                    }
                    self.notify(NoticeKind::Success, &format!("{label} verified"));
                }
                Err(WizardError::Verification(err @ VerificationError::ChallengeMismatch { .. })) => {
                    if let Some(dialog) = self.dialog_for(challenge_id) {
                        dialog.busy = false;
                        dialog.input.clear();
                        dialog.set_error(err.to_string());
                    }
                }
                Err(err) => self.otp_error(challenge_id, err),
            },
            BackendEvent::OtpChecked {
                field,
                challenge_id,
                result: Err(reason),
            } => {
                warn!("otp verification failed: {reason}");
                match wizard.otp_failed(field, challenge_id) {
                    Ok(()) => {
                        if let Some(dialog) = self.dialog_for(challenge_id) {
                            dialog.busy = false;
                            dialog.set_error(format!("Could not verify OTP: {reason}"));
                        }
                    }
                    Err(err) => self.otp_error(challenge_id, err),
                }
            }
            BackendEvent::StepCommitted { step, outcome } => {
                match wizard.complete_commit(step, outcome) {
                    CommitProgress::Advanced(next) => {
                        info!(step = ?next, "step saved");
                        self.notify(NoticeKind::Success, &format!("{} saved", step.title()));
                        self.state.start_loading(self.clock.now(), self.loader_delay);
                    }
                    CommitProgress::Completed => {
                        info!("application details complete");
                        self.state.current_view = View::Documents;
                        self.state.document_cursor = 0;
                        self.state.start_loading(self.clock.now(), self.loader_delay);
                    }
                    CommitProgress::Blocked(message) => self.push_error(message),
                    CommitProgress::Ignored => {}
                }
            }
        }
    }

    /// Stale results vanish silently; anything else closes the dialog
    fn otp_error(&mut self, challenge_id: ChallengeId, err: WizardError) {
        if let WizardError::Verification(inner) = &err {
            if !inner.is_user_visible() {
                debug!(%challenge_id, "stale otp result discarded");
                return;
            }
        }
        if self.dialog_for(challenge_id).is_some() {
            self.state.otp_dialog = None;
        }
        self.notify(NoticeKind::Error, &err.to_string());
    }

    fn handle_documents_key(&mut self, key: KeyEvent) {
        let Some(id) = self.state.selected_document_id() else {
            return;
        };
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => self.state.move_document_down(),
            KeyCode::Char('k') | KeyCode::Up => self.state.move_document_up(),
            KeyCode::Enter => {
                self.state.upload_prompt = Some(UploadPrompt {
                    document_id: id,
                    path_input: String::new(),
                });
            }
            KeyCode::Char('d') => {
                if self.state.documents.remove_file(&id).is_ok() {
                    self.notify(NoticeKind::Info, "File removed");
                }
            }
            KeyCode::Char('y') => self.cycle_metadata(&id, MetadataKey::Year),
            KeyCode::Char('m') => self.cycle_metadata(&id, MetadataKey::MonthYear),
            KeyCode::Char('p') => self.proceed_from_documents(),
            KeyCode::Esc => self.state.current_view = View::Wizard,
            _ => {}
        }
    }

    fn cycle_metadata(&mut self, id: &str, key: MetadataKey) {
        if let Err(err) = self.state.documents.cycle_metadata(id, key) {
            self.notify(NoticeKind::Info, &err.to_string());
        }
    }

    fn proceed_from_documents(&mut self) {
        if self.state.documents.all_required_satisfied() {
            self.state.current_view = View::Sanction;
        } else {
            let label = self.state.documents.proceed_label();
            self.notify(NoticeKind::Info, &label);
        }
    }

    fn handle_upload_prompt_key(&mut self, key: KeyEvent) {
        let Some(prompt) = self.state.upload_prompt.as_mut() else {
            return;
        };
        match key.code {
            KeyCode::Char(c) => prompt.path_input.push(c),
            KeyCode::Backspace => {
                prompt.path_input.pop();
            }
            KeyCode::Esc => self.state.upload_prompt = None,
            KeyCode::Enter => {
                if let Some(prompt) = self.state.upload_prompt.take() {
                    self.upload_from_path(&prompt.document_id, prompt.path_input.trim());
                }
            }
            _ => {}
        }
    }

    /// Read a file from disk and attach it to a document
    pub fn upload_from_path(&mut self, document_id: &str, path: &str) {
        if path.is_empty() {
            return;
        }
        match FileRef::from_path(Path::new(path)) {
            Ok(file) => {
                let now = self.clock.now();
                let state = &mut self.state;
                let mut notifier = state.notices.stamped(now);
                if let Err(err) = record_upload(&mut state.documents, &mut notifier, document_id, file) {
                    debug!(document_id, "upload rejected: {err}");
                }
            }
            Err(err) => {
                warn!("cannot read {path}: {err}");
                self.notify(NoticeKind::Error, &format!("Could not read file: {err}"));
            }
        }
    }

    fn handle_sanction_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter => {
                // The application is finished; its values are no longer needed
                if let Some(wizard) = self.state.wizard.as_mut() {
                    wizard.reset();
                }
                self.state.documents.clear();
                self.state.current_view = View::ThankYou;
            }
            KeyCode::Esc => self.state.current_view = View::Documents,
            _ => {}
        }
    }

    fn handle_thank_you_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter => {
                self.state.wizard = None;
                self.state.current_view = View::LoanSelect;
            }
            KeyCode::Char('q') | KeyCode::Esc => self.quit = true,
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{MockLoanBackendTrait, SubmitResponse};
    use crate::state::{
        FakeClock, LoanType, MockNotifier, EMAIL, KYC_DOCUMENT, KYC_NUMBER, MOBILE_NUMBER,
    };
    use anyhow::anyhow;
    use std::io::Write;

    fn config() -> WizardConfig {
        WizardConfig {
            loader_delay_ms: Some(0),
            mobile_number: Some("9876543210".to_string()),
            ..Default::default()
        }
    }

    fn app_with(backend: MockLoanBackendTrait) -> App {
        app_with_clock(backend).0
    }

    fn app_with_clock(backend: MockLoanBackendTrait) -> (App, Arc<FakeClock>) {
        let clock = Arc::new(FakeClock::new());
        let app = App::new(config(), Arc::new(backend), clock.clone());
        (app, clock)
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            app.handle_key(key(KeyCode::Char(c))).unwrap();
        }
    }

    fn wizard(app: &mut App) -> &mut Wizard {
        app.state.wizard.as_mut().unwrap()
    }

    fn fill_profile(app: &mut App) {
        let wizard = wizard(app);
        wizard.select_choice("consumerCategory", "individual").unwrap();
        wizard.select_choice("employmentType", "salaried").unwrap();
        wizard.set_text(MOBILE_NUMBER, "9876543210").unwrap();
    }

    async fn apply_next(app: &mut App) {
        let event = app.next_backend_event().await.unwrap();
        app.apply_backend_event(event);
    }

    mod loan_select {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn test_vehicle_asks_for_subtype() {
            let mut app = app_with(MockLoanBackendTrait::new());
            app.handle_key(key(KeyCode::Down)).unwrap();
            app.handle_key(key(KeyCode::Down)).unwrap();
            app.handle_key(key(KeyCode::Enter)).unwrap();
            assert!(app.state.choosing_subtype);
            assert_eq!(app.state.current_view, View::LoanSelect);

            app.handle_key(key(KeyCode::Down)).unwrap();
            app.handle_key(key(KeyCode::Enter)).unwrap();
            assert_eq!(app.state.current_view, View::Wizard);
            let selection = app.state.wizard.as_ref().unwrap().selection();
            assert_eq!(selection.loan_type, LoanType::Vehicle);
            assert_eq!(selection.to_string(), "Vehicle Loan (2 Wheeler)");
        }

        #[test]
        fn test_quit_from_loan_select() {
            let mut app = app_with(MockLoanBackendTrait::new());
            assert!(!app.should_quit());
            app.handle_key(key(KeyCode::Char('q'))).unwrap();
            assert!(app.should_quit());
        }

        #[test]
        fn test_loader_blocks_input() {
            let clock = Arc::new(FakeClock::new());
            let config = WizardConfig {
                loader_delay_ms: Some(1000),
                ..Default::default()
            };
            let mut app = App::new(config, Arc::new(MockLoanBackendTrait::new()), clock.clone());
            app.start_wizard(LoanSelection::new(LoanType::Home, None));
            assert!(app.is_loading());
            app.handle_key(key(KeyCode::Tab)).unwrap();
            assert_eq!(wizard(&mut app).active_field(), 0);

            clock.advance(Duration::from_millis(1000));
            app.tick();
            assert!(!app.is_loading());
            app.handle_key(key(KeyCode::Tab)).unwrap();
            assert_eq!(wizard(&mut app).active_field(), 1);
        }
    }

    mod steps {
        use super::*;
        use pretty_assertions::assert_eq;

        #[tokio::test]
        async fn test_enter_commits_and_advances() {
            let mut backend = MockLoanBackendTrait::new();
            backend
                .expect_submit_step()
                .withf(|s| s.step == StepId::LoanProfile && s.customer_id.is_none())
                .times(1)
                .returning(|_| Ok(SubmitResponse::accepted()));
            let mut app = app_with(backend);
            app.start_wizard(LoanSelection::new(LoanType::Personal, None));
            fill_profile(&mut app);

            app.handle_key(key(KeyCode::Enter)).unwrap();
            // A second Enter while the first is in flight is ignored
            app.handle_key(key(KeyCode::Enter)).unwrap();
            apply_next(&mut app).await;

            assert_eq!(wizard(&mut app).current_step().id, StepId::AboutYou);
            assert_eq!(
                app.state.notices.latest().map(|n| n.message.as_str()),
                Some("Loan Profile saved")
            );
        }

        #[tokio::test]
        async fn test_incomplete_step_is_not_submitted() {
            let mut app = app_with(MockLoanBackendTrait::new());
            app.start_wizard(LoanSelection::new(LoanType::Home, None));
            app.handle_key(key(KeyCode::Enter)).unwrap();
            assert_eq!(
                app.state.notices.latest().map(|n| n.kind),
                Some(NoticeKind::Error)
            );
            let mobile = wizard(&mut app).field(MOBILE_NUMBER).unwrap();
            assert!(mobile.error.is_some());
        }

        #[tokio::test]
        async fn test_notices_expire_on_the_app_clock() {
            let (mut app, clock) = app_with_clock(MockLoanBackendTrait::new());
            app.start_wizard(LoanSelection::new(LoanType::Home, None));
            app.handle_key(key(KeyCode::Enter)).unwrap();
            assert_eq!(app.state.notices.len(), 1);

            clock.advance(crate::state::NOTICE_TTL);
            app.tick();
            assert!(app.state.notices.is_empty());
        }

        #[tokio::test]
        async fn test_backend_failure_keeps_values() {
            let mut backend = MockLoanBackendTrait::new();
            backend
                .expect_submit_step()
                .times(2)
                .returning(|_| Err(anyhow!("connection refused")));
            let mut app = app_with(backend);
            app.start_wizard(LoanSelection::new(LoanType::Home, None));
            fill_profile(&mut app);

            app.handle_key(key(KeyCode::Enter)).unwrap();
            apply_next(&mut app).await;
            assert!(app.state.has_errors());
            assert!(app
                .state
                .current_error()
                .is_some_and(|e| e.contains("connection refused")));
            assert_eq!(wizard(&mut app).current_step().id, StepId::LoanProfile);
            assert_eq!(
                wizard(&mut app).field(MOBILE_NUMBER).unwrap().as_text(),
                "9876543210"
            );

            // Dismiss and retry without re-entering anything
            app.handle_key(key(KeyCode::Esc)).unwrap();
            app.handle_key(key(KeyCode::Enter)).unwrap();
            apply_next(&mut app).await;
            assert!(app.state.has_errors());
        }

        #[tokio::test]
        async fn test_edits_ignored_while_step_is_saving() {
            let mut backend = MockLoanBackendTrait::new();
            backend
                .expect_submit_step()
                .times(1)
                .returning(|_| Ok(SubmitResponse::accepted()));
            let mut app = app_with(backend);
            app.start_wizard(LoanSelection::new(LoanType::Personal, None));
            fill_profile(&mut app);
            app.handle_key(key(KeyCode::Tab)).unwrap();
            app.handle_key(key(KeyCode::Tab)).unwrap();

            app.handle_key(key(KeyCode::Enter)).unwrap();
            app.handle_key(key(KeyCode::Backspace)).unwrap();
            app.handle_key(ctrl('e')).unwrap();
            type_text(&mut app, "1");
            assert_eq!(
                wizard(&mut app).field(MOBILE_NUMBER).unwrap().as_text(),
                "9876543210"
            );

            apply_next(&mut app).await;
            let wizard = wizard(&mut app);
            assert_eq!(wizard.current_step().id, StepId::AboutYou);
            assert!(wizard.can_advance(StepId::LoanProfile));
        }

        #[tokio::test]
        async fn test_typing_goes_to_active_field() {
            let mut app = app_with(MockLoanBackendTrait::new());
            app.start_wizard(LoanSelection::new(LoanType::Education, None));
            app.handle_key(key(KeyCode::Right)).unwrap();
            app.handle_key(key(KeyCode::Tab)).unwrap();
            type_text(&mut app, "98765");
            app.handle_key(key(KeyCode::Backspace)).unwrap();
            let wizard = wizard(&mut app);
            assert_eq!(wizard.field("consumerCategory").unwrap().as_choice(), Some("individual"));
            assert_eq!(wizard.field(MOBILE_NUMBER).unwrap().as_text(), "9876");
        }

        #[tokio::test]
        async fn test_esc_on_first_step_returns_to_loan_select() {
            let mut app = app_with(MockLoanBackendTrait::new());
            app.start_wizard(LoanSelection::new(LoanType::Home, None));
            app.handle_key(key(KeyCode::Esc)).unwrap();
            assert_eq!(app.state.current_view, View::LoanSelect);
        }
    }

    mod otp {
        use super::*;
        use pretty_assertions::assert_eq;

        const ADDRESS: &str = "asha.rao@example.com";

        async fn on_about_you(backend: MockLoanBackendTrait) -> App {
            let mut backend = backend;
            backend
                .expect_submit_step()
                .returning(|_| Ok(SubmitResponse::accepted()));
            let mut app = app_with(backend);
            app.start_wizard(LoanSelection::new(LoanType::Personal, None));
            fill_profile(&mut app);
            app.handle_key(key(KeyCode::Enter)).unwrap();
            apply_next(&mut app).await;
            let wizard = wizard(&mut app);
            wizard.set_text(EMAIL, ADDRESS).unwrap();
            wizard.set_active_field(3);
            app
        }

        fn expect_delivery(backend: &mut MockLoanBackendTrait) {
            backend
                .expect_request_otp()
                .withf(|r| r.destination == ADDRESS)
                .returning(|_| Ok(ChallengeHandle("otp-1".to_string())));
        }

        #[tokio::test]
        async fn test_correct_code_verifies_field() {
            let mut backend = MockLoanBackendTrait::new();
            expect_delivery(&mut backend);
            backend
                .expect_verify_otp()
                .withf(|handle, code| handle.0 == "otp-1" && code == "123456")
                .times(1)
                .returning(|_, _| Ok(OtpVerdict::Verified));
            let mut app = on_about_you(backend).await;

            app.handle_key(ctrl('o')).unwrap();
            assert!(app.state.otp_dialog.as_ref().is_some_and(|d| d.busy));
            apply_next(&mut app).await;
            assert!(app.state.otp_dialog.as_ref().is_some_and(|d| !d.busy));

            type_text(&mut app, "123456");
            app.handle_key(key(KeyCode::Enter)).unwrap();
            apply_next(&mut app).await;

            assert!(app.state.otp_dialog.is_none());
            assert!(matches!(
                wizard(&mut app).verification_status(EMAIL),
                Some(VerificationStatus::Verified { .. })
            ));
            assert_eq!(
                app.state.notices.latest().map(|n| n.message.as_str()),
                Some("Email verified")
            );
        }

        #[tokio::test]
        async fn test_wrong_code_keeps_dialog_open() {
            let mut backend = MockLoanBackendTrait::new();
            expect_delivery(&mut backend);
            backend
                .expect_verify_otp()
                .returning(|_, _| Ok(OtpVerdict::Rejected));
            let mut app = on_about_you(backend).await;

            app.handle_key(ctrl('o')).unwrap();
            apply_next(&mut app).await;
            type_text(&mut app, "000000");
            app.handle_key(key(KeyCode::Enter)).unwrap();
            apply_next(&mut app).await;

            let dialog = app.state.otp_dialog.as_ref().unwrap();
            assert_eq!(dialog.message_text(), Some("Incorrect OTP, 2 attempt(s) left"));
            assert!(dialog.input.is_empty());
        }

        #[tokio::test]
        async fn test_delivery_after_cancel_is_discarded() {
            let mut backend = MockLoanBackendTrait::new();
            expect_delivery(&mut backend);
            let mut app = on_about_you(backend).await;

            app.handle_key(ctrl('o')).unwrap();
            app.handle_key(key(KeyCode::Esc)).unwrap();
            assert!(app.state.otp_dialog.is_none());
            apply_next(&mut app).await;

            assert_eq!(
                wizard(&mut app).verification_status(EMAIL),
                Some(&VerificationStatus::Unverified)
            );
            assert!(!app.state.has_errors());
            assert!(app
                .state
                .notices
                .latest()
                .map_or(true, |n| n.kind != NoticeKind::Error));
        }

        #[tokio::test]
        async fn test_delivery_failure_closes_dialog() {
            let mut backend = MockLoanBackendTrait::new();
            backend
                .expect_request_otp()
                .returning(|_| Err(anyhow!("sms gateway down")));
            let mut app = on_about_you(backend).await;

            app.handle_key(ctrl('o')).unwrap();
            apply_next(&mut app).await;
            assert!(app.state.otp_dialog.is_none());
            let notice = app.state.notices.latest().unwrap();
            assert_eq!(notice.kind, NoticeKind::Error);
            assert!(notice.message.contains("sms gateway down"));
        }

        #[tokio::test]
        async fn test_invalid_value_does_not_open_dialog() {
            let mut app = on_about_you(MockLoanBackendTrait::new()).await;
            wizard(&mut app).set_text(EMAIL, "not-an-email").unwrap();
            app.handle_key(ctrl('o')).unwrap();
            assert!(app.state.otp_dialog.is_none());
            assert_eq!(
                app.state.notices.latest().map(|n| n.kind),
                Some(NoticeKind::Error)
            );
        }

        #[tokio::test]
        async fn test_kyc_otp_waits_for_debounce() {
            let mut backend = MockLoanBackendTrait::new();
            backend
                .expect_submit_step()
                .returning(|_| Ok(SubmitResponse::accepted()));
            backend
                .expect_request_otp()
                .withf(|r| r.field == KYC_NUMBER && r.destination == "9876543210")
                .times(1)
                .returning(|_| Ok(ChallengeHandle("otp-kyc".to_string())));
            let (mut app, clock) = app_with_clock(backend);
            app.start_wizard(LoanSelection::new(LoanType::Personal, None));
            fill_profile(&mut app);
            app.handle_key(key(KeyCode::Enter)).unwrap();
            apply_next(&mut app).await;

            let wizard = wizard(&mut app);
            wizard.select_choice(KYC_DOCUMENT, "aadhar").unwrap();
            wizard.set_text(KYC_NUMBER, "123412341234").unwrap();
            wizard.set_active_field(5);
            assert_eq!(wizard.active_field_name(), Some(KYC_NUMBER));

            app.handle_key(ctrl('o')).unwrap();
            assert!(app.state.otp_dialog.is_none());
            assert_eq!(
                app.state.notices.latest().map(|n| n.kind),
                Some(NoticeKind::Error)
            );

            clock.advance(Duration::from_millis(300));
            app.tick();
            app.handle_key(ctrl('o')).unwrap();
            assert!(app.state.otp_dialog.as_ref().is_some_and(|d| d.busy));
            apply_next(&mut app).await;
            assert!(app.state.otp_dialog.as_ref().is_some_and(|d| !d.busy));
        }

        #[tokio::test]
        async fn test_resend_supersedes_challenge() {
            let mut backend = MockLoanBackendTrait::new();
            expect_delivery(&mut backend);
            let mut app = on_about_you(backend).await;

            app.handle_key(ctrl('o')).unwrap();
            let first = app.state.otp_dialog.as_ref().unwrap().challenge_id;
            app.handle_key(ctrl('r')).unwrap();
            let second = app.state.otp_dialog.as_ref().unwrap().challenge_id;
            assert_ne!(first, second);

            // The first delivery is stale and leaves the dialog busy
            apply_next(&mut app).await;
            apply_next(&mut app).await;
            assert!(app.state.otp_dialog.as_ref().is_some_and(|d| !d.busy));
        }
    }

    mod documents {
        use super::*;
        use pretty_assertions::assert_eq;
        use crate::data::{default_checklist, YEAR_OPTIONS};
        use crate::state::DEFAULT_MAX_UPLOAD_BYTES;

        fn tracker() -> DocumentTracker {
            DocumentTracker::new(default_checklist(), DEFAULT_MAX_UPLOAD_BYTES)
        }

        #[test]
        fn test_upload_notifies_success() {
            let mut tracker = tracker();
            let mut notifier = MockNotifier::new();
            notifier
                .expect_notify()
                .withf(|kind, message| {
                    *kind == NoticeKind::Success
                        && message == "Form 16 / ITR (2024) uploaded successfully! 🎉"
                })
                .times(1)
                .return_const(());
            let result = record_upload(
                &mut tracker,
                &mut notifier,
                "itr2024",
                FileRef::new("itr.pdf", 2048),
            );
            assert_eq!(result, Ok(true));
        }

        #[test]
        fn test_rejected_upload_notifies_error() {
            let mut tracker = tracker();
            let mut notifier = MockNotifier::new();
            notifier
                .expect_notify()
                .withf(|kind, _| *kind == NoticeKind::Error)
                .times(1)
                .return_const(());
            let result = record_upload(
                &mut tracker,
                &mut notifier,
                "bankStatement",
                FileRef::new("statement.exe", 10),
            );
            assert!(matches!(result, Err(UploadRejected::UnsupportedFileType(_))));
            assert_eq!(tracker.remaining_count(), 8);
        }

        #[test]
        fn test_same_file_twice_is_info() {
            let mut tracker = tracker();
            let mut notifier = MockNotifier::new();
            notifier.expect_notify().times(2).return_const(());
            let file = FileRef::new("photo.png", 100);
            assert_eq!(
                record_upload(&mut tracker, &mut notifier, "latestPhoto", file.clone()),
                Ok(true)
            );
            assert_eq!(
                record_upload(&mut tracker, &mut notifier, "latestPhoto", file),
                Ok(false)
            );
        }

        #[test]
        fn test_upload_prompt_reads_file() {
            let mut file = tempfile::Builder::new().suffix(".pdf").tempfile().unwrap();
            file.write_all(b"%PDF-1.4").unwrap();
            let path = file.path().to_string_lossy().to_string();

            let mut app = app_with(MockLoanBackendTrait::new());
            app.state.current_view = View::Documents;
            app.handle_key(key(KeyCode::Enter)).unwrap();
            assert!(app.state.upload_prompt.is_some());
            type_text(&mut app, &path);
            app.handle_key(key(KeyCode::Enter)).unwrap();

            assert!(app.state.upload_prompt.is_none());
            let slot = app.state.documents.slot("bankStatement").unwrap();
            assert_eq!(slot.file.as_ref().map(|f| f.size_bytes), Some(8));
            assert_eq!(app.state.documents.remaining_count(), 7);
        }

        #[test]
        fn test_missing_file_reports_error() {
            let mut app = app_with(MockLoanBackendTrait::new());
            app.upload_from_path("bankStatement", "/definitely/not/here.pdf");
            assert_eq!(
                app.state.notices.latest().map(|n| n.kind),
                Some(NoticeKind::Error)
            );
        }

        #[test]
        fn test_proceed_requires_all_documents() {
            let mut app = app_with(MockLoanBackendTrait::new());
            app.start_wizard(LoanSelection::new(LoanType::Home, None));
            app.state.current_view = View::Documents;
            app.handle_key(key(KeyCode::Char('p'))).unwrap();
            assert_eq!(app.state.current_view, View::Documents);
            assert_eq!(
                app.state.notices.latest().map(|n| n.message.as_str()),
                Some("Verify 8 more documents")
            );

            let ids: Vec<String> = app
                .state
                .documents
                .descriptors()
                .iter()
                .map(|d| d.id.clone())
                .collect();
            for id in ids {
                app.state
                    .documents
                    .set_file(&id, FileRef::new("doc.pdf", 10), SlotMetadata::default())
                    .unwrap();
            }
            app.handle_key(key(KeyCode::Char('p'))).unwrap();
            assert_eq!(app.state.current_view, View::Sanction);

            wizard(&mut app).set_text(MOBILE_NUMBER, "9876543210").unwrap();
            app.handle_key(key(KeyCode::Enter)).unwrap();
            assert_eq!(app.state.current_view, View::ThankYou);
            assert_eq!(wizard(&mut app).field(MOBILE_NUMBER).unwrap().as_text(), "");
            assert_eq!(app.state.documents.remaining_count(), 8);
        }

        #[test]
        fn test_remove_and_metadata_keys() {
            let mut app = app_with(MockLoanBackendTrait::new());
            app.state.current_view = View::Documents;
            app.state
                .documents
                .set_file("bankStatement", FileRef::new("s.pdf", 1), SlotMetadata::default())
                .unwrap();
            app.handle_key(key(KeyCode::Char('d'))).unwrap();
            assert!(app.state.documents.slot("bankStatement").unwrap().file.is_none());

            app.handle_key(key(KeyCode::Down)).unwrap();
            app.handle_key(key(KeyCode::Char('y'))).unwrap();
            assert_eq!(
                app.state.documents.slot("itr2024").unwrap().year.as_deref(),
                YEAR_OPTIONS.first().copied()
            );
        }
    }
}

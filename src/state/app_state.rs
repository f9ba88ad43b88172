//! Application state definitions

use super::documents::DocumentTracker;
use super::forms::{ChallengeId, LoanSelection, LoanType, VehicleSubtype, Wizard};
use super::notifications::{NoticeKind, NoticeQueue};
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Current view in the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    #[default]
    LoanSelect,
    Wizard,
    Documents,
    Sanction,
    ThankYou,
}

impl View {
    pub fn title(&self) -> &'static str {
        match self {
            Self::LoanSelect => "Choose a Loan",
            Self::Wizard => "Application",
            Self::Documents => "Upload Documents",
            Self::Sanction => "Sanction",
            Self::ThankYou => "Thank You",
        }
    }
}

/// Open OTP dialog for one field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtpDialog {
    pub field: &'static str,
    pub label: &'static str,
    pub challenge_id: ChallengeId,
    pub destination: String,
    pub input: String,
    /// Inline feedback such as a wrong-code message
    pub message: Option<(NoticeKind, String)>,
    /// Waiting for delivery or a verdict
    pub busy: bool,
}

impl OtpDialog {
    pub fn new(
        field: &'static str,
        label: &'static str,
        challenge_id: ChallengeId,
        destination: String,
    ) -> Self {
        Self {
            field,
            label,
            challenge_id,
            destination,
            input: String::new(),
            message: None,
            busy: true,
        }
    }

    pub fn set_info(&mut self, message: impl Into<String>) {
        self.message = Some((NoticeKind::Info, message.into()));
    }

    pub fn set_error(&mut self, message: impl Into<String>) {
        self.message = Some((NoticeKind::Error, message.into()));
    }

    #[cfg(test)]
    pub fn message_text(&self) -> Option<&str> {
        self.message.as_ref().map(|(_, text)| text.as_str())
    }

    /// Mask all but the last four characters of the destination
    pub fn masked_destination(&self) -> String {
        let chars: Vec<char> = self.destination.chars().collect();
        if self.destination.contains('@') || chars.len() <= 4 {
            return self.destination.clone();
        }
        let visible = chars.len() - 4;
        std::iter::repeat('*')
            .take(visible)
            .chain(chars[visible..].iter().copied())
            .collect()
    }
}

/// Path entry for a document upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadPrompt {
    pub document_id: String,
    pub path_input: String,
}

/// Main application state
pub struct AppState {
    // Navigation
    pub current_view: View,

    // Loan selection
    pub loan_cursor: usize,
    pub subtype_cursor: usize,
    pub choosing_subtype: bool,

    // Application
    pub wizard: Option<Wizard>,
    pub documents: DocumentTracker,
    pub document_cursor: usize,

    // Modals
    pub otp_dialog: Option<OtpDialog>,
    pub upload_prompt: Option<UploadPrompt>,
    pub error_queue: VecDeque<String>,

    // UI state
    pub notices: NoticeQueue,
    pub loading_until: Option<Instant>,
}

impl AppState {
    pub fn new(documents: DocumentTracker) -> Self {
        Self {
            current_view: View::default(),
            loan_cursor: 0,
            subtype_cursor: 0,
            choosing_subtype: false,
            wizard: None,
            documents,
            document_cursor: 0,
            otp_dialog: None,
            upload_prompt: None,
            error_queue: VecDeque::new(),
            notices: NoticeQueue::new(),
            loading_until: None,
        }
    }

    /// Queue a blocking error for the error dialog
    pub fn push_error(&mut self, message: impl Into<String>) {
        self.error_queue.push_back(message.into());
    }

    pub fn has_errors(&self) -> bool {
        !self.error_queue.is_empty()
    }

    pub fn current_error(&self) -> Option<&str> {
        self.error_queue.front().map(String::as_str)
    }

    pub fn dismiss_error(&mut self) {
        self.error_queue.pop_front();
    }

    /// Show the loader for `delay` from `now`
    pub fn start_loading(&mut self, now: Instant, delay: Duration) {
        self.loading_until = (!delay.is_zero()).then(|| now + delay);
    }

    pub fn is_loading(&self, now: Instant) -> bool {
        self.loading_until.is_some_and(|until| now < until)
    }

    /// Loan type under the cursor
    pub fn highlighted_loan(&self) -> LoanType {
        LoanType::ALL[self.loan_cursor % LoanType::ALL.len()]
    }

    pub fn highlighted_subtype(&self) -> VehicleSubtype {
        VehicleSubtype::ALL[self.subtype_cursor % VehicleSubtype::ALL.len()]
    }

    /// Selection made on the loan select screen
    pub fn highlighted_selection(&self) -> LoanSelection {
        let loan = self.highlighted_loan();
        let subtype = self.choosing_subtype.then(|| self.highlighted_subtype());
        LoanSelection::new(loan, subtype)
    }

    /// Move selection down
    pub fn move_selection_down(&mut self) {
        if self.choosing_subtype {
            if self.subtype_cursor + 1 < VehicleSubtype::ALL.len() {
                self.subtype_cursor += 1;
            }
        } else if self.loan_cursor + 1 < LoanType::ALL.len() {
            self.loan_cursor += 1;
        }
    }

    /// Move selection up
    pub fn move_selection_up(&mut self) {
        if self.choosing_subtype {
            self.subtype_cursor = self.subtype_cursor.saturating_sub(1);
        } else {
            self.loan_cursor = self.loan_cursor.saturating_sub(1);
        }
    }

    pub fn move_document_down(&mut self) {
        let count = self.documents.descriptors().len();
        if count > 0 && self.document_cursor < count - 1 {
            self.document_cursor += 1;
        }
    }

    pub fn move_document_up(&mut self) {
        self.document_cursor = self.document_cursor.saturating_sub(1);
    }

    /// Id of the document under the cursor
    pub fn selected_document_id(&self) -> Option<String> {
        self.documents
            .descriptors()
            .get(self.document_cursor)
            .map(|d| d.id.clone())
    }

    /// Applicant name captured during the wizard
    pub fn applicant_name(&self) -> Option<&str> {
        self.wizard
            .as_ref()
            .and_then(|w| w.session().get(super::SessionKey::FullName))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::default_checklist;
    use crate::state::DEFAULT_MAX_UPLOAD_BYTES;
    use uuid::Uuid;

    fn state() -> AppState {
        AppState::new(DocumentTracker::new(
            default_checklist(),
            DEFAULT_MAX_UPLOAD_BYTES,
        ))
    }

    mod errors {
        use super::*;

        #[test]
        fn test_errors_are_shown_in_order() {
            let mut state = state();
            assert!(!state.has_errors());
            state.push_error("first");
            state.push_error("second");
            assert_eq!(state.current_error(), Some("first"));
            state.dismiss_error();
            assert_eq!(state.current_error(), Some("second"));
            state.dismiss_error();
            assert!(!state.has_errors());
        }
    }

    mod loading {
        use super::*;

        #[test]
        fn test_loader_expires() {
            let mut state = state();
            let now = Instant::now();
            state.start_loading(now, Duration::from_millis(1000));
            assert!(state.is_loading(now + Duration::from_millis(999)));
            assert!(!state.is_loading(now + Duration::from_millis(1000)));
        }

        #[test]
        fn test_zero_delay_skips_loader() {
            let mut state = state();
            let now = Instant::now();
            state.start_loading(now, Duration::ZERO);
            assert!(!state.is_loading(now));
        }
    }

    mod selection {
        use super::*;

        #[test]
        fn test_loan_cursor_is_clamped() {
            let mut state = state();
            state.move_selection_up();
            assert_eq!(state.highlighted_loan(), LoanType::Home);
            for _ in 0..10 {
                state.move_selection_down();
            }
            assert_eq!(state.highlighted_loan(), LoanType::Education);
        }

        #[test]
        fn test_subtype_only_when_choosing() {
            let mut state = state();
            state.loan_cursor = 2;
            assert_eq!(state.highlighted_selection().subtype, Some(VehicleSubtype::FourWheeler));
            state.choosing_subtype = true;
            state.move_selection_down();
            assert_eq!(state.highlighted_selection().subtype, Some(VehicleSubtype::TwoWheeler));
        }

        #[test]
        fn test_document_cursor() {
            let mut state = state();
            assert_eq!(state.selected_document_id().as_deref(), Some("bankStatement"));
            for _ in 0..20 {
                state.move_document_down();
            }
            assert_eq!(state.selected_document_id().as_deref(), Some("latestPhoto"));
        }
    }

    mod otp_dialog {
        use super::*;

        #[test]
        fn test_mobile_destination_is_masked() {
            let dialog = OtpDialog::new("kycNumber", "KYC Number", Uuid::nil(), "9876543210".into());
            assert_eq!(dialog.masked_destination(), "******3210");
        }

        #[test]
        fn test_email_destination_is_shown() {
            let dialog = OtpDialog::new("email", "Email", Uuid::nil(), "a@b.in".into());
            assert_eq!(dialog.masked_destination(), "a@b.in");
        }

        #[test]
        fn test_latest_message_wins() {
            let mut dialog = OtpDialog::new("email", "Email", Uuid::nil(), "a@b.in".into());
            assert_eq!(dialog.message_text(), None);
            dialog.set_info("OTP sent to a@b.in");
            dialog.set_error("Incorrect OTP, 2 attempt(s) left");
            assert_eq!(dialog.message.as_ref().map(|(k, _)| *k), Some(NoticeKind::Error));
            assert_eq!(dialog.message_text(), Some("Incorrect OTP, 2 attempt(s) left"));
        }
    }
}

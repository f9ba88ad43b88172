//! Multi-step form orchestration
//!
//! The [`Wizard`] owns the form values of one application session. It
//! decides which fields each step shows, gates navigation on field
//! validity and OTP verification, and produces the snapshot submitted to
//! the backend when a step is committed.

use super::field::FormField;
use super::form_state::{Form, FormState};
use super::steps::{
    kyc_category, kyc_required_message, steps_for, FieldKind, FieldRule, FieldSpec, LoanSelection,
    OtpChannel, StepDefinition, StepId, ADDRESS_DIFFERS, FULL_NAME, KYC_DOCUMENT, KYC_NUMBER,
    MOBILE_NUMBER,
};
use super::validation::{check, FieldCategory, FieldError, ValidationPolicy};
use super::verification::{
    ChallengeHandle, ChallengeId, OtpPolicy, OtpSubmission, OtpVerdict, VerificationError,
    VerificationGate, VerificationStatus,
};
use crate::state::{Clock, Debouncer, SessionContext, SessionKey, DEFAULT_DEBOUNCE_WINDOW};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WizardError {
    #[error("Unknown field: {0}")]
    UnknownField(String),
    #[error("Step {0:?} is not part of this application")]
    UnknownStep(StepId),
    #[error("Step {requested:?} is not the current step ({current:?})")]
    NotCurrentStep { current: StepId, requested: StepId },
    #[error("Please complete the highlighted fields")]
    StepIncomplete(BTreeMap<String, String>),
    #[error("Step {0:?} is already being submitted")]
    CommitInFlight(StepId),
    #[error("Field {0} cannot be edited this way")]
    UnsupportedEdit(String),
    #[error("{value} is not an option for {field}")]
    InvalidChoice { field: String, value: String },
    #[error("Field {0} does not use OTP verification")]
    NotOtpGated(String),
    #[error(transparent)]
    Verification(#[from] VerificationError),
}

/// Tunables for a wizard session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WizardOptions {
    pub validation: ValidationPolicy,
    pub otp: OtpPolicy,
    pub debounce_window: Duration,
}

impl Default for WizardOptions {
    fn default() -> Self {
        Self {
            validation: ValidationPolicy::default(),
            otp: OtpPolicy::default(),
            debounce_window: DEFAULT_DEBOUNCE_WINDOW,
        }
    }
}

/// Snapshot of a step sent to the backend on commit
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepSubmission {
    pub step: StepId,
    pub loan: LoanSelection,
    pub customer_id: Option<String>,
    pub values: BTreeMap<String, String>,
}

/// Backend answer to a committed step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    Accepted,
    /// Backend refused the values
    Rejected {
        field_errors: HashMap<String, String>,
        message: Option<String>,
    },
    /// The request never got an answer
    Failed(String),
}

/// What applying a commit outcome did to the wizard
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitProgress {
    Advanced(StepId),
    /// The last step was accepted
    Completed,
    Blocked(String),
    /// No commit of that step was pending
    Ignored,
}

/// Where an OTP has to be sent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtpDispatch {
    pub field: &'static str,
    pub challenge_id: ChallengeId,
    pub channel: OtpChannel,
    pub destination: String,
    /// False when the request matched an already pending challenge
    pub is_new: bool,
}

fn new_field(spec: &FieldSpec) -> FormField {
    match spec.kind {
        FieldKind::Text { multiline } => FormField::text(spec.name, spec.label, multiline),
        FieldKind::Choice(options) => FormField::choice(spec.name, spec.label, options),
        FieldKind::Flag => FormField::flag(spec.name, spec.label),
    }
}

fn category_for(spec: &FieldSpec, form: &FormState) -> Option<FieldCategory> {
    match spec.rule {
        FieldRule::Presence => None,
        FieldRule::Fixed(category) => Some(category),
        FieldRule::KycDocumentNumber => Some(kyc_category(&form.value(KYC_DOCUMENT))),
    }
}

fn required_for(spec: &FieldSpec, form: &FormState) -> Option<String> {
    let message = spec.required?;
    match spec.rule {
        FieldRule::KycDocumentNumber => Some(kyc_required_message(
            form.get(KYC_DOCUMENT).and_then(FormField::as_choice),
        )),
        FieldRule::Presence | FieldRule::Fixed(_) => Some(message.to_string()),
    }
}

/// Orchestrates the steps of one loan application
pub struct Wizard {
    selection: LoanSelection,
    steps: Vec<StepDefinition>,
    form: FormState,
    gates: HashMap<&'static str, VerificationGate>,
    current_step: usize,
    active_field: usize,
    pending_commit: Option<StepId>,
    step_error: Option<String>,
    session: SessionContext,
    options: WizardOptions,
    kyc_debounce: Debouncer<String>,
    kyc_eligible: bool,
    clock: Arc<dyn Clock>,
}

impl Wizard {
    pub fn new(
        selection: LoanSelection,
        session: SessionContext,
        options: WizardOptions,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let mut wizard = Self {
            selection,
            steps: steps_for(&selection),
            form: FormState::new(),
            gates: HashMap::new(),
            current_step: 0,
            active_field: 0,
            pending_commit: None,
            step_error: None,
            session,
            options,
            kyc_debounce: Debouncer::new(options.debounce_window),
            kyc_eligible: false,
            clock,
        };
        wizard.populate();
        wizard
    }

    /// Create form fields and gates missing for the current step list
    fn populate(&mut self) {
        for spec in self.steps.iter().flat_map(|s| s.fields.iter()) {
            self.form.insert(new_field(spec));
            if spec.otp.is_some() && !self.gates.contains_key(spec.name) {
                let category = category_for(spec, &self.form).unwrap_or(FieldCategory::TextField);
                self.gates
                    .insert(spec.name, VerificationGate::new(category, self.options.otp));
            }
        }
    }

    pub fn selection(&self) -> LoanSelection {
        self.selection
    }

    pub fn steps(&self) -> &[StepDefinition] {
        &self.steps
    }

    pub fn current_step(&self) -> &StepDefinition {
        &self.steps[self.current_step]
    }

    pub fn current_index(&self) -> usize {
        self.current_step
    }

    pub fn is_last_step(&self) -> bool {
        self.current_step + 1 == self.steps.len()
    }

    pub fn pending_commit(&self) -> Option<StepId> {
        self.pending_commit
    }

    /// Blocking message from the last failed commit
    pub fn step_error(&self) -> Option<&str> {
        self.step_error.as_deref()
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    pub fn field(&self, name: &str) -> Option<&FormField> {
        self.form.get(name)
    }

    pub fn field_spec(&self, name: &str) -> Option<FieldSpec> {
        self.steps
            .iter()
            .flat_map(|s| s.fields.iter())
            .find(|f| f.name == name)
            .copied()
    }

    fn step_index(&self, step: StepId) -> Result<usize, WizardError> {
        self.steps
            .iter()
            .position(|s| s.id == step)
            .ok_or(WizardError::UnknownStep(step))
    }

    fn is_visible(&self, spec: &FieldSpec) -> bool {
        spec.visible_when
            .map_or(true, |flag| self.form.get(flag).is_some_and(FormField::as_flag))
    }

    fn visible_specs(&self, index: usize) -> Vec<FieldSpec> {
        self.steps
            .get(index)
            .map(|step| {
                step.fields
                    .iter()
                    .filter(|spec| self.is_visible(spec))
                    .copied()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Fields currently shown for a step
    pub fn step_fields(&self, step: StepId) -> Result<Vec<&FormField>, WizardError> {
        let index = self.step_index(step)?;
        Ok(self
            .visible_specs(index)
            .iter()
            .filter_map(|spec| self.form.get(spec.name))
            .collect())
    }

    fn evaluate(&self, spec: &FieldSpec) -> Result<(), FieldError> {
        let value = self.form.value(spec.name);
        check(
            &value,
            required_for(spec, &self.form).as_deref(),
            category_for(spec, &self.form),
            &self.options.validation,
        )?;
        let verified = self
            .gates
            .get(spec.name)
            .is_some_and(|gate| gate.is_verified_for(&value));
        if spec.otp.is_some() && !value.is_empty() && !verified {
            return Err(FieldError::Unverified(format!(
                "Please verify your {} with OTP",
                spec.label
            )));
        }
        Ok(())
    }

    /// Whether every visible field of the step is complete. Never mutates.
    pub fn can_advance(&self, step: StepId) -> bool {
        let Ok(index) = self.step_index(step) else {
            return false;
        };
        self.visible_specs(index)
            .iter()
            .all(|spec| self.evaluate(spec).is_ok())
    }

    /// Evaluate every field of the step, mark them touched and return the
    /// error message of each failing field
    pub fn trigger_validation(
        &mut self,
        step: StepId,
    ) -> Result<BTreeMap<String, String>, WizardError> {
        let index = self.step_index(step)?;
        let specs = self.steps[index].fields.clone();
        let mut errors = BTreeMap::new();
        for spec in specs {
            let visible = self.is_visible(&spec);
            let result = if visible { self.evaluate(&spec) } else { Ok(()) };
            if let Err(err) = &result {
                errors.insert(spec.name.to_string(), err.message().to_string());
            }
            if let Some(field) = self.form.get_mut(spec.name) {
                field.touched |= visible;
                field.error = result.err();
            }
        }
        Ok(errors)
    }

    /// Re-evaluate a touched field so its inline error tracks its value
    fn refresh(&mut self, name: &str) {
        let Some(spec) = self.field_spec(name) else {
            return;
        };
        if !self.form.get(name).is_some_and(|f| f.touched) {
            return;
        }
        let result = if self.is_visible(&spec) {
            self.evaluate(&spec)
        } else {
            Ok(())
        };
        if let Some(field) = self.form.get_mut(name) {
            field.error = result.err();
        }
    }

    fn touch(&mut self, name: &str) {
        if let Some(field) = self.form.get_mut(name) {
            field.touched = true;
        }
        self.refresh(name);
    }

    /// Check the current step and hand back the values to submit
    pub fn commit_step(&mut self, step: StepId) -> Result<StepSubmission, WizardError> {
        let index = self.step_index(step)?;
        if index != self.current_step {
            return Err(WizardError::NotCurrentStep {
                current: self.steps[self.current_step].id,
                requested: step,
            });
        }
        if self.pending_commit == Some(step) {
            return Err(WizardError::CommitInFlight(step));
        }
        let errors = self.trigger_validation(step)?;
        if !errors.is_empty() {
            return Err(WizardError::StepIncomplete(errors));
        }

        let values: BTreeMap<String, String> = self
            .visible_specs(index)
            .iter()
            .map(|spec| (spec.name.to_string(), self.form.value(spec.name)))
            .collect();
        if let Some(name) = values.get(FULL_NAME) {
            self.session.set(SessionKey::FullName, name.as_str());
        }
        if let Some(mobile) = values.get(MOBILE_NUMBER) {
            self.session.set(SessionKey::MobileForOtp, mobile.as_str());
        }

        self.pending_commit = Some(step);
        self.step_error = None;
        info!(step = ?step, fields = values.len(), "committing step");
        Ok(StepSubmission {
            step,
            loan: self.selection,
            customer_id: self.session.get(SessionKey::CustomerId).map(str::to_string),
            values,
        })
    }

    /// Apply the backend answer for a committed step
    pub fn complete_commit(&mut self, step: StepId, outcome: CommitOutcome) -> CommitProgress {
        if self.pending_commit != Some(step) {
            debug!(step = ?step, "ignoring result for a step with no pending commit");
            return CommitProgress::Ignored;
        }
        self.pending_commit = None;
        match outcome {
            CommitOutcome::Accepted => {
                if self.is_last_step() {
                    return CommitProgress::Completed;
                }
                self.current_step += 1;
                self.active_field = 0;
                CommitProgress::Advanced(self.steps[self.current_step].id)
            }
            CommitOutcome::Rejected {
                field_errors,
                message,
            } => {
                for (name, error) in field_errors {
                    if let Some(field) = self.form.get_mut(&name) {
                        field.touched = true;
                        field.error = Some(FieldError::Format(error));
                    }
                }
                let message =
                    message.unwrap_or_else(|| "Please correct the highlighted fields".to_string());
                self.step_error = Some(message.clone());
                CommitProgress::Blocked(message)
            }
            CommitOutcome::Failed(reason) => {
                self.step_error = Some(reason.clone());
                CommitProgress::Blocked(reason)
            }
        }
    }

    /// Step back without validating. Returns false on the first step.
    pub fn go_back(&mut self) -> bool {
        if self.current_step == 0 {
            return false;
        }
        self.pending_commit = None;
        self.step_error = None;
        self.current_step -= 1;
        self.active_field = 0;
        true
    }

    /// Switch loan type. Fields shared with the new step list keep their
    /// values; the rest are dropped.
    pub fn change_selection(&mut self, selection: LoanSelection) {
        if selection == self.selection {
            return;
        }
        self.selection = selection;
        self.steps = steps_for(&selection);
        let names: Vec<&'static str> = self
            .steps
            .iter()
            .flat_map(|s| s.field_names())
            .collect();
        self.form.retain(|name| names.iter().any(|n| *n == name));
        self.gates.retain(|name, _| names.contains(name));
        self.populate();
        self.current_step = 0;
        self.active_field = 0;
        self.pending_commit = None;
        self.step_error = None;
        info!(loan = %selection, steps = self.steps.len(), "loan selection changed");
    }

    /// Drop every value and start again from the first step
    pub fn reset(&mut self) {
        self.form.clear();
        self.gates.clear();
        self.populate();
        self.current_step = 0;
        self.active_field = 0;
        self.pending_commit = None;
        self.step_error = None;
        self.kyc_debounce.cancel();
        self.kyc_eligible = false;
    }

    fn after_edit(&mut self, name: &str) {
        let value = self.form.value(name);
        if let Some(gate) = self.gates.get_mut(name) {
            if gate.invalidate_on_edit(&value) {
                debug!(field = name, "verification dropped after edit");
            }
        }
        match name {
            KYC_DOCUMENT => self.kyc_document_changed(),
            KYC_NUMBER => {
                self.kyc_eligible = false;
                if value.is_empty() {
                    self.kyc_debounce.cancel();
                } else {
                    self.kyc_debounce.schedule(value, self.clock.now());
                }
            }
            _ => {}
        }
        self.refresh(name);
        if name == ADDRESS_DIFFERS {
            let dependents: Vec<&'static str> = self
                .steps
                .iter()
                .flat_map(|s| s.fields.iter())
                .filter(|f| f.visible_when == Some(ADDRESS_DIFFERS))
                .map(|f| f.name)
                .collect();
            for dependent in dependents {
                self.refresh(dependent);
            }
            self.active_field = self
                .active_field
                .min(self.field_count().saturating_sub(1));
        }
    }

    fn kyc_document_changed(&mut self) {
        if let Some(field) = self.form.get_mut(KYC_NUMBER) {
            field.clear();
        }
        let category = kyc_category(&self.form.value(KYC_DOCUMENT));
        if let Some(gate) = self.gates.get_mut(KYC_NUMBER) {
            gate.set_category(category);
            gate.reset();
        }
        self.kyc_debounce.cancel();
        self.kyc_eligible = false;
    }

    /// Values are frozen while their step is being submitted
    fn ensure_editable(&self) -> Result<(), WizardError> {
        match self.pending_commit {
            Some(step) => Err(WizardError::CommitInFlight(step)),
            None => Ok(()),
        }
    }

    /// Replace a text field's value
    pub fn set_text(&mut self, name: &str, value: impl Into<String>) -> Result<(), WizardError> {
        self.ensure_editable()?;
        let field = self
            .form
            .get_mut(name)
            .ok_or_else(|| WizardError::UnknownField(name.to_string()))?;
        if field.is_choice() || field.is_flag() {
            return Err(WizardError::UnsupportedEdit(name.to_string()));
        }
        let value = value.into();
        if field.as_text() == value {
            return Ok(());
        }
        field.set_text(value);
        self.after_edit(name);
        Ok(())
    }

    pub fn select_choice(&mut self, name: &str, value: &str) -> Result<(), WizardError> {
        self.ensure_editable()?;
        let field = self
            .form
            .get_mut(name)
            .ok_or_else(|| WizardError::UnknownField(name.to_string()))?;
        if !field.is_choice() {
            return Err(WizardError::UnsupportedEdit(name.to_string()));
        }
        if field.as_choice() == Some(value) {
            return Ok(());
        }
        if !field.select(value) {
            return Err(WizardError::InvalidChoice {
                field: name.to_string(),
                value: value.to_string(),
            });
        }
        self.after_edit(name);
        Ok(())
    }

    /// Flip a flag field, returning its new value
    pub fn toggle_flag(&mut self, name: &str) -> Result<bool, WizardError> {
        self.ensure_editable()?;
        let field = self
            .form
            .get_mut(name)
            .ok_or_else(|| WizardError::UnknownField(name.to_string()))?;
        if !field.is_flag() {
            return Err(WizardError::UnsupportedEdit(name.to_string()));
        }
        field.toggle();
        let value = field.as_flag();
        self.after_edit(name);
        Ok(value)
    }

    /// Empty a field so it can be re-entered. Drops any verification.
    pub fn clear_field(&mut self, name: &str) -> Result<(), WizardError> {
        self.ensure_editable()?;
        let field = self
            .form
            .get_mut(name)
            .ok_or_else(|| WizardError::UnknownField(name.to_string()))?;
        field.clear();
        self.after_edit(name);
        Ok(())
    }

    /// Name of the field under the cursor
    pub fn active_field_name(&self) -> Option<&'static str> {
        self.visible_specs(self.current_step)
            .get(self.active_field)
            .map(|spec| spec.name)
    }

    /// Verified fields take no keystrokes until cleared
    pub fn is_locked(&self, name: &str) -> bool {
        let value = self.form.value(name);
        self.gates
            .get(name)
            .is_some_and(|gate| gate.is_verified_for(&value))
    }

    fn editable_active(&self) -> Option<&'static str> {
        self.active_field_name().filter(|name| !self.is_locked(name))
    }

    /// Type a character into the active text field
    pub fn push_char(&mut self, c: char) -> bool {
        let Some(name) = self.editable_active() else {
            return false;
        };
        let Some(field) = self.form.get(name).filter(|f| !f.is_choice() && !f.is_flag()) else {
            return false;
        };
        let mut value = field.as_text().to_string();
        value.push(c);
        self.set_text(name, value).is_ok()
    }

    /// Delete the last character of the active text field
    pub fn pop_char(&mut self) -> bool {
        let Some(name) = self.editable_active() else {
            return false;
        };
        let Some(field) = self.form.get(name).filter(|f| !f.is_choice() && !f.is_flag()) else {
            return false;
        };
        let mut value = field.as_text().to_string();
        if value.pop().is_none() {
            return false;
        }
        self.set_text(name, value).is_ok()
    }

    /// Move the active choice field to its next or previous option
    pub fn cycle_active_choice(&mut self, forward: bool) -> bool {
        let Some(name) = self.active_field_name() else {
            return false;
        };
        let Some(field) = self.form.get(name).filter(|f| f.is_choice()) else {
            return false;
        };
        let mut probe = field.clone();
        match probe.cycle_choice(forward) {
            Some(value) => self.select_choice(name, value).is_ok(),
            None => false,
        }
    }

    /// Toggle the active field if it is a flag
    pub fn toggle_active(&mut self) -> bool {
        match self.active_field_name() {
            Some(name) => self.toggle_flag(name).is_ok(),
            None => false,
        }
    }

    fn otp_channel(&self, name: &str) -> Result<OtpChannel, WizardError> {
        let spec = self
            .field_spec(name)
            .ok_or_else(|| WizardError::UnknownField(name.to_string()))?;
        spec.otp
            .ok_or_else(|| WizardError::NotOtpGated(name.to_string()))
    }

    fn gate_mut(&mut self, name: &str) -> Result<&mut VerificationGate, WizardError> {
        self.gates
            .get_mut(name)
            .ok_or_else(|| WizardError::NotOtpGated(name.to_string()))
    }

    fn destination(&self, channel: OtpChannel, value: &str) -> Result<String, VerificationError> {
        match channel {
            OtpChannel::Email => Ok(value.to_string()),
            OtpChannel::RegisteredMobile => self
                .session
                .get(SessionKey::MobileForOtp)
                .map(str::to_string)
                .or_else(|| Some(self.form.value(MOBILE_NUMBER)).filter(|m| !m.is_empty()))
                .ok_or_else(|| {
                    VerificationError::NotEligible(
                        "Add a mobile number to receive the OTP".to_string(),
                    )
                }),
        }
    }

    fn dispatch(
        &mut self,
        name: &str,
        channel: OtpChannel,
        id: ChallengeId,
        value: &str,
        is_new: bool,
    ) -> Result<OtpDispatch, WizardError> {
        let destination = match self.destination(channel, value) {
            Ok(destination) => destination,
            Err(err) => {
                self.gate_mut(name)?.cancel();
                return Err(err.into());
            }
        };
        let field = self
            .field_spec(name)
            .map(|spec| spec.name)
            .ok_or_else(|| WizardError::UnknownField(name.to_string()))?;
        Ok(OtpDispatch {
            field,
            challenge_id: id,
            channel,
            destination,
            is_new,
        })
    }

    /// Open a challenge for the field's current value. The KYC number is
    /// refused until its debounced check has settled.
    pub fn request_otp(&mut self, name: &str) -> Result<OtpDispatch, WizardError> {
        let channel = self.otp_channel(name)?;
        let value = self.form.value(name);
        let settling = name == KYC_NUMBER
            && !self.kyc_eligible
            && self.gates.get(name).is_some_and(|gate| gate.is_eligible(&value));
        if settling {
            return Err(VerificationError::NotEligible(
                "Checking the number, try again in a moment".to_string(),
            )
            .into());
        }
        let now = self.clock.now();
        let ticket = self.gate_mut(name)?.request_challenge(&value, now)?;
        self.dispatch(name, channel, ticket.id, &ticket.value, ticket.is_new)
    }

    /// Issue a fresh challenge for the pending value
    pub fn resend_otp(&mut self, name: &str) -> Result<OtpDispatch, WizardError> {
        let channel = self.otp_channel(name)?;
        let now = self.clock.now();
        let ticket = self.gate_mut(name)?.resend_challenge(now)?;
        self.dispatch(name, channel, ticket.id, &ticket.value, ticket.is_new)
    }

    pub fn otp_delivered(
        &mut self,
        name: &str,
        id: ChallengeId,
        result: Result<ChallengeHandle, String>,
    ) -> Result<(), WizardError> {
        Ok(self.gate_mut(name)?.delivery_resolved(id, result)?)
    }

    pub fn submit_otp(
        &mut self,
        name: &str,
        id: ChallengeId,
        code: &str,
    ) -> Result<OtpSubmission, WizardError> {
        let now = self.clock.now();
        Ok(self.gate_mut(name)?.submit_response(id, code, now)?)
    }

    /// Apply a verdict. Entering Verified re-validates dependent fields.
    pub fn otp_resolved(
        &mut self,
        name: &str,
        id: ChallengeId,
        verdict: OtpVerdict,
    ) -> Result<(), WizardError> {
        let spec = self
            .field_spec(name)
            .ok_or_else(|| WizardError::UnknownField(name.to_string()))?;
        self.gate_mut(name)?.response_resolved(id, verdict)?;
        info!(field = name, "field verified");
        if let Some(field) = self.form.get_mut(name) {
            field.error = None;
        }
        for dependent in spec.revalidate_on_verify {
            if let Some(field) = self.form.get_mut(dependent) {
                field.touched |= !field.raw_value().trim().is_empty();
            }
            self.refresh(dependent);
        }
        Ok(())
    }

    /// The code submission never reached a verdict
    pub fn otp_failed(&mut self, name: &str, id: ChallengeId) -> Result<(), WizardError> {
        Ok(self.gate_mut(name)?.response_failed(id)?)
    }

    /// Close the OTP dialog for a field. Returns true if a challenge was dropped.
    pub fn cancel_otp(&mut self, name: &str) -> Result<bool, WizardError> {
        Ok(self.gate_mut(name)?.cancel())
    }

    pub fn verification_status(&self, name: &str) -> Option<&VerificationStatus> {
        self.gates.get(name).map(VerificationGate::status)
    }

    /// Whether the OTP button for a field should be enabled. The KYC
    /// number only becomes eligible once its debounce window settles.
    pub fn is_eligible(&self, name: &str) -> bool {
        if name == KYC_NUMBER {
            return self.kyc_eligible;
        }
        let value = self.form.value(name);
        self.gates
            .get(name)
            .is_some_and(|gate| gate.is_eligible(&value))
    }

    /// Release the debounced KYC number check. Returns the new eligibility
    /// when the window has elapsed.
    pub fn poll_debounce(&mut self) -> Option<bool> {
        let settled = self.kyc_debounce.poll(self.clock.now())?;
        let current = self.form.value(KYC_NUMBER);
        self.kyc_eligible = settled == current
            && self
                .gates
                .get(KYC_NUMBER)
                .is_some_and(|gate| gate.is_eligible(&current));
        debug!(eligible = self.kyc_eligible, "kyc number settled");
        Some(self.kyc_eligible)
    }
}

impl Form for Wizard {
    fn field_count(&self) -> usize {
        self.visible_specs(self.current_step).len()
    }

    fn active_field(&self) -> usize {
        self.active_field
    }

    /// Leaving a field marks it touched so its error shows
    fn set_active_field(&mut self, index: usize) {
        if let Some(name) = self.active_field_name() {
            self.touch(name);
        }
        self.active_field = index;
    }

    fn get_field(&self, index: usize) -> Option<&FormField> {
        let name = self.visible_specs(self.current_step).get(index)?.name;
        self.form.get(name)
    }
}

//! Modal dialog host.
//!
//! One dialog is shown at a time. A dialog resolves exactly once, to
//! `DialogOutcome::Confirmed(values)` or `DialogOutcome::Cancelled`.
//! Confirming runs every field validator first; a rejected submission
//! leaves the dialog open so the user can correct it.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

pub type DialogTicket = u64;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("field '{field}' rejected value '{value}'")]
    FieldRejected { field: String, value: String },

    #[error("dialog {0} is not open")]
    UnknownTicket(DialogTicket),
}

pub struct FormField {
    pub id:            String,
    pub placeholder:   String,
    pub default_value: String,
    validator:         fn(&str) -> bool,
}

impl FormField {
    pub fn new(id: &str, placeholder: &str, default_value: String, validator: fn(&str) -> bool) -> Self {
        Self {
            id: id.to_string(),
            placeholder: placeholder.to_string(),
            default_value,
            validator,
        }
    }

    pub fn accepts(&self, value: &str) -> bool {
        (self.validator)(value)
    }
}

impl std::fmt::Debug for FormField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormField")
            .field("id", &self.id)
            .field("placeholder", &self.placeholder)
            .field("default_value", &self.default_value)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonStyle {
    Good,
    Bad,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hotkey {
    Enter,
    Escape,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogButton {
    pub id:     String,
    pub style:  ButtonStyle,
    pub hotkey: Option<Hotkey>,
}

impl DialogButton {
    /// Parse the `id:style:hotkey` shorthand, e.g. `"ok:good:enter"`.
    pub fn parse(shorthand: &str) -> Self {
        let mut parts = shorthand.split(':');
        let id = parts.next().unwrap_or_default().to_string();
        let style = match parts.next() {
            Some("bad") => ButtonStyle::Bad,
            _ => ButtonStyle::Good,
        };
        let hotkey = match parts.next() {
            Some("enter") => Some(Hotkey::Enter),
            Some("escape") => Some(Hotkey::Escape),
            _ => None,
        };
        Self { id, style, hotkey }
    }
}

#[derive(Debug)]
pub struct Dialog {
    pub title:        String,
    pub description:  String,
    pub fields:       Vec<FormField>,
    pub buttons:      Vec<DialogButton>,
    pub close_button: bool,
}

/// Field values of a confirmed dialog, keyed by field id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormValues(BTreeMap<String, String>);

impl FormValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: &str, value: &str) -> Self {
        self.0.insert(field.to_string(), value.to_string());
        self
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogOutcome {
    Confirmed(FormValues),
    Cancelled,
}

#[derive(Debug, Default)]
pub struct DialogHost {
    next_ticket: DialogTicket,
    open:        Option<(DialogTicket, Dialog)>,
}

impl DialogHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Show a dialog, replacing nothing: callers must wait for the open
    /// one to resolve first.
    pub fn show(&mut self, dialog: Dialog) -> DialogTicket {
        debug_assert!(self.open.is_none(), "a dialog is already open");
        self.next_ticket += 1;
        let ticket = self.next_ticket;
        log::debug!("dialog: showing #{ticket} '{}'", dialog.title);
        self.open = Some((ticket, dialog));
        ticket
    }

    pub fn current(&self) -> Option<(DialogTicket, &Dialog)> {
        self.open.as_ref().map(|(t, d)| (*t, d))
    }

    pub fn is_open(&self) -> bool {
        self.open.is_some()
    }

    /// Press the confirm button. Fields missing from `values` keep their
    /// default text. Any rejected field keeps the dialog open.
    pub fn submit(
        &mut self,
        ticket: DialogTicket,
        values: &FormValues,
    ) -> Result<DialogOutcome, ValidationError> {
        let dialog = self.open_dialog(ticket)?;

        let mut accepted = FormValues::new();
        for field in &dialog.fields {
            let value = values.get(&field.id).unwrap_or(field.default_value.as_str());
            if !field.accepts(value) {
                return Err(ValidationError::FieldRejected {
                    field: field.id.clone(),
                    value: value.to_string(),
                });
            }
            accepted = accepted.with(&field.id, value);
        }

        self.open = None;
        Ok(DialogOutcome::Confirmed(accepted))
    }

    /// Press the cancel button.
    pub fn cancel(&mut self, ticket: DialogTicket) -> Result<DialogOutcome, ValidationError> {
        self.open_dialog(ticket)?;
        self.open = None;
        Ok(DialogOutcome::Cancelled)
    }

    fn open_dialog(&self, ticket: DialogTicket) -> Result<&Dialog, ValidationError> {
        match &self.open {
            Some((t, dialog)) if *t == ticket => Ok(dialog),
            _ => Err(ValidationError::UnknownTicket(ticket)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn positive(v: &str) -> bool {
        v.trim().parse::<i64>().map(|n| n > 0).unwrap_or(false)
    }

    fn sample_dialog() -> Dialog {
        Dialog {
            title: "Test".into(),
            description: String::new(),
            fields: vec![FormField::new("n", "N", "4".into(), positive)],
            buttons: vec![DialogButton::parse("cancel:bad:escape"), DialogButton::parse("ok:good:enter")],
            close_button: false,
        }
    }

    #[test]
    fn button_shorthand_parses() {
        let button = DialogButton::parse("cancel:bad:escape");
        assert_eq!(button.id, "cancel");
        assert_eq!(button.style, ButtonStyle::Bad);
        assert_eq!(button.hotkey, Some(Hotkey::Escape));
    }

    #[test]
    fn rejected_submission_keeps_dialog_open() {
        let mut host = DialogHost::new();
        let ticket = host.show(sample_dialog());

        let err = host.submit(ticket, &FormValues::new().with("n", "0")).unwrap_err();
        assert_eq!(err, ValidationError::FieldRejected { field: "n".into(), value: "0".into() });
        assert!(host.is_open());

        let outcome = host.submit(ticket, &FormValues::new().with("n", "9")).unwrap();
        assert_eq!(outcome, DialogOutcome::Confirmed(FormValues::new().with("n", "9")));
        assert!(!host.is_open());
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let mut host = DialogHost::new();
        let ticket = host.show(sample_dialog());
        let outcome = host.submit(ticket, &FormValues::new()).unwrap();
        assert_eq!(outcome, DialogOutcome::Confirmed(FormValues::new().with("n", "4")));
    }

    #[test]
    fn dialog_resolves_only_once() {
        let mut host = DialogHost::new();
        let ticket = host.show(sample_dialog());
        assert_eq!(host.cancel(ticket), Ok(DialogOutcome::Cancelled));
        assert_eq!(host.cancel(ticket), Err(ValidationError::UnknownTicket(ticket)));
    }
}

//! Local, in-place lead edits.
//!
//! Edits are never re-normalised: changing the manager leaves tags alone,
//! and flipping a pipeline flag neither re-runs stage inference nor touches
//! the stored score. Callers decide when to call [`Lead::refresh_score`].

use std::str::FromStr;

use crate::CoreError;
use crate::lead::{Lead, NO_NOTES, PipelineFlag, UNASSIGNED, UNKNOWN_COMPANY, UNKNOWN_CONTACT};
use crate::resolve::canonical_key;

/// Free-text lead fields that can be edited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextField {
    Customer,
    Contact,
    Manager,
    StrategicOwner,
    DeliveryLead,
    Origin,
    Notes,
    LogoUrl,
    LinkedinUrl,
    SlidesUrl,
}

impl FromStr for TextField {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let field = match canonical_key(s).as_str() {
            "customer" | "company" => Self::Customer,
            "contact" => Self::Contact,
            "manager" => Self::Manager,
            "strategic" | "strategicowner" => Self::StrategicOwner,
            "delivery" | "deliverylead" => Self::DeliveryLead,
            "origin" | "leadorigin" => Self::Origin,
            "notes" | "progress" => Self::Notes,
            "logo" | "logourl" => Self::LogoUrl,
            "linkedin" | "linkedinurl" => Self::LinkedinUrl,
            "slides" | "slidesurl" => Self::SlidesUrl,
            _ => return Err(CoreError::UnknownField(s.to_string())),
        };
        Ok(field)
    }
}

/// A single-field change to a lead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeadEdit {
    Text(TextField, String),
    /// Reset a field to unset: `None` for optional fields, the sentinel
    /// for required ones.
    Clear(TextField),
    Flag(PipelineFlag, bool),
}

impl LeadEdit {
    /// Edit that flips `flag` on `lead`.
    pub fn toggle(lead: &Lead, flag: PipelineFlag) -> Self {
        Self::Flag(flag, !lead.pipeline.get(flag))
    }

    /// Whether applying this edit can leave the stored score stale.
    pub fn affects_score(&self) -> bool {
        matches!(self, Self::Flag(..))
    }
}

impl Lead {
    /// Apply `edit` in place and return the edit that undoes it.
    ///
    /// Blank text falls back to the same sentinels normalisation uses, so
    /// required fields never become empty.
    pub fn apply(&mut self, edit: LeadEdit) -> LeadEdit {
        match edit {
            LeadEdit::Flag(flag, value) => {
                let previous = self.pipeline.get(flag);
                self.pipeline.set(flag, value);
                LeadEdit::Flag(flag, previous)
            }
            LeadEdit::Text(field, value) => {
                let undo = self.undo_text(field);
                self.set_text(field, value.trim());
                undo
            }
            LeadEdit::Clear(field) => {
                let undo = self.undo_text(field);
                match field {
                    TextField::DeliveryLead => self.delivery_lead = None,
                    other => self.set_text(other, ""),
                }
                undo
            }
        }
    }

    /// Edit that restores the current value of `field`.
    fn undo_text(&self, field: TextField) -> LeadEdit {
        match field {
            TextField::DeliveryLead if self.delivery_lead.is_none() => LeadEdit::Clear(field),
            _ => LeadEdit::Text(field, self.text(field)),
        }
    }

    /// Current value of a text field; unset optional fields read as "".
    pub fn text(&self, field: TextField) -> String {
        match field {
            TextField::Customer => self.customer.clone(),
            TextField::Contact => self.contact.clone(),
            TextField::Manager => self.manager.clone(),
            TextField::StrategicOwner => self.strategic_owner.clone(),
            TextField::DeliveryLead => self.delivery_lead.clone().unwrap_or_default(),
            TextField::Origin => self.origin.clone(),
            TextField::Notes => self.notes.clone(),
            TextField::LogoUrl => self.logo_url.clone().unwrap_or_default(),
            TextField::LinkedinUrl => self.linkedin_url.clone().unwrap_or_default(),
            TextField::SlidesUrl => self.slides_url.clone().unwrap_or_default(),
        }
    }

    fn set_text(&mut self, field: TextField, value: &str) {
        let or_sentinel = |sentinel: &str| {
            if value.is_empty() {
                sentinel.to_string()
            } else {
                value.to_string()
            }
        };
        let optional = || (!value.is_empty()).then(|| value.to_string());
        match field {
            TextField::Customer => self.customer = or_sentinel(UNKNOWN_COMPANY),
            TextField::Contact => self.contact = or_sentinel(UNKNOWN_CONTACT),
            TextField::Manager => self.manager = or_sentinel(UNASSIGNED),
            TextField::StrategicOwner => self.strategic_owner = or_sentinel(UNASSIGNED),
            TextField::DeliveryLead => self.delivery_lead = Some(or_sentinel(UNASSIGNED)),
            TextField::Origin => self.origin = value.to_string(),
            TextField::Notes => self.notes = or_sentinel(NO_NOTES),
            TextField::LogoUrl => self.logo_url = optional(),
            TextField::LinkedinUrl => self.linkedin_url = optional(),
            TextField::SlidesUrl => self.slides_url = optional(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize;
    use crate::resolve::RawRow;
    use serde_json::json;

    fn acme() -> Lead {
        let row: RawRow = serde_json::from_value(json!({
            "Customer": "Acme",
            "Manager": "Jane",
            "Origin": "Expo",
            "NDA Signed": "yes",
        }))
        .unwrap();
        normalize(&row, 0)
    }

    #[test]
    fn toggle_does_not_recompute_score() {
        let mut lead = acme();
        assert_eq!((lead.score, lead.progress), (10, 6));

        let edit = LeadEdit::toggle(&lead, PipelineFlag::ContractSigned);
        assert_eq!(edit, LeadEdit::Flag(PipelineFlag::ContractSigned, true));
        lead.apply(edit);

        assert!(lead.pipeline.contract_signed);
        assert_eq!((lead.score, lead.progress), (10, 6));
        assert!(!lead.score_is_current());

        lead.refresh_score();
        assert_eq!((lead.score, lead.progress), (60, 38));
        assert!(lead.score_is_current());
    }

    #[test]
    fn toggle_does_not_rerun_stage_inference() {
        let mut lead = acme();
        lead.apply(LeadEdit::Flag(PipelineFlag::LoiSigned, true));
        assert!(!lead.pipeline.loi_issued);
        assert!(!lead.pipeline.verbal_agreement);
    }

    #[test]
    fn text_edit_leaves_tags_alone() {
        let mut lead = acme();
        let tags = lead.tags.clone();
        lead.apply(LeadEdit::Text(TextField::Origin, "Referral".into()));
        assert_eq!(lead.origin, "Referral");
        assert_eq!(lead.tags, tags);
    }

    #[test]
    fn inverse_restores_previous_value() {
        let mut lead = acme();
        let before = lead.clone();
        let undo = lead.apply(LeadEdit::Text(TextField::Manager, "Bob".into()));
        assert_eq!(lead.manager, "Bob");
        lead.apply(undo);
        assert_eq!(lead, before);

        let undo = lead.apply(LeadEdit::Text(TextField::LogoUrl, "https://x/logo.png".into()));
        assert_eq!(lead.logo_url.as_deref(), Some("https://x/logo.png"));
        lead.apply(undo);
        assert_eq!(lead.logo_url, None);

        let undo = lead.apply(LeadEdit::Flag(PipelineFlag::NdaSigned, false));
        lead.apply(undo);
        assert!(lead.pipeline.nda_signed);
    }

    #[test]
    fn blank_delivery_edit_is_unassigned_not_absent() {
        let mut lead = acme();
        assert_eq!(lead.delivery_lead, None);

        let undo = lead.apply(LeadEdit::Text(TextField::DeliveryLead, " ".into()));
        assert_eq!(lead.delivery_lead.as_deref(), Some(UNASSIGNED));
        assert_eq!(undo, LeadEdit::Clear(TextField::DeliveryLead));

        lead.apply(undo);
        assert_eq!(lead.delivery_lead, None);

        lead.apply(LeadEdit::Text(TextField::DeliveryLead, "Sam".into()));
        let undo = lead.apply(LeadEdit::Clear(TextField::DeliveryLead));
        assert_eq!(lead.delivery_lead, None);
        lead.apply(undo);
        assert_eq!(lead.delivery_lead.as_deref(), Some("Sam"));
    }

    #[test]
    fn blank_text_uses_sentinels() {
        let mut lead = acme();
        lead.apply(LeadEdit::Text(TextField::Customer, "  ".into()));
        lead.apply(LeadEdit::Text(TextField::Notes, String::new()));
        lead.apply(LeadEdit::Text(TextField::Manager, String::new()));
        assert_eq!(lead.customer, UNKNOWN_COMPANY);
        assert_eq!(lead.notes, NO_NOTES);
        assert_eq!(lead.manager, UNASSIGNED);
    }

    #[test]
    fn field_names_parse() {
        assert_eq!("Strategic Owner".parse::<TextField>().unwrap(), TextField::StrategicOwner);
        assert_eq!("linkedin".parse::<TextField>().unwrap(), TextField::LinkedinUrl);
        assert_eq!(
            "score".parse::<TextField>(),
            Err(CoreError::UnknownField("score".into()))
        );
    }

    #[test]
    fn affects_score() {
        assert!(LeadEdit::Flag(PipelineFlag::PptsShared, true).affects_score());
        assert!(!LeadEdit::Text(TextField::Notes, "x".into()).affects_score());
    }
}

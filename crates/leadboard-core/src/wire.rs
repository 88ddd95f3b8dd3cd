//! Wire types exchanged with the sheet endpoint on save.

use serde::{Deserialize, Serialize};

use crate::lead::Lead;

/// Body of a save POST: the full editable projection of one lead.
///
/// Field names are the keys the sheet script reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveRequest {
    pub customer: String,
    pub notes: String,
    pub logo: String,
    pub linkedin: String,
    pub slides: String,
    pub contact: String,
    pub manager: String,
    pub strategic: String,
    pub delivery: String,
    pub ppts: bool,
    pub verbal: bool,
    pub nda: bool,
    pub loi_issued: bool,
    pub loi_signed: bool,
    pub contract: bool,
    pub parts: bool,
}

impl From<&Lead> for SaveRequest {
    fn from(lead: &Lead) -> Self {
        let p = &lead.pipeline;
        Self {
            customer: lead.customer.clone(),
            notes: lead.notes.clone(),
            logo: lead.logo_url.clone().unwrap_or_default(),
            linkedin: lead.linkedin_url.clone().unwrap_or_default(),
            slides: lead.slides_url.clone().unwrap_or_default(),
            contact: lead.contact.clone(),
            manager: lead.manager.clone(),
            strategic: lead.strategic_owner.clone(),
            delivery: lead.delivery_lead.clone().unwrap_or_default(),
            ppts: p.ppts_shared,
            verbal: p.verbal_agreement,
            nda: p.nda_signed,
            loi_issued: p.loi_issued,
            loi_signed: p.loi_signed,
            contract: p.contract_signed,
            parts: p.parts_received,
        }
    }
}

/// Acknowledgement returned by the sheet script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveAck {
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
}

impl SaveAck {
    pub fn success() -> Self {
        Self {
            status: "success".to_string(),
            message: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status.eq_ignore_ascii_case("success")
    }
}

//! Row → [`Lead`] normalisation.
//!
//! Every field degrades to a documented default instead of failing: the
//! sheet is edited by hand and headers, blanks and formats drift freely.

use chrono::{DateTime, NaiveDate, Utc};
use tracing::{debug, info};

use crate::lead::{
    self, Lead, LeadId, LeadType, NO_NOTES, Pipeline, PipelineFlag, Tag, TagKind, UNASSIGNED,
    UNKNOWN_COMPANY, UNKNOWN_CONTACT,
};
use crate::resolve::{RawRow, has_field, resolve, resolve_bool, resolve_text, value_text};

// ── Header hints ──

const CUSTOMER: &[&str] = &["Customer", "Company", "Customer Name", "Client", "Account"];
const CONTACT: &[&str] = &["Contact", "Contact Name", "Point of Contact"];
const MANAGER: &[&str] = &["Manager", "Account Manager", "Lead Manager"];
const STRATEGIC: &[&str] = &["Strategic Owner", "Strategic"];
const DELIVERY: &[&str] = &["Delivery Lead", "Delivery"];
const ORIGIN: &[&str] = &["Lead Origin", "Origin", "Source"];
const LEAD_TYPE: &[&str] = &["Lead Type", "Type", "Category", "Classification"];
const NOTES: &[&str] = &[
    "Current Progress",
    "Progress Notes",
    "Notes",
    "Progress",
    "Comments",
];
const STAGE: &[&str] = &["Stage", "Status", "Pipeline Stage"];
const INTRO: &[&str] = &["Introductory Meeting", "Intro Meeting", "Intro"];
const WEEKLY: &[&str] = &["Weekly Calls", "Weekly Call", "Weekly"];
const LOGO: &[&str] = &["Logo", "Logo URL"];
const LINKEDIN: &[&str] = &["LinkedIn", "LinkedIn URL"];
const SLIDES: &[&str] = &["Slides", "Commodities – PPT (Link)", "PPT Link", "Deck"];
const MODIFIED: &[&str] = &["Last Modified", "Updated", "Timestamp", "Modified"];

/// Per-flag header synonyms.
fn flag_hints(flag: PipelineFlag) -> &'static [&'static str] {
    match flag {
        PipelineFlag::PptsShared => &["PPTs Shared", "PPT Shared", "Presentation Shared"],
        PipelineFlag::VerbalAgreement => &["Verbal Agreement", "Verbal"],
        PipelineFlag::NdaSigned => &["NDA Signed", "NDA"],
        PipelineFlag::LoiIssued => &["LOI Issued", "LOI Sent"],
        PipelineFlag::LoiSigned => &["LOI Signed"],
        PipelineFlag::ContractSigned => &["Contract Signed", "Contract"],
        PipelineFlag::PartsReceived => &["Parts Received", "Parts Spend", "Parts"],
    }
}

// ── Stage inference ──

/// Stage keywords in match priority: the first tier whose keyword appears
/// in the stage text wins.
const STAGE_TIERS: &[(&[&str], PipelineFlag)] = &[
    (&["part", "spend"], PipelineFlag::PartsReceived),
    (&["contract"], PipelineFlag::ContractSigned),
    (&["loi signed"], PipelineFlag::LoiSigned),
    (&["loi issued", "loi sent"], PipelineFlag::LoiIssued),
    (&["nda"], PipelineFlag::NdaSigned),
    (&["verbal"], PipelineFlag::VerbalAgreement),
    (&["ppt", "intro"], PipelineFlag::PptsShared),
];

/// Map free-text stage to the furthest milestone it names, if any.
pub fn infer_stage(stage: &str) -> Option<PipelineFlag> {
    let stage = stage.to_lowercase();
    STAGE_TIERS
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| stage.contains(k)))
        .map(|(_, tier)| *tier)
}

// ── Notes ──

const DATE_ARTIFACT_MAX_LEN: usize = 25;
const FREE_TEXT_MIN_LEN: usize = 30;

/// Whether `s` starts with a valid `YYYY-MM-DD` calendar date.
pub fn starts_with_date(s: &str) -> bool {
    let Some(prefix) = s.get(..10) else {
        return false;
    };
    let bytes = prefix.as_bytes();
    bytes[4] == b'-'
        && bytes[7] == b'-'
        && NaiveDate::parse_from_str(prefix, "%Y-%m-%d").is_ok()
}

/// A short value that is only a date is a sheet timestamp, not notes.
fn is_date_artifact(s: &str) -> bool {
    s.chars().count() < DATE_ARTIFACT_MAX_LEN && starts_with_date(s)
}

/// Longest prose-like string in the row other than the customer name.
fn longest_free_text(row: &RawRow, customer: &str) -> Option<String> {
    row.values()
        .filter_map(|v| v.as_str().map(str::trim))
        .filter(|s| {
            s.chars().count() >= FREE_TEXT_MIN_LEN
                && s.contains(char::is_whitespace)
                && *s != customer
                && !s.starts_with("http")
                && !starts_with_date(s)
        })
        .fold(None::<&str>, |best, s| match best {
            Some(b) if b.chars().count() >= s.chars().count() => Some(b),
            _ => Some(s),
        })
        .map(str::to_string)
}

fn resolve_notes(row: &RawRow, customer: &str) -> String {
    match resolve_text(row, NOTES) {
        Some(notes) if is_date_artifact(&notes) => {
            debug!(customer, "notes column holds a bare date, looking elsewhere");
            longest_free_text(row, customer).unwrap_or_else(|| NO_NOTES.to_string())
        }
        Some(notes) => notes,
        None => NO_NOTES.to_string(),
    }
}

// ── Timestamps ──

fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Some(ts.with_timezone(&Utc));
    }
    let prefix = s.get(..10)?;
    NaiveDate::parse_from_str(prefix, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

// ── Public API ──

/// Normalise one row, stamping missing timestamps with the current time.
pub fn normalize(row: &RawRow, index: usize) -> Lead {
    normalize_at(row, index, Utc::now())
}

/// Normalise a fetched batch. Ids are positions in `rows`.
pub fn normalize_batch(rows: &[RawRow]) -> Vec<Lead> {
    let now = Utc::now();
    let leads: Vec<Lead> = rows
        .iter()
        .enumerate()
        .map(|(i, row)| normalize_at(row, i, now))
        .collect();
    info!(count = leads.len(), "normalised lead batch");
    leads
}

/// Normalise one row with an explicit fallback timestamp.
pub fn normalize_at(row: &RawRow, index: usize, now: DateTime<Utc>) -> Lead {
    let customer = resolve_text(row, CUSTOMER).unwrap_or_else(|| {
        debug!(index, "row has no customer name");
        UNKNOWN_COMPANY.to_string()
    });
    let contact = resolve_text(row, CONTACT).unwrap_or_else(|| UNKNOWN_CONTACT.to_string());
    let manager = resolve_text(row, MANAGER).unwrap_or_else(|| UNASSIGNED.to_string());
    let strategic_owner = resolve_text(row, STRATEGIC).unwrap_or_else(|| UNASSIGNED.to_string());
    let delivery_lead = has_field(row, DELIVERY)
        .then(|| resolve_text(row, DELIVERY).unwrap_or_else(|| UNASSIGNED.to_string()));
    let origin = resolve_text(row, ORIGIN).unwrap_or_default();
    let lead_type = resolve_text(row, LEAD_TYPE)
        .map(|t| LeadType::classify(&t))
        .unwrap_or_default();
    let notes = resolve_notes(row, &customer);
    let stage = resolve(row, STAGE).map(value_text);

    let mut pipeline = Pipeline::default();
    for flag in PipelineFlag::ALL {
        if resolve_bool(row, flag_hints(flag)) {
            pipeline.set(flag, true);
        }
    }
    if let Some(tier) = stage.as_deref().and_then(infer_stage) {
        pipeline.reach(tier);
    }

    let intro_meeting = resolve_bool(row, INTRO);
    let weekly_calls = resolve_bool(row, WEEKLY);
    let score = lead::score(&pipeline, intro_meeting, weekly_calls);

    let tags = derive_tags(&origin, lead_type, &pipeline, stage.as_deref());

    let last_modified = resolve_text(row, MODIFIED)
        .and_then(|s| parse_timestamp(&s))
        .unwrap_or(now);

    Lead {
        id: LeadId(index),
        customer,
        contact,
        manager,
        strategic_owner,
        delivery_lead,
        origin,
        lead_type,
        notes,
        tags,
        pipeline,
        intro_meeting,
        weekly_calls,
        score,
        progress: lead::progress(score),
        logo_url: resolve_text(row, LOGO),
        linkedin_url: resolve_text(row, LINKEDIN),
        slides_url: resolve_text(row, SLIDES),
        last_modified,
    }
}

fn derive_tags(
    origin: &str,
    lead_type: LeadType,
    pipeline: &Pipeline,
    stage: Option<&str>,
) -> Vec<Tag> {
    let stage = stage.unwrap_or_default().to_lowercase();
    let mut tags = Vec::new();
    if !origin.is_empty() {
        tags.push(Tag::new(origin, TagKind::Origin));
    }
    if let Some(label) = lead_type.label() {
        tags.push(Tag::new(label, TagKind::Type));
    }
    if pipeline.loi_issued || stage.contains("loi") {
        tags.push(Tag::new("LOI Issued", TagKind::Stage));
    }
    if origin.to_lowercase().contains("past") || stage.contains("past") {
        tags.push(Tag::new("From Past", TagKind::History));
    }
    tags
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::{Value, json};

    fn row(value: Value) -> RawRow {
        serde_json::from_value(value).unwrap()
    }

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 15, 12, 0, 0).unwrap()
    }

    fn lead(value: Value) -> Lead {
        normalize_at(&row(value), 0, fixed_now())
    }

    #[test]
    fn nda_only_row() {
        let l = lead(json!({"Customer": "Acme", "NDA Signed": "Yes"}));
        assert_eq!(l.customer, "Acme");
        assert!(l.pipeline.nda_signed);
        for flag in PipelineFlag::ALL {
            if flag != PipelineFlag::NdaSigned {
                assert!(!l.pipeline.get(flag), "{flag:?} should be false");
            }
        }
        assert_eq!(l.score, 10);
        assert_eq!(l.progress, 6);
    }

    #[test]
    fn stage_infers_earlier_milestones() {
        let l = lead(json!({"Company": "Globex", "Stage": "LOI Signed"}));
        assert_eq!(l.customer, "Globex");
        let p = l.pipeline;
        assert!(p.ppts_shared && p.verbal_agreement && p.nda_signed);
        assert!(p.loi_issued && p.loi_signed);
        assert!(!p.contract_signed && !p.parts_received);
        assert_eq!(l.score, 85);
        assert_eq!(l.progress, 53);
    }

    #[test]
    fn blank_customer_and_date_notes() {
        let l = lead(json!({"Customer": "", "Notes": "2024-05-01"}));
        assert_eq!(l.customer, UNKNOWN_COMPANY);
        assert_eq!(l.notes, NO_NOTES);
    }

    #[test]
    fn date_notes_fall_back_to_free_text() {
        let l = lead(json!({
            "Customer": "Initech",
            "Current Progress": "2024-05-01T09:00:00Z",
            "Remarks": "Waiting on pricing sign-off from their procurement team",
            "Website": "https://initech.example.com/about/company/history",
        }));
        assert_eq!(
            l.notes,
            "Waiting on pricing sign-off from their procurement team"
        );
    }

    #[test]
    fn long_note_starting_with_date_is_kept() {
        let text = "2024-05-01: met with procurement, follow-up next week";
        let l = lead(json!({"Customer": "Acme", "Notes": text}));
        assert_eq!(l.notes, text);
    }

    #[test]
    fn missing_fields_use_sentinels() {
        let l = lead(json!({}));
        assert_eq!(l.customer, UNKNOWN_COMPANY);
        assert_eq!(l.contact, UNKNOWN_CONTACT);
        assert_eq!(l.manager, UNASSIGNED);
        assert_eq!(l.strategic_owner, UNASSIGNED);
        assert_eq!(l.delivery_lead, None);
        assert_eq!(l.origin, "");
        assert_eq!(l.lead_type, LeadType::None);
        assert_eq!(l.notes, NO_NOTES);
        assert!(l.tags.is_empty());
        assert_eq!(l.score, 0);
        assert_eq!(l.last_modified, fixed_now());
        assert!(l.logo_url.is_none() && l.linkedin_url.is_none() && l.slides_url.is_none());
    }

    #[test]
    fn blank_customer_does_not_borrow_other_columns() {
        let l = lead(json!({"Customer": "", "Account Manager": "Jane"}));
        assert_eq!(l.customer, UNKNOWN_COMPANY);
        assert_eq!(l.manager, "Jane");

        let l = lead(json!({"Customer": "", "Customer Contact": "Bob"}));
        assert_eq!(l.customer, UNKNOWN_COMPANY);

        let l = lead(json!({"Account Manager": "Jane"}));
        assert_eq!(l.customer, UNKNOWN_COMPANY);
    }

    #[test]
    fn unrelated_header_does_not_set_flags() {
        let l = lead(json!({
            "Customer": "Acme",
            "Monday Call": "yes",
            "Subcontractor": "yes",
            "Spare Parts Notes": "yes",
        }));
        assert_eq!(l.pipeline, Pipeline::default());
        assert!(!l.intro_meeting);
        assert_eq!(l.score, 0);
    }

    #[test]
    fn delivery_date_is_not_a_delivery_column() {
        let l = lead(json!({"Customer": "Acme", "Delivery Date": "2024-05-01"}));
        assert_eq!(l.delivery_lead, None);
    }

    #[test]
    fn blank_delivery_column_is_unassigned() {
        let l = lead(json!({"Customer": "Acme", "Delivery Lead": ""}));
        assert_eq!(l.delivery_lead.as_deref(), Some(UNASSIGNED));
        let l = lead(json!({"Customer": "Acme", "Delivery Lead": "Sam"}));
        assert_eq!(l.delivery_lead.as_deref(), Some("Sam"));
    }

    #[test]
    fn source_sheet_headers() {
        let l = lead(json!({
            "Customer": "Hooli",
            "Lead Origin": "Trade Fair",
            "Strategic Owner": "Dana",
            "Current Progress": "Second call booked",
            "Introductory Meeting": "TRUE",
            "Commodities – PPT (Link)": "https://slides.example.com/hooli",
        }));
        assert_eq!(l.origin, "Trade Fair");
        assert_eq!(l.strategic_owner, "Dana");
        assert_eq!(l.notes, "Second call booked");
        assert!(l.intro_meeting);
        assert_eq!(l.slides_url.as_deref(), Some("https://slides.example.com/hooli"));
        assert_eq!(l.score, 10);
    }

    #[test]
    fn direct_flags_and_stage_combine() {
        // Direct contract flag survives an earlier stage; stage only adds.
        let l = lead(json!({"Customer": "A", "Contract Signed": true, "Stage": "NDA"}));
        assert!(l.pipeline.contract_signed);
        assert!(l.pipeline.nda_signed && l.pipeline.verbal_agreement && l.pipeline.ppts_shared);
        assert!(!l.pipeline.loi_issued);
    }

    #[test]
    fn loi_sent_synonym() {
        let l = lead(json!({"Customer": "A", "LOI Sent": "checked"}));
        assert!(l.pipeline.loi_issued);
    }

    #[test]
    fn stage_priority_order() {
        assert_eq!(infer_stage("Parts received"), Some(PipelineFlag::PartsReceived));
        assert_eq!(infer_stage("first spend"), Some(PipelineFlag::PartsReceived));
        assert_eq!(infer_stage("Contract + LOI signed"), Some(PipelineFlag::ContractSigned));
        assert_eq!(infer_stage("LOI sent"), Some(PipelineFlag::LoiIssued));
        assert_eq!(infer_stage("Intro call"), Some(PipelineFlag::PptsShared));
        assert_eq!(infer_stage("cold"), None);
    }

    #[test]
    fn stage_inference_is_monotone() {
        for stage in ["parts", "contract", "loi signed", "loi issued", "nda", "verbal", "ppt"] {
            let l = lead(json!({"Customer": "A", "Stage": stage}));
            let tier = infer_stage(stage).unwrap();
            for flag in PipelineFlag::ALL {
                if flag <= tier {
                    assert!(l.pipeline.get(flag), "{stage}: {flag:?} should be set");
                }
            }
        }
    }

    #[test]
    fn tags_in_derivation_order() {
        let l = lead(json!({
            "Customer": "A",
            "Origin": "Past customer",
            "Lead Type": "PIM and CM",
            "Status": "LOI pending",
        }));
        let texts: Vec<&str> = l.tags.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, ["Past customer", "PIM + CM", "LOI Issued", "From Past"]);
        assert_eq!(l.tags[0].kind, TagKind::Origin);
        assert_eq!(l.tags[3].kind, TagKind::History);
    }

    #[test]
    fn weekly_and_intro_count() {
        let l = lead(json!({"Customer": "A", "Intro Meeting": "yes", "Weekly Calls": "yes"}));
        assert_eq!(l.score, 15);
    }

    #[test]
    fn timestamp_column_parsed() {
        let l = lead(json!({"Customer": "A", "Last Modified": "2024-03-02T10:30:00Z"}));
        assert_eq!(l.last_modified, Utc.with_ymd_and_hms(2024, 3, 2, 10, 30, 0).unwrap());
        let l = lead(json!({"Customer": "A", "Updated": "2024-03-02"}));
        assert_eq!(l.last_modified, Utc.with_ymd_and_hms(2024, 3, 2, 0, 0, 0).unwrap());
        let l = lead(json!({"Customer": "A", "Updated": "last week"}));
        assert_eq!(l.last_modified, fixed_now());
    }

    #[test]
    fn normalisation_is_idempotent() {
        let r = row(json!({"Customer": "Acme", "Stage": "verbal", "Origin": "Web"}));
        assert_eq!(normalize_at(&r, 3, fixed_now()), normalize_at(&r, 3, fixed_now()));
        let (a, b) = (normalize(&r, 3), normalize(&r, 3));
        assert_eq!(a.customer, b.customer);
        assert_eq!(a.pipeline, b.pipeline);
        assert_eq!(a.tags, b.tags);
    }

    #[test]
    fn batch_ids_are_positions() {
        let rows = vec![row(json!({"Customer": "A"})), row(json!({"Customer": "B"}))];
        let leads = normalize_batch(&rows);
        assert_eq!(leads.len(), 2);
        assert_eq!(leads[0].id, LeadId(0));
        assert_eq!(leads[1].customer, "B");
        assert_eq!(leads[1].id, LeadId(1));
    }

    #[test]
    fn score_always_in_bounds() {
        let l = lead(json!({
            "Customer": "Max",
            "Stage": "parts received",
            "Intro": true,
            "Weekly": "yes",
        }));
        assert_eq!(l.score, lead::MAX_SCORE);
        assert_eq!(l.progress, 100);
    }

    #[test]
    fn date_prefix_detection() {
        assert!(starts_with_date("2024-05-01"));
        assert!(starts_with_date("2024-05-01T00:00:00.000Z"));
        assert!(!starts_with_date("2024-13-01"));
        assert!(!starts_with_date("May 1 2024"));
        assert!(!starts_with_date("short"));
    }
}

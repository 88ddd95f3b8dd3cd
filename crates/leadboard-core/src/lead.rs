//! Canonical lead model, pipeline milestones, and the score table.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::CoreError;

pub const UNKNOWN_COMPANY: &str = "Unknown Company";
pub const UNKNOWN_CONTACT: &str = "Unknown Contact";
pub const UNASSIGNED: &str = "Unassigned";
pub const NO_NOTES: &str = "No progress notes";

/// Weight of the introductory meeting in the score.
pub const INTRO_WEIGHT: u32 = 10;
/// Weight of recurring weekly calls in the score.
pub const WEEKLY_WEIGHT: u32 = 5;
/// Highest reachable score: every flag plus intro and weekly calls.
pub const MAX_SCORE: u32 = 160;

/// Positional id within one fetched batch. Not stable across reloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct LeadId(pub usize);

impl fmt::Display for LeadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for LeadId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse()
            .map(LeadId)
            .map_err(|_| CoreError::InvalidId(s.to_string()))
    }
}

/// Product line classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LeadType {
    #[default]
    None,
    Pim,
    Cm,
    Both,
}

impl LeadType {
    /// Classify free text by substring: "both" or pim+cm → `Both`.
    pub fn classify(text: &str) -> Self {
        let t = text.to_lowercase();
        let pim = t.contains("pim");
        let cm = t.contains("cm");
        if t.contains("both") || (pim && cm) {
            Self::Both
        } else if pim {
            Self::Pim
        } else if cm {
            Self::Cm
        } else {
            Self::None
        }
    }

    /// Tag label, `None` for unclassified leads.
    pub fn label(&self) -> Option<&'static str> {
        match self {
            Self::None => None,
            Self::Pim => Some("PIM"),
            Self::Cm => Some("CM"),
            Self::Both => Some("PIM + CM"),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Pim => "pim",
            Self::Cm => "cm",
            Self::Both => "both",
        }
    }
}

/// Pipeline milestones in the order a deal progresses through them.
///
/// The derived `Ord` is the pipeline order: reaching a later milestone
/// implies every earlier one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineFlag {
    PptsShared,
    VerbalAgreement,
    NdaSigned,
    LoiIssued,
    LoiSigned,
    ContractSigned,
    PartsReceived,
}

impl PipelineFlag {
    pub const ALL: [PipelineFlag; 7] = [
        Self::PptsShared,
        Self::VerbalAgreement,
        Self::NdaSigned,
        Self::LoiIssued,
        Self::LoiSigned,
        Self::ContractSigned,
        Self::PartsReceived,
    ];

    pub fn weight(&self) -> u32 {
        match self {
            Self::PptsShared => 10,
            Self::VerbalAgreement => 15,
            Self::NdaSigned => 10,
            Self::LoiIssued => 20,
            Self::LoiSigned => 30,
            Self::ContractSigned => 50,
            Self::PartsReceived => 10,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::PptsShared => "PPTs Shared",
            Self::VerbalAgreement => "Verbal Agreement",
            Self::NdaSigned => "NDA Signed",
            Self::LoiIssued => "LOI Issued",
            Self::LoiSigned => "LOI Signed",
            Self::ContractSigned => "Contract Signed",
            Self::PartsReceived => "Parts Received",
        }
    }

    /// Every milestone up to and including `self`, in pipeline order.
    pub fn implies_through(self) -> impl Iterator<Item = PipelineFlag> {
        Self::ALL.into_iter().filter(move |f| *f <= self)
    }
}

impl fmt::Display for PipelineFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for PipelineFlag {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let flag = match crate::resolve::canonical_key(s).as_str() {
            "ppts" | "ppt" | "pptsshared" => Self::PptsShared,
            "verbal" | "verbalagreement" => Self::VerbalAgreement,
            "nda" | "ndasigned" => Self::NdaSigned,
            "loiissued" | "loisent" => Self::LoiIssued,
            "loisigned" => Self::LoiSigned,
            "contract" | "contractsigned" => Self::ContractSigned,
            "parts" | "partsreceived" => Self::PartsReceived,
            _ => return Err(CoreError::UnknownFlag(s.to_string())),
        };
        Ok(flag)
    }
}

/// The seven pipeline milestones of a lead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Pipeline {
    pub ppts_shared: bool,
    pub verbal_agreement: bool,
    pub nda_signed: bool,
    pub loi_issued: bool,
    pub loi_signed: bool,
    pub contract_signed: bool,
    pub parts_received: bool,
}

impl Pipeline {
    pub fn get(&self, flag: PipelineFlag) -> bool {
        match flag {
            PipelineFlag::PptsShared => self.ppts_shared,
            PipelineFlag::VerbalAgreement => self.verbal_agreement,
            PipelineFlag::NdaSigned => self.nda_signed,
            PipelineFlag::LoiIssued => self.loi_issued,
            PipelineFlag::LoiSigned => self.loi_signed,
            PipelineFlag::ContractSigned => self.contract_signed,
            PipelineFlag::PartsReceived => self.parts_received,
        }
    }

    pub fn set(&mut self, flag: PipelineFlag, value: bool) {
        let slot = match flag {
            PipelineFlag::PptsShared => &mut self.ppts_shared,
            PipelineFlag::VerbalAgreement => &mut self.verbal_agreement,
            PipelineFlag::NdaSigned => &mut self.nda_signed,
            PipelineFlag::LoiIssued => &mut self.loi_issued,
            PipelineFlag::LoiSigned => &mut self.loi_signed,
            PipelineFlag::ContractSigned => &mut self.contract_signed,
            PipelineFlag::PartsReceived => &mut self.parts_received,
        };
        *slot = value;
    }

    /// Set `tier` and every milestone before it.
    pub fn reach(&mut self, tier: PipelineFlag) {
        for flag in tier.implies_through() {
            self.set(flag, true);
        }
    }

    /// Weighted sum of the set milestones.
    pub fn weighted(&self) -> u32 {
        PipelineFlag::ALL
            .iter()
            .filter(|f| self.get(**f))
            .map(|f| f.weight())
            .sum()
    }
}

/// Score from the pipeline plus the two engagement flags.
pub fn score(pipeline: &Pipeline, intro_meeting: bool, weekly_calls: bool) -> u32 {
    let mut total = pipeline.weighted();
    if intro_meeting {
        total += INTRO_WEIGHT;
    }
    if weekly_calls {
        total += WEEKLY_WEIGHT;
    }
    total
}

/// Percentage of [`MAX_SCORE`], rounded, capped at 100.
pub fn progress(score: u32) -> u32 {
    let pct = (score as f64 / MAX_SCORE as f64 * 100.0).min(100.0);
    pct.round() as u32
}

/// A filterable milestone: any pipeline flag or the introductory meeting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Milestone {
    IntroMeeting,
    Flag(PipelineFlag),
}

impl FromStr for Milestone {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match crate::resolve::canonical_key(s).as_str() {
            "intro" | "intromeeting" | "introductorymeeting" => Ok(Self::IntroMeeting),
            _ => s.parse().map(Self::Flag),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TagKind {
    Origin,
    Type,
    Stage,
    History,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tag {
    pub text: String,
    pub kind: TagKind,
}

impl Tag {
    pub fn new(text: impl Into<String>, kind: TagKind) -> Self {
        Self {
            text: text.into(),
            kind,
        }
    }
}

/// One normalised customer pipeline entry.
///
/// Fields are public and independently mutable. `score` and `progress` are
/// snapshots: after changing `pipeline`, `intro_meeting` or `weekly_calls`,
/// call [`Lead::refresh_score`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Lead {
    pub id: LeadId,
    pub customer: String,
    pub contact: String,
    pub manager: String,
    pub strategic_owner: String,
    /// `None` when the sheet has no delivery column at all.
    pub delivery_lead: Option<String>,
    pub origin: String,
    pub lead_type: LeadType,
    pub notes: String,
    pub tags: Vec<Tag>,
    pub pipeline: Pipeline,
    pub intro_meeting: bool,
    pub weekly_calls: bool,
    pub score: u32,
    pub progress: u32,
    pub logo_url: Option<String>,
    pub linkedin_url: Option<String>,
    pub slides_url: Option<String>,
    pub last_modified: DateTime<Utc>,
}

impl Lead {
    /// Score implied by the current flags, regardless of the stored snapshot.
    pub fn computed_score(&self) -> u32 {
        score(&self.pipeline, self.intro_meeting, self.weekly_calls)
    }

    /// Recompute `score` and `progress` from the current flags.
    pub fn refresh_score(&mut self) {
        self.score = self.computed_score();
        self.progress = progress(self.score);
    }

    /// Whether the stored score matches the flags.
    pub fn score_is_current(&self) -> bool {
        self.score == self.computed_score()
    }

    pub fn has_milestone(&self, milestone: Milestone) -> bool {
        match milestone {
            Milestone::IntroMeeting => self.intro_meeting,
            Milestone::Flag(flag) => self.pipeline.get(flag),
        }
    }
}

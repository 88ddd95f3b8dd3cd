//! In-memory lead collection with search, filter, sort and selection.
//!
//! The store owns the last fetched batch and the current [`LeadQuery`].
//! [`LeadStore::recompute`] derives the visible view without touching the
//! collection, so repeated calls with the same query yield the same order.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::str::FromStr;

use serde::Serialize;
use tracing::debug;

use crate::CoreError;
use crate::lead::{Lead, LeadId, LeadType, Milestone, PipelineFlag};

/// Selector value meaning "no restriction".
pub const ALL: &str = "all";

/// Turn a selector value into a filter: "all" (any case) or blank → `None`.
pub fn selector(value: &str) -> Option<String> {
    let v = value.trim();
    if v.is_empty() || v.eq_ignore_ascii_case(ALL) {
        None
    } else {
        Some(v.to_string())
    }
}

// ── Query types ──

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TypeFilter {
    #[default]
    All,
    Pim,
    Cm,
    Both,
}

impl TypeFilter {
    /// `Pim` and `Cm` also accept leads classified as both.
    pub fn matches(&self, lead_type: LeadType) -> bool {
        match self {
            Self::All => true,
            Self::Pim => matches!(lead_type, LeadType::Pim | LeadType::Both),
            Self::Cm => matches!(lead_type, LeadType::Cm | LeadType::Both),
            Self::Both => lead_type == LeadType::Both,
        }
    }
}

impl FromStr for TypeFilter {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "all" => Ok(Self::All),
            "pim" => Ok(Self::Pim),
            "cm" => Ok(Self::Cm),
            "both" => Ok(Self::Both),
            _ => Err(CoreError::UnknownType(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Customer,
    Origin,
    Manager,
    Score,
}

impl FromStr for SortField {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "customer" | "company" => Ok(Self::Customer),
            "origin" => Ok(Self::Origin),
            "manager" => Ok(Self::Manager),
            "score" | "progress" => Ok(Self::Score),
            _ => Err(CoreError::UnknownSort(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec {
    pub field: SortField,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn ascending(field: SortField) -> Self {
        Self {
            field,
            direction: SortDirection::Ascending,
        }
    }

    pub fn descending(field: SortField) -> Self {
        Self {
            field,
            direction: SortDirection::Descending,
        }
    }

    fn compare(&self, a: &Lead, b: &Lead) -> Ordering {
        let ord = match self.field {
            SortField::Customer => cmp_text(&a.customer, &b.customer),
            SortField::Origin => cmp_text(&a.origin, &b.origin),
            SortField::Manager => cmp_text(&a.manager, &b.manager),
            SortField::Score => a.score.cmp(&b.score),
        };
        match self.direction {
            SortDirection::Ascending => ord,
            SortDirection::Descending => ord.reverse(),
        }
    }
}

fn cmp_text(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}

/// Search text, filter selections and sort order. All filters AND together.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LeadQuery {
    /// Case-insensitive substring over customer, contact and manager.
    pub search: String,
    /// Also search the notes text.
    pub search_notes: bool,
    /// Exact origin, `None` for all.
    pub origin: Option<String>,
    /// Exact manager, `None` for all.
    pub manager: Option<String>,
    pub lead_type: TypeFilter,
    /// Milestone that must be reached, `None` for all.
    pub stage: Option<Milestone>,
    /// `None` keeps fetch order.
    pub sort: Option<SortSpec>,
}

impl LeadQuery {
    pub fn matches(&self, lead: &Lead) -> bool {
        self.matches_search(lead)
            && self.origin.as_ref().is_none_or(|o| lead.origin == *o)
            && self.manager.as_ref().is_none_or(|m| lead.manager == *m)
            && self.lead_type.matches(lead.lead_type)
            && self.stage.is_none_or(|s| lead.has_milestone(s))
    }

    fn matches_search(&self, lead: &Lead) -> bool {
        let needle = self.search.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        let hit = |s: &str| s.to_lowercase().contains(&needle);
        hit(&lead.customer)
            || hit(&lead.contact)
            || hit(&lead.manager)
            || (self.search_notes && hit(&lead.notes))
    }
}

// ── Summary ──

/// Milestone counts over a set of leads.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineSummary {
    pub total: usize,
    pub intro_meeting: usize,
    pub weekly_calls: usize,
    pub milestones: Vec<(PipelineFlag, usize)>,
    pub mean_progress: f64,
}

impl PipelineSummary {
    pub fn from_leads<'a>(leads: impl IntoIterator<Item = &'a Lead>) -> Self {
        let mut total = 0;
        let mut intro_meeting = 0;
        let mut weekly_calls = 0;
        let mut counts = [0usize; 7];
        let mut progress_sum = 0u64;

        for lead in leads {
            total += 1;
            intro_meeting += lead.intro_meeting as usize;
            weekly_calls += lead.weekly_calls as usize;
            progress_sum += lead.progress as u64;
            for (i, flag) in PipelineFlag::ALL.iter().enumerate() {
                counts[i] += lead.pipeline.get(*flag) as usize;
            }
        }

        Self {
            total,
            intro_meeting,
            weekly_calls,
            milestones: PipelineFlag::ALL.into_iter().zip(counts).collect(),
            mean_progress: if total == 0 {
                0.0
            } else {
                progress_sum as f64 / total as f64
            },
        }
    }
}

// ── Store ──

#[derive(Debug, Default)]
pub struct LeadStore {
    leads: Vec<Lead>,
    query: LeadQuery,
    selected: Option<LeadId>,
}

impl LeadStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_query(query: LeadQuery) -> Self {
        Self {
            query,
            ..Self::default()
        }
    }

    /// Replace the whole collection with a freshly normalised batch.
    ///
    /// The query is kept. A selection survives only if a lead with the same
    /// customer still exists; ids are positional and may have shifted.
    pub fn replace(&mut self, leads: Vec<Lead>) {
        let selected_customer = self.selected().map(|l| l.customer.clone());
        self.leads = leads;
        self.selected = None;
        if let Some(customer) = selected_customer
            && self.select_customer(&customer).is_none()
        {
            debug!(%customer, "selection dropped by reload");
        }
    }

    pub fn leads(&self) -> &[Lead] {
        &self.leads
    }

    pub fn len(&self) -> usize {
        self.leads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leads.is_empty()
    }

    pub fn get(&self, id: LeadId) -> Option<&Lead> {
        self.leads.get(id.0).filter(|l| l.id == id)
    }

    pub fn get_mut(&mut self, id: LeadId) -> Option<&mut Lead> {
        self.leads.get_mut(id.0).filter(|l| l.id == id)
    }

    pub fn query(&self) -> &LeadQuery {
        &self.query
    }

    pub fn query_mut(&mut self) -> &mut LeadQuery {
        &mut self.query
    }

    pub fn set_query(&mut self, query: LeadQuery) {
        self.query = query;
    }

    /// Filtered, sorted view of the collection under the current query.
    pub fn recompute(&self) -> Vec<&Lead> {
        let mut view: Vec<&Lead> = self
            .leads
            .iter()
            .filter(|l| self.query.matches(l))
            .collect();
        if let Some(sort) = self.query.sort {
            // `sort_by` is stable: equal keys keep fetch order.
            view.sort_by(|a, b| sort.compare(a, b));
        }
        view
    }

    // ── Selection ──

    /// Select by id. An unknown id clears the selection.
    pub fn select(&mut self, id: LeadId) -> Option<&Lead> {
        if self.get(id).is_some() {
            self.selected = Some(id);
        } else {
            debug!(%id, "selected lead not found, clearing selection");
            self.selected = None;
        }
        self.selected()
    }

    /// Select the first lead with this exact customer name.
    pub fn select_customer(&mut self, customer: &str) -> Option<&Lead> {
        self.selected = self
            .leads
            .iter()
            .find(|l| l.customer == customer)
            .map(|l| l.id);
        if self.selected.is_none() {
            debug!(customer, "no lead for customer, clearing selection");
        }
        self.selected()
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    pub fn selected(&self) -> Option<&Lead> {
        self.selected.and_then(|id| self.get(id))
    }

    pub fn selected_id(&self) -> Option<LeadId> {
        self.selected
    }

    // ── Option lists ──

    /// Distinct customer names, sorted, for the company picker.
    pub fn customers(&self) -> Vec<&str> {
        distinct(self.leads.iter().map(|l| l.customer.as_str()))
    }

    /// Distinct non-empty origins, sorted.
    pub fn origins(&self) -> Vec<&str> {
        distinct(self.leads.iter().map(|l| l.origin.as_str()))
    }

    /// Distinct managers, sorted.
    pub fn managers(&self) -> Vec<&str> {
        distinct(self.leads.iter().map(|l| l.manager.as_str()))
    }

    /// Summary over the whole collection.
    pub fn summary(&self) -> PipelineSummary {
        PipelineSummary::from_leads(&self.leads)
    }
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<&'a str> {
    values
        .filter(|v| !v.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

//! Lead normalisation and query engine for a spreadsheet-backed sales pipeline.
//!
//! Rows arrive as loosely-keyed JSON objects. [`resolve`] is the only place
//! that deals with header drift; everything past [`normalize`] is typed.

pub mod edit;
mod error;
pub mod lead;
pub mod normalize;
pub mod resolve;
pub mod store;
pub mod wire;

pub use edit::{LeadEdit, TextField};
pub use error::CoreError;
pub use lead::{Lead, LeadId, LeadType, Milestone, Pipeline, PipelineFlag, Tag, TagKind};
pub use normalize::{normalize, normalize_batch};
pub use resolve::RawRow;
pub use store::{LeadQuery, LeadStore, PipelineSummary, SortDirection, SortField, SortSpec, TypeFilter};
pub use wire::{SaveAck, SaveRequest};

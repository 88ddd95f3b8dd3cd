//! Dashboard session: load, select, edit optimistically, save.
//!
//! Edits land in the local store immediately and the inverse of each edit is
//! kept until the lead is saved. What happens to those edits when a save
//! fails is the [`SavePolicy`]; whether flag edits refresh the score is the
//! [`ScorePolicy`].
//!
//! Every network operation borrows the session mutably, so at most one fetch
//! or save is in flight per session.

use std::collections::HashMap;

use leadboard_core::{
    Lead, LeadEdit, LeadId, LeadStore, PipelineFlag, SaveAck, SaveRequest, normalize_batch,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{LeadBackend, SessionError, SyncError};

/// What to do with local edits when a save fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SavePolicy {
    /// Keep the edit locally so the user can retry.
    #[default]
    Keep,
    /// Roll the lead back to its last saved state.
    Revert,
}

/// Whether pipeline flag edits refresh `score`/`progress`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScorePolicy {
    /// Refresh after every flag edit.
    #[default]
    Recompute,
    /// Leave the stored score until [`Dashboard::refresh_score`] is called.
    Manual,
}

pub struct Dashboard<B> {
    backend: B,
    store: LeadStore,
    save_policy: SavePolicy,
    score_policy: ScorePolicy,
    /// Inverse edits per lead since its last successful save, oldest first.
    pending: HashMap<LeadId, Vec<LeadEdit>>,
}

impl<B: LeadBackend> Dashboard<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            store: LeadStore::new(),
            save_policy: SavePolicy::default(),
            score_policy: ScorePolicy::default(),
            pending: HashMap::new(),
        }
    }

    pub fn with_save_policy(mut self, policy: SavePolicy) -> Self {
        self.save_policy = policy;
        self
    }

    pub fn with_score_policy(mut self, policy: ScorePolicy) -> Self {
        self.score_policy = policy;
        self
    }

    pub fn with_store(mut self, store: LeadStore) -> Self {
        self.store = store;
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn store(&self) -> &LeadStore {
        &self.store
    }

    /// Mutable access for query changes and selection.
    pub fn store_mut(&mut self) -> &mut LeadStore {
        &mut self.store
    }

    /// Current filtered and sorted view.
    pub fn view(&self) -> Vec<&Lead> {
        self.store.recompute()
    }

    /// Fetch and normalise every row, replacing the collection.
    ///
    /// On failure the previous collection stays as it was. On success any
    /// unsaved edits are discarded along with the old collection.
    pub async fn reload(&mut self) -> Result<usize, SessionError> {
        let rows = self
            .backend
            .fetch_rows()
            .await
            .map_err(SessionError::Fetch)?;
        let leads = normalize_batch(&rows);

        if !self.pending.is_empty() {
            warn!(
                leads = self.pending.len(),
                "reload discarded unsaved edits"
            );
            self.pending.clear();
        }

        let count = leads.len();
        self.store.replace(leads);
        info!(count, "leads loaded");
        Ok(count)
    }

    pub fn select(&mut self, id: LeadId) -> Option<&Lead> {
        self.store.select(id)
    }

    pub fn select_customer(&mut self, customer: &str) -> Option<&Lead> {
        self.store.select_customer(customer)
    }

    /// Apply an edit locally. Never waits on the backend.
    pub fn edit(&mut self, id: LeadId, edit: LeadEdit) -> Result<&Lead, SessionError> {
        let lead = self
            .store
            .get_mut(id)
            .ok_or(SessionError::UnknownLead(id))?;
        let refresh = edit.affects_score() && self.score_policy == ScorePolicy::Recompute;
        let undo = lead.apply(edit);
        if refresh {
            lead.refresh_score();
        }
        self.pending.entry(id).or_default().push(undo);
        Ok(&*lead)
    }

    /// Flip one pipeline flag locally.
    pub fn toggle(&mut self, id: LeadId, flag: PipelineFlag) -> Result<&Lead, SessionError> {
        let lead = self.store.get(id).ok_or(SessionError::UnknownLead(id))?;
        let edit = LeadEdit::toggle(lead, flag);
        self.edit(id, edit)
    }

    /// Recompute one lead's score and progress from its flags.
    pub fn refresh_score(&mut self, id: LeadId) -> Result<&Lead, SessionError> {
        let lead = self
            .store
            .get_mut(id)
            .ok_or(SessionError::UnknownLead(id))?;
        lead.refresh_score();
        Ok(&*lead)
    }

    /// Whether the lead has local edits not yet acknowledged by the backend.
    pub fn has_pending(&self, id: LeadId) -> bool {
        self.pending.get(&id).is_some_and(|edits| !edits.is_empty())
    }

    /// Send the lead's current state to the backend.
    pub async fn save(&mut self, id: LeadId) -> Result<SaveAck, SessionError> {
        let lead = self.store.get(id).ok_or(SessionError::UnknownLead(id))?;
        let request = SaveRequest::from(lead);

        let outcome = match self.backend.save(&request).await {
            Ok(ack) if ack.is_success() => Ok(ack),
            Ok(ack) => Err(SyncError::Rejected {
                status: ack.status,
                message: ack.message,
            }),
            Err(e) => Err(e),
        };

        match outcome {
            Ok(ack) => {
                self.pending.remove(&id);
                info!(%id, customer = %request.customer, "lead saved");
                Ok(ack)
            }
            Err(source) => {
                let reverted = self.save_policy == SavePolicy::Revert && self.revert(id);
                warn!(%id, customer = %request.customer, reverted, error = %source, "save failed");
                Err(SessionError::SaveFailed {
                    id,
                    source,
                    reverted,
                })
            }
        }
    }

    /// Apply an edit locally, then save the lead.
    pub async fn edit_and_save(
        &mut self,
        id: LeadId,
        edit: LeadEdit,
    ) -> Result<SaveAck, SessionError> {
        self.edit(id, edit)?;
        self.save(id).await
    }

    /// Undo every pending edit on `id`, newest first.
    fn revert(&mut self, id: LeadId) -> bool {
        let Some(undo) = self.pending.remove(&id) else {
            return false;
        };
        let Some(lead) = self.store.get_mut(id) else {
            return false;
        };
        for edit in undo.into_iter().rev() {
            lead.apply(edit);
        }
        if self.score_policy == ScorePolicy::Recompute {
            lead.refresh_score();
        }
        true
    }
}

//! The State Store (C5): append-only persistent debate log with atomic
//! save. Each mutation writes the full JSON-encoded record to
//! `<base_dir>/<id>.json` before returning, via a write-to-temp-then-rename
//! so no partial writes are ever visible on disk.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::Utc;

use crate::debate::error::{DebateError, DebateResult};
use crate::debate::model::{
    AgentClarifications, Contribution, DebateRound, DebateState, DebateSummary, DebateStatus,
    Solution,
};

/// Generates a debate id of the form `deb-YYYYMMDD-HHMMSS-<4 char base36>`.
pub fn generate_debate_id() -> String {
    let now = Utc::now();
    let suffix = random_base36(4);
    format!("deb-{}-{}", now.format("%Y%m%d-%H%M%S"), suffix)
}

fn random_base36(len: usize) -> String {
    const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let bytes = uuid::Uuid::new_v4();
    bytes
        .as_bytes()
        .iter()
        .take(len)
        .map(|b| ALPHABET[*b as usize % ALPHABET.len()] as char)
        .collect()
}

/// File-backed, in-process-cached debate store.
pub struct DebateStore {
    base_dir: PathBuf,
    cache: Mutex<HashMap<String, DebateState>>,
}

impl DebateStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> DebateResult<Self> {
        let base_dir = base_dir.into();
        std::fs::create_dir_all(&base_dir)
            .map_err(|e| DebateError::StorageError(format!("create base dir: {e}")))?;
        Ok(DebateStore {
            base_dir,
            cache: Mutex::new(HashMap::new()),
        })
    }

    fn path_for(&self, id: &str) -> PathBuf {
        self.base_dir.join(format!("{id}.json"))
    }

    /// Writes `state` to `<base_dir>/<id>.json.tmp` then renames it into
    /// place, so a reader never observes a partially-written file.
    fn write_atomic(&self, state: &DebateState) -> DebateResult<()> {
        let final_path = self.path_for(&state.id);
        let tmp_path = final_path.with_extension("json.tmp");
        let json = serde_json::to_string_pretty(state)
            .map_err(|e| DebateError::StorageError(format!("serialize: {e}")))?;
        std::fs::write(&tmp_path, json)
            .map_err(|e| DebateError::StorageError(format!("write temp file: {e}")))?;
        std::fs::rename(&tmp_path, &final_path)
            .map_err(|e| DebateError::StorageError(format!("atomic rename: {e}")))?;
        Ok(())
    }

    fn with_state<F>(&self, id: &str, f: F) -> DebateResult<()>
    where
        F: FnOnce(&mut DebateState) -> DebateResult<()>,
    {
        let mut cache = self.cache.lock().unwrap();
        let state = cache
            .get_mut(id)
            .ok_or_else(|| DebateError::NotFound(id.to_string()))?;
        f(state)?;
        state.touch();
        self.write_atomic(state)
    }

    pub fn create_debate(&self, problem: String, context: Option<String>) -> DebateResult<String> {
        if problem.trim().is_empty() {
            return Err(DebateError::InvalidInput("problem must not be empty".into()));
        }
        let id = generate_debate_id();
        let state = DebateState::new(id.clone(), problem, context);
        self.write_atomic(&state)?;
        self.cache.lock().unwrap().insert(id.clone(), state);
        Ok(id)
    }

    pub fn begin_round(&self, id: &str) -> DebateResult<u32> {
        let mut round_number = 0;
        self.with_state(id, |state| {
            state.status = DebateStatus::Running;
            let next = state.rounds.len() as u32 + 1;
            round_number = next;
            state.rounds.push(DebateRound::new(next));
            state.current_round = next;
            Ok(())
        })?;
        Ok(round_number)
    }

    pub fn add_contribution(&self, id: &str, contribution: Contribution) -> DebateResult<()> {
        contribution
            .validate()
            .map_err(DebateError::InvalidInput)?;
        self.with_state(id, |state| {
            let round = state
                .rounds
                .last_mut()
                .ok_or_else(|| DebateError::NoActiveRound(id.to_string()))?;
            round.contributions.push(contribution);
            Ok(())
        })
    }

    pub fn add_summary(
        &self,
        id: &str,
        round_number: u32,
        summary: DebateSummary,
    ) -> DebateResult<()> {
        self.with_state(id, |state| {
            let round = state
                .rounds
                .iter_mut()
                .find(|r| r.round_number == round_number)
                .ok_or_else(|| {
                    DebateError::InvalidInput(format!("no round {round_number} in debate {id}"))
                })?;
            round.summaries.insert(summary.agent_id.clone(), summary);
            Ok(())
        })
    }

    pub fn complete_debate(&self, id: &str, solution: Solution) -> DebateResult<()> {
        self.with_state(id, |state| {
            state.status = DebateStatus::Completed;
            state.final_solution = Some(solution);
            Ok(())
        })
    }

    pub fn fail_debate(&self, id: &str) {
        let _ = self.with_state(id, |state| {
            state.status = DebateStatus::Failed;
            Ok(())
        });
    }

    pub fn set_clarifications(
        &self,
        id: &str,
        clarifications: Vec<AgentClarifications>,
    ) -> DebateResult<()> {
        self.with_state(id, |state| {
            state.clarifications = Some(clarifications);
            Ok(())
        })
    }

    pub fn update_user_feedback(&self, id: &str, value: i8) -> DebateResult<()> {
        if value != -1 && value != 1 {
            return Err(DebateError::InvalidInput(
                "user feedback must be -1 or +1".into(),
            ));
        }
        self.with_state(id, |state| {
            state.user_feedback = Some(value);
            Ok(())
        })
    }

    pub fn get_debate(&self, id: &str) -> DebateResult<Option<DebateState>> {
        if let Some(state) = self.cache.lock().unwrap().get(id) {
            return Ok(Some(state.clone()));
        }
        let path = self.path_for(id);
        if !path.exists() {
            return Ok(None);
        }
        let raw = std::fs::read_to_string(&path)
            .map_err(|e| DebateError::StorageError(format!("read: {e}")))?;
        let state: DebateState = serde_json::from_str(&raw)
            .map_err(|e| DebateError::StorageError(format!("deserialize: {e}")))?;
        self.cache
            .lock()
            .unwrap()
            .insert(id.to_string(), state.clone());
        Ok(Some(state))
    }

    pub fn list_debates(&self) -> DebateResult<Vec<DebateState>> {
        let mut out = Vec::new();
        let entries = std::fs::read_dir(&self.base_dir)
            .map_err(|e| DebateError::StorageError(format!("read dir: {e}")))?;
        for entry in entries {
            let entry = entry.map_err(|e| DebateError::StorageError(e.to_string()))?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let raw = std::fs::read_to_string(&path)
                .map_err(|e| DebateError::StorageError(format!("read: {e}")))?;
            if let Ok(state) = serde_json::from_str::<DebateState>(&raw) {
                out.push(state);
            }
        }
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(out)
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }
}

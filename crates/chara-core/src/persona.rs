//! Persona catalog and resolver.
//!
//! Personas are loaded once at startup from a JSON array file
//! (`roles.json` by default) and are read-only afterwards. Resolution
//! never fails: an unknown character id gets the built-in default
//! persona, so the chat surface has no "character not found" error.

use crate::error::{UpstreamError, UpstreamResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// System prompt used when a character id is not in the catalog.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a concise, friendly assistant.\n\
    Goal: help the user solve their problem with actionable advice.\n\
    Style: short sentences, bullet points, at most 5 items; if context is \
    missing, ask 1-2 clarifying questions first.\n\
    Boundaries: never invent facts or achievements; say when you are unsure \
    and suggest a next step.\n\
    Format: Markdown lists or small headings, no long paragraphs.";

/// Default TTS voice when neither the persona nor the request names one.
pub const DEFAULT_VOICE: &str = "neutral-default";
/// "+0%" means no rate/volume adjustment.
pub const DEFAULT_RATE: &str = "+0%";
pub const DEFAULT_VOLUME: &str = "+0%";

const SOCRATIC_FRAGMENT: &str =
    "\n- Skill: first ask 1-2 clarifying or guiding questions, then give brief advice.";
const LORE_STRICT_FRAGMENT: &str = "\n- Skill: strictly follow the character's setting and \
    world; politely refuse out-of-setting questions and steer back to the setting.";
const SUMMARY_FRAGMENT: &str =
    "\n- Skill: when the user sends #summary, reply with key points and a TODO list.";

/// Optional behavior toggles on a persona. Each enabled flag appends
/// one instruction fragment to the system prompt, in a fixed order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SkillFlags {
    pub socratic: bool,
    pub lore_strict: bool,
    pub summary: bool,
}

/// One catalog entry: prompt template plus TTS voice parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonaRecord {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_prompt")]
    pub system_prompt: String,
    #[serde(default = "default_voice")]
    pub voice: String,
    #[serde(default = "default_rate")]
    pub rate: String,
    #[serde(default = "default_volume")]
    pub volume: String,
    #[serde(default)]
    pub skills: SkillFlags,
}

fn default_prompt() -> String {
    DEFAULT_SYSTEM_PROMPT.to_string()
}

fn default_voice() -> String {
    DEFAULT_VOICE.to_string()
}

fn default_rate() -> String {
    DEFAULT_RATE.to_string()
}

fn default_volume() -> String {
    DEFAULT_VOLUME.to_string()
}

impl PersonaRecord {
    /// Built-in persona for unknown ids.
    pub fn fallback(id: i64) -> Self {
        Self {
            id,
            name: String::new(),
            system_prompt: default_prompt(),
            voice: default_voice(),
            rate: default_rate(),
            volume: default_volume(),
            skills: SkillFlags::default(),
        }
    }
}

/// Effective TTS parameters for one chat turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceParams {
    pub voice: String,
    pub rate: String,
    pub volume: String,
}

impl VoiceParams {
    /// Replaces each field with the matching override when it is
    /// non-empty after trimming. Whitespace-only overrides are ignored.
    /// The change is per-call; the persona record is never mutated.
    pub fn apply_overrides(
        mut self,
        voice: Option<&str>,
        rate: Option<&str>,
        volume: Option<&str>,
    ) -> Self {
        if let Some(v) = non_blank(voice) {
            self.voice = v;
        }
        if let Some(r) = non_blank(rate) {
            self.rate = r;
        }
        if let Some(vol) = non_blank(volume) {
            self.volume = vol;
        }
        self
    }
}

fn non_blank(s: Option<&str>) -> Option<String> {
    s.map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

/// A persona ready for one chat turn: skill-augmented prompt plus the
/// persona's default voice parameters.
#[derive(Debug, Clone)]
pub struct ResolvedPersona {
    pub record: PersonaRecord,
}

impl ResolvedPersona {
    /// System prompt with one fragment per enabled skill flag appended,
    /// always in socratic, lore-strict, summary order.
    pub fn effective_system_prompt(&self) -> String {
        let mut prompt = self.record.system_prompt.clone();
        if self.record.skills.socratic {
            prompt.push_str(SOCRATIC_FRAGMENT);
        }
        if self.record.skills.lore_strict {
            prompt.push_str(LORE_STRICT_FRAGMENT);
        }
        if self.record.skills.summary {
            prompt.push_str(SUMMARY_FRAGMENT);
        }
        prompt
    }

    pub fn voice_params(&self) -> VoiceParams {
        VoiceParams {
            voice: self.record.voice.clone(),
            rate: self.record.rate.clone(),
            volume: self.record.volume.clone(),
        }
    }
}

/// Static catalog of personas, loaded once at process start.
#[derive(Debug, Default)]
pub struct PersonaCatalog {
    records: Vec<PersonaRecord>,
}

impl PersonaCatalog {
    /// Loads a JSON array of persona records from `path`. The catalog
    /// is required at startup; a missing or malformed file is an error
    /// here, never later.
    pub fn load(path: impl AsRef<Path>) -> UpstreamResult<Self> {
        let raw = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            UpstreamError::Catalog(format!(
                "cannot read persona catalog {}: {e}",
                path.as_ref().display()
            ))
        })?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> UpstreamResult<Self> {
        let records: Vec<PersonaRecord> = serde_json::from_str(raw)
            .map_err(|e| UpstreamError::Catalog(format!("invalid persona catalog: {e}")))?;
        tracing::info!(target: "chara::persona", count = records.len(), "persona catalog loaded");
        Ok(Self { records })
    }

    pub fn from_records(records: Vec<PersonaRecord>) -> Self {
        Self { records }
    }

    pub fn all(&self) -> &[PersonaRecord] {
        &self.records
    }

    pub fn find(&self, id: i64) -> Option<&PersonaRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    /// Never fails: unknown ids resolve to [`PersonaRecord::fallback`].
    pub fn resolve(&self, id: i64) -> ResolvedPersona {
        let record = self
            .find(id)
            .cloned()
            .unwrap_or_else(|| PersonaRecord::fallback(id));
        ResolvedPersona { record }
    }
}

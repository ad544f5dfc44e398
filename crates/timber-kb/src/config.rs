use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub retrieval: RetrievalConfig,
    pub lookup: LookupConfig,
    pub memory: MemoryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Chunks fetched per semantic search.
    pub top_k: usize,
    /// Conversation turns fed into the grounded prompt.
    pub history_turns: usize,
    /// Budget for each external provider call (embed, search, completion).
    pub provider_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupConfig {
    /// Spacing assumed when the question doesn't give one. 450mm is the
    /// standard stud/joist spacing and is carried through to display.
    pub default_spacing_mm: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Rolling history cap per user; oldest turns drop first.
    pub max_turns_per_user: usize,
}

impl EngineConfig {
    /// Validate config values, returning errors for clearly broken configurations.
    pub fn validate(&self) -> Result<(), String> {
        if self.retrieval.top_k == 0 {
            return Err("retrieval.top_k must be > 0".into());
        }
        if self.retrieval.provider_timeout_secs == 0 {
            return Err("retrieval.provider_timeout_secs must be > 0".into());
        }
        if self.lookup.default_spacing_mm == 0 {
            return Err("lookup.default_spacing_mm must be > 0".into());
        }
        if self.memory.max_turns_per_user == 0 {
            return Err("memory.max_turns_per_user must be > 0".into());
        }
        Ok(())
    }

    /// Load config from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {}", e))?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| format!("Failed to parse config: {}", e))?;
        config.validate()?;
        Ok(config)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            retrieval: RetrievalConfig {
                top_k: 4,
                history_turns: 5,
                provider_timeout_secs: 30,
            },
            lookup: LookupConfig {
                default_spacing_mm: 450,
            },
            memory: MemoryConfig {
                max_turns_per_user: 50,
            },
        }
    }
}

// epfinder/src/engine/sink.rs
//
// Appends the registry slots an event updated to <output>/epinfo.jsonl,
// one line per slot. Events that updated nothing write nothing.
// Point downstream flow analyses at this file.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

use crate::events::EpInfo;
use crate::registry::Registry;

pub const RESULTS_FILE: &str = "epinfo.jsonl";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultRecord {
    pub event_id:  u64,
    pub key:       String,
    pub info:      EpInfo,
    pub timestamp: DateTime<Utc>,
}

pub struct ResultSink {
    out: PathBuf,
}

impl ResultSink {
    pub fn new(output_dir: impl Into<PathBuf>) -> Result<Self> {
        let out: PathBuf = output_dir.into();
        std::fs::create_dir_all(&out)
            .with_context(|| format!("creating output directory {}", out.display()))?;
        Ok(Self { out })
    }

    pub fn path(&self) -> PathBuf {
        self.out.join(RESULTS_FILE)
    }

    /// Writes the current content of `keys`; absent slots are skipped.
    pub async fn write_event(&self, event_id: u64, registry: &Registry, keys: &[String]) -> Result<usize> {
        let mut lines = String::new();
        let mut n = 0;
        for key in keys {
            let Some(slot) = registry.lookup(key) else { continue };
            let record = ResultRecord {
                event_id,
                key:       key.clone(),
                info:      slot.read().clone(),
                timestamp: Utc::now(),
            };
            lines.push_str(&serde_json::to_string(&record)?);
            lines.push('\n');
            n += 1;
        }
        if n > 0 {
            self.append(&self.path(), &lines).await?;
        }
        Ok(n)
    }

    async fn append(&self, file: &Path, content: &str) -> Result<()> {
        let mut f = OpenOptions::new().create(true).append(true).open(file).await?;
        f.write_all(content.as_bytes()).await?;
        Ok(())
    }
}

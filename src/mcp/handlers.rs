//! Tool handlers backed by the reconciliation engine.

use std::sync::Arc;

use serde_json::Value;

use super::tools::ToolHandler;
use crate::reconcile::{LookupKeys, Reconciler};

/// Read an optional string argument; blank strings count as absent
fn optional_str<'a>(args: &'a Value, name: &str) -> Option<&'a str> {
    args.get(name)
        .and_then(|v| v.as_str())
        .filter(|s| !s.trim().is_empty())
}

/// Read a required, non-blank string argument
fn required_str<'a>(args: &'a Value, name: &str) -> Result<&'a str, String> {
    optional_str(args, name).ok_or_else(|| format!("Missing '{}' parameter", name))
}

/// Handler for enriching a single ad-hoc entry
#[derive(Debug)]
pub struct EnrichEntryHandler {
    pub reconciler: Arc<Reconciler>,
}

#[async_trait::async_trait]
impl ToolHandler for EnrichEntryHandler {
    async fn execute(&self, args: Value) -> Result<Value, String> {
        let cite_key = required_str(&args, "cite_key")?;
        let keys = LookupKeys::new(
            optional_str(&args, "title"),
            optional_str(&args, "arxiv_id"),
            optional_str(&args, "doi"),
        );

        let text = self
            .reconciler
            .enrich_entry(cite_key, keys)
            .await
            .map_err(|e| e.to_string())?;

        Ok(Value::String(text))
    }
}

/// Handler for enriching every entry of a `.bib` file in place
#[derive(Debug)]
pub struct EnrichFileHandler {
    pub reconciler: Arc<Reconciler>,
}

#[async_trait::async_trait]
impl ToolHandler for EnrichFileHandler {
    async fn execute(&self, args: Value) -> Result<Value, String> {
        let file_path = required_str(&args, "file_path")?;

        let summary = self
            .reconciler
            .enrich_collection(file_path)
            .await
            .map_err(|e| e.to_string())?;

        Ok(Value::String(summary.to_string()))
    }
}

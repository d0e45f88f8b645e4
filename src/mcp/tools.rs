//! Tool registry for MCP tools.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use crate::reconcile::Reconciler;

pub use super::handlers::{EnrichEntryHandler, EnrichFileHandler};

/// An MCP tool that can be called by the client
#[derive(Clone)]
pub struct Tool {
    /// Tool name (e.g., "enrich_bib_entry")
    pub name: String,

    /// Human-readable description
    pub description: String,

    /// JSON Schema for input parameters
    pub input_schema: serde_json::Value,

    /// Handler function to execute the tool
    pub handler: Arc<dyn ToolHandler>,
}

impl std::fmt::Debug for Tool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tool")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("input_schema", &self.input_schema)
            .finish()
    }
}

/// Handler for executing a tool
#[async_trait::async_trait]
pub trait ToolHandler: Send + Sync + std::fmt::Debug {
    /// Execute the tool with the given arguments
    async fn execute(&self, args: Value) -> Result<Value, String>;
}

/// Registry for all MCP tools
#[derive(Debug, Clone)]
pub struct ToolRegistry {
    tools: HashMap<String, Tool>,
}

impl ToolRegistry {
    /// Create a registry holding both enrichment tools
    pub fn from_reconciler(reconciler: Arc<Reconciler>) -> Self {
        let mut registry = Self {
            tools: HashMap::new(),
        };

        let providers = reconciler
            .registry()
            .all()
            .map(|s| s.name())
            .collect::<Vec<_>>()
            .join(", ");

        registry.register(Tool {
            name: "enrich_bib_entry".to_string(),
            description: format!(
                "Look up a paper on {} and return an enriched BibTeX entry. \
                 Give at least one of title, arxiv_id or doi.",
                providers
            ),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "cite_key": {
                        "type": "string",
                        "description": "Citation key for the generated entry"
                    },
                    "title": {
                        "type": "string",
                        "description": "Paper title to search for"
                    },
                    "arxiv_id": {
                        "type": "string",
                        "description": "arXiv identifier (e.g., '2401.12345')"
                    },
                    "doi": {
                        "type": "string",
                        "description": "Digital Object Identifier (e.g., '10.1109/cvpr.2016.90')"
                    }
                },
                "required": ["cite_key"]
            }),
            handler: Arc::new(EnrichEntryHandler {
                reconciler: reconciler.clone(),
            }),
        });

        registry.register(Tool {
            name: "enrich_bib_file".to_string(),
            description: "Enrich every entry of a BibTeX file in place and report how many were updated."
                .to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "file_path": {
                        "type": "string",
                        "description": "Path to the .bib file"
                    }
                },
                "required": ["file_path"]
            }),
            handler: Arc::new(EnrichFileHandler { reconciler }),
        });

        registry
    }

    /// Register a tool
    pub fn register(&mut self, tool: Tool) {
        self.tools.insert(tool.name.clone(), tool);
    }

    /// Get all tools
    pub fn all(&self) -> Vec<&Tool> {
        self.tools.values().collect()
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<&Tool> {
        self.tools.get(name)
    }

    /// Execute a tool by name
    pub async fn execute(&self, name: &str, args: Value) -> Result<Value, String> {
        let tool = self
            .get(name)
            .ok_or_else(|| format!("Tool '{}' not found", name))?;

        tool.handler.execute(args).await
    }
}

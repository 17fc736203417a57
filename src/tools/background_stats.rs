//! MCP `background_stats` tool parameter definition.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the `background_stats` MCP tool.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct BackgroundStatsParams {
    /// Optional book name to restrict statistics to.
    #[schemars(description = "Optional book to restrict stats to")]
    pub book: Option<String>,
}

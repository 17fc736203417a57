//! MCP `search_background` tool parameter definition.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the `search_background` MCP tool.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct SearchBackgroundParams {
    /// The text the writer is working on, used as the retrieval query.
    #[schemars(
        description = "Text to find background for, usually the passage being written or the writing instruction"
    )]
    pub query: String,

    /// Book whose background should be searched. Defaults to the configured book.
    #[schemars(description = "Book to search. Defaults to the configured default book.")]
    pub book: Option<String>,
}

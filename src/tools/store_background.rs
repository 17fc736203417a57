use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct StoreBackgroundParams {
    #[schemars(
        description = "Background type: 'worldview' (world rules/setting), 'character' (character sheet), 'chapter' (previous chapter text)"
    )]
    pub r#type: String,

    #[schemars(description = "Free text. Optional for characters that provide name and description.")]
    pub content: Option<String>,

    #[schemars(description = "Character name (characters only)")]
    pub name: Option<String>,

    #[schemars(description = "Character description (characters only)")]
    pub description: Option<String>,

    #[schemars(description = "Book this item belongs to. Defaults to the configured default book.")]
    pub book: Option<String>,
}

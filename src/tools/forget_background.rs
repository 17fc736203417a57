use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ForgetBackgroundParams {
    #[schemars(description = "ID of the background item to delete")]
    pub id: String,
}

use anyhow::{bail, Result};

use crate::config::LoreConfig;

/// Delete one background item by ID.
pub fn remove(config: &LoreConfig, id: &str) -> Result<()> {
    let conn = crate::db::open_database(config.resolved_db_path())?;
    if !crate::background::store::delete_item(&conn, id)? {
        bail!("background item not found: {id}");
    }
    println!("Deleted {id}");
    Ok(())
}

use super::Database;
use crate::errors::{HarnessError, Result};
use tracing::{info, warn};

const BACKUP_PREFIX: &str = "__backup_";

/// Whole-table snapshots taken before a group of scenarios and written back
/// after them.
///
/// Restoring is explicit; a backup dropped without [`TableBackup::restore`]
/// leaves its shadow tables behind and logs a warning.
#[derive(Debug)]
pub struct TableBackup {
    tables: Vec<String>,
    restored: bool,
}

fn check_identifier(table: &str) -> Result<()> {
    let valid = !table.is_empty()
        && table.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !table.starts_with(BACKUP_PREFIX);
    if valid {
        Ok(())
    } else {
        Err(HarnessError::InvalidTableName(table.to_string()))
    }
}

impl TableBackup {
    pub fn create(db: &Database, tables: &[&str]) -> Result<Self> {
        for table in tables {
            check_identifier(table)?;
        }

        let tx = db.connection().unchecked_transaction()?;
        for table in tables {
            tx.execute_batch(&format!(
                "DROP TABLE IF EXISTS \"{prefix}{t}\"; CREATE TABLE \"{prefix}{t}\" AS SELECT * FROM \"{t}\";",
                prefix = BACKUP_PREFIX,
                t = table
            ))?;
        }
        tx.commit()?;

        info!(tables = ?tables, "tables backed up");
        Ok(Self {
            tables: tables.iter().map(|t| t.to_string()).collect(),
            restored: false,
        })
    }

    pub fn tables(&self) -> &[String] {
        &self.tables
    }

    /// Puts every table back as it was and drops the shadow copies.
    pub fn restore(mut self, db: &Database) -> Result<()> {
        let tx = db.connection().unchecked_transaction()?;
        for table in &self.tables {
            tx.execute_batch(&format!(
                "DELETE FROM \"{t}\"; INSERT INTO \"{t}\" SELECT * FROM \"{prefix}{t}\"; DROP TABLE \"{prefix}{t}\";",
                prefix = BACKUP_PREFIX,
                t = table
            ))?;
        }
        tx.commit()?;

        self.restored = true;
        info!(tables = ?self.tables, "tables restored");
        Ok(())
    }
}

impl Drop for TableBackup {
    fn drop(&mut self) {
        if !self.restored {
            warn!(tables = ?self.tables, "table backup dropped without restore");
        }
    }
}

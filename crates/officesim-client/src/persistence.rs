//! Save/Load for the in-memory store
//!
//! Uses bincode to write every company record (banked points, stored
//! schedule, roster) to one binary blob. Live watches are not saved.

use std::collections::BTreeMap;
use std::io::{Read, Write};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::store::{CompanyRecord, MemoryStore};

/// Version number for save file format (increment when format changes)
const SAVE_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
pub struct SaveData {
    pub version: u32,
    pub companies: BTreeMap<String, CompanyRecord>,
}

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Bincode(#[from] Box<bincode::ErrorKind>),
    #[error("Save version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },
}

/// Save every company in the store to a writer.
pub fn save_store<W: Write>(writer: W, store: &MemoryStore) -> Result<(), SaveError> {
    let save_data = SaveData {
        version: SAVE_VERSION,
        companies: store.companies().clone(),
    };
    bincode::serialize_into(writer, &save_data)?;
    log::info!("Saved {} companies", save_data.companies.len());
    Ok(())
}

/// Load a store from a reader. The loaded store has no watches.
pub fn load_store<R: Read>(reader: R) -> Result<MemoryStore, SaveError> {
    let save_data: SaveData = bincode::deserialize_from(reader)?;

    if save_data.version != SAVE_VERSION {
        return Err(SaveError::VersionMismatch {
            expected: SAVE_VERSION,
            found: save_data.version,
        });
    }

    Ok(MemoryStore::from_companies(save_data.companies))
}

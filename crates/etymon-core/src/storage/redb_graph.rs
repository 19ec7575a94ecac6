//! # redb-backed Graph Storage
//!
//! A disk-backed graph store using the redb embedded database.
//!
//! Every mutation commits its own ACID transaction, so a crash between
//! operations leaves the file at the last committed operation:
//! - ACID transactions
//! - Crash safety (copy-on-write B-trees)
//! - MVCC (concurrent readers, single writer)
//! - Zero configuration
//!
//! ## Integration with Session
//!
//! This module provides `RedbGraph` which can be used as a persistent
//! storage backend for Etymon sessions. Unlike the in-memory
//! `MemoryGraph`, `RedbGraph` persists data to disk automatically.

use chrono::{DateTime, Utc};
use redb::{Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition};
use std::path::Path;

use crate::graph::{GraphSnapshot, GraphStore};
use crate::types::{
    Category, Creator, CreatorId, CreatorRole, EtymonError, InfluenceAttrs, Item, ItemId,
};

/// Table for items: id -> serialized Item bytes
const ITEMS: TableDefinition<&str, &[u8]> = TableDefinition::new("items");

/// Table for creators: id -> serialized Creator bytes
const CREATORS: TableDefinition<&str, &[u8]> = TableDefinition::new("creators");

/// Table for the exact-name creator index: name -> creator id
const CREATOR_NAMES: TableDefinition<&str, &str> = TableDefinition::new("creator_names");

/// Table for CREATED_BY links: (item id, creator id) -> serialized roles
const CREATED_BY: TableDefinition<(&str, &str), &[u8]> = TableDefinition::new("created_by");

/// Table for INFLUENCES edges: (source id, target id) -> serialized attrs
const INFLUENCES: TableDefinition<(&str, &str), &[u8]> = TableDefinition::new("influences");

/// Reverse edge index: (target id, source id) -> ()
///
/// Exists so incoming lookups and counts are range scans instead of full
/// table walks.
const REVERSE_INFLUENCES: TableDefinition<(&str, &str), ()> =
    TableDefinition::new("reverse_influences");

/// Table for categories: name -> serialized Category bytes
const CATEGORIES: TableDefinition<&str, &[u8]> = TableDefinition::new("categories");

/// A disk-backed graph store using redb.
pub struct RedbGraph {
    /// The redb database handle.
    db: Database,
}

impl std::fmt::Debug for RedbGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbGraph").finish_non_exhaustive()
    }
}

impl RedbGraph {
    /// Open or create a graph database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, EtymonError> {
        let db =
            Database::create(path.as_ref()).map_err(|e| EtymonError::StoreError(e.to_string()))?;

        // Initialize tables if they don't exist
        {
            let write_txn = db
                .begin_write()
                .map_err(|e| EtymonError::StoreError(e.to_string()))?;
            let _ = write_txn
                .open_table(ITEMS)
                .map_err(|e| EtymonError::StoreError(e.to_string()))?;
            let _ = write_txn
                .open_table(CREATORS)
                .map_err(|e| EtymonError::StoreError(e.to_string()))?;
            let _ = write_txn
                .open_table(CREATOR_NAMES)
                .map_err(|e| EtymonError::StoreError(e.to_string()))?;
            let _ = write_txn
                .open_table(CREATED_BY)
                .map_err(|e| EtymonError::StoreError(e.to_string()))?;
            let _ = write_txn
                .open_table(INFLUENCES)
                .map_err(|e| EtymonError::StoreError(e.to_string()))?;
            let _ = write_txn
                .open_table(REVERSE_INFLUENCES)
                .map_err(|e| EtymonError::StoreError(e.to_string()))?;
            let _ = write_txn
                .open_table(CATEGORIES)
                .map_err(|e| EtymonError::StoreError(e.to_string()))?;
            write_txn
                .commit()
                .map_err(|e| EtymonError::StoreError(e.to_string()))?;
        }

        Ok(Self { db })
    }

    /// Compact the database (optional optimization).
    pub fn compact(&mut self) -> Result<(), EtymonError> {
        self.db
            .compact()
            .map_err(|e| EtymonError::StoreError(e.to_string()))?;
        Ok(())
    }
}

// =============================================================================
// GRAPHSTORE TRAIT IMPLEMENTATION
// =============================================================================

impl GraphStore for RedbGraph {
    fn put_item(&mut self, item: Item) -> Result<(), EtymonError> {
        let bytes = postcard::to_allocvec(&item)
            .map_err(|e| EtymonError::SerializationError(e.to_string()))?;

        let write_txn = self
            .db
            .begin_write()
            .map_err(|e| EtymonError::StoreError(e.to_string()))?;
        {
            let mut items_table = write_txn
                .open_table(ITEMS)
                .map_err(|e| EtymonError::StoreError(e.to_string()))?;
            items_table
                .insert(item.id.as_str(), bytes.as_slice())
                .map_err(|e| EtymonError::StoreError(e.to_string()))?;
        }
        write_txn
            .commit()
            .map_err(|e| EtymonError::StoreError(e.to_string()))?;
        Ok(())
    }

    fn item(&self, id: &ItemId) -> Result<Option<Item>, EtymonError> {
        let read_txn = self
            .db
            .begin_read()
            .map_err(|e| EtymonError::StoreError(e.to_string()))?;
        let items_table = read_txn
            .open_table(ITEMS)
            .map_err(|e| EtymonError::StoreError(e.to_string()))?;

        match items_table
            .get(id.as_str())
            .map_err(|e| EtymonError::StoreError(e.to_string()))?
        {
            Some(data) => {
                let item: Item = postcard::from_bytes(data.value())
                    .map_err(|e| EtymonError::SerializationError(e.to_string()))?;
                Ok(Some(item))
            }
            None => Ok(None),
        }
    }

    fn items(&self) -> Result<Vec<Item>, EtymonError> {
        let read_txn = self
            .db
            .begin_read()
            .map_err(|e| EtymonError::StoreError(e.to_string()))?;
        let items_table = read_txn
            .open_table(ITEMS)
            .map_err(|e| EtymonError::StoreError(e.to_string()))?;

        let mut items = Vec::new();
        for entry in items_table
            .iter()
            .map_err(|e| EtymonError::StoreError(e.to_string()))?
        {
            let (_, value) = entry.map_err(|e| EtymonError::StoreError(e.to_string()))?;
            let item: Item = postcard::from_bytes(value.value())
                .map_err(|e| EtymonError::SerializationError(e.to_string()))?;
            items.push(item);
        }
        Ok(items)
    }

    fn contains_item(&self, id: &ItemId) -> Result<bool, EtymonError> {
        let read_txn = self
            .db
            .begin_read()
            .map_err(|e| EtymonError::StoreError(e.to_string()))?;
        let items_table = read_txn
            .open_table(ITEMS)
            .map_err(|e| EtymonError::StoreError(e.to_string()))?;

        Ok(items_table
            .get(id.as_str())
            .map_err(|e| EtymonError::StoreError(e.to_string()))?
            .is_some())
    }

    fn detach_delete_item(&mut self, id: &ItemId) -> Result<bool, EtymonError> {
        if !self.contains_item(id)? {
            return Ok(false);
        }

        let write_txn = self
            .db
            .begin_write()
            .map_err(|e| EtymonError::StoreError(e.to_string()))?;
        {
            let mut items_table = write_txn
                .open_table(ITEMS)
                .map_err(|e| EtymonError::StoreError(e.to_string()))?;
            let mut created_by_table = write_txn
                .open_table(CREATED_BY)
                .map_err(|e| EtymonError::StoreError(e.to_string()))?;
            let mut influences_table = write_txn
                .open_table(INFLUENCES)
                .map_err(|e| EtymonError::StoreError(e.to_string()))?;
            let mut reverse_table = write_txn
                .open_table(REVERSE_INFLUENCES)
                .map_err(|e| EtymonError::StoreError(e.to_string()))?;

            items_table
                .remove(id.as_str())
                .map_err(|e| EtymonError::StoreError(e.to_string()))?;

            // Creator links of this item.
            let creator_keys: Vec<String> = {
                let mut keys = Vec::new();
                for entry in created_by_table
                    .range((id.as_str(), "")..)
                    .map_err(|e| EtymonError::StoreError(e.to_string()))?
                {
                    let (key, _) = entry.map_err(|e| EtymonError::StoreError(e.to_string()))?;
                    let (item_key, creator_key) = key.value();
                    if item_key != id.as_str() {
                        break;
                    }
                    keys.push(creator_key.to_string());
                }
                keys
            };
            for creator_key in &creator_keys {
                created_by_table
                    .remove((id.as_str(), creator_key.as_str()))
                    .map_err(|e| EtymonError::StoreError(e.to_string()))?;
            }

            // Outgoing edges: forward rows plus their reverse entries.
            let outgoing_keys: Vec<String> = {
                let mut keys = Vec::new();
                for entry in influences_table
                    .range((id.as_str(), "")..)
                    .map_err(|e| EtymonError::StoreError(e.to_string()))?
                {
                    let (key, _) = entry.map_err(|e| EtymonError::StoreError(e.to_string()))?;
                    let (from_key, to_key) = key.value();
                    if from_key != id.as_str() {
                        break;
                    }
                    keys.push(to_key.to_string());
                }
                keys
            };
            for to_key in &outgoing_keys {
                influences_table
                    .remove((id.as_str(), to_key.as_str()))
                    .map_err(|e| EtymonError::StoreError(e.to_string()))?;
                reverse_table
                    .remove((to_key.as_str(), id.as_str()))
                    .map_err(|e| EtymonError::StoreError(e.to_string()))?;
            }

            // Incoming edges: reverse rows plus their forward entries.
            let incoming_keys: Vec<String> = {
                let mut keys = Vec::new();
                for entry in reverse_table
                    .range((id.as_str(), "")..)
                    .map_err(|e| EtymonError::StoreError(e.to_string()))?
                {
                    let (key, _) = entry.map_err(|e| EtymonError::StoreError(e.to_string()))?;
                    let (to_key, from_key) = key.value();
                    if to_key != id.as_str() {
                        break;
                    }
                    keys.push(from_key.to_string());
                }
                keys
            };
            for from_key in &incoming_keys {
                reverse_table
                    .remove((id.as_str(), from_key.as_str()))
                    .map_err(|e| EtymonError::StoreError(e.to_string()))?;
                influences_table
                    .remove((from_key.as_str(), id.as_str()))
                    .map_err(|e| EtymonError::StoreError(e.to_string()))?;
            }
        }
        write_txn
            .commit()
            .map_err(|e| EtymonError::StoreError(e.to_string()))?;

        Ok(true)
    }

    fn put_creator(&mut self, creator: Creator) -> Result<(), EtymonError> {
        let bytes = postcard::to_allocvec(&creator)
            .map_err(|e| EtymonError::SerializationError(e.to_string()))?;

        let write_txn = self
            .db
            .begin_write()
            .map_err(|e| EtymonError::StoreError(e.to_string()))?;
        {
            let mut creators_table = write_txn
                .open_table(CREATORS)
                .map_err(|e| EtymonError::StoreError(e.to_string()))?;
            creators_table
                .insert(creator.id.as_str(), bytes.as_slice())
                .map_err(|e| EtymonError::StoreError(e.to_string()))?;

            let mut names_table = write_txn
                .open_table(CREATOR_NAMES)
                .map_err(|e| EtymonError::StoreError(e.to_string()))?;
            names_table
                .insert(creator.name.as_str(), creator.id.as_str())
                .map_err(|e| EtymonError::StoreError(e.to_string()))?;
        }
        write_txn
            .commit()
            .map_err(|e| EtymonError::StoreError(e.to_string()))?;
        Ok(())
    }

    fn creator(&self, id: &CreatorId) -> Result<Option<Creator>, EtymonError> {
        let read_txn = self
            .db
            .begin_read()
            .map_err(|e| EtymonError::StoreError(e.to_string()))?;
        let creators_table = read_txn
            .open_table(CREATORS)
            .map_err(|e| EtymonError::StoreError(e.to_string()))?;

        match creators_table
            .get(id.as_str())
            .map_err(|e| EtymonError::StoreError(e.to_string()))?
        {
            Some(data) => {
                let creator: Creator = postcard::from_bytes(data.value())
                    .map_err(|e| EtymonError::SerializationError(e.to_string()))?;
                Ok(Some(creator))
            }
            None => Ok(None),
        }
    }

    fn creator_by_name(&self, name: &str) -> Result<Option<Creator>, EtymonError> {
        let read_txn = self
            .db
            .begin_read()
            .map_err(|e| EtymonError::StoreError(e.to_string()))?;
        let names_table = read_txn
            .open_table(CREATOR_NAMES)
            .map_err(|e| EtymonError::StoreError(e.to_string()))?;

        let creator_id = match names_table
            .get(name)
            .map_err(|e| EtymonError::StoreError(e.to_string()))?
        {
            Some(id) => id.value().to_string(),
            None => return Ok(None),
        };

        let creators_table = read_txn
            .open_table(CREATORS)
            .map_err(|e| EtymonError::StoreError(e.to_string()))?;
        match creators_table
            .get(creator_id.as_str())
            .map_err(|e| EtymonError::StoreError(e.to_string()))?
        {
            Some(data) => {
                let creator: Creator = postcard::from_bytes(data.value())
                    .map_err(|e| EtymonError::SerializationError(e.to_string()))?;
                Ok(Some(creator))
            }
            None => Ok(None),
        }
    }

    fn link_creator(
        &mut self,
        item: &ItemId,
        creator: &CreatorId,
        role: CreatorRole,
    ) -> Result<(), EtymonError> {
        if !self.contains_item(item)? {
            return Err(EtymonError::item_not_found(item));
        }
        if self.creator(creator)?.is_none() {
            return Err(EtymonError::NotFound(format!("creator '{creator}'")));
        }

        let write_txn = self
            .db
            .begin_write()
            .map_err(|e| EtymonError::StoreError(e.to_string()))?;
        {
            let mut created_by_table = write_txn
                .open_table(CREATED_BY)
                .map_err(|e| EtymonError::StoreError(e.to_string()))?;

            // Read-modify-write of the role list within the transaction.
            let mut roles: Vec<CreatorRole> = match created_by_table
                .get((item.as_str(), creator.as_str()))
                .map_err(|e| EtymonError::StoreError(e.to_string()))?
            {
                Some(data) => postcard::from_bytes(data.value())
                    .map_err(|e| EtymonError::SerializationError(e.to_string()))?,
                None => Vec::new(),
            };

            if !roles.contains(&role) {
                roles.push(role);
                roles.sort();
            }

            let bytes = postcard::to_allocvec(&roles)
                .map_err(|e| EtymonError::SerializationError(e.to_string()))?;
            created_by_table
                .insert((item.as_str(), creator.as_str()), bytes.as_slice())
                .map_err(|e| EtymonError::StoreError(e.to_string()))?;
        }
        write_txn
            .commit()
            .map_err(|e| EtymonError::StoreError(e.to_string()))?;
        Ok(())
    }

    fn creators_of(&self, item: &ItemId) -> Result<Vec<(Creator, CreatorRole)>, EtymonError> {
        let read_txn = self
            .db
            .begin_read()
            .map_err(|e| EtymonError::StoreError(e.to_string()))?;
        let created_by_table = read_txn
            .open_table(CREATED_BY)
            .map_err(|e| EtymonError::StoreError(e.to_string()))?;

        let mut links: Vec<(String, Vec<CreatorRole>)> = Vec::new();
        for entry in created_by_table
            .range((item.as_str(), "")..)
            .map_err(|e| EtymonError::StoreError(e.to_string()))?
        {
            let (key, value) = entry.map_err(|e| EtymonError::StoreError(e.to_string()))?;
            let (item_key, creator_key) = key.value();
            if item_key != item.as_str() {
                break;
            }
            let roles: Vec<CreatorRole> = postcard::from_bytes(value.value())
                .map_err(|e| EtymonError::SerializationError(e.to_string()))?;
            links.push((creator_key.to_string(), roles));
        }

        let creators_table = read_txn
            .open_table(CREATORS)
            .map_err(|e| EtymonError::StoreError(e.to_string()))?;

        let mut result = Vec::new();
        for (creator_key, roles) in links {
            let Some(data) = creators_table
                .get(creator_key.as_str())
                .map_err(|e| EtymonError::StoreError(e.to_string()))?
            else {
                continue;
            };
            let creator: Creator = postcard::from_bytes(data.value())
                .map_err(|e| EtymonError::SerializationError(e.to_string()))?;
            for role in roles {
                result.push((creator.clone(), role));
            }
        }
        Ok(result)
    }

    fn put_influence(
        &mut self,
        from: &ItemId,
        to: &ItemId,
        attrs: InfluenceAttrs,
    ) -> Result<(), EtymonError> {
        if !self.contains_item(from)? {
            return Err(EtymonError::item_not_found(from));
        }
        if !self.contains_item(to)? {
            return Err(EtymonError::item_not_found(to));
        }

        let bytes = postcard::to_allocvec(&attrs)
            .map_err(|e| EtymonError::SerializationError(e.to_string()))?;

        let write_txn = self
            .db
            .begin_write()
            .map_err(|e| EtymonError::StoreError(e.to_string()))?;
        {
            let mut influences_table = write_txn
                .open_table(INFLUENCES)
                .map_err(|e| EtymonError::StoreError(e.to_string()))?;
            influences_table
                .insert((from.as_str(), to.as_str()), bytes.as_slice())
                .map_err(|e| EtymonError::StoreError(e.to_string()))?;

            let mut reverse_table = write_txn
                .open_table(REVERSE_INFLUENCES)
                .map_err(|e| EtymonError::StoreError(e.to_string()))?;
            reverse_table
                .insert((to.as_str(), from.as_str()), ())
                .map_err(|e| EtymonError::StoreError(e.to_string()))?;
        }
        write_txn
            .commit()
            .map_err(|e| EtymonError::StoreError(e.to_string()))?;
        Ok(())
    }

    fn influence(
        &self,
        from: &ItemId,
        to: &ItemId,
    ) -> Result<Option<InfluenceAttrs>, EtymonError> {
        let read_txn = self
            .db
            .begin_read()
            .map_err(|e| EtymonError::StoreError(e.to_string()))?;
        let influences_table = read_txn
            .open_table(INFLUENCES)
            .map_err(|e| EtymonError::StoreError(e.to_string()))?;

        match influences_table
            .get((from.as_str(), to.as_str()))
            .map_err(|e| EtymonError::StoreError(e.to_string()))?
        {
            Some(data) => {
                let attrs: InfluenceAttrs = postcard::from_bytes(data.value())
                    .map_err(|e| EtymonError::SerializationError(e.to_string()))?;
                Ok(Some(attrs))
            }
            None => Ok(None),
        }
    }

    fn remove_influence(&mut self, from: &ItemId, to: &ItemId) -> Result<bool, EtymonError> {
        let write_txn = self
            .db
            .begin_write()
            .map_err(|e| EtymonError::StoreError(e.to_string()))?;
        let removed = {
            let mut influences_table = write_txn
                .open_table(INFLUENCES)
                .map_err(|e| EtymonError::StoreError(e.to_string()))?;
            let removed = influences_table
                .remove((from.as_str(), to.as_str()))
                .map_err(|e| EtymonError::StoreError(e.to_string()))?
                .is_some();

            if removed {
                let mut reverse_table = write_txn
                    .open_table(REVERSE_INFLUENCES)
                    .map_err(|e| EtymonError::StoreError(e.to_string()))?;
                reverse_table
                    .remove((to.as_str(), from.as_str()))
                    .map_err(|e| EtymonError::StoreError(e.to_string()))?;
            }
            removed
        };
        write_txn
            .commit()
            .map_err(|e| EtymonError::StoreError(e.to_string()))?;
        Ok(removed)
    }

    fn incoming(&self, to: &ItemId) -> Result<Vec<(ItemId, InfluenceAttrs)>, EtymonError> {
        let read_txn = self
            .db
            .begin_read()
            .map_err(|e| EtymonError::StoreError(e.to_string()))?;
        let reverse_table = read_txn
            .open_table(REVERSE_INFLUENCES)
            .map_err(|e| EtymonError::StoreError(e.to_string()))?;

        let mut sources = Vec::new();
        for entry in reverse_table
            .range((to.as_str(), "")..)
            .map_err(|e| EtymonError::StoreError(e.to_string()))?
        {
            let (key, _) = entry.map_err(|e| EtymonError::StoreError(e.to_string()))?;
            let (to_key, from_key) = key.value();
            if to_key != to.as_str() {
                break;
            }
            sources.push(from_key.to_string());
        }

        let influences_table = read_txn
            .open_table(INFLUENCES)
            .map_err(|e| EtymonError::StoreError(e.to_string()))?;

        let mut result = Vec::new();
        for from_key in sources {
            let Some(data) = influences_table
                .get((from_key.as_str(), to.as_str()))
                .map_err(|e| EtymonError::StoreError(e.to_string()))?
            else {
                continue;
            };
            let attrs: InfluenceAttrs = postcard::from_bytes(data.value())
                .map_err(|e| EtymonError::SerializationError(e.to_string()))?;
            result.push((ItemId::new(from_key), attrs));
        }
        Ok(result)
    }

    fn outgoing(&self, from: &ItemId) -> Result<Vec<(ItemId, InfluenceAttrs)>, EtymonError> {
        let read_txn = self
            .db
            .begin_read()
            .map_err(|e| EtymonError::StoreError(e.to_string()))?;
        let influences_table = read_txn
            .open_table(INFLUENCES)
            .map_err(|e| EtymonError::StoreError(e.to_string()))?;

        let mut result = Vec::new();
        for entry in influences_table
            .range((from.as_str(), "")..)
            .map_err(|e| EtymonError::StoreError(e.to_string()))?
        {
            let (key, value) = entry.map_err(|e| EtymonError::StoreError(e.to_string()))?;
            let (from_key, to_key) = key.value();
            if from_key != from.as_str() {
                break;
            }
            let attrs: InfluenceAttrs = postcard::from_bytes(value.value())
                .map_err(|e| EtymonError::SerializationError(e.to_string()))?;
            result.push((ItemId::new(to_key), attrs));
        }
        Ok(result)
    }

    fn incoming_count(&self, to: &ItemId) -> Result<usize, EtymonError> {
        let read_txn = self
            .db
            .begin_read()
            .map_err(|e| EtymonError::StoreError(e.to_string()))?;
        let reverse_table = read_txn
            .open_table(REVERSE_INFLUENCES)
            .map_err(|e| EtymonError::StoreError(e.to_string()))?;

        // Count keys in the range; values never leave the store.
        let mut count = 0;
        for entry in reverse_table
            .range((to.as_str(), "")..)
            .map_err(|e| EtymonError::StoreError(e.to_string()))?
        {
            let (key, _) = entry.map_err(|e| EtymonError::StoreError(e.to_string()))?;
            let (to_key, _) = key.value();
            if to_key != to.as_str() {
                break;
            }
            count += 1;
        }
        Ok(count)
    }

    fn outgoing_count(&self, from: &ItemId) -> Result<usize, EtymonError> {
        let read_txn = self
            .db
            .begin_read()
            .map_err(|e| EtymonError::StoreError(e.to_string()))?;
        let influences_table = read_txn
            .open_table(INFLUENCES)
            .map_err(|e| EtymonError::StoreError(e.to_string()))?;

        let mut count = 0;
        for entry in influences_table
            .range((from.as_str(), "")..)
            .map_err(|e| EtymonError::StoreError(e.to_string()))?
        {
            let (key, _) = entry.map_err(|e| EtymonError::StoreError(e.to_string()))?;
            let (from_key, _) = key.value();
            if from_key != from.as_str() {
                break;
            }
            count += 1;
        }
        Ok(count)
    }

    fn bump_category(
        &mut self,
        name: &str,
        created_at: DateTime<Utc>,
    ) -> Result<Category, EtymonError> {
        let write_txn = self
            .db
            .begin_write()
            .map_err(|e| EtymonError::StoreError(e.to_string()))?;
        let category = {
            let mut categories_table = write_txn
                .open_table(CATEGORIES)
                .map_err(|e| EtymonError::StoreError(e.to_string()))?;

            let category = match categories_table
                .get(name)
                .map_err(|e| EtymonError::StoreError(e.to_string()))?
            {
                Some(data) => {
                    let mut category: Category = postcard::from_bytes(data.value())
                        .map_err(|e| EtymonError::SerializationError(e.to_string()))?;
                    category.usage_count = category.usage_count.saturating_add(1);
                    category
                }
                None => Category {
                    name: name.to_string(),
                    usage_count: 1,
                    created_at: Some(created_at),
                },
            };

            let bytes = postcard::to_allocvec(&category)
                .map_err(|e| EtymonError::SerializationError(e.to_string()))?;
            categories_table
                .insert(name, bytes.as_slice())
                .map_err(|e| EtymonError::StoreError(e.to_string()))?;
            category
        };
        write_txn
            .commit()
            .map_err(|e| EtymonError::StoreError(e.to_string()))?;
        Ok(category)
    }

    fn category(&self, name: &str) -> Result<Option<Category>, EtymonError> {
        let read_txn = self
            .db
            .begin_read()
            .map_err(|e| EtymonError::StoreError(e.to_string()))?;
        let categories_table = read_txn
            .open_table(CATEGORIES)
            .map_err(|e| EtymonError::StoreError(e.to_string()))?;

        match categories_table
            .get(name)
            .map_err(|e| EtymonError::StoreError(e.to_string()))?
        {
            Some(data) => {
                let category: Category = postcard::from_bytes(data.value())
                    .map_err(|e| EtymonError::SerializationError(e.to_string()))?;
                Ok(Some(category))
            }
            None => Ok(None),
        }
    }

    fn categories(&self) -> Result<Vec<Category>, EtymonError> {
        let read_txn = self
            .db
            .begin_read()
            .map_err(|e| EtymonError::StoreError(e.to_string()))?;
        let categories_table = read_txn
            .open_table(CATEGORIES)
            .map_err(|e| EtymonError::StoreError(e.to_string()))?;

        let mut categories = Vec::new();
        for entry in categories_table
            .iter()
            .map_err(|e| EtymonError::StoreError(e.to_string()))?
        {
            let (_, value) = entry.map_err(|e| EtymonError::StoreError(e.to_string()))?;
            let category: Category = postcard::from_bytes(value.value())
                .map_err(|e| EtymonError::SerializationError(e.to_string()))?;
            categories.push(category);
        }
        Ok(categories)
    }

    fn item_count(&self) -> Result<usize, EtymonError> {
        let read_txn = self
            .db
            .begin_read()
            .map_err(|e| EtymonError::StoreError(e.to_string()))?;
        let items_table = read_txn
            .open_table(ITEMS)
            .map_err(|e| EtymonError::StoreError(e.to_string()))?;
        let count = items_table
            .len()
            .map_err(|e| EtymonError::StoreError(e.to_string()))?;
        Ok(count as usize)
    }

    fn creator_count(&self) -> Result<usize, EtymonError> {
        let read_txn = self
            .db
            .begin_read()
            .map_err(|e| EtymonError::StoreError(e.to_string()))?;
        let creators_table = read_txn
            .open_table(CREATORS)
            .map_err(|e| EtymonError::StoreError(e.to_string()))?;
        let count = creators_table
            .len()
            .map_err(|e| EtymonError::StoreError(e.to_string()))?;
        Ok(count as usize)
    }

    fn influence_count(&self) -> Result<usize, EtymonError> {
        let read_txn = self
            .db
            .begin_read()
            .map_err(|e| EtymonError::StoreError(e.to_string()))?;
        let influences_table = read_txn
            .open_table(INFLUENCES)
            .map_err(|e| EtymonError::StoreError(e.to_string()))?;
        let count = influences_table
            .len()
            .map_err(|e| EtymonError::StoreError(e.to_string()))?;
        Ok(count as usize)
    }

    fn snapshot(&self) -> Result<GraphSnapshot, EtymonError> {
        let items = self.items()?;

        let read_txn = self
            .db
            .begin_read()
            .map_err(|e| EtymonError::StoreError(e.to_string()))?;

        let mut creators = Vec::new();
        {
            let creators_table = read_txn
                .open_table(CREATORS)
                .map_err(|e| EtymonError::StoreError(e.to_string()))?;
            for entry in creators_table
                .iter()
                .map_err(|e| EtymonError::StoreError(e.to_string()))?
            {
                let (_, value) = entry.map_err(|e| EtymonError::StoreError(e.to_string()))?;
                let creator: Creator = postcard::from_bytes(value.value())
                    .map_err(|e| EtymonError::SerializationError(e.to_string()))?;
                creators.push(creator);
            }
        }

        let mut created_by = Vec::new();
        {
            let created_by_table = read_txn
                .open_table(CREATED_BY)
                .map_err(|e| EtymonError::StoreError(e.to_string()))?;
            for entry in created_by_table
                .iter()
                .map_err(|e| EtymonError::StoreError(e.to_string()))?
            {
                let (key, value) = entry.map_err(|e| EtymonError::StoreError(e.to_string()))?;
                let (item_key, creator_key) = key.value();
                let roles: Vec<CreatorRole> = postcard::from_bytes(value.value())
                    .map_err(|e| EtymonError::SerializationError(e.to_string()))?;
                for role in roles {
                    created_by.push((
                        ItemId::new(item_key),
                        CreatorId::new(creator_key),
                        role,
                    ));
                }
            }
        }

        let mut influences = Vec::new();
        {
            let influences_table = read_txn
                .open_table(INFLUENCES)
                .map_err(|e| EtymonError::StoreError(e.to_string()))?;
            for entry in influences_table
                .iter()
                .map_err(|e| EtymonError::StoreError(e.to_string()))?
            {
                let (key, value) = entry.map_err(|e| EtymonError::StoreError(e.to_string()))?;
                let (from_key, to_key) = key.value();
                let attrs: InfluenceAttrs = postcard::from_bytes(value.value())
                    .map_err(|e| EtymonError::SerializationError(e.to_string()))?;
                influences.push((ItemId::new(from_key), ItemId::new(to_key), attrs));
            }
        }

        let categories = self.categories()?;

        Ok(GraphSnapshot {
            items,
            creators,
            created_by,
            influences,
            categories,
        })
    }

    fn load_snapshot(&mut self, snapshot: GraphSnapshot) -> Result<(), EtymonError> {
        // Rebuilding in memory first keeps the dangling-edge policy in one
        // place and validates the snapshot before the old data is dropped.
        let staged = crate::graph::MemoryGraph::from(snapshot);
        let clean = staged.snapshot()?;

        let write_txn = self
            .db
            .begin_write()
            .map_err(|e| EtymonError::StoreError(e.to_string()))?;

        write_txn
            .delete_table(ITEMS)
            .map_err(|e| EtymonError::StoreError(e.to_string()))?;
        write_txn
            .delete_table(CREATORS)
            .map_err(|e| EtymonError::StoreError(e.to_string()))?;
        write_txn
            .delete_table(CREATOR_NAMES)
            .map_err(|e| EtymonError::StoreError(e.to_string()))?;
        write_txn
            .delete_table(CREATED_BY)
            .map_err(|e| EtymonError::StoreError(e.to_string()))?;
        write_txn
            .delete_table(INFLUENCES)
            .map_err(|e| EtymonError::StoreError(e.to_string()))?;
        write_txn
            .delete_table(REVERSE_INFLUENCES)
            .map_err(|e| EtymonError::StoreError(e.to_string()))?;
        write_txn
            .delete_table(CATEGORIES)
            .map_err(|e| EtymonError::StoreError(e.to_string()))?;

        {
            let mut items_table = write_txn
                .open_table(ITEMS)
                .map_err(|e| EtymonError::StoreError(e.to_string()))?;
            for item in &clean.items {
                let bytes = postcard::to_allocvec(item)
                    .map_err(|e| EtymonError::SerializationError(e.to_string()))?;
                items_table
                    .insert(item.id.as_str(), bytes.as_slice())
                    .map_err(|e| EtymonError::StoreError(e.to_string()))?;
            }

            let mut creators_table = write_txn
                .open_table(CREATORS)
                .map_err(|e| EtymonError::StoreError(e.to_string()))?;
            let mut names_table = write_txn
                .open_table(CREATOR_NAMES)
                .map_err(|e| EtymonError::StoreError(e.to_string()))?;
            for creator in &clean.creators {
                let bytes = postcard::to_allocvec(creator)
                    .map_err(|e| EtymonError::SerializationError(e.to_string()))?;
                creators_table
                    .insert(creator.id.as_str(), bytes.as_slice())
                    .map_err(|e| EtymonError::StoreError(e.to_string()))?;
                names_table
                    .insert(creator.name.as_str(), creator.id.as_str())
                    .map_err(|e| EtymonError::StoreError(e.to_string()))?;
            }

            let mut created_by_table = write_txn
                .open_table(CREATED_BY)
                .map_err(|e| EtymonError::StoreError(e.to_string()))?;
            let mut grouped: std::collections::BTreeMap<(String, String), Vec<CreatorRole>> =
                std::collections::BTreeMap::new();
            for (item, creator, role) in &clean.created_by {
                grouped
                    .entry((item.as_str().to_string(), creator.as_str().to_string()))
                    .or_default()
                    .push(role.clone());
            }
            for ((item_key, creator_key), mut roles) in grouped {
                roles.sort();
                roles.dedup();
                let bytes = postcard::to_allocvec(&roles)
                    .map_err(|e| EtymonError::SerializationError(e.to_string()))?;
                created_by_table
                    .insert((item_key.as_str(), creator_key.as_str()), bytes.as_slice())
                    .map_err(|e| EtymonError::StoreError(e.to_string()))?;
            }

            let mut influences_table = write_txn
                .open_table(INFLUENCES)
                .map_err(|e| EtymonError::StoreError(e.to_string()))?;
            let mut reverse_table = write_txn
                .open_table(REVERSE_INFLUENCES)
                .map_err(|e| EtymonError::StoreError(e.to_string()))?;
            for (from, to, attrs) in &clean.influences {
                let bytes = postcard::to_allocvec(attrs)
                    .map_err(|e| EtymonError::SerializationError(e.to_string()))?;
                influences_table
                    .insert((from.as_str(), to.as_str()), bytes.as_slice())
                    .map_err(|e| EtymonError::StoreError(e.to_string()))?;
                reverse_table
                    .insert((to.as_str(), from.as_str()), ())
                    .map_err(|e| EtymonError::StoreError(e.to_string()))?;
            }

            let mut categories_table = write_txn
                .open_table(CATEGORIES)
                .map_err(|e| EtymonError::StoreError(e.to_string()))?;
            for category in &clean.categories {
                let bytes = postcard::to_allocvec(category)
                    .map_err(|e| EtymonError::SerializationError(e.to_string()))?;
                categories_table
                    .insert(category.name.as_str(), bytes.as_slice())
                    .map_err(|e| EtymonError::StoreError(e.to_string()))?;
            }
        }

        write_txn
            .commit()
            .map_err(|e| EtymonError::StoreError(e.to_string()))?;
        Ok(())
    }
}

//! # Types Module
//!
//! Core type definitions for the Etymon engine.
//!
//! - Strongly-typed identifiers (no raw strings at API boundaries)
//! - Domain entities: items, creators, influence attributes, categories
//! - The error taxonomy every engine operation reports through

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Unique identifier of an item node.
///
/// Generated once at creation (see `identity`), never reassigned.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ItemId(pub String);

impl ItemId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier of a creator node.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CreatorId(pub String);

impl CreatorId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CreatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// ENUMERATIONS
// =============================================================================

/// Granularity tier of an influence edge.
///
/// - `Macro`: foundational movements, genres, whole traditions
/// - `Micro`: specific techniques or works
/// - `Nano`: granular details (a single sample, a camera angle)
///
/// Declaration order defines the sort order used in scope listings.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Macro,
    Micro,
    Nano,
}

impl Scope {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Macro => "macro",
            Self::Micro => "micro",
            Self::Nano => "nano",
        }
    }
}

impl FromStr for Scope {
    type Err = EtymonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "macro" => Ok(Self::Macro),
            "micro" => Ok(Self::Micro),
            "nano" => Ok(Self::Nano),
            other => Err(EtymonError::Validation(format!(
                "unknown scope '{other}' (expected macro, micro, or nano)"
            ))),
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Kind of creator behind an item.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum CreatorType {
    #[default]
    Person,
    Organization,
    Collective,
}

impl CreatorType {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Person => "person",
            Self::Organization => "organization",
            Self::Collective => "collective",
        }
    }
}

impl FromStr for CreatorType {
    type Err = EtymonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "person" => Ok(Self::Person),
            "organization" => Ok(Self::Organization),
            "collective" => Ok(Self::Collective),
            other => Err(EtymonError::Validation(format!(
                "unknown creator type '{other}'"
            ))),
        }
    }
}

impl fmt::Display for CreatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Provenance quality of an item record.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    #[default]
    AiGenerated,
    UserVerified,
    CommunityVerified,
}

impl VerificationStatus {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AiGenerated => "ai_generated",
            Self::UserVerified => "user_verified",
            Self::CommunityVerified => "community_verified",
        }
    }
}

impl FromStr for VerificationStatus {
    type Err = EtymonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ai_generated" => Ok(Self::AiGenerated),
            "user_verified" => Ok(Self::UserVerified),
            "community_verified" => Ok(Self::CommunityVerified),
            other => Err(EtymonError::Validation(format!(
                "unknown verification status '{other}'"
            ))),
        }
    }
}

impl fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// ENTITIES
// =============================================================================

/// A creative work or concept node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    #[serde(default)]
    pub auto_detected_type: Option<String>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub description: Option<String>,
    /// Provenance quality of the record, 0.0–1.0. Stored, never computed on.
    #[serde(default)]
    pub confidence_score: Option<f64>,
    #[serde(default)]
    pub verification_status: VerificationStatus,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// A person, organization, or collective responsible for items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Creator {
    pub id: CreatorId,
    pub name: String,
    #[serde(rename = "type", default)]
    pub creator_type: CreatorType,
}

/// Attribute set of a directed `INFLUENCES` edge.
///
/// At most one edge exists per ordered item pair; re-asserting a pair
/// overwrites this whole record (upsert).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InfluenceAttrs {
    /// How certain the producing process is, 0.0–1.0.
    pub confidence: f64,
    pub influence_type: String,
    pub explanation: String,
    pub category: String,
    /// Absent on edges written before scopes existed. Any scope filter
    /// excludes scope-less edges; unfiltered reads include them.
    #[serde(default)]
    pub scope: Option<Scope>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub year_of_influence: Option<i32>,
    /// Free-form tags naming which aspect of the target was affected.
    #[serde(default)]
    pub clusters: Vec<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// A lightweight tag node, created lazily on first use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    pub usage_count: u64,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Role label on a `CREATED_BY` edge, e.g. "primary_creator".
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CreatorRole(pub String);

impl CreatorRole {
    #[must_use]
    pub fn new(role: impl Into<String>) -> Self {
        Self(role.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The role used for the creator supplied with a candidate payload.
    #[must_use]
    pub fn primary() -> Self {
        Self::new("primary_creator")
    }
}

impl fmt::Display for CreatorRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// CANDIDATE PAYLOAD
// =============================================================================

/// The main-item portion of a candidate payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateItem {
    pub name: String,
    #[serde(rename = "type", default)]
    pub item_type: Option<String>,
    #[serde(default)]
    pub creator: Option<String>,
    #[serde(default)]
    pub creator_type: Option<CreatorType>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub description: Option<String>,
}

impl CandidateItem {
    /// A candidate main item with only a name; other fields default.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            item_type: None,
            creator: None,
            creator_type: None,
            year: None,
            description: None,
        }
    }
}

/// One proposed influence on the main item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateInfluence {
    pub name: String,
    #[serde(rename = "type", default)]
    pub item_type: Option<String>,
    #[serde(default)]
    pub creator_name: Option<String>,
    #[serde(default)]
    pub creator_type: Option<CreatorType>,
    #[serde(default)]
    pub year: Option<i32>,
    /// How certain the producing process is, 0.0–1.0.
    pub confidence: f64,
    #[serde(default)]
    pub influence_type: Option<String>,
    #[serde(default)]
    pub explanation: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub scope: Option<Scope>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub clusters: Vec<String>,
}

impl CandidateInfluence {
    /// A candidate influence with only a name and confidence.
    #[must_use]
    pub fn new(name: impl Into<String>, confidence: f64) -> Self {
        Self {
            name: name.into(),
            item_type: None,
            creator_name: None,
            creator_type: None,
            year: None,
            confidence,
            influence_type: None,
            explanation: None,
            category: None,
            scope: None,
            source: None,
            clusters: Vec::new(),
        }
    }
}

/// A complete proposal from the external generation process: one main item
/// plus the influences claimed to have shaped it.
///
/// Strictly typed at the boundary — nothing unvalidated reaches the
/// conflict or merge logic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidatePayload {
    pub main_item: CandidateItem,
    #[serde(default)]
    pub influences: Vec<CandidateInfluence>,
}

impl CandidatePayload {
    /// A payload around a main item, with no influences yet.
    #[must_use]
    pub fn new(main_item: CandidateItem) -> Self {
        Self {
            main_item,
            influences: Vec::new(),
        }
    }
}

// =============================================================================
// ERROR HANDLING
// =============================================================================

/// Errors that can occur in Etymon operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EtymonError {
    /// Malformed or missing required fields, caught before any write.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// A referenced id is absent from the store.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A structurally invalid request, e.g. merging an item into itself.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// An unresolved exact-match creation; re-run conflict detection.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Backend failure passed through unchanged; never retried here.
    #[error("Store error: {0}")]
    StoreError(String),

    /// Serialization failed.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// I/O operation failed.
    #[error("I/O error: {0}")]
    IoError(String),
}

impl EtymonError {
    /// Not-found error for an item id.
    #[must_use]
    pub fn item_not_found(id: &ItemId) -> Self {
        Self::NotFound(format!("item '{id}'"))
    }
}

// =============================================================================
// TESTS
// =============================================================================

//! # Innate Primitives
//!
//! Hardcoded runtime constants for the Etymon CORE.
//!
//! Etymon starts with zero data but fixed logic.
//! These primitives are compiled into the binary and are immutable at runtime.
//!
//! ## Primitives
//!
//! 1. **Identity Primitive**: How item and creator ids are minted.
//! 2. **Similarity Primitive**: The score ladder used by entity resolution.
//! 3. **Validation Primitive**: Input limits enforced before any write.

/// Magic bytes for the Etymon binary format header.
///
/// - File Header = Magic Bytes ("ETYM") + Version (u8) before payload.
pub const MAGIC_BYTES: &[u8; 4] = b"ETYM";

/// Current serialization format version.
///
/// Increment this when making breaking changes to the serialization format.
pub const FORMAT_VERSION: u8 = 1;

/// Number of random hex characters appended to every generated id.
///
/// The suffix is what makes ids unique; the slug prefix is only for
/// readability. Two items named identically still get distinct ids.
pub const ID_SUFFIX_LENGTH: usize = 8;

// =============================================================================
// SIMILARITY SCORE LADDER
// =============================================================================

/// Score for a case-insensitive exact name match.
pub const SCORE_EXACT: u32 = 100;

/// Score when the candidate name is contained in an existing name.
pub const SCORE_CANDIDATE_IN_EXISTING: u32 = 90;

/// Score when an existing name is contained in the candidate name.
pub const SCORE_EXISTING_IN_CANDIDATE: u32 = 85;

/// Ceiling for token-overlap scores.
///
/// Token overlap can never outrank a containment match.
pub const SCORE_TOKEN_OVERLAP_CAP: u32 = 80;

/// Minimum token-overlap percentage that counts as a match at all.
pub const TOKEN_OVERLAP_MIN_PCT: u32 = 60;

/// Shorter names than this never trigger containment matching.
///
/// Prevents "It" matching inside half the catalogue.
pub const MIN_CONTAINMENT_LENGTH: usize = 4;

/// Tokens shorter than this are dropped before overlap comparison.
pub const MIN_TOKEN_LENGTH: usize = 3;

/// Words ignored entirely during token-overlap comparison.
pub const STOP_WORDS: &[&str] = &["the", "a", "an", "of", "and"];

/// Maximum number of similar items returned per lookup.
pub const MAX_SIMILAR_RESULTS: usize = 5;

/// Names treated as placeholders rather than real influences.
///
/// Compared case-insensitively after trimming. The empty string covers
/// whitespace-only names.
pub const SENTINEL_NAMES: &[&str] = &["none", "null", ""];

// =============================================================================
// QUERY BOUNDS
// =============================================================================

/// Maximum rows returned by a name search.
pub const MAX_SEARCH_RESULTS: usize = 10;

/// Maximum hop distance honored by neighborhood expansion.
///
/// All queries must be computationally bounded. Requests for deeper
/// expansions are clamped, not rejected.
pub const MAX_EXPANSION_DEPTH: usize = 1;

// =============================================================================
// DEFAULT ATTRIBUTE VALUES
// =============================================================================

/// Explanation written on an influence edge when none was supplied.
pub const DEFAULT_EXPLANATION: &str = "No explanation provided";

/// Category written on an influence edge when none was supplied.
pub const DEFAULT_CATEGORY: &str = "Uncategorized";

/// Influence type written on an edge when none was supplied.
pub const DEFAULT_INFLUENCE_TYPE: &str = "other";

// =============================================================================
// INPUT VALIDATION LIMITS
// =============================================================================

/// Maximum length for item and creator names.
///
/// Names longer than this will be rejected before any write.
/// This prevents memory exhaustion from malicious or malformed input.
pub const MAX_NAME_LENGTH: usize = 512;

/// Maximum length for free-text fields (descriptions, explanations).
///
/// Texts longer than this (64KB) will be rejected before any write.
pub const MAX_TEXT_LENGTH: usize = 65536;

/// Maximum number of influences accepted in a single candidate payload.
///
/// Larger payloads will be rejected to prevent DoS.
pub const MAX_INFLUENCES_PER_CANDIDATE: usize = 1000;

//! # Identity
//!
//! Id minting for items and creators.
//!
//! Ids are human-readable slugs with a random hex suffix:
//! `"stan-song-1a2b3c4d"`. The suffix alone guarantees uniqueness;
//! the slug exists for log readability and debuggability.
//!
//! Minting is the only place randomness enters the engine. Every other
//! operation is deterministic given the store contents.

use uuid::Uuid;

use crate::primitives::ID_SUFFIX_LENGTH;
use crate::types::{CreatorId, CreatorType, ItemId};

/// Lowercases, maps spaces to dashes, strips quotes, then keeps only
/// alphanumerics and dashes.
#[must_use]
pub fn slugify(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .filter_map(|c| match c {
            ' ' => Some('-'),
            '\'' | '"' => None,
            c if c.is_alphanumeric() || c == '-' => Some(c),
            _ => None,
        })
        .collect()
}

/// Builds `slug[-qualifier]-suffix`, skipping segments that slug to
/// nothing. A name of pure punctuation yields a bare suffix id.
#[must_use]
pub fn generate_id(name: &str, qualifier: Option<&str>) -> String {
    let mut parts: Vec<String> = Vec::new();

    let name_slug = slugify(name);
    if !name_slug.is_empty() {
        parts.push(name_slug);
    }

    if let Some(qualifier) = qualifier {
        let qualifier_slug = slugify(qualifier);
        if !qualifier_slug.is_empty() {
            parts.push(qualifier_slug);
        }
    }

    parts.push(random_suffix());
    parts.join("-")
}

/// Mints an item id, qualified by the detected type when present.
#[must_use]
pub fn mint_item_id(name: &str, auto_detected_type: Option<&str>) -> ItemId {
    ItemId::new(generate_id(name, auto_detected_type))
}

/// Mints a creator id, always qualified by the creator type.
#[must_use]
pub fn mint_creator_id(name: &str, creator_type: CreatorType) -> CreatorId {
    CreatorId::new(generate_id(name, Some(creator_type.as_str())))
}

fn random_suffix() -> String {
    let hex = Uuid::new_v4().simple().to_string();
    hex[..ID_SUFFIX_LENGTH].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_lowercases_and_dashes() {
        assert_eq!(slugify("Thank You"), "thank-you");
        assert_eq!(slugify("Don't Look Back"), "dont-look-back");
        assert_eq!(slugify("M*A*S*H"), "mash");
        assert_eq!(slugify("2001: A Space Odyssey"), "2001-a-space-odyssey");
    }

    #[test]
    fn generated_id_carries_slug_and_suffix() {
        let id = generate_id("Stan", None);
        assert!(id.starts_with("stan-"));
        let suffix = id.rsplit('-').next().expect("suffix");
        assert_eq!(suffix.len(), ID_SUFFIX_LENGTH);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn qualifier_lands_between_slug_and_suffix() {
        let id = generate_id("Stan", Some("song"));
        assert!(id.starts_with("stan-song-"));

        let creator = mint_creator_id("Eminem", CreatorType::Person);
        assert!(creator.as_str().starts_with("eminem-person-"));
    }

    #[test]
    fn unsluggable_name_yields_bare_suffix() {
        // No leading dash when the whole name slugs away.
        let id = generate_id("!!!", None);
        assert_eq!(id.len(), ID_SUFFIX_LENGTH);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn minted_ids_are_unique() {
        let a = mint_item_id("Stan", Some("song"));
        let b = mint_item_id("Stan", Some("song"));
        assert_ne!(a, b);
    }
}

/// A validator public key in its canonical textual encoding.
///
/// Identifiers are opaque: equality is exact string equality and no
/// normalization (case, whitespace) is performed. Callers supply the
/// canonical form, e.g. `0x`-prefixed hex for BLS pubkeys.
pub type KeyIdentifier = String;

/// One signing key as reported by a remote listing.
///
/// Only `identifier` participates in inventory comparison; `source_url`
/// and `readonly` ride along for mutation payloads and display.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyRecord {
    pub identifier: KeyIdentifier,
    pub source_url: Option<String>,
    pub readonly: bool,
}

impl KeyRecord {
    /// A record with no source URL, not readonly.
    pub fn new(identifier: impl Into<KeyIdentifier>) -> Self {
        Self {
            identifier: identifier.into(),
            source_url: None,
            readonly: false,
        }
    }
}

impl std::fmt::Display for KeyRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.source_url {
            Some(url) => write!(f, "{} ({})", self.identifier, url),
            None => write!(f, "{}", self.identifier),
        }
    }
}

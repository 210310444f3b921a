//! Stable string identities: `<tag><n>`

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Kind of entity an identity names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TypeTag {
    Player,
    Unit,
    Colony,
    Building,
    Tile,
}

impl TypeTag {
    pub const ALL: [TypeTag; 5] = [
        TypeTag::Player,
        TypeTag::Unit,
        TypeTag::Colony,
        TypeTag::Building,
        TypeTag::Tile,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TypeTag::Player => "player",
            TypeTag::Unit => "unit",
            TypeTag::Colony => "colony",
            TypeTag::Building => "building",
            TypeTag::Tile => "tile",
        }
    }

    pub fn parse(s: &str) -> Option<TypeTag> {
        TypeTag::ALL.into_iter().find(|t| t.as_str() == s)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdError {
    #[error("empty identity")]
    Empty,
    #[error("malformed identity: {0}")]
    Malformed(String),
    #[error("unknown type tag in identity: {0}")]
    UnknownTag(String),
}

/// Globally unique, immutable entity identity
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ObjectId(String);

impl ObjectId {
    pub fn new(tag: TypeTag, number: u64) -> Self {
        Self(format!("{}{}", tag.as_str(), number))
    }

    /// Parse `<lowercase-tag><positive-integer>`
    pub fn parse(s: &str) -> Result<Self, IdError> {
        if s.is_empty() {
            return Err(IdError::Empty);
        }
        let split = s
            .find(|c: char| c.is_ascii_digit())
            .ok_or_else(|| IdError::Malformed(s.to_string()))?;
        let (tag, digits) = s.split_at(split);
        if tag.is_empty() || !tag.chars().all(|c| c.is_ascii_lowercase()) {
            return Err(IdError::Malformed(s.to_string()));
        }
        if !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(IdError::Malformed(s.to_string()));
        }
        match digits.parse::<u64>() {
            Ok(n) if n > 0 && !digits.starts_with('0') => {}
            _ => return Err(IdError::Malformed(s.to_string())),
        }
        if TypeTag::parse(tag).is_none() {
            return Err(IdError::UnknownTag(s.to_string()));
        }
        Ok(Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn tag(&self) -> Option<TypeTag> {
        let split = self.0.find(|c: char| c.is_ascii_digit())?;
        TypeTag::parse(&self.0[..split])
    }

    pub fn number(&self) -> Option<u64> {
        let split = self.0.find(|c: char| c.is_ascii_digit())?;
        self.0[split..].parse().ok()
    }
}

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ObjectId {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        ObjectId::parse(&value)
    }
}

impl From<ObjectId> for String {
    fn from(id: ObjectId) -> String {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_id_format() {
        let id = ObjectId::new(TypeTag::Unit, 42);
        assert_eq!(id.as_str(), "unit42");
        assert_eq!(id.tag(), Some(TypeTag::Unit));
        assert_eq!(id.number(), Some(42));
    }

    #[test]
    fn test_parse_rejects_bad_identities() {
        assert_eq!(ObjectId::parse(""), Err(IdError::Empty));
        assert!(matches!(ObjectId::parse("unit"), Err(IdError::Malformed(_))));
        assert!(matches!(ObjectId::parse("42"), Err(IdError::Malformed(_))));
        assert!(matches!(ObjectId::parse("Unit4"), Err(IdError::Malformed(_))));
        assert!(matches!(ObjectId::parse("unit0"), Err(IdError::Malformed(_))));
        assert!(matches!(ObjectId::parse("unit07"), Err(IdError::Malformed(_))));
        assert!(matches!(ObjectId::parse("dragon3"), Err(IdError::UnknownTag(_))));
    }

    #[test]
    fn test_serde_uses_plain_string() {
        let id = ObjectId::new(TypeTag::Colony, 7);
        let json = serde_json::to_string(&id).expect("serialize");
        assert_eq!(json, "\"colony7\"");
        let back: ObjectId = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, id);
        assert!(serde_json::from_str::<ObjectId>("\"\"").is_err());
    }
}

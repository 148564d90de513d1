//! Record identity - prefixed ULID identifiers for rows without a natural key

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use ulid::Ulid;

/// Prefix naming the table a generated identifier belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdPrefix {
    /// S-156 request
    S156,
    /// Ledger entry
    Led,
    /// Return
    Ret,
    /// Survey
    Sur,
    /// Write-off
    Wo,
    /// Consumable issue
    Con,
}

impl IdPrefix {
    pub fn as_str(&self) -> &'static str {
        match self {
            IdPrefix::S156 => "S156",
            IdPrefix::Led => "LED",
            IdPrefix::Ret => "RET",
            IdPrefix::Sur => "SUR",
            IdPrefix::Wo => "WO",
            IdPrefix::Con => "CON",
        }
    }

    pub fn all() -> &'static [IdPrefix] {
        &[
            IdPrefix::S156,
            IdPrefix::Led,
            IdPrefix::Ret,
            IdPrefix::Sur,
            IdPrefix::Wo,
            IdPrefix::Con,
        ]
    }
}

impl fmt::Display for IdPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IdPrefix {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        IdPrefix::all()
            .iter()
            .copied()
            .find(|p| p.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| IdParseError::UnknownPrefix(s.to_string()))
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdParseError {
    #[error("missing '-' separator in id '{0}'")]
    MissingSeparator(String),

    #[error("unknown id prefix '{0}'")]
    UnknownPrefix(String),

    #[error("invalid ULID '{0}'")]
    InvalidUlid(String),
}

/// Identifier of the form `PREFIX-<ULID>`, e.g. `S156-01HZX3...`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RecordId {
    prefix: IdPrefix,
    ulid: Ulid,
}

impl RecordId {
    /// Generate a fresh identifier
    pub fn new(prefix: IdPrefix) -> Self {
        Self {
            prefix,
            ulid: Ulid::new(),
        }
    }

    pub fn prefix(&self) -> IdPrefix {
        self.prefix
    }

    /// Whether `partial` selects this id
    ///
    /// Accepts the full id, a leading fragment of it (`S156-01HZ`), or a
    /// leading fragment of the bare ULID (`01HZ`). Case-insensitive.
    pub fn matches_partial(&self, partial: &str) -> bool {
        let partial = partial.trim().to_ascii_uppercase();
        if partial.is_empty() {
            return false;
        }
        let full = self.to_string();
        full.starts_with(&partial) || self.ulid.to_string().starts_with(&partial)
    }

    /// Display form with the ULID cut to 8 characters
    pub fn short(&self) -> String {
        let ulid = self.ulid.to_string();
        format!("{}-{}", self.prefix, &ulid[..8])
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.prefix, self.ulid)
    }
}

impl FromStr for RecordId {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (prefix, ulid) = s
            .split_once('-')
            .ok_or_else(|| IdParseError::MissingSeparator(s.to_string()))?;
        let prefix = prefix.parse()?;
        let ulid = Ulid::from_string(ulid).map_err(|_| IdParseError::InvalidUlid(ulid.to_string()))?;
        Ok(Self { prefix, ulid })
    }
}

impl TryFrom<String> for RecordId {
    type Error = IdParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RecordId> for String {
    fn from(id: RecordId) -> Self {
        id.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_roundtrips_through_display() {
        let id = RecordId::new(IdPrefix::S156);
        let parsed: RecordId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
        assert!(id.to_string().starts_with("S156-"));
    }

    #[test]
    fn test_parse_rejects_bad_ids() {
        assert!(matches!(
            "S15601ABC".parse::<RecordId>(),
            Err(IdParseError::MissingSeparator(_))
        ));
        assert!(matches!(
            "XYZ-01HZX3V6Y4D4E1KQ2Q9T8N7M6P".parse::<RecordId>(),
            Err(IdParseError::UnknownPrefix(_))
        ));
        assert!(matches!(
            "SUR-not-a-ulid".parse::<RecordId>(),
            Err(IdParseError::InvalidUlid(_))
        ));
    }

    #[test]
    fn test_matches_partial() {
        let id: RecordId = "S156-01HZX3V6Y4D4E1KQ2Q9T8N7M6P".parse().unwrap();
        assert!(id.matches_partial("S156-01HZX3V6Y4D4E1KQ2Q9T8N7M6P"));
        assert!(id.matches_partial("s156-01hzx3"));
        assert!(id.matches_partial("01HZX3"));
        assert!(!id.matches_partial("RET-01HZX3"));
        assert!(!id.matches_partial(""));
    }

    #[test]
    fn test_short() {
        let id: RecordId = "WO-01HZX3V6Y4D4E1KQ2Q9T8N7M6P".parse().unwrap();
        assert_eq!(id.short(), "WO-01HZX3V6");
    }
}

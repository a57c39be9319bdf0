//! Domain identifiers (strongly-typed IDs).
//!
//! - `RunId`: ULID per `run_all()` invocation. Recorded on every claim so a
//!   claimed-but-undeleted item tells you which run left it behind.
//! - `ItemId`: the queue's insertion sequence (SQLite rowid).
//!
//! `Id<T>` は Phantom type パターン。`T` はマーカー型で実行時には何も持たない。

use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;
use ulid::Ulid;

/// Marker trait for ULID based ids. Provides the display prefix.
pub trait IdMarker: Send + Sync + 'static {
    fn prefix() -> &'static str;
}

#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Id<T: IdMarker> {
    ulid: Ulid,
    #[serde(skip)]
    _marker: PhantomData<T>,
}

impl<T: IdMarker> Id<T> {
    pub fn generate() -> Self {
        Self::from_ulid(Ulid::new())
    }

    pub fn from_ulid(ulid: Ulid) -> Self {
        Self {
            ulid,
            _marker: PhantomData,
        }
    }

    pub fn as_ulid(&self) -> Ulid {
        self.ulid
    }
}

impl<T: IdMarker> From<Ulid> for Id<T> {
    fn from(ulid: Ulid) -> Self {
        Self::from_ulid(ulid)
    }
}

impl<T: IdMarker> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", T::prefix(), self.ulid)
    }
}

impl<T: IdMarker> FromStr for Id<T> {
    type Err = ulid::DecodeError;

    /// Accepts both the prefixed display form and a bare ULID.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.strip_prefix(T::prefix()).unwrap_or(s);
        Ulid::from_string(raw).map(Self::from_ulid)
    }
}

/// Run のマーカー型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Run {}

impl IdMarker for Run {
    fn prefix() -> &'static str {
        "run-"
    }
}

/// Identifier of one runner invocation.
pub type RunId = Id<Run>;

/// Identifier of a queue item: its insertion sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(i64);

impl ItemId {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "item-{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_id_display_has_prefix() {
        let ulid = Ulid::new();
        let run = RunId::from_ulid(ulid);
        assert_eq!(run.as_ulid(), ulid);
        assert_eq!(run.to_string(), format!("run-{ulid}"));
    }

    #[test]
    fn run_id_parses_display_form_and_bare_ulid() {
        let run = RunId::generate();
        let parsed: RunId = run.to_string().parse().unwrap();
        assert_eq!(parsed, run);

        let bare: RunId = run.as_ulid().to_string().parse().unwrap();
        assert_eq!(bare, run);

        assert!("run-not-a-ulid".parse::<RunId>().is_err());
    }

    #[test]
    fn run_ids_are_sortable() {
        let id1 = RunId::generate();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let id2 = RunId::generate();
        assert!(id1 < id2);
    }

    #[test]
    fn item_ids_order_by_sequence() {
        assert!(ItemId::new(1) < ItemId::new(2));
        assert_eq!(ItemId::new(7).to_string(), "item-7");
        assert_eq!(serde_json::to_string(&ItemId::new(7)).unwrap(), "7");
    }
}

//! Saved position records.

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::position::PositionSpec;

/// A position as stored, with its store-assigned id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedPosition {
    pub id: u64,
    pub name: String,
    pub symbol: String,
    pub entry_price: f64,
    pub target1: f64,
    pub target2: Option<f64>,
    pub stop_price: f64,
    pub leverage: f64,
    pub open_time: DateTime<Utc>,
    pub saved_at: DateTime<Utc>,
}

/// A position waiting to be assigned an id by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPosition {
    pub name: String,
    pub position: PositionSpec,
    pub saved_at: DateTime<Utc>,
}

impl NewPosition {
    /// Uses `name` when given, otherwise `"{symbol} - {MM/DD HH:MM}"` in the
    /// display offset.
    pub fn new(
        position: PositionSpec,
        name: Option<String>,
        saved_at: DateTime<Utc>,
        offset: FixedOffset,
    ) -> Self {
        let name = name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| {
                format!(
                    "{} - {}",
                    position.symbol,
                    saved_at.with_timezone(&offset).format("%m/%d %H:%M")
                )
            });
        Self {
            name,
            position,
            saved_at,
        }
    }

    pub fn into_saved(self, id: u64) -> SavedPosition {
        let p = self.position;
        SavedPosition {
            id,
            name: self.name,
            symbol: p.symbol,
            entry_price: p.entry_price,
            target1: p.target1,
            target2: p.target2,
            stop_price: p.stop_price,
            leverage: p.leverage,
            open_time: p.open_time,
            saved_at: self.saved_at,
        }
    }
}

impl SavedPosition {
    pub fn to_position(&self) -> PositionSpec {
        PositionSpec {
            symbol: self.symbol.clone(),
            entry_price: self.entry_price,
            target1: self.target1,
            target2: self.target2,
            stop_price: self.stop_price,
            leverage: self.leverage,
            open_time: self.open_time,
        }
    }
}

/// Next free id: one past the largest id in use.
pub fn next_id(existing: &[SavedPosition]) -> u64 {
    existing.iter().map(|p| p.id).max().unwrap_or(0) + 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_position() -> PositionSpec {
        PositionSpec {
            symbol: "SOLUSDT".into(),
            entry_price: 150.0,
            target1: 165.0,
            target2: None,
            stop_price: 140.0,
            leverage: 3.0,
            open_time: Utc.with_ymd_and_hms(2024, 4, 2, 8, 0, 0).unwrap(),
        }
    }

    fn saved_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 4, 2, 21, 15, 0).unwrap()
    }

    #[test]
    fn default_name_uses_symbol_and_local_time() {
        let offset = FixedOffset::east_opt(3 * 3600).unwrap();
        let new = NewPosition::new(sample_position(), None, saved_at(), offset);
        assert_eq!(new.name, "SOLUSDT - 04/03 00:15");
    }

    #[test]
    fn blank_name_falls_back_to_default() {
        let offset = FixedOffset::east_opt(0).unwrap();
        let new = NewPosition::new(sample_position(), Some("  ".into()), saved_at(), offset);
        assert_eq!(new.name, "SOLUSDT - 04/02 21:15");
    }

    #[test]
    fn into_saved_round_trips_position() {
        let offset = FixedOffset::east_opt(0).unwrap();
        let new = NewPosition::new(sample_position(), Some("swing".into()), saved_at(), offset);
        let saved = new.into_saved(7);
        assert_eq!(saved.id, 7);
        assert_eq!(saved.name, "swing");
        assert_eq!(saved.to_position(), sample_position());
    }

    #[test]
    fn next_id_skips_past_gaps() {
        let offset = FixedOffset::east_opt(0).unwrap();
        let a = NewPosition::new(sample_position(), None, saved_at(), offset).into_saved(1);
        let b = NewPosition::new(sample_position(), None, saved_at(), offset).into_saved(4);
        assert_eq!(next_id(&[]), 1);
        assert_eq!(next_id(&[a, b]), 5);
    }
}

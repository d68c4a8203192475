//! Position input validation.
//!
//! Turns raw form/CLI values into a [`PositionSpec`]. Every numeric field must
//! parse and be positive, the symbol must be ASCII letters and digits only, and
//! the open time must not lie after `now`.

use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::error::PosCheckError;
use crate::domain::position::PositionSpec;

/// Accepted open-time layouts; the second is what HTML `datetime-local`
/// inputs submit.
const OPEN_TIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M"];

pub const DISPLAY_TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Unvalidated position fields exactly as entered. Also the shape persisted
/// as the "last used" settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PositionInput {
    pub symbol: String,
    pub entry_price: String,
    pub target1: String,
    pub target2: String,
    pub stop_price: String,
    pub leverage: String,
    pub open_time: String,
}

impl PositionInput {
    /// Form defaults shown before anything has been saved.
    pub fn with_defaults(now: DateTime<Utc>, offset: FixedOffset) -> Self {
        Self {
            symbol: "BTCUSDT".into(),
            entry_price: "50000".into(),
            target1: "55000".into(),
            target2: String::new(),
            stop_price: "48000".into(),
            leverage: "10".into(),
            open_time: now.with_timezone(&offset).format(DISPLAY_TIME_FORMAT).to_string(),
        }
    }

    /// Fills every blank field of `self` from `fallback`.
    pub fn or_else(self, fallback: &PositionInput) -> Self {
        fn pick(value: String, fallback: &str) -> String {
            if value.trim().is_empty() {
                fallback.to_string()
            } else {
                value
            }
        }
        Self {
            symbol: pick(self.symbol, &fallback.symbol),
            entry_price: pick(self.entry_price, &fallback.entry_price),
            target1: pick(self.target1, &fallback.target1),
            target2: pick(self.target2, &fallback.target2),
            stop_price: pick(self.stop_price, &fallback.stop_price),
            leverage: pick(self.leverage, &fallback.leverage),
            open_time: pick(self.open_time, &fallback.open_time),
        }
    }

    /// Renders a validated position back into input form.
    pub fn from_position(position: &PositionSpec, offset: FixedOffset) -> Self {
        Self {
            symbol: position.symbol.clone(),
            entry_price: position.entry_price.to_string(),
            target1: position.target1.to_string(),
            target2: position.target2.map(|v| v.to_string()).unwrap_or_default(),
            stop_price: position.stop_price.to_string(),
            leverage: position.leverage.to_string(),
            open_time: position
                .open_time
                .with_timezone(&offset)
                .format(DISPLAY_TIME_FORMAT)
                .to_string(),
        }
    }
}

pub fn validate_position(
    input: &PositionInput,
    now: DateTime<Utc>,
    offset: FixedOffset,
) -> Result<PositionSpec, PosCheckError> {
    let symbol = input.symbol.trim().to_uppercase();
    check_symbol(&symbol)?;

    let entry_price = parse_positive(&input.entry_price, "entry_price")?;
    let target1 = parse_positive(&input.target1, "target1")?;
    let target2 = if input.target2.trim().is_empty() {
        None
    } else {
        Some(parse_positive(&input.target2, "target2")?)
    };
    let stop_price = parse_positive(&input.stop_price, "stop_price")?;
    let leverage = parse_positive(&input.leverage, "leverage")?;
    let open_time = parse_open_time(&input.open_time, offset)?;
    check_open_time(open_time, now)?;

    Ok(PositionSpec {
        symbol,
        entry_price,
        target1,
        target2,
        stop_price,
        leverage,
        open_time,
    })
}

/// Re-checks a position that did not come through `validate_position`,
/// such as one loaded from a store.
pub fn ensure_checkable(position: &PositionSpec, now: DateTime<Utc>) -> Result<(), PosCheckError> {
    check_symbol(&position.symbol)?;
    check_open_time(position.open_time, now)
}

/// Symbols become file names and markup, so only ASCII letters and digits pass.
fn check_symbol(symbol: &str) -> Result<(), PosCheckError> {
    if symbol.is_empty() {
        return Err(PosCheckError::invalid_input("symbol", "symbol is required"));
    }
    if !symbol.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(PosCheckError::invalid_input(
            "symbol",
            format!("'{}' must contain only letters and digits", symbol),
        ));
    }
    Ok(())
}

fn check_open_time(open_time: DateTime<Utc>, now: DateTime<Utc>) -> Result<(), PosCheckError> {
    if open_time > now {
        return Err(PosCheckError::invalid_input(
            "open_time",
            "open time is in the future",
        ));
    }
    Ok(())
}

fn parse_positive(value: &str, field: &str) -> Result<f64, PosCheckError> {
    let parsed: f64 = value
        .trim()
        .parse()
        .map_err(|_| PosCheckError::invalid_input(field, format!("'{}' is not a number", value.trim())))?;
    if !parsed.is_finite() || parsed <= 0.0 {
        return Err(PosCheckError::invalid_input(field, "must be a positive number"));
    }
    Ok(parsed)
}

/// Parses a wall-clock time in the display offset and converts it to UTC.
pub fn parse_open_time(value: &str, offset: FixedOffset) -> Result<DateTime<Utc>, PosCheckError> {
    let trimmed = value.trim();
    let naive = OPEN_TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
        .ok_or_else(|| {
            PosCheckError::invalid_input("open_time", "expected YYYY-MM-DD HH:MM")
        })?;
    offset
        .from_local_datetime(&naive)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| PosCheckError::invalid_input("open_time", "unrepresentable local time"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    fn istanbul() -> FixedOffset {
        FixedOffset::east_opt(3 * 3600).unwrap()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn valid_input() -> PositionInput {
        PositionInput {
            symbol: " btcusdt ".into(),
            entry_price: "50000".into(),
            target1: "55000".into(),
            target2: "".into(),
            stop_price: "48000".into(),
            leverage: "10".into(),
            open_time: "2024-06-01 10:30".into(),
        }
    }

    #[test]
    fn valid_input_produces_position() {
        let pos = validate_position(&valid_input(), now(), istanbul()).unwrap();
        assert_eq!(pos.symbol, "BTCUSDT");
        assert_eq!(pos.entry_price, 50000.0);
        assert_eq!(pos.target2, None);
        assert_eq!(pos.leverage, 10.0);
        // 10:30 at +03:00 is 07:30 UTC
        assert_eq!(pos.open_time.hour(), 7);
        assert_eq!(pos.open_time.minute(), 30);
    }

    #[test]
    fn target2_parsed_when_present() {
        let mut input = valid_input();
        input.target2 = "60000".into();
        let pos = validate_position(&input, now(), istanbul()).unwrap();
        assert_eq!(pos.target2, Some(60000.0));
    }

    #[test]
    fn empty_symbol_rejected() {
        let mut input = valid_input();
        input.symbol = "   ".into();
        let err = validate_position(&input, now(), istanbul()).unwrap_err();
        assert!(matches!(err, PosCheckError::InvalidInput { field, .. } if field == "symbol"));
    }

    #[test]
    fn symbol_with_path_or_markup_characters_rejected() {
        for symbol in ["../secret", "/etc/passwd", "BTC USDT", "<b>ETH", "BTC\\USDT", "ÉTHUSDT"] {
            let mut input = valid_input();
            input.symbol = symbol.into();
            let err = validate_position(&input, now(), istanbul()).unwrap_err();
            assert!(
                matches!(&err, PosCheckError::InvalidInput { field, .. } if field == "symbol"),
                "{symbol:?} gave {err:?}"
            );
        }
    }

    #[test]
    fn ensure_checkable_rejects_stored_position_opened_after_now() {
        let position = validate_position(&valid_input(), now(), istanbul()).unwrap();
        assert!(ensure_checkable(&position, now()).is_ok());

        let earlier = position.open_time - chrono::Duration::hours(1);
        let err = ensure_checkable(&position, earlier).unwrap_err();
        assert!(matches!(err, PosCheckError::InvalidInput { field, .. } if field == "open_time"));

        let tampered = PositionSpec {
            symbol: "../X".into(),
            ..position
        };
        let err = ensure_checkable(&tampered, now()).unwrap_err();
        assert!(matches!(err, PosCheckError::InvalidInput { field, .. } if field == "symbol"));
    }

    fn set_field(input: &mut PositionInput, field: &str, value: &str) {
        let slot = match field {
            "entry_price" => &mut input.entry_price,
            "target1" => &mut input.target1,
            "target2" => &mut input.target2,
            "stop_price" => &mut input.stop_price,
            "leverage" => &mut input.leverage,
            other => panic!("unknown field {other}"),
        };
        *slot = value.to_string();
    }

    #[test]
    fn non_positive_values_rejected() {
        for (field, value) in [
            ("entry_price", "0"),
            ("target1", "-1"),
            ("target2", "0"),
            ("stop_price", "-5"),
            ("leverage", "0"),
        ] {
            let mut input = valid_input();
            set_field(&mut input, field, value);
            let err = validate_position(&input, now(), istanbul()).unwrap_err();
            assert!(
                matches!(&err, PosCheckError::InvalidInput { field: f, .. } if f == field),
                "expected {field} error, got {err}"
            );
        }
    }

    #[test]
    fn non_numeric_rejected() {
        let mut input = valid_input();
        input.entry_price = "abc".into();
        let err = validate_position(&input, now(), istanbul()).unwrap_err();
        assert_eq!(err.to_string(), "invalid entry_price: 'abc' is not a number");
    }

    #[test]
    fn infinite_rejected() {
        let mut input = valid_input();
        input.leverage = "inf".into();
        assert!(validate_position(&input, now(), istanbul()).is_err());
    }

    #[test]
    fn future_open_time_rejected() {
        let mut input = valid_input();
        input.open_time = "2024-06-01 15:01".into();
        let err = validate_position(&input, now(), istanbul()).unwrap_err();
        assert!(matches!(err, PosCheckError::InvalidInput { field, .. } if field == "open_time"));
    }

    #[test]
    fn open_time_equal_to_now_accepted() {
        let mut input = valid_input();
        input.open_time = "2024-06-01 15:00".into();
        assert!(validate_position(&input, now(), istanbul()).is_ok());
    }

    #[test]
    fn datetime_local_format_accepted() {
        let parsed = parse_open_time("2024-06-01T10:30", istanbul()).unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 6, 1, 7, 30, 0).unwrap());
    }

    #[test]
    fn malformed_open_time_rejected() {
        assert!(parse_open_time("01/06/2024 10:30", istanbul()).is_err());
    }

    #[test]
    fn or_else_fills_blanks_only() {
        let partial = PositionInput {
            symbol: "ETHUSDT".into(),
            ..PositionInput::default()
        };
        let merged = partial.or_else(&valid_input());
        assert_eq!(merged.symbol, "ETHUSDT");
        assert_eq!(merged.entry_price, "50000");
        assert_eq!(merged.open_time, "2024-06-01 10:30");
    }

    #[test]
    fn defaults_use_display_offset() {
        let defaults = PositionInput::with_defaults(now(), istanbul());
        assert_eq!(defaults.symbol, "BTCUSDT");
        assert_eq!(defaults.open_time, "2024-06-01 15:00");
        assert!(defaults.target2.is_empty());
    }

    #[test]
    fn from_position_round_trips_through_validation() {
        let pos = validate_position(&valid_input(), now(), istanbul()).unwrap();
        let input = PositionInput::from_position(&pos, istanbul());
        assert_eq!(input.open_time, "2024-06-01 10:30");
        assert_eq!(validate_position(&input, now(), istanbul()).unwrap(), pos);
    }
}

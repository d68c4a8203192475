//! HTML templates using Askama.

use askama::Template;
use chrono::FixedOffset;

use crate::adapters::chart_svg::price_chart_svg;
use crate::domain::check::PositionCheck;
use crate::domain::report::{live_status, outcome_report, saved_summary};
use crate::domain::saved_position::SavedPosition;
use crate::domain::validation::PositionInput;

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub form: PositionInput,
    pub saved: Vec<SavedRow>,
    pub message: Option<String>,
    pub error: Option<String>,
    pub result: Option<ResultView>,
}

/// One line of the saved positions list.
#[derive(Debug, Clone, PartialEq)]
pub struct SavedRow {
    pub id: u64,
    pub name: String,
    pub summary: String,
}

impl SavedRow {
    pub fn new(saved: &SavedPosition, offset: FixedOffset) -> Self {
        Self {
            id: saved.id,
            name: saved.name.clone(),
            summary: saved_summary(saved, offset),
        }
    }
}

/// Rendered result block for a completed check.
#[derive(Debug, Clone)]
pub struct ResultView {
    pub title: String,
    pub detail: String,
    pub tone: &'static str,
    pub live_text: String,
    pub live_tone: &'static str,
    pub chart_svg: String,
}

impl ResultView {
    pub fn new(check: &PositionCheck, offset: FixedOffset) -> Self {
        let report = outcome_report(check, offset);
        let live = live_status(check);
        Self {
            title: report.title,
            detail: report.detail,
            tone: report.tone.css_class(),
            live_text: live.text,
            live_tone: live.tone.css_class(),
            chart_svg: price_chart_svg(&check.bars, &check.position),
        }
    }
}

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate<'a> {
    pub message: &'a str,
    pub status: u16,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::check::check_with_bars;
    use crate::domain::position::PositionSpec;
    use crate::domain::price_bar::PriceBar;
    use chrono::{Duration, TimeZone, Utc};

    fn offset() -> FixedOffset {
        FixedOffset::east_opt(3 * 3600).unwrap()
    }

    fn position() -> PositionSpec {
        PositionSpec {
            symbol: "ETHUSDT".into(),
            entry_price: 100.0,
            target1: 110.0,
            target2: None,
            stop_price: 90.0,
            leverage: 10.0,
            open_time: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn saved_row_summary() {
        let saved = SavedPosition {
            id: 4,
            name: "eth swing".into(),
            symbol: "ETHUSDT".into(),
            entry_price: 100.0,
            target1: 110.0,
            target2: None,
            stop_price: 90.0,
            leverage: 10.0,
            open_time: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
            saved_at: Utc.with_ymd_and_hms(2024, 3, 1, 13, 0, 0).unwrap(),
        };
        let row = SavedRow::new(&saved, offset());
        assert_eq!(row.id, 4);
        assert_eq!(row.name, "eth swing");
        assert!(row.summary.ends_with("Opened: 2024-03-01 15:00"));
    }

    #[test]
    fn index_renders_result_and_escapes_input() {
        let t0 = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let bars = vec![PriceBar {
            open_time: t0 + Duration::minutes(1),
            open: 100.0,
            high: 111.0,
            low: 99.0,
            close: 108.0,
        }];
        let check = check_with_bars(&position(), bars).unwrap();
        let template = IndexTemplate {
            form: PositionInput {
                symbol: "<b>ETH".into(),
                ..PositionInput::default()
            },
            saved: Vec::new(),
            message: None,
            error: None,
            result: Some(ResultView::new(&check, offset())),
        };
        let html = template.render().unwrap();

        assert!(html.contains("LONG position reached target 1 at 2024-03-01 15:01 (Profit)."));
        assert!(html.contains("<svg"));
        assert!(html.contains("&lt;b&gt;ETH"));
        assert!(html.contains("No saved positions"));
    }

    #[test]
    fn error_template_renders_status() {
        let html = ErrorTemplate {
            message: "no saved position with id 9",
            status: 404,
        }
        .render()
        .unwrap();
        assert!(html.contains("404"));
        assert!(html.contains("no saved position with id 9"));
    }
}

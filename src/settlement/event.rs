//! Simulation inputs: capital tranches and dated events

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A dated block of principal entering the claim, with interest already owed on it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapitalTranche {
    /// Caller-assigned identity, also used to break start-date ties
    pub sequence_id: u32,

    /// Principal added when the tranche becomes active
    pub capital: Decimal,

    /// Interest owed but not capitalized at `start_date`
    #[serde(default)]
    pub initial_interest: Decimal,

    pub start_date: NaiveDate,
}

impl CapitalTranche {
    pub fn new(sequence_id: u32, capital: Decimal, initial_interest: Decimal, start_date: NaiveDate) -> Self {
        Self {
            sequence_id,
            capital,
            initial_interest,
            start_date,
        }
    }
}

/// Something that happens to the balance on a given date
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Money received, applied overdue interest -> accrued interest -> principal
    Payment { date: NaiveDate, amount: Decimal },
    /// Owed interest is folded into principal
    Capitalization { date: NaiveDate },
    /// Valuation date; closes the simulation
    End { date: NaiveDate },
}

impl Event {
    pub fn date(&self) -> NaiveDate {
        match self {
            Event::Payment { date, .. } | Event::Capitalization { date } | Event::End { date } => *date,
        }
    }

    /// Same-date ordering: payments, then capitalizations, then the end marker
    pub fn priority(&self) -> u8 {
        match self {
            Event::Payment { .. } => 1,
            Event::Capitalization { .. } => 2,
            Event::End { .. } => 3,
        }
    }

    pub fn is_end(&self) -> bool {
        matches!(self, Event::End { .. })
    }

    pub fn label(&self) -> &'static str {
        match self {
            Event::Payment { .. } => "payment",
            Event::Capitalization { .. } => "capitalization",
            Event::End { .. } => "end",
        }
    }
}

/// Events in processing order: by date, ties broken by [`Event::priority`]
pub fn sort_events(events: &[Event]) -> Vec<Event> {
    let mut sorted = events.to_vec();
    sorted.sort_by_key(|e| (e.date(), e.priority()));
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_sort_by_date_then_priority() {
        let events = vec![
            Event::End { date: day(2024, 3, 1) },
            Event::Capitalization { date: day(2024, 3, 1) },
            Event::Payment {
                date: day(2024, 3, 1),
                amount: dec!(100),
            },
            Event::Capitalization { date: day(2024, 1, 15) },
        ];

        let sorted = sort_events(&events);
        let labels: Vec<_> = sorted.iter().map(|e| (e.date(), e.label())).collect();
        assert_eq!(
            labels,
            vec![
                (day(2024, 1, 15), "capitalization"),
                (day(2024, 3, 1), "payment"),
                (day(2024, 3, 1), "capitalization"),
                (day(2024, 3, 1), "end"),
            ]
        );
    }

    #[test]
    fn test_sort_keeps_input_order_for_equal_events() {
        let events = vec![
            Event::Payment {
                date: day(2024, 2, 1),
                amount: dec!(10),
            },
            Event::Payment {
                date: day(2024, 2, 1),
                amount: dec!(20),
            },
        ];
        assert_eq!(sort_events(&events), events);
    }

    #[test]
    fn test_event_json_shape() {
        let json = r#"[
            {"type": "payment", "date": "2024-02-01", "amount": "1018.18"},
            {"type": "capitalization", "date": "2024-02-01"},
            {"type": "end", "date": "2024-03-01"}
        ]"#;
        let events: Vec<Event> = serde_json::from_str(json).unwrap();
        assert_eq!(
            events[0],
            Event::Payment {
                date: day(2024, 2, 1),
                amount: dec!(1018.18)
            }
        );
        assert!(events[2].is_end());
    }

    #[test]
    fn test_tranche_initial_interest_defaults_to_zero() {
        let json = r#"{"sequence_id": 1, "capital": "1000", "start_date": "2024-01-01"}"#;
        let tranche: CapitalTranche = serde_json::from_str(json).unwrap();
        assert_eq!(tranche.initial_interest, Decimal::ZERO);
    }
}

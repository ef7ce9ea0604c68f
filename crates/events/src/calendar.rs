//! Calendar and count views over events.
//!
//! Pure functions: callers pass the event list they already loaded, and the
//! results reference events by id.

use chrono::{Datelike, Days, NaiveDate};

use planora_core::{DomainError, DomainResult, EventId};

use crate::event::{Event, EventStatus};

/// One day of the monthly calendar view.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub events: Vec<EventId>,
}

/// Build the calendar for one month: every day of the month, each listing the
/// events whose `[start_date, end_date]` range covers that day (calendar-day
/// comparison; time-of-day ignored).
pub fn monthly_view(events: &[Event], year: i32, month: u32) -> DomainResult<Vec<CalendarDay>> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| DomainError::validation(format!("invalid year/month: {year}-{month}")))?;

    let mut days = Vec::with_capacity(31);
    let mut day = first;
    while day.month() == month {
        let covering: Vec<EventId> = events
            .iter()
            .filter(|e| {
                let start = e.start_date.date_naive();
                let end = e.end_date.date_naive();
                start <= day && day <= end
            })
            .map(|e| e.id)
            .collect();

        days.push(CalendarDay {
            date: day,
            events: covering,
        });

        day = match day.checked_add_days(Days::new(1)) {
            Some(next) => next,
            None => break,
        };
    }

    Ok(days)
}

/// Number of events in each status, in declaration order (zero counts kept so
/// dashboards render stable rows).
pub fn status_counts(events: &[Event]) -> Vec<(EventStatus, usize)> {
    EventStatus::ALL
        .iter()
        .map(|status| {
            let count = events.iter().filter(|e| e.status == *status).count();
            (*status, count)
        })
        .collect()
}

/// Events started per month for the given year: 12 buckets, January first.
pub fn monthly_counts(events: &[Event], year: i32) -> [usize; 12] {
    let mut buckets = [0usize; 12];
    for event in events {
        let start = event.start_date.date_naive();
        if start.year() == year {
            buckets[start.month0() as usize] += 1;
        }
    }
    buckets
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use planora_core::UserId;

    use crate::event::{Assignees, EventDraft};

    fn event_spanning(start: (i32, u32, u32), end: (i32, u32, u32)) -> Event {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        Event::create(
            EventId::new(),
            EventDraft {
                name: "Trade expo".to_string(),
                event_type: "Expo".to_string(),
                description: None,
                image: None,
                start_date: Utc.with_ymd_and_hms(start.0, start.1, start.2, 9, 0, 0).unwrap(),
                end_date: Utc.with_ymd_and_hms(end.0, end.1, end.2, 21, 0, 0).unwrap(),
                proposed_location: None,
                client_id: UserId::new(),
                assignees: Assignees::default(),
                status: EventStatus::Approved,
            },
            UserId::new(),
            now,
        )
        .unwrap()
    }

    #[test]
    fn view_covers_exactly_the_month() {
        let days = monthly_view(&[], 2024, 4).unwrap();
        assert_eq!(days.len(), 30);
        assert_eq!(days[0].date, NaiveDate::from_ymd_opt(2024, 4, 1).unwrap());
        assert_eq!(days[29].date, NaiveDate::from_ymd_opt(2024, 4, 30).unwrap());
    }

    #[test]
    fn leap_february_has_29_days() {
        let days = monthly_view(&[], 2024, 2).unwrap();
        assert_eq!(days.len(), 29);
    }

    #[test]
    fn event_appears_on_every_day_it_covers() {
        let event = event_spanning((2024, 5, 10), (2024, 5, 12));
        let days = monthly_view(std::slice::from_ref(&event), 2024, 5).unwrap();

        for day in &days {
            let covered = (10..=12).contains(&day.date.day());
            assert_eq!(day.events.contains(&event.id), covered, "day {}", day.date);
        }
    }

    #[test]
    fn event_spanning_month_boundary_appears_in_both_months() {
        let event = event_spanning((2024, 4, 29), (2024, 5, 2));

        let april = monthly_view(std::slice::from_ref(&event), 2024, 4).unwrap();
        assert!(april[28].events.contains(&event.id));
        assert!(april[27].events.is_empty());

        let may = monthly_view(std::slice::from_ref(&event), 2024, 5).unwrap();
        assert!(may[0].events.contains(&event.id));
        assert!(may[1].events.contains(&event.id));
        assert!(may[2].events.is_empty());
    }

    #[test]
    fn invalid_month_is_rejected() {
        assert!(monthly_view(&[], 2024, 13).is_err());
        assert!(monthly_view(&[], 2024, 0).is_err());
    }

    #[test]
    fn status_counts_keep_zero_rows() {
        let mut cancelled = event_spanning((2024, 3, 1), (2024, 3, 2));
        cancelled.set_status(
            EventStatus::Cancelled,
            Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap(),
        );
        let approved = event_spanning((2024, 3, 5), (2024, 3, 6));

        let counts = status_counts(&[cancelled, approved]);
        assert_eq!(counts.len(), 6);
        assert!(counts.contains(&(EventStatus::Approved, 1)));
        assert!(counts.contains(&(EventStatus::Cancelled, 1)));
        assert!(counts.contains(&(EventStatus::Draft, 0)));
    }

    #[test]
    fn monthly_counts_bucket_by_start_date_year() {
        let in_march = event_spanning((2024, 3, 15), (2024, 3, 16));
        let also_march = event_spanning((2024, 3, 20), (2024, 4, 2));
        let other_year = event_spanning((2023, 3, 1), (2023, 3, 2));

        let buckets = monthly_counts(&[in_march, also_march, other_year], 2024);
        assert_eq!(buckets[2], 2);
        assert_eq!(buckets.iter().sum::<usize>(), 2);
    }
}

use std::iter::FusedIterator;

use serde::Serialize;

use crate::{DateKey, ValidationError};

/// Inclusive range of UTC days, `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Window {
    start: DateKey,
    end: DateKey,
}

impl Window {
    pub fn new(start: DateKey, end: DateKey) -> Result<Self, ValidationError> {
        if start > end {
            return Err(ValidationError::InvertedWindow {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        Ok(Self { start, end })
    }

    pub const fn single(day: DateKey) -> Self {
        Self {
            start: day,
            end: day,
        }
    }

    /// The `days` most recent days ending on (and including) `end`.
    pub fn trailing(end: DateKey, days: u32) -> Result<Self, ValidationError> {
        if days == 0 {
            return Err(ValidationError::EmptyWindow);
        }
        let start = end
            .offset_days(-(i64::from(days) - 1))
            .ok_or(ValidationError::DateOutOfRange)?;
        Ok(Self { start, end })
    }

    pub const fn start(&self) -> DateKey {
        self.start
    }

    pub const fn end(&self) -> DateKey {
        self.end
    }

    /// Number of days in the window, both ends included.
    pub fn len(&self) -> usize {
        usize::try_from(self.start.days_until(self.end) + 1).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, day: DateKey) -> bool {
        self.start <= day && day <= self.end
    }

    /// Same end day, start moved `days` earlier.
    pub fn extend_back(&self, days: u32) -> Result<Self, ValidationError> {
        let start = self
            .start
            .offset_days(-i64::from(days))
            .ok_or(ValidationError::DateOutOfRange)?;
        Ok(Self {
            start,
            end: self.end,
        })
    }

    /// Fresh ascending iterator over every day of the window.
    pub fn days(&self) -> DaySequence {
        DaySequence::new(self.start, self.end)
    }
}

impl IntoIterator for Window {
    type Item = DateKey;
    type IntoIter = DaySequence;

    fn into_iter(self) -> Self::IntoIter {
        self.days()
    }
}

/// Lazy, finite iterator over consecutive UTC days.
///
/// Clone it to restart from the same position.
#[derive(Debug, Clone)]
pub struct DaySequence {
    front: Option<DateKey>,
    back: Option<DateKey>,
}

impl DaySequence {
    /// Days from `start` through `end`; empty when `start > end`.
    pub fn new(start: DateKey, end: DateKey) -> Self {
        if start > end {
            return Self {
                front: None,
                back: None,
            };
        }
        Self {
            front: Some(start),
            back: Some(end),
        }
    }

    fn remaining(&self) -> usize {
        match (self.front, self.back) {
            (Some(front), Some(back)) => usize::try_from(front.days_until(back) + 1).unwrap_or(0),
            _ => 0,
        }
    }

    fn finish(&mut self) {
        self.front = None;
        self.back = None;
    }
}

impl Iterator for DaySequence {
    type Item = DateKey;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.front?;
        if Some(current) == self.back {
            self.finish();
        } else {
            self.front = current.next();
            if self.front.is_none() {
                self.back = None;
            }
        }
        Some(current)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.remaining();
        (remaining, Some(remaining))
    }
}

impl DoubleEndedIterator for DaySequence {
    fn next_back(&mut self) -> Option<Self::Item> {
        let current = self.back?;
        if Some(current) == self.front {
            self.finish();
        } else {
            self.back = current.previous();
            if self.back.is_none() {
                self.front = None;
            }
        }
        Some(current)
    }
}

impl ExactSizeIterator for DaySequence {}

impl FusedIterator for DaySequence {}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(value: &str) -> DateKey {
        DateKey::parse(value).expect("valid day")
    }

    #[test]
    fn rejects_inverted_window() {
        let err = Window::new(day("2020-09-02"), day("2020-09-01")).expect_err("must fail");
        assert!(matches!(err, ValidationError::InvertedWindow { .. }));
    }

    #[test]
    fn enumerates_every_day_inclusive() {
        let window = Window::new(day("2020-12-30"), day("2021-01-02")).expect("valid");
        let days = window.days().map(|d| d.to_string()).collect::<Vec<_>>();
        assert_eq!(
            days,
            vec!["2020-12-30", "2020-12-31", "2021-01-01", "2021-01-02"]
        );
        assert_eq!(window.len(), 4);
        assert_eq!(window.days().len(), 4);
    }

    #[test]
    fn single_day_window_yields_one_day() {
        let window = Window::single(day("2020-09-01"));
        assert_eq!(window.days().collect::<Vec<_>>(), vec![day("2020-09-01")]);
    }

    #[test]
    fn sequence_is_restartable_and_reversible() {
        let window = Window::new(day("2020-09-01"), day("2020-09-03")).expect("valid");
        let mut sequence = window.days();
        let restart = sequence.clone();

        assert_eq!(sequence.next(), Some(day("2020-09-01")));
        assert_eq!(sequence.next_back(), Some(day("2020-09-03")));
        assert_eq!(sequence.next(), Some(day("2020-09-02")));
        assert_eq!(sequence.next(), None);
        assert_eq!(sequence.next_back(), None);

        assert_eq!(restart.count(), 3);
    }

    #[test]
    fn trailing_and_extend_back() {
        let window = Window::trailing(day("2020-09-30"), 7).expect("valid");
        assert_eq!(window.start(), day("2020-09-24"));
        assert_eq!(window.len(), 7);

        let extended = window.extend_back(3).expect("valid");
        assert_eq!(extended.start(), day("2020-09-21"));
        assert_eq!(extended.end(), day("2020-09-30"));
        assert_eq!(window.extend_back(0).expect("valid"), window);

        assert!(matches!(
            Window::trailing(day("2020-09-30"), 0),
            Err(ValidationError::EmptyWindow)
        ));
    }
}

//! Reactive parameter store.
//!
//! The [`ParameterStore`] owns the current [`ParameterSet`] (year bound plus
//! the two axis selections) and a list of subscribers. Each subscriber names
//! the parameters it reads; a write to one of those parameters runs the
//! subscriber synchronously, in registration order, before the setter
//! returns. Writing the value already held notifies nobody.

use std::{fmt, ops::RangeInclusive, str::FromStr};

use clap::ValueEnum;
use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_YEAR: i32 = 2000;
pub const YEAR_MIN: i32 = 1960;
pub const YEAR_MAX: i32 = 2025;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[value(rename_all = "lowercase")]
pub enum Metric {
    Favorites,
    Popularity,
}

impl Metric {
    pub fn column_name(self) -> &'static str {
        match self {
            Metric::Favorites => "Favorites",
            Metric::Popularity => "Popularity",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column_name())
    }
}

impl FromStr for Metric {
    type Err = ParameterError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "favorites" => Ok(Metric::Favorites),
            "popularity" => Ok(Metric::Popularity),
            _ => Err(ParameterError::UnknownMetric(value.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Parameter {
    Year,
    TimelineAxis,
    GenreAxis,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParameterError {
    #[error("year {year} is outside the slider range {min}..={max}")]
    YearOutOfRange { year: i32, min: i32, max: i32 },
    #[error("unknown metric '{0}' (expected favorites or popularity)")]
    UnknownMetric(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct ParameterSet {
    pub year: i32,
    pub timeline_axis: Metric,
    pub genre_axis: Metric,
}

impl Default for ParameterSet {
    fn default() -> Self {
        Self {
            year: DEFAULT_YEAR,
            timeline_axis: Metric::Favorites,
            genre_axis: Metric::Popularity,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(usize);

type Callback = Box<dyn FnMut(&ParameterSet)>;

struct Subscriber {
    id: SubscriptionId,
    topics: Vec<Parameter>,
    callback: Callback,
}

pub struct ParameterStore {
    current: ParameterSet,
    year_range: RangeInclusive<i32>,
    subscribers: Vec<Subscriber>,
    next_id: usize,
}

impl fmt::Debug for ParameterStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParameterStore")
            .field("current", &self.current)
            .field("year_range", &self.year_range)
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

impl Default for ParameterStore {
    fn default() -> Self {
        Self {
            current: ParameterSet::default(),
            year_range: YEAR_MIN..=YEAR_MAX,
            subscribers: Vec::new(),
            next_id: 0,
        }
    }
}

impl ParameterStore {
    pub fn new(
        initial: ParameterSet,
        year_range: RangeInclusive<i32>,
    ) -> Result<Self, ParameterError> {
        check_year(initial.year, &year_range)?;
        Ok(Self {
            current: initial,
            year_range,
            subscribers: Vec::new(),
            next_id: 0,
        })
    }

    pub fn current(&self) -> &ParameterSet {
        &self.current
    }

    pub fn year_range(&self) -> &RangeInclusive<i32> {
        &self.year_range
    }

    pub fn subscribe<F>(&mut self, topics: &[Parameter], callback: F) -> SubscriptionId
    where
        F: FnMut(&ParameterSet) + 'static,
    {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscribers.push(Subscriber {
            id,
            topics: topics.to_vec(),
            callback: Box::new(callback),
        });
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|subscriber| subscriber.id != id);
        before != self.subscribers.len()
    }

    /// Returns the number of subscribers that were notified.
    pub fn set_year(&mut self, year: i32) -> Result<usize, ParameterError> {
        check_year(year, &self.year_range)?;
        if self.current.year == year {
            return Ok(0);
        }
        self.current.year = year;
        Ok(self.notify(Parameter::Year))
    }

    pub fn set_timeline_axis(&mut self, metric: Metric) -> usize {
        if self.current.timeline_axis == metric {
            return 0;
        }
        self.current.timeline_axis = metric;
        self.notify(Parameter::TimelineAxis)
    }

    pub fn set_genre_axis(&mut self, metric: Metric) -> usize {
        if self.current.genre_axis == metric {
            return 0;
        }
        self.current.genre_axis = metric;
        self.notify(Parameter::GenreAxis)
    }

    fn notify(&mut self, changed: Parameter) -> usize {
        let snapshot = self.current;
        let mut notified = 0;
        for subscriber in self
            .subscribers
            .iter_mut()
            .filter(|subscriber| subscriber.topics.contains(&changed))
        {
            (subscriber.callback)(&snapshot);
            notified += 1;
        }
        debug!("{changed:?} changed to {snapshot:?}; notified {notified} subscriber(s)");
        notified
    }
}

fn check_year(year: i32, range: &RangeInclusive<i32>) -> Result<(), ParameterError> {
    if range.contains(&year) {
        Ok(())
    } else {
        Err(ParameterError::YearOutOfRange {
            year,
            min: *range.start(),
            max: *range.end(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{cell::RefCell, rc::Rc};

    #[test]
    fn defaults_match_the_dashboard_widgets() {
        let params = ParameterSet::default();
        assert_eq!(params.year, 2000);
        assert_eq!(params.timeline_axis, Metric::Favorites);
        assert_eq!(params.genre_axis, Metric::Popularity);
    }

    #[test]
    fn only_interested_subscribers_are_notified() {
        let mut store = ParameterStore::default();
        let log = Rc::new(RefCell::new(Vec::new()));

        let year_log = Rc::clone(&log);
        store.subscribe(&[Parameter::Year], move |p| {
            year_log.borrow_mut().push(format!("year:{}", p.year))
        });
        let genre_log = Rc::clone(&log);
        store.subscribe(&[Parameter::Year, Parameter::GenreAxis], move |p| {
            genre_log.borrow_mut().push(format!("genre:{}", p.genre_axis))
        });

        assert_eq!(store.set_year(1998), Ok(2));
        assert_eq!(store.set_genre_axis(Metric::Favorites), 1);
        assert_eq!(store.set_timeline_axis(Metric::Popularity), 0);

        assert_eq!(
            *log.borrow(),
            vec!["year:1998", "genre:Popularity", "genre:Favorites"]
        );
    }

    #[test]
    fn unchanged_writes_do_not_notify() {
        let mut store = ParameterStore::default();
        let hits = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&hits);
        store.subscribe(&[Parameter::Year], move |_| *counter.borrow_mut() += 1);

        assert_eq!(store.set_year(2000), Ok(0));
        assert_eq!(*hits.borrow(), 0);
    }

    #[test]
    fn out_of_range_year_is_rejected_without_change() {
        let mut store = ParameterStore::default();
        let err = store.set_year(1959).unwrap_err();
        assert_eq!(
            err,
            ParameterError::YearOutOfRange {
                year: 1959,
                min: 1960,
                max: 2025
            }
        );
        assert_eq!(store.current().year, 2000);
        assert!(store.set_year(1960).is_ok());
        assert!(store.set_year(2026).is_err());
    }

    #[test]
    fn unsubscribe_stops_notifications() {
        let mut store = ParameterStore::default();
        let hits = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&hits);
        let id = store.subscribe(&[Parameter::Year], move |_| *counter.borrow_mut() += 1);
        store.set_year(2001).unwrap();
        assert!(store.unsubscribe(id));
        assert!(!store.unsubscribe(id));
        store.set_year(2002).unwrap();
        assert_eq!(*hits.borrow(), 1);
    }

    #[test]
    fn metric_parses_case_insensitively() {
        assert_eq!("Favorites".parse::<Metric>(), Ok(Metric::Favorites));
        assert_eq!(" POPULARITY ".parse::<Metric>(), Ok(Metric::Popularity));
        assert!("members".parse::<Metric>().is_err());
    }

    #[test]
    fn initial_year_is_checked_against_range() {
        let params = ParameterSet {
            year: 1950,
            ..ParameterSet::default()
        };
        assert!(ParameterStore::new(params, 1960..=2025).is_err());
        assert!(ParameterStore::new(params, 1940..=2025).is_ok());
    }
}

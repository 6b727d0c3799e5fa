//! Tables keyed by a time interval.
//!
//! Rows are kept sorted by interval start and stored intervals never
//! overlap. A row whose start falls inside a neighbour shortens that
//! neighbour so it ends where the new row begins; the new row is in turn
//! shortened if it would run past the start of its right-hand neighbour.
//!
//! ```text
//! stored   [10 ------- 20)      [25 ------- 35)
//! insert          [15 -------------- 30)
//! result   [10 - 15)[15 ------ 25)[25 ------- 35)
//! ```
//!
//! Search is a bisection over the sorted rows, with fast paths for rows
//! arriving in ascending or descending order.

use crate::error::TableError;
use crate::field::Attributes;
use crate::key::{Placement, TableKey};
use crate::row::Row;
use crate::types::{ArrayTime, TimeInterval};
use crate::Table;

crate::attributes! {
    /// Key of interval-indexed tables such as FlagCmd.
    pub struct TimeIntervalKey {
        time_interval: TimeInterval => "timeInterval",
    }
}

impl TimeIntervalKey {
    pub fn new(start: i64, duration: i64) -> Self {
        Self {
            time_interval: TimeInterval::new(start, duration),
        }
    }

    #[must_use]
    pub fn start(&self) -> ArrayTime {
        self.time_interval.start
    }
}

impl TableKey for TimeIntervalKey {
    /// A stored row answers for every instant of its interval.
    fn matches(&self, stored: &Self) -> bool {
        stored.time_interval.contains(self.time_interval.start)
    }

    fn place<V: Attributes>(
        rows: &mut Vec<Row<Self, V>>,
        row: Row<Self, V>,
    ) -> Result<Placement, Row<Self, V>> {
        insert_by_start_time(rows, row)
    }
}

/// A table of rows keyed by [`TimeIntervalKey`].
pub type IntervalTable<V> = Table<TimeIntervalKey, V>;

fn interval<V: Attributes>(row: &Row<TimeIntervalKey, V>) -> TimeInterval {
    row.key().time_interval
}

/// Shortens `row` so that it ends at `at`, if it currently ends later.
fn trim_to<V: Attributes>(row: &mut Row<TimeIntervalKey, V>, at: ArrayTime) {
    let ti = &mut row.key_mut().time_interval;
    if at < ti.end() {
        ti.duration = at.0 - ti.start.0;
    }
}

/// Inserts `row` into `rows`, which must already be sorted by start and
/// free of overlaps.
///
/// A row starting exactly where a stored row starts is a re-insertion: if
/// the values are equal the stored row wins ([`Placement::Existing`]),
/// otherwise the row is handed back as a collision.
pub fn insert_by_start_time<V: Attributes>(
    rows: &mut Vec<Row<TimeIntervalKey, V>>,
    mut row: Row<TimeIntervalKey, V>,
) -> Result<Placement, Row<TimeIntervalKey, V>> {
    let start = interval(&row).start;

    if rows.is_empty() {
        rows.push(row);
        return Ok(Placement::Inserted(0));
    }

    // ascending arrivals
    let last = rows.len() - 1;
    if start > interval(&rows[last]).start {
        trim_to(&mut rows[last], start);
        rows.push(row);
        return Ok(Placement::Inserted(last + 1));
    }

    // descending arrivals
    let first_start = interval(&rows[0]).start;
    if start < first_start {
        trim_to(&mut row, first_start);
        rows.insert(0, row);
        return Ok(Placement::Inserted(0));
    }

    // rows[lo].start <= start <= rows[hi].start
    let (mut lo, mut hi) = (0, last);
    loop {
        for i in [lo, hi] {
            if interval(&rows[i]).start == start {
                return if rows[i].value() == row.value() {
                    Ok(Placement::Existing(i))
                } else {
                    Err(row)
                };
            }
        }
        if hi - lo <= 1 {
            break;
        }
        let mid = (lo + hi) / 2;
        if start <= interval(&rows[mid]).start {
            hi = mid;
        } else {
            lo = mid;
        }
    }

    trim_to(&mut rows[lo], start);
    trim_to(&mut row, interval(&rows[hi]).start);
    rows.insert(hi, row);
    Ok(Placement::Inserted(hi))
}

impl<V: Attributes> Table<TimeIntervalKey, V> {
    /// Inserts `row` in start-time order, trimming neighbours, without the
    /// containment check [`Table::add`] performs.
    ///
    /// Re-inserting a row identical to a stored one returns the stored row.
    pub fn insert_by_start_time(
        &mut self,
        row: Row<TimeIntervalKey, V>,
    ) -> Result<&Row<TimeIntervalKey, V>, TableError> {
        self.ensure_loaded()?;
        let index = self.place(row)?;
        Ok(&self.rows[index])
    }
}

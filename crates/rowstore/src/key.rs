use crate::field::Attributes;
use crate::row::Row;

/// Where an inserted row ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// The row was stored at this index.
    Inserted(usize),
    /// An identical row already lives at this index; the new one was dropped.
    Existing(usize),
}

impl Placement {
    #[must_use]
    pub fn index(self) -> usize {
        match self {
            Placement::Inserted(i) | Placement::Existing(i) => i,
        }
    }
}

/// The key tuple of a table.
///
/// The defaults give plain tables: keys match on equality and rows keep
/// insertion order. Interval-keyed tables override both (see
/// [`TimeIntervalKey`](crate::TimeIntervalKey)).
pub trait TableKey: Attributes {
    /// True when a lookup for `self` should return the row stored under
    /// `stored`.
    fn matches(&self, stored: &Self) -> bool {
        self == stored
    }

    /// Stores `row` in `rows`. Gives the row back when its key collides
    /// with a stored row in a way the table cannot accept.
    fn place<V: Attributes>(
        rows: &mut Vec<Row<Self, V>>,
        row: Row<Self, V>,
    ) -> Result<Placement, Row<Self, V>> {
        rows.push(row);
        Ok(Placement::Inserted(rows.len() - 1))
    }
}

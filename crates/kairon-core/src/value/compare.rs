use crate::value::Value;
use std::cmp::Ordering;

// Ints widen to f64 when compared against floats; every other pairing is
// only comparable within the same variant.
#[allow(clippy::cast_precision_loss)]
fn numeric_pair(left: &Value, right: &Value) -> Option<(f64, f64)> {
    match (left, right) {
        (Value::Int(a), Value::Float(b)) => Some((*a as f64, *b)),
        (Value::Float(a), Value::Int(b)) => Some((*a, *b as f64)),
        _ => None,
    }
}

impl Value {
    /// Equality used by filter predicates.
    #[must_use]
    pub fn loose_eq(&self, other: &Self) -> bool {
        if let Some((a, b)) = numeric_pair(self, other) {
            return a == b;
        }

        match (self, other) {
            (Self::List(a), Self::List(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.loose_eq(y))
            }
            _ => self == other,
        }
    }

    /// Ordering used by range predicates and sorting.
    /// `None` when the two values are not mutually comparable.
    #[must_use]
    pub fn loose_cmp(&self, other: &Self) -> Option<Ordering> {
        if let Some((a, b)) = numeric_pair(self, other) {
            return a.partial_cmp(&b);
        }

        match (self, other) {
            (Self::Null, Self::Null) => Some(Ordering::Equal),
            (Self::Bool(a), Self::Bool(b)) => Some(a.cmp(b)),
            (Self::Int(a), Self::Int(b)) => Some(a.cmp(b)),
            (Self::Float(a), Self::Float(b)) => a.partial_cmp(b),
            (Self::Text(a), Self::Text(b)) => Some(a.cmp(b)),
            (Self::Timestamp(a), Self::Timestamp(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// Total ordering for sort keys: incomparable pairs fall back to a
    /// fixed rank per variant so sorting never panics.
    #[must_use]
    pub fn sort_cmp(&self, other: &Self) -> Ordering {
        self.loose_cmp(other)
            .unwrap_or_else(|| self.sort_rank().cmp(&other.sort_rank()))
    }

    const fn sort_rank(&self) -> u8 {
        match self {
            Self::Null => 0,
            Self::Bool(_) => 1,
            Self::Int(_) | Self::Float(_) => 2,
            Self::Timestamp(_) => 3,
            Self::Text(_) => 4,
            Self::List(_) => 5,
            Self::Map(_) => 6,
        }
    }
}

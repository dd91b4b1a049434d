use crate::{
    db::{Record, query::SortDirection},
    value::Value,
};
use std::{cmp::Ordering, fmt};

///
/// FilterOp
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FilterOp {
    Eq,
    /// Collection membership.
    Contains,
    Gte,
    Lt,
}

impl fmt::Display for FilterOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Eq => "==",
            Self::Contains => "array-contains",
            Self::Gte => ">=",
            Self::Lt => "<",
        };
        write!(f, "{label}")
    }
}

///
/// Predicate
/// One backend filter: `field op value`.
///

#[derive(Clone, Debug, PartialEq)]
pub struct Predicate {
    pub field: String,
    pub op: FilterOp,
    pub value: Value,
}

impl Predicate {
    pub fn new(field: impl Into<String>, op: FilterOp, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            op,
            value: value.into(),
        }
    }

    /// Document-store semantics: a record lacking the field never matches.
    #[must_use]
    pub fn matches(&self, record: &Record) -> bool {
        let Some(actual) = record.get_path(&self.field) else {
            return false;
        };

        match self.op {
            FilterOp::Eq => actual.loose_eq(&self.value),
            FilterOp::Contains => actual
                .as_list()
                .is_some_and(|items| items.iter().any(|item| item.loose_eq(&self.value))),
            FilterOp::Gte => matches!(
                actual.loose_cmp(&self.value),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            FilterOp::Lt => matches!(actual.loose_cmp(&self.value), Some(Ordering::Less)),
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {:?}", self.field, self.op, self.value)
    }
}

///
/// SortSpec
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SortSpec {
    pub field: String,
    pub direction: SortDirection,
}

impl SortSpec {
    /// Compare two records on the sort field; absent values sort as null.
    #[must_use]
    pub fn compare(&self, left: &Record, right: &Record) -> Ordering {
        let null = Value::Null;
        let a = left.get_path(&self.field).unwrap_or(&null);
        let b = right.get_path(&self.field).unwrap_or(&null);

        match self.direction {
            SortDirection::Asc => a.sort_cmp(b),
            SortDirection::Desc => b.sort_cmp(a),
        }
    }
}

///
/// PageSpec
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PageSpec {
    pub offset: usize,
    pub limit: usize,
}

///
/// QueryPlan
///
/// Backend-neutral translation of one list request. Filters are
/// conjunctive and kept in emission order.
///

#[derive(Clone, Debug, PartialEq)]
pub struct QueryPlan {
    pub filters: Vec<Predicate>,
    pub sort: Option<SortSpec>,
    pub page: PageSpec,
}

impl QueryPlan {
    #[must_use]
    pub fn matches(&self, record: &Record) -> bool {
        self.filters.iter().all(|p| p.matches(record))
    }

    /// Filter, sort, and paginate `(id, record)` pairs in memory.
    /// Without a sort spec, results come back in id order.
    #[must_use]
    pub fn execute<'a, I>(&self, rows: I) -> Vec<(&'a str, &'a Record)>
    where
        I: IntoIterator<Item = (&'a str, &'a Record)>,
    {
        let mut hits: Vec<_> = rows
            .into_iter()
            .filter(|(_, record)| self.matches(record))
            .collect();

        match &self.sort {
            Some(sort) => hits.sort_by(|(id_a, a), (id_b, b)| {
                sort.compare(a, b).then_with(|| id_a.cmp(id_b))
            }),
            None => hits.sort_by(|(id_a, _), (id_b, _)| id_a.cmp(id_b)),
        }

        hits.into_iter()
            .skip(self.page.offset)
            .take(self.page.limit)
            .collect()
    }
}

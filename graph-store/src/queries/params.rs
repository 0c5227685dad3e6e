//! Builders for nested Bolt parameters (lists of maps fed to `UNWIND`).

use neo4rs::{BoltList, BoltMap, BoltNull, BoltType};

pub fn null() -> BoltType {
    BoltType::Null(BoltNull)
}

/// `Some` → the value, `None` → Bolt null.
pub fn opt<T: Into<BoltType>>(value: Option<T>) -> BoltType {
    value.map(Into::into).unwrap_or_else(null)
}

pub fn map<I>(entries: I) -> BoltType
where
    I: IntoIterator<Item = (&'static str, BoltType)>,
{
    let mut out = BoltMap::default();
    for (key, value) in entries {
        out.put(key.into(), value);
    }
    BoltType::Map(out)
}

pub fn list<I>(items: I) -> BoltType
where
    I: IntoIterator<Item = BoltType>,
{
    let mut out = BoltList::default();
    for item in items {
        out.push(item);
    }
    BoltType::List(out)
}

/// `[{start, end}, ...]` from spans.
pub fn lines(spans: &[crate::model::Span]) -> BoltType {
    list(
        spans
            .iter()
            .map(|span| map([("start", span.start.into()), ("end", span.end.into())])),
    )
}

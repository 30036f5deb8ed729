use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque identity of a stored record.
///
/// MongoDB records use the hex form of their `ObjectId`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Top-level content container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Guide {
    pub id: RecordId,
    #[serde(rename = "Title", default)]
    pub title: String,
    #[serde(rename = "Description", default)]
    pub description: String,
    #[serde(rename = "Slug", default)]
    pub slug: String,
}

/// Ordered grouping of pages inside a guide.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub id: RecordId,
    #[serde(rename = "Title", default)]
    pub title: String,
    #[serde(rename = "Description", default)]
    pub description: String,
    #[serde(rename = "Order", default, deserialize_with = "deserialize_order")]
    pub order: Option<f64>,
    pub guide: RecordId,
}

/// Leaf content unit with a markdown body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub id: RecordId,
    #[serde(rename = "Title", default)]
    pub title: String,
    #[serde(rename = "Content", default)]
    pub content: String,
    #[serde(rename = "Order", default, deserialize_with = "deserialize_order")]
    pub order: Option<f64>,
    pub section: RecordId,
}

/// Parses a position stored as text, e.g. `" 3 "`.
pub fn order_from_text(text: &str) -> Option<f64> {
    text.trim().parse().ok()
}

/// Accepts any number or a numeric string for `Order`. Anything else counts
/// as no position.
fn deserialize_order<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::{self, Visitor};

    struct OrderVisitor;

    impl<'de> Visitor<'de> for OrderVisitor {
        type Value = Option<f64>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a number or a numeric string")
        }

        fn visit_f64<E: de::Error>(self, value: f64) -> Result<Self::Value, E> {
            Ok(Some(value))
        }

        fn visit_i64<E: de::Error>(self, value: i64) -> Result<Self::Value, E> {
            Ok(Some(value as f64))
        }

        fn visit_u64<E: de::Error>(self, value: u64) -> Result<Self::Value, E> {
            Ok(Some(value as f64))
        }

        fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
            Ok(order_from_text(value))
        }

        fn visit_bool<E: de::Error>(self, _: bool) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }
    }

    deserializer.deserialize_any(OrderVisitor)
}

/// Records that carry an explicit sibling position.
pub trait Ordered {
    fn order(&self) -> Option<f64>;
}

impl Ordered for Section {
    fn order(&self) -> Option<f64> {
        self.order
    }
}

impl Ordered for Page {
    fn order(&self) -> Option<f64> {
        self.order
    }
}

/// Sorts siblings by `Order` ascending.
///
/// The sort is stable, so equal positions keep the order the store returned
/// them in. Records without a position go last.
pub fn sort_by_order<T: Ordered>(items: &mut [T]) {
    items.sort_by(|a, b| match (a.order(), b.order()) {
        (Some(a), Some(b)) => a.total_cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(id: &str, order: Option<f64>) -> Page {
        Page {
            id: id.into(),
            title: id.to_uppercase(),
            content: String::new(),
            order,
            section: "s".into(),
        }
    }

    fn ids(pages: &[Page]) -> Vec<&str> {
        pages.iter().map(|p| p.id.as_str()).collect()
    }

    #[test]
    fn test_sort_ascending() {
        let mut pages = vec![page("c", Some(3.0)), page("a", Some(1.0)), page("b", Some(2.0))];
        sort_by_order(&mut pages);
        assert_eq!(ids(&pages), ["a", "b", "c"]);
    }

    #[test]
    fn test_sort_ties_keep_fetch_order() {
        let mut pages = vec![
            page("x", Some(1.0)),
            page("first", Some(0.0)),
            page("y", Some(1.0)),
            page("z", Some(1.0)),
        ];
        sort_by_order(&mut pages);
        assert_eq!(ids(&pages), ["first", "x", "y", "z"]);
    }

    #[test]
    fn test_sort_missing_order_last() {
        let mut pages = vec![page("none", None), page("neg", Some(-1.0)), page("none2", None)];
        sort_by_order(&mut pages);
        assert_eq!(ids(&pages), ["neg", "none", "none2"]);
    }

    #[test]
    fn test_deserialize_dump_fields() {
        let section: Section = serde_json::from_str(
            r#"{"id":"s1","Title":"Basics","Order":2,"guide":"g1"}"#,
        )
        .unwrap();
        assert_eq!(section.title, "Basics");
        assert_eq!(section.description, "");
        assert_eq!(section.order, Some(2.0));
        assert_eq!(section.guide, RecordId::new("g1"));
    }

    #[test]
    fn test_order_accepts_numeric_strings() {
        let pages: Vec<Page> = serde_json::from_str(
            r#"[
                {"id":"a","Order":"3","section":"s"},
                {"id":"b","Order":" 1.5 ","section":"s"},
                {"id":"c","Order":"first","section":"s"},
                {"id":"d","Order":null,"section":"s"},
                {"id":"e","Order":true,"section":"s"},
                {"id":"f","section":"s"}
            ]"#,
        )
        .unwrap();
        let orders: Vec<_> = pages.iter().map(|p| p.order).collect();
        assert_eq!(orders, [Some(3.0), Some(1.5), None, None, None, None]);
    }
}

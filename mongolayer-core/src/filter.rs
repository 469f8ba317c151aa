//! Small builders for raw filter and sort documents.
//!
//! These helpers produce plain [`bson::Document`] values that can be handed straight to the
//! repository. For composable expressions see the [`query`](crate::query) module.

use bson::{Bson, Document, doc};

use crate::query::SortDirection;

/// Builds an equality filter from `(field, value)` conditions, dropping absent values.
///
/// ```ignore
/// let filter = build_filter([("status", Some("active".into())), ("role", None)]);
/// assert_eq!(filter, doc! { "status": "active" });
/// ```
pub fn build_filter<K, I>(conditions: I) -> Document
where
    K: Into<String>,
    I: IntoIterator<Item = (K, Option<Bson>)>,
{
    conditions
        .into_iter()
        .filter_map(|(key, value)| value.map(|value| (key.into(), value)))
        .collect()
}

/// Builds an ordered sort document. Keys keep the order they are given in.
pub fn build_sort<K, I>(sorts: I) -> Document
where
    K: Into<String>,
    I: IntoIterator<Item = (K, SortDirection)>,
{
    sorts
        .into_iter()
        .map(|(key, direction)| (key.into(), Bson::Int32(direction.as_i32())))
        .collect()
}

/// Builds `{ field: { "$regex": pattern, "$options": options } }`.
///
/// The `$options` key is only present when at least one option is given; options are
/// concatenated in order.
pub fn build_regex_filter(field: &str, pattern: &str, options: &[&str]) -> Document {
    let mut regex = doc! { "$regex": pattern };
    if !options.is_empty() {
        regex.insert("$options", options.concat());
    }

    doc! { field: regex }
}

/// Builds `{ field: { "$in": values } }`.
pub fn build_in_filter<V, I>(field: &str, values: I) -> Document
where
    V: Into<Bson>,
    I: IntoIterator<Item = V>,
{
    let values: Vec<Bson> = values.into_iter().map(Into::into).collect();
    doc! { field: { "$in": values } }
}

/// Builds an inclusive range filter. Either bound may be absent.
pub fn build_range_filter(field: &str, min: Option<Bson>, max: Option<Bson>) -> Document {
    let mut range = Document::new();
    if let Some(min) = min {
        range.insert("$gte", min);
    }
    if let Some(max) = max {
        range.insert("$lte", max);
    }

    doc! { field: range }
}

/// Builds a `$text` search filter. Requires a text index on the collection.
pub fn build_text_search_filter(text: &str) -> Document {
    doc! { "$text": { "$search": text } }
}

/// Merges documents left to right. Later keys overwrite earlier ones.
pub fn merge_documents<'a>(documents: impl IntoIterator<Item = &'a Document>) -> Document {
    let mut merged = Document::new();
    for document in documents {
        for (key, value) in document {
            merged.insert(key.clone(), value.clone());
        }
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn filter_drops_absent_conditions() {
        let filter = build_filter([
            ("status", Some(Bson::from("active"))),
            ("role", None),
            ("age", Some(Bson::Int32(30))),
        ]);

        assert_eq!(filter, doc! { "status": "active", "age": 30 });
    }

    #[test]
    fn sort_keeps_order() {
        let sort = build_sort([("created_at", SortDirection::Desc), ("username", SortDirection::Asc)]);
        let keys: Vec<&String> = sort.keys().collect();

        assert_eq!(keys, vec!["created_at", "username"]);
        assert_eq!(sort, doc! { "created_at": -1, "username": 1 });
    }

    #[test]
    fn regex_options_are_optional() {
        assert_eq!(build_regex_filter("name", "^al", &[]), doc! { "name": { "$regex": "^al" } });
        assert_eq!(
            build_regex_filter("name", "^al", &["i", "m"]),
            doc! { "name": { "$regex": "^al", "$options": "im" } },
        );
    }

    #[test]
    fn in_filter() {
        assert_eq!(
            build_in_filter("status", ["draft", "published"]),
            doc! { "status": { "$in": ["draft", "published"] } },
        );
    }

    #[test]
    fn range_filter_with_one_bound() {
        assert_eq!(
            build_range_filter("age", Some(Bson::Int32(18)), None),
            doc! { "age": { "$gte": 18 } },
        );
        assert_eq!(
            build_range_filter("age", Some(Bson::Int32(18)), Some(Bson::Int32(65))),
            doc! { "age": { "$gte": 18, "$lte": 65 } },
        );
        assert_eq!(build_range_filter("age", None, None), doc! { "age": {} });
    }

    #[test]
    fn text_search() {
        assert_eq!(build_text_search_filter("rust"), doc! { "$text": { "$search": "rust" } });
    }

    #[test]
    fn merge_later_keys_win() {
        let merged = merge_documents([&doc! { "a": 1, "b": 1 }, &doc! { "b": 2, "c": 3 }]);
        assert_eq!(merged, doc! { "a": 1, "b": 2, "c": 3 });
    }
}

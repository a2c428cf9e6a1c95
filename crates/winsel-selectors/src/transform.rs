#![forbid(unsafe_code)]

//! Conversion from source records to provider items.
//!
//! Sources usually hand back loosely shaped JSON records. The default
//! transform picks an id from the first usable `id`, `key` or `_id` field and
//! falls back to `item-{index}`. The type tag comes from `type`, then
//! `category`.

use std::fmt::Display;
use std::rc::Rc;

use serde_json::Value;
use winsel_core::{Dependency, Item, ProviderError, Selector};

const ID_FIELDS: [&str; 3] = ["id", "key", "_id"];
const TYPE_FIELDS: [&str; 2] = ["type", "category"];

fn scalar_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Wrap one JSON record as an item.
#[must_use]
pub fn default_transform(index: usize, value: &Value) -> Item<Value> {
    let id = ID_FIELDS
        .iter()
        .find_map(|field| value.get(field).and_then(scalar_id))
        .unwrap_or_else(|| format!("item-{index}"));
    let item_type = TYPE_FIELDS
        .iter()
        .find_map(|field| value.get(field).and_then(Value::as_str))
        .filter(|ty| !ty.is_empty())
        .map(str::to_owned);

    Item {
        id,
        content: value.clone(),
        item_type,
    }
}

/// Apply [`default_transform`] to every record.
#[must_use]
pub fn transform_json(values: &[Value]) -> Vec<Item<Value>> {
    values
        .iter()
        .enumerate()
        .map(|(index, value)| default_transform(index, value))
        .collect()
}

/// Apply an infallible transform to every record.
pub fn transform_all<S, T>(values: &[S], f: impl Fn(usize, &S) -> Item<T>) -> Vec<Item<T>> {
    values
        .iter()
        .enumerate()
        .map(|(index, value)| f(index, value))
        .collect()
}

/// Apply a fallible transform, stopping at the first failure.
///
/// The failure is reported as [`ProviderError::Transform`] naming the record
/// index, ready to be handed to the provider as its error state.
pub fn try_transform<S, T, E: Display>(
    values: &[S],
    f: impl Fn(usize, &S) -> Result<Item<T>, E>,
) -> Result<Vec<Item<T>>, ProviderError> {
    values
        .iter()
        .enumerate()
        .map(|(index, value)| {
            f(index, value).map_err(|err| {
                tracing::debug!(message = "selectors.transform_failed", index, error = %err);
                ProviderError::transform(format!("record {index}: {err}"))
            })
        })
        .collect()
}

fn any_string_leaf(value: &Value, needle: &str) -> bool {
    match value {
        Value::String(s) => s.to_lowercase().contains(needle),
        Value::Array(values) => values.iter().any(|v| any_string_leaf(v, needle)),
        Value::Object(map) => map.values().any(|v| any_string_leaf(v, needle)),
        _ => false,
    }
}

/// Case-insensitive search across every string leaf of a JSON item.
///
/// The query is dependency 0. An absent or empty query keeps everything.
pub fn json_text_search() -> Selector<Value> {
    Selector::infallible(|raw: &[Rc<Item<Value>>], deps: &[Dependency]| {
        let query = deps
            .first()
            .and_then(Dependency::as_str)
            .map(str::to_lowercase)
            .unwrap_or_default();
        if query.is_empty() {
            return raw.to_vec();
        }
        raw.iter()
            .filter(|item| any_string_leaf(&item.content, &query))
            .cloned()
            .collect()
    })
    .named("json_text_search")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn id_precedence() {
        assert_eq!(default_transform(0, &json!({"id": "a", "key": "b"})).id, "a");
        assert_eq!(default_transform(0, &json!({"key": "b", "_id": "c"})).id, "b");
        assert_eq!(default_transform(0, &json!({"_id": "c"})).id, "c");
        assert_eq!(default_transform(7, &json!({"name": "x"})).id, "item-7");
    }

    #[test]
    fn scalar_ids_are_stringified() {
        assert_eq!(default_transform(0, &json!({"id": 42})).id, "42");
        assert_eq!(default_transform(0, &json!({"id": true})).id, "true");
        assert_eq!(default_transform(3, &json!({"id": null})).id, "item-3");
        assert_eq!(default_transform(0, &json!({"id": null, "key": 5})).id, "5");
        assert_eq!(default_transform(4, &json!({"id": {"nested": 1}})).id, "item-4");
    }

    #[test]
    fn type_then_category() {
        let typed = default_transform(0, &json!({"type": "doc", "category": "misc"}));
        assert_eq!(typed.item_type(), Some("doc"));
        let categorized = default_transform(0, &json!({"category": "misc"}));
        assert_eq!(categorized.item_type(), Some("misc"));
        let empty_type = default_transform(0, &json!({"type": "", "category": "misc"}));
        assert_eq!(empty_type.item_type(), None);
        assert_eq!(default_transform(0, &json!(5)).item_type(), None);
    }

    #[test]
    fn content_is_the_record() {
        let record = json!({"id": "a", "title": "Hello"});
        assert_eq!(default_transform(0, &record).content, record);
    }

    #[test]
    fn transform_json_uses_positions() {
        let items = transform_json(&[json!({"title": "x"}), json!({"id": "b"})]);
        let ids: Vec<&str> = items.iter().map(|item| item.id.as_str()).collect();
        assert_eq!(ids, vec!["item-0", "b"]);
    }

    #[test]
    fn transform_all_maps_every_record() {
        let items = transform_all(&[10u32, 20], |i, v| Item::new(format!("n{i}"), *v));
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].id, "n1");
        assert_eq!(items[1].content, 20);
    }

    #[test]
    fn try_transform_reports_first_failure() {
        let result = try_transform(&[1i32, -2, -3], |i, v| {
            if *v < 0 {
                Err(format!("negative value {v}"))
            } else {
                Ok(Item::new(i.to_string(), *v))
            }
        });
        let err = result.expect_err("second record fails");
        assert_eq!(err.kind(), winsel_core::ErrorKind::Transform);
        assert_eq!(err.to_string(), "transform failed: record 1: negative value -2");
    }

    #[test]
    fn try_transform_ok() {
        let items = try_transform(&[1i32, 2], |i, v| {
            Ok::<_, String>(Item::new(i.to_string(), *v))
        })
        .expect("all records valid");
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn json_search_reaches_nested_strings() {
        let raw: Vec<Rc<Item<Value>>> = transform_json(&[
            json!({"id": "a", "title": "Quarterly Report"}),
            json!({"id": "b", "meta": {"tags": ["draft", "Finance"]}}),
            json!({"id": "c", "count": 3}),
        ])
        .into_iter()
        .map(Rc::new)
        .collect();
        let search = json_text_search();

        let out = search.apply(&raw, &[Dependency::from("finance")]).expect("infallible");
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, "b");

        let out = search.apply(&raw, &[Dependency::from("REPORT")]).expect("infallible");
        assert_eq!(out[0].id, "a");

        assert_eq!(search.apply(&raw, &[]).expect("infallible").len(), 3);
    }
}

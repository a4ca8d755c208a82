//! Ordering and paging of in-memory records.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
use template_admin_model::{FieldType, Record};

/// Sort direction. Ascending unless asked otherwise.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOrder {
    #[default]
    #[serde(rename = "ASC", alias = "asc")]
    Asc,
    #[serde(rename = "DESC", alias = "desc")]
    Desc,
}

/// Field and direction to order by. No field means no reordering.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    #[serde(default)]
    pub field: Option<String>,
    #[serde(default)]
    pub order: SortOrder,
}

impl SortSpec {
    pub fn new(field: &str, order: SortOrder) -> Self {
        Self {
            field: Some(field.to_string()),
            order,
        }
    }

    pub fn ascending(field: &str) -> Self {
        Self::new(field, SortOrder::Asc)
    }

    pub fn descending(field: &str) -> Self {
        Self::new(field, SortOrder::Desc)
    }
}

/// 1-based page number and page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: usize,
    pub per_page: usize,
}

impl Pagination {
    pub fn new(page: usize, per_page: usize) -> Self {
        Self { page, per_page }
    }
}

/// Orders records by `field`.
///
/// A numeric `type_hint` parses values to numbers first, so `"10"` sorts
/// after `"2"`; values that do not parse sort before every number. Other
/// types compare by JSON value. The sort is stable.
pub fn sort_records(
    mut records: Vec<Record>,
    field: Option<&str>,
    order: SortOrder,
    type_hint: &FieldType,
) -> Vec<Record> {
    let Some(field) = field else {
        return records;
    };

    let directed = |ordering: Ordering| match order {
        SortOrder::Asc => ordering,
        SortOrder::Desc => ordering.reverse(),
    };

    if type_hint.is_numeric() {
        let integer = *type_hint == FieldType::Int;
        records.sort_by(|a, b| {
            let x = numeric_key(a.get(field), integer);
            let y = numeric_key(b.get(field), integer);
            directed(compare_numeric(x, y))
        });
    } else {
        records.sort_by(|a, b| directed(compare_values(a.get(field), b.get(field))));
    }

    records
}

/// Splits `items` into consecutive pages of `page_size`; the last page may be
/// shorter. A page size of zero yields one page holding everything.
pub fn paginate<T>(items: Vec<T>, page_size: usize) -> Vec<Vec<T>> {
    if items.is_empty() {
        return Vec::new();
    }
    if page_size == 0 {
        return vec![items];
    }

    let mut pages = Vec::with_capacity(items.len().div_ceil(page_size));
    let mut current = Vec::with_capacity(page_size);
    for item in items {
        current.push(item);
        if current.len() == page_size {
            pages.push(std::mem::replace(&mut current, Vec::with_capacity(page_size)));
        }
    }
    if !current.is_empty() {
        pages.push(current);
    }
    pages
}

/// Picks a 1-based page. Anything out of range is an empty page.
pub fn select_page<T>(pages: Vec<Vec<T>>, page: usize) -> Vec<T> {
    match page.checked_sub(1) {
        Some(index) => pages.into_iter().nth(index).unwrap_or_default(),
        None => Vec::new(),
    }
}

fn numeric_key(value: Option<&Value>, integer: bool) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64().map(|f| if integer { f.trunc() } else { f }),
        Value::String(s) => leading_number(s, integer),
        _ => None,
    }
}

/// Parses the numeric prefix of `s`, the way a lenient integer or decimal
/// parse would: `"12px"` is 12, `"3.5e2x"` is 350, `"abc"` is nothing.
fn leading_number(s: &str, integer: bool) -> Option<f64> {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let digits_from = |mut i: usize| {
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        i
    };

    let mut end = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
    let int_start = end;
    end = digits_from(end);
    let mut has_digits = end > int_start;

    if !integer {
        if bytes.get(end) == Some(&b'.') {
            let frac_end = digits_from(end + 1);
            if has_digits || frac_end > end + 1 {
                has_digits = true;
                end = frac_end;
            }
        }
        if has_digits && matches!(bytes.get(end), Some(b'e' | b'E')) {
            let mut exp = end + 1;
            if matches!(bytes.get(exp), Some(b'+' | b'-')) {
                exp += 1;
            }
            let exp_end = digits_from(exp);
            if exp_end > exp {
                end = exp_end;
            }
        }
    }

    if !has_digits {
        return None;
    }
    s[..end].parse::<f64>().ok()
}

fn compare_numeric(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Total order over JSON values: missing/null < bool < number < string <
/// array < object.
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let a = a.unwrap_or(&Value::Null);
    let b = b.unwrap_or(&Value::Null);
    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => compare_numeric(x.as_f64(), y.as_f64()),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Array(x), Value::Array(y)) => {
            for (i, j) in x.iter().zip(y) {
                let ordering = compare_values(Some(i), Some(j));
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            x.len().cmp(&y.len())
        }
        (Value::Object(_), Value::Object(_)) => a.to_string().cmp(&b.to_string()),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

//! Per-row value transformation pipeline.
//!
//! # Order
//!
//! Positional rows:
//! 1. Drop trailing blank values (`remove_empty_values`)
//! 2. Drop trailing zero literals (`remove_zero_values`)
//! 3. Numeric coercion, limited by the only/except filter
//! 4. Custom converters by position
//!
//! Mapping rows:
//! 1. Drop blank or missing values (`remove_empty_values`)
//! 2. Drop zero literals (`remove_zero_values`)
//! 3. Drop values matching `remove_values_matching`
//! 4. Numeric coercion, limited by the only/except filter
//! 5. Custom converters by key
//!
//! Removals look at the raw text, so a value removed as zero is never
//! coerced, and converters see the coerced value. A row left empty is
//! suppressed when `remove_empty_rows` is set.

use crate::config::Config;
use crate::header::Header;
use crate::streaming::parsing::{is_blank, is_zero_literal};
use crate::value::{Row, Value};

/// Run the pipeline over one split record.
///
/// Returns `None` when the row is suppressed.
pub fn transform(fields: Vec<String>, header: &Header, config: &Config) -> Option<Row> {
    if config.parse_to_arrays {
        transform_positional(fields, config)
    } else {
        transform_mapping(fields, header, config)
    }
}

/// Pipeline for rows emitted as arrays.
pub fn transform_positional(mut fields: Vec<String>, config: &Config) -> Option<Row> {
    if config.remove_empty_values {
        while fields.last().is_some_and(|v| is_blank(v)) {
            fields.pop();
        }
    }
    if config.remove_zero_values {
        while fields.last().is_some_and(|v| is_zero_literal(v)) {
            fields.pop();
        }
    }

    if fields.is_empty() && config.remove_empty_rows {
        return None;
    }

    let converters = &config.value_converters;
    let values: Vec<Value> = fields
        .into_iter()
        .enumerate()
        .map(|(i, raw)| {
            let mut value = Value::Text(raw);
            if config.convert_values_to_numeric && config.numeric_filter.allows_index(i) {
                value = value.coerce_numeric();
            }
            match converters.for_index(i) {
                Some(converter) => converter.convert(value),
                None => value,
            }
        })
        .collect();

    Some(Row::Positional(values.into_boxed_slice()))
}

/// Pipeline for rows emitted as key/value mappings.
pub fn transform_mapping(fields: Vec<String>, header: &Header, config: &Config) -> Option<Row> {
    let keys = header.keys();

    // Raw text per key; `None` marks a position missing from a short row.
    // A key fed by several positions keeps the last one.
    let mut raw: Vec<Option<String>> = vec![None; keys.len()];
    let mut fields = fields.into_iter();
    for position in 0..header.width() {
        let field = fields.next();
        if let Some(idx) = header.slot(position) {
            raw[idx] = field;
        }
    }
    let surplus = fields.count();
    if surplus > 0 {
        tracing::trace!(surplus, "dropping fields beyond the header width");
    }

    let keep = |value: &Option<String>| -> bool {
        match value {
            None => !config.remove_empty_values,
            Some(v) => {
                !(config.remove_empty_values && is_blank(v))
                    && !(config.remove_zero_values && is_zero_literal(v))
                    && !config
                        .remove_values_matching
                        .as_ref()
                        .is_some_and(|re| re.is_match(v))
            }
        }
    };

    let converters = &config.value_converters;
    let pairs: Vec<_> = keys
        .iter()
        .zip(raw)
        .filter_map(|(key, value)| {
            if !keep(&value) {
                return None;
            }
            let mut value = match value {
                Some(text) => Value::Text(text),
                None => Value::Null,
            };
            if config.convert_values_to_numeric && config.numeric_filter.allows_key(key.as_str()) {
                value = value.coerce_numeric();
            }
            if let Some(converter) = converters.for_key(key.as_str()) {
                value = converter.convert(value);
            }
            Some((key.clone(), value))
        })
        .collect();

    if pairs.is_empty() && config.remove_empty_rows {
        return None;
    }
    Some(Row::Mapping(pairs.into_boxed_slice()))
}

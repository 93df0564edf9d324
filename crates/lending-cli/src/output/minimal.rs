use serde_json::Value;

use super::{format_scalar, result_of};

/// Headline fields, most specific first. The first non-null one is printed.
const HEADLINE_KEYS: [&str; 10] = [
    "installment",
    "cuotaMensual",
    "penalty_amount",
    "total_due",
    "approved",
    "valid",
    "applied_rate_percent",
    "own_is_cheapest",
    "balanced",
    "total_payment",
];

/// Print just the key answer of a command.
pub fn print_minimal(value: &Value) {
    let result = result_of(value);

    if let Value::Object(map) = result {
        let headline = HEADLINE_KEYS
            .iter()
            .find_map(|key| map.get(*key).filter(|v| !v.is_null()));
        if let Some(val) = headline {
            println!("{}", format_scalar(val));
            return;
        }

        if let Some((key, val)) = map.iter().next() {
            println!("{}: {}", key, format_scalar(val));
            return;
        }
    }

    println!("{}", format_scalar(result));
}

use serde_json::Value;
use std::io;

use super::{format_scalar, result_of, row_set};

/// Write a command result as CSV. Row sets (an amortization table, arrears
/// lines) are exported one record per row; anything else as field/value pairs.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    let result = result_of(value);
    let written = if let Some((_, rows)) = row_set(result) {
        write_rows(&mut wtr, rows)
    } else {
        match result {
            Value::Object(map) => {
                let mut outcome = wtr.write_record(["field", "value"]);
                for (key, val) in map {
                    if outcome.is_err() {
                        break;
                    }
                    outcome = wtr.write_record([key.as_str(), &format_scalar(val)]);
                }
                outcome
            }
            Value::Array(rows) => write_rows(&mut wtr, rows),
            _ => wtr.write_record([&format_scalar(result)]),
        }
    };

    if let Err(e) = written.and_then(|_| wtr.flush().map_err(csv::Error::from)) {
        log::warn!("csv output truncated: {e}");
    }
}

fn write_rows(wtr: &mut csv::Writer<io::StdoutLock<'_>>, rows: &[Value]) -> csv::Result<()> {
    let Some(Value::Object(first)) = rows.first() else {
        for item in rows {
            wtr.write_record([&format_scalar(item)])?;
        }
        return Ok(());
    };

    let headers: Vec<&str> = first.keys().map(String::as_str).collect();
    wtr.write_record(&headers)?;
    for item in rows {
        if let Value::Object(map) = item {
            let record: Vec<String> = headers
                .iter()
                .map(|h| map.get(*h).map(format_scalar).unwrap_or_default())
                .collect();
            wtr.write_record(&record)?;
        }
    }
    Ok(())
}

use serde_json::{Map, Value};
use std::io;

type CsvWriter<'a> = csv::Writer<io::StdoutLock<'a>>;

/// Write output as CSV to stdout.
///
/// Football fields are written one row per band and sensitivity grids one
/// row per WACC value, so the output can go straight into a spreadsheet
/// chart. Other results are field,value pairs, with nested sections
/// flattened to `section.field`.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    match value {
        Value::Object(map) => match map.get("result") {
            Some(Value::Object(result)) => write_result(&mut wtr, result),
            _ => write_result(&mut wtr, map),
        },
        Value::Array(arr) => write_array_csv(&mut wtr, arr),
        _ => {
            let _ = wtr.write_record([&format_csv_value(value)]);
        }
    }

    let _ = wtr.flush();
}

fn write_result(wtr: &mut CsvWriter<'_>, result: &Map<String, Value>) {
    if let Some(Value::Array(bands)) = result.get("bands") {
        write_array_csv(wtr, bands);
        return;
    }
    if let Some(Value::Array(matrix)) = result.get("matrix") {
        write_matrix_csv(wtr, result, matrix);
        return;
    }

    let _ = wtr.write_record(["field", "value"]);
    let mut rows = Vec::new();
    flatten("", result, &mut rows);
    for (key, val) in rows {
        let _ = wtr.write_record([key.as_str(), val.as_str()]);
    }
}

fn flatten(prefix: &str, map: &Map<String, Value>, out: &mut Vec<(String, String)>) {
    for (key, val) in map {
        let name = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };
        match val {
            Value::Object(inner) => flatten(&name, inner, out),
            _ => out.push((name, format_csv_value(val))),
        }
    }
}

fn write_matrix_csv(wtr: &mut CsvWriter<'_>, result: &Map<String, Value>, matrix: &[Value]) {
    let rows = result
        .get("variable_1_values")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    let cols = result
        .get("variable_2_values")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    let mut header = vec![result
        .get("variable_1_name")
        .map(format_csv_value)
        .unwrap_or_default()];
    header.extend(cols.iter().map(format_csv_value));
    let _ = wtr.write_record(&header);

    for (idx, row) in matrix.iter().enumerate() {
        let mut record = vec![rows.get(idx).map(format_csv_value).unwrap_or_default()];
        if let Value::Array(cells) = row {
            record.extend(cells.iter().map(format_csv_value));
        }
        let _ = wtr.write_record(&record);
    }
}

fn write_array_csv(wtr: &mut CsvWriter<'_>, arr: &[Value]) {
    if arr.is_empty() {
        return;
    }

    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<&str> = first.keys().map(|k| k.as_str()).collect();
        let _ = wtr.write_record(&headers);

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(*h).map(format_csv_value).unwrap_or_default())
                    .collect();
                let _ = wtr.write_record(&row);
            }
        }
    } else {
        for item in arr {
            let _ = wtr.write_record([&format_csv_value(item)]);
        }
    }
}

fn format_csv_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_flatten_nests_sections() {
        let value = json!({
            "dcf": { "enterprise_value": "1028.5" },
            "accretion": { "is_accretive": true },
        });
        let mut rows = Vec::new();
        flatten("", value.as_object().unwrap(), &mut rows);
        assert!(rows.contains(&("dcf.enterprise_value".to_string(), "1028.5".to_string())));
        assert!(rows.contains(&("accretion.is_accretive".to_string(), "true".to_string())));
    }
}

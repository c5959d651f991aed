use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

/// Format output as tables using the tabled crate.
///
/// Scalar fields of the result go into a Field/Value table. Band lists and
/// the sensitivity matrix get their own tables, and each section of a
/// whole-deal analysis is printed under its own heading.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => match map.get("result") {
            Some(result) => {
                print_section(result);
                print_footer(map);
            }
            None => print_section(value),
        },
        Value::Array(arr) => print_array_table(arr),
        _ => println!("{}", value),
    }
}

fn print_section(value: &Value) {
    let Value::Object(map) = value else {
        println!("{}", format_value(value));
        return;
    };

    // Whole-deal analysis: one section per engine
    if map.values().all(Value::is_object) && !map.is_empty() {
        for (name, section) in map {
            println!("\n[{}]", name);
            print_section(section);
        }
        return;
    }

    print_scalars(map);

    if let Some(Value::Array(bands)) = map.get("bands") {
        println!();
        print_array_table(bands);
    }
    if let Some(Value::Array(matrix)) = map.get("matrix") {
        println!();
        print_matrix(map, matrix);
    }
}

fn print_scalars(map: &Map<String, Value>) {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in map {
        if matches!(key.as_str(), "bands" | "matrix") {
            continue;
        }
        builder.push_record([key.as_str(), &format_value(val)]);
    }
    println!("{}", Table::from(builder));
}

/// Sensitivity grid: variable 1 down the side, variable 2 across the top.
fn print_matrix(map: &Map<String, Value>, matrix: &[Value]) {
    let row_values = map
        .get("variable_1_values")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    let col_values = map
        .get("variable_2_values")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    let corner = format!(
        "{} \\ {}",
        map.get("variable_1_name").map(format_value).unwrap_or_default(),
        map.get("variable_2_name").map(format_value).unwrap_or_default()
    );

    let mut builder = Builder::default();
    let mut header = vec![corner];
    header.extend(col_values.iter().map(format_value));
    builder.push_record(header);

    for (idx, row) in matrix.iter().enumerate() {
        let mut record = vec![row_values.get(idx).map(format_value).unwrap_or_default()];
        if let Value::Array(cells) = row {
            record.extend(cells.iter().map(format_value));
        }
        builder.push_record(record);
    }
    println!("{}", Table::from(builder));
}

fn print_footer(envelope: &Map<String, Value>) {
    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings {
                if let Value::String(s) = w {
                    println!("  - {}", s);
                }
            }
        }
    }

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

fn print_array_table(arr: &[Value]) {
    if arr.is_empty() {
        println!("(empty)");
        return;
    }

    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<String> = first.keys().cloned().collect();
        let mut builder = Builder::default();
        builder.push_record(&headers);

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(h.as_str()).map(format_value).unwrap_or_default())
                    .collect();
                builder.push_record(row);
            }
        }

        println!("{}", Table::from(builder));
    } else {
        for item in arr {
            println!("{}", format_value(item));
        }
    }
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(format_value).collect();
            items.join(", ")
        }
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}

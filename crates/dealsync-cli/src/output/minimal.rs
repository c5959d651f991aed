use serde_json::Value;

/// Print just the headline number of the output.
///
/// Whole-deal results print the combined value; football fields print the
/// overall range; everything else uses the first priority field found,
/// then the first field of the result.
pub fn print_minimal(value: &Value) {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    println!("{}", headline(result_obj));
}

fn headline(result: &Value) -> String {
    let Value::Object(map) = result else {
        return format_minimal(result);
    };

    if let Some(accretion) = map.get("accretion") {
        return headline(accretion);
    }

    if let (Some(low), Some(high)) = (map.get("overall_low"), map.get("overall_high")) {
        return format!("{} {}", format_minimal(low), format_minimal(high));
    }

    let priority_keys = [
        "enterprise_value",
        "combined_value",
        "synergy_npv",
        "base_case_value",
    ];
    for key in &priority_keys {
        if let Some(val) = map.get(*key) {
            if !val.is_null() {
                return format_minimal(val);
            }
        }
    }

    match map.iter().next() {
        Some((key, val)) => format!("{}: {}", key, format_minimal(val)),
        None => String::new(),
    }
}

fn format_minimal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deal_analysis_prints_combined_value() {
        let result = json!({
            "dcf": { "enterprise_value": "1000" },
            "accretion": { "standalone_value": "1000", "combined_value": "1250" },
        });
        assert_eq!(headline(&result), "1250");
    }

    #[test]
    fn test_football_field_prints_range() {
        let result = json!({ "bands": [], "overall_low": "800", "overall_high": "1600" });
        assert_eq!(headline(&result), "800 1600");
    }

    #[test]
    fn test_priority_key_wins_over_first_field() {
        let result = json!({ "annual_cost_synergies": "90", "synergy_npv": "2166.67" });
        assert_eq!(headline(&result), "2166.67");
    }
}

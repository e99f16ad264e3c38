use serde_json::{Number, Value};

/// Cache key of a feature: `properties.id` when it's set, otherwise
/// "<lat>_<lon>" taken from the GeoJSON coordinates, which are stored as
/// [lon, lat]. Returns `None` when the feature has neither.
pub fn feature_id(feature: &Value) -> Option<String> {
    match feature.pointer("/properties/id") {
        Some(Value::String(id)) if !id.is_empty() => return Some(id.clone()),
        Some(Value::Number(id)) if id.as_f64() != Some(0.0) => return Some(format_number(id)),
        Some(Value::Bool(true)) => return Some("true".into()),
        _ => {}
    }
    let lon = coordinate(feature.pointer("/geometry/coordinates/0")?)?;
    let lat = coordinate(feature.pointer("/geometry/coordinates/1")?)?;
    Some(format!("{lat}_{lon}"))
}

fn coordinate(value: &Value) -> Option<String> {
    match value {
        Value::Number(number) => Some(format_number(number)),
        Value::String(string) if !string.is_empty() => Some(string.clone()),
        _ => None,
    }
}

// Same text a browser prints: 13.0 -> "13", 52.5 -> "52.5", 1e-7 -> "1e-7",
// 1e21 -> "1e+21"
fn format_number(number: &Number) -> String {
    let Some(value) = number.as_f64().filter(|_| number.is_f64()) else {
        return number.to_string();
    };
    let abs = value.abs();
    if abs != 0.0 && !(1e-6..1e21).contains(&abs) {
        let exp = format!("{value:e}");
        match exp.split_once('e') {
            Some((mantissa, power)) if !power.starts_with('-') => format!("{mantissa}e+{power}"),
            _ => exp,
        }
    } else {
        value.to_string()
    }
}

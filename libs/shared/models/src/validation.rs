use uuid::Uuid;

/// Trimmed value of a required text field, or a message naming the field.
pub fn required<'a>(field: &str, value: Option<&'a str>) -> Result<&'a str, String> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(format!("{} is required", field)),
    }
}

pub fn parse_id(field: &str, value: &str) -> Result<Uuid, String> {
    Uuid::parse_str(value.trim()).map_err(|_| format!("Invalid {}", field))
}

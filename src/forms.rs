/// A submitted form value that is present and non-empty.
pub fn filled(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

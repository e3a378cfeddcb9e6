/// Quote an identifier for Oracle.
///
/// Identifiers are left bare so the engine folds them to upper case, which is
/// what the framework's generated SQL relies on. Only names starting with `_`
/// (illegal unquoted in Oracle) are double-quoted; for `model.field` the field
/// part alone is quoted. Names that already contain `"` are returned as is.
#[must_use]
pub fn name(name: &str) -> String {
    if name.contains('.') && !name.contains('"') {
        let mut parts = name.splitn(2, '.');
        let model = parts.next().unwrap_or_default();
        let field = parts.next().unwrap_or_default();
        if field.starts_with('_') {
            return format!("{model}.\"{field}\"");
        }
        return name.to_string();
    }

    if name.starts_with('_') {
        format!("\"{name}\"")
    } else {
        name.to_string()
    }
}

use crate::table::Value;

/// Formats an integer with `,` thousands separators, keeping the sign.
pub fn format_number(num: i64) -> String {
    let digits = num.unsigned_abs().to_string();
    let grouped = digits
        .as_bytes()
        .rchunks(3)
        .rev()
        .map(|chunk| String::from_utf8_lossy(chunk))
        .collect::<Vec<_>>()
        .join(",");
    if num < 0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}

/// Signed change from `previous` to `current`, e.g. `+1,234` or `-56`.
/// Absent only when there is nothing to compare against; an out-of-range change saturates.
pub fn delta(current: i64, previous: Option<i64>) -> Option<String> {
    let change = current.saturating_sub(previous?);
    let sign = if change < 0 { "" } else { "+" };
    Some(format!("{sign}{}", format_number(change)))
}

/// Same as [`delta`] for counts that may themselves be missing.
pub fn optional_delta(current: Option<i64>, previous: Option<i64>) -> Option<String> {
    delta(current?, previous)
}

/// Display label for a result column: `number_of_object_changes` -> `Number Of Object Changes`.
pub fn humanize_column(name: &str) -> String {
    name.split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Cell text for tables: integers get thousands separators, nulls stay blank.
pub fn format_cell(value: &Value) -> String {
    match value.as_i64() {
        Some(n) => format_number(n),
        None => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_thousands() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1_234), "1,234");
        assert_eq!(format_number(1_234_567), "1,234,567");
        assert_eq!(format_number(-56), "-56");
        assert_eq!(format_number(-1_000), "-1,000");
        assert_eq!(format_number(i64::MIN), "-9,223,372,036,854,775,808");
    }

    #[test]
    fn delta_is_signed() {
        assert_eq!(delta(100, Some(80)).as_deref(), Some("+20"));
        assert_eq!(delta(80, Some(100)).as_deref(), Some("-20"));
        assert_eq!(delta(5, Some(5)).as_deref(), Some("+0"));
        assert_eq!(delta(2_234, Some(1_000)).as_deref(), Some("+1,234"));
    }

    #[test]
    fn delta_without_previous_is_absent() {
        assert_eq!(delta(100, None), None);
        assert_eq!(optional_delta(None, Some(3)), None);
        assert_eq!(optional_delta(Some(3), None), None);
    }

    #[test]
    fn overflowing_delta_saturates_instead_of_vanishing() {
        assert_eq!(
            delta(i64::MAX, Some(-1)).as_deref(),
            Some("+9,223,372,036,854,775,807")
        );
        assert_eq!(
            delta(i64::MIN, Some(1)).as_deref(),
            Some("-9,223,372,036,854,775,808")
        );
    }

    #[test]
    fn humanizes_column_names() {
        assert_eq!(humanize_column("number_of_object_changes"), "Number Of Object Changes");
        assert_eq!(humanize_column("editor"), "Editor");
        assert_eq!(humanize_column("user_type"), "User Type");
        assert_eq!(humanize_column("YEAR"), "Year");
    }

    #[test]
    fn formats_cells() {
        assert_eq!(format_cell(&Value::Integer(12_345)), "12,345");
        assert_eq!(format_cell(&Value::HugeInt(1_000)), "1,000");
        assert_eq!(format_cell(&Value::Text("33.33%".into())), "33.33%");
        assert_eq!(format_cell(&Value::Null), "");
    }
}

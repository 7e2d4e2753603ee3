//! Brazilian phone number display formatting.

/// Format a phone number as `(00) 00000-0000` (mobile) or `(00) 0000-0000`
/// (landline).
///
/// Only ASCII digits are considered. Input that does not hold ten or eleven
/// digits is returned unchanged.
///
/// ```
/// use workbench_core::format_phone;
///
/// assert_eq!(format_phone("11999998888"), "(11) 99999-8888");
/// assert_eq!(format_phone("1133334444"), "(11) 3333-4444");
/// assert_eq!(format_phone("ramal 12"), "ramal 12");
/// ```
#[must_use]
pub fn format_phone(input: &str) -> String {
    let digits: String = input.chars().filter(char::is_ascii_digit).collect();

    let (area, rest) = digits.split_at(digits.len().min(2));
    let split = match digits.len() {
        11 => 5,
        10 => 4,
        _ => return input.to_owned(),
    };
    let (prefix, line) = rest.split_at(split);

    format!("({area}) {prefix}-{line}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_formats_punctuated_input() {
        assert_eq!(format_phone("(11) 99999-8888"), "(11) 99999-8888");
        assert_eq!(format_phone("11 9 9999 8888"), "(11) 99999-8888");
    }

    #[test]
    fn test_unknown_lengths_are_untouched() {
        assert_eq!(format_phone(""), "");
        assert_eq!(format_phone("999998888"), "999998888");
        assert_eq!(format_phone("+55 11 99999-8888"), "+55 11 99999-8888");
    }
}

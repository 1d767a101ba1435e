/// Lookup key of a source term: lowercased, whitespace collapsed, quotes and
/// brackets removed. Register markers such as `(AE)` collapse onto the bare term.
pub fn normalize(text: &str) -> String {
    let mut s = text.trim().to_lowercase();

    for ch in ['“', '”', '’', '‘', '…', '"', '\'', '(', ')', '*'] {
        s = s.replace(ch, "");
    }

    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folds_case_quotes_and_spacing() {
        assert_eq!(normalize("  To  Disagree (with) "), "to disagree with");
        assert_eq!(normalize("“lad”"), "lad");
    }
}

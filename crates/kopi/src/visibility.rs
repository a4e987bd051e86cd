/// Whether a field name is public: non-empty and starting with an uppercase letter.
pub fn is_exported(name: &str) -> bool {
  name.chars().next().map(char::is_uppercase).unwrap_or_default()
}

#[test]
fn test_is_exported() {
  assert!(is_exported("ID"));
  assert!(is_exported("AnotherField"));
  assert!(is_exported("Ärger"));
  assert!(!is_exported(""));
  assert!(!is_exported("nonExp"));
  assert!(!is_exported("_Hidden"));
  assert!(!is_exported("1st"));
}

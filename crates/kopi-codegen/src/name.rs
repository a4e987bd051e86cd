use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
  #[error("Field name is empty")]
  Empty,
  #[error("Invalid character `{0}` in field name")]
  InvalidChar(char),
}

/// Name used for a `pub` field without `rename`: `another_field` => `AnotherField`.
pub fn exported_name(ident: &str) -> Result<String, Error> {
  let ident = ident.strip_prefix("r#").unwrap_or(ident);
  let name: String = ident
    .split('_')
    .filter(|segment| !segment.is_empty())
    .flat_map(|segment| {
      let mut chars = segment.chars();
      let head = chars.next().into_iter().flat_map(char::to_uppercase);
      head.chain(chars)
    })
    .collect();
  validate(&name)?;
  Ok(name)
}

/// Checks a `rename` value. Any identifier-like name is accepted, including
/// lowercase ones, which simply make the field private to the mapper.
pub fn validate(name: &str) -> Result<(), Error> {
  let mut chars = name.chars();
  match chars.next() {
    None => return Err(Error::Empty),
    Some(c) if !(c.is_alphabetic() || c == '_') => return Err(Error::InvalidChar(c)),
    _ => {}
  }
  if let Some(c) = chars.find(|c| !(c.is_alphanumeric() || *c == '_')) {
    return Err(Error::InvalidChar(c))
  }
  Ok(())
}

#[test]
fn test_snake_case() {
  assert_eq!(exported_name("another_field").unwrap(), "AnotherField");
  assert_eq!(exported_name("id").unwrap(), "Id");
  assert_eq!(exported_name("value").unwrap(), "Value");
}

#[test]
fn test_raw_ident() {
  assert_eq!(exported_name("r#type").unwrap(), "Type");
}

#[test]
fn test_underscores() {
  assert_eq!(exported_name("_leading").unwrap(), "Leading");
  assert_eq!(exported_name("a__b_").unwrap(), "AB");
  assert_eq!(exported_name("__"), Err(Error::Empty));
}

#[test]
fn test_validate() {
  assert!(validate("ID").is_ok());
  assert!(validate("lower_case").is_ok());
  assert_eq!(validate(""), Err(Error::Empty));
  assert_eq!(validate("1st"), Err(Error::InvalidChar('1')));
  assert_eq!(validate("Another Field"), Err(Error::InvalidChar(' ')));
}

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{BoxError, Error, Result};
use crate::value::{Type, Value};
use crate::visibility::is_exported;

/// A type conversion function: consumes a value of the rule's `type_from` and
/// produces a value of its `type_to`, or the reason it could not.
#[derive(Clone)]
pub struct Converter(Arc<dyn Fn(Value) -> Result<Value, BoxError> + Send + Sync>);

impl Converter {
  pub fn new<F>(f: F) -> Self
  where
    F: Fn(Value) -> Result<Value, BoxError> + Send + Sync + 'static,
  {
    Self(Arc::new(f))
  }

  /// Wraps a typed fallible function. Inputs that are not an `A` are reported
  /// as conversion failures.
  pub fn typed<A, B, E, F>(f: F) -> Self
  where
    A: Any + Clone,
    B: Any + Clone,
    E: Into<BoxError>,
    F: Fn(A) -> Result<B, E> + Send + Sync + 'static,
  {
    Self::new(move |value: Value| {
      let ty = value.ty();
      let input = value
        .downcast::<A>()
        .map_err(|_| format!("expected `{}`, got `{}`", Type::of::<A>(), ty))?;
      f(input).map(Value::new).map_err(Into::into)
    })
  }

  /// Wraps a typed function that cannot fail.
  pub fn infallible<A, B, F>(f: F) -> Self
  where
    A: Any + Clone,
    B: Any + Clone,
    F: Fn(A) -> B + Send + Sync + 'static,
  {
    Self::typed(move |v: A| Ok::<_, BoxError>(f(v)))
  }

  pub fn call(&self, value: Value) -> Result<Value, BoxError> {
    (self.0)(value)
  }
}

impl fmt::Debug for Converter {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str("Converter(..)")
  }
}

/// A mapping rule. Name and type concerns are independent; either, both or
/// neither may be set.
///
/// ```
/// use kopi::{t, Opt};
///
/// let rule = Opt {
///   name_from: "ID".into(),
///   name_to: "AnotherField".into(),
///   ..Default::default()
/// }
/// .with_types(t(&0i64), t(&String::new()), kopi::Converter::infallible(|v: i64| v.to_string()));
/// assert!(rule.type_from.is_some());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Opt {
  /// Source field the value is read from.
  pub name_from: String,
  /// Destination field the value is written to.
  pub name_to: String,
  pub type_from: Option<Type>,
  pub type_to: Option<Type>,
  pub convert: Option<Converter>,
}

impl Opt {
  pub fn name(from: impl Into<String>, to: impl Into<String>) -> Self {
    Self::default().with_name(from, to)
  }

  pub fn types(from: Type, to: Type, convert: Converter) -> Self {
    Self::default().with_types(from, to, convert)
  }

  /// A type rule whose endpoints are inferred from `f`'s signature.
  pub fn convert<A, B, E, F>(f: F) -> Self
  where
    A: Any + Clone,
    B: Any + Clone,
    E: Into<BoxError>,
    F: Fn(A) -> Result<B, E> + Send + Sync + 'static,
  {
    Self::types(Type::of::<A>(), Type::of::<B>(), Converter::typed(f))
  }

  pub fn with_name(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
    self.name_from = from.into();
    self.name_to = to.into();
    self
  }

  pub fn with_types(mut self, from: Type, to: Type, convert: Converter) -> Self {
    self.type_from = Some(from);
    self.type_to = Some(to);
    self.convert = Some(convert);
    self
  }
}

/// Lookup tables compiled from one call's options.
#[derive(Debug, Default)]
pub(crate) struct Compiled {
  /// destination field name -> source field name
  pub names: HashMap<String, String>,
  /// source type -> (destination type, converter)
  pub types: HashMap<Type, (Type, Converter)>,
}

impl Compiled {
  pub fn source_name<'a>(&'a self, dst_name: &'a str) -> &'a str {
    self.names.get(dst_name).map(String::as_str).unwrap_or(dst_name)
  }
}

pub(crate) fn compile(opts: &[Opt]) -> Result<Compiled> {
  let mut compiled = Compiled::default();
  for (index, opt) in opts.iter().enumerate() {
    let invalid = |reason| Error::InvalidOption { index, reason };

    if !opt.name_from.is_empty() || !opt.name_to.is_empty() {
      if !is_exported(&opt.name_from) {
        return Err(invalid("`name_from` is not an exported field name"))
      }
      if !is_exported(&opt.name_to) {
        return Err(invalid("`name_to` is not an exported field name"))
      }
      compiled.names.insert(opt.name_to.clone(), opt.name_from.clone());
    }

    match (opt.type_from, opt.type_to, opt.convert.as_ref()) {
      (None, None, None) => {}
      (Some(from), Some(to), Some(convert)) => {
        compiled.types.insert(from, (to, convert.clone()));
      }
      (None, _, _) => return Err(invalid("`type_from` is missing")),
      (_, None, _) => return Err(invalid("`type_to` is missing")),
      (_, _, None) => return Err(invalid("`convert` is missing")),
    }
  }
  Ok(compiled)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn itoa() -> Converter {
    Converter::infallible(|v: i64| v.to_string())
  }

  #[test]
  fn test_empty_rule_is_noop() {
    let compiled = compile(&[Opt::default()]).unwrap();
    assert!(compiled.names.is_empty());
    assert!(compiled.types.is_empty());
  }

  #[test]
  fn test_name_rule_keyed_by_destination() {
    let compiled = compile(&[Opt::name("ID", "AnotherField")]).unwrap();
    assert_eq!(compiled.source_name("AnotherField"), "ID");
    assert_eq!(compiled.source_name("ID"), "ID");
  }

  #[test]
  fn test_name_rule_requires_both_exported() {
    for opt in vec![
      Opt::name("ID", ""),
      Opt::name("", "AnotherField"),
      Opt::name("ID", "anotherField"),
      Opt::name("id", "AnotherField"),
    ] {
      match compile(&[Opt::default(), opt]) {
        Err(Error::InvalidOption { index: 1, .. }) => {}
        other => panic!("unexpected: {:?}", other),
      }
    }
  }

  #[test]
  fn test_type_rule_requires_all_parts() {
    let from = Type::of::<i64>();
    let to = Type::of::<String>();
    let cases = vec![
      Opt { type_from: Some(from), ..Default::default() },
      Opt { type_from: Some(from), type_to: Some(to), ..Default::default() },
      Opt { type_from: Some(from), convert: Some(itoa()), ..Default::default() },
      Opt { type_to: Some(to), convert: Some(itoa()), ..Default::default() },
    ];
    for opt in cases {
      assert!(matches!(compile(&[opt]), Err(Error::InvalidOption { index: 0, .. })));
    }
  }

  #[test]
  fn test_later_type_rule_overwrites() {
    let compiled = compile(&[
      Opt::types(Type::of::<i64>(), Type::of::<String>(), itoa()),
      Opt::types(Type::of::<i64>(), Type::of::<f64>(), Converter::infallible(|v: i64| v as f64)),
    ])
    .unwrap();
    assert_eq!(compiled.types.len(), 1);
    let (to, convert) = &compiled.types[&Type::of::<i64>()];
    assert_eq!(*to, Type::of::<f64>());
    assert_eq!(convert.call(Value::new(2i64)).unwrap().downcast::<f64>().unwrap(), 2.0);
  }

  #[test]
  fn test_typed_converter_rejects_foreign_input() {
    let err = itoa().call(Value::new(1u8)).unwrap_err();
    assert!(err.to_string().contains("expected `i64`"));
  }

  #[test]
  fn test_convert_infers_types() {
    let opt = Opt::convert(|v: String| v.parse::<i32>());
    assert_eq!(opt.type_from, Some(Type::of::<String>()));
    assert_eq!(opt.type_to, Some(Type::of::<i32>()));
    assert!(opt.convert.unwrap().call(Value::new(String::from("x"))).is_err());
  }
}

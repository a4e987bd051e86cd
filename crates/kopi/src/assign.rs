use tracing::trace;

use crate::error::{Error, Result};
use crate::extract::ValueMap;
use crate::option::Compiled;
use crate::record::{Field, Record, Reflect};

/// What happened to a single destination field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Outcome {
  Assigned,
  Converted,
  Skipped(Skip),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Skip {
  NotExported,
  NotSettable,
  /// The source has no exported field under the lookup name.
  Missing,
  /// Types differ and no converter is registered for the source type.
  NoConverter,
  /// A converter exists for the source type but targets another type.
  TargetMismatch,
  /// The converter returned a value that is not of the field's type.
  ConvertedMismatch,
  Rejected,
}

/// Assigns `values` into `dst`, returning how many fields were written.
pub(crate) fn assign(values: &ValueMap, dst: &mut dyn Reflect, compiled: &Compiled) -> Result<usize> {
  let record = dst.as_record_mut().ok_or(Error::NotAPointer)?;
  assign_record(values, record, compiled)
}

pub(crate) fn assign_record(
  values: &ValueMap,
  record: &mut dyn Record,
  compiled: &Compiled,
) -> Result<usize> {
  let mut written = 0;
  for (index, field) in record.fields().into_iter().enumerate() {
    match assign_field(values, &mut *record, index, &field, compiled)? {
      Outcome::Assigned | Outcome::Converted => written += 1,
      Outcome::Skipped(reason) => {
        trace!(field = field.name, ty = %field.ty, ?reason, "field skipped");
      }
    }
  }
  Ok(written)
}

fn assign_field(
  values: &ValueMap,
  record: &mut dyn Record,
  index: usize,
  field: &Field,
  compiled: &Compiled,
) -> Result<Outcome> {
  if !field.is_exported() {
    return Ok(Outcome::Skipped(Skip::NotExported))
  }
  if !field.settable {
    return Ok(Outcome::Skipped(Skip::NotSettable))
  }

  let value = match values.get(compiled.source_name(field.name)) {
    Some(value) => value.clone(),
    None => return Ok(Outcome::Skipped(Skip::Missing)),
  };

  if value.ty() == field.ty {
    return Ok(match record.set(index, value) {
      Ok(()) => Outcome::Assigned,
      Err(_) => Outcome::Skipped(Skip::Rejected),
    })
  }

  let (to, convert) = match compiled.types.get(&value.ty()) {
    Some(entry) => entry,
    None => return Ok(Outcome::Skipped(Skip::NoConverter)),
  };
  if *to != field.ty {
    return Ok(Outcome::Skipped(Skip::TargetMismatch))
  }

  let converted = convert.call(value).map_err(|source| Error::Conversion {
    field: field.name,
    source,
  })?;
  if converted.ty() != field.ty {
    return Ok(Outcome::Skipped(Skip::ConvertedMismatch))
  }

  Ok(match record.set(index, converted) {
    Ok(()) => Outcome::Converted,
    Err(_) => Outcome::Skipped(Skip::Rejected),
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::extract::record_to_map;
  use crate::option::{compile, Converter, Opt};
  use crate::value::Type;

  #[derive(Debug, Clone, Default, PartialEq, crate::Record)]
  struct Src {
    #[kopi(rename = "ID")]
    pub id: i64,
    pub name: String,
    pub extra_field: String,
  }

  #[derive(Debug, Clone, Default, PartialEq, crate::Record)]
  struct Dst {
    #[kopi(rename = "ID")]
    pub id: i64,
    pub name: String,
    pub another_field: String,
    #[kopi(readonly)]
    pub extra_field: String,
    hidden: String,
  }

  fn src() -> Src {
    Src {
      id: 23,
      name: "This is Name".into(),
      extra_field: "extra".into(),
    }
  }

  fn outcomes(dst: &mut Dst, opts: &[Opt]) -> Vec<(&'static str, Outcome)> {
    let values = record_to_map(&src());
    let compiled = compile(opts).unwrap();
    let fields = dst.fields();
    fields
      .iter()
      .enumerate()
      .map(|(index, field)| {
        (field.name, assign_field(&values, &mut *dst, index, field, &compiled).unwrap())
      })
      .collect()
  }

  #[test]
  fn test_outcomes_without_rules() {
    let mut dst = Dst::default();
    assert_eq!(outcomes(&mut dst, &[]), vec![
      ("ID", Outcome::Assigned),
      ("Name", Outcome::Assigned),
      ("AnotherField", Outcome::Skipped(Skip::Missing)),
      ("ExtraField", Outcome::Skipped(Skip::NotSettable)),
      ("hidden", Outcome::Skipped(Skip::NotExported)),
    ]);
    assert_eq!(dst.id, 23);
    assert!(dst.extra_field.is_empty());
  }

  #[test]
  fn test_outcomes_with_remap_and_no_converter() {
    let mut dst = Dst::default();
    let result = outcomes(&mut dst, &[Opt::name("ID", "AnotherField")]);
    assert_eq!(result[2], ("AnotherField", Outcome::Skipped(Skip::NoConverter)));
  }

  #[test]
  fn test_outcomes_with_converter_to_other_type() {
    let mut dst = Dst::default();
    let result = outcomes(&mut dst, &[
      Opt::name("ID", "AnotherField"),
      Opt::types(Type::of::<i64>(), Type::of::<u8>(), Converter::infallible(|v: i64| v as u8)),
    ]);
    assert_eq!(result[2], ("AnotherField", Outcome::Skipped(Skip::TargetMismatch)));
  }

  #[test]
  fn test_outcomes_with_lying_converter() {
    let mut dst = Dst::default();
    let lying = Converter::infallible(|v: i64| v as u32);
    let result = outcomes(&mut dst, &[
      Opt::name("ID", "AnotherField"),
      Opt::types(Type::of::<i64>(), Type::of::<String>(), lying),
    ]);
    assert_eq!(result[2], ("AnotherField", Outcome::Skipped(Skip::ConvertedMismatch)));
    assert!(dst.another_field.is_empty());
  }

  #[test]
  fn test_outcomes_with_conversion() {
    let mut dst = Dst::default();
    let result = outcomes(&mut dst, &[
      Opt::name("ID", "AnotherField"),
      Opt::convert(|v: i64| Ok::<_, std::num::TryFromIntError>(v.to_string())),
    ]);
    assert_eq!(result[2], ("AnotherField", Outcome::Converted));
    assert_eq!(dst.another_field, "23");
  }

  #[test]
  fn test_not_a_record() {
    let values = ValueMap::new();
    let compiled = compile(&[]).unwrap();
    let mut dst = 5u32;
    assert!(matches!(assign(&values, &mut dst, &compiled), Err(Error::NotAPointer)));
  }
}

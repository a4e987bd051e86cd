use crate::value::{Type, Value};
use crate::visibility::is_exported;

/// One entry of a record's field descriptor table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
  pub name: &'static str,
  pub ty: Type,
  pub settable: bool,
}

impl Field {
  pub fn new(name: &'static str, ty: Type) -> Self {
    Self {
      name,
      ty,
      settable: true,
    }
  }

  pub fn readonly(mut self) -> Self {
    self.settable = false;
    self
  }

  pub fn is_exported(&self) -> bool {
    is_exported(self.name)
  }
}

/// A struct whose fields can be enumerated, read and written by name and type.
///
/// Usually implemented with `#[derive(Record)]`. Indices passed to [`Record::get`]
/// and [`Record::set`] refer to positions in the table returned by
/// [`Record::fields`].
pub trait Record: 'static {
  /// Field descriptors in declaration order.
  fn fields(&self) -> Vec<Field>;

  fn get(&self, index: usize) -> Option<Value>;

  /// Writes `value` into the field at `index`. The value is handed back if the
  /// index is out of range or its type is not the field's declared type.
  fn set(&mut self, index: usize, value: Value) -> Result<(), Value>;
}

/// Runtime shape of anything handed to [`kopi`](crate::kopi).
///
/// Only records expose their fields; every other shape answers `None` and is
/// rejected by the engine.
pub trait Reflect: 'static {
  fn as_record(&self) -> Option<&dyn Record> {
    None
  }

  fn as_record_mut(&mut self) -> Option<&mut dyn Record> {
    None
  }
}

macro_rules! impl_opaque {
  ($($ty:ty),* $(,)?) => {
    $(impl Reflect for $ty {})*
  };
}

impl_opaque!(
  bool, char, (),
  i8, i16, i32, i64, i128, isize,
  u8, u16, u32, u64, u128, usize,
  f32, f64,
  String, &'static str,
);

impl<T: 'static> Reflect for Option<T> {}

impl<T: 'static> Reflect for Vec<T> {}

// A boxed record is a pointer, not a record.
impl<T: ?Sized + 'static> Reflect for Box<T> {}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_field_visibility() {
    assert!(Field::new("Name", Type::of::<String>()).is_exported());
    assert!(!Field::new("name", Type::of::<String>()).is_exported());
    assert!(!Field::new("Name", Type::of::<String>()).readonly().settable);
  }

  #[test]
  fn test_opaque_shapes() {
    assert!(42i32.as_record().is_none());
    assert!(String::new().as_record().is_none());
    assert!(Box::new(1u8).as_record_mut().is_none());
  }
}

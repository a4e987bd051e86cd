use std::any::{self, Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Runtime tag of a declared field type.
///
/// Two tags are equal when they name the same `TypeId`; the type name is kept
/// for diagnostics only.
#[derive(Clone, Copy)]
pub struct Type {
  id: TypeId,
  name: &'static str,
}

impl Type {
  pub fn of<T: Any>() -> Self {
    Self {
      id: TypeId::of::<T>(),
      name: any::type_name::<T>(),
    }
  }

  /// Derives the tag from a sample value, e.g. `Type::of_val(&dst.name)`.
  pub fn of_val<T: Any>(_: &T) -> Self {
    Self::of::<T>()
  }

  pub fn id(&self) -> TypeId {
    self.id
  }

  pub fn name(&self) -> &'static str {
    self.name
  }
}

impl PartialEq for Type {
  fn eq(&self, other: &Self) -> bool {
    self.id() == other.id()
  }
}

impl Eq for Type {}

impl Hash for Type {
  fn hash<H: Hasher>(&self, state: &mut H) {
    self.id().hash(state)
  }
}

impl fmt::Debug for Type {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name())
  }
}

impl fmt::Display for Type {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name())
  }
}

/// Shorthand for [`Type::of_val`], handy when filling `type_from`/`type_to`.
pub fn t<T: Any>(sample: &T) -> Type {
  Type::of_val(sample)
}

trait AnyClone: Any {
  fn clone_box(&self) -> Box<dyn AnyClone>;
  fn as_any(&self) -> &dyn Any;
  fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

impl<T: Any + Clone> AnyClone for T {
  fn clone_box(&self) -> Box<dyn AnyClone> {
    Box::new(self.clone())
  }

  fn as_any(&self) -> &dyn Any {
    self
  }

  fn into_any(self: Box<Self>) -> Box<dyn Any> {
    self
  }
}

/// An owned copy of a field value whose concrete type is only known at runtime.
pub struct Value {
  ty: Type,
  inner: Box<dyn AnyClone>,
}

impl Value {
  pub fn new<T: Any + Clone>(value: T) -> Self {
    Self {
      ty: Type::of::<T>(),
      inner: Box::new(value),
    }
  }

  pub fn ty(&self) -> Type {
    self.ty
  }

  pub fn is<T: Any>(&self) -> bool {
    self.ty == Type::of::<T>()
  }

  pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
    self.inner.as_any().downcast_ref()
  }

  /// Takes the value out as `T`, handing it back unchanged if the type differs.
  pub fn downcast<T: Any>(self) -> Result<T, Value> {
    if !self.is::<T>() {
      return Err(self)
    }
    match self.inner.into_any().downcast::<T>() {
      Ok(v) => Ok(*v),
      Err(_) => unreachable!("type tag and boxed value disagree"),
    }
  }
}

impl Clone for Value {
  fn clone(&self) -> Self {
    Self {
      ty: self.ty,
      inner: self.inner.clone_box(),
    }
  }
}

impl fmt::Debug for Value {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Value").field("ty", &self.ty).finish()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[derive(Clone, Copy, Debug, PartialEq)]
  struct Enum(u8);

  #[test]
  fn test_type_identity() {
    assert_eq!(Type::of::<i64>(), t(&1i64));
    assert_ne!(Type::of::<i64>(), Type::of::<i32>());
    // a newtype is a distinct declared type even if it wraps the same repr
    assert_ne!(Type::of::<Enum>(), Type::of::<u8>());
  }

  #[test]
  fn test_type_display() {
    assert!(Type::of::<String>().name().ends_with("String"));
    assert_eq!(format!("{}", Type::of::<i64>()), "i64");
    assert_eq!(Type::of::<u8>().id(), TypeId::of::<u8>());
  }

  #[test]
  fn test_value_downcast() {
    let value = Value::new(String::from("abc"));
    assert!(value.is::<String>());
    assert_eq!(value.downcast_ref::<String>().map(String::as_str), Some("abc"));

    let value = value.downcast::<i32>().unwrap_err();
    assert_eq!(value.downcast::<String>().unwrap(), "abc");
  }

  #[test]
  fn test_value_clone_is_deep() {
    let value = Value::new(vec![1, 2, 3]);
    let copy = value.clone();
    let mut inner: Vec<i32> = value.downcast().unwrap();
    inner.push(4);
    assert_eq!(copy.downcast_ref::<Vec<i32>>(), Some(&vec![1, 2, 3]));
  }
}

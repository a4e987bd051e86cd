//! # Kopi
//!
//! Copy the matching public fields of one struct into another, optionally
//! remapping field names and converting between field types.
//!
//! A field takes part in a copy only if its name starts with an uppercase
//! letter. `#[derive(Record)]` names `pub` fields in UpperCamelCase and leaves
//! other fields with their lowercase identifier, so only `pub` fields are
//! copied unless renamed.
//!
//! # Example
//! ```
//!   use kopi::{kopi, t, Converter, Opt, Record};
//!
//!   #[derive(Clone, Copy, Debug, Default, PartialEq)]
//!   struct Enum(u8);
//!
//!   #[derive(Record)]
//!   struct A {
//!     #[kopi(rename = "ID")]
//!     pub id: i64,
//!     pub name: String,
//!     pub value: Enum,
//!     pub extra_field: String,
//!     non_exp: String,
//!   }
//!
//!   #[derive(Record, Default)]
//!   struct B {
//!     #[kopi(rename = "ID")]
//!     pub id: i64,
//!     pub name: String,
//!     pub value: Enum,
//!     pub another_field: String,
//!     not_export_field: String,
//!   }
//!
//!   let src = A {
//!     id: 23,
//!     name: "This is Name".into(),
//!     value: Enum(1),
//!     extra_field: String::new(),
//!     non_exp: "hidden".into(),
//!   };
//!   let mut dst = B::default();
//!
//!   let rule = Opt {
//!     name_from: "ID".into(),
//!     name_to: "AnotherField".into(),
//!     type_from: Some(t(&src.id)),
//!     type_to: Some(t(&dst.another_field)),
//!     convert: Some(Converter::infallible(|v: i64| v.to_string())),
//!   };
//!   kopi(&mut dst, &src, &[rule]).unwrap();
//!
//!   assert_eq!(dst.id, 23);
//!   assert_eq!(dst.name, "This is Name");
//!   assert_eq!(dst.value, Enum(1));
//!   assert_eq!(dst.another_field, "23");
//!   assert!(dst.not_export_field.is_empty());
//! ```

extern crate self as kopi;

mod assign;
mod error;
mod extract;
mod option;
mod record;
mod value;
mod visibility;

use tracing::debug;

pub use error::{BoxError, Error, Result};
pub use kopi_codegen::Record;
pub use option::{Converter, Opt};
pub use record::{Field, Record, Reflect};
pub use value::{t, Type, Value};
pub use visibility::is_exported;

/// Copies the exported fields of `src` into `dst`.
///
/// Options are validated before anything is read or written. A source that is
/// not a record fails with [`Error::NotAStruct`], a destination that is not a
/// record with [`Error::NotAPointer`]. A failing converter aborts the copy;
/// fields assigned before it keep their new values.
pub fn kopi(dst: &mut dyn Reflect, src: &dyn Reflect, opts: &[Opt]) -> Result<()> {
  let compiled = option::compile(opts)?;
  let values = extract::extract(src)?;
  let written = assign::assign(&values, dst, &compiled)?;
  debug!(read = values.len(), written, "copied fields");
  Ok(())
}

/// Like [`kopi`], for callers that already hold both sides as records.
pub fn copy(dst: &mut dyn Record, src: &dyn Record, opts: &[Opt]) -> Result<()> {
  let compiled = option::compile(opts)?;
  let values = extract::record_to_map(src);
  let written = assign::assign_record(&values, dst, &compiled)?;
  debug!(read = values.len(), written, "copied fields");
  Ok(())
}

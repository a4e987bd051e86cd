//! `#[derive(Record)]` for kopi.
//!
//! Generates a field descriptor table (`::kopi::Record`) and a record shape
//! (`::kopi::Reflect`) for structs with named fields. Field options:
//! `#[kopi(rename = "Name")]`, `#[kopi(skip)]`, `#[kopi(readonly)]`.

extern crate proc_macro;

use quote::quote;
use syn::{parse_macro_input, DeriveInput};

mod derive;
mod name;

use derive::Derive;

#[proc_macro_derive(Record, attributes(kopi))]
#[proc_macro_error::proc_macro_error]
pub fn derive_record(tokens: proc_macro::TokenStream) -> proc_macro::TokenStream {
  let input = parse_macro_input!(tokens as DeriveInput);
  let derive: Derive = Derive::from_derive_input(&input);
  let tokens = quote!(#derive);
  tokens.into()
}

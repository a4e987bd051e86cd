use crate::name;
use proc_macro2::TokenStream;
use proc_macro_error::{abort, abort_call_site, diagnostic, Level, ResultExt};
use quote::{quote, ToTokens};
use syn::{
  parse_quote, Attribute, Data, DeriveInput, Fields, Ident, Lit, LitStr, Meta, NestedMeta, Type,
  Visibility,
};

const ATTR_NAME: &str = "kopi";

#[derive(Debug)]
pub struct Derive {
  ident: syn::Ident,
  generics: syn::Generics,
  fields: Vec<RecordField>,
}

impl Derive {
  pub fn from_derive_input(input: &DeriveInput) -> Self {
    let fields = match input.data {
      Data::Struct(ref data) => match data.fields {
        Fields::Named(ref fields) => fields
          .named
          .iter()
          .filter_map(RecordField::from_field)
          .collect::<Vec<_>>(),
        _ => abort!(data.fields, "Only support named fields."),
      },
      _ => {
        abort_call_site!("Only support struct.");
      }
    };

    for (i, field) in fields.iter().enumerate() {
      if let Some(prev) = fields[..i].iter().find(|f| f.name == field.name) {
        abort!(
          field.ident,
          format!("Duplicate field name `{}`, already used by `{}`", field.name, prev.ident)
        );
      }
    }

    Self {
      ident: input.ident.clone(),
      generics: input.generics.clone(),
      fields,
    }
  }
}

impl ToTokens for Derive {
  fn to_tokens(&self, tokens: &mut TokenStream) {
    let self_ident = &self.ident;

    let mut generics = self.generics.clone();
    {
      let where_clause = generics.make_where_clause();
      for field in &self.fields {
        let ty = &field.ty;
        where_clause
          .predicates
          .push(parse_quote!(#ty: ::std::clone::Clone + 'static));
      }
    }
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let descriptors: Vec<_> = self.fields.iter().map(RecordField::descriptor_tokens).collect();

    let get_arms: Vec<_> = self
      .fields
      .iter()
      .enumerate()
      .map(|(index, field)| {
        let ident = &field.ident;
        quote! {
          #index => ::std::option::Option::Some(
            ::kopi::Value::new(::std::clone::Clone::clone(&self.#ident))
          )
        }
      })
      .collect();

    let set_arms: Vec<_> = self
      .fields
      .iter()
      .enumerate()
      .filter(|(_, field)| !field.readonly)
      .map(|(index, field)| {
        let ident = &field.ident;
        let ty = &field.ty;
        quote! {
          #index => {
            self.#ident = __value.downcast::<#ty>()?;
            ::std::result::Result::Ok(())
          }
        }
      })
      .collect();

    tokens.extend(quote! {
      impl #impl_generics ::kopi::Record for #self_ident #ty_generics #where_clause {
        fn fields(&self) -> ::std::vec::Vec<::kopi::Field> {
          ::std::vec![
            #(#descriptors),*
          ]
        }

        fn get(&self, __index: usize) -> ::std::option::Option<::kopi::Value> {
          match __index {
            #(#get_arms,)*
            _ => ::std::option::Option::None,
          }
        }

        fn set(
          &mut self,
          __index: usize,
          __value: ::kopi::Value,
        ) -> ::std::result::Result<(), ::kopi::Value> {
          match __index {
            #(#set_arms,)*
            _ => ::std::result::Result::Err(__value),
          }
        }
      }

      impl #impl_generics ::kopi::Reflect for #self_ident #ty_generics #where_clause {
        fn as_record(&self) -> ::std::option::Option<&dyn ::kopi::Record> {
          ::std::option::Option::Some(self)
        }

        fn as_record_mut(&mut self) -> ::std::option::Option<&mut dyn ::kopi::Record> {
          ::std::option::Option::Some(self)
        }
      }
    });
  }
}

#[derive(Debug)]
struct RecordField {
  ident: Ident,
  ty: Type,
  name: String,
  readonly: bool,
}

impl RecordField {
  // `None` for `#[kopi(skip)]`
  fn from_field(field: &syn::Field) -> Option<Self> {
    let ident = field.ident.clone().unwrap();
    let opts = FieldOpts::from_attrs(&field.attrs);
    if opts.skip {
      return None
    }

    let name = match opts.rename {
      Some(lit) => {
        let value = lit.value();
        name::validate(&value)
          .map_err(|err| diagnostic!(lit, Level::Error, err))
          .expect_or_abort("`rename` value");
        value
      }
      None => match field.vis {
        Visibility::Public(_) => name::exported_name(&ident.to_string())
          .map_err(|err| diagnostic!(ident, Level::Error, err))
          .expect_or_abort("Field name"),
        _ => ident.to_string(),
      },
    };

    Some(Self {
      ident,
      ty: field.ty.clone(),
      name,
      readonly: opts.readonly,
    })
  }

  // `::kopi::Field::new("Name", ::kopi::Type::of::<T>())`
  fn descriptor_tokens(&self) -> TokenStream {
    let name = &self.name;
    let ty = &self.ty;
    let readonly = if self.readonly {
      quote!(.readonly())
    } else {
      quote!()
    };
    quote! {
      ::kopi::Field::new(#name, ::kopi::Type::of::<#ty>()) #readonly
    }
  }
}

#[derive(Debug, Default)]
struct FieldOpts {
  rename: Option<LitStr>,
  skip: bool,
  readonly: bool,
}

impl FieldOpts {
  fn from_attrs(attrs: &[Attribute]) -> Self {
    let mut opts = Self::default();
    for attr in attrs {
      if !attr.path.get_ident().map(|v| v == ATTR_NAME).unwrap_or_default() {
        continue
      }
      match attr.parse_meta().unwrap_or_abort() {
        // #[kopi(...)]
        Meta::List(ref list) => {
          for nested in &list.nested {
            opts.apply(nested);
          }
        }
        ref meta => abort!(meta, "Expected: #[kopi(...)]"),
      }
    }
    opts
  }

  fn apply(&mut self, meta: &NestedMeta) {
    match meta {
      // skip, readonly
      NestedMeta::Meta(Meta::Path(ref path)) => match path.get_ident() {
        Some(ident) if ident == "skip" => self.skip = true,
        Some(ident) if ident == "readonly" => self.readonly = true,
        _ => abort!(path, "Unknown option."),
      },
      // rename = ".."
      NestedMeta::Meta(Meta::NameValue(ref v)) => {
        if !v.path.get_ident().map(|i| i == "rename").unwrap_or_default() {
          abort!(v.path, "Unknown option.")
        }
        if self.rename.is_some() {
          abort!(v, "Duplicate `rename`.")
        }
        match v.lit {
          Lit::Str(ref lit) => self.rename = Some(lit.clone()),
          ref lit => abort!(lit, "Expected: rename = \"<name>\""),
        }
      }
      _ => abort!(meta, "Invalid syntax."),
    }
  }
}

#[cfg(test)]
fn parse(input: DeriveInput) -> Derive {
  Derive::from_derive_input(&input)
}

#[test]
fn test_field_table() {
  let derive = parse(parse_quote! {
    struct T {
      #[kopi(rename = "ID")]
      pub id: i64,
      pub another_field: String,
      #[kopi(readonly)]
      pub value: u8,
      #[kopi(skip)]
      pub cache: Vec<u8>,
      hidden: String,
    }
  });
  let fields: Vec<_> = derive
    .fields
    .iter()
    .map(|f| (f.ident.to_string(), f.name.as_str(), f.readonly))
    .collect();
  assert_eq!(fields, vec![
    ("id".to_string(), "ID", false),
    ("another_field".to_string(), "AnotherField", false),
    ("value".to_string(), "Value", true),
    ("hidden".to_string(), "hidden", false),
  ]);
}

#[test]
fn test_generated_impls() {
  let derive = parse(parse_quote! {
    struct T<X> {
      pub value: X,
      #[kopi(readonly)]
      pub name: String,
    }
  });
  let tokens = quote!(#derive).to_string();
  let expected = [
    quote!(impl<X> ::kopi::Record for T<X>),
    quote!(impl<X> ::kopi::Reflect for T<X>),
    quote!(X: ::std::clone::Clone + 'static),
    quote!(::kopi::Field::new("Name", ::kopi::Type::of::<String>()).readonly()),
    quote!(0usize => { self.value = __value.downcast::<X>()?; }),
  ];
  for fragment in &expected {
    let fragment = fragment.to_string();
    // the set arm is matched without its trailing `Ok(())`
    let fragment = fragment.trim_end_matches('}').trim_end();
    assert!(tokens.contains(fragment), "missing `{}` in `{}`", fragment, tokens);
  }
  // only `value` is settable
  assert!(!tokens.contains(&quote!(self.name = __value).to_string()));
}

#[test]
#[should_panic]
fn test_tuple_struct() {
  parse(parse_quote! {
    struct T(i64);
  });
}

#[test]
#[should_panic]
fn test_unit_struct() {
  parse(parse_quote! {
    struct T;
  });
}

#[test]
#[should_panic]
fn test_enum() {
  parse(parse_quote! {
    enum T { A, B }
  });
}

#[test]
#[should_panic]
fn test_duplicate_name() {
  parse(parse_quote! {
    struct T {
      #[kopi(rename = "X")]
      pub a: i32,
      #[kopi(rename = "X")]
      pub b: i32,
    }
  });
}

#[test]
#[should_panic]
fn test_duplicate_derived_name() {
  parse(parse_quote! {
    struct T {
      pub name: String,
      #[kopi(rename = "Name")]
      pub label: String,
    }
  });
}

#[test]
#[should_panic]
fn test_unknown_flag() {
  parse(parse_quote! {
    struct T {
      #[kopi(bogus)]
      pub a: i32,
    }
  });
}

#[test]
#[should_panic]
fn test_unknown_key() {
  parse(parse_quote! {
    struct T {
      #[kopi(alias = "A")]
      pub a: i32,
    }
  });
}

#[test]
#[should_panic]
fn test_duplicate_rename() {
  parse(parse_quote! {
    struct T {
      #[kopi(rename = "A", rename = "B")]
      pub a: i32,
    }
  });
}

#[test]
#[should_panic]
fn test_rename_not_a_string() {
  parse(parse_quote! {
    struct T {
      #[kopi(rename = 1)]
      pub a: i32,
    }
  });
}

#[test]
#[should_panic]
fn test_invalid_rename() {
  parse(parse_quote! {
    struct T {
      #[kopi(rename = "Another Field")]
      pub a: i32,
    }
  });
}

#[test]
#[should_panic]
fn test_attribute_not_a_list() {
  parse(parse_quote! {
    struct T {
      #[kopi = "A"]
      pub a: i32,
    }
  });
}

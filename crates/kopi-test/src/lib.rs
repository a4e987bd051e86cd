use kopi::{copy, kopi, t, Converter, Error, Opt, Record, Type};
use std::marker::PhantomData;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Enum(u8);

#[derive(Debug, Clone, Record)]
pub struct A {
  #[kopi(rename = "ID")]
  pub id: i64,
  pub name: String,
  pub value: Enum,
  pub extra_field: String,
  non_exp: String,
}

#[derive(Debug, Clone, Default, PartialEq, Record)]
pub struct B {
  #[kopi(rename = "ID")]
  pub id: i64,
  pub name: String,
  pub value: Enum,
  pub another_field: String,
  not_export_field: String,
}

fn a() -> A {
  A {
    id: 23,
    name: "This is Name".into(),
    value: Enum(7),
    extra_field: "extra".into(),
    non_exp: "secret".into(),
  }
}

fn itoa() -> Converter {
  Converter::infallible(|v: i64| v.to_string())
}

#[derive(Debug, thiserror::Error)]
#[error("value {0} is out of range")]
struct OutOfRange(i64);

#[test]
fn test_fields_descriptor() {
  let names: Vec<_> = a().fields().into_iter().map(|f| f.name).collect();
  assert_eq!(names, vec!["ID", "Name", "Value", "ExtraField", "non_exp"]);
  assert_eq!(a().fields()[0].ty, Type::of::<i64>());
}

#[test]
fn test_copy_same_named_fields() {
  let mut dst = B::default();
  kopi(&mut dst, &a(), &[]).unwrap();
  assert_eq!(dst, B {
    id: 23,
    name: "This is Name".into(),
    value: Enum(7),
    another_field: String::new(),
    not_export_field: String::new(),
  });
}

#[test]
fn test_unmatched_fields_untouched() {
  let mut dst = B {
    another_field: "keep".into(),
    not_export_field: "mine".into(),
    ..Default::default()
  };
  kopi(&mut dst, &a(), &[]).unwrap();
  assert_eq!(dst.another_field, "keep");
  assert_eq!(dst.not_export_field, "mine");
}

#[test]
fn test_private_fields_ignored_by_rules() {
  #[derive(Debug, Clone, Default, Record)]
  struct Private {
    non_exp: String,
  }

  let mut dst = Private::default();
  // lowercase names are rejected as rule endpoints
  let err = kopi(&mut dst, &a(), &[Opt::name("non_exp", "non_exp")]).unwrap_err();
  assert!(matches!(err, Error::InvalidOption { index: 0, .. }));
  // and a same-named private field is never copied
  kopi(&mut dst, &a(), &[]).unwrap();
  assert!(dst.non_exp.is_empty());
}

#[test]
fn test_same_name_different_type_skipped() {
  #[derive(Debug, Clone, Default, Record)]
  struct Narrow {
    #[kopi(rename = "ID")]
    pub id: i32,
    pub name: String,
  }

  let mut dst = Narrow { id: -1, ..Default::default() };
  kopi(&mut dst, &a(), &[]).unwrap();
  assert_eq!(dst.id, -1);
  assert_eq!(dst.name, "This is Name");
}

#[test]
fn test_name_rule() {
  #[derive(Debug, Clone, Default, Record)]
  struct Text {
    pub label: String,
  }

  let mut dst = Text::default();
  kopi(&mut dst, &a(), &[Opt::name("Name", "Label")]).unwrap();
  assert_eq!(dst.label, "This is Name");
}

#[test]
fn test_name_rule_prefers_mapped_source() {
  #[derive(Debug, Clone, Record)]
  struct Src {
    pub name: String,
    pub label: String,
  }

  #[derive(Debug, Clone, Default, Record)]
  struct Dst {
    pub label: String,
  }

  let src = Src {
    name: "from name".into(),
    label: "from label".into(),
  };
  let mut dst = Dst::default();
  kopi(&mut dst, &src, &[Opt::name("Name", "Label")]).unwrap();
  assert_eq!(dst.label, "from name");
}

#[test]
fn test_name_rule_without_converter_skips() {
  let mut dst = B::default();
  kopi(&mut dst, &a(), &[Opt::name("ID", "AnotherField")]).unwrap();
  assert!(dst.another_field.is_empty());
  assert_eq!(dst.id, 23);
}

#[test]
fn test_name_and_type_rule() {
  let src = a();
  let mut dst = B::default();
  let rule = Opt {
    name_from: "ID".into(),
    name_to: "AnotherField".into(),
    type_from: Some(t(&src.id)),
    type_to: Some(t(&dst.another_field)),
    convert: Some(itoa()),
  };
  kopi(&mut dst, &src, &[rule]).unwrap();
  assert_eq!(dst.id, 23);
  assert_eq!(dst.another_field, "23");
}

#[test]
fn test_separate_name_and_type_rules() {
  let mut dst = B::default();
  kopi(&mut dst, &a(), &[
    Opt::name("ID", "AnotherField"),
    Opt::types(Type::of::<i64>(), Type::of::<String>(), itoa()),
  ])
  .unwrap();
  assert_eq!(dst.another_field, "23");
}

#[test]
fn test_type_rule_applies_to_same_named_fields() {
  #[derive(Debug, Clone, Default, Record)]
  struct Text {
    #[kopi(rename = "ID")]
    pub id: String,
    pub value: u8,
  }

  let mut dst = Text::default();
  kopi(&mut dst, &a(), &[
    Opt::types(Type::of::<i64>(), Type::of::<String>(), itoa()),
    Opt::convert(|v: Enum| Ok::<_, OutOfRange>(v.0)),
  ])
  .unwrap();
  assert_eq!(dst.id, "23");
  assert_eq!(dst.value, 7);
}

#[test]
fn test_type_rule_registered_for_other_target() {
  #[derive(Debug, Clone, Default, Record)]
  struct Wide {
    #[kopi(rename = "ID")]
    pub id: f64,
  }

  let mut dst = Wide { id: 1.5 };
  kopi(&mut dst, &a(), &[Opt::types(Type::of::<i64>(), Type::of::<String>(), itoa())]).unwrap();
  assert_eq!(dst.id, 1.5);
}

#[test]
fn test_later_type_rule_wins() {
  #[derive(Debug, Clone, Default, Record)]
  struct Text {
    #[kopi(rename = "ID")]
    pub id: String,
  }

  let mut dst = Text::default();
  kopi(&mut dst, &a(), &[
    Opt::types(Type::of::<i64>(), Type::of::<String>(), itoa()),
    Opt::convert(|v: i64| Ok::<_, OutOfRange>(format!("#{}", v))),
  ])
  .unwrap();
  assert_eq!(dst.id, "#23");
}

#[test]
fn test_conversion_failure_keeps_earlier_fields() {
  #[derive(Debug, Clone, Record)]
  struct Src {
    pub first: i64,
    pub second: i64,
    pub third: i64,
  }

  #[derive(Debug, Clone, Default, Record)]
  struct Dst {
    pub first: u8,
    pub second: u8,
    pub third: u8,
  }

  let src = Src {
    first: 1,
    second: 1000,
    third: 3,
  };
  let mut dst = Dst::default();
  let err = kopi(&mut dst, &src, &[Opt::convert(|v: i64| {
    if (0..=255).contains(&v) {
      Ok(v as u8)
    } else {
      Err(OutOfRange(v))
    }
  })])
  .unwrap_err();

  match err {
    Error::Conversion { field, ref source } => {
      assert_eq!(field, "Second");
      assert!(source.downcast_ref::<OutOfRange>().is_some());
    }
    other => panic!("unexpected: {:?}", other),
  }
  assert_eq!(dst.first, 1);
  assert_eq!(dst.second, 0);
  assert_eq!(dst.third, 0);
}

#[test]
fn test_invalid_option_leaves_destination_untouched() {
  let before = B {
    name: "before".into(),
    ..Default::default()
  };
  let cases = vec![
    Opt::name("ID", ""),
    Opt::name("ID", "anotherField"),
    Opt {
      type_from: Some(Type::of::<i64>()),
      ..Default::default()
    },
    Opt {
      type_from: Some(Type::of::<i64>()),
      type_to: Some(Type::of::<String>()),
      ..Default::default()
    },
  ];
  for opt in cases {
    let mut dst = before.clone();
    let err = kopi(&mut dst, &a(), &[Opt::name("Name", "Name"), opt]).unwrap_err();
    assert!(matches!(err, Error::InvalidOption { index: 1, .. }));
    assert_eq!(dst, before);
  }
}

#[test]
fn test_invalid_option_checked_before_shapes() {
  let mut dst = B::default();
  let err = kopi(&mut dst, &42i32, &[Opt::name("", "Name")]).unwrap_err();
  assert!(matches!(err, Error::InvalidOption { .. }));
}

#[test]
fn test_source_not_a_struct() {
  let mut dst = B::default();
  assert!(matches!(kopi(&mut dst, &42i32, &[]), Err(Error::NotAStruct)));
  assert!(matches!(kopi(&mut dst, &Box::new(a()), &[]), Err(Error::NotAStruct)));
  assert!(matches!(kopi(&mut dst, &String::from("x"), &[]), Err(Error::NotAStruct)));
}

#[test]
fn test_destination_not_a_pointer() {
  let mut dst = 0u64;
  assert!(matches!(kopi(&mut dst, &a(), &[]), Err(Error::NotAPointer)));
  let mut dst = Box::new(B::default());
  assert!(matches!(kopi(&mut dst, &a(), &[]), Err(Error::NotAPointer)));
  assert_eq!(*dst, B::default());
}

#[test]
fn test_idempotent() {
  let calls = Arc::new(AtomicUsize::new(0));
  let counter = calls.clone();
  let opts = [Opt::name("ID", "AnotherField").with_types(
    Type::of::<i64>(),
    Type::of::<String>(),
    Converter::infallible(move |v: i64| {
      counter.fetch_add(1, Ordering::SeqCst);
      v.to_string()
    }),
  )];

  let mut once = B::default();
  kopi(&mut once, &a(), &opts).unwrap();
  let mut twice = B::default();
  kopi(&mut twice, &a(), &opts).unwrap();
  kopi(&mut twice, &a(), &opts).unwrap();
  assert_eq!(once, twice);
  assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[test]
fn test_skip_and_readonly() {
  #[derive(Debug, Clone, Default, Record)]
  struct Dst {
    #[kopi(skip)]
    pub name: String,
    #[kopi(readonly)]
    pub value: Enum,
    #[kopi(rename = "ExtraField")]
    pub extra: String,
  }

  let mut dst = Dst::default();
  assert_eq!(dst.fields().len(), 2);
  kopi(&mut dst, &a(), &[]).unwrap();
  assert!(dst.name.is_empty());
  assert_eq!(dst.value, Enum::default());
  assert_eq!(dst.extra, "extra");
}

#[test]
fn test_rename_can_hide_public_field() {
  #[derive(Debug, Clone, Default, Record)]
  struct Dst {
    #[kopi(rename = "name")]
    pub name: String,
  }

  let mut dst = Dst::default();
  kopi(&mut dst, &a(), &[]).unwrap();
  assert!(dst.name.is_empty());
}

#[test]
fn test_generic_record() {
  #[derive(Debug, Clone, Default, Record)]
  struct Wrapper<T> {
    #[kopi(rename = "ID")]
    pub id: T,
    pub name: String,
    marker: PhantomData<T>,
  }

  let mut dst: Wrapper<i64> = Wrapper::default();
  kopi(&mut dst, &a(), &[]).unwrap();
  assert_eq!(dst.id, 23);

  let mut dst: Wrapper<String> = Wrapper::default();
  kopi(&mut dst, &a(), &[Opt::convert(|v: i64| Ok::<_, OutOfRange>(v.to_string()))]).unwrap();
  assert_eq!(dst.id, "23");
  assert_eq!(dst.name, "This is Name");
}

#[test]
fn test_copy_between_records() {
  let mut dst = B::default();
  copy(&mut dst, &a(), &[Opt::name("Name", "AnotherField")]).unwrap();
  assert_eq!(dst.another_field, "This is Name");
  assert_eq!(dst.name, "This is Name");
}

#[test]
fn test_copy_into_trait_object() {
  let mut targets: Vec<Box<dyn Record>> = vec![Box::new(B::default()), Box::new(B::default())];
  for target in targets.iter_mut() {
    copy(target.as_mut(), &a(), &[]).unwrap();
  }
  let names: Vec<_> = targets
    .iter()
    .map(|r| r.get(1).and_then(|v| v.downcast::<String>().ok()))
    .collect();
  assert_eq!(names, vec![Some("This is Name".to_string()); 2]);
}

#[test]
fn test_parallel_copies() {
  let opts = Arc::new(vec![Opt::name("ID", "AnotherField").with_types(
    Type::of::<i64>(),
    Type::of::<String>(),
    itoa(),
  )]);
  let handles: Vec<_> = (0..4)
    .map(|i| {
      let opts = opts.clone();
      std::thread::spawn(move || {
        let mut src = a();
        src.id = i;
        let mut dst = B::default();
        kopi(&mut dst, &src, &opts).unwrap();
        dst
      })
    })
    .collect();
  for (i, handle) in handles.into_iter().enumerate() {
    assert_eq!(handle.join().unwrap().another_field, i.to_string());
  }
}

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::record::{Record, Reflect};
use crate::value::Value;

pub(crate) type ValueMap = HashMap<&'static str, Value>;

pub(crate) fn extract(src: &dyn Reflect) -> Result<ValueMap> {
  src.as_record().map(record_to_map).ok_or(Error::NotAStruct)
}

/// Copies every exported field of `record` into a name -> value map.
pub(crate) fn record_to_map(record: &dyn Record) -> ValueMap {
  record
    .fields()
    .into_iter()
    .enumerate()
    .filter(|(_, field)| field.is_exported())
    .filter_map(|(index, field)| record.get(index).map(|value| (field.name, value)))
    .collect()
}

use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum Error {
  #[error("type not struct")]
  NotAStruct,
  #[error("type not ptr")]
  NotAPointer,
  #[error("invalid option #{index}: {reason}")]
  InvalidOption {
    index: usize,
    reason: &'static str,
  },
  #[error("convert field `{field}`: {source}")]
  Conversion {
    field: &'static str,
    #[source]
    source: BoxError,
  },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

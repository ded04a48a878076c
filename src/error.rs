use derive_more::{Display, Error};

pub type Error = exn::Exn<ErrorKind>;
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    #[display("configuration error")]
    Config,
    #[display("could not prepare cache directory: {_0}")]
    CacheDirectory(#[error(not(source))] String),
    #[display("could not open the cache database")]
    Cache,
    #[display("could not build the resource manager")]
    Manager,
}

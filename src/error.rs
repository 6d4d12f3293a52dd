use snafu::Snafu;

/// The public error type for this crate.
#[derive(Debug, Snafu)]
#[snafu(visibility = "pub(crate)")]
pub enum Error {
    #[snafu(display("{}", source))]
    Parse { source: LibError },

    #[snafu(display("{}", source))]
    Model { source: ModelError },
}

impl From<LibError> for Error {
    fn from(source: LibError) -> Self {
        Error::Parse { source }
    }
}

impl From<ModelError> for Error {
    fn from(source: ModelError) -> Self {
        Error::Model { source }
    }
}

/// The public Result type for this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// The internal Result type used by the framer and primitive codec.
pub(crate) type LibResult<T> = std::result::Result<T, LibError>;

/// Structural / parse errors raised while reading the event stream.
#[derive(Debug, Snafu)]
#[snafu(visibility = "pub(crate)")]
pub enum LibError {
    #[snafu(display("{}: {}", site, source))]
    Io {
        site: String,
        source: crate::byte_iter::ByteError,
    },

    #[snafu(display("{}: malformed varlen size prefix: {}", site, source))]
    Varlen {
        site: String,
        source: crate::vlq::VlqError,
    },
}

/// Semantic / lookup errors raised from model accessors. Raising one of
/// these leaves the event stream unchanged.
#[derive(Debug, Snafu, PartialEq, Eq)]
#[snafu(visibility = "pub(crate)")]
pub enum ModelError {
    #[snafu(display("no model found matching {}", what))]
    ModelNotFound { what: String },

    #[snafu(display("no {} are present in this stream", aggregate))]
    NoModelsFound { aggregate: String },

    #[snafu(display("property {} cannot be set: no backing record in the params blob", property))]
    PropertyCannotBeSet { property: String },

    #[snafu(display("invalid value for {}: {}", what, description))]
    InvalidValue { what: String, description: String },
}

macro_rules! site {
    () => {
        format!("{}:{}", file!(), line!())
    };
}

macro_rules! io {
    () => {
        crate::error::Io { site: site!() }
    };
}

macro_rules! varlen {
    () => {
        crate::error::Varlen { site: site!() }
    };
}

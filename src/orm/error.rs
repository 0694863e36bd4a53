/// Errors raised by the object-document mapper and its store adapters.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Malformed key: {0}")]
    MalformedKey(String),
    #[error("Malformed id {0:?}")]
    MalformedId(String),
    #[error("Unknown model {0:?}")]
    UnknownModel(String),
    #[error("Model {0:?} is already registered")]
    DuplicateModel(String),
    #[error("{model} with id {id} does not exist")]
    NotFound { model: String, id: String },
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),
    #[error("Password hashing failed: {0}")]
    Password(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn not_found<S: Into<String>>(model: &str, id: S) -> Self {
        Error::NotFound {
            model: model.into(),
            id: id.into(),
        }
    }

    /// Infrastructure failures, as opposed to bad input or missing entities.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Error::StoreUnavailable(_))
    }
}

impl From<bcrypt::BcryptError> for Error {
    fn from(e: bcrypt::BcryptError) -> Self {
        Error::Password(e.to_string())
    }
}

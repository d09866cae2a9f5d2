use std::fmt::{self, Display};

pub struct QueryError {
    code: u16,
    info: String,
}

impl QueryError {
    pub fn new(info: String) -> Self {
        Self { code: 500, info }
    }

    fn with_code(code: u16, info: &str) -> Self {
        Self {
            code,
            info: info.to_string(),
        }
    }
}

impl From<sqlx::Error> for QueryError {
    fn from(value: sqlx::Error) -> Self {
        match value {
            sqlx::Error::Database(e) if e.is_foreign_key_violation() => {
                Self::with_code(400, "Referenced object does not exist")
            }
            sqlx::Error::Database(e) if e.is_unique_violation() => {
                Self::with_code(400, "Object already exists")
            }
            sqlx::Error::Database(e) if e.is_check_violation() => {
                Self::with_code(400, "Value violates a constraint")
            }
            sqlx::Error::Configuration(e) => Self::new(format!("{e}")),
            sqlx::Error::Database(e) => Self::new(format!("{e}")),
            sqlx::Error::Io(e) => Self::new(format!("{e}")),
            sqlx::Error::Tls(e) => Self::new(format!("{e}")),
            sqlx::Error::Protocol(e) => Self::new(format!("{e}")),
            sqlx::Error::RowNotFound => Self::with_code(404, "Not found"),
            sqlx::Error::TypeNotFound { type_name } => {
                Self::new(format!("Type not found: {type_name}"))
            }
            sqlx::Error::ColumnIndexOutOfBounds { index, len } => {
                Self::new(format!("Column index out of bounds {index} ({len})"))
            }
            sqlx::Error::ColumnNotFound(e) => Self::new(format!("{e}")),
            sqlx::Error::ColumnDecode { index, source } => {
                Self::new(format!("Column decode {index} ({source})"))
            }
            sqlx::Error::Decode(e) => Self::new(format!("{e}")),
            sqlx::Error::PoolTimedOut => Self::new(format!("Pool timed out")),
            sqlx::Error::PoolClosed => Self::new(format!("Pool closed")),
            sqlx::Error::WorkerCrashed => Self::new(format!("Worker crashed")),
            sqlx::Error::Migrate(e) => Self::new(format!("{e}")),
            _ => Self::new(format!("Unknown error")),
        }
    }
}

impl From<QueryError> for potion::Error {
    fn from(value: QueryError) -> Self {
        if value.code >= 500 {
            log::error!("Query failed: {}", value.info);
        }

        error(value.code, value.info)
    }
}

/// A request field that is missing, has the wrong type or fails a rule.
#[derive(Debug)]
pub struct TypeError {
    field: String,
    info: String,
}

impl TypeError {
    pub fn new(field: &str, info: &str) -> Self {
        Self {
            field: field.to_string(),
            info: info.to_string(),
        }
    }

    pub fn field(&self) -> &str {
        &self.field
    }
}

impl From<TypeError> for potion::Error {
    fn from(value: TypeError) -> Self {
        error(400, value.to_string())
    }
}

impl Display for TypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.info)
    }
}

impl std::error::Error for TypeError {}

pub struct NotFoundError {
    info: String,
}

impl NotFoundError {
    pub fn new(info: &str) -> Self {
        Self {
            info: info.to_string(),
        }
    }
}

impl From<NotFoundError> for potion::Error {
    fn from(value: NotFoundError) -> Self {
        error(404, value.info)
    }
}

/// Caller is authenticated but not allowed to touch the object.
pub struct PermissionError {
    info: String,
}

impl PermissionError {
    pub fn new(info: &str) -> Self {
        Self {
            info: info.to_string(),
        }
    }
}

impl From<PermissionError> for potion::Error {
    fn from(value: PermissionError) -> Self {
        error(403, value.info)
    }
}

/// Duplicate mark or self-follow.
pub struct ConflictError {
    info: String,
}

impl ConflictError {
    pub fn new(info: &str) -> Self {
        Self {
            info: info.to_string(),
        }
    }
}

impl From<ConflictError> for potion::Error {
    fn from(value: ConflictError) -> Self {
        error(400, value.info)
    }
}

pub struct AuthenticationError {
    info: String,
}

impl AuthenticationError {
    pub fn new(info: &str) -> Self {
        Self {
            info: info.to_string(),
        }
    }
}

impl From<AuthenticationError> for potion::Error {
    fn from(value: AuthenticationError) -> Self {
        error(401, value.info)
    }
}

fn error(code: u16, info: String) -> potion::Error {
    potion::Error {
        code: code.into(),
        info: Some(info),
        redirect: None,
    }
}

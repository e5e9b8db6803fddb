use thiserror::Error;

/// Failure to turn an exposed object into envelope data.
#[derive(Debug, Error)]
pub enum ExposeError {
    #[error("`{type_name}` exposes no conversion capability")]
    Unclassifiable { type_name: String },
    #[error("failed to convert `{type_name}`: {message}")]
    Conversion { type_name: String, message: String },
}

impl ExposeError {
    pub fn unclassifiable(type_name: impl Into<String>) -> Self {
        Self::Unclassifiable {
            type_name: type_name.into(),
        }
    }

    pub fn conversion(type_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Conversion {
            type_name: type_name.into(),
            message: message.into(),
        }
    }
}

//! Error types
//!
//! Only structural and configuration problems are reported as errors.
//! Out-of-range indices are handled inside each bank as silent no-ops.

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    Io(String),
    Config(String),
    InvalidColor(String),
    InvalidDimensions {
        what: &'static str,
        width: i32,
        height: i32,
    },
    MissingResource(String),
}

impl std::error::Error for Error {}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Io(msg) => write!(f, "I/O error: {}", msg),
            Self::Config(msg) => write!(f, "Invalid configuration: {}", msg),
            Self::InvalidColor(color) => write!(f, "Invalid hex color: {:?}", color),
            Self::InvalidDimensions { what, width, height } => {
                write!(f, "Invalid {} dimensions: {}x{}", what, width, height)
            }
            Self::MissingResource(name) => write!(f, "Missing resource: {}", name),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Config(err.to_string())
    }
}

/// Reject zero or negative dimensions
pub(crate) fn check_dimensions(what: &'static str, width: i32, height: i32) -> Result<()> {
    if width <= 0 || height <= 0 {
        return Err(Error::InvalidDimensions { what, width, height });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = Error::InvalidDimensions { what: "sprite", width: 0, height: 8 };
        assert_eq!(err.to_string(), "Invalid sprite dimensions: 0x8");
        assert_eq!(
            Error::MissingResource("large-font".into()).to_string(),
            "Missing resource: large-font"
        );
    }

    #[test]
    fn test_check_dimensions() {
        assert!(check_dimensions("display", 256, 240).is_ok());
        assert!(check_dimensions("display", -1, 240).is_err());
        assert!(check_dimensions("display", 256, 0).is_err());
    }

    #[test]
    fn test_json_error_conversion() {
        let err: Error = serde_json::from_str::<u32>("nope").unwrap_err().into();
        assert!(matches!(err, Error::Config(_)));
    }
}

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A kernel map or socket operation failed with `errno`.
    #[error("{context}: {}", strerror(.errno))]
    ResourceFailure { context: String, errno: i32 },

    #[error("unsupported operation: {0}")]
    Unsupported(String),

    #[error("initialization failed: {0}")]
    InitFailed(String),
}

fn strerror(errno: &i32) -> String {
    std::io::Error::from_raw_os_error(*errno).to_string()
}

impl DomainError {
    pub fn resource(context: impl Into<String>, errno: i32) -> Self {
        Self::ResourceFailure {
            context: context.into(),
            errno,
        }
    }

    /// Kernel errno carried by a `ResourceFailure`, if any.
    pub fn errno(&self) -> Option<i32> {
        match self {
            Self::ResourceFailure { errno, .. } => Some(*errno),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_failure_renders_strerror() {
        let err = DomainError::resource("read uid owner map", 2);
        let msg = err.to_string();
        assert!(msg.starts_with("read uid owner map: "));
        assert!(msg.contains("No such file or directory"));
        assert_eq!(err.errno(), Some(2));
    }

    #[test]
    fn non_resource_has_no_errno() {
        assert_eq!(DomainError::NotFound("uid 5".into()).errno(), None);
        assert_eq!(
            DomainError::InvalidArgument("x".into()).to_string(),
            "invalid argument: x"
        );
    }
}

//! Integration tests for error types

#[cfg(test)]
mod tests {
    use apkidx_errors::*;

    #[test]
    fn test_error_conversion() {
        let net_err = NetworkError::Timeout {
            url: "https://example.com".into(),
        };
        let err: Error = net_err.into();
        assert!(matches!(err, Error::Network(_)));

        let sig_err = SigningError::KeyNotFound {
            key_id: "alpine.rsa.pub".into(),
        };
        let err: Error = sig_err.into();
        assert!(matches!(err, Error::Signing(_)));
    }

    #[test]
    fn test_error_display() {
        let err = SigningError::KeyNotFound {
            key_id: "alpine.rsa.pub".into(),
        };
        assert_eq!(err.to_string(), "no public key found for key id: alpine.rsa.pub");
    }

    #[test]
    fn test_error_clone() {
        let err = NetworkError::HttpError {
            status: 404,
            message: "Not Found".into(),
        };
        let cloned = err.clone();
        assert_eq!(err.to_string(), cloned.to_string());
    }

    #[test]
    fn test_io_error_with_path() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = Error::io_with_path(&io_err, "/srv/out/APKINDEX.tar.gz");
        assert_eq!(err.user_code(), Some("error.io"));
        assert!(err.user_message().contains("/srv/out/APKINDEX.tar.gz"));
    }
}

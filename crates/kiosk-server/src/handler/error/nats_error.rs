//! Cache failures.

use super::http_error::{Error as HttpError, ErrorKind};

impl From<kiosk_nats::Error> for HttpError<'static> {
    fn from(error: kiosk_nats::Error) -> Self {
        match error {
            kiosk_nats::Error::Connection(_) | kiosk_nats::Error::Timeout { .. } => {
                ErrorKind::InternalServerError
                    .with_message("Upload cache is temporarily unavailable")
                    .with_context(error.to_string())
            }
            kiosk_nats::Error::Serialization(_) => ErrorKind::InternalServerError
                .with_message("Cached upload could not be decoded")
                .with_context(error.to_string()),
            kiosk_nats::Error::Operation { ref operation, .. } => ErrorKind::InternalServerError
                .with_message(format!("Cache operation '{operation}' failed"))
                .with_context(error.to_string()),
            kiosk_nats::Error::InvalidConfig { .. } => {
                ErrorKind::InternalServerError.with_context(error.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn timeouts_are_unavailable() {
        let error: HttpError = kiosk_nats::Error::Timeout {
            timeout: Duration::from_secs(5),
        }
        .into();

        assert_eq!(error.kind(), ErrorKind::InternalServerError);
        assert!(error.message().unwrap().contains("unavailable"));
    }

    #[test]
    fn operations_are_named() {
        let error: HttpError = kiosk_nats::Error::operation("kv_put", "bucket gone").into();
        assert_eq!(error.message(), Some("Cache operation 'kv_put' failed"));
        assert!(error.context().unwrap().contains("bucket gone"));
    }
}

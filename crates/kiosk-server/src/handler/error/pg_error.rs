//! Metadata store failures.

use kiosk_postgres::PgError;

use super::http_error::{Error as HttpError, ErrorKind};

impl From<PgError> for HttpError<'static> {
    fn from(error: PgError) -> Self {
        match error {
            PgError::Timeout(_) | PgError::Connection(_) => ErrorKind::InternalServerError
                .with_message("Metadata store is temporarily unavailable")
                .with_context(error.to_string()),
            PgError::Query(_) => ErrorKind::InternalServerError
                .with_message("Metadata query failed")
                .with_context(error.to_string()),
            PgError::Config(_) | PgError::Migration(_) | PgError::Unexpected(_) => {
                ErrorKind::InternalServerError.with_context(error.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use kiosk_postgres::error::{DieselError, TimeoutType};

    use super::*;

    #[test]
    fn timeouts_are_unavailable() {
        let error: HttpError = PgError::Timeout(TimeoutType::Wait).into();
        assert_eq!(error.kind(), ErrorKind::InternalServerError);
        assert!(error.message().unwrap().contains("unavailable"));
    }

    #[test]
    fn query_errors_keep_detail() {
        let error: HttpError = PgError::Query(DieselError::NotFound).into();
        assert_eq!(error.message(), Some("Metadata query failed"));
        assert!(error.context().is_some());
    }
}

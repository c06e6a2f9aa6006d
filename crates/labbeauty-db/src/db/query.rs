use labbeauty_core::AppError;
use sqlx::postgres::PgDatabaseError;
use std::future::Future;
use std::time::Duration;

const UNIQUE_VIOLATION: &str = "23505";

pub(crate) fn not_found() -> AppError {
    AppError::NotFound("the requested resource could not be found".to_string())
}

/// Run a query under `deadline`.
///
/// Errors are mapped with [`map_db_error`]; an expired deadline becomes
/// [`AppError::Timeout`].
pub(crate) async fn with_deadline<T, F>(
    deadline: Duration,
    operation: &'static str,
    query: F,
) -> Result<T, AppError>
where
    F: Future<Output = Result<T, sqlx::Error>>,
{
    match tokio::time::timeout(deadline, query).await {
        Ok(result) => result.map_err(map_db_error),
        Err(_) => {
            tracing::warn!(
                operation,
                deadline_ms = deadline.as_millis() as u64,
                "Database query exceeded its deadline"
            );
            Err(AppError::Timeout(format!(
                "{} did not finish within {:?}",
                operation, deadline
            )))
        }
    }
}

/// Convert a driver error, turning unique violations into [`AppError::Conflict`].
pub fn map_db_error(err: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db) = &err {
        if db.code().as_deref() == Some(UNIQUE_VIOLATION) {
            let value = db
                .try_downcast_ref::<PgDatabaseError>()
                .and_then(|pg| pg.detail())
                .and_then(parse_unique_violation)
                .or_else(|| db.constraint().map(String::from))
                .unwrap_or_default();
            return AppError::Conflict { value };
        }
    }
    AppError::from(err)
}

/// Extract the offending value from a unique violation detail such as
/// `Key (title)=(Manicure) already exists.`
pub fn parse_unique_violation(detail: &str) -> Option<String> {
    let start = detail.find(")=(")? + 3;
    let end = detail.rfind(") already exists")?;
    if end < start {
        return None;
    }
    Some(detail[start..end].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_violation_value_is_extracted() {
        assert_eq!(
            parse_unique_violation("Key (title)=(Manicure) already exists."),
            Some("Manicure".to_string())
        );
        assert_eq!(
            parse_unique_violation("Key (email)=(a(b)@x.com) already exists."),
            Some("a(b)@x.com".to_string())
        );
    }

    #[test]
    fn unrelated_detail_is_ignored() {
        assert_eq!(parse_unique_violation("something else"), None);
        assert_eq!(parse_unique_violation(") already exists )=("), None);
    }

    #[test]
    fn row_not_found_maps_to_not_found() {
        assert!(matches!(
            map_db_error(sqlx::Error::RowNotFound),
            AppError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn slow_query_times_out() {
        let result: Result<(), AppError> = with_deadline(
            Duration::from_millis(10),
            "categories.select",
            async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(())
            },
        )
        .await;

        assert!(matches!(result, Err(AppError::Timeout(_))));
    }
}

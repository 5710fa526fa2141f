// src/api/pagination.rs
//! Cursor pagination where every page request is retried on its own.

use super::types::RecordPage;
use crate::error::AppError;
use crate::error_recovery::{log_retry, retry_with_backoff, RetryPolicy};
use serde_json::Value;
use std::future::Future;

/// Follows `next_cursor` until `has_more` is false, collecting every result.
///
/// A page that keeps failing after its retries fails the whole listing.
pub async fn fetch_all_pages<F, Fut>(
    label: &str,
    policy: &RetryPolicy,
    fetch_page: F,
) -> Result<Vec<Value>, AppError>
where
    F: Fn(Option<String>) -> Fut,
    Fut: Future<Output = Result<RecordPage, AppError>>,
{
    let mut results = Vec::new();
    let mut cursor: Option<String> = None;
    let mut pages = 0usize;

    loop {
        let page = retry_with_backoff(
            || fetch_page(cursor.clone()),
            policy,
            log_retry::<AppError>(label),
        )
        .await?;
        pages += 1;

        results.extend(page.results);
        match page.next_cursor {
            Some(next) if page.has_more => cursor = Some(next),
            _ => break,
        }
    }

    log::debug!("{}: {} results over {} pages", label, results.len(), pages);
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::PaginatedResponse;
    use crate::error::TransportErrorKind;
    use serde_json::json;
    use std::sync::Mutex;

    #[tokio::test(start_paused = true)]
    async fn follows_cursors_and_retries_single_pages() {
        let seen = Mutex::new(Vec::new());
        let failed_once = Mutex::new(false);

        let results = fetch_all_pages("test listing", &RetryPolicy::default(), |cursor| {
            seen.lock().unwrap().push(cursor.clone());
            let fail = cursor.as_deref() == Some("p2")
                && !std::mem::replace(&mut *failed_once.lock().unwrap(), true);
            async move {
                if fail {
                    return Err(AppError::Transport {
                        kind: TransportErrorKind::ConnectionReset,
                        message: "reset".to_string(),
                    });
                }
                Ok(match cursor.as_deref() {
                    None => PaginatedResponse::with_more(vec![json!(1), json!(2)], "p2"),
                    Some("p2") => PaginatedResponse::last(vec![json!(3)]),
                    Some(other) => panic!("unexpected cursor {}", other),
                })
            }
        })
        .await
        .unwrap();

        assert_eq!(results, vec![json!(1), json!(2), json!(3)]);
        assert_eq!(
            *seen.lock().unwrap(),
            vec![None, Some("p2".to_string()), Some("p2".to_string())]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn fatal_page_errors_fail_the_listing() {
        let result = fetch_all_pages("test listing", &RetryPolicy::default(), |_| async {
            Err::<RecordPage, _>(AppError::MalformedResponse("nope".to_string()))
        })
        .await;
        assert!(matches!(result, Err(AppError::MalformedResponse(_))));
    }
}

//! Panic isolation for backend calls
//!
//! A panicking backend must not take the service down. Futures are wrapped
//! in `AssertUnwindSafe` and polled through `FutureExt::catch_unwind`, so a
//! panic during creation or any poll becomes [`PhonemizerError::BackendPanic`].
//!
//! `catch_unwind` does not see aborts, so the crate must not be built with
//! `panic = "abort"`.

use futures::FutureExt;
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;

use crate::errors::{PhonemizerError, PhonemizerResult};

/// Await a backend future, converting a panic into an error
pub async fn call_isolated<F, T>(backend: &str, future: F) -> PhonemizerResult<T>
where
    F: Future<Output = PhonemizerResult<T>>,
{
    match AssertUnwindSafe(future).catch_unwind().await {
        Ok(result) => result,
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            tracing::error!(backend = %backend, message = %message, "Backend panicked");
            Err(PhonemizerError::BackendPanic(format!("{backend}: {message}")))
        }
    }
}

/// Best-effort text of a panic payload
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic (non-string payload)".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_success_passes_through() {
        let result = call_isolated("test", async { Ok::<_, PhonemizerError>(42) }).await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_error_passes_through() {
        let result: PhonemizerResult<i32> =
            call_isolated("test", async { Err(PhonemizerError::Cancelled) }).await;
        assert!(matches!(result, Err(PhonemizerError::Cancelled)));
    }

    #[tokio::test]
    async fn test_panic_str_is_caught() {
        let result: PhonemizerResult<i32> = call_isolated("test", async {
            panic!("static message");
            #[allow(unreachable_code)]
            Ok(0)
        })
        .await;
        match result {
            Err(PhonemizerError::BackendPanic(msg)) => {
                assert!(msg.contains("static message"));
                assert!(msg.starts_with("test:"));
            }
            other => panic!("Expected BackendPanic, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_panic_string_is_caught() {
        let result: PhonemizerResult<i32> = call_isolated("test", async {
            panic!("{}", "dynamic message".to_string());
            #[allow(unreachable_code)]
            Ok(0)
        })
        .await;
        assert!(
            matches!(result, Err(PhonemizerError::BackendPanic(msg)) if msg.contains("dynamic message"))
        );
    }

    #[test]
    fn test_panic_message_fallback() {
        let payload: Box<dyn Any + Send> = Box::new(7u32);
        assert!(panic_message(payload.as_ref()).contains("unknown panic"));
    }
}

//! Scoped staging of a file in external storage.
//!
//! The asynchronous text job can only read documents by reference, so the
//! proof of residence is put into the staging bucket for the job's lifetime.
//! [`with_staged_object`] owns that lifetime: the object is deleted once the
//! body finishes, whether it returned `Ok`, returned `Err`, or panicked.

use crate::error::IdCheckError;
use crate::services::{ObjectStager, StagedObjectRef};
use futures::FutureExt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use tracing::{debug, warn};
use uuid::Uuid;

/// A fresh, collision-free key under `prefix`.
pub fn staging_key(prefix: &str, extension: &str) -> String {
    format!("{}{}.{}", prefix, Uuid::new_v4(), extension)
}

/// Put `bytes` under `key`, run `body` with the staged reference, then
/// delete the object.
///
/// A failed delete is logged and does not replace the body's result; the
/// body's panic, if any, is resumed after the delete.
pub async fn with_staged_object<T, F, Fut>(
    stager: &dyn ObjectStager,
    key: &str,
    bytes: Vec<u8>,
    body: F,
) -> Result<T, IdCheckError>
where
    F: FnOnce(StagedObjectRef) -> Fut,
    Fut: Future<Output = Result<T, IdCheckError>>,
{
    let object = stager.put(key, bytes).await?;
    debug!("Staged {}/{}", object.bucket, object.key);

    let outcome = AssertUnwindSafe(body(object.clone())).catch_unwind().await;

    match stager.delete(&object).await {
        Ok(()) => debug!("Deleted staged {}/{}", object.bucket, object.key),
        Err(e) => warn!("Failed to delete staged object {}: {}", object.key, e),
    }

    match outcome {
        Ok(result) => result,
        Err(panic) => std::panic::resume_unwind(panic),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemoryStager {
        live: Mutex<Vec<String>>,
        deleted: Mutex<Vec<String>>,
        fail_delete: bool,
    }

    #[async_trait]
    impl ObjectStager for MemoryStager {
        async fn put(&self, key: &str, _bytes: Vec<u8>) -> Result<StagedObjectRef, IdCheckError> {
            self.live.lock().unwrap().push(key.to_string());
            Ok(StagedObjectRef {
                bucket: "staging".into(),
                key: key.to_string(),
            })
        }

        async fn delete(&self, object: &StagedObjectRef) -> Result<(), IdCheckError> {
            if self.fail_delete {
                return Err(IdCheckError::Staging {
                    key: object.key.clone(),
                    detail: "AccessDenied".into(),
                });
            }
            self.live.lock().unwrap().retain(|k| k != &object.key);
            self.deleted.lock().unwrap().push(object.key.clone());
            Ok(())
        }
    }

    #[test]
    fn key_has_prefix_and_extension() {
        let a = staging_key("idcheck-tmp/", "pdf");
        let b = staging_key("idcheck-tmp/", "pdf");
        assert!(a.starts_with("idcheck-tmp/"));
        assert!(a.ends_with(".pdf"));
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn deleted_after_success() {
        let stager = MemoryStager::default();
        let result = with_staged_object(&stager, "k.pdf", vec![1, 2, 3], |object| async move {
            assert_eq!(object.key, "k.pdf");
            Ok::<_, IdCheckError>(42)
        })
        .await
        .unwrap();

        assert_eq!(result, 42);
        assert!(stager.live.lock().unwrap().is_empty());
        assert_eq!(*stager.deleted.lock().unwrap(), vec!["k.pdf"]);
    }

    #[tokio::test]
    async fn deleted_after_error() {
        let stager = MemoryStager::default();
        let err = with_staged_object(&stager, "k.pdf", vec![], |_| async {
            Err::<(), _>(IdCheckError::TextDetection {
                detail: "InvalidS3ObjectException".into(),
            })
        })
        .await
        .unwrap_err();

        assert!(err.to_string().contains("InvalidS3ObjectException"));
        assert!(stager.live.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn deleted_after_panic() {
        let stager = MemoryStager::default();
        let caught = AssertUnwindSafe(with_staged_object(&stager, "k.pdf", vec![], |_| async {
            if stager.live.lock().unwrap().len() == 1 {
                panic!("boom");
            }
            Ok::<(), IdCheckError>(())
        }))
        .catch_unwind()
        .await;

        assert!(caught.is_err());
        assert!(stager.live.lock().unwrap().is_empty());
        assert_eq!(stager.deleted.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn failed_delete_keeps_body_result() {
        let stager = MemoryStager {
            fail_delete: true,
            ..Default::default()
        };
        let result = with_staged_object(&stager, "k.pdf", vec![], |_| async {
            Ok::<_, IdCheckError>("done")
        })
        .await
        .unwrap();
        assert_eq!(result, "done");
    }

    #[tokio::test]
    async fn put_failure_skips_body() {
        struct RefusingStager;

        #[async_trait]
        impl ObjectStager for RefusingStager {
            async fn put(&self, key: &str, _bytes: Vec<u8>) -> Result<StagedObjectRef, IdCheckError> {
                Err(IdCheckError::Staging {
                    key: key.to_string(),
                    detail: "NoSuchBucket".into(),
                })
            }

            async fn delete(&self, _object: &StagedObjectRef) -> Result<(), IdCheckError> {
                panic!("nothing was staged")
            }
        }

        let err = with_staged_object(&RefusingStager, "k.pdf", vec![], |_| async {
            Err::<(), _>(IdCheckError::Internal("body ran".into()))
        })
        .await
        .unwrap_err();
        assert!(matches!(err, IdCheckError::Staging { .. }), "got: {err}");
        assert!(err.to_string().contains("NoSuchBucket"));
    }
}

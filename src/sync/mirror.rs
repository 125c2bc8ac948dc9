//! Destinations that sync events are copied to.

use std::{future::Future, sync::Arc, time::Duration};

use reqwest::{Response, StatusCode};
use serde::Deserialize;

use crate::{
    Error,
    storage::Storage,
    sync::SyncEvent,
    transaction::{BUCKET_NOT_FOUND_MESSAGE, DeleteTransactionRequest, TransactionStore},
};

/// How long the HTTP mirror waits for a response before giving up on an attempt.
const MIRROR_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// A non-authoritative copy of the transaction store.
pub trait Mirror: Send + Sync {
    /// Apply `event` to the mirror.
    ///
    /// Removing a transaction that the mirror does not have must succeed, and
    /// applying the same append twice must store the transaction once.
    fn apply(&self, event: &SyncEvent) -> impl Future<Output = Result<(), Error>> + Send;
}

/// Mirrors to the `/api/transactions` endpoint of a mirror server.
#[derive(Debug, Clone)]
pub struct HttpMirror {
    client: reqwest::Client,
    url: String,
}

impl HttpMirror {
    /// Create a mirror that sends requests to `url`, e.g.
    /// `http://localhost:3000/api/transactions`.
    ///
    /// # Errors
    /// Returns an [Error::MirrorError] if the HTTP client cannot be created.
    pub fn new(url: &str) -> Result<Self, Error> {
        let client = reqwest::Client::builder()
            .timeout(MIRROR_REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            url: url.to_owned(),
        })
    }
}

impl Mirror for HttpMirror {
    async fn apply(&self, event: &SyncEvent) -> Result<(), Error> {
        let response = match event {
            SyncEvent::Append(transaction) => {
                self.client.post(&self.url).json(transaction).send().await?
            }
            SyncEvent::Remove {
                date,
                transaction_id,
            } => {
                let request = DeleteTransactionRequest {
                    date: *date,
                    transaction_id: transaction_id.clone(),
                };
                self.client.delete(&self.url).json(&request).send().await?
            }
        };

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        if matches!(event, SyncEvent::Remove { .. })
            && status == StatusCode::NOT_FOUND
            && is_missing_bucket(response).await
        {
            tracing::debug!(
                "mirror has no bucket for {}, treating as deleted",
                event.describe()
            );
            return Ok(());
        }

        Err(Error::MirrorError(format!(
            "mirror responded with {status} to {}",
            event.describe()
        )))
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// Whether a 404 came from the delete endpoint rather than from an unknown route.
async fn is_missing_bucket(response: Response) -> bool {
    match response.json::<ErrorBody>().await {
        Ok(body) => body.error == BUCKET_NOT_FOUND_MESSAGE,
        Err(_) => false,
    }
}

/// Mirrors directly into another [Storage], such as a [crate::DirectoryStorage].
#[derive(Clone)]
pub struct StorageMirror {
    transactions: TransactionStore,
}

impl StorageMirror {
    /// Create a mirror that writes buckets to `storage`.
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self {
            transactions: TransactionStore::new(storage),
        }
    }
}

impl Mirror for StorageMirror {
    async fn apply(&self, event: &SyncEvent) -> Result<(), Error> {
        let transactions = self.transactions.clone();
        let event = event.clone();

        tokio::task::spawn_blocking(move || match event {
            SyncEvent::Append(transaction) => {
                transactions.append_if_absent(transaction).map(|_| ())
            }
            SyncEvent::Remove {
                date,
                transaction_id,
            } => match transactions.remove_by_id(date, &transaction_id) {
                Err(Error::NotFound) => Ok(()),
                result => result,
            },
        })
        .await
        .map_err(|error| Error::MirrorError(error.to_string()))?
    }
}

use std::time::{Duration, Instant};

use futures::future::BoxFuture;
use mongodb::{
    ClientSession,
    error::{TRANSIENT_TRANSACTION_ERROR, UNKNOWN_TRANSACTION_COMMIT_RESULT},
};

use mongolayer_core::{
    document::Document as StoredDocument,
    error::{DocumentStoreError, DocumentStoreResult},
};

use crate::{client::MongoClient, repository::Repository};

/// How long a transaction keeps being retried after its first attempt started.
pub const TRANSACTION_RETRY_TIMEOUT: Duration = Duration::from_secs(120);

/// Runs callbacks inside client sessions and transactions.
///
/// Transactions require a replica set or sharded cluster.
///
/// # Example
///
/// ```ignore
/// use futures::FutureExt;
///
/// let transactions = TransactionManager::new(&client);
/// let users = Repository::<User>::new(&client);
///
/// transactions
///     .with_transaction(|session| {
///         let users = users.clone();
///         async move {
///             let mut alice = User::new("alice");
///             users.in_session(session).insert_one(&mut alice).await
///         }
///         .boxed()
///     })
///     .await?;
/// ```
#[derive(Debug, Clone)]
pub struct TransactionManager {
    client: MongoClient,
}

impl TransactionManager {
    pub fn new(client: &MongoClient) -> Self {
        Self { client: client.clone() }
    }

    /// Runs `callback` in a transaction and commits it.
    ///
    /// If the callback fails the transaction is aborted. A callback error that is
    /// [transient](DocumentStoreError::is_transient) restarts the whole transaction, and a
    /// commit whose outcome is unknown is committed again, both until
    /// [`TRANSACTION_RETRY_TIMEOUT`] has passed. The callback may therefore run more than
    /// once.
    pub async fn with_transaction<R, F>(&self, mut callback: F) -> DocumentStoreResult<R>
    where
        F: for<'s> FnMut(&'s mut ClientSession) -> BoxFuture<'s, DocumentStoreResult<R>>,
    {
        let mut session = self.start_session().await?;
        let started = Instant::now();

        'transaction: loop {
            session
                .start_transaction()
                .await
                .map_err(|e| DocumentStoreError::Transaction(format!("failed to start transaction: {e}")))?;

            let output = match callback(&mut session).await {
                Ok(output) => output,
                Err(err) => {
                    // The server may already have aborted it.
                    if let Err(abort) = session.abort_transaction().await {
                        tracing::debug!(error = %abort, "abort failed");
                    }

                    if callback_retry(&err, started.elapsed()) == RetryAction::RestartTransaction {
                        tracing::debug!(error = %err, "retrying transaction after transient error");
                        continue 'transaction;
                    }
                    return Err(err);
                }
            };

            loop {
                let err = match session.commit_transaction().await {
                    Ok(()) => return Ok(output),
                    Err(err) => err,
                };

                match commit_retry(|label| err.contains_label(label), started.elapsed()) {
                    RetryAction::RetryCommit => {
                        tracing::debug!(error = %err, "retrying commit with unknown result");
                        continue;
                    }
                    RetryAction::RestartTransaction => {
                        tracing::debug!(error = %err, "retrying transaction after transient commit error");
                        continue 'transaction;
                    }
                    RetryAction::GiveUp => {
                        tracing::warn!(error = %err, "transaction commit failed");
                        return Err(DocumentStoreError::Transaction(format!(
                            "failed to commit transaction: {err}"
                        )));
                    }
                }
            }
        }
    }

    /// Runs `callback` with a fresh session and no transaction.
    pub async fn with_session<R, F>(&self, callback: F) -> DocumentStoreResult<R>
    where
        F: for<'s> FnOnce(&'s mut ClientSession) -> BoxFuture<'s, DocumentStoreResult<R>>,
    {
        let mut session = self.start_session().await?;
        callback(&mut session).await
    }

    async fn start_session(&self) -> DocumentStoreResult<ClientSession> {
        self.client
            .raw()
            .start_session()
            .await
            .map_err(|e| DocumentStoreError::Transaction(format!("failed to start session: {e}")))
    }
}

/// What to do after a failed transaction attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RetryAction {
    RestartTransaction,
    RetryCommit,
    GiveUp,
}

/// Decides on a callback failure that happened `elapsed` after the first attempt.
fn callback_retry(err: &DocumentStoreError, elapsed: Duration) -> RetryAction {
    if err.is_transient() && elapsed < TRANSACTION_RETRY_TIMEOUT {
        RetryAction::RestartTransaction
    } else {
        RetryAction::GiveUp
    }
}

/// Decides on a commit failure carrying the error labels reported by `has_label`.
///
/// An unknown commit result takes precedence: the commit may have applied, so only the
/// commit is repeated.
fn commit_retry(has_label: impl Fn(&str) -> bool, elapsed: Duration) -> RetryAction {
    if elapsed >= TRANSACTION_RETRY_TIMEOUT {
        RetryAction::GiveUp
    } else if has_label(UNKNOWN_TRANSACTION_COMMIT_RESULT) {
        RetryAction::RetryCommit
    } else if has_label(TRANSIENT_TRANSACTION_ERROR) {
        RetryAction::RestartTransaction
    } else {
        RetryAction::GiveUp
    }
}

/// A [`Repository`] paired with a [`TransactionManager`].
///
/// The callback receives the session and a handle to the repository; bind them with
/// [`Repository::in_session`].
#[derive(Debug)]
pub struct TransactionalRepository<T: StoredDocument> {
    repository: Repository<T>,
    transactions: TransactionManager,
}

impl<T: StoredDocument> TransactionalRepository<T> {
    pub fn new(client: &MongoClient) -> Self {
        Self {
            repository: Repository::new(client),
            transactions: TransactionManager::new(client),
        }
    }

    pub fn repository(&self) -> &Repository<T> {
        &self.repository
    }

    /// See [`TransactionManager::with_transaction`].
    pub async fn with_transaction<R, F>(&self, mut callback: F) -> DocumentStoreResult<R>
    where
        F: for<'s> FnMut(&'s mut ClientSession, Repository<T>) -> BoxFuture<'s, DocumentStoreResult<R>>,
    {
        let repository = &self.repository;

        self.transactions
            .with_transaction(|session| callback(session, repository.clone()))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const EARLY: Duration = Duration::from_secs(1);

    fn labels(present: &'static [&'static str]) -> impl Fn(&str) -> bool {
        move |label| present.iter().any(|present| *present == label)
    }

    #[test]
    fn transient_callback_error_restarts_transaction() {
        let err = DocumentStoreError::TransientTransaction("write conflict".into());

        assert_eq!(callback_retry(&err, EARLY), RetryAction::RestartTransaction);
    }

    #[test]
    fn other_callback_errors_are_returned() {
        let err = DocumentStoreError::InvalidDocument("bad".into());

        assert_eq!(callback_retry(&err, EARLY), RetryAction::GiveUp);
    }

    #[test]
    fn transient_callback_error_after_timeout_is_returned() {
        let err = DocumentStoreError::TransientTransaction("write conflict".into());

        assert_eq!(callback_retry(&err, TRANSACTION_RETRY_TIMEOUT), RetryAction::GiveUp);
    }

    #[test]
    fn unknown_commit_result_retries_commit() {
        assert_eq!(
            commit_retry(labels(&[UNKNOWN_TRANSACTION_COMMIT_RESULT]), EARLY),
            RetryAction::RetryCommit,
        );
        assert_eq!(
            commit_retry(labels(&[UNKNOWN_TRANSACTION_COMMIT_RESULT, TRANSIENT_TRANSACTION_ERROR]), EARLY),
            RetryAction::RetryCommit,
        );
    }

    #[test]
    fn transient_commit_error_restarts_transaction() {
        assert_eq!(
            commit_retry(labels(&[TRANSIENT_TRANSACTION_ERROR]), EARLY),
            RetryAction::RestartTransaction,
        );
    }

    #[test]
    fn unlabelled_or_late_commit_errors_give_up() {
        assert_eq!(commit_retry(labels(&[]), EARLY), RetryAction::GiveUp);
        assert_eq!(
            commit_retry(labels(&[UNKNOWN_TRANSACTION_COMMIT_RESULT]), TRANSACTION_RETRY_TIMEOUT),
            RetryAction::GiveUp,
        );
    }
}

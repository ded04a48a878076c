use crate::backend::StorageAdapter;
use crate::error::{ErrorKind, Result};
use crate::key::ContentKey;
use crate::models::ResourceContent;

/// A queued content change.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    Save(Box<ResourceContent>),
    Delete(ContentKey),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Open,
    Committed,
    RolledBack,
}

/// Queue of content changes applied atomically on [`commit`](Self::commit).
///
/// Once committed or rolled back, every further call fails with
/// [`TransactionClosed`](ErrorKind::TransactionClosed).
pub struct Transaction<'a> {
    storage: &'a dyn StorageAdapter,
    operations: Vec<Operation>,
    state: State,
}
impl<'a> Transaction<'a> {
    pub fn new(storage: &'a dyn StorageAdapter) -> Self {
        Self { storage, operations: Vec::new(), state: State::Open }
    }

    fn ensure_open(&self) -> Result<()> {
        match self.state {
            State::Open => Ok(()),
            State::Committed => exn::bail!(ErrorKind::TransactionClosed("committed")),
            State::RolledBack => exn::bail!(ErrorKind::TransactionClosed("rolled back")),
        }
    }

    pub fn save(&mut self, content: ResourceContent) -> Result<()> {
        self.ensure_open()?;
        self.operations.push(Operation::Save(Box::new(content)));
        Ok(())
    }

    pub fn delete(&mut self, key: ContentKey) -> Result<()> {
        self.ensure_open()?;
        self.operations.push(Operation::Delete(key));
        Ok(())
    }

    /// Number of queued operations.
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Apply every queued operation in one atomic batch.
    ///
    /// The transaction is closed even if applying fails; start a new one to
    /// retry.
    pub async fn commit(&mut self) -> Result<()> {
        self.ensure_open()?;
        self.state = State::Committed;
        let operations = std::mem::take(&mut self.operations);
        if operations.is_empty() {
            return Ok(());
        }
        self.storage.apply(operations).await
    }

    /// Discard every queued operation.
    pub fn rollback(&mut self) -> Result<()> {
        self.ensure_open()?;
        self.state = State::RolledBack;
        self.operations.clear();
        Ok(())
    }
}
impl Drop for Transaction<'_> {
    fn drop(&mut self) {
        if self.state == State::Open && !self.operations.is_empty() {
            tracing::debug!(
                storage = self.storage.name(),
                operations = self.operations.len(),
                "Transaction dropped without commit; discarding queued operations"
            );
        }
    }
}

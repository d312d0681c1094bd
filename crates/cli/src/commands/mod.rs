//! Command implementations.
//!
//! Every command runs against a [`Session`]: the cart restored from the data
//! directory, with persistence attached so changes are written back before the
//! process exits.

pub mod cart;
pub mod checkout;

use paradise_nursery_cart::{
    CartPersistence, CartStore, CheckoutError, FileStore, PersistenceHandle, ValidationError,
};
use thiserror::Error;

use crate::config::CliConfig;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Core(#[from] paradise_nursery_cart::Error),

    /// Output could not be rendered.
    #[error("Failed to render output: {0}")]
    Output(#[from] serde_json::Error),
}

impl CommandError {
    /// Stable error code for logs and error tracking.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Core(e) => e.code(),
            Self::Output(_) => "OUTPUT_ERROR",
        }
    }

    /// Returns `true` if the user can fix the problem by changing their input.
    #[must_use]
    pub const fn is_user_error(&self) -> bool {
        match self {
            Self::Core(e) => e.is_user_error(),
            Self::Output(_) => false,
        }
    }
}

impl From<ValidationError> for CommandError {
    fn from(err: ValidationError) -> Self {
        Self::Core(err.into())
    }
}

impl From<CheckoutError> for CommandError {
    fn from(err: CheckoutError) -> Self {
        Self::Core(err.into())
    }
}

/// The persisted cart for one CLI invocation.
pub struct Session {
    pub store: CartStore,
    persistence: PersistenceHandle,
}

impl Session {
    /// Restore the cart from `config.data_dir` and start mirroring changes.
    pub fn open(config: &CliConfig) -> Self {
        let persistence = CartPersistence::new(FileStore::new(&config.data_dir));
        let mut store = CartStore::new();
        persistence.hydrate(&mut store);
        let handle = persistence.attach(&mut store);
        Self {
            store,
            persistence: handle,
        }
    }

    /// Wait for pending writes, then stop persistence.
    pub async fn close(self) {
        self.persistence.shutdown().await;
    }
}

use mongodb::error::{Error as DriverError, TRANSIENT_TRANSACTION_ERROR};

use mongolayer_core::error::DocumentStoreError;

/// Converts a driver error, keeping the transient transaction label visible to callers.
pub(crate) fn map_driver_error(err: DriverError) -> DocumentStoreError {
    if err.contains_label(TRANSIENT_TRANSACTION_ERROR) {
        DocumentStoreError::TransientTransaction(err.to_string())
    } else {
        DocumentStoreError::Backend(err.to_string())
    }
}

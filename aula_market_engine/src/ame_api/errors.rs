use thiserror::Error;

use crate::traits::{MarketDbError, OrderQueryError};

#[derive(Debug, Clone, Error)]
pub enum OrderManagerError {
    #[error("Could not complete the order flow. {0}")]
    BackendError(#[from] MarketDbError),
    #[error("{0}")]
    QueryError(#[from] OrderQueryError),
    #[error("The requested order {0} does not exist")]
    OrderNotFound(i64),
    #[error("You do not have permission to view this order")]
    Forbidden,
}

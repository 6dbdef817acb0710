use fedinbox_http::HttpError;
use thiserror::Error;

use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Gateway(#[from] HttpError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("a favorite request for post {0} is already in flight")]
    Busy(String),

    #[error("unknown post {0}")]
    UnknownPost(String),
}

impl ClientError {
    /// Short reason suitable for showing to the viewer. For gateway errors
    /// this is the gateway's own `error` string.
    pub fn reason(&self) -> String {
        match self {
            ClientError::Gateway(HttpError::Api { message, .. }) => message.clone(),
            other => other.to_string(),
        }
    }
}

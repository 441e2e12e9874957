use neura_qbft::QbftError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum QbftServiceError {
    #[error("QBFT engine error: {0}")]
    Engine(#[from] QbftError),
    #[error("No tokio runtime available: {0}")]
    NoRuntime(String),
    #[error("Channel closed: {0}")]
    ChannelClosed(&'static str),
}

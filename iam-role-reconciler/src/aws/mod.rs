//! AWS SDK integration: IAM client wrapper.

pub mod iam_client;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AwsError {
    #[error("IAM client error: {0}")]
    IamError(String),
    #[error("Policy document error: {0}")]
    PolicyError(String),
}

pub type AwsResult<T> = Result<T, AwsError>;

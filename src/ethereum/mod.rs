pub mod abi;
pub mod chains;
pub mod contract;
pub mod provider;
pub mod transfer;
pub mod utils;
pub mod wallet;

use serde::{Deserialize, Serialize};

/// A signed write call accepted by the endpoint. The receipt is not
/// awaited at this layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WriteSubmission {
    pub hash: String,
    pub from: String,
    pub chain_id: u64,
}

use async_trait::async_trait;
use crate::models::{SwapContext, SwapRecord};
use crate::notifications::NotifyError;

/// Delivery endpoint for detected swaps
#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    async fn dispatch(
        &self,
        address: &str,
        swap: &SwapRecord,
        context: &SwapContext,
    ) -> Result<(), NotifyError>;
}

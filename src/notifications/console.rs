use crate::models::{SwapContext, SwapRecord};
use crate::notifications::template::render_swap_summary;
use crate::notifications::NotifyError;
use crate::traits::NotificationDispatcher;
use async_trait::async_trait;
use tracing::info;

/// Writes swaps to the log; used when no chat delivery is configured.
pub struct ConsoleNotifier;

#[async_trait]
impl NotificationDispatcher for ConsoleNotifier {
    async fn dispatch(
        &self,
        address: &str,
        swap: &SwapRecord,
        context: &SwapContext,
    ) -> Result<(), NotifyError> {
        info!("{}", render_swap_summary(address, swap, context));
        Ok(())
    }
}

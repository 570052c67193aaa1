//! Order, shipping and returns questions.

use async_trait::async_trait;

use super::{HandlerReply, QueryHandler};
use crate::context::ConversationContext;

pub const AGENT: &str = "order_support";

const TRACKING: &str = "You can track your order by logging into your account and opening the \
'My Orders' section. If you need further assistance, please provide your order number.";
const RETURNS: &str = "To start a return or refund, please visit our returns page or contact \
customer service at 1-800-123-4567.";
const CANCELLATION: &str = "Orders can be cancelled before they ship. Please call our support line \
right away to request a cancellation.";
const GENERAL: &str = "For questions about ordering, shipping or returns, please visit our support \
centre or call us for assistance.";

/// Canned order-support answers keyed on the query's wording.
#[derive(Debug, Default, Clone, Copy)]
pub struct OrderSupportResolver;

impl OrderSupportResolver {
    pub fn new() -> Self {
        Self
    }

    pub fn answer(&self, query: &str) -> &'static str {
        let q = query.to_lowercase();
        if q.contains("status") || q.contains("track") {
            TRACKING
        } else if q.contains("return") || q.contains("refund") {
            RETURNS
        } else if q.contains("cancel") {
            CANCELLATION
        } else {
            GENERAL
        }
    }
}

#[async_trait]
impl QueryHandler for OrderSupportResolver {
    fn name(&self) -> &'static str {
        AGENT
    }

    async fn handle(&self, query: &str, _context: &ConversationContext) -> HandlerReply {
        HandlerReply::new(self.answer(query), AGENT)
    }
}

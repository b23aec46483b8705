pub mod address;
pub mod order_status;

pub use address::ShippingAddress;
pub use order_status::{FulfillmentStatus, OrderSource, PaymentStatus};

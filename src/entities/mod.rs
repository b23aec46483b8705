pub mod kv_entry;
pub mod order;
pub mod order_item;

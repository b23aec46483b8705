//! Permission names granted to staff members.

/// Common permission string constants for compile-time safety
pub mod consts {
    // Orders
    pub const ORDERS_READ: &str = "orders:read";
    pub const ORDERS_CREATE: &str = "orders:create";
    pub const ORDERS_UPDATE: &str = "orders:update";

    // PRT requests
    pub const REQUESTS_SUBMIT: &str = "requests:submit";
    pub const REQUESTS_MANAGE: &str = "requests:manage";
}

/// Permissions every staff member holds.
pub const STAFF_PERMISSIONS: &[&str] = &[
    consts::ORDERS_READ,
    consts::ORDERS_CREATE,
    consts::ORDERS_UPDATE,
    consts::REQUESTS_SUBMIT,
];

/// Extra permissions of the designated PRT request recipients.
pub const RECIPIENT_PERMISSIONS: &[&str] = &[consts::REQUESTS_MANAGE];

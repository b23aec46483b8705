use crate::{
    db::DbPool,
    entities::order::{self, ActiveModel as OrderActiveModel, Entity as OrderEntity, Model as OrderModel},
    entities::order_item::{self, Entity as OrderItemEntity, Model as OrderItemModel},
    errors::ServiceError,
    models::{FulfillmentStatus, OrderSource, PaymentStatus, ShippingAddress},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

const SAMPLE_ITEM_NAME: &str = "Sample T-shirt";
const SAMPLE_ITEM_SKU: &str = "SAMPLE-TEE";

/// Rounds a money amount to cents with a fixed scale of 2.
pub fn money(amount: Decimal) -> Decimal {
    let mut rounded = amount.round_dp(2);
    rounded.rescale(2);
    rounded
}

/// Appends `line` to existing notes, one line per entry.
pub fn append_note(existing: Option<&str>, line: &str) -> String {
    match existing {
        Some(notes) if !notes.is_empty() => format!("{}\n{}", notes, line),
        _ => line.to_string(),
    }
}

/// Unit price times quantity, or `None` when the product does not fit a `Decimal`.
fn line_total(unit_price: Decimal, quantity: i32) -> Option<Decimal> {
    unit_price.checked_mul(Decimal::from(quantity))
}

fn generate_order_number() -> String {
    let hex = Uuid::new_v4().simple().to_string();
    format!("ORD-{}", hex[..8].to_uppercase())
}

/// One line of an order as returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct OrderItemView {
    pub id: Uuid,
    pub position: i32,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    pub quantity: i32,
    #[schema(value_type = String, example = "20.00")]
    pub unit_price: Decimal,
    #[schema(value_type = String, example = "20.00")]
    pub line_total: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl From<OrderItemModel> for OrderItemView {
    fn from(item: OrderItemModel) -> Self {
        Self {
            id: item.id,
            position: item.position,
            name: item.name,
            sku: item.sku,
            quantity: item.quantity,
            unit_price: money(item.unit_price),
            line_total: money(line_total(item.unit_price, item.quantity).unwrap_or(Decimal::MAX)),
            image_url: item.image_url,
        }
    }
}

/// An order with its line items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct OrderDetail {
    pub id: Uuid,
    pub order_number: String,
    #[serde(rename = "status")]
    pub fulfillment_status: FulfillmentStatus,
    pub payment_status: PaymentStatus,
    pub source: OrderSource,
    #[schema(value_type = String, example = "20.00")]
    pub subtotal: Decimal,
    #[schema(value_type = String, example = "0.00")]
    pub shipping: Decimal,
    #[schema(value_type = String, example = "0.00")]
    pub tax: Decimal,
    #[schema(value_type = String, example = "20.00")]
    pub total: Decimal,
    pub currency: String,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: Option<String>,
    pub shipping_address: Option<ShippingAddress>,
    pub notes: Option<String>,
    pub items: Vec<OrderItemView>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OrderDetail {
    fn from_parts(order: OrderModel, items: Vec<OrderItemModel>) -> Self {
        Self {
            id: order.id,
            order_number: order.order_number,
            fulfillment_status: order.fulfillment_status,
            payment_status: order.payment_status,
            source: order.source,
            subtotal: money(order.subtotal),
            shipping: money(order.shipping),
            tax: money(order.tax),
            total: money(order.total),
            currency: order.currency,
            customer_name: order.customer_name,
            customer_email: order.customer_email,
            customer_phone: order.customer_phone,
            shipping_address: ShippingAddress::from_stored(order.shipping_address.as_deref()),
            notes: order.notes,
            items: items.into_iter().map(OrderItemView::from).collect(),
            created_at: order.created_at,
            updated_at: order.updated_at,
        }
    }
}

/// Partial update of an order. Absent fields are left untouched; an empty
/// `notes` string clears the notes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct OrderPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<FulfillmentStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_status: Option<PaymentStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 20000, message = "Notes are limited to 20000 characters"))]
    pub notes: Option<String>,
}

impl OrderPatch {
    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.payment_status.is_none() && self.notes.is_none()
    }
}

/// Status change pushed by the fulfillment system.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct FulfillmentEvent {
    pub status: FulfillmentStatus,
    #[serde(default)]
    #[validate(length(min = 1, max = 2000))]
    pub note: Option<String>,
}

/// Line of an order arriving from an external source.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct ImportOrderItem {
    #[validate(length(min = 1, max = 255, message = "Item name is required"))]
    pub name: String,
    #[serde(default)]
    pub sku: Option<String>,
    #[validate(range(min = 1, max = 100000, message = "Quantity must be positive"))]
    pub quantity: u32,
    #[validate(custom = "validate_non_negative")]
    #[schema(value_type = String, example = "12.50")]
    pub unit_price: Decimal,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// Order arriving from an external source (web shop, marketplace).
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct ImportOrderRequest {
    #[validate(length(min = 1, max = 200, message = "Customer name is required"))]
    pub customer_name: String,
    #[validate(email(message = "Customer email must be valid"))]
    pub customer_email: String,
    #[serde(default)]
    pub customer_phone: Option<String>,
    #[serde(default)]
    pub shipping_address: Option<ShippingAddress>,
    #[validate(length(min = 1, message = "At least one item is required"))]
    #[validate]
    pub items: Vec<ImportOrderItem>,
    #[serde(default)]
    #[validate(custom = "validate_non_negative")]
    #[schema(value_type = Option<String>)]
    pub shipping: Option<Decimal>,
    #[serde(default)]
    #[validate(custom = "validate_non_negative")]
    #[schema(value_type = Option<String>)]
    pub tax: Option<Decimal>,
    #[serde(default)]
    #[validate(length(equal = 3, message = "Currency must be 3 characters"))]
    pub currency: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

fn validate_non_negative(amount: &Decimal) -> Result<(), ValidationError> {
    if amount.is_sign_negative() && !amount.is_zero() {
        let mut err = ValidationError::new("non_negative");
        err.message = Some("Amount must not be negative".into());
        return Err(err);
    }
    Ok(())
}

/// Filters for order listings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderFilter {
    pub status: Option<FulfillmentStatus>,
    pub payment_status: Option<PaymentStatus>,
}

struct NewItem {
    name: String,
    sku: Option<String>,
    quantity: i32,
    unit_price: Decimal,
    image_url: Option<String>,
}

#[derive(Default)]
struct NewOrder {
    customer_name: String,
    customer_email: String,
    customer_phone: Option<String>,
    shipping_address: Option<ShippingAddress>,
    items: Vec<NewItem>,
    shipping: Decimal,
    tax: Decimal,
    currency: Option<String>,
    notes: Option<String>,
}

impl NewOrder {
    /// Subtotal and total, or `None` if any step overflows.
    fn amounts(&self) -> Option<(Decimal, Decimal)> {
        let subtotal = self.items.iter().try_fold(Decimal::ZERO, |sum, item| {
            sum.checked_add(line_total(item.unit_price, item.quantity)?)
        })?;
        let total = subtotal.checked_add(self.shipping)?.checked_add(self.tax)?;
        Some((subtotal, total))
    }
}

/// Service for order intake, lookup and status updates
#[derive(Clone)]
pub struct OrderService {
    db_pool: Arc<DbPool>,
    default_currency: String,
}

impl OrderService {
    pub fn new(db_pool: Arc<DbPool>, default_currency: impl Into<String>) -> Self {
        Self {
            db_pool,
            default_currency: default_currency.into(),
        }
    }

    /// Creates an empty order with generated number and default statuses.
    #[instrument(skip(self))]
    pub async fn create_blank(&self) -> Result<OrderDetail, ServiceError> {
        self.insert_order(OrderSource::Manual, NewOrder::default())
            .await
    }

    /// Creates an order carrying one sample line, for trying out the dashboard.
    #[instrument(skip(self))]
    pub async fn create_test(&self) -> Result<OrderDetail, ServiceError> {
        let sample = NewOrder {
            items: vec![NewItem {
                name: SAMPLE_ITEM_NAME.to_string(),
                sku: Some(SAMPLE_ITEM_SKU.to_string()),
                quantity: 1,
                unit_price: Decimal::new(2000, 2),
                image_url: None,
            }],
            ..Default::default()
        };
        self.insert_order(OrderSource::Test, sample).await
    }

    /// Takes in an order from an external source.
    #[instrument(skip(self, request), fields(customer = %request.customer_name, items = request.items.len()))]
    pub async fn import(&self, request: ImportOrderRequest) -> Result<OrderDetail, ServiceError> {
        request.validate()?;

        let new_order = NewOrder {
            customer_name: request.customer_name.trim().to_string(),
            customer_email: request.customer_email.trim().to_string(),
            customer_phone: request.customer_phone,
            shipping_address: request.shipping_address,
            items: request
                .items
                .into_iter()
                .map(|item| {
                    // validated to 1..=100000 above
                    let quantity = i32::try_from(item.quantity).unwrap_or(i32::MAX);
                    NewItem {
                        name: item.name.trim().to_string(),
                        sku: item.sku,
                        quantity,
                        unit_price: item.unit_price,
                        image_url: item.image_url,
                    }
                })
                .collect(),
            shipping: request.shipping.unwrap_or_default(),
            tax: request.tax.unwrap_or_default(),
            currency: request.currency.map(|c| c.to_uppercase()),
            notes: request.notes.filter(|n| !n.trim().is_empty()),
        };
        self.insert_order(OrderSource::External, new_order).await
    }

    async fn insert_order(
        &self,
        source: OrderSource,
        new_order: NewOrder,
    ) -> Result<OrderDetail, ServiceError> {
        let db = &*self.db_pool;
        let now = Utc::now();
        let order_id = Uuid::new_v4();
        let order_number = generate_order_number();

        let (subtotal, total) = new_order.amounts().ok_or_else(|| {
            warn!(items = new_order.items.len(), "Order amounts overflow");
            ServiceError::ValidationError("Order amounts are too large".to_string())
        })?;

        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start transaction for order creation");
            ServiceError::DatabaseError(e)
        })?;

        let order_model = OrderActiveModel {
            id: Set(order_id),
            order_number: Set(order_number.clone()),
            fulfillment_status: Set(FulfillmentStatus::Intake),
            payment_status: Set(PaymentStatus::Pending),
            source: Set(source),
            subtotal: Set(money(subtotal)),
            shipping: Set(money(new_order.shipping)),
            tax: Set(money(new_order.tax)),
            total: Set(money(total)),
            currency: Set(new_order
                .currency
                .unwrap_or_else(|| self.default_currency.clone())),
            customer_name: Set(new_order.customer_name),
            customer_email: Set(new_order.customer_email),
            customer_phone: Set(new_order.customer_phone),
            shipping_address: Set(new_order
                .shipping_address
                .as_ref()
                .and_then(ShippingAddress::to_stored)),
            notes: Set(new_order.notes),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await
        .map_err(|e| {
            error!(error = %e, order_id = %order_id, "Failed to create order in database");
            ServiceError::DatabaseError(e)
        })?;

        let mut items = Vec::with_capacity(new_order.items.len());
        for (position, item) in new_order.items.into_iter().enumerate() {
            let inserted = order_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                order_id: Set(order_id),
                position: Set(position as i32),
                name: Set(item.name),
                sku: Set(item.sku),
                quantity: Set(item.quantity),
                unit_price: Set(money(item.unit_price)),
                image_url: Set(item.image_url),
                created_at: Set(now),
            }
            .insert(&txn)
            .await
            .map_err(|e| {
                error!(error = %e, order_id = %order_id, "Failed to create order item");
                ServiceError::DatabaseError(e)
            })?;
            items.push(inserted);
        }

        txn.commit().await.map_err(|e| {
            error!(error = %e, order_id = %order_id, "Failed to commit order creation transaction");
            ServiceError::DatabaseError(e)
        })?;

        info!(order_id = %order_id, order_number = %order_number, source = %source, "Order created");
        Ok(OrderDetail::from_parts(order_model, items))
    }

    /// Retrieves an order by ID
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn get(&self, order_id: Uuid) -> Result<OrderDetail, ServiceError> {
        let db = &*self.db_pool;
        let order = self.find_model(db, order_id).await?;
        let items = Self::load_items(db, order.id).await?;
        Ok(OrderDetail::from_parts(order, items))
    }

    /// Retrieves an order by its human-facing number
    #[instrument(skip(self))]
    pub async fn get_by_number(&self, order_number: &str) -> Result<OrderDetail, ServiceError> {
        let db = &*self.db_pool;
        let order = OrderEntity::find()
            .filter(order::Column::OrderNumber.eq(order_number))
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_number)))?;
        let items = Self::load_items(db, order.id).await?;
        Ok(OrderDetail::from_parts(order, items))
    }

    /// Lists orders newest first. `page` is one-based.
    #[instrument(skip(self))]
    pub async fn list(
        &self,
        filter: &OrderFilter,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<OrderDetail>, u64), ServiceError> {
        let db = &*self.db_pool;

        let mut query = OrderEntity::find();
        if let Some(status) = filter.status {
            query = query.filter(order::Column::FulfillmentStatus.eq(status));
        }
        if let Some(payment_status) = filter.payment_status {
            query = query.filter(order::Column::PaymentStatus.eq(payment_status));
        }

        let paginator = query
            .order_by_desc(order::Column::CreatedAt)
            .order_by_desc(order::Column::OrderNumber)
            .paginate(db, per_page.max(1));

        let total = paginator.num_items().await.map_err(|e| {
            error!(error = %e, "Failed to count orders");
            ServiceError::DatabaseError(e)
        })?;
        let page_index = page.saturating_sub(1);
        match page_index.checked_mul(per_page.max(1)) {
            Some(offset) if offset < total => {}
            _ => return Ok((Vec::new(), total)),
        }
        let orders = paginator
            .fetch_page(page_index)
            .await
            .map_err(|e| {
                error!(error = %e, page, per_page, "Failed to fetch orders page");
                ServiceError::DatabaseError(e)
            })?;

        let ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
        let mut items_by_order: HashMap<Uuid, Vec<OrderItemModel>> = HashMap::new();
        if !ids.is_empty() {
            let items = OrderItemEntity::find()
                .filter(order_item::Column::OrderId.is_in(ids))
                .order_by_asc(order_item::Column::Position)
                .all(db)
                .await?;
            for item in items {
                items_by_order.entry(item.order_id).or_default().push(item);
            }
        }

        let details = orders
            .into_iter()
            .map(|order| {
                let items = items_by_order.remove(&order.id).unwrap_or_default();
                OrderDetail::from_parts(order, items)
            })
            .collect();
        Ok((details, total))
    }

    /// Applies a partial update from a client and returns the full updated order.
    #[instrument(skip(self, patch), fields(order_id = %order_id))]
    pub async fn update(&self, order_id: Uuid, patch: OrderPatch) -> Result<OrderDetail, ServiceError> {
        patch.validate()?;
        self.apply_patch(order_id, patch).await
    }

    /// Writes a patch without the client-side notes limit. Status edits and
    /// fulfillment events append signed lines to the existing notes, which
    /// may already be close to that limit.
    pub async fn apply_patch(
        &self,
        order_id: Uuid,
        patch: OrderPatch,
    ) -> Result<OrderDetail, ServiceError> {
        let db = &*self.db_pool;
        let order = self.find_model(db, order_id).await?;
        let previous = (order.fulfillment_status, order.payment_status);

        let mut active: OrderActiveModel = order.into();
        if let Some(status) = patch.status {
            active.fulfillment_status = Set(status);
        }
        if let Some(payment_status) = patch.payment_status {
            active.payment_status = Set(payment_status);
        }
        if let Some(notes) = patch.notes {
            active.notes = Set(if notes.is_empty() { None } else { Some(notes) });
        }
        active.updated_at = Set(Utc::now());

        let updated = active.update(db).await.map_err(|e| {
            error!(error = %e, order_id = %order_id, "Failed to update order");
            ServiceError::DatabaseError(e)
        })?;

        info!(
            order_id = %order_id,
            from_status = %previous.0,
            to_status = %updated.fulfillment_status,
            from_payment = %previous.1,
            to_payment = %updated.payment_status,
            "Order updated"
        );

        let items = Self::load_items(db, order_id).await?;
        Ok(OrderDetail::from_parts(updated, items))
    }

    /// Applies a status pushed by the fulfillment system, appending its note.
    #[instrument(skip(self, event), fields(order_id = %order_id, status = %event.status))]
    pub async fn record_fulfillment_event(
        &self,
        order_id: Uuid,
        event: FulfillmentEvent,
    ) -> Result<OrderDetail, ServiceError> {
        event.validate()?;
        let notes = match event.note.as_deref().map(str::trim) {
            Some(note) if !note.is_empty() => {
                let current = self.find_model(&*self.db_pool, order_id).await?;
                Some(append_note(current.notes.as_deref(), note))
            }
            _ => None,
        };
        self.apply_patch(
            order_id,
            OrderPatch {
                status: Some(event.status),
                payment_status: None,
                notes,
            },
        )
        .await
    }

    async fn find_model<C: ConnectionTrait>(
        &self,
        db: &C,
        order_id: Uuid,
    ) -> Result<OrderModel, ServiceError> {
        OrderEntity::find_by_id(order_id)
            .one(db)
            .await
            .map_err(|e| {
                error!(error = %e, order_id = %order_id, "Failed to fetch order from database");
                ServiceError::DatabaseError(e)
            })?
            .ok_or_else(|| {
                warn!(order_id = %order_id, "Order not found");
                ServiceError::NotFound(format!("Order with ID {} not found", order_id))
            })
    }

    async fn load_items<C: ConnectionTrait>(
        db: &C,
        order_id: Uuid,
    ) -> Result<Vec<OrderItemModel>, ServiceError> {
        Ok(OrderItemEntity::find()
            .filter(order_item::Column::OrderId.eq(order_id))
            .order_by_asc(order_item::Column::Position)
            .all(db)
            .await?)
    }
}

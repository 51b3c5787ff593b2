//! Order CRUD endpoints.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use chrono::NaiveDateTime;
use common::{CategoryId, EmployeeId, OrderId, ProductId, ShipperId, SupplierId};
use domain::{
    Customer, CustomerCode, Employee, Order, OrderAggregateRepository, OrderDetail, Shipper,
    ShippingAddress,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use store::NorthwindStore;

use crate::error::ApiError;

/// Shared application state accessible from all handlers.
pub struct AppState<S: NorthwindStore> {
    pub repository: OrderAggregateRepository<S>,
}

// -- Request types --

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub skip: i64,
    #[serde(default = "default_count")]
    pub count: i64,
}

fn default_count() -> i64 {
    10
}

/// Flat order shape: the list element and the body of writes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BriefOrder {
    #[serde(default)]
    pub id: OrderId,
    pub customer_id: String,
    pub employee_id: EmployeeId,
    pub order_date: NaiveDateTime,
    pub required_date: NaiveDateTime,
    #[serde(default)]
    pub shipped_date: Option<NaiveDateTime>,
    pub freight: Decimal,
    pub ship_name: String,
    pub shipper_id: ShipperId,
    pub ship_address: String,
    pub ship_city: String,
    #[serde(default)]
    pub ship_region: Option<String>,
    pub ship_postal_code: String,
    pub ship_country: String,
    #[serde(default)]
    pub order_details: Vec<BriefOrderDetail>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BriefOrderDetail {
    pub product_id: ProductId,
    pub unit_price: Decimal,
    pub quantity: i64,
    #[serde(default)]
    pub discount: Decimal,
}

// -- Response types --

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FullOrder {
    pub id: OrderId,
    pub customer: CustomerResponse,
    pub employee: EmployeeResponse,
    pub order_date: NaiveDateTime,
    pub required_date: NaiveDateTime,
    pub shipped_date: Option<NaiveDateTime>,
    pub freight: Decimal,
    pub ship_name: String,
    pub shipper: ShipperResponse,
    pub shipping_address: AddressResponse,
    pub order_details: Vec<FullOrderDetail>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerResponse {
    pub code: String,
    pub company_name: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeResponse {
    pub id: EmployeeId,
    pub first_name: String,
    pub last_name: String,
    pub country: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShipperResponse {
    pub id: ShipperId,
    pub company_name: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressResponse {
    pub address: String,
    pub city: String,
    pub region: Option<String>,
    pub postal_code: String,
    pub country: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FullOrderDetail {
    pub product_id: ProductId,
    pub product_name: String,
    pub supplier_id: SupplierId,
    pub supplier: String,
    pub category_id: CategoryId,
    pub category: String,
    pub unit_price: Decimal,
    pub quantity: i64,
    pub discount: Decimal,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderAddedResponse {
    pub order_id: OrderId,
}

// -- Conversions --

impl From<Order> for FullOrder {
    fn from(order: Order) -> Self {
        Self {
            id: order.id,
            customer: CustomerResponse {
                code: order.customer.code.into(),
                company_name: order.customer.company_name,
            },
            employee: EmployeeResponse {
                id: order.employee.id,
                first_name: order.employee.first_name,
                last_name: order.employee.last_name,
                country: order.employee.country,
            },
            order_date: order.order_date,
            required_date: order.required_date,
            shipped_date: order.shipped_date,
            freight: order.freight,
            ship_name: order.ship_name,
            shipper: ShipperResponse {
                id: order.shipper.id,
                company_name: order.shipper.company_name,
            },
            shipping_address: AddressResponse {
                address: order.shipping_address.address,
                city: order.shipping_address.city,
                region: order.shipping_address.region,
                postal_code: order.shipping_address.postal_code,
                country: order.shipping_address.country,
            },
            order_details: order
                .details
                .into_iter()
                .map(|d| FullOrderDetail {
                    product_id: d.product.id,
                    product_name: d.product.name,
                    supplier_id: d.product.supplier_id,
                    supplier: d.product.supplier,
                    category_id: d.product.category_id,
                    category: d.product.category,
                    unit_price: d.unit_price,
                    quantity: d.quantity,
                    discount: d.discount,
                })
                .collect(),
        }
    }
}

impl From<Order> for BriefOrder {
    fn from(order: Order) -> Self {
        Self {
            id: order.id,
            customer_id: order.customer.code.into(),
            employee_id: order.employee.id,
            order_date: order.order_date,
            required_date: order.required_date,
            shipped_date: order.shipped_date,
            freight: order.freight,
            ship_name: order.ship_name,
            shipper_id: order.shipper.id,
            ship_address: order.shipping_address.address,
            ship_city: order.shipping_address.city,
            ship_region: order.shipping_address.region,
            ship_postal_code: order.shipping_address.postal_code,
            ship_country: order.shipping_address.country,
            order_details: order
                .details
                .into_iter()
                .map(|d| BriefOrderDetail {
                    product_id: d.product.id,
                    unit_price: d.unit_price,
                    quantity: d.quantity,
                    discount: d.discount,
                })
                .collect(),
        }
    }
}

impl TryFrom<BriefOrder> for Order {
    type Error = ApiError;

    fn try_from(body: BriefOrder) -> Result<Self, Self::Error> {
        let code = CustomerCode::parse(&body.customer_id)
            .map_err(|e| ApiError::BadRequest(e.to_string()))?;

        if body.freight < Decimal::ZERO {
            return Err(ApiError::BadRequest(format!(
                "Invalid freight {}: must not be negative",
                body.freight
            )));
        }

        let details = body
            .order_details
            .into_iter()
            .map(|d| {
                if d.quantity <= 0 {
                    return Err(ApiError::BadRequest(format!(
                        "Invalid quantity {} for product {}: must be positive",
                        d.quantity, d.product_id
                    )));
                }
                Ok(OrderDetail::new(d.product_id, d.unit_price, d.quantity, d.discount))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Order {
            id: body.id,
            customer: Customer::new(code, body.ship_name.clone()),
            employee: Employee::reference(body.employee_id),
            order_date: body.order_date,
            required_date: body.required_date,
            shipped_date: body.shipped_date,
            shipper: Shipper::reference(body.shipper_id),
            freight: body.freight,
            ship_name: body.ship_name,
            shipping_address: ShippingAddress::new(
                body.ship_address,
                body.ship_city,
                body.ship_region,
                body.ship_postal_code,
                body.ship_country,
            ),
            details,
        })
    }
}

fn parse_body(body: Result<Json<BriefOrder>, JsonRejection>) -> Result<Order, ApiError> {
    let Json(body) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    Order::try_from(body)
}

// -- Handlers --

/// GET /api/orders/{order_id}: load a fully assembled order.
#[tracing::instrument(skip(state))]
pub async fn get<S: NorthwindStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(order_id): Path<OrderId>,
) -> Result<Json<FullOrder>, ApiError> {
    let order = state
        .repository
        .get_order(order_id)
        .await
        .inspect_err(|e| tracing::error!(%order_id, error = %e, "failed to get order"))?;

    Ok(Json(order.into()))
}

/// GET /api/orders?skip=&count=: list a page of orders by ascending id.
#[tracing::instrument(skip(state))]
pub async fn list<S: NorthwindStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<BriefOrder>>, ApiError> {
    let orders = state
        .repository
        .get_orders(query.skip, query.count)
        .await
        .inspect_err(|e| {
            tracing::error!(skip = query.skip, count = query.count, error = %e, "failed to list orders")
        })?;

    Ok(Json(orders.into_iter().map(BriefOrder::from).collect()))
}

/// POST /api/orders: add an order with its detail lines.
#[tracing::instrument(skip(state, body))]
pub async fn add<S: NorthwindStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    body: Result<Json<BriefOrder>, JsonRejection>,
) -> Result<Json<OrderAddedResponse>, ApiError> {
    let order = parse_body(body)?;

    let order_id = state
        .repository
        .add_order(order)
        .await
        .inspect_err(|e| tracing::error!(error = %e, "failed to add order"))?;

    Ok(Json(OrderAddedResponse { order_id }))
}

/// PUT /api/orders/{order_id}: overwrite an order. The path id wins over
/// any id in the body.
#[tracing::instrument(skip(state, body))]
pub async fn update<S: NorthwindStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(order_id): Path<OrderId>,
    body: Result<Json<BriefOrder>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let mut order = parse_body(body)?;
    order.id = order_id;

    state
        .repository
        .update_order(Some(order))
        .await
        .inspect_err(|e| tracing::error!(%order_id, error = %e, "failed to update order"))?;

    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/orders/{order_id}: remove an order and its detail lines.
#[tracing::instrument(skip(state))]
pub async fn remove<S: NorthwindStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(order_id): Path<OrderId>,
) -> Result<StatusCode, ApiError> {
    state
        .repository
        .remove_order(order_id)
        .await
        .inspect_err(|e| tracing::error!(%order_id, error = %e, "failed to remove order"))?;

    Ok(StatusCode::NO_CONTENT)
}

//! Translation between store rows and the order aggregate.

use common::OrderId;
use store::{
    CategoryRow, EmployeeRow, OrderDetailRow, OrderRow, ProductRow, ShipperRow, SupplierRow,
};

use super::{
    Customer, CustomerCode, Employee, Order, OrderDetail, Product, Shipper, ShippingAddress,
};

/// Builds the aggregate from an order row and its resolved references.
///
/// Missing employee or shipper rows collapse to empty descriptive fields.
/// The customer's company name is the order's ship-to name.
pub(crate) fn assemble_order(
    row: OrderRow,
    employee: Option<EmployeeRow>,
    shipper: Option<ShipperRow>,
    details: Vec<OrderDetail>,
) -> Order {
    let employee = match employee {
        Some(e) => Employee {
            id: row.employee_id,
            first_name: e.first_name,
            last_name: e.last_name,
            country: e.country,
        },
        None => Employee::reference(row.employee_id),
    };

    let shipper = match shipper {
        Some(s) => Shipper {
            id: row.ship_via,
            company_name: s.company_name,
        },
        None => Shipper::reference(row.ship_via),
    };

    Order {
        id: row.order_id,
        customer: Customer::new(
            CustomerCode::from_stored(row.customer_id),
            row.ship_name.clone(),
        ),
        employee,
        order_date: row.order_date,
        required_date: row.required_date,
        shipped_date: row.shipped_date,
        shipper,
        freight: row.freight,
        ship_name: row.ship_name,
        shipping_address: ShippingAddress {
            address: row.ship_address,
            city: row.ship_city,
            region: row.ship_region,
            postal_code: row.ship_postal_code,
            country: row.ship_country,
        },
        details,
    }
}

/// Builds a detail line from its row, its product, and the product's
/// supplier and category. Missing supplier or category names are empty.
pub(crate) fn assemble_detail(
    row: &OrderDetailRow,
    product: ProductRow,
    supplier: Option<SupplierRow>,
    category: Option<CategoryRow>,
) -> OrderDetail {
    OrderDetail {
        order_id: row.order_id,
        product: Product {
            id: row.product_id,
            name: product.product_name,
            supplier_id: product.supplier_id,
            supplier: supplier.map(|s| s.company_name).unwrap_or_default(),
            category_id: product.category_id,
            category: category.map(|c| c.category_name).unwrap_or_default(),
        },
        unit_price: row.unit_price,
        quantity: row.quantity,
        discount: row.discount,
    }
}

/// Flattens the aggregate back into an order row with its detail rows.
///
/// Only ids are taken from the employee, shipper, and products; their
/// descriptive fields live in their own tables.
pub(crate) fn disassemble_order(order: &Order) -> OrderRow {
    OrderRow {
        order_id: order.id,
        customer_id: order.customer.code.as_str().to_string(),
        employee_id: order.employee.id,
        order_date: order.order_date,
        required_date: order.required_date,
        shipped_date: order.shipped_date,
        ship_via: order.shipper.id,
        freight: order.freight,
        ship_name: order.ship_name.clone(),
        ship_address: order.shipping_address.address.clone(),
        ship_city: order.shipping_address.city.clone(),
        ship_region: order.shipping_address.region.clone(),
        ship_postal_code: order.shipping_address.postal_code.clone(),
        ship_country: order.shipping_address.country.clone(),
        details: order
            .details
            .iter()
            .map(|d| disassemble_detail(order.id, d))
            .collect(),
    }
}

fn disassemble_detail(order_id: OrderId, detail: &OrderDetail) -> OrderDetailRow {
    OrderDetailRow {
        order_id,
        product_id: detail.product.id,
        unit_price: detail.unit_price,
        quantity: detail.quantity,
        discount: detail.discount,
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use common::{CategoryId, EmployeeId, ProductId, ShipperId, SupplierId};
    use rust_decimal_macros::dec;

    use super::*;

    fn order_row() -> OrderRow {
        let date = NaiveDate::from_ymd_opt(1996, 7, 4)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        OrderRow {
            order_id: OrderId::new(10248),
            customer_id: "VINET".to_string(),
            employee_id: EmployeeId::new(5),
            order_date: date,
            required_date: date,
            shipped_date: None,
            ship_via: ShipperId::new(3),
            freight: dec!(32.38),
            ship_name: "Vins et alcools Chevalier".to_string(),
            ship_address: "59 rue de l'Abbaye".to_string(),
            ship_city: "Reims".to_string(),
            ship_region: None,
            ship_postal_code: "51100".to_string(),
            ship_country: "France".to_string(),
            details: vec![OrderDetailRow {
                order_id: OrderId::new(10248),
                product_id: ProductId::new(11),
                unit_price: dec!(14),
                quantity: 12,
                discount: dec!(0),
            }],
        }
    }

    fn product_row() -> ProductRow {
        ProductRow {
            product_id: ProductId::new(11),
            product_name: "Queso Cabrales".to_string(),
            supplier_id: SupplierId::new(5),
            category_id: CategoryId::new(4),
            quantity_per_unit: "1 kg pkg.".to_string(),
            unit_price: dec!(21),
            units_in_stock: 22,
            units_on_order: 30,
            reorder_level: 30,
            discontinued: false,
        }
    }

    #[test]
    fn assemble_uses_ship_name_as_company_name() {
        let order = assemble_order(order_row(), None, None, vec![]);

        assert_eq!(order.customer.code.as_str(), "VINET");
        assert_eq!(order.customer.company_name, "Vins et alcools Chevalier");
        assert_eq!(order.ship_name, order.customer.company_name);
    }

    #[test]
    fn assemble_defaults_missing_employee_and_shipper() {
        let order = assemble_order(order_row(), None, None, vec![]);

        assert_eq!(order.employee.id, EmployeeId::new(5));
        assert_eq!(order.employee.first_name, "");
        assert_eq!(order.employee.last_name, "");
        assert_eq!(order.employee.country, "");
        assert_eq!(order.shipper.id, ShipperId::new(3));
        assert_eq!(order.shipper.company_name, "");
    }

    #[test]
    fn assemble_resolves_employee_and_shipper() {
        let employee = EmployeeRow {
            employee_id: EmployeeId::new(5),
            first_name: "Steven".to_string(),
            last_name: "Buchanan".to_string(),
            country: "UK".to_string(),
        };
        let shipper = ShipperRow {
            shipper_id: ShipperId::new(3),
            company_name: "Federal Shipping".to_string(),
            phone: "(503) 555-9931".to_string(),
        };

        let order = assemble_order(order_row(), Some(employee), Some(shipper), vec![]);

        assert_eq!(order.employee.last_name, "Buchanan");
        assert_eq!(order.shipper.company_name, "Federal Shipping");
        assert_eq!(order.shipping_address.city, "Reims");
        assert!(order.shipping_address.region.is_none());
    }

    #[test]
    fn assemble_detail_with_missing_supplier_and_category() {
        let row = order_row();
        let detail = assemble_detail(&row.details[0], product_row(), None, None);

        assert_eq!(detail.order_id, OrderId::new(10248));
        assert_eq!(detail.product.id, ProductId::new(11));
        assert_eq!(detail.product.name, "Queso Cabrales");
        assert_eq!(detail.product.supplier_id, SupplierId::new(5));
        assert_eq!(detail.product.supplier, "");
        assert_eq!(detail.product.category_id, CategoryId::new(4));
        assert_eq!(detail.product.category, "");
        assert_eq!(detail.unit_price, dec!(14));
        assert_eq!(detail.quantity, 12);
    }

    #[test]
    fn assemble_detail_resolves_display_names() {
        let row = order_row();
        let supplier = SupplierRow {
            supplier_id: SupplierId::new(5),
            company_name: "Cooperativa de Quesos 'Las Cabras'".to_string(),
            contact_name: None,
            city: Some("Oviedo".to_string()),
            country: Some("Spain".to_string()),
            phone: None,
        };
        let category = CategoryRow {
            category_id: CategoryId::new(4),
            category_name: "Dairy Products".to_string(),
            description: "Cheeses".to_string(),
        };

        let detail = assemble_detail(&row.details[0], product_row(), Some(supplier), Some(category));

        assert_eq!(detail.product.supplier, "Cooperativa de Quesos 'Las Cabras'");
        assert_eq!(detail.product.category, "Dairy Products");
    }

    #[test]
    fn disassemble_round_trips_scalar_fields() {
        let row = order_row();
        let details = vec![assemble_detail(&row.details[0], product_row(), None, None)];
        let order = assemble_order(row.clone(), None, None, details);

        assert_eq!(disassemble_order(&order), row);
    }

    #[test]
    fn disassemble_keys_details_to_the_order() {
        let mut order = assemble_order(order_row(), None, None, vec![]);
        order.details = vec![
            OrderDetail::new(ProductId::new(42), dec!(9.8), 10, dec!(0)),
            OrderDetail::new(ProductId::new(72), dec!(34.8), 5, dec!(0.1)),
        ];

        let row = disassemble_order(&order);

        assert_eq!(row.details.len(), 2);
        assert!(row.details.iter().all(|d| d.order_id == OrderId::new(10248)));
        assert_eq!(row.details[1].discount, dec!(0.1));
    }
}

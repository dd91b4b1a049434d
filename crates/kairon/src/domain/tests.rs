use super::*;
use crate::{model::entity::EntityModel, model::field::EntityFieldKind, traits::EntityKind, value::Value};

#[test]
fn only_pending_orders_transition() {
    use OrderStatus::{Cancelled, Paid, Pending};

    assert!(Pending.can_transition_to(Paid));
    assert!(Pending.can_transition_to(Cancelled));
    for from in [Paid, Cancelled] {
        for to in [Pending, Paid, Cancelled] {
            assert!(!from.can_transition_to(to), "{from} -> {to}");
        }
    }
    assert!(!Pending.can_transition_to(Pending));
}

#[test]
fn every_shape_is_soft_deletable() {
    for model in [
        EntityModel::of::<Member>(),
        EntityModel::of::<Membership>(),
        EntityModel::of::<Activity>(),
        EntityModel::of::<Product>(),
        EntityModel::of::<Order>(),
        EntityModel::of::<User>(),
    ] {
        assert_eq!(model.deleted_field, Some("deleted"), "{}", model.path);
        assert!(model.field("id").is_none(), "{}", model.path);
    }
}

#[test]
fn enum_fields_are_queryable_as_text() {
    let member = EntityModel::of::<Member>();
    let order = EntityModel::of::<Order>();

    assert_eq!(member.field("status").map(|f| f.kind), Some(EntityFieldKind::Text));
    assert_eq!(
        member.field("activity_list").map(|f| f.kind),
        Some(EntityFieldKind::Collection)
    );
    assert_eq!(order.field("status").map(|f| f.kind), Some(EntityFieldKind::Text));
    assert_eq!(order.field("products").map(|f| f.kind), Some(EntityFieldKind::Other));
    assert_eq!(order.field("created").map(|f| f.kind), Some(EntityFieldKind::Numeric));
}

#[test]
fn order_record_uses_storage_names() {
    let order = Order {
        id: Some("o1".to_string()),
        created: 1_700_000_000,
        amount: 30.5,
        products: vec![SelectedProduct {
            id: "p1".to_string(),
            quantity: 2,
            price: 15.25,
        }],
        status: OrderStatus::Paid,
        member_id: "m1".to_string(),
        deleted: false,
    };

    let record = order.to_record().unwrap();
    assert_eq!(record.get("status"), Some(&Value::from("paid")));
    assert_eq!(record.get("created"), Some(&Value::Int(1_700_000_000)));

    assert_eq!(Order::from_record(record).unwrap(), order);
}

#[test]
fn user_claims_carry_role() {
    let user = User {
        role: Role::Admin,
        ..User::default()
    };

    assert_eq!(user.claims().get("role"), Some(&Value::from("admin")));
}

#[test]
fn stock_and_capacity_checks() {
    let limited = Product {
        stock: 5,
        ..Product::default()
    };
    let unlimited = Product {
        infinite_stock: true,
        ..Product::default()
    };

    assert!(limited.can_supply(5));
    assert!(!limited.can_supply(6));
    assert!(unlimited.can_supply(1_000));

    assert!(!Activity::default().has_room());
    assert!(Member {
        activity_list: vec!["a1".to_string()],
        ..Member::default()
    }
    .holds("a1"));
}

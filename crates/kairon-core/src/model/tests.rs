use crate::{
    model::{
        entity::EntityModel,
        field::{EntityFieldKind, EntityFieldModel},
    },
    traits::EntityShape,
};
use kairon_derive::Entity;
use std::collections::BTreeSet;

#[allow(dead_code)]
#[derive(Entity)]
#[entity(collection = "Activity")]
struct Activity {
    name: String,
    max_capacity: i32,
    price: Option<f64>,
    open: bool,
    tags: BTreeSet<String>,
    nickname: Option<String>,
    #[entity(skip)]
    cached_label: String,
    #[entity(name = "is_deleted")]
    deleted: bool,
}

#[allow(dead_code)]
#[derive(Entity)]
struct Product {
    name: String,
    stock: i64,
    #[entity(name = "-")]
    scratch: u8,
}

#[test]
fn derive_classifies_declared_types() {
    let model = EntityModel::of::<Activity>();
    let kinds: Vec<_> = model.fields.iter().map(|f| (f.name, f.kind)).collect();

    assert_eq!(
        kinds,
        vec![
            ("name", EntityFieldKind::Text),
            ("max_capacity", EntityFieldKind::Numeric),
            ("price", EntityFieldKind::Numeric),
            ("open", EntityFieldKind::Bool),
            ("tags", EntityFieldKind::Collection),
            ("nickname", EntityFieldKind::Text),
            ("deleted", EntityFieldKind::Bool),
        ]
    );
}

#[test]
fn skipped_fields_are_not_persisted() {
    assert!(EntityModel::of::<Activity>().field("cached_label").is_none());

    let product = EntityModel::of::<Product>();
    assert!(product.fields.iter().all(|f| f.name != "scratch"));
    assert!(product.field("-").is_none());
}

#[test]
fn renamed_deleted_flag_keeps_soft_delete() {
    let model = EntityModel::of::<Activity>();

    assert!(model.supports_soft_delete());
    assert_eq!(model.deleted_field, Some("is_deleted"));
    assert_eq!(
        model.field("is_deleted"),
        Some(&EntityFieldModel {
            name: "deleted",
            store_name: "is_deleted",
            kind: EntityFieldKind::Bool,
        })
    );
}

#[test]
fn collection_defaults_to_type_name() {
    let model = EntityModel::of::<Product>();

    assert_eq!(model.collection, "Product");
    assert!(!model.supports_soft_delete());
    assert!(model.path.ends_with("::Product"));
}

#[test]
fn pointers_resolve_to_the_same_shape() {
    let activity = Activity {
        name: "Yoga".to_string(),
        max_capacity: 10,
        price: None,
        open: true,
        tags: BTreeSet::new(),
        nickname: None,
        cached_label: String::new(),
        deleted: false,
    };
    let boxed = Box::new(Product {
        name: "Mat".to_string(),
        stock: 3,
        scratch: 0,
    });

    assert_eq!(EntityModel::of_val(&&activity).path, EntityModel::of::<Activity>().path);
    assert_eq!(
        <Box<Product> as EntityShape>::MODEL.path,
        EntityModel::of_val(&*boxed).path
    );
    assert_eq!(EntityModel::of::<&Activity>().collection, "Activity");
}

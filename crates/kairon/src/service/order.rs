use crate::{
    db::{Db, UpdatePatch, query::QueryOptions},
    domain::{Order, OrderStatus, Product, SelectedProduct},
    error::Error,
    repo::{Repository, decode},
};
use chrono::Utc;
use tracing::{debug, info};

///
/// OrderService
///
/// Order placement and the order status machine.
///

#[derive(Clone)]
pub struct OrderService {
    db: Db,
    orders: Repository<Order>,
}

impl OrderService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            orders: Repository::new(db.clone()),
            db,
        }
    }

    pub async fn read(&self, id: &str) -> Result<Order, Error> {
        self.orders.read(id).await
    }

    pub async fn list(&self, opts: &QueryOptions) -> Result<Vec<Order>, Error> {
        self.orders.list(opts).await
    }

    pub async fn delete(&self, id: &str) -> Result<(), Error> {
        self.orders.delete(id).await
    }

    /// Place an order: reserve stock for every line and record the order,
    /// all in one transaction.
    ///
    /// Every product is read and checked before any stock is written, so a
    /// missing product or a short line leaves every counter untouched. The
    /// stored order is always `pending` with a server-assigned `created`.
    pub async fn create(&self, order: Order) -> Result<Order, Error> {
        let lines = demand(&order.products)?;
        let (lines, order) = (&lines, &order);

        // re-run from fresh reads when another order commits first
        let placed = self
            .db
            .run_transaction(move |tx| async move {
                let mut targets = Vec::with_capacity(lines.len());

                for (id, quantity) in lines {
                    let product: Product = decode(tx.get::<Product>(id).await?)?;
                    if !product.can_supply(*quantity) {
                        return Err(Error::insufficient_resource(format!(
                            "not enough stock for product {id}: requested {quantity}, available {}",
                            product.stock
                        )));
                    }
                    if !product.infinite_stock {
                        targets.push((id, product.stock - quantity));
                    }
                }

                for (id, stock) in targets {
                    tx.update::<Product>(id, &UpdatePatch::new().set(Product::STOCK, stock))
                        .await?;
                }

                let order = Order {
                    id: None,
                    created: Utc::now().timestamp(),
                    status: OrderStatus::Pending,
                    deleted: false,
                    ..order.clone()
                };

                decode::<Order>(tx.create(&order).await?)
            })
            .await
            .map_err(|err| err.with_context("place order"))?;

        info!(
            order = placed.id.as_deref().unwrap_or_default(),
            lines = placed.products.len(),
            "order placed"
        );

        Ok(placed)
    }

    pub async fn pay(&self, id: &str) -> Result<Order, Error> {
        self.transition(id, OrderStatus::Paid).await
    }

    pub async fn cancel(&self, id: &str) -> Result<Order, Error> {
        self.transition(id, OrderStatus::Cancelled).await
    }

    // Read-check-write in one transaction so two transitions cannot both win.
    async fn transition(&self, id: &str, next: OrderStatus) -> Result<Order, Error> {
        let order = self
            .db
            .run_transaction(move |tx| async move {
                let order: Order = decode(tx.get::<Order>(id).await?)?;
                if !order.status.can_transition_to(next) {
                    return Err(Error::invalid_state(format!(
                        "order {id} is {}, cannot become {next}",
                        order.status
                    )));
                }

                decode::<Order>(
                    tx.update::<Order>(id, &UpdatePatch::new().set(Order::STATUS, next.as_str()))
                        .await?,
                )
            })
            .await?;
        debug!(order = id, status = %next, "order status changed");

        Ok(order)
    }
}

// Per-product totals in first-seen order. Duplicate lines for one product
// are checked and decremented once, against their combined quantity.
fn demand(lines: &[SelectedProduct]) -> Result<Vec<(String, i64)>, Error> {
    if lines.is_empty() {
        return Err(Error::invalid_input("order has no products"));
    }

    let mut totals: Vec<(String, i64)> = Vec::with_capacity(lines.len());
    for line in lines {
        if line.quantity <= 0 {
            return Err(Error::invalid_input(format!(
                "product {}: quantity must be positive, got {}",
                line.id, line.quantity
            )));
        }

        match totals.iter_mut().find(|(id, _)| *id == line.id) {
            Some((_, total)) => *total = total.saturating_add(line.quantity),
            None => totals.push((line.id.clone(), line.quantity)),
        }
    }

    Ok(totals)
}

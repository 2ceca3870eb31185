use bigdecimal::BigDecimal;
use chrono::Utc;
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::order::{OrderLineRequest, OrderView, PlacedOrder, PricedLine, STATUS_PENDING};
use crate::domain::ports::OrderStore;

/// Order placement workflow.
///
/// A submission runs a linear pipeline: validate the lines, resolve a
/// unit price for every line, compute the exact total, write the order
/// header, then write one detail row per line. Pricing fully completes
/// before anything is written, and every detail insert is attempted and
/// its outcome recorded, so the caller is never told "success" for an
/// order that is only partially on disk.
pub struct OrderService<S> {
    store: S,
    allow_empty_orders: bool,
}

impl<S: OrderStore> OrderService<S> {
    pub fn new(store: S, allow_empty_orders: bool) -> Self {
        Self {
            store,
            allow_empty_orders,
        }
    }

    pub fn place_order(
        &self,
        client_id: Uuid,
        lines: Vec<OrderLineRequest>,
    ) -> Result<PlacedOrder, DomainError> {
        // allow_empty_orders restores the legacy behavior of accepting a
        // zero-total order with no lines.
        if lines.is_empty() && !self.allow_empty_orders {
            return Err(DomainError::Validation(
                "order must contain at least one line".to_string(),
            ));
        }
        for line in &lines {
            if line.quantity <= 0 {
                return Err(DomainError::Validation(format!(
                    "quantity for product {} must be positive",
                    line.product_id
                )));
            }
        }

        // Resolve every unit price before any write. One unresolvable
        // product aborts the whole submission with nothing persisted.
        // Duplicate product ids are looked up again, not cached.
        let mut priced = Vec::with_capacity(lines.len());
        for line in &lines {
            let unit_price = self
                .store
                .fetch_unit_price(line.product_id)?
                .ok_or(DomainError::ProductNotFound(line.product_id))?;
            priced.push(PricedLine {
                product_id: line.product_id,
                quantity: line.quantity,
                unit_price,
            });
        }

        let total = priced.iter().fold(BigDecimal::from(0), |acc, line| {
            acc + &line.unit_price * BigDecimal::from(line.quantity)
        });

        let order_id =
            self.store
                .insert_order_header(client_id, &total, STATUS_PENDING, Utc::now())?;

        // Attempt every detail insert and collect each outcome; a failure
        // must not short-circuit the remaining lines, otherwise the caller
        // cannot be told which rows exist.
        let mut failed_lines = Vec::new();
        for (index, line) in priced.iter().enumerate() {
            if let Err(err) =
                self.store
                    .insert_order_detail(order_id, line.product_id, line.quantity)
            {
                log::error!(
                    "order {}: detail insert failed for line {} (product {}): {}",
                    order_id,
                    index,
                    line.product_id,
                    err
                );
                failed_lines.push(index);
            }
        }
        if !failed_lines.is_empty() {
            return Err(DomainError::PartialFailure {
                order_id,
                failed_lines,
            });
        }

        Ok(PlacedOrder { order_id, total })
    }

    pub fn orders_for_client(&self, client_id: Uuid) -> Result<Vec<OrderView>, DomainError> {
        self.store.orders_for_client(client_id)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{HashMap, HashSet};
    use std::str::FromStr;
    use std::sync::Mutex;

    use bigdecimal::BigDecimal;
    use chrono::{DateTime, Utc};
    use uuid::Uuid;

    use super::OrderService;
    use crate::domain::errors::DomainError;
    use crate::domain::order::{OrderLineRequest, OrderView};
    use crate::domain::ports::OrderStore;

    #[derive(Default)]
    struct MemoryStore {
        prices: HashMap<Uuid, BigDecimal>,
        fail_header: bool,
        fail_detail_for: HashSet<Uuid>,
        headers: Mutex<Vec<(Uuid, Uuid, BigDecimal, String)>>,
        details: Mutex<Vec<(Uuid, Uuid, i32)>>,
        price_lookups: Mutex<Vec<Uuid>>,
    }

    impl MemoryStore {
        fn with_prices(prices: &[(Uuid, &str)]) -> Self {
            Self {
                prices: prices
                    .iter()
                    .map(|(id, p)| (*id, BigDecimal::from_str(p).expect("valid decimal")))
                    .collect(),
                ..Self::default()
            }
        }

        fn header_count(&self) -> usize {
            self.headers.lock().expect("lock").len()
        }

        fn detail_count(&self) -> usize {
            self.details.lock().expect("lock").len()
        }
    }

    impl OrderStore for MemoryStore {
        fn fetch_unit_price(&self, product_id: Uuid) -> Result<Option<BigDecimal>, DomainError> {
            self.price_lookups.lock().expect("lock").push(product_id);
            Ok(self.prices.get(&product_id).cloned())
        }

        fn insert_order_header(
            &self,
            client_id: Uuid,
            total: &BigDecimal,
            status: &str,
            _created_at: DateTime<Utc>,
        ) -> Result<Uuid, DomainError> {
            if self.fail_header {
                return Err(DomainError::Store("header insert refused".to_string()));
            }
            let order_id = Uuid::new_v4();
            self.headers.lock().expect("lock").push((
                order_id,
                client_id,
                total.clone(),
                status.to_string(),
            ));
            Ok(order_id)
        }

        fn insert_order_detail(
            &self,
            order_id: Uuid,
            product_id: Uuid,
            quantity: i32,
        ) -> Result<(), DomainError> {
            if self.fail_detail_for.contains(&product_id) {
                return Err(DomainError::Store("detail insert refused".to_string()));
            }
            self.details
                .lock()
                .expect("lock")
                .push((order_id, product_id, quantity));
            Ok(())
        }

        fn orders_for_client(&self, _client_id: Uuid) -> Result<Vec<OrderView>, DomainError> {
            Ok(vec![])
        }
    }

    fn line(product_id: Uuid, quantity: i32) -> OrderLineRequest {
        OrderLineRequest {
            product_id,
            quantity,
        }
    }

    #[test]
    fn total_is_exact_sum_over_lines() {
        let p1 = Uuid::new_v4();
        let p2 = Uuid::new_v4();
        let store = MemoryStore::with_prices(&[(p1, "12.50"), (p2, "5.00")]);
        let service = OrderService::new(store, false);

        let placed = service
            .place_order(Uuid::new_v4(), vec![line(p1, 3), line(p2, 1)])
            .expect("order should succeed");

        assert_eq!(placed.total, BigDecimal::from_str("42.50").unwrap());

        let headers = service.store.headers.lock().unwrap();
        assert_eq!(headers.len(), 1);
        assert_eq!(headers[0].0, placed.order_id);
        assert_eq!(headers[0].2, BigDecimal::from_str("42.50").unwrap());
        assert_eq!(headers[0].3, "PENDING");

        let details = service.store.details.lock().unwrap();
        assert_eq!(details.len(), 2);
        assert_eq!(details[0], (placed.order_id, p1, 3));
        assert_eq!(details[1], (placed.order_id, p2, 1));
    }

    #[test]
    fn unknown_product_performs_no_writes() {
        let known = Uuid::new_v4();
        let missing = Uuid::new_v4();
        let store = MemoryStore::with_prices(&[(known, "9.99")]);
        let service = OrderService::new(store, false);

        let err = service
            .place_order(Uuid::new_v4(), vec![line(known, 1), line(missing, 1)])
            .expect_err("order should fail");

        assert!(matches!(err, DomainError::ProductNotFound(id) if id == missing));
        assert_eq!(service.store.header_count(), 0);
        assert_eq!(service.store.detail_count(), 0);
    }

    #[test]
    fn empty_order_is_rejected_by_default() {
        let service = OrderService::new(MemoryStore::default(), false);

        let err = service
            .place_order(Uuid::new_v4(), vec![])
            .expect_err("empty order should fail");

        assert!(matches!(err, DomainError::Validation(_)));
        assert_eq!(service.store.header_count(), 0);
        assert_eq!(service.store.detail_count(), 0);
    }

    #[test]
    fn empty_order_allowed_when_legacy_flag_set() {
        let service = OrderService::new(MemoryStore::default(), true);

        let placed = service
            .place_order(Uuid::new_v4(), vec![])
            .expect("legacy empty order should succeed");

        assert_eq!(placed.total, BigDecimal::from(0));
        assert_eq!(service.store.header_count(), 1);
        assert_eq!(service.store.detail_count(), 0);
    }

    #[test]
    fn non_positive_quantity_is_rejected_before_any_lookup() {
        let p1 = Uuid::new_v4();
        let store = MemoryStore::with_prices(&[(p1, "4.00")]);
        let service = OrderService::new(store, false);

        let err = service
            .place_order(Uuid::new_v4(), vec![line(p1, 0)])
            .expect_err("zero quantity should fail");

        assert!(matches!(err, DomainError::Validation(_)));
        assert!(service.store.price_lookups.lock().unwrap().is_empty());
        assert_eq!(service.store.header_count(), 0);
    }

    #[test]
    fn one_failed_detail_reports_partial_failure_with_line_index() {
        let p1 = Uuid::new_v4();
        let p2 = Uuid::new_v4();
        let p3 = Uuid::new_v4();
        let mut store = MemoryStore::with_prices(&[(p1, "1.00"), (p2, "2.00"), (p3, "3.00")]);
        store.fail_detail_for.insert(p2);
        let service = OrderService::new(store, false);

        let err = service
            .place_order(Uuid::new_v4(), vec![line(p1, 1), line(p2, 1), line(p3, 1)])
            .expect_err("order should partially fail");

        match err {
            DomainError::PartialFailure {
                order_id,
                failed_lines,
            } => {
                assert_eq!(failed_lines, vec![1]);
                let headers = service.store.headers.lock().unwrap();
                assert_eq!(headers.len(), 1);
                assert_eq!(headers[0].0, order_id);
            }
            other => panic!("expected PartialFailure, got {other:?}"),
        }
        // The header and the two surviving detail rows remain.
        assert_eq!(service.store.detail_count(), 2);
    }

    #[test]
    fn header_failure_writes_no_details() {
        let p1 = Uuid::new_v4();
        let mut store = MemoryStore::with_prices(&[(p1, "7.25")]);
        store.fail_header = true;
        let service = OrderService::new(store, false);

        let err = service
            .place_order(Uuid::new_v4(), vec![line(p1, 2)])
            .expect_err("order should fail at the header");

        assert!(matches!(err, DomainError::Store(_)));
        assert_eq!(service.store.header_count(), 0);
        assert_eq!(service.store.detail_count(), 0);
    }

    #[test]
    fn duplicate_product_ids_are_priced_twice() {
        let p1 = Uuid::new_v4();
        let store = MemoryStore::with_prices(&[(p1, "2.50")]);
        let service = OrderService::new(store, false);

        let placed = service
            .place_order(Uuid::new_v4(), vec![line(p1, 1), line(p1, 2)])
            .expect("order should succeed");

        assert_eq!(placed.total, BigDecimal::from_str("7.50").unwrap());
        assert_eq!(service.store.price_lookups.lock().unwrap().len(), 2);
    }

    #[test]
    fn identical_submissions_create_distinct_orders() {
        let p1 = Uuid::new_v4();
        let store = MemoryStore::with_prices(&[(p1, "3.00")]);
        let service = OrderService::new(store, false);
        let client_id = Uuid::new_v4();

        let first = service
            .place_order(client_id, vec![line(p1, 1)])
            .expect("first order should succeed");
        let second = service
            .place_order(client_id, vec![line(p1, 1)])
            .expect("second order should succeed");

        assert_ne!(first.order_id, second.order_id);
        assert_eq!(service.store.header_count(), 2);
    }
}

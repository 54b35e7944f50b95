use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use metrics_exporter_prometheus::PrometheusHandle;
use spa_loyalty::loyalty::{
    CustomerId, CustomerRecord, LoyaltyNotice, LoyaltyRepository, NotificationPublisher,
    NotifyError, Promotion, PromotionUsage, RepositoryError,
};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryLoyaltyRepository {
    customers: Arc<Mutex<HashMap<CustomerId, CustomerRecord>>>,
    promotions: Arc<Mutex<HashMap<String, Promotion>>>,
    usages: Arc<Mutex<Vec<PromotionUsage>>>,
}

impl LoyaltyRepository for InMemoryLoyaltyRepository {
    fn insert_customer(&self, record: CustomerRecord) -> Result<CustomerRecord, RepositoryError> {
        let mut guard = self.customers.lock().expect("repository mutex poisoned");
        if guard.contains_key(&record.profile.customer_id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(record.profile.customer_id.clone(), record.clone());
        Ok(record)
    }

    fn update_customer(&self, record: CustomerRecord) -> Result<(), RepositoryError> {
        let mut guard = self.customers.lock().expect("repository mutex poisoned");
        if guard.contains_key(&record.profile.customer_id) {
            guard.insert(record.profile.customer_id.clone(), record);
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
    }

    fn fetch_customer(&self, id: &CustomerId) -> Result<Option<CustomerRecord>, RepositoryError> {
        let guard = self.customers.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn promotions(&self) -> Result<Vec<Promotion>, RepositoryError> {
        let guard = self.promotions.lock().expect("promotion mutex poisoned");
        let mut rows: Vec<Promotion> = guard.values().cloned().collect();
        rows.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(rows)
    }

    fn fetch_promotion(&self, code: &str) -> Result<Option<Promotion>, RepositoryError> {
        let guard = self.promotions.lock().expect("promotion mutex poisoned");
        Ok(guard.get(code).cloned())
    }

    fn upsert_promotion(&self, promotion: Promotion) -> Result<(), RepositoryError> {
        let mut guard = self.promotions.lock().expect("promotion mutex poisoned");
        guard.insert(promotion.code.clone(), promotion);
        Ok(())
    }

    fn record_usage(&self, usage: PromotionUsage) -> Result<(), RepositoryError> {
        let mut guard = self.usages.lock().expect("usage mutex poisoned");
        guard.push(usage);
        Ok(())
    }

    fn usage_count_for(&self, code: &str, customer: &CustomerId) -> Result<u32, RepositoryError> {
        let guard = self.usages.lock().expect("usage mutex poisoned");
        Ok(guard
            .iter()
            .filter(|usage| usage.promotion_code == code && &usage.customer_id == customer)
            .count() as u32)
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryNotificationPublisher {
    events: Arc<Mutex<Vec<LoyaltyNotice>>>,
}

impl NotificationPublisher for InMemoryNotificationPublisher {
    fn publish(&self, notice: LoyaltyNotice) -> Result<(), NotifyError> {
        let mut guard = self.events.lock().expect("notice mutex poisoned");
        guard.push(notice);
        Ok(())
    }
}

impl InMemoryNotificationPublisher {
    pub(crate) fn events(&self) -> Vec<LoyaltyNotice> {
        self.events.lock().expect("notice mutex poisoned").clone()
    }
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

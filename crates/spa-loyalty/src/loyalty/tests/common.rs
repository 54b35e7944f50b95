use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::NaiveDate;
use serde_json::Value;

use crate::loyalty::domain::{
    AppointmentSnapshot, AppointmentStatus, CustomerId, CustomerProfile, PaymentStatus, Tier,
    TierLadder,
};
use crate::loyalty::promotions::{EligibilityPolicy, Promotion, PromotionUsage, TargetAudience};
use crate::loyalty::repository::{
    CustomerRecord, LoyaltyNotice, LoyaltyRepository, NotificationPublisher, NotifyError,
    RepositoryError,
};
use crate::loyalty::service::{LoyaltyService, NewCustomer};
use crate::loyalty::tiers::TierUpgradeEvaluator;

pub(super) fn three_tier_ladder() -> TierLadder {
    TierLadder::new(vec![
        Tier {
            level: 1,
            name: "Member".to_string(),
            points_required: 0,
            min_spending_required: 0,
        },
        Tier {
            level: 2,
            name: "Silver".to_string(),
            points_required: 500,
            min_spending_required: 5_000_000,
        },
        Tier {
            level: 3,
            name: "Gold".to_string(),
            points_required: 1_500,
            min_spending_required: 15_000_000,
        },
    ])
    .expect("ladder is well formed")
}

pub(super) fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 8, 15).expect("valid date")
}

pub(super) fn profile(suffix: &str, tier_level: u8, total_spending: i64) -> CustomerProfile {
    CustomerProfile {
        customer_id: CustomerId(format!("cust-{suffix}")),
        tier_level,
        total_spending,
        last_tier_upgrade: None,
        birthday: Some(NaiveDate::from_ymd_opt(1994, 8, 15).expect("valid")),
    }
}

pub(super) fn promotion(code: &str, audience: TargetAudience) -> Promotion {
    Promotion {
        code: code.to_string(),
        title: format!("{code} promotion"),
        target_audience: audience,
        expires_on: NaiveDate::from_ymd_opt(2026, 12, 31).expect("valid"),
        is_active: true,
        is_public: true,
        stock: Some(100),
        usage_limit: Some(1),
        usage_count: 0,
        min_order_value: None,
    }
}

pub(super) fn paid_appointment(id: &str, status: AppointmentStatus) -> AppointmentSnapshot {
    AppointmentSnapshot {
        appointment_id: id.to_string(),
        status,
        payment_status: PaymentStatus::Paid,
    }
}

pub(super) fn new_customer(suffix: &str) -> NewCustomer {
    NewCustomer {
        customer_id: CustomerId(format!("cust-{suffix}")),
        birthday: Some(NaiveDate::from_ymd_opt(1994, 8, 15).expect("valid")),
    }
}

pub(super) fn build_service() -> (
    LoyaltyService<MemoryRepository, MemoryNotifications>,
    Arc<MemoryRepository>,
    Arc<MemoryNotifications>,
) {
    let repository = Arc::new(MemoryRepository::default());
    let notifications = Arc::new(MemoryNotifications::default());
    let service = LoyaltyService::new(
        repository.clone(),
        notifications.clone(),
        TierUpgradeEvaluator::new(three_tier_ladder()),
        EligibilityPolicy::new(3),
    );
    (service, repository, notifications)
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

#[derive(Default)]
pub(super) struct MemoryRepository {
    pub(super) customers: Mutex<HashMap<CustomerId, CustomerRecord>>,
    pub(super) promotion_rows: Mutex<HashMap<String, Promotion>>,
    pub(super) usages: Mutex<Vec<PromotionUsage>>,
}

impl MemoryRepository {
    pub(super) fn seed_promotion(&self, promotion: Promotion) {
        self.promotion_rows
            .lock()
            .expect("promotion mutex poisoned")
            .insert(promotion.code.clone(), promotion);
    }
}

impl LoyaltyRepository for MemoryRepository {
    fn insert_customer(&self, record: CustomerRecord) -> Result<CustomerRecord, RepositoryError> {
        let mut guard = self.customers.lock().expect("customer mutex poisoned");
        if guard.contains_key(&record.profile.customer_id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(record.profile.customer_id.clone(), record.clone());
        Ok(record)
    }

    fn update_customer(&self, record: CustomerRecord) -> Result<(), RepositoryError> {
        let mut guard = self.customers.lock().expect("customer mutex poisoned");
        if guard.contains_key(&record.profile.customer_id) {
            guard.insert(record.profile.customer_id.clone(), record);
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
    }

    fn fetch_customer(&self, id: &CustomerId) -> Result<Option<CustomerRecord>, RepositoryError> {
        let guard = self.customers.lock().expect("customer mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn promotions(&self) -> Result<Vec<Promotion>, RepositoryError> {
        let guard = self.promotion_rows.lock().expect("promotion mutex poisoned");
        let mut rows: Vec<Promotion> = guard.values().cloned().collect();
        rows.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(rows)
    }

    fn fetch_promotion(&self, code: &str) -> Result<Option<Promotion>, RepositoryError> {
        let guard = self.promotion_rows.lock().expect("promotion mutex poisoned");
        Ok(guard.get(code).cloned())
    }

    fn upsert_promotion(&self, promotion: Promotion) -> Result<(), RepositoryError> {
        let mut guard = self.promotion_rows.lock().expect("promotion mutex poisoned");
        guard.insert(promotion.code.clone(), promotion);
        Ok(())
    }

    fn record_usage(&self, usage: PromotionUsage) -> Result<(), RepositoryError> {
        self.usages.lock().expect("usage mutex poisoned").push(usage);
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

#[derive(Default)]
pub(super) struct MemoryNotifications {
    events: Mutex<Vec<LoyaltyNotice>>,
}

impl MemoryNotifications {
    pub(super) fn events(&self) -> Vec<LoyaltyNotice> {
        self.events.lock().expect("notice mutex poisoned").clone()
    }
}

impl NotificationPublisher for MemoryNotifications {
    fn publish(&self, notice: LoyaltyNotice) -> Result<(), NotifyError> {
        self.events
            .lock()
            .expect("notice mutex poisoned")
            .push(notice);
        Ok(())
    }
}

pub(super) struct UnavailableRepository;

impl LoyaltyRepository for UnavailableRepository {
    fn insert_customer(&self, _record: CustomerRecord) -> Result<CustomerRecord, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update_customer(&self, _record: CustomerRecord) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch_customer(&self, _id: &CustomerId) -> Result<Option<CustomerRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn promotions(&self) -> Result<Vec<Promotion>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch_promotion(&self, _code: &str) -> Result<Option<Promotion>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn upsert_promotion(&self, _promotion: Promotion) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn record_usage(&self, _usage: PromotionUsage) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn usage_count_for(&self, _code: &str, _customer: &CustomerId) -> Result<u32, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

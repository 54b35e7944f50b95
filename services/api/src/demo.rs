use std::path::PathBuf;
use std::sync::Arc;

use chrono::{Local, NaiveDate};
use clap::Args;
use spa_loyalty::error::AppError;
use spa_loyalty::loyalty::promotions::PromotionCatalog;
use spa_loyalty::loyalty::{
    AppointmentSnapshot, AppointmentStatus, CustomerId, EligibilityPolicy, LoyaltyRepository,
    LoyaltyService, NewCustomer, PaymentEvent, PaymentStatus, Promotion, RedemptionRequest,
    TargetAudience, TierLadder, TierUpgradeEvaluator,
};

use crate::infra::{InMemoryLoyaltyRepository, InMemoryNotificationPublisher};

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Evaluation date for the walkthrough (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) today: Option<NaiveDate>,
    /// Optional catalog CSV export to seed the promotion store.
    #[arg(long)]
    pub(crate) promotions_file: Option<PathBuf>,
    /// Skip the redemption portion of the walkthrough.
    #[arg(long)]
    pub(crate) skip_redemption: bool,
}

#[derive(Args, Debug)]
pub(crate) struct CatalogValidateArgs {
    /// Catalog CSV export to validate
    #[arg(long)]
    pub(crate) file: PathBuf,
}

pub(crate) fn run_catalog_validation(args: CatalogValidateArgs) -> Result<(), AppError> {
    let catalog = PromotionCatalog::from_path(&args.file)?;

    println!("Catalog '{}' is valid.", args.file.display());
    println!("{:<16} {:<14} {:<12} {:>6}", "CODE", "AUDIENCE", "EXPIRES", "STOCK");
    for promotion in catalog.promotions() {
        let stock = promotion
            .stock
            .map(|stock| stock.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<16} {:<14} {:<12} {:>6}",
            promotion.code,
            promotion.target_audience.to_string(),
            promotion.expires_on,
            stock
        );
    }
    println!("{} promotion(s) parsed.", catalog.promotions().len());
    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let today = args.today.unwrap_or_else(|| Local::now().date_naive());

    let repository = Arc::new(InMemoryLoyaltyRepository::default());
    let notifications = Arc::new(InMemoryNotificationPublisher::default());
    let service = LoyaltyService::new(
        repository.clone(),
        notifications.clone(),
        TierUpgradeEvaluator::new(TierLadder::standard()),
        EligibilityPolicy::default(),
    );

    seed_promotions(&repository, args.promotions_file)?;

    println!("=== Spa loyalty walkthrough ({today}) ===\n");

    let customer_id = CustomerId("demo-customer".to_string());
    service.register(NewCustomer {
        customer_id: customer_id.clone(),
        birthday: Some(today),
    })?;
    println!("Registered {} at the entry tier.", customer_id.0);

    for (amount, points) in [(3_000_000, 300), (4_000_000, 400)] {
        let evaluation = service.settle_payment(
            PaymentEvent {
                customer_id: customer_id.clone(),
                amount,
                status: PaymentStatus::Paid,
                points_awarded: points,
            },
            today,
        )?;
        match evaluation {
            Some(evaluation) => {
                for upgrade in &evaluation.upgrades {
                    println!(
                        "Payment of {amount} VND: upgraded {} -> {} ({})",
                        upgrade.from_level, upgrade.to_level, upgrade.tier_name
                    );
                }
            }
            None => println!("Payment of {amount} VND settled, tier unchanged."),
        }
    }

    let status = service.tier_status(&customer_id)?;
    println!(
        "\nStanding: tier {} with {} points and {} VND lifetime spending.",
        status.tier_level, status.points, status.total_spending
    );

    service.record_appointment(
        &customer_id,
        AppointmentSnapshot {
            appointment_id: "demo-appt-1".to_string(),
            status: AppointmentStatus::Completed,
            payment_status: PaymentStatus::Paid,
        },
    )?;

    println!("\nPromotions visible on the public listing:");
    for promotion in service.public_promotions(today)? {
        println!("  {:<16} {}", promotion.code, promotion.title);
    }

    println!("\nPromotions {} can redeem today:", customer_id.0);
    let eligible = service.eligible_promotions(&customer_id, today)?;
    if eligible.is_empty() {
        println!("  (none)");
    }
    for promotion in &eligible {
        println!("  {:<16} {}", promotion.code, promotion.title);
    }

    if !args.skip_redemption {
        if let Some(promotion) = eligible.first() {
            let usage = service.redeem(
                &promotion.code,
                RedemptionRequest {
                    customer_id: customer_id.clone(),
                    appointment_id: "demo-appt-1".to_string(),
                    order_value: 1_000_000,
                },
                today,
            )?;
            println!(
                "\nRedeemed {} against appointment {} at {}.",
                usage.promotion_code, usage.appointment_id, usage.used_at
            );
        }
    }

    let notices = notifications.events();
    if !notices.is_empty() {
        println!("\nNotifications published:");
        for notice in notices {
            println!("  {} for {}: {:?}", notice.template, notice.customer_id.0, notice.details);
        }
    }

    Ok(())
}

fn seed_promotions(
    repository: &InMemoryLoyaltyRepository,
    promotions_file: Option<PathBuf>,
) -> Result<(), AppError> {
    let promotions = match promotions_file {
        Some(path) => PromotionCatalog::from_path(&path)?.into_promotions(),
        None => sample_promotions(),
    };
    for promotion in promotions {
        repository
            .upsert_promotion(promotion)
            .map_err(spa_loyalty::loyalty::LoyaltyServiceError::Repository)?;
    }
    Ok(())
}

fn sample_promotions() -> Vec<Promotion> {
    let far_future = NaiveDate::from_ymd_opt(2099, 12, 31).unwrap_or(NaiveDate::MAX);
    vec![
        Promotion {
            code: "WELCOME10".to_string(),
            title: "10% off any service".to_string(),
            target_audience: TargetAudience::All,
            expires_on: far_future,
            is_active: true,
            is_public: true,
            stock: Some(100),
            usage_limit: Some(1),
            usage_count: 0,
            min_order_value: None,
        },
        Promotion {
            code: "BDAYGLOW".to_string(),
            title: "Birthday facial upgrade".to_string(),
            target_audience: TargetAudience::Birthday,
            expires_on: far_future,
            is_active: true,
            is_public: false,
            stock: None,
            usage_limit: Some(1),
            usage_count: 0,
            min_order_value: None,
        },
        Promotion {
            code: "FIRSTVISIT".to_string(),
            title: "Complimentary head massage on your first visit".to_string(),
            target_audience: TargetAudience::NewClients,
            expires_on: far_future,
            is_active: true,
            is_public: false,
            stock: Some(50),
            usage_limit: Some(1),
            usage_count: 0,
            min_order_value: None,
        },
    ]
}

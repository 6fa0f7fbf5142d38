//! Database integration tests for stock, licenses, component maintenance and issuances
//!
//! Need a running PostgreSQL reachable through DATABASE_URL.
//! Run with: cargo test --test component_maintenance -- --ignored

use assetdesk_server::{
    config::{IssuanceConfig, SequencePolicy},
    models::{
        activity_log::LoggableRef,
        enums::{IssuanceType, PartCondition, PartStatus},
        issuance::{ExistingComponent, NewComponent, OperationRequest, WholeUnitIssuanceRequest},
        part::{InstallPart, PartSpec, RemovePart, UpdatePartDetails},
        software::{InstallSoftware, SoftwareSpec, UninstallSoftware},
    },
    repository::Repository,
    services::Services,
    AppError,
};
use chrono::{Datelike, Utc};
use sqlx::PgPool;
use std::time::Duration;

const TECH: i32 = 1;
const EMPLOYEE: i32 = 2;

fn services(pool: &PgPool) -> Services {
    Services::with_repository(Repository::new(pool.clone()), IssuanceConfig::default())
}

fn ram_spec() -> PartSpec {
    PartSpec {
        part_type: "RAM".to_string(),
        brand: "Kingston".to_string(),
        model: "HX8".to_string(),
        specifications: "16GB".to_string(),
    }
}

fn ram(condition: &str) -> InstallPart {
    InstallPart {
        spec: ram_spec(),
        condition: Some(condition.to_string()),
        serial_number: Some("KS-001".to_string()),
        remarks: None,
    }
}

fn office(license_key: Option<&str>) -> InstallSoftware {
    InstallSoftware {
        spec: SoftwareSpec {
            software_name: "Office".to_string(),
            software_type: "Productivity".to_string(),
            version: "2021".to_string(),
        },
        license_key: license_key.map(String::from),
        account_user: None,
        remarks: None,
    }
}

fn op(hardware_id: i32, operation: &str, component_type: &str) -> OperationRequest {
    OperationRequest {
        hardware_id,
        operation: operation.to_string(),
        component_type: component_type.to_string(),
        component_id: None,
        removal_condition: None,
        part: None,
        software: None,
        issued_to: None,
        reason: None,
        remarks: None,
    }
}

// ---------------------------------------------------------------------------
// Seeding helpers
// ---------------------------------------------------------------------------

async fn seed_employees(pool: &PgPool) {
    sqlx::query("INSERT INTO employees (id, fullname) VALUES (1, 'Tess Tech'), (2, 'Ana Cruz')")
        .execute(pool)
        .await
        .unwrap();
}

async fn seed_hardware(pool: &PgPool, hostname: &str, issued_to: Option<i32>) -> i32 {
    sqlx::query_scalar::<_, i32>(
        "INSERT INTO hardware (hostname, category, issued_to) VALUES ($1, 'Desktop', $2) RETURNING id",
    )
    .bind(hostname)
    .bind(issued_to)
    .fetch_one(pool)
    .await
    .unwrap()
}

async fn seed_part(pool: &PgPool, spec: &PartSpec) -> i32 {
    sqlx::query_scalar::<_, i32>(
        "INSERT INTO parts (part_type, brand, model, specifications) VALUES ($1, $2, $3, $4) RETURNING id",
    )
    .bind(&spec.part_type)
    .bind(&spec.brand)
    .bind(&spec.model)
    .bind(&spec.specifications)
    .fetch_one(pool)
    .await
    .unwrap()
}

async fn seed_stock(pool: &PgPool, part_id: i32, condition: &str, quantity: i32) -> i32 {
    sqlx::query_scalar::<_, i32>(
        "INSERT INTO part_inventories (part_id, condition, quantity) VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(part_id)
    .bind(condition)
    .bind(quantity)
    .fetch_one(pool)
    .await
    .unwrap()
}

async fn quantity(pool: &PgPool, part_id: i32, condition: &str) -> Option<i32> {
    sqlx::query_scalar::<_, i32>(
        "SELECT quantity FROM part_inventories WHERE part_id = $1 AND condition = $2",
    )
    .bind(part_id)
    .bind(condition)
    .fetch_optional(pool)
    .await
    .unwrap()
}

async fn seed_office(pool: &PgPool, requires_key_tracking: bool) -> i32 {
    sqlx::query_scalar::<_, i32>(
        r#"
        INSERT INTO software_inventories (software_name, software_type, version, requires_key_tracking)
        VALUES ('Office', 'Productivity', '2021', $1)
        RETURNING id
        "#,
    )
    .bind(requires_key_tracking)
    .fetch_one(pool)
    .await
    .unwrap()
}

async fn seed_license(pool: &PgPool, software_id: i32, key: &str, max: i32, current: i32) -> i32 {
    sqlx::query_scalar::<_, i32>(
        r#"
        INSERT INTO software_licenses (software_inventory_id, license_key, max_activations, current_activations)
        VALUES ($1, $2, $3, $4)
        RETURNING id
        "#,
    )
    .bind(software_id)
    .bind(key)
    .bind(max)
    .bind(current)
    .fetch_one(pool)
    .await
    .unwrap()
}

async fn activations(pool: &PgPool, license_id: i32) -> i32 {
    let repository = Repository::new(pool.clone());
    repository.software.get_license(license_id).await.unwrap().current_activations
}

async fn count(pool: &PgPool, sql: &str) -> i64 {
    sqlx::query_scalar::<_, i64>(sql).fetch_one(pool).await.unwrap()
}

// ---------------------------------------------------------------------------
// Parts
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_install_part_draws_one_unit(pool: PgPool) {
    let services = services(&pool);
    let hardware_id = seed_hardware(&pool, "PC-ACCT-01", None).await;
    let part_id = seed_part(&pool, &ram_spec()).await;
    let inventory_id = seed_stock(&pool, part_id, "Working", 3).await;

    let details = services
        .components
        .add_component(hardware_id, NewComponent::Part(ram("Working")), TECH)
        .await
        .unwrap();

    assert_eq!(quantity(&pool, part_id, "Working").await, Some(2));
    assert_eq!(details.parts.len(), 1);
    assert_eq!(details.parts[0].condition, "Working");
    assert_eq!(details.parts[0].source_inventory_id, Some(inventory_id));
    assert_eq!(details.parts[0].serial_number.as_deref(), Some("KS-001"));
    assert_eq!(details.parts[0].status(), PartStatus::Installed);

    let hardware_log = services.activity_log.history(LoggableRef::Hardware(hardware_id)).await.unwrap();
    assert_eq!(hardware_log.len(), 1);
    assert_eq!(hardware_log[0].log.action_type, "part_added");

    let stock_log = services
        .activity_log
        .history(LoggableRef::PartInventory(inventory_id))
        .await
        .unwrap();
    assert_eq!(stock_log.len(), 1);
    assert_eq!(stock_log[0].log.action_type, "inventory_decremented");
    assert_eq!(stock_log[0].log.old_values, Some(serde_json::json!({ "quantity": 3 })));
    assert_eq!(stock_log[0].log.new_values, Some(serde_json::json!({ "quantity": 2 })));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_install_part_falls_back_to_other_condition(pool: PgPool) {
    let services = services(&pool);
    let hardware_id = seed_hardware(&pool, "PC-ACCT-02", None).await;
    let part_id = seed_part(&pool, &ram_spec()).await;
    seed_stock(&pool, part_id, "Working", 0).await;
    seed_stock(&pool, part_id, "Used", 1).await;

    let details = services
        .components
        .add_component(hardware_id, NewComponent::Part(ram("Working")), TECH)
        .await
        .unwrap();

    assert_eq!(details.parts[0].condition, "Used");
    assert_eq!(quantity(&pool, part_id, "Used").await, Some(0));
    assert_eq!(quantity(&pool, part_id, "Working").await, Some(0));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_install_part_without_stock_changes_nothing(pool: PgPool) {
    let services = services(&pool);
    let hardware_id = seed_hardware(&pool, "PC-ACCT-03", None).await;
    let part_id = seed_part(&pool, &ram_spec()).await;
    seed_stock(&pool, part_id, "Working", 0).await;

    let err = services
        .components
        .add_component(hardware_id, NewComponent::Part(ram("Working")), TECH)
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::NoInventoryAvailable(_)));
    assert_eq!(count(&pool, "SELECT COUNT(*) FROM hardware_parts").await, 0);
    assert_eq!(count(&pool, "SELECT COUNT(*) FROM activity_logs").await, 0);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_install_unknown_part_is_rejected(pool: PgPool) {
    let services = services(&pool);
    let hardware_id = seed_hardware(&pool, "PC-ACCT-04", None).await;

    let err = services
        .components
        .add_component(hardware_id, NewComponent::Part(ram("Working")), TECH)
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::PartNotFound(_)));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_faulty_removal_returns_part_as_used(pool: PgPool) {
    let services = services(&pool);
    let hardware_id = seed_hardware(&pool, "PC-ACCT-05", None).await;
    let part_id = seed_part(&pool, &ram_spec()).await;
    seed_stock(&pool, part_id, "Working", 1).await;

    let details = services
        .components
        .add_component(hardware_id, NewComponent::Part(ram("Working")), TECH)
        .await
        .unwrap();
    let installed_id = details.parts[0].id;

    let details = services
        .components
        .remove_component(
            hardware_id,
            ExistingComponent::Part(RemovePart {
                hardware_part_id: installed_id,
                removal_condition: Some("faulty".to_string()),
                reason: Some("Memory errors".to_string()),
                remarks: None,
            }),
            TECH,
        )
        .await
        .unwrap();

    assert!(details.parts.is_empty());
    assert_eq!(quantity(&pool, part_id, "Working").await, Some(0));
    assert_eq!(quantity(&pool, part_id, "Used").await, Some(1));

    let actions: Vec<String> = services
        .activity_log
        .history(LoggableRef::Hardware(hardware_id))
        .await
        .unwrap()
        .into_iter()
        .map(|e| e.log.action_type)
        .collect();
    assert_eq!(actions, vec!["part_removed", "part_added"]);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_install_then_working_removal_restores_stock(pool: PgPool) {
    let services = services(&pool);
    let hardware_id = seed_hardware(&pool, "PC-ACCT-06", None).await;
    let part_id = seed_part(&pool, &ram_spec()).await;
    seed_stock(&pool, part_id, "Working", 4).await;

    let details = services
        .components
        .add_component(hardware_id, NewComponent::Part(ram("Working")), TECH)
        .await
        .unwrap();
    services
        .components
        .remove_component(
            hardware_id,
            ExistingComponent::Part(RemovePart {
                hardware_part_id: details.parts[0].id,
                removal_condition: Some("working".to_string()),
                reason: None,
                remarks: None,
            }),
            TECH,
        )
        .await
        .unwrap();

    assert_eq!(quantity(&pool, part_id, "Working").await, Some(4));
    assert_eq!(count(&pool, "SELECT COUNT(*) FROM hardware_parts").await, 0);

    let actions: Vec<String> = services
        .activity_log
        .history(LoggableRef::Hardware(hardware_id))
        .await
        .unwrap()
        .into_iter()
        .map(|e| e.log.action_type)
        .collect();
    assert_eq!(actions, vec!["part_removed", "part_added"]);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_replace_rolls_back_removal_when_install_fails(pool: PgPool) {
    let services = services(&pool);
    let hardware_id = seed_hardware(&pool, "PC-ACCT-07", None).await;
    let part_id = seed_part(&pool, &ram_spec()).await;
    seed_stock(&pool, part_id, "Working", 1).await;

    let details = services
        .components
        .add_component(hardware_id, NewComponent::Part(ram("Working")), TECH)
        .await
        .unwrap();
    let installed_id = details.parts[0].id;

    let ssd_spec = PartSpec {
        part_type: "SSD".to_string(),
        brand: "Samsung".to_string(),
        model: "870 EVO".to_string(),
        specifications: "500GB".to_string(),
    };
    let ssd_id = seed_part(&pool, &ssd_spec).await;
    seed_stock(&pool, ssd_id, "Working", 0).await;
    let logs_before = count(&pool, "SELECT COUNT(*) FROM activity_logs").await;

    let ssd = InstallPart {
        spec: ssd_spec,
        condition: None,
        serial_number: None,
        remarks: None,
    };
    let err = services
        .components
        .replace_component(
            hardware_id,
            ExistingComponent::Part(RemovePart {
                hardware_part_id: installed_id,
                removal_condition: Some("defective".to_string()),
                reason: None,
                remarks: None,
            }),
            NewComponent::Part(ssd),
            TECH,
        )
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::NoInventoryAvailable(_)));
    let details = services.components.hardware_details(hardware_id).await.unwrap();
    assert_eq!(details.parts.len(), 1);
    assert_eq!(details.parts[0].id, installed_id);
    assert_eq!(details.parts[0].status(), PartStatus::Installed);
    assert_eq!(quantity(&pool, part_id, "Working").await, Some(0));
    assert_eq!(quantity(&pool, part_id, "Defective").await, None);
    assert_eq!(quantity(&pool, ssd_id, "Working").await, Some(0));
    assert_eq!(count(&pool, "SELECT COUNT(*) FROM activity_logs").await, logs_before);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_reserving_a_part_does_not_touch_stock(pool: PgPool) {
    let services = services(&pool);
    let part_id = seed_part(&pool, &ram_spec()).await;
    let inventory_id = seed_stock(&pool, part_id, "Working", 3).await;

    for _ in 0..2 {
        let mut tx = pool.begin().await.unwrap();
        let unit = services
            .allocator
            .reserve_component(&mut tx, &ram_spec(), PartCondition::Working)
            .await
            .unwrap();
        tx.commit().await.unwrap();

        assert_eq!(unit.inventory.id, inventory_id);
        assert_eq!(unit.condition, PartCondition::Working);
        assert!(!unit.fell_back);
    }

    assert_eq!(quantity(&pool, part_id, "Working").await, Some(3));
    assert_eq!(count(&pool, "SELECT COUNT(*) FROM activity_logs").await, 0);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_deadlock_victim_reports_contention(pool: PgPool) {
    let part_id = seed_part(&pool, &ram_spec()).await;
    let working = seed_stock(&pool, part_id, "Working", 1).await;
    let used = seed_stock(&pool, part_id, "Used", 1).await;
    let lock = "SELECT id FROM part_inventories WHERE id = $1 FOR UPDATE";

    let mut first = pool.begin().await.unwrap();
    let mut second = pool.begin().await.unwrap();
    sqlx::query(lock).bind(working).execute(&mut *first).await.unwrap();
    sqlx::query(lock).bind(used).execute(&mut *second).await.unwrap();

    // Each transaction now waits on the row the other holds
    let (a, b) = tokio::join!(
        sqlx::query(lock).bind(used).execute(&mut *first),
        async {
            tokio::time::sleep(Duration::from_millis(200)).await;
            sqlx::query(lock).bind(working).execute(&mut *second).await
        },
    );

    let errors: Vec<AppError> = [a.err(), b.err()].into_iter().flatten().map(AppError::from).collect();
    assert_eq!(errors.len(), 1);
    assert!(matches!(errors[0], AppError::Contention(_)), "unexpected {:?}", errors[0]);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_update_part_details_is_audited(pool: PgPool) {
    let services = services(&pool);
    let hardware_id = seed_hardware(&pool, "PC-ACCT-08", None).await;
    let part_id = seed_part(&pool, &ram_spec()).await;
    seed_stock(&pool, part_id, "Working", 1).await;

    let details = services
        .components
        .add_component(hardware_id, NewComponent::Part(ram("Working")), TECH)
        .await
        .unwrap();

    let updated = services
        .components
        .update_part_details(
            hardware_id,
            details.parts[0].id,
            &UpdatePartDetails {
                serial_number: Some("KS-999".to_string()),
                remarks: None,
            },
            TECH,
        )
        .await
        .unwrap();

    assert_eq!(updated.serial_number.as_deref(), Some("KS-999"));
    assert_eq!(quantity(&pool, part_id, "Working").await, Some(0));

    let history = services.activity_log.history(LoggableRef::Hardware(hardware_id)).await.unwrap();
    assert_eq!(history[0].log.action_type, "part_updated");
    assert_eq!(history[0].log.old_values.as_ref().unwrap()["serial_number"], "KS-001");
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_concurrent_installs_never_oversell(pool: PgPool) {
    let services = services(&pool);
    let part_id = seed_part(&pool, &ram_spec()).await;
    seed_stock(&pool, part_id, "Working", 5).await;

    let mut hardware_ids = Vec::new();
    for i in 0..8 {
        hardware_ids.push(seed_hardware(&pool, &format!("PC-LAB-{:02}", i), None).await);
    }

    let tasks: Vec<_> = hardware_ids
        .into_iter()
        .map(|hardware_id| {
            let services = services.clone();
            tokio::spawn(async move {
                services
                    .components
                    .add_component(hardware_id, NewComponent::Part(ram("Working")), TECH)
                    .await
            })
        })
        .collect();

    let mut installed = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(_) => installed += 1,
            Err(e) => assert!(matches!(e, AppError::NoInventoryAvailable(_)), "unexpected {:?}", e),
        }
    }

    assert_eq!(installed, 5);
    assert_eq!(quantity(&pool, part_id, "Working").await, Some(0));
    assert_eq!(count(&pool, "SELECT COUNT(*) FROM hardware_parts").await, 5);
}

// ---------------------------------------------------------------------------
// Software and licenses
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_software_install_and_uninstall_track_activations(pool: PgPool) {
    let services = services(&pool);
    let hardware_id = seed_hardware(&pool, "PC-HR-01", None).await;
    let software_id = seed_office(&pool, true).await;
    let license_id = seed_license(&pool, software_id, "OFF-2021-AAAA", 2, 0).await;

    let details = services
        .components
        .add_component(hardware_id, NewComponent::Software(office(Some("OFF-2021-AAAA"))), TECH)
        .await
        .unwrap();
    assert_eq!(activations(&pool, license_id).await, 1);
    assert_eq!(details.software[0].license_key.as_deref(), Some("OFF-2021-AAAA"));

    services
        .components
        .remove_component(
            hardware_id,
            ExistingComponent::Software(UninstallSoftware {
                hardware_software_id: details.software[0].id,
                reason: Some("Reimaged".to_string()),
                remarks: None,
            }),
            TECH,
        )
        .await
        .unwrap();
    assert_eq!(activations(&pool, license_id).await, 0);

    let license_log = services
        .activity_log
        .history(LoggableRef::SoftwareLicense(license_id))
        .await
        .unwrap();
    let actions: Vec<&str> = license_log.iter().map(|e| e.log.action_type.as_str()).collect();
    assert_eq!(actions, vec!["license_released", "license_activated"]);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_exhausted_license_is_refused(pool: PgPool) {
    let services = services(&pool);
    let hardware_id = seed_hardware(&pool, "PC-HR-02", None).await;
    let software_id = seed_office(&pool, true).await;
    let license_id = seed_license(&pool, software_id, "OFF-2021-BBBB", 1, 1).await;

    let err = services
        .components
        .add_component(hardware_id, NewComponent::Software(office(Some("OFF-2021-BBBB"))), TECH)
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::LicenseExhausted(_)));
    assert_eq!(activations(&pool, license_id).await, 1);
    assert_eq!(count(&pool, "SELECT COUNT(*) FROM hardware_software").await, 0);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_tracked_software_requires_license_identifier(pool: PgPool) {
    let services = services(&pool);
    let hardware_id = seed_hardware(&pool, "PC-HR-03", None).await;
    seed_office(&pool, true).await;

    let err = services
        .components
        .add_component(hardware_id, NewComponent::Software(office(None)), TECH)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::LicenseIdentifierMissing(_)));

    let err = services
        .components
        .add_component(hardware_id, NewComponent::Software(office(Some("NOPE"))), TECH)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::LicenseNotFound(_)));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_untracked_software_needs_no_license(pool: PgPool) {
    let services = services(&pool);
    let hardware_id = seed_hardware(&pool, "PC-HR-04", None).await;
    seed_office(&pool, false).await;

    let details = services
        .components
        .add_component(hardware_id, NewComponent::Software(office(None)), TECH)
        .await
        .unwrap();

    assert_eq!(details.software.len(), 1);
    assert_eq!(details.software[0].software_license_id, None);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_license_release_at_zero_is_clamped(pool: PgPool) {
    let services = services(&pool);
    let software_id = seed_office(&pool, true).await;
    let license_id = seed_license(&pool, software_id, "OFF-2021-CCCC", 3, 0).await;

    let mut tx = pool.begin().await.unwrap();
    let license = services
        .ledger
        .decrement_license_activation(&mut tx, license_id, 1, "Cleanup", TECH)
        .await
        .unwrap();
    tx.commit().await.unwrap();

    assert_eq!(license.current_activations, 0);
    assert_eq!(count(&pool, "SELECT COUNT(*) FROM activity_logs").await, 0);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_activation_past_the_ceiling_is_refused(pool: PgPool) {
    let services = services(&pool);
    let software_id = seed_office(&pool, true).await;
    let license_id = seed_license(&pool, software_id, "OFF-2021-DDDD", 3, 2).await;

    let mut tx = pool.begin().await.unwrap();
    let err = services
        .ledger
        .increment_license_activation(&mut tx, license_id, 2, "Lab rollout", TECH)
        .await
        .unwrap_err();
    drop(tx);

    assert!(matches!(err, AppError::LicenseExhausted(_)));
    assert_eq!(activations(&pool, license_id).await, 2);
    assert_eq!(count(&pool, "SELECT COUNT(*) FROM activity_logs").await, 0);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_decrement_beyond_stock_is_refused(pool: PgPool) {
    let services = services(&pool);
    let part_id = seed_part(&pool, &ram_spec()).await;
    let inventory_id = seed_stock(&pool, part_id, "Working", 1).await;

    let mut tx = pool.begin().await.unwrap();
    let err = services
        .ledger
        .decrement_inventory(&mut tx, inventory_id, 2, "Audit correction", TECH, None)
        .await
        .unwrap_err();
    drop(tx);

    assert!(matches!(err, AppError::InsufficientStock(_)));
    assert_eq!(quantity(&pool, part_id, "Working").await, Some(1));
}

// ---------------------------------------------------------------------------
// Issuances
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_component_maintenance_records_one_issuance(pool: PgPool) {
    seed_employees(&pool).await;
    let services = services(&pool);
    let hardware_id = seed_hardware(&pool, "PC-OPS-01", Some(EMPLOYEE)).await;
    let part_id = seed_part(&pool, &ram_spec()).await;
    seed_stock(&pool, part_id, "Working", 2).await;
    let software_id = seed_office(&pool, true).await;
    seed_license(&pool, software_id, "OFF-2021-DDDD", 5, 0).await;

    let mut add_ram = op(hardware_id, "add", "part");
    add_ram.part = Some(ram("Working"));
    add_ram.reason = Some("Upgrade".to_string());
    let mut add_office = op(hardware_id, "add", "software");
    add_office.software = Some(office(Some("OFF-2021-DDDD")));

    let result = services
        .issuances
        .process_component_maintenance(&[add_ram, add_office], TECH)
        .await;
    assert!(result.success, "{}", result.message);

    let summary = &result.data.unwrap()[0];
    assert_eq!(summary.issuance_number, format!("ISS-{}-0001", Utc::now().year()));

    let details = services.issuances.get_issuance(summary.id).await.unwrap();
    assert_eq!(details.issuance.issued_to, EMPLOYEE);
    assert_eq!(details.issuance.issuance_type(), IssuanceType::ComponentMaintenance);
    assert_eq!(details.components.len(), 2);
    assert_eq!(details.components[0].operation_type, "add");
    assert_eq!(details.components[0].reason.as_deref(), Some("Upgrade"));
    assert!(details.components[1].new_component.is_some());
    assert_eq!(details.acknowledgement.unwrap().acknowledged_by, EMPLOYEE);

    let pending = services.issuances.pending_for_employee(EMPLOYEE).await.unwrap();
    assert_eq!(pending.len(), 1);

    let issuance_log = services
        .activity_log
        .history(LoggableRef::Issuance(summary.id))
        .await
        .unwrap();
    assert_eq!(issuance_log[0].log.action_type, "issuance_created");
    assert_eq!(issuance_log[0].actor_name, "Tess Tech");
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_failed_batch_leaves_no_trace(pool: PgPool) {
    let services = services(&pool);
    let hardware_id = seed_hardware(&pool, "PC-OPS-02", None).await;
    let part_id = seed_part(&pool, &ram_spec()).await;
    seed_stock(&pool, part_id, "Working", 2).await;
    let software_id = seed_office(&pool, true).await;
    seed_license(&pool, software_id, "OFF-2021-EEEE", 1, 1).await;

    let mut add_ram = op(hardware_id, "add", "part");
    add_ram.part = Some(ram("Working"));
    let mut add_office = op(hardware_id, "add", "software");
    add_office.software = Some(office(Some("OFF-2021-EEEE")));

    let result = services
        .issuances
        .process_component_maintenance(&[add_ram, add_office], TECH)
        .await;

    assert!(!result.success);
    assert!(result.message.contains("License exhausted"));
    assert_eq!(quantity(&pool, part_id, "Working").await, Some(2));
    assert_eq!(count(&pool, "SELECT COUNT(*) FROM hardware_parts").await, 0);
    assert_eq!(count(&pool, "SELECT COUNT(*) FROM issuances").await, 0);
    assert_eq!(count(&pool, "SELECT COUNT(*) FROM activity_logs").await, 0);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_batch_across_two_units_is_rejected_upfront(pool: PgPool) {
    let services = services(&pool);
    let first = seed_hardware(&pool, "PC-OPS-03", None).await;
    let second = seed_hardware(&pool, "PC-OPS-04", None).await;

    let mut a = op(first, "add", "part");
    a.part = Some(ram("Working"));
    let mut b = op(second, "add", "part");
    b.part = Some(ram("Working"));

    let result = services.issuances.process_component_maintenance(&[a, b], TECH).await;
    assert!(!result.success);
    assert!(result.message.contains("same hardware"));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_concurrent_issuances_get_distinct_numbers(pool: PgPool) {
    let services = services(&pool);
    let mut hostnames = Vec::new();
    for i in 0..8 {
        let hostname = format!("PC-POOL-{:02}", i);
        seed_hardware(&pool, &hostname, None).await;
        hostnames.push(hostname);
    }

    let tasks: Vec<_> = hostnames
        .into_iter()
        .map(|hostname| {
            let services = services.clone();
            tokio::spawn(async move {
                let request = WholeUnitIssuanceRequest {
                    hostnames: vec![hostname],
                    issued_to: EMPLOYEE,
                    location: Some("3F".to_string()),
                    remarks: None,
                };
                services.issuances.record_whole_unit_issuance(&request, TECH).await
            })
        })
        .collect();

    let mut numbers = Vec::new();
    for task in tasks {
        numbers.extend(task.await.unwrap().unwrap().into_iter().map(|s| s.issuance_number));
    }
    numbers.sort();

    let year = Utc::now().year();
    let expected: Vec<String> = (1..=8).map(|n| format!("ISS-{}-{:04}", year, n)).collect();
    assert_eq!(numbers, expected);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_continuous_policy_keeps_counting(pool: PgPool) {
    let config = IssuanceConfig {
        prefix: "ISS".to_string(),
        sequence_policy: SequencePolicy::Continuous,
    };
    let services = Services::with_repository(Repository::new(pool.clone()), config);
    let hardware_id = seed_hardware(&pool, "PC-ARCH-01", None).await;
    sqlx::query(
        "INSERT INTO issuances (issuance_number, issuance_type, hardware_id, issued_to, created_by) VALUES ('ISS-2000-0041', 0, $1, 2, 1)",
    )
    .bind(hardware_id)
    .execute(&pool)
    .await
    .unwrap();

    let mut tx = pool.begin().await.unwrap();
    let number = services.numbers.next_issuance_number(&mut tx).await.unwrap();
    assert_eq!(number, format!("ISS-{}-0042", Utc::now().year()));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_whole_unit_issuance_is_all_or_nothing(pool: PgPool) {
    let services = services(&pool);
    let hardware_id = seed_hardware(&pool, "PC-FIN-01", None).await;

    let request = WholeUnitIssuanceRequest {
        hostnames: vec!["PC-FIN-01".to_string(), "PC-MISSING".to_string()],
        issued_to: EMPLOYEE,
        location: Some("Finance".to_string()),
        remarks: None,
    };
    let result = services.issuances.create_whole_unit_issuance(&request, TECH).await;

    assert!(!result.success);
    assert_eq!(count(&pool, "SELECT COUNT(*) FROM issuances").await, 0);
    let details = services.components.hardware_details(hardware_id).await.unwrap();
    assert_eq!(details.hardware.issued_to, None);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_whole_unit_issuance_assigns_units(pool: PgPool) {
    let services = services(&pool);
    let hardware_id = seed_hardware(&pool, "PC-FIN-02", None).await;

    let request = WholeUnitIssuanceRequest {
        hostnames: vec!["PC-FIN-02".to_string()],
        issued_to: EMPLOYEE,
        location: Some("Finance".to_string()),
        remarks: Some("New hire".to_string()),
    };
    let result = services.issuances.create_whole_unit_issuance(&request, TECH).await;
    assert!(result.success, "{}", result.message);

    let details = services.components.hardware_details(hardware_id).await.unwrap();
    assert_eq!(details.hardware.issued_to, Some(EMPLOYEE));
    assert_eq!(details.hardware.location.as_deref(), Some("Finance"));

    let hardware_log = services.activity_log.history(LoggableRef::Hardware(hardware_id)).await.unwrap();
    assert_eq!(hardware_log[0].log.action_type, "hardware_assigned");
    assert_eq!(hardware_log[0].actor_name, format!("Employee #{}", TECH));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_acknowledgement_rules(pool: PgPool) {
    let services = services(&pool);
    seed_hardware(&pool, "PC-FIN-03", None).await;

    let request = WholeUnitIssuanceRequest {
        hostnames: vec!["PC-FIN-03".to_string()],
        issued_to: EMPLOYEE,
        location: None,
        remarks: None,
    };
    let issued = services
        .issuances
        .record_whole_unit_issuance(&request, TECH)
        .await
        .unwrap();
    let issuance_id = issued[0].id;

    let outcome = services.issuances.acknowledge(issuance_id, TECH).await.unwrap();
    assert!(!outcome.success);

    let outcome = services.issuances.acknowledge(issuance_id, EMPLOYEE).await.unwrap();
    assert!(outcome.success);
    assert!(outcome.acknowledgement.unwrap().acknowledged_at.is_some());

    let outcome = services.issuances.acknowledge(issuance_id, EMPLOYEE).await.unwrap();
    assert!(!outcome.success);
    assert!(outcome.message.contains("already"));

    assert!(services.issuances.pending_for_employee(EMPLOYEE).await.unwrap().is_empty());
}

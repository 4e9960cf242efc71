use tote_core::OrderId;
use tote_dispatch::DeliveryStatus;
use tote_sim::SimState;
use tote_store::{Config, FileReportWriter, ReportFormat};

fn config(report_dir: &std::path::Path, deliveries: usize, couriers: usize) -> Config {
    let couriers: String = (0..couriers)
        .map(|i| {
            format!("[[seed.couriers]]\nname = \"Courier {i}\"\nvehicle_type = \"bike\"\n\n")
        })
        .collect();

    Config::from_toml_str(&format!(
        r#"
        [simulation]
        deliveries = {deliveries}
        transit_millis = 5000

        [report]
        directory = "{dir}"
        format = "text"

        [[seed.customers]]
        name = "Ada"
        email = "ada@example.com"
        is_vip = true

        [[seed.customers]]
        name = "Grace"
        email = "grace@example.com"

        [[seed.products]]
        name = "Runner"
        category = "Shoes"
        price = 100.0
        stock = 2

        [[seed.products]]
        name = "Mug"
        category = "Kitchen"
        price = 10.0
        stock = 50

{couriers}
        "#,
        dir = report_dir.display(),
    ))
    .unwrap()
}

#[tokio::test(start_paused = true)]
async fn test_full_run_with_enough_couriers() {
    let dir = tempfile::tempdir().unwrap();
    let state = SimState::new(config(dir.path(), 4, 4));

    let summary = state.run(&FileReportWriter::new(ReportFormat::Text)).await.unwrap();

    assert_eq!(summary.seeded.customers, 2);
    assert_eq!(summary.seeded.couriers, 4);
    assert_eq!(summary.orders_placed, 4);
    assert_eq!(summary.orders_rejected, 0);
    assert_eq!(summary.batch.delivered(), 4);

    // Runner, Mug, Runner, Mug
    assert!((summary.total_revenue - 220.0).abs() < 1e-9);
    assert!((summary.mean_order_value - 55.0).abs() < 1e-9);
    assert_eq!(summary.highest_value_order, Some(OrderId(1)));
    // Ada (vip) buys the runners: 2 * 70; Grace buys the mugs: 2 * 10
    assert!((summary.discounted_revenue - 160.0).abs() < 1e-9);

    let body = tokio::fs::read_to_string(&summary.report_path).await.unwrap();
    assert_eq!(body.lines().count(), 4);
    assert_eq!(state.couriers.list_available().len(), 4);
    assert!(state
        .dispatcher
        .list_deliveries()
        .iter()
        .all(|d| d.status == DeliveryStatus::Delivered));
}

#[tokio::test(start_paused = true)]
async fn test_run_with_scarce_couriers_and_stock() {
    let dir = tempfile::tempdir().unwrap();
    let state = SimState::new(config(dir.path(), 6, 2));

    let summary = state.run(&FileReportWriter::new(ReportFormat::Text)).await.unwrap();

    // Runner stock is 2, so the third runner order is rejected
    assert_eq!(summary.orders_placed, 5);
    assert_eq!(summary.orders_rejected, 1);
    assert_eq!(state.inventory.list_all()[0].stock, 0);

    assert_eq!(summary.batch.tasks.len(), 5);
    assert_eq!(summary.batch.delivered(), 2);
    assert_eq!(summary.batch.skipped(), 3);
    assert!(summary.batch.faults().is_empty());

    let body = tokio::fs::read_to_string(&summary.report_path).await.unwrap();
    assert_eq!(body.lines().count(), 2);
    assert_eq!(state.couriers.list_available().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_journal_records_every_mutation() {
    let dir = tempfile::tempdir().unwrap();
    let state = SimState::new(config(dir.path(), 2, 1));

    state.run(&FileReportWriter::default()).await.unwrap();

    let actions: Vec<String> = state.journal.history().into_iter().map(|e| e.action).collect();
    assert_eq!(actions.len(), 2 + 2 + 1 + 2);
    assert_eq!(actions.first().map(String::as_str), Some("Added Customer 1"));
    assert_eq!(actions.last().map(String::as_str), Some("Created Order 2"));
}

#[tokio::test]
async fn test_nothing_to_order_without_seed() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::from_toml_str(&format!(
        "[simulation]\ndeliveries = 3\ntransit_millis = 1\n[report]\ndirectory = \"{}\"\n",
        dir.path().display()
    ))
    .unwrap();
    let state = SimState::new(config);

    let summary = state.run(&FileReportWriter::default()).await.unwrap();

    assert_eq!(summary.orders_placed, 0);
    assert_eq!(summary.orders_rejected, 3);
    assert!(summary.batch.tasks.is_empty());
    assert_eq!(summary.highest_value_order, None);
    assert_eq!(summary.mean_order_value, 0.0);
}

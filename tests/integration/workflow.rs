//! Full equipment workflows: load, derive views, edit through the form

use equipment_inventory::{
    domain::{
        form::{EquipmentForm, Submission},
        listing::{derive_view, highlight, FilterCriteria},
    },
    models::{EquipmentField, EquipmentStatus},
    transport::MemoryTransport,
    AppError, EquipmentService,
};
use serde_json::{json, Value};
use tokio_test::{assert_err, assert_ok};

fn laptop() -> Value {
    json!({
        "id": "E001",
        "name": "Laptop",
        "category": "電子機器",
        "status": "利用可能",
        "quantity": 3,
        "storageLocation": "倉庫A",
        "purchaseDate": "2023-05-15",
        "createdAt": "2023-05-15T09:00:00.000Z",
        "updatedAt": "2023-05-15T09:00:00.000Z"
    })
}

fn chair() -> Value {
    json!({
        "id": "E002",
        "name": "Chair",
        "category": "オフィス家具",
        "status": "貸出中",
        "quantity": 1,
        "storageLocation": "会議室B",
        "purchaseDate": "2021-01-20",
        "borrower": "Suzuki",
        "createdAt": "2021-01-20T09:00:00.000Z",
        "updatedAt": "2022-03-01T09:00:00.000Z",
        "notes": null
    })
}

fn service() -> EquipmentService<MemoryTransport> {
    EquipmentService::new(MemoryTransport::seeded(vec![laptop(), chair()]))
}

#[tokio::test]
async fn test_search_view_and_statistics() {
    let service = service();
    let items = assert_ok!(service.list().await);

    let criteria = FilterCriteria {
        query: "suzuki".to_string(),
        ..Default::default()
    };
    let view = derive_view(&items, &criteria);
    assert_eq!(view.items.len(), 1);
    assert_eq!(view.items[0].name(), "Chair");
    assert_eq!(view.stats.total, 2);
    assert_eq!(view.stats.filtered, 1);
    assert_eq!(view.stats.by_status.available, 1);
    assert_eq!(view.stats.by_status.on_loan, 1);

    let on_loan = derive_view(
        &items,
        &FilterCriteria {
            status: Some(EquipmentStatus::OnLoan),
            ..Default::default()
        },
    );
    assert_eq!(on_loan.items.len(), 1);
    assert_eq!(on_loan.items[0].id(), view.items[0].id());

    let segments = highlight(view.items[0].borrower().unwrap_or_default(), &criteria.query);
    assert_eq!(segments.len(), 1);
    assert!(segments[0].matched);
}

#[tokio::test]
async fn test_invalid_payload_rejects_list() {
    let mut broken = laptop();
    broken["quantity"] = json!("three");
    let service = EquipmentService::new(MemoryTransport::seeded(vec![broken, chair()]));

    let err = assert_err!(service.list().await);
    match err {
        AppError::Schema(schema) => assert!(schema.has_field("[0].quantity")),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_create_through_form() {
    let service = service();
    let mut form = EquipmentForm::create();
    assert_ok!(form.input(EquipmentField::Name, "  プロジェクター "));
    assert_ok!(form.input(EquipmentField::StorageLocation, "備品庫"));
    assert_ok!(form.input(EquipmentField::Quantity, "2"));
    assert_eq!(form.completion_rate(), 100);

    let data = match assert_ok!(form.submit()) {
        Submission::Create(data) => data,
        other => panic!("unexpected submission: {other:?}"),
    };
    let created = assert_ok!(service.create(data).await);
    assert_eq!(created.name(), "プロジェクター");
    assert_eq!(created.quantity(), 2);

    let items = assert_ok!(service.list().await);
    assert_eq!(items.len(), 3);
    let fetched = assert_ok!(service.get(created.id()).await);
    assert_eq!(fetched.record(), created.record());
}

#[tokio::test]
async fn test_edit_lend_and_return() {
    let service = service();
    let laptop = assert_ok!(service.get("E001").await);

    let mut form = assert_ok!(EquipmentForm::edit(&laptop));
    assert_ok!(form.input(EquipmentField::Status, "貸出中"));
    let blocked = form.submit();
    assert!(blocked.is_err());

    assert_ok!(form.input(EquipmentField::Borrower, "田中"));
    let (id, changes) = match assert_ok!(form.submit()) {
        Submission::Update { id, changes } => (id, changes),
        other => panic!("unexpected submission: {other:?}"),
    };
    assert_eq!(id, "E001");
    assert_eq!(changes.name, None);

    let lent = assert_ok!(service.update(&laptop, changes).await);
    assert_eq!(lent.status(), EquipmentStatus::OnLoan);
    assert_eq!(lent.borrower(), Some("田中"));
    assert_eq!(lent.record().created_at, laptop.record().created_at);

    assert!(matches!(
        service.delete(&lent).await,
        Err(AppError::BusinessRule(_))
    ));

    let returned = assert_ok!(service.return_item(&lent).await);
    assert_eq!(returned.status(), EquipmentStatus::Available);
    assert_eq!(returned.borrower(), None);

    assert_ok!(service.delete(&returned).await);
    assert!(matches!(service.get("E001").await, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn test_lend_directly() {
    let service = service();
    let laptop = assert_ok!(service.get("E001").await);
    let lent = assert_ok!(service.lend(&laptop, "佐藤").await);
    assert!(lent.can_be_returned());
    assert!(lent.has_consistent_data());

    let chair = assert_ok!(service.get("E002").await);
    assert!(matches!(
        service.lend(&chair, "佐藤").await,
        Err(AppError::BusinessRule(_))
    ));
}

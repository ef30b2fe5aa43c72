//! Repository Integration Tests
//!
//! Exercises the base/tenant/tenant+target layers against the in-memory
//! store engine: tenant isolation, alias consistency, pagination, index
//! selection, and target-scoped reads.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use tp_common::{SessionUser, TsidGenerator};
use tp_repository::{
    fields, FieldSelection, FieldSpec, ModelConfig, ModelRegistry, RepoError, SortKeyParams,
    TenantRepository, TenantTargetRepository, WhereParams,
};
use tp_store::{FilterMap, MemoryStore, PageRequest, SortDirection, StoreEngine, StoreError};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Product {
    id: String,
    tenant_id: String,
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    barcode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sk01: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    created_at_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    created_at_day_stamp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    record_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    creator_user_id: Option<String>,
}

impl Product {
    fn new(tenant_id: &str, name: &str) -> Self {
        Self {
            id: TsidGenerator::generate(),
            tenant_id: tenant_id.to_string(),
            name: name.to_string(),
            barcode: None,
            sk01: None,
            created_at_date: None,
            created_at_day_stamp: None,
            record_date: None,
            creator_user_id: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Payment {
    id: String,
    tenant_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    order_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    target_id: Option<String>,
    amount_cents: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    created_at_date: Option<String>,
}

impl Payment {
    fn new(tenant_id: &str, order_id: &str, amount_cents: i64) -> Self {
        Self {
            id: TsidGenerator::generate(),
            tenant_id: tenant_id.to_string(),
            order_id: Some(order_id.to_string()),
            target_id: None,
            amount_cents,
            created_at_date: None,
        }
    }
}

fn product_repo(store: Arc<MemoryStore>) -> TenantRepository<Product> {
    let mut registry = ModelRegistry::new();
    let model = registry
        .register(
            ModelConfig::new("ProductModel", "till_main")
                .with_field("name", FieldSpec::required())
                .with_field("barcode", FieldSpec::optional())
                .with_field("tenantId", FieldSpec::required())
                .with_alias("barcode", "sk01")
                .with_strict_required("name")
                .with_strict_required(fields::TENANT_ID),
        )
        .unwrap();
    TenantRepository::new(store, model)
}

fn payment_repo(store: Arc<MemoryStore>) -> TenantTargetRepository<Payment> {
    let mut registry = ModelRegistry::new();
    let model = registry
        .register(
            ModelConfig::new("PaymentModel", "till_main")
                .with_field("orderId", FieldSpec::required())
                .with_field("amountCents", FieldSpec::required())
                .with_field("tenantId", FieldSpec::required())
                .with_alias("orderId", "targetId")
                .with_strict_required(fields::TENANT_ID),
        )
        .unwrap();
    TenantTargetRepository::new(store, model)
}

fn session(tenant_id: &str) -> SessionUser {
    SessionUser::new("user-1").with_tenant(tenant_id)
}

mod tenant_isolation_tests {
    use super::*;

    #[tokio::test]
    async fn test_cross_tenant_point_read_misses() {
        let repo = product_repo(Arc::new(MemoryStore::new()));
        let created = repo
            .create_one(&Product::new("tenant-a", "Espresso"), Some(&session("tenant-a")))
            .await
            .unwrap();

        let miss = repo
            .get_one_by_id_and_tenant_id(&created.id, "tenant-b")
            .await
            .unwrap();
        assert!(miss.is_none());

        let hit = repo
            .get_one_by_id_and_tenant_id(&created.id, "tenant-a")
            .await
            .unwrap();
        assert_eq!(hit.unwrap().name, "Espresso");
    }

    #[tokio::test]
    async fn test_list_reads_are_tenant_scoped() {
        let repo = product_repo(Arc::new(MemoryStore::new()));
        for (tenant, name) in [("tenant-a", "Espresso"), ("tenant-a", "Filter"), ("tenant-b", "Decaf")] {
            repo.create_one(&Product::new(tenant, name), Some(&session(tenant)))
                .await
                .unwrap();
        }

        let a_rows = repo.get_where("tenant-a", WhereParams::default()).await.unwrap();
        assert_eq!(a_rows.len(), 2);
        assert!(a_rows.iter().all(|p| p.tenant_id == "tenant-a"));

        let b_rows = repo.get_where("tenant-b", WhereParams::default()).await.unwrap();
        assert_eq!(b_rows.len(), 1);
        assert_eq!(b_rows[0].name, "Decaf");
    }

    #[tokio::test]
    async fn test_cross_tenant_update_fails_conditional_check() {
        let repo = product_repo(Arc::new(MemoryStore::new()));
        let created = repo
            .create_one(&Product::new("tenant-a", "Espresso"), Some(&session("tenant-a")))
            .await
            .unwrap();

        let err = repo
            .update_one(
                &created.id,
                json!({"name": "Hijacked"}),
                Some(&session("tenant-b")),
                Vec::new(),
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RepoError::Store(StoreError::ConditionalCheckFailed { .. })
        ));

        // The row is untouched.
        let row = repo
            .get_one_by_id_and_tenant_id(&created.id, "tenant-a")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row.name, "Espresso");

        // The right tenant goes through.
        let updated = repo
            .update_one(
                &created.id,
                json!({"name": "Espresso Doppio"}),
                Some(&session("tenant-a")),
                Vec::new(),
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Espresso Doppio");
    }

    #[tokio::test]
    async fn test_update_cannot_reassign_tenant() {
        let store = Arc::new(MemoryStore::new());
        let repo = product_repo(store.clone());
        let created = repo
            .create_one(&Product::new("tenant-a", "Espresso"), Some(&session("tenant-a")))
            .await
            .unwrap();

        // A patch naming tenantId must not move the row; the rest of the
        // patch still applies.
        repo.update_one(
            &created.id,
            json!({"tenantId": "tenant-b", "name": "Espresso Lungo"}),
            Some(&session("tenant-a")),
            Vec::new(),
        )
        .await
        .unwrap();

        let row = store
            .get_one_by_id("till_main", &created.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row["tenantId"], json!("tenant-a"));
        assert_eq!(row["featureEntityTenantId"], json!("product#tenant-a"));
        assert_eq!(row["name"], json!("Espresso Lungo"));

        // The other tenant still cannot see it.
        assert!(repo
            .get_one_by_id_and_tenant_id(&created.id, "tenant-b")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_create_requires_tenant_id() {
        let repo = product_repo(Arc::new(MemoryStore::new()));
        let mut orphan = Product::new("", "Espresso");
        orphan.tenant_id = String::new();

        let err = repo.create_one(&orphan, None).await.unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn test_tenant_partition_scan() {
        let repo = product_repo(Arc::new(MemoryStore::new()));
        for name in ["Espresso", "Filter"] {
            repo.create_one(&Product::new("tenant-a", name), Some(&session("tenant-a")))
                .await
                .unwrap();
        }
        repo.create_one(&Product::new("tenant-b", "Decaf"), Some(&session("tenant-b")))
            .await
            .unwrap();

        let rows = repo
            .get_all_by_tenant_id("tenant-a", FieldSelection::Lite, None)
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
    }
}

mod alias_tests {
    use super::*;

    #[tokio::test]
    async fn test_alias_dest_derived_on_create() {
        let repo = product_repo(Arc::new(MemoryStore::new()));
        let mut product = Product::new("tenant-a", "Espresso");
        product.barcode = Some("4006381333931".to_string());

        let created = repo.create_one(&product, None).await.unwrap();
        assert_eq!(created.sk01.as_deref(), Some("4006381333931"));
        assert_eq!(created.barcode, created.sk01);
    }

    #[tokio::test]
    async fn test_alias_mismatch_rejected() {
        let repo = product_repo(Arc::new(MemoryStore::new()));
        let mut product = Product::new("tenant-a", "Espresso");
        product.barcode = Some("4006381333931".to_string());
        product.sk01 = Some("0000000000000".to_string());

        let err = repo.create_one(&product, None).await.unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("ProductModel"));
    }

    #[tokio::test]
    async fn test_alias_revalidated_on_update() {
        let repo = product_repo(Arc::new(MemoryStore::new()));
        let mut product = Product::new("tenant-a", "Espresso");
        product.barcode = Some("4006381333931".to_string());
        let created = repo.create_one(&product, None).await.unwrap();

        let updated = repo
            .update_one(
                &created.id,
                json!({"barcode": "7612100055557"}),
                Some(&session("tenant-a")),
                Vec::new(),
            )
            .await
            .unwrap();
        assert_eq!(updated.sk01.as_deref(), Some("7612100055557"));

        let err = repo
            .update_one(
                &created.id,
                json!({"barcode": "1", "sk01": "2"}),
                Some(&session("tenant-a")),
                Vec::new(),
            )
            .await
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn test_alias_queryable_via_indexed_key() {
        let repo = product_repo(Arc::new(MemoryStore::new()));
        let mut product = Product::new("tenant-a", "Espresso");
        product.barcode = Some("4006381333931".to_string());
        repo.create_one(&product, None).await.unwrap();

        let mut query = FilterMap::new();
        query.insert("sk01".to_string(), json!("4006381333931"));
        let found = repo
            .get_one_by_tenant_id_and_condition("tenant-a", query)
            .await
            .unwrap();
        assert_eq!(found.unwrap().name, "Espresso");
    }
}

mod stamping_tests {
    use super::*;

    #[tokio::test]
    async fn test_creation_metadata_stamped() {
        let repo = product_repo(Arc::new(MemoryStore::new()));
        let created = repo
            .create_one(&Product::new("tenant-a", "Espresso"), Some(&session("tenant-a")))
            .await
            .unwrap();

        let created_at = created.created_at_date.unwrap();
        let day_stamp = created.created_at_day_stamp.unwrap();
        assert_eq!(day_stamp, created_at[..10]);
        assert_eq!(created.record_date.as_deref(), Some(day_stamp.as_str()));
        assert_eq!(created.creator_user_id.as_deref(), Some("user-1"));
    }

    #[tokio::test]
    async fn test_supplied_record_date_kept() {
        let repo = product_repo(Arc::new(MemoryStore::new()));
        let mut product = Product::new("tenant-a", "Espresso");
        product.record_date = Some("2023-11-30".to_string());

        let created = repo.create_one(&product, None).await.unwrap();
        assert_eq!(created.record_date.as_deref(), Some("2023-11-30"));
    }
}

mod backfill_tests {
    use super::*;

    #[tokio::test]
    async fn test_day_stamp_recomputed_from_supplied_timestamp() {
        let repo = product_repo(Arc::new(MemoryStore::new()));
        let mut product = Product::new("tenant-a", "Espresso");
        product.created_at_date = Some("2019-07-14T09:15:00Z".to_string());

        let record = repo.validate_format_data(&product).unwrap();
        assert_eq!(record["createdAtDayStamp"], json!("2019-07-14"));
        assert_eq!(record["recordDate"], json!("2019-07-14"));
    }

    #[tokio::test]
    async fn test_dump_rejects_missing_created_at() {
        let repo = product_repo(Arc::new(MemoryStore::new()));
        let product = Product::new("tenant-a", "Espresso");

        let err = repo.validate_format_data(&product).unwrap_err();
        assert!(err.is_validation());
    }
}

mod pagination_tests {
    use super::*;

    #[tokio::test]
    async fn test_page_round_trip_without_overlap() {
        let repo = product_repo(Arc::new(MemoryStore::new()));
        for i in 0..5 {
            repo.create_one(
                &Product::new("tenant-a", &format!("Product {i}")),
                Some(&session("tenant-a")),
            )
            .await
            .unwrap();
        }

        let params = || WhereParams {
            limit: Some(2),
            ..Default::default()
        };

        // Empty string means first page.
        let page1 = repo
            .get_where_paging(
                "tenant-a",
                params(),
                PageRequest {
                    next_page_hash: Some(String::new()),
                    evaluation_limit: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(page1.items.len(), 2);
        let cursor = page1.next_page_hash.clone().expect("more pages expected");

        let page2 = repo
            .get_where_paging(
                "tenant-a",
                params(),
                PageRequest {
                    next_page_hash: Some(cursor),
                    evaluation_limit: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(page2.items.len(), 2);

        let ids1: Vec<&str> = page1.items.iter().map(|p| p.id.as_str()).collect();
        let ids2: Vec<&str> = page2.items.iter().map(|p| p.id.as_str()).collect();
        assert!(ids1.iter().all(|id| !ids2.contains(id)));

        let page3 = repo
            .get_where_paging(
                "tenant-a",
                params(),
                PageRequest {
                    next_page_hash: page2.next_page_hash,
                    evaluation_limit: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(page3.items.len(), 1);
        assert!(page3.next_page_hash.is_none());
    }
}

mod index_selection_tests {
    use super::*;

    /// Rows whose recordDate ordering disagrees with their creation order;
    /// a recordDate sort key must follow the recordDate index.
    #[tokio::test]
    async fn test_record_date_sort_key_routes_to_record_index() {
        let repo = product_repo(Arc::new(MemoryStore::new()));
        for (name, record_date) in [
            ("First", "2024-03-30"),
            ("Second", "2024-01-15"),
            ("Third", "2024-02-20"),
        ] {
            let mut product = Product::new("tenant-a", name);
            product.record_date = Some(record_date.to_string());
            repo.create_one(&product, None).await.unwrap();
        }

        let mut range = FilterMap::new();
        range.insert("between".to_string(), json!(["2024-01-01", "2024-12-31"]));

        // The sort field also appears in the plain filter; it must be
        // stripped, otherwise the equality filter would match nothing.
        let mut query = FilterMap::new();
        query.insert(fields::RECORD_DATE.to_string(), json!("bogus"));

        let rows = repo
            .get_where(
                "tenant-a",
                WhereParams {
                    query: Some(query),
                    sort: Some(SortDirection::Asc),
                    sort_key: Some(SortKeyParams::new(fields::RECORD_DATE, range)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let names: Vec<&str> = rows.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Second", "Third", "First"]);
    }

    #[tokio::test]
    async fn test_created_at_is_default_sort_axis() {
        let repo = product_repo(Arc::new(MemoryStore::new()));
        for name in ["First", "Second", "Third"] {
            repo.create_one(&Product::new("tenant-a", name), None)
                .await
                .unwrap();
            tokio::time::sleep(std::time::Duration::from_millis(3)).await;
        }

        let rows = repo
            .get_where(
                "tenant-a",
                WhereParams {
                    sort: Some(SortDirection::Desc),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let names: Vec<&str> = rows.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Third", "Second", "First"]);
    }
}

mod target_tests {
    use super::*;

    #[tokio::test]
    async fn test_target_id_derived_from_order_alias() {
        let repo = payment_repo(Arc::new(MemoryStore::new()));
        let created = repo
            .create_one(&Payment::new("tenant-a", "order-1", 1250), None)
            .await
            .unwrap();
        assert_eq!(created.target_id.as_deref(), Some("order-1"));
    }

    #[tokio::test]
    async fn test_create_without_target_rejected() {
        let repo = payment_repo(Arc::new(MemoryStore::new()));
        let mut payment = Payment::new("tenant-a", "order-1", 1250);
        payment.order_id = None;

        let err = repo.create_one(&payment, None).await.unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn test_target_reads_are_tenant_scoped() {
        let repo = payment_repo(Arc::new(MemoryStore::new()));
        repo.create_one(&Payment::new("tenant-a", "order-1", 1250), None)
            .await
            .unwrap();
        repo.create_one(&Payment::new("tenant-b", "order-1", 9900), None)
            .await
            .unwrap();

        let a_rows = repo
            .target_get_where("tenant-a", "order-1", WhereParams::default())
            .await
            .unwrap();
        assert_eq!(a_rows.len(), 1);
        assert_eq!(a_rows[0].amount_cents, 1250);
    }

    #[tokio::test]
    async fn test_empty_target_id_rejected_eagerly() {
        let repo = payment_repo(Arc::new(MemoryStore::new()));
        let err = repo
            .target_get_where("tenant-a", "  ", WhereParams::default())
            .await
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn test_feature_scoped_target_read_excludes_other_kinds() {
        let store = Arc::new(MemoryStore::new());
        let repo = payment_repo(store.clone());
        repo.create_one(&Payment::new("tenant-a", "order-1", 1250), None)
            .await
            .unwrap();

        // A row of a different feature kind sharing the same target.
        store
            .create_one(
                "till_main",
                json!({
                    "id": "note-1",
                    "featureEntity": "order_note",
                    "tenantId": "tenant-a",
                    "targetId": "order-1",
                    "createdAtDate": "2024-03-01T10:00:00Z",
                }),
            )
            .await
            .unwrap();

        let rows = repo
            .get_many_by_tenant_id_and_target_id_with_condition(
                "tenant-a",
                "order-1",
                FilterMap::new(),
                FieldSelection::Lite,
                None,
            )
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].amount_cents, 1250);
    }

    #[tokio::test]
    async fn test_relation_read_returns_caller_shape() {
        #[derive(Debug, Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct PaymentSummary {
            id: String,
            amount_cents: i64,
        }

        let repo = payment_repo(Arc::new(MemoryStore::new()));
        repo.create_one(&Payment::new("tenant-a", "order-1", 1250), None)
            .await
            .unwrap();

        let summaries: Vec<PaymentSummary> = repo
            .get_with_relation(
                "tenant-a",
                "order-1",
                WhereParams {
                    fields: FieldSelection::Explicit(vec![
                        "id".to_string(),
                        "amountCents".to_string(),
                    ]),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].amount_cents, 1250);
        assert!(!summaries[0].id.is_empty());
    }

    #[tokio::test]
    async fn test_relation_read_paginates() {
        let repo = payment_repo(Arc::new(MemoryStore::new()));
        for amount in [100, 200, 300] {
            repo.create_one(&Payment::new("tenant-a", "order-1", amount), None)
                .await
                .unwrap();
        }

        let page: tp_store::Page<Value> = repo
            .get_with_relation_paginate(
                "tenant-a",
                "order-1",
                WhereParams {
                    limit: Some(2),
                    ..Default::default()
                },
                PageRequest::default(),
            )
            .await
            .unwrap();
        assert_eq!(page.items.len(), 2);
        assert!(page.next_page_hash.is_some());
    }
}

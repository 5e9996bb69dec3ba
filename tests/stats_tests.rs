//! Tests for the admin statistics aggregator and its cache.

mod common;

use chrono::{Duration, Utc};
use common::*;
use intern_certificate_server::admin::model::FieldCount;
use intern_certificate_server::certificate::models::CertificateRequest;
use intern_certificate_server::config::IssuanceMode;

#[tokio::test]
async fn test_allow_list_size_is_total_in_allow_list_mode() {
    let h = harness(
        &["a@x.edu", "b@x.edu", "c@x.edu", "d@x.edu"],
        IssuanceMode::AllowList,
    );
    let today = date(2025, 8, 1);
    h.interns
        .insert(record_created_at(1, "a@x.edu", "Web Development", date(2025, 7, 16), Some("k1"), Utc::now()))
        .await;

    let stats = h.state.compute_admin_stats(today).await.unwrap();

    assert_eq!(stats.total_interns, 4);
    assert_eq!(stats.interns_with_certificates, 1);
    assert_eq!(stats.interns_without_certificates, 3);
    assert_eq!(stats.completion_rate, 25);
}

#[tokio::test]
async fn test_record_count_is_total_in_registered_only_mode() {
    let h = harness(&[], IssuanceMode::RegisteredOnly);
    let now = Utc::now();
    for id in 1..=3 {
        let key = (id == 1).then_some("k");
        h.interns
            .insert(record_created_at(id, &format!("i{}@x.edu", id), "Data Science", date(2025, 7, 16), key, now))
            .await;
    }

    let stats = h.state.compute_admin_stats(date(2025, 8, 1)).await.unwrap();

    assert_eq!(stats.total_interns, 3);
    assert_eq!(stats.interns_with_certificates, 1);
    assert_eq!(stats.completion_rate, 33);
}

#[tokio::test]
async fn test_empty_store_reports_zero_rate() {
    let h = harness(&[], IssuanceMode::AllowList);

    let stats = h.state.compute_admin_stats(date(2025, 8, 1)).await.unwrap();

    assert_eq!(stats.total_interns, 0);
    assert_eq!(stats.completion_rate, 0);
    assert!(stats.field_breakdown.is_empty());
    assert!(stats.recent_interns.is_empty());
}

#[tokio::test]
async fn test_recent_certificates_use_thirty_day_window() {
    let h = harness(&[], IssuanceMode::RegisteredOnly);
    let today = date(2025, 8, 15);
    let now = Utc::now();
    // Ends exactly on the cutoff, inside the window.
    h.interns
        .insert(record_created_at(1, "a@x.edu", "Web Development", date(2025, 7, 16), Some("k1"), now))
        .await;
    h.interns
        .insert(record_created_at(2, "b@x.edu", "Web Development", date(2025, 7, 15), Some("k2"), now))
        .await;
    // Recent end date but no certificate.
    h.interns
        .insert(record_created_at(3, "c@x.edu", "Web Development", date(2025, 8, 10), None, now))
        .await;

    let stats = h.state.compute_admin_stats(today).await.unwrap();

    assert_eq!(stats.recent_certificates, 1);
    assert_eq!(stats.interns_with_certificates, 2);
}

#[tokio::test]
async fn test_field_breakdown_counts_only_certified_interns() {
    let h = harness(&[], IssuanceMode::RegisteredOnly);
    let now = Utc::now();
    let end = date(2025, 7, 16);
    h.interns.insert(record_created_at(1, "a@x.edu", "Web Development", end, Some("k1"), now)).await;
    h.interns.insert(record_created_at(2, "b@x.edu", "Web Development", end, Some("k2"), now)).await;
    h.interns.insert(record_created_at(3, "c@x.edu", "Data Science", end, Some("k3"), now)).await;
    h.interns.insert(record_created_at(4, "d@x.edu", "Design", end, None, now)).await;

    let stats = h.state.compute_admin_stats(date(2025, 8, 1)).await.unwrap();

    assert_eq!(
        stats.field_breakdown,
        vec![
            FieldCount { field: "Web Development".to_string(), count: 2 },
            FieldCount { field: "Data Science".to_string(), count: 1 },
        ]
    );
}

#[tokio::test]
async fn test_recent_interns_are_newest_ten() {
    let h = harness(&[], IssuanceMode::RegisteredOnly);
    let base = Utc::now() - Duration::days(30);
    for id in 1..=12 {
        h.interns
            .insert(record_created_at(
                id,
                &format!("i{}@x.edu", id),
                "Web Development",
                date(2025, 7, 16),
                None,
                base + Duration::hours(id),
            ))
            .await;
    }

    let stats = h.state.compute_admin_stats(date(2025, 8, 1)).await.unwrap();

    assert_eq!(stats.recent_interns.len(), 10);
    assert_eq!(stats.recent_interns[0].id, 12);
    assert_eq!(stats.recent_interns[9].id, 3);
    assert!(!stats.recent_interns[0].has_certificate);
}

#[tokio::test]
async fn test_pending_is_not_clamped_when_records_exceed_allow_list() {
    let h = harness(&["a@x.edu"], IssuanceMode::AllowList);
    let now = Utc::now();
    let end = date(2025, 7, 16);
    h.interns.insert(record_created_at(1, "a@x.edu", "Web Development", end, Some("k1"), now)).await;
    h.interns.insert(record_created_at(2, "legacy@x.edu", "Web Development", end, Some("k2"), now)).await;

    let stats = h.state.compute_admin_stats(date(2025, 8, 1)).await.unwrap();

    assert_eq!(stats.interns_without_certificates, -1);
    assert_eq!(stats.completion_rate, 200);
}

#[tokio::test]
async fn test_cached_stats_are_served_until_issuance() {
    let h = harness(&["alice@x.edu", "bob@x.edu"], IssuanceMode::AllowList);
    let today = Utc::now().date_naive();

    let before = h.state.admin_stats(today).await.unwrap();
    assert_eq!(before.interns_with_certificates, 0);

    // A direct write bypasses invalidation, so the cached value stays.
    h.interns
        .insert(record_created_at(9, "bob@x.edu", "Web Development", today, Some("k9"), Utc::now()))
        .await;
    let cached = h.state.admin_stats(today).await.unwrap();
    assert_eq!(cached.interns_with_certificates, 0);

    h.state
        .issue_certificate(&CertificateRequest {
            name: "Alice Smith".to_string(),
            college: "X University".to_string(),
            email: "alice@x.edu".to_string(),
        })
        .await
        .unwrap();

    let after = h.state.admin_stats(today).await.unwrap();
    assert_eq!(after.interns_with_certificates, 2);
    assert_eq!(after.completion_rate, 100);
}

#[tokio::test]
async fn test_stats_fail_when_store_is_down() {
    let h = harness(&[], IssuanceMode::RegisteredOnly);
    h.interns.set_failing(true);

    assert!(h.state.admin_stats(date(2025, 8, 1)).await.is_err());
}

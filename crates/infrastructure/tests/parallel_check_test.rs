mod helpers;

use helpers::{settings_from, MockReputationUpstream};
use std::sync::Arc;
use warden_dns_domain::{FilterReason, FilteringConfig, RecordType};
use warden_dns_infrastructure::FilterEngine;

/// Many concurrent checks against one engine: every task must see the
/// same decisions, with the prefix cache as the only shared mutable
/// state. Duplicate upstream lookups are allowed; wrong answers are not.
#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_parallel_safe_browsing_checks() {
    let config = FilteringConfig {
        safe_browsing_enabled: true,
        ..FilteringConfig::default()
    };
    let upstream = MockReputationUpstream::blocking("wmconvirus.narod.ru");
    let engine = Arc::new(
        FilterEngine::builder(config.clone())
            .safe_browsing_upstream(upstream)
            .build()
            .unwrap(),
    );
    let setts = Arc::new(settings_from(&config));

    let mut tasks = Vec::new();
    for _ in 0..100 {
        let engine = Arc::clone(&engine);
        let setts = Arc::clone(&setts);
        tasks.push(tokio::spawn(async move {
            let res = engine
                .check_host("wmconvirus.narod.ru", RecordType::A, &setts)
                .await
                .unwrap();
            assert!(res.is_filtered);
            assert_eq!(res.reason, FilterReason::FilteredSafeBrowsing);

            let res = engine
                .check_host("test.wmconvirus.narod.ru", RecordType::A, &setts)
                .await
                .unwrap();
            assert!(res.is_filtered);

            for clean in ["yandex.ru", "pornhub.com"] {
                let res = engine
                    .check_host(clean, RecordType::A, &setts)
                    .await
                    .unwrap();
                assert!(!res.is_filtered, "{clean} should pass");
            }
        }));
    }

    for task in tasks {
        task.await.unwrap();
    }

    engine.close();
}

/// Filter swaps under concurrent load: every check sees either the old or
/// the new compiled set, never a torn mix.
#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_parallel_checks_during_set_filters() {
    use warden_dns_domain::{FilterList, RequestFilterSettings};

    let engine = Arc::new(
        FilterEngine::new(
            &FilteringConfig::default(),
            vec![FilterList::new(0, "||blocked.org^\n")],
        )
        .unwrap(),
    );
    let setts = Arc::new(RequestFilterSettings::filtering_only());

    let mut tasks = Vec::new();
    for _ in 0..50 {
        let engine = Arc::clone(&engine);
        let setts = Arc::clone(&setts);
        tasks.push(tokio::spawn(async move {
            let res = engine
                .check_host("blocked.org", RecordType::A, &setts)
                .await
                .unwrap();
            // Both sets block this host; the rule text tells them apart
            // but the decision must hold throughout the swap.
            assert!(res.is_filtered);
        }));
    }

    let swapper = {
        let engine = Arc::clone(&engine);
        tokio::spawn(async move {
            for _ in 0..10 {
                engine
                    .set_filters(
                        vec![FilterList::new(1, "||blocked.org^$important\n")],
                        vec![],
                        false,
                    )
                    .await
                    .unwrap();
            }
        })
    };

    for task in tasks {
        task.await.unwrap();
    }
    swapper.await.unwrap();

    engine.close();
}

mod support;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;

use opd_queue_cell::models::{Priority, TokenStatus};
use opd_queue_cell::services::{QueueScheduler, TokenStore};

use support::{test_doctor, token_with_status, waiting_token, InMemoryDoctorRegistry, InMemoryTokenStore};

fn scheduler(
    tokens: Arc<InMemoryTokenStore>,
    doctors: Arc<InMemoryDoctorRegistry>,
) -> QueueScheduler {
    QueueScheduler::new(
        tokens,
        doctors,
        Arc::new(Notify::new()),
        Duration::from_secs(30),
    )
}

#[tokio::test]
async fn test_recompute_pass_rewrites_derived_fields() {
    let tokens = Arc::new(InMemoryTokenStore::new());
    let doctors = Arc::new(InMemoryDoctorRegistry::new());
    let doctor = test_doctor(15, 5);
    doctors.seed(doctor.clone()).await;

    // Stale positions: arrival order, no priority applied yet.
    let t1 = waiting_token(doctor.id, Priority::Normal, 1);
    let t2 = waiting_token(doctor.id, Priority::Urgent, 2);
    let t3 = waiting_token(doctor.id, Priority::Emergency, 3);
    tokens.seed(vec![t1.clone(), t2.clone(), t3.clone()]).await;

    let updated = scheduler(tokens.clone(), doctors.clone())
        .recompute_pass()
        .await
        .expect("recompute failed");
    assert_eq!(updated, 3);

    let t3 = tokens.get_token(t3.id).await.unwrap().unwrap();
    assert_eq!(t3.position_in_queue, 1);
    assert_eq!(t3.patients_ahead, 0);
    assert_eq!(t3.estimated_wait_minutes, 5);
    assert!(t3.estimated_consultation_time.is_some());

    let t2 = tokens.get_token(t2.id).await.unwrap().unwrap();
    assert_eq!(t2.position_in_queue, 2);
    assert_eq!(t2.estimated_wait_minutes, 20);

    let t1 = tokens.get_token(t1.id).await.unwrap().unwrap();
    assert_eq!(t1.position_in_queue, 3);
    assert_eq!(t1.estimated_wait_minutes, 35);
}

#[tokio::test]
async fn test_second_pass_writes_nothing() {
    let tokens = Arc::new(InMemoryTokenStore::new());
    let doctors = Arc::new(InMemoryDoctorRegistry::new());
    let doctor = test_doctor(15, 5);
    doctors.seed(doctor.clone()).await;
    tokens
        .seed(vec![
            waiting_token(doctor.id, Priority::Normal, 1),
            waiting_token(doctor.id, Priority::Urgent, 2),
        ])
        .await;

    let scheduler = scheduler(tokens.clone(), doctors.clone());

    let first = scheduler.recompute_pass().await.expect("first pass failed");
    assert!(first > 0);

    let second = scheduler.recompute_pass().await.expect("second pass failed");
    assert_eq!(second, 0);
}

#[tokio::test]
async fn test_frozen_tokens_are_not_touched() {
    let tokens = Arc::new(InMemoryTokenStore::new());
    let doctors = Arc::new(InMemoryDoctorRegistry::new());
    let doctor = test_doctor(15, 5);
    doctors.seed(doctor.clone()).await;

    let mut consulting =
        token_with_status(doctor.id, Priority::Normal, 1, TokenStatus::InConsultation);
    consulting.estimated_wait_minutes = 99;
    let mut delayed = token_with_status(doctor.id, Priority::Normal, 2, TokenStatus::Delayed);
    delayed.estimated_wait_minutes = 45;
    tokens.seed(vec![consulting.clone(), delayed.clone()]).await;

    let updated = scheduler(tokens.clone(), doctors.clone())
        .recompute_pass()
        .await
        .expect("recompute failed");
    assert_eq!(updated, 0);

    let consulting = tokens.get_token(consulting.id).await.unwrap().unwrap();
    assert_eq!(consulting.estimated_wait_minutes, 99);

    let delayed = tokens.get_token(delayed.id).await.unwrap().unwrap();
    assert_eq!(delayed.estimated_wait_minutes, 45);
}

#[tokio::test]
async fn test_queues_are_recomputed_per_doctor() {
    let tokens = Arc::new(InMemoryTokenStore::new());
    let doctors = Arc::new(InMemoryDoctorRegistry::new());

    let doctor_a = test_doctor(10, 0);
    let mut doctor_b = test_doctor(20, 10);
    doctor_b.name = "Vikram Shah".to_string();
    doctors.seed(doctor_a.clone()).await;
    doctors.seed(doctor_b.clone()).await;

    let mut for_a = waiting_token(doctor_a.id, Priority::Normal, 1);
    for_a.estimated_wait_minutes = 99;
    let mut for_b = waiting_token(doctor_b.id, Priority::Normal, 1);
    for_b.estimated_wait_minutes = 99;
    tokens.seed(vec![for_a.clone(), for_b.clone()]).await;

    scheduler(tokens.clone(), doctors.clone())
        .recompute_pass()
        .await
        .expect("recompute failed");

    let for_a = tokens.get_token(for_a.id).await.unwrap().unwrap();
    assert_eq!(for_a.estimated_wait_minutes, 0);

    let for_b = tokens.get_token(for_b.id).await.unwrap().unwrap();
    assert_eq!(for_b.estimated_wait_minutes, 10);
}

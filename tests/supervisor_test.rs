mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{fleet, status, Backend, MockApi, RecordingSink};
use zegra::alerts::Priority;
use zegra::client::VehicleListing;
use zegra::{ApiError, Supervisor, SupervisorError};

const RUN_LIMIT: Duration = Duration::from_secs(24 * 3600);

async fn supervise(
    backend: &Arc<Backend>,
    sink: &Arc<RecordingSink>,
    cars: &[(&str, &str, u64)],
) -> SupervisorError {
    // ---
    let config = Arc::new(fleet(cars));
    let supervisor = Supervisor::new(MockApi(backend.clone()), sink.clone(), config);
    tokio::time::timeout(RUN_LIMIT, supervisor.run())
        .await
        .expect("supervisor should stop on the scripted fatal fault")
}

fn login_gap(backend: &Backend, first: usize, second: usize) -> Duration {
    let logins = backend.logins.lock().unwrap();
    logins[second] - logins[first]
}

#[tokio::test(start_paused = true)]
async fn connection_error_rebuilds_everything_after_short_backoff() {
    // ---
    // Zoe polls every 5 minutes, Spring every 10.
    let backend = Backend::new(&["VIN_ZOE", "VIN_SPRING"], |vin, call| {
        match (vin, call.epoch, call.n) {
            ("VIN_ZOE", 1, 0) => Ok(status(48, false, false)),
            ("VIN_ZOE", 1, _) => Err(ApiError::Connection("connection reset".into())),
            ("VIN_ZOE", _, 0) => Ok(status(48, false, false)),
            ("VIN_ZOE", _, _) => Err(ApiError::Other("unexpected payload".into())),
            // Would alert if the first epoch's Spring monitor survived teardown
            ("VIN_SPRING", 1, n) if n > 0 => Ok(status(10, false, false)),
            _ => Ok(status(80, false, false)),
        }
    });
    let sink = Arc::new(RecordingSink::default());

    let cars = [("Zoe", "VIN_ZOE", 5), ("Spring", "VIN_SPRING", 10)];
    let outcome = supervise(&backend, &sink, &cars).await;
    assert!(matches!(outcome, SupervisorError::Fatal(ref e) if e.contains("unexpected payload")));

    // Epoch 1 fails at 5 min, 60 s backoff, epoch 2 logs in at 6 min
    assert_eq!(backend.login_count(), 2);
    assert_eq!(login_gap(&backend, 0, 1), Duration::from_secs(360));

    // Fresh state: the warn tier fired again in the second epoch
    assert_eq!(sink.priorities("topic-Zoe"), vec![Priority::High, Priority::High]);
    assert!(sink.to_topic("topic-Spring").is_empty());

    // Admin saw the start and the fatal stop
    assert_eq!(sink.priorities("admin"), vec![Priority::Min, Priority::Urgent]);
    let stop = &sink.to_topic("admin")[1];
    assert!(stop.body.contains("unexpected payload"));
}

#[tokio::test(start_paused = true)]
async fn quota_exhaustion_backs_off_five_minutes() {
    // ---
    let backend = Backend::new(&["VIN_ZOE"], |_, call| match call.epoch {
        1 => Err(ApiError::QuotaExceeded("too many requests".into())),
        _ => Err(ApiError::Auth("token revoked".into())),
    });
    let sink = Arc::new(RecordingSink::default());

    let outcome = supervise(&backend, &sink, &[("Zoe", "VIN_ZOE", 5)]).await;
    assert!(matches!(outcome, SupervisorError::Fatal(_)));

    assert_eq!(backend.login_count(), 2);
    assert_eq!(login_gap(&backend, 0, 1), Duration::from_secs(300));
}

#[tokio::test(start_paused = true)]
async fn soft_account_error_waits_and_reconnects() {
    // ---
    let backend = Backend::new(&["VIN_ZOE"], |_, _| Err(ApiError::Other("stop here".into())));
    backend
        .listings
        .lock()
        .unwrap()
        .push_back(VehicleListing::SoftError("err.func.wired.forbidden".into()));
    let sink = Arc::new(RecordingSink::default());

    let outcome = supervise(&backend, &sink, &[("Zoe", "VIN_ZOE", 5)]).await;
    assert!(matches!(outcome, SupervisorError::Fatal(_)));

    assert_eq!(backend.login_count(), 2);
    assert_eq!(login_gap(&backend, 0, 1), Duration::from_secs(60));
}

#[tokio::test(start_paused = true)]
async fn unknown_vehicle_is_fatal_before_monitoring() {
    // ---
    let backend = Backend::new(&["VIN_ZOE"], |_, _| Ok(status(80, false, false)));
    let sink = Arc::new(RecordingSink::default());

    let cars = [("Zoe", "VIN_ZOE", 5), ("Ghost", "VIN_GHOST", 5)];
    let outcome = supervise(&backend, &sink, &cars).await;

    match outcome {
        SupervisorError::UnknownVehicles(vins) => assert_eq!(vins, vec!["VIN_GHOST".to_string()]),
        other => panic!("unexpected outcome: {other}"),
    }
    assert_eq!(backend.login_count(), 1);
    assert_eq!(backend.battery_reads.load(std::sync::atomic::Ordering::SeqCst), 0);
    assert_eq!(sink.priorities("admin"), vec![Priority::Min]);
}

#[tokio::test(start_paused = true)]
async fn login_failures_classified() {
    // ---
    let backend = Backend::new(&["VIN_ZOE"], |_, _| Ok(status(80, false, false)));
    {
        let mut errors = backend.login_errors.lock().unwrap();
        errors.push_back(ApiError::Timeout("login".into()));
        errors.push_back(ApiError::Auth("bad password".into()));
    }
    let sink = Arc::new(RecordingSink::default());

    let outcome = supervise(&backend, &sink, &[("Zoe", "VIN_ZOE", 5)]).await;

    assert!(matches!(outcome, SupervisorError::Fatal(ref e) if e.contains("bad password")));
    assert_eq!(backend.login_count(), 2);
    assert_eq!(login_gap(&backend, 0, 1), Duration::from_secs(60));
    assert_eq!(backend.battery_reads.load(std::sync::atomic::Ordering::SeqCst), 0);
    assert_eq!(sink.priorities("admin"), vec![Priority::Min, Priority::Urgent]);
}

#[tokio::test(start_paused = true)]
async fn failed_admin_alerts_do_not_block_the_epoch() {
    // ---
    let backend = Backend::new(&["VIN_ZOE"], |_, call| match call.n {
        0 | 1 => Ok(status(80, false, false)),
        _ => Err(ApiError::Other("unexpected payload".into())),
    });
    let sink = Arc::new(RecordingSink::failing());

    let outcome = supervise(&backend, &sink, &[("Zoe", "VIN_ZOE", 5)]).await;
    assert!(matches!(outcome, SupervisorError::Fatal(ref e) if e.contains("unexpected payload")));

    // The start alert failed, monitoring ran anyway
    assert_eq!(backend.login_count(), 1);
    assert_eq!(backend.battery_reads.load(std::sync::atomic::Ordering::SeqCst), 3);

    // Start and stop were both attempted
    assert_eq!(sink.failures(), 2);
    assert!(sink.sent.lock().unwrap().is_empty());
}

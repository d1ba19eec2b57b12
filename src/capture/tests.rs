use super::*;
use crate::config::{CaptureConfig, PipConfig};
use crate::error::CaptureError;
use crate::settings::{FrameRate, Resolution, VideoSettings};
use crate::surface::recording::RecordingSurface;
use std::sync::Arc;
use std::time::Duration;

fn capture_config() -> CaptureConfig {
    PipConfig::default().capture
}

fn create_manager(backend: Arc<MockCaptureBackend>) -> (CaptureSessionManager, Arc<RecordingSurface>) {
    let surface = Arc::new(RecordingSurface::default());
    let manager = CaptureSessionManager::new(backend, surface.clone(), capture_config());
    (manager, surface)
}

fn two_cameras() -> Vec<DeviceInfo> {
    vec![
        DeviceInfo::new("cam-a", "Front Camera"),
        DeviceInfo::new("cam-b", "USB Camera"),
    ]
}

fn transient() -> CaptureError {
    CaptureError::transient("device hiccup")
}

#[test]
fn test_constraints_omit_default_choices() {
    let constraints = VideoConstraints::from_settings(None, &VideoSettings::default());
    assert_eq!(constraints, VideoConstraints::default());

    let settings = VideoSettings {
        resolution: Resolution::Fhd1080,
        frame_rate: FrameRate::Fps30,
        ..VideoSettings::default()
    };
    let constraints = VideoConstraints::from_settings(Some("cam-a"), &settings);
    assert_eq!(constraints.device_id.as_deref(), Some("cam-a"));
    assert_eq!(constraints.width, Some(1920));
    assert_eq!(constraints.height, Some(1080));
    assert_eq!(constraints.frame_rate, Some(30.0));
}

#[test]
fn test_blank_device_id_means_default_device() {
    let constraints = VideoConstraints::from_settings(Some("  "), &VideoSettings::default());
    assert!(constraints.device_id.is_none());
}

#[test]
fn test_fallback_constraints() {
    let fallback = VideoConstraints::fallback(Some("cam-b"), &capture_config());
    assert_eq!(fallback.device_id.as_deref(), Some("cam-b"));
    assert_eq!(fallback.width, Some(1280));
    assert_eq!(fallback.height, Some(720));
    assert_eq!(fallback.frame_rate, Some(30.0));
    assert_eq!(fallback.to_string(), "device=cam-b 1280x720 @30fps");
}

#[test]
fn test_unnamed_device_label() {
    let device = DeviceInfo::new("0123456789abcdef", "");
    assert_eq!(device.display_label(), "Camera 01234567");

    let named = DeviceInfo::new("0123456789abcdef", "Logitech C920");
    assert_eq!(named.display_label(), "Logitech C920");
}

#[test]
fn test_recovery_decisions() {
    let mut recovery = CaptureRecovery::new(&capture_config());

    recovery.record_attempt();
    let unsatisfiable = CaptureError::ConstraintsUnsatisfiable {
        details: "1920x1080".to_string(),
    };
    assert_eq!(recovery.handle_failure(&unsatisfiable), RecoveryAction::Fallback);
    assert!(recovery.fallback_used());

    // A second constraints failure in the same sequence is retried, not re-fallen-back
    assert_eq!(
        recovery.handle_failure(&unsatisfiable),
        RecoveryAction::RetryAfterDelay(Duration::from_millis(2000))
    );

    recovery.record_attempt();
    recovery.record_attempt();
    assert!(matches!(
        recovery.handle_failure(&transient()),
        RecoveryAction::GiveUp(_)
    ));
    assert_eq!(recovery.attempts(), 3);
}

#[test]
fn test_recovery_terminal_errors_are_surfaced() {
    let mut recovery = CaptureRecovery::new(&capture_config());
    recovery.record_attempt();

    let busy = CaptureError::DeviceBusy {
        details: "in use".to_string(),
    };
    assert_eq!(
        recovery.handle_failure(&busy),
        RecoveryAction::Surface(busy.clone())
    );
    assert_eq!(recovery.retries(), 0);
}

#[test]
fn test_recovery_fallback_failure_becomes_transient() {
    let mut recovery = CaptureRecovery::new(&capture_config());
    recovery.record_attempt();

    let unsatisfiable = CaptureError::ConstraintsUnsatisfiable {
        details: "still no".to_string(),
    };
    assert!(matches!(
        recovery.handle_fallback_failure(&unsatisfiable),
        RecoveryAction::RetryAfterDelay(_)
    ));

    let denied = CaptureError::PermissionDenied {
        details: "blocked".to_string(),
    };
    assert_eq!(
        recovery.handle_fallback_failure(&denied),
        RecoveryAction::Surface(denied.clone())
    );
}

#[tokio::test]
async fn test_start_attaches_stream() {
    let backend = Arc::new(MockCaptureBackend::with_devices(two_cameras()));
    let (manager, surface) = create_manager(backend.clone());

    let outcome = manager
        .start(Some("cam-b".to_string()), &VideoSettings::default())
        .await;

    let info = outcome.stream_info().cloned().unwrap();
    assert_eq!(info.device_id.as_deref(), Some("cam-b"));
    assert_eq!(info.label, "USB Camera");
    assert!(surface.is_attached());
    assert!(manager.is_active().await);
    assert_eq!(manager.active_device_id().await.as_deref(), Some("cam-b"));
    assert_eq!(backend.open_streams(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_retry_exhaustion_surfaces_error() {
    let backend = Arc::new(MockCaptureBackend::new());
    for _ in 0..3 {
        backend.push_failure(transient());
    }
    let (manager, surface) = create_manager(backend.clone());

    let outcome = manager.start(None, &VideoSettings::default()).await;

    assert_eq!(outcome, StartOutcome::Failed(transient()));
    assert_eq!(backend.acquire_calls(), 3);
    assert_eq!(
        surface.errors(),
        vec!["Unable to connect to the webcam after several attempts".to_string()]
    );
    assert!(!surface.is_attached());
    assert!(!manager.is_active().await);
}

#[tokio::test(start_paused = true)]
async fn test_retry_then_success() {
    let backend = Arc::new(MockCaptureBackend::new());
    backend.push_failure(transient());
    let (manager, surface) = create_manager(backend.clone());

    let outcome = manager.start(None, &VideoSettings::default()).await;

    assert!(matches!(outcome, StartOutcome::Started(_)));
    assert_eq!(backend.acquire_calls(), 2);
    assert!(surface.errors().is_empty());
    assert_eq!(manager.retry_count().await, 0);
}

#[tokio::test]
async fn test_constraints_failure_uses_fallback_once() {
    let backend = Arc::new(MockCaptureBackend::new());
    backend.push_failure(CaptureError::ConstraintsUnsatisfiable {
        details: "no 4k".to_string(),
    });
    let (manager, surface) = create_manager(backend.clone());

    let settings = VideoSettings {
        resolution: Resolution::Uhd2160,
        frame_rate: FrameRate::Fps60,
        ..VideoSettings::default()
    };
    let outcome = manager.start(None, &settings).await;

    let info = match outcome {
        StartOutcome::StartedWithFallback(info) => info,
        other => panic!("expected fallback start, got {:?}", other),
    };
    assert_eq!(info.natural_size(), (1280, 720));
    assert_eq!(backend.acquire_calls(), 2);

    let requests = backend.requests();
    assert_eq!(requests[0].width, Some(3840));
    assert_eq!(requests[1].width, Some(1280));
    assert_eq!(requests[1].frame_rate, Some(30.0));

    assert_eq!(manager.retry_count().await, 0);
    assert!(surface.errors().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_failed_fallback_returns_to_retry_path() {
    let backend = Arc::new(MockCaptureBackend::new());
    backend.push_failure(CaptureError::ConstraintsUnsatisfiable {
        details: "no 4k".to_string(),
    });
    backend.push_failure(transient());
    let (manager, _surface) = create_manager(backend.clone());

    let outcome = manager.start(None, &VideoSettings::default()).await;

    assert!(matches!(outcome, StartOutcome::Started(_)));
    assert_eq!(backend.acquire_calls(), 3);
}

#[tokio::test]
async fn test_terminal_error_is_not_retried() {
    let backend = Arc::new(MockCaptureBackend::new());
    let denied = CaptureError::PermissionDenied {
        details: "blocked by user".to_string(),
    };
    backend.push_failure(denied.clone());
    let (manager, surface) = create_manager(backend.clone());

    let outcome = manager.start(None, &VideoSettings::default()).await;

    assert_eq!(outcome, StartOutcome::Failed(denied.clone()));
    assert_eq!(backend.acquire_calls(), 1);
    assert_eq!(surface.errors(), vec![denied.user_message()]);
}

#[tokio::test]
async fn test_unknown_device_is_unavailable() {
    let backend = Arc::new(MockCaptureBackend::with_devices(two_cameras()));
    let (manager, surface) = create_manager(backend.clone());

    let outcome = manager
        .start(Some("cam-z".to_string()), &VideoSettings::default())
        .await;

    assert!(matches!(
        outcome,
        StartOutcome::Failed(CaptureError::DeviceUnavailable { .. })
    ));
    assert_eq!(surface.errors(), vec!["Webcam device not found".to_string()]);
}

#[tokio::test]
async fn test_restart_never_holds_two_streams() {
    let backend = Arc::new(MockCaptureBackend::with_devices(two_cameras()));
    let (manager, surface) = create_manager(backend.clone());

    manager
        .start(Some("cam-a".to_string()), &VideoSettings::default())
        .await;
    assert_eq!(backend.open_streams(), 1);

    let settings = VideoSettings {
        resolution: Resolution::Hd720,
        ..VideoSettings::default()
    };
    let outcome = manager.restart(&settings).await;

    assert!(matches!(outcome, StartOutcome::Started(_)));
    assert_eq!(backend.open_streams(), 1);
    assert_eq!(*surface.attach_count.lock(), 2);
    assert_eq!(backend.requests()[1].device_id.as_deref(), Some("cam-a"));
}

#[tokio::test]
async fn test_stop_is_idempotent() {
    let backend = Arc::new(MockCaptureBackend::new());
    let (manager, surface) = create_manager(backend.clone());

    manager.start(None, &VideoSettings::default()).await;
    manager.stop().await;
    manager.stop().await;

    assert_eq!(backend.open_streams(), 0);
    assert!(!manager.is_active().await);
    assert!(!surface.is_attached());
    assert!(manager.active_stream_info().await.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_later_start_supersedes_pending_one() {
    let backend = Arc::new(
        MockCaptureBackend::with_devices(two_cameras()).with_latency(Duration::from_millis(100)),
    );
    let (manager, _surface) = create_manager(backend.clone());

    let first = {
        let manager = manager.clone();
        tokio::spawn(async move {
            manager
                .start(Some("cam-a".to_string()), &VideoSettings::default())
                .await
        })
    };

    // Let the first start reach the backend before the second one begins
    tokio::time::sleep(Duration::from_millis(10)).await;

    let second = manager
        .start(Some("cam-b".to_string()), &VideoSettings::default())
        .await;
    let first = first.await.unwrap();

    assert_eq!(first, StartOutcome::Superseded);
    assert!(matches!(second, StartOutcome::Started(_)));
    assert_eq!(backend.open_streams(), 1);
    assert_eq!(manager.active_device_id().await.as_deref(), Some("cam-b"));
}

#[tokio::test(start_paused = true)]
async fn test_stop_cancels_pending_retry() {
    let backend = Arc::new(MockCaptureBackend::new());
    backend.push_failure(transient());
    let (manager, surface) = create_manager(backend.clone());

    let pending = {
        let manager = manager.clone();
        tokio::spawn(async move { manager.start(None, &VideoSettings::default()).await })
    };

    tokio::time::sleep(Duration::from_millis(500)).await;
    manager.stop().await;

    assert_eq!(pending.await.unwrap(), StartOutcome::Superseded);
    assert_eq!(backend.acquire_calls(), 1);
    assert_eq!(backend.open_streams(), 0);
    assert!(surface.errors().is_empty());
}

#[tokio::test]
async fn test_mock_enumeration() {
    let backend = MockCaptureBackend::with_devices(two_cameras());
    assert_eq!(backend.enumerate_devices().await.unwrap().len(), 2);

    backend.fail_enumeration(CaptureError::PermissionDenied {
        details: "no access".to_string(),
    });
    assert!(backend.enumerate_devices().await.is_err());
}

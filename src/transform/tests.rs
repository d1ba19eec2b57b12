use super::*;
use crate::settings::{FlipMode, OFFSET_LIMIT, ZOOM_MAX, ZOOM_MIN};
use std::time::Duration;
use tokio::sync::mpsc;

fn machine() -> AutoFlipStateMachine {
    AutoFlipStateMachine::new(HysteresisBand::default(), AutoFlipState::Inactive)
}

#[test]
fn test_zoom_in_saturates_at_max() {
    let mut zoom = 1.0;
    for _ in 0..41 {
        zoom = nudge_zoom(zoom, ZoomDirection::In, 0.1);
        assert!((ZOOM_MIN..=ZOOM_MAX).contains(&zoom));
    }
    assert_eq!(zoom, 5.0);
}

#[test]
fn test_zoom_steps_stay_on_one_decimal() {
    let mut zoom = 1.0;
    for _ in 0..7 {
        zoom = nudge_zoom(zoom, ZoomDirection::In, 0.1);
    }
    assert_eq!(zoom, 1.7);
    zoom = nudge_zoom(zoom, ZoomDirection::Out, 0.1);
    assert_eq!(zoom, 1.6);
    assert_eq!(nudge_zoom(1.0, ZoomDirection::Out, 0.1), 1.0);
    assert_eq!(nudge_zoom(3.4, ZoomDirection::Reset, 0.1), 1.0);
}

#[test]
fn test_offset_up_saturates_at_limit() {
    let mut offset = (0, 0);
    for _ in 0..50 {
        offset = nudge_offset(offset, OffsetDirection::Up, 5);
    }
    assert_eq!(offset, (0, -OFFSET_LIMIT));
}

#[test]
fn test_offset_axes_clamp_independently() {
    let offset = nudge_offset((200, -10), OffsetDirection::Right, 5);
    assert_eq!(offset, (200, -10));
    let offset = nudge_offset(offset, OffsetDirection::Down, 5);
    assert_eq!(offset, (200, -5));
    assert_eq!(nudge_offset(offset, OffsetDirection::Reset, 5), (0, 0));
}

#[test]
fn test_composition_order_is_translate_scale_mirror() {
    let state = TransformState::compose((10, 0), 2.0, EffectiveFlip::Flipped, (800, 600), None);

    assert_eq!(
        state.operations(),
        vec![
            TransformOp::Translate { x: 10.0, y: 0.0 },
            TransformOp::Scale(2.0),
            TransformOp::MirrorHorizontal,
        ]
    );
    // The center moves by the scaled offset, then lands mirrored
    assert_eq!(state.apply_to_point(0.0, 0.0), (-20.0, 0.0));
    assert_eq!(state.origin, (400.0, 300.0));
    assert_eq!(
        state.to_css(),
        "scaleX(-1) scale(2) translate(10px, 0px)"
    );
}

#[test]
fn test_unflipped_transform_has_no_mirror() {
    let state = TransformState::compose((10, 0), 2.0, EffectiveFlip::Normal, (800, 600), None);
    assert_eq!(state.operations().len(), 2);
    assert_eq!(state.apply_to_point(0.0, 0.0), (20.0, 0.0));
}

#[test]
fn test_compose_clamps_inputs() {
    let state = TransformState::compose((-500, 999), 7.25, EffectiveFlip::Normal, (100, 100), None);
    assert_eq!((state.offset_x, state.offset_y), (-OFFSET_LIMIT, OFFSET_LIMIT));
    assert_eq!(state.zoom_level, ZOOM_MAX);
}

#[test]
fn test_natural_size_cover_fits_surface() {
    let unknown = TransformState::compose((0, 0), 2.0, EffectiveFlip::Normal, (800, 600), None);
    assert_eq!(unknown.fit_scale, 1.0);

    let vga = TransformState::compose((0, 0), 2.0, EffectiveFlip::Normal, (800, 600), Some((640, 480)));
    assert_eq!(vga.fit_scale, 1.25);
    assert_eq!(vga.zoom_level, 2.0);
    assert_eq!(vga.operations()[1], TransformOp::Scale(2.5));

    // Wide video is fitted on the height so it still covers the surface
    let hd = TransformState::compose((0, 0), 1.0, EffectiveFlip::Normal, (800, 600), Some((1280, 720)));
    assert_eq!(hd.fit_scale, 600.0 / 720.0);

    let empty = TransformState::compose((0, 0), 1.0, EffectiveFlip::Normal, (800, 600), Some((0, 0)));
    assert_eq!(empty.fit_scale, 1.0);
}

#[test]
fn test_effective_flip_resolution() {
    assert_eq!(EffectiveFlip::resolve(FlipMode::Normal, true), EffectiveFlip::Normal);
    assert_eq!(EffectiveFlip::resolve(FlipMode::Flipped, false), EffectiveFlip::Flipped);
    assert_eq!(EffectiveFlip::resolve(FlipMode::Auto, true), EffectiveFlip::Flipped);
    assert_eq!(EffectiveFlip::resolve(FlipMode::Auto, false), EffectiveFlip::Normal);
}

#[test]
fn test_horizontal_fraction() {
    let sample = GeometrySample {
        window: WindowGeometry {
            x: 1400,
            y: 0,
            width: 400,
            height: 300,
        },
        screen: ScreenGeometry { x: 0, width: 2000 },
    };
    assert_eq!(sample.horizontal_fraction(), Some(0.8));

    let degenerate = GeometrySample {
        screen: ScreenGeometry { x: 0, width: 0 },
        ..sample
    };
    assert_eq!(degenerate.horizontal_fraction(), None);
}

#[test]
fn test_hysteresis_holds_inside_band() {
    let mut m = machine();
    let mut transitions = Vec::new();
    for p in [0.3, 0.55, 0.65, 0.5, 0.45, 0.41] {
        if let Some(state) = m.resolve_now(Some(p)) {
            transitions.push((p, state));
        }
    }
    assert_eq!(transitions, vec![(0.65, AutoFlipState::Active)]);
    assert_eq!(m.state(), AutoFlipState::Active);

    assert_eq!(m.resolve_now(Some(0.39)), Some(AutoFlipState::Inactive));
}

#[test]
fn test_thresholds_are_strict() {
    let mut m = machine();
    assert_eq!(m.resolve_now(Some(0.6)), None);
    assert_eq!(m.resolve_now(Some(0.61)), Some(AutoFlipState::Active));
    assert_eq!(m.resolve_now(Some(0.4)), None);
}

#[test]
fn test_debounce_arms_only_once() {
    let mut m = machine();
    assert_eq!(m.observe(Some(0.7)), SampleOutcome::ArmTimer);
    assert_eq!(m.observe(Some(0.8)), SampleOutcome::AlreadyPending);
    assert_eq!(m.observe(Some(0.2)), SampleOutcome::AlreadyPending);
    assert!(m.is_pending());

    assert_eq!(m.on_timer(Some(0.75)), Some(AutoFlipState::Active));
    assert!(!m.is_pending());
}

#[test]
fn test_timer_expiry_without_warrant_changes_nothing() {
    let mut m = machine();
    assert_eq!(m.observe(Some(0.7)), SampleOutcome::ArmTimer);
    // Window dragged back into the band before expiry
    assert_eq!(m.on_timer(Some(0.5)), None);
    assert_eq!(m.state(), AutoFlipState::Inactive);
    assert!(!m.is_pending());
    assert_eq!(m.observe(Some(0.5)), SampleOutcome::Hold);
}

#[test]
fn test_unavailable_geometry_holds_state() {
    let mut m = AutoFlipStateMachine::new(HysteresisBand::default(), AutoFlipState::Active);
    assert_eq!(m.observe(None), SampleOutcome::Hold);
    assert_eq!(m.resolve_now(None), None);
    assert_eq!(m.state(), AutoFlipState::Active);
}

#[tokio::test(start_paused = true)]
async fn test_controller_applies_after_debounce() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut controller = AutoFlipController::new(
        HysteresisBand::default(),
        AutoFlipState::Inactive,
        Duration::from_secs(1),
        tx,
    );

    controller.sample(Some(0.9));
    controller.sample(Some(0.9));
    assert!(controller.has_pending_timer());

    tokio::time::advance(Duration::from_millis(1001)).await;
    let fired = rx.recv().await.unwrap();
    assert_eq!(controller.timer_fired(fired, Some(0.9)), Some(AutoFlipState::Active));
    assert!(!controller.has_pending_timer());

    // Only one timer was armed for the two samples
    assert!(rx.try_recv().is_err());
}

#[tokio::test(start_paused = true)]
async fn test_controller_focus_bypasses_debounce() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut controller = AutoFlipController::new(
        HysteresisBand::default(),
        AutoFlipState::Inactive,
        Duration::from_secs(1),
        tx,
    );

    controller.sample(Some(0.9));
    assert!(controller.has_pending_timer());

    assert_eq!(controller.resolve_now(Some(0.9)), Some(AutoFlipState::Active));
    assert!(!controller.has_pending_timer());
    // A second resolution for the same placement realizes nothing
    assert_eq!(controller.resolve_now(Some(0.9)), None);

    tokio::time::advance(Duration::from_secs(2)).await;
    tokio::task::yield_now().await;
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn test_stale_timer_token_is_ignored() {
    let (tx, _rx) = mpsc::unbounded_channel();
    let mut controller = AutoFlipController::new(
        HysteresisBand::default(),
        AutoFlipState::Inactive,
        Duration::from_secs(60),
        tx,
    );

    controller.sample(Some(0.9));
    assert_eq!(
        controller.timer_fired(FlipTimerFired { token: 999 }, Some(0.9)),
        None
    );
    assert!(controller.has_pending_timer());
    assert_eq!(controller.state(), AutoFlipState::Inactive);
}

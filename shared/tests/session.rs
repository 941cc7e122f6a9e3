use traceboard_shared::{
    ContactEvent, ContactKind, ContactPhase, FrameOutcome, GestureState, OverlayImage,
    OverlaySession, Point, Setting, Surface, SurfaceError, Viewport,
};

struct Bitmap {
    width: f64,
    height: f64,
}

impl OverlayImage for Bitmap {
    fn width(&self) -> f64 {
        self.width
    }

    fn height(&self) -> f64 {
        self.height
    }
}

#[derive(Default)]
struct CountingSurface {
    viewport: Viewport,
    resizes: usize,
    clears: usize,
    draws: Vec<(f64, f64, f64, f64)>,
    alpha: f64,
    failing_draws: usize,
}

impl Surface for CountingSurface {
    type Image = Bitmap;

    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.resizes += 1;
    }

    fn clear(&mut self) {
        self.clears += 1;
    }

    fn save(&mut self) {}

    fn restore(&mut self) {}

    fn translate(&mut self, _x: f64, _y: f64) -> Result<(), SurfaceError> {
        Ok(())
    }

    fn rotate(&mut self, _radians: f64) -> Result<(), SurfaceError> {
        Ok(())
    }

    fn set_global_alpha(&mut self, alpha: f64) {
        self.alpha = alpha;
    }

    fn draw_image(
        &mut self,
        _image: &Bitmap,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    ) -> Result<(), SurfaceError> {
        if self.failing_draws > 0 {
            self.failing_draws -= 1;
            return Err(SurfaceError::draw("image not decodable"));
        }
        self.draws.push((x, y, width, height));
        Ok(())
    }
}

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

fn touch(phase: ContactPhase, id: i32, x: f64, y: f64) -> ContactEvent {
    ContactEvent::new(phase, id, ContactKind::Touch, Point::new(x, y))
}

fn mouse(phase: ContactPhase, x: f64, y: f64) -> ContactEvent {
    ContactEvent::new(phase, 1, ContactKind::Mouse, Point::new(x, y))
}

fn session_with_image() -> OverlaySession<Bitmap> {
    let mut session = OverlaySession::new(Viewport::new(800.0, 600.0));
    session.load_image(Bitmap {
        width: 1000.0,
        height: 500.0,
    });
    session
}

#[test]
fn first_image_is_fitted_to_the_viewport() {
    let session = session_with_image();
    assert!(approx(session.scale(), 0.64));
    assert_eq!(session.opacity(), 0.5);
    assert_eq!(session.rotation(), 0.0);
    assert_eq!((session.position_x(), session.position_y()), (0.0, 0.0));
}

#[test]
fn reset_matches_initial_fit_exactly() {
    let mut session = session_with_image();
    let initial = *session.transform();
    session.set_opacity(0.9);
    session.set_rotation(123.0);
    session.set_position_x(-40.0);
    session.handle_wheel(-1.0);
    session.reset();
    assert_eq!(*session.transform(), initial);
}

#[test]
fn reset_without_image_restores_defaults() {
    let mut session: OverlaySession<Bitmap> = OverlaySession::new(Viewport::new(800.0, 600.0));
    session.set_scale(2.0);
    session.set_position_y(30.0);
    session.reset();
    assert_eq!(session.scale(), 1.0);
    assert_eq!(session.position_y(), 0.0);
}

#[test]
fn reloading_an_image_keeps_the_transform() {
    let mut session = session_with_image();
    session.set_rotation(45.0);
    session.set_scale(2.0);
    session.load_image(Bitmap {
        width: 10.0,
        height: 10.0,
    });
    assert_eq!(session.rotation(), 45.0);
    assert_eq!(session.scale(), 2.0);
}

#[test]
fn mouse_drag_and_touch_pan_share_one_path() {
    let mut session = session_with_image();
    session.handle_contact(mouse(ContactPhase::Start, 100.0, 100.0));
    session.handle_contact(mouse(ContactPhase::Move, 150.0, 130.0));
    session.handle_contact(mouse(ContactPhase::End, 150.0, 130.0));
    assert_eq!((session.position_x(), session.position_y()), (50.0, 30.0));

    session.handle_contact(touch(ContactPhase::Start, 7, 0.0, 0.0));
    session.handle_contact(touch(ContactPhase::Move, 7, -10.0, 5.0));
    session.handle_contact(touch(ContactPhase::End, 7, -10.0, 5.0));
    assert_eq!((session.position_x(), session.position_y()), (40.0, 35.0));
    assert_eq!(*session.gesture(), GestureState::Idle);
}

#[test]
fn overlay_can_be_dragged_arbitrarily_far_off_canvas() {
    let mut session = session_with_image();
    session.handle_contact(touch(ContactPhase::Start, 1, 0.0, 0.0));
    for step in 1..=100 {
        let x = step as f64 * 1000.0;
        session.handle_contact(touch(ContactPhase::Move, 1, x, 0.0));
    }
    assert_eq!(session.position_x(), 100_000.0);
}

#[test]
fn pinch_doubles_scale_and_keeps_rotation() {
    let mut session = session_with_image();
    session.set_scale(1.0);
    session.set_rotation(15.0);
    session.handle_contact(touch(ContactPhase::Start, 1, 100.0, 100.0));
    session.handle_contact(touch(ContactPhase::Start, 2, 200.0, 100.0));
    session.handle_contact(touch(ContactPhase::Move, 2, 300.0, 100.0));
    assert!(approx(session.scale(), 2.0));
    assert!(approx(session.rotation(), 15.0));
}

#[test]
fn sliders_and_gestures_last_write_wins() {
    let mut session = session_with_image();
    session.handle_contact(touch(ContactPhase::Start, 1, 0.0, 0.0));
    session.handle_contact(touch(ContactPhase::Move, 1, 20.0, 0.0));
    session.apply_setting(Setting::PositionX, -100.0);
    assert_eq!(session.position_x(), -100.0);
    session.handle_contact(touch(ContactPhase::Move, 1, 25.0, 0.0));
    assert_eq!(session.position_x(), -95.0);
}

#[test]
fn renders_only_when_needed_while_camera_is_off() {
    let mut session = session_with_image();
    let mut surface = CountingSurface::default();
    assert!(matches!(
        session.render_tick(&mut surface),
        Some(FrameOutcome::Drawn(_))
    ));
    assert!(session.render_tick(&mut surface).is_none());

    session.set_opacity(0.8);
    assert!(session.render_tick(&mut surface).is_some());
    assert_eq!(surface.alpha, 0.8);
    assert_eq!(surface.draws.len(), 2);
    assert_eq!(surface.resizes, 1);
}

#[test]
fn renders_every_tick_while_camera_is_live() {
    let mut session = session_with_image();
    let mut surface = CountingSurface::default();
    session.set_camera_active(true);
    for _ in 0..5 {
        assert!(session.render_tick(&mut surface).is_some());
    }
    session.set_camera_active(false);
    session.render_tick(&mut surface);
    assert!(!session.wants_frame());
    assert_eq!(surface.draws.len(), 6);
}

#[test]
fn failed_frame_does_not_stop_the_live_loop() {
    let mut session = session_with_image();
    let mut surface = CountingSurface {
        failing_draws: 1,
        ..CountingSurface::default()
    };
    session.set_camera_active(true);
    assert!(matches!(
        session.render_tick(&mut surface),
        Some(FrameOutcome::Failed(_))
    ));
    assert!(session.wants_frame());
    assert!(matches!(
        session.render_tick(&mut surface),
        Some(FrameOutcome::Drawn(_))
    ));
    assert_eq!(surface.draws.len(), 1);
    assert_eq!(surface.clears, 2);
}

#[test]
fn missing_image_renders_camera_only() {
    let mut session: OverlaySession<Bitmap> = OverlaySession::new(Viewport::new(320.0, 240.0));
    let mut surface = CountingSurface::default();
    assert_eq!(session.render_tick(&mut surface), Some(FrameOutcome::Empty));
    assert_eq!(surface.clears, 1);
    assert!(surface.draws.is_empty());
}

#[test]
fn viewport_resize_reallocates_surface() {
    let mut session = session_with_image();
    let mut surface = CountingSurface::default();
    session.render_tick(&mut surface);
    session.resize(Viewport::new(390.0, 844.0));
    session.render_tick(&mut surface);
    assert_eq!(surface.resizes, 2);
    assert_eq!(surface.viewport, Viewport::new(390.0, 844.0));
}

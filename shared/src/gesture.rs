use crate::transform::TransformState;
use crate::{normalize_point, Point};

pub const WHEEL_ZOOM_IN: f64 = 1.1;
pub const WHEEL_ZOOM_OUT: f64 = 0.9;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContactPhase {
    Start,
    Move,
    End,
    Cancel,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContactKind {
    Mouse,
    Touch,
    Pen,
}

impl ContactKind {
    pub fn from_pointer_type(pointer_type: &str) -> Self {
        match pointer_type {
            "touch" => ContactKind::Touch,
            "pen" => ContactKind::Pen,
            _ => ContactKind::Mouse,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ContactEvent {
    pub phase: ContactPhase,
    pub id: i32,
    pub kind: ContactKind,
    pub point: Point,
}

impl ContactEvent {
    pub fn new(phase: ContactPhase, id: i32, kind: ContactKind, point: Point) -> Self {
        Self {
            phase,
            id,
            kind,
            point,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GestureState {
    Idle,
    Panning {
        id: i32,
        last: Point,
    },
    PinchRotating {
        first: i32,
        second: i32,
        distance: f64,
        angle: f64,
    },
}

#[derive(Clone, Debug)]
pub struct GestureInterpreter {
    state: GestureState,
    contacts: Vec<(i32, Point)>,
}

impl Default for GestureInterpreter {
    fn default() -> Self {
        Self::new()
    }
}

pub fn wrap_degrees(delta: f64) -> f64 {
    let wrapped = delta.rem_euclid(360.0);
    if wrapped > 180.0 {
        wrapped - 360.0
    } else {
        wrapped
    }
}

pub fn wheel_factor(delta_y: f64) -> Option<f64> {
    if !delta_y.is_finite() || delta_y == 0.0 {
        return None;
    }
    if delta_y > 0.0 {
        Some(WHEEL_ZOOM_OUT)
    } else {
        Some(WHEEL_ZOOM_IN)
    }
}

pub fn apply_wheel(delta_y: f64, transform: &mut TransformState) -> bool {
    let Some(factor) = wheel_factor(delta_y) else {
        return false;
    };
    let before = transform.scale();
    transform.scale_by(factor);
    transform.scale() != before
}

impl GestureInterpreter {
    pub fn new() -> Self {
        Self {
            state: GestureState::Idle,
            contacts: Vec::new(),
        }
    }

    pub fn state(&self) -> &GestureState {
        &self.state
    }

    pub fn cancel(&mut self) {
        self.contacts.clear();
        self.state = GestureState::Idle;
    }

    /// Feeds one contact sample. Returns `true` when `transform` changed.
    pub fn handle(&mut self, event: ContactEvent, transform: &mut TransformState) -> bool {
        let Some(point) = normalize_point(event.point) else {
            return false;
        };
        match event.phase {
            ContactPhase::Start => {
                self.upsert_contact(event.id, point);
                self.reconcile();
                false
            }
            ContactPhase::Move => {
                if !self.update_contact(event.id, point) {
                    return false;
                }
                self.apply_move(event.id, transform)
            }
            ContactPhase::End | ContactPhase::Cancel => {
                self.contacts.retain(|(id, _)| *id != event.id);
                self.reconcile();
                false
            }
        }
    }

    fn upsert_contact(&mut self, id: i32, point: Point) {
        if !self.update_contact(id, point) {
            self.contacts.push((id, point));
        }
    }

    fn update_contact(&mut self, id: i32, point: Point) -> bool {
        match self.contacts.iter_mut().find(|(existing, _)| *existing == id) {
            Some(entry) => {
                entry.1 = point;
                true
            }
            None => false,
        }
    }

    fn position(&self, id: i32) -> Option<Point> {
        self.contacts
            .iter()
            .find(|(existing, _)| *existing == id)
            .map(|(_, point)| *point)
    }

    fn reconcile(&mut self) {
        let next = match (self.state, self.contacts.as_slice()) {
            (_, []) => GestureState::Idle,
            (GestureState::PinchRotating { first, second, .. }, _)
                if self.position(first).is_some() && self.position(second).is_some() =>
            {
                self.state
            }
            (_, [(first, p1), (second, p2), ..]) => GestureState::PinchRotating {
                first: *first,
                second: *second,
                distance: p1.distance_to(*p2),
                angle: p1.angle_to(*p2),
            },
            (GestureState::Panning { id, last }, [(only, _)]) if id == *only => {
                GestureState::Panning { id, last }
            }
            (_, [(only, point)]) => GestureState::Panning {
                id: *only,
                last: *point,
            },
        };
        if next != self.state {
            tracing::debug!(from = ?self.state, to = ?next, contacts = self.contacts.len(), "gesture transition");
        }
        self.state = next;
    }

    fn apply_move(&mut self, id: i32, transform: &mut TransformState) -> bool {
        match self.state {
            GestureState::Idle => false,
            GestureState::Panning { id: tracked, last } => {
                if id != tracked {
                    return false;
                }
                let Some(current) = self.position(tracked) else {
                    return false;
                };
                transform.translate(current.x - last.x, current.y - last.y);
                self.state = GestureState::Panning {
                    id: tracked,
                    last: current,
                };
                current != last
            }
            GestureState::PinchRotating {
                first,
                second,
                distance,
                angle,
            } => {
                if id != first && id != second {
                    return false;
                }
                let (Some(p1), Some(p2)) = (self.position(first), self.position(second)) else {
                    return false;
                };
                let current_distance = p1.distance_to(p2);
                let current_angle = p1.angle_to(p2);
                let scale_factor = if distance > 0.0 {
                    current_distance / distance
                } else {
                    1.0
                };
                let before = *transform;
                transform.scale_by(scale_factor);
                transform.rotate_by(wrap_degrees(current_angle - angle));
                self.state = GestureState::PinchRotating {
                    first,
                    second,
                    distance: current_distance,
                    angle: current_angle,
                };
                *transform != before
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(phase: ContactPhase, id: i32, x: f64, y: f64) -> ContactEvent {
        ContactEvent::new(phase, id, ContactKind::Touch, Point::new(x, y))
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn single_contact_pans_by_exact_delta() {
        let mut gestures = GestureInterpreter::new();
        let mut transform = TransformState::default();
        gestures.handle(touch(ContactPhase::Start, 1, 100.0, 100.0), &mut transform);
        assert!(matches!(gestures.state(), GestureState::Panning { id: 1, .. }));
        assert!(gestures.handle(touch(ContactPhase::Move, 1, 150.0, 130.0), &mut transform));
        assert_eq!(transform.position_x(), 50.0);
        assert_eq!(transform.position_y(), 30.0);
        gestures.handle(touch(ContactPhase::Move, 1, 140.0, 130.0), &mut transform);
        assert_eq!(transform.position_x(), 40.0);
    }

    #[test]
    fn second_contact_switches_to_pinch() {
        let mut gestures = GestureInterpreter::new();
        let mut transform = TransformState::default();
        gestures.handle(touch(ContactPhase::Start, 1, 0.0, 0.0), &mut transform);
        gestures.handle(touch(ContactPhase::Start, 2, 100.0, 0.0), &mut transform);
        match gestures.state() {
            GestureState::PinchRotating {
                first,
                second,
                distance,
                angle,
            } => {
                assert_eq!((*first, *second), (1, 2));
                assert_eq!(*distance, 100.0);
                assert_eq!(*angle, 0.0);
            }
            other => panic!("expected pinch, got {other:?}"),
        }
    }

    #[test]
    fn pinch_doubles_scale_without_rotating() {
        let mut gestures = GestureInterpreter::new();
        let mut transform = TransformState::default();
        transform.set_scale(0.5);
        gestures.handle(touch(ContactPhase::Start, 1, 0.0, 0.0), &mut transform);
        gestures.handle(touch(ContactPhase::Start, 2, 100.0, 0.0), &mut transform);
        gestures.handle(touch(ContactPhase::Move, 2, 200.0, 0.0), &mut transform);
        assert!(approx(transform.scale(), 1.0));
        assert_eq!(transform.rotation_degrees(), 0.0);
        assert_eq!(transform.position_x(), 0.0);
    }

    #[test]
    fn pinch_scale_is_clamped() {
        let mut gestures = GestureInterpreter::new();
        let mut transform = TransformState::default();
        transform.set_scale(2.0);
        gestures.handle(touch(ContactPhase::Start, 1, 0.0, 0.0), &mut transform);
        gestures.handle(touch(ContactPhase::Start, 2, 100.0, 0.0), &mut transform);
        gestures.handle(touch(ContactPhase::Move, 2, 400.0, 0.0), &mut transform);
        assert_eq!(transform.scale(), 3.0);
    }

    #[test]
    fn pinch_twist_rotates_incrementally() {
        let mut gestures = GestureInterpreter::new();
        let mut transform = TransformState::default();
        gestures.handle(touch(ContactPhase::Start, 1, 0.0, 0.0), &mut transform);
        gestures.handle(touch(ContactPhase::Start, 2, 100.0, 0.0), &mut transform);
        gestures.handle(touch(ContactPhase::Move, 2, 0.0, 100.0), &mut transform);
        assert!(approx(transform.rotation_degrees(), 90.0));
        gestures.handle(touch(ContactPhase::Move, 2, -100.0, 0.0), &mut transform);
        assert!(approx(transform.rotation_degrees(), 180.0));
        assert!(approx(transform.scale(), 1.0));
    }

    #[test]
    fn crossing_the_branch_cut_does_not_jump() {
        let mut gestures = GestureInterpreter::new();
        let mut transform = TransformState::default();
        gestures.handle(touch(ContactPhase::Start, 1, 0.0, 0.0), &mut transform);
        gestures.handle(touch(ContactPhase::Start, 2, -100.0, 1.0), &mut transform);
        gestures.handle(touch(ContactPhase::Move, 2, -100.0, -1.0), &mut transform);
        assert!(transform.rotation_degrees().abs() < 2.0);
    }

    #[test]
    fn coincident_contacts_skip_scaling() {
        let mut gestures = GestureInterpreter::new();
        let mut transform = TransformState::default();
        gestures.handle(touch(ContactPhase::Start, 1, 50.0, 50.0), &mut transform);
        gestures.handle(touch(ContactPhase::Start, 2, 50.0, 50.0), &mut transform);
        gestures.handle(touch(ContactPhase::Move, 2, 80.0, 50.0), &mut transform);
        assert_eq!(transform.scale(), 1.0);
        assert!(transform.scale().is_finite());
    }

    #[test]
    fn releasing_everything_returns_to_idle_without_stale_pinch() {
        let mut gestures = GestureInterpreter::new();
        let mut transform = TransformState::default();
        gestures.handle(touch(ContactPhase::Start, 1, 0.0, 0.0), &mut transform);
        gestures.handle(touch(ContactPhase::Start, 2, 10.0, 0.0), &mut transform);
        gestures.handle(touch(ContactPhase::End, 1, 0.0, 0.0), &mut transform);
        gestures.handle(touch(ContactPhase::End, 2, 10.0, 0.0), &mut transform);
        assert_eq!(*gestures.state(), GestureState::Idle);
        assert!(gestures.contacts.is_empty());

        gestures.handle(touch(ContactPhase::Start, 3, 0.0, 0.0), &mut transform);
        gestures.handle(touch(ContactPhase::Start, 4, 100.0, 0.0), &mut transform);
        gestures.handle(touch(ContactPhase::Move, 4, 200.0, 0.0), &mut transform);
        assert!(approx(transform.scale(), 2.0));
    }

    #[test]
    fn lifting_one_pinch_contact_pans_from_current_position() {
        let mut gestures = GestureInterpreter::new();
        let mut transform = TransformState::default();
        gestures.handle(touch(ContactPhase::Start, 1, 0.0, 0.0), &mut transform);
        gestures.handle(touch(ContactPhase::Start, 2, 100.0, 0.0), &mut transform);
        gestures.handle(touch(ContactPhase::Move, 2, 120.0, 10.0), &mut transform);
        gestures.handle(touch(ContactPhase::End, 1, 0.0, 0.0), &mut transform);
        assert_eq!(
            *gestures.state(),
            GestureState::Panning {
                id: 2,
                last: Point::new(120.0, 10.0)
            }
        );
        gestures.handle(touch(ContactPhase::Move, 2, 125.0, 10.0), &mut transform);
        assert_eq!(transform.position_x(), 5.0);
    }

    #[test]
    fn third_contact_does_not_disturb_pinch() {
        let mut gestures = GestureInterpreter::new();
        let mut transform = TransformState::default();
        gestures.handle(touch(ContactPhase::Start, 1, 0.0, 0.0), &mut transform);
        gestures.handle(touch(ContactPhase::Start, 2, 100.0, 0.0), &mut transform);
        gestures.handle(touch(ContactPhase::Start, 3, 500.0, 500.0), &mut transform);
        assert!(!gestures.handle(touch(ContactPhase::Move, 3, 900.0, 900.0), &mut transform));
        assert!(matches!(
            gestures.state(),
            GestureState::PinchRotating {
                first: 1,
                second: 2,
                ..
            }
        ));
        assert_eq!(transform, TransformState::default());
    }

    #[test]
    fn moves_without_contact_are_ignored() {
        let mut gestures = GestureInterpreter::new();
        let mut transform = TransformState::default();
        let hover = ContactEvent::new(
            ContactPhase::Move,
            1,
            ContactKind::Mouse,
            Point::new(30.0, 30.0),
        );
        assert!(!gestures.handle(hover, &mut transform));
        assert_eq!(transform, TransformState::default());
    }

    #[test]
    fn non_finite_points_are_dropped() {
        let mut gestures = GestureInterpreter::new();
        let mut transform = TransformState::default();
        gestures.handle(touch(ContactPhase::Start, 1, 0.0, 0.0), &mut transform);
        gestures.handle(touch(ContactPhase::Move, 1, f64::NAN, 4.0), &mut transform);
        assert_eq!(transform.position_x(), 0.0);
    }

    #[test]
    fn wheel_steps_scale() {
        let mut transform = TransformState::default();
        assert!(apply_wheel(-120.0, &mut transform));
        assert!(approx(transform.scale(), 1.1));
        assert!(apply_wheel(53.0, &mut transform));
        assert!(approx(transform.scale(), 0.99));
        assert!(!apply_wheel(0.0, &mut transform));
    }

    #[test]
    fn wrap_degrees_stays_in_half_open_range() {
        assert_eq!(wrap_degrees(0.0), 0.0);
        assert_eq!(wrap_degrees(180.0), 180.0);
        assert_eq!(wrap_degrees(-180.0), 180.0);
        assert!(approx(wrap_degrees(350.0), -10.0));
        assert!(approx(wrap_degrees(-350.0), 10.0));
    }
}

//! Day view: tasks laid out as arcs on a two-ring, 12-hour dial.
//!
//! The inner ring carries the morning and the outer ring the afternoon.
//! A task that runs across noon is cut into one arc per ring. Segments
//! come back sorted longest-first; renderers draw them in that order and
//! hit-test in reverse so short arcs stay on top and clickable.

use chrono::{NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use super::progress::TaskShade;
use super::project::resolve_color;
use super::time::{minute_to_angle, ClockTime, TimeInterval, NOON};
use super::{Project, Task, TaskId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ring {
    Am,
    Pm,
}

/// Dial dimensions in drawing units. Both rings sit inside the face.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DialGeometry {
    pub center_x: f64,
    pub center_y: f64,
    pub face_radius: f64,
    pub am_radius: f64,
    pub pm_radius: f64,
}

impl Default for DialGeometry {
    fn default() -> Self {
        Self {
            center_x: 150.0,
            center_y: 150.0,
            face_radius: 140.0,
            am_radius: 85.0,
            pm_radius: 115.0,
        }
    }
}

impl DialGeometry {
    pub fn ring_radius(&self, ring: Ring) -> f64 {
        match ring {
            Ring::Am => self.am_radius,
            Ring::Pm => self.pm_radius,
        }
    }

    /// Ring track and dial angle under a point, or `None` when the point
    /// is closer to neither track than half the gap between them.
    pub fn locate(&self, x: f64, y: f64) -> Option<(Ring, f64)> {
        let dx = x - self.center_x;
        let dy = y - self.center_y;
        let distance = dx.hypot(dy);
        let tolerance = (self.pm_radius - self.am_radius).abs() / 2.0;
        let off_track = |ring: &Ring| (distance - self.ring_radius(*ring)).abs();

        let ring = [Ring::Am, Ring::Pm]
            .into_iter()
            .filter(|ring| off_track(ring) <= tolerance)
            .min_by(|a, b| off_track(a).total_cmp(&off_track(b)))?;
        Some((ring, dx.atan2(-dy).to_degrees().rem_euclid(360.0)))
    }

    /// Point on a circle of `radius` at a dial angle (0° up, clockwise).
    pub fn point_at(&self, radius: f64, angle_deg: f64) -> (f64, f64) {
        let rad = angle_deg.to_radians();
        (
            self.center_x + radius * rad.sin(),
            self.center_y - radius * rad.cos(),
        )
    }
}

/// Clockwise arc on the dial. `end_angle` is always greater than
/// `start_angle`; it may exceed 360 when the arc passes 12 o'clock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArcPath {
    pub center_x: f64,
    pub center_y: f64,
    pub radius: f64,
    pub start_angle: f64,
    pub end_angle: f64,
    pub clockwise: bool,
    pub large_arc: bool,
}

impl ArcPath {
    fn new(geometry: &DialGeometry, radius: f64, start_angle: f64, mut end_angle: f64) -> Self {
        if end_angle <= start_angle {
            end_angle += 360.0;
        }
        Self {
            center_x: geometry.center_x,
            center_y: geometry.center_y,
            radius,
            start_angle,
            end_angle,
            clockwise: true,
            large_arc: end_angle - start_angle > 180.0,
        }
    }

    pub fn sweep(&self) -> f64 {
        self.end_angle - self.start_angle
    }

    pub fn point_at(&self, angle_deg: f64) -> (f64, f64) {
        let rad = angle_deg.to_radians();
        (
            self.center_x + self.radius * rad.sin(),
            self.center_y - self.radius * rad.cos(),
        )
    }

    /// Whether a dial angle lies on this arc, end excluded.
    pub fn covers(&self, angle_deg: f64) -> bool {
        let angle = angle_deg.rem_euclid(360.0);
        [angle, angle + 360.0]
            .iter()
            .any(|a| *a >= self.start_angle && *a < self.end_angle)
    }

    /// SVG path data. Sweep flag 1 is clockwise in SVG's y-down space.
    /// A full-turn arc is emitted as two halves since SVG can't draw an
    /// arc whose endpoints coincide.
    pub fn svg_path(&self) -> String {
        let (sx, sy) = self.point_at(self.start_angle);
        let r = self.radius;
        if self.sweep() >= 360.0 {
            let (mx, my) = self.point_at(self.start_angle + 180.0);
            return format!(
                "M {sx:.2} {sy:.2} A {r:.2} {r:.2} 0 0 1 {mx:.2} {my:.2} A {r:.2} {r:.2} 0 0 1 {sx:.2} {sy:.2}"
            );
        }
        let (ex, ey) = self.point_at(self.end_angle);
        let large = u8::from(self.large_arc);
        let sweep = u8::from(self.clockwise);
        format!("M {sx:.2} {sy:.2} A {r:.2} {r:.2} 0 {large} {sweep} {ex:.2} {ey:.2}")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub task_id: TaskId,
    pub ring: Ring,
    pub start_minute: u16,
    pub end_minute: u16,
    pub arc: ArcPath,
    pub color: String,
    pub shade: TaskShade,
    /// True while now is inside the task's full, unsplit interval.
    pub is_active: bool,
}

impl Segment {
    pub fn duration_minutes(&self) -> u16 {
        self.end_minute - self.start_minute
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClockHands {
    pub hour_angle: f64,
    pub minute_angle: f64,
}

impl ClockHands {
    pub fn at(now: NaiveDateTime) -> Self {
        let time = now.time();
        Self {
            hour_angle: minute_to_angle(ClockTime::from_naive(time).minutes()),
            minute_angle: time.minute() as f64 * 6.0 + time.second() as f64 * 0.1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayLayout {
    pub date: NaiveDate,
    pub geometry: DialGeometry,
    /// Draw order: longest segment first.
    pub segments: Vec<Segment>,
    /// Tasks on this day whose interval is empty or inverted.
    pub rejected: Vec<TaskId>,
    pub hands: ClockHands,
}

impl DayLayout {
    /// Topmost segment under a dial angle on a ring, i.e. the last one
    /// drawn that covers it.
    pub fn hit_test(&self, ring: Ring, angle_deg: f64) -> Option<&Segment> {
        self.segments
            .iter()
            .rev()
            .find(|segment| segment.ring == ring && segment.arc.covers(angle_deg))
    }

    /// Topmost segment under a point in drawing units.
    pub fn segment_at(&self, x: f64, y: f64) -> Option<&Segment> {
        let (ring, angle) = self.geometry.locate(x, y)?;
        self.hit_test(ring, angle)
    }

    pub fn segments_for(&self, task_id: &TaskId) -> impl Iterator<Item = &Segment> {
        let task_id = task_id.clone();
        self.segments.iter().filter(move |s| s.task_id == task_id)
    }

    pub fn active_task_ids(&self) -> Vec<&TaskId> {
        let mut ids: Vec<&TaskId> = Vec::new();
        for segment in self.segments.iter().filter(|s| s.is_active) {
            if !ids.contains(&&segment.task_id) {
                ids.push(&segment.task_id);
            }
        }
        ids
    }
}

/// Cuts an interval at noon. Always one or two pieces; the pieces share
/// the noon boundary and their durations sum to the original.
pub fn split_at_noon(interval: TimeInterval) -> Vec<(Ring, TimeInterval)> {
    if !interval.spans_noon() {
        let ring = if interval.ends_by_noon() { Ring::Am } else { Ring::Pm };
        return vec![(ring, interval)];
    }
    [
        (Ring::Am, TimeInterval::from_minutes(interval.start(), NOON)),
        (Ring::Pm, TimeInterval::from_minutes(NOON, interval.end())),
    ]
    .into_iter()
    .filter_map(|(ring, piece)| piece.map(|p| (ring, p)))
    .collect()
}

fn draw_order(a: &Segment, b: &Segment) -> Ordering {
    b.duration_minutes()
        .cmp(&a.duration_minutes())
        .then(a.start_minute.cmp(&b.start_minute))
        .then_with(|| a.task_id.cmp(&b.task_id))
}

/// Lays out every task dated `date`. Tasks on other days are ignored.
pub fn layout_day(
    date: NaiveDate,
    tasks: &[Task],
    projects: &[Project],
    geometry: &DialGeometry,
    now: NaiveDateTime,
) -> DayLayout {
    let mut segments = Vec::new();
    let mut rejected = Vec::new();

    for task in tasks.iter().filter(|t| t.date == date) {
        let interval = match task.interval() {
            Ok(interval) => interval,
            Err(e) => {
                tracing::warn!("Skipping task {} on dial: {}", task.id, e);
                rejected.push(task.id.clone());
                continue;
            }
        };

        let color = resolve_color(projects, &task.project_id);
        let shade = TaskShade::for_task(task, color);
        let is_active = task.is_active_at(now);

        for (ring, piece) in split_at_noon(interval) {
            let arc = ArcPath::new(
                geometry,
                geometry.ring_radius(ring),
                minute_to_angle(piece.start()),
                minute_to_angle(piece.end()),
            );
            segments.push(Segment {
                task_id: task.id.clone(),
                ring,
                start_minute: piece.start(),
                end_minute: piece.end(),
                arc,
                color: color.to_string(),
                shade: shade.clone(),
                is_active,
            });
        }
    }

    segments.sort_by(draw_order);

    DayLayout {
        date,
        geometry: *geometry,
        segments,
        rejected,
        hands: ClockHands::at(now),
    }
}

/// Selection to show when a day is opened.
///
/// An explicit earlier selection for the day is kept. Otherwise, only on
/// today, the task running right now is picked; with several running the
/// shortest wins, matching hit-test priority. Anything else selects
/// nothing.
pub fn default_selection(
    date: NaiveDate,
    tasks: &[Task],
    now: NaiveDateTime,
    explicit: Option<&TaskId>,
) -> Option<TaskId> {
    if let Some(id) = explicit {
        if tasks.iter().any(|t| &t.id == id && t.date == date) {
            return Some(id.clone());
        }
    }
    if date != now.date() {
        return None;
    }
    tasks
        .iter()
        .filter(|t| t.date == date && t.is_active_at(now))
        .min_by(|a, b| {
            a.duration_minutes()
                .cmp(&b.duration_minutes())
                .then(a.start_time.cmp(&b.start_time))
        })
        .map(|t| t.id.clone())
}

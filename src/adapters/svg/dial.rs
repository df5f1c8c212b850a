use std::fmt::{self, Write};

use crate::domain::radial::{DayLayout, Segment};
use crate::domain::{Task, TaskId};

const STROKE_WIDTH: f64 = 22.0;
const TRACK_COLOR: &str = "#e5e7eb";
const FACE_COLOR: &str = "#ffffff";
const HAND_COLOR: &str = "#111827";
const ACTIVE_OUTLINE: &str = "#ef4444";

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

fn segment_title(segment: &Segment, tasks: &[Task]) -> String {
    match tasks.iter().find(|t| t.id == segment.task_id) {
        Some(task) => format!("{} ({})", task.title, task.time_range_display()),
        None => segment.task_id.to_string(),
    }
}

/// Renders a day layout as a standalone SVG document.
///
/// Segments are emitted in layout order so later (shorter) arcs paint over
/// longer ones. The selected task gets a dark outline; running tasks a red
/// one.
pub fn render_dial(layout: &DayLayout, tasks: &[Task], selected: Option<&TaskId>) -> String {
    let mut svg = String::new();
    write_dial(&mut svg, layout, tasks, selected)
        .map(|()| svg)
        .unwrap_or_default()
}

fn write_dial(
    svg: &mut impl Write,
    layout: &DayLayout,
    tasks: &[Task],
    selected: Option<&TaskId>,
) -> fmt::Result {
    let g = &layout.geometry;
    let width = 2.0 * g.center_x;
    let height = 2.0 * g.center_y;

    writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {width:.0} {height:.0}" width="{width:.0}" height="{height:.0}">"#
    )?;
    writeln!(svg, "  <title>{}</title>", layout.date.format("%A %-d %B %Y"))?;
    writeln!(
        svg,
        r#"  <circle cx="{:.2}" cy="{:.2}" r="{:.2}" fill="{FACE_COLOR}" stroke="{TRACK_COLOR}" stroke-width="2"/>"#,
        g.center_x, g.center_y, g.face_radius
    )?;

    for radius in [g.am_radius, g.pm_radius] {
        writeln!(
            svg,
            r#"  <circle cx="{:.2}" cy="{:.2}" r="{radius:.2}" fill="none" stroke="{TRACK_COLOR}" stroke-width="{STROKE_WIDTH}"/>"#,
            g.center_x, g.center_y
        )?;
    }

    for hour in 0..12 {
        let angle = hour as f64 * 30.0;
        let (x1, y1) = g.point_at(g.face_radius - 6.0, angle);
        let (x2, y2) = g.point_at(g.face_radius, angle);
        writeln!(
            svg,
            r#"  <line x1="{x1:.2}" y1="{y1:.2}" x2="{x2:.2}" y2="{y2:.2}" stroke="{HAND_COLOR}" stroke-width="2"/>"#
        )?;
    }

    for segment in &layout.segments {
        write_segment(svg, segment, tasks, selected == Some(&segment.task_id))?;
    }

    let hands = &layout.hands;
    for (angle, length, width) in [
        (hands.hour_angle, g.am_radius * 0.6, 4.0),
        (hands.minute_angle, g.pm_radius * 0.9, 2.0),
    ] {
        let (x, y) = g.point_at(length, angle);
        writeln!(
            svg,
            r#"  <line x1="{:.2}" y1="{:.2}" x2="{x:.2}" y2="{y:.2}" stroke="{HAND_COLOR}" stroke-width="{width}" stroke-linecap="round"/>"#,
            g.center_x, g.center_y
        )?;
    }
    writeln!(
        svg,
        r#"  <circle cx="{:.2}" cy="{:.2}" r="4" fill="{HAND_COLOR}"/>"#,
        g.center_x, g.center_y
    )?;
    writeln!(svg, "</svg>")
}

fn write_segment(
    svg: &mut impl Write,
    segment: &Segment,
    tasks: &[Task],
    is_selected: bool,
) -> fmt::Result {
    writeln!(
        svg,
        r#"  <g data-task-id="{}" data-ring="{:?}">"#,
        escape(&segment.task_id.0),
        segment.ring
    )?;
    writeln!(
        svg,
        r#"    <path d="{}" fill="none" stroke="{}" stroke-width="{STROKE_WIDTH}" stroke-linecap="butt"><title>{}</title></path>"#,
        segment.arc.svg_path(),
        segment.shade.fill,
        escape(&segment_title(segment, tasks))
    )?;
    let outline = if is_selected {
        Some(HAND_COLOR)
    } else if segment.is_active {
        Some(ACTIVE_OUTLINE)
    } else {
        None
    };
    if let Some(color) = outline {
        writeln!(
            svg,
            r#"    <path d="{}" fill="none" stroke="{color}" stroke-width="2" stroke-dasharray="4 2"/>"#,
            segment.arc.svg_path()
        )?;
    }
    writeln!(svg, "  </g>")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::radial::{layout_day, DialGeometry};
    use crate::domain::task::fixtures::task;
    use crate::domain::Project;
    use chrono::NaiveDate;

    fn layout(tasks: &[Task]) -> DayLayout {
        let project = Project {
            id: "p".into(),
            name: "Family".to_string(),
            color: "#3b82f6".to_string(),
            description: None,
        };
        let date = NaiveDate::from_ymd_opt(2024, 12, 5).unwrap();
        layout_day(
            date,
            tasks,
            &[project],
            &DialGeometry::default(),
            date.and_hms_opt(10, 15, 0).unwrap(),
        )
    }

    #[test]
    fn test_renders_one_path_group_per_segment() {
        let tasks = vec![
            task("lunch", "p", "2024-12-05", "11:30", "12:30"),
            task("run", "p", "2024-12-05", "07:00", "08:00"),
        ];
        let svg = render_dial(&layout(&tasks), &tasks, None);

        assert!(svg.starts_with("<svg"));
        assert!(svg.trim_end().ends_with("</svg>"));
        assert_eq!(svg.matches("data-task-id=").count(), 3);
        assert_eq!(svg.matches(r#"data-task-id="lunch""#).count(), 2);
    }

    #[test]
    fn test_titles_are_escaped() {
        let mut t = task("t", "p", "2024-12-05", "07:00", "08:00");
        t.title = "Mum & Dad <3".to_string();
        let tasks = vec![t];
        let svg = render_dial(&layout(&tasks), &tasks, None);
        assert!(svg.contains("Mum &amp; Dad &lt;3"));
        assert!(!svg.contains("Mum & Dad"));
    }

    #[test]
    fn test_selected_and_active_outlines() {
        let tasks = vec![
            task("now", "p", "2024-12-05", "10:00", "11:00"),
            task("later", "p", "2024-12-05", "14:00", "15:00"),
        ];
        let plain = render_dial(&layout(&tasks), &tasks, None);
        assert_eq!(plain.matches(ACTIVE_OUTLINE).count(), 1);

        let selected = render_dial(&layout(&tasks), &tasks, Some(&TaskId::from("later")));
        assert_eq!(selected.matches("stroke-dasharray").count(), 2);
    }
}

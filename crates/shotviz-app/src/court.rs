// Court markings as 3D polylines, plus the floor surface they sit on.

use std::f64::consts::{FRAC_PI_2, TAU};

use serde::Serialize;
use shotviz_core::geometry::CourtGeometry;

use crate::arcs::Point3;

/// Lines drawn flat on the floor sit just above it so they are not hidden by
/// the floor surface.
const THREE_POINT_Z: f64 = 0.02;

const LINE_COLOR: &str = "black";
const RIM_COLOR: &str = "#111";
const FLOOR_COLOR: &str = "#f5e6d3";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CourtLine {
    pub name: &'static str,
    pub points: Vec<Point3>,
    pub width: f64,
    pub color: &'static str,
}

/// Flat rectangle covering the half court.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FloorSurface {
    pub x: [f64; 2],
    pub y: [f64; 2],
    pub color: &'static str,
    pub opacity: f64,
}

/// Filled backboard as two triangles over its four corners.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BackboardFace {
    pub vertices: [Point3; 4],
    pub triangles: [[usize; 3]; 2],
    pub color: &'static str,
    pub opacity: f64,
}

/// Corners of the backboard: top-left, top-right, bottom-right, bottom-left.
fn backboard_corners(g: &CourtGeometry) -> [Point3; 4] {
    let half_board = g.backboard_width / 2.0;
    let top = g.rim_height + g.backboard_height / 2.0;
    let bottom = g.rim_height - g.backboard_height / 2.0;
    let bx = g.backboard_x;
    [
        [bx, -half_board, top],
        [bx, half_board, top],
        [bx, half_board, bottom],
        [bx, -half_board, bottom],
    ]
}

pub fn backboard_face(geometry: &CourtGeometry) -> BackboardFace {
    BackboardFace {
        vertices: backboard_corners(geometry),
        triangles: [[0, 1, 2], [0, 2, 3]],
        color: "white",
        opacity: 0.98,
    }
}

pub fn floor_surface(geometry: &CourtGeometry, opacity: f64) -> FloorSurface {
    let half_width = geometry.half_width();
    FloorSurface {
        x: [0.0, geometry.half_length],
        y: [-half_width, half_width],
        color: FLOOR_COLOR,
        opacity,
    }
}

fn linspace(start: f64, end: f64, n: usize) -> impl Iterator<Item = f64> {
    let n = n.max(2);
    let step = (end - start) / (n - 1) as f64;
    (0..n).map(move |i| start + step * i as f64)
}

/// Arc of a circle in the floor-parallel plane at height `z`.
fn arc(center: (f64, f64), radius: f64, from: f64, to: f64, n: usize, z: f64) -> Vec<Point3> {
    linspace(from, to, n)
        .map(|t| [center.0 + radius * t.cos(), center.1 + radius * t.sin(), z])
        .collect()
}

fn rectangle(x0: f64, x1: f64, y0: f64, y1: f64, z: f64) -> Vec<Point3> {
    vec![
        [x0, y0, z],
        [x1, y0, z],
        [x1, y1, z],
        [x0, y1, z],
        [x0, y0, z],
    ]
}

fn line(name: &'static str, points: Vec<Point3>, width: f64) -> CourtLine {
    CourtLine {
        name,
        points,
        width,
        color: LINE_COLOR,
    }
}

/// Every court marking, in draw order.
///
/// With `full_three_semicircle` the three-point arc is drawn as a full half
/// circle and the corner lines are left out.
pub fn court_lines(g: &CourtGeometry, full_three_semicircle: bool) -> Vec<CourtLine> {
    let half_width = g.half_width();
    let half_paint = g.half_paint_width();
    let hoop = (g.hoop_x(), g.hoop_y);

    let mut lines = vec![
        line(
            "floor_outline",
            rectangle(0.0, g.half_length, -half_width, half_width, 0.0),
            6.0,
        ),
        line(
            "paint",
            rectangle(0.0, g.free_throw_line_x, -half_paint, half_paint, 0.0),
            4.0,
        ),
        line(
            "free_throw_circle",
            arc(
                (g.free_throw_line_x, g.hoop_y),
                g.free_throw_circle_radius,
                -FRAC_PI_2,
                FRAC_PI_2,
                240,
                0.0,
            ),
            4.0,
        ),
        line(
            "restricted_area",
            arc(hoop, g.restricted_radius, -FRAC_PI_2, FRAC_PI_2, 240, 0.0),
            4.0,
        ),
    ];

    if full_three_semicircle {
        lines.push(line(
            "three_point_arc",
            arc(hoop, g.three_point_radius, -FRAC_PI_2, FRAC_PI_2, 901, THREE_POINT_Z),
            4.0,
        ));
    } else {
        let theta = g.corner_meet_angle();
        let x_meet = g.corner_meet_x();
        let corner = g.three_point_corner;
        lines.push(line(
            "three_point_arc",
            arc(hoop, g.three_point_radius, -theta, theta, 721, THREE_POINT_Z),
            4.0,
        ));
        lines.push(line(
            "three_point_corner_right",
            vec![[0.0, corner, THREE_POINT_Z], [x_meet, corner, THREE_POINT_Z]],
            4.0,
        ));
        lines.push(line(
            "three_point_corner_left",
            vec![[0.0, -corner, THREE_POINT_Z], [x_meet, -corner, THREE_POINT_Z]],
            4.0,
        ));
    }

    lines.push(CourtLine {
        name: "rim",
        points: arc(hoop, g.rim_radius, 0.0, TAU, 256, g.rim_height),
        width: 8.0,
        color: RIM_COLOR,
    });

    let corners = backboard_corners(g);
    let mut outline = corners.to_vec();
    outline.push(corners[0]);
    lines.push(line("backboard", outline, 4.0));

    lines
}

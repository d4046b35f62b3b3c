use std::collections::BTreeMap;

use log::{debug, info, warn};
use nalgebra::Vector2;
use serde::Serialize;
use thiserror::Error;

use crate::model::{Direction, Intersection, Lane, LaneId, Point};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    #[error(
        "approaches {} have no ingress lane",
        .0.iter().map(|a| a.to_string()).collect::<Vec<_>>().join(", ")
    )]
    ApproachWithoutIngress(Vec<u32>),
}

/// Direction assigned to one approach and the point it was derived from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApproachDirection {
    pub approach_id: u32,
    pub anchor: [f64; 2],
    pub bearing: f64,
    pub direction: Direction,
    pub lanes: Vec<LaneId>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification {
    pub center: [f64; 2],
    /// No stop lines were found and the center fell back to the origin.
    pub center_degraded: bool,
    pub approaches: Vec<ApproachDirection>,
    /// Lanes without an approach, or whose approach had no usable node.
    pub unclassified: Vec<LaneId>,
}

/// Compass bearing in degrees (0 = north, clockwise) of `to` seen from `from`.
pub fn bearing(from: &Point, to: &Point) -> f64 {
    let delta = to - from;
    (90.0 - delta.y.atan2(delta.x).to_degrees()).rem_euclid(360.0)
}

fn centroid(points: &[Point]) -> Option<Point> {
    if points.is_empty() {
        return None;
    }
    let sum = points
        .iter()
        .fold(Vector2::zeros(), |acc: Vector2<f64>, p| acc + p.coords);
    Some(Point::from(sum / points.len() as f64))
}

/// Centroid of the stop lines of all ingress vehicle lanes.
pub fn stop_line_center(intersection: &Intersection) -> Option<Point> {
    let stop_lines: Vec<Point> = intersection
        .lanes()
        .filter(|l| l.is_ingress_vehicle_lane())
        .filter_map(|l| l.stop_line())
        .map(|n| n.position())
        .collect();
    centroid(&stop_lines)
}

/// Assigns one [`Direction`] per approach from local node offsets alone.
#[derive(Debug, Default, Clone, Copy)]
pub struct GeometryClassifier;

impl GeometryClassifier {
    pub fn new() -> Self {
        Self
    }

    pub fn classify(&self, intersection: &mut Intersection) -> Result<Classification, GeometryError> {
        let (center, center_degraded) = match stop_line_center(intersection) {
            Some(center) => (center, false),
            None => {
                warn!("Intersection {} has no stop lines, using (0, 0) as center", intersection.id);
                (Point::origin(), true)
            }
        };
        intersection.set_center(center);

        let mut by_approach: BTreeMap<u32, Vec<&Lane>> = BTreeMap::new();
        let mut unclassified = Vec::new();
        for lane in intersection.lanes() {
            match lane.approach_id {
                Some(approach) => by_approach.entry(approach).or_default().push(lane),
                None => unclassified.push(lane.id),
            }
        }

        let missing_ingress: Vec<u32> = by_approach
            .iter()
            .filter(|(_, lanes)| !lanes.iter().any(|l| l.ingress))
            .map(|(approach, _)| *approach)
            .collect();
        if !missing_ingress.is_empty() {
            return Err(GeometryError::ApproachWithoutIngress(missing_ingress));
        }

        let mut approaches = Vec::new();
        for (approach_id, lanes) in &by_approach {
            let anchor = match approach_anchor(lanes) {
                Some(anchor) => anchor,
                None => {
                    warn!("Approach {} has no geometry, its lanes stay unclassified", approach_id);
                    unclassified.extend(lanes.iter().map(|l| l.id));
                    continue;
                }
            };
            let bearing = bearing(&center, &anchor);
            let direction = Direction::from_bearing(bearing);
            debug!("Approach {} at bearing {:.1} -> {}", approach_id, bearing, direction);
            approaches.push(ApproachDirection {
                approach_id: *approach_id,
                anchor: [anchor.x, anchor.y],
                bearing,
                direction,
                lanes: lanes.iter().map(|l| l.id).collect(),
            });
        }

        for approach in &approaches {
            for lane in &approach.lanes {
                if let Some(lane) = intersection.lane_mut(*lane) {
                    lane.direction = Some(approach.direction);
                }
            }
        }

        unclassified.sort();
        if !unclassified.is_empty() {
            warn!("Lanes {:?} have no direction", unclassified.iter().map(|l| l.0).collect::<Vec<_>>());
        }
        info!(
            "Classified {} approaches around ({:.1}, {:.1})",
            approaches.len(),
            center.x,
            center.y
        );

        Ok(Classification {
            center: [center.x, center.y],
            center_degraded,
            approaches,
            unclassified,
        })
    }
}

/// Mean position of the approach's ingress vehicle lanes, using each lane's stop line or else its
/// first node. Approaches with no vehicle ingress lane use all their ingress lanes.
fn approach_anchor(lanes: &[&Lane]) -> Option<Point> {
    let vehicle: Vec<&Lane> = lanes.iter().copied().filter(|l| l.is_ingress_vehicle_lane()).collect();
    let members: Vec<&Lane> = if vehicle.is_empty() {
        lanes.iter().copied().filter(|l| l.ingress).collect()
    } else {
        vehicle
    };
    let points: Vec<Point> = members
        .iter()
        .filter_map(|l| l.stop_line().or_else(|| l.first_node()))
        .map(|n| n.position())
        .collect();
    centroid(&points)
}

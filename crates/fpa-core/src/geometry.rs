use crate::constants::EPSILON;
use crate::point::Point3D;

/// Intersection of a line (or line segment) with a sphere.
///
/// The line is parameterized as P(t) = P1 + t·(P2 − P1); substituting into
/// the sphere equation yields a quadratic in t. Returns 0, 1 (tangent), or
/// 2 points. Result ordering is not contractually sorted; callers that need
/// determinism sort explicitly.
///
/// When `constrain_to_segment` is set, both roots are clamped into [0, 1]
/// *before* the points are computed. This deliberately forces each result
/// onto the segment even when the true intersection lies outside it: in the
/// path-walking use case the sphere center always lies on the path, and the
/// caller wants the far end of the segment rather than no point at all.
/// Clamping can park both roots on the same endpoint when the sphere barely
/// overlaps the segment, so clamped points farther than the radius (plus a
/// small tolerance) from the center are discarded.
pub fn line_sphere_intersect(
    line_p1: Point3D,
    line_p2: Point3D,
    sphere_center: Point3D,
    radius: f64,
    constrain_to_segment: bool,
) -> Vec<Point3D> {
    let dx = line_p2.x - line_p1.x;
    let dy = line_p2.y - line_p1.y;
    let dz = line_p2.z - line_p1.z;

    // Coefficients of a·t² + b·t + c = 0
    let a = dx * dx + dy * dy + dz * dz;

    let b = 2.0
        * (dx * (line_p1.x - sphere_center.x)
            + dy * (line_p1.y - sphere_center.y)
            + dz * (line_p1.z - sphere_center.z));

    let c = sphere_center.x * sphere_center.x
        + sphere_center.y * sphere_center.y
        + sphere_center.z * sphere_center.z
        + line_p1.x * line_p1.x
        + line_p1.y * line_p1.y
        + line_p1.z * line_p1.z
        - 2.0
            * (sphere_center.x * line_p1.x
                + sphere_center.y * line_p1.y
                + sphere_center.z * line_p1.z)
        - radius * radius;

    let discriminant = b * b - 4.0 * a * c;

    if discriminant < 0.0 {
        return Vec::new();
    }

    let point_at = |t: f64| Point3D::new(line_p1.x + t * dx, line_p1.y + t * dy, line_p1.z + t * dz);

    // Tangent line: single root
    if discriminant == 0.0 {
        let t = -b / (2.0 * a);
        if constrain_to_segment && !(0.0..=1.0).contains(&t) {
            return Vec::new();
        }
        return vec![point_at(t)];
    }

    let sqrt_discriminant = discriminant.sqrt();
    let t1 = (-b + sqrt_discriminant) / (2.0 * a);
    let t2 = (-b - sqrt_discriminant) / (2.0 * a);

    let mut results = Vec::with_capacity(2);
    for t in [t1, t2] {
        let t = if constrain_to_segment {
            t.clamp(0.0, 1.0)
        } else {
            t
        };
        let point = point_at(t);
        if constrain_to_segment && point.distance(sphere_center) > radius + EPSILON {
            continue;
        }
        results.push(point);
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sorted_by_x(mut pts: Vec<Point3D>) -> Vec<Point3D> {
        pts.sort_by(|a, b| a.x.total_cmp(&b.x));
        pts
    }

    #[test]
    fn test_unit_sphere_two_crossings() {
        let hits = line_sphere_intersect(
            Point3D::new(-2.0, 0.0, 0.0),
            Point3D::new(2.0, 0.0, 0.0),
            Point3D::new(0.0, 0.0, 0.0),
            1.0,
            false,
        );
        assert_eq!(hits.len(), 2);
        let hits = sorted_by_x(hits);
        assert!((hits[0].x - (-1.0)).abs() < 1e-12, "got {:?}", hits[0]);
        assert!((hits[1].x - 1.0).abs() < 1e-12, "got {:?}", hits[1]);
    }

    #[test]
    fn test_tangent_single_point() {
        // Line y=1 grazing the unit sphere at (0,1,0)
        let hits = line_sphere_intersect(
            Point3D::new(-2.0, 1.0, 0.0),
            Point3D::new(2.0, 1.0, 0.0),
            Point3D::new(0.0, 0.0, 0.0),
            1.0,
            false,
        );
        assert_eq!(hits.len(), 1);
        assert!(hits[0].x.abs() < 1e-12);
        assert!((hits[0].y - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_miss_returns_empty() {
        let hits = line_sphere_intersect(
            Point3D::new(-2.0, 5.0, 0.0),
            Point3D::new(2.0, 5.0, 0.0),
            Point3D::new(0.0, 0.0, 0.0),
            1.0,
            false,
        );
        assert!(hits.is_empty());
    }

    #[test]
    fn test_tangent_outside_segment_constrained() {
        // Tangent point at x=0 has t=2 on this short segment
        let hits = line_sphere_intersect(
            Point3D::new(-4.0, 1.0, 0.0),
            Point3D::new(-2.0, 1.0, 0.0),
            Point3D::new(0.0, 0.0, 0.0),
            1.0,
            true,
        );
        assert!(hits.is_empty());
    }

    #[test]
    fn test_segment_inside_sphere_clamps_to_endpoints() {
        // Segment x ∈ [-2, 2] fully inside radius-3 sphere: constrained
        // intersection returns the segment's own endpoints
        let hits = line_sphere_intersect(
            Point3D::new(-2.0, 0.0, 0.0),
            Point3D::new(2.0, 0.0, 0.0),
            Point3D::new(0.0, 0.0, 0.0),
            3.0,
            true,
        );
        assert_eq!(hits.len(), 2);
        let hits = sorted_by_x(hits);
        assert_eq!(hits[0], Point3D::new(-2.0, 0.0, 0.0));
        assert_eq!(hits[1], Point3D::new(2.0, 0.0, 0.0));
    }

    #[test]
    fn test_unconstrained_ignores_segment_bounds() {
        let hits = line_sphere_intersect(
            Point3D::new(-2.0, 0.0, 0.0),
            Point3D::new(2.0, 0.0, 0.0),
            Point3D::new(0.0, 0.0, 0.0),
            3.0,
            false,
        );
        assert_eq!(hits.len(), 2);
        let hits = sorted_by_x(hits);
        assert!((hits[0].x - (-3.0)).abs() < 1e-12);
        assert!((hits[1].x - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_sphere_past_segment_discards_clamped_points() {
        // Sphere of radius 1 at x=5 lies wholly beyond the segment end at
        // x=3.5: both roots clamp to the endpoint, which sits outside the
        // radius, so nothing is returned.
        let hits = line_sphere_intersect(
            Point3D::new(0.0, 0.0, 0.0),
            Point3D::new(3.5, 0.0, 0.0),
            Point3D::new(5.0, 0.0, 0.0),
            1.0,
            true,
        );
        assert!(hits.is_empty(), "clamped out-of-radius points: {hits:?}");
    }

    #[test]
    fn test_partial_overlap_keeps_in_radius_clamp() {
        // Sphere reaching past the segment end: the near crossing at x=4 is
        // exact, the far root clamps to the endpoint x=4.5 which is still
        // inside the radius and is kept.
        let center = Point3D::new(5.0, 0.0, 0.0);
        let hits = line_sphere_intersect(
            Point3D::new(0.0, 0.0, 0.0),
            Point3D::new(4.5, 0.0, 0.0),
            center,
            1.0,
            true,
        );
        assert_eq!(hits.len(), 2);
        for p in &hits {
            assert!(p.distance(center) <= 1.0 + EPSILON, "point off sphere: {p:?}");
        }
        let hits = sorted_by_x(hits);
        assert!((hits[0].x - 4.0).abs() < 1e-12);
        assert_eq!(hits[1], Point3D::new(4.5, 0.0, 0.0));
    }

    #[test]
    fn test_grazing_hop_keeps_boundary_point() {
        // Regression: radius one ulp under the segment length. The far root
        // computes to the far endpoint, whose distance to the center rounds
        // to one ulp over the radius. Exact filtering would discard it and
        // leave only the near endpoint — a zero-length hop for the walker.
        let p1 = Point3D::new(1.0, 2.0, 3.0);
        let p2 = Point3D::new(6.0, 7.0, 8.0);
        let radius = 8.660254037844386; // dist(p1, p2) = 8.660254037844387
        let hits = line_sphere_intersect(p1, p2, p1, radius, true);
        let closest = hits
            .iter()
            .map(|p| p.distance(p2))
            .fold(f64::INFINITY, f64::min);
        assert!(
            closest < 1e-9,
            "boundary crossing near the far endpoint must survive: {closest}"
        );
    }
}

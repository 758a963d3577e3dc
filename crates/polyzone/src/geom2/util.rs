use nalgebra::Vector2;

/// Shoelace signed area of a vertex ring; positive for CCW winding.
pub fn signed_area(verts: &[Vector2<f64>]) -> f64 {
    let n = verts.len();
    if n < 3 {
        return 0.0;
    }
    let mut a = 0.0;
    for i in 0..n {
        let p = verts[i];
        let q = verts[(i + 1) % n];
        a += p.x * q.y - q.x * p.y;
    }
    0.5 * a
}

/// Area centroid of a simple ring (either winding). `None` for rings with
/// fewer than three vertices or vanishing area.
pub fn area_centroid(verts: &[Vector2<f64>]) -> Option<Vector2<f64>> {
    if verts.len() < 3 {
        return None;
    }
    let mut a: f64 = 0.0;
    let mut cx: f64 = 0.0;
    let mut cy: f64 = 0.0;
    for i in 0..verts.len() {
        let p = verts[i];
        let q = verts[(i + 1) % verts.len()];
        let cross = p.x * q.y - q.x * p.y;
        a += cross;
        cx += (p.x + q.x) * cross;
        cy += (p.y + q.y) * cross;
    }
    a *= 0.5;
    if a.abs() < 1e-18 {
        return None;
    }
    Some(Vector2::new(cx / (6.0 * a), cy / (6.0 * a)))
}

/// Crossing-number classification of `p` against an explicit ring.
///
/// An edge counts when `p.y ∈ [min(y0, y1), max(y0, y1))` and its x-intercept
/// at `p.y` is `<= p.x`. Odd parity means inside. The half-open interval makes
/// rays through vertices count exactly once, so rings sharing an edge
/// partition the plane.
pub fn crossing_parity(
    edges: impl IntoIterator<Item = (Vector2<f64>, Vector2<f64>)>,
    p: Vector2<f64>,
) -> bool {
    let mut odd = false;
    for (v0, v1) in edges {
        let (x0, y0, x1, y1) = (v0.x, v0.y, v1.x, v1.y);
        if (y0 <= p.y && p.y < y1) || (y1 <= p.y && p.y < y0) {
            let t = (p.y - y0) / (y1 - y0);
            let xt = x0 + t * (x1 - x0);
            if xt <= p.x {
                odd = !odd;
            }
        }
    }
    odd
}

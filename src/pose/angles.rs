use super::Landmark;

/// Angle in degrees at `vertex` between the rays towards `a` and `b`,
/// from the normalized dot product. `None` for a degenerate ray.
pub fn joint_angle(vertex: Landmark, a: Landmark, b: Landmark) -> Option<f64> {
    let (ax, ay) = (a.x - vertex.x, a.y - vertex.y);
    let (bx, by) = (b.x - vertex.x, b.y - vertex.y);
    let len_a = ax.hypot(ay);
    let len_b = bx.hypot(by);
    if len_a == 0.0 || len_b == 0.0 {
        return None;
    }
    let cos = ((ax * bx + ay * by) / (len_a * len_b)).clamp(-1.0, 1.0);
    Some(cos.acos().to_degrees())
}

use glam::Vec3;
use murmur_data::TraversalDirection;

/// Closest waypoint within `range` of `position`, or `None` when every
/// waypoint is farther away.
#[must_use]
pub fn closest_in_range(position: Vec3, waypoints: &[Vec3], range: f32) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (i, wp) in waypoints.iter().enumerate() {
        let d = position.distance(*wp);
        if d <= range && best.map_or(true, |(_, bd)| d < bd) {
            best = Some((i, d));
        }
    }
    best.map(|(i, _)| i)
}

/// Ping-pong step along a waypoint list: walking off either end flips the
/// direction and steps back inside. Never leaves `0..len`.
#[must_use]
pub fn next_index(
    current: usize,
    len: usize,
    direction: TraversalDirection,
) -> (usize, TraversalDirection) {
    if len <= 1 {
        return (0, direction);
    }
    let current = current.min(len - 1) as isize;
    let next = current + direction.sign();
    if next < 0 || next >= len as isize {
        let flipped = direction.reversed();
        ((current + flipped.sign()) as usize, flipped)
    } else {
        (next as usize, direction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closest_in_range() {
        let wps = [Vec3::new(10.0, 0.0, 0.0), Vec3::new(3.0, 0.0, 0.0), Vec3::new(-4.0, 0.0, 0.0)];
        assert_eq!(closest_in_range(Vec3::ZERO, &wps, 20.0), Some(1));
        assert_eq!(closest_in_range(Vec3::ZERO, &wps, 2.0), None);
        assert_eq!(closest_in_range(Vec3::ZERO, &[], 100.0), None);
    }

    #[test]
    fn test_ping_pong_never_leaves_range() {
        let mut idx = 0;
        let mut dir = TraversalDirection::Forward;
        let mut visited = Vec::new();
        for _ in 0..8 {
            let (n, d) = next_index(idx, 3, dir);
            idx = n;
            dir = d;
            visited.push(idx);
        }
        assert_eq!(visited, vec![1, 2, 1, 0, 1, 2, 1, 0]);
    }

    #[test]
    fn test_single_waypoint_stays_put() {
        assert_eq!(
            next_index(0, 1, TraversalDirection::Forward),
            (0, TraversalDirection::Forward)
        );
    }
}

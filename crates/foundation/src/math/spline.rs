use super::LatLng;

/// Default number of samples per span between two control points.
pub const DEFAULT_SEGMENTS_PER_SPAN: usize = 15;

/// Lazily samples a uniform Catmull-Rom spline through `points`.
///
/// Endpoints are clamped: the virtual control point before the first point is
/// the first point itself, and likewise after the last. Every control point is
/// emitted exactly, including the first and last.
///
/// With fewer than three points no curvature is possible and the input is
/// yielded unchanged.
pub fn catmull_rom_sample(points: &[LatLng], segments_per_span: usize) -> CatmullRomSamples<'_> {
    CatmullRomSamples {
        points,
        segments: segments_per_span.max(1),
        span: 0,
        step: 0,
    }
}

#[derive(Debug, Clone)]
pub struct CatmullRomSamples<'a> {
    points: &'a [LatLng],
    segments: usize,
    span: usize,
    step: usize,
}

impl CatmullRomSamples<'_> {
    fn remaining(&self) -> usize {
        let n = self.points.len();
        if n < 3 {
            return n.saturating_sub(self.span);
        }
        if self.span + 1 >= n {
            return n - self.span;
        }
        let spans_left = n - 1 - self.span;
        spans_left * self.segments - self.step + 1
    }

    fn interpolate(&self, span: usize, t: f64) -> LatLng {
        let last = self.points.len() - 1;
        let p0 = self.points[span.saturating_sub(1)];
        let p1 = self.points[span];
        let p2 = self.points[(span + 1).min(last)];
        let p3 = self.points[(span + 2).min(last)];

        LatLng::new(
            catmull_rom(p0.lat_deg, p1.lat_deg, p2.lat_deg, p3.lat_deg, t),
            catmull_rom(p0.lng_deg, p1.lng_deg, p2.lng_deg, p3.lng_deg, t),
        )
    }
}

impl Iterator for CatmullRomSamples<'_> {
    type Item = LatLng;

    fn next(&mut self) -> Option<Self::Item> {
        let n = self.points.len();
        if n < 3 {
            let p = self.points.get(self.span).copied();
            self.span += 1;
            return p;
        }

        if self.span + 1 < n {
            let p = if self.step == 0 {
                self.points[self.span]
            } else {
                self.interpolate(self.span, self.step as f64 / self.segments as f64)
            };
            self.step += 1;
            if self.step == self.segments {
                self.step = 0;
                self.span += 1;
            }
            return Some(p);
        }

        if self.span + 1 == n {
            self.span += 1;
            return Some(self.points[n - 1]);
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.remaining();
        (n, Some(n))
    }
}

impl ExactSizeIterator for CatmullRomSamples<'_> {}

fn catmull_rom(p0: f64, p1: f64, p2: f64, p3: f64, t: f64) -> f64 {
    let t2 = t * t;
    let t3 = t2 * t;
    0.5 * ((2.0 * p1)
        + (-p0 + p2) * t
        + (2.0 * p0 - 5.0 * p1 + 4.0 * p2 - p3) * t2
        + (-p0 + 3.0 * p1 - 3.0 * p2 + p3) * t3)
}

#[cfg(test)]
mod tests {
    use super::{DEFAULT_SEGMENTS_PER_SPAN, catmull_rom_sample};
    use crate::math::LatLng;

    fn pts() -> Vec<LatLng> {
        vec![
            LatLng::new(47.0, 8.0),
            LatLng::new(47.001, 8.002),
            LatLng::new(47.003, 8.001),
            LatLng::new(47.004, 8.004),
        ]
    }

    #[test]
    fn endpoints_are_exact() {
        let input = pts();
        for n in 2..=input.len() {
            let out: Vec<_> = catmull_rom_sample(&input[..n], DEFAULT_SEGMENTS_PER_SPAN).collect();
            assert_eq!(out.first(), input.first());
            assert_eq!(out.last(), Some(&input[n - 1]));
        }
    }

    #[test]
    fn sample_count_and_control_points() {
        let input = pts();
        let out: Vec<_> = catmull_rom_sample(&input, 15).collect();
        assert_eq!(out.len(), 3 * 15 + 1);
        assert_eq!(out[15], input[1]);
        assert_eq!(out[30], input[2]);
    }

    #[test]
    fn two_points_pass_through() {
        let input = &pts()[..2];
        let out: Vec<_> = catmull_rom_sample(input, 15).collect();
        assert_eq!(out, input.to_vec());
    }

    #[test]
    fn short_inputs_unchanged() {
        assert_eq!(catmull_rom_sample(&[], 15).count(), 0);
        let one = [LatLng::new(1.0, 2.0)];
        let out: Vec<_> = catmull_rom_sample(&one, 15).collect();
        assert_eq!(out, one.to_vec());
    }

    #[test]
    fn size_hint_is_exact() {
        let input = pts();
        let mut it = catmull_rom_sample(&input, 4);
        assert_eq!(it.len(), 13);
        it.next();
        it.next();
        assert_eq!(it.len(), 11);
        assert_eq!(it.count(), 11);
    }
}

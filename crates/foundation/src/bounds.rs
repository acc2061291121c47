use crate::math::LatLng;

/// Geographic bounding box in degrees. Does not handle antimeridian crossing.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct GeoBounds {
    pub south_west: LatLng,
    pub north_east: LatLng,
}

impl GeoBounds {
    pub fn new(south_west: LatLng, north_east: LatLng) -> Self {
        GeoBounds {
            south_west,
            north_east,
        }
    }

    /// Smallest box containing every point, or `None` for an empty input.
    pub fn from_points(points: impl IntoIterator<Item = LatLng>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut bounds = GeoBounds::new(first, first);
        for p in iter {
            bounds.extend(p);
        }
        Some(bounds)
    }

    pub fn extend(&mut self, p: LatLng) {
        self.south_west.lat_deg = self.south_west.lat_deg.min(p.lat_deg);
        self.south_west.lng_deg = self.south_west.lng_deg.min(p.lng_deg);
        self.north_east.lat_deg = self.north_east.lat_deg.max(p.lat_deg);
        self.north_east.lng_deg = self.north_east.lng_deg.max(p.lng_deg);
    }

    pub fn contains(&self, p: LatLng) -> bool {
        (self.south_west.lat_deg..=self.north_east.lat_deg).contains(&p.lat_deg)
            && (self.south_west.lng_deg..=self.north_east.lng_deg).contains(&p.lng_deg)
    }

    pub fn center(&self) -> LatLng {
        LatLng::new(
            (self.south_west.lat_deg + self.north_east.lat_deg) / 2.0,
            (self.south_west.lng_deg + self.north_east.lng_deg) / 2.0,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::GeoBounds;
    use crate::math::LatLng;

    #[test]
    fn empty_input_has_no_bounds() {
        assert!(GeoBounds::from_points(Vec::new()).is_none());
    }

    #[test]
    fn bounds_cover_all_points() {
        let points = vec![
            LatLng::new(1.0, 5.0),
            LatLng::new(-2.0, 7.0),
            LatLng::new(0.5, 4.0),
        ];
        let b = GeoBounds::from_points(points.clone()).expect("bounds");
        assert_eq!(b.south_west, LatLng::new(-2.0, 4.0));
        assert_eq!(b.north_east, LatLng::new(1.0, 7.0));
        assert!(points.iter().all(|p| b.contains(*p)));
        assert_eq!(b.center(), LatLng::new(-0.5, 5.5));
    }
}

use crate::domain::{EclError, ScheduleResult};
use serde::Serialize;
use std::f64::consts::PI;

/// How WELSEGS gives lengths and depths of the body segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SegmentInfo {
    /// Relative to the outlet segment.
    Inc,
    /// Absolute values at the end of the segment.
    Abs,
}

impl SegmentInfo {
    pub fn parse(text: &str) -> ScheduleResult<Self> {
        match text {
            "INC" => Ok(Self::Inc),
            "ABS" => Ok(Self::Abs),
            other => Err(EclError::invalid_input(
                "SCHEDULE.INVALID_SEGMENT_INFO",
                format!("'{other}' is not a WELSEGS length and depth type"),
            )),
        }
    }
}

/// One well segment. Lengths and depths are absolute and in SI units.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Segment {
    pub number: i32,
    pub branch: i32,
    /// 0 for the top segment.
    pub outlet: i32,
    /// Tubing length from the well head to the end of the segment.
    pub total_length: f64,
    pub depth: f64,
    pub diameter: Option<f64>,
    pub roughness: Option<f64>,
    pub area: Option<f64>,
    pub volume: f64,
}

/// One row of the WELSEGS body, segments `first..=last` on one branch.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentRange {
    pub first: i32,
    pub last: i32,
    pub branch: i32,
    pub outlet: i32,
    pub length: f64,
    pub depth: f64,
    pub diameter: Option<f64>,
    pub roughness: Option<f64>,
    pub area: Option<f64>,
    pub volume: Option<f64>,
}

/// Segment structure of a multisegment well as given by one WELSEGS keyword.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentSet {
    well: String,
    info: SegmentInfo,
    pressure_components: String,
    flow_model: String,
    segments: Vec<Segment>,
}

impl SegmentSet {
    pub fn new(
        well: &str,
        info: SegmentInfo,
        pressure_components: &str,
        flow_model: &str,
        top: Segment,
    ) -> Self {
        Self {
            well: well.to_string(),
            info,
            pressure_components: pressure_components.to_string(),
            flow_model: flow_model.to_string(),
            segments: vec![top],
        }
    }

    /// Adds the segments of `range`. The outlet must already be defined.
    ///
    /// With [`SegmentInfo::Inc`] every segment of the range adds `length` and
    /// `depth` to its outlet. With [`SegmentInfo::Abs`] the last segment ends
    /// at the given values and the others are spaced evenly from the outlet.
    pub fn add_range(&mut self, range: &SegmentRange) -> ScheduleResult<()> {
        if range.first < 2 || range.last < range.first {
            return Err(EclError::invalid_input(
                "SCHEDULE.INVALID_SEGMENT",
                format!(
                    "segments {}..{} of well {} are not a valid range",
                    range.first, range.last, self.well
                ),
            ));
        }
        let Some(outlet) = self.get(range.outlet).cloned() else {
            return Err(EclError::invalid_input(
                "SCHEDULE.INVALID_SEGMENT",
                format!(
                    "outlet segment {} of segment {} in well {} is not defined",
                    range.outlet, range.first, self.well
                ),
            ));
        };

        let area = range
            .area
            .or_else(|| range.diameter.map(|diameter| PI * diameter * diameter / 4.0));
        let count = f64::from(range.last - range.first + 1);
        let start = (outlet.total_length, outlet.depth);
        let mut previous = outlet;
        for (offset, number) in (range.first..=range.last).enumerate() {
            let (total_length, depth) = match self.info {
                SegmentInfo::Inc => (previous.total_length + range.length, previous.depth + range.depth),
                SegmentInfo::Abs => {
                    let fraction = (offset + 1) as f64 / count;
                    (
                        start.0 + (range.length - start.0) * fraction,
                        start.1 + (range.depth - start.1) * fraction,
                    )
                }
            };
            let volume = range
                .volume
                .or_else(|| area.map(|area| area * (total_length - previous.total_length).abs()))
                .unwrap_or(0.0);
            let segment = Segment {
                number,
                branch: range.branch,
                outlet: previous.number,
                total_length,
                depth,
                diameter: range.diameter,
                roughness: range.roughness,
                area,
                volume,
            };
            self.insert(segment.clone());
            previous = segment;
        }
        Ok(())
    }

    fn insert(&mut self, segment: Segment) {
        match self
            .segments
            .iter_mut()
            .find(|existing| existing.number == segment.number)
        {
            Some(existing) => *existing = segment,
            None => self.segments.push(segment),
        }
    }

    pub fn well(&self) -> &str {
        &self.well
    }

    pub fn info(&self) -> SegmentInfo {
        self.info
    }

    pub fn pressure_components(&self) -> &str {
        &self.pressure_components
    }

    pub fn flow_model(&self) -> &str {
        &self.flow_model
    }

    pub fn top(&self) -> &Segment {
        &self.segments[0]
    }

    pub fn get(&self, number: i32) -> Option<&Segment> {
        self.segments.iter().find(|segment| segment.number == number)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Segment> {
        self.segments.iter()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Segment on `branch` whose tubing interval holds `distance`, bounds
    /// included. The top segment has no interval.
    pub fn segment_at_distance(&self, branch: i32, distance: f64) -> Option<&Segment> {
        self.segments
            .iter()
            .filter(|segment| segment.branch == branch && segment.outlet > 0)
            .find(|segment| {
                let outlet_length = self
                    .get(segment.outlet)
                    .map_or(0.0, |outlet| outlet.total_length);
                (distance - segment.total_length) * (distance - outlet_length) <= 0.0
            })
    }
}

#[cfg(test)]
mod tests {
    use super::{Segment, SegmentInfo, SegmentRange, SegmentSet};

    fn top(depth: f64, length: f64) -> Segment {
        Segment {
            number: 1,
            branch: 1,
            outlet: 0,
            total_length: length,
            depth,
            diameter: None,
            roughness: None,
            area: None,
            volume: 1.0e-5,
        }
    }

    fn range(first: i32, last: i32, outlet: i32, length: f64, depth: f64) -> SegmentRange {
        SegmentRange {
            first,
            last,
            branch: 1,
            outlet,
            length,
            depth,
            diameter: Some(0.2),
            roughness: Some(1.0e-4),
            area: None,
            volume: None,
        }
    }

    #[test]
    fn incremental_ranges_stack_on_the_outlet() {
        let mut set = SegmentSet::new("P1", SegmentInfo::Inc, "HFA", "HO", top(2000.0, 10.0));
        set.add_range(&range(2, 4, 1, 50.0, 5.0)).expect("outlet 1 exists");

        let last = set.get(4).expect("segment 4 is defined");
        assert_eq!(set.len(), 4);
        assert_eq!(last.outlet, 3);
        assert!((last.total_length - 160.0).abs() < 1e-9);
        assert!((last.depth - 2015.0).abs() < 1e-9);
    }

    #[test]
    fn absolute_ranges_are_spaced_evenly() {
        let mut set = SegmentSet::new("P1", SegmentInfo::Abs, "HFA", "HO", top(2000.0, 0.0));
        set.add_range(&range(2, 5, 1, 400.0, 2100.0)).expect("outlet 1 exists");

        let second = set.get(2).expect("segment 2 is defined");
        assert!((second.total_length - 100.0).abs() < 1e-9);
        assert!((second.depth - 2025.0).abs() < 1e-9);
        let area = second.area.expect("area follows from the diameter");
        assert!((second.volume - area * 100.0).abs() < 1e-9);
        assert_eq!(set.get(5).map(|segment| segment.total_length), Some(400.0));
    }

    #[test]
    fn missing_outlet_is_rejected() {
        let mut set = SegmentSet::new("P1", SegmentInfo::Inc, "HFA", "HO", top(2000.0, 0.0));
        let error = set
            .add_range(&range(3, 3, 2, 10.0, 1.0))
            .expect_err("segment 2 is not defined");
        assert_eq!(error.placeholder(), "SCHEDULE.INVALID_SEGMENT");
    }

    #[test]
    fn distance_lookup_includes_interval_bounds() {
        let mut set = SegmentSet::new("P1", SegmentInfo::Abs, "HFA", "HO", top(2512.5, 2512.5));
        set.add_range(&range(2, 2, 1, 2537.5, 2537.5)).expect("outlet 1 exists");
        set.add_range(&range(3, 3, 2, 2562.5, 2562.5)).expect("outlet 2 exists");

        assert_eq!(set.segment_at_distance(1, 2518.75).map(|s| s.number), Some(2));
        assert_eq!(set.segment_at_distance(1, 2537.5).map(|s| s.number), Some(2));
        assert_eq!(set.segment_at_distance(1, 2550.0).map(|s| s.number), Some(3));
        assert!(set.segment_at_distance(2, 2550.0).is_none());
        assert!(set.segment_at_distance(1, 9000.0).is_none());
    }
}

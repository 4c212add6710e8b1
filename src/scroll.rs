use derive_more::{Constructor, Display};
use serde::Deserialize;

use crate::timeline::{Timeline, TimelineMonth};

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    #[display(fmt = "day")]
    Day,
    #[display(fmt = "week")]
    Week,
    #[display(fmt = "month")]
    Month,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TrackMetrics {
    pub day_width: u32,
    pub week_width: u32,
    pub month_width: u32,
    pub padding: u32,
}

impl Default for TrackMetrics {
    fn default() -> Self {
        TrackMetrics {
            day_width: 68,
            week_width: 110,
            month_width: 90,
            padding: 48,
        }
    }
}

impl TrackMetrics {
    pub fn item_width(&self, granularity: Granularity) -> i64 {
        let width = match granularity {
            Granularity::Day => self.day_width,
            Granularity::Week => self.week_width,
            Granularity::Month => self.month_width,
        };
        i64::from(width.max(1))
    }

    pub fn item_count(&self, granularity: Granularity, timeline: &Timeline) -> usize {
        match granularity {
            Granularity::Day => timeline.days().len(),
            Granularity::Week => timeline.weeks().len(),
            Granularity::Month => timeline.months().len(),
        }
    }

    pub fn track_width(&self, granularity: Granularity, timeline: &Timeline) -> i64 {
        self.item_count(granularity, timeline) as i64 * self.item_width(granularity)
            + i64::from(self.padding)
    }

    pub fn initial_offset(&self, today_index: usize, container_width: u32) -> i64 {
        ((today_index as i64 + 1) * self.item_width(Granularity::Day)
            - i64::from(container_width))
        .max(0)
    }
}

fn clamp_index(anchor: i64, width: i64, len: usize) -> usize {
    ((anchor / width).max(0) as usize).min(len - 1)
}

/// Month under the viewport anchor for a horizontal scroll offset.
///
/// Offsets before the track start clamp to the first month and offsets
/// past its end clamp to the last one.
pub fn active_month<'t>(
    offset: i64,
    granularity: Granularity,
    metrics: &TrackMetrics,
    timeline: &'t Timeline,
) -> Option<&'t TimelineMonth> {
    let months = timeline.months();
    if months.is_empty() {
        return None;
    }

    let anchor = offset.max(0).saturating_add(i64::from(metrics.padding));
    let width = metrics.item_width(granularity);

    match granularity {
        Granularity::Day => {
            let idx = months.partition_point(|m| {
                m.end_index() as i64 * width + i64::from(metrics.padding) <= anchor
            });
            months.get(idx.min(months.len() - 1))
        }
        Granularity::Week => {
            let weeks = timeline.weeks();
            let week = &weeks[clamp_index(anchor, width, weeks.len())];
            timeline.month_of_day(week.start_index)
        }
        Granularity::Month => months.get(clamp_index(anchor, width, months.len())),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Constructor)]
pub struct Marker {
    pub left: i64,
    pub text: String,
}

pub fn markers(granularity: Granularity, metrics: &TrackMetrics, timeline: &Timeline) -> Vec<Marker> {
    let padding = i64::from(metrics.padding);
    let width = metrics.item_width(granularity);

    timeline
        .months()
        .iter()
        .filter_map(|m| match granularity {
            Granularity::Day => Some(Marker::new(
                padding + m.start_index as i64 * width,
                m.label.clone(),
            )),
            Granularity::Week => Some(Marker::new(
                padding + m.week_start_index as i64 * width,
                m.label.clone(),
            )),
            Granularity::Month if m.key.month == 1 => Some(Marker::new(
                padding + m.ordinal as i64 * width,
                m.year.to_string(),
            )),
            Granularity::Month => None,
        })
        .collect()
}

#[derive(Debug, Clone)]
pub struct TimelineView {
    granularity: Granularity,
    offset: i64,
    container_width: u32,
    month_label: String,
    year: i32,
}

impl TimelineView {
    pub fn new(timeline: &Timeline, container_width: u32) -> Self {
        let (month_label, year) = timeline
            .months()
            .first()
            .map(|m| (m.label.clone(), m.year))
            .unwrap_or_default();

        TimelineView {
            granularity: Granularity::Day,
            offset: 0,
            container_width,
            month_label,
            year,
        }
    }

    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    pub fn offset(&self) -> i64 {
        self.offset
    }

    pub fn container_width(&self) -> u32 {
        self.container_width
    }

    pub fn sticky_label(&self) -> String {
        match self.granularity {
            Granularity::Month => self.year.to_string(),
            _ => self.month_label.clone(),
        }
    }

    pub fn max_offset(&self, metrics: &TrackMetrics, timeline: &Timeline) -> i64 {
        (metrics.track_width(self.granularity, timeline) - i64::from(self.container_width)).max(0)
    }

    pub fn mount(&mut self, metrics: &TrackMetrics, timeline: &Timeline) {
        let target = metrics.initial_offset(timeline.today_index(), self.container_width);
        self.scroll_to(target, metrics, timeline);
    }

    pub fn scroll_to(&mut self, offset: i64, metrics: &TrackMetrics, timeline: &Timeline) {
        self.offset = offset.min(self.max_offset(metrics, timeline)).max(0);

        if let Some(month) = active_month(self.offset, self.granularity, metrics, timeline) {
            self.month_label = month.label.clone();
            self.year = month.year;
        }
    }

    pub fn set_granularity(
        &mut self,
        granularity: Granularity,
        metrics: &TrackMetrics,
        timeline: &Timeline,
    ) {
        if self.granularity != granularity {
            log::debug!("timeline view {} -> {}", self.granularity, granularity);
            self.granularity = granularity;
            self.mount(metrics, timeline);
        }
    }

    pub fn first_visible(&self, metrics: &TrackMetrics) -> usize {
        (self.offset / metrics.item_width(self.granularity)).max(0) as usize
    }
}

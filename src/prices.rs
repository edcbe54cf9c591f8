use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// Random walk parameters
const BASE_PRICE: f64 = 100.0;
const BASE_SPREAD: f64 = 50.0;
const STEP_RANGE: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Timeframe {
    #[serde(rename = "1H")]
    Hour,
    #[default]
    #[serde(rename = "1D")]
    Day,
    #[serde(rename = "1W")]
    Week,
    #[serde(rename = "1M")]
    Month,
    #[serde(rename = "1Y")]
    Year,
}

impl Timeframe {
    pub const ALL: [Timeframe; 5] = [
        Timeframe::Hour,
        Timeframe::Day,
        Timeframe::Week,
        Timeframe::Month,
        Timeframe::Year,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Timeframe::Hour => "1H",
            Timeframe::Day => "1D",
            Timeframe::Week => "1W",
            Timeframe::Month => "1M",
            Timeframe::Year => "1Y",
        }
    }

    /// Span covered by the window, in steps
    pub fn points(&self) -> i64 {
        match self {
            Timeframe::Hour => 60,
            Timeframe::Day => 24,
            Timeframe::Week => 7,
            Timeframe::Month => 30,
            Timeframe::Year => 12,
        }
    }

    pub fn step(&self) -> Duration {
        match self {
            Timeframe::Hour => Duration::minutes(1),
            Timeframe::Day => Duration::hours(1),
            Timeframe::Week | Timeframe::Month => Duration::days(1),
            Timeframe::Year => Duration::days(30),
        }
    }

    /// Only every n-th step is sampled
    pub fn skip(&self) -> i64 {
        match self {
            Timeframe::Month => 3,
            _ => 1,
        }
    }

    fn axis_format(&self) -> &'static str {
        match self {
            Timeframe::Hour | Timeframe::Day => "%H:%M",
            Timeframe::Week => "%a",
            Timeframe::Month => "%d %b",
            Timeframe::Year => "%b",
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Timeframe {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Timeframe::ALL
            .into_iter()
            .find(|tf| tf.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Unknown timeframe: {}", s))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub time: DateTime<Utc>,
    pub price: i64,
}

/// Simulated series ending at `now`, oldest point first
pub fn sample_series<R: Rng + ?Sized>(
    timeframe: Timeframe,
    now: DateTime<Utc>,
    rng: &mut R,
) -> Vec<PricePoint> {
    let mut value = BASE_PRICE + rng.gen::<f64>() * BASE_SPREAD;
    let step = timeframe.step();
    let mut series = Vec::new();

    let mut i = timeframe.points() - 1;
    while i >= 0 {
        value += (rng.gen::<f64>() - 0.5) * STEP_RANGE;
        series.push(PricePoint {
            time: now - step * i as i32,
            price: value.round() as i64,
        });
        i -= timeframe.skip();
    }

    series
}

pub fn format_axis_label(time: &DateTime<Utc>, timeframe: Timeframe) -> String {
    time.format(timeframe.axis_format()).to_string()
}

/// Chart state for one token pair
#[derive(Debug, Clone)]
pub struct PriceChart {
    from_token: String,
    to_token: String,
    timeframe: Timeframe,
    series: Vec<PricePoint>,
}

impl PriceChart {
    pub fn new<R: Rng + ?Sized>(from_token: &str, to_token: &str, rng: &mut R) -> Self {
        let timeframe = Timeframe::default();
        Self {
            from_token: from_token.to_string(),
            to_token: to_token.to_string(),
            timeframe,
            series: sample_series(timeframe, Utc::now(), rng),
        }
    }

    pub fn pair_label(&self) -> String {
        format!("{}/{}", self.from_token, self.to_token)
    }

    pub fn timeframe(&self) -> Timeframe {
        self.timeframe
    }

    pub fn series(&self) -> &[PricePoint] {
        &self.series
    }

    pub fn set_timeframe<R: Rng + ?Sized>(&mut self, timeframe: Timeframe, rng: &mut R) {
        self.timeframe = timeframe;
        self.regenerate(rng);
    }

    /// Regenerates only when the pair actually changed
    pub fn set_pair<R: Rng + ?Sized>(&mut self, from_token: &str, to_token: &str, rng: &mut R) {
        if self.from_token == from_token && self.to_token == to_token {
            return;
        }
        self.from_token = from_token.to_string();
        self.to_token = to_token.to_string();
        self.regenerate(rng);
    }

    pub fn latest_price(&self) -> Option<i64> {
        self.series.last().map(|p| p.price)
    }

    /// Percentage change between the first and last sample
    pub fn change_percentage(&self) -> Option<f64> {
        let first = self.series.first()?.price;
        let last = self.series.last()?.price;
        if first == 0 {
            return None;
        }
        Some((last - first) as f64 / first as f64 * 100.0)
    }

    pub fn axis_labels(&self) -> Vec<String> {
        self.series
            .iter()
            .map(|p| format_axis_label(&p.time, self.timeframe))
            .collect()
    }

    fn regenerate<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.series = sample_series(self.timeframe, Utc::now(), rng);
        log::debug!(
            "Regenerated {} chart for {} ({} points)",
            self.timeframe,
            self.pair_label(),
            self.series.len()
        );
    }
}

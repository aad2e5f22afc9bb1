//! Batch report: descriptive statistics, correlations, a two-sample t-test
//! and word frequencies, written as Markdown.

use crate::loader::TableSet;
use crate::records::{Cell, Flight, Records, RowView, WeatherSample};
use crate::types::{flight_columns, weather_columns, Result, SkyTable, Table};

use chrono::{DateTime, Utc};
use polars::prelude::*;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;

/// Candidate text columns of the alert table, in order of preference.
pub const ALERT_TEXT_COLUMNS: &[&str] = &["descricao", "descricao_alerta", "tipo_alerta", "mensagem"];

/// Number of words kept in the frequency table.
pub const TOP_WORDS: usize = 20;

const FLIGHT_NUMERIC: &[&str] = &[flight_columns::ALTITUDE, flight_columns::SPEED];
const WEATHER_NUMERIC: &[&str] = &[
    weather_columns::TEMPERATURE,
    weather_columns::HUMIDITY,
    weather_columns::WIND_SPEED,
];

/// Descriptive statistics of one numeric column.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSummary {
    pub table: SkyTable,
    pub column: String,
    pub count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

/// Pearson correlation of two columns over rows where both are present.
#[derive(Debug, Clone, PartialEq)]
pub struct Correlation {
    pub left: &'static str,
    pub right: &'static str,
    pub pairs: usize,
    pub r: Option<f64>,
}

/// Welch two-sample t-test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TTest {
    pub t: f64,
    pub df: f64,
    pub p_value: f64,
}

/// Speed comparison between on-route and delayed flights.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeedComparison {
    pub on_route: usize,
    pub delayed: usize,
    pub test: Option<TTest>,
}

/// The full report.
#[derive(Debug, Clone)]
pub struct Report {
    pub generated_at: DateTime<Utc>,
    pub row_counts: Vec<(SkyTable, usize)>,
    pub summaries: Vec<ColumnSummary>,
    pub correlations: Vec<Correlation>,
    pub speed: SpeedComparison,
    pub text_column: Option<&'static str>,
    pub words: Vec<(String, usize)>,
}

impl Report {
    pub fn compute(tables: &TableSet) -> Result<Self> {
        let flights_table = tables.get(SkyTable::Flights);
        let weather_table = tables.get(SkyTable::Weather);

        let mut summaries = describe(SkyTable::Flights, &flights_table, FLIGHT_NUMERIC)?;
        summaries.extend(describe(SkyTable::Weather, &weather_table, WEATHER_NUMERIC)?);

        let flights: Records<Flight> = Records::from_table(&flights_table);
        let weather: Records<WeatherSample> = Records::from_table(&weather_table);

        let correlations = vec![
            correlate(
                flight_columns::ALTITUDE,
                flight_columns::SPEED,
                flights.iter().map(|f| (&f.current_altitude, &f.current_speed)),
            ),
            correlate(
                weather_columns::TEMPERATURE,
                weather_columns::HUMIDITY,
                weather.iter().map(|w| (&w.temperature_c, &w.humidity_pct)),
            ),
            correlate(
                weather_columns::TEMPERATURE,
                weather_columns::WIND_SPEED,
                weather.iter().map(|w| (&w.temperature_c, &w.wind_speed)),
            ),
            correlate(
                weather_columns::HUMIDITY,
                weather_columns::WIND_SPEED,
                weather.iter().map(|w| (&w.humidity_pct, &w.wind_speed)),
            ),
        ];

        let alerts = tables.get(SkyTable::Alerts);
        let text_column = ALERT_TEXT_COLUMNS.iter().copied().find(|c| alerts.has_column(c));
        let words = match text_column {
            Some(column) => word_frequencies(alert_texts(&alerts, column), TOP_WORDS),
            None => Vec::new(),
        };

        Ok(Self {
            generated_at: Utc::now(),
            row_counts: tables.iter().map(|(t, data)| (t, data.len())).collect(),
            summaries,
            correlations,
            speed: compare_speeds(&flights),
            text_column,
            words,
        })
    }

    pub fn to_markdown(&self) -> String {
        self.to_string()
    }

    pub fn write(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, self.to_markdown())?;
        Ok(())
    }
}

/// Count, mean, std, min and max of `columns` (those present) via Polars.
pub fn describe(table_name: SkyTable, table: &Table, columns: &[&str]) -> Result<Vec<ColumnSummary>> {
    let present: Vec<&str> = columns.iter().copied().filter(|c| table.has_column(c)).collect();
    if present.is_empty() {
        return Ok(Vec::new());
    }

    let exprs: Vec<Expr> = present
        .iter()
        .flat_map(|c| {
            let value = col(*c).cast(DataType::Float64);
            [
                value.clone().count().alias(format!("{c}:count")),
                value.clone().mean().alias(format!("{c}:mean")),
                value.clone().std(1).alias(format!("{c}:std")),
                value.clone().min().alias(format!("{c}:min")),
                value.max().alias(format!("{c}:max")),
            ]
        })
        .collect();

    let stats = table.dataframe().clone().lazy().select(exprs).collect()?;
    let stat = |column: &str, name: &str| -> Result<Option<f64>> {
        let value = stats.column(&format!("{column}:{name}"))?.get(0)?;
        Ok(value.extract::<f64>().filter(|v| v.is_finite()))
    };

    present
        .into_iter()
        .map(|c| {
            Ok(ColumnSummary {
                table: table_name,
                column: c.to_string(),
                count: stat(c, "count")?.map_or(0, |n| n as usize),
                mean: stat(c, "mean")?,
                std: stat(c, "std")?,
                min: stat(c, "min")?,
                max: stat(c, "max")?,
            })
        })
        .collect()
}

fn correlate<'a>(
    left: &'static str,
    right: &'static str,
    cells: impl Iterator<Item = (&'a Cell<f64>, &'a Cell<f64>)>,
) -> Correlation {
    let pairs: Vec<(f64, f64)> = cells
        .filter_map(|(a, b)| Some((*a.value()?, *b.value()?)))
        .filter(|(a, b)| a.is_finite() && b.is_finite())
        .collect();

    Correlation {
        left,
        right,
        pairs: pairs.len(),
        r: pearson(&pairs),
    }
}

/// Pearson correlation coefficient; `None` with fewer than two pairs or a
/// constant side.
pub fn pearson(pairs: &[(f64, f64)]) -> Option<f64> {
    if pairs.len() < 2 {
        return None;
    }

    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|p| p.1).sum::<f64>() / n;

    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (x, y) in pairs {
        let (dx, dy) = (x - mean_x, y - mean_y);
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }

    if sxx == 0.0 || syy == 0.0 {
        return None;
    }
    Some(sxy / (sxx * syy).sqrt())
}

fn compare_speeds(flights: &Records<Flight>) -> SpeedComparison {
    let speeds = |status: &str| -> Vec<f64> {
        flights
            .iter()
            .filter(|f| f.status.value().is_some_and(|s| s.eq_ignore_ascii_case(status)))
            .filter_map(|f| f.current_speed.value().copied())
            .filter(|v| v.is_finite())
            .collect()
    };

    let on_route = speeds("EM ROTA");
    let delayed = speeds("ATRASADO");

    SpeedComparison {
        on_route: on_route.len(),
        delayed: delayed.len(),
        test: welch_t_test(&on_route, &delayed),
    }
}

/// Welch's unequal-variance t-test, two-sided. `None` when either sample
/// has fewer than two values or both are constant.
pub fn welch_t_test(a: &[f64], b: &[f64]) -> Option<TTest> {
    if a.len() < 2 || b.len() < 2 {
        return None;
    }

    let (mean_a, var_a) = mean_var(a);
    let (mean_b, var_b) = mean_var(b);
    let (na, nb) = (a.len() as f64, b.len() as f64);

    let se2 = var_a / na + var_b / nb;
    if se2 == 0.0 {
        return None;
    }

    let t = (mean_a - mean_b) / se2.sqrt();
    let df = se2.powi(2)
        / ((var_a / na).powi(2) / (na - 1.0) + (var_b / nb).powi(2) / (nb - 1.0));
    let p_value = incomplete_beta(df / 2.0, 0.5, df / (df + t * t));

    Some(TTest { t, df, p_value })
}

/// Sample mean and unbiased variance.
fn mean_var(xs: &[f64]) -> (f64, f64) {
    let n = xs.len() as f64;
    let mean = xs.iter().sum::<f64>() / n;
    let var = xs.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1.0);
    (mean, var)
}

fn ln_gamma(x: f64) -> f64 {
    const COF: [f64; 6] = [
        76.18009172947146,
        -86.50532032941677,
        24.01409824083091,
        -1.231739572450155,
        0.1208650973866179e-2,
        -0.5395239384953e-5,
    ];

    let mut y = x;
    let tmp = x + 5.5;
    let tmp = tmp - (x + 0.5) * tmp.ln();
    let mut ser = 1.000000000190015;
    for c in COF {
        y += 1.0;
        ser += c / y;
    }
    -tmp + (2.5066282746310005 * ser / x).ln()
}

/// Regularized incomplete beta function I_x(a, b).
fn incomplete_beta(a: f64, b: f64, x: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    if x >= 1.0 {
        return 1.0;
    }

    let front = (ln_gamma(a + b) - ln_gamma(a) - ln_gamma(b) + a * x.ln() + b * (1.0 - x).ln()).exp();
    if x < (a + 1.0) / (a + b + 2.0) {
        front * beta_continued_fraction(a, b, x) / a
    } else {
        1.0 - front * beta_continued_fraction(b, a, 1.0 - x) / b
    }
}

/// Lentz evaluation of the incomplete beta continued fraction.
fn beta_continued_fraction(a: f64, b: f64, x: f64) -> f64 {
    const MAX_ITER: usize = 300;
    const EPS: f64 = 3e-14;
    const TINY: f64 = 1e-300;

    let clamp = |v: f64| if v.abs() < TINY { TINY } else { v };

    let (qab, qap, qam) = (a + b, a + 1.0, a - 1.0);
    let mut c = 1.0;
    let mut d = 1.0 / clamp(1.0 - qab * x / qap);
    let mut h = d;

    for m in 1..=MAX_ITER {
        let m = m as f64;
        let m2 = 2.0 * m;

        let aa = m * (b - m) * x / ((qam + m2) * (a + m2));
        d = 1.0 / clamp(1.0 + aa * d);
        c = clamp(1.0 + aa / c);
        h *= d * c;

        let aa = -(a + m) * (qab + m) * x / ((a + m2) * (qap + m2));
        d = 1.0 / clamp(1.0 + aa * d);
        c = clamp(1.0 + aa / c);
        let delta = d * c;
        h *= delta;

        if (delta - 1.0).abs() < EPS {
            break;
        }
    }
    h
}

fn alert_texts(alerts: &Table, column: &str) -> Vec<String> {
    let frame = alerts.dataframe();
    (0..frame.height())
        .filter_map(|i| RowView::new(frame, i).get::<String>(column).value().cloned())
        .collect()
}

/// Most frequent lowercase words of three or more letters.
pub fn word_frequencies(texts: impl IntoIterator<Item = String>, top: usize) -> Vec<(String, usize)> {
    let mut counts: HashMap<String, usize> = HashMap::new();

    for text in texts {
        for word in text.split(|c: char| !c.is_alphabetic()) {
            if word.chars().count() >= 3 {
                *counts.entry(word.to_lowercase()).or_insert(0) += 1;
            }
        }
    }

    let mut words: Vec<(String, usize)> = counts.into_iter().collect();
    words.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    words.truncate(top);
    words
}

fn opt(v: Option<f64>) -> String {
    v.map_or_else(|| "-".to_string(), |v| format!("{:.3}", v))
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "# SkyFlow Mobility - Data Report")?;
        writeln!(f)?;
        writeln!(f, "Generated at {}", self.generated_at.format("%Y-%m-%d %H:%M:%S UTC"))?;
        writeln!(f)?;

        writeln!(f, "## Tables")?;
        writeln!(f)?;
        writeln!(f, "| Table | Rows |")?;
        writeln!(f, "|---|---:|")?;
        for (table, rows) in &self.row_counts {
            writeln!(f, "| {} | {} |", table, rows)?;
        }
        writeln!(f)?;

        writeln!(f, "## Descriptive statistics")?;
        writeln!(f)?;
        writeln!(f, "| Table | Column | Count | Mean | Std | Min | Max |")?;
        writeln!(f, "|---|---|---:|---:|---:|---:|---:|")?;
        for s in &self.summaries {
            writeln!(
                f,
                "| {} | {} | {} | {} | {} | {} | {} |",
                s.table,
                s.column,
                s.count,
                opt(s.mean),
                opt(s.std),
                opt(s.min),
                opt(s.max)
            )?;
        }
        writeln!(f)?;

        writeln!(f, "## Correlations")?;
        writeln!(f)?;
        writeln!(f, "| Variables | Pairs | Pearson r |")?;
        writeln!(f, "|---|---:|---:|")?;
        for c in &self.correlations {
            writeln!(f, "| {} x {} | {} | {} |", c.left, c.right, c.pairs, opt(c.r))?;
        }
        writeln!(f)?;

        writeln!(f, "## Speed: EM ROTA vs ATRASADO (Welch t-test)")?;
        writeln!(f)?;
        writeln!(
            f,
            "Samples: {} on route, {} delayed.",
            self.speed.on_route, self.speed.delayed
        )?;
        match &self.speed.test {
            Some(test) => writeln!(
                f,
                "t = {:.3}, df = {:.1}, p = {:.4} ({} at 5%).",
                test.t,
                test.df,
                test.p_value,
                if test.p_value < 0.05 { "significant" } else { "not significant" }
            )?,
            None => writeln!(f, "Not enough data for the test.")?,
        }
        writeln!(f)?;

        writeln!(f, "## Alert words")?;
        writeln!(f)?;
        match self.text_column {
            Some(column) if !self.words.is_empty() => {
                writeln!(f, "From `{}`:", column)?;
                writeln!(f)?;
                for (word, count) in &self.words {
                    writeln!(f, "- {} ({})", word, count)?;
                }
            }
            _ => writeln!(f, "No alert text available.")?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-3
    }

    #[test]
    fn test_welch_known_values() {
        let test = welch_t_test(&[1.0, 2.0, 3.0, 4.0, 5.0], &[2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        assert!(close(test.t, -1.0));
        assert!(close(test.df, 8.0));
        assert!(close(test.p_value, 0.3466));
    }

    #[test]
    fn test_incomplete_beta_matches_t_distribution() {
        // two-sided p for t = 2.5 with 10 degrees of freedom
        assert!(close(incomplete_beta(5.0, 0.5, 10.0 / (10.0 + 6.25)), 0.0314));
        assert_eq!(incomplete_beta(2.0, 0.5, 1.0), 1.0);
    }

    #[test]
    fn test_welch_needs_two_samples() {
        assert!(welch_t_test(&[1.0], &[2.0, 3.0]).is_none());
        assert!(welch_t_test(&[1.0, 1.0], &[1.0, 1.0]).is_none());
    }

    #[test]
    fn test_pearson() {
        let r = pearson(&[(1.0, 2.0), (2.0, 4.0), (3.0, 6.0)]).unwrap();
        assert!(close(r, 1.0));
        let r = pearson(&[(1.0, 3.0), (2.0, 2.0), (3.0, 1.0)]).unwrap();
        assert!(close(r, -1.0));
        assert!(pearson(&[(1.0, 1.0), (1.0, 2.0)]).is_none());
    }

    #[test]
    fn test_word_frequencies() {
        let words = word_frequencies(
            vec![
                "Risco de colisão".to_string(),
                "risco climático, colisão evitada".to_string(),
                "Risco".to_string(),
            ],
            2,
        );
        assert_eq!(words, vec![("risco".to_string(), 3), ("colisão".to_string(), 2)]);
    }

    #[test]
    fn test_describe() {
        let table = Table::new(
            df!(
                "altitude_atual" => [Some(100.0), Some(300.0), None],
                "velocidade_atual" => [Some("80"), Some("x"), Some("100")],
            )
            .unwrap(),
        );

        let summaries = describe(SkyTable::Flights, &table, FLIGHT_NUMERIC).unwrap();
        assert_eq!(summaries.len(), 2);

        let altitude = &summaries[0];
        assert_eq!(altitude.count, 2);
        assert_eq!(altitude.mean, Some(200.0));
        assert_eq!(altitude.min, Some(100.0));
        assert_eq!(altitude.max, Some(300.0));

        let speed = &summaries[1];
        assert_eq!(speed.count, 2);
        assert_eq!(speed.mean, Some(90.0));
    }

    #[test]
    fn test_describe_skips_absent_columns() {
        let table = Table::new(df!("temperatura_c" => [20.0, 22.0]).unwrap());
        let summaries = describe(SkyTable::Weather, &table, WEATHER_NUMERIC).unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].column, "temperatura_c");
    }

    #[test]
    fn test_report_compute() {
        let tables = TableSet::from_tables([
            (
                SkyTable::Flights,
                Table::new(
                    df!(
                        "status_voo" => ["EM ROTA", "em rota", "ATRASADO", "ATRASADO"],
                        "velocidade_atual" => [120.0, 130.0, 90.0, 95.0],
                        "altitude_atual" => [300.0, 320.0, 250.0, 240.0],
                    )
                    .unwrap(),
                ),
            ),
            (
                SkyTable::Alerts,
                Table::new(df!("tipo_alerta" => ["Vento forte", "vento cruzado"]).unwrap()),
            ),
        ]);

        let report = Report::compute(&tables).unwrap();

        assert_eq!(report.speed.on_route, 2);
        assert_eq!(report.speed.delayed, 2);
        assert!(report.speed.test.is_some());
        assert_eq!(report.text_column, Some("tipo_alerta"));
        assert_eq!(report.words[0], ("vento".to_string(), 2));
        assert_eq!(report.correlations[0].pairs, 4);
        assert!(report.correlations[1].r.is_none());

        let markdown = report.to_markdown();
        assert!(markdown.contains("## Descriptive statistics"));
        assert!(markdown.contains("| tb_voos_ativos | altitude_atual | 4 |"));
        assert!(markdown.contains("- vento (2)"));
    }
}

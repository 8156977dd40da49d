//! # Trend Module - Improvement Across Sessions
//!
//! Fits a least-squares polynomial over `(session index, average time)` and
//! derives the improvement between the first and last sessions.
//!
//! The fit solves the normal equations
//!
//! ```text
//! A[i][j] = Σ x^(i+j)        b[i] = Σ y·x^i
//! ```
//!
//! with Gaussian elimination and partial pivoting, then back-substitution.
//! The x values are first mapped onto `[-1, 1]` so the power sums stay
//! comparable in size whatever the degree, and the resulting coefficients are
//! mapped back before they are returned.
//!
//! ```rust
//! use cardsight::trend::fit;
//!
//! let points: Vec<(f64, f64)> = (0..6)
//!     .map(|x| x as f64)
//!     .map(|x| (x, 1.0 + 2.0 * x - 0.5 * x * x))
//!     .collect();
//!
//! let curve = fit(&points, 2).unwrap();
//! assert!((curve.evaluate(10.0) - (-29.0)).abs() < 1e-6);
//! ```

use thiserror::Error;

use crate::{FULL_DECK, Seconds, Session};

/// Sessions taken into account at each end for the improvement figure
pub const IMPROVEMENT_WINDOW: usize = 5;

/// Pivots smaller than this (relative to the matrix scale) count as zero
const SINGULAR_EPSILON: f64 = 1e-12;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum TrendError {
    #[error("Need at least {required} sessions for a trend, found {found}")]
    InsufficientData { required: usize, found: usize },

    #[error("The sessions do not determine a unique trend")]
    Singular,

    #[error("No sessions match the filter ({min_cards}-{max_cards} cards)")]
    NoSessions { min_cards: usize, max_cards: usize },
}

/// A polynomial, coefficients ordered from the constant term upward
#[derive(Debug, Clone, PartialEq)]
pub struct Polynomial {
    coefficients: Vec<f64>,
}

impl Polynomial {
    pub const fn new(coefficients: Vec<f64>) -> Self {
        Self { coefficients }
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    pub fn degree(&self) -> usize {
        self.coefficients.len().saturating_sub(1)
    }

    /// Σ c[i]·x^i, evaluated with Horner's scheme
    pub fn evaluate(&self, x: f64) -> f64 {
        self.coefficients
            .iter()
            .rev()
            .fold(0.0, |acc, coefficient| acc * x + coefficient)
    }
}

/// Least-squares polynomial fit of the given degree
///
/// Fails with [`TrendError::InsufficientData`] for fewer than `degree + 1`
/// points, and with [`TrendError::Singular`] when the points don't pin down
/// a unique curve (e.g. repeated x values).
pub fn fit(points: &[(f64, f64)], degree: usize) -> Result<Polynomial, TrendError> {
    let size = degree + 1;
    if points.len() < size {
        return Err(TrendError::InsufficientData {
            required: size,
            found: points.len(),
        });
    }

    let (low, high) = points
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(low, high), &(x, _)| {
            (low.min(x), high.max(x))
        });
    let center = (low + high) / 2.0;
    let half_width = match (high - low) / 2.0 {
        width if width > 0.0 => width,
        _ => 1.0,
    };

    // Power sums Σ t^k for k in 0..=2·degree, with t the scaled x
    let mut power_sums = vec![0.0; 2 * degree + 1];
    let mut rhs = vec![0.0; size];
    for &(x, y) in points {
        let t = (x - center) / half_width;
        let mut power = 1.0;
        for (k, sum) in power_sums.iter_mut().enumerate() {
            *sum += power;
            if k < size {
                rhs[k] += y * power;
            }
            power *= t;
        }
    }

    let mut matrix: Vec<Vec<f64>> = (0..size)
        .map(|i| power_sums[i..i + size].to_vec())
        .collect();

    let scaled = solve(&mut matrix, &mut rhs)?;
    Ok(Polynomial::new(unscale(&scaled, center, half_width)))
}

/// Rewrites Σ a[k]·((x - center) / half_width)^k as a polynomial in x
fn unscale(scaled: &[f64], center: f64, half_width: f64) -> Vec<f64> {
    let (offset, slope) = (-center / half_width, 1.0 / half_width);
    let mut coefficients = vec![0.0; scaled.len()];

    // Horner's scheme over polynomials: c = c·(offset + slope·x) + a
    for &a in scaled.iter().rev() {
        for i in (0..coefficients.len()).rev() {
            let lower = if i > 0 { coefficients[i - 1] } else { 0.0 };
            coefficients[i] = coefficients[i] * offset + lower * slope;
        }
        coefficients[0] += a;
    }

    coefficients
}

/// Solves `matrix · x = rhs` in place
fn solve(matrix: &mut [Vec<f64>], rhs: &mut [f64]) -> Result<Vec<f64>, TrendError> {
    let size = rhs.len();
    let scale = matrix
        .iter()
        .flatten()
        .fold(0.0_f64, |max, value| max.max(value.abs()))
        .max(1.0);

    for column in 0..size {
        // Partial pivoting: bring the largest leading coefficient up
        let pivot_row = (column..size)
            .max_by(|&a, &b| matrix[a][column].abs().total_cmp(&matrix[b][column].abs()))
            .unwrap_or(column);

        if matrix[pivot_row][column].abs() <= SINGULAR_EPSILON * scale {
            return Err(TrendError::Singular);
        }

        matrix.swap(column, pivot_row);
        rhs.swap(column, pivot_row);

        for row in column + 1..size {
            let factor = matrix[row][column] / matrix[column][column];
            for k in column..size {
                matrix[row][k] -= factor * matrix[column][k];
            }
            rhs[row] -= factor * rhs[column];
        }
    }

    let mut solution = vec![0.0; size];
    for row in (0..size).rev() {
        let known: f64 = (row + 1..size)
            .map(|k| matrix[row][k] * solution[k])
            .sum();
        solution[row] = (rhs[row] - known) / matrix[row][row];
    }

    Ok(solution)
}

/// Which sessions the trend is computed over
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionFilter {
    pub min_cards: usize,
    pub max_cards: usize,
    pub full_deck_only: bool,
}

impl Default for SessionFilter {
    fn default() -> Self {
        Self {
            min_cards: 1,
            max_cards: FULL_DECK,
            full_deck_only: false,
        }
    }
}

impl SessionFilter {
    /// Raises the lower bound, pushing the upper bound along if needed
    pub fn with_min(mut self, min_cards: usize) -> Self {
        self.min_cards = min_cards.clamp(1, FULL_DECK);
        self.max_cards = self.max_cards.max(self.min_cards);
        self
    }

    /// Lowers the upper bound, pulling the lower bound along if needed
    pub fn with_max(mut self, max_cards: usize) -> Self {
        self.max_cards = max_cards.clamp(1, FULL_DECK);
        self.min_cards = self.min_cards.min(self.max_cards);
        self
    }

    pub const fn with_full_deck_only(mut self, full_deck_only: bool) -> Self {
        self.full_deck_only = full_deck_only;
        self
    }

    pub fn matches(&self, session: &Session) -> bool {
        let cards = session.total_cards;
        let in_range = cards >= self.min_cards && cards <= self.max_cards;
        in_range && (!self.full_deck_only || cards == FULL_DECK)
    }
}

/// A trend over the filtered history, in chronological order
#[derive(Debug, Clone, PartialEq)]
pub struct TrendReport {
    /// `(index, average time)` for every matching session, oldest first
    pub points: Vec<(f64, Seconds)>,
    /// The fitted curve, if there were enough sessions
    pub trend: Option<Polynomial>,
    /// The fitted curve evaluated at each point's x
    pub fitted: Vec<Seconds>,
    /// Change between the first and last sessions, in percent; positive
    /// means faster
    pub improvement_percent: f64,
    /// Index of the fastest session
    pub best: usize,
    /// Index of the slowest session
    pub worst: usize,
}

impl TrendReport {
    /// Analyzes `sessions` (newest first, as the history keeps them)
    ///
    /// Sessions without any recorded time are skipped. With fewer than
    /// `degree + 1` matching sessions, or when the sessions don't determine a
    /// unique curve, the report still carries the points and derived figures,
    /// just no fitted curve.
    pub fn analyze(
        sessions: &[Session],
        filter: &SessionFilter,
        degree: usize,
    ) -> Result<Self, TrendError> {
        let averages: Vec<Seconds> = sessions
            .iter()
            .rev()
            .filter(|session| filter.matches(session))
            .filter_map(Session::average_time)
            .collect();

        if averages.is_empty() {
            return Err(TrendError::NoSessions {
                min_cards: filter.min_cards,
                max_cards: filter.max_cards,
            });
        }

        let points: Vec<(f64, Seconds)> = averages
            .iter()
            .enumerate()
            .map(|(i, &average)| (i as f64, average))
            .collect();

        let trend = match fit(&points, degree) {
            Ok(curve) => Some(curve),
            Err(TrendError::Singular) => {
                tracing::debug!(degree, points = points.len(), "no unique trend");
                None
            }
            Err(_) => None,
        };

        let fitted = trend
            .as_ref()
            .map(|curve| points.iter().map(|&(x, _)| curve.evaluate(x)).collect())
            .unwrap_or_default();

        Ok(Self {
            improvement_percent: improvement(&averages),
            best: arg_by(&averages, |a, b| a < b),
            worst: arg_by(&averages, |a, b| a > b),
            points,
            trend,
            fitted,
        })
    }

    pub fn best_point(&self) -> (f64, Seconds) {
        self.points[self.best]
    }

    pub fn worst_point(&self) -> (f64, Seconds) {
        self.points[self.worst]
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Percent change from the mean of the first window to the mean of the last
///
/// Positive when the recent sessions are faster.
pub fn improvement(averages: &[Seconds]) -> f64 {
    let window = IMPROVEMENT_WINDOW.min(averages.len());
    if window == 0 {
        return 0.0;
    }

    let mean = |values: &[Seconds]| values.iter().sum::<Seconds>() / window as f64;
    let first = mean(&averages[..window]);
    let last = mean(&averages[averages.len() - window..]);

    if first == 0.0 {
        return 0.0;
    }

    (first - last) / first * 100.0
}

/// Index of the first element preferred by `better` over all others
fn arg_by(values: &[Seconds], better: impl Fn(Seconds, Seconds) -> bool) -> usize {
    values
        .iter()
        .enumerate()
        .fold(0, |chosen, (i, &value)| {
            if better(value, values[chosen]) {
                i
            } else {
                chosen
            }
        })
}

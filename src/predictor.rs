//! Stateful per-field predictors and the adaptive selector that switches
//! between them.
//!
//! A predictor guesses the next value of a column from the values it has
//! seen; only the residual against that guess reaches the entropy coder.
//! The decoder runs the same predictors over the reconstructed values, so
//! encoder and decoder stay in lockstep purely as a function of the decoded
//! history. All predictors start from all-zero history.

use std::collections::VecDeque;

use crate::int_type::IntType;

/// A next-value predictor for one field.
pub trait Predictor {
    /// Returns the predicted next value. Always works, regardless of how
    /// many values have been fed.
    fn predict(&self) -> i128;

    /// Feeds the observed value into the predictor's history.
    fn feed(&mut self, value: i128);

    /// Predicts, then feeds, returning the prediction made before the feed.
    fn predict_and_feed(&mut self, value: i128) -> i128 {
        let prediction = self.predict();
        self.feed(value);
        prediction
    }
}

/// Zero-order hold: predicts the previous value.
#[derive(Debug, Clone, Default)]
pub struct Last {
    last: i128,
}

impl Predictor for Last {
    fn predict(&self) -> i128 {
        self.last
    }

    fn feed(&mut self, value: i128) {
        self.last = value;
    }
}

/// Order-2 linear extrapolation `2*h[1] - h[0]` from the last two values.
///
/// Overflow past the field's range wraps modulo the full range width; the
/// encoder computes this prediction in unsigned fixed-width arithmetic and
/// relies on its wraparound, so the decoder must wrap rather than clamp.
#[derive(Debug, Clone)]
pub struct LinearO2 {
    ty: IntType,
    prev: [i128; 2],
}

impl LinearO2 {
    pub fn new(ty: IntType) -> Self {
        Self { ty, prev: [0; 2] }
    }
}

impl Predictor for LinearO2 {
    fn predict(&self) -> i128 {
        self.ty.wrap(2 * self.prev[1] - self.prev[0])
    }

    fn feed(&mut self, value: i128) {
        self.prev[0] = self.prev[1];
        self.prev[1] = value;
    }
}

/// Linear extrapolation of the average trend over the last `n` values:
/// `newest + (newest - oldest) / (n - 1)`, clamped to the field's range.
#[derive(Debug, Clone)]
pub struct Linear {
    ty: IntType,
    history: VecDeque<i128>,
}

impl Linear {
    pub fn new(ty: IntType, n: usize) -> Self {
        assert!(n >= 2, "Linear needs at least 2 history samples");
        Self {
            ty,
            history: VecDeque::from(vec![0; n]),
        }
    }
}

impl Predictor for Linear {
    fn predict(&self) -> i128 {
        let newest = self.history[self.history.len() - 1];
        let oldest = self.history[0];
        let trend = (newest - oldest) / (self.history.len() as i128 - 1);
        self.ty.clamp(newest + trend)
    }

    fn feed(&mut self, value: i128) {
        self.history.pop_front();
        self.history.push_back(value);
    }
}

/// Least-squares quadratic one-step-ahead extrapolation over the last 3, 4
/// or 5 values, clamped. Exact for any sequence lying on a quadratic.
#[derive(Debug, Clone)]
pub struct Quadratic {
    ty: IntType,
    history: VecDeque<i128>,
    weights: &'static [i128],
    divisor: i128,
}

impl Quadratic {
    pub fn new(ty: IntType, points: usize) -> Self {
        // Weights apply oldest to newest; each set reproduces constant,
        // linear and quadratic sequences exactly.
        let (weights, divisor): (&'static [i128], i128) = match points {
            3 => (&[1, -3, 3], 1),
            4 => (&[3, -5, -3, 9], 4),
            5 => (&[3, -3, -4, 0, 9], 5),
            _ => panic!("Quadratic supports 3, 4 or 5 points"),
        };
        Self {
            ty,
            history: VecDeque::from(vec![0; points]),
            weights,
            divisor,
        }
    }
}

impl Predictor for Quadratic {
    fn predict(&self) -> i128 {
        let sum: i128 = self
            .weights
            .iter()
            .zip(&self.history)
            .map(|(w, h)| w * h)
            .sum();
        self.ty.clamp(sum / self.divisor)
    }

    fn feed(&mut self, value: i128) {
        self.history.pop_front();
        self.history.push_back(value);
    }
}

/// Holt double exponential smoothing with power-of-two smoothing factors.
///
/// Tracks a level and a trend; `level_shift`/`trend_shift` give smoothing
/// factors of `2^-shift` (a shift of 0 tracks the input exactly).
#[derive(Debug, Clone)]
pub struct DoubleExponential {
    ty: IntType,
    level: i128,
    trend: i128,
    level_shift: u32,
    trend_shift: u32,
}

impl DoubleExponential {
    pub fn new(ty: IntType, level_shift: u32, trend_shift: u32) -> Self {
        Self {
            ty,
            level: 0,
            trend: 0,
            level_shift,
            trend_shift,
        }
    }
}

impl Predictor for DoubleExponential {
    fn predict(&self) -> i128 {
        self.ty.clamp(self.level + self.trend)
    }

    fn feed(&mut self, value: i128) {
        let forecast = self.level + self.trend;
        let level = forecast + ((value - forecast) >> self.level_shift);
        self.trend += (level - self.level - self.trend) >> self.trend_shift;
        self.level = level;
    }
}

/// Extrapolates by an exponentially smoothed first derivative.
#[derive(Debug, Clone)]
pub struct SmoothDeriv {
    ty: IntType,
    last: i128,
    deriv: i128,
    shift: u32,
}

impl SmoothDeriv {
    pub fn new(ty: IntType, shift: u32) -> Self {
        Self {
            ty,
            last: 0,
            deriv: 0,
            shift,
        }
    }
}

impl Predictor for SmoothDeriv {
    fn predict(&self) -> i128 {
        self.ty.clamp(self.last + self.deriv)
    }

    fn feed(&mut self, value: i128) {
        let deriv = value - self.last;
        self.deriv += (deriv - self.deriv) >> self.shift;
        self.last = value;
    }
}

/// Extrapolates by the last first derivative plus an exponentially smoothed
/// second derivative.
#[derive(Debug, Clone)]
pub struct SmoothDeriv2 {
    ty: IntType,
    last: i128,
    deriv: i128,
    second: i128,
    shift: u32,
}

impl SmoothDeriv2 {
    pub fn new(ty: IntType, shift: u32) -> Self {
        Self {
            ty,
            last: 0,
            deriv: 0,
            second: 0,
            shift,
        }
    }
}

impl Predictor for SmoothDeriv2 {
    fn predict(&self) -> i128 {
        self.ty.clamp(self.last + self.deriv + self.second)
    }

    fn feed(&mut self, value: i128) {
        let deriv = value - self.last;
        let second = deriv - self.deriv;
        self.second += (second - self.second) >> self.shift;
        self.deriv = deriv;
        self.last = value;
    }
}

/// Switches between two inner predictors behind a bounded signed counter.
///
/// The counter lives in `[-selector_max, selector_max - 1]`; a non-negative
/// counter selects the first predictor. On every feed both inner predictions
/// are scored against the observed value: a strictly smaller absolute error
/// for the first predictor saturates the counter upward, a strictly larger
/// one downward, and ties leave it alone. Both inner predictors are fed
/// unconditionally, so the selection is a pure function of the value
/// history.
pub struct Adapt {
    selector_max: i32,
    selector: i32,
    first: Box<dyn Predictor>,
    second: Box<dyn Predictor>,
}

impl Adapt {
    pub fn new(selector_max: i32, first: Box<dyn Predictor>, second: Box<dyn Predictor>) -> Self {
        assert!(selector_max > 0);
        Self {
            selector_max,
            selector: 0,
            first,
            second,
        }
    }

    /// Current selector value, for inspection in tests.
    pub fn selector(&self) -> i32 {
        self.selector
    }
}

impl Predictor for Adapt {
    fn predict(&self) -> i128 {
        if self.selector >= 0 {
            self.first.predict()
        } else {
            self.second.predict()
        }
    }

    fn feed(&mut self, value: i128) {
        let error1 = (self.first.predict() - value).abs();
        let error2 = (self.second.predict() - value).abs();

        if error1 < error2 {
            if self.selector < self.selector_max - 1 {
                self.selector += 1;
            }
        } else if error1 > error2 && self.selector > -self.selector_max {
            self.selector -= 1;
        }

        self.first.feed(value);
        self.second.feed(value);
    }
}

/// A named predictor constructor: the predictor variant plus its
/// construction arguments, instantiated per field from the field's type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PredictorFactory {
    Last,
    LinearO2,
    Linear(usize),
    Quadratic(usize),
    DoubleExponential { level_shift: u32, trend_shift: u32 },
    SmoothDeriv(u32),
    SmoothDeriv2(u32),
    Adapt {
        selector_max: i32,
        first: Box<PredictorFactory>,
        second: Box<PredictorFactory>,
    },
}

impl PredictorFactory {
    /// Convenience constructor for the two-way adaptive combination.
    pub fn adapt(selector_max: i32, first: PredictorFactory, second: PredictorFactory) -> Self {
        PredictorFactory::Adapt {
            selector_max,
            first: Box::new(first),
            second: Box::new(second),
        }
    }

    /// Instantiates the predictor for a field of the given type.
    pub fn build(&self, ty: IntType) -> Box<dyn Predictor> {
        match self {
            PredictorFactory::Last => Box::new(Last::default()),
            PredictorFactory::LinearO2 => Box::new(LinearO2::new(ty)),
            PredictorFactory::Linear(n) => Box::new(Linear::new(ty, *n)),
            PredictorFactory::Quadratic(points) => Box::new(Quadratic::new(ty, *points)),
            PredictorFactory::DoubleExponential {
                level_shift,
                trend_shift,
            } => Box::new(DoubleExponential::new(ty, *level_shift, *trend_shift)),
            PredictorFactory::SmoothDeriv(shift) => Box::new(SmoothDeriv::new(ty, *shift)),
            PredictorFactory::SmoothDeriv2(shift) => Box::new(SmoothDeriv2::new(ty, *shift)),
            PredictorFactory::Adapt {
                selector_max,
                first,
                second,
            } => Box::new(Adapt::new(
                *selector_max,
                first.build(ty),
                second.build(ty),
            )),
        }
    }
}

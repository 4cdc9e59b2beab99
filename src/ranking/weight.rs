use super::domain::{Actor, Candidate};
use super::scorer::{Scorer, ScorerError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;

/// Piecewise-linear mapping from a normalized score to the score a scorer returns.
///
/// Inputs outside the key range clamp to the first or last key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "CurveKeys")]
pub struct WeightCurve {
    keys: Vec<(f64, f64)>,
}

/// Unchecked wire form of a [`WeightCurve`].
#[derive(Deserialize)]
struct CurveKeys {
    keys: Vec<(f64, f64)>,
}

impl TryFrom<CurveKeys> for WeightCurve {
    type Error = CurveError;

    fn try_from(raw: CurveKeys) -> Result<Self, Self::Error> {
        Self::new(raw.keys)
    }
}

impl WeightCurve {
    pub fn new(mut keys: Vec<(f64, f64)>) -> Result<Self, CurveError> {
        if keys.is_empty() {
            return Err(CurveError::Empty);
        }
        if let Some(&(x, y)) = keys.iter().find(|(x, y)| !x.is_finite() || !y.is_finite()) {
            return Err(CurveError::NonFiniteKey { x, y });
        }
        keys.sort_by(|a, b| a.0.total_cmp(&b.0));
        keys.dedup_by(|later, earlier| later.0 == earlier.0);
        Ok(Self { keys })
    }

    /// Identity over `[0, 1]`, clamped outside.
    pub fn linear() -> Self {
        Self {
            keys: vec![(0.0, 0.0), (1.0, 1.0)],
        }
    }

    /// Same value everywhere.
    pub fn constant(value: f64) -> Result<Self, CurveError> {
        Self::new(vec![(0.0, value)])
    }

    pub fn keys(&self) -> &[(f64, f64)] {
        &self.keys
    }

    pub fn evaluate(&self, x: f64) -> f64 {
        if x.is_nan() {
            return f64::NAN;
        }

        let (first_x, first_y) = self.keys[0];
        if x <= first_x {
            return first_y;
        }
        let (last_x, last_y) = self.keys[self.keys.len() - 1];
        if x >= last_x {
            return last_y;
        }

        for window in self.keys.windows(2) {
            let (x0, y0) = window[0];
            let (x1, y1) = window[1];
            if x <= x1 {
                let t = (x - x0) / (x1 - x0);
                return y0 + (y1 - y0) * t;
            }
        }

        last_y
    }
}

impl Default for WeightCurve {
    fn default() -> Self {
        Self::linear()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CurveError {
    Empty,
    NonFiniteKey { x: f64, y: f64 },
    Parse(String),
}

impl fmt::Display for CurveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CurveError::Empty => write!(f, "a weight curve needs at least one key"),
            CurveError::NonFiniteKey { x, y } => {
                write!(f, "weight curve key ({x}, {y}) is not finite")
            }
            CurveError::Parse(raw) => {
                write!(f, "failed to parse '{raw}' as weight curve keys (x:y,x:y,...)")
            }
        }
    }
}

impl std::error::Error for CurveError {}

impl std::str::FromStr for WeightCurve {
    type Err = CurveError;

    /// Parses `x:y,x:y,...`.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let keys = raw
            .split(',')
            .map(|pair| {
                let (x, y) = pair.trim().split_once(':')?;
                Some((x.trim().parse::<f64>().ok()?, y.trim().parse::<f64>().ok()?))
            })
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| CurveError::Parse(raw.to_string()))?;
        Self::new(keys)
    }
}

/// Scorer adapter that runs the inner score through a [`WeightCurve`].
///
/// Lifecycle hooks are forwarded untouched.
pub struct Weighted<S, A, C> {
    inner: S,
    curve: WeightCurve,
    _handles: PhantomData<fn(&A, &C)>,
}

impl<S, A, C> Weighted<S, A, C>
where
    S: Scorer<A, C>,
    A: Actor,
    C: Candidate,
{
    pub fn new(inner: S, curve: WeightCurve) -> Self {
        Self {
            inner,
            curve,
            _handles: PhantomData,
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn curve(&self) -> &WeightCurve {
        &self.curve
    }
}

impl<S, A, C> Scorer<A, C> for Weighted<S, A, C>
where
    S: Scorer<A, C>,
    A: Actor,
    C: Candidate,
{
    fn score(&self, actor: &A, candidate: &C) -> Result<f64, ScorerError> {
        let normalized = self.inner.score(actor, candidate)?;
        Ok(self.curve.evaluate(normalized))
    }

    fn name(&self) -> &str {
        self.inner.name()
    }

    fn on_attach(&self) {
        self.inner.on_attach();
    }

    fn on_enable(&self) {
        self.inner.on_enable();
    }

    fn on_disable(&self) {
        self.inner.on_disable();
    }

    fn on_detach(&self) {
        self.inner.on_detach();
    }

    fn on_link(&self, actor: &A) {
        self.inner.on_link(actor);
    }

    fn on_unlink(&self, actor: &A) {
        self.inner.on_unlink(actor);
    }
}

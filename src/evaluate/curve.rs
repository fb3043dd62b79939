use crate::error::EvaluationError;
use crate::model::CurvePoint;

pub const DEFAULT_GRID_POINTS: usize = 101;

/// `points` thresholds spaced uniformly over [0, 1], both ends included.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TauGrid {
    points: usize,
}

impl TauGrid {
    pub fn new(points: usize) -> Result<Self, EvaluationError> {
        if points < 2 {
            return Err(EvaluationError::GridTooSmall(points));
        }
        Ok(Self { points })
    }

    pub fn points(&self) -> usize {
        self.points
    }

    pub fn taus(&self) -> impl Iterator<Item = f64> + '_ {
        let last = (self.points - 1) as f64;
        (0..self.points).map(move |index| index as f64 / last)
    }
}

impl Default for TauGrid {
    fn default() -> Self {
        Self {
            points: DEFAULT_GRID_POINTS,
        }
    }
}

/// What the sweep needs from one scored record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepEntry {
    pub p_disagree: f64,
    pub wrong: bool,
    /// False when the record abstains at every tau (fail-closed evidence or
    /// a guard rail).
    pub eligible: bool,
}

/// Coverage and hallucination rate at every grid tau.
///
/// Sorts once by risk, then walks the ascending grid with a cursor and
/// cumulative answered/wrong counts.
pub fn coverage_curve(entries: &[SweepEntry], grid: &TauGrid) -> Vec<CurvePoint> {
    let total = entries.len();
    let mut answerable = entries
        .iter()
        .filter(|entry| entry.eligible && !entry.p_disagree.is_nan())
        .collect::<Vec<&SweepEntry>>();
    answerable.sort_by(|left, right| left.p_disagree.total_cmp(&right.p_disagree));

    let mut cursor = 0_usize;
    let mut answered = 0_usize;
    let mut wrong = 0_usize;
    let mut curve = Vec::with_capacity(grid.points());

    for tau in grid.taus() {
        while cursor < answerable.len() && answerable[cursor].p_disagree <= tau {
            answered += 1;
            if answerable[cursor].wrong {
                wrong += 1;
            }
            cursor += 1;
        }

        let coverage = if total == 0 {
            0.0
        } else {
            answered as f64 / total as f64
        };
        let halluc_rate = if answered == 0 {
            0.0
        } else {
            wrong as f64 / answered as f64
        };

        curve.push(CurvePoint {
            tau,
            coverage,
            halluc_rate,
            answered,
        });
    }

    curve
}

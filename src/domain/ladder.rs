//! Ordered threshold tables.
//!
//! A ladder is a list of rungs checked top to bottom; the first rung whose
//! open interval `(lower, upper)` contains the value wins. A missing bound is
//! unbounded, so `Rung::otherwise` matches anything, `NaN` included.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rung {
    pub lower: Option<f64>,
    pub upper: Option<f64>,
    pub delta: i32,
    pub label: Option<&'static str>,
}

impl Rung {
    /// Matches `value < upper`.
    pub const fn below(upper: f64, delta: i32, label: &'static str) -> Self {
        Self {
            lower: None,
            upper: Some(upper),
            delta,
            label: Some(label),
        }
    }

    /// Matches `value > lower`.
    pub const fn above(lower: f64, delta: i32, label: &'static str) -> Self {
        Self {
            lower: Some(lower),
            upper: None,
            delta,
            label: Some(label),
        }
    }

    pub const fn otherwise(delta: i32, label: &'static str) -> Self {
        Self {
            lower: None,
            upper: None,
            delta,
            label: Some(label),
        }
    }

    /// Same rung without a justification line.
    pub const fn silent(self) -> Self {
        Self {
            label: None,
            ..self
        }
    }

    pub fn contains(&self, value: f64) -> bool {
        let above_lower = match self.lower {
            Some(lo) => value > lo,
            None => true,
        };
        let below_upper = match self.upper {
            Some(hi) => value < hi,
            None => true,
        };
        above_lower && below_upper
    }
}

pub fn first_match(ladder: &[Rung], value: f64) -> Option<&Rung> {
    ladder.iter().find(|rung| rung.contains(value))
}

/// Apply the first matching rung: add its delta to `score` and, when the rung
/// has a label, push `describe(label)` onto `details`.
pub fn apply<F>(
    ladder: &[Rung],
    value: f64,
    score: &mut i32,
    details: &mut Vec<String>,
    describe: F,
) -> Option<Rung>
where
    F: Fn(&str) -> String,
{
    let rung = *first_match(ladder, value)?;
    *score += rung.delta;
    if let Some(label) = rung.label {
        details.push(describe(label));
    }
    Some(rung)
}

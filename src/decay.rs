use crate::{ensure_interval, error::Result};

/// A hyperparameter that changes with the number of completed episodes
pub trait Decay {
    /// Calculate value after `t` completed episodes
    fn evaluate(&self, t: f64) -> f64;
}

/// A constant value
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Constant {
    value: f64,
}

impl Constant {
    pub fn new(value: f64) -> Self {
        Self { value }
    }
}

impl Decay for Constant {
    fn evaluate(&self, _t: f64) -> f64 {
        self.value
    }
}

/// v(t) = max(v<sub>i</sub> * r<sup>t</sup>, v<sub>f</sub>)
///
/// Equivalent to multiplying the value by `r` at the end of every episode and never letting it
/// drop below the floor `v`<sub>f</sub>.
#[derive(Debug, Clone, PartialEq)]
pub struct Geometric {
    rate: f64,
    vi: f64,
    vf: f64,
}

impl Geometric {
    /// ### Parameters
    /// - `rate` - Per-episode multiplier, must be in `(0, 1]`
    /// - `vi` - Initial value
    /// - `vf` - Floor, must not exceed `vi`
    pub fn new(rate: f64, vi: f64, vf: f64) -> Result<Self> {
        ensure_interval!(rate, f64::MIN_POSITIVE, 1.0);
        if !(vf <= vi) {
            return Err(crate::error::Error::Config(format!(
                "decay floor {vf} must not exceed the initial value {vi}"
            )));
        }
        Ok(Self { rate, vi, vf })
    }
}

impl Default for Geometric {
    fn default() -> Self {
        Self {
            rate: 0.995,
            vi: 0.3,
            vf: 0.01,
        }
    }
}

impl Decay for Geometric {
    fn evaluate(&self, t: f64) -> f64 {
        let &Self { rate, vi, vf } = self;
        (vi * rate.powf(t)).max(vf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_decay() {
        let x = Constant::new(0.25);
        assert_eq!(x.evaluate(0.0), 0.25);
        assert_eq!(x.evaluate(100.0), 0.25);
    }

    #[test]
    fn geometric_decay() {
        let x = Geometric::new(0.5, 0.4, 0.05).unwrap();
        assert_eq!(x.evaluate(0.0), 0.4);
        assert_eq!(x.evaluate(1.0), 0.2);
        assert_eq!(x.evaluate(2.0), 0.1);
        assert_eq!(x.evaluate(10.0), 0.05);
    }

    #[test]
    fn geometric_rate_of_one_is_constant() {
        let x = Geometric::new(1.0, 0.3, 0.0).unwrap();
        assert_eq!(x.evaluate(0.0), 0.3);
        assert_eq!(x.evaluate(1000.0), 0.3);
    }

    #[test]
    fn geometric_rejects_bad_parameters() {
        assert!(Geometric::new(0.0, 0.3, 0.01).is_err());
        assert!(Geometric::new(1.5, 0.3, 0.01).is_err());
        assert!(Geometric::new(0.9, 0.1, 0.2).is_err());
    }
}

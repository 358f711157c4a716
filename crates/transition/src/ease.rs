/// Easing curve applied to normalized time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Ease {
    #[default]
    Linear,
    QuadInOut,
    CubicIn,
    CubicOut,
    CubicInOut,
}

impl Ease {
    /// Maps `t` (clamped to `0..=1`) onto the curve. Both ends are fixed
    /// points for every curve.
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Ease::Linear => t,
            Ease::QuadInOut => {
                let t = t * 2.0;
                if t <= 1.0 {
                    t * t / 2.0
                } else {
                    let t = t - 1.0;
                    (t * (2.0 - t) + 1.0) / 2.0
                }
            }
            Ease::CubicIn => t * t * t,
            Ease::CubicOut => {
                let t = t - 1.0;
                t * t * t + 1.0
            }
            Ease::CubicInOut => {
                let t = t * 2.0;
                if t <= 1.0 {
                    t * t * t / 2.0
                } else {
                    let t = t - 2.0;
                    (t * t * t + 2.0) / 2.0
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Ease; 5] = [
        Ease::Linear,
        Ease::QuadInOut,
        Ease::CubicIn,
        Ease::CubicOut,
        Ease::CubicInOut,
    ];

    #[test]
    fn curves_fix_both_ends() {
        for ease in ALL {
            assert_eq!(ease.apply(0.0), 0.0, "{ease:?}");
            assert!((ease.apply(1.0) - 1.0).abs() < 1e-12, "{ease:?}");
        }
    }

    #[test]
    fn symmetric_curves_pass_through_midpoint() {
        for ease in [Ease::Linear, Ease::QuadInOut, Ease::CubicInOut] {
            assert!((ease.apply(0.5) - 0.5).abs() < 1e-12, "{ease:?}");
        }
        assert!(Ease::CubicIn.apply(0.5) < 0.5);
        assert!(Ease::CubicOut.apply(0.5) > 0.5);
    }

    #[test]
    fn out_of_range_time_is_clamped() {
        assert_eq!(Ease::CubicOut.apply(-3.0), 0.0);
        assert_eq!(Ease::Linear.apply(7.0), 1.0);
    }
}

//! Easing Curves
//!
//! Easing functions rendered as FFmpeg expressions over a normalized
//! progress term. Motion filters splice these into `zoompan` expressions so
//! the curve is evaluated per output frame.

use serde::{Deserialize, Serialize};

/// Easing curve applied to motion and fade progress
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Easing {
    Linear,
    #[default]
    Ease,
    EaseIn,
    EaseOut,
    EaseInOut,
    Bounce,
    Elastic,
    Back,
}

impl Easing {
    /// Renders the curve as an FFmpeg expression.
    ///
    /// `progress` is an expression evaluating to `0.0..=1.0`; the result
    /// evaluates to the eased progress on the same scale.
    pub fn expression(&self, progress: &str) -> String {
        let p = progress;
        match self {
            Easing::Linear => p.to_string(),
            // Smoothstep
            Easing::Ease => format!("({p})*({p})*(3-2*({p}))"),
            Easing::EaseIn => format!("({p})*({p})"),
            Easing::EaseOut => format!("(1-(1-({p}))*(1-({p})))"),
            Easing::EaseInOut => {
                format!("if(lt({p}\\,0.5)\\,2*({p})*({p})\\,1-pow(-2*({p})+2\\,2)/2)")
            }
            Easing::Bounce => {
                format!("(1-abs(cos(({p})*PI*2.5))*(1-({p})))")
            }
            Easing::Elastic => {
                format!("(({p})+sin(({p})*PI*3)*(1-({p}))*0.3)")
            }
            Easing::Back => {
                format!("(({p})*({p})*(2.70158*({p})-1.70158))")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_passthrough() {
        assert_eq!(Easing::Linear.expression("on/24"), "on/24");
    }

    #[test]
    fn test_smoothstep_substitutes_progress() {
        let expr = Easing::Ease.expression("t/5");
        assert_eq!(expr, "(t/5)*(t/5)*(3-2*(t/5))");
    }

    #[test]
    fn test_ease_in_out_escapes_commas() {
        // Commas inside filter option values must be escaped for FFmpeg
        let expr = Easing::EaseInOut.expression("p");
        assert!(expr.contains("\\,"));
        assert!(!expr.contains(",p"));
    }

    #[test]
    fn test_default_is_ease() {
        assert_eq!(Easing::default(), Easing::Ease);
    }
}

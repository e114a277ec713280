// 💳 Credit-adjusted interest rates
//
// A student's credit score (300-850) maps to a grade; each grade carries a
// signed bonus in percentage points added to a product's base rate. The
// result is floored at a configurable minimum rate.

use serde::{Deserialize, Serialize};

pub const MIN_CREDIT_SCORE: u16 = 300;
pub const MAX_CREDIT_SCORE: u16 = 850;

/// Lowest rate any savings product pays, in percent
pub const DEFAULT_MIN_RATE: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CreditGrade {
    #[serde(rename = "A+")]
    APlus,
    A,
    B,
    C,
    D,
    F,
}

impl CreditGrade {
    pub fn from_score(score: u16) -> Self {
        match clamp_score(score as i32) {
            800..=850 => CreditGrade::APlus,
            740..=799 => CreditGrade::A,
            670..=739 => CreditGrade::B,
            580..=669 => CreditGrade::C,
            500..=579 => CreditGrade::D,
            _ => CreditGrade::F,
        }
    }

    /// Rate bonus (or penalty) in percentage points
    pub fn rate_bonus(&self) -> f64 {
        match self {
            CreditGrade::APlus => 2.0,
            CreditGrade::A => 1.0,
            CreditGrade::B => 0.5,
            CreditGrade::C => 0.0,
            CreditGrade::D => -0.5,
            CreditGrade::F => -1.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CreditGrade::APlus => "A+",
            CreditGrade::A => "A",
            CreditGrade::B => "B",
            CreditGrade::C => "C",
            CreditGrade::D => "D",
            CreditGrade::F => "F",
        }
    }
}

impl std::fmt::Display for CreditGrade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn clamp_score(score: i32) -> u16 {
    score.clamp(MIN_CREDIT_SCORE as i32, MAX_CREDIT_SCORE as i32) as u16
}

/// Base rate plus the grade's bonus, never below `min_rate`
pub fn adjusted_rate(grade: CreditGrade, base_rate: f64, min_rate: f64) -> f64 {
    (base_rate + grade.rate_bonus()).max(min_rate)
}

/// Convenience wrapper that grades the score first
pub fn rate_for_score(score: u16, base_rate: f64, min_rate: f64) -> f64 {
    adjusted_rate(CreditGrade::from_score(score), base_rate, min_rate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grade_boundaries() {
        assert_eq!(CreditGrade::from_score(850), CreditGrade::APlus);
        assert_eq!(CreditGrade::from_score(800), CreditGrade::APlus);
        assert_eq!(CreditGrade::from_score(799), CreditGrade::A);
        assert_eq!(CreditGrade::from_score(740), CreditGrade::A);
        assert_eq!(CreditGrade::from_score(670), CreditGrade::B);
        assert_eq!(CreditGrade::from_score(669), CreditGrade::C);
        assert_eq!(CreditGrade::from_score(580), CreditGrade::C);
        assert_eq!(CreditGrade::from_score(500), CreditGrade::D);
        assert_eq!(CreditGrade::from_score(499), CreditGrade::F);
        assert_eq!(CreditGrade::from_score(300), CreditGrade::F);
    }

    #[test]
    fn test_out_of_band_scores_are_clamped() {
        assert_eq!(CreditGrade::from_score(0), CreditGrade::F);
        assert_eq!(CreditGrade::from_score(999), CreditGrade::APlus);
    }

    #[test]
    fn test_adjusted_rate_adds_bonus() {
        assert_eq!(adjusted_rate(CreditGrade::APlus, 3.0, DEFAULT_MIN_RATE), 5.0);
        assert_eq!(adjusted_rate(CreditGrade::C, 3.0, DEFAULT_MIN_RATE), 3.0);
        assert_eq!(adjusted_rate(CreditGrade::F, 3.0, DEFAULT_MIN_RATE), 2.0);
    }

    #[test]
    fn test_adjusted_rate_floor() {
        assert_eq!(adjusted_rate(CreditGrade::F, 1.0, DEFAULT_MIN_RATE), 0.5);
        assert_eq!(adjusted_rate(CreditGrade::D, 0.0, 0.25), 0.25);
    }

    #[test]
    fn test_rate_for_score() {
        assert_eq!(rate_for_score(760, 2.0, DEFAULT_MIN_RATE), 3.0);
    }

    #[test]
    fn test_grade_serializes_as_letter() {
        let json = serde_json::to_string(&CreditGrade::APlus).unwrap();
        assert_eq!(json, "\"A+\"");
        assert_eq!(CreditGrade::B.to_string(), "B");
    }
}

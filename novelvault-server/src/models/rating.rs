//! Rating score

use super::ValidationError;

pub const MIN_SCORE: i16 = 1;
pub const MAX_SCORE: i16 = 5;

/// Integer score in 1..=5
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Score(i16);

impl Score {
    pub fn new(value: i64) -> Result<Self, ValidationError> {
        if !(MIN_SCORE as i64..=MAX_SCORE as i64).contains(&value) {
            return Err(ValidationError::OutOfRange {
                field: "score",
                min: MIN_SCORE as i64,
                max: MAX_SCORE as i64,
            });
        }
        Ok(Self(value as i16))
    }

    pub fn get(self) -> i16 {
        self.0
    }
}

/// Round an average to two decimals
pub fn round_average(avg: f64) -> f64 {
    (avg * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds() {
        assert!(Score::new(1).is_ok());
        assert!(Score::new(5).is_ok());
        assert!(Score::new(0).is_err());
        assert!(Score::new(6).is_err());
        assert!(Score::new(-3).is_err());
    }

    #[test]
    fn averages_round_to_two_places() {
        assert_eq!(round_average(4.0 / 3.0), 1.33);
        assert_eq!(round_average(11.0 / 3.0), 3.67);
        assert_eq!(round_average(5.0), 5.0);
    }
}

use crate::error::PeriodError;

const LARGE_LOW_LIMIT: f64 = 1000.0;
const MID_LOW_LIMIT: f64 = 600.0;

struct Bucket {
    name: &'static str,
    is_match: fn(f64) -> bool,
    periods: usize,
}

/// Checked in order; the first match wins.
const BUCKETS: [Bucket; 3] = [
    Bucket {
        name: "large",
        is_match: |width| width >= LARGE_LOW_LIMIT,
        periods: 3,
    },
    Bucket {
        name: "mid",
        is_match: |width| width > MID_LOW_LIMIT && width < LARGE_LOW_LIMIT,
        periods: 2,
    },
    Bucket {
        name: "small",
        is_match: |width| width <= MID_LOW_LIMIT,
        periods: 1,
    },
];

/// Number of periods that fit a display `width` in pixels.
pub fn choose_responsive_period_count(width: f64) -> Result<usize, PeriodError> {
    let bucket = BUCKETS
        .iter()
        .find(|bucket| (bucket.is_match)(width))
        .ok_or(PeriodError::UnmatchedWidth(width))?;
    tracing::trace!(width, bucket = bucket.name, "chose period count");
    Ok(bucket.periods)
}

#[cfg(test)]
mod tests {
    use super::choose_responsive_period_count;
    use crate::error::PeriodError;

    #[test]
    fn maps_widths_to_counts() {
        assert_eq!(choose_responsive_period_count(1200.0), Ok(3));
        assert_eq!(choose_responsive_period_count(700.0), Ok(2));
        assert_eq!(choose_responsive_period_count(300.0), Ok(1));
    }

    #[test]
    fn breakpoints_are_contiguous() {
        assert_eq!(choose_responsive_period_count(1000.0), Ok(3));
        assert_eq!(choose_responsive_period_count(999.5), Ok(2));
        assert_eq!(choose_responsive_period_count(600.5), Ok(2));
        assert_eq!(choose_responsive_period_count(600.0), Ok(1));
        assert_eq!(choose_responsive_period_count(0.0), Ok(1));
    }

    #[test]
    fn unmatched_width_fails_fast() {
        assert!(matches!(
            choose_responsive_period_count(f64::NAN),
            Err(PeriodError::UnmatchedWidth(_))
        ));
    }
}

use serde::Serialize;
use statrs::statistics::Statistics;

fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    finite(values.iter().mean())
}

/// Sample standard deviation (n - 1 denominator); undefined below two samples.
pub fn sample_std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    finite(values.iter().std_dev())
}

/// Linear-interpolation quantile (`pos = q * (n - 1)`), ignoring non-finite values.
pub fn quantile(values: &[f64], q: f64) -> Option<f64> {
    if !(0.0..=1.0).contains(&q) {
        return None;
    }
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(|a, b| a.total_cmp(b));
    if sorted.len() == 1 {
        return Some(sorted[0]);
    }
    let pos = q * (sorted.len() as f64 - 1.0);
    let idx = pos.floor() as usize;
    let frac = pos - idx as f64;
    let a = sorted[idx];
    let b = sorted[(idx + 1).min(sorted.len() - 1)];
    Some(a + (b - a) * frac)
}

pub fn median(values: &[f64]) -> Option<f64> {
    quantile(values, 0.5)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Quartiles {
    pub p25: Option<f64>,
    pub median: Option<f64>,
    pub p75: Option<f64>,
}

pub fn quartiles(values: &[f64]) -> Quartiles {
    Quartiles {
        p25: quantile(values, 0.25),
        median: median(values),
        p75: quantile(values, 0.75),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_sample_has_no_statistics() {
        assert_eq!(mean(&[]), None);
        assert_eq!(sample_std_dev(&[]), None);
        assert_eq!(median(&[]), None);
        assert_eq!(
            quartiles(&[]),
            Quartiles {
                p25: None,
                median: None,
                p75: None
            }
        );
    }

    #[test]
    fn sample_std_dev_uses_bessel_correction() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let std = sample_std_dev(&values).unwrap();
        assert!((std - (32.0_f64 / 7.0).sqrt()).abs() < 1e-12);
        assert_eq!(sample_std_dev(&[3.0]), None);
        assert_eq!(sample_std_dev(&[3.0, 3.0]), Some(0.0));
    }

    #[test]
    fn quantiles_interpolate_linearly() {
        let values = [40.0, 10.0, 30.0, 20.0];
        assert_eq!(median(&values), Some(25.0));
        assert_eq!(quantile(&values, 0.25), Some(17.5));
        assert_eq!(quantile(&values, 0.75), Some(32.5));
        assert_eq!(quantile(&values, 0.0), Some(10.0));
        assert_eq!(quantile(&values, 1.0), Some(40.0));
        assert_eq!(quantile(&values, 1.5), None);
    }

    #[test]
    fn single_value_is_every_quantile() {
        let q = quartiles(&[7.0]);
        assert_eq!(q.p25, Some(7.0));
        assert_eq!(q.median, Some(7.0));
        assert_eq!(q.p75, Some(7.0));
    }
}

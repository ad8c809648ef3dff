/// Render a value the way the AnnAGNPS input editor writes reals: whole
/// numbers keep a trailing decimal point (`72.`), anything else is written
/// in shortest round-trip form.
pub fn fmt_model_real(v: f64) -> String {
    if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{:.0}.", v)
    } else {
        format!("{}", v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_reals_keep_trailing_point() {
        assert_eq!(fmt_model_real(72.0), "72.");
        assert_eq!(fmt_model_real(0.0), "0.");
        assert_eq!(fmt_model_real(0.52), "0.52");
        assert_eq!(fmt_model_real(62.5), "62.5");
    }

    #[test]
    fn non_finite_values_are_not_decorated() {
        assert_eq!(fmt_model_real(f64::NAN), "NaN");
        assert_eq!(fmt_model_real(1e20), "100000000000000000000");
    }
}

//! Formatting of rupee amounts for display.

use std::sync::OnceLock;

use numfmt::{Formatter, Precision};

const CURRENCY_SYMBOL: &str = "₹";

/// Format `number` as rupees with thousands separators and two decimal places,
/// e.g. `₹1,234.50` or `-₹12.00`.
pub fn format_currency(number: f64) -> String {
    static POSITIVE_FMT: OnceLock<Option<Formatter>> = OnceLock::new();

    let positive_fmt = POSITIVE_FMT.get_or_init(|| {
        Formatter::currency(CURRENCY_SYMBOL)
            .ok()
            .map(|formatter| formatter.precision(Precision::Decimals(2)))
    });

    static NEGATIVE_FMT: OnceLock<Option<Formatter>> = OnceLock::new();

    let negative_fmt = NEGATIVE_FMT.get_or_init(|| {
        Formatter::currency(&format!("-{CURRENCY_SYMBOL}"))
            .ok()
            .map(|formatter| formatter.precision(Precision::Decimals(2)))
    });

    let formatted_string = match (positive_fmt, negative_fmt) {
        (Some(positive_fmt), Some(negative_fmt)) => {
            if number < 0.0 {
                negative_fmt.fmt_string(number.abs())
            } else if number > 0.0 {
                positive_fmt.fmt_string(number)
            } else {
                // numfmt renders zero as a bare "0"
                format!("{CURRENCY_SYMBOL}0.00")
            }
        }
        _ if number < 0.0 => format!("-{CURRENCY_SYMBOL}{:.2}", number.abs()),
        _ => format!("{CURRENCY_SYMBOL}{number:.2}"),
    };

    pad_decimals(formatted_string)
}

/// numfmt drops trailing zeros, so "12.30" comes out as "12.3" and "12.00" as "12".
fn pad_decimals(mut formatted_string: String) -> String {
    match formatted_string.rfind('.') {
        Some(point) => {
            let decimals = formatted_string.len() - point - 1;
            for _ in decimals..2 {
                formatted_string.push('0');
            }
        }
        None => formatted_string.push_str(".00"),
    }

    formatted_string
}

#[cfg(test)]
mod format_currency_tests {
    use crate::currency::format_currency;

    #[test]
    fn formats_zero() {
        assert_eq!(format_currency(0.0), "₹0.00");
    }

    #[test]
    fn formats_whole_number_with_two_decimals() {
        assert_eq!(format_currency(12.0), "₹12.00");
    }

    #[test]
    fn pads_single_decimal() {
        assert_eq!(format_currency(12.3), "₹12.30");
    }

    #[test]
    fn formats_negative_amounts() {
        assert_eq!(format_currency(-45.5), "-₹45.50");
    }

    #[test]
    fn formats_thousands() {
        assert_eq!(format_currency(1234.56), "₹1,234.56");
    }
}

//! Property-based tests for the typing rules.
//!
//! Uses `proptest` to check the two total laws of prefix-driven typing:
//! sign-prefixed digit strings always become integers with matching sign
//! and magnitude, and unprefixed tokens always come back as strings,
//! byte-for-byte.

use proptest::prelude::*;
use rtrpc_core::{classify, RawArg, RpcError, Typer, Value};

/// Tokens guaranteed not to start with a typing prefix.
fn arb_plain_token() -> impl Strategy<Value = String> {
    prop_oneof![
        prop::string::string_regex("[^+\\-\\[@][ -~]{0,30}").unwrap(),
        Just(String::new()),
    ]
}

proptest! {
    #[test]
    fn signed_digit_tokens_type_as_integers(magnitude in 0u64..=i64::MAX as u64, negative: bool) {
        let sign = if negative { '-' } else { '+' };
        let token = format!("{}{}", sign, magnitude);

        let expected = if negative {
            -(magnitude as i64)
        } else {
            magnitude as i64
        };
        prop_assert_eq!(classify(&token).unwrap(), RawArg::Int(expected));
    }

    #[test]
    fn signed_tokens_with_non_digits_fail(sign in "[+\\-]", junk in "[0-9]*[a-zA-Z .][0-9a-zA-Z .]*") {
        let token = format!("{}{}", sign, junk);
        let is_invalid = matches!(classify(&token), Err(RpcError::InvalidNumber { .. }));
        prop_assert!(is_invalid, "expected InvalidNumber for {:?}", token);
    }

    #[test]
    fn unprefixed_tokens_are_identity_strings(token in arb_plain_token()) {
        prop_assert_eq!(classify(&token).unwrap(), RawArg::Str(token));
    }

    #[test]
    // i64::MIN is excluded: its magnitude has no positive i64 form, so the
    // digit string overflows and types as InvalidNumber.
    fn resolved_integer_width_matches_magnitude(n in (i64::MIN + 1)..=i64::MAX) {
        let token = if n < 0 {
            n.to_string()
        } else {
            format!("+{}", n)
        };
        let typer = Typer::new();
        let mut stdin = std::io::empty();
        let value = typer.type_token(&token, &mut stdin).unwrap();

        if i32::try_from(n).is_ok() {
            prop_assert_eq!(value, Value::Int(n as i32));
        } else {
            prop_assert_eq!(value, Value::Long(n));
        }
    }

    #[test]
    fn integer_arrays_preserve_order(ints in prop::collection::vec(-1000i64..1000, 1..8)) {
        let token = format!(
            "[{}]",
            ints.iter()
                .map(|n| if *n < 0 { n.to_string() } else { format!("+{}", n) })
                .collect::<Vec<_>>()
                .join(",")
        );
        let expected = RawArg::Array(ints.into_iter().map(RawArg::Int).collect());
        prop_assert_eq!(classify(&token).unwrap(), expected);
    }
}

const BASE64: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

const CONTINUATION_BIT: i64 = 1 << 5;
const VALUE_MASK: i64 = CONTINUATION_BIT - 1;

/// Append `value` to `out` as a base64 VLQ digit sequence.
///
/// The sign is stored in the least significant bit of the first digit.
pub(crate) fn encode(value: i64, out: &mut String) {
    let mut rest = if value < 0 {
        ((-value) << 1) | 1
    } else {
        value << 1
    };
    loop {
        let mut digit = rest & VALUE_MASK;
        rest >>= 5;
        if rest > 0 {
            digit |= CONTINUATION_BIT;
        }
        out.push(BASE64[digit as usize] as char);
        if rest == 0 {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::encode;

    fn vlq(value: i64) -> String {
        let mut out = String::new();
        encode(value, &mut out);
        out
    }

    #[test]
    fn small_values() {
        assert_eq!(vlq(0), "A");
        assert_eq!(vlq(1), "C");
        assert_eq!(vlq(-1), "D");
        assert_eq!(vlq(15), "e");
    }

    #[test]
    fn multi_digit_values() {
        assert_eq!(vlq(16), "gB");
        assert_eq!(vlq(123), "2H");
        assert_eq!(vlq(-123), "3H");
        assert_eq!(vlq(1000), "w+B");
    }
}

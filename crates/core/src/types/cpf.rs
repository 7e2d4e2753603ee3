//! Brazilian individual taxpayer number (CPF).
//!
//! A CPF has nine base digits followed by two check digits. The first check
//! digit weights the base digits 10 down to 2, the second weights the first
//! ten digits 11 down to 2. Each weighted sum is reduced modulo 11 and a
//! remainder below 2 yields `0`, otherwise `11 - remainder`.
//!
//! Input may carry any punctuation; only ASCII digits are considered. The
//! canonical stored form is `000.000.000-00`.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Number of digits in a CPF.
pub const CPF_DIGITS: usize = 11;

/// Number of base digits preceding the two check digits.
const BASE_DIGITS: usize = 9;

/// Errors that can occur when parsing a [`Cpf`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CpfError {
    /// The input does not contain exactly eleven digits.
    #[error("CPF must have {CPF_DIGITS} digits, found {found}")]
    WrongLength {
        /// Number of digits found after stripping punctuation.
        found: usize,
    },
    /// Every digit is the same (e.g. `111.111.111-11`).
    #[error("CPF cannot repeat a single digit")]
    RepeatedDigits,
    /// The check digits do not match the base digits.
    #[error("CPF check digits do not match")]
    CheckDigitMismatch,
}

/// A validated CPF in canonical `000.000.000-00` form.
///
/// ## Examples
///
/// ```
/// use workbench_core::Cpf;
///
/// assert_eq!(Cpf::format("12345678909"), "123.456.789-09");
/// assert!(Cpf::is_valid("123.456.789-09"));
/// assert!(!Cpf::is_valid("111.111.111-11"));
///
/// let cpf = Cpf::parse("123 456 789 09").unwrap();
/// assert_eq!(cpf.as_str(), "123.456.789-09");
/// assert_eq!(cpf.digits(), "12345678909");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Cpf(String);

impl Cpf {
    /// Parse and canonicalize a CPF.
    ///
    /// # Errors
    ///
    /// Returns an error if the input does not hold exactly eleven digits, if
    /// all digits are identical, or if either check digit is wrong.
    pub fn parse(input: &str) -> Result<Self, CpfError> {
        let digits = ascii_digits(input);
        validate_digits(&digits)?;
        Ok(Self(render(&digits)))
    }

    /// Build a CPF from nine base digits by computing its check digits.
    ///
    /// Base digits above 9 are reduced modulo 10.
    ///
    /// # Errors
    ///
    /// Returns [`CpfError::RepeatedDigits`] when the resulting number repeats
    /// a single digit (for example a base of all zeros).
    pub fn from_base_digits(base: [u8; BASE_DIGITS]) -> Result<Self, CpfError> {
        let mut digits: Vec<u8> = base.iter().map(|d| d % 10).collect();
        let first = check_digit(&digits);
        digits.push(first);
        let second = check_digit(&digits);
        digits.push(second);
        validate_digits(&digits)?;
        Ok(Self(render(&digits)))
    }

    /// Returns `true` if the input is a valid CPF, ignoring punctuation.
    #[must_use]
    pub fn is_valid(input: &str) -> bool {
        validate_digits(&ascii_digits(input)).is_ok()
    }

    /// Render the digits of `input` as `AAA.BBB.CCC-DD`.
    ///
    /// Input that does not hold exactly eleven digits is returned unchanged.
    /// Check digits are not verified.
    #[must_use]
    pub fn format(input: &str) -> String {
        let digits = ascii_digits(input);
        if digits.len() == CPF_DIGITS {
            render(&digits)
        } else {
            input.to_owned()
        }
    }

    /// Returns the canonical formatted CPF.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns only the eleven digits.
    #[must_use]
    pub fn digits(&self) -> String {
        self.0.chars().filter(char::is_ascii_digit).collect()
    }

    /// Consumes the `Cpf` and returns its canonical string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

fn ascii_digits(input: &str) -> Vec<u8> {
    input
        .bytes()
        .filter(u8::is_ascii_digit)
        .map(|b| b - b'0')
        .collect()
}

/// Weighted modulo-11 check digit over `digits`, weights descending to 2.
fn check_digit(digits: &[u8]) -> u8 {
    let top_weight = digits.len() + 1;
    let sum: usize = digits
        .iter()
        .zip((2..=top_weight).rev())
        .map(|(&d, w)| usize::from(d) * w)
        .sum();
    let remainder = sum % 11;
    if remainder < 2 {
        0
    } else {
        // remainder is in 2..=10, so the result is a single digit
        u8::try_from(11 - remainder).unwrap_or(0)
    }
}

fn validate_digits(digits: &[u8]) -> Result<(), CpfError> {
    if digits.len() != CPF_DIGITS {
        return Err(CpfError::WrongLength {
            found: digits.len(),
        });
    }

    if digits.windows(2).all(|pair| pair.first() == pair.last()) {
        return Err(CpfError::RepeatedDigits);
    }

    let (base, checks) = digits.split_at(BASE_DIGITS);
    let (first_check, second_check) = (checks.first(), checks.get(1));

    if first_check != Some(&check_digit(base)) {
        return Err(CpfError::CheckDigitMismatch);
    }

    let (first_ten, _) = digits.split_at(BASE_DIGITS + 1);
    if second_check != Some(&check_digit(first_ten)) {
        return Err(CpfError::CheckDigitMismatch);
    }

    Ok(())
}

fn render(digits: &[u8]) -> String {
    let mut out = String::with_capacity(CPF_DIGITS + 3);
    for (i, d) in digits.iter().enumerate() {
        match i {
            3 | 6 => out.push('.'),
            9 => out.push('-'),
            _ => {}
        }
        out.push(char::from(b'0' + d));
    }
    out
}

impl fmt::Display for Cpf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Cpf {
    type Err = CpfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for Cpf {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// SQLx support (with postgres feature)
#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Cpf {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Cpf {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        // Stored values were canonicalized on write
        Ok(Self(s))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Cpf {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    /// Deterministic base digits for sampling without a RNG.
    fn sample_base(seed: u64) -> [u8; BASE_DIGITS] {
        let mut state = seed.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1);
        let mut base = [0u8; BASE_DIGITS];
        for d in &mut base {
            state = state
                .wrapping_mul(6_364_136_223_846_793_005)
                .wrapping_add(1_442_695_040_888_963_407);
            *d = u8::try_from((state >> 33) % 10).unwrap();
        }
        base
    }

    #[test]
    fn test_format_known_number() {
        assert_eq!(Cpf::format("12345678909"), "123.456.789-09");
    }

    #[test]
    fn test_format_leaves_short_input_unchanged() {
        assert_eq!(Cpf::format("1234567890"), "1234567890");
        assert_eq!(Cpf::format("123.456"), "123.456");
        assert_eq!(Cpf::format(""), "");
    }

    #[test]
    fn test_format_leaves_long_input_unchanged() {
        assert_eq!(Cpf::format("123456789012"), "123456789012");
    }

    #[test]
    fn test_validates_formatted_and_raw() {
        assert!(Cpf::is_valid("123.456.789-09"));
        assert!(Cpf::is_valid("12345678909"));
        assert!(Cpf::is_valid("529.982.247-25"));
    }

    #[test]
    fn test_rejects_repeated_digits() {
        for d in 0..=9 {
            let repeated = d.to_string().repeat(CPF_DIGITS);
            assert!(!Cpf::is_valid(&repeated), "{repeated} should be rejected");
        }
        assert_eq!(
            Cpf::parse("111.111.111-11"),
            Err(CpfError::RepeatedDigits)
        );
    }

    #[test]
    fn test_rejects_wrong_length() {
        assert_eq!(
            Cpf::parse("123.456.789-0"),
            Err(CpfError::WrongLength { found: 10 })
        );
        assert_eq!(Cpf::parse("abc"), Err(CpfError::WrongLength { found: 0 }));
    }

    #[test]
    fn test_rejects_bad_check_digits() {
        assert_eq!(
            Cpf::parse("123.456.789-00"),
            Err(CpfError::CheckDigitMismatch)
        );
        assert_eq!(
            Cpf::parse("123.456.789-19"),
            Err(CpfError::CheckDigitMismatch)
        );
    }

    #[test]
    fn test_remainder_below_two_gives_zero() {
        // 123456789: first sum 210, 210 % 11 = 1 -> first check digit 0
        let cpf = Cpf::from_base_digits([1, 2, 3, 4, 5, 6, 7, 8, 9]).unwrap();
        assert_eq!(cpf.as_str(), "123.456.789-09");
    }

    #[test]
    fn test_from_base_digits_rejects_all_zero_base() {
        assert_eq!(
            Cpf::from_base_digits([0; BASE_DIGITS]),
            Err(CpfError::RepeatedDigits)
        );
    }

    #[test]
    fn test_generated_numbers_are_accepted() {
        for seed in 0..500 {
            let Ok(cpf) = Cpf::from_base_digits(sample_base(seed)) else {
                continue;
            };
            assert!(Cpf::is_valid(cpf.as_str()), "{cpf} should be valid");
            assert!(Cpf::is_valid(&cpf.digits()));
        }
    }

    #[test]
    fn test_check_digit_mutations_are_rejected() {
        for seed in 0..200 {
            let Ok(cpf) = Cpf::from_base_digits(sample_base(seed)) else {
                continue;
            };
            let digits: Vec<u8> = cpf.digits().bytes().map(|b| b - b'0').collect();
            for pos in BASE_DIGITS..CPF_DIGITS {
                for replacement in 0..=9u8 {
                    if replacement == digits[pos] {
                        continue;
                    }
                    let mut mutated = digits.clone();
                    mutated[pos] = replacement;
                    let text: String = mutated.iter().map(|d| char::from(b'0' + d)).collect();
                    assert!(!Cpf::is_valid(&text), "{text} should be rejected");
                }
            }
        }
    }

    #[test]
    fn test_base_digit_mutations_are_almost_always_rejected() {
        let mut total = 0usize;
        let mut survivors = 0usize;
        for seed in 0..200 {
            let Ok(cpf) = Cpf::from_base_digits(sample_base(seed)) else {
                continue;
            };
            let digits: Vec<u8> = cpf.digits().bytes().map(|b| b - b'0').collect();
            for pos in 0..BASE_DIGITS {
                for replacement in 0..=9u8 {
                    if replacement == digits[pos] {
                        continue;
                    }
                    let mut mutated = digits.clone();
                    mutated[pos] = replacement;
                    let text: String = mutated.iter().map(|d| char::from(b'0' + d)).collect();
                    total += 1;
                    if Cpf::is_valid(&text) {
                        survivors += 1;
                    }
                }
            }
        }
        assert!(total > 0);
        assert!(
            survivors * 100 < total,
            "{survivors} of {total} single-digit mutations survived"
        );
    }

    #[test]
    fn test_display_and_from_str() {
        let cpf: Cpf = "52998224725".parse().unwrap();
        assert_eq!(cpf.to_string(), "529.982.247-25");
        assert_eq!(cpf.into_inner(), "529.982.247-25");
    }

    #[test]
    fn test_serde_is_transparent() {
        let cpf = Cpf::parse("12345678909").unwrap();
        let json = serde_json::to_string(&cpf).unwrap();
        assert_eq!(json, "\"123.456.789-09\"");
    }
}

//! CPF (Brazilian taxpayer number) sanitization and checksum

use super::KindOutcome;

const CPF_LENGTH: usize = 11;

fn check_digit(digits: &[u32]) -> u32 {
    let weight_start = digits.len() as u32 + 1;
    let sum: u32 = digits
        .iter()
        .enumerate()
        .map(|(i, d)| d * (weight_start - i as u32))
        .sum();

    match (sum * 10) % 11 {
        10 => 0,
        r => r,
    }
}

/// Full CPF validation: 11 digits, not all identical, both check digits
/// correct. Formatting characters are ignored.
pub fn is_valid_cpf(input: &str) -> bool {
    let digits: Vec<u32> = input.chars().filter_map(|c| c.to_digit(10)).collect();

    if digits.len() != CPF_LENGTH {
        return false;
    }
    if digits.iter().all(|d| *d == digits[0]) {
        return false;
    }

    check_digit(&digits[..9]) == digits[9] && check_digit(&digits[..10]) == digits[10]
}

/// Keep only digits and validate them
pub fn sanitize_cpf(input: &str) -> KindOutcome {
    let sanitized: String = input.chars().filter(char::is_ascii_digit).collect();

    if sanitized.len() != CPF_LENGTH {
        return KindOutcome::invalid(sanitized, "CPF must have 11 digits");
    }
    if sanitized.chars().all(|c| Some(c) == sanitized.chars().next()) {
        return KindOutcome::invalid(sanitized, "CPF cannot be a repeated digit sequence");
    }
    if !is_valid_cpf(&sanitized) {
        return KindOutcome::invalid(sanitized, "CPF check digits are invalid");
    }

    KindOutcome::valid(sanitized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("529.982.247-25" ; "formatted")]
    #[test_case("52998224725" ; "digits only")]
    #[test_case("111.444.777-35" ; "another valid number")]
    fn test_valid_cpf(input: &str) {
        assert!(is_valid_cpf(input));
        assert!(sanitize_cpf(input).is_valid);
    }

    #[test]
    fn test_sanitized_form() {
        assert_eq!(sanitize_cpf("529.982.247-25").sanitized, "52998224725");
    }

    #[test_case("11111111111", "CPF cannot be a repeated digit sequence" ; "repeated")]
    #[test_case("00000000000", "CPF cannot be a repeated digit sequence" ; "zeros")]
    #[test_case("529.982.247-26", "CPF check digits are invalid" ; "bad check digit")]
    #[test_case("1234567890", "CPF must have 11 digits" ; "too short")]
    fn test_invalid_cpf(input: &str, warning: &str) {
        let outcome = sanitize_cpf(input);
        assert!(!outcome.is_valid);
        assert_eq!(outcome.warnings, vec![warning.to_string()]);
        assert!(!is_valid_cpf(input));
    }
}

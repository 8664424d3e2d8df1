use precheck_core::command_validator::CommandValidator;

#[test]
fn test_command_validator_allows_valid_commands() {
    let validator = CommandValidator::new();
    assert!(validator.validate("ruff check").is_ok());
    assert!(validator.validate("npx eslint --max-warnings 0").is_ok());
    assert!(validator.validate("black --check . && isort --check .").is_ok());
}

#[test]
fn test_command_validator_rejects_empty() {
    let validator = CommandValidator::new();
    assert!(validator.validate("").is_err());
    assert!(validator.validate("   ").is_err());
}

#[test]
fn test_command_validator_rejects_null_bytes() {
    let validator = CommandValidator::new();
    assert!(validator.validate("ruff check\0").is_err());
    assert!(validator.validate("npm\0test").is_err());
}

#[test]
fn test_command_validator_rejects_embedded_newlines() {
    let validator = CommandValidator::new();
    assert!(validator.validate("ruff check\nrm -rf /").is_err());
    assert!(validator.validate("npm test\r\nmalicious").is_err());
}

#[test]
fn test_command_validator_rejects_oversized_commands() {
    let validator = CommandValidator::new();
    let long = "a".repeat(10_001);
    assert!(validator.validate(&long).is_err());
    assert!(validator.validate(&"a".repeat(10_000)).is_ok());
}

#[test]
fn test_validate_identifier_accepts_common_names() {
    assert!(CommandValidator::validate_identifier("api", "Package").is_ok());
    assert!(CommandValidator::validate_identifier("web-app_2", "Package").is_ok());
    assert!(CommandValidator::validate_identifier("scope@1.0", "Package").is_ok());
}

#[test]
fn test_validate_identifier_rejects_paths() {
    assert!(CommandValidator::validate_identifier("", "Package").is_err());
    assert!(CommandValidator::validate_identifier("../etc", "Package").is_err());
    assert!(CommandValidator::validate_identifier("a/b", "Package").is_err());
    assert!(CommandValidator::validate_identifier("a\\b", "Package").is_err());
    assert!(CommandValidator::validate_identifier(".hidden", "Package").is_err());
    assert!(CommandValidator::validate_identifier("-flag", "Package").is_err());
    assert!(CommandValidator::validate_identifier("has space", "Package").is_err());
    assert!(CommandValidator::validate_identifier(&"x".repeat(256), "Package").is_err());
}

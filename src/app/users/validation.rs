//! 表单校验
//!
//! 规则按顺序检查，第一条失败即返回：必填 → 年龄格式 → 年龄范围 → 邮箱唯一。
//! 这里的函数都没有副作用，邮箱查询结果由调用方传入。

use validator::Validate;

use super::model::{NewUser, User, UserForm};

/// 用户输入错误，消息直接展示在表单上
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("All fields are required!")]
    MissingFields,
    #[error("Age must be a valid number!")]
    InvalidAgeFormat,
    #[error("Please enter a valid age (1-150)!")]
    AgeOutOfRange,
    #[error("Email already exists! Please use a different email.")]
    DuplicateEmail,
}

fn required(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|value| !value.is_empty())
}

/// 可选符号加十进制数字；格式正确但超出 i64 的值必然超出年龄范围
fn parse_age(raw: &str) -> Result<i64, ValidationError> {
    let text = raw.trim();
    let digits = text.strip_prefix(['+', '-']).unwrap_or(text);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ValidationError::InvalidAgeFormat);
    }
    text.parse().map_err(|_| ValidationError::AgeOutOfRange)
}

/// 检查必填、年龄格式与范围，返回规范化后的记录
pub fn validate_form(form: &UserForm) -> Result<NewUser, ValidationError> {
    let (Some(first_name), Some(last_name), Some(email), Some(age), Some(city)) = (
        required(&form.first_name),
        required(&form.last_name),
        required(&form.email),
        required(&form.age),
        required(&form.city),
    ) else {
        return Err(ValidationError::MissingFields);
    };

    let age = parse_age(age)?;

    let user = NewUser::new(first_name, last_name, email, age, city);
    user.validate().map_err(|errors| {
        if errors.field_errors().keys().any(|field| *field == "age") {
            ValidationError::AgeOutOfRange
        } else {
            ValidationError::MissingFields
        }
    })?;

    Ok(user)
}

/// 邮箱唯一性：`existing` 是按邮箱查到的用户，`exempt_id` 是正在更新的用户
pub fn check_email_available(
    existing: Option<&User>,
    exempt_id: Option<i64>,
) -> Result<(), ValidationError> {
    match existing {
        Some(user) if Some(user.id) != exempt_id => Err(ValidationError::DuplicateEmail),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn form(age: &str) -> UserForm {
        UserForm {
            first_name: Some("test".to_string()),
            last_name: Some("user".to_string()),
            email: Some("test@user.com".to_string()),
            age: Some(age.to_string()),
            city: Some("Islamabad".to_string()),
        }
    }

    fn stored(id: i64, email: &str) -> User {
        User {
            id,
            first_name: "Hunain".to_string(),
            last_name: "Raza".to_string(),
            email: email.to_string(),
            age: 22,
            city: "Karachi".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_valid_form_is_normalized() {
        let user = validate_form(&form("18")).unwrap();
        assert_eq!(user, NewUser::new("test", "user", "test@user.com", 18, "Islamabad"));
    }

    #[test]
    fn test_age_whitespace_is_tolerated() {
        assert_eq!(validate_form(&form(" 42 ")).unwrap().age, 42);
    }

    #[test]
    fn test_missing_and_empty_fields() {
        let mut missing = form("18");
        missing.city = None;
        assert_eq!(validate_form(&missing), Err(ValidationError::MissingFields));

        let mut empty = form("18");
        empty.first_name = Some(String::new());
        assert_eq!(validate_form(&empty), Err(ValidationError::MissingFields));

        assert_eq!(
            validate_form(&UserForm::default()),
            Err(ValidationError::MissingFields)
        );
    }

    #[test]
    fn test_missing_fields_wins_over_bad_age() {
        let mut both = form("abc");
        both.email = None;
        assert_eq!(validate_form(&both), Err(ValidationError::MissingFields));
    }

    #[test]
    fn test_non_numeric_age() {
        for age in ["abc", "18.5", "1e2", "eighteen", "-", "+", "1 8", "--3"] {
            assert_eq!(
                validate_form(&form(age)),
                Err(ValidationError::InvalidAgeFormat),
                "age {age:?}"
            );
        }
    }

    #[test]
    fn test_age_range_boundaries() {
        for age in ["0", "151", "-3", "1000"] {
            assert_eq!(
                validate_form(&form(age)),
                Err(ValidationError::AgeOutOfRange),
                "age {age:?}"
            );
        }
        assert_eq!(validate_form(&form("1")).unwrap().age, 1);
        assert_eq!(validate_form(&form("150")).unwrap().age, 150);
        assert_eq!(validate_form(&form("+20")).unwrap().age, 20);
    }

    #[test]
    fn test_age_beyond_i64_is_out_of_range() {
        for age in ["99999999999999999999", "-99999999999999999999", " 9223372036854775808 "] {
            assert_eq!(
                validate_form(&form(age)),
                Err(ValidationError::AgeOutOfRange),
                "age {age:?}"
            );
        }
    }

    #[test]
    fn test_email_availability() {
        let other = stored(7, "i221614@nu.edu.pk");
        assert_eq!(check_email_available(None, None), Ok(()));
        assert_eq!(
            check_email_available(Some(&other), None),
            Err(ValidationError::DuplicateEmail)
        );
        assert_eq!(
            check_email_available(Some(&other), Some(3)),
            Err(ValidationError::DuplicateEmail)
        );
        assert_eq!(check_email_available(Some(&other), Some(7)), Ok(()));
    }
}

/// 公共验证函数模块
/// 评分、标识符与分类字段的输入校验，在任何写入发生之前执行。

/// 评分范围校验：1-5 的整数
pub fn validate_rating(rating: u8) -> Result<(), &'static str> {
    if !(1..=5).contains(&rating) {
        return Err("rating must be between 1 and 5");
    }
    Ok(())
}

/// 标识符校验：1-128 字符，仅允许字母、数字、点、下划线和连字符。
/// 冒号被排除在外，因为复合索引键以冒号作为分隔符。
pub fn validate_identifier(value: &str) -> Result<(), &'static str> {
    if value.is_empty() {
        return Err("must not be empty");
    }
    if value.len() > 128 {
        return Err("must not exceed 128 characters");
    }
    if !value
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'.' || b == b'_' || b == b'-')
    {
        return Err("only letters, digits, dot, underscore and hyphen are allowed");
    }
    Ok(())
}

/// 学科 / 课时字段校验：非空、不超过 200 字符、不含冒号
pub fn validate_taxonomy_field(value: &str) -> Result<(), &'static str> {
    if value.trim().is_empty() {
        return Err("must not be empty");
    }
    if value.chars().count() > 200 {
        return Err("must not exceed 200 characters");
    }
    if value.contains(':') {
        return Err("must not contain ':'");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratings_in_range_accepted() {
        for rating in 1..=5 {
            assert!(validate_rating(rating).is_ok());
        }
    }

    #[test]
    fn zero_rating_rejected() {
        assert!(validate_rating(0).is_err());
    }

    #[test]
    fn six_rating_rejected() {
        assert!(validate_rating(6).is_err());
    }

    #[test]
    fn valid_identifier_accepted() {
        assert!(validate_identifier("activity-01_v2.final").is_ok());
    }

    #[test]
    fn empty_identifier_rejected() {
        assert!(validate_identifier("").is_err());
    }

    #[test]
    fn identifier_with_colon_rejected() {
        assert!(validate_identifier("a:b").is_err());
    }

    #[test]
    fn identifier_with_space_rejected() {
        assert!(validate_identifier("a b").is_err());
    }

    #[test]
    fn overlong_identifier_rejected() {
        let long = "a".repeat(129);
        assert!(validate_identifier(&long).is_err());
    }

    #[test]
    fn unicode_taxonomy_field_accepted() {
        assert!(validate_taxonomy_field("الرياضيات").is_ok());
    }

    #[test]
    fn blank_taxonomy_field_rejected() {
        assert!(validate_taxonomy_field("   ").is_err());
    }

    #[test]
    fn taxonomy_field_with_colon_rejected() {
        assert!(validate_taxonomy_field("math:advanced").is_err());
    }
}

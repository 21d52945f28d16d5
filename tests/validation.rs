use storefront_api::error::AppError;
use storefront_api::services::auth_service::validate_username;
use storefront_api::services::order_service::line_total;
use storefront_api::services::review_service::validate_rating;

#[test]
fn username_length_and_charset_rules() {
    assert!(matches!(
        validate_username("ab"),
        Err(AppError::BadRequest(_))
    ));
    assert!(validate_username("abc").is_ok());
    assert!(validate_username("valid_user1").is_ok());
    assert!(matches!(
        validate_username("has space"),
        Err(AppError::BadRequest(_))
    ));
    assert!(matches!(
        validate_username("dash-ed"),
        Err(AppError::BadRequest(_))
    ));

    let too_long = "a".repeat(21);
    assert!(matches!(
        validate_username(&too_long),
        Err(AppError::BadRequest(_))
    ));
}

#[test]
fn rating_must_be_one_to_five() {
    assert!(matches!(validate_rating(0), Err(AppError::BadRequest(_))));
    assert!(validate_rating(1).is_ok());
    assert!(validate_rating(5).is_ok());
    assert!(matches!(validate_rating(6), Err(AppError::BadRequest(_))));
}

#[test]
fn line_totals_are_exact_in_minor_units() {
    // 9.99 x 2 and 5.00 x 1 in cents.
    assert_eq!(line_total(999, 2), 1998);
    assert_eq!(line_total(500, 1), 500);
    assert_eq!(line_total(999, 2) + line_total(500, 1), 2498);
}

use std::path::PathBuf;

use taskdeck::error::{exit_codes, Error};

#[test]
fn exit_codes_follow_error_class() {
    assert_eq!(
        Error::InvalidArgument("x".into()).exit_code(),
        exit_codes::USER_ERROR
    );
    assert_eq!(
        Error::TaskNotFound { id: 4, project: 1 }.exit_code(),
        exit_codes::USER_ERROR
    );
    assert_eq!(Error::MoveNotFound("m".into()).exit_code(), exit_codes::USER_ERROR);
    assert_eq!(Error::CycleDetected(3).exit_code(), exit_codes::INTEGRITY);
    assert_eq!(
        Error::AmbiguousParent {
            child: 3,
            first: 1,
            second: 2
        }
        .exit_code(),
        exit_codes::INTEGRITY
    );
    assert_eq!(Error::Store("down".into()).exit_code(), exit_codes::OPERATION_FAILED);
    assert_eq!(
        Error::LockFailed(PathBuf::from(".lock")).exit_code(),
        exit_codes::OPERATION_FAILED
    );
}

#[test]
fn details_carry_ids() {
    let details = Error::AmbiguousParent {
        child: 3,
        first: 1,
        second: 2,
    }
    .details()
    .expect("details");
    assert_eq!(details["child"], 3);
    assert_eq!(details["parents"], serde_json::json!([1, 2]));

    assert!(Error::InvalidArgument("x".into()).details().is_none());
}

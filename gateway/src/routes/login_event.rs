//! `POST /api/auth/login-event`
//!
//! Records a sign-in with the clustering service. All four fields are
//! required and forwarded as-is.

use crate::auth::AuthMode;
use crate::normalize::FieldSpec;
use crate::route::{CheckOrder, RouteSpec};
use crate::translate::TranslationPolicy;
use http::{Method, StatusCode};

const FIELDS: &[FieldSpec] = &[
    FieldSpec::body("event").required(),
    FieldSpec::body("timestamp").required(),
    FieldSpec::body("sub").required(),
    FieldSpec::body("email").required(),
];

pub fn spec() -> RouteSpec {
    RouteSpec {
        name: "login_event",
        method: Method::POST,
        path: "/api/auth/login-event",
        auth: AuthMode::Token,
        check_order: CheckOrder::AuthFirst,
        fields: FIELDS,
        downstream_method: Method::POST,
        downstream_path: "/api/auth/sign-in",
        policy: TranslationPolicy::Wrapped {
            success_status: StatusCode::OK,
            success_flag: true,
            failure_message: "Failed to record login event",
        },
    }
}

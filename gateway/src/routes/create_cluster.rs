//! `POST /api/create-cluster`
//!
//! Receives the batch produced by the CSV upload dialog:
//!
//! ```json
//! {
//!   "proj_id": 12,
//!   "clusterData": [{"name": "J1234+5678", "cluster": "3"}]
//! }
//! ```
//!
//! and forwards `{clusterData}` to `POST /api/clusters/{proj_id}`.

use crate::auth::AuthMode;
use crate::normalize::FieldSpec;
use crate::route::{CheckOrder, RouteSpec};
use crate::translate::TranslationPolicy;
use http::{Method, StatusCode};

const FIELDS: &[FieldSpec] = &[
    FieldSpec::body_preferred("proj_id").identifier().required(),
    FieldSpec::body("clusterData"),
];

pub fn spec() -> RouteSpec {
    RouteSpec {
        name: "create_cluster",
        method: Method::POST,
        path: "/api/create-cluster",
        auth: AuthMode::Token,
        check_order: CheckOrder::AuthFirst,
        fields: FIELDS,
        downstream_method: Method::POST,
        downstream_path: "/api/clusters/{proj_id}",
        policy: TranslationPolicy::Wrapped {
            success_status: StatusCode::CREATED,
            success_flag: false,
            failure_message: "Failed to create clusters",
        },
    }
}

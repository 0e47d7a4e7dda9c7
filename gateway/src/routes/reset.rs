//! Reset routes. Both carry identifiers only and send no body downstream.

use crate::auth::AuthMode;
use crate::normalize::FieldSpec;
use crate::route::{CheckOrder, RouteSpec};
use crate::translate::TranslationPolicy;
use http::Method;

const CLUSTER_FIELDS: &[FieldSpec] = &[
    FieldSpec::query("projectId"),
    FieldSpec::query("cluster_number"),
];

const PROJECT_FIELDS: &[FieldSpec] = &[FieldSpec::path("projectId")];

/// `POST /api/clusters/reset?projectId=&cluster_number=`
pub fn cluster_spec() -> RouteSpec {
    RouteSpec {
        name: "cluster_reset",
        method: Method::POST,
        path: "/api/clusters/reset",
        auth: AuthMode::Token,
        check_order: CheckOrder::ConfigFirst,
        fields: CLUSTER_FIELDS,
        downstream_method: Method::POST,
        downstream_path: "/api/clusters/{projectId}/{cluster_number}/reset",
        policy: TranslationPolicy::Reset {
            success_message: "Cluster reset successfully",
            failure_message: "Failed to reset cluster",
        },
    }
}

/// `POST /api/projects/{projectId}/reset`
pub fn project_spec() -> RouteSpec {
    RouteSpec {
        name: "project_reset",
        method: Method::POST,
        path: "/api/projects/{projectId}/reset",
        auth: AuthMode::Token,
        check_order: CheckOrder::ConfigFirst,
        fields: PROJECT_FIELDS,
        downstream_method: Method::POST,
        downstream_path: "/api/storage/{projectId}/reset",
        policy: TranslationPolicy::Reset {
            success_message: "Project reset successfully",
            failure_message: "Failed to reset project",
        },
    }
}

//! Session-authenticated cluster routes.
//!
//! Both forward the downstream answer unchanged, so the browser sees the
//! clustering service's own shapes and status codes.

use crate::auth::AuthMode;
use crate::normalize::FieldSpec;
use crate::route::{CheckOrder, RouteSpec};
use crate::translate::TranslationPolicy;
use http::Method;

const CREATE_FIELDS: &[FieldSpec] = &[
    FieldSpec::query("project_id"),
    FieldSpec::body_preferred("clusterName"),
    FieldSpec::body_preferred("clusterLabel"),
];

const UPDATE_FIELDS: &[FieldSpec] = &[
    FieldSpec::query("project_id"),
    FieldSpec::query("cluster_number"),
    FieldSpec::body_preferred("label_name"),
];

/// `POST /api/clusters?project_id=` with `{clusterName, clusterLabel}`
pub fn create_spec() -> RouteSpec {
    RouteSpec {
        name: "clusters_create",
        method: Method::POST,
        path: "/api/clusters",
        auth: AuthMode::Session,
        check_order: CheckOrder::ConfigFirst,
        fields: CREATE_FIELDS,
        downstream_method: Method::POST,
        downstream_path: "/api/clusters/{project_id}/new-cluster",
        policy: TranslationPolicy::Passthrough {
            failure_message: "Failed to create cluster",
        },
    }
}

/// `PUT /api/clusters?project_id=&cluster_number=` with `{label_name}`
pub fn update_spec() -> RouteSpec {
    RouteSpec {
        name: "clusters_update",
        method: Method::PUT,
        path: "/api/clusters",
        auth: AuthMode::Session,
        check_order: CheckOrder::ConfigFirst,
        fields: UPDATE_FIELDS,
        downstream_method: Method::PUT,
        downstream_path: "/api/clusters/{project_id}/{cluster_number}",
        policy: TranslationPolicy::Passthrough {
            failure_message: "Failed to update cluster",
        },
    }
}

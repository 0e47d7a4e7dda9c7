//! Object-level routes of a project.

use crate::auth::AuthMode;
use crate::normalize::FieldSpec;
use crate::route::{CheckOrder, RouteSpec};
use crate::translate::TranslationPolicy;
use http::{Method, StatusCode};

const TAGS_FIELDS: &[FieldSpec] = &[
    FieldSpec::path("project_id"),
    FieldSpec::path("object_id"),
    FieldSpec::body("tags"),
    FieldSpec::body("new_cluster"),
];

const BATCH_FIELDS: &[FieldSpec] = &[
    FieldSpec::path("project_id"),
    FieldSpec::body("object_ids").required(),
    FieldSpec::body("operations").required(),
];

/// `PUT /api/projects/{project_id}/objects/{object_id}` with `{tags, new_cluster}`.
///
/// The downstream body is a pure function of the request, so repeating a call
/// repeats the exact same update.
pub fn tags_spec() -> RouteSpec {
    RouteSpec {
        name: "object_tags",
        method: Method::PUT,
        path: "/api/projects/{project_id}/objects/{object_id}",
        auth: AuthMode::Token,
        check_order: CheckOrder::AuthFirst,
        fields: TAGS_FIELDS,
        downstream_method: Method::PUT,
        downstream_path: "/api/storage/{project_id}/{object_id}",
        policy: TranslationPolicy::Wrapped {
            success_status: StatusCode::OK,
            success_flag: false,
            failure_message: "Failed to Add tag",
        },
    }
}

/// `POST /api/projects/{project_id}/objects/batch` with `{object_ids, operations}`
pub fn batch_update_spec() -> RouteSpec {
    RouteSpec {
        name: "objects_batch_update",
        method: Method::POST,
        path: "/api/projects/{project_id}/objects/batch",
        auth: AuthMode::Token,
        check_order: CheckOrder::AuthFirst,
        fields: BATCH_FIELDS,
        downstream_method: Method::POST,
        downstream_path: "/api/storage/{project_id}/batch_update",
        policy: TranslationPolicy::Wrapped {
            success_status: StatusCode::OK,
            success_flag: true,
            failure_message: "Failed to batch update objects",
        },
    }
}

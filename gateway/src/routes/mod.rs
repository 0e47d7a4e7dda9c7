use crate::route::RouteSpec;

pub mod clusters;
pub mod create_cluster;
pub mod login_event;
pub mod objects;
pub mod reset;

/// Every gateway operation, in resolution order.
///
/// `objects/batch` comes before the tag route so that a batch call is never
/// taken for an object named "batch" (the methods differ, but resolution
/// reports the first path match).
pub fn all() -> Vec<RouteSpec> {
    vec![
        create_cluster::spec(),
        clusters::create_spec(),
        clusters::update_spec(),
        reset::cluster_spec(),
        reset::project_spec(),
        objects::batch_update_spec(),
        objects::tags_spec(),
        login_event::spec(),
    ]
}

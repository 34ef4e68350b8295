//! Built-in route tables.

use super::{Route, RouteTable};
use http::Method;

/// Google+ API subset: 13 routes with nested collections.
///
/// <https://developers.google.com/+/api/latest/>
#[must_use]
pub fn gplus_api() -> RouteTable {
    RouteTable::new(
        "GPlus",
        vec![
            // People
            Route::new(Method::GET, "/people/:userId"),
            Route::new(Method::GET, "/people"),
            Route::new(Method::GET, "/activities/:activityId/people/:collection"),
            Route::new(Method::GET, "/people/:userId/people/:collection"),
            Route::new(Method::GET, "/people/:userId/openIdConnect"),
            // Activities
            Route::new(Method::GET, "/people/:userId/activities/:collection"),
            Route::new(Method::GET, "/activities/:activityId"),
            Route::new(Method::GET, "/activities"),
            // Comments
            Route::new(Method::GET, "/activities/:activityId/comments"),
            Route::new(Method::GET, "/comments/:commentId"),
            // Moments
            Route::new(Method::POST, "/people/:userId/moments/:collection"),
            Route::new(Method::GET, "/people/:userId/moments/:collection"),
            Route::new(Method::DELETE, "/moments/:id"),
        ],
    )
}

/// Small file-server style table with a wildcard tail.
#[must_use]
pub fn static_files_api() -> RouteTable {
    RouteTable::new(
        "StaticFiles",
        vec![
            Route::new(Method::GET, "/"),
            Route::new(Method::GET, "/assets"),
            Route::new(Method::GET, "/assets/:bundle/manifest"),
            Route::new(Method::GET, "/users/:user/files/:file"),
            Route::new(Method::PUT, "/users/:user/files/:file"),
            Route::new(Method::GET, "/static/*filepath"),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_tables_are_clean() {
        for table in [gplus_api(), static_files_api()] {
            assert!(table.validate().is_empty(), "{} has issues", table.name());
        }
    }

    #[test]
    fn gplus_shape() {
        let table = gplus_api();
        assert_eq!(table.len(), 13);
        assert_eq!(table.get(1).unwrap().path, "/people");
        assert!(table.iter().any(|r| r.method == Method::POST));
        assert!(table.iter().any(|r| r.method == Method::DELETE));
    }
}

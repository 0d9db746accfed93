//! Utility macros for reducing boilerplate

/// Macro to implement `FromRef<AppState>` for state extractors.
///
/// # Example
/// ```ignore
/// impl_from_ref!(DbClient, db);
/// // Expands to:
/// impl axum::extract::FromRef<AppState> for DbClient {
///     fn from_ref(state: &AppState) -> Self {
///         state.db.clone()
///     }
/// }
/// ```
#[macro_export]
macro_rules! impl_from_ref {
    ($type:ty, $field:ident) => {
        impl axum::extract::FromRef<$crate::state::AppState> for $type {
            fn from_ref(state: &$crate::state::AppState) -> Self {
                state.$field.clone()
            }
        }
    };
}

/// Implement `From<T>` and `From<Option<T>>` for one `SqlParam` variant.
///
/// ```ignore
/// impl_sql_param!(i64 => BigInt);
/// ```
#[macro_export]
macro_rules! impl_sql_param {
    ($($type:ty => $variant:ident),+ $(,)?) => {
        $(
            impl From<$type> for $crate::db::query::SqlParam {
                fn from(value: $type) -> Self {
                    $crate::db::query::SqlParam::$variant(Some(value.into()))
                }
            }

            impl From<Option<$type>> for $crate::db::query::SqlParam {
                fn from(value: Option<$type>) -> Self {
                    $crate::db::query::SqlParam::$variant(value.map(Into::into))
                }
            }
        )+
    };
}

/// Bind closed enums from `estate-core` as text parameters.
#[macro_export]
macro_rules! impl_sql_param_enum {
    ($($type:ty),+ $(,)?) => {
        $(
            impl From<$type> for $crate::db::query::SqlParam {
                fn from(value: $type) -> Self {
                    $crate::db::query::SqlParam::Text(Some(value.as_db_str().to_string()))
                }
            }

            impl From<Option<$type>> for $crate::db::query::SqlParam {
                fn from(value: Option<$type>) -> Self {
                    $crate::db::query::SqlParam::Text(value.map(|v| v.as_db_str().to_string()))
                }
            }
        )+
    };
}
